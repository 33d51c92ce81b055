//! Chromium-backed [`PageEngine`] driven over the DevTools protocol.

use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page as cdp_page;
use chromiumoxide::cdp::js_protocol::runtime as cdp_runtime;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::engine::{DomProbeReport, PageEngine};
use crate::error::EngineError;
use crate::events::{ConsoleLevel, EngineEvent};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Real rendering engine: one browser process, one page, with engine
/// events pumped from CDP onto a broadcast channel.
pub struct ChromiumEngine {
    page: Arc<Page>,
    events: broadcast::Sender<EngineEvent>,
    _browser: Browser,
}

impl ChromiumEngine {
    /// Launch a browser and open the single page the workflow drives.
    pub async fn launch(config: EngineConfig) -> Result<Self, EngineError> {
        let mut builder = BrowserConfig::builder();
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &config.executable {
            builder = builder.chrome_executable(executable);
        }
        if let Some(dir) = &config.user_data_dir {
            builder = builder.user_data_dir(dir);
        }
        if !config.load_images {
            builder = builder.arg("--blink-settings=imagesEnabled=false");
        }

        let browser_config = builder
            .build()
            .map_err(|err| EngineError::Launch(err.to_string()))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|err| EngineError::Launch(err.to_string()))?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        // Drive the CDP connection; when it ends the engine is gone.
        let handler_events = events.clone();
        tokio::spawn(async move {
            while let Some(result) = handler.next().await {
                if result.is_err() {
                    break;
                }
            }
            let _ = handler_events.send(EngineEvent::Closed);
        });

        let page = Arc::new(
            browser
                .new_page("about:blank")
                .await
                .map_err(|err| EngineError::Launch(err.to_string()))?,
        );

        spawn_load_pump(Arc::clone(&page), events.clone());
        spawn_console_pump(Arc::clone(&page), events.clone());
        spawn_exception_pump(Arc::clone(&page), events.clone());

        Ok(Self {
            page,
            events,
            _browser: browser,
        })
    }
}

#[async_trait]
impl PageEngine for ChromiumEngine {
    async fn load_url(&self, url: &str) -> Result<(), EngineError> {
        debug!(url, "issuing navigation");
        // Fire the navigation and return; load completion arrives as an
        // engine event, never as part of this call.
        let params = cdp_page::NavigateParams::builder()
            .url(url)
            .build()
            .map_err(EngineError::Navigation)?;
        self.page
            .execute(params)
            .await
            .map_err(|err| EngineError::Navigation(err.to_string()))?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, EngineError> {
        let result = self
            .page
            .evaluate(script.to_string())
            .await
            .map_err(|err| EngineError::Evaluation(err.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn probe_document(&self, selectors: &[String]) -> Result<DomProbeReport, EngineError> {
        let expression = probe_expression(selectors)?;
        let value = self.evaluate(&expression).await?;
        let raw = value
            .as_str()
            .ok_or_else(|| EngineError::MalformedProbe(value.to_string()))?;
        serde_json::from_str(raw).map_err(|err| EngineError::MalformedProbe(err.to_string()))
    }

    async fn stop_load(&self) -> Result<(), EngineError> {
        self.page
            .execute(cdp_page::StopLoadingParams::default())
            .await
            .map_err(|err| EngineError::Navigation(err.to_string()))?;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }
}

/// Build the single-expression document probe. The page answers with a
/// JSON string so the payload survives the value boundary unchanged.
fn probe_expression(selectors: &[String]) -> Result<String, EngineError> {
    let payload = serde_json::to_string(selectors)
        .map_err(|err| EngineError::MalformedProbe(err.to_string()))?;
    Ok(format!(
        "(function(selectors) {{ return JSON.stringify({{ \
         path: document.location.pathname, \
         found: selectors.map(function(s) {{ return document.querySelector(s) !== null; }}) \
         }}); }})({payload})"
    ))
}

fn spawn_load_pump(page: Arc<Page>, events: broadcast::Sender<EngineEvent>) {
    tokio::spawn(async move {
        let _ = page.execute(cdp_page::EnableParams::default()).await;
        let mut stream = match page.event_listener::<cdp_page::EventLoadEventFired>().await {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "load event listener unavailable");
                return;
            }
        };
        while stream.next().await.is_some() {
            debug!("load event fired");
            if events.send(EngineEvent::LoadFinished { ok: true }).is_err() {
                break;
            }
        }
    });
}

fn spawn_console_pump(page: Arc<Page>, events: broadcast::Sender<EngineEvent>) {
    tokio::spawn(async move {
        let _ = page.execute(cdp_runtime::EnableParams::default()).await;
        let mut stream = match page
            .event_listener::<cdp_runtime::EventConsoleApiCalled>()
            .await
        {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "console event listener unavailable");
                return;
            }
        };
        while let Some(event) = stream.next().await {
            let message = console_message(&event);
            if events.send(message).is_err() {
                break;
            }
        }
    });
}

/// Uncaught page exceptions arrive as their own runtime event, not as
/// console API calls; report them at error level with the throw site.
fn spawn_exception_pump(page: Arc<Page>, events: broadcast::Sender<EngineEvent>) {
    tokio::spawn(async move {
        let _ = page.execute(cdp_runtime::EnableParams::default()).await;
        let mut stream = match page
            .event_listener::<cdp_runtime::EventExceptionThrown>()
            .await
        {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "exception event listener unavailable");
                return;
            }
        };
        while let Some(event) = stream.next().await {
            let message = exception_message(&event);
            if events.send(message).is_err() {
                break;
            }
        }
    });
}

fn console_message(event: &cdp_runtime::EventConsoleApiCalled) -> EngineEvent {
    let level = match event.r#type {
        cdp_runtime::ConsoleApiCalledType::Error | cdp_runtime::ConsoleApiCalledType::Assert => {
            ConsoleLevel::Error
        }
        cdp_runtime::ConsoleApiCalledType::Warning => ConsoleLevel::Warning,
        cdp_runtime::ConsoleApiCalledType::Debug | cdp_runtime::ConsoleApiCalledType::Trace => {
            ConsoleLevel::Debug
        }
        _ => ConsoleLevel::Info,
    };

    let text = event
        .args
        .iter()
        .filter_map(|arg| arg.value.as_ref())
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ");

    let top_frame = event
        .stack_trace
        .as_ref()
        .and_then(|trace| trace.call_frames.first());

    EngineEvent::ConsoleMessage {
        level,
        text,
        line: top_frame.map(|frame| frame.line_number as u64),
        source: top_frame.map(|frame| frame.url.clone()),
    }
}

fn exception_message(event: &cdp_runtime::EventExceptionThrown) -> EngineEvent {
    let details = &event.exception_details;
    let text = details
        .exception
        .as_ref()
        .and_then(|exception| exception.description.clone())
        .unwrap_or_else(|| details.text.clone());

    EngineEvent::ConsoleMessage {
        level: ConsoleLevel::Error,
        text,
        line: Some(details.line_number as u64),
        source: details.url.clone(),
    }
}
