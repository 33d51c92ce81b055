//! Session event-loop smoke tests under virtual time: the spawned loop
//! reacts to engine events and drives transitions through the poller.

use std::sync::Arc;
use std::time::Duration;

use engine_bridge::{EngineEvent, PageEngine};
use unban_core::scripts;
use unban_core::testing::ScriptedEngine;
use unban_core::{Credentials, SessionConfig, UnbanSession};

fn fixture() -> (Arc<ScriptedEngine>, UnbanSession) {
    let engine = Arc::new(ScriptedEngine::new());
    let mut config = SessionConfig::new("demo.group");
    config.settle_delay = Duration::ZERO;
    let session = UnbanSession::new(
        Arc::clone(&engine) as Arc<dyn PageEngine>,
        Credentials {
            username: "admin@example.com".into(),
            password: "hunter2".into(),
        },
        config,
    )
    .expect("session builds");
    (engine, session)
}

async fn wait_until(engine: &ScriptedEngine, what: &str, check: impl Fn(&ScriptedEngine) -> bool) {
    for _ in 0..200 {
        if check(engine) {
            return;
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
    panic!("condition never reached: {what}");
}

#[tokio::test(start_paused = true)]
async fn session_logs_in_once_the_form_appears() {
    let (engine, session) = fixture();
    engine.set_document("/", &[scripts::LOGIN_FORM]);

    let handle = tokio::spawn(session.run());
    tokio::task::yield_now().await;

    // Initial navigation went out; report it finished so polling starts.
    assert_eq!(engine.loaded_urls(), vec!["https://www.facebook.com/".to_string()]);
    engine.emit(EngineEvent::LoadFinished { ok: true });

    wait_until(&engine, "login script evaluated", |engine| {
        engine
            .evaluated_scripts()
            .iter()
            .any(|s| s.contains("login_form"))
    })
    .await;

    engine.emit(EngineEvent::Closed);
    handle
        .await
        .expect("session task joins")
        .expect("session exits cleanly");
}

#[tokio::test(start_paused = true)]
async fn session_survives_a_throwing_handler_script() {
    let (engine, session) = fixture();
    engine.set_document("/", &[scripts::LOGIN_FORM]);
    // The form vanished between the probe and the fill: the injected
    // script throws inside the page.
    engine.fail_evaluations("TypeError: document.forms.login_form is null");

    let handle = tokio::spawn(session.run());
    tokio::task::yield_now().await;
    engine.emit(EngineEvent::LoadFinished { ok: true });

    wait_until(&engine, "login script evaluated", |engine| {
        engine
            .evaluated_scripts()
            .iter()
            .any(|s| s.contains("login_form"))
    })
    .await;

    // The loop is still alive after the failed evaluation.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(!handle.is_finished());

    engine.emit(EngineEvent::Closed);
    handle
        .await
        .expect("session task joins")
        .expect("script failure did not end the session");
}

#[tokio::test(start_paused = true)]
async fn watchdog_stops_a_stalled_load() {
    let (engine, session) = fixture();
    // Document never shows the login form: nothing ever satisfies.
    engine.set_document("/", &[]);

    let handle = tokio::spawn(session.run());
    tokio::task::yield_now().await;
    engine.emit(EngineEvent::LoadFinished { ok: true });

    // The 300s window elapses under virtual time and the load is stopped
    // exactly once; the watchdog stays quiet afterwards.
    wait_until(&engine, "stalled load stopped", |engine| {
        engine.stop_load_count() == 1
    })
    .await;

    for _ in 0..10 {
        tokio::time::sleep(Duration::from_secs(120)).await;
    }
    assert_eq!(engine.stop_load_count(), 1);

    engine.emit(EngineEvent::Closed);
    handle
        .await
        .expect("session task joins")
        .expect("session exits cleanly");
}
