//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Remove block actions from a group's blocked-members admin page.
///
/// Credentials are read from FACEBOOK_USERNAME / FACEBOOK_PASSWORD when
/// set, and prompted for otherwise (the password without echo).
#[derive(Debug, Parser)]
#[command(name = "groupunban", version, about)]
pub struct Cli {
    /// Group name as it appears in the URL path (/groups/<name>).
    /// Prompted for when omitted.
    pub group: Option<String>,

    /// Base URL of the site
    #[arg(long, default_value = "https://www.facebook.com")]
    pub home_url: String,

    /// Run the browser without a visible window
    #[arg(long)]
    pub headless: bool,

    /// Path to the Chrome/Chromium executable (autodetected by default)
    #[arg(long)]
    pub chrome: Option<PathBuf>,

    /// Seconds between DOM polls
    #[arg(long, default_value_t = 3)]
    pub poll_interval_secs: u64,

    /// Seconds a step may stall before its in-flight load is stopped
    #[arg(long, default_value_t = 300)]
    pub watchdog_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_workflow_tuning() {
        let cli = Cli::parse_from(["groupunban", "demo.group"]);
        assert_eq!(cli.group.as_deref(), Some("demo.group"));
        assert_eq!(cli.poll_interval_secs, 3);
        assert_eq!(cli.watchdog_secs, 300);
        assert!(!cli.headless);
    }

    #[test]
    fn group_may_be_omitted() {
        let cli = Cli::parse_from(["groupunban"]);
        assert!(cli.group.is_none());
    }
}
