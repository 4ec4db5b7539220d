//! Semantic checks on a loaded configuration.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use secrecy::ExposeSecret;

use crate::schema::TeambotConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "slack.bot_token".
    pub path: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.severity, self.path, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.to_string(),
            message: message.into(),
        });
    }
}

/// Check `config` for settings the bot cannot run with, and for likely
/// mistakes.
pub fn validate(config: &TeambotConfig, config_path: Option<&Path>) -> ValidationResult {
    let mut result = ValidationResult {
        diagnostics: Vec::new(),
        config_path: config_path.map(Path::to_path_buf),
    };

    match &config.slack.bot_token {
        _ if !config.slack.has_bot_token() => result.push(
            Severity::Error,
            "slack.bot_token",
            "bot token is required (set it in the config file or SLACK_TOKEN)",
        ),
        Some(token) if !token.expose_secret().starts_with("xoxb-") => result.push(
            Severity::Warning,
            "slack.bot_token",
            "bot tokens normally start with \"xoxb-\"",
        ),
        _ => {},
    }

    match &config.slack.app_token {
        _ if !config.slack.has_app_token() => result.push(
            Severity::Error,
            "slack.app_token",
            "app-level token is required for Socket Mode (set it in the config file or SLACK_APP_TOKEN)",
        ),
        Some(token) if !token.expose_secret().starts_with("xapp-") => result.push(
            Severity::Warning,
            "slack.app_token",
            "app-level tokens normally start with \"xapp-\"",
        ),
        _ => {},
    }

    let base_url = config.slack.api_base_url.trim();
    if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        result.push(
            Severity::Error,
            "slack.api_base_url",
            format!("\"{base_url}\" is not an http(s) URL"),
        );
    } else if base_url.starts_with("http://") {
        result.push(
            Severity::Warning,
            "slack.api_base_url",
            "plain http sends tokens unencrypted",
        );
    }

    if config.directory.path.as_os_str().is_empty() {
        result.push(Severity::Error, "directory.path", "path must not be empty");
    }

    let runtime = &config.runtime;
    if runtime.poll_interval_ms == 0 {
        result.push(
            Severity::Warning,
            "runtime.poll_interval_ms",
            "0 makes the event loop spin without sleeping",
        );
    }
    if runtime.heartbeat_secs == 0 {
        result.push(
            Severity::Warning,
            "runtime.heartbeat_secs",
            "0 sends a heartbeat on every tick",
        );
    }
    if runtime.max_backoff_ms < runtime.poll_interval_ms {
        result.push(
            Severity::Warning,
            "runtime.max_backoff_ms",
            "shorter than poll_interval_ms; retries will use poll_interval_ms",
        );
    }
    if runtime.max_consecutive_faults == 0 {
        result.push(
            Severity::Info,
            "runtime.max_consecutive_faults",
            "the first transport fault stops the bot",
        );
    }
    if config.debug {
        result.push(
            Severity::Info,
            "debug",
            "diagnostic mode: plugin faults stop the bot",
        );
    }

    result
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml_src: &str) -> TeambotConfig {
        toml::from_str(toml_src).unwrap()
    }

    fn paths(result: &ValidationResult, severity: Severity) -> Vec<&str> {
        result
            .diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .map(|d| d.path.as_str())
            .collect()
    }

    const VALID: &str = r#"
        [slack]
        bot_token = "xoxb-1"
        app_token = "xapp-1"
    "#;

    #[test]
    fn valid_config_has_no_errors() {
        let result = validate(&config(VALID), None);
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
        assert_eq!(result.count(Severity::Warning), 0);
    }

    #[test]
    fn missing_bot_token_is_an_error() {
        let result = validate(&config("[slack]\napp_token = \"xapp-1\""), None);
        assert!(result.has_errors());
        assert_eq!(paths(&result, Severity::Error), vec!["slack.bot_token"]);
    }

    #[test]
    fn odd_token_prefixes_warn() {
        let result = validate(
            &config("[slack]\nbot_token = \"xoxp-1\"\napp_token = \"xoxb-1\""),
            None,
        );
        assert!(!result.has_errors());
        assert_eq!(paths(&result, Severity::Warning), vec![
            "slack.bot_token",
            "slack.app_token"
        ]);
    }

    #[test]
    fn runtime_and_url_checks() {
        let mut cfg = config(VALID);
        cfg.slack.api_base_url = "ftp://slack".into();
        cfg.runtime.poll_interval_ms = 0;
        cfg.runtime.max_consecutive_faults = 0;
        cfg.directory.path = PathBuf::new();

        let result = validate(&cfg, Some(Path::new("teambot.toml")));
        assert_eq!(paths(&result, Severity::Error), vec![
            "slack.api_base_url",
            "directory.path"
        ]);
        assert_eq!(paths(&result, Severity::Warning), vec![
            "runtime.poll_interval_ms"
        ]);
        assert_eq!(paths(&result, Severity::Info), vec![
            "runtime.max_consecutive_faults"
        ]);
        assert_eq!(result.config_path, Some(PathBuf::from("teambot.toml")));
    }

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic {
            severity: Severity::Warning,
            path: "runtime.pacing_ms".into(),
            message: "too fast".into(),
        };
        assert_eq!(d.to_string(), "warning runtime.pacing_ms: too fast");
    }
}
