use {
    anyhow::{Result, bail},
    clap::Subcommand,
    teambot_config::{LoadedConfig, Severity, ValidationResult, validate},
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration and report errors and warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
}

pub fn handle_config(action: ConfigAction, loaded: &LoadedConfig) -> Result<()> {
    match action {
        ConfigAction::Check { verbose } => check(loaded, verbose),
    }
}

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(loaded: &LoadedConfig, verbose: bool) -> Result<()> {
    let result = validate(&loaded.config, loaded.path.as_deref());

    match &result.config_path {
        Some(path) => eprintln!("Checking {}", path.display()),
        None => eprintln!("No config file found; checking defaults."),
    }
    if !loaded.env_overrides.is_empty() {
        eprintln!("Environment overrides: {}", loaded.env_overrides.join(", "));
    }
    eprintln!();

    let lines = render(&result, verbose);
    for line in &lines {
        eprintln!("  {line}");
    }
    if !lines.is_empty() {
        eprintln!();
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if result.has_errors() {
        bail!("configuration has {errors} error(s)");
    }
    Ok(())
}

fn render(result: &ValidationResult, verbose: bool) -> Vec<String> {
    result
        .diagnostics
        .iter()
        .filter(|d| verbose || d.severity != Severity::Info)
        .map(|d| {
            let color = match d.severity {
                Severity::Error => RED,
                Severity::Warning => YELLOW,
                Severity::Info => CYAN,
            };
            format!("{BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message)
        })
        .collect()
}
