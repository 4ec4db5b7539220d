use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{
    Error, Result,
    env_subst::substitute_env_with,
    schema::TeambotConfig,
};

/// Standard config file names, checked in order.
pub const CONFIG_FILENAMES: &[&str] = &[
    "teambot.toml",
    "teambot.yaml",
    "teambot.yml",
    "teambot.json",
];

/// Environment variables that override file values.
pub const ENV_OVERRIDES: &[&str] = &[
    "SLACK_TOKEN",
    "SLACK_APP_TOKEN",
    "TEAM_DB_FILE",
    "LOGFILE",
    "DEBUG",
];

/// A config plus where its values came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TeambotConfig,
    /// File the config was read from, if any.
    pub path: Option<PathBuf>,
    /// Environment variables that replaced file or default values.
    pub env_overrides: Vec<&'static str>,
}

/// Load one config file (any supported format) using the process
/// environment for `${VAR}` substitution.
pub fn load_config(path: &Path) -> Result<TeambotConfig> {
    load_config_with(path, &env_lookup)
}

fn load_config_with(path: &Path, lookup: &dyn Fn(&str) -> Option<String>) -> Result<TeambotConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
    let raw = substitute_env_with(&raw, lookup);
    parse_config(&raw, path)
}

/// Load from `explicit` if given, otherwise from the first discovered file,
/// then apply environment overrides.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let search = search_dirs();
    load_with(explicit, &search, &env_lookup)
}

/// [`load`] with explicit search directories and environment lookup.
///
/// An explicit path that cannot be loaded is an error. A discovered file that
/// fails to parse is logged and defaults are used instead.
pub fn load_with(
    explicit: Option<&Path>,
    search: &[PathBuf],
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<LoadedConfig> {
    let (mut config, path) = match explicit {
        Some(path) => (load_config_with(path, lookup)?, Some(path.to_path_buf())),
        None => match find_config_file(search) {
            Some(path) => {
                debug!(path = %path.display(), "loading config");
                match load_config_with(&path, lookup) {
                    Ok(config) => (config, Some(path)),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                        (TeambotConfig::default(), None)
                    },
                }
            },
            None => {
                debug!("no config file found, using defaults");
                (TeambotConfig::default(), None)
            },
        },
    };

    let env_overrides = apply_env_overrides(&mut config, lookup);
    if let Some(path) = &path
        && !env_overrides.is_empty()
    {
        warn!(
            path = %path.display(),
            vars = ?env_overrides,
            "configuration is split between a file and the environment; environment values win"
        );
    }

    Ok(LoadedConfig {
        config,
        path,
        env_overrides,
    })
}

/// Apply the legacy environment variables. Returns the ones that were set.
pub fn apply_env_overrides(
    config: &mut TeambotConfig,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Vec<&'static str> {
    let mut applied = Vec::new();
    for &var in ENV_OVERRIDES {
        let Some(value) = lookup(var) else {
            continue;
        };
        match var {
            "SLACK_TOKEN" => config.slack.bot_token = Some(Secret::new(value)),
            "SLACK_APP_TOKEN" => config.slack.app_token = Some(Secret::new(value)),
            "TEAM_DB_FILE" => config.directory.path = PathBuf::from(value),
            "LOGFILE" => config.log_file = Some(PathBuf::from(value)),
            "DEBUG" => config.debug = parse_flag(&value),
            _ => continue,
        }
        applied.push(var);
    }
    applied
}

/// `true`/`1` (any case, surrounding whitespace ignored) enable a flag.
fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Returns the user-global config directory (`~/.config/teambot/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "teambot").map(|d| d.config_dir().to_path_buf())
}

/// Project-local directory first, then the user-global one.
fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from(".")];
    dirs.extend(config_dir());
    dirs
}

/// First existing config file across `dirs`, trying each file name in order.
pub fn find_config_file(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)))
        .find(|p| p.is_file())
}

fn parse_config(raw: &str, path: &Path) -> Result<TeambotConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::UnsupportedFormat {
            ext: ext.to_string(),
        }),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, secrecy::ExposeSecret, std::collections::HashMap};

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[rstest]
    #[case("teambot.toml", "debug = true\n[directory]\npath = \"/srv/teams.db\"\n")]
    #[case("teambot.yaml", "debug: true\ndirectory:\n  path: /srv/teams.db\n")]
    #[case("teambot.json", r#"{"debug": true, "directory": {"path": "/srv/teams.db"}}"#)]
    fn loads_every_format(#[case] name: &str, #[case] body: &str) {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), name, body);

        let loaded = load_with(Some(&path), &[], &env(&[])).unwrap();
        assert!(loaded.config.debug);
        assert_eq!(loaded.config.directory.path, PathBuf::from("/srv/teams.db"));
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn substitutes_placeholders() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(
            tmp.path(),
            "teambot.toml",
            "[slack]\nbot_token = \"${BOT}\"\n",
        );

        let loaded = load_with(Some(&path), &[], &env(&[("BOT", "xoxb-42")])).unwrap();
        let token = loaded.config.slack.bot_token.unwrap();
        assert_eq!(token.expose_secret(), "xoxb-42");
        assert!(loaded.env_overrides.is_empty());
    }

    #[test]
    fn env_overrides_win_over_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(
            tmp.path(),
            "teambot.toml",
            "debug = true\nlog_file = \"file.log\"\n[slack]\nbot_token = \"xoxb-file\"\n",
        );
        let lookup = env(&[
            ("SLACK_TOKEN", "xoxb-env"),
            ("TEAM_DB_FILE", "env.db"),
            ("DEBUG", "no"),
        ]);

        let loaded = load_with(Some(&path), &[], &lookup).unwrap();
        let cfg = &loaded.config;
        assert_eq!(
            cfg.slack.bot_token.as_ref().unwrap().expose_secret(),
            "xoxb-env"
        );
        assert_eq!(cfg.directory.path, PathBuf::from("env.db"));
        assert!(!cfg.debug);
        assert_eq!(cfg.log_file, Some(PathBuf::from("file.log")));
        assert_eq!(loaded.env_overrides, vec![
            "SLACK_TOKEN",
            "TEAM_DB_FILE",
            "DEBUG"
        ]);
    }

    #[rstest]
    #[case("true", true)]
    #[case("TRUE", true)]
    #[case(" 1 ", true)]
    #[case("0", false)]
    #[case("yes", false)]
    #[case("", false)]
    fn debug_flag_values(#[case] value: &str, #[case] expected: bool) {
        let mut cfg = TeambotConfig::default();
        apply_env_overrides(&mut cfg, &env(&[("DEBUG", value)]));
        assert_eq!(cfg.debug, expected);
    }

    #[test]
    fn env_only_config() {
        let tmp = tempfile::tempdir().unwrap();
        let lookup = env(&[("SLACK_TOKEN", "xoxb-env"), ("LOGFILE", "/tmp/bot.log")]);

        let loaded = load_with(None, &[tmp.path().to_path_buf()], &lookup).unwrap();
        assert!(loaded.path.is_none());
        assert!(loaded.config.slack.has_bot_token());
        assert_eq!(loaded.config.log_file, Some(PathBuf::from("/tmp/bot.log")));
    }

    #[test]
    fn discovery_prefers_earlier_dirs_and_names() {
        let local = tempfile::tempdir().unwrap();
        let global = tempfile::tempdir().unwrap();
        write(global.path(), "teambot.toml", "debug = false\n");
        let yaml = write(local.path(), "teambot.yaml", "debug: true\n");
        let dirs = vec![local.path().to_path_buf(), global.path().to_path_buf()];

        assert_eq!(find_config_file(&dirs), Some(yaml));
        let toml = write(local.path(), "teambot.toml", "debug = true\n");
        assert_eq!(find_config_file(&dirs), Some(toml));
    }

    #[test]
    fn broken_discovered_file_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "teambot.toml", "debug = [not toml");

        let loaded = load_with(None, &[tmp.path().to_path_buf()], &env(&[])).unwrap();
        assert!(loaded.path.is_none());
        assert!(!loaded.config.debug);
    }

    #[test]
    fn explicit_path_errors_are_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(matches!(
            load_with(Some(&missing), &[], &env(&[])),
            Err(Error::Read { .. })
        ));

        let ini = write(tmp.path(), "teambot.ini", "debug=1");
        assert!(matches!(
            load_with(Some(&ini), &[], &env(&[])),
            Err(Error::UnsupportedFormat { .. })
        ));
    }
}
