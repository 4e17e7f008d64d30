// Configuration loading and parsing (rules.toml, app.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::player::Role;
use crate::rules::TeamRules;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub rules: TeamRules,
    pub data: DataPaths,
    pub contest: ContestConfig,
    /// Directory the relative data paths are resolved against.
    pub base_dir: PathBuf,
}

impl Config {
    /// Resolve a configured path against `base_dir` unless it is absolute.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }

    pub fn matches_path(&self) -> PathBuf {
        self.resolve(&self.data.matches)
    }

    pub fn players_dir(&self) -> PathBuf {
        self.resolve(&self.data.players_dir)
    }
}

// ---------------------------------------------------------------------------
// rules.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[rules]` table in rules.toml.
#[derive(Debug, Clone, Deserialize)]
struct RulesFile {
    rules: TeamRules,
}

// ---------------------------------------------------------------------------
// app.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct AppFile {
    data: DataPaths,
    #[serde(default)]
    contest: ContestConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    /// JSON file holding the match list.
    pub matches: String,
    /// Directory holding `<match_id>.json` or `<match_id>.csv` player lists.
    pub players_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContestConfig {
    /// Fee charged per team registered into a contest.
    pub entry_fee: u32,
}

impl Default for ContestConfig {
    fn default() -> Self {
        ContestConfig { entry_fee: 49 }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/app.toml` and (optionally)
/// `config/rules.toml`, both relative to `base_dir`.
///
/// A missing rules.toml falls back to the standard 11-player format.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- app.toml (required) ---
    let app_path = config_dir.join("app.toml");
    let app_text = read_file(&app_path)?;
    let app_file: AppFile = toml::from_str(&app_text).map_err(|e| ConfigError::ParseError {
        path: app_path.clone(),
        source: e,
    })?;

    // --- rules.toml (optional) ---
    let rules_path = config_dir.join("rules.toml");
    let rules = if rules_path.exists() {
        let rules_text = read_file(&rules_path)?;
        let rules_file: RulesFile =
            toml::from_str(&rules_text).map_err(|e| ConfigError::ParseError {
                path: rules_path.clone(),
                source: e,
            })?;
        rules_file.rules
    } else {
        TeamRules::default()
    };

    validate_rules(&rules)?;

    Ok(Config {
        rules,
        data: app_file.data,
        contest: app_file.contest,
        base_dir: base_dir.to_path_buf(),
    })
}

/// Built-in content for each file `config/` may hold, used when `defaults/`
/// has no copy of its own.
const SEED_FILES: [(&str, &str); 2] = [
    ("app.toml", include_str!("../../../defaults/app.toml")),
    ("rules.toml", include_str!("../../../defaults/rules.toml")),
];

/// Create any missing file in `config/`, taking it from `defaults/` when
/// present and from the built-in copy otherwise. Existing files are left
/// alone. Returns the files written.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let config_dir = base_dir.join("config");
    let defaults_dir = base_dir.join("defaults");

    let mut written = Vec::new();
    for (name, builtin) in SEED_FILES {
        let target = config_dir.join(name);
        if target.exists() {
            continue;
        }
        let source = defaults_dir.join(name);
        let content = if source.is_file() {
            std::fs::read_to_string(&source).map_err(|e| ConfigError::DefaultsCopyError {
                message: format!("failed to read {}: {e}", source.display()),
            })?
        } else {
            builtin.to_string()
        };

        std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", config_dir.display()),
        })?;
        std::fs::write(&target, content).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to write {}: {e}", target.display()),
        })?;
        written.push(target);
    }

    Ok(written)
}

/// Load config from the working directory when it carries `config/` or
/// `defaults/`, otherwise from the platform config directory, seeding
/// whichever is chosen on first run.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    let platform = directories::ProjectDirs::from("", "", "crickteam")
        .map(|dirs| dirs.config_dir().to_path_buf());
    let base = resolve_base_dir(&cwd, platform).ok_or(ConfigError::FileNotFound { path: cwd })?;

    let seeded = ensure_config_files(&base)?;
    if !seeded.is_empty() {
        info!(base = %base.display(), files = seeded.len(), "config seeded");
    }
    load_config_from(&base)
}

fn resolve_base_dir(cwd: &Path, platform: Option<PathBuf>) -> Option<PathBuf> {
    if cwd.join("config").exists() || cwd.join("defaults").exists() {
        return Some(cwd.to_path_buf());
    }
    platform
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject rule tables no roster could ever satisfy.
pub fn validate_rules(rules: &TeamRules) -> Result<(), ConfigError> {
    if rules.total_players == 0 {
        return Err(ConfigError::ValidationError {
            field: "rules.total_players".into(),
            message: "must be greater than 0".into(),
        });
    }

    if rules.max_credits.is_nan() || rules.max_credits <= 0.0 {
        return Err(ConfigError::ValidationError {
            field: "rules.max_credits".into(),
            message: format!("must be > 0, got {}", rules.max_credits),
        });
    }

    if rules.max_per_real_team == 0 {
        return Err(ConfigError::ValidationError {
            field: "rules.max_per_real_team".into(),
            message: "must be greater than 0".into(),
        });
    }

    let mut min_sum = 0;
    let mut max_sum = 0;
    for role in Role::ALL {
        let b = rules.bounds(role);
        if b.min > b.max {
            return Err(ConfigError::ValidationError {
                field: format!("rules.roles.{}", role_key(role)),
                message: format!("min ({}) exceeds max ({})", b.min, b.max),
            });
        }
        min_sum += b.min;
        max_sum += b.max;
    }

    if min_sum > rules.total_players || max_sum < rules.total_players {
        return Err(ConfigError::ValidationError {
            field: "rules.roles".into(),
            message: format!(
                "role bounds admit {min_sum}..={max_sum} players, need {}",
                rules.total_players
            ),
        });
    }

    Ok(())
}

fn role_key(role: Role) -> &'static str {
    match role {
        Role::WicketKeeper => "wicket_keeper",
        Role::Batsman => "batsman",
        Role::AllRounder => "all_rounder",
        Role::Bowler => "bowler",
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RoleBounds;
    use std::fs;
    use tempfile::TempDir;

    const APP_TOML: &str = r#"
[data]
matches = "data/matches.json"
players_dir = "data/players"

[contest]
entry_fee = 49
"#;

    const RULES_TOML: &str = r#"
[rules]
total_players = 11
max_credits = 100.0
max_per_real_team = 7

[rules.roles.wicket_keeper]
min = 1
max = 4

[rules.roles.batsman]
min = 3
max = 6

[rules.roles.all_rounder]
min = 1
max = 4

[rules.roles.bowler]
min = 3
max = 6
"#;

    fn write_config(dir: &Path, app: Option<&str>, rules: Option<&str>) {
        let config_dir = dir.join("config");
        fs::create_dir_all(&config_dir).unwrap();
        if let Some(app) = app {
            fs::write(config_dir.join("app.toml"), app).unwrap();
        }
        if let Some(rules) = rules {
            fs::write(config_dir.join("rules.toml"), rules).unwrap();
        }
    }

    #[test]
    fn load_app_and_rules() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), Some(APP_TOML), Some(RULES_TOML));

        let config = load_config_from(tmp.path()).expect("should load valid config");
        assert_eq!(config.data.matches, "data/matches.json");
        assert_eq!(config.contest.entry_fee, 49);
        assert_eq!(config.rules.bounds(Role::WicketKeeper), RoleBounds::new(1, 4));
        assert_eq!(config.rules.bounds(Role::AllRounder), RoleBounds::new(1, 4));
        assert_eq!(
            config.matches_path(),
            tmp.path().join("data/matches.json")
        );
        assert_eq!(config.players_dir(), tmp.path().join("data/players"));
    }

    #[test]
    fn missing_rules_toml_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), Some(APP_TOML), None);

        let config = load_config_from(tmp.path()).unwrap();
        assert_eq!(config.rules, TeamRules::default());
    }

    #[test]
    fn missing_contest_section_uses_default_fee() {
        let tmp = TempDir::new().unwrap();
        let app = "[data]\nmatches = \"m.json\"\nplayers_dir = \"p\"\n";
        write_config(tmp.path(), Some(app), None);

        let config = load_config_from(tmp.path()).unwrap();
        assert_eq!(config.contest.entry_fee, 49);
    }

    #[test]
    fn file_not_found_for_missing_app_toml() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), None, Some(RULES_TOML));

        let err = load_config_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), Some("[data\nmatches ="), None);

        let err = load_config_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn rejects_min_above_max() {
        let mut rules = TeamRules::default();
        rules.roles.bowler = RoleBounds::new(5, 4);
        match validate_rules(&rules) {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert_eq!(field, "rules.roles.bowler")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unsatisfiable_minimums() {
        let mut rules = TeamRules::default();
        rules.roles.all_rounder = RoleBounds::new(5, 6);
        // 1 + 3 + 5 + 3 = 12 > 11
        let err = validate_rules(&rules).unwrap_err();
        assert!(err.to_string().contains("rules.roles"));
    }

    #[test]
    fn rejects_zero_credits_and_caps() {
        let mut rules = TeamRules::default();
        rules.max_credits = 0.0;
        assert!(validate_rules(&rules).is_err());

        let mut rules = TeamRules::default();
        rules.max_per_real_team = 0;
        assert!(validate_rules(&rules).is_err());

        let mut rules = TeamRules::default();
        rules.total_players = 0;
        assert!(validate_rules(&rules).is_err());
    }

    #[test]
    fn default_rules_are_valid() {
        assert!(validate_rules(&TeamRules::default()).is_ok());
    }

    #[test]
    fn ensure_config_files_copies_from_defaults() {
        let tmp = TempDir::new().unwrap();
        let defaults = tmp.path().join("defaults");
        fs::create_dir_all(&defaults).unwrap();
        fs::write(defaults.join("app.toml"), APP_TOML).unwrap();
        fs::write(defaults.join("rules.toml"), RULES_TOML).unwrap();
        fs::write(defaults.join("local.toml.example"), "# example").unwrap();

        let written = ensure_config_files(tmp.path()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(!tmp.path().join("config/local.toml.example").exists());

        let config = load_config_from(tmp.path()).unwrap();
        assert_eq!(config.rules.bounds(Role::WicketKeeper), RoleBounds::new(1, 4));
    }

    #[test]
    fn ensure_config_files_skips_existing() {
        let tmp = TempDir::new().unwrap();
        let defaults = tmp.path().join("defaults");
        fs::create_dir_all(&defaults).unwrap();
        fs::write(defaults.join("app.toml"), APP_TOML).unwrap();
        write_config(tmp.path(), Some("# customised"), Some(RULES_TOML));

        let written = ensure_config_files(tmp.path()).unwrap();
        assert!(written.is_empty());
        let kept = fs::read_to_string(tmp.path().join("config/app.toml")).unwrap();
        assert_eq!(kept, "# customised");
    }

    #[test]
    fn ensure_config_files_seeds_builtins_into_empty_dir() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("platform/crickteam");

        let written = ensure_config_files(&base).unwrap();
        assert_eq!(written.len(), 2);
        assert!(ensure_config_files(&base).unwrap().is_empty());

        let config = load_config_from(&base).unwrap();
        assert_eq!(config.rules, TeamRules::default());
        assert_eq!(config.contest.entry_fee, 49);
        assert_eq!(config.matches_path(), base.join("data/matches.json"));
    }

    #[test]
    fn base_dir_prefers_working_directory_with_config() {
        let tmp = TempDir::new().unwrap();
        let platform = Some(PathBuf::from("/nonexistent/crickteam"));

        assert_eq!(
            resolve_base_dir(tmp.path(), platform.clone()),
            platform,
            "bare working directory falls back to the platform dir"
        );

        fs::create_dir_all(tmp.path().join("defaults")).unwrap();
        assert_eq!(
            resolve_base_dir(tmp.path(), platform),
            Some(tmp.path().to_path_buf())
        );
        assert_eq!(resolve_base_dir(Path::new("/nonexistent"), None), None);
    }
}
