//! Configuration Vault – reads/writes `~/.bankviz/config.toml`.

use bankviz_runtime::Pacing;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Persisted user configuration stored in `~/.bankviz/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Pause before the first step of an animated run.
    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u64,

    /// Pause after a process is found able to execute.
    #[serde(default = "default_evaluate_delay_ms")]
    pub evaluate_delay_ms: u64,

    /// Pause after a process releases its allocation.
    #[serde(default = "default_select_delay_ms")]
    pub select_delay_ms: u64,

    /// Print the need matrix before every run.
    #[serde(default = "default_true")]
    pub show_need_matrix: bool,

    /// Colored terminal output.
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_start_delay_ms() -> u64 {
    1000
}
fn default_evaluate_delay_ms() -> u64 {
    1500
}
fn default_select_delay_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_delay_ms: default_start_delay_ms(),
            evaluate_delay_ms: default_evaluate_delay_ms(),
            select_delay_ms: default_select_delay_ms(),
            show_need_matrix: true,
            color: true,
        }
    }
}

impl Config {
    /// Playback pacing derived from the configured delays.
    pub fn pacing(&self) -> Pacing {
        Pacing {
            start_delay: Duration::from_millis(self.start_delay_ms),
            evaluate_delay: Duration::from_millis(self.evaluate_delay_ms),
            select_delay: Duration::from_millis(self.select_delay_ms),
        }
    }

    /// Scale every delay by `percent` / 100 (the wizard's speed presets).
    pub fn set_speed_percent(&mut self, percent: u64) {
        self.start_delay_ms = default_start_delay_ms() * percent / 100;
        self.evaluate_delay_ms = default_evaluate_delay_ms() * percent / 100;
        self.select_delay_ms = default_select_delay_ms() * percent / 100;
    }
}

/// Return the path to `~/.bankviz/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".bankviz").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Load the config, falling back to defaults (with env overrides) when the
/// file is missing.
pub fn load_or_default() -> Result<Config, String> {
    Ok(load()?.unwrap_or_else(|| {
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        cfg
    }))
}

/// Apply `BANKVIZ_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `BANKVIZ_START_DELAY_MS` | `start_delay_ms` |
/// | `BANKVIZ_EVALUATE_DELAY_MS` | `evaluate_delay_ms` |
/// | `BANKVIZ_SELECT_DELAY_MS` | `select_delay_ms` |
/// | `BANKVIZ_NO_COLOR` | `color = false` (any value) |
///
/// Unparseable numbers are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`, keyed by variable name.
pub(crate) fn apply_overrides<F>(cfg: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let millis = |name: &str| lookup(name)?.trim().parse::<u64>().ok();
    if let Some(ms) = millis("BANKVIZ_START_DELAY_MS") {
        cfg.start_delay_ms = ms;
    }
    if let Some(ms) = millis("BANKVIZ_EVALUATE_DELAY_MS") {
        cfg.evaluate_delay_ms = ms;
    }
    if let Some(ms) = millis("BANKVIZ_SELECT_DELAY_MS") {
        cfg.select_delay_ms = ms;
    }
    if lookup("BANKVIZ_NO_COLOR").is_some() {
        cfg.color = false;
    }
}

/// Save the config to disk, creating `~/.bankviz/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_pacing_matches_classic_demo() {
        let pacing = Config::default().pacing();
        assert_eq!(pacing, Pacing::default());
    }

    #[test]
    fn speed_percent_scales_all_delays() {
        let mut cfg = Config::default();
        cfg.set_speed_percent(50);
        assert_eq!(cfg.start_delay_ms, 500);
        assert_eq!(cfg.evaluate_delay_ms, 750);
        assert_eq!(cfg.select_delay_ms, 500);
        cfg.set_speed_percent(0);
        assert_eq!(cfg.pacing(), Pacing::instant());
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path).expect("file metadata").permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        let dir_mode = std::fs::metadata(path.parent().unwrap())
            .expect("dir metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn roundtrip_custom_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = Config {
            start_delay_ms: 10,
            evaluate_delay_ms: 20,
            select_delay_ms: 30,
            show_need_matrix: false,
            color: true,
        };
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.select_delay_ms, 30);
        assert!(!loaded.show_need_matrix);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "select_delay_ms = 5\n").unwrap();

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.select_delay_ms, 5);
        assert_eq!(loaded.start_delay_ms, 1000);
        assert!(loaded.show_need_matrix);
    }

    #[test]
    fn config_path_points_to_bankviz_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".bankviz"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    // ---- overrides

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn overrides_change_delays() {
        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            vars(&[
                ("BANKVIZ_EVALUATE_DELAY_MS", "42"),
                ("BANKVIZ_SELECT_DELAY_MS", " 7 "),
            ]),
        );
        assert_eq!(cfg.evaluate_delay_ms, 42);
        assert_eq!(cfg.select_delay_ms, 7);
        assert_eq!(cfg.start_delay_ms, 1000);
    }

    #[test]
    fn overrides_ignore_invalid_delay() {
        let mut cfg = Config::default();
        apply_overrides(&mut cfg, vars(&[("BANKVIZ_START_DELAY_MS", "soon")]));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn overrides_disable_color_for_any_value() {
        let mut cfg = Config::default();
        apply_overrides(&mut cfg, vars(&[("BANKVIZ_NO_COLOR", "")]));
        assert!(!cfg.color);
    }

    #[test]
    fn no_overrides_leave_config_alone() {
        let mut cfg = Config::default();
        apply_overrides(&mut cfg, |_| None);
        assert_eq!(cfg, Config::default());
    }
}
