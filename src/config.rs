//! User configuration (`config.toml`).

use directories::ProjectDirs;
use gridcalc_engine::engine::EvalOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub engine: EvalOptions,
}

/// Load the config from `config_file`, or from the user config dir when no
/// file is given. Problems are reported as warnings and the defaults are used.
pub fn load_config(config_file: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let Some(path) = config_file.map(Path::to_path_buf).or_else(user_config_path) else {
        return (Config::default(), warnings);
    };

    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Config::default(), warnings);
    }

    let config = match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            None
        }
        Ok(_) => match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                    None
                }
            },
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                None
            }
        },
        Err(err) => {
            warnings.push(format!(
                "Failed to read metadata for {}: {}",
                path.display(),
                err
            ));
            None
        }
    };

    tracing::debug!(path = %path.display(), loaded = config.is_some(), "config");
    (config.unwrap_or_default(), warnings)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "gridcalc")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).expect("write temp config");
        (dir, path)
    }

    #[test]
    fn load_config_reads_engine_section() {
        let (_dir, path) = write_config("[engine]\nmax_depth = 16\n");
        let (config, warnings) = load_config(Some(path.as_path()));
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.engine.max_depth, 16);
    }

    #[test]
    fn load_config_empty_file_uses_defaults() {
        let (_dir, path) = write_config("");
        let (config, warnings) = load_config(Some(path.as_path()));
        assert!(warnings.is_empty());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_config_rejects_unknown_keys() {
        let (_dir, path) = write_config("[engine]\nmax_dept = 3\n");
        let (config, warnings) = load_config(Some(path.as_path()));
        assert_eq!(config, Config::default());
        assert!(warnings.iter().any(|w| w.contains("Failed to parse")));
    }

    #[test]
    fn load_config_rejects_oversized_file() {
        let oversized = "#".repeat(MAX_CONFIG_FILE_BYTES as usize + 1);
        let (_dir, path) = write_config(&oversized);
        let (config, warnings) = load_config(Some(path.as_path()));
        assert_eq!(config, Config::default());
        assert!(
            warnings
                .iter()
                .any(|w| w.contains("file too large") && w.contains("Refusing to read"))
        );
    }

    #[test]
    fn load_config_missing_explicit_file_warns() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let (_, warnings) = load_config(Some(dir.path().join("nope.toml").as_path()));
        assert!(warnings.iter().any(|w| w.contains("not found")));
    }
}
