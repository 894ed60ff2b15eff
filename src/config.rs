//! JSON configuration loading and validation.
//!
//! Schema follows `original_source/config/config.go`'s `Config`/`Source`
//! structs (`postgres`, `schema`, `sources[].{prefix,name,layers}`,
//! `fontsDir`), extended with the `cache`/`server`/`logging` sections
//! this service adds on top of the bare Go program.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct Source {
    pub prefix: String,
    pub name: String,
    pub layers: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheCfg {
    #[serde(default = "default_cache_type")]
    pub r#type: String,
    pub limit: Option<usize>,
}

impl Default for CacheCfg {
    fn default() -> Self {
        CacheCfg {
            r#type: default_cache_type(),
            limit: None,
        }
    }
}

fn default_cache_type() -> String {
    "noop".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServerCfg {
    pub port: Option<u16>,
    #[serde(default)]
    pub cors: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingCfg {
    #[serde(default)]
    pub json: bool,
    pub level: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub postgres: String,
    #[serde(default)]
    pub schema: String,
    pub sources: Vec<Source>,
    #[serde(rename = "fontsDir")]
    pub fonts_dir: String,
    #[serde(default)]
    pub cache: CacheCfg,
    #[serde(default)]
    pub server: ServerCfg,
    #[serde(default)]
    pub logging: LoggingCfg,
}

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const DEFAULT_PORT: u16 = 8080;

impl Config {
    /// Load and validate a configuration file. `path` may be relative;
    /// `fontsDir` is resolved relative to the config file's own directory.
    pub fn load(path: &Path) -> Result<Config> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        let mut cfg: Config = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("parsing {}: {e}", path.display())))?;
        cfg.resolve_fonts_dir(path);
        cfg.validate()?;
        Ok(cfg)
    }

    fn resolve_fonts_dir(&mut self, config_path: &Path) {
        let fonts = PathBuf::from(&self.fonts_dir);
        if fonts.is_relative() {
            if let Some(base) = config_path.parent() {
                self.fonts_dir = base.join(fonts).to_string_lossy().into_owned();
            }
        }
    }

    pub fn port(&self) -> u16 {
        match self.server.port {
            Some(p) if p > 0 => p,
            _ => DEFAULT_PORT,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.postgres.trim().is_empty() {
            return Err(Error::Config("postgres connection string is empty".into()));
        }

        let fonts_path = Path::new(&self.fonts_dir);
        if !fonts_path.is_dir() {
            return Err(Error::Config(format!(
                "fontsDir {} does not exist or is not a directory",
                fonts_path.display()
            )));
        }

        if self.cache.r#type == "memory" {
            match self.cache.limit {
                Some(n) if n > 0 => {}
                _ => {
                    return Err(Error::Config(
                        "cache.limit must be a positive integer when cache.type = memory".into(),
                    ))
                }
            }
        } else if self.cache.r#type != "noop" {
            return Err(Error::Config(format!(
                "unknown cache.type {:?}",
                self.cache.r#type
            )));
        }

        if let Some(level) = &self.logging.level {
            if !VALID_LOG_LEVELS.contains(&level.as_str()) {
                return Err(Error::Config(format!(
                    "logging.level must be one of {VALID_LOG_LEVELS:?}, got {level:?}"
                )));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for s in &self.sources {
            if !seen.insert(&s.name) {
                return Err(Error::Config(format!("duplicate source name {:?}", s.name)));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("config.json");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn missing_postgres_is_rejected() {
        let dir = tempdir();
        let body = format!(
            r#"{{"postgres":"","sources":[],"fontsDir":"{}"}}"#,
            dir.to_string_lossy()
        );
        let path = write_config(&dir, &body);
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn memory_cache_requires_positive_limit() {
        let dir = tempdir();
        let body = format!(
            r#"{{"postgres":"postgres://x","sources":[],"fontsDir":"{}","cache":{{"type":"memory","limit":0}}}}"#,
            dir.to_string_lossy()
        );
        let path = write_config(&dir, &body);
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn relative_fonts_dir_resolves_against_config_dir() {
        let dir = tempdir();
        std::fs::create_dir(dir.join("fonts")).unwrap();
        let body = r#"{"postgres":"postgres://x","sources":[],"fontsDir":"fonts"}"#;
        let path = write_config(&dir, body);
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.fonts_dir, dir.join("fonts").to_string_lossy());
    }

    #[test]
    fn default_port_is_8080() {
        let dir = tempdir();
        let body = format!(
            r#"{{"postgres":"postgres://x","sources":[],"fontsDir":"{}"}}"#,
            dir.to_string_lossy()
        );
        let path = write_config(&dir, &body);
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.port(), 8080);
    }

    fn tempdir() -> PathBuf {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let mut dir = std::env::temp_dir();
        dir.push(format!("tilekiln-test-{}-{n}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
