use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Upper bound on request bodies, in bytes.
    pub max_body_size: usize,
    /// Snapshot files installed as collections before serving.
    pub import: Vec<PathBuf>,
    /// Seed the `test` demo collection on startup.
    pub seed_demo: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8081)),
            max_body_size: 10 * 1024 * 1024,
            import: Vec::new(),
            seed_demo: false,
        }
    }
}

impl ServerConfig {
    /// Load a TOML config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8081".parse::<SocketAddr>().unwrap());
        assert_eq!(c.max_body_size, 10 * 1024 * 1024);
        assert!(c.import.is_empty());
        assert!(!c.seed_demo);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ServerConfig::from_toml("seed_demo = true\n").unwrap();
        assert!(c.seed_demo);
        assert_eq!(c.bind_addr, ServerConfig::default().bind_addr);
    }

    #[test]
    fn full_toml() {
        let c = ServerConfig::from_toml(
            r#"
bind_addr = "0.0.0.0:9000"
max_body_size = 1024
import = ["a.ketchup", "b.ketchup"]
"#,
        )
        .unwrap();
        assert_eq!(c.bind_addr.port(), 9000);
        assert_eq!(c.max_body_size, 1024);
        assert_eq!(c.import, vec![PathBuf::from("a.ketchup"), PathBuf::from("b.ketchup")]);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = ServerConfig::from_toml("bind_addr = 12").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pragma.toml");
        std::fs::write(&path, "max_body_size = 42\n").unwrap();
        assert_eq!(ServerConfig::load(&path).unwrap().max_body_size, 42);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = ServerConfig::load(Path::new("/nonexistent/pragma.toml")).unwrap_err();
        assert!(matches!(err, ServerError::Io(_)));
    }
}
