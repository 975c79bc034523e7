//! Runtime configuration
//!
//! The server's CLI layer resolves flags and environment variables
//! (`ADMIN_TOKEN`, `TRIAGE_*`) and hands the raw values to `AppConfig::build`.

use crate::error::{Error, Result};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Placeholder admin token used when `ADMIN_TOKEN` is unset
pub const DEFAULT_ADMIN_TOKEN: &str = "changeme";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_STATIC_ROOT: &str = "./public";

const DB_FILE: &str = "reports.db";
const XLSX_FILE: &str = "reports.xlsx";

/// Server configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub admin_token: String,
    pub data_dir: PathBuf,
    pub static_root: PathBuf,
    pub host: IpAddr,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            admin_token: DEFAULT_ADMIN_TOKEN.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            static_root: PathBuf::from(DEFAULT_STATIC_ROOT),
            host: IpAddr::from([127, 0, 0, 1]),
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    /// Build configuration from already-resolved raw values
    ///
    /// Paths may start with `~`; the host must be an IP address.
    pub fn build(
        admin_token: String,
        data_dir: &str,
        static_root: &str,
        host: &str,
        port: u16,
    ) -> Result<Self> {
        let host = host
            .parse::<IpAddr>()
            .map_err(|_| Error::config(format!("Invalid host address: {}", host)))?;

        Ok(Self {
            admin_token,
            data_dir: expand_path(data_dir),
            static_root: expand_path(static_root),
            host,
            port,
        })
    }

    /// Use a single directory for both data and static files
    pub fn with_root(root: &Path, admin_token: impl Into<String>) -> Self {
        Self {
            admin_token: admin_token.into(),
            data_dir: root.to_path_buf(),
            static_root: root.to_path_buf(),
            ..Self::default()
        }
    }

    /// SQLite database file
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    /// Spreadsheet export file
    pub fn xlsx_path(&self) -> PathBuf {
        self.data_dir.join(XLSX_FILE)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// True when running with the well-known placeholder token
    pub fn uses_default_token(&self) -> bool {
        self.admin_token == DEFAULT_ADMIN_TOKEN
    }

    /// Check a caller-supplied admin token
    pub fn token_matches(&self, token: Option<&str>) -> bool {
        token == Some(self.admin_token.as_str())
    }
}

/// Expand a leading `~` to the home directory
fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.admin_token, "changeme");
        assert!(config.uses_default_token());
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8000");
        assert!(config.db_path().ends_with("reports.db"));
        assert!(config.xlsx_path().ends_with("reports.xlsx"));
    }

    #[test]
    fn test_build_paths() {
        let config =
            AppConfig::build("s3cret".into(), "/tmp/triage-data", "/srv/www", "0.0.0.0", 9090)
                .unwrap();
        assert!(!config.uses_default_token());
        assert_eq!(config.db_path(), PathBuf::from("/tmp/triage-data/reports.db"));
        assert_eq!(config.static_root, PathBuf::from("/srv/www"));
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9090");
    }

    #[test]
    fn test_build_rejects_hostname() {
        let result = AppConfig::build("t".into(), "./data", "./public", "localhost", 8000);
        assert!(result.is_err());
    }

    #[test]
    fn test_tilde_expansion() {
        let config = AppConfig::build("t".into(), "~/triage", "./public", "127.0.0.1", 8000).unwrap();
        assert!(config.data_dir.ends_with("triage"));
        if std::env::var_os("HOME").is_some() {
            assert!(!config.data_dir.to_string_lossy().starts_with('~'));
        }
    }

    #[test]
    fn test_token_matches() {
        let config = AppConfig::with_root(Path::new("/tmp"), "abc");
        assert!(config.token_matches(Some("abc")));
        assert!(!config.token_matches(Some("abd")));
        assert!(!config.token_matches(Some("")));
        assert!(!config.token_matches(None));
    }
}
