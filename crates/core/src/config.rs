//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem rooted at `path`.
    Filesystem { path: PathBuf },
}

impl StorageConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StorageConfig::Filesystem { path } => {
                if path.as_os_str().is_empty() {
                    return Err("filesystem storage path must not be empty".to_string());
                }
                Ok(())
            }
        }
    }
}

/// Index backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IndexConfig {
    /// In-memory tabular index; contents are lost when the process exits.
    Memory,
    /// SQLite-backed relational index persisted at `path`.
    Sqlite { path: PathBuf },
}

impl IndexConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            IndexConfig::Memory => Ok(()),
            IndexConfig::Sqlite { path } => {
                if path.as_os_str().is_empty() {
                    return Err("sqlite index path must not be empty".to_string());
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_tagged_serde() {
        let config: StorageConfig =
            serde_json::from_str(r#"{"type":"filesystem","path":"/srv/pantry"}"#).unwrap();
        assert!(config.validate().is_ok());
        let StorageConfig::Filesystem { path } = config;
        assert_eq!(path, PathBuf::from("/srv/pantry"));
    }

    #[test]
    fn test_index_config_tagged_serde() {
        let memory: IndexConfig = serde_json::from_str(r#"{"type":"memory"}"#).unwrap();
        assert!(matches!(memory, IndexConfig::Memory));

        let sqlite: IndexConfig =
            serde_json::from_str(r#"{"type":"sqlite","path":"index.db"}"#).unwrap();
        assert!(sqlite.validate().is_ok());
    }

    #[test]
    fn test_empty_paths_rejected() {
        let config = StorageConfig::Filesystem {
            path: PathBuf::new(),
        };
        assert!(config.validate().is_err());

        let config = IndexConfig::Sqlite {
            path: PathBuf::new(),
        };
        assert!(config.validate().is_err());
    }
}
