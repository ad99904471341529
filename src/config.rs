use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;
use crate::naming::{FileNameRules, FolderNamePattern};
use crate::storage::RetryPolicy;

pub const DEFAULT_MAPPING_CSV: &str = "file_mappings.csv";

/// Raw configuration as read from `config.{yaml,toml,json}` and `INGEST_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub source_dir: PathBuf,
    pub destination_dir: PathBuf,
    pub excel_log_path: PathBuf,
    pub retry_attempts: u32,
    pub retry_delay_seconds: u64,
    pub naming_pattern: String,
    pub supported_extensions: Vec<String>,
    pub file_naming_pattern: String,
    #[serde(default)]
    pub file_mapping_csv: Option<PathBuf>,
}

pub fn load_configuration(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let file = match path {
        Some(path) => ConfigFile::from(path).required(true),
        None => ConfigFile::with_name("config").required(false),
    };

    let builder = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix("INGEST")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("supported_extensions"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Validated, immutable configuration for one run. Patterns are compiled once
/// here and shared by every validation call.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub source_dir: PathBuf,
    pub destination_dir: PathBuf,
    pub excel_log_path: PathBuf,
    pub file_mapping_csv: PathBuf,
    pub retry: RetryPolicy,
    pub folder_pattern: FolderNamePattern,
    pub file_rules: FileNameRules,
}

impl AppConfig {
    pub fn compile(&self) -> Result<IngestConfig, Error> {
        require_path("source_dir", &self.source_dir)?;
        require_path("destination_dir", &self.destination_dir)?;
        require_path("excel_log_path", &self.excel_log_path)?;

        if !self.source_dir.is_dir() {
            return Err(Error::InvalidConfig(format!(
                "source_dir {} is not a directory",
                self.source_dir.display()
            )));
        }
        if self.source_dir == self.destination_dir {
            return Err(Error::InvalidConfig(
                "source_dir and destination_dir must differ".to_string(),
            ));
        }
        if self.retry_attempts == 0 {
            return Err(Error::InvalidConfig(
                "retry_attempts must be at least 1".to_string(),
            ));
        }

        let file_mapping_csv = match &self.file_mapping_csv {
            Some(path) if !path.as_os_str().is_empty() => path.clone(),
            _ => self.destination_dir.join(DEFAULT_MAPPING_CSV),
        };

        Ok(IngestConfig {
            source_dir: self.source_dir.clone(),
            destination_dir: self.destination_dir.clone(),
            excel_log_path: self.excel_log_path.clone(),
            file_mapping_csv,
            retry: RetryPolicy::new(
                self.retry_attempts,
                Duration::from_secs(self.retry_delay_seconds),
            ),
            folder_pattern: FolderNamePattern::new(&self.naming_pattern)?,
            file_rules: FileNameRules::new(&self.file_naming_pattern, &self.supported_extensions)?,
        })
    }
}

fn require_path(field: &str, path: &Path) -> Result<(), Error> {
    if path.as_os_str().is_empty() {
        return Err(Error::InvalidConfig(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn app_config(source: &Path, destination: &Path) -> AppConfig {
        AppConfig {
            source_dir: source.to_path_buf(),
            destination_dir: destination.to_path_buf(),
            excel_log_path: destination.join("log.xlsx"),
            retry_attempts: 3,
            retry_delay_seconds: 5,
            naming_pattern: r"^\d{4}(\.\d{2})? .+$".to_string(),
            supported_extensions: vec!["las".to_string(), "LAZ".to_string()],
            file_naming_pattern: r"^(?P<project>\d{4})_(?P<date>\d{6})_(?P<floor>Floor \d+|Exterior|Basement)(?:_(?P<scope>.+))?$".to_string(),
            file_mapping_csv: None,
        }
    }

    #[test]
    fn test_compile_defaults_mapping_csv_into_destination() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("inbox");
        fs::create_dir(&source).unwrap();
        let destination = tmp.path().join("archive");

        let compiled = app_config(&source, &destination).compile().unwrap();
        assert_eq!(compiled.file_mapping_csv, destination.join("file_mappings.csv"));
        assert_eq!(compiled.retry.attempts, 3);
        assert_eq!(compiled.retry.delay, Duration::from_secs(5));
        assert!(compiled.file_rules.extensions().contains("laz"));
    }

    #[test]
    fn test_compile_rejects_bad_settings() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("inbox");
        fs::create_dir(&source).unwrap();
        let destination = tmp.path().join("archive");

        let mut cfg = app_config(&source, &destination);
        cfg.retry_attempts = 0;
        assert!(matches!(cfg.compile(), Err(Error::InvalidConfig(_))));

        let mut cfg = app_config(&source, &destination);
        cfg.naming_pattern = "([".to_string();
        assert!(matches!(cfg.compile(), Err(Error::Pattern { .. })));

        let cfg = app_config(&tmp.path().join("missing"), &destination);
        assert!(matches!(cfg.compile(), Err(Error::InvalidConfig(_))));

        let cfg = app_config(&source, &source);
        assert!(matches!(cfg.compile(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_load_configuration_from_yaml() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("ingest.yaml");
        fs::write(
            &path,
            r#"
source_dir: /data/inbox
destination_dir: /data/archive
excel_log_path: /data/archive/log.xlsx
retry_attempts: 3
retry_delay_seconds: 5
naming_pattern: '^\d{4}(\.\d{2})? .+$'
supported_extensions: [las, laz]
file_naming_pattern: '^(?P<project>\d{4})_(?P<date>\d{6})_(?P<floor>Exterior)$'
"#,
        )
        .unwrap();

        let cfg = load_configuration(Some(path.as_path())).unwrap();
        assert_eq!(cfg.source_dir, PathBuf::from("/data/inbox"));
        assert_eq!(cfg.supported_extensions, vec!["las", "laz"]);
        assert_eq!(cfg.file_mapping_csv, None);
    }
}
