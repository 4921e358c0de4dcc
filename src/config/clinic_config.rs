//! Clinic Configuration - file locations, pipeline limits and login
//!
//! Every section has serde defaults, so a partial file (or none at all)
//! still yields a complete config.

use super::defaults;
use crate::report::ReportFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `ClinicConfig::load()` which searches:
/// 1. `$CLINIC_CONFIG` env var
/// 2. `./clinic_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicConfig {
    /// Roster data file
    #[serde(default)]
    pub storage: StorageConfig,

    /// Report template and output
    #[serde(default)]
    pub report: ReportConfig,

    /// Pipeline gate limits
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Login pair checked before any command
    #[serde(default)]
    pub auth: AuthConfig,
}

impl ClinicConfig {
    /// Load configuration using the standard search order:
    /// 1. `$CLINIC_CONFIG` environment variable
    /// 2. `./clinic_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded clinic config from CLINIC_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from CLINIC_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "CLINIC_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded clinic config from ./clinic_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./clinic_config.toml, using defaults");
                }
            }
        }

        info!("No clinic_config.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    ///
    /// Unknown keys are logged as warnings; invalid values are errors.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Clinic config saved");
        Ok(())
    }

    /// Check every section and report all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        Self::check_path(&self.storage.data_file, "storage.data_file", &mut errors);
        Self::check_path(&self.report.html_template, "report.html_template", &mut errors);
        Self::check_path(&self.report.html_output, "report.html_output", &mut errors);
        Self::check_path(&self.report.pdf_template, "report.pdf_template", &mut errors);
        Self::check_path(&self.report.pdf_output, "report.pdf_output", &mut errors);

        if !self.storage.data_file.as_os_str().is_empty() {
            for (output, name) in [
                (&self.report.html_output, "report.html_output"),
                (&self.report.pdf_output, "report.pdf_output"),
            ] {
                if *output == self.storage.data_file {
                    errors.push(format!("{name} must differ from storage.data_file"));
                }
            }
        }
        if self.auth.username.trim().is_empty() {
            errors.push("auth.username must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_path(path: &Path, name: &str, errors: &mut Vec<String>) {
        if path.as_os_str().is_empty() {
            errors.push(format!("{name} must not be empty"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(_, e) => Some(e),
            ConfigError::Parse(_, e) => Some(e),
            ConfigError::Serialize(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Roster XML opened at startup
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Re-validate every record when a file is loaded
    #[serde(default = "default_validate_on_load")]
    pub validate_on_load: bool,
}

fn default_data_file() -> PathBuf {
    PathBuf::from(defaults::DATA_FILE)
}
const fn default_validate_on_load() -> bool {
    defaults::VALIDATE_ON_LOAD
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            validate_on_load: default_validate_on_load(),
        }
    }
}

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_html_template")]
    pub html_template: PathBuf,

    #[serde(default = "default_html_output")]
    pub html_output: PathBuf,

    #[serde(default = "default_pdf_template")]
    pub pdf_template: PathBuf,

    #[serde(default = "default_pdf_output")]
    pub pdf_output: PathBuf,

    /// TrueType font embedded in PDF reports; Helvetica when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_font: Option<PathBuf>,
}

impl ReportConfig {
    pub fn template(&self, format: ReportFormat) -> &Path {
        match format {
            ReportFormat::Html => &self.html_template,
            ReportFormat::Pdf => &self.pdf_template,
        }
    }

    pub fn output(&self, format: ReportFormat) -> &Path {
        match format {
            ReportFormat::Html => &self.html_output,
            ReportFormat::Pdf => &self.pdf_output,
        }
    }
}

fn default_html_template() -> PathBuf {
    PathBuf::from(defaults::HTML_TEMPLATE)
}
fn default_html_output() -> PathBuf {
    PathBuf::from(defaults::HTML_OUTPUT)
}
fn default_pdf_template() -> PathBuf {
    PathBuf::from(defaults::PDF_TEMPLATE)
}
fn default_pdf_output() -> PathBuf {
    PathBuf::from(defaults::PDF_OUTPUT)
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            html_template: default_html_template(),
            html_output: default_html_output(),
            pdf_template: default_pdf_template(),
            pdf_output: default_pdf_output(),
            pdf_font: None,
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum wait on each gate in seconds; 0 waits forever
    #[serde(default = "default_gate_timeout_secs")]
    pub gate_timeout_secs: u64,
}

impl PipelineConfig {
    pub const fn gate_timeout(&self) -> Option<Duration> {
        match self.gate_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

const fn default_gate_timeout_secs() -> u64 {
    defaults::GATE_TIMEOUT_SECS
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gate_timeout_secs: default_gate_timeout_secs(),
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_password")]
    pub password: String,
}

fn default_username() -> String {
    defaults::USERNAME.to_string()
}
fn default_password() -> String {
    defaults::PASSWORD.to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
        }
    }
}
