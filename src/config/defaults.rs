//! Built-in default values.
//!
//! Grouped by subsystem. These apply whenever no config file is found or a
//! key is left out of it.

// ============================================================================
// Config Loading
// ============================================================================

/// Environment variable holding the path of the config file.
pub const CONFIG_ENV: &str = "CLINIC_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "clinic_config.toml";

// ============================================================================
// Storage
// ============================================================================

/// Roster XML opened at startup and written by the pipeline.
pub const DATA_FILE: &str = "data/roster.xml";

/// Re-run record validation when a roster file is loaded.
pub const VALIDATE_ON_LOAD: bool = true;

// ============================================================================
// Report
// ============================================================================

/// HTML report template.
pub const HTML_TEMPLATE: &str = "templates/clinic_report.html";

/// Where the HTML report is written.
pub const HTML_OUTPUT: &str = "reports/report.html";

/// Plain-text heading template of the PDF report.
pub const PDF_TEMPLATE: &str = "templates/clinic_report.txt";

/// Where the PDF report is written.
pub const PDF_OUTPUT: &str = "reports/report.pdf";

// ============================================================================
// Pipeline
// ============================================================================

/// Maximum wait on a pipeline gate (seconds). 0 waits forever.
pub const GATE_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Auth
// ============================================================================

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "admin";
