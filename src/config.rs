//! Runtime configuration
//!
//! Loaded once from a YAML file and then passed explicitly into every
//! operation. The verification file path is the only field an operation
//! rewrites on its own (the rename step).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AdminError, AdminResult};

pub const DEFAULT_SHEET_GLOBAL: &str = "Vue Globale - Re7 NAUTIL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminConfig {
    pub excel: ExcelSettings,
    pub email: EmailSettings,
    #[serde(default)]
    pub smtp: SmtpSettings,
}

/// Workbook paths and the sheet names the pipeline targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcelSettings {
    pub verification_file: PathBuf,
    pub template_file: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default = "default_sheet_global")]
    pub sheet_global: String,
    #[serde(default = "default_sheet_tx1")]
    pub sheet_tx1: String,
    #[serde(default = "default_sheet_tx2")]
    pub sheet_tx2: String,
    #[serde(default = "default_sheet_tx3")]
    pub sheet_tx3: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailSettings {
    pub default_to: String,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpSettings {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub starttls: bool,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: default_smtp_port(),
            username: None,
            password: None,
            starttls: false,
        }
    }
}

fn default_sheet_global() -> String {
    DEFAULT_SHEET_GLOBAL.to_string()
}

fn default_sheet_tx1() -> String {
    "TX1".to_string()
}

fn default_sheet_tx2() -> String {
    "TX2".to_string()
}

fn default_sheet_tx3() -> String {
    "TX3".to_string()
}

fn default_smtp_port() -> u16 {
    25
}

/// Partial update from `POST /api/config/update`.
///
/// Absent or empty values leave the matching field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub verification_file: Option<String>,
    pub template_file: Option<String>,
    pub output_dir: Option<String>,
}

impl AdminConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> AdminResult<Self> {
        if !path.exists() {
            return Err(AdminError::FileNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> AdminResult<Self> {
        let config: AdminConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AdminResult<()> {
        let sheets = [
            ("sheet_global", &self.excel.sheet_global),
            ("sheet_tx1", &self.excel.sheet_tx1),
            ("sheet_tx2", &self.excel.sheet_tx2),
            ("sheet_tx3", &self.excel.sheet_tx3),
        ];
        for (key, value) in sheets {
            if value.trim().is_empty() {
                return Err(AdminError::Config(format!("excel.{} must not be empty", key)));
            }
        }
        if self.email.from.trim().is_empty() {
            return Err(AdminError::Config("email.from must not be empty".to_string()));
        }
        Ok(())
    }

    /// The three transactional sheets, in processing order.
    pub fn tx_sheets(&self) -> [&str; 3] {
        [
            self.excel.sheet_tx1.as_str(),
            self.excel.sheet_tx2.as_str(),
            self.excel.sheet_tx3.as_str(),
        ]
    }

    pub fn apply_update(&mut self, update: &ConfigUpdate) {
        if let Some(path) = non_empty(&update.verification_file) {
            self.excel.verification_file = PathBuf::from(path);
        }
        if let Some(path) = non_empty(&update.template_file) {
            self.excel.template_file = PathBuf::from(path);
        }
        if let Some(path) = non_empty(&update.output_dir) {
            self.excel.output_dir = PathBuf::from(path);
        }
    }
}

/// Treat `Some("")` like `None`, the way optional request parameters arrive.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
