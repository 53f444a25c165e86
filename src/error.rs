use thiserror::Error;

pub type AdminResult<T> = Result<T, AdminError>;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Unable to rename file: {0}")]
    RenameFailed(String),

    #[error("No YYYY-MM-DD date in file name: {0}")]
    NoDatePattern(String),

    #[error("Corrupt workbook: {0}")]
    WorkbookCorrupt(String),

    #[error("Unable to save workbook: {0}")]
    WorkbookWrite(String),

    #[error("Mail transport error: {0}")]
    MailTransport(String),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
