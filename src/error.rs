use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum IsaError {
    #[error("malformed ISA document: {0}")]
    #[diagnostic(help("the root must hold a `studies` list of study records"))]
    MalformedDocument(String),

    #[error("no table converter registered for file type: {0}")]
    #[diagnostic(help("run `isa-find types` to list the registered file types"))]
    UnknownFileType(String),

    #[error("failed to read metadata document at {path}: {message}")]
    DocumentRead { path: PathBuf, message: String },

    #[error("failed to parse metadata document: {0}")]
    DocumentParse(String),

    #[error("failed to read data file {path}: {message}")]
    DataFileRead { path: PathBuf, message: String },

    #[error("unparsable data file {path}: {message}")]
    TableFormat { path: PathBuf, message: String },

    #[error("invalid filter: {0}")]
    #[diagnostic(help("filters are written as key=value"))]
    InvalidFilter(String),

    #[error("table already has a column named {0}")]
    #[diagnostic(help("attach the field as an attribute instead"))]
    ColumnExists(String),

    #[error("field not found in assay metadata: {0}")]
    FieldNotFound(String),

    #[error("missing config file isa-find.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),
}
