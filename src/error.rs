use std::path::PathBuf;
use thiserror::Error;

/// Why a semantic name was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Collision {
    #[error("is not a single word of letters, digits and underscores starting with a letter")]
    NotAWord,

    #[error("collides with a formula keyword")]
    Keyword,

    #[error("collides with cell reference notation")]
    CellReference,

    #[error("collides with a column token")]
    ColumnToken,

    #[error("collides with R1C1 notation")]
    R1C1,

    #[error("is already registered as {existing}")]
    AlreadyRegistered { existing: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("sheet \"{name}\" not found (available: {available})")]
    SheetNotFound { name: String, available: String },

    #[error("sheet \"{0}\" already exists")]
    DuplicateSheet(String),

    #[error("name \"{name}\" {reason}; use a longer, descriptive name (e.g. \"Total{name}\")")]
    NameCollision { name: String, reason: Collision },

    #[error("unknown reference {placeholder} in sheet \"{sheet}\"{}", in_formula(.formula))]
    UnknownReference {
        placeholder: String,
        sheet: String,
        formula: Option<String>,
    },

    #[error("unknown sheet \"{sheet}\" in reference {placeholder} (formula: {formula})")]
    UnknownSheet {
        sheet: String,
        placeholder: String,
        formula: String,
    },

    #[error("error in row \"{label}\" ({sheet}!{cell}, row {row}): {message}")]
    Engine {
        sheet: String,
        row: u32,
        cell: String,
        label: String,
        message: String,
    },

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("unsupported definition format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid model definition: {path} ({details})")]
    InvalidDefinition { path: PathBuf, details: String },

    #[error("nothing to do: pass --output, --csv or --print")]
    NothingToDo,

    #[error("failed to write xlsx: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("failed to write CSV: {0}")]
    CsvWrite(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn in_formula(formula: &Option<String>) -> String {
    match formula {
        Some(f) => format!(" in formula: {}", f),
        None => String::new(),
    }
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::FileNotFound(_) => 1,
            Error::Io(_) => 1,
            Error::InvalidDefinition { .. } => 2,
            Error::UnsupportedFormat(_) => 2,
            Error::NothingToDo => 2,
            Error::SheetNotFound { .. } => 3,
            Error::DuplicateSheet(_) => 3,
            Error::NameCollision { .. } => 3,
            Error::UnknownReference { .. } => 3,
            Error::UnknownSheet { .. } => 3,
            Error::Engine { .. } => 3,
            Error::Export(_) => 4,
            Error::CsvWrite(_) => 4,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
