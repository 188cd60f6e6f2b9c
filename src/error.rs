use polars::prelude::PolarsError;
use thiserror::Error;

/// Which side of a merge a column name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSide {
    Primary,
    Source,
}

impl std::fmt::Display for TableSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableSide::Primary => write!(f, "primary"),
            TableSide::Source => write!(f, "source"),
        }
    }
}

/// Error type for loading, merging and exporting workbooks.
#[derive(Error, Debug)]
pub enum SheetMergeError {
    /// Upload is not a readable workbook, or its first sheet has no header row.
    #[error("{0}")]
    FileFormat(String),

    /// The join configuration is incomplete or inconsistent (e.g. no columns selected).
    #[error("{0}")]
    Configuration(String),

    #[error("column '{column}' not found in {table} table")]
    MissingColumn { table: TableSide, column: String },

    #[error("{0}")]
    Merge(String),

    #[error("{0}")]
    Export(String),

    #[error("{0}")]
    Polars(#[from] PolarsError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Zip(#[from] zip::result::ZipError),
}

impl SheetMergeError {
    /// Configuration problems are warnings: the form stays open for correction.
    pub fn is_warning(&self) -> bool {
        matches!(self, SheetMergeError::Configuration(_))
    }
}

impl From<calamine::Error> for SheetMergeError {
    fn from(err: calamine::Error) -> Self {
        SheetMergeError::FileFormat(format!("Not a readable workbook: {}", err))
    }
}

pub type SheetMergeResult<T> = std::result::Result<T, SheetMergeError>;
