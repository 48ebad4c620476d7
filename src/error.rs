use thiserror::Error;

/// Storage-layer failures surfaced by the pager and the table.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tried to fetch page number out of bounds: {page_number} (max: {max})")]
    PageOutOfRange { page_number: usize, max: usize },

    #[error("Page {0} is not loaded")]
    PageNotLoaded(usize),

    #[error("Table full (max rows: {max_rows})")]
    TableFull { max_rows: usize },
}

pub type DbResult<T> = std::result::Result<T, DbError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RowError {
    #[error("{field} is too long: {actual} bytes (max: {max})")]
    StringTooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("{field} contains a NUL byte at {position}")]
    InteriorNul { field: &'static str, position: usize },
}

/// Reasons a line of input could not be turned into a statement.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PrepareError {
    #[error("Syntax error. Could not parse statement.")]
    SyntaxError,

    #[error("String is too long.")]
    StringTooLong,

    #[error("ID must be positive.")]
    NegativeId,

    #[error("Unrecognized command: {0}")]
    Unrecognized(String),
}

impl From<RowError> for PrepareError {
    fn from(err: RowError) -> Self {
        match err {
            RowError::StringTooLong { .. } => PrepareError::StringTooLong,
            RowError::InteriorNul { .. } => PrepareError::SyntaxError,
        }
    }
}
