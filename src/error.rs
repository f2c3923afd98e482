use thiserror::Error;

pub type Result<T> = std::result::Result<T, LocError>;

#[derive(Error, Debug)]
pub enum LocError {
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
    #[error("Unresolvable reference: {0}")]
    Reference(String),
    #[error("Object find error: {0}")]
    ObjectFind(#[from] Box<gix::object::find::existing::Error>),
    #[error("Commit error: {0}")]
    Commit(#[from] Box<gix::object::commit::Error>),
    #[error("git log failed: {0}")]
    GitLog(String),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid taxonomy: {0}")]
    Config(String),
    #[error("Invalid pattern: {0}")]
    Pattern(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("File delta for '{path}' appears before any commit boundary")]
    DeltaBeforeBoundary { path: String },
    #[error("Line count for '{path}' overflows")]
    CountOverflow { path: String },
    #[error("Range bound is {bound} but the series axis is {axis}")]
    AxisMismatch { bound: &'static str, axis: &'static str },
    #[error("Unknown category '{0}'")]
    UnknownCategory(String),
    #[error("Counters can only be seeded before the first commit")]
    SeedAfterStart,
    #[error("Terminal x-coordinate lies before the last recorded sample")]
    FinalizeBeforeEnd,
}

impl From<gix::discover::Error> for LocError {
    fn from(err: gix::discover::Error) -> Self {
        LocError::GitDiscover(Box::new(err))
    }
}

impl From<gix::object::find::existing::Error> for LocError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        LocError::ObjectFind(Box::new(err))
    }
}

impl From<gix::object::commit::Error> for LocError {
    fn from(err: gix::object::commit::Error) -> Self {
        LocError::Commit(Box::new(err))
    }
}

impl From<globset::Error> for LocError {
    fn from(err: globset::Error) -> Self {
        LocError::Pattern(err.to_string())
    }
}

impl From<regex::Error> for LocError {
    fn from(err: regex::Error) -> Self {
        LocError::Pattern(err.to_string())
    }
}
