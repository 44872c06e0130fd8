use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Malformed topology or sweep input; the run is never attempted.
    InvalidParameter(String),
    /// The search frontier emptied with tasks still unsolved.
    Stalled { completed_problems: u64 },
    /// A metrics history could not be serialized into a flat record.
    Serialization(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter(message) => write!(f, "invalid parameter: {message}"),
            Self::Stalled { completed_problems } => write!(
                f,
                "search frontier emptied after {completed_problems} completed problems"
            ),
            Self::Serialization(message) => write!(f, "serialization error: {message}"),
        }
    }
}

impl std::error::Error for ModelError {}
