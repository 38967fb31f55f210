use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (threshold out of range, unknown pattern, etc.).
    ConfigValidation(String),
    /// Missing required column in input data.
    MissingColumn { input: String, column: String },
    /// A person or record id that is not a non-negative integer.
    InvalidId { input: String, line: u64, value: String },
    /// The same id appears twice in one input.
    DuplicateId { input: String, id: u64 },
    /// IO / CSV reader error.
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { input, column } => {
                write!(f, "{input}: missing column '{column}'")
            }
            Self::InvalidId { input, line, value } => {
                write!(f, "{input}, line {line}: cannot parse id '{value}'")
            }
            Self::DuplicateId { input, id } => write!(f, "{input}: duplicate id {id}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<csv::Error> for ReconError {
    fn from(err: csv::Error) -> Self {
        Self::Io(err.to_string())
    }
}
