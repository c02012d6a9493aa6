use std::fmt;

/// Failure taxonomy for the analysis engine.
///
/// Per-interval failures (`NoValidPhylogeny`, `Numeric`) are logged and
/// skipped by the drivers; per-test failures (`Format`, `StrainMismatch`,
/// `CacheCorrupt`) abort the enclosing test.
#[derive(Debug)]
pub enum HamError {
    /// Malformed input row/column
    Format {
        /// A human-readable message explaining the error
        message: String,
        /// The line number (1-based)
        line: usize,
        /// The column number (1-based, 0 when not applicable)
        column: usize,
    },
    /// Backing store read/write failure
    Io(std::io::Error),
    /// Phenotype and phylogeny strain sets do not match up
    StrainMismatch(String),
    /// Perfect phylogeny precondition violated
    NoValidPhylogeny(String),
    /// Statistical routine reports ill-conditioned input
    Numeric(String),
    /// Unreadable cache entry; delete the file and retry
    CacheCorrupt(String),
}

impl fmt::Display for HamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HamError::Format {
                message,
                line,
                column,
            } => {
                if *column == 0 {
                    write!(f, "Format error at line {}: {}", line, message)
                } else {
                    write!(
                        f,
                        "Format error at line {}, column {}: {}",
                        line, column, message
                    )
                }
            }
            HamError::Io(err) => write!(f, "I/O error: {}", err),
            HamError::StrainMismatch(msg) => write!(f, "Strain mismatch: {}", msg),
            HamError::NoValidPhylogeny(msg) => write!(f, "No valid phylogeny: {}", msg),
            HamError::Numeric(msg) => write!(f, "Numeric error: {}", msg),
            HamError::CacheCorrupt(msg) => write!(f, "Corrupt cache entry: {}", msg),
        }
    }
}

impl std::error::Error for HamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HamError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for HamError {
    fn from(err: std::io::Error) -> Self {
        HamError::Io(err)
    }
}
