/// Terminal outcomes for collection jobs
///
/// The done log stores a free-form reason string per collection. An empty
/// reason marks a collection whose listing was read to the end; anything else
/// is the error text of the fetch that retired it.
use std::fmt;

/// How a collection job left the active queue
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// The listing returned an empty page; every entry has been visited
    Exhausted,

    /// Both the scheduled page and the compensating retry failed
    Failed(String),
}

impl Resolution {
    /// Returns true if the collection was scanned to completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Converts the resolution to the reason string stored in the done log
    pub fn to_reason(&self) -> &str {
        match self {
            Self::Exhausted => "",
            Self::Failed(reason) => reason,
        }
    }

    /// Parses a resolution from a stored reason string
    ///
    /// Every string is valid: the empty string is success, anything else a failure.
    pub fn from_reason(reason: &str) -> Self {
        if reason.is_empty() {
            Self::Exhausted
        } else {
            Self::Failed(reason.to_string())
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => write!(f, "exhausted"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}
