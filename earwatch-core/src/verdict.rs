//! Classifier verdict tokens

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Decision returned by the external classifier for one audio segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// The segment is suspicious; raise the alarm
    Alert,
    /// The segment is benign
    Normal,
}

impl Verdict {
    /// Wire spelling of the token
    pub const fn as_str(&self) -> &'static str {
        match self {
            Verdict::Alert => "ALERT",
            Verdict::Normal => "NORMAL",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match. Callers that read from the channel should
/// trim first.
impl FromStr for Verdict {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ALERT" => Ok(Verdict::Alert),
            "NORMAL" => Ok(Verdict::Normal),
            other => Err(Error::UnknownVerdict(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        assert_eq!("ALERT".parse::<Verdict>().ok(), Some(Verdict::Alert));
        assert_eq!("NORMAL".parse::<Verdict>().ok(), Some(Verdict::Normal));
    }

    #[test]
    fn test_parse_is_exact() {
        assert!("alert".parse::<Verdict>().is_err());
        assert!(" ALERT".parse::<Verdict>().is_err());
        assert!("".parse::<Verdict>().is_err());
    }

    #[test]
    fn test_display_matches_wire_spelling() {
        for verdict in [Verdict::Alert, Verdict::Normal] {
            assert_eq!(verdict.to_string().parse::<Verdict>().ok(), Some(verdict));
        }
    }
}
