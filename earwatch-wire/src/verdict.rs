//! Verdict lines on the inbound direction
//!
//! The inbound stream mixes classifier tokens with whatever else the other
//! side prints, so every line is a candidate and most are ignored.

use earwatch_core::Verdict;

/// Decode one inbound line.
///
/// Surrounding whitespace (including the line terminator) is trimmed and the
/// rest must match `ALERT` or `NORMAL` exactly. Anything else is `None`.
pub fn decode_line(line: &str) -> Option<Verdict> {
    line.trim().parse().ok()
}

/// Line the classifier side writes back for `verdict`
pub fn encode_verdict(verdict: Verdict) -> String {
    format!("{}\n", verdict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_trims_whitespace() {
        assert_eq!(decode_line("ALERT\n"), Some(Verdict::Alert));
        assert_eq!(decode_line("  ALERT  "), Some(Verdict::Alert));
        assert_eq!(decode_line("NORMAL\r\n"), Some(Verdict::Normal));
        assert_eq!(decode_line("\tNORMAL"), Some(Verdict::Normal));
    }

    #[test]
    fn test_decode_is_case_sensitive() {
        assert_eq!(decode_line("alert"), None);
        assert_eq!(decode_line("Normal"), None);
    }

    #[test]
    fn test_decode_ignores_non_tokens() {
        assert_eq!(decode_line(""), None);
        assert_eq!(decode_line("\n"), None);
        assert_eq!(decode_line("ALER"), None);
        assert_eq!(decode_line("ALERT NORMAL"), None);
        assert_eq!(decode_line("waiting for audio..."), None);
    }

    #[test]
    fn test_encoded_verdict_decodes() {
        assert_eq!(decode_line(&encode_verdict(Verdict::Alert)), Some(Verdict::Alert));
        assert_eq!(encode_verdict(Verdict::Normal), "NORMAL\n");
    }
}
