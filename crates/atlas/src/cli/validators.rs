//! CLI input validation functions.
//!
//! Used by clap's `value_parser` attribute so bad input is rejected at
//! parse time with the domain's own error message.

use crate::domain::ProjectVersionRef;

/// Validate a workspace label.
///
/// Delegates to `commands::init` so both share one set of rules.
pub fn validate_workspace(s: &str) -> Result<String, String> {
    use crate::commands::init;

    let trimmed = s.trim();
    init::validate_workspace(trimmed).map_err(|e| e.to_string())?;
    Ok(trimmed.to_string())
}

/// Parse a `groupId:artifactId:version` coordinate.
pub fn validate_gav(s: &str) -> Result<ProjectVersionRef, String> {
    s.trim().parse().map_err(|e: crate::error::Error| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_validate_workspace_trims() {
        assert_eq!(validate_workspace("  ws  ").unwrap(), "ws");
    }

    #[rstest]
    #[case::plain("org.acme:app:1.0")]
    #[case::padded(" org.acme:app:1.0 ")]
    fn test_validate_gav_valid(#[case] input: &str) {
        let gav = validate_gav(input).unwrap();
        assert_eq!(gav.to_string(), "org.acme:app:1.0");
    }

    #[rstest]
    #[case::empty("")]
    #[case::no_version("org.acme:app")]
    fn test_validate_gav_invalid(#[case] input: &str) {
        assert!(validate_gav(input).is_err());
    }
}
