//! Composite identifiers for child resources
//!
//! Child objects are addressed through their parent, so their stored
//! identifier joins both IDs: `<parent>.<child>` for security group rules and
//! `<parent>/<child>` for most other nested types.

use thiserror::Error;

use crate::provider::{ErrorKind, ProviderError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositeIdError {
    #[error("invalid terraform Id {0} (incorrect number of segments)")]
    SegmentCount(String),

    #[error("invalid terraform Id {0} (one or more empty segments)")]
    EmptySegment(String),

    #[error("invalid composite id {id}: expected {expected} parts separated by '/'")]
    Parts { id: String, expected: usize },
}

impl From<CompositeIdError> for ProviderError {
    fn from(err: CompositeIdError) -> Self {
        ProviderError::new(err.to_string())
            .with_kind(ErrorKind::State)
            .with_cause(err)
    }
}

/// Split a `<parent>.<child>` identifier into exactly two non-empty segments
pub fn parse_terraform_id(id: &str) -> Result<(String, String), CompositeIdError> {
    let parts: Vec<&str> = id.split('.').collect();
    if parts.len() != 2 {
        return Err(CompositeIdError::SegmentCount(id.to_string()));
    }
    if parts.iter().any(|p| p.is_empty()) {
        return Err(CompositeIdError::EmptySegment(id.to_string()));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}

/// Join two IDs into a `<parent>.<child>` identifier
pub fn make_terraform_id(parent: &str, child: &str) -> String {
    format!("{}.{}", parent, child)
}

/// Split a `/`-joined identifier into exactly `expected` non-empty parts
pub fn id_parts(id: &str, expected: usize) -> Result<Vec<String>, CompositeIdError> {
    let parts: Vec<&str> = id.split('/').collect();
    if parts.len() != expected || parts.iter().any(|p| p.is_empty()) {
        return Err(CompositeIdError::Parts {
            id: id.to_string(),
            expected,
        });
    }
    Ok(parts.into_iter().map(str::to_string).collect())
}

/// Split `<parent>/<child>` at the first `/` only, for children such as CIDR
/// blocks that contain `/` themselves
pub fn split_parent_id(id: &str) -> Result<(String, String), CompositeIdError> {
    match id.split_once('/') {
        Some((parent, child)) if !parent.is_empty() && !child.is_empty() => {
            Ok((parent.to_string(), child.to_string()))
        }
        _ => Err(CompositeIdError::Parts {
            id: id.to_string(),
            expected: 2,
        }),
    }
}

/// Join a parent and child with `/`
pub fn make_slash_id(parent: &str, child: &str) -> String {
    format!("{}/{}", parent, child)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rule_id() {
        assert_eq!(
            parse_terraform_id("sg123.rule456"),
            Ok(("sg123".to_string(), "rule456".to_string()))
        );
    }

    #[test]
    fn rejects_wrong_segment_count() {
        let err = parse_terraform_id("sg123").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid terraform Id sg123 (incorrect number of segments)"
        );
        assert!(matches!(
            parse_terraform_id("a.b.c"),
            Err(CompositeIdError::SegmentCount(_))
        ));
    }

    #[test]
    fn rejects_empty_segment() {
        let err = parse_terraform_id("sg123.").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid terraform Id sg123. (one or more empty segments)"
        );
        assert!(matches!(
            parse_terraform_id(".rule"),
            Err(CompositeIdError::EmptySegment(_))
        ));
    }

    #[test]
    fn make_and_parse_agree() {
        let id = make_terraform_id("r006-sg", "r006-rule");
        assert_eq!(id, "r006-sg.r006-rule");
        assert_eq!(
            parse_terraform_id(&id).unwrap(),
            ("r006-sg".to_string(), "r006-rule".to_string())
        );
    }

    #[test]
    fn slash_ids() {
        assert_eq!(
            id_parts("r006-sg/0717-vni", 2).unwrap(),
            vec!["r006-sg".to_string(), "0717-vni".to_string()]
        );
        assert!(id_parts("r006-sg", 2).is_err());
        assert!(id_parts("r006-sg/", 2).is_err());
        assert!(id_parts("a/b/c", 2).is_err());
    }

    #[test]
    fn split_keeps_cidr_intact() {
        let id = make_slash_id("0717-vpngw", "10.45.0.0/24");
        assert_eq!(
            split_parent_id(&id).unwrap(),
            ("0717-vpngw".to_string(), "10.45.0.0/24".to_string())
        );
        assert!(split_parent_id("0717-vpngw").is_err());
        assert!(split_parent_id("/10.0.0.0/24").is_err());
    }
}
