//! Dotted path handling
//!
//! Paths such as `"nested.comp1.r"` address variables across nesting levels;
//! the first segment names a child (or a boundary variable), the rest is
//! resolved inside that child.

use crate::error::{GraphError, Result};

/// Split a dotted path into its segments, rejecting empty ones
pub fn segments(path: &str) -> Result<Vec<&str>> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.trim().is_empty()) {
        return Err(GraphError::InvalidPath(path.to_string()));
    }
    Ok(parts)
}

/// Split off the first segment: `"a.b.c"` -> `("a", Some("b.c"))`
pub fn split_head(path: &str) -> Result<(&str, Option<&str>)> {
    segments(path)?;
    Ok(match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    })
}

/// Last segment of a path: `"comp1.r"` -> `"r"`
pub fn leaf_name(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Join a parent prefix and a relative path
pub fn join(prefix: &str, rest: &str) -> String {
    if prefix.is_empty() {
        rest.to_string()
    } else {
        format!("{}.{}", prefix, rest)
    }
}

/// Validate a name that must address a single level (aliases, child names)
pub fn check_simple_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('.') || name.trim() != name {
        return Err(GraphError::InvalidPath(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_head_and_rest() {
        assert_eq!(split_head("nested.comp1.r").unwrap(), ("nested", Some("comp1.r")));
        assert_eq!(split_head("x").unwrap(), ("x", None));
    }

    #[test]
    fn rejects_empty_segments() {
        assert!(segments("a..b").is_err());
        assert!(segments("").is_err());
        assert!(split_head(".a").is_err());
    }

    #[test]
    fn leaf_and_join() {
        assert_eq!(leaf_name("comp1.r"), "r");
        assert_eq!(leaf_name("r"), "r");
        assert_eq!(join("", "comp.x"), "comp.x");
        assert_eq!(join("nested", "comp.x"), "nested.comp.x");
    }

    #[test]
    fn simple_names_have_no_dots() {
        assert!(check_simple_name("foobar").is_ok());
        assert!(check_simple_name("foo.bar").is_err());
        assert!(check_simple_name("").is_err());
    }
}
