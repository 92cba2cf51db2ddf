//! Path-shaped name validation and prefix rewriting.
//!
//! Record names are absolute slash paths (`/obs/scene/switch`); folder
//! prefixes always end with a separator (`/obs/scene/`). The root folder `/`
//! is a valid prefix everywhere.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{DeckError, Result};

static NAME_RE: OnceLock<Regex> = OnceLock::new();
static FOLDER_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^/(?:[^/]+/)*[^/]+$").unwrap())
}

fn folder_re() -> &'static Regex {
    FOLDER_RE.get_or_init(|| Regex::new(r"^/.*/$").unwrap())
}

/// Validate a record name: absolute, slash-delimited, no trailing separator.
pub fn validate_name(name: &str) -> Result<()> {
    if !name_re().is_match(name) {
        return Err(DeckError::InvalidPath(name.to_string()));
    }
    Ok(())
}

/// Validate a folder prefix (import slug, move/duplicate target): `/` or a
/// path ending with a separator.
pub fn validate_folder(path: &str) -> Result<()> {
    if path != "/" && !folder_re().is_match(path) {
        return Err(DeckError::InvalidFolderPath(path.to_string()));
    }
    Ok(())
}

/// Replace the first occurrence of `prefix` in `name` with `target`.
/// Names that do not start with `prefix` come back untouched.
pub fn rewrite_prefix(name: &str, prefix: &str, target: &str) -> String {
    match name.strip_prefix(prefix) {
        Some(rest) => format!("{target}{rest}"),
        None => name.to_string(),
    }
}

/// Rewrite an imported name under `slug`: the entry's own leading separator is
/// replaced by the slug (`/a/b` under `/pack/` becomes `/pack/a/b`).
pub fn rewrite_under_slug(name: &str, slug: &str) -> String {
    format!("{slug}{}", &name[1..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        for name in ["/a", "/a/b", "/obs/scene/switch", "/a b/c d"] {
            validate_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_names() {
        for name in ["", "a/b", "/", "/a/", "/a//b"] {
            assert!(validate_name(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn valid_folders() {
        for path in ["/", "/a/", "/a/b/"] {
            validate_folder(path).unwrap_or_else(|_| panic!("expected valid: {path}"));
        }
    }

    #[test]
    fn invalid_folders() {
        for path in ["", "/a", "a/"] {
            assert!(validate_folder(path).is_err(), "expected invalid: {path}");
        }
    }

    #[test]
    fn rewrite_replaces_first_occurrence_only() {
        assert_eq!(rewrite_prefix("/a/a/b", "/a/", "/z/"), "/z/a/b");
        assert_eq!(rewrite_prefix("/other/x", "/a/", "/z/"), "/other/x");
    }

    #[test]
    fn rewrite_under_slug_strips_leading_separator() {
        assert_eq!(rewrite_under_slug("/a/b", "/pack/"), "/pack/a/b");
        assert_eq!(rewrite_under_slug("/a/b", "/"), "/a/b");
    }
}
