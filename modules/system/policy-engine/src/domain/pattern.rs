//! Compilation of rule patterns to anchored regular expressions.
//!
//! Object (path) patterns are literal paths with three kinds of placeholder:
//!
//! | Segment        | Matches                                  |
//! |----------------|------------------------------------------|
//! | `*`            | anything, including further `/` segments |
//! | `:name`        | exactly one non-empty segment            |
//! | `{name}`       | exactly one non-empty segment            |
//!
//! A `*` inside a segment (`/reports/2024-*`) also matches anything from
//! that point on. Every other character is literal.
//!
//! Action (method) patterns are regular expressions matched against the
//! whole method. A bare `*` means any method.

use regex::Regex;

use crate::domain::error::PolicyError;

const ONE_SEGMENT: &str = "[^/]+";
const ANY: &str = ".*";

/// # Errors
/// `InvalidPattern` for an empty pattern or one that does not start with `/`.
pub fn compile_object(pattern: &str) -> Result<Regex, PolicyError> {
    if !pattern.starts_with('/') && pattern != "*" {
        return Err(PolicyError::invalid_pattern(pattern, "path must start with '/'"));
    }

    let mut re = String::with_capacity(pattern.len() * 2 + 2);
    re.push('^');
    for (i, segment) in pattern.split('/').enumerate() {
        if i > 0 {
            re.push('/');
        }
        if is_named_segment(segment) {
            re.push_str(ONE_SEGMENT);
            continue;
        }
        let mut literals = segment.split('*');
        if let Some(first) = literals.next() {
            re.push_str(&regex::escape(first));
        }
        for literal in literals {
            re.push_str(ANY);
            re.push_str(&regex::escape(literal));
        }
    }
    re.push('$');

    Regex::new(&re).map_err(|e| PolicyError::invalid_pattern(pattern, e))
}

/// # Errors
/// `InvalidPattern` for an empty pattern or a regex that does not compile.
pub fn compile_action(pattern: &str) -> Result<Regex, PolicyError> {
    let trimmed = pattern.trim();
    if trimmed.is_empty() {
        return Err(PolicyError::invalid_pattern(pattern, "method pattern is empty"));
    }
    let body = if trimmed == "*" { ANY } else { trimmed };
    Regex::new(&format!("^(?:{body})$")).map_err(|e| PolicyError::invalid_pattern(pattern, e))
}

fn is_named_segment(segment: &str) -> bool {
    (segment.len() > 1 && segment.starts_with(':'))
        || (segment.len() > 2 && segment.starts_with('{') && segment.ends_with('}'))
}
