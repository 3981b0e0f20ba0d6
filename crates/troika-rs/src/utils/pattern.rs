use crate::models::params::ParamMap;
use regex::Regex;
use std::sync::Arc;
use thiserror::Error;

/// Error types that can occur during route pattern compilation.
///
/// All of these are raised at registration time. A pattern that compiles
/// can never fail at dispatch time; the matcher only ever runs compiled
/// expressions against request paths.
#[derive(Error, Debug, PartialEq)]
pub enum PatternError {
    /// The pattern does not begin with `/`.
    #[error("Pattern must start with '/': {pattern}")]
    MissingLeadingSlash {
        /// The offending pattern
        pattern: String,
    },

    /// A segment between two slashes is empty, as in `/a//b`.
    ///
    /// A single trailing slash is not an empty segment; `/a/` is a valid
    /// pattern distinct from `/a`.
    #[error("Pattern contains an empty segment: {pattern}")]
    EmptySegment {
        /// The offending pattern
        pattern: String,
    },

    /// A segment mixes braces with literal text, or leaves a brace
    /// unclosed. Segments are either pure literals or a single `{name}`
    /// placeholder; `/a{b}c` and `/{open` are both rejected.
    #[error("Unbalanced or misplaced braces in segment '{segment}' of pattern {pattern}")]
    UnbalancedBraces {
        /// The offending segment
        segment: String,
        /// The offending pattern
        pattern: String,
    },

    /// A placeholder name is empty or contains characters outside
    /// `[A-Za-z0-9_]`.
    #[error("Invalid parameter name '{name}' in pattern {pattern}")]
    InvalidParameterName {
        /// The offending name
        name: String,
        /// The offending pattern
        pattern: String,
    },

    /// The same placeholder name appears twice in one pattern.
    #[error("Duplicate parameter name '{name}' in pattern {pattern}")]
    DuplicateParameterName {
        /// The duplicated name
        name: String,
        /// The offending pattern
        pattern: String,
    },

    /// The generated expression failed to compile. Indicates a bug in the
    /// compiler itself rather than in the user's pattern.
    #[error("Regex compilation failed: {0}")]
    RegexError(String),
}

/// One parsed element of a slash-segmented route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A literal path segment, matched byte-for-byte.
    Literal(String),
    /// A `{name}` placeholder matching one or more non-slash bytes.
    Param(String),
}

/// A compiled route pattern with ordered parameter extraction.
///
/// Compilation parses the pattern into a [`Segment`] list first, validates
/// it, and only then builds the matching expression structurally: literals
/// are regex-escaped, each placeholder becomes a named group matching
/// `[^/]+`, and the whole expression is anchored at both ends so partial
/// matches are impossible.
///
/// # Thread Safety
///
/// The compiled regex is wrapped in an `Arc` so route snapshots can be
/// cloned across worker tasks without recompiling.
///
/// # Examples
///
/// ```rust
/// use troika_rs::utils::pattern::RoutePattern;
///
/// let pattern = RoutePattern::compile("/users/{id}/posts/{post_id}").unwrap();
/// assert_eq!(pattern.param_names(), &["id", "post_id"]);
///
/// let params = pattern.capture("/users/42/posts/7").unwrap();
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.get("post_id"), Some("7"));
///
/// // Anchored: no partial matches
/// assert!(pattern.capture("/users/42/posts/7/extra").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
    param_names: Vec<String>,
    regex: Arc<Regex>,
}

impl RoutePattern {
    /// Parses, validates and compiles a route pattern.
    ///
    /// # Validation rules
    ///
    /// - the pattern must start with `/`
    /// - interior segments must be non-empty (`/a//b` is rejected)
    /// - a segment is either a pure literal or exactly `{name}`
    /// - parameter names match `[A-Za-z0-9_]+` and are unique per pattern
    ///
    /// # Errors
    ///
    /// Returns the specific [`PatternError`] for the first rule violated.
    pub fn compile(pattern: &str) -> Result<RoutePattern, PatternError> {
        let (segments, trailing_slash) = Self::parse_segments(pattern)?;

        let mut param_names = Vec::new();
        for segment in &segments {
            if let Segment::Param(name) = segment {
                if param_names.iter().any(|existing| existing == name) {
                    return Err(PatternError::DuplicateParameterName {
                        name: name.clone(),
                        pattern: pattern.to_string(),
                    });
                }
                param_names.push(name.clone());
            }
        }

        let expression = Self::build_expression(&segments, trailing_slash);
        let regex =
            Regex::new(&expression).map_err(|e| PatternError::RegexError(e.to_string()))?;

        Ok(RoutePattern {
            raw: pattern.to_string(),
            segments,
            param_names,
            regex: Arc::new(regex),
        })
    }

    /// The original pattern string as registered.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parsed segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names in pattern order.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// True when the pattern contains at least one placeholder.
    pub fn has_params(&self) -> bool {
        !self.param_names.is_empty()
    }

    /// Attempts a full-path match and extracts parameters.
    ///
    /// Returns the ordered parameter map on a match, `None` otherwise.
    /// Values are the raw segment bytes from the path, never decoded.
    pub fn capture(&self, path: &str) -> Option<ParamMap> {
        let captures = self.regex.captures(path)?;
        let mut params = ParamMap::with_capacity(self.param_names.len());
        for name in &self.param_names {
            // Named groups are all mandatory, so a successful match binds every one.
            let value = captures.name(name)?.as_str();
            params.push(name.clone(), value);
        }
        Some(params)
    }

    /// Splits the pattern into validated segments.
    fn parse_segments(pattern: &str) -> Result<(Vec<Segment>, bool), PatternError> {
        let rest = pattern
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash {
                pattern: pattern.to_string(),
            })?;

        // "/" alone is the root pattern: no segments, no trailing marker.
        if rest.is_empty() {
            return Ok((Vec::new(), false));
        }

        let trailing_slash = rest.ends_with('/');
        let body = if trailing_slash {
            &rest[..rest.len() - 1]
        } else {
            rest
        };

        let mut segments = Vec::new();
        for piece in body.split('/') {
            if piece.is_empty() {
                return Err(PatternError::EmptySegment {
                    pattern: pattern.to_string(),
                });
            }
            segments.push(Self::parse_segment(piece, pattern)?);
        }
        Ok((segments, trailing_slash))
    }

    /// Classifies one segment as literal or placeholder.
    fn parse_segment(piece: &str, pattern: &str) -> Result<Segment, PatternError> {
        if let Some(inner) = piece.strip_prefix('{') {
            let name = inner
                .strip_suffix('}')
                .ok_or_else(|| PatternError::UnbalancedBraces {
                    segment: piece.to_string(),
                    pattern: pattern.to_string(),
                })?;
            if name.is_empty()
                || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(PatternError::InvalidParameterName {
                    name: name.to_string(),
                    pattern: pattern.to_string(),
                });
            }
            return Ok(Segment::Param(name.to_string()));
        }

        if piece.contains('{') || piece.contains('}') {
            return Err(PatternError::UnbalancedBraces {
                segment: piece.to_string(),
                pattern: pattern.to_string(),
            });
        }
        Ok(Segment::Literal(piece.to_string()))
    }

    /// Builds the anchored expression from parsed segments.
    fn build_expression(segments: &[Segment], trailing_slash: bool) -> String {
        // The root pattern has no segments and matches "/" exactly.
        if segments.is_empty() {
            return "^/$".to_string();
        }

        let mut expression = String::with_capacity(segments.len() * 12 + 4);
        expression.push('^');
        for segment in segments {
            expression.push('/');
            match segment {
                Segment::Literal(text) => expression.push_str(&regex::escape(text)),
                Segment::Param(name) => {
                    expression.push_str("(?P<");
                    expression.push_str(name);
                    expression.push_str(">[^/]+)");
                }
            }
        }
        if trailing_slash {
            expression.push('/');
        }
        expression.push('$');
        expression
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_pattern_matches_exactly() {
        let pattern = RoutePattern::compile("/api/users").unwrap();
        assert!(!pattern.has_params());
        assert!(pattern.capture("/api/users").is_some());
        assert!(pattern.capture("/api/users/").is_none());
        assert!(pattern.capture("/api").is_none());
    }

    #[test]
    fn root_pattern_matches_root_only() {
        let pattern = RoutePattern::compile("/").unwrap();
        assert!(pattern.capture("/").is_some());
        assert!(pattern.capture("/a").is_none());
    }

    #[test]
    fn trailing_slash_is_significant() {
        let with = RoutePattern::compile("/a/").unwrap();
        assert!(with.capture("/a/").is_some());
        assert!(with.capture("/a").is_none());

        let without = RoutePattern::compile("/a").unwrap();
        assert!(without.capture("/a").is_some());
        assert!(without.capture("/a/").is_none());
    }

    #[test]
    fn regex_metacharacters_in_literals_are_escaped() {
        let pattern = RoutePattern::compile("/v1.0/items").unwrap();
        assert!(pattern.capture("/v1.0/items").is_some());
        assert!(pattern.capture("/v1x0/items").is_none());
    }

    #[test]
    fn empty_interior_segment_is_rejected() {
        assert_eq!(
            RoutePattern::compile("/a//b").unwrap_err(),
            PatternError::EmptySegment {
                pattern: "/a//b".to_string()
            }
        );
    }

    #[test]
    fn mixed_literal_and_brace_segment_is_rejected() {
        assert!(matches!(
            RoutePattern::compile("/a{b}c/d").unwrap_err(),
            PatternError::UnbalancedBraces { .. }
        ));
        assert!(matches!(
            RoutePattern::compile("/{open/d").unwrap_err(),
            PatternError::UnbalancedBraces { .. }
        ));
    }

    #[test]
    fn duplicate_parameter_names_are_rejected() {
        assert!(matches!(
            RoutePattern::compile("/{id}/{id}").unwrap_err(),
            PatternError::DuplicateParameterName { .. }
        ));
    }

    #[test]
    fn parameter_values_never_span_slashes() {
        let pattern = RoutePattern::compile("/files/{name}").unwrap();
        assert!(pattern.capture("/files/a/b").is_none());
        let params = pattern.capture("/files/report.txt").unwrap();
        assert_eq!(params.get("name"), Some("report.txt"));
    }
}
