use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP method tokens the engine classifies requests on.
///
/// The set is closed: the engine routes on the seven standard verbs and
/// nothing else. Parsing is case-sensitive by contract (`GET` is a method
/// token, `get` is not), so lookup tables never need to normalize.
///
/// # Examples
///
/// ```rust
/// use troika_rs::models::method::Method;
///
/// assert_eq!(Method::parse("GET"), Some(Method::Get));
/// assert_eq!(Method::parse("get"), None);
/// assert_eq!(Method::Delete.as_str(), "DELETE");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
}

impl Method {
    /// Number of method tokens. Used to size per-method route populations.
    pub const COUNT: usize = 7;

    /// Parses an exact uppercase method token.
    ///
    /// Returns `None` for anything outside the supported set, including
    /// lowercase or mixed-case spellings.
    pub fn parse(token: &str) -> Option<Method> {
        match token {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            "OPTIONS" => Some(Method::Options),
            "HEAD" => Some(Method::Head),
            _ => None,
        }
    }

    /// The canonical uppercase token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Head => "HEAD",
        }
    }

    /// Dense index for per-method tables (`0..Method::COUNT`).
    pub fn index(&self) -> usize {
        match self {
            Method::Get => 0,
            Method::Post => 1,
            Method::Put => 2,
            Method::Patch => 3,
            Method::Delete => 4,
            Method::Options => 5,
            Method::Head => 6,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
