/// Ordered mapping from parameter name to extracted path-segment value.
///
/// Insertion order matches the order of placeholders in the route pattern,
/// and the serialized form preserves it: a handler registered for
/// `/{a}/{b}` sees `{"a": ..., "b": ...}` in exactly that order. Values are
/// byte-exact substrings of the request path; the engine never
/// percent-decodes them, so handlers receive what was on the wire.
///
/// # Examples
///
/// ```rust
/// use troika_rs::models::params::ParamMap;
///
/// let mut params = ParamMap::new();
/// params.push("user_id", "42");
/// params.push("post_id", "7");
///
/// assert_eq!(params.get("user_id"), Some("42"));
/// assert_eq!(params.to_json(), r#"{"user_id":"42","post_id":"7"}"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap {
    entries: Vec<(String, String)>,
}

impl ParamMap {
    /// Creates an empty parameter map.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates an empty map with room for `capacity` bindings.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Appends a binding. Pattern compilation guarantees name uniqueness,
    /// so no duplicate check happens here.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Looks up a value by parameter name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no parameters were extracted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates bindings in pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Serializes the map as a JSON object, preserving insertion order.
    ///
    /// `serde_json`'s default object representation re-orders keys, which
    /// would break the ordering contract; the object is assembled manually
    /// with per-string escaping instead.
    pub fn to_json(&self) -> String {
        let mut out = String::with_capacity(2 + self.entries.len() * 16);
        out.push('{');
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            // serde_json::to_string on &str produces a quoted, escaped literal
            out.push_str(&serde_json::to_string(name).unwrap_or_else(|_| "\"\"".into()));
            out.push(':');
            out.push_str(&serde_json::to_string(value).unwrap_or_else(|_| "\"\"".into()));
        }
        out.push('}');
        out
    }
}

impl<'a> IntoIterator for &'a ParamMap {
    type Item = (&'a str, &'a str);
    type IntoIter = std::vec::IntoIter<(&'a str, &'a str)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect::<Vec<_>>()
            .into_iter()
    }
}
