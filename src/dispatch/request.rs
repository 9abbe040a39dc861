//! Request path normalization.
//!
//! Given `/app/Article/42.html?page=2` mounted under `/app/`:
//!
//! ```text
//! base:    "app"
//! alias:   "Article/42"
//! format:  Some("html")
//! query:   Some("page=2")
//! ```

use crate::routing::normalize;

/// The routing-relevant parts of a request URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath {
    /// Path below the base, without format extension or surrounding slashes.
    pub alias: String,
    /// Extension of the last segment (`html`, `json`, ...).
    pub format: Option<String>,
    /// Raw query string.
    pub query: Option<String>,
}

impl RequestPath {
    /// Split a URI path (and optional query) into alias, format and query.
    pub fn parse(path: &str, query: Option<&str>, base_path: &str) -> Self {
        let base = normalize(base_path);
        let mut path = normalize(path);

        if !base.is_empty() {
            if path == base {
                path = "";
            } else if let Some(rest) = path
                .strip_prefix(base)
                .and_then(|rest| rest.strip_prefix('/'))
            {
                path = rest;
            }
        }

        let segment_start = path.rfind('/').map_or(0, |i| i + 1);
        let (alias, format) = match path[segment_start..].rfind('.') {
            Some(dot) if segment_start + dot + 1 < path.len() => {
                let dot = segment_start + dot;
                (&path[..dot], Some(path[dot + 1..].to_string()))
            }
            _ => (path, None),
        };

        Self {
            alias: normalize(alias).to_string(),
            format,
            query: query.filter(|q| !q.is_empty()).map(str::to_string),
        }
    }

    /// The URL that requests `alias` with this request's format and query.
    pub fn location_for(&self, base_path: &str, alias: &str) -> String {
        let base = normalize(base_path);
        let mut location = String::from("/");
        if !base.is_empty() {
            location.push_str(base);
            location.push('/');
        }
        location.push_str(alias);
        if let Some(format) = self.format.as_deref().filter(|_| !alias.is_empty()) {
            location.push('.');
            location.push_str(format);
        }
        if let Some(query) = &self.query {
            location.push('?');
            location.push_str(query);
        }
        location
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        let path = RequestPath::parse("/Article/42/", None, "/");
        assert_eq!(path.alias, "Article/42");
        assert_eq!(path.format, None);
        assert_eq!(path.query, None);
    }

    #[test]
    fn test_base_format_and_query() {
        let path = RequestPath::parse("/app/Article/42.html", Some("page=2"), "/app/");
        assert_eq!(path.alias, "Article/42");
        assert_eq!(path.format.as_deref(), Some("html"));
        assert_eq!(path.query.as_deref(), Some("page=2"));
    }

    #[test]
    fn test_base_only_prefix_of_segment() {
        // "/application" is not under "/app".
        let path = RequestPath::parse("/application/x", None, "/app");
        assert_eq!(path.alias, "application/x");
        assert_eq!(RequestPath::parse("/app", None, "/app").alias, "");
    }

    #[test]
    fn test_dots_outside_last_segment() {
        let path = RequestPath::parse("/v1.2/docs", None, "/");
        assert_eq!(path.alias, "v1.2/docs");
        assert_eq!(path.format, None);

        let trailing = RequestPath::parse("/file.", None, "/");
        assert_eq!(trailing.alias, "file.");
        assert_eq!(trailing.format, None);
    }

    #[test]
    fn test_location_for() {
        let path = RequestPath::parse("/app/Article/read/42.json", Some("x=1"), "/app");
        assert_eq!(path.location_for("/app", "Article/42"), "/app/Article/42.json?x=1");
        assert_eq!(path.location_for("/app", ""), "/app/?x=1");

        let root = RequestPath::parse("/Document", None, "/");
        assert_eq!(root.location_for("/", ""), "/");
    }
}
