//! Splitting a route string into its dispatch target.

use serde::Serialize;

/// `controller/action/arg1/arg2/...`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteTarget {
    pub controller: String,
    pub action: String,
    pub args: Vec<String>,
}

impl RouteTarget {
    /// Split `route`, falling back to the defaults for missing parts.
    ///
    /// - `""` → default controller, default action
    /// - `"Blog"` → `Blog`, default action
    /// - `"Blog/show/7"` → `Blog`, `show`, `["7"]`
    pub fn from_route(route: &str, default_controller: &str, default_action: &str) -> Self {
        if route.is_empty() {
            return Self {
                controller: default_controller.to_string(),
                action: default_action.to_string(),
                args: Vec::new(),
            };
        }

        let mut segments = route.split('/');
        let controller = segments.next().unwrap_or(default_controller);
        let action = segments
            .next()
            .filter(|a| !a.is_empty())
            .unwrap_or(default_action);

        Self {
            controller: controller.to_string(),
            action: action.to_string(),
            args: segments.map(str::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_route_uses_defaults() {
        let target = RouteTarget::from_route("", "Index", "index");
        assert_eq!(target.controller, "Index");
        assert_eq!(target.action, "index");
        assert!(target.args.is_empty());
    }

    #[test]
    fn test_controller_only() {
        let target = RouteTarget::from_route("Document", "Index", "index");
        assert_eq!(target.controller, "Document");
        assert_eq!(target.action, "index");
    }

    #[test]
    fn test_arguments() {
        let target = RouteTarget::from_route("Document/read/guide/intro", "Index", "index");
        assert_eq!(target.controller, "Document");
        assert_eq!(target.action, "read");
        assert_eq!(target.args, vec!["guide", "intro"]);
    }
}
