//! Pattern compilation for alias/route bindings.
//!
//! # Responsibilities
//! - Split alias templates into literals and `<:name>` wildcards
//! - Split route templates into literals and `$N` references
//! - Pair wildcards with references by order of appearance
//! - Produce anchored matchers and replacement templates for both directions
//!
//! # Design Decisions
//! - Pairing is a positional zip over the two token lists; the digit carried
//!   by a reference only identifies repeated occurrences of the same value
//! - Replacement templates use braced group references (`${1}`) so that a
//!   reference followed by letters or digits is never misread
//! - A template that can never match is not an error

use std::collections::HashMap;

use regex::Regex;

use crate::routing::wildcard::Wildcard;
use crate::routing::Direction;
use crate::store::StoredBinding;

/// A piece of an alias template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasToken<'a> {
    Literal(&'a str),
    Wildcard(Wildcard),
}

/// A piece of a route template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteToken<'a> {
    Literal(&'a str),
    /// `$N`, keeping the raw text for the unpaired case.
    Reference { index: usize, raw: &'a str },
}

/// Tokenize an alias template.
pub fn tokenize_alias(template: &str) -> Vec<AliasToken<'_>> {
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(offset) = template[cursor..].find("<:") {
        let open = cursor + offset;
        let name_start = open + 2;
        let placeholder = template[name_start..].find('>').and_then(|len| {
            Wildcard::from_name(&template[name_start..name_start + len])
                .map(|wildcard| (wildcard, name_start + len + 1))
        });

        match placeholder {
            Some((wildcard, close)) => {
                if literal_start < open {
                    tokens.push(AliasToken::Literal(&template[literal_start..open]));
                }
                tokens.push(AliasToken::Wildcard(wildcard));
                literal_start = close;
                cursor = close;
            }
            None => cursor = open + 1,
        }
    }

    if literal_start < template.len() {
        tokens.push(AliasToken::Literal(&template[literal_start..]));
    }
    tokens
}

/// Tokenize a route template.
pub fn tokenize_route(template: &str) -> Vec<RouteToken<'_>> {
    let bytes = template.as_bytes();
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(offset) = template[cursor..].find('$') {
        let dollar = cursor + offset;
        let digits_start = dollar + 1;
        let mut digits_end = digits_start;
        while digits_end < bytes.len() && bytes[digits_end].is_ascii_digit() {
            digits_end += 1;
        }

        // No leading zero, and the value has to fit.
        let index = match bytes.get(digits_start) {
            Some(b'1'..=b'9') => template[digits_start..digits_end].parse::<usize>().ok(),
            _ => None,
        };

        match index {
            Some(index) => {
                if literal_start < dollar {
                    tokens.push(RouteToken::Literal(&template[literal_start..dollar]));
                }
                tokens.push(RouteToken::Reference {
                    index,
                    raw: &template[dollar..digits_end],
                });
                literal_start = digits_end;
                cursor = digits_end;
            }
            None => cursor = digits_start,
        }
    }

    if literal_start < template.len() {
        tokens.push(RouteToken::Literal(&template[literal_start..]));
    }
    tokens
}

/// Placeholder-looking names in an alias template that are not wildcards.
pub fn unknown_placeholders(template: &str) -> Vec<&str> {
    let mut unknown = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find("<:") {
        let after = &rest[open + 2..];
        match after.find('>') {
            Some(close) => {
                let name = &after[..close];
                if !name.contains("<:") && Wildcard::from_name(name).is_none() {
                    unknown.push(name);
                }
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    unknown
}

/// Counts used to validate a template pair before binding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateShape {
    pub wildcards: usize,
    pub references: usize,
}

impl TemplateShape {
    pub fn of(alias: &str, route: &str) -> Self {
        let wildcards = tokenize_alias(alias)
            .iter()
            .filter(|t| matches!(t, AliasToken::Wildcard(_)))
            .count();
        let references = tokenize_route(route)
            .iter()
            .filter(|t| matches!(t, RouteToken::Reference { .. }))
            .count();
        Self { wildcards, references }
    }

    /// References beyond the wildcard count have nothing to substitute.
    pub fn unpaired_references(&self) -> usize {
        self.references.saturating_sub(self.wildcards)
    }
}

/// One compiled alias/route rule.
#[derive(Debug, Clone)]
pub struct Binding {
    alias_template: String,
    route_template: String,
    alias_matcher: Regex,
    route_matcher: Regex,
    alias_replacement: String,
    route_replacement: String,
}

impl Binding {
    /// Compile an alias/route template pair.
    ///
    /// Both templates are expected to be trimmed of surrounding `/`.
    /// Only fails if the generated pattern exceeds the regex size limits.
    pub fn compile(alias: &str, route: &str) -> Result<Self, regex::Error> {
        let alias_tokens = tokenize_alias(alias);
        let route_tokens = tokenize_route(route);

        let wildcards: Vec<Wildcard> = alias_tokens
            .iter()
            .filter_map(|t| match t {
                AliasToken::Wildcard(w) => Some(*w),
                AliasToken::Literal(_) => None,
            })
            .collect();
        let references: Vec<usize> = route_tokens
            .iter()
            .filter_map(|t| match t {
                RouteToken::Reference { index, .. } => Some(*index),
                RouteToken::Literal(_) => None,
            })
            .collect();

        // k-th wildcard <-> k-th reference. A digit keeps its first partner.
        let mut wildcard_reference: Vec<Option<usize>> = vec![None; wildcards.len()];
        let mut reference_wildcard: HashMap<usize, usize> = HashMap::new();
        for (k, reference) in references.iter().enumerate().take(wildcards.len()) {
            wildcard_reference[k] = Some(*reference);
            reference_wildcard.entry(*reference).or_insert(k);
        }

        if references.len() > wildcards.len() {
            tracing::warn!(
                alias = %alias,
                route = %route,
                unpaired = references.len() - wildcards.len(),
                "Route references without a matching wildcard expand to nothing"
            );
        }

        // Alias matcher, remembering which group each wildcard opens.
        let mut alias_pattern = String::from("^");
        let mut alias_groups: Vec<Option<usize>> = Vec::with_capacity(wildcards.len());
        let mut group = 0;
        for token in &alias_tokens {
            match token {
                AliasToken::Literal(text) => alias_pattern.push_str(&regex::escape(text)),
                AliasToken::Wildcard(w) => {
                    alias_pattern.push_str(w.fragment());
                    if w.captures() {
                        group += 1;
                        alias_groups.push(Some(group));
                    } else {
                        alias_groups.push(None);
                    }
                }
            }
        }

        // Route matcher, remembering the group of each digit's first capture.
        let mut route_pattern = String::from("^");
        let mut reference_groups: HashMap<usize, usize> = HashMap::new();
        let mut group = 0;
        for token in &route_tokens {
            match token {
                RouteToken::Literal(text) => route_pattern.push_str(&regex::escape(text)),
                RouteToken::Reference { index, raw } => match reference_wildcard.get(index) {
                    Some(&k) => {
                        let wildcard = wildcards[k];
                        route_pattern.push_str(wildcard.fragment());
                        if wildcard.captures() {
                            group += 1;
                            reference_groups.entry(*index).or_insert(group);
                        }
                    }
                    None => route_pattern.push_str(&regex::escape(raw)),
                },
            }
        }

        // alias -> route
        let mut route_replacement = String::new();
        for token in &route_tokens {
            match token {
                RouteToken::Literal(text) => push_literal(&mut route_replacement, text),
                RouteToken::Reference { index, .. } => {
                    let group = reference_wildcard
                        .get(index)
                        .and_then(|&k| alias_groups[k]);
                    if let Some(group) = group {
                        push_group(&mut route_replacement, group);
                    }
                }
            }
        }

        // route -> alias; wildcards without a reference are dropped.
        let mut alias_replacement = String::new();
        let mut k = 0;
        for token in &alias_tokens {
            match token {
                AliasToken::Literal(text) => push_literal(&mut alias_replacement, text),
                AliasToken::Wildcard(_) => {
                    let group = wildcard_reference[k]
                        .and_then(|reference| reference_groups.get(&reference).copied());
                    if let Some(group) = group {
                        push_group(&mut alias_replacement, group);
                    }
                    k += 1;
                }
            }
        }

        Ok(Self {
            alias_template: alias.to_string(),
            route_template: route.to_string(),
            alias_matcher: Regex::new(&alias_pattern)?,
            route_matcher: Regex::new(&route_pattern)?,
            alias_replacement,
            route_replacement,
        })
    }

    /// Rebuild a binding from its persisted form.
    pub fn from_stored(stored: &StoredBinding) -> Result<Self, regex::Error> {
        Ok(Self {
            alias_template: stored.alias.clone(),
            route_template: stored.route.clone(),
            alias_matcher: Regex::new(&stored.alias_matcher)?,
            route_matcher: Regex::new(&stored.route_matcher)?,
            alias_replacement: stored.alias_replacement.clone(),
            route_replacement: stored.route_replacement.clone(),
        })
    }

    pub fn to_stored(&self) -> StoredBinding {
        StoredBinding {
            alias: self.alias_template.clone(),
            route: self.route_template.clone(),
            alias_matcher: self.alias_matcher.as_str().to_string(),
            route_matcher: self.route_matcher.as_str().to_string(),
            alias_replacement: self.alias_replacement.clone(),
            route_replacement: self.route_replacement.clone(),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias_template
    }

    pub fn route(&self) -> &str {
        &self.route_template
    }

    pub fn alias_matcher(&self) -> &Regex {
        &self.alias_matcher
    }

    pub fn route_matcher(&self) -> &Regex {
        &self.route_matcher
    }

    pub fn alias_replacement(&self) -> &str {
        &self.alias_replacement
    }

    pub fn route_replacement(&self) -> &str {
        &self.route_replacement
    }

    /// Rewrite the matched prefix of `input`, leaving the remainder intact.
    ///
    /// Returns `None` when the matcher for `direction` does not match.
    pub fn rewrite(&self, direction: Direction, input: &str) -> Option<String> {
        let (matcher, replacement) = match direction {
            Direction::ToRoute => (&self.alias_matcher, self.route_replacement.as_str()),
            Direction::ToAlias => (&self.route_matcher, self.alias_replacement.as_str()),
        };
        if !matcher.is_match(input) {
            return None;
        }
        Some(matcher.replacen(input, 1, replacement).into_owned())
    }
}

fn push_literal(template: &mut String, text: &str) {
    template.push_str(&text.replace('$', "$$"));
}

fn push_group(template: &mut String, group: usize) {
    template.push_str("${");
    template.push_str(&group.to_string());
    template.push('}');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_alias() {
        assert_eq!(
            tokenize_alias("Article/<:num>/<:seo>"),
            vec![
                AliasToken::Literal("Article/"),
                AliasToken::Wildcard(Wildcard::Num),
                AliasToken::Literal("/"),
                AliasToken::Wildcard(Wildcard::Seo),
            ]
        );
        // Unknown names stay literal.
        assert_eq!(
            tokenize_alias("a/<:slug>/<:end>"),
            vec![
                AliasToken::Literal("a/<:slug>/"),
                AliasToken::Wildcard(Wildcard::End),
            ]
        );
        assert_eq!(
            tokenize_alias("<:alpha<:num>"),
            vec![
                AliasToken::Literal("<:alpha"),
                AliasToken::Wildcard(Wildcard::Num),
            ]
        );
    }

    #[test]
    fn test_tokenize_route() {
        assert_eq!(
            tokenize_route("Article/read/$1/$12"),
            vec![
                RouteToken::Literal("Article/read/"),
                RouteToken::Reference { index: 1, raw: "$1" },
                RouteToken::Literal("/"),
                RouteToken::Reference { index: 12, raw: "$12" },
            ]
        );
        // $0, leading zeros and a bare dollar are literal text.
        assert_eq!(
            tokenize_route("cost/$0/$01/$"),
            vec![RouteToken::Literal("cost/$0/$01/$")]
        );
    }

    #[test]
    fn test_unknown_placeholders() {
        assert_eq!(unknown_placeholders("a/<:slug>/<:num>/<:foo>"), vec!["slug", "foo"]);
        assert!(unknown_placeholders("a/<:rest>").is_empty());
    }

    #[test]
    fn test_shape() {
        let shape = TemplateShape::of("a/<:num>", "b/$1/$2");
        assert_eq!(shape.wildcards, 1);
        assert_eq!(shape.references, 2);
        assert_eq!(shape.unpaired_references(), 1);
    }

    #[test]
    fn test_compile_simple_wildcard() {
        let binding = Binding::compile("Article/<:num>", "Article/read/$1").unwrap();
        assert_eq!(binding.alias_matcher().as_str(), "^Article/([0-9]+)");
        assert_eq!(binding.route_matcher().as_str(), "^Article/read/([0-9]+)");
        assert_eq!(binding.route_replacement(), "Article/read/${1}");
        assert_eq!(binding.alias_replacement(), "Article/${1}");

        assert_eq!(
            binding.rewrite(Direction::ToRoute, "Article/42").as_deref(),
            Some("Article/read/42")
        );
        assert_eq!(
            binding.rewrite(Direction::ToAlias, "Article/read/42").as_deref(),
            Some("Article/42")
        );
        assert_eq!(binding.rewrite(Direction::ToRoute, "Article/abc"), None);
    }

    #[test]
    fn test_literals_are_escaped() {
        let binding = Binding::compile("a.b/(x)", "c+d/$$").unwrap();
        assert!(binding.rewrite(Direction::ToRoute, "aXb/(x)").is_none());
        assert_eq!(
            binding.rewrite(Direction::ToRoute, "a.b/(x)").as_deref(),
            Some("c+d/$$")
        );
        assert_eq!(
            binding.rewrite(Direction::ToAlias, "c+d/$$").as_deref(),
            Some("a.b/(x)")
        );
    }

    #[test]
    fn test_prefix_rewrite_keeps_remainder() {
        let binding = Binding::compile("blog", "Post/list").unwrap();
        assert_eq!(
            binding.rewrite(Direction::ToRoute, "blog/page/2").as_deref(),
            Some("Post/list/page/2")
        );
    }

    #[test]
    fn test_pairing_follows_order_not_digits() {
        let binding = Binding::compile("p/<:num>/<:alpha>", "Post/show/$2/$1").unwrap();
        // First wildcard pairs with the first reference met ($2).
        assert_eq!(binding.route_matcher().as_str(), "^Post/show/([0-9]+)/([a-zA-Z]+)");
        assert_eq!(
            binding.rewrite(Direction::ToRoute, "p/7/abc").as_deref(),
            Some("Post/show/7/abc")
        );
        assert_eq!(
            binding.rewrite(Direction::ToAlias, "Post/show/7/abc").as_deref(),
            Some("p/7/abc")
        );
    }

    #[test]
    fn test_unpaired_wildcard_is_dropped_from_alias() {
        let binding = Binding::compile("news/<:num>/<:seo>", "News/read/$1").unwrap();
        assert_eq!(
            binding.rewrite(Direction::ToRoute, "news/3/big-day").as_deref(),
            Some("News/read/3")
        );
        assert_eq!(binding.alias_replacement(), "news/${1}/");
        assert_eq!(
            binding.rewrite(Direction::ToAlias, "News/read/3").as_deref(),
            Some("news/3/")
        );
    }

    #[test]
    fn test_unpaired_reference_expands_to_nothing() {
        let binding = Binding::compile("x/<:num>", "X/show/$1/$2").unwrap();
        assert_eq!(binding.route_matcher().as_str(), r"^X/show/([0-9]+)/\$2");
        assert_eq!(
            binding.rewrite(Direction::ToRoute, "x/5").as_deref(),
            Some("X/show/5/")
        );
    }

    #[test]
    fn test_repeated_reference_reuses_value() {
        let binding = Binding::compile("t/<:alpha>", "Tag/$1/$1").unwrap();
        assert_eq!(
            binding.rewrite(Direction::ToRoute, "t/rust").as_deref(),
            Some("Tag/rust/rust")
        );
        assert_eq!(
            binding.rewrite(Direction::ToAlias, "Tag/rust/rust").as_deref(),
            Some("t/rust")
        );
    }

    #[test]
    fn test_end_wildcard() {
        let binding = Binding::compile("<:end>", "Document").unwrap();
        assert_eq!(binding.rewrite(Direction::ToRoute, "").as_deref(), Some("Document"));
        assert_eq!(binding.rewrite(Direction::ToRoute, "other"), None);
        assert_eq!(binding.rewrite(Direction::ToAlias, "Document").as_deref(), Some(""));
    }

    #[test]
    fn test_stored_round_trip() {
        let binding = Binding::compile("Document/<:rest>", "Document/read/$1").unwrap();
        let restored = Binding::from_stored(&binding.to_stored()).unwrap();
        assert_eq!(restored.alias(), "Document/<:rest>");
        assert_eq!(
            restored.rewrite(Direction::ToRoute, "Document/intro/setup").as_deref(),
            Some("Document/read/intro/setup")
        );
    }
}
