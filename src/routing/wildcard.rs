//! Wildcard placeholders usable in alias templates.
//!
//! A placeholder is written `<:name>` where `name` is one of the closed set
//! below. Anything else between `<:` and `>` is plain literal text.

use std::fmt;

/// A named wildcard with a fixed character class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wildcard {
    /// ASCII letters.
    Alpha,
    /// ASCII letters and digits.
    AlphaNum,
    /// ASCII digits.
    Num,
    /// Letters, digits, `-` and `_` (slug friendly).
    Seo,
    /// Everything up to the end of the input.
    Rest,
    /// Matches only at the end of the input, captures nothing.
    End,
}

impl Wildcard {
    pub const ALL: [Wildcard; 6] = [
        Wildcard::Alpha,
        Wildcard::AlphaNum,
        Wildcard::Num,
        Wildcard::Seo,
        Wildcard::Rest,
        Wildcard::End,
    ];

    /// Look up a wildcard by its placeholder name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "alpha" => Some(Self::Alpha),
            "alphanum" => Some(Self::AlphaNum),
            "num" => Some(Self::Num),
            "seo" => Some(Self::Seo),
            "rest" => Some(Self::Rest),
            "end" => Some(Self::End),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::AlphaNum => "alphanum",
            Self::Num => "num",
            Self::Seo => "seo",
            Self::Rest => "rest",
            Self::End => "end",
        }
    }

    /// Regular expression fragment substituted for the placeholder.
    pub fn fragment(self) -> &'static str {
        match self {
            Self::Alpha => "([a-zA-Z]+)",
            Self::AlphaNum => "([0-9a-zA-Z]+)",
            Self::Num => "([0-9]+)",
            Self::Seo => "([0-9a-zA-Z_-]+)",
            Self::Rest => "(.+$)",
            Self::End => "$",
        }
    }

    /// Whether the fragment opens a capture group.
    pub fn captures(self) -> bool {
        !matches!(self, Self::End)
    }
}

impl fmt::Display for Wildcard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<:{}>", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_names_round_trip() {
        for wildcard in Wildcard::ALL {
            assert_eq!(Wildcard::from_name(wildcard.name()), Some(wildcard));
        }
        assert_eq!(Wildcard::from_name("slug"), None);
        assert_eq!(Wildcard::from_name("Alpha"), None);
    }

    #[test]
    fn test_fragments_compile() {
        for wildcard in Wildcard::ALL {
            let re = Regex::new(&format!("^{}", wildcard.fragment())).unwrap();
            assert_eq!(re.captures_len() > 1, wildcard.captures(), "{}", wildcard);
        }
    }

    #[test]
    fn test_character_classes() {
        let seo = Regex::new(&format!("^{}$", Wildcard::Seo.fragment())).unwrap();
        assert!(seo.is_match("my-first_post-2"));
        assert!(!seo.is_match("my post"));

        let num = Regex::new(&format!("^{}", Wildcard::Num.fragment())).unwrap();
        assert_eq!(&num.captures("42abc").unwrap()[1], "42");

        let end = Regex::new(&format!("^{}", Wildcard::End.fragment())).unwrap();
        assert!(end.is_match(""));
        assert!(!end.is_match("x"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Wildcard::AlphaNum.to_string(), "<:alphanum>");
    }
}
