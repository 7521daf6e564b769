// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Path patterns and the matching predicate.
//!
//! A pattern is either a literal prefix or a regular expression. Candidates
//! are matched as given: no separator normalization, no escaping. Regexes
//! are unanchored; anchor them with `^`/`$` where needed.

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};

/// A single path pattern.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "PatternRecord")]
pub enum PathPattern {
    /// Matches candidates starting with this string.
    Prefix(String),
    /// Matches candidates containing a match of this expression.
    Regex(Regex),
}

/// Config form: a bare string is a prefix, `{ "regex": ".." }` a regex.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PatternRecord {
    Prefix(String),
    Regex { regex: String },
}

impl TryFrom<PatternRecord> for PathPattern {
    type Error = Error;

    fn try_from(record: PatternRecord) -> Result<Self> {
        match record {
            PatternRecord::Prefix(prefix) => Ok(PathPattern::prefix(prefix)),
            PatternRecord::Regex { regex } => PathPattern::regex(&regex),
        }
    }
}

impl PathPattern {
    /// Literal prefix pattern.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        PathPattern::Prefix(prefix.into())
    }

    /// Compiles a regular-expression pattern.
    pub fn regex(expr: &str) -> Result<Self> {
        Regex::new(expr)
            .map(PathPattern::Regex)
            .map_err(|source| Error::InvalidPattern {
                pattern: expr.to_string(),
                source,
            })
    }

    /// Source text of the pattern.
    pub fn as_str(&self) -> &str {
        match self {
            PathPattern::Prefix(prefix) => prefix,
            PathPattern::Regex(regex) => regex.as_str(),
        }
    }

    /// Tests a single candidate against this pattern.
    #[inline]
    pub fn is_match(&self, candidate: &str) -> bool {
        match self {
            PathPattern::Prefix(prefix) => candidate.starts_with(prefix.as_str()),
            PathPattern::Regex(regex) => regex.is_match(candidate),
        }
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PathPattern::Prefix(a), PathPattern::Prefix(b)) => a == b,
            (PathPattern::Regex(a), PathPattern::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

/// Returns `true` iff `candidate` matches at least one pattern.
///
/// Total and side-effect free; an empty pattern list matches nothing.
pub fn matches(candidate: &str, patterns: &[PathPattern]) -> bool {
    patterns.iter().any(|p| p.is_match(candidate))
}

/// Ordered list of patterns.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct PatternSet(Vec<PathPattern>);

impl PatternSet {
    /// Creates an empty set, which matches nothing.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Set of literal prefixes.
    pub fn prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(prefixes.into_iter().map(PathPattern::prefix).collect())
    }

    /// Appends a pattern.
    pub fn push(&mut self, pattern: PathPattern) {
        self.0.push(pattern);
    }

    /// See [`matches`].
    #[inline]
    pub fn matches(&self, candidate: &str) -> bool {
        matches(candidate, &self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathPattern> {
        self.0.iter()
    }
}

impl From<Vec<PathPattern>> for PatternSet {
    fn from(patterns: Vec<PathPattern>) -> Self {
        Self(patterns)
    }
}

impl FromIterator<PathPattern> for PatternSet {
    fn from_iter<T: IntoIterator<Item = PathPattern>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_matches_nothing() {
        assert!(!matches("anything", &[]));
        assert!(!PatternSet::new().matches(""));
    }

    #[test]
    fn prefix_match() {
        let set = PatternSet::prefixes(["Rich1", "Muon"]);
        assert!(set.matches("Rich1Mirror_3"));
        assert!(set.matches("Muon"));
        assert!(!set.matches("rich1"));
        assert!(!set.matches("MagnetMuon"));
    }

    #[test]
    fn regex_match_is_unanchored() {
        let pattern = PathPattern::regex(r"Mirror_\d+").unwrap();
        assert!(pattern.is_match("World/Rich1/Mirror_12"));
        assert!(!pattern.is_match("World/Rich1/Mirror_"));

        let anchored = PathPattern::regex(r"^World/Rich1$").unwrap();
        assert!(anchored.is_match("World/Rich1"));
        assert!(!anchored.is_match("World/Rich1/Mirror_0"));
    }

    #[test]
    fn separators_are_not_normalized() {
        let set = PatternSet::prefixes(["World/Rich1/"]);
        assert!(!set.matches("World//Rich1/x"));
        assert!(set.matches("World/Rich1/x"));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let err = PathPattern::regex("(unclosed").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn patterns_deserialize_from_config_forms() {
        let set: PatternSet =
            serde_json::from_str(r#"["Velo", { "regex": "^World/Ecal$" }]"#).unwrap();
        let patterns: Vec<&PathPattern> = set.iter().collect();
        assert_eq!(patterns[0], &PathPattern::prefix("Velo"));
        assert!(matches!(patterns[1], PathPattern::Regex(r) if r.as_str() == "^World/Ecal$"));

        let err = serde_json::from_str::<PathPattern>(r#"{ "regex": "(unclosed" }"#).unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
        assert!(serde_json::from_str::<PathPattern>("42").is_err());
    }

    #[test]
    fn mixed_set_any_match() {
        let mut set = PatternSet::prefixes(["Velo"]);
        set.push(PathPattern::regex("Ecal$").unwrap());
        assert_eq!(set.len(), 2);
        assert!(set.matches("VeloLeft"));
        assert!(set.matches("World/Ecal"));
        assert!(!set.matches("World/EcalInner"));
    }
}
