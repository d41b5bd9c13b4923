//! Version specs: single versions and ranges.
//!
//! Only what the graph engine needs lives here: a total order over single
//! versions and a containment predicate for ranges. Single versions are
//! tokenized into numeric and qualifier segments, so `1.10` sorts after
//! `1.9` and `1.0-alpha-1` sorts before `1.0`.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Rank of the implicit "release" qualifier. Missing segments compare as this.
const RELEASE_RANK: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Token {
    Number(u64),
    Qualifier(String),
}

fn qualifier_rank(q: &str) -> u8 {
    match q {
        "alpha" | "a" => 0,
        "beta" | "b" => 1,
        "milestone" | "m" => 2,
        "rc" | "cr" => 3,
        "snapshot" => 4,
        "" | "ga" | "final" | "release" => RELEASE_RANK,
        "sp" => 6,
        _ => 7,
    }
}

fn compare_tokens(a: Option<&Token>, b: Option<&Token>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(Token::Number(x)), Some(Token::Number(y))) => x.cmp(y),
        (Some(Token::Number(_)), Some(Token::Qualifier(_))) => Ordering::Greater,
        (Some(Token::Qualifier(_)), Some(Token::Number(_))) => Ordering::Less,
        (Some(Token::Qualifier(x)), Some(Token::Qualifier(y))) => {
            let (rx, ry) = (qualifier_rank(x), qualifier_rank(y));
            rx.cmp(&ry).then_with(|| if rx == 7 { x.cmp(y) } else { Ordering::Equal })
        }
        (Some(Token::Number(n)), None) => n.cmp(&0),
        (None, Some(Token::Number(n))) => 0.cmp(n),
        (Some(Token::Qualifier(q)), None) => qualifier_rank(q).cmp(&RELEASE_RANK),
        (None, Some(Token::Qualifier(q))) => RELEASE_RANK.cmp(&qualifier_rank(q)),
    }
}

/// A single, concrete version such as `1.2.3` or `2.0-SNAPSHOT`.
#[derive(Debug, Clone)]
pub struct SingleVersion {
    raw: String,
    tokens: Vec<Token>,
}

impl SingleVersion {
    /// Parse a single version string.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRef` for empty input or input containing range
    /// delimiters.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.contains(['[', ']', '(', ')', ',']) {
            return Err(Error::InvalidRef {
                input: raw.to_string(),
                reason: "not a single version".to_string(),
            });
        }

        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut digits = false;
        let flush = |current: &mut String, digits: bool, tokens: &mut Vec<Token>| {
            if current.is_empty() {
                return;
            }
            let token = if digits {
                current
                    .parse()
                    .map_or_else(|_| Token::Qualifier(current.clone()), Token::Number)
            } else {
                Token::Qualifier(current.to_ascii_lowercase())
            };
            tokens.push(token);
            current.clear();
        };

        for c in raw.chars() {
            if c == '.' || c == '-' || c == '_' {
                flush(&mut current, digits, &mut tokens);
                continue;
            }
            let is_digit = c.is_ascii_digit();
            if !current.is_empty() && is_digit != digits {
                flush(&mut current, digits, &mut tokens);
            }
            digits = is_digit;
            current.push(c);
        }
        flush(&mut current, digits, &mut tokens);

        // Trailing zeros and release markers carry no ordering weight.
        while let Some(last) = tokens.last() {
            let trivial = match last {
                Token::Number(n) => *n == 0,
                Token::Qualifier(q) => qualifier_rank(q) == RELEASE_RANK,
            };
            if !trivial {
                break;
            }
            tokens.pop();
        }

        Ok(Self {
            raw: raw.to_string(),
            tokens,
        })
    }

    /// The version string as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this is a snapshot version.
    pub fn is_snapshot(&self) -> bool {
        self.raw.to_ascii_uppercase().ends_with("SNAPSHOT")
    }
}

impl PartialEq for SingleVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SingleVersion {}

impl Hash for SingleVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tokens.hash(state);
    }
}

impl PartialOrd for SingleVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SingleVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.tokens.len().max(other.tokens.len());
        (0..len)
            .map(|i| compare_tokens(self.tokens.get(i), other.tokens.get(i)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for SingleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One end of a version range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeBound {
    /// The bounding version
    pub version: SingleVersion,
    /// Whether the bound itself is part of the range
    pub inclusive: bool,
}

/// A version range such as `[1.0,2.0)`. Missing ends are unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    /// Lower bound, `None` when unbounded
    pub lower: Option<RangeBound>,
    /// Upper bound, `None` when unbounded
    pub upper: Option<RangeBound>,
}

impl VersionRange {
    /// Whether `version` falls inside this range.
    pub fn contains(&self, version: &SingleVersion) -> bool {
        let above = self.lower.as_ref().is_none_or(|b| match version.cmp(&b.version) {
            Ordering::Greater => true,
            Ordering::Equal => b.inclusive,
            Ordering::Less => false,
        });
        let below = self.upper.as_ref().is_none_or(|b| match version.cmp(&b.version) {
            Ordering::Less => true,
            Ordering::Equal => b.inclusive,
            Ordering::Greater => false,
        });
        above && below
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lower {
            Some(b) => write!(f, "{}{}", if b.inclusive { '[' } else { '(' }, b.version)?,
            None => f.write_str("(")?,
        }
        f.write_str(",")?;
        match &self.upper {
            Some(b) => write!(f, "{}{}", b.version, if b.inclusive { ']' } else { ')' }),
            None => f.write_str(")"),
        }
    }
}

/// Either a concrete version or a range of acceptable versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionSpec {
    /// A single concrete version
    Single(SingleVersion),
    /// A range of versions
    Range(VersionRange),
}

impl VersionSpec {
    /// Whether `version` is acceptable under this spec.
    pub fn contains(&self, version: &SingleVersion) -> bool {
        match self {
            Self::Single(v) => v == version,
            Self::Range(r) => r.contains(version),
        }
    }

    /// Whether this spec names exactly one version.
    pub fn is_single(&self) -> bool {
        matches!(self, Self::Single(_))
    }

    /// The concrete version, if this spec names exactly one.
    pub fn as_single(&self) -> Option<&SingleVersion> {
        match self {
            Self::Single(v) => Some(v),
            Self::Range(_) => None,
        }
    }
}

fn parse_bound(raw: &str, inclusive: bool) -> Result<Option<RangeBound>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    Ok(Some(RangeBound {
        version: SingleVersion::parse(raw)?,
        inclusive,
    }))
}

impl FromStr for VersionSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = |reason: &str| Error::InvalidRef {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let Some(first) = s.chars().next() else {
            return Err(invalid("empty version"));
        };
        if first != '[' && first != '(' {
            return SingleVersion::parse(s).map(Self::Single);
        }

        let last = s.chars().last().ok_or_else(|| invalid("empty version"))?;
        if last != ']' && last != ')' {
            return Err(invalid("unterminated range"));
        }
        let body = &s[1..s.len() - 1];
        let lower_inclusive = first == '[';
        let upper_inclusive = last == ']';

        match body.split_once(',') {
            None => {
                // `[1.0]` pins exactly one version.
                if !(lower_inclusive && upper_inclusive) {
                    return Err(invalid("single-version range must be inclusive"));
                }
                SingleVersion::parse(body).map(Self::Single)
            }
            Some((lo, hi)) => {
                if hi.contains(',') {
                    return Err(invalid("multi-range specs are not supported"));
                }
                let range = VersionRange {
                    lower: parse_bound(lo, lower_inclusive)?,
                    upper: parse_bound(hi, upper_inclusive)?,
                };
                if let (Some(l), Some(u)) = (&range.lower, &range.upper) {
                    if l.version > u.version {
                        return Err(invalid("lower bound exceeds upper bound"));
                    }
                }
                Ok(Self::Range(range))
            }
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(v) => v.fmt(f),
            Self::Range(r) => r.fmt(f),
        }
    }
}

impl Serialize for VersionSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn v(s: &str) -> SingleVersion {
        SingleVersion::parse(s).unwrap()
    }

    #[rstest]
    #[case::numeric("1.9", "1.10")]
    #[case::qualifier_before_release("1.0-alpha-1", "1.0")]
    #[case::snapshot_before_release("2.0-SNAPSHOT", "2.0")]
    #[case::rc_before_release("3.1-rc1", "3.1")]
    #[case::patch_after_release("1.0", "1.0.1")]
    #[case::beta_before_rc("1.0-beta", "1.0-rc")]
    fn test_single_version_ordering(#[case] lower: &str, #[case] higher: &str) {
        assert!(v(lower) < v(higher), "{lower} should sort before {higher}");
    }

    #[test]
    fn test_trailing_zeros_are_equal() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("1"), v("1.0-final"));
    }

    #[rstest]
    #[case("[1.0,2.0)", "1.0", true)]
    #[case("[1.0,2.0)", "2.0", false)]
    #[case("(1.0,2.0]", "1.0", false)]
    #[case("(1.0,2.0]", "2.0", true)]
    #[case("[1.5,)", "9.9", true)]
    #[case("(,1.5]", "0.1", true)]
    #[case("(,1.5]", "1.6", false)]
    fn test_range_contains(#[case] spec: &str, #[case] version: &str, #[case] expected: bool) {
        let spec: VersionSpec = spec.parse().unwrap();
        assert_eq!(spec.contains(&v(version)), expected);
    }

    #[test]
    fn test_pinned_range_is_single() {
        let spec: VersionSpec = "[1.2]".parse().unwrap();
        assert!(spec.is_single());
        assert!(spec.contains(&v("1.2")));
    }

    #[rstest]
    #[case("")]
    #[case("[1.0,2.0")]
    #[case("[2.0,1.0]")]
    #[case("(1.0)")]
    fn test_invalid_specs_rejected(#[case] input: &str) {
        assert!(input.parse::<VersionSpec>().is_err());
    }

    #[test]
    fn test_range_display_round_trips() {
        for raw in ["[1.0,2.0)", "(,1.5]", "[1.5,)"] {
            let spec: VersionSpec = raw.parse().unwrap();
            assert_eq!(spec.to_string(), raw);
        }
    }
}
