//! Extraction Rules
//!
//! A rule pairs a marker name with a signed offset, written `MARKER:±N`
//! on the command line (e.g. `NS1:+3000`, `LN7:-3000`). Rules are applied
//! in the order given; earlier rules take priority.

use std::fmt;
use std::str::FromStr;

/// One `(marker, offset)` extraction rule. The offset is never zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    marker: String,
    offset: i64,
}

impl Rule {
    /// Creates a rule, rejecting empty marker names and zero offsets.
    pub fn new(marker: impl Into<String>, offset: i64) -> Result<Self, String> {
        let marker = marker.into();
        if marker.is_empty() {
            return Err("Marker name must not be empty".to_string());
        }
        if offset == 0 {
            return Err(format!("Offset for marker '{}' must be non-zero", marker));
        }
        Ok(Self { marker, offset })
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Signed offset: positive is downstream of the marker start,
    /// negative is upstream of the marker end.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Window length requested by this rule.
    pub fn magnitude(&self) -> u64 {
        self.offset.unsigned_abs()
    }
}

impl FromStr for Rule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (marker, value) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid rule '{}': expected MARKER:OFFSET (e.g. NS1:+3000)", s))?;

        if value.contains(':') {
            return Err(format!("Invalid rule '{}': more than one ':' separator", s));
        }

        // Markers are matched verbatim against aligner subject ids
        if marker.trim() != marker {
            return Err(format!("Invalid rule '{}': marker name has surrounding whitespace", s));
        }

        let offset: i64 = value
            .parse()
            .map_err(|_| format!("Invalid rule '{}': offset '{}' is not an integer", s, value))?;

        Rule::new(marker, offset).map_err(|e| format!("Invalid rule '{}': {}", s, e))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:+}", self.marker, self.offset)
    }
}

/// clap value parser for `--rules`.
pub fn parse_rule(s: &str) -> Result<Rule, String> {
    s.parse()
}

/// Ordered, non-empty list of rules; position is priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Result<Self, String> {
        if rules.is_empty() {
            return Err("At least one extraction rule is required".to_string());
        }
        Ok(Self { rules })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self.rules.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ");
        write!(f, "[{}]", joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rule() {
        let rule: Rule = "NS1:+3000".parse().unwrap();
        assert_eq!(rule.marker(), "NS1");
        assert_eq!(rule.offset(), 3000);
        assert_eq!(rule.magnitude(), 3000);

        let rule: Rule = "LN7:-3000".parse().unwrap();
        assert_eq!(rule.offset(), -3000);
        assert_eq!(rule.magnitude(), 3000);

        // Unsigned positive offsets are accepted
        assert_eq!("ITS:250".parse::<Rule>().unwrap().offset(), 250);
    }

    #[test]
    fn test_invalid_rules() {
        assert!("NS1".parse::<Rule>().is_err());
        assert!("NS1:abc".parse::<Rule>().is_err());
        assert!("NS1:+0".parse::<Rule>().is_err());
        assert!(":+100".parse::<Rule>().is_err());
        assert!("NS1:+100:5".parse::<Rule>().is_err());
        assert!("NS1:".parse::<Rule>().is_err());
    }

    #[test]
    fn test_whitespace_is_not_trimmed() {
        assert!(" NS1:+100".parse::<Rule>().is_err());
        assert!("NS1 :+100".parse::<Rule>().is_err());
        assert!("NS1: 100".parse::<Rule>().is_err());
        assert!("NS1:+100 ".parse::<Rule>().is_err());
    }

    #[test]
    fn test_rule_display() {
        assert_eq!(Rule::new("NS1", 300).unwrap().to_string(), "NS1:+300");
        assert_eq!(Rule::new("LN7", -50).unwrap().to_string(), "LN7:-50");
    }

    #[test]
    fn test_rule_set() {
        assert!(RuleSet::new(Vec::new()).is_err());

        let set = RuleSet::new(vec![
            parse_rule("A:+100").unwrap(),
            parse_rule("B:-100").unwrap(),
        ])
        .unwrap();
        assert_eq!(set.iter().count(), 2);
        assert_eq!(set.iter().next().unwrap().marker(), "A");
        assert_eq!(set.to_string(), "[A:+100, B:-100]");
    }
}
