use super::error::FilterParseError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// How many values an operator takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// `EXISTS` / `NOT_EXISTS`
    Zero,
    /// A single value
    Unary,
    /// A comma separated list (`IN` / `NOT_IN`)
    Multi,
}

/// Filter operators understood by the query builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    In,
    NotIn,
    Like,
    NotLike,
    Regex,
    NotRegex,
    Exists,
    NotExists,
    Contains,
    NotContains,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Has,
    NotHas,
}

impl Operator {
    /// Every operator, in the order they are offered as suggestions.
    pub const ALL: [Operator; 18] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::In,
        Operator::NotIn,
        Operator::Like,
        Operator::NotLike,
        Operator::Regex,
        Operator::NotRegex,
        Operator::Exists,
        Operator::NotExists,
        Operator::Contains,
        Operator::NotContains,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqual,
        Operator::LessThan,
        Operator::LessThanOrEqual,
        Operator::Has,
        Operator::NotHas,
    ];

    /// Canonical display token, as typed in the search box
    pub fn display(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::In => "IN",
            Operator::NotIn => "NOT_IN",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT_LIKE",
            Operator::Regex => "REGEX",
            Operator::NotRegex => "NOT_REGEX",
            Operator::Exists => "EXISTS",
            Operator::NotExists => "NOT_EXISTS",
            Operator::Contains => "CONTAINS",
            Operator::NotContains => "NOT_CONTAINS",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::Has => "HAS",
            Operator::NotHas => "NHAS",
        }
    }

    /// Internal code sent to the query service
    pub fn code(&self) -> &'static str {
        match self {
            Operator::Equal => "eq",
            Operator::NotEqual => "neq",
            Operator::In => "in",
            Operator::NotIn => "nin",
            Operator::Like => "like",
            Operator::NotLike => "nlike",
            Operator::Regex => "regex",
            Operator::NotRegex => "nregex",
            Operator::Exists => "exists",
            Operator::NotExists => "nexists",
            Operator::Contains => "contains",
            Operator::NotContains => "ncontains",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::Has => "has",
            Operator::NotHas => "nhas",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Operator::Exists | Operator::NotExists => Arity::Zero,
            Operator::In | Operator::NotIn => Arity::Multi,
            _ => Arity::Unary,
        }
    }

    pub fn is_multi(&self) -> bool {
        self.arity() == Arity::Multi
    }

    pub fn is_zero_arity(&self) -> bool {
        self.arity() == Arity::Zero
    }

    /// Look up an operator by its display token.
    ///
    /// Word operators match case-insensitively, symbols match exactly.
    pub fn from_display(s: &str) -> Option<Operator> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.display().eq_ignore_ascii_case(s))
    }

    /// Look up an operator by its internal code (exact match).
    pub fn from_code(s: &str) -> Option<Operator> {
        Self::ALL.into_iter().find(|op| op.code() == s)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

impl FromStr for Operator {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::from_display(s)
            .or_else(|| Operator::from_code(s.trim()))
            .ok_or_else(|| FilterParseError::UnknownOperator(s.to_string()))
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_code_are_bijective() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_display(op.display()), Some(op));
            assert_eq!(Operator::from_code(op.code()), Some(op));
        }
        let displays: std::collections::HashSet<_> =
            Operator::ALL.iter().map(|op| op.display()).collect();
        let codes: std::collections::HashSet<_> =
            Operator::ALL.iter().map(|op| op.code()).collect();
        assert_eq!(displays.len(), Operator::ALL.len());
        assert_eq!(codes.len(), Operator::ALL.len());
    }

    #[test]
    fn test_word_operators_are_case_insensitive() {
        assert_eq!(Operator::from_display("not_in"), Some(Operator::NotIn));
        assert_eq!(Operator::from_display("Exists"), Some(Operator::Exists));
        assert_eq!(Operator::from_display("nhas"), Some(Operator::NotHas));
    }

    #[test]
    fn test_from_str_accepts_codes() {
        assert_eq!("eq".parse::<Operator>().unwrap(), Operator::Equal);
        assert_eq!("nexists".parse::<Operator>().unwrap(), Operator::NotExists);
        assert_eq!(">=".parse::<Operator>().unwrap(), Operator::GreaterThanOrEqual);
        assert!("between".parse::<Operator>().is_err());
    }

    #[test]
    fn test_arity() {
        assert_eq!(Operator::In.arity(), Arity::Multi);
        assert_eq!(Operator::NotExists.arity(), Arity::Zero);
        assert_eq!(Operator::LessThan.arity(), Arity::Unary);
    }

    #[test]
    fn test_serde_uses_internal_code() {
        let json = serde_json::to_string(&Operator::NotContains).unwrap();
        assert_eq!(json, "\"ncontains\"");
        let op: Operator = serde_json::from_str("\"nin\"").unwrap();
        assert_eq!(op, Operator::NotIn);
    }
}
