//! Declarative business-rule validation over the flat mapping.
//!
//! Every configured rule is evaluated independently against the parsed
//! message; violations accumulate and nothing short-circuits. Violations
//! are returned as data: accepting or rejecting a message stays the
//! caller's decision.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::mt_parser::{FieldMap, MtMessage};

/// Ordered validation rule set.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    pub rules: Vec<ValidationRule>,
}

impl ValidationConfig {
    /// Deserialize a rule set from JSON. Unknown rule types, operators,
    /// and uncompilable patterns fail the load.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One typed validation rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ValidationRule {
    /// Target key must be present and non-empty.
    Required {
        key: String,
        #[serde(default)]
        message: Option<String>,
    },

    /// Value length must fall within the configured bounds.
    Length {
        key: String,
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
        #[serde(default)]
        message: Option<String>,
    },

    /// Value, when present, must fully match the pattern.
    Regex {
        key: String,
        pattern: Pattern,
        #[serde(default)]
        message: Option<String>,
    },

    /// Value, when present, must be one of the listed values.
    AllowedValues {
        key: String,
        values: Vec<String>,
        #[serde(default)]
        message: Option<String>,
    },

    /// Value, when present, must not be one of the listed values.
    ForbiddenValues {
        key: String,
        values: Vec<String>,
        #[serde(default)]
        message: Option<String>,
    },

    /// Target required when the trigger key is present, or, with
    /// `whenPresent: false`, when it is absent.
    #[serde(rename_all = "camelCase")]
    ConditionalRequired {
        key: String,
        when_key: String,
        #[serde(default = "default_true")]
        when_present: bool,
        #[serde(default)]
        message: Option<String>,
    },

    /// Exactly one of the keys must be non-empty.
    MutuallyExclusive {
        keys: Vec<String>,
        #[serde(default)]
        message: Option<String>,
    },

    /// At most one of the keys may be non-empty.
    AtMostOneOf {
        keys: Vec<String>,
        #[serde(default)]
        message: Option<String>,
    },

    /// Numeric comparison of the decimal-normalized value against a
    /// threshold. A non-numeric value fails the comparison.
    Compare {
        key: String,
        operator: CompareOp,
        threshold: String,
        #[serde(default)]
        message: Option<String>,
    },
}

fn default_true() -> bool {
    true
}

/// A configured regular expression, compiled once at load time and
/// anchored so it must match the entire value.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct Pattern {
    regex: Regex,
    source: String,
}

impl Pattern {
    pub fn is_full_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl TryFrom<String> for Pattern {
    type Error = Error;

    fn try_from(source: String) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{source})$"))
            .map_err(|e| Error::InvalidPattern(format!("{source}: {e}")))?;
        Ok(Pattern { regex, source })
    }
}

/// Comparison operator for `compare` rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CompareOp {
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "==")]
    Equal,
}

impl CompareOp {
    fn eval(self, value: Decimal, threshold: Decimal) -> bool {
        match self {
            CompareOp::Greater => value > threshold,
            CompareOp::Less => value < threshold,
            CompareOp::GreaterOrEqual => value >= threshold,
            CompareOp::LessOrEqual => value <= threshold,
            CompareOp::Equal => value == threshold,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompareOp::Greater => ">",
            CompareOp::Less => "<",
            CompareOp::GreaterOrEqual => ">=",
            CompareOp::LessOrEqual => "<=",
            CompareOp::Equal => "==",
        })
    }
}

/// One accumulated rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Evaluates an ordered rule set against parsed messages.
#[derive(Debug, Clone)]
pub struct MtValidator {
    config: ValidationConfig,
}

impl MtValidator {
    pub fn new(config: ValidationConfig) -> Self {
        MtValidator { config }
    }

    /// Evaluate every rule and collect all violations.
    pub fn validate(&self, message: &MtMessage) -> Vec<Violation> {
        let fields = &message.fields;
        let mut violations = Vec::new();
        for rule in &self.config.rules {
            if let Some(violation) = check_rule(rule, fields) {
                violations.push(violation);
            }
        }
        violations
    }
}

fn check_rule(rule: &ValidationRule, fields: &FieldMap) -> Option<Violation> {
    match rule {
        ValidationRule::Required { key, message } => {
            if is_empty(fields.get(key)) {
                return Some(violation(
                    message,
                    format!("required field missing: {key}"),
                ));
            }
        }

        ValidationRule::Length {
            key,
            min,
            max,
            message,
        } => {
            if let Some(value) = non_empty(fields.get(key)) {
                let len = value.len();
                if min.is_some_and(|m| len < m) || max.is_some_and(|m| len > m) {
                    let lo = min.map_or("0".to_string(), |m| m.to_string());
                    let hi = max.map_or("*".to_string(), |m| m.to_string());
                    return Some(violation(
                        message,
                        format!("length violation on {key}: expected [{lo},{hi}], found {len}"),
                    ));
                }
            }
        }

        ValidationRule::Regex {
            key,
            pattern,
            message,
        } => {
            if let Some(value) = non_empty(fields.get(key)) {
                if !pattern.is_full_match(value) {
                    return Some(violation(message, format!("format violation on {key}")));
                }
            }
        }

        ValidationRule::AllowedValues {
            key,
            values,
            message,
        } => {
            if let Some(value) = non_empty(fields.get(key)) {
                if !values.iter().any(|v| v == value) {
                    return Some(violation(
                        message,
                        format!("invalid value for {key}: {value}"),
                    ));
                }
            }
        }

        ValidationRule::ForbiddenValues {
            key,
            values,
            message,
        } => {
            if let Some(value) = non_empty(fields.get(key)) {
                if values.iter().any(|v| v == value) {
                    return Some(violation(
                        message,
                        format!("forbidden value for {key}: {value}"),
                    ));
                }
            }
        }

        ValidationRule::ConditionalRequired {
            key,
            when_key,
            when_present,
            message,
        } => {
            let mut triggered = non_empty(fields.get(when_key)).is_some();
            if !when_present {
                triggered = !triggered;
            }
            if triggered && is_empty(fields.get(key)) {
                return Some(violation(
                    message,
                    format!("conditionally required field missing: {key}"),
                ));
            }
        }

        ValidationRule::MutuallyExclusive { keys, message } => {
            if keys.is_empty() {
                return None;
            }
            let count = present_count(keys, fields);
            if count != 1 {
                return Some(violation(
                    message,
                    format!("exactly one of [{}] must be present", keys.join(", ")),
                ));
            }
        }

        ValidationRule::AtMostOneOf { keys, message } => {
            if keys.is_empty() {
                return None;
            }
            let count = present_count(keys, fields);
            if count > 1 {
                return Some(violation(
                    message,
                    format!("at most one of [{}] may be present", keys.join(", ")),
                ));
            }
        }

        ValidationRule::Compare {
            key,
            operator,
            threshold,
            message,
        } => {
            if let Some(value) = non_empty(fields.get(key)) {
                let ok = parse_decimal(value)
                    .zip(parse_decimal(threshold))
                    .map(|(v, t)| operator.eval(v, t))
                    .unwrap_or(false);
                if !ok {
                    return Some(violation(
                        message,
                        format!("comparison failed on {key}: {value} {operator} {threshold}"),
                    ));
                }
            }
        }
    }
    None
}

fn is_empty(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn present_count(keys: &[String], fields: &FieldMap) -> usize {
    keys.iter()
        .filter(|k| non_empty(fields.get(k)).is_some())
        .count()
}

fn parse_decimal(value: &str) -> Option<Decimal> {
    Decimal::from_str(value.replace(',', ".").trim()).ok()
}

fn violation(message: &Option<String>, fallback: String) -> Violation {
    Violation {
        message: message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt_parser::FieldMap;

    fn message_with(entries: &[(&str, &str)]) -> MtMessage {
        let mut fields = FieldMap::new();
        for (k, v) in entries {
            fields.insert(*k, *v);
        }
        MtMessage {
            raw: String::new(),
            block1: None,
            block2: None,
            block3: None,
            block4: None,
            block5: None,
            fields,
        }
    }

    fn validator(rules: &str) -> MtValidator {
        MtValidator::new(
            ValidationConfig::from_json(&format!(r#"{{"rules": {rules}}}"#)).unwrap(),
        )
    }

    #[test]
    fn test_missing_key_yields_only_required_violation() {
        let v = validator(
            r#"[
                {"type": "required", "key": "b4.20"},
                {"type": "length", "key": "b4.20", "min": 1, "max": 16}
            ]"#,
        );
        let violations = v.validate(&message_with(&[]));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "required field missing: b4.20");
    }

    #[test]
    fn test_length_bounds() {
        let v = validator(r#"[{"type": "length", "key": "k", "min": 2, "max": 4}]"#);
        assert!(v.validate(&message_with(&[("k", "ab")])).is_empty());
        assert!(v.validate(&message_with(&[("k", "abcd")])).is_empty());
        assert_eq!(v.validate(&message_with(&[("k", "a")])).len(), 1);
        assert_eq!(v.validate(&message_with(&[("k", "abcde")])).len(), 1);
    }

    #[test]
    fn test_regex_requires_full_match() {
        let v = validator(r#"[{"type": "regex", "key": "ccy", "pattern": "[A-Z]{3}"}]"#);
        assert!(v.validate(&message_with(&[("ccy", "USD")])).is_empty());
        assert_eq!(v.validate(&message_with(&[("ccy", "USDX")])).len(), 1);
        assert_eq!(v.validate(&message_with(&[("ccy", "usd")])).len(), 1);
        // absent value is not a format violation
        assert!(v.validate(&message_with(&[])).is_empty());
    }

    #[test]
    fn test_allowed_and_forbidden_values() {
        let v = validator(
            r#"[
                {"type": "allowedValues", "key": "b4.23B", "values": ["CRED", "SPAY"]},
                {"type": "forbiddenValues", "key": "b4.71A", "values": ["XXX"]}
            ]"#,
        );
        assert!(v
            .validate(&message_with(&[("b4.23B", "CRED"), ("b4.71A", "OUR")]))
            .is_empty());
        let violations = v.validate(&message_with(&[("b4.23B", "CRTS"), ("b4.71A", "XXX")]));
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_conditional_required_polarity() {
        let when_present = validator(
            r#"[{"type": "conditionalRequired", "key": "b4.33B", "whenKey": "b4.36"}]"#,
        );
        assert_eq!(
            when_present.validate(&message_with(&[("b4.36", "1.09")])).len(),
            1
        );
        assert!(when_present.validate(&message_with(&[])).is_empty());

        let when_absent = validator(
            r#"[{"type": "conditionalRequired", "key": "b4.33B",
                 "whenKey": "b4.36", "whenPresent": false}]"#,
        );
        assert_eq!(when_absent.validate(&message_with(&[])).len(), 1);
        assert!(when_absent
            .validate(&message_with(&[("b4.36", "1.09")]))
            .is_empty());
    }

    #[test]
    fn test_exclusivity_rules() {
        let v = validator(
            r#"[
                {"type": "mutuallyExclusive", "keys": ["a", "b"]},
                {"type": "atMostOneOf", "keys": ["c", "d"]}
            ]"#,
        );
        assert!(v.validate(&message_with(&[("a", "1")])).is_empty());
        // both of a/b set, both of c/d set
        let violations = v.validate(&message_with(&[
            ("a", "1"),
            ("b", "2"),
            ("c", "3"),
            ("d", "4"),
        ]));
        assert_eq!(violations.len(), 2);
        // neither a nor b set violates mutuallyExclusive; a single c passes atMostOneOf
        let violations = v.validate(&message_with(&[("c", "3")]));
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn test_compare_with_comma_decimal() {
        let v = validator(
            r#"[{"type": "compare", "key": "amt", "operator": ">", "threshold": "0"}]"#,
        );
        assert!(v.validate(&message_with(&[("amt", "1234,56")])).is_empty());
        assert_eq!(v.validate(&message_with(&[("amt", "0")])).len(), 1);
        // non-numeric value counts as a failed comparison
        assert_eq!(v.validate(&message_with(&[("amt", "N/A")])).len(), 1);
    }

    #[test]
    fn test_configured_message_wins() {
        let v = validator(
            r#"[{"type": "required", "key": "b4.20", "message": "field 20 is mandatory"}]"#,
        );
        let violations = v.validate(&message_with(&[]));
        assert_eq!(violations[0].message, "field 20 is mandatory");
    }

    #[test]
    fn test_unknown_rule_type_rejected_at_load() {
        assert!(ValidationConfig::from_json(
            r#"{"rules": [{"type": "checksum", "key": "b4.20"}]}"#
        )
        .is_err());
        assert!(ValidationConfig::from_json(
            r#"{"rules": [{"type": "compare", "key": "k", "operator": "!=", "threshold": "1"}]}"#
        )
        .is_err());
    }

    #[test]
    fn test_invalid_pattern_rejected_at_load() {
        assert!(ValidationConfig::from_json(
            r#"{"rules": [{"type": "regex", "key": "k", "pattern": "(["}]}"#
        )
        .is_err());
    }
}
