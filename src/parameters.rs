use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tally::{DEFAULT_QUORUM_PERCENT, MAX_QUORUM_PERCENT, MIN_QUORUM_PERCENT};

pub const BUDGET_MAX: &str = "budget_max";
pub const VOTE_QUORUM: &str = "vote_quorum";
pub const AUTO_NOTIFICATIONS: &str = "auto_notifications";
pub const VALIDATION_DELAY: &str = "validation_delay";

pub const MAX_TEXT_PARAMETER_LEN: usize = 512;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParameterValue {
    Text(String),
    Flag(bool),
    Number(i64),
}

impl ParameterValue {
    fn type_name(&self) -> &'static str {
        match self {
            ParameterValue::Text(_) => "text",
            ParameterValue::Flag(_) => "flag",
            ParameterValue::Number(_) => "number",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParameterRule {
    Text { max_len: usize },
    Flag,
    Number { min: i64, max: i64 },
}

impl ParameterRule {
    fn type_name(self) -> &'static str {
        match self {
            ParameterRule::Text { .. } => "text",
            ParameterRule::Flag => "flag",
            ParameterRule::Number { .. } => "number",
        }
    }

    /// Reads a raw JSON value into the variant this rule accepts.
    pub fn parse(self, id: &str, raw: &Value) -> Result<ParameterValue, ParameterError> {
        let parsed = match (self, raw) {
            (ParameterRule::Text { .. }, Value::String(text)) => {
                ParameterValue::Text(text.trim().to_string())
            }
            (ParameterRule::Flag, Value::Bool(flag)) => ParameterValue::Flag(*flag),
            (ParameterRule::Number { .. }, Value::Number(number)) => {
                let value = number.as_i64().ok_or_else(|| ParameterError::NotAnInteger {
                    id: id.to_string(),
                })?;
                ParameterValue::Number(value)
            }
            _ => {
                return Err(ParameterError::TypeMismatch {
                    id: id.to_string(),
                    expected: self.type_name(),
                    found: json_type_name(raw),
                });
            }
        };
        self.check(id, &parsed)?;
        Ok(parsed)
    }

    pub fn check(self, id: &str, value: &ParameterValue) -> Result<(), ParameterError> {
        match (self, value) {
            (ParameterRule::Text { max_len }, ParameterValue::Text(text)) => {
                if text.chars().count() > max_len {
                    return Err(ParameterError::TooLong {
                        id: id.to_string(),
                        max_len,
                    });
                }
                Ok(())
            }
            (ParameterRule::Flag, ParameterValue::Flag(_)) => Ok(()),
            (ParameterRule::Number { min, max }, ParameterValue::Number(number)) => {
                if !(min..=max).contains(number) {
                    return Err(ParameterError::OutOfRange {
                        id: id.to_string(),
                        min,
                        max,
                        value: *number,
                    });
                }
                Ok(())
            }
            (rule, other) => Err(ParameterError::TypeMismatch {
                id: id.to_string(),
                expected: rule.type_name(),
                found: other.type_name(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParameterError {
    #[error("unknown parameter {id}")]
    Unknown { id: String },
    #[error("{id} expects a {expected} value, got {found}")]
    TypeMismatch {
        id: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{id} must be an integer")]
    NotAnInteger { id: String },
    #[error("{id} must be between {min} and {max}, got {value}")]
    OutOfRange {
        id: String,
        min: i64,
        max: i64,
        value: i64,
    },
    #[error("{id} exceeds {max_len} characters")]
    TooLong { id: String, max_len: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub rule: ParameterRule,
    pub value: ParameterValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    parameters: Vec<Parameter>,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::with_quorum(DEFAULT_QUORUM_PERCENT)
    }
}

impl ParameterSet {
    pub fn with_quorum(quorum_percent: u32) -> Self {
        assert!(
            (MIN_QUORUM_PERCENT..=MAX_QUORUM_PERCENT).contains(&quorum_percent),
            "Seed quorum outside parameter bounds"
        );
        let parameters = vec![
            Parameter {
                id: BUDGET_MAX,
                name: "Budget maximum",
                description: "Maximum amount allowed for the annual budget",
                rule: ParameterRule::Number {
                    min: 1,
                    max: 10_000_000,
                },
                value: ParameterValue::Number(2_000_000),
            },
            Parameter {
                id: VOTE_QUORUM,
                name: "Vote quorum",
                description: "Minimum participation percentage required to resolve a vote",
                rule: ParameterRule::Number {
                    min: i64::from(MIN_QUORUM_PERCENT),
                    max: i64::from(MAX_QUORUM_PERCENT),
                },
                value: ParameterValue::Number(i64::from(quorum_percent)),
            },
            Parameter {
                id: AUTO_NOTIFICATIONS,
                name: "Automatic notifications",
                description: "Send reminders for unanswered notifications automatically",
                rule: ParameterRule::Flag,
                value: ParameterValue::Flag(true),
            },
            Parameter {
                id: VALIDATION_DELAY,
                name: "Validation delay",
                description: "Hours allowed to validate a transaction",
                rule: ParameterRule::Number { min: 1, max: 168 },
                value: ParameterValue::Number(48),
            },
        ];
        Self { parameters }
    }

    pub fn all(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn get(&self, id: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|parameter| parameter.id == id)
    }

    pub fn number(&self, id: &str) -> Option<i64> {
        match self.get(id)?.value {
            ParameterValue::Number(value) => Some(value),
            _ => None,
        }
    }

    pub fn flag(&self, id: &str) -> Option<bool> {
        match self.get(id)?.value {
            ParameterValue::Flag(value) => Some(value),
            _ => None,
        }
    }

    pub fn quorum_percent(&self) -> u32 {
        self.number(VOTE_QUORUM)
            .and_then(|value| u32::try_from(value).ok())
            .unwrap_or(DEFAULT_QUORUM_PERCENT)
    }

    /// Validates every change first and applies them only if all pass.
    ///
    /// Returns the ids that changed value.
    pub fn apply(&mut self, changes: &[(String, Value)]) -> Result<Vec<String>, Vec<ParameterError>> {
        let mut staged = Vec::with_capacity(changes.len());
        let mut errors = Vec::new();

        for (id, raw) in changes {
            let Some(index) = self.parameters.iter().position(|p| p.id == id.as_str()) else {
                errors.push(ParameterError::Unknown { id: id.clone() });
                continue;
            };
            let parameter = &self.parameters[index];
            match parameter.rule.parse(parameter.id, raw) {
                Ok(value) => staged.push((index, value)),
                Err(err) => errors.push(err),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let mut changed = Vec::new();
        for (index, value) in staged {
            let parameter = &mut self.parameters[index];
            if parameter.value != value {
                parameter.value = value;
                changed.push(parameter.id.to_string());
            }
        }
        Ok(changed)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "flag",
        Value::Number(_) => "number",
        Value::String(_) => "text",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn change(id: &str, value: Value) -> (String, Value) {
        (id.to_string(), value)
    }

    #[test]
    fn defaults_are_valid() {
        let set = ParameterSet::default();
        for parameter in set.all() {
            parameter
                .rule
                .check(parameter.id, &parameter.value)
                .expect("seed value passes its own rule");
        }
        assert_eq!(set.quorum_percent(), 60);
        assert_eq!(set.flag(AUTO_NOTIFICATIONS), Some(true));
    }

    #[test]
    fn bounds_are_enforced() {
        let mut set = ParameterSet::default();
        let errors = set
            .apply(&[change(VOTE_QUORUM, json!(49))])
            .expect_err("quorum below 50 rejected");
        assert_eq!(
            errors,
            vec![ParameterError::OutOfRange {
                id: VOTE_QUORUM.to_string(),
                min: 50,
                max: 100,
                value: 49,
            }]
        );
        assert!(set.apply(&[change(VALIDATION_DELAY, json!(169))]).is_err());
        assert!(set.apply(&[change(BUDGET_MAX, json!(0))]).is_err());
        assert!(set.apply(&[change(BUDGET_MAX, json!(10_000_000))]).is_ok());
    }

    #[test]
    fn wrong_type_is_rejected() {
        let mut set = ParameterSet::default();
        let errors = set
            .apply(&[change(AUTO_NOTIFICATIONS, json!("yes"))])
            .expect_err("text is not a flag");
        assert!(matches!(
            errors.as_slice(),
            [ParameterError::TypeMismatch { expected: "flag", found: "text", .. }]
        ));
        assert!(matches!(
            set.apply(&[change(VOTE_QUORUM, json!(62.5))]).unwrap_err().as_slice(),
            [ParameterError::NotAnInteger { .. }]
        ));
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let mut set = ParameterSet::default();
        let result = set.apply(&[
            change(VOTE_QUORUM, json!(75)),
            change(VALIDATION_DELAY, json!(0)),
            change("colour", json!("blue")),
        ]);
        let errors = result.expect_err("invalid batch");
        assert_eq!(errors.len(), 2);
        assert_eq!(set.quorum_percent(), 60, "valid change must not leak");

        let changed = set
            .apply(&[change(VOTE_QUORUM, json!(75)), change(AUTO_NOTIFICATIONS, json!(true))])
            .expect("valid batch");
        assert_eq!(changed, vec![VOTE_QUORUM.to_string()]);
        assert_eq!(set.quorum_percent(), 75);
    }

    #[test]
    fn values_serialize_tagged() {
        let encoded = serde_json::to_value(ParameterValue::Number(60)).unwrap();
        assert_eq!(encoded, json!({"type": "number", "value": 60}));
    }
}
