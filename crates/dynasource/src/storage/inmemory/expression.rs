//! A small subset of DynamoDB expressions.
//!
//! Conditions are comparisons (`=`, `<>`, `<`, `<=`, `>`, `>=`),
//! `begins_with`, `attribute_exists` and `attribute_not_exists`, joined by
//! `AND`. Updates support `SET a = :v, b = :w`. Paths may be `#aliases`.

use std::cmp::Ordering;
use std::collections::HashMap;

use dynasource_core::source::{AttributeValue, Item, Result, SourceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparator {
    // Two-character operators must be tried first.
    const TOKENS: [(&'static str, Comparator); 6] = [
        ("<>", Comparator::Ne),
        ("<=", Comparator::Le),
        (">=", Comparator::Ge),
        ("=", Comparator::Eq),
        ("<", Comparator::Lt),
        (">", Comparator::Gt),
    ];

    fn test(self, left: &AttributeValue, right: &AttributeValue) -> bool {
        let ordering = compare(left, right);
        match self {
            Comparator::Eq => ordering == Some(Ordering::Equal),
            Comparator::Ne => ordering != Some(Ordering::Equal),
            Comparator::Lt => ordering == Some(Ordering::Less),
            Comparator::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            Comparator::Gt => ordering == Some(Ordering::Greater),
            Comparator::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Compare {
        path: String,
        comparator: Comparator,
        placeholder: String,
    },
    BeginsWith {
        path: String,
        placeholder: String,
    },
    Exists(String),
    NotExists(String),
}

/// A parsed key condition or filter expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionExpression {
    conditions: Vec<Condition>,
}

impl ConditionExpression {
    pub fn parse(expression: &str, names: Option<&HashMap<String, String>>) -> Result<Self> {
        let conditions = split_and(expression)
            .into_iter()
            .map(|clause| parse_condition(clause, names))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { conditions })
    }

    /// Whether `item` satisfies every condition.
    pub fn matches(&self, item: &Item, values: Option<&Item>) -> Result<bool> {
        for condition in &self.conditions {
            let matched = match condition {
                Condition::Compare {
                    path,
                    comparator,
                    placeholder,
                } => {
                    let expected = value(values, placeholder)?;
                    item.get(path)
                        .is_some_and(|actual| comparator.test(actual, expected))
                }
                Condition::BeginsWith { path, placeholder } => {
                    let prefix = value(values, placeholder)?;
                    match (item.get(path), prefix) {
                        (Some(AttributeValue::S(actual)), AttributeValue::S(prefix)) => {
                            actual.starts_with(prefix.as_str())
                        }
                        _ => false,
                    }
                }
                Condition::Exists(path) => item.contains_key(path),
                Condition::NotExists(path) => !item.contains_key(path),
            };

            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// A parsed `SET` update expression.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpression {
    assignments: Vec<(String, String)>,
}

impl UpdateExpression {
    pub fn parse(expression: &str, names: Option<&HashMap<String, String>>) -> Result<Self> {
        let trimmed = expression.trim();
        let body = match trimmed.get(..4) {
            Some(keyword) if keyword.eq_ignore_ascii_case("SET ") => &trimmed[4..],
            _ => return Err(invalid(expression, "only SET updates are supported")),
        };

        let assignments = body
            .split(',')
            .map(|assignment| {
                let (path, placeholder) = assignment
                    .split_once('=')
                    .ok_or_else(|| invalid(expression, "expected 'path = :value'"))?;
                Ok((
                    resolve_path(path.trim(), names)?,
                    placeholder_name(placeholder.trim(), expression)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { assignments })
    }

    /// Attribute names the expression assigns.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.assignments.iter().map(|(path, _)| path.as_str())
    }

    /// Applies the assignments and returns the updated attributes.
    ///
    /// Every placeholder is resolved before `item` is touched, so a failed
    /// update leaves it unchanged.
    pub fn apply(&self, item: &mut Item, values: &Item) -> Result<Item> {
        let updated = self
            .assignments
            .iter()
            .map(|(path, placeholder)| {
                Ok((path.clone(), value(Some(values), placeholder)?.clone()))
            })
            .collect::<Result<Item>>()?;

        item.extend(updated.clone());
        Ok(updated)
    }
}

/// Orders two values of the same scalar type. Numbers compare numerically.
fn compare(left: &AttributeValue, right: &AttributeValue) -> Option<Ordering> {
    match (left, right) {
        (AttributeValue::S(a), AttributeValue::S(b)) => Some(a.cmp(b)),
        (AttributeValue::N(a), AttributeValue::N(b)) => {
            a.parse::<f64>().ok()?.partial_cmp(&b.parse::<f64>().ok()?)
        }
        (a, b) if a == b => Some(Ordering::Equal),
        _ => None,
    }
}

fn split_and(expression: &str) -> Vec<&str> {
    let lower = expression.to_ascii_lowercase();
    let mut clauses = Vec::new();
    let mut start = 0;

    while let Some(offset) = lower[start..].find(" and ") {
        clauses.push(expression[start..start + offset].trim());
        start += offset + " and ".len();
    }
    clauses.push(expression[start..].trim());

    clauses
}

fn parse_condition(clause: &str, names: Option<&HashMap<String, String>>) -> Result<Condition> {
    if let Some(args) = function_args(clause, "begins_with") {
        let (path, placeholder) = args
            .split_once(',')
            .ok_or_else(|| invalid(clause, "begins_with takes two arguments"))?;
        return Ok(Condition::BeginsWith {
            path: resolve_path(path.trim(), names)?,
            placeholder: placeholder_name(placeholder.trim(), clause)?,
        });
    }
    if let Some(path) = function_args(clause, "attribute_exists") {
        return Ok(Condition::Exists(resolve_path(path.trim(), names)?));
    }
    if let Some(path) = function_args(clause, "attribute_not_exists") {
        return Ok(Condition::NotExists(resolve_path(path.trim(), names)?));
    }

    for (token, comparator) in Comparator::TOKENS {
        if let Some((path, placeholder)) = clause.split_once(token) {
            return Ok(Condition::Compare {
                path: resolve_path(path.trim(), names)?,
                comparator,
                placeholder: placeholder_name(placeholder.trim(), clause)?,
            });
        }
    }

    Err(invalid(clause, "unsupported condition"))
}

fn function_args<'a>(clause: &'a str, function: &str) -> Option<&'a str> {
    let rest = clause.strip_prefix(function)?.trim_start();
    rest.strip_prefix('(')?.strip_suffix(')')
}

fn resolve_path(path: &str, names: Option<&HashMap<String, String>>) -> Result<String> {
    if path.is_empty() {
        return Err(SourceError::transport("Invalid expression: empty attribute name"));
    }
    if !path.starts_with('#') {
        return Ok(path.to_string());
    }

    names
        .and_then(|names| names.get(path))
        .cloned()
        .ok_or_else(|| {
            SourceError::transport(format!(
                "Invalid expression: undefined attribute name alias {path}"
            ))
        })
}

fn placeholder_name(placeholder: &str, expression: &str) -> Result<String> {
    if placeholder.len() > 1 && placeholder.starts_with(':') {
        Ok(placeholder.to_string())
    } else {
        Err(invalid(expression, "values must be ':placeholders'"))
    }
}

fn value<'a>(values: Option<&'a Item>, placeholder: &str) -> Result<&'a AttributeValue> {
    values
        .and_then(|values| values.get(placeholder))
        .ok_or_else(|| {
            SourceError::transport(format!(
                "Invalid expression: undefined attribute value {placeholder}"
            ))
        })
}

fn invalid(expression: &str, reason: &str) -> SourceError {
    SourceError::transport(format!("Invalid expression '{expression}': {reason}"))
}
