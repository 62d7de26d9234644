use std::{collections::BTreeMap, fmt};

use evalexpr::Value as EvalValue;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Variables attached to a single host, keyed by attribute name.
pub type HostVars = BTreeMap<String, VarValue>;

/// A host variable value.
///
/// CSV cells always produce [`VarValue::String`]; typed variants come from
/// YAML tables and composed expressions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum VarValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<VarValue>),
}

impl VarValue {
    pub fn as_display(&self) -> String {
        match self {
            VarValue::Null => String::new(),
            VarValue::Bool(b) => b.to_string(),
            VarValue::Integer(i) => i.to_string(),
            VarValue::Float(f) => {
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            VarValue::String(s) => s.clone(),
            VarValue::List(values) => values.iter().map(VarValue::as_display).join(","),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            VarValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            VarValue::Null => false,
            VarValue::Bool(b) => *b,
            VarValue::Integer(i) => *i != 0,
            VarValue::Float(f) => *f != 0.0,
            VarValue::String(s) => !s.is_empty(),
            VarValue::List(values) => !values.is_empty(),
        }
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for VarValue {
    fn from(value: &str) -> Self {
        VarValue::String(value.to_string())
    }
}

impl From<String> for VarValue {
    fn from(value: String) -> Self {
        VarValue::String(value)
    }
}

pub fn value_to_evalexpr(value: &VarValue) -> EvalValue {
    match value {
        VarValue::Null => EvalValue::Empty,
        VarValue::Bool(b) => EvalValue::Boolean(*b),
        VarValue::Integer(i) => EvalValue::Int(*i),
        VarValue::Float(f) => EvalValue::Float(*f),
        VarValue::String(s) => EvalValue::String(s.clone()),
        VarValue::List(values) => EvalValue::Tuple(values.iter().map(value_to_evalexpr).collect()),
    }
}

pub fn value_from_evalexpr(value: EvalValue) -> VarValue {
    match value {
        EvalValue::Empty => VarValue::Null,
        EvalValue::Boolean(b) => VarValue::Bool(b),
        EvalValue::Int(i) => VarValue::Integer(i),
        EvalValue::Float(f) => VarValue::Float(f),
        EvalValue::String(s) => VarValue::String(s),
        EvalValue::Tuple(values) => {
            VarValue::List(values.into_iter().map(value_from_evalexpr).collect())
        }
    }
}
