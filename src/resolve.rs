//! Turns a CSV record into host variables and literal group names.

use std::collections::BTreeMap;

use crate::{
    config::InventoryConfig,
    data::{HostVars, VarValue},
    reader::Record,
};

pub const INDIRECT_MARKER: &str = "vars:";

/// A raw cell, either taken literally or referring to a `vars` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue<'a> {
    Literal(&'a str),
    IndirectRef(&'a str),
}

impl<'a> CellValue<'a> {
    pub fn parse(raw: &'a str) -> Self {
        match raw.strip_prefix(INDIRECT_MARKER) {
            Some(key) => CellValue::IndirectRef(key),
            None => CellValue::Literal(raw),
        }
    }

    /// Single level of indirection; an unknown key resolves to [`VarValue::Null`].
    pub fn resolve(&self, table: &BTreeMap<String, VarValue>) -> VarValue {
        match self {
            CellValue::Literal(text) => VarValue::String((*text).to_string()),
            CellValue::IndirectRef(key) => table.get(*key).cloned().unwrap_or(VarValue::Null),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedHost {
    pub vars: HostVars,
    pub groups: Vec<String>,
}

pub struct AttributeResolver<'a> {
    variables: &'a BTreeMap<String, VarValue>,
    renames: &'a BTreeMap<String, String>,
    host_column: &'a str,
    groups_column: &'a str,
}

impl<'a> AttributeResolver<'a> {
    pub fn new(config: &'a InventoryConfig) -> Self {
        AttributeResolver {
            variables: &config.vars,
            renames: &config.column_replace,
            host_column: &config.host_column,
            groups_column: &config.groups_column,
        }
    }

    pub fn resolve(&self, record: &Record) -> ResolvedHost {
        let mut resolved = ResolvedHost::default();
        for (column, raw) in record.iter() {
            if column == self.host_column {
                continue;
            }
            let value = CellValue::parse(raw).resolve(self.variables);
            if column == self.groups_column {
                resolved.groups = split_groups(&value);
                continue;
            }
            let key = self
                .renames
                .get(column)
                .map(String::as_str)
                .unwrap_or(column);
            resolved.vars.insert(key.to_string(), value);
        }
        resolved
    }
}

fn split_groups(value: &VarValue) -> Vec<String> {
    match value {
        VarValue::Null => Vec::new(),
        VarValue::List(items) => items
            .iter()
            .flat_map(split_groups)
            .collect(),
        other => other
            .as_display()
            .split_whitespace()
            .map(str::to_string)
            .collect(),
    }
}

/// Fills absent keys from `defaults`; present keys, even empty ones, win.
pub fn apply_defaults(vars: &mut HostVars, defaults: &BTreeMap<String, VarValue>) {
    for (key, value) in defaults {
        vars.entry(key.clone()).or_insert_with(|| value.clone());
    }
}
