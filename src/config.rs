//! Inventory configuration loading and validation.
//!
//! A configuration file is YAML with the options below. Only `source` is
//! required; everything else falls back to an empty table or a default.
//!
//! ```yaml
//! plugin: csv
//! source: inventory.csv
//! strict: false
//! compose:
//!   ansible_become: ansible_network_os == "eos"
//! groups:
//!   switches: ansible_network_os != ""
//! keyed_groups:
//!   - key: site
//!     prefix: site
//! vars:
//!   ansible_user: admin
//! defaults:
//!   ansible_connection: network_cli
//! column_replace:
//!   os: ansible_network_os
//! ```

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use encoding_rs::{Encoding, UTF_8};
use serde::{Deserialize, Deserializer, de};
use serde_yaml::Value as YamlValue;

use crate::{
    data::VarValue,
    error::{InventoryError, Result},
};

pub const PLUGIN_NAME: &str = "csv";
pub const DEFAULT_HOST_COLUMN: &str = "HostName";
pub const DEFAULT_GROUPS_COLUMN: &str = "AdditionalGroups";
pub const DEFAULT_KEYED_SEPARATOR: &str = "_";

const CONFIG_SUFFIXES: [&str; 2] = ["csv.yaml", "csv.yml"];

/// Returns true when `path` names a file this plugin should consume.
pub fn is_inventory_config(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| CONFIG_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)))
}

/// An ordered `name -> expression` rule, as found under `compose` and `groups`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionRule {
    pub name: String,
    pub expression: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct KeyedGroup {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub separator: Option<String>,
    #[serde(default)]
    pub parent_group: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
}

impl KeyedGroup {
    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("")
    }

    pub fn separator(&self) -> &str {
        self.separator.as_deref().unwrap_or(DEFAULT_KEYED_SEPARATOR)
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    plugin: Option<String>,
    #[serde(default)]
    source: Option<PathBuf>,
    #[serde(default)]
    vars: BTreeMap<String, VarValue>,
    #[serde(default)]
    defaults: BTreeMap<String, VarValue>,
    #[serde(default)]
    column_replace: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "ordered_rules")]
    compose: Vec<ExpressionRule>,
    #[serde(default, deserialize_with = "ordered_rules")]
    groups: Vec<ExpressionRule>,
    #[serde(default)]
    keyed_groups: Vec<KeyedGroup>,
    #[serde(default)]
    strict: bool,
    #[serde(default = "default_true")]
    leading_separator: bool,
    #[serde(default)]
    host_column: Option<String>,
    #[serde(default)]
    groups_column: Option<String>,
    #[serde(default)]
    delimiter: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

fn default_true() -> bool {
    true
}

fn ordered_rules<'de, D>(deserializer: D) -> std::result::Result<Vec<ExpressionRule>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<YamlValue>::deserialize(deserializer)?;
    let mapping = match value {
        None | Some(YamlValue::Null) => return Ok(Vec::new()),
        Some(YamlValue::Mapping(mapping)) => mapping,
        Some(_) => return Err(de::Error::custom("expected a mapping of name: expression")),
    };
    let mut rules = Vec::with_capacity(mapping.len());
    for (name, expression) in mapping {
        let Some(name) = scalar_text(&name) else {
            return Err(de::Error::custom("rule names must be scalars"));
        };
        let Some(expression) = scalar_text(&expression) else {
            return Err(de::Error::custom(format!(
                "expression for '{name}' must be a scalar"
            )));
        };
        rules.push(ExpressionRule { name, expression });
    }
    Ok(rules)
}

fn scalar_text(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Bool(b) => Some(b.to_string()),
        YamlValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Validated configuration consumed by the pipeline.
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub source: PathBuf,
    pub vars: BTreeMap<String, VarValue>,
    pub defaults: BTreeMap<String, VarValue>,
    pub column_replace: BTreeMap<String, String>,
    pub compose: Vec<ExpressionRule>,
    pub groups: Vec<ExpressionRule>,
    pub keyed_groups: Vec<KeyedGroup>,
    pub strict: bool,
    pub leading_separator: bool,
    pub host_column: String,
    pub groups_column: String,
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

impl InventoryConfig {
    /// Minimal configuration reading `source` with every option at its default.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        InventoryConfig {
            source: source.into(),
            vars: BTreeMap::new(),
            defaults: BTreeMap::new(),
            column_replace: BTreeMap::new(),
            compose: Vec::new(),
            groups: Vec::new(),
            keyed_groups: Vec::new(),
            strict: false,
            leading_separator: true,
            host_column: DEFAULT_HOST_COLUMN.to_string(),
            groups_column: DEFAULT_GROUPS_COLUMN.to_string(),
            delimiter: b',',
            encoding: UTF_8,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| InventoryError::Io {
            action: "reading configuration",
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw).map_err(|err| match err {
            InventoryError::Yaml { source, .. } => InventoryError::Yaml {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(input).map_err(|source| InventoryError::Yaml {
            path: PathBuf::new(),
            source,
        })?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self> {
        if let Some(plugin) = raw.plugin.as_deref()
            && plugin != PLUGIN_NAME
        {
            return Err(InventoryError::Config(format!(
                "plugin must be '{PLUGIN_NAME}', found '{plugin}'"
            )));
        }
        let source = raw
            .source
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or_else(|| InventoryError::Config("the 'source' option is required".into()))?;
        if let Some(position) = raw.keyed_groups.iter().position(|k| k.key.trim().is_empty()) {
            return Err(InventoryError::Config(format!(
                "keyed_groups entry {} must have a key",
                position + 1
            )));
        }
        let delimiter = match raw.delimiter.as_deref() {
            Some(value) => parse_delimiter(value).map_err(InventoryError::Config)?,
            None => b',',
        };
        let encoding = match raw.encoding.as_deref() {
            Some(label) => Encoding::for_label(label.trim().as_bytes())
                .ok_or_else(|| InventoryError::Config(format!("unknown encoding '{label}'")))?,
            None => UTF_8,
        };
        let host_column = non_empty_or(raw.host_column, DEFAULT_HOST_COLUMN);
        let groups_column = non_empty_or(raw.groups_column, DEFAULT_GROUPS_COLUMN);
        if host_column == groups_column {
            return Err(InventoryError::Config(format!(
                "host_column and groups_column must differ (both are '{host_column}')"
            )));
        }

        Ok(InventoryConfig {
            source,
            vars: raw.vars,
            defaults: raw.defaults,
            column_replace: raw.column_replace,
            compose: raw.compose,
            groups: raw.groups,
            keyed_groups: raw.keyed_groups,
            strict: raw.strict,
            leading_separator: raw.leading_separator,
            host_column,
            groups_column,
            delimiter,
            encoding,
        })
    }
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

pub fn parse_delimiter(value: &str) -> std::result::Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
