//! Constructed variables and groups.
//!
//! For each host, in order: composed variables, composed groups, keyed
//! groups, then the literal groups read from the groups column. Composed
//! variables are written back into the host's variables so later rules can
//! see them.

use log::debug;

use crate::{
    config::{ExpressionRule, InventoryConfig, KeyedGroup},
    data::{HostVars, VarValue},
    error::{InventoryError, Result},
    expr::Evaluator,
    inventory::InventorySink,
};

pub struct Constructor<'a> {
    evaluator: &'a dyn Evaluator,
    strict: bool,
    leading_separator: bool,
}

impl<'a> Constructor<'a> {
    pub fn from_config(evaluator: &'a dyn Evaluator, config: &InventoryConfig) -> Self {
        Constructor {
            evaluator,
            strict: config.strict,
            leading_separator: config.leading_separator,
        }
    }

    /// Raises in strict mode, otherwise logs and lets the caller skip the entry.
    fn skip_or_fail(&self, host: &str, reason: String) -> Result<()> {
        if self.strict {
            return Err(InventoryError::Resolution {
                host: host.to_string(),
                reason,
            });
        }
        debug!("Skipping for host '{host}': {reason}");
        Ok(())
    }

    pub fn set_composite_vars(
        &self,
        compose: &[ExpressionRule],
        vars: &mut HostVars,
        host: &str,
        sink: &mut dyn InventorySink,
    ) -> Result<()> {
        for rule in compose {
            match self.evaluator.evaluate(&rule.expression, vars) {
                Ok(value) => {
                    sink.set_variable(host, &rule.name, value.clone());
                    vars.insert(rule.name.clone(), value);
                }
                Err(err) => self.skip_or_fail(
                    host,
                    format!("could not set variable '{}': {err}", rule.name),
                )?,
            }
        }
        Ok(())
    }

    pub fn add_host_to_composed_groups(
        &self,
        groups: &[ExpressionRule],
        vars: &HostVars,
        host: &str,
        sink: &mut dyn InventorySink,
    ) -> Result<()> {
        for rule in groups {
            match self.evaluator.evaluate(&rule.expression, vars) {
                Ok(value) if value.is_truthy() => {
                    sink.add_group(&rule.name);
                    sink.add_host_to_group(&rule.name, host);
                }
                Ok(_) => {}
                Err(err) => self.skip_or_fail(
                    host,
                    format!("could not evaluate group '{}': {err}", rule.name),
                )?,
            }
        }
        Ok(())
    }

    pub fn add_host_to_keyed_groups(
        &self,
        keyed_groups: &[KeyedGroup],
        vars: &HostVars,
        host: &str,
        sink: &mut dyn InventorySink,
    ) -> Result<()> {
        for keyed in keyed_groups {
            let value = match self.evaluator.evaluate(&keyed.key, vars) {
                Ok(value) => value,
                Err(err) => {
                    self.skip_or_fail(
                        host,
                        format!("could not generate keyed group from '{}': {err}", keyed.key),
                    )?;
                    continue;
                }
            };
            let bare_names = bare_group_names(&value, keyed.default_value.as_deref());
            if bare_names.is_empty() {
                self.skip_or_fail(
                    host,
                    format!("keyed group key '{}' resulted in an empty value", keyed.key),
                )?;
                continue;
            }
            for bare in bare_names {
                let name = self.keyed_group_name(keyed, &bare);
                sink.add_group(&name);
                sink.add_host_to_group(&name, host);
                if let Some(parent) = keyed.parent_group.as_deref().filter(|p| !p.is_empty()) {
                    sink.add_group(parent);
                    sink.add_child_group(parent, &name)?;
                }
            }
        }
        Ok(())
    }

    pub fn keyed_group_name(&self, keyed: &KeyedGroup, bare: &str) -> String {
        let prefix = keyed.prefix();
        let separator = if prefix.is_empty() && !self.leading_separator {
            ""
        } else {
            keyed.separator()
        };
        format!("{prefix}{separator}{bare}")
    }

    pub fn add_host_to_literal_groups(
        &self,
        groups: &[String],
        host: &str,
        sink: &mut dyn InventorySink,
    ) {
        for group in groups {
            sink.add_group(group);
            sink.add_host_to_group(group, host);
        }
    }
}

fn bare_group_names(value: &VarValue, default_value: Option<&str>) -> Vec<String> {
    match value {
        VarValue::Null => Vec::new(),
        VarValue::List(items) => items
            .iter()
            .flat_map(|item| bare_group_names(item, default_value))
            .collect(),
        VarValue::String(s) if s.is_empty() => default_value.map(str::to_string).into_iter().collect(),
        other => vec![other.as_display()],
    }
}
