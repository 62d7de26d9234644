//! Inventory store: the sink the pipeline writes into, and an in-memory
//! implementation that can render itself.
//!
//! Re-declaring a host, a group or a membership is a no-op, so the same
//! source row can be replayed without accumulating state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use serde_json::{Map, Value as JsonValue, json};

use crate::{
    data::{HostVars, VarValue},
    error::{InventoryError, Result},
};

pub const ALL_GROUP: &str = "all";
pub const UNGROUPED_GROUP: &str = "ungrouped";

pub trait InventorySink {
    fn add_host(&mut self, host: &str);
    fn add_group(&mut self, group: &str);
    fn add_host_to_group(&mut self, group: &str, host: &str);
    /// Nests `child` under `parent`. Fails if `parent` is already reachable
    /// from `child`.
    fn add_child_group(&mut self, parent: &str, child: &str) -> Result<()>;
    fn set_variable(&mut self, host: &str, key: &str, value: VarValue);
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub hosts: BTreeSet<String>,
    pub children: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    hosts: BTreeMap<String, HostVars>,
    groups: BTreeMap<String, Group>,
}

impl InventorySink for Inventory {
    fn add_host(&mut self, host: &str) {
        self.hosts.entry(host.to_string()).or_default();
    }

    fn add_group(&mut self, group: &str) {
        self.groups.entry(group.to_string()).or_default();
    }

    fn add_host_to_group(&mut self, group: &str, host: &str) {
        self.add_host(host);
        self.groups
            .entry(group.to_string())
            .or_default()
            .hosts
            .insert(host.to_string());
    }

    fn add_child_group(&mut self, parent: &str, child: &str) -> Result<()> {
        if parent == child || self.is_descendant(child, parent) {
            return Err(InventoryError::GroupCycle {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }
        self.add_group(child);
        self.groups
            .entry(parent.to_string())
            .or_default()
            .children
            .insert(child.to_string());
        Ok(())
    }

    fn set_variable(&mut self, host: &str, key: &str, value: VarValue) {
        self.hosts
            .entry(host.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.keys().map(String::as_str)
    }

    pub fn host_vars(&self, host: &str) -> Option<&HostVars> {
        self.hosts.get(host)
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// True when `target` can be reached from `group` through child links.
    fn is_descendant(&self, group: &str, target: &str) -> bool {
        let mut pending = vec![group];
        let mut seen = BTreeSet::new();
        while let Some(name) = pending.pop() {
            if name == target {
                return true;
            }
            if !seen.insert(name) {
                continue;
            }
            if let Some(entry) = self.groups.get(name) {
                pending.extend(entry.children.iter().map(String::as_str));
            }
        }
        false
    }

    /// Groups `host` is a direct member of, in name order.
    pub fn groups_of(&self, host: &str) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|(_, group)| group.hosts.contains(host))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Groups as rendered: hosts outside every group are folded into
    /// `ungrouped`, alongside any members it was given explicitly.
    fn rendered_groups(&self) -> BTreeMap<String, Group> {
        let mut groups = self.groups.clone();
        let ungrouped = self
            .hosts
            .keys()
            .filter(|host| !self.groups.values().any(|g| g.hosts.contains(host.as_str())))
            .cloned()
            .collect::<BTreeSet<_>>();
        if !ungrouped.is_empty() {
            groups
                .entry(UNGROUPED_GROUP.to_string())
                .or_default()
                .hosts
                .extend(ungrouped);
        }
        groups
    }

    /// Groups not listed as the child of another group; these hang off `all`.
    fn top_level_groups(groups: &BTreeMap<String, Group>) -> Vec<&str> {
        let nested = groups
            .values()
            .flat_map(|g| g.children.iter())
            .collect::<BTreeSet<_>>();
        groups
            .keys()
            .filter(|name| !nested.contains(name) && name.as_str() != ALL_GROUP)
            .map(String::as_str)
            .collect()
    }

    /// Renders the inventory in the `ansible-inventory --list` layout.
    pub fn to_list_value(&self) -> JsonValue {
        let mut root = Map::new();
        let hostvars = self
            .hosts
            .iter()
            .map(|(host, vars)| (host.clone(), json!(vars)))
            .collect::<Map<_, _>>();
        root.insert("_meta".into(), json!({ "hostvars": hostvars }));

        let groups = self.rendered_groups();
        let mut all = Map::new();
        all.insert("children".into(), json!(Self::top_level_groups(&groups)));
        if let Some(explicit) = groups.get(ALL_GROUP)
            && !explicit.hosts.is_empty()
        {
            all.insert("hosts".into(), json!(explicit.hosts));
        }
        root.insert(ALL_GROUP.into(), JsonValue::Object(all));

        for (name, group) in groups.iter().filter(|(name, _)| *name != ALL_GROUP) {
            let mut entry = Map::new();
            if !group.hosts.is_empty() {
                entry.insert("hosts".into(), json!(group.hosts));
            }
            if !group.children.is_empty() {
                entry.insert("children".into(), json!(group.children));
            }
            root.insert(name.clone(), JsonValue::Object(entry));
        }
        JsonValue::Object(root)
    }

    /// Renders the group tree rooted at `root` in the `ansible-inventory --graph` layout.
    pub fn render_graph(&self, root: &str) -> Option<String> {
        let groups = self.rendered_groups();
        let mut output = String::new();
        if root == ALL_GROUP {
            let _ = writeln!(output, "@{ALL_GROUP}:");
            for child in Self::top_level_groups(&groups) {
                Self::write_group(&groups, &mut output, child, 1);
            }
            if let Some(explicit) = groups.get(ALL_GROUP) {
                for host in &explicit.hosts {
                    let _ = writeln!(output, "  |--{host}");
                }
            }
            return Some(output);
        }
        groups.get(root)?;
        Self::write_group(&groups, &mut output, root, 0);
        Some(output)
    }

    fn write_group(
        groups: &BTreeMap<String, Group>,
        output: &mut String,
        name: &str,
        depth: usize,
    ) {
        let indent = "  |".repeat(depth);
        let marker = if depth == 0 { "" } else { "--" };
        let _ = writeln!(output, "{indent}{marker}@{name}:");
        let Some(group) = groups.get(name) else {
            return;
        };
        for child in &group.children {
            Self::write_group(groups, output, child, depth + 1);
        }
        let host_indent = "  |".repeat(depth + 1);
        for host in &group.hosts {
            let _ = writeln!(output, "{host_indent}--{host}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Inventory {
        let mut inventory = Inventory::new();
        inventory.add_host("r1");
        inventory.add_host("r2");
        inventory.add_host("lonely");
        inventory.add_group("red");
        inventory.add_host_to_group("red", "r1");
        inventory.add_host_to_group("red", "r2");
        inventory.add_host_to_group("eos", "r2");
        inventory.add_child_group("os", "eos").expect("nest eos");
        inventory.set_variable("r1", "site", VarValue::from("lab"));
        inventory
    }

    #[test]
    fn redeclaration_is_idempotent() {
        let mut inventory = sample();
        let before = inventory.clone();
        inventory.add_host("r1");
        inventory.add_group("red");
        inventory.add_host_to_group("red", "r1");
        inventory.add_child_group("os", "eos").expect("nest eos again");
        assert_eq!(inventory, before);
        assert_eq!(inventory.host_count(), 3);
    }

    #[test]
    fn list_layout_includes_meta_and_ungrouped() {
        let list = sample().to_list_value();
        assert_eq!(list["_meta"]["hostvars"]["r1"]["site"], "lab");
        assert_eq!(list["_meta"]["hostvars"]["lonely"], json!({}));
        assert_eq!(list["all"]["children"], json!(["os", "red", "ungrouped"]));
        assert_eq!(list["red"]["hosts"], json!(["r1", "r2"]));
        assert_eq!(list["os"]["children"], json!(["eos"]));
        assert_eq!(list["ungrouped"]["hosts"], json!(["lonely"]));
    }

    #[test]
    fn graph_nests_children() {
        let graph = sample().render_graph(ALL_GROUP).expect("graph");
        let lines = graph.lines().collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec![
                "@all:",
                "  |--@os:",
                "  |  |--@eos:",
                "  |  |  |--r2",
                "  |--@red:",
                "  |  |--r1",
                "  |  |--r2",
                "  |--@ungrouped:",
                "  |  |--lonely",
            ]
        );
        assert_eq!(
            sample().render_graph("red").expect("graph"),
            "@red:\n  |--r1\n  |--r2\n"
        );
        assert!(sample().render_graph("missing").is_none());
    }

    #[test]
    fn groups_of_lists_direct_membership() {
        let inventory = sample();
        assert_eq!(inventory.groups_of("r2"), vec!["eos", "red"]);
        assert!(inventory.groups_of("lonely").is_empty());
    }

    #[test]
    fn child_links_that_close_a_cycle_are_rejected() {
        let mut inventory = Inventory::new();
        inventory.add_host_to_group("core", "r1");
        inventory.add_host_to_group("edge", "r1");
        inventory.add_child_group("edge", "core").expect("core under edge");
        inventory.add_child_group("site", "edge").expect("edge under site");

        let err = inventory.add_child_group("core", "site").unwrap_err();
        assert!(matches!(
            err,
            InventoryError::GroupCycle { ref parent, ref child } if parent == "core" && child == "site"
        ));
        assert!(inventory.add_child_group("core", "core").is_err());
        assert!(inventory.group("core").expect("core").children.is_empty());

        assert_eq!(
            inventory.render_graph("site").expect("graph"),
            "@site:\n  |--@edge:\n  |  |--@core:\n  |  |  |--r1\n  |  |--r1\n"
        );
        assert_eq!(inventory.to_list_value()["all"]["children"], json!(["site"]));
    }

    #[test]
    fn explicit_ungrouped_group_absorbs_hosts_without_groups() {
        let mut inventory = Inventory::new();
        inventory.add_host_to_group("ungrouped", "r1");
        inventory.add_host("r2");

        let list = inventory.to_list_value();
        assert_eq!(list["all"]["children"], json!(["ungrouped"]));
        assert_eq!(list["ungrouped"]["hosts"], json!(["r1", "r2"]));
        assert_eq!(
            inventory.render_graph(ALL_GROUP).expect("graph"),
            "@all:\n  |--@ungrouped:\n  |  |--r1\n  |  |--r2\n"
        );
    }
}
