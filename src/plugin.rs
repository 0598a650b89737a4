//! Plugin facade: sequences auth -> fetch -> validate -> build and replays
//! the resulting graph into the host tool's registration interface.

use crate::auth::{self, EnvSnapshot};
use crate::config::InventoryConfig;
use crate::document::VarMap;
use crate::graph::{self, Graph};
use crate::{Result, document, fetch};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// The host tool's inventory-registration interface.
///
/// `populate` always declares a group before referencing it as a parent or
/// as the target of a host assignment or variable.
pub trait InventorySink {
    fn add_group(&mut self, group: &str);
    fn add_child(&mut self, parent: &str, child: &str);
    fn add_host(&mut self, host: &str, group: &str);
    fn set_group_variable(&mut self, group: &str, key: &str, value: &Value);
    fn set_host_variable(&mut self, host: &str, key: &str, value: &Value);
}

/// One full invocation: credentials, one GET, schema check, graph build.
///
/// The first failing stage aborts the run; errors pass through unchanged and
/// already carry their stage name.
pub fn run(config: &InventoryConfig, env: &EnvSnapshot) -> Result<Graph> {
    let credentials = auth::produce_credentials(config.auth_method, env)?;
    debug!(auth_method = ?config.auth_method, url = %config.url, "fetching inventory");

    let body = fetch::fetch(
        &config.url,
        &credentials,
        config.validate_certs,
        config.timeout,
    )?;

    let doc = document::validate(&body)?;
    graph::build(&doc)
}

/// Replay a graph into the sink: groups first, then child relations, group
/// variables, host assignments, and finally per-host effective variables.
pub fn populate(graph: &Graph, sink: &mut dyn InventorySink) {
    for group in &graph.groups {
        sink.add_group(group);
    }
    for group in &graph.groups {
        if let Some(children) = graph.children.get(group) {
            for child in children {
                sink.add_child(group, child);
            }
        }
        if let Some(vars) = graph.group_vars.get(group) {
            for (key, value) in vars {
                sink.set_group_variable(group, key, value);
            }
        }
        if let Some(hosts) = graph.hosts.get(group) {
            for host in hosts {
                sink.add_host(host, group);
            }
        }
    }
    for (host, vars) in &graph.host_vars {
        for (key, value) in vars {
            sink.set_host_variable(host, key, value);
        }
    }
}

/// In-memory sink that rebuilds the external-inventory JSON shape. Used by
/// the CLI `list` subcommand.
#[derive(Debug, Clone, Default)]
pub struct MemoryInventory {
    groups: Vec<String>,
    children: BTreeMap<String, Vec<String>>,
    hosts: BTreeMap<String, Vec<String>>,
    group_vars: BTreeMap<String, VarMap>,
    host_vars: BTreeMap<String, VarMap>,
}

impl InventorySink for MemoryInventory {
    fn add_group(&mut self, group: &str) {
        if !self.groups.iter().any(|g| g == group) {
            self.groups.push(group.to_string());
        }
    }

    fn add_child(&mut self, parent: &str, child: &str) {
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(child.to_string());
    }

    fn add_host(&mut self, host: &str, group: &str) {
        self.hosts
            .entry(group.to_string())
            .or_default()
            .push(host.to_string());
    }

    fn set_group_variable(&mut self, group: &str, key: &str, value: &Value) {
        self.group_vars
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string(), value.clone());
    }

    fn set_host_variable(&mut self, host: &str, key: &str, value: &Value) {
        self.host_vars
            .entry(host.to_string())
            .or_default()
            .insert(key.to_string(), value.clone());
    }
}

impl MemoryInventory {
    /// Render the `_meta` + groups JSON document the host tool's
    /// `--list` contract expects.
    pub fn to_value(&self) -> Value {
        let mut hostvars = serde_json::Map::new();
        for (host, vars) in &self.host_vars {
            hostvars.insert(host.clone(), Value::Object(vars.clone()));
        }
        let mut meta = serde_json::Map::new();
        meta.insert("hostvars".into(), Value::Object(hostvars));

        let mut top = serde_json::Map::new();
        top.insert("_meta".into(), Value::Object(meta));
        for group in &self.groups {
            let mut entry = serde_json::Map::new();
            if let Some(hosts) = self.hosts.get(group).filter(|h| !h.is_empty()) {
                entry.insert("hosts".into(), hosts.iter().cloned().map(Value::from).collect());
            }
            if let Some(children) = self.children.get(group).filter(|c| !c.is_empty()) {
                entry.insert(
                    "children".into(),
                    children.iter().cloned().map(Value::from).collect(),
                );
            }
            if let Some(vars) = self.group_vars.get(group).filter(|v| !v.is_empty()) {
                entry.insert("vars".into(), Value::Object(vars.clone()));
            }
            top.insert(group.clone(), Value::Object(entry));
        }
        Value::Object(top)
    }
}
