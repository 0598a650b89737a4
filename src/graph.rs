//! Graph builder: validated document -> group/host/variable graph.
//!
//! The builder owns normalization (legacy shorthand -> object form),
//! duplicate-declaration merging, the implicit `all` root, cycle detection,
//! and per-host effective-variable resolution. The output is rebuilt fresh on
//! every invocation and handed to the host tool, never persisted.

use crate::Result;
use crate::document::{GroupDecl, InventoryDocument, VarMap};
use crate::error::InventoryError;
use std::collections::BTreeMap;
use tracing::debug;

/// The implicit root group. Every other group is (transitively) its child.
pub const ROOT_GROUP: &str = "all";

/// The resolved inventory graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    /// Group names, root first, then first-appearance document order.
    pub groups: Vec<String>,
    /// Parent -> children relation. Acyclic by construction.
    pub children: BTreeMap<String, Vec<String>>,
    /// Group -> declared hosts. Hosts never declared under any group are
    /// listed under the root.
    pub hosts: BTreeMap<String, Vec<String>>,
    /// Group -> own (unresolved) variables.
    pub group_vars: BTreeMap<String, VarMap>,
    /// Host -> effective variables after folding ancestor group vars and
    /// overlaying `_meta.hostvars`.
    pub host_vars: BTreeMap<String, VarMap>,
}

/// Normalized group form; the one shape all downstream code handles.
#[derive(Debug, Clone, Default)]
struct NormGroup {
    hosts: Vec<String>,
    children: Vec<String>,
    vars: VarMap,
}

/// Build the graph from a validated document.
///
/// Phases:
/// 1. Normalize declarations and union-merge duplicates in document order.
/// 2. Register groups referenced only as children; attach parentless groups
///    under the implicit root.
/// 3. Depth-first traversal from the root: reject cycles, fix each host's
///    ancestor chain at its first arrival.
/// 4. Fold ancestor group vars (nearest ancestor wins) and overlay hostvars.
pub fn build(doc: &InventoryDocument) -> Result<Graph> {
    // Phase 1: normalized table keyed by name, plus first-appearance order.
    let mut order: Vec<String> = vec![ROOT_GROUP.to_string()];
    let mut table: BTreeMap<String, NormGroup> = BTreeMap::new();
    table.insert(ROOT_GROUP.to_string(), NormGroup::default());

    for (name, decl) in &doc.groups {
        let incoming = match decl {
            GroupDecl::Hosts(hosts) => NormGroup {
                hosts: hosts.clone(),
                ..NormGroup::default()
            },
            GroupDecl::Full {
                hosts,
                children,
                vars,
            } => NormGroup {
                hosts: hosts.clone(),
                children: children.clone(),
                vars: vars.clone(),
            },
        };
        if !table.contains_key(name) {
            order.push(name.clone());
        }
        let entry = table.entry(name.clone()).or_default();
        union_into(&mut entry.hosts, incoming.hosts);
        union_into(&mut entry.children, incoming.children);
        for (key, value) in incoming.vars {
            // Later declarations win on key conflict.
            entry.vars.insert(key, value);
        }
    }

    // Phase 2a: groups referenced only as children exist too, empty.
    let referenced: Vec<String> = table
        .values()
        .flat_map(|g| g.children.iter().cloned())
        .collect();
    for child in &referenced {
        if !table.contains_key(child) {
            order.push(child.clone());
            table.insert(child.clone(), NormGroup::default());
        }
    }

    // Phase 2b: parentless groups become direct children of the root.
    let top_level: Vec<String> = order
        .iter()
        .filter(|name| name.as_str() != ROOT_GROUP && !referenced.contains(name))
        .cloned()
        .collect();
    if let Some(root) = table.get_mut(ROOT_GROUP) {
        union_into(&mut root.children, top_level);
    }

    // Phase 3: DFS from the root. First arrival at a group pins the ancestor
    // chain its hosts inherit from; revisiting a group on the current path is
    // a cycle.
    #[derive(Copy, Clone, PartialEq, Eq)]
    enum Mark {
        Temp,
        Perm,
    }

    fn dfs(
        group: &str,
        table: &BTreeMap<String, NormGroup>,
        marks: &mut BTreeMap<String, Mark>,
        stack: &mut Vec<String>,
        host_chain: &mut BTreeMap<String, Vec<String>>,
    ) -> Result<()> {
        match marks.get(group) {
            Some(Mark::Perm) => return Ok(()),
            Some(Mark::Temp) => {
                // The cycle is the slice of the current path from the first
                // occurrence of `group`, closed by `group` itself.
                let start = stack.iter().position(|g| g == group).unwrap_or(0);
                let mut path = stack[start..].to_vec();
                path.push(group.to_string());
                return Err(InventoryError::Cycle { path });
            }
            None => {}
        }

        marks.insert(group.to_string(), Mark::Temp);
        stack.push(group.to_string());

        if let Some(norm) = table.get(group) {
            for host in &norm.hosts {
                host_chain
                    .entry(host.clone())
                    .or_insert_with(|| stack.clone());
            }
            for child in &norm.children {
                dfs(child, table, marks, stack, host_chain)?;
            }
        }

        stack.pop();
        marks.insert(group.to_string(), Mark::Perm);
        Ok(())
    }

    let mut marks = BTreeMap::new();
    let mut stack = Vec::new();
    let mut host_chain: BTreeMap<String, Vec<String>> = BTreeMap::new();
    dfs(ROOT_GROUP, &table, &mut marks, &mut stack, &mut host_chain)?;

    // A group the root traversal never reached sits under a cycle with no
    // parentless entry point. That is still an error, not a silent drop.
    for name in &order {
        if !marks.contains_key(name.as_str()) {
            stack.clear();
            dfs(name, &table, &mut marks, &mut stack, &mut host_chain)?;
        }
    }

    // Phase 4: effective variables. Fold the ancestor chain root-to-leaf so
    // the nearest ancestor wins, then overlay hostvars.
    let mut host_vars: BTreeMap<String, VarMap> = BTreeMap::new();
    for (host, chain) in &host_chain {
        let mut vars = VarMap::new();
        for group in chain {
            if let Some(norm) = table.get(group) {
                for (key, value) in &norm.vars {
                    vars.insert(key.clone(), value.clone());
                }
            }
        }
        host_vars.insert(host.clone(), vars);
    }

    let mut ungrouped: Vec<String> = Vec::new();
    for (host, overrides) in &doc.hostvars {
        let vars = host_vars.entry(host.clone()).or_insert_with(|| {
            ungrouped.push(host.clone());
            VarMap::new()
        });
        for (key, value) in overrides {
            vars.insert(key.clone(), value.clone());
        }
    }
    if !ungrouped.is_empty() {
        debug!(count = ungrouped.len(), "attaching hostvars-only hosts under root");
        if let Some(root) = table.get_mut(ROOT_GROUP) {
            union_into(&mut root.hosts, ungrouped);
        }
    }

    let mut graph = Graph {
        groups: order.clone(),
        ..Graph::default()
    };
    for name in &order {
        let norm = &table[name.as_str()];
        graph.children.insert(name.clone(), norm.children.clone());
        graph.hosts.insert(name.clone(), norm.hosts.clone());
        graph.group_vars.insert(name.clone(), norm.vars.clone());
    }
    graph.host_vars = host_vars;

    debug!(
        groups = graph.groups.len(),
        hosts = graph.host_vars.len(),
        "built inventory graph"
    );
    Ok(graph)
}

/// Append `incoming` items not already present, preserving first-appearance
/// order.
fn union_into(existing: &mut Vec<String>, incoming: Vec<String>) {
    for item in incoming {
        if !existing.contains(&item) {
            existing.push(item);
        }
    }
}
