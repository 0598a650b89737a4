//! Inventory document schema: JSON shapes + validated in-memory structures.
//!
//! Wire shape (must match the host tool's external-inventory convention):
//!
//! {
//!   "_meta": { "hostvars": { "h1": { "x": 1 } } },
//!   "web":   ["h1", "h2"],                          // legacy shorthand
//!   "db":    { "hosts": ["h3"],
//!              "children": ["replicas"],
//!              "vars": { "port": 5432 } }
//! }
//!
//! The group value is duck-typed (array or object), so validation produces a
//! tagged `GroupDecl` and downstream code handles one shape only. Validation
//! fails fast on the first violation and names the offending key path.

use crate::Result;
use crate::error::InventoryError;
use serde_json::Value;

/// Key reserved for host variables; never a group name.
pub const META_KEY: &str = "_meta";

/// A mapping of variable name to JSON value.
pub type VarMap = serde_json::Map<String, Value>;

/// A validated inventory document. Groups keep document order because
/// duplicate-merge precedence and multi-membership tie-breaks depend on it.
#[derive(Debug, Clone, Default)]
pub struct InventoryDocument {
    pub hostvars: Vec<(String, VarMap)>,
    pub groups: Vec<(String, GroupDecl)>,
}

/// One group declaration, still in its two wire forms.
#[derive(Debug, Clone)]
pub enum GroupDecl {
    /// Legacy shorthand: a bare list of hostnames.
    Hosts(Vec<String>),
    /// Object form with optional hosts/children/vars.
    Full {
        hosts: Vec<String>,
        children: Vec<String>,
        vars: VarMap,
    },
}

/// Validate raw response bytes against the inventory-document schema.
pub fn validate(body: &[u8]) -> Result<InventoryDocument> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| schema_error("$", format!("body is not valid JSON: {e}")))?;

    let top = value
        .as_object()
        .ok_or_else(|| schema_error("$", "top-level value must be an object"))?;

    let meta = top
        .get(META_KEY)
        .ok_or_else(|| schema_error(META_KEY, "required key is missing"))?
        .as_object()
        .ok_or_else(|| schema_error(META_KEY, "expected an object"))?;

    let hostvars_path = format!("{META_KEY}.hostvars");
    let raw_hostvars = meta
        .get("hostvars")
        .ok_or_else(|| schema_error(hostvars_path.as_str(), "required key is missing"))?
        .as_object()
        .ok_or_else(|| schema_error(hostvars_path.as_str(), "expected an object"))?;

    let mut hostvars = Vec::with_capacity(raw_hostvars.len());
    for (host, vars) in raw_hostvars {
        if host.is_empty() {
            return Err(schema_error(hostvars_path.as_str(), "hostname must be non-empty"));
        }
        let vars = vars.as_object().ok_or_else(|| {
            schema_error(
                format!("{hostvars_path}.{host}"),
                "expected an object of variables",
            )
        })?;
        hostvars.push((host.clone(), vars.clone()));
    }

    let mut groups = Vec::new();
    for (name, entry) in top {
        if name == META_KEY {
            continue;
        }
        if name.is_empty() {
            return Err(schema_error("$", "group name must be non-empty"));
        }
        groups.push((name.clone(), validate_group(name, entry)?));
    }

    Ok(InventoryDocument { hostvars, groups })
}

fn validate_group(name: &str, entry: &Value) -> Result<GroupDecl> {
    match entry {
        Value::Array(_) => Ok(GroupDecl::Hosts(name_seq(entry, name)?)),
        Value::Object(fields) => {
            let mut hosts = Vec::new();
            let mut children = Vec::new();
            let mut vars = VarMap::new();
            for (key, value) in fields {
                let path = format!("{name}.{key}");
                match key.as_str() {
                    "hosts" => hosts = name_seq(value, &path)?,
                    "children" => children = name_seq(value, &path)?,
                    "vars" => {
                        vars = value
                            .as_object()
                            .ok_or_else(|| schema_error(path.as_str(), "expected an object"))?
                            .clone();
                    }
                    _ => {
                        return Err(schema_error(
                            path,
                            "unknown key in group object (expected hosts, children or vars)",
                        ));
                    }
                }
            }
            Ok(GroupDecl::Full {
                hosts,
                children,
                vars,
            })
        }
        _ => Err(schema_error(
            name,
            "expected a list of hostnames or a group object",
        )),
    }
}

/// A sequence of non-empty strings, or the first offending index.
fn name_seq(value: &Value, path: &str) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| schema_error(path, "expected a list of strings"))?;
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item.as_str() {
            Some(s) if !s.is_empty() => out.push(s.to_string()),
            Some(_) => return Err(schema_error(format!("{path}[{i}]"), "name must be non-empty")),
            None => return Err(schema_error(format!("{path}[{i}]"), "expected a string")),
        }
    }
    Ok(out)
}

fn schema_error(path: impl Into<String>, reason: impl Into<String>) -> InventoryError {
    InventoryError::Schema {
        path: path.into(),
        reason: reason.into(),
    }
}
