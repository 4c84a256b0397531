//! Splitting an exported tree into per-type files plus a manifest.
//!
//! [`build_plan`] is a pure transform: nested child collections are moved
//! out of their parents into one bucket per object type, and the buckets
//! are ordered so that every type comes after the types it references.
//! [`write_plan`] puts the result on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};
use crate::registry::ObjectTypeRegistry;
use crate::types::{DataPlanPart, FieldValue, PlanFile, SObjectTree, TreeRecord};

/// Records of one object type, flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanPart {
    pub sobject: String,
    pub save_refs: bool,
    pub resolve_refs: bool,
    pub records: Vec<TreeRecord>,
}

/// Parts in insert order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub parts: Vec<PlanPart>,
}

impl Plan {
    pub fn sobjects(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.sobject.as_str()).collect()
    }
}

/// Partition `tree` by object type, ordered by `types`.
pub fn build_plan(tree: &SObjectTree, types: &ObjectTypeRegistry) -> Plan {
    let mut buckets: HashMap<String, Vec<TreeRecord>> = HashMap::new();
    for record in &tree.records {
        flatten_into(record, &mut buckets);
    }

    let parts = types
        .sorted()
        .into_iter()
        .filter_map(|entry| {
            let records = buckets.remove(&entry.sobject)?;
            Some(PlanPart {
                sobject: entry.sobject.clone(),
                save_refs: entry.save_refs,
                resolve_refs: entry.resolve_refs,
                records,
            })
        })
        .collect();

    Plan { parts }
}

fn flatten_into(record: &TreeRecord, buckets: &mut HashMap<String, Vec<TreeRecord>>) {
    let mut flat = TreeRecord::new(record.sobject_type(), record.reference_id());
    let mut nested: Vec<&TreeRecord> = Vec::new();

    for (name, value) in &record.fields {
        match value {
            FieldValue::Children(children) => nested.extend(children),
            _ => flat.push_field(name.clone(), value.clone()),
        }
    }

    buckets
        .entry(record.sobject_type().to_string())
        .or_default()
        .push(flat);

    for child in nested {
        flatten_into(child, buckets);
    }
}

fn prefixed(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}-{name}"),
        _ => name.to_string(),
    }
}

/// `<prefix->?<Type>s.json`
pub fn type_file_name(prefix: Option<&str>, sobject: &str) -> String {
    prefixed(prefix, &format!("{sobject}s.json"))
}

/// `<prefix->?<Type1>-<Type2>-...-plan.json`
pub fn manifest_file_name(prefix: Option<&str>, sobjects: &[&str]) -> String {
    prefixed(prefix, &format!("{}-plan.json", sobjects.join("-")))
}

/// `<prefix->?<Type1>-<Type2>-....json`, for single-file exports.
pub fn tree_file_name(prefix: Option<&str>, sobjects: &[&str]) -> String {
    prefixed(prefix, &format!("{}.json", sobjects.join("-")))
}

#[derive(Serialize)]
struct RecordsFile<'a> {
    records: &'a [TreeRecord],
}

/// Write one file per part and the manifest, creating `output_dir` when
/// missing. Returns the paths written, manifest last.
pub async fn write_plan(plan: &Plan, output_dir: &Path, prefix: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::with_capacity(plan.parts.len() + 1);
    let mut manifest = Vec::with_capacity(plan.parts.len());

    for part in &plan.parts {
        let file_name = type_file_name(prefix, &part.sobject);
        let path = output_dir.join(&file_name);
        write_json(&path, &RecordsFile { records: &part.records }).await?;
        debug!(sobject = %part.sobject, records = part.records.len(), path = %path.display(), "Wrote plan file");

        manifest.push(DataPlanPart {
            sobject: part.sobject.clone(),
            save_refs: part.save_refs,
            resolve_refs: part.resolve_refs,
            files: vec![PlanFile::Path(file_name)],
        });
        files.push(path);
    }

    let manifest_path = output_dir.join(manifest_file_name(prefix, &plan.sobjects()));
    write_json(&manifest_path, &manifest).await?;
    files.push(manifest_path);

    Ok(files)
}

/// Pretty-print `value` to `path`, creating parent directories.
pub(crate) async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let io_error = |err: std::io::Error| {
        Error::with_source(ErrorKind::Io(format!("{}: {err}", path.display())), err)
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
    }

    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json).await.map_err(io_error)
}
