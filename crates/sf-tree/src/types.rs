//! Record shapes on both sides of the tree engine.
//!
//! [`BasicRecord`] is what a SOQL query returns. [`TreeRecord`] is what the
//! composite tree API accepts: no ids, no urls, records linked through
//! `@<Type>Ref<N>` references.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use busbar_sf_rest::TreeContentType;

/// `attributes` block of a queried record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RecordAttributes {
    #[serde(rename = "type")]
    pub sobject_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl RecordAttributes {
    /// Source record id: the last segment of `url`.
    pub fn source_id(&self) -> Option<&str> {
        self.url
            .as_deref()
            .and_then(|url| url.rsplit('/').next())
            .filter(|id| !id.is_empty())
    }
}

/// A record as returned by a query.
///
/// Field values are scalars or nested `{records, totalSize, done}` child
/// collections for subqueries.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicRecord {
    pub attributes: RecordAttributes,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

/// A subquery collection nested inside a [`BasicRecord`].
#[derive(Debug, Clone, Deserialize)]
pub struct ChildRecords {
    #[serde(rename = "totalSize", default)]
    pub total_size: u64,
    #[serde(default = "default_done")]
    pub done: bool,
    #[serde(default)]
    pub records: Vec<BasicRecord>,
}

fn default_done() -> bool {
    true
}

impl Default for ChildRecords {
    fn default() -> Self {
        Self {
            total_size: 0,
            done: true,
            records: Vec::new(),
        }
    }
}

/// `attributes` block of a tree record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeAttributes {
    #[serde(rename = "type")]
    pub sobject_type: String,
    #[serde(rename = "referenceId")]
    pub reference_id: String,
}

/// Whether a reference already points at a symbolic id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceState {
    /// Symbolic id, without the leading `@`.
    Resolved(String),
    /// Source record id not yet mapped.
    Pending(String),
}

/// A lookup from one tree record to another record of `target` type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub target: String,
    pub state: ReferenceState,
}

impl Reference {
    pub fn resolved(target: impl Into<String>, reference_id: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            state: ReferenceState::Resolved(reference_id.into()),
        }
    }

    pub fn pending(target: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            state: ReferenceState::Pending(source_id.into()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.state, ReferenceState::Resolved(_))
    }

    /// Symbolic id once resolved.
    pub fn reference_id(&self) -> Option<&str> {
        match &self.state {
            ReferenceState::Resolved(id) => Some(id),
            ReferenceState::Pending(_) => None,
        }
    }
}

/// Value of a tree record field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Value),
    Reference(Reference),
    Children(Vec<TreeRecord>),
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Scalar(value) => value.serialize(serializer),
            FieldValue::Reference(reference) => match &reference.state {
                ReferenceState::Resolved(id) => serializer.serialize_str(&format!("@{id}")),
                ReferenceState::Pending(raw) => serializer.serialize_str(raw),
            },
            FieldValue::Children(records) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("records", records)?;
                map.end()
            }
        }
    }
}

/// A record in composite tree form.
///
/// Fields keep the order they were added in.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRecord {
    pub attributes: TreeAttributes,
    pub fields: Vec<(String, FieldValue)>,
}

impl TreeRecord {
    pub fn new(sobject_type: impl Into<String>, reference_id: impl Into<String>) -> Self {
        Self {
            attributes: TreeAttributes {
                sobject_type: sobject_type.into(),
                reference_id: reference_id.into(),
            },
            fields: Vec::new(),
        }
    }

    pub fn sobject_type(&self) -> &str {
        &self.attributes.sobject_type
    }

    pub fn reference_id(&self) -> &str {
        &self.attributes.reference_id
    }

    /// Field lookup, ignoring ASCII case.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn push_field(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.push((name.into(), value));
    }

    /// Number of records in this subtree, this one included.
    pub fn record_count(&self) -> usize {
        1 + self
            .fields
            .iter()
            .map(|(_, value)| match value {
                FieldValue::Children(children) => {
                    children.iter().map(TreeRecord::record_count).sum()
                }
                _ => 0,
            })
            .sum::<usize>()
    }
}

impl Serialize for TreeRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("attributes", &self.attributes)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Body of a tree file: `{"records": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SObjectTree {
    pub records: Vec<TreeRecord>,
}

impl SObjectTree {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records at every nesting level.
    pub fn record_count(&self) -> usize {
        self.records.iter().map(TreeRecord::record_count).sum()
    }
}

/// One entry of a plan manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DataPlanPart {
    pub sobject: String,
    #[serde(default)]
    pub save_refs: bool,
    #[serde(default)]
    pub resolve_refs: bool,
    pub files: Vec<PlanFile>,
}

/// A file listed in a plan part: a bare path, or a path with per-file
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PlanFile {
    Path(String),
    Detailed(PlanFileSpec),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlanFileSpec {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<TreeContentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_refs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve_refs: Option<bool>,
}

impl PlanFile {
    pub fn path(&self) -> &str {
        match self {
            PlanFile::Path(path) => path,
            PlanFile::Detailed(spec) => &spec.file,
        }
    }
}

/// `{referenceId, id}` pair returned by a successful insert.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRef {
    pub reference_id: String,
    pub id: String,
}

/// Outcome of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub response_refs: Vec<ResponseRef>,
    /// Reference id to object type, for every record in the imported files.
    pub sobject_types: BTreeMap<String, String>,
    /// Non-fatal problems, such as references that could not be substituted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Outcome of an export run.
#[derive(Debug, Clone, Default)]
pub struct ExportResult {
    pub tree: SObjectTree,
    /// Files written, in write order. The plan manifest comes last.
    pub files: Vec<PathBuf>,
}
