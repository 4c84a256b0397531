//! Query results to composite tree files.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::client::QueryClient;
use crate::error::{Error, ErrorKind, Result};
use crate::metadata::{FieldKind, MetadataCache};
use crate::plan;
use crate::references::ReferenceRegistry;
use crate::registry::ObjectTypeRegistry;
use crate::types::{
    BasicRecord, ChildRecords, ExportResult, FieldValue, Reference, ReferenceState, SObjectTree,
    TreeRecord,
};

/// Records a single composite tree request accepts.
pub const COMPOSITE_TREE_RECORD_LIMIT: usize = 200;

/// Export settings.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub query: String,
    /// Split the output into per-type files plus a plan manifest.
    pub plan: bool,
    /// Defaults to the current directory.
    pub output_dir: Option<PathBuf>,
    /// Prepended to every file name as `<prefix>-`.
    pub prefix: Option<String>,
}

impl ExportConfig {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            plan: false,
            output_dir: None,
            prefix: None,
        }
    }

    pub fn with_plan(mut self, plan: bool) -> Self {
        self.plan = plan;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// The query must be a SELECT statement.
    pub fn validate(&self) -> Result<()> {
        let head = self.query.trim_start();
        let is_select = head
            .get(..6)
            .is_some_and(|keyword| keyword.eq_ignore_ascii_case("select"));
        if !is_select {
            return Err(Error::new(ErrorKind::InvalidQuery(format!(
                "query must start with SELECT: {}",
                self.query
            ))));
        }
        Ok(())
    }

    pub fn output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(Path::new("."))
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

/// Per-run export state: which types were seen and which reference id
/// stands for which source record.
#[derive(Debug, Default)]
pub struct ExportContext {
    pub types: ObjectTypeRegistry,
    pub references: ReferenceRegistry,
    plan: bool,
}

/// The child record's view of its parent while building.
struct ParentRef {
    reference: Reference,
    field: Option<String>,
}

impl ExportContext {
    pub fn new(plan: bool) -> Self {
        Self {
            plan,
            ..Self::default()
        }
    }

    /// Register the root type at order 0 and every nested child type at
    /// order 1, at all depths.
    pub fn register_types(&mut self, records: &[BasicRecord]) {
        let Some(first) = records.first() else {
            return;
        };
        self.types
            .register(&first.attributes.sobject_type, 0, true, false);
        for record in records {
            register_nested_types(record.fields.values(), &mut self.types);
        }
    }

    /// Build the tree. In plan mode, also resolve every reference and fix
    /// the type order.
    ///
    /// Every registered type must already be loaded into `metadata`.
    pub fn build_tree(
        &mut self,
        metadata: &MetadataCache,
        records: &[BasicRecord],
    ) -> Result<SObjectTree> {
        let mut records = self.build_records(metadata, records, None)?;
        if self.plan {
            self.resolve_references(&mut records)?;
            self.types.resolve_order();
        }
        Ok(SObjectTree { records })
    }

    fn build_records(
        &mut self,
        metadata: &MetadataCache,
        records: &[BasicRecord],
        parent: Option<&ParentRef>,
    ) -> Result<Vec<TreeRecord>> {
        // Child collections any sibling carries; missing ones become empty.
        let mut collections: Vec<&str> = Vec::new();
        for record in records {
            let schema = metadata.get(&record.attributes.sobject_type)?;
            for name in record.fields.keys() {
                if schema.is_query_result(name)
                    && !collections.iter().any(|c| c.eq_ignore_ascii_case(name))
                {
                    collections.push(name);
                }
            }
        }

        records
            .iter()
            .map(|record| self.build_record(metadata, record, parent, &collections))
            .collect()
    }

    fn build_record(
        &mut self,
        metadata: &MetadataCache,
        record: &BasicRecord,
        parent: Option<&ParentRef>,
        collections: &[&str],
    ) -> Result<TreeRecord> {
        let sobject = record.attributes.sobject_type.as_str();
        let reference_id = self.references.next_reference_id(sobject);
        self.references
            .save_record_ref(&record.attributes, &reference_id)?;

        let schema = metadata.get(sobject)?;
        let mut tree = TreeRecord::new(sobject, &reference_id);

        for (name, value) in &record.fields {
            if name.eq_ignore_ascii_case("Id") {
                continue;
            }

            let field_value = match schema.field_kind(name) {
                FieldKind::ChildCollection { .. } => {
                    let children = child_records(value)?;
                    if !children.done {
                        warn!(
                            sobject,
                            field = %name,
                            total_size = children.total_size,
                            fetched = children.records.len(),
                            "Subquery results were truncated; only the fetched records are exported"
                        );
                    }
                    let parent_ref = ParentRef {
                        reference: Reference::resolved(sobject, &reference_id),
                        field: metadata.parent_field(sobject, name)?,
                    };
                    FieldValue::Children(self.build_records(
                        metadata,
                        &children.records,
                        Some(&parent_ref),
                    )?)
                }
                FieldKind::Relationship { targets } if self.plan => match value.as_str() {
                    Some(id) => FieldValue::Reference(self.reference_for(targets, id)),
                    None => FieldValue::Scalar(value.clone()),
                },
                _ => FieldValue::Scalar(value.clone()),
            };
            tree.push_field(name.clone(), field_value);
        }

        for name in collections {
            if !tree.has_field(name) && schema.is_query_result(name) {
                tree.push_field(*name, FieldValue::Children(Vec::new()));
            }
        }

        if self.plan {
            if let Some(ParentRef {
                reference,
                field: Some(field),
            }) = parent
            {
                if !tree.has_field(field) {
                    tree.push_field(field.clone(), FieldValue::Reference(reference.clone()));
                }
            }
        }

        Ok(tree)
    }

    /// Reference for a lookup holding `id`, resolved when any target type
    /// already mapped that record.
    fn reference_for(&self, targets: &[String], id: &str) -> Reference {
        targets
            .iter()
            .find_map(|target| {
                self.references
                    .lookup(target, id)
                    .map(|reference_id| Reference::resolved(target.clone(), reference_id))
            })
            .unwrap_or_else(|| {
                Reference::pending(targets.first().cloned().unwrap_or_default(), id)
            })
    }

    /// Resolve pending references against every record now registered and
    /// record a dependency edge for each reference.
    fn resolve_references(&mut self, records: &mut [TreeRecord]) -> Result<()> {
        for record in records.iter_mut() {
            let sobject = record.attributes.sobject_type.clone();

            for (_, value) in record.fields.iter_mut() {
                match value {
                    FieldValue::Reference(reference) => {
                        if let ReferenceState::Pending(id) = &reference.state {
                            let resolved = match self.references.lookup(&reference.target, id) {
                                Some(reference_id) => {
                                    Reference::resolved(reference.target.clone(), reference_id)
                                }
                                None => match self.references.find(id) {
                                    Some((target, reference_id)) => {
                                        Reference::resolved(target, reference_id)
                                    }
                                    None => {
                                        return Err(Error::new(ErrorKind::ReferenceNotFound {
                                            sobject: reference.target.clone(),
                                            id: id.clone(),
                                        }))
                                    }
                                },
                            };
                            *reference = resolved;
                        }
                        self.types.add_dependency(&sobject, &reference.target);
                    }
                    FieldValue::Children(children) => self.resolve_references(children)?,
                    FieldValue::Scalar(_) => {}
                }
            }
        }
        Ok(())
    }
}

fn register_nested_types<'a>(
    values: impl IntoIterator<Item = &'a Value>,
    types: &mut ObjectTypeRegistry,
) {
    for value in values {
        let Some(children) = value.get("records").and_then(Value::as_array) else {
            continue;
        };
        for child in children {
            if let Some(sobject) = child.pointer("/attributes/type").and_then(Value::as_str) {
                types.register(sobject, 1, false, true);
            }
            if let Some(fields) = child.as_object() {
                register_nested_types(fields.values(), types);
            }
        }
    }
}

fn child_records(value: &Value) -> Result<ChildRecords> {
    if value.is_null() {
        return Ok(ChildRecords::default());
    }
    Ok(serde_json::from_value(value.clone())?)
}

/// Runs exports against a [`QueryClient`], caching describes across runs.
///
/// # Example
///
/// ```rust,ignore
/// use busbar_sf_tree::{ExportConfig, TreeExporter};
///
/// let mut exporter = TreeExporter::new(rest_client);
/// let result = exporter
///     .export(
///         &ExportConfig::new("SELECT Name, (SELECT LastName FROM Contacts) FROM Account")
///             .with_plan(true)
///             .with_output_dir("data"),
///     )
///     .await?;
/// ```
#[derive(Debug)]
pub struct TreeExporter<C> {
    client: C,
    metadata: MetadataCache,
}

impl<C: QueryClient> TreeExporter<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            metadata: MetadataCache::new(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn metadata(&self) -> &MetadataCache {
        &self.metadata
    }

    /// Query, build the tree, and write it out.
    ///
    /// Without a plan the whole tree goes to one file; with a plan it is
    /// split per object type and a manifest lists the files in insert
    /// order. An empty query result writes nothing.
    #[instrument(skip(self, config), fields(plan = config.plan))]
    pub async fn export(&mut self, config: &ExportConfig) -> Result<ExportResult> {
        config.validate()?;

        let result = self.client.query(&config.query).await?;
        if result.records.is_empty() {
            info!("Query returned no records; nothing to export");
            return Ok(ExportResult::default());
        }
        debug!(records = result.records.len(), "Query returned records");

        let mut ctx = ExportContext::new(config.plan);
        ctx.register_types(&result.records);
        self.metadata.load(&self.client, &ctx.types.names()).await?;

        let tree = ctx.build_tree(&self.metadata, &result.records)?;

        let files = if config.plan {
            let plan = plan::build_plan(&tree, &ctx.types);
            plan::write_plan(&plan, config.output_dir(), config.prefix()).await?
        } else {
            let count = tree.record_count();
            if count > COMPOSITE_TREE_RECORD_LIMIT {
                warn!(
                    records = count,
                    limit = COMPOSITE_TREE_RECORD_LIMIT,
                    "Tree exceeds the composite tree record limit; export with a plan to split it"
                );
            }
            let names = ctx.types.names();
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            let path = config
                .output_dir()
                .join(plan::tree_file_name(config.prefix(), &names));
            plan::write_json(&path, &tree).await?;
            vec![path]
        };

        info!(files = files.len(), records = tree.record_count(), "Export complete");
        Ok(ExportResult { tree, files })
    }
}
