//! Object schemas reduced from describe results.
//!
//! Each describe is fetched once per [`MetadataCache`] lifetime and turned
//! into a map of [`FieldKind`]s keyed by lower-cased field name, so record
//! keys can be classified with a single lookup whatever casing the query
//! used.

use std::collections::HashMap;

use busbar_sf_rest::DescribeSObjectResult;
use futures::future::try_join_all;
use tracing::{debug, instrument};

use crate::client::QueryClient;
use crate::error::{Error, ErrorKind, Result};

/// How a record key is treated while building a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Copied through unchanged.
    Scalar,
    /// Lookup or master-detail field holding another record's id.
    Relationship { targets: Vec<String> },
    /// Subquery collection of child records.
    ChildCollection {
        relationship_name: String,
        child_type: String,
        /// Lookup on the child pointing back at this object, when the
        /// describe names it.
        parent_field: Option<String>,
    },
}

static SCALAR: FieldKind = FieldKind::Scalar;

/// Field classification for one object type.
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    name: String,
    fields: HashMap<String, FieldKind>,
    /// Relationship field names as described, in describe order.
    reference_fields: Vec<String>,
}

impl ObjectSchema {
    pub fn from_describe(describe: &DescribeSObjectResult) -> Self {
        let mut fields = HashMap::new();
        let mut reference_fields = Vec::new();

        for field in describe.fields.iter().filter(|f| f.is_reference()) {
            let targets = field.reference_targets().to_vec();
            if !targets.is_empty() {
                reference_fields.push(field.name.clone());
                fields.insert(
                    field.name.to_ascii_lowercase(),
                    FieldKind::Relationship { targets },
                );
            }
        }

        for rel in &describe.child_relationships {
            let Some(name) = rel.relationship_name.as_deref() else {
                continue;
            };
            fields.insert(
                name.to_ascii_lowercase(),
                FieldKind::ChildCollection {
                    relationship_name: name.to_string(),
                    child_type: rel.child_sobject.clone(),
                    parent_field: rel.field.clone(),
                },
            );
        }

        Self {
            name: describe.name.clone(),
            fields,
            reference_fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Classification of `field`; unknown fields are scalars.
    pub fn field_kind(&self, field: &str) -> &FieldKind {
        self.fields
            .get(&field.to_ascii_lowercase())
            .unwrap_or(&SCALAR)
    }

    pub fn is_query_result(&self, field: &str) -> bool {
        matches!(self.field_kind(field), FieldKind::ChildCollection { .. })
    }

    pub fn is_relationship(&self, field: &str) -> bool {
        matches!(self.field_kind(field), FieldKind::Relationship { .. })
    }

    /// Object type a relationship field points at. Polymorphic lookups
    /// report their first target.
    pub fn related_to(&self, field: &str) -> Result<&str> {
        match self.field_kind(field) {
            FieldKind::Relationship { targets } if !targets.is_empty() => Ok(&targets[0]),
            _ => Err(Error::new(ErrorKind::RelationshipNotFound {
                sobject: self.name.clone(),
                field: field.to_string(),
            })),
        }
    }

    /// First relationship field targeting `sobject`.
    fn reference_field_to(&self, sobject: &str) -> Option<&str> {
        self.reference_fields
            .iter()
            .find(|name| match self.field_kind(name) {
                FieldKind::Relationship { targets } => targets.iter().any(|t| t == sobject),
                _ => false,
            })
            .map(String::as_str)
    }
}

/// Per-type schemas, memoized for the lifetime of the cache.
#[derive(Debug, Default)]
pub struct MetadataCache {
    schemas: HashMap<String, ObjectSchema>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, sobject: &str) -> bool {
        self.schemas.contains_key(sobject)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Describe every type not cached yet, concurrently.
    #[instrument(skip(self, client, types))]
    pub async fn load<C: QueryClient>(&mut self, client: &C, types: &[String]) -> Result<()> {
        let mut missing: Vec<&str> = Vec::new();
        for sobject in types {
            if !self.contains(sobject) && !missing.contains(&sobject.as_str()) {
                missing.push(sobject);
            }
        }
        if missing.is_empty() {
            return Ok(());
        }

        debug!(types = ?missing, "Loading object metadata");
        let describes = try_join_all(missing.iter().map(|sobject| client.describe(sobject))).await?;

        for (sobject, describe) in missing.into_iter().zip(describes) {
            self.schemas
                .insert(sobject.to_string(), ObjectSchema::from_describe(&describe));
        }
        Ok(())
    }

    pub fn get(&self, sobject: &str) -> Result<&ObjectSchema> {
        self.schemas
            .get(sobject)
            .ok_or_else(|| Error::new(ErrorKind::MetadataNotFound(sobject.to_string())))
    }

    /// Lookup field on `child_type` that links it to `parent_type` through
    /// the `relationship` child collection.
    ///
    /// Falls back to the first reference field on the child targeting the
    /// parent when the describe leaves the relationship's field blank.
    pub fn parent_field(
        &self,
        parent_type: &str,
        relationship: &str,
    ) -> Result<Option<String>> {
        let schema = self.get(parent_type)?;
        let FieldKind::ChildCollection {
            child_type,
            parent_field,
            ..
        } = schema.field_kind(relationship)
        else {
            return Ok(None);
        };

        if parent_field.is_some() {
            return Ok(parent_field.clone());
        }

        Ok(self
            .schemas
            .get(child_type)
            .and_then(|child| child.reference_field_to(parent_type))
            .map(str::to_string))
    }
}
