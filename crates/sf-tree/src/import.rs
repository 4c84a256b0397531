//! Tree files and plans back into an org.
//!
//! Files are posted one at a time, in order. Ids returned for files that
//! save references are remembered under their reference id, and later files
//! that resolve references get `@Ref` placeholders replaced with those ids
//! before they are sent.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use busbar_sf_rest::{CompositeTreeResponse, TreeContentType};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex_lite::{Captures, Regex};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::client::QueryClient;
use crate::error::{Error, ErrorKind, Result};
use crate::types::{DataPlanPart, ImportResult, PlanFile, ResponseRef};

/// `"Field": "@Ref"` in a JSON tree. The whole string value must be a
/// single `@` token, so data such as `"@acme corp"` is left alone.
static JSON_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"("[^"\\]*"\s*:\s*")@(\w+)(")"#).expect("json reference pattern is valid")
});

/// `<LookupId>@Ref</LookupId>` in an XML tree; only lookup elements
/// (`...Id` or custom `...__c`) carry references.
static XML_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(<(?:\w+Id|\w+__c)>\s*)@(\w+)(\s*</)").expect("xml reference pattern is valid")
});

fn reference_pattern(content_type: TreeContentType) -> &'static Regex {
    match content_type {
        TreeContentType::Json => &JSON_REFERENCE,
        TreeContentType::Xml => &XML_REFERENCE,
    }
}

/// What to import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    /// Tree files, imported in order with references saved and resolved.
    Files(Vec<PathBuf>),
    /// A plan manifest.
    Plan(PathBuf),
}

/// Import settings.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub source: ImportSource,
    /// Overrides the content type of every file.
    pub content_type: Option<TreeContentType>,
}

impl ImportConfig {
    pub fn files<P: Into<PathBuf>>(files: impl IntoIterator<Item = P>) -> Self {
        Self {
            source: ImportSource::Files(files.into_iter().map(Into::into).collect()),
            content_type: None,
        }
    }

    pub fn plan(path: impl Into<PathBuf>) -> Self {
        Self {
            source: ImportSource::Plan(path.into()),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: TreeContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Build from optional inputs; exactly one of `files` and `plan` must be
    /// given.
    pub fn from_options(
        files: Option<Vec<PathBuf>>,
        plan: Option<PathBuf>,
        content_type: Option<TreeContentType>,
    ) -> Result<Self> {
        let source = match (files, plan) {
            (Some(_), Some(_)) => {
                return Err(Error::new(ErrorKind::InvalidImportSource(
                    "specify either tree files or a plan, not both".to_string(),
                )))
            }
            (Some(files), None) => ImportSource::Files(files),
            (None, Some(plan)) => ImportSource::Plan(plan),
            (None, None) => {
                return Err(Error::new(ErrorKind::InvalidImportSource(
                    "specify tree files or a plan".to_string(),
                )))
            }
        };
        let config = Self {
            source,
            content_type,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let ImportSource::Files(files) = &self.source {
            if files.is_empty() {
                return Err(Error::new(ErrorKind::InvalidImportSource(
                    "no tree files given".to_string(),
                )));
            }
        }
        Ok(())
    }
}

/// One file to post.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ImportJob {
    path: PathBuf,
    /// From the plan part; explicit files use their first record's type.
    sobject: Option<String>,
    save_refs: bool,
    resolve_refs: bool,
    content_type: Option<TreeContentType>,
}

/// Per-run import state.
#[derive(Debug, Default)]
pub struct ImportContext {
    /// Lower-cased reference id to inserted record id.
    ref_map: HashMap<String, String>,
    /// Object type to composite tree endpoint, resolved once per run.
    endpoints: HashMap<String, String>,
    pub result: ImportResult,
}

impl ImportContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_refs(&mut self, refs: &[ResponseRef]) {
        for r in refs {
            self.ref_map
                .insert(r.reference_id.to_ascii_lowercase(), r.id.clone());
        }
    }

    /// Inserted id for a reference id, ignoring case.
    pub fn ref_id(&self, reference_id: &str) -> Option<&str> {
        self.ref_map
            .get(&reference_id.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Composite tree endpoint for `sobject`, asking `client` only the first
    /// time a type is seen.
    pub fn endpoint<C: QueryClient>(&mut self, client: &C, sobject: &str) -> Result<String> {
        if let Some(endpoint) = self.endpoints.get(sobject) {
            return Ok(endpoint.clone());
        }
        let endpoint = client.tree_endpoint(sobject)?;
        self.endpoints.insert(sobject.to_string(), endpoint.clone());
        Ok(endpoint)
    }

    /// Replace `@Ref` placeholders in `content` with saved ids.
    ///
    /// Placeholders with no saved id are left as they are and reported in
    /// `result.errors`. Any placeholder at all while nothing has been saved
    /// is an error.
    pub fn resolve_refs(
        &mut self,
        file: &str,
        content: &str,
        content_type: TreeContentType,
    ) -> Result<String> {
        let pattern = reference_pattern(content_type);

        if self.ref_map.is_empty() {
            return match pattern.captures(content) {
                Some(caps) => Err(Error::new(ErrorKind::NoRefId(caps[2].to_string()))),
                None => Ok(content.to_string()),
            };
        }

        let mut unresolved = Vec::new();
        let resolved = pattern
            .replace_all(content, |caps: &Captures<'_>| {
                match self.ref_map.get(&caps[2].to_ascii_lowercase()) {
                    Some(id) => format!("{}{}{}", &caps[1], id, &caps[3]),
                    None => {
                        unresolved.push(caps[2].to_string());
                        caps[0].to_string()
                    }
                }
            })
            .into_owned();

        for reference in unresolved {
            warn!(file, reference = %reference, "Reference could not be resolved");
            self.result
                .errors
                .push(format!("Unresolved reference @{reference} in {file}"));
        }

        Ok(resolved)
    }
}

/// Content type from the override, else from the file extension.
pub fn content_type_for(
    path: &Path,
    override_type: Option<TreeContentType>,
) -> Result<TreeContentType> {
    if let Some(content_type) = override_type {
        return Ok(content_type);
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") => Ok(TreeContentType::Json),
        Some("xml") => Ok(TreeContentType::Xml),
        _ => Err(Error::new(ErrorKind::InvalidDataImport(format!(
            "{}: content type must be json or xml",
            path.display()
        )))),
    }
}

/// `(referenceId, type)` for every record in a tree body, in document
/// order.
pub fn sobject_types(
    content: &str,
    content_type: TreeContentType,
) -> Result<Vec<(String, String)>> {
    let mut types = Vec::new();
    match content_type {
        TreeContentType::Json => {
            let value: Value = serde_json::from_str(content)?;
            collect_json_types(&value, &mut types);
        }
        TreeContentType::Xml => collect_xml_types(content, &mut types)?,
    }
    Ok(types)
}

/// Whether a tree body holds at least one record.
fn has_records(content: &str, content_type: TreeContentType) -> Result<bool> {
    match content_type {
        TreeContentType::Json => {
            let value: Value = serde_json::from_str(content)?;
            Ok(value
                .get("records")
                .and_then(Value::as_array)
                .is_some_and(|records| !records.is_empty()))
        }
        TreeContentType::Xml => {
            let mut reader = Reader::from_str(content);
            loop {
                match reader.read_event()? {
                    Event::Start(element) | Event::Empty(element)
                        if element.local_name().as_ref() == b"records" =>
                    {
                        return Ok(true)
                    }
                    Event::Eof => return Ok(false),
                    _ => {}
                }
            }
        }
    }
}

fn collect_json_types(value: &Value, types: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            if let Some(attributes) = map.get("attributes") {
                let sobject = attributes.get("type").and_then(Value::as_str);
                let reference_id = attributes.get("referenceId").and_then(Value::as_str);
                if let (Some(sobject), Some(reference_id)) = (sobject, reference_id) {
                    types.push((reference_id.to_string(), sobject.to_string()));
                }
            }
            for (key, nested) in map {
                if key != "attributes" {
                    collect_json_types(nested, types);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_json_types(item, types);
            }
        }
        _ => {}
    }
}

fn collect_xml_types(content: &str, types: &mut Vec<(String, String)>) -> Result<()> {
    let mut reader = Reader::from_str(content);

    loop {
        match reader.read_event()? {
            Event::Start(element) | Event::Empty(element)
                if element.local_name().as_ref() == b"records" =>
            {
                let mut sobject = None;
                let mut reference_id = None;
                for attribute in element.attributes() {
                    let attribute = attribute?;
                    let value = attribute.unescape_value()?.into_owned();
                    match attribute.key.local_name().as_ref() {
                        b"type" => sobject = Some(value),
                        b"referenceId" => reference_id = Some(value),
                        _ => {}
                    }
                }
                if let (Some(sobject), Some(reference_id)) = (sobject, reference_id) {
                    types.push((reference_id, sobject));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(())
}

/// Rewrite `INVALID_FIELD` into a field-level security error naming the
/// field (first quoted token) and object (last word).
fn field_access_error(message: &str) -> Error {
    let field = message.split('\'').nth(1).unwrap_or_default();
    let sobject = message.rsplit(' ').next().unwrap_or_default();
    Error::new(ErrorKind::FieldNotAccessible {
        field: field.to_string(),
        sobject: sobject.to_string(),
    })
}

fn translate_error(err: Error) -> Error {
    match &err.kind {
        ErrorKind::Api {
            error_code,
            message,
        } if error_code == "INVALID_FIELD" => field_access_error(message),
        _ => err,
    }
}

fn tree_errors(file: &str, response: &CompositeTreeResponse) -> Error {
    let invalid_field = response
        .results
        .iter()
        .flat_map(|r| &r.errors)
        .find(|e| e.status_code == "INVALID_FIELD");
    if let Some(error) = invalid_field {
        return field_access_error(&error.message);
    }

    let errors = response
        .results
        .iter()
        .flat_map(|result| {
            result.errors.iter().map(move |e| {
                if e.fields.is_empty() {
                    format!("{}: {}: {}", result.reference_id, e.status_code, e.message)
                } else {
                    format!(
                        "{}: {}: {} [{}]",
                        result.reference_id,
                        e.status_code,
                        e.message,
                        e.fields.join(", ")
                    )
                }
            })
        })
        .collect();

    Error::new(ErrorKind::TreeImport {
        file: file.to_string(),
        errors,
    })
}

async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|err| {
        Error::with_source(ErrorKind::Io(format!("{}: {err}", path.display())), err)
    })
}

async fn load_plan(path: &Path) -> Result<Vec<ImportJob>> {
    let invalid = |message: String| {
        Error::new(ErrorKind::InvalidPlan {
            path: path.display().to_string(),
            message,
        })
    };

    let text = read_file(path).await?;
    let parts: Vec<DataPlanPart> =
        serde_json::from_str(&text).map_err(|err| invalid(err.to_string()))?;
    let base = path.parent().unwrap_or(Path::new(""));

    let mut jobs = Vec::new();
    for part in parts {
        if part.sobject.trim().is_empty() {
            return Err(invalid("plan part has an empty sobject".to_string()));
        }
        if part.files.is_empty() {
            return Err(invalid(format!("plan part for {} lists no files", part.sobject)));
        }

        for file in &part.files {
            let (save_refs, resolve_refs, content_type) = match file {
                PlanFile::Path(_) => (part.save_refs, part.resolve_refs, None),
                PlanFile::Detailed(spec) => (
                    spec.save_refs.unwrap_or(part.save_refs),
                    spec.resolve_refs.unwrap_or(part.resolve_refs),
                    spec.content_type,
                ),
            };
            jobs.push(ImportJob {
                path: base.join(file.path()),
                sobject: Some(part.sobject.clone()),
                save_refs,
                resolve_refs,
                content_type,
            });
        }
    }

    if jobs.is_empty() {
        return Err(invalid("plan lists no files".to_string()));
    }
    Ok(jobs)
}

/// Posts tree files through a [`QueryClient`].
///
/// # Example
///
/// ```rust,ignore
/// use busbar_sf_tree::{ImportConfig, TreeImporter};
///
/// let importer = TreeImporter::new(rest_client);
/// let result = importer
///     .import(&ImportConfig::plan("data/Account-Contact-plan.json"))
///     .await?;
/// for r in &result.response_refs {
///     println!("{} -> {}", r.reference_id, r.id);
/// }
/// ```
#[derive(Debug)]
pub struct TreeImporter<C> {
    client: C,
}

impl<C: QueryClient> TreeImporter<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Import every file of `config`, stopping at the first failure.
    #[instrument(skip(self, config))]
    pub async fn import(&self, config: &ImportConfig) -> Result<ImportResult> {
        config.validate()?;

        let jobs: Vec<ImportJob> = match &config.source {
            ImportSource::Files(files) => files
                .iter()
                .map(|path| ImportJob {
                    path: path.clone(),
                    sobject: None,
                    save_refs: true,
                    resolve_refs: true,
                    content_type: None,
                })
                .collect(),
            ImportSource::Plan(path) => load_plan(path).await?,
        };

        let mut ctx = ImportContext::new();
        for job in &jobs {
            self.import_file(&mut ctx, job, config.content_type).await?;
        }

        info!(
            files = jobs.len(),
            records = ctx.result.response_refs.len(),
            "Import complete"
        );
        Ok(ctx.result)
    }

    async fn import_file(
        &self,
        ctx: &mut ImportContext,
        job: &ImportJob,
        override_type: Option<TreeContentType>,
    ) -> Result<()> {
        let file = job.path.display().to_string();
        let content_type = content_type_for(&job.path, override_type.or(job.content_type))?;

        let content = read_file(&job.path).await?;
        let body = if job.resolve_refs {
            ctx.resolve_refs(&file, &content, content_type)?
        } else {
            content
        };

        let types = sobject_types(&body, content_type)?;
        if types.is_empty() && !has_records(&body, content_type)? {
            warn!(file = %file, "Tree file has no records; skipping");
            return Ok(());
        }
        let sobject = match &job.sobject {
            Some(sobject) => sobject.clone(),
            None => types
                .first()
                .map(|(_, sobject)| sobject.clone())
                .ok_or_else(|| {
                    Error::new(ErrorKind::InvalidDataImport(format!(
                        "{file}: no records with a type and referenceId"
                    )))
                })?,
        };
        ctx.result.sobject_types.extend(types);

        let endpoint = ctx.endpoint(&self.client, &sobject)?;
        debug!(file = %file, endpoint = %endpoint, %content_type, "Posting tree file");

        let response = self
            .client
            .create_tree(&endpoint, body, content_type)
            .await
            .map_err(translate_error)?;

        if response.has_errors {
            return Err(tree_errors(&file, &response));
        }

        let refs: Vec<ResponseRef> = response
            .results
            .into_iter()
            .filter_map(|result| {
                Some(ResponseRef {
                    id: result.id?,
                    reference_id: result.reference_id,
                })
            })
            .collect();

        if job.save_refs {
            ctx.save_refs(&refs);
        }
        debug!(file = %file, records = refs.len(), "Imported tree file");
        ctx.result.response_refs.extend(refs);
        Ok(())
    }
}
