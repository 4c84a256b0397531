//! In-memory `QueryClient` and describe fixtures for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use busbar_sf_rest::{
    CompositeTreeResponse, CompositeTreeResult, DescribeSObjectResult, QueryResult,
    TreeContentType,
};
use serde_json::{json, Value};

use crate::client::QueryClient;
use crate::error::{Error, ErrorKind, Result};
use crate::types::BasicRecord;

/// A recorded `create_tree` call.
#[derive(Debug, Clone)]
pub struct TreePost {
    pub endpoint: String,
    pub sobject: String,
    pub body: String,
    pub content_type: TreeContentType,
}

#[derive(Default)]
pub struct MockClient {
    records: Vec<BasicRecord>,
    describes: HashMap<String, DescribeSObjectResult>,
    tree_responses: Mutex<VecDeque<Result<CompositeTreeResponse>>>,
    pub queries: Mutex<Vec<String>>,
    pub describe_calls: Mutex<Vec<String>>,
    pub endpoint_calls: Mutex<Vec<String>>,
    pub posts: Mutex<Vec<TreePost>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(mut self, records: Value) -> Self {
        self.records = serde_json::from_value(records).expect("valid records fixture");
        self
    }

    pub fn with_describe(mut self, describe: Value) -> Self {
        let describe: DescribeSObjectResult =
            serde_json::from_value(describe).expect("valid describe fixture");
        self.describes.insert(describe.name.clone(), describe);
        self
    }

    /// Queue a response for the next `create_tree` call. Without one, every
    /// record in the posted body is answered with a generated id.
    pub fn with_tree_response(self, response: Result<CompositeTreeResponse>) -> Self {
        self.tree_responses
            .lock()
            .expect("lock")
            .push_back(response);
        self
    }

    pub fn posts(&self) -> Vec<TreePost> {
        self.posts.lock().expect("lock").clone()
    }
}

impl QueryClient for MockClient {
    async fn query(&self, soql: &str) -> Result<QueryResult<BasicRecord>> {
        self.queries.lock().expect("lock").push(soql.to_string());
        Ok(QueryResult {
            total_size: self.records.len() as u64,
            done: true,
            next_records_url: None,
            records: self.records.clone(),
        })
    }

    async fn describe(&self, sobject: &str) -> Result<DescribeSObjectResult> {
        self.describe_calls
            .lock()
            .expect("lock")
            .push(sobject.to_string());
        self.describes.get(sobject).cloned().ok_or_else(|| {
            Error::new(ErrorKind::Api {
                error_code: "NOT_FOUND".to_string(),
                message: format!("no describe for {sobject}"),
            })
        })
    }

    fn tree_endpoint(&self, sobject: &str) -> Result<String> {
        self.endpoint_calls
            .lock()
            .expect("lock")
            .push(sobject.to_string());
        Ok(format!("/services/data/v62.0/composite/tree/{sobject}"))
    }

    async fn create_tree(
        &self,
        endpoint: &str,
        body: String,
        content_type: TreeContentType,
    ) -> Result<CompositeTreeResponse> {
        let sobject = endpoint.rsplit('/').next().unwrap_or_default();
        self.posts.lock().expect("lock").push(TreePost {
            endpoint: endpoint.to_string(),
            sobject: sobject.to_string(),
            body: body.clone(),
            content_type,
        });

        if let Some(response) = self.tree_responses.lock().expect("lock").pop_front() {
            return response;
        }

        let count = self.posts.lock().expect("lock").len();
        let results = reference_ids(&body)
            .into_iter()
            .enumerate()
            .map(|(i, reference_id)| CompositeTreeResult {
                id: Some(format!("{}{count:02}{i:03}", &sobject[..3.min(sobject.len())])),
                reference_id,
                errors: Vec::new(),
            })
            .collect();
        Ok(CompositeTreeResponse {
            has_errors: false,
            results,
        })
    }
}

fn reference_ids(body: &str) -> Vec<String> {
    let pattern = regex_lite::Regex::new(r#"referenceId"?\s*[:=]\s*"([^"]+)""#).expect("valid");
    pattern
        .captures_iter(body)
        .map(|caps| caps[1].to_string())
        .collect()
}

pub fn account_describe() -> Value {
    json!({
        "name": "Account",
        "fields": [
            {"name": "Id", "type": "id"},
            {"name": "Name", "type": "string"},
            {"name": "ParentId", "type": "reference", "referenceTo": ["Account"]}
        ],
        "childRelationships": [
            {"childSObject": "Account", "field": "ParentId", "relationshipName": "ChildAccounts"},
            {"childSObject": "Case", "field": "AccountId", "relationshipName": "Cases"},
            {"childSObject": "Contact", "field": "AccountId", "relationshipName": "Contacts"}
        ]
    })
}

pub fn contact_describe() -> Value {
    json!({
        "name": "Contact",
        "fields": [
            {"name": "Id", "type": "id"},
            {"name": "LastName", "type": "string"},
            {"name": "AccountId", "type": "reference", "referenceTo": ["Account"]},
            {"name": "ReportsToId", "type": "reference", "referenceTo": ["Contact"]}
        ],
        "childRelationships": [
            {"childSObject": "Case", "field": "ContactId", "relationshipName": "Cases"}
        ]
    })
}

pub fn case_describe() -> Value {
    json!({
        "name": "Case",
        "fields": [
            {"name": "Id", "type": "id"},
            {"name": "Status", "type": "picklist"},
            {"name": "AccountId", "type": "reference", "referenceTo": ["Account"]},
            {"name": "ContactId", "type": "reference", "referenceTo": ["Contact"]}
        ],
        "childRelationships": []
    })
}

/// Two accounts; the first has one case and one contact, the second has
/// no children.
pub fn accounts_with_children() -> Value {
    json!([
        {
            "attributes": {"type": "Account", "url": "/services/data/v62.0/sobjects/Account/001A"},
            "Name": "Acme",
            "Cases": {
                "totalSize": 1,
                "done": true,
                "records": [{
                    "attributes": {"type": "Case", "url": "/services/data/v62.0/sobjects/Case/500A"},
                    "Status": "New"
                }]
            },
            "Contacts": {
                "totalSize": 1,
                "done": true,
                "records": [{
                    "attributes": {"type": "Contact", "url": "/services/data/v62.0/sobjects/Contact/003A"},
                    "LastName": "Smith"
                }]
            }
        },
        {
            "attributes": {"type": "Account", "url": "/services/data/v62.0/sobjects/Account/001B"},
            "Name": "Globex",
            "Cases": null,
            "Contacts": null
        }
    ])
}
