//! Describe types.
//!
//! Only the parts of `/sobjects/{type}/describe` that matter for walking
//! record graphs are modelled; unknown keys are ignored.

use serde::{Deserialize, Serialize};

/// SObject describe result.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DescribeSObjectResult {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub createable: bool,
    #[serde(default)]
    pub fields: Vec<FieldDescribe>,
    #[serde(rename = "childRelationships", default)]
    pub child_relationships: Vec<ChildRelationship>,
}

/// Child relationship metadata for an SObject.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChildRelationship {
    #[serde(rename = "childSObject")]
    pub child_sobject: String,
    /// Lookup field on the child pointing back at the parent (e.g. `AccountId`).
    #[serde(default)]
    pub field: Option<String>,
    #[serde(rename = "relationshipName")]
    pub relationship_name: Option<String>,
}

/// Field metadata.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldDescribe {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub createable: bool,
    #[serde(default)]
    pub nillable: bool,
    #[serde(rename = "referenceTo", default)]
    pub reference_to: Option<Vec<String>>,
    #[serde(rename = "relationshipName")]
    pub relationship_name: Option<String>,
}

impl FieldDescribe {
    /// True for lookup and master-detail fields.
    pub fn is_reference(&self) -> bool {
        self.field_type == "reference"
    }

    /// Target object types, in describe order.
    pub fn reference_targets(&self) -> &[String] {
        self.reference_to.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_sobject_deser_ignores_unknown_keys() {
        let json = r#"{
            "name": "Contact",
            "label": "Contact",
            "custom": false,
            "keyPrefix": "003",
            "fields": [
                {"name": "Id", "label": "Contact ID", "type": "id"},
                {"name": "AccountId", "label": "Account ID", "type": "reference",
                 "referenceTo": ["Account"], "relationshipName": "Account"},
                {"name": "LastName", "type": "string", "length": 80}
            ],
            "childRelationships": [
                {"childSObject": "Case", "field": "ContactId", "relationshipName": "Cases",
                 "cascadeDelete": false}
            ]
        }"#;

        let describe: DescribeSObjectResult = serde_json::from_str(json).unwrap();
        assert_eq!(describe.name, "Contact");
        assert_eq!(describe.fields.len(), 3);
        assert!(describe.fields[1].is_reference());
        assert_eq!(describe.fields[1].reference_targets(), ["Account".to_string()]);
        assert!(!describe.fields[2].is_reference());
        assert!(describe.fields[2].reference_targets().is_empty());
        assert_eq!(describe.child_relationships[0].field.as_deref(), Some("ContactId"));
        assert_eq!(
            describe.child_relationships[0].relationship_name.as_deref(),
            Some("Cases")
        );
    }

    #[test]
    fn test_child_relationship_without_name() {
        let json = r#"{"childSObject": "AccountHistory", "field": "AccountId", "relationshipName": null}"#;
        let rel: ChildRelationship = serde_json::from_str(json).unwrap();
        assert!(rel.relationship_name.is_none());
    }
}
