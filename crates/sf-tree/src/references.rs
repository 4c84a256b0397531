//! Source record id to symbolic reference id mapping.

use std::collections::HashMap;

use crate::error::{Error, ErrorKind, Result};
use crate::types::RecordAttributes;

/// Per-run map of `(type, source id) -> reference id` plus the per-type
/// counters that number references in first-visit order.
#[derive(Debug, Default)]
pub struct ReferenceRegistry {
    refs_by_type: HashMap<String, HashMap<String, String>>,
    counters: HashMap<String, usize>,
}

impl ReferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next `<Type>Ref<N>` for `sobject`, starting at 1.
    pub fn next_reference_id(&mut self, sobject: &str) -> String {
        let counter = self.counters.entry(sobject.to_string()).or_default();
        *counter += 1;
        format!("{sobject}Ref{counter}")
    }

    /// Remember which reference id stands for the record at
    /// `attributes.url`.
    ///
    /// Saving the same pair again is a no-op. Records without a url carry
    /// no source id and are skipped.
    pub fn save_record_ref(
        &mut self,
        attributes: &RecordAttributes,
        reference_id: &str,
    ) -> Result<()> {
        let Some(id) = attributes.source_id() else {
            return Ok(());
        };

        let refs = self
            .refs_by_type
            .entry(attributes.sobject_type.clone())
            .or_default();

        match refs.get(id) {
            Some(existing) if existing == reference_id => Ok(()),
            Some(existing) => Err(Error::new(ErrorKind::OverridingReference {
                sobject: attributes.sobject_type.clone(),
                id: id.to_string(),
                existing: existing.clone(),
                reference_id: reference_id.to_string(),
            })),
            None => {
                refs.insert(id.to_string(), reference_id.to_string());
                Ok(())
            }
        }
    }

    pub fn lookup(&self, sobject: &str, id: &str) -> Option<&str> {
        self.refs_by_type
            .get(sobject)
            .and_then(|refs| refs.get(id))
            .map(String::as_str)
    }

    /// Find `id` under any type, for lookups whose target type is not the
    /// one the field describes first. Returns `(type, reference id)`.
    pub fn find(&self, id: &str) -> Option<(&str, &str)> {
        self.refs_by_type.iter().find_map(|(sobject, refs)| {
            refs.get(id)
                .map(|reference_id| (sobject.as_str(), reference_id.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(sobject: &str, id: &str) -> RecordAttributes {
        RecordAttributes {
            sobject_type: sobject.to_string(),
            url: Some(format!("/services/data/v62.0/sobjects/{sobject}/{id}")),
        }
    }

    #[test]
    fn test_reference_ids_count_per_type() {
        let mut registry = ReferenceRegistry::new();
        assert_eq!(registry.next_reference_id("Account"), "AccountRef1");
        assert_eq!(registry.next_reference_id("Contact"), "ContactRef1");
        assert_eq!(registry.next_reference_id("Account"), "AccountRef2");
    }

    #[test]
    fn test_save_and_lookup() {
        let mut registry = ReferenceRegistry::new();
        registry
            .save_record_ref(&attrs("Account", "001A"), "AccountRef1")
            .unwrap();

        assert_eq!(registry.lookup("Account", "001A"), Some("AccountRef1"));
        assert_eq!(registry.lookup("Contact", "001A"), None);
        assert_eq!(registry.find("001A"), Some(("Account", "AccountRef1")));
    }

    #[test]
    fn test_resaving_same_reference_is_noop() {
        let mut registry = ReferenceRegistry::new();
        let account = attrs("Account", "001A");
        registry.save_record_ref(&account, "AccountRef1").unwrap();
        registry.save_record_ref(&account, "AccountRef1").unwrap();
        assert_eq!(registry.lookup("Account", "001A"), Some("AccountRef1"));
    }

    #[test]
    fn test_different_reference_for_same_record_fails() {
        let mut registry = ReferenceRegistry::new();
        let account = attrs("Account", "001A");
        registry.save_record_ref(&account, "AccountRef1").unwrap();

        let err = registry
            .save_record_ref(&account, "AccountRef2")
            .unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::OverridingReference { ref existing, ref reference_id, .. }
                if existing == "AccountRef1" && reference_id == "AccountRef2"
        ));
    }

    #[test]
    fn test_record_without_url_is_skipped() {
        let mut registry = ReferenceRegistry::new();
        let attributes = RecordAttributes {
            sobject_type: "Account".to_string(),
            url: None,
        };
        registry.save_record_ref(&attributes, "AccountRef1").unwrap();
        assert!(registry.find("AccountRef1").is_none());
    }
}
