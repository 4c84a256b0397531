//! Identifier validation for values that end up in request paths.
//!
//! Object type names read from tree files and plan manifests are spliced
//! into URLs such as `composite/tree/{sobject}` and
//! `sobjects/{sobject}/describe`; they must be checked first.
//!
//! ```rust
//! use busbar_sf_client::security::soql;
//!
//! assert!(soql::is_safe_sobject_name("Custom_Object__c"));
//! assert!(!soql::is_safe_sobject_name("Account/../../limits"));
//! ```

/// SOQL identifier checks.
pub mod soql {
    /// Validate a field or object API name: a letter followed by letters,
    /// digits or underscores.
    #[must_use]
    pub fn is_safe_field_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {
                chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
            }
            _ => false,
        }
    }

    /// Validate that an SObject name is safe.
    ///
    /// SObject names follow the same rules as field names.
    #[must_use]
    pub fn is_safe_sobject_name(name: &str) -> bool {
        is_safe_field_name(name)
    }
}
