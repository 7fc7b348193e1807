/*
    Reportann (clinical report annotation transcoder)

    Licensed under the GNU General Public License v3
*/

//! The [`TagRegistry`] holds the closed, bidirectional mapping between short
//! inline tag codes (`d`, `TIMEX3`, ...) and the human-readable type names
//! used in standoff output (`Disease`, `TIMEX3`, ...).
//!
//! The default registry covers the annotation scheme of the clinical report
//! corpora this crate was written for; [`TagRegistry::with_tag`] extends it.

use std::collections::HashMap;

use crate::error::AnnError;

/// The default tag code / type name pairs
const DEFAULT_TAGS: &[(&str, &str)] = &[
    ("d", "Disease"),
    ("a", "Anatomical"),
    ("f", "Feature"),
    ("c", "Change"),
    ("p", "Pending"),
    ("TIMEX3", "TIMEX3"),
    ("t-test", "TestTest"),
    ("t-key", "TestKey"),
    ("t-val", "TestVal"),
    ("cc", "ClinicalContext"),
    ("r", "Remedy"),
    ("m-key", "MedicineKey"),
    ("m-val", "MedicineVal"),
];

/// A bidirectional mapping between short tag codes and type names.
#[derive(Debug, Clone)]
pub struct TagRegistry {
    code_to_name: HashMap<String, String>,
    name_to_code: HashMap<String, String>,
}

impl Default for TagRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for (code, name) in DEFAULT_TAGS {
            registry.insert(code, name);
        }
        registry
    }
}

impl TagRegistry {
    /// Returns the default registry for the clinical annotation scheme
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a registry with no tags registered at all
    pub fn empty() -> Self {
        Self {
            code_to_name: HashMap::new(),
            name_to_code: HashMap::new(),
        }
    }

    fn insert(&mut self, code: &str, name: &str) {
        self.code_to_name.insert(code.to_string(), name.to_string());
        self.name_to_code.insert(name.to_string(), code.to_string());
    }

    /// Builder pattern to register an extra tag code / type name pair
    pub fn with_tag(mut self, code: &str, name: &str) -> Self {
        self.insert(code, name);
        self
    }

    /// Resolves a short tag code to its type name. Errors on unregistered codes.
    pub fn name_for(&self, code: &str) -> Result<&str, AnnError> {
        self.code_to_name
            .get(code)
            .map(|s| s.as_str())
            .ok_or_else(|| {
                AnnError::UnknownTagType(code.to_string(), "no type name registered for this code")
            })
    }

    /// Resolves a type name back to its short tag code. Errors on unregistered
    /// names; re-tagging can not proceed without a known code.
    pub fn code_for(&self, name: &str) -> Result<&str, AnnError> {
        self.name_to_code
            .get(name)
            .map(|s| s.as_str())
            .ok_or_else(|| {
                AnnError::UnknownTagType(name.to_string(), "no code registered for this type name")
            })
    }

    /// Resolves a short tag code to its type name, passing unknown codes
    /// through unchanged. This is the tolerant detag-side lookup: an unknown
    /// inline tag is annotation metadata, not a reason to reject a document.
    pub fn name_or_code<'a>(&'a self, code: &'a str) -> &'a str {
        self.code_to_name
            .get(code)
            .map(|s| s.as_str())
            .unwrap_or(code)
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.code_to_name.contains_key(code)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.name_to_code.contains_key(name)
    }

    /// The number of registered tags
    pub fn len(&self) -> usize {
        self.code_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code_to_name.is_empty()
    }
}
