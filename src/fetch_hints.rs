//! Capability hints fixed when an element is loaded.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{GraphError, Result};

/// The capability set describing which projections a loaded element is
/// allowed to expose.
///
/// Hints are fixed at load time and never mutated afterwards. Every read
/// accessor that depends on a capability asserts it first and fails with
/// [`GraphError::MissingFetchHint`] instead of silently returning a partial
/// or empty result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchHints {
    include_all_properties: bool,
    property_names_to_include: Option<BTreeSet<String>>,
    include_all_property_metadata: bool,
    metadata_keys_to_include: Option<BTreeSet<String>>,
    include_hidden: bool,
    include_extended_data_table_names: bool,
}

impl FetchHints {
    /// Hints granting every capability.
    pub fn all() -> Self {
        FetchHints {
            include_all_properties: true,
            property_names_to_include: None,
            include_all_property_metadata: true,
            metadata_keys_to_include: None,
            include_hidden: true,
            include_extended_data_table_names: true,
        }
    }

    /// Hints granting no capability beyond element identity.
    pub fn none() -> Self {
        FetchHints {
            include_all_properties: false,
            property_names_to_include: None,
            include_all_property_metadata: false,
            metadata_keys_to_include: None,
            include_hidden: false,
            include_extended_data_table_names: false,
        }
    }

    /// Starts building a custom hint set, from [`FetchHints::none`].
    pub fn builder() -> FetchHintsBuilder {
        FetchHintsBuilder::default()
    }

    /// True if any property projection was requested.
    pub fn is_include_properties(&self) -> bool {
        self.include_all_properties || self.property_names_to_include.is_some()
    }

    /// True if the named property was requested, either by the blanket flag
    /// or by the name inclusion policy.
    pub fn is_property_included(&self, name: &str) -> bool {
        if self.include_all_properties {
            return true;
        }
        self.property_names_to_include
            .as_ref()
            .is_some_and(|names| names.contains(name))
    }

    /// True if any property metadata projection was requested.
    pub fn is_include_property_metadata(&self) -> bool {
        self.include_all_property_metadata || self.metadata_keys_to_include.is_some()
    }

    /// True if the named metadata key was requested.
    pub fn is_metadata_key_included(&self, key: &str) -> bool {
        if self.include_all_property_metadata {
            return true;
        }
        self.metadata_keys_to_include
            .as_ref()
            .is_some_and(|keys| keys.contains(key))
    }

    /// True if hidden markers were requested.
    pub fn is_include_hidden(&self) -> bool {
        self.include_hidden
    }

    /// True if the extended-data table-name set was requested.
    pub fn is_include_extended_data_table_names(&self) -> bool {
        self.include_extended_data_table_names
    }

    /// Fails unless the named property was requested.
    pub fn assert_property_included(&self, name: &str) -> Result<()> {
        if self.is_property_included(name) {
            return Ok(());
        }
        Err(self.missing(format!("property:{name}")))
    }

    /// Fails unless the named metadata key was requested.
    pub fn assert_metadata_key_included(&self, key: &str) -> Result<()> {
        if self.is_metadata_key_included(key) {
            return Ok(());
        }
        Err(self.missing(format!("metadata:{key}")))
    }

    pub(crate) fn missing(&self, hint: impl Into<String>) -> GraphError {
        GraphError::MissingFetchHint {
            fetch_hints: self.clone(),
            hint: hint.into(),
        }
    }
}

impl Default for FetchHints {
    fn default() -> Self {
        FetchHints::all()
    }
}

impl fmt::Display for FetchHints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn policy(f: &mut fmt::Formatter<'_>, all: bool, names: &Option<BTreeSet<String>>) -> fmt::Result {
            match (all, names) {
                (true, _) => write!(f, "all"),
                (false, Some(names)) => {
                    let names: Vec<&str> = names.iter().map(String::as_str).collect();
                    write!(f, "[{}]", names.join(","))
                }
                (false, None) => write!(f, "none"),
            }
        }
        write!(f, "FetchHints(properties=")?;
        policy(f, self.include_all_properties, &self.property_names_to_include)?;
        write!(f, ", metadata=")?;
        policy(
            f,
            self.include_all_property_metadata,
            &self.metadata_keys_to_include,
        )?;
        write!(
            f,
            ", hidden={}, extendedDataTableNames={})",
            self.include_hidden, self.include_extended_data_table_names
        )
    }
}

/// Builder for [`FetchHints`]. Starts from [`FetchHints::none`].
#[derive(Clone, Debug, Default)]
pub struct FetchHintsBuilder {
    include_all_properties: bool,
    property_names_to_include: Option<BTreeSet<String>>,
    include_all_property_metadata: bool,
    metadata_keys_to_include: Option<BTreeSet<String>>,
    include_hidden: bool,
    include_extended_data_table_names: bool,
}

impl FetchHintsBuilder {
    /// Requests every property.
    pub fn include_all_properties(mut self, on: bool) -> Self {
        self.include_all_properties = on;
        self
    }

    /// Requests only the named properties.
    pub fn property_names_to_include<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.property_names_to_include = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Requests all property metadata.
    pub fn include_all_property_metadata(mut self, on: bool) -> Self {
        self.include_all_property_metadata = on;
        self
    }

    /// Requests only the named metadata keys.
    pub fn metadata_keys_to_include<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata_keys_to_include = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Requests hidden markers.
    pub fn include_hidden(mut self, on: bool) -> Self {
        self.include_hidden = on;
        self
    }

    /// Requests the extended-data table-name set.
    pub fn include_extended_data_table_names(mut self, on: bool) -> Self {
        self.include_extended_data_table_names = on;
        self
    }

    /// Freezes the hint set.
    pub fn build(self) -> FetchHints {
        FetchHints {
            include_all_properties: self.include_all_properties,
            property_names_to_include: self.property_names_to_include,
            include_all_property_metadata: self.include_all_property_metadata,
            metadata_keys_to_include: self.metadata_keys_to_include,
            include_hidden: self.include_hidden,
            include_extended_data_table_names: self.include_extended_data_table_names,
        }
    }
}
