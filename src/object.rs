//! Shared read contract for authorization-gated property holders.

use crate::error::Result;
use crate::fetch_hints::FetchHints;
use crate::property::{Property, Value};
use crate::visibility::Visibility;

/// Boxed lazy property stream borrowed from a [`GraphObject`].
pub type PropertyIter<'a> = Box<dyn Iterator<Item = &'a Property> + 'a>;

/// Read contract shared by every authorization-gated property holder.
///
/// [`properties`] is the only required property primitive; every derived
/// accessor below is a lazy filter over it and materializes nothing —
/// except the indexed value accessors, which collect the matching values
/// and sort them by the value's natural order before indexing. Requesting
/// "the i-th value" therefore yields a value-ordered view, not an
/// insertion-ordered one, no matter how the values were added.
///
/// [`properties`]: GraphObject::properties
pub trait GraphObject {
    /// Object id.
    fn id(&self) -> &str;

    /// The fetch hints this object was loaded with.
    fn fetch_hints(&self) -> &FetchHints;

    /// All readable properties in insertion order. Gated by the property
    /// fetch hint.
    fn properties(&self) -> Result<PropertyIter<'_>>;

    /// Properties with the given name, in insertion order.
    fn properties_with_name<'a>(&'a self, name: &'a str) -> Result<PropertyIter<'a>> {
        Ok(Box::new(
            self.properties()?.filter(move |p| p.name() == name),
        ))
    }

    /// Properties with the given name, filtered by key when one is given.
    fn properties_with_key_and_name<'a>(
        &'a self,
        key: Option<&'a str>,
        name: &'a str,
    ) -> Result<PropertyIter<'a>> {
        Ok(Box::new(
            self.properties_with_name(name)?
                .filter(move |p| key.map_or(true, |k| p.key() == k)),
        ))
    }

    /// First property with the given name, assuming a single-valued
    /// property.
    fn property<'a>(&'a self, name: &'a str) -> Result<Option<&'a Property>> {
        Ok(self.properties_with_name(name)?.next())
    }

    /// First property matching key, name, and (when given) an exact
    /// visibility. No visibility hierarchy is consulted.
    fn property_with<'a>(
        &'a self,
        key: Option<&'a str>,
        name: &'a str,
        visibility: Option<&Visibility>,
    ) -> Result<Option<&'a Property>> {
        Ok(self
            .properties_with_key_and_name(key, name)?
            .find(|p| visibility.map_or(true, |v| p.visibility() == v)))
    }

    /// Values of the properties matching key and name, in insertion order.
    fn property_values<'a>(
        &'a self,
        key: Option<&'a str>,
        name: &'a str,
    ) -> Result<Box<dyn Iterator<Item = &'a Value> + 'a>> {
        Ok(Box::new(
            self.properties_with_key_and_name(key, name)?
                .map(Property::value),
        ))
    }

    /// The `index`-th value for (key, name) in the value's natural order.
    /// `None` when out of range.
    fn property_value_at<'a>(
        &'a self,
        key: Option<&'a str>,
        name: &'a str,
        index: usize,
    ) -> Result<Option<&'a Value>> {
        let mut values: Vec<&Value> = self.property_values(key, name)?.collect();
        values.sort();
        Ok(values.get(index).copied())
    }

    /// First value for `name` in the value-ordered view.
    fn property_value<'a>(&'a self, name: &'a str) -> Result<Option<&'a Value>> {
        self.property_value_at(None, name, 0)
    }

    /// Names of all readable properties, repeated per value.
    fn property_names(&self) -> Result<Box<dyn Iterator<Item = &str> + '_>> {
        Ok(Box::new(self.properties()?.map(Property::name)))
    }
}
