//! Indexed container of an element's properties.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{GraphError, Result};
use crate::property::value::Value;
use crate::property::Property;
use crate::visibility::Visibility;

/// An element's properties, indexed by name and unique per
/// (key, name, visibility).
///
/// Two traversal orders exist and are not interchangeable: [`iter`] walks
/// properties in insertion order, while [`value_at`] sorts the values for a
/// (key, name) pair by the value's natural order before indexing.
///
/// [`iter`]: PropertyCollection::iter
/// [`value_at`]: PropertyCollection::value_at
#[derive(Debug, Default)]
pub struct PropertyCollection {
    // Insertion-ordered slots; removal leaves a tombstone so the name index
    // stays valid without renumbering.
    slots: Vec<Option<Property>>,
    by_name: FxHashMap<String, SmallVec<[usize; 2]>>,
    live: usize,
}

impl PropertyCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        PropertyCollection::default()
    }

    /// Number of live properties.
    pub fn len(&self) -> usize {
        self.live
    }

    /// True if no live properties remain.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// All live properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Property> + '_ {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Live properties with the given name, in insertion order.
    pub fn by_name<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Property> + 'a {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|&slot| self.slots[slot].as_ref())
    }

    /// Live properties with the given name, filtered by key when one is
    /// given.
    pub fn by_key_and_name<'a>(
        &'a self,
        key: Option<&'a str>,
        name: &str,
    ) -> impl Iterator<Item = &'a Property> + 'a {
        self.by_name(name)
            .filter(move |property| key.map_or(true, |k| property.key() == k))
    }

    /// The property with exactly this (key, name, visibility), if present.
    pub fn get(&self, key: &str, name: &str, visibility: &Visibility) -> Option<&Property> {
        self.by_name(name)
            .find(|property| property.key() == key && property.visibility() == visibility)
    }

    /// Mutable access to the property with exactly this
    /// (key, name, visibility).
    pub fn get_mut(
        &mut self,
        key: &str,
        name: &str,
        visibility: &Visibility,
    ) -> Option<&mut Property> {
        let slot = self.slot_of(key, name, visibility)?;
        self.slots[slot].as_mut()
    }

    /// Inserts a property. A live property with the same
    /// (key, name, visibility) is an [`GraphError::InvalidMutation`] error;
    /// updates go through [`Property::update_from`] instead.
    pub fn add(&mut self, property: Property) -> Result<()> {
        if self
            .get(property.key(), property.name(), property.visibility())
            .is_some()
        {
            return Err(GraphError::InvalidMutation(format!(
                "duplicate property {}:{}[{}]",
                property.key(),
                property.name(),
                property.visibility()
            )));
        }
        let slot = self.slots.len();
        self.by_name
            .entry(property.name().to_owned())
            .or_default()
            .push(slot);
        self.slots.push(Some(property));
        self.live += 1;
        Ok(())
    }

    /// Removes and returns the property with this identity, if present.
    pub fn remove(&mut self, key: &str, name: &str, visibility: &Visibility) -> Option<Property> {
        let slot = self.slot_of(key, name, visibility)?;
        if let Some(slots) = self.by_name.get_mut(name) {
            slots.retain(|&mut s| s != slot);
            if slots.is_empty() {
                self.by_name.remove(name);
            }
        }
        self.live -= 1;
        self.slots[slot].take()
    }

    /// The `index`-th value for (key, name) after sorting all matching
    /// values by the value's natural order. Returns `None` when out of
    /// range.
    pub fn value_at<'a>(&'a self, key: Option<&'a str>, name: &str, index: usize) -> Option<&'a Value> {
        let mut values: Vec<&Value> = self
            .by_key_and_name(key, name)
            .map(Property::value)
            .collect();
        values.sort();
        values.get(index).copied()
    }

    fn slot_of(&self, key: &str, name: &str, visibility: &Visibility) -> Option<usize> {
        self.by_name.get(name)?.iter().copied().find(|&slot| {
            self.slots[slot]
                .as_ref()
                .is_some_and(|p| p.key() == key && p.visibility() == visibility)
        })
    }
}

impl<'a> IntoIterator for &'a PropertyCollection {
    type Item = &'a Property;
    type IntoIter = Box<dyn Iterator<Item = &'a Property> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(key: &str, name: &str, value: i64, visibility: &str) -> Property {
        Property::new(key, name, value, Visibility::new(visibility), 100).unwrap()
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut collection = PropertyCollection::new();
        collection.add(prop("k1", "b", 1, "")).unwrap();
        collection.add(prop("k1", "a", 2, "")).unwrap();
        collection.add(prop("k2", "b", 3, "")).unwrap();
        let names: Vec<&str> = collection.iter().map(Property::name).collect();
        assert_eq!(names, vec!["b", "a", "b"]);
    }

    #[test]
    fn duplicate_identity_is_rejected() {
        let mut collection = PropertyCollection::new();
        collection.add(prop("k1", "a", 1, "x")).unwrap();
        let err = collection.add(prop("k1", "a", 2, "x")).unwrap_err();
        assert!(matches!(err, GraphError::InvalidMutation(_)));
        // Same (key, name) under a different visibility is a distinct cell.
        collection.add(prop("k1", "a", 2, "y")).unwrap();
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn remove_then_readd_keeps_index_consistent() {
        let mut collection = PropertyCollection::new();
        collection.add(prop("k1", "a", 1, "")).unwrap();
        collection.add(prop("k2", "a", 2, "")).unwrap();
        let removed = collection
            .remove("k1", "a", &Visibility::empty())
            .expect("property removed");
        assert_eq!(removed.value(), &Value::Int(1));
        assert_eq!(collection.len(), 1);
        assert!(collection.get("k1", "a", &Visibility::empty()).is_none());

        collection.add(prop("k1", "a", 3, "")).unwrap();
        let values: Vec<&Value> = collection.by_name("a").map(Property::value).collect();
        assert_eq!(values, vec![&Value::Int(2), &Value::Int(3)]);
    }

    #[test]
    fn value_at_sorts_by_natural_order() {
        let mut collection = PropertyCollection::new();
        collection.add(prop("k1", "n", 30, "")).unwrap();
        collection.add(prop("k2", "n", 10, "")).unwrap();
        collection.add(prop("k3", "n", 20, "")).unwrap();
        assert_eq!(collection.value_at(None, "n", 0), Some(&Value::Int(10)));
        assert_eq!(collection.value_at(None, "n", 1), Some(&Value::Int(20)));
        assert_eq!(collection.value_at(None, "n", 2), Some(&Value::Int(30)));
        assert_eq!(collection.value_at(None, "n", 3), None);
    }

    #[test]
    fn value_at_filters_by_key() {
        let mut collection = PropertyCollection::new();
        collection.add(prop("k1", "n", 30, "")).unwrap();
        collection.add(prop("k2", "n", 10, "")).unwrap();
        assert_eq!(
            collection.value_at(Some("k1"), "n", 0),
            Some(&Value::Int(30))
        );
        assert_eq!(collection.value_at(Some("k1"), "n", 1), None);
    }
}
