//! Entity attribute map.

use crate::model::term::Term;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{BTreeMap, Iter};

/// Key-ordered attribute set persisted as one value per entity.
///
/// Saving replaces the stored map as a whole, so removed keys disappear from
/// storage as well.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, Term>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for literals.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Term>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Term> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Term> {
        self.0.get_mut(name)
    }

    /// Sets one attribute, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Term>) -> Option<Term> {
        self.0.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Term> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, String, Term> {
        self.0.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, Term> {
        self.0
    }
}

impl From<BTreeMap<String, Term>> for Attributes {
    fn from(value: BTreeMap<String, Term>) -> Self {
        Self(value)
    }
}

impl<K: Into<String>, V: Into<Term>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = (&'a String, &'a Term);
    type IntoIter = Iter<'a, String, Term>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::Attributes;
    use crate::model::term::Term;

    #[test]
    fn set_and_remove_track_previous_values() {
        let mut attributes = Attributes::new().with("a", 1);
        assert_eq!(attributes.set("a", 2), Some(Term::Int(1)));
        assert_eq!(attributes.remove("a"), Some(Term::Int(2)));
        assert!(attributes.is_empty());
    }

    #[test]
    fn iteration_is_key_ordered() {
        let attributes: Attributes = [("b", 2), ("a", 1)].into_iter().collect();
        let names = attributes.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["a", "b"]);
    }
}
