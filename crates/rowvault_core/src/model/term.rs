//! Dynamic structured value.
//!
//! `Term` covers what the object layer needs to store without a fixed Rust
//! type: scalars, byte strings, ordered lists and key-ordered maps, nested
//! freely. Typed values can bypass it and go through the codec directly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Self-describing value stored in entity attributes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Term {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Term>),
    /// Keys iterate in sorted order, so equal maps encode identically.
    Map(BTreeMap<String, Term>),
}

impl Term {
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(value) => Some(value.as_slice()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Term]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Term>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl From<bool> for Term {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Term {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Term {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Term {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Term {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<u8>> for Term {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<Term>> for Term {
    fn from(value: Vec<Term>) -> Self {
        Self::List(value)
    }
}

impl From<BTreeMap<String, Term>> for Term {
    fn from(value: BTreeMap<String, Term>) -> Self {
        Self::Map(value)
    }
}

#[cfg(test)]
mod tests {
    use super::Term;

    #[test]
    fn accessors_match_only_their_variant() {
        assert_eq!(Term::from(3).as_int(), Some(3));
        assert_eq!(Term::from(3).as_str(), None);
        assert_eq!(Term::from("x").as_str(), Some("x"));
        assert_eq!(Term::from(vec![1_u8, 2]).as_bytes(), Some(&[1_u8, 2][..]));
        assert!(Term::default().is_nil());
    }
}
