//! The KVS node: a tagged union of null/int/dec/bool/string/vecN/array/node,
//! each carrying an optional name and its FNV-1a 64-bit hash.

use togo_core::hash;

/// A single KVS node. The root of any tree is always a [`Kind::Node`].
#[derive(Debug, Clone, PartialEq)]
pub struct Kvs {
    name: Option<String>,
    name_hash: u64,
    value: Kind,
}

/// The payload a [`Kvs`] node carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Null,
    Int(i64),
    Dec(f64),
    Bool(bool),
    String(String),
    Vec1([f32; 1]),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Array(Vec<Kvs>),
    Node(Vec<Kvs>),
}

impl Kvs {
    /// A named node with the given value; the hash is computed from `name`.
    #[must_use]
    pub fn named(name: impl Into<String>, value: Kind) -> Self {
        let name = name.into();
        let name_hash = hash::calc64(name.as_bytes());
        Self {
            name: Some(name),
            name_hash,
            value,
        }
    }

    /// An unnamed node (used for array elements), hash `0`.
    #[must_use]
    pub const fn unnamed(value: Kind) -> Self {
        Self {
            name: None,
            name_hash: 0,
            value,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub const fn name_hash(&self) -> u64 {
        self.name_hash
    }

    #[must_use]
    pub const fn kind(&self) -> &Kind {
        &self.value
    }

    /// Replaces this node's value, clearing whatever it previously owned.
    pub fn set(&mut self, value: Kind) {
        self.value = value;
    }

    /// Scans `self`'s children (valid on [`Kind::Array`]/[`Kind::Node`]) for
    /// the first child whose name hash matches. Duplicate names are
    /// permitted; the first match wins.
    #[must_use]
    pub fn find(&self, name_hash: u64) -> Option<&Self> {
        self.children()?.iter().find(|c| c.name_hash == name_hash)
    }

    #[must_use]
    pub fn find_mut(&mut self, name_hash: u64) -> Option<&mut Self> {
        self.children_mut()?
            .iter_mut()
            .find(|c| c.name_hash == name_hash)
    }

    /// Convenience over [`Kvs::find`] hashing `name` for the caller.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Self> {
        self.find(hash::calc64(name.as_bytes()))
    }

    #[must_use]
    pub fn children(&self) -> Option<&[Self]> {
        match &self.value {
            Kind::Array(c) | Kind::Node(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn children_mut(&mut self) -> Option<&mut Vec<Self>> {
        match &mut self.value {
            Kind::Array(c) | Kind::Node(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match &self.value {
            Kind::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match &self.value {
            Kind::Dec(v) => Some(*v),
            Kind::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match &self.value {
            Kind::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Kind::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Typed lookup combining [`Kvs::get`] with an accessor, matching the
    /// ergonomics of a `get::<T>(name)`-style config accessor without
    /// requiring `T: Deserialize` (the KVS tree is not a serde format).
    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Self::as_i64)
    }

    #[must_use]
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Self::as_f64)
    }

    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Self::as_bool)
    }

    #[must_use]
    pub fn get_str<'a>(&'a self, name: &str) -> Option<&'a str> {
        self.get(name).and_then(Self::as_str)
    }

    /// `get`, falling back to `default` when absent or of the wrong kind.
    #[must_use]
    pub fn get_i64_or(&self, name: &str, default: i64) -> i64 {
        self.get_i64(name).unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_returns_first_duplicate() {
        let root = Kvs::named(
            "root",
            Kind::Node(vec![
                Kvs::named("x", Kind::Int(1)),
                Kvs::named("x", Kind::Int(2)),
            ]),
        );
        assert_eq!(root.get("x").and_then(Kvs::as_i64), Some(1));
    }

    #[test]
    fn structural_equality_ignores_nothing() {
        let a = Kvs::named("a", Kind::Int(1));
        let b = Kvs::named("a", Kind::Int(1));
        let c = Kvs::named("a", Kind::Int(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn set_replaces_value() {
        let mut node = Kvs::named("a", Kind::Array(vec![Kvs::unnamed(Kind::Int(1))]));
        node.set(Kind::Null);
        assert_eq!(node.kind(), &Kind::Null);
    }
}
