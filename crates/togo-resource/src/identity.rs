//! Resource identity hashes: newtypes over `togo_core::hash` so a `u32`
//! type hash and a `u64` name hash are never accidentally swapped.

use togo_core::hash;

macro_rules! hash_newtype {
    ($name:ident, $width:ty, $calc:path) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub $width);

        impl $name {
            #[must_use]
            pub fn of(s: &str) -> Self {
                Self($calc(s.as_bytes()))
            }

            #[must_use]
            pub const fn raw(self) -> $width {
                self.0
            }
        }

        impl From<$width> for $name {
            fn from(v: $width) -> Self {
                Self(v)
            }
        }
    };
}

hash_newtype!(ResourceType, u32, hash::calc32);
hash_newtype!(ResourceName, u64, hash::calc64);
hash_newtype!(PackageName, u32, hash::calc32);

/// `hash64`, obtained by feeding the sorted list of tag name hashes (each a
/// 32-bit hash) into a 64-bit FNV combiner. Sorting first means the literal
/// form `a#b` and `b#a` of a path produce the same glob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceTagGlob(pub u64);

impl ResourceTagGlob {
    #[must_use]
    pub fn identity() -> Self {
        Self(hash::identity64())
    }

    /// Computes the glob from tag name strings; sorts a copy by their
    /// 32-bit hash before folding.
    #[must_use]
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        let mut hashes: Vec<u32> = tags.iter().map(|t| hash::calc32(t.as_ref().as_bytes())).collect();
        hashes.sort_unstable();
        Self::from_sorted_hashes(&hashes)
    }

    /// Computes the glob directly from already-sorted tag hashes, matching
    /// the runtime form produced while resolving a parsed path.
    #[must_use]
    pub fn from_sorted_hashes(sorted_hashes: &[u32]) -> Self {
        let mut h = hash::Hasher64::new();
        for tag in sorted_hashes {
            h.write(&tag.to_le_bytes());
        }
        Self(h.finish())
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_glob_is_order_insensitive() {
        let a = ResourceTagGlob::from_tags(&["linux", "debug"]);
        let b = ResourceTagGlob::from_tags(&["debug", "linux"]);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_tag_list_is_identity() {
        let empty: &[&str] = &[];
        assert_eq!(ResourceTagGlob::from_tags(empty), ResourceTagGlob::identity());
    }

    #[test]
    fn resource_type_and_name_use_distinct_widths() {
        let t = ResourceType::of("render_config");
        let n = ResourceName::of("render_config");
        assert_eq!(t.raw(), hash::calc32(b"render_config"));
        assert_eq!(n.raw(), hash::calc64(b"render_config"));
    }
}
