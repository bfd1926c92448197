//! Resource path grammar: `name.type[#tag]*`, parsed with a single linear
//! scan.

use togo_core::hash;

use crate::identity::{ResourceName, ResourceTagGlob, ResourceType};

/// The fully-resolved form of a parsed resource path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    pub name: String,
    pub type_name: String,
    pub tags: Vec<String>,
    pub type_hash: ResourceType,
    pub name_hash: ResourceName,
    pub tag_glob_hash: ResourceTagGlob,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PathError {
    #[error("resource path has no type separator '.'")]
    MissingTypeSeparator,
    #[error("resource path has more than one type separator before the first tag")]
    MultipleTypeSeparators,
    #[error("resource path has an empty name")]
    EmptyName,
    #[error("resource path has an empty type")]
    EmptyType,
    #[error("resource path has a path separator immediately before the type separator")]
    SeparatorBeforeDot,
    #[error("resource path has an empty tag")]
    EmptyTag,
    #[error("resource path has more than 8 tags")]
    TooManyTags,
    #[error("resource path has a duplicate tag (by hash): {0:?}")]
    DuplicateTag(String),
}

const MAX_TAGS: usize = 8;
const PATH_SEPARATORS: &[char] = &['/', '\\'];

/// Parses `path` per the grammar in a single left-to-right scan: tracks the
/// first `.` (failing if a second appears before the first `#`), then
/// materializes each `#`-delimited tag segment.
///
/// # Errors
/// Returns the specific [`PathError`] variant describing the first rule
/// violated.
pub fn parse(path: &str) -> Result<ParsedPath, PathError> {
    let dot_pos = path.find('.').ok_or(PathError::MissingTypeSeparator)?;

    let name = &path[..dot_pos];
    if name.is_empty() {
        return Err(PathError::EmptyName);
    }
    if name.ends_with(PATH_SEPARATORS) {
        return Err(PathError::SeparatorBeforeDot);
    }

    let rest = &path[dot_pos + 1..];
    let (type_name, tag_section) = match rest.find('#') {
        Some(hash_pos) => (&rest[..hash_pos], &rest[hash_pos..]),
        None => (rest, ""),
    };
    if type_name.is_empty() {
        return Err(PathError::EmptyType);
    }
    if type_name.contains('.') {
        return Err(PathError::MultipleTypeSeparators);
    }

    let mut tags: Vec<String> = Vec::new();
    if !tag_section.is_empty() {
        for segment in tag_section[1..].split('#') {
            if segment.is_empty() {
                return Err(PathError::EmptyTag);
            }
            tags.push(segment.to_string());
        }
    }
    if tags.len() > MAX_TAGS {
        return Err(PathError::TooManyTags);
    }

    let mut tag_hashes: Vec<(u32, &str)> = tags.iter().map(|t| (hash::calc32(t.as_bytes()), t.as_str())).collect();
    tag_hashes.sort_unstable_by_key(|(h, _)| *h);
    for window in tag_hashes.windows(2) {
        if window[0].0 == window[1].0 {
            return Err(PathError::DuplicateTag(window[1].1.to_string()));
        }
    }
    let sorted_hashes: Vec<u32> = tag_hashes.iter().map(|(h, _)| *h).collect();

    Ok(ParsedPath {
        name: name.to_string(),
        type_name: type_name.to_string(),
        tags,
        type_hash: ResourceType::of(type_name),
        name_hash: ResourceName::of(name),
        tag_glob_hash: ResourceTagGlob::from_sorted_hashes(&sorted_hashes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_plain_path() {
        let p = parse("hero.mesh").unwrap();
        assert_eq!(p.name, "hero");
        assert_eq!(p.type_name, "mesh");
        assert!(p.tags.is_empty());
    }

    #[test]
    fn parses_tags_and_canonicalises_by_hash_order() {
        let a = parse("hero.mesh#linux#debug").unwrap();
        let b = parse("hero.mesh#debug#linux").unwrap();
        assert_eq!(a.tag_glob_hash, b.tag_glob_hash);
    }

    #[test]
    fn rejects_missing_dot() {
        assert_eq!(parse("hero_mesh"), Err(PathError::MissingTypeSeparator));
    }

    #[test]
    fn rejects_empty_name_or_type() {
        assert_eq!(parse(".mesh"), Err(PathError::EmptyName));
        assert_eq!(parse("hero."), Err(PathError::EmptyType));
    }

    #[test]
    fn a_separator_earlier_in_the_name_is_fine() {
        assert!(parse("dir/hero.mesh").is_ok());
    }

    #[test]
    fn rejects_separator_immediately_before_dot() {
        assert_eq!(parse("dir/.mesh"), Err(PathError::SeparatorBeforeDot));
    }

    #[test]
    fn rejects_second_dot_before_first_tag() {
        assert_eq!(parse("hero.mesh.extra"), Err(PathError::MultipleTypeSeparators));
    }

    #[test]
    fn rejects_too_many_tags() {
        let path = "hero.mesh#a#b#c#d#e#f#g#h#i";
        assert_eq!(parse(path), Err(PathError::TooManyTags));
    }

    #[test]
    fn rejects_duplicate_tags_by_hash() {
        assert_eq!(parse("hero.mesh#linux#linux"), Err(PathError::DuplicateTag("linux".into())));
    }

    #[test]
    fn rejects_empty_tag() {
        assert_eq!(parse("hero.mesh#"), Err(PathError::EmptyTag));
        assert_eq!(parse("hero.mesh#linux#"), Err(PathError::EmptyTag));
    }
}
