//! GameplayTagSet - immutable tag collection for static data

use crate::tag::{GameplayTag, TagError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An immutable set of unique tags, e.g. an ability's required tags.
///
/// Queries follow vacuous truth: `has_all_tags`/`has_any_tags` with an empty
/// query return true, so "no requirement" is the default.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct GameplayTagSet {
    /// Sorted, deduplicated
    tags: Vec<GameplayTag>,
}

impl GameplayTagSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from tag names
    pub fn from_names<I, S>(names: I) -> Result<Self, TagError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| GameplayTag::new(name.as_ref()))
            .collect()
    }

    /// Add a tag (builder style)
    pub fn with_tag(self, tag: GameplayTag) -> Self {
        self.tags.into_iter().chain(std::iter::once(tag)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameplayTag> {
        self.tags.iter()
    }

    /// First tag in name order
    pub fn first(&self) -> Option<&GameplayTag> {
        self.tags.first()
    }

    /// Membership
    pub fn has_tag(&self, tag: &GameplayTag) -> bool {
        self.tags.binary_search(tag).is_ok()
    }

    /// True if any tag of `other` is in this set (true when `other` is empty)
    pub fn has_any_tags(&self, other: &GameplayTagSet) -> bool {
        other.is_empty() || other.iter().any(|tag| self.has_tag(tag))
    }

    /// True if every tag of `other` is in this set
    pub fn has_all_tags(&self, other: &GameplayTagSet) -> bool {
        other.iter().all(|tag| self.has_tag(tag))
    }

    /// True if no tag of `other` is in this set
    pub fn has_none_tags(&self, other: &GameplayTagSet) -> bool {
        !other.iter().any(|tag| self.has_tag(tag))
    }

    /// True when both sets share at least one tag. Empty sets never intersect.
    pub fn intersects(&self, other: &GameplayTagSet) -> bool {
        other.iter().any(|tag| self.has_tag(tag))
    }
}

impl FromIterator<GameplayTag> for GameplayTagSet {
    fn from_iter<T: IntoIterator<Item = GameplayTag>>(iter: T) -> Self {
        let mut tags: Vec<GameplayTag> = iter.into_iter().collect();
        tags.sort();
        tags.dedup();
        Self { tags }
    }
}

impl<'a> IntoIterator for &'a GameplayTagSet {
    type Item = &'a GameplayTag;
    type IntoIter = std::slice::Iter<'a, GameplayTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

impl From<GameplayTag> for GameplayTagSet {
    fn from(tag: GameplayTag) -> Self {
        Self { tags: vec![tag] }
    }
}

impl fmt::Debug for GameplayTagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.tags.iter().map(|t| t.name())).finish()
    }
}

impl fmt::Display for GameplayTagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", tag)?;
        }
        write!(f, "]")
    }
}

impl Serialize for GameplayTagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.tags.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GameplayTagSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tags = Vec::<GameplayTag>::deserialize(deserializer)?;
        Ok(tags.into_iter().collect())
    }
}
