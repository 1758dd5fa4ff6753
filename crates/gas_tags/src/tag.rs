//! GameplayTag - interned dot-delimited identifier

use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Process-wide tag name interner
static INTERNER: Mutex<BTreeSet<Arc<str>>> = Mutex::new(BTreeSet::new());

fn intern(name: &str) -> Arc<str> {
    let mut names = INTERNER.lock();
    if let Some(existing) = names.get(name) {
        return existing.clone();
    }
    let interned: Arc<str> = Arc::from(name);
    names.insert(interned.clone());
    interned
}

/// Errors produced when parsing tag names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// The tag name was empty
    #[error("tag name is empty")]
    Empty,
    /// A segment between two dots was empty
    #[error("tag '{0}' contains an empty segment")]
    EmptySegment(String),
    /// The tag contained whitespace
    #[error("tag '{0}' contains whitespace")]
    Whitespace(String),
}

/// A gameplay tag such as `Buff.DeBuff.Stun`.
///
/// Tags compare by their full name. The dot hierarchy is an authoring
/// convention: `Buff` does not match `Buff.DeBuff` anywhere in gating.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameplayTag(Arc<str>);

impl GameplayTag {
    /// Create a tag, validating the name
    pub fn new(name: &str) -> Result<Self, TagError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TagError::Empty);
        }
        if name.chars().any(char::is_whitespace) {
            return Err(TagError::Whitespace(name.to_string()));
        }
        if name.split('.').any(str::is_empty) {
            return Err(TagError::EmptySegment(name.to_string()));
        }
        Ok(Self(intern(name)))
    }

    /// Full tag name
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Number of dot-separated segments
    pub fn depth(&self) -> usize {
        self.0.split('.').count()
    }

    /// Last segment of the name
    pub fn leaf(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Parent tag in the authoring hierarchy (`A.B.C` -> `A.B`)
    pub fn parent(&self) -> Option<GameplayTag> {
        self.0
            .rfind('.')
            .map(|idx| GameplayTag(intern(&self.0[..idx])))
    }

    /// Whether this tag sits below `ancestor` in the authoring hierarchy.
    ///
    /// Only for tooling; gating never calls this.
    pub fn is_descendant_of(&self, ancestor: &GameplayTag) -> bool {
        self.0.len() > ancestor.0.len()
            && self.0.starts_with(ancestor.name())
            && self.0.as_bytes()[ancestor.0.len()] == b'.'
    }
}

impl fmt::Debug for GameplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GameplayTag({})", self.0)
    }
}

impl fmt::Display for GameplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for GameplayTag {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for GameplayTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for GameplayTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for GameplayTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        GameplayTag::new(&name).map_err(serde::de::Error::custom)
    }
}
