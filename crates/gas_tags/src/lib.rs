//! # gas_tags - Gameplay Tag Model
//!
//! Tags are the gating currency of the ability system:
//! - [`GameplayTag`]: an interned, dot-delimited name compared by full name
//! - [`GameplayTagSet`]: immutable sets attached to static node data
//! - [`GameplayTagContainer`]: the refcounted multiset a unit owns at runtime
//!
//! # Example
//!
//! ```
//! use gas_tags::prelude::*;
//!
//! let stun = GameplayTag::new("Buff.DeBuff.Stun").unwrap();
//! let mut owned = GameplayTagContainer::new();
//! owned.add_tag(&stun);
//! owned.add_tag(&stun);
//! owned.remove_tag(&stun);
//! assert!(owned.has_tag(&stun));
//! ```

pub mod container;
pub mod set;
pub mod tag;

pub mod prelude {
    pub use crate::container::{GameplayTagContainer, ObserverId, TagEvent, TagObserver};
    pub use crate::set::GameplayTagSet;
    pub use crate::tag::{GameplayTag, TagError};
}

pub use prelude::*;
