//! Runtime identifiers
//!
//! Every runtime object is owned by a container and addressed by one of these
//! ids. Ids are never reused within a host.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            #[inline]
            pub const fn to_bits(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Identity of an ability system component (one per unit)
    AscId,
    "Asc"
);
define_id!(
    /// A granted ability on one unit
    AbilitySpecId,
    "Ability"
);
define_id!(
    /// An applied effect on one unit
    EffectSpecId,
    "Effect"
);
define_id!(
    /// A running cue
    CueSpecId,
    "Cue"
);
define_id!(
    /// A projectile handed to the projectile driver
    ProjectileId,
    "Projectile"
);

/// Address of an applied effect: the unit holding it plus its id
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EffectHandle {
    pub target: AscId,
    pub effect: EffectSpecId,
}

impl EffectHandle {
    pub fn new(target: AscId, effect: EffectSpecId) -> Self {
        Self { target, effect }
    }
}

/// Address of a granted ability: the owning unit plus its spec id
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AbilityRef {
    pub asc: AscId,
    pub spec: AbilitySpecId,
}

impl AbilityRef {
    pub fn new(asc: AscId, spec: AbilitySpecId) -> Self {
        Self { asc, spec }
    }
}

/// Monotonic id source shared by every id kind of a host
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    /// Create a new generator, the first id is 1
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    #[inline]
    fn next_bits(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    pub fn next_asc(&self) -> AscId {
        AscId(self.next_bits())
    }

    pub fn next_ability(&self) -> AbilitySpecId {
        AbilitySpecId(self.next_bits())
    }

    pub fn next_effect(&self) -> EffectSpecId {
        EffectSpecId(self.next_bits())
    }

    pub fn next_cue(&self) -> CueSpecId {
        CueSpecId(self.next_bits())
    }

    pub fn next_projectile(&self) -> ProjectileId {
        ProjectileId(self.next_bits())
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_across_kinds() {
        let ids = IdGenerator::new();
        let unit = ids.next_asc();
        let ability = ids.next_ability();
        let effect = ids.next_effect();
        assert_eq!(unit.to_bits(), 1);
        assert_eq!(ability.to_bits(), 2);
        assert_eq!(effect.to_bits(), 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", AscId(7)), "Asc#7");
        assert_eq!(format!("{:?}", EffectSpecId(3)), "Effect(3)");
    }
}
