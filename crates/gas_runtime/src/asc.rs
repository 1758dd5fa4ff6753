//! AbilitySystemComponent - the per-unit aggregate

use crate::ability::AbilityContainer;
use crate::attributes::AttributeSet;
use crate::effect::EffectContainer;
use crate::ids::AscId;
use gas_graph::AttributeKind;
use gas_tags::{GameplayTag, GameplayTagContainer, GameplayTagSet};

/// Attributes, tags, abilities and effects of one unit
#[derive(Debug)]
pub struct AbilitySystemComponent {
    pub(crate) id: AscId,
    pub(crate) name: String,
    pub(crate) attributes: AttributeSet,
    pub(crate) tags: GameplayTagContainer,
    pub(crate) abilities: AbilityContainer,
    pub(crate) effects: EffectContainer,
}

impl AbilitySystemComponent {
    /// Create a unit with no tags, abilities or effects
    pub fn new(id: AscId, name: impl Into<String>, attributes: AttributeSet) -> Self {
        Self {
            id,
            name: name.into(),
            attributes,
            tags: GameplayTagContainer::new(),
            abilities: AbilityContainer::new(),
            effects: EffectContainer::new(),
        }
    }

    /// Unit identifier
    pub fn id(&self) -> AscId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute store
    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Owned tags with reference counts
    pub fn tags(&self) -> &GameplayTagContainer {
        &self.tags
    }

    /// Mutable tag access. The host publishes the resulting tag events and
    /// cancellations at its next tag update or tick; prefer
    /// [`GasHost::add_loose_tags`](crate::host::GasHost::add_loose_tags).
    pub fn tags_mut(&mut self) -> &mut GameplayTagContainer {
        &mut self.tags
    }

    /// Granted abilities
    pub fn abilities(&self) -> &AbilityContainer {
        &self.abilities
    }

    /// Tracked effects
    pub fn effects(&self) -> &EffectContainer {
        &self.effects
    }

    /// Current value of an attribute
    pub fn attribute(&self, attribute: AttributeKind) -> Option<f32> {
        self.attributes.get_current_value(attribute)
    }

    /// True if `tag` is present
    pub fn has_tag(&self, tag: &GameplayTag) -> bool {
        self.tags.has_tag(tag)
    }

    /// True if any of `tags` is present (true for an empty query)
    pub fn has_any_tags(&self, tags: &GameplayTagSet) -> bool {
        self.tags.has_any_tags(tags)
    }

    /// True if every tag of `tags` is present
    pub fn has_all_tags(&self, tags: &GameplayTagSet) -> bool {
        self.tags.has_all_tags(tags)
    }

    /// True if no tag of `tags` is present
    pub fn has_none_tags(&self, tags: &GameplayTagSet) -> bool {
        self.tags.has_none_tags(tags)
    }

    /// Required tags all present and no immunity tag present
    pub fn satisfies(&self, required: &GameplayTagSet, immunity: &GameplayTagSet) -> bool {
        self.has_all_tags(required) && (immunity.is_empty() || self.has_none_tags(immunity))
    }
}
