//! Shared data types referenced by node payloads

use crate::formula;
use gas_tags::GameplayTagSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Attribute kinds a unit can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    Health,
    MaxHealth,
    Mana,
    MaxMana,
    Attack,
    Defense,
    MagicResist,
    MoveSpeed,
    AttackSpeed,
}

impl AttributeKind {
    /// The attribute that caps this one, if any
    pub fn max_attribute(self) -> Option<AttributeKind> {
        match self {
            AttributeKind::Health => Some(AttributeKind::MaxHealth),
            AttributeKind::Mana => Some(AttributeKind::MaxMana),
            _ => None,
        }
    }
}

/// How a modifier combines with an attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModifierOperation {
    #[default]
    Add,
    Multiply,
    Divide,
    Override,
}

impl ModifierOperation {
    /// Apply this operation to `value`
    pub fn apply(self, value: f32, magnitude: f32) -> f32 {
        match self {
            ModifierOperation::Add => value + magnitude,
            ModifierOperation::Multiply => value * magnitude,
            ModifierOperation::Divide if magnitude != 0.0 => value / magnitude,
            ModifierOperation::Divide => value,
            ModifierOperation::Override => magnitude,
        }
    }
}

/// Which unit of the execution context a node addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetSelector {
    Caster,
    MainTarget,
    ParentInput,
    /// Parent-input target when set, otherwise the main target
    #[default]
    Current,
}

/// Where a node reads a world position from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PositionSource {
    #[default]
    Caster,
    MainTarget,
    ParentInput,
    Current,
    /// A position stored in the context's custom data (e.g. `HitPosition`)
    CustomData(String),
}

/// A numeric value resolved at execution time.
///
/// In JSON a plain number is `Fixed`, a plain string is `Formula`; the other
/// variants use their tagged form.
#[derive(Debug, Clone, PartialEq)]
pub enum Magnitude {
    Fixed(f32),
    Formula(String),
    AttributeBased {
        source: TargetSelector,
        attribute: AttributeKind,
        coefficient: f32,
        addend: f32,
    },
    SetByCaller {
        key: String,
        default: f32,
    },
}

impl Magnitude {
    /// Constant magnitude
    pub fn fixed(value: f32) -> Self {
        Magnitude::Fixed(value)
    }

    /// Formula magnitude
    pub fn formula(expr: impl Into<String>) -> Self {
        Magnitude::Formula(expr.into())
    }

    /// Value when no runtime context is needed, `None` for context-bound kinds
    pub fn static_value(&self, level: f32) -> Option<f32> {
        match self {
            Magnitude::Fixed(v) => Some(*v),
            Magnitude::Formula(expr) => match formula::evaluate_with_level(expr, level) {
                Ok(v) => Some(v),
                Err(e) => {
                    log::warn!("Formula '{}' failed: {}", expr, e);
                    None
                }
            },
            Magnitude::AttributeBased { .. } | Magnitude::SetByCaller { .. } => None,
        }
    }
}

impl Default for Magnitude {
    fn default() -> Self {
        Magnitude::Fixed(0.0)
    }
}

#[derive(Serialize, Deserialize)]
enum TaggedMagnitude {
    Fixed(f32),
    Formula(String),
    AttributeBased {
        #[serde(default)]
        source: TargetSelector,
        attribute: AttributeKind,
        #[serde(default = "one")]
        coefficient: f32,
        #[serde(default)]
        addend: f32,
    },
    SetByCaller {
        key: String,
        #[serde(default)]
        default: f32,
    },
}

fn one() -> f32 {
    1.0
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MagnitudeRepr {
    Number(f32),
    Text(String),
    Tagged(TaggedMagnitude),
}

impl Serialize for Magnitude {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Magnitude::Fixed(v) => serializer.serialize_f32(*v),
            Magnitude::Formula(expr) => serializer.serialize_str(expr),
            Magnitude::AttributeBased { source, attribute, coefficient, addend } => {
                TaggedMagnitude::AttributeBased {
                    source: *source,
                    attribute: *attribute,
                    coefficient: *coefficient,
                    addend: *addend,
                }
                .serialize(serializer)
            }
            Magnitude::SetByCaller { key, default } => TaggedMagnitude::SetByCaller {
                key: key.clone(),
                default: *default,
            }
            .serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Magnitude {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match MagnitudeRepr::deserialize(deserializer)? {
            MagnitudeRepr::Number(v) => Magnitude::Fixed(v),
            MagnitudeRepr::Text(expr) => Magnitude::Formula(expr),
            MagnitudeRepr::Tagged(TaggedMagnitude::Fixed(v)) => Magnitude::Fixed(v),
            MagnitudeRepr::Tagged(TaggedMagnitude::Formula(expr)) => Magnitude::Formula(expr),
            MagnitudeRepr::Tagged(TaggedMagnitude::AttributeBased {
                source,
                attribute,
                coefficient,
                addend,
            }) => Magnitude::AttributeBased { source, attribute, coefficient, addend },
            MagnitudeRepr::Tagged(TaggedMagnitude::SetByCaller { key, default }) => {
                Magnitude::SetByCaller { key, default }
            }
        })
    }
}

/// One attribute modification carried by an effect node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeModifierData {
    pub attribute: AttributeKind,
    #[serde(default)]
    pub operation: ModifierOperation,
    #[serde(default)]
    pub magnitude: Magnitude,
}

impl AttributeModifierData {
    /// Create a new modifier
    pub fn new(attribute: AttributeKind, operation: ModifierOperation, magnitude: Magnitude) -> Self {
        Self { attribute, operation, magnitude }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DurationType {
    #[default]
    Instant,
    HasDuration,
    Infinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StackType {
    #[default]
    None,
    AggregateByTarget,
    AggregateBySource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StackDurationRefreshPolicy {
    #[default]
    RefreshOnSuccessfulApplication,
    NeverRefresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StackPeriodResetPolicy {
    #[default]
    ResetOnSuccessfulApplication,
    NeverReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StackExpirationPolicy {
    /// Remove the whole stack when the duration runs out
    #[default]
    ClearEntireStack,
    /// Drop one stack and restart the duration
    RemoveSingleStackAndRefreshDuration,
    /// Restart the duration without touching the stack
    RefreshDuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StackOverflowPolicy {
    /// Applications beyond the limit are dropped
    #[default]
    Deny,
    /// Applications beyond the limit run the effect's overflow port
    TriggerOverflowPort,
}

/// Stacking configuration of an effect node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StackingData {
    pub stack_type: StackType,
    /// 0 means unlimited
    pub stack_limit: u32,
    pub duration_refresh: StackDurationRefreshPolicy,
    pub period_reset: StackPeriodResetPolicy,
    pub expiration: StackExpirationPolicy,
    pub overflow: StackOverflowPolicy,
}

impl StackingData {
    pub fn is_stacking(&self) -> bool {
        self.stack_type != StackType::None
    }
}

/// Fields shared by every effect node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectNodeData {
    pub duration_type: DurationType,
    /// Seconds, used by `HasDuration`
    pub duration: Magnitude,
    pub is_periodic: bool,
    /// Seconds between periodic executions
    pub period: Magnitude,
    pub execute_on_application: bool,
    pub target: TargetSelector,
    pub asset_tags: GameplayTagSet,
    pub granted_tags: GameplayTagSet,
    pub application_required_tags: GameplayTagSet,
    pub application_immunity_tags: GameplayTagSet,
    pub ongoing_required_tags: GameplayTagSet,
    pub remove_effects_with_tags: GameplayTagSet,
    pub attribute_modifiers: Vec<AttributeModifierData>,
    pub stacking: StackingData,
    /// Removed when the ability that applied it ends
    pub cancel_on_ability_end: bool,
}

impl Default for EffectNodeData {
    fn default() -> Self {
        Self {
            duration_type: DurationType::Instant,
            duration: Magnitude::Fixed(0.0),
            is_periodic: false,
            period: Magnitude::Fixed(1.0),
            execute_on_application: false,
            target: TargetSelector::Current,
            asset_tags: GameplayTagSet::new(),
            granted_tags: GameplayTagSet::new(),
            application_required_tags: GameplayTagSet::new(),
            application_immunity_tags: GameplayTagSet::new(),
            ongoing_required_tags: GameplayTagSet::new(),
            remove_effects_with_tags: GameplayTagSet::new(),
            attribute_modifiers: Vec::new(),
            stacking: StackingData::default(),
            cancel_on_ability_end: false,
        }
    }
}

impl EffectNodeData {
    /// Instant effect
    pub fn instant() -> Self {
        Self::default()
    }

    /// Effect lasting `seconds`
    pub fn with_duration(seconds: f32) -> Self {
        Self {
            duration_type: DurationType::HasDuration,
            duration: Magnitude::Fixed(seconds),
            ..Self::default()
        }
    }

    /// Effect lasting until removed
    pub fn infinite() -> Self {
        Self {
            duration_type: DurationType::Infinite,
            ..Self::default()
        }
    }

    /// Make the effect periodic
    pub fn periodic(mut self, period: f32, execute_on_application: bool) -> Self {
        self.is_periodic = true;
        self.period = Magnitude::Fixed(period);
        self.execute_on_application = execute_on_application;
        self
    }

    /// Set granted tags
    pub fn granting(mut self, tags: GameplayTagSet) -> Self {
        self.granted_tags = tags;
        self
    }

    /// Set the target selector
    pub fn targeting(mut self, target: TargetSelector) -> Self {
        self.target = target;
        self
    }

    /// Add an attribute modifier
    pub fn with_modifier(mut self, modifier: AttributeModifierData) -> Self {
        self.attribute_modifiers.push(modifier);
        self
    }

    /// Set the stacking configuration
    pub fn with_stacking(mut self, stacking: StackingData) -> Self {
        self.stacking = stacking;
        self
    }

    /// Flag for removal when the owning ability ends
    pub fn cancel_on_ability_end(mut self) -> Self {
        self.cancel_on_ability_end = true;
        self
    }
}

/// Events an active ability can react to through its event ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameplayEventType {
    /// Owner's health decreased
    OnTakeDamage,
    /// Owner's health increased
    OnHealed,
}

/// Damage categories and their mitigating attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DamageType {
    #[default]
    Physical,
    Magical,
    /// Ignores mitigation
    True,
}

impl DamageType {
    /// Attribute that mitigates this damage type
    pub fn mitigation(self) -> Option<AttributeKind> {
        match self {
            DamageType::Physical => Some(AttributeKind::Defense),
            DamageType::Magical => Some(AttributeKind::MagicResist),
            DamageType::True => None,
        }
    }
}

/// Comparison used by condition nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompareOp {
    #[default]
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Equal,
    NotEqual,
}

impl CompareOp {
    pub fn evaluate(self, lhs: f32, rhs: f32) -> bool {
        match self {
            CompareOp::Greater => lhs > rhs,
            CompareOp::GreaterOrEqual => lhs >= rhs,
            CompareOp::Less => lhs < rhs,
            CompareOp::LessOrEqual => lhs <= rhs,
            CompareOp::Equal => (lhs - rhs).abs() <= f32::EPSILON,
            CompareOp::NotEqual => (lhs - rhs).abs() > f32::EPSILON,
        }
    }
}
