//! Attribute store
//!
//! Each attribute has a base value and a list of temporary modifiers owned by
//! running effects. The current value is recomputed on every mutation:
//!
//! ```text
//! current = override, if any modifier overrides
//!         = (base + sum(add)) * product(multiply) / product(divide)   otherwise
//! ```
//!
//! Health and Mana are clamped to `[0, MaxHealth]` / `[0, MaxMana]`. Every
//! mutation reports the visible changes as [`AttributeChange`] records so the
//! owner can derive gameplay events from them.

use gas_graph::{AttributeKind, ModifierOperation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A visible change of an attribute's current value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub attribute: AttributeKind,
    pub before: f32,
    pub after: f32,
}

impl AttributeChange {
    pub fn delta(&self) -> f32 {
        self.after - self.before
    }
}

/// Handle of a temporary modifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModifierHandle(u64);

#[derive(Debug, Clone, PartialEq)]
struct AppliedModifier {
    handle: ModifierHandle,
    operation: ModifierOperation,
    magnitude: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct AttributeValue {
    base: f32,
    current: f32,
    modifiers: Vec<AppliedModifier>,
}

impl AttributeValue {
    fn new(base: f32) -> Self {
        Self {
            base,
            current: base,
            modifiers: Vec::new(),
        }
    }

    fn aggregate(&self) -> f32 {
        if let Some(last) = self
            .modifiers
            .iter()
            .rev()
            .find(|m| m.operation == ModifierOperation::Override)
        {
            return last.magnitude;
        }
        let mut value = self.base;
        for op in [ModifierOperation::Add, ModifierOperation::Multiply, ModifierOperation::Divide] {
            for m in self.modifiers.iter().filter(|m| m.operation == op) {
                value = op.apply(value, m.magnitude);
            }
        }
        value
    }
}

/// Attribute values of one unit
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    values: BTreeMap<AttributeKind, AttributeValue>,
    next_handle: u64,
}

impl AttributeSet {
    /// Create an empty attribute set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`add_attribute`](Self::add_attribute)
    pub fn with(mut self, attribute: AttributeKind, base: f32) -> Self {
        self.add_attribute(attribute, base);
        self
    }

    /// Add (or reset) an attribute
    pub fn add_attribute(&mut self, attribute: AttributeKind, base: f32) {
        self.values.insert(attribute, AttributeValue::new(base));
        self.recompute(attribute, &mut Vec::new());
    }

    pub fn has_attribute(&self, attribute: AttributeKind) -> bool {
        self.values.contains_key(&attribute)
    }

    pub fn get_current_value(&self, attribute: AttributeKind) -> Option<f32> {
        self.values.get(&attribute).map(|v| v.current)
    }

    pub fn get_base_value(&self, attribute: AttributeKind) -> Option<f32> {
        self.values.get(&attribute).map(|v| v.base)
    }

    /// Current value divided by its cap, for capped attributes
    pub fn get_percent(&self, attribute: AttributeKind) -> Option<f32> {
        let max = self.get_current_value(attribute.max_attribute()?)?;
        let current = self.get_current_value(attribute)?;
        Some(if max > 0.0 { current / max } else { 0.0 })
    }

    /// Set the base value. Unknown attributes are ignored.
    pub fn set_base(&mut self, attribute: AttributeKind, value: f32) -> Vec<AttributeChange> {
        let mut changes = Vec::new();
        let Some(entry) = self.values.get_mut(&attribute) else {
            return changes;
        };
        entry.base = value;
        self.recompute(attribute, &mut changes);
        changes
    }

    /// Permanently combine `magnitude` into the base value
    pub fn modify_base(
        &mut self,
        attribute: AttributeKind,
        operation: ModifierOperation,
        magnitude: f32,
    ) -> Vec<AttributeChange> {
        match self.get_base_value(attribute) {
            Some(base) => self.set_base(attribute, operation.apply(base, magnitude)),
            None => Vec::new(),
        }
    }

    /// Add a temporary modifier. Returns `None` if the unit lacks the attribute.
    pub fn add_modifier(
        &mut self,
        attribute: AttributeKind,
        operation: ModifierOperation,
        magnitude: f32,
    ) -> Option<(ModifierHandle, Vec<AttributeChange>)> {
        let handle = ModifierHandle(self.next_handle);
        let entry = self.values.get_mut(&attribute)?;
        self.next_handle += 1;
        entry.modifiers.push(AppliedModifier {
            handle,
            operation,
            magnitude,
        });
        let mut changes = Vec::new();
        self.recompute(attribute, &mut changes);
        Some((handle, changes))
    }

    /// Remove a temporary modifier. Unknown handles are ignored.
    pub fn remove_modifier(&mut self, handle: ModifierHandle) -> Vec<AttributeChange> {
        let mut changes = Vec::new();
        let owner = self.values.iter_mut().find_map(|(kind, value)| {
            let before = value.modifiers.len();
            value.modifiers.retain(|m| m.handle != handle);
            (value.modifiers.len() != before).then_some(*kind)
        });
        if let Some(attribute) = owner {
            self.recompute(attribute, &mut changes);
        }
        changes
    }

    /// Number of temporary modifiers on `attribute`
    pub fn modifier_count(&self, attribute: AttributeKind) -> usize {
        self.values.get(&attribute).map(|v| v.modifiers.len()).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttributeKind, f32)> + '_ {
        self.values.iter().map(|(k, v)| (*k, v.current))
    }

    fn recompute(&mut self, attribute: AttributeKind, changes: &mut Vec<AttributeChange>) {
        let cap = attribute
            .max_attribute()
            .and_then(|max| self.get_current_value(max));
        let Some(entry) = self.values.get_mut(&attribute) else {
            return;
        };
        if let Some(cap) = cap {
            entry.base = entry.base.clamp(0.0, cap.max(0.0));
        }
        let before = entry.current;
        let mut after = entry.aggregate();
        if let Some(cap) = cap {
            after = after.clamp(0.0, cap.max(0.0));
        }
        entry.current = after;
        if before != after {
            changes.push(AttributeChange {
                attribute,
                before,
                after,
            });
        }

        // A cap moved: re-clamp the attribute it caps
        let capped = match attribute {
            AttributeKind::MaxHealth => Some(AttributeKind::Health),
            AttributeKind::MaxMana => Some(AttributeKind::Mana),
            _ => None,
        };
        if let Some(capped) = capped {
            if self.values.contains_key(&capped) {
                self.recompute(capped, changes);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> AttributeSet {
        AttributeSet::new()
            .with(AttributeKind::MaxHealth, 100.0)
            .with(AttributeKind::Health, 100.0)
            .with(AttributeKind::Attack, 20.0)
    }

    #[test]
    fn test_health_is_clamped() {
        let mut attrs = unit();
        let changes = attrs.modify_base(AttributeKind::Health, ModifierOperation::Add, -150.0);
        assert_eq!(attrs.get_current_value(AttributeKind::Health), Some(0.0));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].delta(), -100.0);

        attrs.modify_base(AttributeKind::Health, ModifierOperation::Add, 500.0);
        assert_eq!(attrs.get_current_value(AttributeKind::Health), Some(100.0));
    }

    #[test]
    fn test_modifiers_stack_and_remove() {
        let mut attrs = unit();
        let (add, _) = attrs
            .add_modifier(AttributeKind::Attack, ModifierOperation::Add, 10.0)
            .unwrap();
        let (mul, _) = attrs
            .add_modifier(AttributeKind::Attack, ModifierOperation::Multiply, 2.0)
            .unwrap();
        assert_eq!(attrs.get_current_value(AttributeKind::Attack), Some(60.0));
        assert_eq!(attrs.get_base_value(AttributeKind::Attack), Some(20.0));

        attrs.remove_modifier(add);
        assert_eq!(attrs.get_current_value(AttributeKind::Attack), Some(40.0));
        let changes = attrs.remove_modifier(mul);
        assert_eq!(changes[0].after, 20.0);
        assert_eq!(attrs.modifier_count(AttributeKind::Attack), 0);
    }

    #[test]
    fn test_override_wins() {
        let mut attrs = unit();
        attrs.add_modifier(AttributeKind::Attack, ModifierOperation::Add, 10.0);
        attrs.add_modifier(AttributeKind::Attack, ModifierOperation::Override, 1.0);
        assert_eq!(attrs.get_current_value(AttributeKind::Attack), Some(1.0));
    }

    #[test]
    fn test_max_change_reclamps() {
        let mut attrs = unit();
        let (handle, changes) = attrs
            .add_modifier(AttributeKind::MaxHealth, ModifierOperation::Multiply, 0.5)
            .unwrap();
        assert_eq!(attrs.get_current_value(AttributeKind::Health), Some(50.0));
        assert_eq!(changes.len(), 2);
        assert_eq!(attrs.get_percent(AttributeKind::Health), Some(1.0));

        attrs.remove_modifier(handle);
        assert_eq!(attrs.get_current_value(AttributeKind::MaxHealth), Some(100.0));
        assert_eq!(attrs.get_current_value(AttributeKind::Health), Some(50.0));
    }

    #[test]
    fn test_missing_attribute() {
        let mut attrs = unit();
        assert!(!attrs.has_attribute(AttributeKind::Mana));
        assert!(attrs
            .add_modifier(AttributeKind::Mana, ModifierOperation::Add, 5.0)
            .is_none());
        assert!(attrs.set_base(AttributeKind::Mana, 5.0).is_empty());
        assert_eq!(attrs.get_current_value(AttributeKind::Mana), None);
    }
}
