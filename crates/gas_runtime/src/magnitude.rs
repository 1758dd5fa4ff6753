//! Runtime evaluation of [`Magnitude`] values

use crate::context::ExecutionContext;
use crate::ids::AscId;
use gas_graph::{formula, AttributeKind, Magnitude};

/// Read access to unit attributes
pub trait AttributeSource {
    fn attribute_value(&self, unit: AscId, attribute: AttributeKind) -> Option<f32>;
}

/// Resolve `magnitude` against a context, falling back to `default`.
///
/// Formulas may reference `level`/`lv` and any custom float stored in the
/// context. Failures are logged.
pub fn evaluate(
    magnitude: &Magnitude,
    context: &ExecutionContext,
    attributes: &dyn AttributeSource,
    default: f32,
) -> f32 {
    match magnitude {
        Magnitude::Fixed(value) => *value,
        Magnitude::Formula(expr) if expr.trim().is_empty() => default,
        Magnitude::Formula(expr) => {
            let level = context.ability_level as f32;
            let result = formula::evaluate(expr, |name| match name {
                "level" | "lv" | "Level" | "LV" => Some(level),
                other => context.get_float(other),
            });
            match result {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("Formula '{}' failed ({}), using {}", expr, e, default);
                    default
                }
            }
        }
        Magnitude::AttributeBased {
            source,
            attribute,
            coefficient,
            addend,
        } => match context
            .unit_for(*source)
            .and_then(|unit| attributes.attribute_value(unit, *attribute))
        {
            Some(value) => value * coefficient + addend,
            None => {
                log::debug!("Attribute {:?} of {:?} unavailable, using {}", attribute, source, default);
                default
            }
        },
        Magnitude::SetByCaller { key, default: fallback } => {
            context.get_float(key).unwrap_or(*fallback)
        }
    }
}
