//! Cue lifecycle on the host
//!
//! Cues are presentation only. The host decides when a cue starts and stops
//! and hands the request to the [`CueDriver`](crate::driver::CueDriver).

use crate::context::ExecutionContext;
use crate::driver::{CueKind, CueRequest};
use crate::events::GasEvent;
use crate::host::GasHost;
use crate::ids::{AscId, CueSpecId};
use gas_graph::{GraphNode, NodeData, NodeId, SkillId};

/// A cue the host is tracking
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveCue {
    pub unit: AscId,
    pub skill: SkillId,
    pub node: NodeId,
    /// Stopped when the timeline window that started it closes
    pub destroy_with_node: bool,
    /// Seconds left for timed particles
    pub remaining: Option<f32>,
}

impl GasHost {
    /// Start the cue described by `node`. Returns `None` if the node is not a
    /// cue, its target is missing, or the target fails the cue's tag checks.
    pub(crate) fn start_cue(
        &mut self,
        skill: &SkillId,
        node: &GraphNode,
        context: &ExecutionContext,
    ) -> Option<CueSpecId> {
        let cue = node.data.cue()?;
        let unit = context.unit_for(cue.target)?;
        let asc = self.units.get(&unit)?;
        if !asc.satisfies(&cue.required_tags, &cue.immunity_tags) {
            log::debug!("Cue '{}' skipped on {}: tag requirements not met", node.id, unit);
            return None;
        }

        let (kind, remaining) = match &node.data {
            NodeData::ParticleCue(p) => (
                CueKind::Particle {
                    particle: p.particle.clone(),
                    binding_name: p.binding_name.clone(),
                    duration: p.duration,
                },
                (p.duration > 0.0).then_some(p.duration),
            ),
            NodeData::SoundCue(s) => (
                CueKind::Sound {
                    sound: s.sound.clone(),
                    volume: s.volume,
                },
                None,
            ),
            NodeData::FloatingTextCue(t) => (
                CueKind::FloatingText {
                    text: t.text.clone(),
                    color: t.color,
                },
                None,
            ),
            _ => return None,
        };

        let id = self.ids.next_cue();
        let request = CueRequest {
            unit,
            position: self.world.position_of(unit),
            kind,
        };
        self.cue_driver.start_cue(id, &request);

        // Sounds and floating text are fire-and-forget
        if remaining.is_some() || matches!(request.kind, CueKind::Particle { .. }) {
            self.active_cues.insert(
                id,
                ActiveCue {
                    unit,
                    skill: skill.clone(),
                    node: node.id.clone(),
                    destroy_with_node: cue.destroy_with_node,
                    remaining,
                },
            );
        }
        self.events.push(GasEvent::CueStarted { cue: id, unit });
        Some(id)
    }

    /// Stop a tracked cue
    pub fn stop_cue(&mut self, id: CueSpecId) -> bool {
        if self.active_cues.remove(&id).is_none() {
            return false;
        }
        self.cue_driver.stop_cue(id);
        self.events.push(GasEvent::CueStopped { cue: id });
        true
    }

    /// Stop timed particles whose duration ran out
    pub(crate) fn tick_cues(&mut self, dt: f32) {
        let mut expired = Vec::new();
        for (id, cue) in self.active_cues.iter_mut() {
            if let Some(remaining) = cue.remaining.as_mut() {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    expired.push(*id);
                }
            }
        }
        for id in expired {
            self.stop_cue(id);
        }
    }

    pub fn active_cue(&self, id: CueSpecId) -> Option<&ActiveCue> {
        self.active_cues.get(&id)
    }

    pub fn active_cue_count(&self) -> usize {
        self.active_cues.len()
    }
}
