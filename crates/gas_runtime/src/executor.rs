//! Skill graph interpreter
//!
//! Walks the connections leaving `(node, port)` in authored order and
//! dispatches every destination node on its kind. Effects apply and continue
//! through `output`, conditions take exactly one branch, tasks mutate the
//! context or the owning ability.

use crate::context::ExecutionContext;
use crate::host::GasHost;
use crate::ids::{AscId, CueSpecId};
use gas_graph::{
    ports, AttributeCompareConditionNodeData, CooldownType, GraphNode, NodeData, NodeId, SkillId,
    SearchTargetTaskNodeData,
};
use std::sync::Arc;

impl GasHost {
    /// Execute every node connected to `(node, port)`. Returns how many
    /// nodes were visited.
    pub fn execute_connected_nodes(
        &mut self,
        skill: &SkillId,
        node: &NodeId,
        port: &str,
        context: &mut ExecutionContext,
    ) -> usize {
        self.visit_connected(skill, node, port, context, &mut Vec::new())
    }

    /// Like [`execute_connected_nodes`](Self::execute_connected_nodes), also
    /// returning the ids of the cues started directly on this port
    pub fn execute_connected_cue_nodes(
        &mut self,
        skill: &SkillId,
        node: &NodeId,
        port: &str,
        context: &mut ExecutionContext,
    ) -> Vec<CueSpecId> {
        let mut cues = Vec::new();
        self.visit_connected(skill, node, port, context, &mut cues);
        cues
    }

    fn visit_connected(
        &mut self,
        skill: &SkillId,
        node: &NodeId,
        port: &str,
        context: &mut ExecutionContext,
        cues: &mut Vec<CueSpecId>,
    ) -> usize {
        if self.depth >= self.config.max_depth {
            log::error!(
                "Skill '{}': execution depth {} reached at '{}.{}', is the graph cyclic?",
                skill,
                self.config.max_depth,
                node,
                port
            );
            return 0;
        }
        let nodes = self.data.get_connected_nodes(skill, node, port);
        self.depth += 1;
        for next in &nodes {
            if let Some(cue) = self.execute_node(skill, next, context) {
                cues.push(cue);
            }
        }
        self.depth -= 1;
        nodes.len()
    }

    fn execute_node(
        &mut self,
        skill: &SkillId,
        node: &Arc<GraphNode>,
        context: &mut ExecutionContext,
    ) -> Option<CueSpecId> {
        match &node.data {
            NodeData::Ability(_) | NodeData::Animation(_) => {
                log::debug!("Skill '{}': node '{}' is not executable, skipped", skill, node.id);
                None
            }
            NodeData::CooldownEffect(cooldown) if cooldown.cooldown_type == CooldownType::Charge => {
                let outcome = self.execute_charge_cooldown(skill, node, context);
                if outcome.succeeded() {
                    self.execute_connected_nodes(skill, &node.id, ports::OUTPUT, context);
                }
                None
            }
            NodeData::ParticleCue(_) | NodeData::SoundCue(_) | NodeData::FloatingTextCue(_) => {
                self.start_cue(skill, node, context)
            }
            NodeData::SearchTargetTask(task) => {
                self.execute_search(skill, &node.id, task, context);
                None
            }
            NodeData::EndAbilityTask(task) => {
                match context.ability {
                    Some(ability) => {
                        self.end_ability(ability, task.was_cancelled);
                    }
                    None => log::debug!("Skill '{}': end task '{}' outside an ability", skill, node.id),
                }
                None
            }
            NodeData::AttributeCompareCondition(condition) => {
                let branch = if self.evaluate_condition(condition, context) {
                    ports::TRUE
                } else {
                    ports::FALSE
                };
                self.execute_connected_nodes(skill, &node.id, branch, context);
                None
            }
            _ => {
                let outcome = self.apply_effect(skill, node, context);
                if outcome.succeeded() {
                    self.execute_connected_nodes(skill, &node.id, ports::OUTPUT, context);
                }
                None
            }
        }
    }

    fn evaluate_condition(&self, condition: &AttributeCompareConditionNodeData, context: &ExecutionContext) -> bool {
        let Some(asc) = context.unit_for(condition.source).and_then(|unit| self.units.get(&unit)) else {
            return false;
        };
        let value = if condition.compare_percent {
            asc.attributes.get_percent(condition.attribute)
        } else {
            asc.attributes.get_current_value(condition.attribute)
        };
        let Some(value) = value else {
            return false;
        };
        let threshold = self.evaluate(&condition.value, context, 0.0);
        condition.operator.evaluate(value, threshold)
    }

    fn execute_search(
        &mut self,
        skill: &SkillId,
        node: &NodeId,
        task: &SearchTargetTaskNodeData,
        context: &mut ExecutionContext,
    ) {
        let Some(center) = self.resolve_position(&task.center, context) else {
            log::debug!("Skill '{}': search '{}' has no centre", skill, node);
            self.execute_connected_nodes(skill, node, ports::ON_EMPTY, context);
            return;
        };

        let mut found: Vec<(AscId, f32)> = self
            .world
            .units_in_radius(center, task.radius)
            .into_iter()
            .filter(|unit| task.include_caster || Some(*unit) != context.caster)
            .filter_map(|unit| {
                let asc = self.units.get(&unit)?;
                if !asc.has_all_tags(&task.required_tags) || !asc.has_none_tags(&task.excluded_tags) {
                    return None;
                }
                let distance = self.world.position_of(unit)?.distance(center);
                Some((unit, distance))
            })
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1));
        if task.max_targets > 0 {
            found.truncate(task.max_targets as usize);
        }

        if found.is_empty() {
            self.execute_connected_nodes(skill, node, ports::ON_EMPTY, context);
            return;
        }
        for (unit, _) in &found {
            context.add_target(*unit);
        }
        for (unit, _) in found {
            let mut child = context.create_with_parent_input(unit);
            self.execute_connected_nodes(skill, node, ports::ON_FOUND, &mut child);
        }
    }
}
