//! SkillDataCenter - shared, deduplicated graph store
//!
//! One instance per process, owned by the runtime host and passed by
//! reference. Units never copy graphs; they address them by [`SkillId`].

use crate::error::{GraphError, GraphResult};
use crate::graph::{Connection, SkillGraph};
use crate::node::{GraphNode, NodeId, SkillId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registry of skill graphs keyed by skill id
#[derive(Debug, Default)]
pub struct SkillDataCenter {
    graphs: BTreeMap<SkillId, Arc<SkillGraph>>,
}

impl SkillDataCenter {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a graph. Registering an id that is already present keeps the
    /// existing graph and returns it.
    pub fn register_graph(&mut self, graph: SkillGraph) -> GraphResult<Arc<SkillGraph>> {
        if graph.skill_id().is_empty() {
            return Err(GraphError::EmptySkillId);
        }
        if graph.ability_node().is_none() {
            return Err(GraphError::MissingAbilityNode(graph.skill_id().to_string()));
        }
        if let Some(existing) = self.graphs.get(graph.skill_id()) {
            log::debug!("Skill '{}' already registered", graph.skill_id());
            return Ok(existing.clone());
        }
        log::info!(
            "Registered skill '{}' ({} nodes, {} connections)",
            graph.skill_id(),
            graph.node_count(),
            graph.connection_count()
        );
        let graph = Arc::new(graph);
        self.graphs.insert(graph.skill_id().clone(), graph.clone());
        Ok(graph)
    }

    /// Parse and register a JSON graph
    pub fn register_json(&mut self, json: &str) -> GraphResult<Arc<SkillGraph>> {
        self.register_graph(SkillGraph::from_json(json)?)
    }

    /// Remove a graph, returns it if present
    pub fn unregister_graph(&mut self, skill: &SkillId) -> Option<Arc<SkillGraph>> {
        self.graphs.remove(skill)
    }

    pub fn is_registered(&self, skill: &SkillId) -> bool {
        self.graphs.contains_key(skill)
    }

    pub fn get_graph(&self, skill: &SkillId) -> Option<&Arc<SkillGraph>> {
        self.graphs.get(skill)
    }

    /// Node data by id
    pub fn get_node(&self, skill: &SkillId, node: &NodeId) -> Option<Arc<GraphNode>> {
        self.graphs.get(skill)?.get_node(node).cloned()
    }

    /// The ability node of a skill
    pub fn ability_node(&self, skill: &SkillId) -> Option<Arc<GraphNode>> {
        self.graphs.get(skill)?.ability_node().cloned()
    }

    /// Connections leaving `(node, port)` in authored order
    pub fn connections(&self, skill: &SkillId, node: &NodeId, port: &str) -> Vec<Connection> {
        match self.graphs.get(skill) {
            Some(graph) => graph.connections_from(node, port).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Nodes connected to `(node, port)`, in authored order.
    ///
    /// A connection whose destination node is missing is logged and skipped.
    pub fn get_connected_nodes(
        &self,
        skill: &SkillId,
        node: &NodeId,
        port: &str,
    ) -> Vec<Arc<GraphNode>> {
        let Some(graph) = self.graphs.get(skill) else {
            log::warn!("Skill '{}' is not registered", skill);
            return Vec::new();
        };
        graph
            .connections_from(node, port)
            .filter_map(|c| {
                let found = graph.get_node(&c.input_node).cloned();
                if found.is_none() {
                    log::warn!(
                        "Skill '{}': node '{}' connected from '{}.{}' not found",
                        skill,
                        c.input_node,
                        node,
                        port
                    );
                }
                found
            })
            .collect()
    }

    pub fn has_connection(&self, skill: &SkillId, node: &NodeId, port: &str) -> bool {
        self.graphs
            .get(skill)
            .map(|g| g.has_connection(node, port))
            .unwrap_or(false)
    }

    pub fn registered_count(&self) -> usize {
        self.graphs.len()
    }

    pub fn skills(&self) -> impl Iterator<Item = &SkillId> {
        self.graphs.keys()
    }

    pub fn clear(&mut self) {
        self.graphs.clear();
    }
}
