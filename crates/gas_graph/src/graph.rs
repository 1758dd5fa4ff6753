//! SkillGraph - the static node/connection graph of one skill
//!
//! Graphs are immutable once registered in a [`SkillDataCenter`](crate::store::SkillDataCenter).
//! Connections keep their authored order; traversal visits them in that order.

use crate::error::{GraphError, GraphResult};
use crate::node::{is_known_node_type, GraphNode, NodeData, NodeId, NodeKind, SkillId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A directed edge from an output port to an input port
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(alias = "outputNodeGuid")]
    pub output_node: NodeId,
    #[serde(alias = "outputPortName")]
    pub output_port: String,
    #[serde(alias = "inputNodeGuid")]
    pub input_node: NodeId,
    #[serde(alias = "inputPortName", default = "default_input_port")]
    pub input_port: String,
}

fn default_input_port() -> String {
    "input".to_string()
}

impl Connection {
    /// Create a new connection into the default input port
    pub fn new(output_node: impl Into<NodeId>, output_port: &str, input_node: impl Into<NodeId>) -> Self {
        Self {
            output_node: output_node.into(),
            output_port: output_port.to_string(),
            input_node: input_node.into(),
            input_port: default_input_port(),
        }
    }
}

/// Static graph of one skill
#[derive(Clone, Debug)]
pub struct SkillGraph {
    skill_id: SkillId,
    nodes: BTreeMap<NodeId, Arc<GraphNode>>,
    /// Authored order
    connections: Vec<Connection>,
    /// Source node -> indices into `connections`
    outgoing: BTreeMap<NodeId, Vec<usize>>,
}

#[derive(Deserialize)]
struct RawGraph {
    #[serde(alias = "skillId", alias = "abilityId")]
    skill_id: SkillId,
    #[serde(default)]
    nodes: Vec<serde_json::Value>,
    #[serde(default)]
    connections: Vec<Connection>,
}

impl SkillGraph {
    /// Create an empty graph
    pub fn new(skill_id: impl Into<SkillId>) -> Self {
        Self {
            skill_id: skill_id.into(),
            nodes: BTreeMap::new(),
            connections: Vec::new(),
            outgoing: BTreeMap::new(),
        }
    }

    /// Parse a graph from its JSON form.
    ///
    /// Nodes without a `$type`, or whose type is not known, are skipped with a
    /// warning; connections touching skipped nodes are dropped the same way.
    pub fn from_json(json: &str) -> GraphResult<Self> {
        let raw: RawGraph = serde_json::from_str(json)?;
        if raw.skill_id.is_empty() {
            return Err(GraphError::EmptySkillId);
        }

        let mut graph = SkillGraph::new(raw.skill_id);
        for mut value in raw.nodes {
            let id = match value
                .get("guid")
                .or_else(|| value.get("id"))
                .and_then(|v| v.as_str())
            {
                Some(id) => NodeId::new(id),
                None => {
                    log::warn!("Skill '{}': node without guid skipped", graph.skill_id);
                    continue;
                }
            };
            let type_name = value.get("$type").and_then(|v| v.as_str()).map(str::to_owned);
            match type_name {
                None => {
                    log::warn!("Skill '{}': node '{}' has no $type, skipped", graph.skill_id, id);
                    continue;
                }
                Some(name) if !is_known_node_type(&name) => {
                    log::warn!(
                        "Skill '{}': node '{}' has unknown type '{}', skipped",
                        graph.skill_id,
                        id,
                        name
                    );
                    continue;
                }
                Some(_) => {}
            }
            if let Some(map) = value.as_object_mut() {
                map.remove("guid");
                map.remove("id");
            }
            let data: NodeData = serde_json::from_value(value)?;
            graph.add_node(GraphNode::new(id, data))?;
        }

        for connection in raw.connections {
            if let Err(e) = graph.connect(connection) {
                log::warn!("Skill '{}': {}", graph.skill_id, e);
            }
        }

        if graph.ability_node().is_none() {
            return Err(GraphError::MissingAbilityNode(graph.skill_id.to_string()));
        }
        Ok(graph)
    }

    /// Add a node
    pub fn add_node(&mut self, node: GraphNode) -> GraphResult<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.nodes.insert(node.id.clone(), Arc::new(node));
        Ok(())
    }

    /// Builder form of [`add_node`](Self::add_node)
    pub fn with_node(mut self, id: &str, data: NodeData) -> GraphResult<Self> {
        self.add_node(GraphNode::new(id, data))?;
        Ok(self)
    }

    /// Add a connection between two existing nodes
    pub fn connect(&mut self, connection: Connection) -> GraphResult<()> {
        for id in [&connection.output_node, &connection.input_node] {
            if !self.nodes.contains_key(id) {
                return Err(GraphError::UnknownNode(id.clone()));
            }
        }
        self.outgoing
            .entry(connection.output_node.clone())
            .or_default()
            .push(self.connections.len());
        self.connections.push(connection);
        Ok(())
    }

    /// Builder form of [`connect`](Self::connect)
    pub fn with_connection(mut self, from: &str, port: &str, to: &str) -> GraphResult<Self> {
        self.connect(Connection::new(from, port, to))?;
        Ok(self)
    }

    pub fn skill_id(&self) -> &SkillId {
        &self.skill_id
    }

    pub fn get_node(&self, id: &NodeId) -> Option<&Arc<GraphNode>> {
        self.nodes.get(id)
    }

    /// The first ability node of the graph
    pub fn ability_node(&self) -> Option<&Arc<GraphNode>> {
        self.nodes.values().find(|n| n.kind() == NodeKind::Ability)
    }

    /// Connections leaving `(node, port)` in authored order
    pub fn connections_from<'a>(
        &'a self,
        node: &NodeId,
        port: &'a str,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.outgoing
            .get(node)
            .into_iter()
            .flatten()
            .map(move |&index| &self.connections[index])
            .filter(move |c| c.output_port == port)
    }

    /// Whether anything is connected to `(node, port)`
    pub fn has_connection(&self, node: &NodeId, port: &str) -> bool {
        self.connections_from(node, port).next().is_some()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Arc<GraphNode>> {
        self.nodes.values()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
