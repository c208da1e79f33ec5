//! Flow document: machine nodes, the edges between them, and which
//! template each node is drawn with.
//!
//! The document is plain data with in-place operations. History,
//! debouncing and persistence live in the editor's flow store.

use crate::error::{Error, Result};
use crate::id::Id;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const NODE_TYPE: &str = "machineNode";
pub const EDGE_ALERT_COLOR: &str = "#ef4444";
pub const EDGE_NORMAL_COLOR: &str = "#001F3F";
/// Largest throughput change per simulation tick, in either direction.
pub const THROUGHPUT_JITTER: i32 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    Active,
    #[default]
    Idle,
    Warning,
    Down,
}

impl MachineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MachineStatus::Active => "active",
            MachineStatus::Idle => "idle",
            MachineStatus::Warning => "warning",
            MachineStatus::Down => "down",
        }
    }
}

/// How the graph canvas draws nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Default,
    /// Nodes with an assigned template render through it.
    Shapes,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineData {
    pub label: String,
    pub status: MachineStatus,
    /// Items per interval.
    pub throughput: f64,
    #[serde(default = "default_capacity")]
    pub capacity: f64,
    #[serde(default)]
    pub last_maintenance: String,
    /// Overrides the assigned template's frame rotation, in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rotation: Option<f64>,
}

fn default_capacity() -> f64 {
    100.0
}

/// Partial edit of a node's machine data.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MachineDataUpdate {
    pub label: Option<String>,
    pub status: Option<MachineStatus>,
    pub throughput: Option<f64>,
    pub capacity: Option<f64>,
    pub last_maintenance: Option<String>,
}

impl MachineDataUpdate {
    pub fn status(status: MachineStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    fn apply(&self, id: Id, data: &mut MachineData) {
        if let Some(label) = &self.label {
            data.label.clone_from(label);
        }
        if let Some(status) = self.status {
            data.status = status;
        }
        for (name, value, target) in [
            ("throughput", self.throughput, &mut data.throughput),
            ("capacity", self.capacity, &mut data.capacity),
        ] {
            match value {
                Some(v) if v.is_finite() => *target = v,
                Some(v) => log::warn!("node {id}: dropping non-finite {name} ({v})"),
                None => {}
            }
        }
        if let Some(date) = &self.last_maintenance {
            data.last_maintenance.clone_from(date);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: Id,
    #[serde(rename = "type", default = "default_node_type")]
    pub node_type: String,
    pub position: Position,
    pub data: MachineData,
}

fn default_node_type() -> String {
    NODE_TYPE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEdge {
    pub id: Id,
    pub source: Id,
    pub target: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    /// Alert flag: set exactly when the source node is down.
    #[serde(default)]
    pub animated: bool,
}

impl FlowEdge {
    pub fn stroke_color(&self) -> &'static str {
        if self.animated {
            EDGE_ALERT_COLOR
        } else {
            EDGE_NORMAL_COLOR
        }
    }
}

/// A requested edge, as reported by the graph canvas.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: Id,
    pub target: Id,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

impl Connection {
    pub fn new(source: Id, target: Id) -> Self {
        Self {
            source,
            target,
            source_handle: None,
            target_handle: None,
        }
    }
}

/// Node changes reported by the graph canvas.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeChange {
    Position { id: Id, position: Position },
    Remove { id: Id },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EdgeChange {
    Remove { id: Id },
}

// ─── Document ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDocument {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
    /// Node id to assigned template id.
    #[serde(default)]
    pub node_templates: HashMap<Id, Id>,
}

impl FlowDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sample line the app opens with.
    pub fn demo() -> Self {
        let node = |id: &str, label: &str, status, throughput, x, capacity, serviced: &str| {
            FlowNode {
                id: Id::intern(id),
                node_type: default_node_type(),
                position: Position::new(x, 100.0),
                data: MachineData {
                    label: label.to_string(),
                    status,
                    throughput,
                    capacity,
                    last_maintenance: serviced.to_string(),
                    frame_rotation: None,
                },
            }
        };
        Self {
            nodes: vec![
                node("m-1", "CNC Milling", MachineStatus::Active, 45.0, 100.0, 100.0, "2024-05-20"),
                node("m-2", "Assembly Line", MachineStatus::Idle, 0.0, 400.0, 80.0, "2024-05-22"),
            ],
            edges: vec![FlowEdge {
                id: Id::intern("e1-2"),
                source: Id::intern("m-1"),
                target: Id::intern("m-2"),
                source_handle: None,
                target_handle: None,
                animated: false,
            }],
            node_templates: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: Id) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: Id) -> Result<&mut FlowNode> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(Error::NodeNotFound(id))
    }

    pub fn edge(&self, id: Id) -> Option<&FlowEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn template_of(&self, node: Id) -> Option<Id> {
        self.node_templates.get(&node).copied()
    }

    /// Append an idle node labelled `New {kind}`.
    pub fn add_node(&mut self, id: Id, kind: &str, position: Position, today: String) -> &FlowNode {
        self.nodes.push(FlowNode {
            id,
            node_type: default_node_type(),
            position,
            data: MachineData {
                label: format!("New {kind}"),
                status: MachineStatus::Idle,
                throughput: 0.0,
                capacity: default_capacity(),
                last_maintenance: today,
                frame_rotation: None,
            },
        });
        &self.nodes[self.nodes.len() - 1]
    }

    /// Merge `update` into a node. A status change re-derives the alert
    /// flag of every edge leaving the node.
    pub fn update_node_data(&mut self, id: Id, update: &MachineDataUpdate) -> Result<()> {
        let node = self.node_mut(id)?;
        update.apply(id, &mut node.data);
        if let Some(status) = update.status {
            self.refresh_edge_alerts(id, status);
        }
        Ok(())
    }

    fn refresh_edge_alerts(&mut self, source: Id, status: MachineStatus) {
        let down = status == MachineStatus::Down;
        for edge in self.edges.iter_mut().filter(|e| e.source == source) {
            edge.animated = down;
        }
    }

    pub fn set_position(&mut self, id: Id, position: Position) -> Result<()> {
        self.node_mut(id)?.position = position;
        Ok(())
    }

    /// Remove a node together with its edges and template assignment.
    pub fn delete_node(&mut self, id: Id) -> Option<FlowNode> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(index);
        self.edges.retain(|e| e.source != id && e.target != id);
        self.node_templates.remove(&id);
        Some(node)
    }

    pub fn delete_edge(&mut self, id: Id) -> Option<FlowEdge> {
        let index = self.edges.iter().position(|e| e.id == id)?;
        Some(self.edges.remove(index))
    }

    /// Add the edge `connection` describes. Self-loops, unknown endpoints
    /// and repeats of an existing connection are ignored (`None`).
    pub fn connect(&mut self, connection: &Connection) -> Option<&FlowEdge> {
        if connection.source == connection.target {
            return None;
        }
        let source_status = self.node(connection.source)?.data.status;
        self.node(connection.target)?;
        let duplicate = self.edges.iter().any(|e| {
            e.source == connection.source
                && e.target == connection.target
                && e.source_handle == connection.source_handle
                && e.target_handle == connection.target_handle
        });
        if duplicate {
            return None;
        }
        let id = Id::intern(&format!("e-{}-{}", connection.source, connection.target));
        if self.edge(id).is_some() {
            return None;
        }
        self.edges.push(FlowEdge {
            id,
            source: connection.source,
            target: connection.target,
            source_handle: connection.source_handle.clone(),
            target_handle: connection.target_handle.clone(),
            animated: source_status == MachineStatus::Down,
        });
        self.edges.last()
    }

    /// Assign (or with `None`, clear) a node's template.
    pub fn assign_template(&mut self, node: Id, template: Option<Id>) -> Result<()> {
        self.node_mut(node)?;
        match template {
            Some(t) => self.node_templates.insert(node, t),
            None => self.node_templates.remove(&node),
        };
        Ok(())
    }

    pub fn set_frame_rotation(&mut self, node: Id, rotation: Option<f64>) -> Result<()> {
        let rotation = rotation.filter(|r| r.is_finite());
        self.node_mut(node)?.data.frame_rotation = rotation;
        Ok(())
    }

    /// Clear every assignment to `template`. Returns the affected nodes.
    pub fn clear_template(&mut self, template: Id) -> Vec<Id> {
        let affected: Vec<Id> = self
            .node_templates
            .iter()
            .filter(|(_, t)| **t == template)
            .map(|(n, _)| *n)
            .collect();
        for node in &affected {
            self.node_templates.remove(node);
        }
        affected
    }

    /// Drop assignments whose node is gone or whose template `is_known`
    /// rejects. Returns how many were removed.
    pub fn prune_template_refs(&mut self, is_known: impl Fn(Id) -> bool) -> usize {
        let before = self.node_templates.len();
        let node_ids: Vec<Id> = self.nodes.iter().map(|n| n.id).collect();
        self.node_templates
            .retain(|node, template| node_ids.contains(node) && is_known(*template));
        before - self.node_templates.len()
    }

    /// Re-derive every edge's alert flag from its source node.
    pub fn normalize_edges(&mut self) {
        let statuses: HashMap<Id, MachineStatus> =
            self.nodes.iter().map(|n| (n.id, n.data.status)).collect();
        for edge in &mut self.edges {
            edge.animated = statuses.get(&edge.source) == Some(&MachineStatus::Down);
        }
    }

    /// Nudge every active node's throughput by up to ±5, floored at zero.
    pub fn simulate_throughput<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let mut changed = 0;
        for node in &mut self.nodes {
            if node.data.status != MachineStatus::Active {
                continue;
            }
            let jitter = rng.random_range(-THROUGHPUT_JITTER..=THROUGHPUT_JITTER);
            node.data.throughput = (node.data.throughput + f64::from(jitter)).max(0.0);
            changed += 1;
        }
        changed
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.node_templates.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn id(s: &str) -> Id {
        Id::intern(s)
    }

    #[test]
    fn demo_document() {
        let doc = FlowDocument::demo();
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.node(id("m-1")).unwrap().data.throughput, 45.0);
        assert_eq!(doc.node(id("m-2")).unwrap().data.capacity, 80.0);
        assert_eq!(doc.edges[0].source, id("m-1"));
    }

    #[test]
    fn status_down_flags_outgoing_edges_only() {
        let mut doc = FlowDocument::demo();
        doc.update_node_data(id("m-2"), &MachineDataUpdate::status(MachineStatus::Down))
            .unwrap();
        assert!(!doc.edges[0].animated);
        doc.update_node_data(id("m-1"), &MachineDataUpdate::status(MachineStatus::Down))
            .unwrap();
        assert!(doc.edges[0].animated);
        assert_eq!(doc.edges[0].stroke_color(), EDGE_ALERT_COLOR);
        doc.update_node_data(id("m-1"), &MachineDataUpdate::status(MachineStatus::Warning))
            .unwrap();
        assert!(!doc.edges[0].animated);
    }

    #[test]
    fn update_unknown_node_is_an_error() {
        let mut doc = FlowDocument::demo();
        let err = doc.update_node_data(id("ghost"), &MachineDataUpdate::default());
        assert!(matches!(err, Err(Error::NodeNotFound(_))));
    }

    #[test]
    fn nan_throughput_is_dropped() {
        let mut doc = FlowDocument::demo();
        let update = MachineDataUpdate {
            throughput: Some(f64::NAN),
            label: Some("Mill".into()),
            ..Default::default()
        };
        doc.update_node_data(id("m-1"), &update).unwrap();
        let node = doc.node(id("m-1")).unwrap();
        assert_eq!(node.data.throughput, 45.0);
        assert_eq!(node.data.label, "Mill");
    }

    #[test]
    fn connect_rejects_loops_and_repeats() {
        let mut doc = FlowDocument::demo();
        assert!(doc.connect(&Connection::new(id("m-1"), id("m-1"))).is_none());
        let edge = doc.connect(&Connection::new(id("m-2"), id("m-1"))).unwrap();
        assert_eq!(edge.id.as_str(), "e-m-2-m-1");
        assert!(doc.connect(&Connection::new(id("m-2"), id("m-1"))).is_none());
        assert!(doc.connect(&Connection::new(id("m-1"), id("nowhere"))).is_none());
        assert_eq!(doc.edges.len(), 2);
    }

    #[test]
    fn connect_from_down_node_starts_alerting() {
        let mut doc = FlowDocument::demo();
        doc.update_node_data(id("m-2"), &MachineDataUpdate::status(MachineStatus::Down))
            .unwrap();
        let edge = doc.connect(&Connection::new(id("m-2"), id("m-1"))).unwrap();
        assert!(edge.animated);
    }

    #[test]
    fn delete_node_cascades() {
        let mut doc = FlowDocument::demo();
        doc.assign_template(id("m-1"), Some(id("template-a"))).unwrap();
        doc.delete_node(id("m-1")).unwrap();
        assert!(doc.edges.is_empty());
        assert!(doc.node_templates.is_empty());
    }

    #[test]
    fn clear_and_prune_template_refs() {
        let mut doc = FlowDocument::demo();
        doc.assign_template(id("m-1"), Some(id("template-a"))).unwrap();
        doc.assign_template(id("m-2"), Some(id("template-b"))).unwrap();
        assert_eq!(doc.clear_template(id("template-a")), vec![id("m-1")]);
        assert_eq!(doc.template_of(id("m-1")), None);

        let removed = doc.prune_template_refs(|t| t != id("template-b"));
        assert_eq!(removed, 1);
        assert!(doc.node_templates.is_empty());
    }

    #[test]
    fn throughput_tick_touches_active_nodes_only() {
        let mut doc = FlowDocument::demo();
        doc.nodes[0].data.throughput = 2.0;
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            assert_eq!(doc.simulate_throughput(&mut rng), 1);
            let t = doc.nodes[0].data.throughput;
            assert!(t >= 0.0 && t.fract() == 0.0);
            assert_eq!(doc.nodes[1].data.throughput, 0.0);
        }
    }

    #[test]
    fn node_changes_deserialize() {
        let changes: Vec<NodeChange> = serde_json::from_str(
            r#"[{ "type": "position", "id": "m-1", "position": { "x": 5, "y": 6 } },
                { "type": "remove", "id": "m-2" }]"#,
        )
        .unwrap();
        assert_eq!(
            changes[0],
            NodeChange::Position {
                id: id("m-1"),
                position: Position::new(5.0, 6.0)
            }
        );
        assert_eq!(changes[1], NodeChange::Remove { id: id("m-2") });
    }
}
