//! Saved flow documents: the JSON written to storage and export files.

use crate::error::{Error, Result};
use crate::flow::{FlowDocument, FlowEdge, FlowNode};
use crate::id::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const FORMAT_VERSION: &str = "1.0";
pub const APP_NAME: &str = "Machine Flow Designer";

/// Storage key of the saved flow document.
pub const FLOW_KEY: &str = "machine-flow-data";
/// Storage key of the template collection.
pub const TEMPLATES_KEY: &str = "machine-templates";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFlow {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
    #[serde(default)]
    pub node_templates: HashMap<Id, Id>,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
}

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

impl SavedFlow {
    pub fn capture(doc: &FlowDocument, at: DateTime<Utc>) -> Self {
        Self {
            nodes: doc.nodes.clone(),
            edges: doc.edges.clone(),
            node_templates: doc.node_templates.clone(),
            timestamp: at,
            version: default_version(),
            app_name: Some(APP_NAME.to_string()),
        }
    }

    /// The document this file describes, with edge alert flags re-derived
    /// from node status.
    pub fn into_document(self) -> FlowDocument {
        let mut doc = FlowDocument {
            nodes: self.nodes,
            edges: self.edges,
            node_templates: self.node_templates,
        };
        doc.normalize_edges();
        doc
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a saved flow.
    ///
    /// `nodes` and `edges` must be arrays; anything else that does not
    /// deserialise is reported as [`Error::InvalidFormat`].
    pub fn parse(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| Error::InvalidFormat(e.to_string()))?;
        for field in ["nodes", "edges"] {
            if !value.get(field).is_some_and(serde_json::Value::is_array) {
                return Err(Error::InvalidFormat(format!("`{field}` must be an array")));
            }
        }
        serde_json::from_value(value).map_err(|e| Error::InvalidFormat(e.to_string()))
    }
}

/// Suggested file name for an export made at `at`.
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("machine-flow-{}.json", at.format("%Y-%m-%d"))
}
