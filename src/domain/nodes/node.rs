use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Root project is level 0; no node may sit at this level or deeper.
pub const MAX_TREE_DEPTH: usize = 10;

pub const DEFAULT_PROVENANCE: &str = "user:system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Project,
    Folder,
    Note,
    Link,
    AiSuggestion,
    AudioNote,
}

impl NodeType {
    pub const ALL: [NodeType; 6] = [
        NodeType::Project,
        NodeType::Folder,
        NodeType::Note,
        NodeType::Link,
        NodeType::AiSuggestion,
        NodeType::AudioNote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Project => "project",
            NodeType::Folder => "folder",
            NodeType::Note => "note",
            NodeType::Link => "link",
            NodeType::AiSuggestion => "ai_suggestion",
            NodeType::AudioNote => "audio_note",
        }
    }

    /// Containers may have children and may be targets of create/move/copy.
    pub fn is_container(&self) -> bool {
        matches!(self, NodeType::Project | NodeType::Folder)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown node type: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub node_type: NodeType,
    pub name: String,
    pub slug: Option<String>,
    pub content: serde_json::Value,
    pub position: i32,
    pub metadata: serde_json::Value,
    pub author_type: Option<String>,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Insert row with every default already resolved; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewNode {
    pub parent_id: Option<Uuid>,
    pub node_type: NodeType,
    pub name: String,
    pub slug: Option<String>,
    pub content: serde_json::Value,
    pub position: i32,
    pub metadata: serde_json::Value,
    pub author_type: Option<String>,
    pub created_by: String,
    pub updated_by: String,
}

impl NewNode {
    /// Same payload as `source`, re-parented. Used by deep copy.
    pub fn cloned_from(source: &Node, parent_id: Uuid) -> Self {
        Self {
            parent_id: Some(parent_id),
            node_type: source.node_type,
            name: source.name.clone(),
            slug: source.slug.clone(),
            content: source.content.clone(),
            position: source.position,
            metadata: source.metadata.clone(),
            author_type: source.author_type.clone(),
            created_by: source.created_by.clone(),
            updated_by: source.updated_by.clone(),
        }
    }
}

// Only provided fields are written; `updated_at` is always refreshed.
// `content: Some(Value::Null)` clears the payload.
#[derive(Debug, Clone, Default)]
pub struct NodePatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub content: Option<serde_json::Value>,
    pub position: Option<i32>,
    pub metadata: Option<serde_json::Value>,
    pub author_type: Option<String>,
    pub updated_by: Option<String>,
}

impl NodePatch {
    pub fn apply_to(&self, node: &mut Node) {
        if let Some(name) = &self.name {
            node.name = name.clone();
        }
        if let Some(slug) = &self.slug {
            node.slug = Some(slug.clone());
        }
        if let Some(content) = &self.content {
            node.content = content.clone();
        }
        if let Some(position) = self.position {
            node.position = position;
        }
        if let Some(metadata) = &self.metadata {
            node.metadata = metadata.clone();
        }
        if let Some(author_type) = &self.author_type {
            node.author_type = Some(author_type.clone());
        }
        if let Some(updated_by) = &self.updated_by {
            node.updated_by = updated_by.clone();
        }
    }
}
