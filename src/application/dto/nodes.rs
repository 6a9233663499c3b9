use uuid::Uuid;

use crate::domain::nodes::node::NodeType;

/// Input of `create_node`; unset fields receive defaults.
#[derive(Debug, Clone)]
pub struct CreateNodeInput {
    pub node_type: NodeType,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub slug: Option<String>,
    pub content: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Value>,
    pub position: Option<i32>,
    pub author_type: Option<String>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl CreateNodeInput {
    pub fn new(node_type: NodeType, name: impl Into<String>) -> Self {
        Self {
            node_type,
            name: name.into(),
            parent_id: None,
            slug: None,
            content: None,
            metadata: None,
            position: None,
            author_type: None,
            created_by: None,
            updated_by: None,
        }
    }

    pub fn under(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn at(mut self, position: i32) -> Self {
        self.position = Some(position);
        self
    }
}
