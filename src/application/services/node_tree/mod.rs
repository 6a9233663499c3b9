//! Node tree manager: validated creation, traversal and structural mutation
//! of the project → folder → item hierarchy.
//!
//! Every multi-step mutation (create under a parent, move, copy, reorder)
//! runs its reads and writes inside one store transaction; a failure at any
//! step leaves the tree untouched.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::application::dto::nodes::CreateNodeInput;
use crate::application::ports::node_repository::{NodeRepository, TreeStore};
use crate::domain::nodes::node::{
    DEFAULT_PROVENANCE, MAX_TREE_DEPTH, NewNode, Node, NodePatch, NodeType,
};

mod copy;
mod error;
mod moves;
pub mod slug;
#[cfg(test)]
pub(crate) mod test_support;
pub mod traversal;

pub use error::{NodeTreeError, NodeTreeResult};
pub use slug::generate_slug;

#[derive(Clone)]
pub struct NodeTreeManager {
    repo: Arc<dyn NodeRepository>,
}

impl NodeTreeManager {
    pub fn new(repo: Arc<dyn NodeRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_node(&self, input: CreateNodeInput) -> NodeTreeResult<Node> {
        if input.name.trim().is_empty() {
            return Err(NodeTreeError::validation("name must not be empty"));
        }
        match (input.node_type, input.parent_id) {
            (NodeType::Project, Some(_)) => {
                return Err(NodeTreeError::validation("projects cannot have a parent"));
            }
            (NodeType::Project, None) => {
                let node = self.repo.insert(&new_node_from(input)).await?;
                debug!(node_id = %node.id, "project_created");
                return Ok(node);
            }
            (_, None) => {
                return Err(NodeTreeError::validation(
                    "only projects can be top-level nodes",
                ));
            }
            (_, Some(_)) => {}
        }

        let tx = self.repo.begin().await?;
        let node = insert_child(tx.as_ref(), input).await?;
        tx.commit().await?;
        debug!(
            node_id = %node.id,
            parent_id = ?node.parent_id,
            node_type = %node.node_type,
            "node_created"
        );
        Ok(node)
    }

    /// `Ok(None)` when the id is unknown.
    pub async fn get_node_by_id(&self, id: Uuid) -> NodeTreeResult<Option<Node>> {
        Ok(self.repo.get_by_id(id).await?)
    }

    pub async fn get_nodes_by_parent_id(&self, parent_id: Uuid) -> NodeTreeResult<Vec<Node>> {
        Ok(self.repo.list_children(parent_id).await?)
    }

    pub async fn get_all_projects(&self) -> NodeTreeResult<Vec<Node>> {
        Ok(self.repo.list_projects().await?)
    }

    /// Partial update. Omitted fields keep their values, including
    /// `updated_by`; the parent can only change through `move_node`.
    pub async fn update_node(&self, id: Uuid, patch: NodePatch) -> NodeTreeResult<Node> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(NodeTreeError::validation("name must not be empty"));
        }
        let node = self
            .repo
            .update(id, &patch)
            .await?
            .ok_or_else(|| NodeTreeError::node_not_found(id))?;
        debug!(node_id = %id, "node_updated");
        Ok(node)
    }

    /// Removes the node and, by store cascade, its subtree. Unknown ids are a no-op.
    pub async fn delete_node(&self, id: Uuid) -> NodeTreeResult<()> {
        if self.repo.delete(id).await? {
            info!(node_id = %id, "node_deleted");
        } else {
            debug!(node_id = %id, "node_delete_noop");
        }
        Ok(())
    }

    pub async fn get_descendants(
        &self,
        node_id: Uuid,
        max_depth: Option<usize>,
    ) -> NodeTreeResult<Vec<Node>> {
        if self.repo.get_by_id(node_id).await?.is_none() {
            return Err(NodeTreeError::node_not_found(node_id));
        }
        Ok(traversal::collect_descendants(self.repo.as_ref(), node_id, max_depth).await?)
    }
}

fn new_node_from(input: CreateNodeInput) -> NewNode {
    let slug = input.slug.unwrap_or_else(|| generate_slug(&input.name));
    NewNode {
        parent_id: input.parent_id,
        node_type: input.node_type,
        name: input.name,
        slug: Some(slug),
        content: input.content.unwrap_or(serde_json::Value::Null),
        position: input.position.unwrap_or(0),
        metadata: input
            .metadata
            .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
        author_type: input.author_type,
        created_by: input
            .created_by
            .unwrap_or_else(|| DEFAULT_PROVENANCE.to_string()),
        updated_by: input
            .updated_by
            .unwrap_or_else(|| DEFAULT_PROVENANCE.to_string()),
    }
}

async fn insert_child<S>(store: &S, input: CreateNodeInput) -> NodeTreeResult<Node>
where
    S: TreeStore + ?Sized,
{
    let Some(parent_id) = input.parent_id else {
        return Err(NodeTreeError::validation(
            "only projects can be top-level nodes",
        ));
    };
    let parent = store
        .get_by_id(parent_id)
        .await?
        .ok_or_else(|| NodeTreeError::not_found("parent not found"))?;
    ensure_container(&parent)?;
    if traversal::depth_of(store, &parent).await? + 1 >= MAX_TREE_DEPTH {
        return Err(NodeTreeError::validation("exceeds maximum path depth"));
    }
    Ok(store.insert(&new_node_from(input)).await?)
}

pub(crate) fn ensure_container(parent: &Node) -> NodeTreeResult<()> {
    if parent.node_type.is_container() {
        Ok(())
    } else {
        Err(NodeTreeError::validation("parent is not a container type"))
    }
}
