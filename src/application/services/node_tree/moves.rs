use tracing::{info, warn};
use uuid::Uuid;

use super::traversal::{depth_of, load_subtree};
use super::{NodeTreeError, NodeTreeManager, NodeTreeResult, ensure_container};
use crate::application::ports::node_repository::TreeStore;
use crate::domain::nodes::node::{MAX_TREE_DEPTH, Node, NodeType};

impl NodeTreeManager {
    /// Re-parents a node (and its subtree) under `new_parent_id`.
    ///
    /// Checked in order: node exists, node is not a project, target exists,
    /// target is a container, target is not inside the moved subtree, and
    /// `depth(target) + 1 + height(subtree) < MAX_TREE_DEPTH`.
    pub async fn move_node(
        &self,
        node_id: Uuid,
        new_parent_id: Uuid,
        position: Option<i32>,
    ) -> NodeTreeResult<Node> {
        let tx = self.repo.begin().await?;
        let moved = apply_move(tx.as_ref(), node_id, new_parent_id, position).await?;
        tx.commit().await?;
        info!(node_id = %node_id, parent_id = %new_parent_id, "node_moved");
        Ok(moved)
    }

    /// Assigns `position = index` to each listed child. Children left out of
    /// the list keep their current position; listed ids that are not children
    /// of `parent_id` are skipped.
    pub async fn reorder_children(
        &self,
        parent_id: Uuid,
        ordered_child_ids: &[Uuid],
    ) -> NodeTreeResult<()> {
        let tx = self.repo.begin().await?;
        if tx.get_by_id(parent_id).await?.is_none() {
            return Err(NodeTreeError::not_found("parent not found"));
        }
        for (index, child_id) in ordered_child_ids.iter().enumerate() {
            let position = i32::try_from(index)
                .map_err(|_| NodeTreeError::validation("too many children to reorder"))?;
            match tx.get_by_id(*child_id).await? {
                Some(child) if child.parent_id == Some(parent_id) => {
                    tx.set_position(*child_id, position).await?;
                }
                Some(_) => {
                    warn!(parent_id = %parent_id, child_id = %child_id, "reorder_skipped_foreign_node");
                }
                None => {
                    warn!(parent_id = %parent_id, child_id = %child_id, "reorder_skipped_missing_child");
                }
            }
        }
        tx.commit().await?;
        info!(parent_id = %parent_id, count = ordered_child_ids.len(), "children_reordered");
        Ok(())
    }
}

async fn apply_move<S>(
    store: &S,
    node_id: Uuid,
    new_parent_id: Uuid,
    position: Option<i32>,
) -> NodeTreeResult<Node>
where
    S: TreeStore + ?Sized,
{
    let node = store
        .get_by_id(node_id)
        .await?
        .ok_or_else(|| NodeTreeError::node_not_found(node_id))?;
    if node.node_type == NodeType::Project {
        return Err(NodeTreeError::validation("projects cannot be moved"));
    }
    let parent = store
        .get_by_id(new_parent_id)
        .await?
        .ok_or_else(|| NodeTreeError::not_found("target parent not found"))?;
    ensure_container(&parent)?;

    let subtree = load_subtree(store, node).await?;
    if new_parent_id == node_id || subtree.descendant_ids().contains(&new_parent_id) {
        return Err(NodeTreeError::validation("cannot move into own descendant"));
    }

    let parent_depth = depth_of(store, &parent).await?;
    if parent_depth + 1 + subtree.height() >= MAX_TREE_DEPTH {
        return Err(NodeTreeError::validation("exceeds maximum path depth"));
    }

    store
        .set_parent(node_id, new_parent_id, position)
        .await?
        .ok_or_else(|| NodeTreeError::node_not_found(node_id))
}
