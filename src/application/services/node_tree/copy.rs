use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::info;
use uuid::Uuid;

use super::traversal::{Subtree, depth_of, load_subtree};
use super::{NodeTreeError, NodeTreeManager, NodeTreeResult, ensure_container};
use crate::application::ports::node_repository::TreeStore;
use crate::domain::nodes::node::{MAX_TREE_DEPTH, NewNode, Node, NodeType};

impl NodeTreeManager {
    /// Deep-copies a node and its subtree under `target_parent_id` and returns
    /// the new top-level node. Every copied node gets a fresh id.
    pub async fn copy_node(&self, node_id: Uuid, target_parent_id: Uuid) -> NodeTreeResult<Node> {
        let tx = self.repo.begin().await?;
        let (copy, count) = apply_copy(tx.as_ref(), node_id, target_parent_id).await?;
        tx.commit().await?;
        info!(
            source_id = %node_id,
            copy_id = %copy.id,
            parent_id = %target_parent_id,
            count,
            "node_copied"
        );
        Ok(copy)
    }
}

async fn apply_copy<S>(
    store: &S,
    node_id: Uuid,
    target_parent_id: Uuid,
) -> NodeTreeResult<(Node, usize)>
where
    S: TreeStore + ?Sized,
{
    let source = store
        .get_by_id(node_id)
        .await?
        .ok_or_else(|| NodeTreeError::node_not_found(node_id))?;
    let target = store
        .get_by_id(target_parent_id)
        .await?
        .ok_or_else(|| NodeTreeError::not_found("target parent not found"))?;
    if source.node_type == NodeType::Project {
        return Err(NodeTreeError::validation("projects cannot be copied"));
    }
    ensure_container(&target)?;

    // Snapshot first: copying into one's own subtree must not see its own inserts.
    let snapshot = load_subtree(store, source).await?;
    if depth_of(store, &target).await? + 1 + snapshot.height() >= MAX_TREE_DEPTH {
        return Err(NodeTreeError::validation("exceeds maximum path depth"));
    }

    let copy = insert_copy(store, &snapshot, target_parent_id).await?;
    Ok((copy, snapshot.node_count()))
}

// Depth-first: a node is inserted before any of its children.
fn insert_copy<'a, S>(
    store: &'a S,
    subtree: &'a Subtree,
    parent_id: Uuid,
) -> BoxFuture<'a, anyhow::Result<Node>>
where
    S: TreeStore + ?Sized + 'a,
{
    async move {
        let copy = store
            .insert(&NewNode::cloned_from(&subtree.node, parent_id))
            .await?;
        for child in &subtree.children {
            insert_copy(store, child, copy.id).await?;
        }
        Ok(copy)
    }
    .boxed()
}
