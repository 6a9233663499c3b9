use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::nodes::node::{NewNode, Node, NodePatch};

/// Row-level access to the node table. Implemented both by the repository
/// (each call commits on its own) and by an open transaction.
#[async_trait]
pub trait TreeStore: Send + Sync {
    async fn insert(&self, node: &NewNode) -> anyhow::Result<Node>;

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Node>>;

    // Direct children, ascending by position (ties: created_at, id)
    async fn list_children(&self, parent_id: Uuid) -> anyhow::Result<Vec<Node>>;

    async fn list_projects(&self) -> anyhow::Result<Vec<Node>>;

    // Returns None when the id does not exist
    async fn update(&self, id: Uuid, patch: &NodePatch) -> anyhow::Result<Option<Node>>;

    // position: None => keep current value
    async fn set_parent(
        &self,
        id: Uuid,
        parent_id: Uuid,
        position: Option<i32>,
    ) -> anyhow::Result<Option<Node>>;

    // Returns false when no row matched
    async fn set_position(&self, id: Uuid, position: i32) -> anyhow::Result<bool>;

    /// Deletes the row and, through the store's cascade rule, its whole subtree.
    /// Returns false when nothing was deleted.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait NodeRepository: TreeStore {
    /// Opens a transaction that serialises with every other structural mutation.
    async fn begin(&self) -> anyhow::Result<Box<dyn NodeTransaction>>;
}

/// Dropping a transaction without calling `commit` rolls it back.
#[async_trait]
pub trait NodeTransaction: TreeStore {
    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
}
