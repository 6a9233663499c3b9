use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::application::ports::node_repository::{NodeRepository, NodeTransaction, TreeStore};
use crate::domain::nodes::node::{NewNode, Node, NodePatch, NodeType};

#[derive(Debug, Clone, Default)]
struct MemoryTree {
    nodes: HashMap<Uuid, Node>,
}

impl MemoryTree {
    fn ensure_parent(&self, parent_id: Uuid) -> anyhow::Result<()> {
        if !self.nodes.contains_key(&parent_id) {
            anyhow::bail!("foreign key violation: parent {} does not exist", parent_id);
        }
        Ok(())
    }

    fn insert(&mut self, new: &NewNode) -> anyhow::Result<Node> {
        if let Some(parent_id) = new.parent_id {
            self.ensure_parent(parent_id)?;
        }
        let now = chrono::Utc::now();
        let node = Node {
            id: Uuid::new_v4(),
            parent_id: new.parent_id,
            node_type: new.node_type,
            name: new.name.clone(),
            slug: new.slug.clone(),
            content: new.content.clone(),
            position: new.position,
            metadata: new.metadata.clone(),
            author_type: new.author_type.clone(),
            created_by: new.created_by.clone(),
            updated_by: new.updated_by.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.nodes.insert(node.id, node.clone());
        Ok(node)
    }

    fn get(&self, id: Uuid) -> Option<Node> {
        self.nodes.get(&id).cloned()
    }

    fn sorted(mut nodes: Vec<Node>) -> Vec<Node> {
        nodes.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        nodes
    }

    fn children(&self, parent_id: Uuid) -> Vec<Node> {
        Self::sorted(
            self.nodes
                .values()
                .filter(|n| n.parent_id == Some(parent_id))
                .cloned()
                .collect(),
        )
    }

    fn projects(&self) -> Vec<Node> {
        Self::sorted(
            self.nodes
                .values()
                .filter(|n| n.node_type == NodeType::Project)
                .cloned()
                .collect(),
        )
    }

    fn update(&mut self, id: Uuid, patch: &NodePatch) -> Option<Node> {
        let node = self.nodes.get_mut(&id)?;
        patch.apply_to(node);
        node.updated_at = chrono::Utc::now();
        Some(node.clone())
    }

    fn set_parent(
        &mut self,
        id: Uuid,
        parent_id: Uuid,
        position: Option<i32>,
    ) -> anyhow::Result<Option<Node>> {
        self.ensure_parent(parent_id)?;
        let Some(node) = self.nodes.get_mut(&id) else {
            return Ok(None);
        };
        node.parent_id = Some(parent_id);
        if let Some(p) = position {
            node.position = p;
        }
        node.updated_at = chrono::Utc::now();
        Ok(Some(node.clone()))
    }

    fn set_position(&mut self, id: Uuid, position: i32) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.position = position;
                node.updated_at = chrono::Utc::now();
                true
            }
            None => false,
        }
    }

    // Cascades like ON DELETE CASCADE
    fn delete(&mut self, id: Uuid) -> bool {
        if self.nodes.remove(&id).is_none() {
            return false;
        }
        let mut pending = vec![id];
        while let Some(parent) = pending.pop() {
            let orphans: Vec<Uuid> = self
                .nodes
                .values()
                .filter(|n| n.parent_id == Some(parent))
                .map(|n| n.id)
                .collect();
            for orphan in orphans {
                self.nodes.remove(&orphan);
                pending.push(orphan);
            }
        }
        true
    }
}

/// Node table kept in process memory. A transaction holds the table lock
/// until it commits or is dropped, so transactions are fully serialised.
#[derive(Clone, Default)]
pub struct InMemoryNodeRepository {
    state: Arc<Mutex<MemoryTree>>,
}

impl InMemoryNodeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.nodes.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn all(&self) -> Vec<Node> {
        self.state.lock().await.nodes.values().cloned().collect()
    }
}

#[async_trait]
impl TreeStore for InMemoryNodeRepository {
    async fn insert(&self, node: &NewNode) -> anyhow::Result<Node> {
        self.state.lock().await.insert(node)
    }

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Node>> {
        Ok(self.state.lock().await.get(id))
    }

    async fn list_children(&self, parent_id: Uuid) -> anyhow::Result<Vec<Node>> {
        Ok(self.state.lock().await.children(parent_id))
    }

    async fn list_projects(&self) -> anyhow::Result<Vec<Node>> {
        Ok(self.state.lock().await.projects())
    }

    async fn update(&self, id: Uuid, patch: &NodePatch) -> anyhow::Result<Option<Node>> {
        Ok(self.state.lock().await.update(id, patch))
    }

    async fn set_parent(
        &self,
        id: Uuid,
        parent_id: Uuid,
        position: Option<i32>,
    ) -> anyhow::Result<Option<Node>> {
        self.state.lock().await.set_parent(id, parent_id, position)
    }

    async fn set_position(&self, id: Uuid, position: i32) -> anyhow::Result<bool> {
        Ok(self.state.lock().await.set_position(id, position))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.state.lock().await.delete(id))
    }
}

#[async_trait]
impl NodeRepository for InMemoryNodeRepository {
    async fn begin(&self) -> anyhow::Result<Box<dyn NodeTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryNodeTransaction {
            guard,
            working: Mutex::new(working),
        }))
    }
}

pub struct InMemoryNodeTransaction {
    guard: OwnedMutexGuard<MemoryTree>,
    working: Mutex<MemoryTree>,
}

#[async_trait]
impl TreeStore for InMemoryNodeTransaction {
    async fn insert(&self, node: &NewNode) -> anyhow::Result<Node> {
        self.working.lock().await.insert(node)
    }

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Node>> {
        Ok(self.working.lock().await.get(id))
    }

    async fn list_children(&self, parent_id: Uuid) -> anyhow::Result<Vec<Node>> {
        Ok(self.working.lock().await.children(parent_id))
    }

    async fn list_projects(&self) -> anyhow::Result<Vec<Node>> {
        Ok(self.working.lock().await.projects())
    }

    async fn update(&self, id: Uuid, patch: &NodePatch) -> anyhow::Result<Option<Node>> {
        Ok(self.working.lock().await.update(id, patch))
    }

    async fn set_parent(
        &self,
        id: Uuid,
        parent_id: Uuid,
        position: Option<i32>,
    ) -> anyhow::Result<Option<Node>> {
        self.working.lock().await.set_parent(id, parent_id, position)
    }

    async fn set_position(&self, id: Uuid, position: i32) -> anyhow::Result<bool> {
        Ok(self.working.lock().await.set_position(id, position))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.working.lock().await.delete(id))
    }
}

#[async_trait]
impl NodeTransaction for InMemoryNodeTransaction {
    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let InMemoryNodeTransaction { mut guard, working } = *self;
        *guard = working.into_inner();
        Ok(())
    }
}
