use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use super::NodeTreeManager;
use crate::application::dto::nodes::CreateNodeInput;
use crate::application::ports::node_repository::{NodeRepository, NodeTransaction, TreeStore};
use crate::domain::nodes::node::{NewNode, Node, NodePatch, NodeType};
use crate::infrastructure::memory::node_repository_memory::InMemoryNodeRepository;

pub(crate) fn names(nodes: &[Node]) -> Vec<String> {
    nodes.iter().map(|n| n.name.clone()).collect()
}

/// Injects a store failure on the n-th insert or set_position once armed.
#[derive(Default)]
pub(crate) struct Faults {
    armed: AtomicBool,
    inserts: AtomicUsize,
    positions: AtomicUsize,
    fail_insert_at: Option<usize>,
    fail_position_at: Option<usize>,
}

impl Faults {
    pub(crate) fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    fn tick(&self, counter: &AtomicUsize, fail_at: Option<usize>) -> anyhow::Result<()> {
        if !self.armed.load(Ordering::SeqCst) {
            return Ok(());
        }
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        if fail_at == Some(n) {
            anyhow::bail!("injected store failure on call {}", n);
        }
        Ok(())
    }
}

pub(crate) struct FaultyRepository {
    inner: InMemoryNodeRepository,
    faults: Arc<Faults>,
}

impl FaultyRepository {
    pub(crate) fn reliable() -> Self {
        Self::with_faults(Faults::default())
    }

    pub(crate) fn failing_insert_at(n: usize) -> Self {
        Self::with_faults(Faults {
            fail_insert_at: Some(n),
            ..Default::default()
        })
    }

    pub(crate) fn failing_set_position_at(n: usize) -> Self {
        Self::with_faults(Faults {
            fail_position_at: Some(n),
            ..Default::default()
        })
    }

    fn with_faults(faults: Faults) -> Self {
        Self {
            inner: InMemoryNodeRepository::new(),
            faults: Arc::new(faults),
        }
    }
}

#[async_trait]
impl TreeStore for FaultyRepository {
    async fn insert(&self, node: &NewNode) -> anyhow::Result<Node> {
        self.faults.tick(&self.faults.inserts, self.faults.fail_insert_at)?;
        self.inner.insert(node).await
    }

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Node>> {
        self.inner.get_by_id(id).await
    }

    async fn list_children(&self, parent_id: Uuid) -> anyhow::Result<Vec<Node>> {
        self.inner.list_children(parent_id).await
    }

    async fn list_projects(&self) -> anyhow::Result<Vec<Node>> {
        self.inner.list_projects().await
    }

    async fn update(&self, id: Uuid, patch: &NodePatch) -> anyhow::Result<Option<Node>> {
        self.inner.update(id, patch).await
    }

    async fn set_parent(
        &self,
        id: Uuid,
        parent_id: Uuid,
        position: Option<i32>,
    ) -> anyhow::Result<Option<Node>> {
        self.inner.set_parent(id, parent_id, position).await
    }

    async fn set_position(&self, id: Uuid, position: i32) -> anyhow::Result<bool> {
        self.faults
            .tick(&self.faults.positions, self.faults.fail_position_at)?;
        self.inner.set_position(id, position).await
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        self.inner.delete(id).await
    }
}

#[async_trait]
impl NodeRepository for FaultyRepository {
    async fn begin(&self) -> anyhow::Result<Box<dyn NodeTransaction>> {
        let inner = self.inner.begin().await?;
        Ok(Box::new(FaultyTransaction {
            inner,
            faults: self.faults.clone(),
        }))
    }
}

struct FaultyTransaction {
    inner: Box<dyn NodeTransaction>,
    faults: Arc<Faults>,
}

#[async_trait]
impl TreeStore for FaultyTransaction {
    async fn insert(&self, node: &NewNode) -> anyhow::Result<Node> {
        self.faults.tick(&self.faults.inserts, self.faults.fail_insert_at)?;
        self.inner.insert(node).await
    }

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Node>> {
        self.inner.get_by_id(id).await
    }

    async fn list_children(&self, parent_id: Uuid) -> anyhow::Result<Vec<Node>> {
        self.inner.list_children(parent_id).await
    }

    async fn list_projects(&self) -> anyhow::Result<Vec<Node>> {
        self.inner.list_projects().await
    }

    async fn update(&self, id: Uuid, patch: &NodePatch) -> anyhow::Result<Option<Node>> {
        self.inner.update(id, patch).await
    }

    async fn set_parent(
        &self,
        id: Uuid,
        parent_id: Uuid,
        position: Option<i32>,
    ) -> anyhow::Result<Option<Node>> {
        self.inner.set_parent(id, parent_id, position).await
    }

    async fn set_position(&self, id: Uuid, position: i32) -> anyhow::Result<bool> {
        self.faults
            .tick(&self.faults.positions, self.faults.fail_position_at)?;
        self.inner.set_position(id, position).await
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        self.inner.delete(id).await
    }
}

#[async_trait]
impl NodeTransaction for FaultyTransaction {
    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        self.inner.commit().await
    }
}

/// Manager over an in-memory store. Nodes created through the helpers get
/// strictly increasing positions so sibling order equals creation order.
pub(crate) struct TreeFixture {
    pub repo: InMemoryNodeRepository,
    pub manager: NodeTreeManager,
    pub faults: Arc<Faults>,
    seq: AtomicI32,
}

impl TreeFixture {
    pub(crate) async fn new() -> Self {
        Self::with_repo(FaultyRepository::reliable()).await
    }

    pub(crate) async fn with_repo(repo: FaultyRepository) -> Self {
        let store = repo.inner.clone();
        let faults = repo.faults.clone();
        Self {
            repo: store,
            manager: NodeTreeManager::new(Arc::new(repo)),
            faults,
            seq: AtomicI32::new(0),
        }
    }

    pub(crate) async fn create(&self, node_type: NodeType, name: &str, parent: Option<Uuid>) -> Node {
        let position = self.seq.fetch_add(1, Ordering::SeqCst);
        let mut input = CreateNodeInput::new(node_type, name).at(position);
        input.parent_id = parent;
        self.manager.create_node(input).await.unwrap()
    }

    pub(crate) async fn project(&self, name: &str) -> Node {
        self.create(NodeType::Project, name, None).await
    }

    pub(crate) async fn folder(&self, name: &str, parent: Uuid) -> Node {
        self.create(NodeType::Folder, name, Some(parent)).await
    }

    pub(crate) async fn note(&self, name: &str, parent: Uuid) -> Node {
        self.create(NodeType::Note, name, Some(parent)).await
    }

    /// `count` folders nested one inside the next, outermost first.
    pub(crate) async fn folder_chain(&self, parent: Uuid, count: usize) -> Vec<Node> {
        let mut chain: Vec<Node> = Vec::with_capacity(count);
        let mut cursor = parent;
        for i in 1..=count {
            let folder = self.folder(&format!("F{}", i), cursor).await;
            cursor = folder.id;
            chain.push(folder);
        }
        chain
    }
}
