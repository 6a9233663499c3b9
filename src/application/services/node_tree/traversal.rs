use std::collections::HashSet;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use uuid::Uuid;

use crate::application::ports::node_repository::TreeStore;
use crate::domain::nodes::node::{MAX_TREE_DEPTH, Node};

// Upper bound on ancestor hops before the chain is treated as corrupt.
const MAX_ANCESTOR_HOPS: usize = MAX_TREE_DEPTH * 4;

/// Flat pre-order list of descendants: all children of a node, then the
/// descendants of each child in turn. `max_depth = Some(1)` yields direct
/// children only, `Some(0)` yields nothing, `None` walks the whole subtree.
pub async fn collect_descendants<S>(
    store: &S,
    node_id: Uuid,
    max_depth: Option<usize>,
) -> anyhow::Result<Vec<Node>>
where
    S: TreeStore + ?Sized,
{
    let mut out = Vec::new();
    walk_descendants(store, node_id, 0, max_depth, &mut out).await?;
    Ok(out)
}

fn walk_descendants<'a, S>(
    store: &'a S,
    node_id: Uuid,
    depth: usize,
    max_depth: Option<usize>,
    out: &'a mut Vec<Node>,
) -> BoxFuture<'a, anyhow::Result<()>>
where
    S: TreeStore + ?Sized + 'a,
{
    async move {
        if max_depth.is_some_and(|max| depth >= max) {
            return Ok(());
        }
        let children = store.list_children(node_id).await?;
        out.extend(children.iter().cloned());
        for child in children {
            walk_descendants(store, child.id, depth + 1, max_depth, out).await?;
        }
        Ok(())
    }
    .boxed()
}

/// Number of ancestor hops from `node` up to its root project (root = 0).
pub async fn depth_of<S>(store: &S, node: &Node) -> anyhow::Result<usize>
where
    S: TreeStore + ?Sized,
{
    let mut depth = 0;
    let mut cursor = node.parent_id;
    while let Some(parent_id) = cursor {
        depth += 1;
        if depth > MAX_ANCESTOR_HOPS {
            anyhow::bail!(
                "ancestor chain of {} exceeds {} hops",
                node.id,
                MAX_ANCESTOR_HOPS
            );
        }
        let parent = store
            .get_by_id(parent_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("dangling parent reference {}", parent_id))?;
        cursor = parent.parent_id;
    }
    Ok(depth)
}

/// In-memory snapshot of a node and everything below it.
#[derive(Debug, Clone)]
pub struct Subtree {
    pub node: Node,
    pub children: Vec<Subtree>,
}

impl Subtree {
    /// Longest descendant chain below the root (leaf = 0).
    pub fn height(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.height() + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Subtree::node_count).sum::<usize>()
    }

    /// Ids strictly below the root.
    pub fn descendant_ids(&self) -> HashSet<Uuid> {
        let mut ids = HashSet::new();
        let mut stack: Vec<&Subtree> = self.children.iter().collect();
        while let Some(st) = stack.pop() {
            ids.insert(st.node.id);
            stack.extend(st.children.iter());
        }
        ids
    }
}

pub fn load_subtree<'a, S>(store: &'a S, node: Node) -> BoxFuture<'a, anyhow::Result<Subtree>>
where
    S: TreeStore + ?Sized + 'a,
{
    async move {
        let mut children = Vec::new();
        for child in store.list_children(node.id).await? {
            children.push(load_subtree(store, child).await?);
        }
        Ok(Subtree { node, children })
    }
    .boxed()
}
