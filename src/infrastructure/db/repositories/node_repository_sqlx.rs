use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, Postgres, Row, Transaction};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::application::ports::node_repository::{NodeRepository, NodeTransaction, TreeStore};
use crate::domain::nodes::node::{NewNode, Node, NodePatch};
use crate::infrastructure::db::PgPool;

// Every structural mutation takes this transaction-scoped lock first.
const TREE_LOCK_SQL: &str = "SELECT pg_advisory_xact_lock(hashtext('arbor.nodes.tree'))";

const NODE_COLUMNS: &str = "id, parent_id, type, name, slug, content, position, metadata, \
     author_type, created_by, updated_by, created_at, updated_at, deleted_at";

pub struct SqlxNodeRepository {
    pub pool: PgPool,
}

impl SqlxNodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_node(r: PgRow) -> anyhow::Result<Node> {
    let node_type: String = r.get("type");
    let content: Option<serde_json::Value> = r.get("content");
    Ok(Node {
        id: r.get("id"),
        parent_id: r.get("parent_id"),
        node_type: node_type.parse()?,
        name: r.get("name"),
        slug: r.get("slug"),
        content: content.unwrap_or(serde_json::Value::Null),
        position: r.get("position"),
        metadata: r.get("metadata"),
        author_type: r.get("author_type"),
        created_by: r.get("created_by"),
        updated_by: r.get("updated_by"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
        deleted_at: r.get("deleted_at"),
    })
}

// JSON null is stored as SQL NULL so "no content" has one representation.
fn content_param(content: &serde_json::Value) -> Option<serde_json::Value> {
    if content.is_null() {
        None
    } else {
        Some(content.clone())
    }
}

async fn insert_row<'e, E: PgExecutor<'e>>(ex: E, node: &NewNode) -> anyhow::Result<Node> {
    let sql = format!(
        "INSERT INTO nodes (parent_id, type, name, slug, content, position, metadata, \
         author_type, created_by, updated_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
        NODE_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(node.parent_id)
        .bind(node.node_type.as_str())
        .bind(&node.name)
        .bind(&node.slug)
        .bind(content_param(&node.content))
        .bind(node.position)
        .bind(&node.metadata)
        .bind(&node.author_type)
        .bind(&node.created_by)
        .bind(&node.updated_by)
        .fetch_one(ex)
        .await?;
    map_node(row)
}

async fn get_row<'e, E: PgExecutor<'e>>(ex: E, id: Uuid) -> anyhow::Result<Option<Node>> {
    let sql = format!("SELECT {} FROM nodes WHERE id = $1", NODE_COLUMNS);
    sqlx::query(&sql)
        .bind(id)
        .fetch_optional(ex)
        .await?
        .map(map_node)
        .transpose()
}

async fn children_rows<'e, E: PgExecutor<'e>>(ex: E, parent_id: Uuid) -> anyhow::Result<Vec<Node>> {
    let sql = format!(
        "SELECT {} FROM nodes WHERE parent_id = $1 ORDER BY position ASC, created_at ASC, id ASC",
        NODE_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(parent_id).fetch_all(ex).await?;
    rows.into_iter().map(map_node).collect()
}

async fn project_rows<'e, E: PgExecutor<'e>>(ex: E) -> anyhow::Result<Vec<Node>> {
    let sql = format!(
        "SELECT {} FROM nodes WHERE type = 'project' ORDER BY position ASC, created_at ASC, id ASC",
        NODE_COLUMNS
    );
    let rows = sqlx::query(&sql).fetch_all(ex).await?;
    rows.into_iter().map(map_node).collect()
}

async fn update_row<'e, E: PgExecutor<'e>>(
    ex: E,
    id: Uuid,
    patch: &NodePatch,
) -> anyhow::Result<Option<Node>> {
    let sql = format!(
        r#"UPDATE nodes SET
             name = COALESCE($2, name),
             slug = COALESCE($3, slug),
             content = CASE WHEN $4 THEN $5 ELSE content END,
             position = COALESCE($6, position),
             metadata = COALESCE($7, metadata),
             author_type = COALESCE($8, author_type),
             updated_by = COALESCE($9, updated_by),
             updated_at = now()
           WHERE id = $1
           RETURNING {}"#,
        NODE_COLUMNS
    );
    sqlx::query(&sql)
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.slug)
        .bind(patch.content.is_some())
        .bind(patch.content.as_ref().and_then(content_param))
        .bind(patch.position)
        .bind(&patch.metadata)
        .bind(&patch.author_type)
        .bind(&patch.updated_by)
        .fetch_optional(ex)
        .await?
        .map(map_node)
        .transpose()
}

async fn set_parent_row<'e, E: PgExecutor<'e>>(
    ex: E,
    id: Uuid,
    parent_id: Uuid,
    position: Option<i32>,
) -> anyhow::Result<Option<Node>> {
    let sql = format!(
        "UPDATE nodes SET parent_id = $2, position = COALESCE($3, position), updated_at = now() \
         WHERE id = $1 RETURNING {}",
        NODE_COLUMNS
    );
    sqlx::query(&sql)
        .bind(id)
        .bind(parent_id)
        .bind(position)
        .fetch_optional(ex)
        .await?
        .map(map_node)
        .transpose()
}

async fn set_position_row<'e, E: PgExecutor<'e>>(
    ex: E,
    id: Uuid,
    position: i32,
) -> anyhow::Result<bool> {
    let res = sqlx::query("UPDATE nodes SET position = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(position)
        .execute(ex)
        .await?;
    Ok(res.rows_affected() > 0)
}

async fn delete_row<'e, E: PgExecutor<'e>>(ex: E, id: Uuid) -> anyhow::Result<bool> {
    // Descendants go with it through ON DELETE CASCADE
    let res = sqlx::query("DELETE FROM nodes WHERE id = $1")
        .bind(id)
        .execute(ex)
        .await?;
    Ok(res.rows_affected() > 0)
}

#[async_trait]
impl TreeStore for SqlxNodeRepository {
    async fn insert(&self, node: &NewNode) -> anyhow::Result<Node> {
        insert_row(&self.pool, node).await
    }

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Node>> {
        get_row(&self.pool, id).await
    }

    async fn list_children(&self, parent_id: Uuid) -> anyhow::Result<Vec<Node>> {
        children_rows(&self.pool, parent_id).await
    }

    async fn list_projects(&self) -> anyhow::Result<Vec<Node>> {
        project_rows(&self.pool).await
    }

    async fn update(&self, id: Uuid, patch: &NodePatch) -> anyhow::Result<Option<Node>> {
        update_row(&self.pool, id, patch).await
    }

    async fn set_parent(
        &self,
        id: Uuid,
        parent_id: Uuid,
        position: Option<i32>,
    ) -> anyhow::Result<Option<Node>> {
        set_parent_row(&self.pool, id, parent_id, position).await
    }

    async fn set_position(&self, id: Uuid, position: i32) -> anyhow::Result<bool> {
        set_position_row(&self.pool, id, position).await
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        // Serialise with moves so a subtree cannot be re-parented mid-delete
        let mut tx = self.pool.begin().await?;
        sqlx::query(TREE_LOCK_SQL).execute(&mut *tx).await?;
        let deleted = delete_row(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(deleted)
    }
}

#[async_trait]
impl NodeRepository for SqlxNodeRepository {
    async fn begin(&self) -> anyhow::Result<Box<dyn NodeTransaction>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(TREE_LOCK_SQL).execute(&mut *tx).await?;
        Ok(Box::new(SqlxNodeTransaction {
            tx: Mutex::new(tx),
        }))
    }
}

/// Open transaction holding the tree lock. sqlx rolls back on drop.
pub struct SqlxNodeTransaction {
    tx: Mutex<Transaction<'static, Postgres>>,
}

#[async_trait]
impl TreeStore for SqlxNodeTransaction {
    async fn insert(&self, node: &NewNode) -> anyhow::Result<Node> {
        let mut tx = self.tx.lock().await;
        insert_row(&mut **tx, node).await
    }

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Node>> {
        let mut tx = self.tx.lock().await;
        get_row(&mut **tx, id).await
    }

    async fn list_children(&self, parent_id: Uuid) -> anyhow::Result<Vec<Node>> {
        let mut tx = self.tx.lock().await;
        children_rows(&mut **tx, parent_id).await
    }

    async fn list_projects(&self) -> anyhow::Result<Vec<Node>> {
        let mut tx = self.tx.lock().await;
        project_rows(&mut **tx).await
    }

    async fn update(&self, id: Uuid, patch: &NodePatch) -> anyhow::Result<Option<Node>> {
        let mut tx = self.tx.lock().await;
        update_row(&mut **tx, id, patch).await
    }

    async fn set_parent(
        &self,
        id: Uuid,
        parent_id: Uuid,
        position: Option<i32>,
    ) -> anyhow::Result<Option<Node>> {
        let mut tx = self.tx.lock().await;
        set_parent_row(&mut **tx, id, parent_id, position).await
    }

    async fn set_position(&self, id: Uuid, position: i32) -> anyhow::Result<bool> {
        let mut tx = self.tx.lock().await;
        set_position_row(&mut **tx, id, position).await
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut tx = self.tx.lock().await;
        delete_row(&mut **tx, id).await
    }
}

#[async_trait]
impl NodeTransaction for SqlxNodeTransaction {
    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        self.tx.into_inner().commit().await?;
        Ok(())
    }
}
