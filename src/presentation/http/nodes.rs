use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::dto::nodes::CreateNodeInput;
use crate::application::services::node_tree::generate_slug;
use crate::bootstrap::app_context::AppContext;
use crate::domain::nodes::node::{Node as DomainNode, NodePatch, NodeType};
use crate::presentation::http::error::{ApiError, ErrorBody};
use crate::presentation::http::extract::{ApiJson, ApiPath, ApiQuery};

#[derive(Debug, Serialize, ToSchema)]
pub struct Node {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub r#type: String,
    pub name: String,
    pub slug: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub content: serde_json::Value,
    pub position: i32,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub author_type: Option<String>,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<DomainNode> for Node {
    fn from(n: DomainNode) -> Self {
        Node {
            id: n.id,
            parent_id: n.parent_id,
            r#type: n.node_type.as_str().to_string(),
            name: n.name,
            slug: n.slug,
            content: n.content,
            position: n.position,
            metadata: n.metadata,
            author_type: n.author_type,
            created_by: n.created_by,
            updated_by: n.updated_by,
            created_at: n.created_at,
            updated_at: n.updated_at,
            deleted_at: n.deleted_at,
        }
    }
}

fn to_nodes(nodes: Vec<DomainNode>) -> Json<Vec<Node>> {
    Json(nodes.into_iter().map(Into::into).collect())
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateNodeRequest {
    /// One of project, folder, note, link, ai_suggestion, audio_note
    pub r#type: String,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub slug: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub content: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    pub position: Option<i32>,
    pub author_type: Option<String>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl CreateNodeRequest {
    fn into_input(self) -> Result<CreateNodeInput, ApiError> {
        let node_type: NodeType = self
            .r#type
            .parse()
            .map_err(|e: anyhow::Error| ApiError::BadRequest(e.to_string()))?;
        let mut input = CreateNodeInput::new(node_type, self.name);
        input.parent_id = self.parent_id;
        input.slug = self.slug;
        input.content = self.content;
        input.metadata = self.metadata;
        input.position = self.position;
        input.author_type = self.author_type;
        input.created_by = self.created_by;
        input.updated_by = self.updated_by;
        Ok(input)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateNodeRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    /// Absent keeps the content, `null` clears it
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<Object>)]
    pub content: Option<serde_json::Value>,
    pub position: Option<i32>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    pub author_type: Option<String>,
    pub updated_by: Option<String>,
}

// A present key (even `null`) becomes Some; only a missing key stays None.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl From<UpdateNodeRequest> for NodePatch {
    fn from(r: UpdateNodeRequest) -> Self {
        NodePatch {
            name: r.name,
            slug: r.slug,
            content: r.content,
            position: r.position,
            metadata: r.metadata,
            author_type: r.author_type,
            updated_by: r.updated_by,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveNodeRequest {
    pub new_parent_id: Uuid,
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CopyNodeRequest {
    pub target_parent_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReorderChildrenRequest {
    pub ordered_child_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct DescendantsQuery {
    pub max_depth: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SlugQuery {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlugResponse {
    pub slug: String,
}

#[utoipa::path(get, path = "/api/projects", tag = "Nodes",
    responses((status = 200, body = [Node])))]
pub async fn list_projects(State(ctx): State<AppContext>) -> Result<Json<Vec<Node>>, ApiError> {
    let projects = ctx.node_tree().get_all_projects().await?;
    Ok(to_nodes(projects))
}

#[utoipa::path(post, path = "/api/nodes", tag = "Nodes", request_body = CreateNodeRequest,
    responses(
        (status = 201, body = Node),
        (status = 400, body = ErrorBody),
        (status = 404, body = ErrorBody)
    ))]
pub async fn create_node(
    State(ctx): State<AppContext>,
    ApiJson(req): ApiJson<CreateNodeRequest>,
) -> Result<(StatusCode, Json<Node>), ApiError> {
    let node = ctx.node_tree().create_node(req.into_input()?).await?;
    Ok((StatusCode::CREATED, Json(node.into())))
}

#[utoipa::path(get, path = "/api/nodes/{id}", tag = "Nodes",
    params(("id" = Uuid, Path, description = "Node id")),
    responses((status = 200, body = Node), (status = 404, body = ErrorBody)))]
pub async fn get_node(
    State(ctx): State<AppContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Node>, ApiError> {
    match ctx.node_tree().get_node_by_id(id).await? {
        Some(node) => Ok(Json(node.into())),
        None => Err(ApiError::NotFound(format!("node not found: {}", id))),
    }
}

#[utoipa::path(patch, path = "/api/nodes/{id}", tag = "Nodes", request_body = UpdateNodeRequest,
    params(("id" = Uuid, Path, description = "Node id")),
    responses(
        (status = 200, body = Node),
        (status = 400, body = ErrorBody),
        (status = 404, body = ErrorBody)
    ))]
pub async fn update_node(
    State(ctx): State<AppContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateNodeRequest>,
) -> Result<Json<Node>, ApiError> {
    let node = ctx.node_tree().update_node(id, req.into()).await?;
    Ok(Json(node.into()))
}

#[utoipa::path(delete, path = "/api/nodes/{id}", tag = "Nodes",
    params(("id" = Uuid, Path, description = "Node id")),
    responses((status = 204, description = "No content")))]
pub async fn delete_node(
    State(ctx): State<AppContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    ctx.node_tree().delete_node(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/api/nodes/{id}/children", tag = "Nodes",
    params(("id" = Uuid, Path, description = "Parent node id")),
    responses((status = 200, body = [Node])))]
pub async fn list_children(
    State(ctx): State<AppContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Vec<Node>>, ApiError> {
    let children = ctx.node_tree().get_nodes_by_parent_id(id).await?;
    Ok(to_nodes(children))
}

#[utoipa::path(get, path = "/api/nodes/{id}/descendants", tag = "Nodes",
    params(
        ("id" = Uuid, Path, description = "Node id"),
        ("max_depth" = Option<usize>, Query, description = "1 = direct children only; omitted = whole subtree")
    ),
    responses((status = 200, body = [Node]), (status = 404, body = ErrorBody)))]
pub async fn list_descendants(
    State(ctx): State<AppContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(q): ApiQuery<DescendantsQuery>,
) -> Result<Json<Vec<Node>>, ApiError> {
    let nodes = ctx.node_tree().get_descendants(id, q.max_depth).await?;
    Ok(to_nodes(nodes))
}

#[utoipa::path(post, path = "/api/nodes/{id}/move", tag = "Nodes", request_body = MoveNodeRequest,
    params(("id" = Uuid, Path, description = "Node to move")),
    responses(
        (status = 200, body = Node),
        (status = 400, body = ErrorBody),
        (status = 404, body = ErrorBody)
    ))]
pub async fn move_node(
    State(ctx): State<AppContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<MoveNodeRequest>,
) -> Result<Json<Node>, ApiError> {
    let node = ctx
        .node_tree()
        .move_node(id, req.new_parent_id, req.position)
        .await?;
    Ok(Json(node.into()))
}

#[utoipa::path(post, path = "/api/nodes/{id}/copy", tag = "Nodes", request_body = CopyNodeRequest,
    params(("id" = Uuid, Path, description = "Root of the subtree to copy")),
    responses(
        (status = 201, body = Node),
        (status = 400, body = ErrorBody),
        (status = 404, body = ErrorBody)
    ))]
pub async fn copy_node(
    State(ctx): State<AppContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CopyNodeRequest>,
) -> Result<(StatusCode, Json<Node>), ApiError> {
    let node = ctx.node_tree().copy_node(id, req.target_parent_id).await?;
    Ok((StatusCode::CREATED, Json(node.into())))
}

#[utoipa::path(put, path = "/api/nodes/{id}/children/order", tag = "Nodes",
    request_body = ReorderChildrenRequest,
    params(("id" = Uuid, Path, description = "Parent node id")),
    responses((status = 204, description = "No content"), (status = 404, body = ErrorBody)))]
pub async fn reorder_children(
    State(ctx): State<AppContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ReorderChildrenRequest>,
) -> Result<StatusCode, ApiError> {
    ctx.node_tree()
        .reorder_children(id, &req.ordered_child_ids)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/api/slug", tag = "Nodes",
    params(("name" = String, Query, description = "Display name")),
    responses((status = 200, body = SlugResponse)))]
pub async fn slug_for(ApiQuery(q): ApiQuery<SlugQuery>) -> Json<SlugResponse> {
    Json(SlugResponse {
        slug: generate_slug(&q.name),
    })
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/projects", get(list_projects))
        .route("/nodes", post(create_node))
        .route(
            "/nodes/:id",
            get(get_node).patch(update_node).delete(delete_node),
        )
        .route("/nodes/:id/children", get(list_children))
        .route("/nodes/:id/descendants", get(list_descendants))
        .route("/nodes/:id/move", post(move_node))
        .route("/nodes/:id/copy", post(copy_node))
        .route("/nodes/:id/children/order", put(reorder_children))
        .route("/slug", get(slug_for))
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_distinguishes_null_from_missing_content() {
        let missing: UpdateNodeRequest = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert!(missing.content.is_none());

        let cleared: UpdateNodeRequest = serde_json::from_str(r#"{"content":null}"#).unwrap();
        assert_eq!(cleared.content, Some(serde_json::Value::Null));

        let set: UpdateNodeRequest = serde_json::from_str(r#"{"content":{"a":1}}"#).unwrap();
        assert_eq!(set.content, Some(serde_json::json!({"a": 1})));
    }

    #[test]
    fn create_request_rejects_unknown_type() {
        let req: CreateNodeRequest =
            serde_json::from_str(r#"{"type":"chapter","name":"One"}"#).unwrap();
        assert!(matches!(req.into_input(), Err(ApiError::BadRequest(_))));
    }
}
