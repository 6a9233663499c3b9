use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::bootstrap::app_context::AppContext;

pub mod error;
pub mod extract;
pub mod health;
pub mod nodes;
pub mod settings;

#[derive(OpenApi)]
#[openapi(
    paths(
        nodes::list_projects,
        nodes::create_node,
        nodes::get_node,
        nodes::update_node,
        nodes::delete_node,
        nodes::list_children,
        nodes::list_descendants,
        nodes::move_node,
        nodes::copy_node,
        nodes::reorder_children,
        nodes::slug_for,
        settings::list_settings,
        settings::get_setting,
        settings::put_setting,
        settings::delete_setting,
        health::health,
    ),
    components(schemas(
        nodes::Node,
        nodes::CreateNodeRequest,
        nodes::UpdateNodeRequest,
        nodes::MoveNodeRequest,
        nodes::CopyNodeRequest,
        nodes::ReorderChildrenRequest,
        nodes::SlugResponse,
        settings::Setting,
        settings::PutSettingRequest,
        health::HealthResp,
        error::ErrorBody,
    )),
    tags(
        (name = "Nodes", description = "Project / folder / item tree"),
        (name = "Settings", description = "Encrypted key-value settings"),
        (name = "Health", description = "System health checks")
    )
)]
pub struct ApiDoc;

/// All API routes plus the OpenAPI document and Swagger UI. Transport layers
/// (CORS, tracing) are added by the binary.
pub fn router(ctx: AppContext) -> Router {
    let api = Router::new()
        .merge(health::routes(ctx.clone()))
        .merge(nodes::routes(ctx.clone()))
        .merge(settings::routes(ctx));
    Router::new()
        .nest("/api", api)
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
}
