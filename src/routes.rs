use crate::{
    category::{category_handlers, Category, CreateCategoryRequest},
    error::ErrorResponse,
    group::{
        group_handlers, CategoryCount, CreateGroupRequest, GroupResponse, GroupStats, GroupStatus,
        Member, MessageResponse, UpdateGroupRequest,
    },
    middleware::auth_middleware,
    state::AppState,
};
use axum::http::{header::{AUTHORIZATION, CONTENT_TYPE}, HeaderValue, Method};
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::group::group_handlers::list_groups,
        crate::group::group_handlers::featured_groups,
        crate::group::group_handlers::group_stats,
        crate::group::group_handlers::get_group,
        crate::group::group_handlers::list_groups_by_creator,
        crate::group::group_handlers::create_group,
        crate::group::group_handlers::update_group,
        crate::group::group_handlers::delete_group,
        crate::group::group_handlers::join_group,
        crate::category::category_handlers::list_categories,
        crate::category::category_handlers::create_category,
    ),
    components(
        schemas(
            GroupResponse,
            GroupStatus,
            GroupStats,
            CategoryCount,
            Member,
            CreateGroupRequest,
            UpdateGroupRequest,
            MessageResponse,
            Category,
            CreateCategoryRequest,
            ErrorResponse,
        )
    ),
    tags(
        (name = "groups", description = "Hobby group endpoints"),
        (name = "categories", description = "Category registry endpoints")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            )
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

async fn root() -> &'static str {
    "HobbyHub API is running"
}

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);
    let require_auth = || middleware::from_fn_with_state(state.clone(), auth_middleware);

    // Reads are public, writes need a verified identity
    let group_routes = Router::new()
        .route(
            "/",
            get(group_handlers::list_groups)
                .merge(post(group_handlers::create_group).route_layer(require_auth())),
        )
        .route("/featured", get(group_handlers::featured_groups))
        .route("/stats", get(group_handlers::group_stats))
        .route("/user/:email", get(group_handlers::list_groups_by_creator))
        .route(
            "/:id",
            get(group_handlers::get_group).merge(
                patch(group_handlers::update_group)
                    .delete(group_handlers::delete_group)
                    .route_layer(require_auth()),
            ),
        )
        .route(
            "/:id/join",
            post(group_handlers::join_group).route_layer(require_auth()),
        );

    let category_routes = Router::new().route(
        "/",
        get(category_handlers::list_categories)
            .merge(post(category_handlers::create_category).route_layer(require_auth())),
    );

    let api_routes = Router::new()
        .nest("/groups", group_routes)
        .nest("/categories", category_routes);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(root))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
