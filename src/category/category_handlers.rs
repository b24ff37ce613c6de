use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    error::{AppJson, Result},
    middleware::AuthUser,
    state::AppState,
};
use super::category_dto::CreateCategoryRequest;

/// List category names, seeding the registry on first use
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "categories",
    responses(
        (status = 200, description = "Category names", body = Vec<String>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let names = state.category_service.list_names().await?;

    Ok((StatusCode::OK, Json(names)))
}

/// Add a category
#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category registered", body = Category),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    AuthUser(_identity): AuthUser,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse> {
    let payload = payload.normalized();
    payload.validate()?;

    let category = state.category_service.add(&payload.name).await?;

    Ok((StatusCode::CREATED, Json(category)))
}
