use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppJson, Result},
    middleware::AuthUser,
    state::AppState,
    group::{
        group_dto::{CreateGroupRequest, MessageResponse, UpdateGroupRequest},
        group_models::{Group, GroupResponse},
    },
};

// Malformed ids cannot name a stored group.
fn parse_group_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Group not found".to_string()))
}

fn to_responses(groups: Vec<Group>) -> Vec<GroupResponse> {
    let now = Utc::now();
    groups.into_iter().map(|g| GroupResponse::at(g, now)).collect()
}

/// List all groups
#[utoipa::path(
    get,
    path = "/api/groups",
    tag = "groups",
    responses(
        (status = 200, description = "All groups", body = Vec<GroupResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_groups(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let groups = state.group_service.list_groups().await?;

    Ok((StatusCode::OK, Json(to_responses(groups))))
}

/// Newest groups, at most six
#[utoipa::path(
    get,
    path = "/api/groups/featured",
    tag = "groups",
    responses(
        (status = 200, description = "Featured groups, newest first", body = Vec<GroupResponse>)
    )
)]
pub async fn featured_groups(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let groups = state.group_service.featured_groups().await?;

    Ok((StatusCode::OK, Json(to_responses(groups))))
}

/// Summary counts across all groups
#[utoipa::path(
    get,
    path = "/api/groups/stats",
    tag = "groups",
    responses(
        (status = 200, description = "Group statistics", body = GroupStats)
    )
)]
pub async fn group_stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let stats = state.group_service.stats(Utc::now()).await?;

    Ok((StatusCode::OK, Json(stats)))
}

/// Get a specific group by ID
#[utoipa::path(
    get,
    path = "/api/groups/{group_id}",
    tag = "groups",
    params(
        ("group_id" = String, Path, description = "Group ID")
    ),
    responses(
        (status = 200, description = "Group retrieved successfully", body = GroupResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<impl IntoResponse> {
    let group = state.group_service.get_group(parse_group_id(&group_id)?).await?;

    Ok((StatusCode::OK, Json(GroupResponse::at(group, Utc::now()))))
}

/// Groups created by the given email
#[utoipa::path(
    get,
    path = "/api/groups/user/{email}",
    tag = "groups",
    params(
        ("email" = String, Path, description = "Creator email")
    ),
    responses(
        (status = 200, description = "Groups created by this user", body = Vec<GroupResponse>)
    )
)]
pub async fn list_groups_by_creator(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse> {
    let groups = state.group_service.list_groups_by_creator(&email).await?;

    Ok((StatusCode::OK, Json(to_responses(groups))))
}

/// Create a new group owned by the caller
#[utoipa::path(
    post,
    path = "/api/groups",
    tag = "groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created successfully", body = GroupResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_group(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    AppJson(payload): AppJson<CreateGroupRequest>,
) -> Result<impl IntoResponse> {
    let now = Utc::now();
    let group = state.group_service.create_group(identity, payload, now).await?;

    Ok((StatusCode::CREATED, Json(GroupResponse::at(group, now))))
}

/// Update group (creator only)
#[utoipa::path(
    patch,
    path = "/api/groups/{group_id}",
    tag = "groups",
    params(
        ("group_id" = String, Path, description = "Group ID")
    ),
    request_body = UpdateGroupRequest,
    responses(
        (status = 200, description = "Group updated successfully", body = GroupResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - Only creator can update", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_group(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(group_id): Path<String>,
    AppJson(payload): AppJson<UpdateGroupRequest>,
) -> Result<impl IntoResponse> {
    let group_id = parse_group_id(&group_id)?;

    let now = Utc::now();
    let group = state
        .group_service
        .update_group(group_id, &identity, payload, now)
        .await?;

    Ok((StatusCode::OK, Json(GroupResponse::at(group, now))))
}

/// Delete group (creator only)
#[utoipa::path(
    delete,
    path = "/api/groups/{group_id}",
    tag = "groups",
    params(
        ("group_id" = String, Path, description = "Group ID")
    ),
    responses(
        (status = 200, description = "Group deleted successfully", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - Only creator can delete", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_group(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(group_id): Path<String>,
) -> Result<impl IntoResponse> {
    let group_id = parse_group_id(&group_id)?;
    state.group_service.delete_group(group_id, &identity).await?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Group deleted successfully".to_string(),
        }),
    ))
}

/// Join a group as the caller
#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/join",
    tag = "groups",
    params(
        ("group_id" = String, Path, description = "Group ID")
    ),
    responses(
        (status = 200, description = "Joined, returns the updated group", body = GroupResponse),
        (status = 400, description = "Group inactive, full, or already joined", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn join_group(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(group_id): Path<String>,
) -> Result<impl IntoResponse> {
    let group_id = parse_group_id(&group_id)?;

    let now = Utc::now();
    let group = state.group_service.join_group(group_id, identity, now).await?;

    Ok((StatusCode::OK, Json(GroupResponse::at(group, now))))
}
