use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::AppJson;
use crate::handlers::{deleted, found};
use crate::policy::{Action, Resource};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::user::{self, Role};
use serde::{Deserialize, Serialize};
use store::users::{self, NewUser, UserChanges};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

/// User response model; the password hash never leaves the server
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            role: model.role,
            created_at: model.created_at,
        }
    }
}

/// Request body for changing a password
#[derive(Deserialize, Serialize, ToSchema)]
pub struct PasswordChangeRequest {
    pub password: String,
}

/// Get all users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<UserResponse>>),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_users(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<UserResponse>>>> {
    auth.require(Resource::Users, Action::Read)?;

    let users = users::get_all(&state.db).await?;
    debug!("Retrieved {} users", users.len());
    let data = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Users retrieved successfully")))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn create_user(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<NewUser>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    auth.require(Resource::Users, Action::Create)?;

    let user = users::create(&state.db, request).await?;
    info!("User created successfully with ID: {}", user.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(UserResponse::from(user), "User created successfully")),
    ))
}

/// Get a specific user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_user(
    auth: AuthUser,
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    auth.require(Resource::Users, Action::Read)?;

    let user = found(users::get_by_id(&state.db, user_id).await?, "User", user_id)?;
    Ok(Json(ApiResponse::new(UserResponse::from(user), "User retrieved successfully")))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = UserChanges,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn update_user(
    auth: AuthUser,
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    AppJson(request): AppJson<UserChanges>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    auth.require(Resource::Users, Action::Update)?;

    let user = found(users::update(&state.db, user_id, request).await?, "User", user_id)?;
    info!("User {} updated", user.id);
    Ok(Json(ApiResponse::new(UserResponse::from(user), "User updated successfully")))
}

/// Change a password. Users may change their own; admins anyone's.
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/password",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = PasswordChangeRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<UserResponse>),
        (status = 400, description = "Password too short", body = ErrorResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state, request), fields(caller = auth.user.id))]
pub async fn change_password(
    auth: AuthUser,
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    AppJson(request): AppJson<PasswordChangeRequest>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    if auth.user.id != user_id {
        auth.require(Resource::Users, Action::Update)?;
    }

    let user = found(
        users::set_password(&state.db, user_id, &request.password).await?,
        "User",
        user_id,
    )?;
    Ok(Json(ApiResponse::new(UserResponse::from(user), "Password changed successfully")))
}

/// Delete a user together with their profile and sessions
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn delete_user(
    auth: AuthUser,
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(Resource::Users, Action::Delete)?;

    let message = deleted(users::delete(&state.db, user_id).await?, "User", user_id)?;
    info!("{}", message);
    Ok(Json(ApiResponse::new(message, "User deleted successfully")))
}
