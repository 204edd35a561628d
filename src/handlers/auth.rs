use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::AppJson;
use crate::handlers::{students::StudentResponse, teachers::TeacherResponse, users::UserResponse};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use model::entities::{session, user::Role};
use serde::{Deserialize, Serialize};
use store::{sessions, students, teachers, users, users::NewUser, StoreError};
use tracing::{info, instrument};
use utoipa::ToSchema;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// A bearer token and the account it belongs to
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl SessionResponse {
    fn new(session: session::Model, user: UserResponse) -> Self {
        Self {
            token: session.token,
            expires_at: session.expires_at,
            user,
        }
    }
}

/// The logged-in account with its role profile, if any
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: UserResponse,
    pub student: Option<StudentResponse>,
    pub teacher: Option<TeacherResponse>,
}

/// Self-service sign up as a student or teacher
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = NewUser,
    responses(
        (status = 201, description = "Account created and logged in", body = ApiResponse<SessionResponse>),
        (status = 400, description = "Invalid request or admin role requested", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<NewUser>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SessionResponse>>)> {
    if request.role == Role::Admin {
        return Err(ApiError::from(StoreError::Validation(
            "role: administrators are created by an administrator".to_string(),
        )));
    }

    let (registration, session) = users::register_with_session(&state.db, request, state.session_ttl).await?;
    info!("User {} registered and logged in", registration.user.id);

    let response = SessionResponse::new(session, UserResponse::from(registration.user));
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(response, "Registration successful")),
    ))
}

/// Exchange email and password for a bearer token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<SessionResponse>),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> ApiResult<Json<ApiResponse<SessionResponse>>> {
    let user = users::authenticate(&state.db, &request.email, &request.password).await?;
    let session = sessions::open(&state.db, user.id, state.session_ttl).await?;
    info!("User {} logged in", user.id);

    let response = SessionResponse::new(session, UserResponse::from(user));
    Ok(Json(ApiResponse::new(response, "Login successful")))
}

/// End the current session
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out", body = ApiResponse<String>),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn logout(auth: AuthUser, State(state): State<AppState>) -> ApiResult<Json<ApiResponse<String>>> {
    sessions::close(&state.db, &auth.token).await?;
    info!("User {} logged out", auth.user.id);
    Ok(Json(ApiResponse::new(
        "Session closed".to_string(),
        "Logout successful",
    )))
}

/// Current user with the matching student or teacher profile
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<MeResponse>),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn me(auth: AuthUser, State(state): State<AppState>) -> ApiResult<Json<ApiResponse<MeResponse>>> {
    let student = match auth.user.role {
        Role::Student => students::get_by_user_id(&state.db, auth.user.id).await?,
        _ => None,
    };
    let teacher = match auth.user.role {
        Role::Teacher => teachers::get_by_user_id(&state.db, auth.user.id).await?,
        _ => None,
    };

    let response = MeResponse {
        user: UserResponse::from(auth.user),
        student: student.map(StudentResponse::from),
        teacher: teacher.map(TeacherResponse::from),
    };
    Ok(Json(ApiResponse::new(response, "Current user retrieved successfully")))
}
