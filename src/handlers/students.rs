use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::AppJson;
use crate::handlers::{courses::CourseResponse, deleted, found, users::UserResponse};
use crate::policy::{Action, Resource};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use model::entities::student::{self, StudentStatus};
use serde::{Deserialize, Serialize};
use store::students::{self, NewStudent, NewStudentAccount, StudentChanges};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentResponse {
    pub id: i32,
    pub user_id: i32,
    pub student_code: String,
    pub grade_level: String,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub enrollment_date: NaiveDate,
    pub status: StudentStatus,
    pub created_at: DateTime<Utc>,
}

impl From<student::Model> for StudentResponse {
    fn from(model: student::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            student_code: model.student_code,
            grade_level: model.grade_level,
            date_of_birth: model.date_of_birth,
            address: model.address,
            phone: model.phone,
            enrollment_date: model.enrollment_date,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

/// Account and student profile created together
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentAccountResponse {
    pub user: UserResponse,
    pub student: StudentResponse,
}

/// Get all students
#[utoipa::path(
    get,
    path = "/api/v1/students",
    tag = "students",
    responses(
        (status = 200, description = "Students retrieved successfully", body = ApiResponse<Vec<StudentResponse>>),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_students(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<StudentResponse>>>> {
    auth.require(Resource::Students, Action::Read)?;

    let students = students::get_all(&state.db).await?;
    debug!("Retrieved {} students", students.len());
    let data = students.into_iter().map(StudentResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Students retrieved successfully")))
}

/// Create a student profile for an existing student account
#[utoipa::path(
    post,
    path = "/api/v1/students",
    tag = "students",
    request_body = NewStudent,
    responses(
        (status = 201, description = "Student created successfully", body = ApiResponse<StudentResponse>),
        (status = 400, description = "Invalid request or user is not a student", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Profile or code already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn create_student(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<NewStudent>,
) -> ApiResult<(StatusCode, Json<ApiResponse<StudentResponse>>)> {
    auth.require(Resource::Students, Action::Create)?;

    let student = students::create(&state.db, request).await?;
    info!("Student {} ({}) created", student.id, student.student_code);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StudentResponse::from(student), "Student created successfully")),
    ))
}

/// Create a student account and profile in one step
#[utoipa::path(
    post,
    path = "/api/v1/students/accounts",
    tag = "students",
    request_body = NewStudentAccount,
    responses(
        (status = 201, description = "Student account created successfully", body = ApiResponse<StudentAccountResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email or code already used", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn create_student_account(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<NewStudentAccount>,
) -> ApiResult<(StatusCode, Json<ApiResponse<StudentAccountResponse>>)> {
    auth.require(Resource::Students, Action::Create)?;
    auth.require(Resource::Users, Action::Create)?;

    let (user, student) = students::create_with_user(&state.db, request).await?;
    info!("Student account {} created with profile {}", user.id, student.id);
    let response = StudentAccountResponse {
        user: UserResponse::from(user),
        student: StudentResponse::from(student),
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(response, "Student account created successfully")),
    ))
}

/// Get a student by ID
#[utoipa::path(
    get,
    path = "/api/v1/students/{student_id}",
    tag = "students",
    params(("student_id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student retrieved successfully", body = ApiResponse<StudentResponse>),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_student(
    auth: AuthUser,
    Path(student_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<StudentResponse>>> {
    auth.require(Resource::Students, Action::Read)?;

    let student = found(students::get_by_id(&state.db, student_id).await?, "Student", student_id)?;
    Ok(Json(ApiResponse::new(StudentResponse::from(student), "Student retrieved successfully")))
}

/// Update a student profile
#[utoipa::path(
    put,
    path = "/api/v1/students/{student_id}",
    tag = "students",
    params(("student_id" = i32, Path, description = "Student ID")),
    request_body = StudentChanges,
    responses(
        (status = 200, description = "Student updated successfully", body = ApiResponse<StudentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn update_student(
    auth: AuthUser,
    Path(student_id): Path<i32>,
    State(state): State<AppState>,
    AppJson(request): AppJson<StudentChanges>,
) -> ApiResult<Json<ApiResponse<StudentResponse>>> {
    auth.require(Resource::Students, Action::Update)?;

    let student = found(
        students::update(&state.db, student_id, request).await?,
        "Student",
        student_id,
    )?;
    info!("Student {} updated", student.id);
    Ok(Json(ApiResponse::new(StudentResponse::from(student), "Student updated successfully")))
}

/// Delete a student profile with its enrollments, grades and attendance
#[utoipa::path(
    delete,
    path = "/api/v1/students/{student_id}",
    tag = "students",
    params(("student_id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn delete_student(
    auth: AuthUser,
    Path(student_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(Resource::Students, Action::Delete)?;

    let message = deleted(students::delete(&state.db, student_id).await?, "Student", student_id)?;
    Ok(Json(ApiResponse::new(message, "Student deleted successfully")))
}

/// Courses the student is enrolled in
#[utoipa::path(
    get,
    path = "/api/v1/students/{student_id}/courses",
    tag = "students",
    params(("student_id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Courses retrieved successfully", body = ApiResponse<Vec<CourseResponse>>),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_student_courses(
    auth: AuthUser,
    Path(student_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<CourseResponse>>>> {
    auth.require(Resource::Courses, Action::Read)?;

    let courses = students::courses_of(&state.db, student_id).await?;
    let data = courses.into_iter().map(CourseResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Courses retrieved successfully")))
}
