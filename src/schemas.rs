use chrono::Duration;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Lifetime of sessions opened by login and registration
    pub session_ttl: Duration,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::me,
        crate::handlers::users::get_users,
        crate::handlers::users::create_user,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::change_password,
        crate::handlers::users::delete_user,
        crate::handlers::departments::get_departments,
        crate::handlers::departments::create_department,
        crate::handlers::departments::get_department,
        crate::handlers::departments::update_department,
        crate::handlers::departments::delete_department,
        crate::handlers::departments::get_department_subjects,
        crate::handlers::departments::get_department_teachers,
        crate::handlers::academic_periods::get_academic_periods,
        crate::handlers::academic_periods::create_academic_period,
        crate::handlers::academic_periods::get_active_academic_period,
        crate::handlers::academic_periods::get_academic_period,
        crate::handlers::academic_periods::update_academic_period,
        crate::handlers::academic_periods::delete_academic_period,
        crate::handlers::academic_periods::activate_academic_period,
        crate::handlers::subjects::get_subjects,
        crate::handlers::subjects::create_subject,
        crate::handlers::subjects::get_subject,
        crate::handlers::subjects::update_subject,
        crate::handlers::subjects::delete_subject,
        crate::handlers::teachers::get_teachers,
        crate::handlers::teachers::create_teacher,
        crate::handlers::teachers::create_teacher_account,
        crate::handlers::teachers::get_teacher,
        crate::handlers::teachers::update_teacher,
        crate::handlers::teachers::delete_teacher,
        crate::handlers::students::get_students,
        crate::handlers::students::create_student,
        crate::handlers::students::create_student_account,
        crate::handlers::students::get_student,
        crate::handlers::students::update_student,
        crate::handlers::students::delete_student,
        crate::handlers::students::get_student_courses,
        crate::handlers::courses::get_courses,
        crate::handlers::courses::create_course,
        crate::handlers::courses::get_course,
        crate::handlers::courses::update_course,
        crate::handlers::courses::delete_course,
        crate::handlers::courses::get_course_schedules,
        crate::handlers::enrollments::get_enrollments,
        crate::handlers::enrollments::create_enrollment,
        crate::handlers::enrollments::get_enrollment,
        crate::handlers::enrollments::update_enrollment,
        crate::handlers::enrollments::delete_enrollment,
        crate::handlers::enrollments::get_enrollment_grades,
        crate::handlers::enrollments::get_enrollment_average,
        crate::handlers::enrollments::finalize_enrollment,
        crate::handlers::enrollments::get_enrollment_attendance,
        crate::handlers::enrollments::get_enrollment_attendance_summary,
        crate::handlers::grades::get_grades,
        crate::handlers::grades::create_grade,
        crate::handlers::grades::get_grade,
        crate::handlers::grades::update_grade,
        crate::handlers::grades::delete_grade,
        crate::handlers::attendance::get_attendance_records,
        crate::handlers::attendance::create_attendance,
        crate::handlers::attendance::record_attendance,
        crate::handlers::attendance::get_attendance,
        crate::handlers::attendance::update_attendance,
        crate::handlers::attendance::delete_attendance,
        crate::handlers::schedules::get_schedules,
        crate::handlers::schedules::create_schedule,
        crate::handlers::schedules::get_schedule,
        crate::handlers::schedules::update_schedule,
        crate::handlers::schedules::delete_schedule,
        crate::handlers::dashboard::get_statistics,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            model::entities::user::Role,
            model::entities::student::StudentStatus,
            model::entities::teacher::TeacherStatus,
            model::entities::course::CourseStatus,
            model::entities::enrollment::EnrollmentStatus,
            model::entities::attendance::AttendanceStatus,
            model::entities::schedule::DayOfWeek,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::SessionResponse,
            crate::handlers::auth::MeResponse,
            crate::handlers::users::UserResponse,
            crate::handlers::users::PasswordChangeRequest,
            crate::handlers::departments::DepartmentResponse,
            crate::handlers::academic_periods::AcademicPeriodResponse,
            crate::handlers::subjects::SubjectResponse,
            crate::handlers::teachers::TeacherResponse,
            crate::handlers::teachers::TeacherAccountResponse,
            crate::handlers::students::StudentResponse,
            crate::handlers::students::StudentAccountResponse,
            crate::handlers::courses::CourseResponse,
            crate::handlers::enrollments::EnrollmentResponse,
            crate::handlers::enrollments::AverageResponse,
            crate::handlers::grades::GradeResponse,
            crate::handlers::attendance::AttendanceResponse,
            crate::handlers::schedules::ScheduleResponse,
            store::users::NewUser,
            store::users::UserChanges,
            store::departments::NewDepartment,
            store::departments::DepartmentChanges,
            store::academic_periods::NewAcademicPeriod,
            store::academic_periods::AcademicPeriodChanges,
            store::subjects::NewSubject,
            store::subjects::SubjectChanges,
            store::teachers::NewTeacher,
            store::teachers::NewTeacherAccount,
            store::teachers::TeacherChanges,
            store::students::NewStudent,
            store::students::NewStudentAccount,
            store::students::StudentChanges,
            store::courses::NewCourse,
            store::courses::CourseChanges,
            store::enrollments::NewEnrollment,
            store::enrollments::EnrollmentChanges,
            store::grades::NewGrade,
            store::grades::GradeChanges,
            store::attendance::NewAttendance,
            store::attendance::AttendanceChanges,
            store::attendance::AttendanceSummary,
            store::schedules::NewSchedule,
            store::schedules::ScheduleChanges,
            store::dashboard::Statistics,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and sessions"),
        (name = "users", description = "User account management"),
        (name = "departments", description = "Department management"),
        (name = "academic-periods", description = "Academic period management"),
        (name = "subjects", description = "Subject catalogue"),
        (name = "teachers", description = "Teacher profiles"),
        (name = "students", description = "Student profiles"),
        (name = "courses", description = "Course offerings"),
        (name = "enrollments", description = "Enrollments, averages and final grades"),
        (name = "grades", description = "Assessment grades"),
        (name = "attendance", description = "Daily attendance"),
        (name = "schedules", description = "Weekly course schedules"),
        (name = "dashboard", description = "Headline statistics"),
    ),
    info(
        title = "Academia API",
        description = "Academic records service: students, teachers, courses, enrollments, grades and attendance",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
