use crate::handlers::{
    academic_periods::{
        activate_academic_period, create_academic_period, delete_academic_period, get_academic_period,
        get_academic_periods, get_active_academic_period, update_academic_period,
    },
    attendance::{
        create_attendance, delete_attendance, get_attendance, get_attendance_records, record_attendance,
        update_attendance,
    },
    auth::{login, logout, me, register},
    courses::{create_course, delete_course, get_course, get_course_schedules, get_courses, update_course},
    dashboard::get_statistics,
    departments::{
        create_department, delete_department, get_department, get_department_subjects,
        get_department_teachers, get_departments, update_department,
    },
    enrollments::{
        create_enrollment, delete_enrollment, finalize_enrollment, get_enrollment,
        get_enrollment_attendance, get_enrollment_attendance_summary, get_enrollment_average,
        get_enrollment_grades, get_enrollments, update_enrollment,
    },
    grades::{create_grade, delete_grade, get_grade, get_grades, update_grade},
    health::health_check,
    schedules::{create_schedule, delete_schedule, get_schedule, get_schedules, update_schedule},
    students::{
        create_student, create_student_account, delete_student, get_student, get_student_courses,
        get_students, update_student,
    },
    subjects::{create_subject, delete_subject, get_subject, get_subjects, update_subject},
    teachers::{
        create_teacher, create_teacher_account, delete_teacher, get_teacher, get_teachers, update_teacher,
    },
    users::{change_password, create_user, delete_user, get_user, get_users, update_user},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/me", get(me))
        // Users
        .route("/api/v1/users", get(get_users).post(create_user))
        .route(
            "/api/v1/users/:user_id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/v1/users/:user_id/password", put(change_password))
        // Departments
        .route("/api/v1/departments", get(get_departments).post(create_department))
        .route(
            "/api/v1/departments/:department_id",
            get(get_department).put(update_department).delete(delete_department),
        )
        .route("/api/v1/departments/:department_id/subjects", get(get_department_subjects))
        .route("/api/v1/departments/:department_id/teachers", get(get_department_teachers))
        // Academic periods
        .route(
            "/api/v1/academic-periods",
            get(get_academic_periods).post(create_academic_period),
        )
        .route("/api/v1/academic-periods/active", get(get_active_academic_period))
        .route(
            "/api/v1/academic-periods/:period_id",
            get(get_academic_period)
                .put(update_academic_period)
                .delete(delete_academic_period),
        )
        .route(
            "/api/v1/academic-periods/:period_id/activate",
            post(activate_academic_period),
        )
        // Subjects
        .route("/api/v1/subjects", get(get_subjects).post(create_subject))
        .route(
            "/api/v1/subjects/:subject_id",
            get(get_subject).put(update_subject).delete(delete_subject),
        )
        // Teachers
        .route("/api/v1/teachers", get(get_teachers).post(create_teacher))
        .route("/api/v1/teachers/accounts", post(create_teacher_account))
        .route(
            "/api/v1/teachers/:teacher_id",
            get(get_teacher).put(update_teacher).delete(delete_teacher),
        )
        // Students
        .route("/api/v1/students", get(get_students).post(create_student))
        .route("/api/v1/students/accounts", post(create_student_account))
        .route(
            "/api/v1/students/:student_id",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/api/v1/students/:student_id/courses", get(get_student_courses))
        // Courses
        .route("/api/v1/courses", get(get_courses).post(create_course))
        .route(
            "/api/v1/courses/:course_id",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/api/v1/courses/:course_id/schedules", get(get_course_schedules))
        // Enrollments
        .route("/api/v1/enrollments", get(get_enrollments).post(create_enrollment))
        .route(
            "/api/v1/enrollments/:enrollment_id",
            get(get_enrollment).put(update_enrollment).delete(delete_enrollment),
        )
        .route("/api/v1/enrollments/:enrollment_id/grades", get(get_enrollment_grades))
        .route("/api/v1/enrollments/:enrollment_id/average", get(get_enrollment_average))
        .route("/api/v1/enrollments/:enrollment_id/finalize", post(finalize_enrollment))
        .route(
            "/api/v1/enrollments/:enrollment_id/attendance",
            get(get_enrollment_attendance),
        )
        .route(
            "/api/v1/enrollments/:enrollment_id/attendance/summary",
            get(get_enrollment_attendance_summary),
        )
        // Grades
        .route("/api/v1/grades", get(get_grades).post(create_grade))
        .route(
            "/api/v1/grades/:grade_id",
            get(get_grade).put(update_grade).delete(delete_grade),
        )
        // Attendance
        .route("/api/v1/attendance", get(get_attendance_records).post(create_attendance))
        .route("/api/v1/attendance/record", post(record_attendance))
        .route(
            "/api/v1/attendance/:attendance_id",
            get(get_attendance).put(update_attendance).delete(delete_attendance),
        )
        // Schedules
        .route("/api/v1/schedules", get(get_schedules).post(create_schedule))
        .route(
            "/api/v1/schedules/:schedule_id",
            get(get_schedule).put(update_schedule).delete(delete_schedule),
        )
        // Dashboard
        .route("/api/v1/dashboard/statistics", get(get_statistics))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
