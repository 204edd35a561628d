//! Shared fixtures for the store tests.

use chrono::NaiveDate;
use migration::{Migrator, MigratorTrait};
use model::entities::{academic_period, course, department, student, subject, teacher, user};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};
use std::sync::Once;

static TRACING: Once = Once::new();

pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

pub async fn setup_db() -> DatabaseConnection {
    init_test_tracing();
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");
    Migrator::up(&db, None).await.expect("Migrations failed.");
    db
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn create_user(db: &DatabaseConnection, email: &str, role: user::Role) -> user::Model {
    user::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set("unused".to_string()),
        name: Set(email.to_string()),
        role: Set(role),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_student(db: &DatabaseConnection, email: &str, code: &str) -> student::Model {
    let account = create_user(db, email, user::Role::Student).await;
    student::ActiveModel {
        user_id: Set(account.id),
        student_code: Set(code.to_string()),
        grade_level: Set("10A".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// A department, an active period, a subject, a teacher, a student and a course
/// linking them together.
pub struct Campus {
    pub department: department::Model,
    pub period: academic_period::Model,
    pub subject: subject::Model,
    pub teacher: teacher::Model,
    pub student: student::Model,
    pub course: course::Model,
}

pub async fn campus(db: &DatabaseConnection) -> Campus {
    campus_with_capacity(db, 30).await
}

pub async fn campus_with_capacity(db: &DatabaseConnection, max_students: i32) -> Campus {
    let department = department::ActiveModel {
        name: Set("Sciences".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    let period = academic_period::ActiveModel {
        name: Set("2024 Fall".to_string()),
        start_date: Set(date(2024, 9, 1)),
        end_date: Set(date(2024, 12, 20)),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    let subject = subject::ActiveModel {
        name: Set("Calculus".to_string()),
        code: Set("CALC101".to_string()),
        credits: Set(4),
        department_id: Set(Some(department.id)),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    let teacher_user = create_user(db, "teacher@example.com", user::Role::Teacher).await;
    let teacher = teacher::ActiveModel {
        user_id: Set(teacher_user.id),
        teacher_code: Set("TCH-00001".to_string()),
        department_id: Set(Some(department.id)),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    let student = create_student(db, "student@example.com", "STU-00001").await;

    let course = course::ActiveModel {
        subject_id: Set(subject.id),
        teacher_id: Set(teacher.id),
        academic_period_id: Set(period.id),
        course_code: Set("CALC101-A".to_string()),
        max_students: Set(max_students),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    Campus {
        department,
        period,
        subject,
        teacher,
        student,
        course,
    }
}
