use anyhow::{Context, Result};
use chrono::NaiveDate;
use model::entities::user::Role;
use sea_orm::TransactionTrait;
use store::academic_periods::{self, NewAcademicPeriod};
use store::courses::{self, NewCourse};
use store::departments::{self, NewDepartment};
use store::enrollments::{self, NewEnrollment};
use store::students::{self, NewStudentAccount};
use store::subjects::{self, NewSubject};
use store::teachers::{self, NewTeacherAccount};
use store::users::{self, NewUser};
use tracing::{info, trace};

use crate::config::connect;

pub const ADMIN_EMAIL: &str = "admin@example.com";
const DEMO_PASSWORD: &str = "123456";

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).with_context(|| format!("invalid date {}-{}-{}", y, m, d))
}

pub async fn seed(database_url: &str) -> Result<()> {
    trace!("Entering seed function");
    let db = connect(database_url).await?;

    if users::get_by_email(&db, ADMIN_EMAIL).await?.is_some() {
        info!("{} already exists, skipping seed", ADMIN_EMAIL);
        return Ok(());
    }

    let txn = db.begin().await?;

    users::create(
        &txn,
        NewUser {
            email: ADMIN_EMAIL.to_string(),
            password: DEMO_PASSWORD.to_string(),
            name: "Administrator".to_string(),
            role: Role::Admin,
        },
    )
    .await?;

    let department = departments::create(
        &txn,
        NewDepartment {
            name: "Sciences".to_string(),
            description: Some("Mathematics, physics and chemistry".to_string()),
            head: None,
        },
    )
    .await?;

    let period = academic_periods::create(
        &txn,
        NewAcademicPeriod {
            name: "2024-2025".to_string(),
            start_date: date(2024, 9, 1)?,
            end_date: date(2025, 6, 30)?,
            is_active: true,
        },
    )
    .await?;

    let subject = subjects::create(
        &txn,
        NewSubject {
            name: "Calculus".to_string(),
            code: "CALC101".to_string(),
            description: None,
            credits: Some(4),
            department_id: Some(department.id),
        },
    )
    .await?;

    let (_, teacher) = teachers::create_with_user(
        &txn,
        NewTeacherAccount {
            email: "teacher@example.com".to_string(),
            password: DEMO_PASSWORD.to_string(),
            name: "Demo Teacher".to_string(),
            teacher_code: None,
            department_id: Some(department.id),
            specialization: Some("Mathematics".to_string()),
            phone: None,
        },
    )
    .await?;

    let (_, student) = students::create_with_user(
        &txn,
        NewStudentAccount {
            email: "student@example.com".to_string(),
            password: DEMO_PASSWORD.to_string(),
            name: "Demo Student".to_string(),
            student_code: None,
            grade_level: "10A".to_string(),
            date_of_birth: None,
            address: None,
            phone: None,
        },
    )
    .await?;

    let course = courses::create(
        &txn,
        NewCourse {
            subject_id: subject.id,
            teacher_id: teacher.id,
            academic_period_id: period.id,
            course_code: "CALC101-A".to_string(),
            max_students: Some(30),
            status: None,
        },
    )
    .await?;

    txn.commit().await?;

    // Enrollment opens its own transaction with a stricter isolation level
    enrollments::enroll(
        &db,
        NewEnrollment {
            student_id: student.id,
            course_id: course.id,
        },
    )
    .await?;

    info!(
        "Seeded demo data: log in as {}, teacher@example.com or student@example.com with password {}",
        ADMIN_EMAIL, DEMO_PASSWORD
    );
    Ok(())
}
