//! Enrollments of students in courses.
//!
//! Enrolling counts the occupied seats and inserts in the same transaction.
//! On backends with configurable isolation the transaction runs SERIALIZABLE,
//! SQLite already serializes writers. The (student, course) pair is also
//! protected by a unique index.

use rust_decimal::Decimal;
use model::entities::enrollment::{ActiveModel, Column, Entity, EnrollmentStatus, Model};
use model::entities::{course, student};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseTransaction,
    EntityTrait, IsolationLevel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::courses;
use crate::crud::{self, set_if_some, Patch};
use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEnrollment {
    pub student_id: i32,
    pub course_id: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EnrollmentStatus>,
    #[serde(default, deserialize_with = "crate::patch::nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub final_grade: Option<Option<Decimal>>,
}

impl Patch<ActiveModel> for EnrollmentChanges {
    fn apply(self, active: &mut ActiveModel) {
        set_if_some!(active, status, self.status);
        set_if_some!(active, final_grade, self.final_grade);
    }
}

pub async fn get_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Model>> {
    Ok(Entity::find().order_by_asc(Column::Id).all(db).await?)
}

pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Model>> {
    crud::find_by_id::<Entity, _>(db, id).await
}

pub async fn get_by_student<C: ConnectionTrait>(db: &C, student_id: i32) -> Result<Vec<Model>> {
    Ok(Entity::find()
        .filter(Column::StudentId.eq(student_id))
        .order_by_asc(Column::EnrollmentDate)
        .all(db)
        .await?)
}

pub async fn get_by_course<C: ConnectionTrait>(db: &C, course_id: i32) -> Result<Vec<Model>> {
    Ok(Entity::find()
        .filter(Column::CourseId.eq(course_id))
        .order_by_asc(Column::EnrollmentDate)
        .all(db)
        .await?)
}

async fn begin_serializable<C>(db: &C) -> Result<DatabaseTransaction>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = match db.get_database_backend() {
        DatabaseBackend::Sqlite => db.begin().await?,
        _ => {
            db.begin_with_config(Some(IsolationLevel::Serializable), None)
                .await?
        }
    };
    Ok(txn)
}

fn already_enrolled(new: &NewEnrollment) -> StoreError {
    StoreError::Conflict(format!(
        "Student {} is already enrolled in course {}",
        new.student_id, new.course_id
    ))
}

/// Enrolls a student, enforcing the course capacity. A second enrollment of
/// the same student in the same course is a conflict.
#[instrument(skip(db))]
pub async fn enroll<C>(db: &C, new: NewEnrollment) -> Result<Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = begin_serializable(db).await?;

    let course = course::Entity::find_by_id(new.course_id)
        .one(&txn)
        .await?
        .ok_or_else(|| StoreError::not_found("Course", new.course_id))?;
    if student::Entity::find_by_id(new.student_id).one(&txn).await?.is_none() {
        return Err(StoreError::not_found("Student", new.student_id));
    }

    let existing = Entity::find()
        .filter(Column::StudentId.eq(new.student_id))
        .filter(Column::CourseId.eq(new.course_id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        warn!("Duplicate enrollment of student {} in course {}", new.student_id, new.course_id);
        return Err(already_enrolled(&new));
    }

    let seats_taken = courses::enrolled_count(&txn, course.id).await?;
    debug!("Course {} has {}/{} seats taken", course.id, seats_taken, course.max_students);
    if seats_taken >= course.max_students.max(0) as u64 {
        warn!("Course {} is full", course.id);
        return Err(StoreError::CapacityReached {
            course_id: course.id,
            max_students: course.max_students,
        });
    }

    let enrollment = ActiveModel {
        student_id: Set(new.student_id),
        course_id: Set(new.course_id),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match StoreError::from(e) {
        StoreError::Conflict(_) => already_enrolled(&new),
        other => other,
    })?;
    txn.commit().await?;

    info!(
        "Student {} enrolled in course {} (enrollment {})",
        enrollment.student_id, enrollment.course_id, enrollment.id
    );
    Ok(enrollment)
}

/// Same as [`enroll`]; every new enrollment goes through the capacity check.
pub async fn create<C>(db: &C, new: NewEnrollment) -> Result<Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    enroll(db, new).await
}

#[instrument(skip(db))]
pub async fn update<C: ConnectionTrait>(db: &C, id: i32, changes: EnrollmentChanges) -> Result<Option<Model>> {
    changes.validate()?;
    crud::update_by_id::<Entity, _, _>(db, id, changes).await
}

pub async fn set_final_grade<C: ConnectionTrait>(
    db: &C,
    id: i32,
    final_grade: Option<Decimal>,
) -> Result<Option<Model>> {
    let changes = EnrollmentChanges {
        final_grade: Some(final_grade),
        ..Default::default()
    };
    crud::update_by_id::<Entity, _, _>(db, id, changes).await
}

/// Grades and attendance of the enrollment go with it.
#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool> {
    crud::delete_by_id::<Entity, _>(db, id).await
}
