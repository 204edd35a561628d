use model::entities::course::{ActiveModel, Column, CourseStatus, Entity, Model};
use model::entities::enrollment::{self, EnrollmentStatus};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

use crate::crud::{self, set_if_some, Patch};
use crate::error::Result;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub subject_id: i32,
    pub teacher_id: i32,
    pub academic_period_id: i32,
    #[validate(length(min = 1, max = 50))]
    pub course_code: String,
    /// Defaults to 30
    #[validate(range(min = 1, max = 1000))]
    pub max_students: Option<i32>,
    pub status: Option<CourseStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CourseChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_period_id: Option<i32>,
    #[validate(length(min = 1, max = 50))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
    #[validate(range(min = 1, max = 1000))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_students: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CourseStatus>,
}

impl Patch<ActiveModel> for CourseChanges {
    fn apply(self, active: &mut ActiveModel) {
        set_if_some!(active, subject_id, self.subject_id);
        set_if_some!(active, teacher_id, self.teacher_id);
        set_if_some!(active, academic_period_id, self.academic_period_id);
        set_if_some!(active, course_code, self.course_code);
        set_if_some!(active, max_students, self.max_students);
        set_if_some!(active, status, self.status);
    }
}

pub async fn get_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Model>> {
    Ok(Entity::find().order_by_asc(Column::CourseCode).all(db).await?)
}

pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Model>> {
    crud::find_by_id::<Entity, _>(db, id).await
}

pub async fn get_by_period<C: ConnectionTrait>(db: &C, academic_period_id: i32) -> Result<Vec<Model>> {
    Ok(Entity::find()
        .filter(Column::AcademicPeriodId.eq(academic_period_id))
        .order_by_asc(Column::CourseCode)
        .all(db)
        .await?)
}

pub async fn get_by_teacher<C: ConnectionTrait>(db: &C, teacher_id: i32) -> Result<Vec<Model>> {
    Ok(Entity::find()
        .filter(Column::TeacherId.eq(teacher_id))
        .order_by_asc(Column::CourseCode)
        .all(db)
        .await?)
}

/// Number of students currently holding a seat (status `enrolled`).
pub async fn enrolled_count<C: ConnectionTrait>(db: &C, course_id: i32) -> Result<u64> {
    let count = enrollment::Entity::find()
        .filter(enrollment::Column::CourseId.eq(course_id))
        .filter(enrollment::Column::Status.eq(EnrollmentStatus::Enrolled))
        .count(db)
        .await?;
    trace!("Course {} has {} enrolled students", course_id, count);
    Ok(count)
}

#[instrument(skip(db))]
pub async fn create<C: ConnectionTrait>(db: &C, new: NewCourse) -> Result<Model> {
    new.validate()?;
    let mut active = ActiveModel {
        subject_id: Set(new.subject_id),
        teacher_id: Set(new.teacher_id),
        academic_period_id: Set(new.academic_period_id),
        course_code: Set(new.course_code),
        ..Default::default()
    };
    set_if_some!(active, max_students, new.max_students);
    set_if_some!(active, status, new.status);

    let course = active.insert(db).await?;
    info!("Course {} created with ID: {}", course.course_code, course.id);
    Ok(course)
}

#[instrument(skip(db))]
pub async fn update<C: ConnectionTrait>(db: &C, id: i32, changes: CourseChanges) -> Result<Option<Model>> {
    changes.validate()?;
    crud::update_by_id::<Entity, _, _>(db, id, changes).await
}

/// Enrollments and schedules of the course go with it.
#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool> {
    crud::delete_by_id::<Entity, _>(db, id).await
}
