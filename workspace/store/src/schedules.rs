use chrono::NaiveTime;
use model::entities::schedule::{ActiveModel, Column, DayOfWeek, Entity, Model};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::crud::{self, set_if_some, Patch};
use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewSchedule {
    pub course_id: i32,
    pub day_of_week: DayOfWeek,
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "10:30:00")]
    pub end_time: NaiveTime,
    #[validate(length(min = 1, max = 50))]
    pub classroom: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<DayOfWeek>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub end_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "crate::patch::nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub classroom: Option<Option<String>>,
}

impl Patch<ActiveModel> for ScheduleChanges {
    fn apply(self, active: &mut ActiveModel) {
        set_if_some!(active, day_of_week, self.day_of_week);
        set_if_some!(active, start_time, self.start_time);
        set_if_some!(active, end_time, self.end_time);
        set_if_some!(active, classroom, self.classroom);
    }
}

fn check_times(start: NaiveTime, end: NaiveTime) -> Result<()> {
    if start >= end {
        warn!("Rejected slot {} - {}", start, end);
        return Err(StoreError::Validation(
            "startTime must be before endTime".to_string(),
        ));
    }
    Ok(())
}

/// Rejects a slot that overlaps another slot of the same course.
async fn check_free<C: ConnectionTrait>(db: &C, candidate: &Model) -> Result<()> {
    if let Some(clash) = get_by_course(db, candidate.course_id)
        .await?
        .into_iter()
        .filter(|slot| slot.id != candidate.id)
        .find(|slot| slot.overlaps(candidate))
    {
        return Err(StoreError::Conflict(format!(
            "Course {} already meets {:?} {}-{}",
            candidate.course_id, clash.day_of_week, clash.start_time, clash.end_time
        )));
    }
    Ok(())
}

pub async fn get_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Model>> {
    crud::find_all::<Entity, _>(db).await
}

pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Model>> {
    crud::find_by_id::<Entity, _>(db, id).await
}

pub async fn get_by_course<C: ConnectionTrait>(db: &C, course_id: i32) -> Result<Vec<Model>> {
    Ok(Entity::find()
        .filter(Column::CourseId.eq(course_id))
        .order_by_asc(Column::Id)
        .all(db)
        .await?)
}

#[instrument(skip(db))]
pub async fn create<C: ConnectionTrait>(db: &C, new: NewSchedule) -> Result<Model> {
    new.validate()?;
    check_times(new.start_time, new.end_time)?;

    let candidate = Model {
        id: 0,
        course_id: new.course_id,
        day_of_week: new.day_of_week,
        start_time: new.start_time,
        end_time: new.end_time,
        classroom: new.classroom.clone(),
        created_at: chrono::Utc::now(),
    };
    check_free(db, &candidate).await?;

    let schedule = ActiveModel {
        course_id: Set(new.course_id),
        day_of_week: Set(new.day_of_week),
        start_time: Set(new.start_time),
        end_time: Set(new.end_time),
        classroom: Set(new.classroom),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Schedule {} created for course {}", schedule.id, schedule.course_id);
    Ok(schedule)
}

#[instrument(skip(db))]
pub async fn update<C: ConnectionTrait>(db: &C, id: i32, changes: ScheduleChanges) -> Result<Option<Model>> {
    changes.validate()?;
    let Some(existing) = get_by_id(db, id).await? else {
        return Ok(None);
    };
    let candidate = Model {
        day_of_week: changes.day_of_week.unwrap_or(existing.day_of_week),
        start_time: changes.start_time.unwrap_or(existing.start_time),
        end_time: changes.end_time.unwrap_or(existing.end_time),
        ..existing
    };
    check_times(candidate.start_time, candidate.end_time)?;
    check_free(db, &candidate).await?;
    crud::update_by_id::<Entity, _, _>(db, id, changes).await
}

#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool> {
    crud::delete_by_id::<Entity, _>(db, id).await
}
