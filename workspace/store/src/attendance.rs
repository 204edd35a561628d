//! Daily attendance of an enrollment. There is at most one record per
//! enrollment and date; [`record`] overwrites the existing one.

use chrono::{NaiveDate, Utc};
use model::entities::attendance::{ActiveModel, AttendanceStatus, Column, Entity, Model};
use model::entities::enrollment;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::crud::{self, set_if_some, Patch};
use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewAttendance {
    pub enrollment_id: i32,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AttendanceStatus>,
    #[serde(default, deserialize_with = "crate::patch::nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
}

impl Patch<ActiveModel> for AttendanceChanges {
    fn apply(self, active: &mut ActiveModel) {
        set_if_some!(active, date, self.date);
        set_if_some!(active, status, self.status);
        set_if_some!(active, notes, self.notes);
    }
}

/// Status counts for one enrollment. Only `present` counts as attended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub enrollment_id: i32,
    pub total: u32,
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub excused: u32,
    /// present / total, 0 when there are no records
    pub rate: f64,
    /// rate in percent, rounded to one decimal
    pub percentage: f64,
}

pub fn summarize(enrollment_id: i32, records: &[Model]) -> AttendanceSummary {
    let mut summary = AttendanceSummary {
        enrollment_id,
        total: 0,
        present: 0,
        absent: 0,
        late: 0,
        excused: 0,
        rate: 0.0,
        percentage: 0.0,
    };
    for record in records {
        summary.total += 1;
        match record.status {
            AttendanceStatus::Present => summary.present += 1,
            AttendanceStatus::Absent => summary.absent += 1,
            AttendanceStatus::Late => summary.late += 1,
            AttendanceStatus::Excused => summary.excused += 1,
        }
    }
    if summary.total > 0 {
        summary.rate = f64::from(summary.present) / f64::from(summary.total);
        summary.percentage = (summary.rate * 1000.0).round() / 10.0;
    }
    summary
}

pub async fn get_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Model>> {
    crud::find_all::<Entity, _>(db).await
}

pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Model>> {
    crud::find_by_id::<Entity, _>(db, id).await
}

pub async fn get_by_enrollment<C: ConnectionTrait>(db: &C, enrollment_id: i32) -> Result<Vec<Model>> {
    Ok(Entity::find()
        .filter(Column::EnrollmentId.eq(enrollment_id))
        .order_by_asc(Column::Date)
        .all(db)
        .await?)
}

pub async fn summary<C: ConnectionTrait>(db: &C, enrollment_id: i32) -> Result<AttendanceSummary> {
    if enrollment::Entity::find_by_id(enrollment_id).one(db).await?.is_none() {
        return Err(StoreError::not_found("Enrollment", enrollment_id));
    }
    let records = get_by_enrollment(db, enrollment_id).await?;
    Ok(summarize(enrollment_id, &records))
}

/// Inserts a record; a second record for the same enrollment and date is a conflict.
#[instrument(skip(db))]
pub async fn create<C: ConnectionTrait>(db: &C, new: NewAttendance) -> Result<Model> {
    new.validate()?;
    let record = ActiveModel {
        enrollment_id: Set(new.enrollment_id),
        date: Set(new.date),
        status: Set(new.status),
        notes: Set(new.notes),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Attendance {} recorded for enrollment {}", record.id, record.enrollment_id);
    Ok(record)
}

/// Inserts or overwrites the record of the enrollment for that date.
#[instrument(skip(db))]
pub async fn record<C>(db: &C, new: NewAttendance) -> Result<Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    new.validate()?;

    let txn = db.begin().await?;
    if enrollment::Entity::find_by_id(new.enrollment_id).one(&txn).await?.is_none() {
        return Err(StoreError::not_found("Enrollment", new.enrollment_id));
    }

    let row = ActiveModel {
        enrollment_id: Set(new.enrollment_id),
        date: Set(new.date),
        status: Set(new.status),
        notes: Set(new.notes),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    Entity::insert(row)
        .on_conflict(
            OnConflict::columns([Column::EnrollmentId, Column::Date])
                .update_columns([Column::Status, Column::Notes])
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

    let stored = Entity::find()
        .filter(Column::EnrollmentId.eq(new.enrollment_id))
        .filter(Column::Date.eq(new.date))
        .one(&txn)
        .await?
        .ok_or_else(|| StoreError::NotFound("Attendance record vanished after upsert".to_string()))?;
    txn.commit().await?;

    debug!("Attendance for enrollment {} on {} is {:?}", stored.enrollment_id, stored.date, stored.status);
    Ok(stored)
}

#[instrument(skip(db))]
pub async fn update<C: ConnectionTrait>(db: &C, id: i32, changes: AttendanceChanges) -> Result<Option<Model>> {
    changes.validate()?;
    crud::update_by_id::<Entity, _, _>(db, id, changes).await
}

#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool> {
    crud::delete_by_id::<Entity, _>(db, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrollments::{self, NewEnrollment};
    use crate::testing::{campus, date, setup_db};

    async fn enrolled(db: &sea_orm::DatabaseConnection) -> enrollment::Model {
        let campus = campus(db).await;
        enrollments::enroll(
            db,
            NewEnrollment {
                student_id: campus.student.id,
                course_id: campus.course.id,
            },
        )
        .await
        .unwrap()
    }

    fn entry(enrollment_id: i32, day: NaiveDate, status: AttendanceStatus) -> NewAttendance {
        NewAttendance {
            enrollment_id,
            date: day,
            status,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_rate_over_three_days() {
        let db = setup_db().await;
        let enrollment = enrolled(&db).await;

        create(&db, entry(enrollment.id, date(2024, 9, 2), AttendanceStatus::Present)).await.unwrap();
        create(&db, entry(enrollment.id, date(2024, 9, 3), AttendanceStatus::Absent)).await.unwrap();
        create(&db, entry(enrollment.id, date(2024, 9, 4), AttendanceStatus::Late)).await.unwrap();

        let summary = summary(&db, enrollment.id).await.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.present, 1);
        assert_eq!(summary.absent, 1);
        assert_eq!(summary.late, 1);
        assert_eq!(summary.excused, 0);
        assert!((summary.rate - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.percentage, 33.3);
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(9, &[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.rate, 0.0);
        assert_eq!(summary.percentage, 0.0);
    }

    #[tokio::test]
    async fn test_same_day_twice_conflicts() {
        let db = setup_db().await;
        let enrollment = enrolled(&db).await;
        let day = date(2024, 9, 2);

        create(&db, entry(enrollment.id, day, AttendanceStatus::Present)).await.unwrap();
        let again = create(&db, entry(enrollment.id, day, AttendanceStatus::Absent)).await;
        assert!(matches!(again, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_record_upserts() {
        let db = setup_db().await;
        let enrollment = enrolled(&db).await;
        let day = date(2024, 9, 2);

        let first = record(&db, entry(enrollment.id, day, AttendanceStatus::Absent)).await.unwrap();
        let second = record(
            &db,
            NewAttendance {
                notes: Some("doctor's note".to_string()),
                ..entry(enrollment.id, day, AttendanceStatus::Excused)
            },
        )
        .await
        .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.status, AttendanceStatus::Excused);
        assert_eq!(second.notes.as_deref(), Some("doctor's note"));
        assert_eq!(get_by_enrollment(&db, enrollment.id).await.unwrap().len(), 1);

        let missing = record(&db, entry(999, day, AttendanceStatus::Present)).await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = setup_db().await;
        let enrollment = enrolled(&db).await;
        let before = create(
            &db,
            NewAttendance {
                notes: Some("bus".to_string()),
                ..entry(enrollment.id, date(2024, 9, 2), AttendanceStatus::Late)
            },
        )
        .await
        .unwrap();

        let after = update(
            &db,
            before.id,
            AttendanceChanges {
                status: Some(AttendanceStatus::Present),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(after.status, AttendanceStatus::Present);
        assert_eq!(after.notes, before.notes);
        assert_eq!(after.date, before.date);

        assert!(delete(&db, before.id).await.unwrap());
        assert!(get_by_id(&db, before.id).await.unwrap().is_none());
    }
}
