//! Academic periods (semesters, terms). At most one period is active at a time.

use chrono::NaiveDate;
use model::entities::academic_period::{ActiveModel, Column, Entity, Model};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::crud::{self, set_if_some, Patch};
use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_new_range"))]
pub struct NewAcademicPeriod {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Creating an active period deactivates every other period.
    #[serde(default)]
    pub is_active: bool,
}

fn validate_new_range(new: &NewAcademicPeriod) -> std::result::Result<(), ValidationError> {
    check_range(new.start_date, new.end_date)
}

fn check_range(start: NaiveDate, end: NaiveDate) -> std::result::Result<(), ValidationError> {
    if start >= end {
        let mut err = ValidationError::new("date_range");
        err.message = Some("endDate must be after startDate".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AcademicPeriodChanges {
    #[validate(length(min = 1, max = 255))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Patch<ActiveModel> for AcademicPeriodChanges {
    fn apply(self, active: &mut ActiveModel) {
        set_if_some!(active, name, self.name);
        set_if_some!(active, start_date, self.start_date);
        set_if_some!(active, end_date, self.end_date);
        set_if_some!(active, is_active, self.is_active);
    }
}

/// Newest first.
pub async fn get_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Model>> {
    Ok(Entity::find()
        .order_by_desc(Column::StartDate)
        .all(db)
        .await?)
}

pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Model>> {
    crud::find_by_id::<Entity, _>(db, id).await
}

pub async fn get_active<C: ConnectionTrait>(db: &C) -> Result<Option<Model>> {
    Ok(Entity::find()
        .filter(Column::IsActive.eq(true))
        .order_by_desc(Column::StartDate)
        .one(db)
        .await?)
}

async fn deactivate_others<C: ConnectionTrait>(db: &C, keep: Option<i32>) -> Result<u64> {
    let mut query = Entity::update_many()
        .col_expr(Column::IsActive, Expr::value(false))
        .filter(Column::IsActive.eq(true));
    if let Some(id) = keep {
        query = query.filter(Column::Id.ne(id));
    }
    let result = query.exec(db).await?;
    Ok(result.rows_affected)
}

#[instrument(skip(db))]
pub async fn create<C>(db: &C, new: NewAcademicPeriod) -> Result<Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    new.validate()?;

    let txn = db.begin().await?;
    if new.is_active {
        let deactivated = deactivate_others(&txn, None).await?;
        debug!("Deactivated {} periods before creating an active one", deactivated);
    }
    let period = ActiveModel {
        name: Set(new.name),
        start_date: Set(new.start_date),
        end_date: Set(new.end_date),
        is_active: Set(new.is_active),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!("Academic period created with ID: {}", period.id);
    Ok(period)
}

#[instrument(skip(db))]
pub async fn update<C>(db: &C, id: i32, changes: AcademicPeriodChanges) -> Result<Option<Model>>
where
    C: ConnectionTrait + TransactionTrait,
{
    changes.validate()?;

    let txn = db.begin().await?;
    let Some(existing) = Entity::find_by_id(id).one(&txn).await? else {
        return Ok(None);
    };

    let start = changes.start_date.unwrap_or(existing.start_date);
    let end = changes.end_date.unwrap_or(existing.end_date);
    check_range(start, end).map_err(|e| {
        StoreError::Validation(e.message.map(|m| m.to_string()).unwrap_or_else(|| e.code.to_string()))
    })?;

    if changes.is_active == Some(true) {
        deactivate_others(&txn, Some(id)).await?;
    }
    let updated = crud::update_by_id::<Entity, _, _>(&txn, id, changes).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Courses still referencing the period block the delete.
#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool> {
    crud::delete_by_id::<Entity, _>(db, id).await
}

/// Marks the period active and every other period inactive, atomically.
#[instrument(skip(db))]
pub async fn activate<C>(db: &C, id: i32) -> Result<Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let period = Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| StoreError::not_found("Academic period", id))?;

    let deactivated = deactivate_others(&txn, Some(id)).await?;
    let mut active: ActiveModel = period.into();
    active.is_active = Set(true);
    let period = active.update(&txn).await?;
    txn.commit().await?;

    info!("Academic period {} activated, {} others deactivated", id, deactivated);
    Ok(period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{date, setup_db};

    fn period(name: &str, start: NaiveDate, end: NaiveDate, is_active: bool) -> NewAcademicPeriod {
        NewAcademicPeriod {
            name: name.to_string(),
            start_date: start,
            end_date: end,
            is_active,
        }
    }

    #[tokio::test]
    async fn test_create_get_and_delete() {
        let db = setup_db().await;
        let created = create(&db, period("Spring", date(2025, 1, 6), date(2025, 5, 30), false))
            .await
            .unwrap();
        let fetched = get_by_id(&db, created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(!fetched.is_active);

        assert!(delete(&db, created.id).await.unwrap());
        assert!(get_by_id(&db, created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected() {
        let db = setup_db().await;
        let result = create(&db, period("Broken", date(2025, 5, 30), date(2025, 1, 6), false)).await;
        assert!(matches!(result, Err(StoreError::Validation(_))));

        let ok = create(&db, period("Fine", date(2025, 1, 6), date(2025, 5, 30), false))
            .await
            .unwrap();
        let changes = AcademicPeriodChanges {
            end_date: Some(date(2024, 12, 1)),
            ..Default::default()
        };
        assert!(matches!(update(&db, ok.id, changes).await, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_activate_keeps_a_single_active_period() {
        let db = setup_db().await;
        let fall = create(&db, period("Fall", date(2024, 9, 1), date(2024, 12, 20), true))
            .await
            .unwrap();
        let spring = create(&db, period("Spring", date(2025, 1, 6), date(2025, 5, 30), false))
            .await
            .unwrap();

        assert_eq!(get_active(&db).await.unwrap().map(|p| p.id), Some(fall.id));

        let activated = activate(&db, spring.id).await.unwrap();
        assert!(activated.is_active);
        assert_eq!(get_active(&db).await.unwrap().map(|p| p.id), Some(spring.id));
        assert!(!get_by_id(&db, fall.id).await.unwrap().unwrap().is_active);

        // Creating another active period takes over
        let summer = create(&db, period("Summer", date(2025, 6, 10), date(2025, 8, 15), true))
            .await
            .unwrap();
        let active: Vec<_> = get_all(&db).await.unwrap().into_iter().filter(|p| p.is_active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, summer.id);
    }

    #[tokio::test]
    async fn test_activate_missing_period() {
        let db = setup_db().await;
        assert!(matches!(activate(&db, 7).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let db = setup_db().await;
        create(&db, period("Old", date(2023, 9, 1), date(2023, 12, 20), false)).await.unwrap();
        create(&db, period("New", date(2025, 9, 1), date(2025, 12, 20), false)).await.unwrap();
        create(&db, period("Mid", date(2024, 9, 1), date(2024, 12, 20), false)).await.unwrap();

        let names: Vec<_> = get_all(&db).await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["New", "Mid", "Old"]);
    }

    #[tokio::test]
    async fn test_update_renames_only() {
        let db = setup_db().await;
        let created = create(&db, period("Fall", date(2024, 9, 1), date(2024, 12, 20), false))
            .await
            .unwrap();
        let updated = update(
            &db,
            created.id,
            AcademicPeriodChanges {
                name: Some("Autumn".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(updated.name, "Autumn");
        assert_eq!(updated.start_date, created.start_date);
        assert_eq!(updated.end_date, created.end_date);
        assert_eq!(updated.is_active, created.is_active);
    }
}
