//! Assessments of an enrollment and the weighted final grade derived from them.

use chrono::NaiveDate;
use model::entities::enrollment;
use model::entities::grade::{ActiveModel, Column, Entity, Model};
use rust_decimal::Decimal;
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
pub struct NewGrade {
    pub enrollment_id: i32,
    /// e.g. "exam", "homework", "project"
    #[validate(length(min = 1, max = 50))]
    pub assessment_type: String,
    /// Defaults to the assessment type
    #[validate(length(min = 1, max = 255))]
    pub assessment_name: Option<String>,
    #[schema(value_type = String, example = "85.5")]
    pub score: Decimal,
    /// Defaults to 100
    #[schema(value_type = Option<String>, example = "100")]
    pub max_score: Option<Decimal>,
    #[schema(value_type = Option<String>, example = "0.3")]
    pub weight: Option<Decimal>,
    pub assessment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GradeChanges {
    #[validate(length(min = 1, max = 50))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_type: Option<String>,
    #[validate(length(min = 1, max = 255))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub score: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub max_score: Option<Decimal>,
    #[serde(default, deserialize_with = "crate::patch::nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub weight: Option<Option<Decimal>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_date: Option<NaiveDate>,
}

impl Patch<ActiveModel> for GradeChanges {
    fn apply(self, active: &mut ActiveModel) {
        set_if_some!(active, assessment_type, self.assessment_type);
        set_if_some!(active, assessment_name, self.assessment_name);
        set_if_some!(active, score, self.score);
        set_if_some!(active, max_score, self.max_score);
        set_if_some!(active, weight, self.weight);
        set_if_some!(active, assessment_date, self.assessment_date);
    }
}

/// Largest value a `decimal(5,2)` column holds.
const COLUMN_MAX: Decimal = Decimal::from_parts(99_999, 0, 0, false, 2);

fn check_column(field: &str, value: Decimal) -> Result<()> {
    if value.abs() > COLUMN_MAX || value.normalize().scale() > 2 {
        return Err(StoreError::Validation(format!(
            "{} must be at most {} with two decimals",
            field, COLUMN_MAX
        )));
    }
    Ok(())
}

fn check_score(score: Decimal, max_score: Decimal, weight: Option<Decimal>) -> Result<()> {
    check_column("score", score)?;
    check_column("maxScore", max_score)?;
    if let Some(weight) = weight {
        check_column("weight", weight)?;
    }
    if max_score <= Decimal::ZERO {
        return Err(StoreError::Validation("maxScore must be positive".to_string()));
    }
    if score < Decimal::ZERO || score > max_score {
        return Err(StoreError::Validation(format!(
            "score must be between 0 and {}",
            max_score
        )));
    }
    if weight.is_some_and(|w| w < Decimal::ZERO) {
        return Err(StoreError::Validation("weight must not be negative".to_string()));
    }
    Ok(())
}

fn too_large() -> StoreError {
    StoreError::Validation("grades are too large to average".to_string())
}

/// Weighted mean of the scores in percent, rounded to two decimals.
/// Grades without a weight count as 1. `None` when there is nothing to average.
pub fn weighted_average(grades: &[Model]) -> Result<Option<Decimal>> {
    let mut weighted_sum = Decimal::ZERO;
    let mut total_weight = Decimal::ZERO;
    for grade in grades {
        let Some(percentage) = grade.percentage() else {
            continue;
        };
        let weight = grade.weight.unwrap_or(Decimal::ONE);
        weighted_sum = percentage
            .checked_mul(weight)
            .and_then(|part| weighted_sum.checked_add(part))
            .ok_or_else(too_large)?;
        total_weight = total_weight.checked_add(weight).ok_or_else(too_large)?;
    }
    if total_weight.is_zero() {
        return Ok(None);
    }
    let mean = weighted_sum.checked_div(total_weight).ok_or_else(too_large)?;
    Ok(Some(mean.round_dp(2)))
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
        .order_by_asc(Column::AssessmentDate)
        .order_by_asc(Column::Id)
        .all(db)
        .await?)
}

/// Current weighted average of an enrollment without storing it.
pub async fn average_for<C: ConnectionTrait>(db: &C, enrollment_id: i32) -> Result<Option<Decimal>> {
    if enrollment::Entity::find_by_id(enrollment_id).one(db).await?.is_none() {
        return Err(StoreError::not_found("Enrollment", enrollment_id));
    }
    let grades = get_by_enrollment(db, enrollment_id).await?;
    weighted_average(&grades)
}

#[instrument(skip(db))]
pub async fn create<C: ConnectionTrait>(db: &C, new: NewGrade) -> Result<Model> {
    new.validate()?;
    let max_score = new.max_score.unwrap_or(Decimal::ONE_HUNDRED);
    check_score(new.score, max_score, new.weight)?;

    let mut active = ActiveModel {
        enrollment_id: Set(new.enrollment_id),
        assessment_name: Set(new.assessment_name.unwrap_or_else(|| new.assessment_type.clone())),
        assessment_type: Set(new.assessment_type),
        score: Set(new.score),
        max_score: Set(max_score),
        weight: Set(new.weight),
        ..Default::default()
    };
    set_if_some!(active, assessment_date, new.assessment_date);

    let grade = active.insert(db).await?;
    info!("Grade {} recorded for enrollment {}", grade.id, grade.enrollment_id);
    Ok(grade)
}

#[instrument(skip(db))]
pub async fn update<C: ConnectionTrait>(db: &C, id: i32, changes: GradeChanges) -> Result<Option<Model>> {
    changes.validate()?;
    let Some(existing) = get_by_id(db, id).await? else {
        return Ok(None);
    };
    check_score(
        changes.score.unwrap_or(existing.score),
        changes.max_score.unwrap_or(existing.max_score),
        changes.weight.unwrap_or(existing.weight),
    )?;
    crud::update_by_id::<Entity, _, _>(db, id, changes).await
}

#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool> {
    crud::delete_by_id::<Entity, _>(db, id).await
}

/// Stores the weighted average as the enrollment's final grade.
#[instrument(skip(db))]
pub async fn finalize<C>(db: &C, enrollment_id: i32) -> Result<enrollment::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let enrollment = enrollment::Entity::find_by_id(enrollment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| StoreError::not_found("Enrollment", enrollment_id))?;

    let grades = get_by_enrollment(&txn, enrollment_id).await?;
    let average = weighted_average(&grades)?;
    debug!("Enrollment {} averages {:?} over {} grades", enrollment_id, average, grades.len());

    let mut active: enrollment::ActiveModel = enrollment.into();
    active.final_grade = Set(average);
    let enrollment = active.update(&txn).await?;
    txn.commit().await?;

    info!("Final grade of enrollment {} set to {:?}", enrollment_id, enrollment.final_grade);
    Ok(enrollment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrollments::{self, NewEnrollment};
    use crate::testing::{campus, date, setup_db};
    use chrono::Utc;

    fn grade(score: i64, max_score: i64, weight: Option<Decimal>) -> Model {
        Model {
            id: 0,
            enrollment_id: 1,
            assessment_type: "exam".to_string(),
            assessment_name: "exam".to_string(),
            score: Decimal::from(score),
            max_score: Decimal::from(max_score),
            weight,
            assessment_date: date(2024, 10, 1),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_weighted_average() {
        assert_eq!(weighted_average(&[]).unwrap(), None);

        // Unweighted: plain mean of percentages
        let plain = [grade(80, 100, None), grade(45, 50, None)];
        assert_eq!(weighted_average(&plain).unwrap(), Some(Decimal::from(85)));

        // 90% with weight 3 and 50% with weight 1
        let weighted = [
            grade(90, 100, Some(Decimal::from(3))),
            grade(10, 20, Some(Decimal::ONE)),
        ];
        assert_eq!(weighted_average(&weighted).unwrap(), Some(Decimal::from(80)));

        // Rounded to two decimals
        let thirds = [grade(1, 3, None)];
        assert_eq!(weighted_average(&thirds).unwrap(), Some(Decimal::new(3333, 2)));

        let zero_weights = [grade(50, 100, Some(Decimal::ZERO))];
        assert_eq!(weighted_average(&zero_weights).unwrap(), None);
    }

    #[test]
    fn test_weighted_average_overflow_is_an_error() {
        let huge = [grade(100, 100, Some(Decimal::MAX)), grade(50, 100, Some(Decimal::MAX))];

        assert!(matches!(weighted_average(&huge), Err(StoreError::Validation(_))));
    }

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

    fn new_grade(enrollment_id: i32, score: Decimal) -> NewGrade {
        NewGrade {
            enrollment_id,
            assessment_type: "exam".to_string(),
            assessment_name: None,
            score,
            max_score: None,
            weight: None,
            assessment_date: Some(date(2024, 10, 15)),
        }
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let db = setup_db().await;
        let enrollment = enrolled(&db).await;
        let created = create(&db, new_grade(enrollment.id, Decimal::new(855, 1))).await.unwrap();

        let fetched = get_by_id(&db, created.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.score, Decimal::new(855, 1));
        assert_eq!(fetched.max_score, Decimal::ONE_HUNDRED);
        assert_eq!(fetched.assessment_name, "exam");
        assert_eq!(fetched.assessment_date, date(2024, 10, 15));
        assert_eq!(get_by_enrollment(&db, enrollment.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_score_bounds() {
        let db = setup_db().await;
        let enrollment = enrolled(&db).await;

        let too_high = create(&db, new_grade(enrollment.id, Decimal::from(101))).await;
        assert!(matches!(too_high, Err(StoreError::Validation(_))));

        let negative = create(&db, new_grade(enrollment.id, Decimal::from(-1))).await;
        assert!(matches!(negative, Err(StoreError::Validation(_))));

        let ok = create(&db, new_grade(enrollment.id, Decimal::from(40))).await.unwrap();
        let shrink_max = update(
            &db,
            ok.id,
            GradeChanges {
                max_score: Some(Decimal::from(30)),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(shrink_max, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_values_must_fit_the_column() {
        let db = setup_db().await;
        let enrollment = enrolled(&db).await;

        let mut huge_weight = new_grade(enrollment.id, Decimal::from(100));
        huge_weight.weight = Some(Decimal::from_i128_with_scale(10_i128.pow(27), 0));
        assert!(matches!(create(&db, huge_weight).await, Err(StoreError::Validation(_))));

        let mut huge_max = new_grade(enrollment.id, Decimal::from(10));
        huge_max.max_score = Some(Decimal::from(1000));
        assert!(matches!(create(&db, huge_max).await, Err(StoreError::Validation(_))));

        let fine_grained = new_grade(enrollment.id, Decimal::new(85125, 3));
        assert!(matches!(create(&db, fine_grained).await, Err(StoreError::Validation(_))));

        let mut heaviest = new_grade(enrollment.id, Decimal::new(99999, 2));
        heaviest.max_score = Some(Decimal::new(99999, 2));
        heaviest.weight = Some(Decimal::new(99999, 2));
        create(&db, heaviest).await.unwrap();
        assert_eq!(average_for(&db, enrollment.id).await.unwrap(), Some(Decimal::ONE_HUNDRED));
    }

    #[tokio::test]
    async fn test_update_changes_only_named_fields() {
        let db = setup_db().await;
        let enrollment = enrolled(&db).await;
        let before = create(&db, new_grade(enrollment.id, Decimal::from(70))).await.unwrap();

        let after = update(
            &db,
            before.id,
            GradeChanges {
                assessment_name: Some("Midterm".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(after.assessment_name, "Midterm");
        assert_eq!(after.assessment_type, before.assessment_type);
        assert_eq!(after.score, before.score);
        assert_eq!(after.max_score, before.max_score);
        assert_eq!(after.weight, before.weight);
        assert_eq!(after.assessment_date, before.assessment_date);
    }

    #[tokio::test]
    async fn test_finalize_writes_final_grade() {
        let db = setup_db().await;
        let enrollment = enrolled(&db).await;

        create(
            &db,
            NewGrade {
                weight: Some(Decimal::from(3)),
                ..new_grade(enrollment.id, Decimal::from(90))
            },
        )
        .await
        .unwrap();
        create(
            &db,
            NewGrade {
                max_score: Some(Decimal::from(20)),
                ..new_grade(enrollment.id, Decimal::from(10))
            },
        )
        .await
        .unwrap();

        assert_eq!(average_for(&db, enrollment.id).await.unwrap(), Some(Decimal::from(80)));

        let finalized = finalize(&db, enrollment.id).await.unwrap();
        assert_eq!(finalized.final_grade, Some(Decimal::from(80)));
        let stored = enrollments::get_by_id(&db, enrollment.id).await.unwrap().unwrap();
        assert_eq!(stored.final_grade, Some(Decimal::from(80)));
    }

    #[tokio::test]
    async fn test_finalize_missing_enrollment() {
        let db = setup_db().await;
        assert!(matches!(finalize(&db, 5).await, Err(StoreError::NotFound(_))));
        assert!(matches!(average_for(&db, 5).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_then_get() {
        let db = setup_db().await;
        let enrollment = enrolled(&db).await;
        let created = create(&db, new_grade(enrollment.id, Decimal::from(60))).await.unwrap();
        assert!(delete(&db, created.id).await.unwrap());
        assert!(get_by_id(&db, created.id).await.unwrap().is_none());
    }
}
