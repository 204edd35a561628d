use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;

/// A single scored assessment (exam, homework, project...) of an enrollment.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "grades")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub enrollment_id: i32,
    /// Kind of assessment, e.g. "exam" or "homework".
    pub assessment_type: String,
    pub assessment_name: String,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub score: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub max_score: Decimal,
    /// Relative weight towards the final grade. Unweighted rows count as 1.
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub weight: Option<Decimal>,
    pub assessment_date: NaiveDate,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::enrollment::Entity",
        from = "Column::EnrollmentId",
        to = "super::enrollment::Column::Id",
        on_delete = "Cascade"
    )]
    Enrollment,
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollment.def()
    }
}

impl Model {
    /// Score expressed as a percentage of the maximum score.
    /// Returns `None` when `max_score` is zero or the result does not fit.
    pub fn percentage(&self) -> Option<Decimal> {
        self.score
            .checked_div(self.max_score)?
            .checked_mul(Decimal::ONE_HUNDRED)
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert {
            if self.created_at.is_not_set() {
                self.created_at = Set(Utc::now());
            }
            if self.max_score.is_not_set() {
                self.max_score = Set(Decimal::ONE_HUNDRED);
            }
            if self.assessment_date.is_not_set() {
                self.assessment_date = Set(Utc::now().date_naive());
            }
        }
        Ok(self)
    }
}
