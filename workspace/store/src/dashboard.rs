use model::entities::course::{self, CourseStatus};
use model::entities::{department, student, teacher};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::error::Result;

/// Headline counts shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_students: u64,
    pub total_teachers: u64,
    pub active_courses: u64,
    pub total_departments: u64,
}

#[instrument(skip(db))]
pub async fn statistics<C: ConnectionTrait>(db: &C) -> Result<Statistics> {
    let stats = Statistics {
        total_students: student::Entity::find().count(db).await?,
        total_teachers: teacher::Entity::find().count(db).await?,
        active_courses: course::Entity::find()
            .filter(course::Column::Status.eq(CourseStatus::Active))
            .count(db)
            .await?,
        total_departments: department::Entity::find().count(db).await?,
    };
    debug!("Dashboard statistics: {:?}", stats);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{campus, create_student, setup_db};

    #[tokio::test]
    async fn test_empty_database() {
        let db = setup_db().await;
        let stats = statistics(&db).await.unwrap();
        assert_eq!(
            stats,
            Statistics {
                total_students: 0,
                total_teachers: 0,
                active_courses: 0,
                total_departments: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_counts() {
        let db = setup_db().await;
        let campus = campus(&db).await;
        create_student(&db, "second@example.com", "STU-00002").await;
        crate::courses::update(
            &db,
            campus.course.id,
            crate::courses::CourseChanges {
                status: Some(CourseStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let stats = statistics(&db).await.unwrap();
        assert_eq!(stats.total_students, 2);
        assert_eq!(stats.total_teachers, 1);
        assert_eq!(stats.active_courses, 0);
        assert_eq!(stats.total_departments, 1);
    }
}
