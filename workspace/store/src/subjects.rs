use model::entities::subject::{ActiveModel, Column, Entity, Model};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::crud::{self, set_if_some, Patch};
use crate::error::Result;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewSubject {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Unique catalogue code, e.g. "CALC101"
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    pub description: Option<String>,
    /// Defaults to 3
    #[validate(range(min = 0, max = 60))]
    pub credits: Option<i32>,
    pub department_id: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubjectChanges {
    #[validate(length(min = 1, max = 255))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "crate::patch::nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[validate(range(min = 0, max = 60))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<i32>,
    #[serde(default, deserialize_with = "crate::patch::nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i32>)]
    pub department_id: Option<Option<i32>>,
}

impl Patch<ActiveModel> for SubjectChanges {
    fn apply(self, active: &mut ActiveModel) {
        set_if_some!(active, name, self.name);
        set_if_some!(active, code, self.code);
        set_if_some!(active, description, self.description);
        set_if_some!(active, credits, self.credits);
        set_if_some!(active, department_id, self.department_id);
    }
}

pub async fn get_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Model>> {
    Ok(Entity::find().order_by_asc(Column::Code).all(db).await?)
}

pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Model>> {
    crud::find_by_id::<Entity, _>(db, id).await
}

pub async fn get_by_code<C: ConnectionTrait>(db: &C, code: &str) -> Result<Option<Model>> {
    Ok(Entity::find().filter(Column::Code.eq(code)).one(db).await?)
}

#[instrument(skip(db))]
pub async fn create<C: ConnectionTrait>(db: &C, new: NewSubject) -> Result<Model> {
    new.validate()?;
    let mut active = ActiveModel {
        name: Set(new.name),
        code: Set(new.code),
        description: Set(new.description),
        department_id: Set(new.department_id),
        ..Default::default()
    };
    set_if_some!(active, credits, new.credits);

    let subject = active.insert(db).await?;
    info!("Subject {} created with ID: {}", subject.code, subject.id);
    Ok(subject)
}

#[instrument(skip(db))]
pub async fn update<C: ConnectionTrait>(db: &C, id: i32, changes: SubjectChanges) -> Result<Option<Model>> {
    changes.validate()?;
    crud::update_by_id::<Entity, _, _>(db, id, changes).await
}

/// Fails with a conflict while courses still reference the subject.
#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool> {
    crud::delete_by_id::<Entity, _>(db, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{campus, setup_db};
    use crate::StoreError;

    fn calculus(department_id: Option<i32>) -> NewSubject {
        NewSubject {
            name: "Calculus".to_string(),
            code: "CALC101".to_string(),
            description: Some("Limits and derivatives".to_string()),
            credits: Some(4),
            department_id,
        }
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let db = setup_db().await;
        let created = create(&db, calculus(None)).await.unwrap();
        let fetched = get_by_id(&db, created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.credits, 4);
        assert_eq!(get_by_code(&db, "CALC101").await.unwrap().map(|s| s.id), Some(created.id));
    }

    #[tokio::test]
    async fn test_default_credits() {
        let db = setup_db().await;
        let created = create(
            &db,
            NewSubject {
                credits: None,
                ..calculus(None)
            },
        )
        .await
        .unwrap();
        assert_eq!(created.credits, 3);
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts() {
        let db = setup_db().await;
        create(&db, calculus(None)).await.unwrap();
        let second = create(&db, calculus(None)).await;
        assert!(matches!(second, Err(StoreError::Conflict(_))));
        assert_eq!(get_all(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_department_conflicts() {
        let db = setup_db().await;
        let result = create(&db, calculus(Some(999))).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_can_detach_department() {
        let db = setup_db().await;
        let campus = campus(&db).await;
        let updated = update(
            &db,
            campus.subject.id,
            SubjectChanges {
                department_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(updated.department_id, None);
        assert_eq!(updated.code, campus.subject.code);
        assert_eq!(updated.credits, campus.subject.credits);
    }

    #[tokio::test]
    async fn test_delete_in_use_subject_is_refused() {
        let db = setup_db().await;
        let campus = campus(&db).await;
        let result = delete(&db, campus.subject.id).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert!(get_by_id(&db, campus.subject.id).await.unwrap().is_some());
    }
}
