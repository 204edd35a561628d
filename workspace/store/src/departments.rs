use model::entities::department::{ActiveModel, Column, Entity, Model};
use model::entities::{subject, teacher};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::crud::{self, set_if_some, Patch};
use crate::error::Result;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewDepartment {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    /// Name of the head of department
    pub head: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentChanges {
    #[validate(length(min = 1, max = 255))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::patch::nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::patch::nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub head: Option<Option<String>>,
}

impl Patch<ActiveModel> for DepartmentChanges {
    fn apply(self, active: &mut ActiveModel) {
        set_if_some!(active, name, self.name);
        set_if_some!(active, description, self.description);
        set_if_some!(active, head, self.head);
    }
}

pub async fn get_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Model>> {
    Ok(Entity::find().order_by_asc(Column::Name).all(db).await?)
}

pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Model>> {
    crud::find_by_id::<Entity, _>(db, id).await
}

#[instrument(skip(db))]
pub async fn create<C: ConnectionTrait>(db: &C, new: NewDepartment) -> Result<Model> {
    new.validate()?;
    let department = ActiveModel {
        name: Set(new.name),
        description: Set(new.description),
        head: Set(new.head),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Department created with ID: {}", department.id);
    Ok(department)
}

#[instrument(skip(db))]
pub async fn update<C: ConnectionTrait>(db: &C, id: i32, changes: DepartmentChanges) -> Result<Option<Model>> {
    changes.validate()?;
    crud::update_by_id::<Entity, _, _>(db, id, changes).await
}

/// Subjects and teachers of the department are detached, not deleted.
#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool> {
    let deleted = crud::delete_by_id::<Entity, _>(db, id).await?;
    debug!("Department {} deleted: {}", id, deleted);
    Ok(deleted)
}

pub async fn subjects_of<C: ConnectionTrait>(db: &C, id: i32) -> Result<Vec<subject::Model>> {
    Ok(subject::Entity::find()
        .filter(subject::Column::DepartmentId.eq(id))
        .order_by_asc(subject::Column::Code)
        .all(db)
        .await?)
}

pub async fn teachers_of<C: ConnectionTrait>(db: &C, id: i32) -> Result<Vec<teacher::Model>> {
    Ok(teacher::Entity::find()
        .filter(teacher::Column::DepartmentId.eq(id))
        .order_by_asc(teacher::Column::TeacherCode)
        .all(db)
        .await?)
}
