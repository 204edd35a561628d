//! Teacher profiles. Each profile belongs to exactly one user.

use chrono::NaiveDate;
use model::entities::teacher::{ActiveModel, Column, Entity, Model, TeacherStatus};
use model::entities::user::{self, Role};
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
use crate::users::{self, NewUser};

pub fn code_for(user_id: i32) -> String {
    format!("TCH-{:05}", user_id)
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTeacher {
    pub user_id: i32,
    /// Generated from the user id when omitted
    #[validate(length(min = 1, max = 50))]
    pub teacher_code: Option<String>,
    pub department_id: Option<i32>,
    pub specialization: Option<String>,
    pub phone: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub contract_end_date: Option<NaiveDate>,
    pub status: Option<TeacherStatus>,
}

#[derive(Clone, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTeacherAccount {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub teacher_code: Option<String>,
    pub department_id: Option<i32>,
    pub specialization: Option<String>,
    pub phone: Option<String>,
}

impl std::fmt::Debug for NewTeacherAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewTeacherAccount")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("teacher_code", &self.teacher_code)
            .field("department_id", &self.department_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TeacherChanges {
    #[validate(length(min = 1, max = 50))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_code: Option<String>,
    #[serde(default, deserialize_with = "crate::patch::nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i32>)]
    pub department_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "crate::patch::nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub specialization: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::patch::nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "crate::patch::nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<NaiveDate>)]
    pub contract_end_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TeacherStatus>,
}

impl Patch<ActiveModel> for TeacherChanges {
    fn apply(self, active: &mut ActiveModel) {
        set_if_some!(active, teacher_code, self.teacher_code);
        set_if_some!(active, department_id, self.department_id);
        set_if_some!(active, specialization, self.specialization);
        set_if_some!(active, phone, self.phone);
        set_if_some!(active, hire_date, self.hire_date);
        set_if_some!(active, contract_end_date, self.contract_end_date);
        set_if_some!(active, status, self.status);
    }
}

pub async fn get_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Model>> {
    Ok(Entity::find().order_by_asc(Column::TeacherCode).all(db).await?)
}

pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Model>> {
    crud::find_by_id::<Entity, _>(db, id).await
}

pub async fn get_by_user_id<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Option<Model>> {
    Ok(Entity::find().filter(Column::UserId.eq(user_id)).one(db).await?)
}

pub async fn get_by_code<C: ConnectionTrait>(db: &C, code: &str) -> Result<Option<Model>> {
    Ok(Entity::find().filter(Column::TeacherCode.eq(code)).one(db).await?)
}

pub(crate) async fn insert_profile<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    code: Option<String>,
) -> Result<Model> {
    let code = code.unwrap_or_else(|| code_for(user_id));
    debug!("Creating teacher profile {} for user {}", code, user_id);
    let profile = ActiveModel {
        user_id: Set(user_id),
        teacher_code: Set(code),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(profile)
}

#[instrument(skip(db))]
pub async fn create<C: ConnectionTrait>(db: &C, new: NewTeacher) -> Result<Model> {
    new.validate()?;

    let owner = user::Entity::find_by_id(new.user_id)
        .one(db)
        .await?
        .ok_or_else(|| StoreError::not_found("User", new.user_id))?;
    if owner.role != Role::Teacher {
        return Err(StoreError::Validation(format!(
            "User {} has role {:?}, expected teacher",
            owner.id, owner.role
        )));
    }

    let mut active = ActiveModel {
        user_id: Set(new.user_id),
        teacher_code: Set(new.teacher_code.unwrap_or_else(|| code_for(new.user_id))),
        department_id: Set(new.department_id),
        specialization: Set(new.specialization),
        phone: Set(new.phone),
        contract_end_date: Set(new.contract_end_date),
        ..Default::default()
    };
    set_if_some!(active, hire_date, new.hire_date);
    set_if_some!(active, status, new.status);

    let teacher = active.insert(db).await?;
    info!("Teacher {} created with ID: {}", teacher.teacher_code, teacher.id);
    Ok(teacher)
}

/// Creates a teacher user and its profile in one transaction.
#[instrument(skip(db))]
pub async fn create_with_user<C>(db: &C, account: NewTeacherAccount) -> Result<(user::Model, Model)>
where
    C: ConnectionTrait + TransactionTrait,
{
    account.validate()?;

    let txn = db.begin().await?;
    let owner = users::create(
        &txn,
        NewUser {
            email: account.email,
            password: account.password,
            name: account.name,
            role: Role::Teacher,
        },
    )
    .await?;

    let profile = ActiveModel {
        user_id: Set(owner.id),
        teacher_code: Set(account.teacher_code.unwrap_or_else(|| code_for(owner.id))),
        department_id: Set(account.department_id),
        specialization: Set(account.specialization),
        phone: Set(account.phone),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!("Teacher account {} created for user {}", profile.teacher_code, owner.id);
    Ok((owner, profile))
}

#[instrument(skip(db))]
pub async fn update<C: ConnectionTrait>(db: &C, id: i32, changes: TeacherChanges) -> Result<Option<Model>> {
    changes.validate()?;
    crud::update_by_id::<Entity, _, _>(db, id, changes).await
}

/// Fails with a conflict while the teacher still has courses.
#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool> {
    crud::delete_by_id::<Entity, _>(db, id).await
}
