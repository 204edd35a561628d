//! Student profiles. Each profile belongs to exactly one user.

use chrono::NaiveDate;
use model::entities::student::{ActiveModel, Column, Entity, Model, StudentStatus};
use model::entities::user::{self, Role};
use model::entities::{course, enrollment};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::crud::{self, set_if_some, Patch};
use crate::error::{Result, StoreError};
use crate::users::{self, NewUser};

/// Grade level given to self-registered students until an admin assigns one.
pub const UNASSIGNED_GRADE_LEVEL: &str = "unassigned";

pub fn code_for(user_id: i32) -> String {
    format!("STU-{:05}", user_id)
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub user_id: i32,
    /// Generated from the user id when omitted
    #[validate(length(min = 1, max = 50))]
    pub student_code: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub grade_level: String,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub enrollment_date: Option<NaiveDate>,
    pub status: Option<StudentStatus>,
}

/// Account and profile in one request.
#[derive(Clone, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewStudentAccount {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub student_code: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub grade_level: String,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl std::fmt::Debug for NewStudentAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewStudentAccount")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("student_code", &self.student_code)
            .field("grade_level", &self.grade_level)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StudentChanges {
    #[validate(length(min = 1, max = 50))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_code: Option<String>,
    #[validate(length(min = 1, max = 50))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    #[serde(default, deserialize_with = "crate::patch::nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<NaiveDate>)]
    pub date_of_birth: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "crate::patch::nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::patch::nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StudentStatus>,
}

impl Patch<ActiveModel> for StudentChanges {
    fn apply(self, active: &mut ActiveModel) {
        set_if_some!(active, student_code, self.student_code);
        set_if_some!(active, grade_level, self.grade_level);
        set_if_some!(active, date_of_birth, self.date_of_birth);
        set_if_some!(active, address, self.address);
        set_if_some!(active, phone, self.phone);
        set_if_some!(active, enrollment_date, self.enrollment_date);
        set_if_some!(active, status, self.status);
    }
}

pub async fn get_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Model>> {
    Ok(Entity::find().order_by_asc(Column::StudentCode).all(db).await?)
}

pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Model>> {
    crud::find_by_id::<Entity, _>(db, id).await
}

pub async fn get_by_user_id<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Option<Model>> {
    Ok(Entity::find().filter(Column::UserId.eq(user_id)).one(db).await?)
}

pub async fn get_by_code<C: ConnectionTrait>(db: &C, code: &str) -> Result<Option<Model>> {
    Ok(Entity::find().filter(Column::StudentCode.eq(code)).one(db).await?)
}

/// Courses the student is enrolled in, in any enrollment status.
pub async fn courses_of<C: ConnectionTrait>(db: &C, id: i32) -> Result<Vec<course::Model>> {
    let Some(student) = Entity::find_by_id(id).one(db).await? else {
        return Err(StoreError::not_found("Student", id));
    };
    Ok(student
        .find_related(course::Entity)
        .order_by_asc(enrollment::Column::EnrollmentDate)
        .all(db)
        .await?)
}

/// Bare profile insert used by registration and account creation.
pub(crate) async fn insert_profile<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    code: Option<String>,
    grade_level: Option<String>,
) -> Result<Model> {
    let code = code.unwrap_or_else(|| code_for(user_id));
    debug!("Creating student profile {} for user {}", code, user_id);
    let profile = ActiveModel {
        user_id: Set(user_id),
        student_code: Set(code),
        grade_level: Set(grade_level.unwrap_or_else(|| UNASSIGNED_GRADE_LEVEL.to_string())),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(profile)
}

#[instrument(skip(db))]
pub async fn create<C: ConnectionTrait>(db: &C, new: NewStudent) -> Result<Model> {
    new.validate()?;

    let owner = user::Entity::find_by_id(new.user_id)
        .one(db)
        .await?
        .ok_or_else(|| StoreError::not_found("User", new.user_id))?;
    if owner.role != Role::Student {
        return Err(StoreError::Validation(format!(
            "User {} has role {:?}, expected student",
            owner.id, owner.role
        )));
    }

    let mut active = ActiveModel {
        user_id: Set(new.user_id),
        student_code: Set(new.student_code.unwrap_or_else(|| code_for(new.user_id))),
        grade_level: Set(new.grade_level),
        date_of_birth: Set(new.date_of_birth),
        address: Set(new.address),
        phone: Set(new.phone),
        ..Default::default()
    };
    set_if_some!(active, enrollment_date, new.enrollment_date);
    set_if_some!(active, status, new.status);

    let student = active.insert(db).await?;
    info!("Student {} created with ID: {}", student.student_code, student.id);
    Ok(student)
}

/// Creates a student user and its profile in one transaction.
#[instrument(skip(db))]
pub async fn create_with_user<C>(db: &C, account: NewStudentAccount) -> Result<(user::Model, Model)>
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
            role: Role::Student,
        },
    )
    .await?;

    let profile = ActiveModel {
        user_id: Set(owner.id),
        student_code: Set(account.student_code.unwrap_or_else(|| code_for(owner.id))),
        grade_level: Set(account.grade_level),
        date_of_birth: Set(account.date_of_birth),
        address: Set(account.address),
        phone: Set(account.phone),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!("Student account {} created for user {}", profile.student_code, owner.id);
    Ok((owner, profile))
}

#[instrument(skip(db))]
pub async fn update<C: ConnectionTrait>(db: &C, id: i32, changes: StudentChanges) -> Result<Option<Model>> {
    changes.validate()?;
    crud::update_by_id::<Entity, _, _>(db, id, changes).await
}

/// Enrollments, grades and attendance of the student go with it.
#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool> {
    crud::delete_by_id::<Entity, _>(db, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{campus, create_user, date, setup_db};
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn test_create_then_get() {
        let db = setup_db().await;
        let owner = create_user(&db, "kim@example.com", Role::Student).await;
        let created = create(
            &db,
            NewStudent {
                user_id: owner.id,
                student_code: Some("S-1".to_string()),
                grade_level: "11B".to_string(),
                date_of_birth: Some(date(2008, 4, 2)),
                address: Some("12 Elm St".to_string()),
                phone: None,
                enrollment_date: Some(date(2024, 9, 1)),
                status: None,
            },
        )
        .await
        .unwrap();

        let fetched = get_by_id(&db, created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.grade_level, "11B");
        assert_eq!(fetched.enrollment_date, date(2024, 9, 1));
        assert_eq!(fetched.status, StudentStatus::Active);
        assert_eq!(get_by_user_id(&db, owner.id).await.unwrap().map(|s| s.id), Some(created.id));
        assert_eq!(get_by_code(&db, "S-1").await.unwrap().map(|s| s.id), Some(created.id));
    }

    #[tokio::test]
    async fn test_profile_requires_student_user() {
        let db = setup_db().await;
        let teacher = create_user(&db, "t@example.com", Role::Teacher).await;
        let new = NewStudent {
            user_id: teacher.id,
            student_code: None,
            grade_level: "9A".to_string(),
            date_of_birth: None,
            address: None,
            phone: None,
            enrollment_date: None,
            status: None,
        };
        assert!(matches!(create(&db, new.clone()).await, Err(StoreError::Validation(_))));

        let missing = NewStudent { user_id: 404, ..new };
        assert!(matches!(create(&db, missing).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_with_user() {
        let db = setup_db().await;
        let (owner, profile) = create_with_user(
            &db,
            NewStudentAccount {
                email: "lee@example.com".to_string(),
                password: "123456".to_string(),
                name: "Lee".to_string(),
                student_code: None,
                grade_level: "10A".to_string(),
                date_of_birth: None,
                address: None,
                phone: Some("555-0101".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(owner.role, Role::Student);
        assert_eq!(profile.user_id, owner.id);
        assert_eq!(profile.student_code, code_for(owner.id));
        assert_eq!(profile.phone.as_deref(), Some("555-0101"));
    }

    #[tokio::test]
    async fn test_create_with_user_rolls_back_on_code_clash() {
        let db = setup_db().await;
        let campus = campus(&db).await;
        let users_before = user::Entity::find().count(&db).await.unwrap();

        let result = create_with_user(
            &db,
            NewStudentAccount {
                email: "dup@example.com".to_string(),
                password: "123456".to_string(),
                name: "Dup".to_string(),
                student_code: Some(campus.student.student_code.clone()),
                grade_level: "10A".to_string(),
                date_of_birth: None,
                address: None,
                phone: None,
            },
        )
        .await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(user::Entity::find().count(&db).await.unwrap(), users_before);
    }

    #[tokio::test]
    async fn test_update_changes_only_named_fields() {
        let db = setup_db().await;
        let campus = campus(&db).await;
        let before = campus.student;

        let updated = update(
            &db,
            before.id,
            StudentChanges {
                status: Some(StudentStatus::AtRisk),
                address: Some(Some("1 Main St".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.status, StudentStatus::AtRisk);
        assert_eq!(updated.address.as_deref(), Some("1 Main St"));
        assert_eq!(updated.student_code, before.student_code);
        assert_eq!(updated.grade_level, before.grade_level);
        assert_eq!(updated.enrollment_date, before.enrollment_date);
        assert_eq!(updated.user_id, before.user_id);
        assert_eq!(updated.created_at, before.created_at);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_enrollments() {
        let db = setup_db().await;
        let campus = campus(&db).await;
        crate::enrollments::enroll(
            &db,
            crate::enrollments::NewEnrollment {
                student_id: campus.student.id,
                course_id: campus.course.id,
            },
        )
        .await
        .unwrap();
        assert_eq!(courses_of(&db, campus.student.id).await.unwrap().len(), 1);

        assert!(delete(&db, campus.student.id).await.unwrap());
        assert!(get_by_id(&db, campus.student.id).await.unwrap().is_none());
        assert_eq!(enrollment::Entity::find().count(&db).await.unwrap(), 0);
    }
}
