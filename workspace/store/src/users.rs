//! User accounts, login and self-registration.

use chrono::Duration;
use model::entities::user::{ActiveModel, Column, Entity, Model, Role};
use model::entities::{session, student, teacher};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::credentials::{hash_secret, verify_secret};
use crate::crud::{self, set_if_some, Patch};
use crate::error::{Result, StoreError};
use crate::{sessions, students, teachers};

pub const MIN_PASSWORD_LEN: u64 = 6;

#[derive(Clone, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub role: Role,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Passwords are changed through [`set_password`].
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    #[validate(email)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 255))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Patch<ActiveModel> for UserChanges {
    fn apply(self, active: &mut ActiveModel) {
        set_if_some!(active, email, self.email);
        set_if_some!(active, name, self.name);
        set_if_some!(active, role, self.role);
    }
}

/// A freshly registered account together with the profile created for its role.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: Model,
    pub student: Option<student::Model>,
    pub teacher: Option<teacher::Model>,
}

pub async fn get_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Model>> {
    Ok(Entity::find().order_by_asc(Column::Id).all(db).await?)
}

pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Model>> {
    crud::find_by_id::<Entity, _>(db, id).await
}

pub async fn get_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<Model>> {
    Ok(Entity::find()
        .filter(Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await?)
}

/// Creates the account row only. Emails are stored lowercased.
#[instrument(skip(db))]
pub async fn create<C: ConnectionTrait>(db: &C, new: NewUser) -> Result<Model> {
    new.validate()?;
    let email = new.email.trim().to_lowercase();

    let user = ActiveModel {
        email: Set(email.clone()),
        password_hash: Set(hash_secret(&new.password)?),
        name: Set(new.name),
        role: Set(new.role),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| match StoreError::from(e) {
        StoreError::Conflict(_) => StoreError::Conflict(format!("Email '{}' is already registered", email)),
        other => other,
    })?;

    info!("User created with ID: {}, role: {:?}", user.id, user.role);
    Ok(user)
}

#[instrument(skip(db))]
pub async fn update<C: ConnectionTrait>(db: &C, id: i32, mut changes: UserChanges) -> Result<Option<Model>> {
    changes.validate()?;
    changes.email = changes.email.map(|e| e.trim().to_lowercase());
    crud::update_by_id::<Entity, _, _>(db, id, changes).await
}

/// Removes the account along with its profile and sessions.
#[instrument(skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool> {
    crud::delete_by_id::<Entity, _>(db, id).await
}

#[instrument(skip(db, password))]
pub async fn set_password<C: ConnectionTrait>(db: &C, id: i32, password: &str) -> Result<Option<Model>> {
    if (password.chars().count() as u64) < MIN_PASSWORD_LEN {
        return Err(StoreError::Validation(format!(
            "password: must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    let Some(user) = Entity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };
    let mut active: ActiveModel = user.into();
    active.password_hash = Set(hash_secret(password)?);
    let user = active.update(db).await?;
    info!("Password changed for user {}", id);
    Ok(Some(user))
}

/// Checks an email/password pair. Unknown email and wrong password produce
/// the same [`StoreError::InvalidCredentials`].
#[instrument(skip(db, password))]
pub async fn authenticate<C: ConnectionTrait>(db: &C, email: &str, password: &str) -> Result<Model> {
    match get_by_email(db, email).await? {
        Some(user) if verify_secret(password, &user.password_hash) => {
            debug!("User {} authenticated", user.id);
            Ok(user)
        }
        Some(user) => {
            warn!("Wrong password for user {}", user.id);
            Err(StoreError::InvalidCredentials)
        }
        None => {
            warn!("Login attempt for unknown email");
            Err(StoreError::InvalidCredentials)
        }
    }
}

/// Creates the account and, for students and teachers, an empty profile
/// with a generated code. Nothing is persisted unless both rows are.
#[instrument(skip(db))]
pub async fn register<C>(db: &C, new: NewUser) -> Result<Registration>
where
    C: ConnectionTrait + TransactionTrait,
{
    new.validate()?;

    let txn = db.begin().await?;
    let role = new.role;
    let user = create(&txn, new).await?;

    let mut registration = Registration {
        user,
        student: None,
        teacher: None,
    };
    match role {
        Role::Student => {
            let profile = students::insert_profile(&txn, registration.user.id, None, None).await?;
            registration.student = Some(profile);
        }
        Role::Teacher => {
            let profile = teachers::insert_profile(&txn, registration.user.id, None).await?;
            registration.teacher = Some(profile);
        }
        Role::Admin => {}
    }
    txn.commit().await?;

    info!("Registered user {} as {:?}", registration.user.id, role);
    Ok(registration)
}

/// Registers the account and opens its first session. Either both exist
/// afterwards or neither does.
#[instrument(skip(db))]
pub async fn register_with_session<C>(
    db: &C,
    new: NewUser,
    ttl: Duration,
) -> Result<(Registration, session::Model)>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let registration = register(&txn, new).await?;
    let session = sessions::open(&txn, registration.user.id, ttl).await?;
    txn.commit().await?;
    Ok((registration, session))
}
