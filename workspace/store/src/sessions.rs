//! Server-side login sessions keyed by an opaque random token.

use chrono::{DateTime, Duration, Utc};
use model::entities::session::{ActiveModel, Column, Entity, Model};
use model::entities::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{Result, StoreError};

/// Thirty days, matching a month-long login cookie.
pub const DEFAULT_TTL_HOURS: i64 = 24 * 30;

#[instrument(skip(db))]
pub async fn open<C: ConnectionTrait>(db: &C, user_id: i32, ttl: Duration) -> Result<Model> {
    let now = Utc::now();
    let expires_at = now
        .checked_add_signed(ttl)
        .ok_or_else(|| StoreError::Validation(format!("session lifetime {} is out of range", ttl)))?;
    let session = ActiveModel {
        token: Set(Uuid::new_v4().to_string()),
        user_id: Set(user_id),
        created_at: Set(now),
        expires_at: Set(expires_at),
    }
    .insert(db)
    .await?;
    info!("Session opened for user {} until {}", user_id, session.expires_at);
    Ok(session)
}

/// Looks up the session and its user. Expired sessions are removed and
/// reported as absent.
#[instrument(skip(db, token))]
pub async fn resolve<C: ConnectionTrait>(
    db: &C,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<(Model, user::Model)>> {
    let Some((session, owner)) = Entity::find_by_id(token.to_string())
        .find_also_related(user::Entity)
        .one(db)
        .await?
    else {
        debug!("Unknown session token");
        return Ok(None);
    };

    if session.is_expired(now) {
        debug!("Session of user {} expired at {}", session.user_id, session.expires_at);
        Entity::delete_by_id(session.token.clone()).exec(db).await?;
        return Ok(None);
    }

    Ok(owner.map(|owner| (session, owner)))
}

/// Returns `false` when the token was not known.
#[instrument(skip(db, token))]
pub async fn close<C: ConnectionTrait>(db: &C, token: &str) -> Result<bool> {
    let result = Entity::delete_by_id(token.to_string()).exec(db).await?;
    Ok(result.rows_affected > 0)
}

pub async fn purge_expired<C: ConnectionTrait>(db: &C, now: DateTime<Utc>) -> Result<u64> {
    let result = Entity::delete_many()
        .filter(Column::ExpiresAt.lte(now))
        .exec(db)
        .await?;
    if result.rows_affected > 0 {
        info!("Purged {} expired sessions", result.rows_affected);
    }
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_user, setup_db};
    use model::entities::user::Role;

    #[tokio::test]
    async fn test_open_resolve_close() {
        let db = setup_db().await;
        let owner = create_user(&db, "a@example.com", Role::Admin).await;

        let session = open(&db, owner.id, Duration::hours(1)).await.unwrap();
        assert_eq!(session.token.len(), 36);

        let (found, found_user) = resolve(&db, &session.token, Utc::now()).await.unwrap().unwrap();
        assert_eq!(found.token, session.token);
        assert_eq!(found_user.id, owner.id);

        assert!(close(&db, &session.token).await.unwrap());
        assert!(resolve(&db, &session.token, Utc::now()).await.unwrap().is_none());
        assert!(!close(&db, &session.token).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_session_is_dropped() {
        let db = setup_db().await;
        let owner = create_user(&db, "a@example.com", Role::Admin).await;
        let session = open(&db, owner.id, Duration::minutes(5)).await.unwrap();

        let later = Utc::now() + Duration::minutes(10);
        assert!(resolve(&db, &session.token, later).await.unwrap().is_none());
        // Gone for good, even when asked with the current time
        assert!(resolve(&db, &session.token, Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_and_user_cascade() {
        let db = setup_db().await;
        let owner = create_user(&db, "a@example.com", Role::Admin).await;
        open(&db, owner.id, Duration::minutes(1)).await.unwrap();
        let kept = open(&db, owner.id, Duration::days(1)).await.unwrap();

        let purged = purge_expired(&db, Utc::now() + Duration::hours(1)).await.unwrap();
        assert_eq!(purged, 1);

        crate::users::delete(&db, owner.id).await.unwrap();
        assert!(resolve(&db, &kept.token, Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lifetime_past_the_calendar_is_rejected() {
        let db = setup_db().await;
        let owner = create_user(&db, "a@example.com", Role::Admin).await;

        let result = open(&db, owner.id, Duration::days(1_000_000_000)).await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert_eq!(purge_expired(&db, Utc::now() + Duration::days(36_500)).await.unwrap(), 0);
    }
}
