//! Generic building blocks shared by the per-entity modules.

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ConnectionTrait, EntityName, EntityTrait,
    IntoActiveModel, PrimaryKeyTrait,
};
use tracing::{debug, trace};

use crate::error::Result;

/// Mutation applied to a loaded row. Each entity implements this for its
/// `*Changes` struct so only the supplied fields are marked as set.
pub trait Patch<A: ActiveModelTrait> {
    fn apply(self, active: &mut A);
}

pub async fn find_all<E, C>(db: &C) -> Result<Vec<E::Model>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let rows = E::find().all(db).await?;
    trace!("Loaded {} rows from {}", rows.len(), E::default().table_name());
    Ok(rows)
}

pub async fn find_by_id<E, C>(db: &C, id: i32) -> Result<Option<E::Model>>
where
    E: EntityTrait,
    C: ConnectionTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    Ok(E::find_by_id(id).one(db).await?)
}

/// Loads the row, applies the patch and writes back only the changed columns.
/// Returns `Ok(None)` when the row does not exist.
pub async fn update_by_id<E, C, P>(db: &C, id: i32, patch: P) -> Result<Option<E::Model>>
where
    E: EntityTrait,
    C: ConnectionTrait,
    P: Patch<E::ActiveModel>,
    E::Model: IntoActiveModel<E::ActiveModel>,
    E::ActiveModel: ActiveModelBehavior + Send,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    let Some(existing) = E::find_by_id(id).one(db).await? else {
        return Ok(None);
    };

    let mut active = existing.clone().into_active_model();
    patch.apply(&mut active);

    if !active.is_changed() {
        debug!("No changes for {} {}", E::default().table_name(), id);
        return Ok(Some(existing));
    }

    let updated = active.update(db).await?;
    Ok(Some(updated))
}

/// Deletes a row by primary key. Returns `false` when nothing was deleted.
pub async fn delete_by_id<E, C>(db: &C, id: i32) -> Result<bool>
where
    E: EntityTrait,
    C: ConnectionTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    let result = E::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

/// Marks `value` as set on the active field when the caller supplied it.
macro_rules! set_if_some {
    ($active:expr, $field:ident, $value:expr) => {
        if let Some(value) = $value {
            $active.$field = sea_orm::Set(value);
        }
    };
}

pub(crate) use set_if_some;
