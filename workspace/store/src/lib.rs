//! Data-access layer for the academic records service.
//!
//! Every operation takes the connection it should run on as its first
//! argument. Pass a `DatabaseConnection` for autocommit behaviour or a
//! `DatabaseTransaction` to group several calls into one unit of work.
//! Composite operations (registration, enrollment, period activation,
//! grade finalization) open their own transaction on whatever they are given.

pub mod academic_periods;
pub mod attendance;
pub mod courses;
pub mod credentials;
pub mod dashboard;
pub mod departments;
pub mod enrollments;
pub mod error;
pub mod grades;
pub mod patch;
pub mod schedules;
pub mod sessions;
pub mod students;
pub mod subjects;
pub mod teachers;
pub mod users;

mod crud;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, StoreError};
