//! Database entities shared by the migration, store and server crates.

pub mod entities;
