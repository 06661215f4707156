pub mod db;
mod files;
pub mod models;
mod roles;
mod settings;
mod tables;

pub use db::{Database, DatabaseError};
pub use files::StoreError;
pub use roles::RoleChange;
pub use tables::*;
