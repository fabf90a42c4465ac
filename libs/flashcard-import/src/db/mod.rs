//! Read access to the embedded collection database.

pub mod collection;
pub mod error;

pub use collection::{CollectionSource, SqliteCollection};
pub use error::DbError;
