pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod scraper;
pub mod search;
pub mod vine;

pub use catalog::Arcadia;
pub use db::Database;
pub use error::{Error, Result};
pub use models::{
    DataView, DeleteOutcome, InsertOutcome, Record, RecordBuilder, RecordKind, UpdateFields,
    UpdateOutcome,
};
pub use vine::{Summary, Vine, VineRoot};
