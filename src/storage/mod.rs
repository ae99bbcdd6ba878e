pub mod db;
pub mod models;
mod records;
mod tables;

pub use db::{Database, DatabaseError};
pub use models::{BlogRecord, Collection, Record};
pub use records::RecordStore;
pub use tables::*;
