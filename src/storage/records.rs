use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{Collection, Record};
use super::tables::*;

/// Keyed record access for a collection: exact-match get, full scan and
/// insert-or-replace.
pub trait RecordStore: Send + Sync {
    fn get_item(&self, collection: &Collection, id: &str) -> Result<Option<Record>, DatabaseError>;

    /// Every record in the collection, in store order.
    fn scan(&self, collection: &Collection) -> Result<Vec<Record>, DatabaseError>;

    /// Insert the record under its key attribute, replacing any previous one.
    fn put_item(&self, collection: &Collection, record: &Record) -> Result<(), DatabaseError>;
}

impl RecordStore for Database {
    fn get_item(&self, collection: &Collection, id: &str) -> Result<Option<Record>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(records_table(&collection.name))?;

        match table.get(id)? {
            Some(data) => {
                let record: Record = rmp_serde::from_slice(data.value())?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn scan(&self, collection: &Collection) -> Result<Vec<Record>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(records_table(&collection.name))?;

        let mut records = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let record: Record = rmp_serde::from_slice(value.value())?;
            records.push(record);
        }

        Ok(records)
    }

    fn put_item(&self, collection: &Collection, record: &Record) -> Result<(), DatabaseError> {
        let key = collection
            .key_of(record)
            .ok_or(DatabaseError::MissingKey(collection.key_attribute))?;

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(records_table(&collection.name))?;
            let data = rmp_serde::to_vec_named(record)?;
            table.insert(key, data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
