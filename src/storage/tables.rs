use redb::TableDefinition;

/// Records of one collection: key attribute value -> record (msgpack).
/// Each configured collection gets its own table, named after the collection.
pub fn records_table(name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}
