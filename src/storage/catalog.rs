use tracing::{debug, warn};

use crate::{
    planner::parser::SqlParser,
    storage::{
        CATALOG_ROOT_PAGE,
        btree::BTreeCursor,
        pager::Pager,
        schema::{CatalogEntry, EntryKind, TableSchema, is_catalog_name},
    },
    types::{
        PageNumber,
        error::{DatabaseError, Result},
        partial::PartialResult,
        record::Record,
    },
};

/// Name lookups against the catalog table on page 1.
///
/// Every call rescans the catalog tree; with the page cache enabled the
/// rescans stay in memory.
pub struct Catalog<'a> {
    pager: &'a mut Pager,
}

impl<'a> Catalog<'a> {
    pub fn new(pager: &'a mut Pager) -> Self {
        Self { pager }
    }

    /// Every catalog row, in rowid order. Rows that fail to decode are kept
    /// in `errors`.
    pub fn entries(&mut self) -> Result<PartialResult<CatalogEntry>> {
        let mut cursor = BTreeCursor::new(CATALOG_ROOT_PAGE);
        let mut entries = PartialResult::new();
        while let Some(cell) = cursor.next_cell(self.pager)? {
            let row_id = cell.row_id;
            let entry =
                Record::from_cell(cell).and_then(|record| CatalogEntry::from_record(&record));
            if let Err(error) = &entry {
                warn!(row_id, %error, "skipping unreadable catalog row");
            }
            entries.push(entry);
        }
        entries.errors.extend(cursor.take_skipped());
        debug!(
            entries = entries.results.len(),
            skipped = entries.errors.len(),
            "read catalog"
        );
        Ok(entries)
    }

    /// Root page and `CREATE TABLE` text of the table called `name`.
    pub fn find_table(&mut self, name: &str) -> Result<(PageNumber, String)> {
        if is_catalog_name(name) {
            let catalog = TableSchema::catalog();
            return Ok((catalog.root_page, catalog.sql));
        }

        self.entries()?
            .results
            .into_iter()
            .find(|entry| entry.kind == EntryKind::Table && entry.name.eq_ignore_ascii_case(name))
            .map(|entry| (entry.root_page, entry.sql.unwrap_or_default()))
            .ok_or_else(|| DatabaseError::TableNotFound {
                name: name.to_string(),
            })
    }

    pub fn find_table_schema(&mut self, name: &str) -> Result<TableSchema> {
        if is_catalog_name(name) {
            return Ok(TableSchema::catalog());
        }

        let (root_page, sql) = self.find_table(name)?;
        let definition = SqlParser::new().parse_table_definition(&sql).map_err(|error| {
            DatabaseError::CorruptedRecord {
                reason: format!("schema of table '{}' does not parse: {}", name, error),
            }
        })?;

        let mut schema = TableSchema::new(
            definition.name,
            root_page,
            sql,
            definition.columns,
            definition.primary_key,
        );
        schema.autoincrement = definition.autoincrement;
        Ok(schema)
    }

    /// User tables in catalog order, leaving out SQLite's internal tables.
    pub fn table_names(&mut self) -> Result<Vec<String>> {
        Ok(self
            .entries()?
            .results
            .into_iter()
            .filter(CatalogEntry::is_user_table)
            .map(|entry| entry.name)
            .collect())
    }
}
