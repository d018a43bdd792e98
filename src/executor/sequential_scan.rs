use tracing::debug;

use crate::{
    executor::scan::Scanner,
    storage::{btree::BTreeCursor, database::Database, pager::Pager},
    types::{PageNumber, error::DatabaseError, record::Record},
};

/// Walks every leaf cell of one table b-tree and decodes it into a record.
///
/// Cells the b-tree walk had to skip are kept aside and can be collected
/// with [`SequentialScanner::take_skipped`]. A cell that is read but does not
/// decode fails the scan.
pub struct SequentialScanner<'a> {
    pager: &'a mut Pager,
    table_name: String,
    cursor: BTreeCursor,
    scanned: usize,
    is_exhausted: bool,
}

impl<'a> SequentialScanner<'a> {
    pub fn new(database: &'a mut Database, table_name: String) -> Result<Self, DatabaseError> {
        let (root_page, _) = database.catalog().find_table(&table_name)?;
        Ok(Self::with_root(database.pager_mut(), table_name, root_page))
    }

    pub fn with_root(pager: &'a mut Pager, table_name: String, root_page: PageNumber) -> Self {
        Self {
            pager,
            table_name,
            cursor: BTreeCursor::new(root_page),
            scanned: 0,
            is_exhausted: false,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn root_page(&self) -> PageNumber {
        self.cursor.root_page()
    }

    pub fn take_skipped(&mut self) -> Vec<DatabaseError> {
        self.cursor.take_skipped()
    }
}

impl Scanner for SequentialScanner<'_> {
    fn scan(&mut self) -> Result<Option<Record>, DatabaseError> {
        if self.is_exhausted {
            return Ok(None);
        }
        match self.cursor.next_cell(self.pager)? {
            Some(cell) => {
                let record = Record::from_cell(cell)?;
                self.scanned += 1;
                Ok(Some(record))
            }
            None => {
                debug!(table = %self.table_name, records = self.scanned, "scan finished");
                self.is_exhausted = true;
                Ok(None)
            }
        }
    }

    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<Record>, DatabaseError> {
        let mut records = Vec::with_capacity(batch_size);
        for _ in 0..batch_size {
            match self.scan()? {
                Some(record) => records.push(record),
                None => break,
            }
        }
        Ok(records)
    }

    fn reset(&mut self) -> Result<(), DatabaseError> {
        self.cursor.reset();
        self.scanned = 0;
        self.is_exhausted = false;
        Ok(())
    }
}
