use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::{
    storage::pager::Pager,
    types::{
        PageNumber,
        error::{DatabaseError, Result},
        page::{BTreePage, LeafCell, PageType},
        partial::PartialResult,
    },
};

/// Depth-first walk over a table b-tree, yielding leaf cells in rowid order.
///
/// Interior pages are expanded onto an explicit stack, so the depth of the
/// tree is unbounded. Unreadable cells are collected in `skipped` and the
/// walk continues; an unreadable page aborts it.
pub struct BTreeCursor {
    root_page: PageNumber,
    stack: Vec<PageNumber>,
    pending: VecDeque<LeafCell>,
    visited: HashSet<PageNumber>,
    skipped: Vec<DatabaseError>,
}

impl BTreeCursor {
    pub fn new(root_page: PageNumber) -> Self {
        Self {
            root_page,
            stack: vec![root_page],
            pending: VecDeque::new(),
            visited: HashSet::new(),
            skipped: Vec::new(),
        }
    }

    pub fn root_page(&self) -> PageNumber {
        self.root_page
    }

    pub fn next_cell(&mut self, pager: &mut Pager) -> Result<Option<LeafCell>> {
        loop {
            if let Some(cell) = self.pending.pop_front() {
                return Ok(Some(cell));
            }
            let Some(page_number) = self.stack.pop() else {
                return Ok(None);
            };
            self.visit(pager, page_number)?;
        }
    }

    fn visit(&mut self, pager: &mut Pager, page_number: PageNumber) -> Result<()> {
        if !self.visited.insert(page_number) {
            return Err(DatabaseError::CorruptedPage {
                page_number,
                reason: format!("page reached twice from root {}", self.root_page),
            });
        }

        let page = BTreePage::from_buffer(page_number, pager.read_page(page_number)?)?;
        match page.page_type() {
            PageType::LeafTable => {
                let cells = page.leaf_cells();
                debug!(page_number, cells = cells.results.len(), "leaf page");
                self.pending.extend(cells.results);
                self.record_skipped(page_number, cells.errors);
            }
            PageType::InteriorTable => {
                let children = page.child_pages();
                debug!(page_number, children = children.results.len(), "interior page");
                // reversed so the left-most child is popped first
                self.stack.extend(children.results.into_iter().rev());
                self.record_skipped(page_number, children.errors);
            }
            other @ (PageType::InteriorIndex | PageType::LeafIndex) => {
                return Err(DatabaseError::InvalidPageType {
                    page_number,
                    tag: other.as_u8(),
                });
            }
        }
        Ok(())
    }

    fn record_skipped(&mut self, page_number: PageNumber, errors: Vec<DatabaseError>) {
        for error in errors {
            warn!(page_number, %error, "skipping unreadable cell");
            self.skipped.push(error);
        }
    }

    pub fn take_skipped(&mut self) -> Vec<DatabaseError> {
        std::mem::take(&mut self.skipped)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.root_page);
    }
}

/// Collects every leaf cell reachable from `root_page`.
pub fn scan_table(pager: &mut Pager, root_page: PageNumber) -> Result<PartialResult<LeafCell>> {
    let mut cursor = BTreeCursor::new(root_page);
    let mut cells = PartialResult::new();
    while let Some(cell) = cursor.next_cell(pager)? {
        cells.results.push(cell);
    }
    cells.errors = cursor.take_skipped();
    Ok(cells)
}
