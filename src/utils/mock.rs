use std::{io::Write, path::Path};

use tempfile::NamedTempFile;

use crate::{
    config::EngineConfig,
    storage::{
        CATALOG_ROOT_PAGE,
        database::Database,
        header::{DatabaseHeader, TextEncoding},
        schema::{CatalogEntry, EntryKind},
        varint,
    },
    types::{
        CELL_POINTER_SIZE, HEADER_SIZE, PageNumber, RowId,
        error::{DatabaseError, Result},
        page::{PageCoordinates, PageType},
        record,
        value::Value,
    },
};

struct TableFixture {
    name: String,
    sql: String,
    cells: Vec<(RowId, Vec<u8>)>,
}

struct Patch {
    page_number: PageNumber,
    offset: usize,
    bytes: Vec<u8>,
}

/// Writes small, bit-exact SQLite files for tests and benchmarks.
///
/// Page 1 holds the catalog as a single leaf. Each table gets a leaf root
/// page, or an interior root over several leaves once it has more rows than
/// `rows_per_leaf`. Pages are numbered in the order tables were added.
pub struct DatabaseBuilder {
    header: DatabaseHeader,
    tables: Vec<TableFixture>,
    extra_entries: Vec<CatalogEntry>,
    rows_per_leaf: Option<usize>,
    patches: Vec<Patch>,
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self {
            header: DatabaseHeader::default(),
            tables: Vec::new(),
            extra_entries: Vec::new(),
            rows_per_leaf: None,
            patches: Vec::new(),
        }
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.header.page_size = page_size;
        self
    }

    pub fn text_encoding(mut self, encoding: TextEncoding) -> Self {
        self.header.text_encoding = encoding;
        self
    }

    /// Splits tables with more rows than this over an interior root page.
    pub fn rows_per_leaf(mut self, rows: usize) -> Self {
        self.rows_per_leaf = Some(rows.max(1));
        self
    }

    /// Adds a table whose rows get rowids 1, 2, 3, ...
    pub fn table(self, name: &str, sql: &str, rows: Vec<Vec<Value>>) -> Self {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, values)| (i as RowId + 1, values))
            .collect();
        self.table_with_row_ids(name, sql, rows)
    }

    pub fn table_with_row_ids(self, name: &str, sql: &str, rows: Vec<(RowId, Vec<Value>)>) -> Self {
        let cells = rows
            .into_iter()
            .map(|(row_id, values)| (row_id, record::encode(&values)))
            .collect();
        self.table_with_payloads(name, sql, cells)
    }

    /// Adds a table whose cells carry the given payloads as-is.
    pub fn table_with_payloads(
        mut self,
        name: &str,
        sql: &str,
        cells: Vec<(RowId, Vec<u8>)>,
    ) -> Self {
        self.tables.push(TableFixture {
            name: name.to_string(),
            sql: sql.to_string(),
            cells,
        });
        self
    }

    /// Adds a catalog row that owns no pages, such as a view.
    pub fn catalog_entry(mut self, entry: CatalogEntry) -> Self {
        self.extra_entries.push(entry);
        self
    }

    /// Overwrites bytes of a page after it has been laid out.
    pub fn patch(mut self, page_number: PageNumber, offset: usize, bytes: &[u8]) -> Self {
        self.patches.push(Patch {
            page_number,
            offset,
            bytes: bytes.to_vec(),
        });
        self
    }

    fn leaf_chunk_size(&self, table: &TableFixture) -> usize {
        self.rows_per_leaf.unwrap_or(table.cells.len()).max(1)
    }

    /// Page numbers each table's root lands on.
    pub fn root_pages(&self) -> Vec<(String, PageNumber)> {
        let mut next_page = CATALOG_ROOT_PAGE + 1;
        let mut roots = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            roots.push((table.name.clone(), next_page));
            let leaves = table.cells.len().div_ceil(self.leaf_chunk_size(table)).max(1);
            next_page += if leaves > 1 { leaves as PageNumber + 1 } else { 1 };
        }
        roots
    }

    pub fn build_bytes(&self) -> Result<Vec<u8>> {
        let page_size = self.header.page_size as usize;
        let roots = self.root_pages();

        let mut catalog_rows = Vec::new();
        for (table, (_, root_page)) in self.tables.iter().zip(&roots) {
            let entry = CatalogEntry {
                kind: EntryKind::Table,
                name: table.name.clone(),
                table_name: table.name.clone(),
                root_page: *root_page,
                sql: Some(table.sql.clone()),
            };
            catalog_rows.push(entry.to_values());
        }
        catalog_rows.extend(self.extra_entries.iter().map(CatalogEntry::to_values));
        let catalog_cells: Vec<(RowId, Vec<u8>)> = catalog_rows
            .iter()
            .enumerate()
            .map(|(i, values)| (i as RowId + 1, record::encode(values)))
            .collect();

        let mut pages = vec![leaf_page(CATALOG_ROOT_PAGE, page_size, &catalog_cells)?];
        for (table, (_, root_page)) in self.tables.iter().zip(&roots) {
            let chunk = self.leaf_chunk_size(table);
            if table.cells.len() <= chunk {
                pages.push(leaf_page(*root_page, page_size, &table.cells)?);
                continue;
            }

            let leaves: Vec<&[(RowId, Vec<u8>)]> = table.cells.chunks(chunk).collect();
            let children: Vec<(PageNumber, RowId)> = leaves
                .iter()
                .enumerate()
                .map(|(i, cells)| {
                    let last_row_id = cells.last().map_or(0, |(row_id, _)| *row_id);
                    (*root_page + 1 + i as PageNumber, last_row_id)
                })
                .collect();
            pages.push(interior_page(*root_page, page_size, &children)?);
            for ((page_number, _), cells) in children.iter().zip(leaves) {
                pages.push(leaf_page(*page_number, page_size, cells)?);
            }
        }

        let mut header = self.header.clone();
        header.database_size_pages = pages.len() as u32;
        let mut bytes: Vec<u8> = pages.concat();
        bytes[..HEADER_SIZE].copy_from_slice(&header.to_bytes());

        for patch in &self.patches {
            let page_index = (patch.page_number as usize).checked_sub(1).ok_or_else(|| {
                DatabaseError::out_of_bounds("patch page number", 0, pages.len())
            })?;
            let start = page_index * page_size + patch.offset;
            let end = start + patch.bytes.len();
            if end > bytes.len() {
                return Err(DatabaseError::out_of_bounds("patch", start, bytes.len()));
            }
            bytes[start..end].copy_from_slice(&patch.bytes);
        }
        Ok(bytes)
    }

    pub fn build(self) -> Result<TempDatabase> {
        let bytes = self.build_bytes()?;
        let mut file = NamedTempFile::with_prefix("lembar_test_")?;
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(TempDatabase {
            file,
            roots: self.root_pages(),
        })
    }
}

/// Lays out cells from the end of the page backwards, pointers in the given order.
fn leaf_page(
    page_number: PageNumber,
    page_size: usize,
    cells: &[(RowId, Vec<u8>)],
) -> Result<Vec<u8>> {
    let encoded = cells
        .iter()
        .map(|(row_id, payload)| {
            let mut cell = varint::encode(payload.len() as u64);
            cell.extend(varint::encode(*row_id as u64));
            cell.extend_from_slice(payload);
            cell
        })
        .collect();
    btree_page(page_number, page_size, PageType::LeafTable, encoded, None)
}

/// Every child but the last becomes a cell; the last is the right-most pointer.
fn interior_page(
    page_number: PageNumber,
    page_size: usize,
    children: &[(PageNumber, RowId)],
) -> Result<Vec<u8>> {
    let Some(((right_most, _), dividers)) = children.split_last() else {
        return Err(DatabaseError::CorruptedPage {
            page_number,
            reason: "interior page without children".to_string(),
        });
    };
    let encoded = dividers
        .iter()
        .map(|(child, key)| {
            let mut cell = child.to_be_bytes().to_vec();
            cell.extend(varint::encode(*key as u64));
            cell
        })
        .collect();
    btree_page(page_number, page_size, PageType::InteriorTable, encoded, Some(*right_most))
}

fn btree_page(
    page_number: PageNumber,
    page_size: usize,
    page_type: PageType,
    cells: Vec<Vec<u8>>,
    right_most: Option<PageNumber>,
) -> Result<Vec<u8>> {
    let coordinates = PageCoordinates::new(page_number);
    let pointer_start = coordinates.structural(page_type.header_size());
    let pointer_end = pointer_start + cells.len() * CELL_POINTER_SIZE;

    let mut page = vec![0u8; page_size];
    let mut content_start = page_size;
    for (i, cell) in cells.iter().enumerate() {
        if content_start < pointer_end + cell.len() {
            return Err(DatabaseError::out_of_bounds(
                format!("cell {} on page {}", i, page_number),
                content_start,
                page_size,
            ));
        }
        content_start -= cell.len();
        page[content_start..content_start + cell.len()].copy_from_slice(cell);
        let pointer = pointer_start + i * CELL_POINTER_SIZE;
        page[pointer..pointer + CELL_POINTER_SIZE]
            .copy_from_slice(&(content_start as u16).to_be_bytes());
    }

    let header = coordinates.header_offset();
    page[header] = page_type.as_u8();
    page[header + 3..header + 5].copy_from_slice(&(cells.len() as u16).to_be_bytes());
    // 65536 is stored as 0
    page[header + 5..header + 7].copy_from_slice(&(content_start as u16).to_be_bytes());
    if let Some(right_most) = right_most {
        page[header + 8..header + 12].copy_from_slice(&right_most.to_be_bytes());
    }
    Ok(page)
}

/// A database file that is removed when dropped.
pub struct TempDatabase {
    file: NamedTempFile,
    roots: Vec<(String, PageNumber)>,
}

impl TempDatabase {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn root_page(&self, table_name: &str) -> Option<PageNumber> {
        self.roots
            .iter()
            .find(|(name, _)| name == table_name)
            .map(|(_, page)| *page)
    }

    pub fn open(&self) -> Result<Database> {
        Database::open(self.path(), &EngineConfig::default())
    }

    pub fn open_with(&self, config: &EngineConfig) -> Result<Database> {
        Database::open(self.path(), config)
    }
}
