use serde::{Deserialize, Serialize};

use crate::{
    storage::{pager::PageBuffer, varint},
    types::{
        CELL_POINTER_SIZE, HEADER_SIZE, INTERIOR_PAGE_HEADER_SIZE, LEAF_PAGE_HEADER_SIZE,
        PageNumber, RowId,
        error::{DatabaseError, Result},
        partial::PartialResult,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageType {
    InteriorIndex = 2,
    InteriorTable = 5,
    LeafIndex = 10,
    LeafTable = 13,
}

impl PageType {
    pub fn from_u8(page_number: PageNumber, value: u8) -> Result<Self> {
        match value {
            2 => Ok(PageType::InteriorIndex),
            5 => Ok(PageType::InteriorTable),
            10 => Ok(PageType::LeafIndex),
            13 => Ok(PageType::LeafTable),
            _ => Err(DatabaseError::InvalidPageType {
                page_number,
                tag: value,
            }),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            PageType::InteriorIndex => 2,
            PageType::InteriorTable => 5,
            PageType::LeafIndex => 10,
            PageType::LeafTable => 13,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, PageType::LeafIndex | PageType::LeafTable)
    }

    pub fn header_size(&self) -> usize {
        if self.is_leaf() {
            LEAF_PAGE_HEADER_SIZE
        } else {
            INTERIOR_PAGE_HEADER_SIZE
        }
    }
}

/// Translates b-tree structural offsets into positions in the page buffer.
///
/// Page 1 starts with the 100-byte database header, so its b-tree header and
/// cell pointer array sit 100 bytes further in than on every other page.
/// Cell pointer *values* are already absolute and never go through here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCoordinates {
    pub page_number: PageNumber,
}

impl PageCoordinates {
    pub fn new(page_number: PageNumber) -> Self {
        Self { page_number }
    }

    pub fn header_offset(&self) -> usize {
        if self.page_number == 1 { HEADER_SIZE } else { 0 }
    }

    pub fn structural(&self, offset: usize) -> usize {
        self.header_offset() + offset
    }
}

/*
 * B-tree page layout
 * ┌──────────────────────────────────────────────────────────────┐
 * │ [database header, 100 bytes, page 1 only]                    │
 * ├──────────────────────────────────────────────────────────────┤
 * │ PAGE HEADER (8 bytes leaf, 12 bytes interior)                │
 * │  type(1) | first_freeblock(2) | cell_count(2) |              │
 * │  content_start(2) | fragmented(1) | [right_most(4)]          │
 * ├──────────────────────────────────────────────────────────────┤
 * │ CELL POINTER ARRAY  [ptr0(2)] [ptr1(2)] ...                  │
 * ├──────────────────────────────────────────────────────────────┤
 * │ UNALLOCATED SPACE                                            │
 * ├──────────────────────────────────────────────────────────────┤
 * │ CELL CONTENT AREA                                            │
 * └──────────────────────────────────────────────────────────────┘
 */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub first_freeblock: u16,
    pub cell_count: u16,
    /// Zero on disk means 65536.
    pub cell_content_start: u32,
    pub fragmented_free_bytes: u8,
    pub right_most_pointer: Option<PageNumber>,
}

impl PageHeader {
    pub fn from_bytes(coordinates: PageCoordinates, data: &[u8]) -> Result<Self> {
        let start = coordinates.header_offset();
        if start + LEAF_PAGE_HEADER_SIZE > data.len() {
            return Err(DatabaseError::out_of_bounds("page header", start, data.len()));
        }
        let page_type = PageType::from_u8(coordinates.page_number, data[start])?;
        if start + page_type.header_size() > data.len() {
            return Err(DatabaseError::out_of_bounds("page header", start, data.len()));
        }

        let read_u16 =
            |offset: usize| u16::from_be_bytes([data[start + offset], data[start + offset + 1]]);
        let cell_content_start = match read_u16(5) {
            0 => 65536,
            n => u32::from(n),
        };
        let right_most_pointer = (!page_type.is_leaf()).then(|| {
            u32::from_be_bytes([
                data[start + 8],
                data[start + 9],
                data[start + 10],
                data[start + 11],
            ])
        });

        Ok(Self {
            page_type,
            first_freeblock: read_u16(1),
            cell_count: read_u16(3),
            cell_content_start,
            fragmented_free_bytes: data[start + 7],
            right_most_pointer,
        })
    }

    pub fn size(&self) -> usize {
        self.page_type.header_size()
    }
}

/// A row-bearing cell of a leaf table page.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafCell {
    pub row_id: RowId,
    pub payload_size: u64,
    pub payload: Vec<u8>,
}

/// A divider cell of an interior table page. The key is the largest rowid
/// reachable through `left_child`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteriorCell {
    pub left_child: PageNumber,
    pub key: RowId,
}

/// A parsed view over one b-tree page buffer.
#[derive(Debug, Clone)]
pub struct BTreePage {
    pub coordinates: PageCoordinates,
    pub header: PageHeader,
    pub cell_pointers: Vec<u16>,
    data: PageBuffer,
}

impl BTreePage {
    pub fn from_buffer(page_number: PageNumber, data: PageBuffer) -> Result<Self> {
        let coordinates = PageCoordinates::new(page_number);
        let header = PageHeader::from_bytes(coordinates, &data)?;

        let array_start = coordinates.structural(header.size());
        let array_end = array_start + header.cell_count as usize * CELL_POINTER_SIZE;
        if array_end > data.len() {
            return Err(DatabaseError::CorruptedPage {
                page_number,
                reason: format!(
                    "{} cell pointers do not fit in a {} byte page",
                    header.cell_count,
                    data.len()
                ),
            });
        }

        let cell_pointers = data[array_start..array_end]
            .chunks_exact(CELL_POINTER_SIZE)
            .map(|ptr| u16::from_be_bytes([ptr[0], ptr[1]]))
            .collect();

        Ok(Self {
            coordinates,
            header,
            cell_pointers,
            data,
        })
    }

    pub fn page_number(&self) -> PageNumber {
        self.coordinates.page_number
    }

    pub fn page_type(&self) -> PageType {
        self.header.page_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// First byte after the cell pointer array; cells can't start before it.
    fn content_floor(&self) -> usize {
        self.coordinates.structural(self.header.size())
            + self.cell_pointers.len() * CELL_POINTER_SIZE
    }

    fn checked_pointer(&self, pointer: u16) -> Result<usize> {
        let offset = pointer as usize;
        if offset < self.content_floor() || offset >= self.data.len() {
            return Err(DatabaseError::out_of_bounds(
                format!("cell pointer on page {}", self.page_number()),
                offset,
                self.data.len(),
            ));
        }
        Ok(offset)
    }

    /// Cells in pointer order. A cell that can't be read is reported in
    /// `errors` and the remaining cells are still returned.
    pub fn leaf_cells(&self) -> PartialResult<LeafCell> {
        let mut cells = PartialResult::new();
        for &pointer in &self.cell_pointers {
            cells.push(
                self.checked_pointer(pointer)
                    .and_then(|offset| self.read_leaf_cell(offset)),
            );
        }
        cells
    }

    fn read_leaf_cell(&self, offset: usize) -> Result<LeafCell> {
        let (payload_size, size_len) = varint::decode(&self.data, offset)?;
        let (row_id, row_id_len) = varint::decode_i64(&self.data, offset + size_len)?;
        let start = offset + size_len + row_id_len;
        let end = usize::try_from(payload_size)
            .ok()
            .and_then(|size| start.checked_add(size))
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                DatabaseError::out_of_bounds(
                    format!("payload of row {} on page {}", row_id, self.page_number()),
                    start,
                    self.data.len(),
                )
            })?;

        Ok(LeafCell {
            row_id,
            payload_size,
            payload: self.data[start..end].to_vec(),
        })
    }

    pub fn interior_cells(&self) -> PartialResult<InteriorCell> {
        let mut cells = PartialResult::new();
        for &pointer in &self.cell_pointers {
            cells.push(
                self.checked_pointer(pointer)
                    .and_then(|offset| self.read_interior_cell(offset)),
            );
        }
        cells
    }

    fn read_interior_cell(&self, offset: usize) -> Result<InteriorCell> {
        if offset + 4 > self.data.len() {
            return Err(DatabaseError::out_of_bounds("child pointer", offset, self.data.len()));
        }
        let left_child = u32::from_be_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]);
        let (key, _) = varint::decode_i64(&self.data, offset + 4)?;
        Ok(InteriorCell { left_child, key })
    }

    /// Child pages of an interior page in key order, right-most pointer last.
    pub fn child_pages(&self) -> PartialResult<PageNumber> {
        let mut children = self.interior_cells().map(|cell| cell.left_child);
        if let Some(right_most) = self.header.right_most_pointer {
            children.results.push(right_most);
        }
        let page_number = self.page_number();
        let (valid, invalid): (Vec<_>, Vec<_>) =
            children.results.into_iter().partition(|child| *child != 0);
        children.results = valid;
        children
            .errors
            .extend(invalid.into_iter().map(|_| DatabaseError::CorruptedPage {
                page_number,
                reason: "child page number 0".to_string(),
            }));
        children
    }
}
