use std::{
    collections::HashMap,
    fs::File,
    io::{Read, Seek, SeekFrom},
    rc::Rc,
};

use tracing::debug;

use crate::types::{
    PageNumber,
    error::{DatabaseError, Result},
};

/// Raw bytes of one page, shared between the cache and its readers.
pub type PageBuffer = Rc<[u8]>;

/// Reads fixed-size pages from a database file by 1-based page number.
pub struct Pager {
    file: File,
    page_size: usize,
    page_cache: Option<HashMap<PageNumber, PageBuffer>>,
}

impl Pager {
    pub fn new(file: File, page_size: u32, cache_enabled: bool) -> Self {
        Self {
            file,
            page_size: page_size as usize,
            page_cache: cache_enabled.then(HashMap::new),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn page_offset(&self, page_number: PageNumber) -> u64 {
        u64::from(page_number - 1) * self.page_size as u64
    }

    /// Number of whole pages in the file.
    pub fn page_count(&self) -> Result<u64> {
        let file_size = self.file.metadata()?.len();
        Ok(file_size / self.page_size as u64)
    }

    pub fn read_page(&mut self, page_number: PageNumber) -> Result<PageBuffer> {
        if page_number == 0 {
            return Err(DatabaseError::out_of_bounds("page number", 0, 0));
        }
        if let Some(page) = self.page_cache.as_ref().and_then(|c| c.get(&page_number)) {
            debug!(page_number, "page cache hit");
            return Ok(Rc::clone(page));
        }

        let mut buffer = vec![0u8; self.page_size];
        self.file.seek(SeekFrom::Start(self.page_offset(page_number)))?;
        self.file.read_exact(&mut buffer)?;
        debug!(page_number, page_size = self.page_size, "read page");

        let page: PageBuffer = buffer.into();
        if let Some(cache) = self.page_cache.as_mut() {
            cache.insert(page_number, Rc::clone(&page));
        }
        Ok(page)
    }

    pub fn cached_pages(&self) -> usize {
        self.page_cache.as_ref().map_or(0, HashMap::len)
    }
}
