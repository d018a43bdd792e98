use std::{
    fs::{File, OpenOptions},
    io::Read,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    config::EngineConfig,
    storage::{
        catalog::Catalog,
        header::{DatabaseHeader, TextEncoding},
        pager::Pager,
    },
    types::{
        HEADER_SIZE,
        error::{DatabaseError, Result},
    },
};

/// An open, read-only SQLite database file.
pub struct Database {
    path: PathBuf,
    header: DatabaseHeader,
    pager: Pager,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P, config: &EngineConfig) -> Result<Self> {
        let path = path.as_ref();
        let mut file = OpenOptions::new().read(true).open(path)?;
        let header = Self::read_header(&mut file)?;

        if header.text_encoding != TextEncoding::Utf8 {
            return Err(DatabaseError::InvalidHeader {
                reason: format!("Unsupported text encoding: {:?}", header.text_encoding),
            });
        }

        debug!(
            path = %path.display(),
            page_size = header.page_size,
            page_cache = config.page_cache,
            "opened database"
        );

        let pager = Pager::new(file, header.page_size, config.page_cache);
        Ok(Self {
            path: path.to_path_buf(),
            header,
            pager,
        })
    }

    fn read_header(file: &mut File) -> Result<DatabaseHeader> {
        let mut buffer = Vec::with_capacity(HEADER_SIZE);
        file.by_ref()
            .take(HEADER_SIZE as u64)
            .read_to_end(&mut buffer)?;
        DatabaseHeader::from_bytes(&buffer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &DatabaseHeader {
        &self.header
    }

    pub fn page_size(&self) -> u32 {
        self.header.page_size
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn pager_mut(&mut self) -> &mut Pager {
        &mut self.pager
    }

    pub fn catalog(&mut self) -> Catalog<'_> {
        Catalog::new(&mut self.pager)
    }
}
