use crate::{
    storage::SQLITE_MAGIC,
    types::{HEADER_SIZE, MAX_PAGE_SIZE, MIN_PAGE_SIZE, error::DatabaseError},
};

/// Stored page size value that stands for 65536, which does not fit in two bytes.
const PAGE_SIZE_65536_MARKER: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    pub fn from_u32(value: u32) -> Result<Self, DatabaseError> {
        match value {
            // 0 shows up in freshly created files that were never written to
            0 | 1 => Ok(TextEncoding::Utf8),
            2 => Ok(TextEncoding::Utf16Le),
            3 => Ok(TextEncoding::Utf16Be),
            _ => Err(DatabaseError::InvalidHeader {
                reason: format!("Unknown text encoding: {}", value),
            }),
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            TextEncoding::Utf8 => 1,
            TextEncoding::Utf16Le => 2,
            TextEncoding::Utf16Be => 3,
        }
    }
}

/// The 100-byte header at the start of every SQLite database file.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseHeader {
    pub magic: [u8; 16],
    /// Decoded page size in bytes (the stored value 1 is already widened to 65536).
    pub page_size: u32,
    pub file_format_write_version: u8,
    pub file_format_read_version: u8,
    pub reserved_space: u8,
    pub max_embedded_payload_fraction: u8,
    pub min_embedded_payload_fraction: u8,
    pub leaf_payload_fraction: u8,
    pub file_change_counter: u32,
    pub database_size_pages: u32,
    pub freelist_trunk_page: u32,
    pub freelist_pages_count: u32,
    pub schema_cookie: u32,
    pub schema_format_number: u32,
    pub default_page_cache_size: u32,
    pub largest_root_btree_page: u32,
    pub text_encoding: TextEncoding,
    pub user_version: u32,
    pub incremental_vacuum_mode: u32,
    pub application_id: u32,
    pub reserved: [u8; 20],
    pub version_valid_for: u32,
    pub sqlite_version_number: u32,
}

impl Default for DatabaseHeader {
    fn default() -> Self {
        Self {
            magic: *SQLITE_MAGIC,
            page_size: 4096,
            file_format_write_version: 1,
            file_format_read_version: 1,
            reserved_space: 0,
            max_embedded_payload_fraction: 64,
            min_embedded_payload_fraction: 32,
            leaf_payload_fraction: 32,
            file_change_counter: 1,
            database_size_pages: 1,
            freelist_trunk_page: 0,
            freelist_pages_count: 0,
            schema_cookie: 1,
            schema_format_number: 4,
            default_page_cache_size: 0,
            largest_root_btree_page: 0,
            text_encoding: TextEncoding::Utf8,
            user_version: 0,
            incremental_vacuum_mode: 0,
            application_id: 0,
            reserved: [0; 20],
            version_valid_for: 1,
            sqlite_version_number: 3_045_000,
        }
    }
}

impl DatabaseHeader {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(HEADER_SIZE);

        let stored_page_size = if self.page_size == MAX_PAGE_SIZE {
            PAGE_SIZE_65536_MARKER
        } else {
            self.page_size as u16
        };

        buffer.extend_from_slice(&self.magic);
        buffer.extend_from_slice(&stored_page_size.to_be_bytes());
        buffer.push(self.file_format_write_version);
        buffer.push(self.file_format_read_version);
        buffer.push(self.reserved_space);
        buffer.push(self.max_embedded_payload_fraction);
        buffer.push(self.min_embedded_payload_fraction);
        buffer.push(self.leaf_payload_fraction);
        buffer.extend_from_slice(&self.file_change_counter.to_be_bytes());
        buffer.extend_from_slice(&self.database_size_pages.to_be_bytes());
        buffer.extend_from_slice(&self.freelist_trunk_page.to_be_bytes());
        buffer.extend_from_slice(&self.freelist_pages_count.to_be_bytes());
        buffer.extend_from_slice(&self.schema_cookie.to_be_bytes());
        buffer.extend_from_slice(&self.schema_format_number.to_be_bytes());
        buffer.extend_from_slice(&self.default_page_cache_size.to_be_bytes());
        buffer.extend_from_slice(&self.largest_root_btree_page.to_be_bytes());
        buffer.extend_from_slice(&self.text_encoding.as_u32().to_be_bytes());
        buffer.extend_from_slice(&self.user_version.to_be_bytes());
        buffer.extend_from_slice(&self.incremental_vacuum_mode.to_be_bytes());
        buffer.extend_from_slice(&self.application_id.to_be_bytes());
        buffer.extend_from_slice(&self.reserved);
        buffer.extend_from_slice(&self.version_valid_for.to_be_bytes());
        buffer.extend_from_slice(&self.sqlite_version_number.to_be_bytes());

        buffer.resize(HEADER_SIZE, 0);
        buffer
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatabaseError> {
        if bytes.len() < HEADER_SIZE {
            return Err(DatabaseError::InvalidHeader {
                reason: format!("Header too short: {} bytes", bytes.len()),
            });
        }

        let mut magic = [0u8; 16];
        magic.copy_from_slice(&bytes[0..16]);
        if &magic != SQLITE_MAGIC {
            return Err(DatabaseError::InvalidHeader {
                reason: "Invalid SQLite magic string".to_string(),
            });
        }

        let page_size = Self::decode_page_size(u16::from_be_bytes([bytes[16], bytes[17]]))?;

        let mut reserved = [0u8; 20];
        reserved.copy_from_slice(&bytes[72..92]);

        Ok(Self {
            magic,
            page_size,
            file_format_write_version: bytes[18],
            file_format_read_version: bytes[19],
            reserved_space: bytes[20],
            max_embedded_payload_fraction: bytes[21],
            min_embedded_payload_fraction: bytes[22],
            leaf_payload_fraction: bytes[23],
            file_change_counter: read_u32(bytes, 24),
            database_size_pages: read_u32(bytes, 28),
            freelist_trunk_page: read_u32(bytes, 32),
            freelist_pages_count: read_u32(bytes, 36),
            schema_cookie: read_u32(bytes, 40),
            schema_format_number: read_u32(bytes, 44),
            default_page_cache_size: read_u32(bytes, 48),
            largest_root_btree_page: read_u32(bytes, 52),
            text_encoding: TextEncoding::from_u32(read_u32(bytes, 56))?,
            user_version: read_u32(bytes, 60),
            incremental_vacuum_mode: read_u32(bytes, 64),
            application_id: read_u32(bytes, 68),
            reserved,
            version_valid_for: read_u32(bytes, 92),
            sqlite_version_number: read_u32(bytes, 96),
        })
    }

    fn decode_page_size(stored: u16) -> Result<u32, DatabaseError> {
        let page_size = if stored == PAGE_SIZE_65536_MARKER {
            MAX_PAGE_SIZE
        } else {
            u32::from(stored)
        };
        if !page_size.is_power_of_two() || !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(DatabaseError::InvalidHeader {
                reason: format!("Unsupported page size: {}", stored),
            });
        }
        Ok(page_size)
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
