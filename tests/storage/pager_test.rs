use std::{io::Write, rc::Rc};

use lembar::{
    config::EngineConfig,
    storage::{
        SQLITE_MAGIC,
        database::Database,
        header::{DatabaseHeader, TextEncoding},
    },
    types::{
        error::{DatabaseError, ErrorKind},
        value::Value,
    },
    utils::mock::DatabaseBuilder,
};
use tempfile::NamedTempFile;

fn sample_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sample.db")
}

fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_open_real_database() -> Result<(), DatabaseError> {
    let database = Database::open(sample_path(), &EngineConfig::default())?;
    assert_eq!(database.page_size(), 4096);
    assert_eq!(database.header().magic, *SQLITE_MAGIC);
    assert_eq!(database.header().text_encoding, TextEncoding::Utf8);
    assert_eq!(database.pager().page_count()?, 15);
    Ok(())
}

#[test]
fn test_bad_magic_is_rejected() {
    let mut bytes = DatabaseBuilder::new().build_bytes().unwrap();
    bytes[0] = b's';
    let file = write_temp(&bytes);

    let result = Database::open(file.path(), &EngineConfig::default());
    match result {
        Err(e @ DatabaseError::InvalidHeader { .. }) => assert_eq!(e.kind(), ErrorKind::Format),
        Err(e) => panic!("expected InvalidHeader, got {}", e),
        Ok(_) => panic!("garbage header was accepted"),
    }
}

#[test]
fn test_every_magic_byte_is_checked() {
    let valid = DatabaseHeader::default().to_bytes();
    for i in 0..16 {
        let mut bytes = valid.clone();
        bytes[i] ^= 0x20;
        assert!(DatabaseHeader::from_bytes(&bytes).is_err(), "byte {} not checked", i);
    }
    assert!(DatabaseHeader::from_bytes(&valid).is_ok());
}

#[test]
fn test_short_file_is_rejected() {
    let file = write_temp(b"SQLite format 3\0");
    let result = Database::open(file.path(), &EngineConfig::default());
    assert!(matches!(result, Err(DatabaseError::InvalidHeader { .. })));
}

#[test]
fn test_missing_file_is_io_error() {
    let result = Database::open("/nonexistent/lembar/none.db", &EngineConfig::default());
    match result {
        Err(e) => assert_eq!(e.kind(), ErrorKind::Io),
        Ok(_) => panic!("opened a missing file"),
    }
}

#[test]
fn test_page_size_encoding() {
    let header = DatabaseHeader {
        page_size: 65536,
        ..DatabaseHeader::default()
    };
    let bytes = header.to_bytes();
    assert_eq!(&bytes[16..18], &[0x00, 0x01]);
    assert_eq!(DatabaseHeader::from_bytes(&bytes).unwrap().page_size, 65536);

    let mut bytes = DatabaseHeader::default().to_bytes();
    bytes[16..18].copy_from_slice(&1000u16.to_be_bytes());
    assert!(DatabaseHeader::from_bytes(&bytes).is_err());
}

#[test]
fn test_utf16_database_is_rejected() {
    let temp = DatabaseBuilder::new()
        .text_encoding(TextEncoding::Utf16Le)
        .build()
        .unwrap();
    assert!(matches!(temp.open(), Err(DatabaseError::InvalidHeader { .. })));
}

#[test]
fn test_read_page_offsets() -> Result<(), DatabaseError> {
    let mut database = Database::open(sample_path(), &EngineConfig::default())?;
    let pager = database.pager_mut();

    let first = pager.read_page(1)?;
    assert_eq!(first.len(), 4096);
    assert_eq!(&first[..16], SQLITE_MAGIC);
    assert_eq!(first[100], 13);

    // apples root leaf
    let second = pager.read_page(2)?;
    assert_eq!(second[0], 13);
    // numbers root is interior
    let fifth = pager.read_page(5)?;
    assert_eq!(fifth[0], 5);
    Ok(())
}

#[test]
fn test_read_page_out_of_range() -> Result<(), DatabaseError> {
    let mut database = Database::open(sample_path(), &EngineConfig::default())?;
    let pager = database.pager_mut();

    assert_eq!(pager.read_page(0).unwrap_err().kind(), ErrorKind::Bounds);
    assert_eq!(pager.read_page(16).unwrap_err().kind(), ErrorKind::Io);
    Ok(())
}

#[test]
fn test_page_cache_returns_same_buffer() -> Result<(), DatabaseError> {
    let mut database = Database::open(sample_path(), &EngineConfig::default())?;
    let pager = database.pager_mut();

    let first = pager.read_page(3)?;
    let again = pager.read_page(3)?;
    assert!(Rc::ptr_eq(&first, &again));
    assert_eq!(pager.cached_pages(), 1);
    Ok(())
}

#[test]
fn test_page_cache_disabled() -> Result<(), DatabaseError> {
    let config = EngineConfig::default().with_page_cache(false);
    let mut database = Database::open(sample_path(), &config)?;
    let pager = database.pager_mut();

    let first = pager.read_page(3)?;
    let again = pager.read_page(3)?;
    assert!(!Rc::ptr_eq(&first, &again));
    assert_eq!(first, again);
    assert_eq!(pager.cached_pages(), 0);
    Ok(())
}

#[test]
fn test_builder_writes_requested_page_size() -> Result<(), DatabaseError> {
    let temp = DatabaseBuilder::new()
        .page_size(1024)
        .table("t", "CREATE TABLE t(a)", vec![vec![Value::Int8(1)]])
        .build()?;
    let database = temp.open()?;
    assert_eq!(database.page_size(), 1024);
    assert_eq!(database.pager().page_count()?, 2);
    assert_eq!(database.header().database_size_pages, 2);
    Ok(())
}
