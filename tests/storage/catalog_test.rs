use lembar::{
    config::EngineConfig,
    storage::{
        database::Database,
        schema::{CatalogEntry, EntryKind, TableSchema},
    },
    types::{
        error::{DatabaseError, ErrorKind},
        value::Value,
    },
    utils::mock::DatabaseBuilder,
};

fn sample_database() -> Database {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sample.db");
    Database::open(path, &EngineConfig::default()).unwrap()
}

#[test]
fn test_catalog_entries() -> Result<(), DatabaseError> {
    let mut database = sample_database();
    let entries = database.catalog().entries()?;

    assert!(entries.is_complete());
    let names: Vec<&str> = entries.results.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["apples", "sqlite_sequence", "oranges", "numbers"]);
    let roots: Vec<u32> = entries.results.iter().map(|e| e.root_page).collect();
    assert_eq!(roots, vec![2, 3, 4, 5]);
    assert!(entries.results.iter().all(|e| e.kind == EntryKind::Table));
    Ok(())
}

#[test]
fn test_find_table() -> Result<(), DatabaseError> {
    let mut database = sample_database();
    let (root, sql) = database.catalog().find_table("oranges")?;
    assert_eq!(root, 4);
    assert!(sql.starts_with("CREATE TABLE oranges"));

    // names compare case-insensitively
    let (root, _) = database.catalog().find_table("APPLES")?;
    assert_eq!(root, 2);
    Ok(())
}

#[test]
fn test_missing_table_is_not_found() {
    let mut database = sample_database();
    let err = database.catalog().find_table("pears").unwrap_err();
    assert!(matches!(err, DatabaseError::TableNotFound { ref name } if name == "pears"));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_catalog_describes_itself() -> Result<(), DatabaseError> {
    let mut database = sample_database();
    for name in ["sqlite_master", "sqlite_schema", "SQLITE_MASTER"] {
        let schema = database.catalog().find_table_schema(name)?;
        assert_eq!(schema, TableSchema::catalog());
        assert_eq!(schema.root_page, 1);
        assert_eq!(
            schema.column_names(),
            vec!["type", "name", "tbl_name", "rootpage", "sql"]
        );
        assert_eq!(schema.primary_key, None);
    }
    Ok(())
}

#[test]
fn test_schema_with_autoincrement_key() -> Result<(), DatabaseError> {
    let mut database = sample_database();
    let schema = database.catalog().find_table_schema("apples")?;

    assert_eq!(schema.table_name, "apples");
    assert_eq!(schema.root_page, 2);
    assert_eq!(schema.column_names(), vec!["id", "name", "color"]);
    assert_eq!(schema.primary_key, Some(0));
    assert!(schema.autoincrement);
    assert_eq!(schema.primary_key_column().unwrap().name, "id");
    assert_eq!(schema.columns[1].declared_type, "TEXT");
    Ok(())
}

#[test]
fn test_schema_with_untyped_columns() -> Result<(), DatabaseError> {
    let mut database = sample_database();
    let schema = database.catalog().find_table_schema("sqlite_sequence")?;

    assert_eq!(schema.column_names(), vec!["name", "seq"]);
    assert!(schema.columns.iter().all(|c| c.declared_type.is_empty()));
    assert_eq!(schema.primary_key, None);
    assert!(!schema.autoincrement);
    Ok(())
}

#[test]
fn test_table_level_primary_key() -> Result<(), DatabaseError> {
    let temp = DatabaseBuilder::new()
        .table(
            "pairs",
            "CREATE TABLE pairs(label TEXT, code INTEGER, PRIMARY KEY (code))",
            vec![],
        )
        .table(
            "composite",
            "CREATE TABLE composite(a INTEGER, b INTEGER, PRIMARY KEY (a, b))",
            vec![],
        )
        .build()?;
    let mut database = temp.open()?;

    let pairs = database.catalog().find_table_schema("pairs")?;
    assert_eq!(pairs.primary_key, Some(1));
    let composite = database.catalog().find_table_schema("composite")?;
    assert_eq!(composite.primary_key, None);
    Ok(())
}

#[test]
fn test_table_names_skip_internal_tables() -> Result<(), DatabaseError> {
    let mut database = sample_database();
    assert_eq!(
        database.catalog().table_names()?,
        vec!["apples", "oranges", "numbers"]
    );
    Ok(())
}

#[test]
fn test_views_and_indexes_are_not_tables() -> Result<(), DatabaseError> {
    let temp = DatabaseBuilder::new()
        .table("t", "CREATE TABLE t(a)", vec![vec![Value::Int8(1)]])
        .catalog_entry(CatalogEntry {
            kind: EntryKind::View,
            name: "v".to_string(),
            table_name: "v".to_string(),
            root_page: 0,
            sql: Some("CREATE VIEW v AS SELECT a FROM t".to_string()),
        })
        .build()?;
    let mut database = temp.open()?;

    let entries = database.catalog().entries()?;
    assert_eq!(entries.results.len(), 2);
    assert_eq!(entries.results[1].kind, EntryKind::View);
    assert_eq!(database.catalog().table_names()?, vec!["t"]);
    assert!(matches!(
        database.catalog().find_table("v"),
        Err(DatabaseError::TableNotFound { .. })
    ));
    Ok(())
}

#[test]
fn test_unreadable_catalog_row_is_collected() -> Result<(), DatabaseError> {
    let builder = DatabaseBuilder::new()
        .table("first", "CREATE TABLE first(a)", vec![])
        .table("second", "CREATE TABLE second(a)", vec![]);
    let bytes = builder.build_bytes()?;
    // first catalog cell: payload size, rowid, then the record header;
    // its first serial type becomes a reserved one
    let pointer = u16::from_be_bytes([bytes[108], bytes[109]]) as usize;
    let temp = builder.patch(1, pointer + 3, &[10]).build()?;
    let mut database = temp.open()?;

    let entries = database.catalog().entries()?;
    assert_eq!(entries.results.len(), 1);
    assert_eq!(entries.results[0].name, "second");
    assert_eq!(entries.errors.len(), 1);
    assert!(matches!(entries.errors[0], DatabaseError::UnsupportedSerialType(10)));
    Ok(())
}
