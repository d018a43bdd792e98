use lembar::{
    config::EngineConfig,
    executor::{
        scan::{ScanIterator, Scanner},
        select::QueryExecutor,
        sequential_scan::SequentialScanner,
    },
    storage::database::Database,
    types::{
        error::{DatabaseError, ErrorKind},
        row::Row,
        value::Value,
    },
    utils::mock::DatabaseBuilder,
};

const APPLES_SQL: &str =
    "CREATE TABLE apples(id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, color TEXT)";

fn sample_database() -> Database {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sample.db");
    Database::open(path, &EngineConfig::default()).unwrap()
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn values(rows: &[Row]) -> Vec<Vec<Value>> {
    rows.iter().map(|row| row.values.clone()).collect()
}

#[test]
fn test_count_star() -> Result<(), DatabaseError> {
    let mut database = sample_database();
    let result = QueryExecutor::new(&mut database).execute_sql("SELECT COUNT(*) FROM apples")?;

    assert_eq!(result.columns, vec!["COUNT(*)"]);
    assert_eq!(values(&result.rows), vec![vec![Value::Int64(2)]]);
    assert_eq!(result.to_string(), "COUNT(*)\n2");
    Ok(())
}

#[test]
fn test_count_star_over_interior_pages() -> Result<(), DatabaseError> {
    let mut database = sample_database();
    let result = QueryExecutor::new(&mut database).execute_sql("select count(*) from numbers")?;
    assert_eq!(values(&result.rows), vec![vec![Value::Int64(2000)]]);
    Ok(())
}

#[test]
fn test_select_star_fills_primary_key_from_rowid() -> Result<(), DatabaseError> {
    let mut database = sample_database();
    let result = QueryExecutor::new(&mut database).execute_sql("SELECT * FROM apples")?;

    assert_eq!(result.columns, vec!["id", "name", "color"]);
    assert_eq!(
        values(&result.rows),
        vec![
            vec![Value::Int64(1), text("Granny Smith"), text("Light Green")],
            vec![Value::Int64(2), text("Fuji"), text("Red")],
        ]
    );
    assert_eq!(
        result.to_string(),
        "id, name, color\n1, Granny Smith, Light Green\n2, Fuji, Red"
    );
    assert!(result.is_complete());
    Ok(())
}

#[test]
fn test_primary_key_above_32_bits() -> Result<(), DatabaseError> {
    let mut database = sample_database();
    let result = QueryExecutor::new(&mut database).execute_sql("SELECT id, name FROM oranges")?;

    let ids: Vec<Value> = result.rows.iter().map(|r| r.values[0].clone()).collect();
    assert_eq!(
        ids,
        vec![Value::Int64(1), Value::Int64(2), Value::Int64(3_000_000_000)]
    );
    assert_eq!(result.rows[2].row_id, Some(3_000_000_000));
    Ok(())
}

#[test]
fn test_mixed_value_kinds() -> Result<(), DatabaseError> {
    let mut database = sample_database();
    let result = QueryExecutor::new(&mut database).execute_sql("SELECT * FROM oranges")?;

    assert_eq!(
        result.to_string(),
        "id, name, weight, stock, label\n\
         1, Navel, 0.25, 1000, NULL\n\
         2, Blood, 0.5, -70000, x'cafe'\n\
         3000000000, Valencia, NULL, 4294967296, NULL"
    );
    assert_eq!(result.rows[1].values[3], Value::Int24(-70000));
    assert_eq!(result.rows[2].values[3], Value::Int48(4_294_967_296));
    Ok(())
}

#[test]
fn test_column_projection_is_case_insensitive() -> Result<(), DatabaseError> {
    let mut database = sample_database();
    let result =
        QueryExecutor::new(&mut database).execute_sql("SELECT COLOR, Name FROM apples")?;

    assert_eq!(result.columns, vec!["COLOR", "Name"]);
    assert_eq!(
        values(&result.rows),
        vec![
            vec![text("Light Green"), text("Granny Smith")],
            vec![text("Red"), text("Fuji")],
        ]
    );
    Ok(())
}

#[test]
fn test_rowid_pseudo_column() -> Result<(), DatabaseError> {
    let mut database = sample_database();
    let result =
        QueryExecutor::new(&mut database).execute_sql("SELECT rowid, seq FROM sqlite_sequence")?;
    assert_eq!(values(&result.rows), vec![vec![Value::Int64(1), Value::Int8(2)]]);
    Ok(())
}

#[test]
fn test_query_the_catalog() -> Result<(), DatabaseError> {
    let mut database = sample_database();
    let result = QueryExecutor::new(&mut database)
        .execute_sql("SELECT name, rootpage FROM sqlite_master")?;

    assert_eq!(result.columns, vec!["name", "rootpage"]);
    assert_eq!(result.row_count(), 4);
    assert_eq!(result.rows[3].values, vec![text("numbers"), Value::Int8(5)]);
    Ok(())
}

#[test]
fn test_qualified_columns() -> Result<(), DatabaseError> {
    let mut database = sample_database();
    let mut executor = QueryExecutor::new(&mut database);

    let result = executor.execute_sql("SELECT a.name FROM apples a")?;
    assert_eq!(result.columns, vec!["a.name"]);
    assert_eq!(values(&result.rows), vec![vec![text("Granny Smith")], vec![text("Fuji")]]);

    let result = executor.execute_sql("SELECT apples.name, color FROM apples")?;
    assert_eq!(result.columns, vec!["apples.name", "color"]);
    assert_eq!(result.row_count(), 2);
    Ok(())
}

#[test]
fn test_unknown_column() {
    let mut database = sample_database();
    let err = QueryExecutor::new(&mut database)
        .execute_sql("SELECT flavour FROM apples")
        .unwrap_err();
    assert!(matches!(
        err,
        DatabaseError::ColumnNotFound { ref name, ref table }
            if name == "flavour" && table == "apples"
    ));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_unknown_table() {
    let mut database = sample_database();
    let err = QueryExecutor::new(&mut database)
        .execute_sql("SELECT * FROM pears")
        .unwrap_err();
    assert!(matches!(err, DatabaseError::TableNotFound { .. }));
}

#[test]
fn test_where_is_unsupported() {
    let mut database = sample_database();
    let err = QueryExecutor::new(&mut database)
        .execute_sql("SELECT name FROM apples WHERE color = 'Red'")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedQuery);
}

#[test]
fn test_other_aggregates_are_unsupported() {
    let mut database = sample_database();
    let mut executor = QueryExecutor::new(&mut database);
    for sql in [
        "SELECT SUM(stock) FROM oranges",
        "SELECT MIN(id) FROM apples",
        "SELECT MAX(id) FROM apples",
        "SELECT AVG(weight) FROM oranges",
        "SELECT COUNT(name) FROM apples",
    ] {
        let err = executor.execute_sql(sql).unwrap_err();
        assert!(matches!(err, DatabaseError::UnsupportedQuery { .. }), "{}", sql);
    }
}

#[test]
fn test_multiple_tables_are_concatenated() -> Result<(), DatabaseError> {
    let mut database = sample_database();
    let mut executor = QueryExecutor::new(&mut database);

    let result = executor.execute_sql("SELECT name FROM apples, oranges")?;
    assert_eq!(result.columns, vec!["name"]);
    let names: Vec<String> = result.rows.iter().map(|r| r.to_string()).collect();
    assert_eq!(names, vec!["Granny Smith", "Fuji", "Navel", "Blood", "Valencia"]);

    let result = executor.execute_sql("SELECT COUNT(*) FROM apples, oranges")?;
    assert_eq!(values(&result.rows), vec![vec![Value::Int64(5)]]);
    Ok(())
}

#[test]
fn test_column_of_another_joined_table_is_unsupported() {
    let mut database = sample_database();
    let err = QueryExecutor::new(&mut database)
        .execute_sql("SELECT oranges.weight FROM apples, oranges")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedQuery);
}

#[test]
fn test_null_primary_key_on_synthetic_rows() -> Result<(), DatabaseError> {
    let rows = vec![
        (1, vec![Value::Null, text("Granny Smith"), text("Light Green")]),
        (1 << 31, vec![Value::Null, text("Fuji"), text("Red")]),
        ((1 << 31) + 7, vec![Value::Null, text("Gala"), Value::Null]),
    ];
    let temp = DatabaseBuilder::new()
        .table_with_row_ids("apples", APPLES_SQL, rows)
        .build()?;
    let mut database = temp.open()?;
    let result = QueryExecutor::new(&mut database).execute_sql("SELECT id, color FROM apples")?;

    assert_eq!(
        values(&result.rows),
        vec![
            vec![Value::Int64(1), text("Light Green")],
            vec![Value::Int64(1 << 31), text("Red")],
            // only the key column reads NULL as the rowid
            vec![Value::Int64((1 << 31) + 7), Value::Null],
        ]
    );
    Ok(())
}

#[test]
fn test_stored_primary_key_is_kept() -> Result<(), DatabaseError> {
    let temp = DatabaseBuilder::new()
        .table_with_row_ids(
            "apples",
            APPLES_SQL,
            vec![(4, vec![Value::Int8(9), text("Fuji"), text("Red")])],
        )
        .build()?;
    let mut database = temp.open()?;
    let result = QueryExecutor::new(&mut database).execute_sql("SELECT id FROM apples")?;
    assert_eq!(values(&result.rows), vec![vec![Value::Int8(9)]]);
    Ok(())
}

#[test]
fn test_short_records_pad_with_null() -> Result<(), DatabaseError> {
    let temp = DatabaseBuilder::new()
        .table(
            "grown",
            "CREATE TABLE grown(a INTEGER, b TEXT, c TEXT)",
            vec![
                vec![Value::Int8(1)],
                vec![Value::Int8(2), text("two"), text("deux")],
            ],
        )
        .build()?;
    let mut database = temp.open()?;
    let result = QueryExecutor::new(&mut database).execute_sql("SELECT * FROM grown")?;
    assert_eq!(result.to_string(), "a, b, c\n1, NULL, NULL\n2, two, deux");
    Ok(())
}

#[test]
fn test_skipped_cells_are_reported_with_results() -> Result<(), DatabaseError> {
    let temp = DatabaseBuilder::new()
        .table(
            "apples",
            APPLES_SQL,
            vec![
                vec![Value::Null, text("Granny Smith"), text("Light Green")],
                vec![Value::Null, text("Fuji"), text("Red")],
            ],
        )
        .patch(2, 8, &[0xff, 0xff])
        .build()?;
    let mut database = temp.open()?;
    let result = QueryExecutor::new(&mut database).execute_sql("SELECT name FROM apples")?;

    assert_eq!(values(&result.rows), vec![vec![text("Fuji")]]);
    assert_eq!(result.skipped.len(), 1);
    assert!(!result.is_complete());
    Ok(())
}

#[test]
fn test_sequential_scanner() -> Result<(), DatabaseError> {
    let mut database = sample_database();
    let mut scanner = SequentialScanner::new(&mut database, "numbers".to_string())?;
    assert_eq!(scanner.root_page(), 5);
    assert_eq!(scanner.table_name(), "numbers");

    let batch = scanner.scan_batch(300)?;
    assert_eq!(batch.len(), 300);
    assert_eq!(batch[299].row_id, 300);

    scanner.reset()?;
    let records: Vec<_> = ScanIterator::new(scanner).collect::<Result<_, _>>()?;
    assert_eq!(records.len(), 2000);
    assert_eq!(records[0].value(1)?, text("number 00001"));
    Ok(())
}

#[test]
fn test_scanner_fails_on_undecodable_record() -> Result<(), DatabaseError> {
    let temp = DatabaseBuilder::new()
        .table_with_payloads("broken", "CREATE TABLE broken(a)", vec![(1, vec![2, 11])])
        .build()?;
    let mut database = temp.open()?;
    let mut scanner = SequentialScanner::new(&mut database, "broken".to_string())?;
    assert!(matches!(scanner.scan(), Err(DatabaseError::UnsupportedSerialType(11))));
    Ok(())
}

#[test]
fn test_overflowing_record_header_fails_the_query() -> Result<(), DatabaseError> {
    let mut payload = vec![19];
    payload.extend_from_slice(&[0xff; 18]);
    let temp = DatabaseBuilder::new()
        .table_with_payloads("broken", "CREATE TABLE broken(a, b)", vec![(1, payload)])
        .build()?;
    let mut database = temp.open()?;

    let err = QueryExecutor::new(&mut database)
        .execute_sql("SELECT * FROM broken")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Bounds);

    // the handle stays usable after the failed query
    let result =
        QueryExecutor::new(&mut database).execute_sql("SELECT name FROM sqlite_master")?;
    assert_eq!(values(&result.rows), vec![vec![text("broken")]]);
    Ok(())
}
