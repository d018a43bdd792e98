use tracing::debug;

use crate::{
    executor::{
        result::QueryResult,
        scan::{ScanIterator, Scanner},
        sequential_scan::SequentialScanner,
    },
    planner::{
        parser::SqlParser,
        query::{AggregateExpression, ColumnRef, Projection, QueryIntent, TableRef},
    },
    storage::{database::Database, schema::TableSchema},
    types::{
        error::{DatabaseError, Result},
        record::Record,
        row::Row,
        value::Value,
    },
};

/// Names that resolve to the cell's rowid when no declared column takes them.
pub const ROWID_ALIASES: [&str; 3] = ["rowid", "_rowid_", "oid"];

/// Where one output column takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnSource {
    Field(usize),
    RowId,
}

/// Output columns resolved against one table's schema.
#[derive(Debug)]
struct ProjectionPlan {
    names: Vec<String>,
    sources: Vec<ColumnSource>,
}

pub struct QueryExecutor<'a> {
    database: &'a mut Database,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(database: &'a mut Database) -> Self {
        Self { database }
    }

    pub fn execute_sql(&mut self, sql: &str) -> Result<QueryResult> {
        let intent = SqlParser::new().parse_query(sql)?;
        self.execute(&intent)
    }

    pub fn execute(&mut self, intent: &QueryIntent) -> Result<QueryResult> {
        if intent.tables.is_empty() {
            return Err(DatabaseError::SqlParseError {
                details: "query names no table".to_string(),
            });
        }
        match &intent.projection {
            Projection::Aggregate(aggregate) => self.execute_aggregate(intent, aggregate),
            _ => self.execute_projection(intent),
        }
    }

    fn execute_aggregate(
        &mut self,
        intent: &QueryIntent,
        aggregate: &AggregateExpression,
    ) -> Result<QueryResult> {
        if !aggregate.is_count_star() {
            return Err(DatabaseError::unsupported(format!(
                "aggregate {} is not implemented",
                aggregate.label()
            )));
        }

        let mut result = QueryResult::new(vec![aggregate.label()]);
        let mut total: i64 = 0;
        for table in &intent.tables {
            let schema = self.database.catalog().find_table_schema(&table.name)?;
            let mut scanner = SequentialScanner::with_root(
                self.database.pager_mut(),
                schema.table_name.clone(),
                schema.root_page,
            );
            while scanner.scan()?.is_some() {
                total += 1;
            }
            result.skipped.extend(scanner.take_skipped());
        }

        debug!(total, "counted records");
        result.rows.push(Row::new(vec![Value::Int64(total)]));
        Ok(result)
    }

    fn execute_projection(&mut self, intent: &QueryIntent) -> Result<QueryResult> {
        let mut result: Option<QueryResult> = None;

        for table in &intent.tables {
            let schema = self.database.catalog().find_table_schema(&table.name)?;
            let plan = ProjectionPlan::resolve(&intent.projection, &schema, table, &intent.tables)?;
            let output = result.get_or_insert_with(|| QueryResult::new(plan.names.clone()));

            let mut records = ScanIterator::new(SequentialScanner::with_root(
                self.database.pager_mut(),
                schema.table_name.clone(),
                schema.root_page,
            ));
            for record in records.by_ref() {
                output.rows.push(project(&record?, &schema, &plan)?);
            }
            output.skipped.extend(records.into_inner().take_skipped());

            debug!(table = %schema.table_name, rows = output.rows.len(), "projected table");
        }

        Ok(result.unwrap_or_default())
    }
}

impl ProjectionPlan {
    fn resolve(
        projection: &Projection,
        schema: &TableSchema,
        table: &TableRef,
        all_tables: &[TableRef],
    ) -> Result<Self> {
        match projection {
            Projection::Wildcard => Ok(Self {
                names: schema.column_names(),
                sources: (0..schema.columns.len()).map(ColumnSource::Field).collect(),
            }),
            Projection::Columns(columns) => {
                let mut names = Vec::with_capacity(columns.len());
                let mut sources = Vec::with_capacity(columns.len());
                for column in columns {
                    sources.push(resolve_column(column, schema, table, all_tables)?);
                    names.push(column.qualified_name());
                }
                Ok(Self { names, sources })
            }
            Projection::Aggregate(aggregate) => Err(DatabaseError::unsupported(format!(
                "{} cannot be projected per row",
                aggregate.label()
            ))),
        }
    }
}

fn resolve_column(
    column: &ColumnRef,
    schema: &TableSchema,
    table: &TableRef,
    all_tables: &[TableRef],
) -> Result<ColumnSource> {
    if let Some(qualifier) = &column.table {
        if !table.is_named(qualifier) {
            if all_tables.iter().any(|other| other.is_named(qualifier)) {
                return Err(DatabaseError::unsupported(format!(
                    "column {} refers to another table of the join",
                    column.qualified_name()
                )));
            }
            return Err(DatabaseError::ColumnNotFound {
                name: column.qualified_name(),
                table: schema.table_name.clone(),
            });
        }
    }

    if let Some(index) = schema.get_column_index(&column.name) {
        return Ok(ColumnSource::Field(index));
    }
    if ROWID_ALIASES
        .iter()
        .any(|alias| alias.eq_ignore_ascii_case(&column.name))
    {
        return Ok(ColumnSource::RowId);
    }
    Err(DatabaseError::ColumnNotFound {
        name: column.name.clone(),
        table: schema.table_name.clone(),
    })
}

fn project(record: &Record, schema: &TableSchema, plan: &ProjectionPlan) -> Result<Row> {
    let mut values = Vec::with_capacity(plan.sources.len());
    for source in &plan.sources {
        let value = match *source {
            ColumnSource::RowId => Value::Int64(record.row_id),
            ColumnSource::Field(index) => field_value(record, schema, index)?,
        };
        values.push(value);
    }
    Ok(Row::with_row_id(record.row_id, values))
}

/// Decoded value of column `index`. The primary key column is stored as NULL
/// because it aliases the rowid, so a NULL there reads as the rowid.
/// Columns past the end of the record (added later by ALTER TABLE) are NULL.
fn field_value(record: &Record, schema: &TableSchema, index: usize) -> Result<Value> {
    let value = if index < record.field_count() {
        record.value(index)?
    } else {
        Value::Null
    };

    if value.is_null() && schema.primary_key == Some(index) {
        return Ok(Value::Int64(record.row_id));
    }
    Ok(value)
}
