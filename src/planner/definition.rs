use sqlparser::ast::{ColumnDef, ColumnOption, CreateTable, DataType, TableConstraint};

use crate::{
    planner::{error::PlannerError, query::object_name_tail},
    storage::schema::ColumnSchema,
};

/// Column layout recovered from a `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
    pub primary_key: Option<usize>,
    pub autoincrement: bool,
}

impl TableDefinition {
    pub fn from_create_table(create: &CreateTable) -> Result<Self, PlannerError> {
        let name = object_name_tail(&create.name)?;
        if create.columns.is_empty() {
            return Err(PlannerError::UnsupportedStatement(format!(
                "CREATE TABLE {} without a column list",
                name
            )));
        }

        let columns: Vec<ColumnSchema> = create
            .columns
            .iter()
            .enumerate()
            .map(|(position, column)| {
                ColumnSchema::new(
                    column.name.value.clone(),
                    declared_type(&column.data_type),
                    position,
                )
            })
            .collect();

        let mut primary_key = create.columns.iter().position(is_primary_key);
        let autoincrement = create.columns.iter().any(is_autoincrement);

        if primary_key.is_none() {
            primary_key = create
                .constraints
                .iter()
                .find_map(|constraint| table_primary_key(constraint, &columns));
        }

        Ok(Self {
            name,
            columns,
            primary_key,
            autoincrement,
        })
    }
}

fn declared_type(data_type: &DataType) -> String {
    match data_type {
        DataType::Unspecified => String::new(),
        other => other.to_string(),
    }
}

fn is_primary_key(column: &ColumnDef) -> bool {
    column.options.iter().any(|option| {
        matches!(
            option.option,
            ColumnOption::Unique {
                is_primary: true,
                ..
            }
        )
    })
}

fn is_autoincrement(column: &ColumnDef) -> bool {
    column.options.iter().any(|option| match &option.option {
        ColumnOption::DialectSpecific(tokens) => tokens
            .iter()
            .any(|token| token.to_string().eq_ignore_ascii_case("AUTOINCREMENT")),
        _ => false,
    })
}

// Only a single-column key can alias the rowid.
fn table_primary_key(constraint: &TableConstraint, columns: &[ColumnSchema]) -> Option<usize> {
    let TableConstraint::PrimaryKey {
        columns: key_columns,
        ..
    } = constraint
    else {
        return None;
    };
    let [key] = key_columns.as_slice() else {
        return None;
    };
    columns
        .iter()
        .position(|column| column.name.eq_ignore_ascii_case(&key.value))
}

