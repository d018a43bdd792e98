use serde::{Deserialize, Serialize};

use crate::{
    storage::CATALOG_ROOT_PAGE,
    types::{
        PageNumber,
        error::{DatabaseError, Result},
        record::Record,
        value::Value,
    },
};

/// Names under which the catalog table can be queried.
pub const CATALOG_TABLE_NAMES: [&str; 2] = ["sqlite_schema", "sqlite_master"];

/// Table names with this prefix are reserved for SQLite's own bookkeeping.
pub const INTERNAL_TABLE_PREFIX: &str = "sqlite_";

pub fn is_catalog_name(name: &str) -> bool {
    CATALOG_TABLE_NAMES
        .iter()
        .any(|catalog| catalog.eq_ignore_ascii_case(name))
}

/// Represents a column definition in a table schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    /// Declared type as written in the schema text; empty when untyped.
    pub declared_type: String,
    pub position: usize,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            position,
        }
    }
}

/// Represents a complete table schema with all column definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    pub root_page: PageNumber,
    pub sql: String,
    pub columns: Vec<ColumnSchema>,
    /// Column whose NULL fields stand for the cell's rowid.
    pub primary_key: Option<usize>,
    pub autoincrement: bool,
}

impl TableSchema {
    pub fn new(
        table_name: String,
        root_page: PageNumber,
        sql: String,
        columns: Vec<ColumnSchema>,
        primary_key: Option<usize>,
    ) -> Self {
        Self {
            table_name,
            root_page,
            sql,
            columns,
            primary_key,
            autoincrement: false,
        }
    }

    /// The catalog's own shape. The catalog has no row describing itself.
    pub fn catalog() -> Self {
        let columns = [
            ("type", "text"),
            ("name", "text"),
            ("tbl_name", "text"),
            ("rootpage", "integer"),
            ("sql", "text"),
        ]
        .iter()
        .enumerate()
        .map(|(position, (name, declared_type))| ColumnSchema::new(*name, *declared_type, position))
        .collect();

        Self::new(
            CATALOG_TABLE_NAMES[0].to_string(),
            CATALOG_ROOT_PAGE,
            String::new(),
            columns,
            None,
        )
    }

    /// Get column index by name, ignoring ASCII case like SQLite does
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|col| col.name.eq_ignore_ascii_case(name))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|col| col.name.clone()).collect()
    }

    pub fn primary_key_column(&self) -> Option<&ColumnSchema> {
        self.primary_key.and_then(|i| self.columns.get(i))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Table,
    Index,
    View,
    Trigger,
    Other(String),
}

impl EntryKind {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "table" => EntryKind::Table,
            "index" => EntryKind::Index,
            "view" => EntryKind::View,
            "trigger" => EntryKind::Trigger,
            other => EntryKind::Other(other.to_string()),
        }
    }
}

/// One row of the catalog table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub kind: EntryKind,
    pub name: String,
    pub table_name: String,
    /// Zero for views and triggers, which own no b-tree.
    pub root_page: PageNumber,
    pub sql: Option<String>,
}

impl CatalogEntry {
    pub fn from_record(record: &Record) -> Result<Self> {
        if record.field_count() < 5 {
            return Err(DatabaseError::CorruptedRecord {
                reason: format!(
                    "catalog row {} has {} fields, expected 5",
                    record.row_id,
                    record.field_count()
                ),
            });
        }

        let text = |index: usize, column: &str| -> Result<String> {
            match record.value(index)? {
                Value::Text(s) => Ok(s),
                other => Err(DatabaseError::CorruptedRecord {
                    reason: format!("catalog column {} holds {:?}", column, other),
                }),
            }
        };

        let root_page = match record.value(3)? {
            Value::Null => 0,
            value => value
                .as_i64()
                .and_then(|page| PageNumber::try_from(page).ok())
                .ok_or_else(|| DatabaseError::CorruptedRecord {
                    reason: format!("catalog rootpage holds {:?}", value),
                })?,
        };

        let sql = match record.value(4)? {
            Value::Null => None,
            Value::Text(s) => Some(s),
            other => {
                return Err(DatabaseError::CorruptedRecord {
                    reason: format!("catalog sql holds {:?}", other),
                });
            }
        };

        Ok(Self {
            kind: EntryKind::parse(&text(0, "type")?),
            name: text(1, "name")?,
            table_name: text(2, "tbl_name")?,
            root_page,
            sql,
        })
    }

    /// The entry as a catalog row, in `TableSchema::catalog()` column order.
    pub fn to_values(&self) -> Vec<Value> {
        let kind = match &self.kind {
            EntryKind::Table => "table",
            EntryKind::Index => "index",
            EntryKind::View => "view",
            EntryKind::Trigger => "trigger",
            EntryKind::Other(other) => other.as_str(),
        };
        vec![
            Value::Text(kind.to_string()),
            Value::Text(self.name.clone()),
            Value::Text(self.table_name.clone()),
            Value::Int64(i64::from(self.root_page)),
            self.sql.clone().map_or(Value::Null, Value::Text),
        ]
    }

    pub fn is_user_table(&self) -> bool {
        self.kind == EntryKind::Table && !self.name.starts_with(INTERNAL_TABLE_PREFIX)
    }
}
