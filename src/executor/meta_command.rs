use crate::{
    executor::select::QueryExecutor,
    storage::database::Database,
    types::error::{DatabaseError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommand {
    DbInfo,
    Tables,
    Schema,
}

/// One line of user input: a dot-command or a SQL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Meta(MetaCommand),
    Sql(String),
}

impl MetaCommand {
    pub fn parse(input: &str) -> Result<Self> {
        let name = input.split_whitespace().next().unwrap_or(input);
        match name.to_ascii_lowercase().as_str() {
            ".dbinfo" => Ok(MetaCommand::DbInfo),
            ".tables" => Ok(MetaCommand::Tables),
            ".schema" => Ok(MetaCommand::Schema),
            _ => Err(DatabaseError::UnknownCommand(name.to_string())),
        }
    }

    pub fn execute(&self, database: &mut Database) -> Result<String> {
        match self {
            MetaCommand::DbInfo => {
                let page_size = database.page_size();
                let entries = database.catalog().entries()?;
                Ok(format!(
                    "database page size: {}\nnumber of tables: {}",
                    page_size,
                    entries.results.len()
                ))
            }
            MetaCommand::Tables => Ok(database.catalog().table_names()?.join(" ")),
            MetaCommand::Schema => {
                let entries = database.catalog().entries()?;
                let statements: Vec<String> = entries
                    .results
                    .into_iter()
                    .filter_map(|entry| entry.sql)
                    .map(|sql| format!("{};", sql))
                    .collect();
                Ok(statements.join("\n"))
            }
        }
    }
}

impl Command {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.starts_with('.') {
            MetaCommand::parse(input).map(Command::Meta)
        } else {
            Ok(Command::Sql(input.to_string()))
        }
    }

    /// Runs the command and returns its printable output.
    pub fn execute(&self, database: &mut Database) -> Result<String> {
        match self {
            Command::Meta(meta) => meta.execute(database),
            Command::Sql(sql) => Ok(QueryExecutor::new(database).execute_sql(sql)?.to_string()),
        }
    }
}
