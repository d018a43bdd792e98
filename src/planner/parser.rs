use sqlparser::{
    ast::{Query, Statement},
    dialect::SQLiteDialect,
    parser::Parser,
};

use crate::planner::{definition::TableDefinition, error::PlannerError, query::QueryIntent};

pub struct SqlParser {
    dialect: SQLiteDialect,
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlParser {
    pub fn new() -> Self {
        Self {
            dialect: SQLiteDialect {},
        }
    }

    pub fn parse_statement(&self, sql: &str) -> Result<Statement, PlannerError> {
        let mut statements = Parser::parse_sql(&self.dialect, sql)?;

        if statements.len() != 1 {
            return Err(PlannerError::InvalidQuery(format!(
                "Expected exactly one statement, found {}",
                statements.len()
            )));
        }

        Ok(statements.remove(0))
    }

    pub fn parse_query(&self, sql: &str) -> Result<QueryIntent, PlannerError> {
        match self.parse_statement(sql)? {
            Statement::Query(query) => self.to_intent(&query),
            statement => Err(PlannerError::UnsupportedStatement(statement.to_string())),
        }
    }

    pub fn parse_table_definition(&self, sql: &str) -> Result<TableDefinition, PlannerError> {
        match self.parse_statement(sql)? {
            Statement::CreateTable(create) => TableDefinition::from_create_table(&create),
            statement => Err(PlannerError::UnsupportedStatement(statement.to_string())),
        }
    }

    fn to_intent(&self, query: &Query) -> Result<QueryIntent, PlannerError> {
        QueryIntent::from_query(query)
    }
}
