use crate::types::error::DatabaseError;

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("SQL parsing error: {0}")]
    SqlParser(#[from] sqlparser::parser::ParserError),
    #[error("Unsupported statement: {0}")]
    UnsupportedStatement(String),
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),
    #[error("Unsupported clause: {0}")]
    UnsupportedClause(String),
    #[error("Invalid query structure: {0}")]
    InvalidQuery(String),
}

impl From<PlannerError> for DatabaseError {
    fn from(error: PlannerError) -> Self {
        match error {
            PlannerError::SqlParser(_) | PlannerError::InvalidQuery(_) => {
                DatabaseError::SqlParseError {
                    details: error.to_string(),
                }
            }
            PlannerError::UnsupportedStatement(_)
            | PlannerError::UnsupportedExpression(_)
            | PlannerError::UnsupportedClause(_) => DatabaseError::UnsupportedQuery {
                details: error.to_string(),
            },
        }
    }
}
