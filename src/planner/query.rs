use serde::{Deserialize, Serialize};
use sqlparser::ast::{
    Expr, Function, FunctionArg, FunctionArgExpr, FunctionArguments, GroupByExpr,
    JoinConstraint, JoinOperator, ObjectName, Query, Select, SelectItem, SetExpr, TableFactor,
    TableWithJoins,
};

use crate::planner::error::PlannerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn with_alias(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// Whether `qualifier` names this table, by alias or by table name.
    pub fn is_named(&self, qualifier: &str) -> bool {
        match &self.alias {
            Some(alias) => alias.eq_ignore_ascii_case(qualifier),
            None => self.name.eq_ignore_ascii_case(qualifier),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }

    pub fn with_table(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    pub fn qualified_name(&self) -> String {
        match &self.table {
            Some(table) => format!("{}.{}", table, self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "COUNT" => Some(AggregateFunction::Count),
            "SUM" | "TOTAL" => Some(AggregateFunction::Sum),
            "AVG" => Some(AggregateFunction::Avg),
            "MIN" => Some(AggregateFunction::Min),
            "MAX" => Some(AggregateFunction::Max),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateArgument {
    Star,
    Column(ColumnRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateExpression {
    pub function: AggregateFunction,
    pub argument: AggregateArgument,
}

impl AggregateExpression {
    pub fn count_star() -> Self {
        Self {
            function: AggregateFunction::Count,
            argument: AggregateArgument::Star,
        }
    }

    pub fn is_count_star(&self) -> bool {
        self.function == AggregateFunction::Count && self.argument == AggregateArgument::Star
    }

    /// Output column name, e.g. `COUNT(*)`.
    pub fn label(&self) -> String {
        match &self.argument {
            AggregateArgument::Star => format!("{}(*)", self.function.name()),
            AggregateArgument::Column(column) => {
                format!("{}({})", self.function.name(), column.qualified_name())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    Wildcard,
    Columns(Vec<ColumnRef>),
    Aggregate(AggregateExpression),
}

/// What a SELECT asks for: which tables to scan and what to keep from each row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryIntent {
    pub tables: Vec<TableRef>,
    pub projection: Projection,
}

impl QueryIntent {
    pub fn from_query(query: &Query) -> Result<Self, PlannerError> {
        if query.with.is_some() {
            return Err(PlannerError::UnsupportedClause("WITH".to_string()));
        }
        if query.order_by.is_some() {
            return Err(PlannerError::UnsupportedClause("ORDER BY".to_string()));
        }
        if query.limit.is_some() || query.offset.is_some() || query.fetch.is_some() {
            return Err(PlannerError::UnsupportedClause("LIMIT".to_string()));
        }

        let select = match query.body.as_ref() {
            SetExpr::Select(select) => select,
            SetExpr::SetOperation { op, .. } => {
                return Err(PlannerError::UnsupportedClause(op.to_string()));
            }
            other => return Err(PlannerError::UnsupportedStatement(other.to_string())),
        };
        Self::from_select(select)
    }

    fn from_select(select: &Select) -> Result<Self, PlannerError> {
        if select.distinct.is_some() {
            return Err(PlannerError::UnsupportedClause("DISTINCT".to_string()));
        }
        if select.selection.is_some() {
            return Err(PlannerError::UnsupportedClause("WHERE".to_string()));
        }
        if !matches!(&select.group_by, GroupByExpr::Expressions(exprs, _) if exprs.is_empty()) {
            return Err(PlannerError::UnsupportedClause("GROUP BY".to_string()));
        }
        if select.having.is_some() {
            return Err(PlannerError::UnsupportedClause("HAVING".to_string()));
        }
        if select.from.is_empty() {
            return Err(PlannerError::InvalidQuery("SELECT without FROM".to_string()));
        }

        let mut tables = Vec::new();
        for table_with_joins in &select.from {
            collect_tables(table_with_joins, &mut tables)?;
        }
        let projection = projection_from_items(&select.projection)?;

        Ok(Self { tables, projection })
    }
}

fn collect_tables(from: &TableWithJoins, tables: &mut Vec<TableRef>) -> Result<(), PlannerError> {
    tables.push(table_ref(&from.relation)?);
    for join in &from.joins {
        match &join.join_operator {
            JoinOperator::CrossJoin | JoinOperator::Inner(JoinConstraint::None) => {}
            other => {
                return Err(PlannerError::UnsupportedClause(format!(
                    "join condition ({:?})",
                    other
                )));
            }
        }
        tables.push(table_ref(&join.relation)?);
    }
    Ok(())
}

fn table_ref(factor: &TableFactor) -> Result<TableRef, PlannerError> {
    match factor {
        TableFactor::Table {
            name, alias, args, ..
        } => {
            if args.is_some() {
                return Err(PlannerError::UnsupportedExpression(factor.to_string()));
            }
            let table = object_name_tail(name)?;
            Ok(match alias {
                Some(alias) => TableRef::with_alias(table, alias.name.value.clone()),
                None => TableRef::new(table),
            })
        }
        other => Err(PlannerError::UnsupportedExpression(other.to_string())),
    }
}

pub(crate) fn object_name_tail(name: &ObjectName) -> Result<String, PlannerError> {
    name.0
        .last()
        .map(|ident| ident.value.clone())
        .ok_or_else(|| PlannerError::InvalidQuery("empty object name".to_string()))
}

fn projection_from_items(items: &[SelectItem]) -> Result<Projection, PlannerError> {
    if let [SelectItem::Wildcard(_)] = items {
        return Ok(Projection::Wildcard);
    }

    let mut columns = Vec::with_capacity(items.len());
    let mut aggregate = None;
    for item in items {
        let expr = match item {
            SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => expr,
            SelectItem::Wildcard(_) => {
                return Err(PlannerError::UnsupportedExpression(
                    "* mixed with other columns".to_string(),
                ));
            }
            other => return Err(PlannerError::UnsupportedExpression(other.to_string())),
        };
        match expr {
            Expr::Function(function) => aggregate = Some(aggregate_from(function)?),
            other => columns.push(column_ref(other)?),
        }
    }

    match aggregate {
        Some(aggregate) if columns.is_empty() && items.len() == 1 => {
            Ok(Projection::Aggregate(aggregate))
        }
        Some(_) => Err(PlannerError::UnsupportedExpression(
            "aggregate mixed with other columns".to_string(),
        )),
        None => Ok(Projection::Columns(columns)),
    }
}

fn column_ref(expr: &Expr) -> Result<ColumnRef, PlannerError> {
    match expr {
        Expr::Identifier(ident) => Ok(ColumnRef::new(ident.value.clone())),
        Expr::CompoundIdentifier(parts) => match parts.as_slice() {
            [.., table, column] => Ok(ColumnRef::with_table(
                table.value.clone(),
                column.value.clone(),
            )),
            _ => Err(PlannerError::UnsupportedExpression(expr.to_string())),
        },
        Expr::Nested(inner) => column_ref(inner),
        other => Err(PlannerError::UnsupportedExpression(other.to_string())),
    }
}

fn aggregate_from(function: &Function) -> Result<AggregateExpression, PlannerError> {
    let name = function.name.to_string();
    let aggregate_function = AggregateFunction::from_name(&name)
        .ok_or_else(|| PlannerError::UnsupportedExpression(format!("function {}", name)))?;
    if function.over.is_some() || function.filter.is_some() {
        return Err(PlannerError::UnsupportedExpression(function.to_string()));
    }

    let args = match &function.args {
        FunctionArguments::List(list) if list.duplicate_treatment.is_none() => &list.args,
        _ => return Err(PlannerError::UnsupportedExpression(function.to_string())),
    };
    let argument = match args.as_slice() {
        [FunctionArg::Unnamed(FunctionArgExpr::Wildcard)] => AggregateArgument::Star,
        [FunctionArg::Unnamed(FunctionArgExpr::Expr(expr))] => {
            AggregateArgument::Column(column_ref(expr)?)
        }
        _ => return Err(PlannerError::UnsupportedExpression(function.to_string())),
    };

    Ok(AggregateExpression {
        function: aggregate_function,
        argument,
    })
}
