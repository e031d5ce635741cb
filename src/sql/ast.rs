//! SQL Abstract Syntax Tree (AST)
//!
//! This module defines the AST nodes for SQL statements. Each syntactic
//! category is a tagged enum; every traversal is a match.

use crate::catalog::ColumnType;

/// A SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// SELECT statement
    Select(SelectStatement),
    /// INSERT statement
    Insert(InsertStatement),
    /// UPDATE statement
    Update(UpdateStatement),
    /// DELETE statement
    Delete(DeleteStatement),
    /// CREATE TABLE statement
    CreateTable(CreateTableStatement),
    /// DROP TABLE statement
    DropTable(DropTableStatement),
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Select list
    pub projection: Projection,
    /// Driving table
    pub from: TableRef,
    /// JOIN clauses, in source order
    pub joins: Vec<Join>,
    /// WHERE clause
    pub where_clause: Option<Predicate>,
    /// ORDER BY clause
    pub order_by: Option<OrderBy>,
    /// LIMIT clause
    pub limit: Option<u64>,
}

/// The select list: `*` or explicit column references
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// All columns (*)
    Wildcard,
    /// Listed columns, in listed order
    Columns(Vec<ColumnRef>),
}

/// Table reference with optional alias
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    /// Table name
    pub name: String,
    /// Optional alias
    pub alias: Option<String>,
}

/// INNER JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Table to join
    pub table: TableRef,
    /// Join condition
    pub on: Predicate,
}

/// ORDER BY clause: one column, ascending or descending
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: ColumnRef,
    pub descending: bool,
}

/// INSERT statement (one row per statement)
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// Target table name
    pub table_name: String,
    /// Column names; values are positional when omitted
    pub columns: Option<Vec<String>>,
    /// Values to insert
    pub values: Vec<Literal>,
}

/// UPDATE statement
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    /// Target table name
    pub table_name: String,
    /// SET clause (column = value pairs)
    pub assignments: Vec<Assignment>,
    /// WHERE clause
    pub where_clause: Option<Predicate>,
}

/// Column assignment (for UPDATE)
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: Literal,
}

/// DELETE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    /// Target table name
    pub table_name: String,
    /// WHERE clause
    pub where_clause: Option<Predicate>,
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    /// Table name
    pub table_name: String,
    /// Column definitions
    pub columns: Vec<ColumnDef>,
}

/// Column definition
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub unique: bool,
    pub not_null: bool,
}

/// DROP TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStatement {
    /// Table name
    pub table_name: String,
}

/// Boolean expression tree over comparisons
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Comparison leaf: column against a literal or another column
    Compare {
        column: ColumnRef,
        op: CompareOp,
        rhs: Operand,
    },
    /// Conjunction; binds tighter than OR
    And(Box<Predicate>, Box<Predicate>),
    /// Disjunction
    Or(Box<Predicate>, Box<Predicate>),
    /// Negation of the following predicate
    Not(Box<Predicate>),
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(ColumnRef),
    Literal(Literal),
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// Column reference, optionally qualified as `table.column`
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    /// Qualifier (table name or alias)
    pub table: Option<String>,
    /// Column name
    pub column: String,
}

impl ColumnRef {
    /// The reference as written: `table.column` or `column`
    pub fn display_name(&self) -> String {
        match &self.table {
            Some(table) => format!("{}.{}", table, self.column),
            None => self.column.clone(),
        }
    }
}

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// NULL
    Null,
    /// Boolean
    Boolean(bool),
    /// Integer
    Integer(i64),
    /// Float
    Float(f64),
    /// String
    String(String),
}
