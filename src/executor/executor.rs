//! Query executor for OakDB
//!
//! Takes a parsed statement, resolves the access path for each table
//! reference, and runs the fixed pipeline: row stream, nested-loop joins,
//! WHERE filter under three-valued logic, stable ordering, limit,
//! projection. DML statements materialize their matching row ids before
//! mutating, so a statement never observes its own writes.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use super::planner::{choose_access_path, conjuncts, AccessPath};
use crate::catalog::Column;
use crate::database::Database;
use crate::error::{Error, Result};
use crate::sql::ast::*;
use crate::sql::Parser;
use crate::storage::table::{Row, Table};
use crate::storage::value::{Key, RowId, Value};

/// What kind of statement produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    CreateTable,
    DropTable,
}

/// Query result: column names and row tuples for SELECT, an affected-row
/// count for DML
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    /// Statement kind
    pub kind: StatementKind,
    /// Column names (empty for non-select statements)
    pub columns: Vec<String>,
    /// Result rows
    pub rows: Vec<Vec<Value>>,
    /// Number of affected rows (for INSERT/UPDATE/DELETE)
    pub affected: usize,
}

impl QueryResult {
    fn select(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            kind: StatementKind::Select,
            columns,
            rows,
            affected: 0,
        }
    }

    fn dml(kind: StatementKind, affected: usize) -> Self {
        Self {
            kind,
            columns: Vec::new(),
            rows: Vec::new(),
            affected,
        }
    }

    fn ddl(kind: StatementKind) -> Self {
        Self {
            kind,
            columns: Vec::new(),
            rows: Vec::new(),
            affected: 0,
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            StatementKind::Select => {
                if self.rows.is_empty() {
                    return write!(f, "Empty result set");
                }

                let rendered: Vec<Vec<String>> = self
                    .rows
                    .iter()
                    .map(|row| row.iter().map(|v| v.to_string()).collect())
                    .collect();
                let mut widths: Vec<usize> =
                    self.columns.iter().map(|c| c.len()).collect();
                for row in &rendered {
                    for (i, cell) in row.iter().enumerate() {
                        widths[i] = widths[i].max(cell.len());
                    }
                }
                let pad = |cells: &[String]| {
                    cells
                        .iter()
                        .enumerate()
                        .map(|(i, cell)| format!("{:<1$}", cell, widths[i]))
                        .collect::<Vec<_>>()
                        .join(" | ")
                };

                let header = pad(&self.columns);
                writeln!(f, "{}", header)?;
                writeln!(f, "{}", "-".repeat(header.len()))?;
                for row in &rendered {
                    writeln!(f, "{}", pad(row))?;
                }
                write!(f, "({} rows)", self.rows.len())
            }
            StatementKind::Insert => write!(f, "{} row(s) inserted", self.affected),
            StatementKind::Update => write!(f, "{} row(s) updated", self.affected),
            StatementKind::Delete => write!(f, "{} row(s) deleted", self.affected),
            StatementKind::CreateTable => write!(f, "Table created"),
            StatementKind::DropTable => write!(f, "Table dropped"),
        }
    }
}

/// Parse and execute a single SQL statement against `db`
pub fn execute(db: &mut Database, sql: &str) -> Result<QueryResult> {
    let statement = Parser::new(sql)?.parse()?;

    match statement {
        Statement::CreateTable(stmt) => execute_create_table(db, stmt),
        Statement::DropTable(stmt) => {
            db.drop_table(&stmt.table_name)?;
            Ok(QueryResult::ddl(StatementKind::DropTable))
        }
        Statement::Insert(stmt) => execute_insert(db, stmt),
        Statement::Update(stmt) => execute_update(db, stmt),
        Statement::Delete(stmt) => execute_delete(db, stmt),
        Statement::Select(stmt) => execute_select(db, stmt),
    }
}

/// Convert a parsed literal into a stored value
pub(crate) fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Null => Value::Null,
        Literal::Boolean(b) => Value::Boolean(*b),
        Literal::Integer(i) => Value::Integer(*i),
        Literal::Float(n) => Value::Float(*n),
        Literal::String(s) => Value::Text(s.clone()),
    }
}

// ========== DDL ==========

fn execute_create_table(db: &mut Database, stmt: CreateTableStatement) -> Result<QueryResult> {
    let columns: Vec<Column> = stmt
        .columns
        .into_iter()
        .map(|def| {
            Column::new(def.name, def.column_type)
                .unique(def.unique)
                .not_null(def.not_null)
                .primary_key(def.primary_key)
        })
        .collect();

    db.create_table(&stmt.table_name, columns)?;
    Ok(QueryResult::ddl(StatementKind::CreateTable))
}

// ========== DML ==========

fn execute_insert(db: &mut Database, stmt: InsertStatement) -> Result<QueryResult> {
    // values bind to the listed columns, or positionally to the declared
    // column order
    let table = db.table(&stmt.table_name)?;
    let targets: Vec<String> = match &stmt.columns {
        Some(columns) => columns.clone(),
        None => table
            .schema()
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect(),
    };
    if targets.len() != stmt.values.len() {
        return Err(Error::ValueCountMismatch {
            table: stmt.table_name.clone(),
            expected: targets.len(),
            found: stmt.values.len(),
        });
    }

    let mut row = Row::new();
    for (column, literal) in targets.iter().zip(&stmt.values) {
        row.set(column.clone(), literal_value(literal));
    }

    db.table_mut(&stmt.table_name)?.insert(row)?;
    Ok(QueryResult::dml(StatementKind::Insert, 1))
}

fn execute_update(db: &mut Database, stmt: UpdateStatement) -> Result<QueryResult> {
    let ids = matching_row_ids(db.table(&stmt.table_name)?, stmt.where_clause.as_ref())?;
    let assignments: Vec<(String, Value)> = stmt
        .assignments
        .iter()
        .map(|a| (a.column.clone(), literal_value(&a.value)))
        .collect();

    let affected = db
        .table_mut(&stmt.table_name)?
        .update_rows(&ids, &assignments)?;
    Ok(QueryResult::dml(StatementKind::Update, affected))
}

fn execute_delete(db: &mut Database, stmt: DeleteStatement) -> Result<QueryResult> {
    let ids = matching_row_ids(db.table(&stmt.table_name)?, stmt.where_clause.as_ref())?;
    let affected = db.table_mut(&stmt.table_name)?.delete_rows(&ids)?;
    Ok(QueryResult::dml(StatementKind::Delete, affected))
}

/// Materialize the row ids matching `predicate` in a single-table context.
/// Runs before any mutation so UPDATE/DELETE never iterate a table they
/// are changing.
fn matching_row_ids(table: &Table, predicate: Option<&Predicate>) -> Result<Vec<RowId>> {
    let path = choose_access_path(table, table.name(), predicate);
    let candidates = row_ids_for_path(table, &path);

    let Some(predicate) = predicate else {
        return Ok(candidates);
    };

    let columns = table_columns(table, table.name());
    let mut matched = Vec::new();
    for id in candidates {
        if let Some(row) = table.row(id) {
            let tuple = row_to_tuple(table, row);
            if eval_predicate(predicate, &tuple, &columns)? == Some(true) {
                matched.push(id);
            }
        }
    }
    Ok(matched)
}

// ========== SELECT ==========

/// One column of an intermediate tuple, qualified by table alias
#[derive(Debug, Clone)]
struct OutputColumn {
    table: String,
    name: String,
}

/// How the inner side of a join is reached for each outer row
enum JoinProbe {
    /// Probe the inner index with a constant key
    Literal { column: String, key: Value },
    /// Probe the inner index with a value from the outer tuple
    Outer { column: String, outer_index: usize },
}

fn execute_select(db: &Database, stmt: SelectStatement) -> Result<QueryResult> {
    let driving = db.table(&stmt.from.name)?;
    let driving_alias = stmt
        .from
        .alias
        .clone()
        .unwrap_or_else(|| driving.name().to_string());

    let mut columns = table_columns(driving, &driving_alias);
    let path = choose_access_path(driving, &driving_alias, stmt.where_clause.as_ref());
    let mut tuples: Vec<Vec<Value>> = row_ids_for_path(driving, &path)
        .into_iter()
        .filter_map(|id| driving.row(id))
        .map(|row| row_to_tuple(driving, row))
        .collect();

    // joins apply left to right, in source order
    for join in &stmt.joins {
        let inner = db.table(&join.table.name)?;
        let inner_alias = join
            .table
            .alias
            .clone()
            .unwrap_or_else(|| inner.name().to_string());

        let mut combined = columns.clone();
        combined.extend(table_columns(inner, &inner_alias));
        let probe = plan_join_probe(&join.on, &columns, &combined, inner)?;

        let mut joined = Vec::new();
        for outer in &tuples {
            let inner_ids: Vec<RowId> = match &probe {
                Some(JoinProbe::Literal { column, key }) => inner
                    .index(column)
                    .map(|index| index.find_equal(&Key(key.clone())))
                    .unwrap_or_default(),
                Some(JoinProbe::Outer {
                    column,
                    outer_index,
                }) => {
                    let bound = &outer[*outer_index];
                    if bound.is_null() {
                        // equality against NULL is unknown: no matches
                        Vec::new()
                    } else {
                        inner
                            .index(column)
                            .map(|index| index.find_equal(&Key(bound.clone())))
                            .unwrap_or_default()
                    }
                }
                None => inner.scan().map(|(id, _)| id).collect(),
            };

            for id in inner_ids {
                let Some(inner_row) = inner.row(id) else {
                    continue;
                };
                let mut tuple = outer.clone();
                tuple.extend(row_to_tuple(inner, inner_row));
                if eval_predicate(&join.on, &tuple, &combined)? == Some(true) {
                    joined.push(tuple);
                }
            }
        }

        tuples = joined;
        columns = combined;
    }

    if let Some(predicate) = &stmt.where_clause {
        let mut kept = Vec::new();
        for tuple in tuples {
            if eval_predicate(predicate, &tuple, &columns)? == Some(true) {
                kept.push(tuple);
            }
        }
        tuples = kept;
    }

    if let Some(order) = &stmt.order_by {
        let index = resolve_column(&columns, &order.column)?;
        // stable sort; NULL sorts as less than any non-null value
        tuples.sort_by(|a, b| {
            let ord = match (a[index].is_null(), b[index].is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => a[index].compare(&b[index]).unwrap_or(Ordering::Equal),
            };
            if order.descending {
                ord.reverse()
            } else {
                ord
            }
        });
    }

    if let Some(limit) = stmt.limit {
        tuples.truncate(limit as usize);
    }

    let has_joins = !stmt.joins.is_empty();
    match &stmt.projection {
        Projection::Wildcard => {
            let names = columns
                .iter()
                .map(|c| {
                    if has_joins {
                        format!("{}.{}", c.table, c.name)
                    } else {
                        c.name.clone()
                    }
                })
                .collect();
            Ok(QueryResult::select(names, tuples))
        }
        Projection::Columns(refs) => {
            let indices: Vec<usize> = refs
                .iter()
                .map(|r| resolve_column(&columns, r))
                .collect::<Result<_>>()?;
            let names = refs.iter().map(|r| r.display_name()).collect();
            let rows = tuples
                .iter()
                .map(|tuple| indices.iter().map(|&i| tuple[i].clone()).collect())
                .collect();
            Ok(QueryResult::select(names, rows))
        }
    }
}

/// Find an equality in the ON conjunction that lets each outer row probe
/// the inner table's index instead of scanning it.
fn plan_join_probe(
    on: &Predicate,
    outer_columns: &[OutputColumn],
    combined: &[OutputColumn],
    inner: &Table,
) -> Result<Option<JoinProbe>> {
    for leaf in conjuncts(on) {
        let Predicate::Compare {
            column,
            op: CompareOp::Eq,
            rhs,
        } = leaf
        else {
            continue;
        };
        let column_index = resolve_column(combined, column)?;

        match rhs {
            Operand::Literal(literal) => {
                if column_index < outer_columns.len() {
                    continue;
                }
                let name = &combined[column_index].name;
                let key = literal_value(literal);
                if inner.index(name).is_some() && !key.is_null() {
                    return Ok(Some(JoinProbe::Literal {
                        column: name.clone(),
                        key,
                    }));
                }
            }
            Operand::Column(rhs_ref) => {
                let rhs_index = resolve_column(combined, rhs_ref)?;
                let (outer_index, inner_name) =
                    if column_index >= outer_columns.len() && rhs_index < outer_columns.len() {
                        (rhs_index, &combined[column_index].name)
                    } else if rhs_index >= outer_columns.len()
                        && column_index < outer_columns.len()
                    {
                        (column_index, &combined[rhs_index].name)
                    } else {
                        continue;
                    };
                if inner.index(inner_name).is_some() {
                    return Ok(Some(JoinProbe::Outer {
                        column: inner_name.clone(),
                        outer_index,
                    }));
                }
            }
        }
    }
    Ok(None)
}

// ========== Shared evaluation ==========

fn table_columns(table: &Table, alias: &str) -> Vec<OutputColumn> {
    table
        .schema()
        .column_names()
        .iter()
        .map(|name| OutputColumn {
            table: alias.to_string(),
            name: name.to_string(),
        })
        .collect()
}

fn row_to_tuple(table: &Table, row: &Row) -> Vec<Value> {
    table
        .schema()
        .columns()
        .iter()
        .map(|c| row.get(&c.name).cloned().unwrap_or(Value::Null))
        .collect()
}

fn row_ids_for_path(table: &Table, path: &AccessPath) -> Vec<RowId> {
    match path {
        AccessPath::FullScan => table.scan().map(|(id, _)| id).collect(),
        AccessPath::IndexEq { column, key } => table
            .index(column)
            .map(|index| index.find_equal(&Key(key.clone())))
            .unwrap_or_default(),
        AccessPath::IndexRange {
            column,
            lo,
            hi,
            lo_inclusive,
            hi_inclusive,
        } => {
            let lo = lo.clone().map(Key);
            let hi = hi.clone().map(Key);
            table
                .index(column)
                .map(|index| index.find_range(lo.as_ref(), hi.as_ref(), *lo_inclusive, *hi_inclusive))
                .unwrap_or_default()
        }
    }
}

/// Resolve a column reference against the tuple layout. Qualified
/// references match the alias case-insensitively; unqualified references
/// must be unambiguous.
fn resolve_column(columns: &[OutputColumn], column_ref: &ColumnRef) -> Result<usize> {
    let mut matches = columns.iter().enumerate().filter(|(_, c)| {
        c.name == column_ref.column
            && column_ref
                .table
                .as_ref()
                .map_or(true, |qualifier| c.table.eq_ignore_ascii_case(qualifier))
    });

    match (matches.next(), matches.next()) {
        (Some((index, _)), None) => Ok(index),
        (Some(_), Some(_)) => Err(Error::AmbiguousColumn(column_ref.display_name())),
        (None, _) => Err(Error::ColumnNotFound(
            column_ref.column.clone(),
            column_ref.table.clone().unwrap_or_default(),
        )),
    }
}

/// Three-valued predicate evaluation: `None` is unknown. The caller
/// treats unknown as false at the top level.
fn eval_predicate(
    predicate: &Predicate,
    tuple: &[Value],
    columns: &[OutputColumn],
) -> Result<Option<bool>> {
    match predicate {
        Predicate::Compare { column, op, rhs } => {
            let left = &tuple[resolve_column(columns, column)?];
            let literal_slot;
            let right = match rhs {
                Operand::Column(rhs_ref) => &tuple[resolve_column(columns, rhs_ref)?],
                Operand::Literal(literal) => {
                    literal_slot = literal_value(literal);
                    &literal_slot
                }
            };

            Ok(left.compare(right).map(|ord| match op {
                CompareOp::Eq => ord == Ordering::Equal,
                CompareOp::Neq => ord != Ordering::Equal,
                CompareOp::Lt => ord == Ordering::Less,
                CompareOp::Lte => ord != Ordering::Greater,
                CompareOp::Gt => ord == Ordering::Greater,
                CompareOp::Gte => ord != Ordering::Less,
            }))
        }
        Predicate::And(left, right) => {
            let a = eval_predicate(left, tuple, columns)?;
            let b = eval_predicate(right, tuple, columns)?;
            Ok(match (a, b) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            })
        }
        Predicate::Or(left, right) => {
            let a = eval_predicate(left, tuple, columns)?;
            let b = eval_predicate(right, tuple, columns)?;
            Ok(match (a, b) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            })
        }
        Predicate::Not(inner) => {
            Ok(eval_predicate(inner, tuple, columns)?.map(|b| !b))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        (dir, db)
    }

    #[test]
    fn test_create_insert_select() {
        let (_dir, mut db) = open_db();
        db.execute("CREATE TABLE u (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
            .unwrap();

        let result = db.execute("INSERT INTO u VALUES (1, 'Alice')").unwrap();
        assert_eq!(result.kind, StatementKind::Insert);
        assert_eq!(result.affected, 1);

        let result = db.execute("SELECT * FROM u").unwrap();
        assert_eq!(result.columns, vec!["id", "name"]);
        assert_eq!(
            result.rows,
            vec![vec![Value::Integer(1), Value::Text("Alice".to_string())]]
        );
    }

    #[test]
    fn test_insert_arity_mismatch() {
        let (_dir, mut db) = open_db();
        db.execute("CREATE TABLE u (id INTEGER, name TEXT)").unwrap();

        let err = db.execute("INSERT INTO u VALUES (1)").unwrap_err();
        assert!(matches!(
            err,
            Error::ValueCountMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));

        let err = db
            .execute("INSERT INTO u (id) VALUES (1, 'x')")
            .unwrap_err();
        assert!(matches!(err, Error::ValueCountMismatch { .. }));
    }

    #[test]
    fn test_unknown_column_in_where() {
        let (_dir, mut db) = open_db();
        db.execute("CREATE TABLE u (id INTEGER)").unwrap();
        db.execute("INSERT INTO u VALUES (1)").unwrap();

        let err = db.execute("SELECT * FROM u WHERE nope = 1").unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound(..)));
    }

    #[test]
    fn test_ambiguous_unqualified_column() {
        let (_dir, mut db) = open_db();
        db.execute("CREATE TABLE a (id INTEGER PRIMARY KEY)").unwrap();
        db.execute("CREATE TABLE b (id INTEGER PRIMARY KEY)").unwrap();
        db.execute("INSERT INTO a VALUES (1)").unwrap();
        db.execute("INSERT INTO b VALUES (1)").unwrap();

        let err = db
            .execute("SELECT id FROM a JOIN b ON a.id = b.id")
            .unwrap_err();
        assert!(matches!(err, Error::AmbiguousColumn(_)));
    }

    #[test]
    fn test_projection_order_and_names() {
        let (_dir, mut db) = open_db();
        db.execute("CREATE TABLE u (id INTEGER, name TEXT)").unwrap();
        db.execute("INSERT INTO u VALUES (1, 'Alice')").unwrap();

        let result = db.execute("SELECT name, id FROM u").unwrap();
        assert_eq!(result.columns, vec!["name", "id"]);
        assert_eq!(
            result.rows,
            vec![vec![Value::Text("Alice".to_string()), Value::Integer(1)]]
        );
    }

    #[test]
    fn test_where_with_null_excludes_row() {
        let (_dir, mut db) = open_db();
        db.execute("CREATE TABLE u (id INTEGER, score FLOAT)").unwrap();
        db.execute("INSERT INTO u VALUES (1, NULL)").unwrap();
        db.execute("INSERT INTO u VALUES (2, 1.5)").unwrap();

        // NULL compares unknown under every operator
        let result = db.execute("SELECT id FROM u WHERE score < 2.0").unwrap();
        assert_eq!(result.rows, vec![vec![Value::Integer(2)]]);
        let result = db.execute("SELECT id FROM u WHERE NOT score < 2.0").unwrap();
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_three_valued_connectives() {
        let (_dir, mut db) = open_db();
        db.execute("CREATE TABLE t (a INTEGER, b INTEGER)").unwrap();
        db.execute("INSERT INTO t VALUES (NULL, 1)").unwrap();

        // unknown OR true = true
        let result = db
            .execute("SELECT b FROM t WHERE a = 1 OR b = 1")
            .unwrap();
        assert_eq!(result.rows.len(), 1);

        // unknown AND true = unknown, excluded
        let result = db
            .execute("SELECT b FROM t WHERE a = 1 AND b = 1")
            .unwrap();
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_update_and_delete_affected_counts() {
        let (_dir, mut db) = open_db();
        db.execute("CREATE TABLE u (id INTEGER PRIMARY KEY, score INTEGER)")
            .unwrap();
        db.execute("INSERT INTO u VALUES (1, 10)").unwrap();
        db.execute("INSERT INTO u VALUES (2, 20)").unwrap();

        let result = db.execute("UPDATE u SET score = 30 WHERE id = 2").unwrap();
        assert_eq!(result.affected, 1);

        let result = db.execute("DELETE FROM u WHERE score >= 30").unwrap();
        assert_eq!(result.affected, 1);

        // empty match leaves the table alone
        let result = db.execute("UPDATE u SET score = 0 WHERE id = 99").unwrap();
        assert_eq!(result.affected, 0);
        let result = db.execute("DELETE FROM u WHERE id = 99").unwrap();
        assert_eq!(result.affected, 0);
    }

    #[test]
    fn test_display_renders_table() {
        let result = QueryResult::select(
            vec!["id".to_string(), "name".to_string()],
            vec![
                vec![Value::Integer(1), Value::Text("Alice".to_string())],
                vec![Value::Integer(2), Value::Null],
            ],
        );
        let text = result.to_string();
        assert!(text.contains("id | name"));
        assert!(text.contains("Alice"));
        assert!(text.contains("NULL"));
        assert!(text.ends_with("(2 rows)"));

        let result = QueryResult::dml(StatementKind::Update, 3);
        assert_eq!(result.to_string(), "3 row(s) updated");
    }
}
