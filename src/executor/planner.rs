//! Access-path selection for OakDB
//!
//! The planner is predicate-directed: for one table it inspects the
//! outermost conjunction of the predicate and picks at most one index
//! probe, an equality probe when possible, otherwise a single range
//! bound. A disjunction (or negation) anywhere in a subtree disables
//! index use for that subtree, and the full predicate is still applied to
//! every row afterwards, so a probe only ever narrows the candidate set.

use tracing::debug;

use super::executor::literal_value;
use crate::sql::ast::{CompareOp, ColumnRef, Operand, Predicate};
use crate::storage::table::Table;
use crate::storage::value::Value;

/// How the executor reaches a table's rows
#[derive(Debug, Clone, PartialEq)]
pub enum AccessPath {
    /// Visit every row in row-id order
    FullScan,
    /// Probe one key in the column's index
    IndexEq { column: String, key: Value },
    /// Walk a key range in the column's index
    IndexRange {
        column: String,
        lo: Option<Value>,
        hi: Option<Value>,
        lo_inclusive: bool,
        hi_inclusive: bool,
    },
}

/// Collect the leaves of the outermost conjunction. OR and NOT subtrees
/// are returned whole; only bare comparisons are probe candidates.
pub(crate) fn conjuncts(predicate: &Predicate) -> Vec<&Predicate> {
    let mut leaves = Vec::new();
    fn walk<'a>(p: &'a Predicate, out: &mut Vec<&'a Predicate>) {
        match p {
            Predicate::And(left, right) => {
                walk(left, out);
                walk(right, out);
            }
            other => out.push(other),
        }
    }
    walk(predicate, &mut leaves);
    leaves
}

/// Does this column reference target the given table (known by `alias`)?
fn targets_table(column: &ColumnRef, table: &Table, alias: &str) -> bool {
    match &column.table {
        Some(qualifier) => {
            qualifier.eq_ignore_ascii_case(alias) && table.schema().has_column(&column.column)
        }
        None => table.schema().has_column(&column.column),
    }
}

/// Choose the access path for `table` under `predicate`
pub fn choose_access_path(
    table: &Table,
    alias: &str,
    predicate: Option<&Predicate>,
) -> AccessPath {
    let Some(predicate) = predicate else {
        return AccessPath::FullScan;
    };

    let mut range: Option<AccessPath> = None;
    for leaf in conjuncts(predicate) {
        let Predicate::Compare {
            column,
            op,
            rhs: Operand::Literal(literal),
        } = leaf
        else {
            continue;
        };
        if !targets_table(column, table, alias) || table.index(&column.column).is_none() {
            continue;
        }
        let value = literal_value(literal);
        if value.is_null() {
            // a comparison against NULL matches nothing; the filter
            // handles it
            continue;
        }

        match op {
            CompareOp::Eq => {
                let path = AccessPath::IndexEq {
                    column: column.column.clone(),
                    key: value,
                };
                debug!(table = table.name(), column = %column.column, "selected index equality probe");
                return path;
            }
            CompareOp::Lt | CompareOp::Lte if range.is_none() => {
                range = Some(AccessPath::IndexRange {
                    column: column.column.clone(),
                    lo: None,
                    hi: Some(value),
                    lo_inclusive: true,
                    hi_inclusive: *op == CompareOp::Lte,
                });
            }
            CompareOp::Gt | CompareOp::Gte if range.is_none() => {
                range = Some(AccessPath::IndexRange {
                    column: column.column.clone(),
                    lo: Some(value),
                    hi: None,
                    lo_inclusive: *op == CompareOp::Gte,
                    hi_inclusive: true,
                });
            }
            _ => {}
        }
    }

    if let Some(path) = range {
        if let AccessPath::IndexRange { column, .. } = &path {
            debug!(table = table.name(), column = %column, "selected index range probe");
        }
        return path;
    }
    AccessPath::FullScan
}
