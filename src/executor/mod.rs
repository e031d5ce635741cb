//! Query planning and execution for OakDB

pub mod executor;
pub mod planner;

pub use executor::{execute, QueryResult, StatementKind};
pub use planner::AccessPath;
