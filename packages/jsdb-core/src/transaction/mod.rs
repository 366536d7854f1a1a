//! Commit transactions: staging, constraint checks, apply and rollback.

mod change;
pub mod constraints;
#[allow(clippy::module_inception)]
mod transaction;

pub use change::{RowTarget, StagedWrite};
pub use constraints::strictest_equals;
pub use transaction::Transaction;
