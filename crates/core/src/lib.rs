//! Functional core of the entity connector.
//!
//! Pure data and decisions shared by the store-backed connector: the table
//! descriptor, lifecycle statuses and the activation poll decision, the
//! recovery timing policy, batch chunking and the paging budget. Nothing in
//! this crate performs I/O.

pub mod chunk;
pub mod error;
pub mod paging;
pub mod recovery;
pub mod schema;
pub mod table;

pub use chunk::{chunk, chunk_count, BATCH_GET_LIMIT, BATCH_WRITE_LIMIT};
pub use error::{Result, SchemaError};
pub use paging::{should_fetch_next, PageBudget};
pub use recovery::RecoveryPolicy;
pub use schema::{
    format_descriptor, qualified_table_name, AttributeType, BillingMode, KeyAttribute,
    TableDescriptor,
};
pub use table::{poll_decision, AbortReason, PollDecision, TableDescription, TableStatus};
