//! Missing-table recovery (Imperative Shell).
//!
//! Runs a store operation and, when the table does not exist, creates it,
//! waits for it to become active and runs the operation once more.

use std::future::Future;

use entity_connector_core::{poll_decision, PollDecision, RecoveryPolicy, TableDescriptor};

use crate::store::{StoreError, StoreResult, TableStore};

/// Runs `operation`, recovering once from a missing table.
///
/// `descriptor` must carry the physical table name. When recovery fails the
/// original `TableNotFound` error is returned. A second `TableNotFound` after
/// recovery is returned as is.
pub(crate) async fn with_recovery<S, T, F, Fut>(
    store: &S,
    descriptor: &TableDescriptor,
    policy: &RecoveryPolicy,
    operation: F,
) -> StoreResult<T>
where
    S: TableStore + ?Sized,
    F: Fn() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    match operation().await {
        Err(err) if err.is_table_not_found() => {
            recover(store, descriptor, policy, err).await?;
            operation().await
        }
        result => result,
    }
}

async fn recover<S: TableStore + ?Sized>(
    store: &S,
    descriptor: &TableDescriptor,
    policy: &RecoveryPolicy,
    original: StoreError,
) -> StoreResult<()> {
    tracing::info!(table = %descriptor.name(), "Table not found, creating it");

    if create_and_wait(store, descriptor, policy).await {
        Ok(())
    } else {
        Err(original)
    }
}

/// Creates the table and waits until it is active. Returns false when the
/// table could not be created or did not become active within the policy.
///
/// A table that is already being created counts as created.
pub(crate) async fn create_and_wait<S: TableStore + ?Sized>(
    store: &S,
    descriptor: &TableDescriptor,
    policy: &RecoveryPolicy,
) -> bool {
    let table = descriptor.name();

    match store.create_table(descriptor).await {
        Ok(()) => {}
        Err(err) if err.is_table_in_use() => {
            tracing::debug!(table = %table, "Table creation already in progress");
        }
        Err(err) => {
            tracing::error!(table = %table, error = %err, "Failed to create table");
            return false;
        }
    }

    tokio::time::sleep(policy.initial_delay()).await;

    match wait_for_table_active(store, table, policy).await {
        Some(polls) => {
            tracing::info!(table = %table, polls, "Table is active");
            true
        }
        None => false,
    }
}

/// Polls the table status until it is active.
///
/// Returns the number of polls made, `None` when giving up.
async fn wait_for_table_active<S: TableStore + ?Sized>(
    store: &S,
    table: &str,
    policy: &RecoveryPolicy,
) -> Option<u32> {
    for attempt in 0..policy.max_polls {
        let status = match store.describe_table(table).await {
            Ok(description) => description.map(|d| d.status),
            Err(err) => {
                tracing::warn!(table = %table, error = %err, "Failed to describe table");
                return None;
            }
        };

        match poll_decision(status.as_ref(), attempt, policy.max_polls) {
            PollDecision::Ready => return Some(attempt + 1),
            PollDecision::Wait => {
                tracing::debug!(
                    table = %table,
                    attempt = attempt + 1,
                    status = ?status,
                    "Waiting for table to become active"
                );
                tokio::time::sleep(policy.poll_interval()).await;
            }
            PollDecision::Abort(reason) => {
                tracing::warn!(table = %table, %reason, "Giving up waiting for table");
                return None;
            }
        }
    }

    tracing::warn!(table = %table, "No activation polls allowed");
    None
}
