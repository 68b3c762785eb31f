//! In-memory store implementation.
//!
//! Keeps tables in process memory with DynamoDB-like semantics for the
//! operations the connector issues. Expression support is limited to what
//! tests and local development need:
//!
//! - updates: `SET name = :value` and `REMOVE name` clauses
//! - conditions: `attribute_exists(name)` and `attribute_not_exists(name)`
//! - queries: partition key equality (`pk = :v` or `#pk = :v`)
//!
//! Scan filters and secondary indexes are rejected as validation errors.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use entity_connector_core::{
    BATCH_GET_LIMIT, BATCH_WRITE_LIMIT, TableDescription, TableDescriptor, TableStatus,
};
use tokio::sync::RwLock;

use crate::item::{key_of, Item, Key};
use crate::store::{
    BatchGetOutput, Page, QueryRequest, ScanRequest, StoreError, StoreResult, TableStore,
    UpdateRequest, WriteRequest,
};

pub const GET_ITEM: &str = "GetItem";
pub const PUT_ITEM: &str = "PutItem";
pub const DELETE_ITEM: &str = "DeleteItem";
pub const UPDATE_ITEM: &str = "UpdateItem";
pub const BATCH_GET_ITEM: &str = "BatchGetItem";
pub const BATCH_WRITE_ITEM: &str = "BatchWriteItem";
pub const SCAN: &str = "Scan";
pub const QUERY: &str = "Query";
pub const CREATE_TABLE: &str = "CreateTable";
pub const DELETE_TABLE: &str = "DeleteTable";
pub const DESCRIBE_TABLE: &str = "DescribeTable";

/// Separator between key parts in the ordering token.
const KEY_SEPARATOR: char = '\u{1f}';

#[derive(Debug)]
struct MemoryTable {
    descriptor: TableDescriptor,
    status: TableStatus,
    /// Describe calls left before the table turns active.
    pending_polls: u32,
    items: BTreeMap<String, Item>,
}

impl MemoryTable {
    fn is_active(&self) -> bool {
        self.status == TableStatus::Active
    }
}

#[derive(Debug)]
struct State {
    tables: HashMap<String, MemoryTable>,
    activation_polls: u32,
    pending_status: TableStatus,
    page_size: Option<usize>,
    failures: HashMap<&'static str, VecDeque<StoreError>>,
    calls: HashMap<&'static str, usize>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            tables: HashMap::new(),
            activation_polls: 0,
            pending_status: TableStatus::Creating,
            page_size: None,
            failures: HashMap::new(),
            calls: HashMap::new(),
        }
    }
}

impl State {
    /// Counts the call and returns the next injected failure for `operation`.
    fn enter(&mut self, operation: &'static str) -> StoreResult<()> {
        *self.calls.entry(operation).or_insert(0) += 1;
        match self
            .failures
            .get_mut(operation)
            .and_then(|queue| queue.pop_front())
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Resolves an active table; tables still being created are not found.
    fn table(&self, name: &str) -> StoreResult<&MemoryTable> {
        self.tables
            .get(name)
            .filter(|table| table.is_active())
            .ok_or_else(|| not_found(name))
    }

    fn table_mut(&mut self, name: &str) -> StoreResult<&mut MemoryTable> {
        self.tables
            .get_mut(name)
            .filter(|table| table.is_active())
            .ok_or_else(|| not_found(name))
    }
}

/// In-memory storage backend for testing.
///
/// Uses a single state wrapped in `Arc<RwLock<_>>` for thread-safe access.
/// Clones share the same tables. Data is lost when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new store without tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Newly created tables report `pending_status` for the first `polls`
    /// describe calls before turning active.
    pub fn with_activation(self, polls: u32, pending_status: TableStatus) -> Self {
        if let Ok(mut state) = self.state.try_write() {
            state.activation_polls = polls;
            state.pending_status = pending_status;
        }
        self
    }

    /// Caps the number of items a single scan or query page returns.
    pub fn with_page_size(self, page_size: usize) -> Self {
        if let Ok(mut state) = self.state.try_write() {
            state.page_size = Some(page_size.max(1));
        }
        self
    }

    /// Creates an active table directly, bypassing activation.
    pub async fn seed_table(&self, descriptor: &TableDescriptor) {
        let mut state = self.state.write().await;
        state
            .tables
            .entry(descriptor.name().to_string())
            .or_insert_with(|| MemoryTable {
                descriptor: descriptor.clone(),
                status: TableStatus::Active,
                pending_polls: 0,
                items: BTreeMap::new(),
            });
    }

    /// Queues a one-shot failure for the next call of `operation`.
    pub async fn inject_failure(&self, operation: &'static str, error: StoreError) {
        let mut state = self.state.write().await;
        state
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Number of calls made to `operation`, failed ones included.
    pub async fn calls(&self, operation: &str) -> usize {
        let state = self.state.read().await;
        state.calls.get(operation).copied().unwrap_or(0)
    }

    pub async fn has_table(&self, table: &str) -> bool {
        self.state.read().await.tables.contains_key(table)
    }

    /// Number of items stored in `table`, `None` when the table does not exist.
    pub async fn item_count(&self, table: &str) -> Option<usize> {
        let state = self.state.read().await;
        state.tables.get(table).map(|t| t.items.len())
    }
}

fn not_found(table: &str) -> StoreError {
    StoreError::TableNotFound {
        table_name: table.to_string(),
    }
}

fn validation(message: impl Into<String>) -> StoreError {
    StoreError::Validation(message.into())
}

/// Ordering token of an item or key, built from its key attributes.
fn key_token(descriptor: &TableDescriptor, attributes: &Item) -> StoreResult<String> {
    let parts = descriptor
        .key_names()
        .into_iter()
        .map(|name| match attributes.get(name) {
            Some(AttributeValue::S(value)) => Ok(value.clone()),
            Some(_) => Err(validation(format!(
                "Type mismatch for key {name}, expected: S"
            ))),
            None => Err(validation(format!("Missing the key {name} in the item"))),
        })
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(parts.join(&KEY_SEPARATOR.to_string()))
}

/// Token of a key that must hold exactly the key attributes.
fn exact_key_token(descriptor: &TableDescriptor, key: &Key) -> StoreResult<String> {
    if key.len() != descriptor.key_names().len() {
        return Err(validation(
            "The provided key element does not match the schema",
        ));
    }
    key_token(descriptor, key)
}

fn resolve_name<'a>(
    token: &'a str,
    names: &'a HashMap<String, String>,
) -> StoreResult<&'a str> {
    if token.starts_with('#') {
        names
            .get(token)
            .map(String::as_str)
            .ok_or_else(|| validation(format!("Undefined expression attribute name: {token}")))
    } else {
        Ok(token)
    }
}

fn resolve_value<'a>(
    token: &str,
    values: &'a HashMap<String, AttributeValue>,
) -> StoreResult<&'a AttributeValue> {
    values
        .get(token)
        .ok_or_else(|| validation(format!("Undefined expression attribute value: {token}")))
}

/// Checks `attribute_exists(name)` / `attribute_not_exists(name)` conditions.
fn check_condition(
    condition: &str,
    current: Option<&Item>,
    names: &HashMap<String, String>,
) -> StoreResult<()> {
    let condition = condition.trim();
    let (function, rest) = condition
        .split_once('(')
        .ok_or_else(|| validation(format!("Unsupported condition expression: {condition}")))?;
    let argument = rest
        .strip_suffix(')')
        .ok_or_else(|| validation(format!("Unsupported condition expression: {condition}")))?;
    let attribute = resolve_name(argument.trim(), names)?;
    let exists = current.is_some_and(|item| item.contains_key(attribute));

    let holds = match function.trim() {
        "attribute_exists" => exists,
        "attribute_not_exists" => !exists,
        _ => {
            return Err(validation(format!(
                "Unsupported condition expression: {condition}"
            )))
        }
    };

    if holds {
        Ok(())
    } else {
        Err(StoreError::ConditionFailed(
            "The conditional request failed".to_string(),
        ))
    }
}

/// Applies `SET a = :v, ...` and `REMOVE a, ...` clauses to `item`.
fn apply_update(
    item: &mut Item,
    expression: &str,
    names: &HashMap<String, String>,
    values: &HashMap<String, AttributeValue>,
) -> StoreResult<()> {
    let mut clauses: Vec<(String, String)> = Vec::new();
    for word in expression.split_whitespace() {
        match word.to_ascii_uppercase().as_str() {
            "SET" | "REMOVE" => clauses.push((word.to_ascii_uppercase(), String::new())),
            _ => match clauses.last_mut() {
                Some((_, body)) => {
                    body.push_str(word);
                    body.push(' ');
                }
                None => {
                    return Err(validation(format!(
                        "Unsupported update expression: {expression}"
                    )))
                }
            },
        }
    }

    if clauses.is_empty() {
        return Err(validation("Update expression must not be empty"));
    }

    for (action, body) in &clauses {
        for part in body.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if action == "SET" {
                let (name, value) = part.split_once('=').ok_or_else(|| {
                    validation(format!("Unsupported update expression: {expression}"))
                })?;
                let name = resolve_name(name.trim(), names)?;
                let value = resolve_value(value.trim(), values)?;
                item.insert(name.to_string(), value.clone());
            } else {
                let name = resolve_name(part, names)?;
                item.remove(name);
            }
        }
    }

    Ok(())
}

/// Keeps only the projected attributes of `item`.
fn project(
    item: &Item,
    projection: Option<&str>,
    names: &HashMap<String, String>,
) -> StoreResult<Item> {
    let Some(projection) = projection else {
        return Ok(item.clone());
    };

    let mut projected = Item::new();
    for token in projection.split(',').map(str::trim) {
        let name = resolve_name(token, names)?;
        if let Some(value) = item.get(name) {
            projected.insert(name.to_string(), value.clone());
        }
    }
    Ok(projected)
}

/// Partition key value of a `pk = :v` key condition.
fn partition_value<'a>(
    descriptor: &TableDescriptor,
    request: &'a QueryRequest,
) -> StoreResult<&'a AttributeValue> {
    let condition = request.key_condition_expression.trim();
    let (name, value) = condition
        .split_once('=')
        .filter(|(_, value)| !value.contains(" AND ") && !value.contains(" and "))
        .ok_or_else(|| {
            validation(format!(
                "Unsupported key condition expression: {condition}"
            ))
        })?;

    let name = resolve_name(name.trim(), &request.expression_attribute_names)?;
    if name != descriptor.partition_key().name {
        return Err(validation(format!(
            "Query condition missed key schema element: {}",
            descriptor.partition_key().name
        )));
    }
    resolve_value(value.trim(), &request.expression_attribute_values)
}

/// Cuts one page out of `candidates`, which are ordered by key token.
fn paginate(
    descriptor: &TableDescriptor,
    candidates: Vec<(&String, &Item)>,
    start_key: Option<&Key>,
    limit: Option<usize>,
    projection: Option<&str>,
    names: &HashMap<String, String>,
) -> StoreResult<Page> {
    let start = match start_key {
        Some(key) => {
            let token = key_token(descriptor, key)?;
            candidates
                .iter()
                .position(|(t, _)| **t == token)
                .map(|p| p + 1)
                .unwrap_or(candidates.len())
        }
        None => 0,
    };

    let remaining = &candidates[start.min(candidates.len())..];
    let take = limit.unwrap_or(remaining.len()).min(remaining.len());
    let page = &remaining[..take];

    let items = page
        .iter()
        .map(|(_, item)| project(item, projection, names))
        .collect::<StoreResult<Vec<_>>>()?;

    let last_evaluated_key = if take < remaining.len() {
        page.last().and_then(|(_, item)| key_of(descriptor, item))
    } else {
        None
    };

    Ok(Page {
        items,
        last_evaluated_key,
    })
}

fn page_limit(requested: Option<usize>, page_size: Option<usize>) -> Option<usize> {
    match (requested, page_size) {
        (Some(requested), Some(size)) => Some(requested.min(size)),
        (requested, size) => requested.or(size),
    }
}

#[async_trait]
impl TableStore for InMemoryStore {
    async fn get_item(&self, table: &str, key: &Key) -> StoreResult<Option<Item>> {
        let mut state = self.state.write().await;
        state.enter(GET_ITEM)?;
        let memory_table = state.table(table)?;
        let token = exact_key_token(&memory_table.descriptor, key)?;
        Ok(memory_table.items.get(&token).cloned())
    }

    async fn put_item(&self, table: &str, item: &Item) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.enter(PUT_ITEM)?;
        let memory_table = state.table_mut(table)?;
        let token = key_token(&memory_table.descriptor, item)?;
        memory_table.items.insert(token, item.clone());
        Ok(())
    }

    async fn delete_item(&self, table: &str, key: &Key) -> StoreResult<Option<Item>> {
        let mut state = self.state.write().await;
        state.enter(DELETE_ITEM)?;
        let memory_table = state.table_mut(table)?;
        let token = exact_key_token(&memory_table.descriptor, key)?;
        Ok(memory_table.items.remove(&token))
    }

    async fn update_item(
        &self,
        table: &str,
        request: &UpdateRequest,
    ) -> StoreResult<Option<Item>> {
        let mut state = self.state.write().await;
        state.enter(UPDATE_ITEM)?;
        let memory_table = state.table_mut(table)?;
        let token = exact_key_token(&memory_table.descriptor, &request.key)?;
        let current = memory_table.items.get(&token);

        if let Some(condition) = &request.condition_expression {
            check_condition(condition, current, &request.expression_attribute_names)?;
        }

        let mut updated = current.cloned().unwrap_or_else(|| request.key.clone());
        apply_update(
            &mut updated,
            &request.update_expression,
            &request.expression_attribute_names,
            &request.expression_attribute_values,
        )?;

        if key_token(&memory_table.descriptor, &updated)? != token {
            return Err(validation(
                "Cannot update attribute that is part of the key",
            ));
        }

        memory_table.items.insert(token, updated.clone());
        Ok(Some(updated))
    }

    async fn batch_get_item(&self, table: &str, keys: &[Key]) -> StoreResult<BatchGetOutput> {
        let mut state = self.state.write().await;
        state.enter(BATCH_GET_ITEM)?;
        if keys.len() > BATCH_GET_LIMIT {
            return Err(validation(format!(
                "Too many items requested for the BatchGetItem call: {}",
                keys.len()
            )));
        }

        let memory_table = state.table(table)?;
        let mut found = Vec::new();
        for key in keys {
            let token = exact_key_token(&memory_table.descriptor, key)?;
            if let Some(item) = memory_table.items.get(&token) {
                found.push(item.clone());
            }
        }

        let mut responses = HashMap::new();
        responses.insert(table.to_string(), found);
        Ok(BatchGetOutput {
            responses,
            unprocessed_keys: Vec::new(),
        })
    }

    async fn batch_write_item(
        &self,
        table: &str,
        requests: &[WriteRequest],
    ) -> StoreResult<Vec<WriteRequest>> {
        let mut state = self.state.write().await;
        state.enter(BATCH_WRITE_ITEM)?;
        if requests.is_empty() || requests.len() > BATCH_WRITE_LIMIT {
            return Err(validation(format!(
                "BatchWriteItem accepts 1 to {BATCH_WRITE_LIMIT} requests, got {}",
                requests.len()
            )));
        }

        let memory_table = state.table_mut(table)?;
        let tokens = requests
            .iter()
            .map(|request| match request {
                WriteRequest::Put(item) => key_token(&memory_table.descriptor, item),
                WriteRequest::Delete(key) => exact_key_token(&memory_table.descriptor, key),
            })
            .collect::<StoreResult<Vec<_>>>()?;

        for (request, token) in requests.iter().zip(tokens) {
            match request {
                WriteRequest::Put(item) => {
                    memory_table.items.insert(token, item.clone());
                }
                WriteRequest::Delete(_) => {
                    memory_table.items.remove(&token);
                }
            }
        }

        Ok(Vec::new())
    }

    async fn scan(
        &self,
        table: &str,
        request: &ScanRequest,
        page_limit_hint: Option<usize>,
        start_key: Option<&Key>,
    ) -> StoreResult<Page> {
        let mut state = self.state.write().await;
        state.enter(SCAN)?;
        let page_size = state.page_size;
        let memory_table = state.table(table)?;

        if request.index_name.is_some() {
            return Err(validation("Secondary indexes are not supported in memory"));
        }
        if request.filter_expression.is_some() {
            return Err(validation("Filter expressions are not supported in memory"));
        }

        let candidates = memory_table.items.iter().collect();
        paginate(
            &memory_table.descriptor,
            candidates,
            start_key,
            page_limit(page_limit_hint, page_size),
            request.projection_expression.as_deref(),
            &request.expression_attribute_names,
        )
    }

    async fn query(
        &self,
        table: &str,
        request: &QueryRequest,
        page_limit_hint: Option<usize>,
        start_key: Option<&Key>,
    ) -> StoreResult<Page> {
        let mut state = self.state.write().await;
        state.enter(QUERY)?;
        let page_size = state.page_size;
        let memory_table = state.table(table)?;

        if request.index_name.is_some() {
            return Err(validation("Secondary indexes are not supported in memory"));
        }
        if request.filter_expression.is_some() {
            return Err(validation("Filter expressions are not supported in memory"));
        }

        let descriptor = &memory_table.descriptor;
        let partition = partition_value(descriptor, request)?;
        let partition_name = descriptor.partition_key().name.as_str();

        let mut candidates: Vec<(&String, &Item)> = memory_table
            .items
            .iter()
            .filter(|(_, item)| item.get(partition_name) == Some(partition))
            .collect();
        if request.scan_index_forward == Some(false) {
            candidates.reverse();
        }

        paginate(
            descriptor,
            candidates,
            start_key,
            page_limit(page_limit_hint, page_size),
            request.projection_expression.as_deref(),
            &request.expression_attribute_names,
        )
    }

    async fn create_table(&self, descriptor: &TableDescriptor) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.enter(CREATE_TABLE)?;
        if state.tables.contains_key(descriptor.name()) {
            return Err(StoreError::TableInUse {
                table_name: descriptor.name().to_string(),
            });
        }

        let pending_polls = state.activation_polls;
        let status = if pending_polls == 0 {
            TableStatus::Active
        } else {
            state.pending_status.clone()
        };
        state.tables.insert(
            descriptor.name().to_string(),
            MemoryTable {
                descriptor: descriptor.clone(),
                status,
                pending_polls,
                items: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn delete_table(&self, table: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.enter(DELETE_TABLE)?;
        state
            .tables
            .remove(table)
            .map(|_| ())
            .ok_or_else(|| not_found(table))
    }

    async fn describe_table(&self, table: &str) -> StoreResult<Option<TableDescription>> {
        let mut state = self.state.write().await;
        state.enter(DESCRIBE_TABLE)?;
        let Some(memory_table) = state.tables.get_mut(table) else {
            return Ok(None);
        };

        let status = memory_table.status.clone();
        if memory_table.pending_polls > 0 {
            memory_table.pending_polls -= 1;
            if memory_table.pending_polls == 0 && status.is_transitional() {
                memory_table.status = TableStatus::Active;
            }
        }

        Ok(Some(TableDescription {
            table_name: table.to_string(),
            status,
            item_count: i64::try_from(memory_table.items.len()).ok(),
        }))
    }
}
