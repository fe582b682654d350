//! Record operations over an in-memory collection
//!
//! Nothing here touches storage. The service layer loads a collection, hands it
//! to these functions, and saves whatever they leave behind.
//!
//! Ids are decimal strings. The next id is one past the largest numeric id in
//! the collection, which under a consistently applied [`OrderingPolicy`] is the
//! id of the newest record (first element for newest-first, last element for
//! oldest-first) plus one.

use serde_json::Value;

use crate::core::{Error, Fields, OrderingPolicy, Record, Result};

/// Every record, in stored order
pub fn list(records: &[Record]) -> &[Record] {
    records
}

/// First record whose id equals `id`
pub fn get_by_id<'a>(records: &'a [Record], id: &str) -> Option<&'a Record> {
    records.iter().find(|r| r.id() == Some(id))
}

/// Id the next created record receives.
///
/// Fails once the largest id is `u64::MAX`; reusing it would duplicate an id.
pub fn next_id(records: &[Record]) -> Result<u64> {
    match records.iter().filter_map(Record::numeric_id).max() {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or_else(id_space_exhausted),
    }
}

fn id_space_exhausted() -> Error {
    Error::internal("record id space exhausted")
}

fn insert(records: &mut Vec<Record>, record: Record, policy: OrderingPolicy) {
    match policy {
        OrderingPolicy::NewestFirst => records.insert(0, record),
        OrderingPolicy::OldestFirst => records.push(record),
    }
}

/// Create a record from `fields` with a freshly assigned id
pub fn create(records: &mut Vec<Record>, fields: Fields, policy: OrderingPolicy) -> Result<Record> {
    let record = Record::with_id(fields, next_id(records)?.to_string());
    insert(records, record.clone(), policy);
    Ok(record)
}

/// Shallow-merge `fields` into the first record matching `id`.
///
/// Returns `None`, leaving the collection untouched, when no record matches.
pub fn update(records: &mut [Record], id: &str, fields: Fields) -> Option<Record> {
    let record = records.iter_mut().find(|r| r.id() == Some(id))?;
    record.merge(fields);
    Some(record.clone())
}

/// Remove every record matching `id`, returning how many were removed
pub fn delete(records: &mut Vec<Record>, id: &str) -> usize {
    let before = records.len();
    records.retain(|r| r.id() != Some(id));
    before - records.len()
}

/// Remove every record whose id appears in `ids`, returning how many were removed
pub fn bulk_delete(records: &mut Vec<Record>, ids: &[String]) -> usize {
    let before = records.len();
    records.retain(|r| match r.id() {
        Some(id) => !ids.iter().any(|target| target == id),
        None => true,
    });
    before - records.len()
}

/// Create one record per payload, assigning consecutive ids.
///
/// Ids are computed once up front, and the whole batch is refused before any
/// insertion if it would run past `u64::MAX`. Under newest-first the batch is
/// walked from its last element, each record prepended with the next id, so the
/// final listing shows the batch in caller order with descending ids. Under
/// oldest-first the batch is walked forward and appended.
///
/// `after_insert` runs after every insertion with the collection as it stands;
/// its error aborts the batch. The created records are returned in caller order.
pub fn bulk_create<F>(
    records: &mut Vec<Record>,
    payloads: Vec<Fields>,
    policy: OrderingPolicy,
    mut after_insert: F,
) -> Result<Vec<Record>>
where
    F: FnMut(&[Record]) -> Result<()>,
{
    let count = payloads.len();
    let start = next_id(records)?;
    if count > 0 {
        start.checked_add(count as u64 - 1).ok_or_else(id_space_exhausted)?;
    }
    let mut created: Vec<Option<Record>> = vec![None; count];

    let order: Box<dyn Iterator<Item = (usize, Fields)>> = match policy {
        OrderingPolicy::NewestFirst => Box::new(payloads.into_iter().enumerate().rev()),
        OrderingPolicy::OldestFirst => Box::new(payloads.into_iter().enumerate()),
    };

    let ids = (0..count as u64).map(|offset| start + offset);
    for (id, (position, fields)) in ids.zip(order) {
        let record = Record::with_id(fields, id.to_string());
        insert(records, record.clone(), policy);
        after_insert(records.as_slice())?;
        created[position] = Some(record);
    }

    Ok(created.into_iter().flatten().collect())
}

/// Interpret a create/update body as a field map
pub fn record_fields(body: Value) -> Result<Fields> {
    match body {
        Value::Object(fields) => Ok(fields),
        _ => Err(Error::validation("request body must be a JSON object")),
    }
}

/// Extract the `ids` array of a bulk-delete body.
///
/// Elements that are not strings can never match a record id and are dropped.
pub fn id_list(body: &Value) -> Result<Vec<String>> {
    match body.get("ids") {
        Some(Value::Array(ids)) => Ok(ids
            .iter()
            .filter_map(|id| id.as_str().map(str::to_string))
            .collect()),
        _ => Err(Error::validation("ids must be an array")),
    }
}

/// Extract the `users` array of a bulk-create body
pub fn record_payloads(body: Value) -> Result<Vec<Fields>> {
    let users = match body {
        Value::Object(mut map) => map.remove("users"),
        _ => None,
    };

    match users {
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(fields) => Ok(fields),
                _ => Err(Error::validation(format!("users[{}] must be a JSON object", i))),
            })
            .collect(),
        _ => Err(Error::validation("users must be an array")),
    }
}
