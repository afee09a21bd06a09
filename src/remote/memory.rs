//! In-process remote backed by a vector of records.
//!
//! Behaves like the REST backend closely enough for the controller and form
//! tests: ids are assigned on create, patches are merged field by field,
//! and failures can be injected for the next call.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use super::{MediaRemote, MediaUpload, RemoteCollaborator};
use crate::entity::{Entity, MediaPost, mime_for_path};
use crate::error::{AdminError, FetchError, FieldErrors, MutationError, Result};

/// A failure returned by the next call instead of doing the work.
#[derive(Debug, Clone)]
pub enum InjectedFailure {
    /// Network or 5xx failure
    Unavailable(String),
    /// 4xx rejection with optional field detail
    Rejected { message: String, fields: FieldErrors },
    /// 401: token missing or expired
    Unauthorized,
}

impl InjectedFailure {
    fn into_fetch_error(self, collection: &str) -> AdminError {
        match self {
            InjectedFailure::Unavailable(message) => FetchError::new(collection, message).into(),
            InjectedFailure::Rejected { message, .. } => {
                FetchError::new(collection, message).with_status(422).into()
            }
            InjectedFailure::Unauthorized => AdminError::Auth("Unauthenticated.".to_string()),
        }
    }

    fn into_mutation_error(self) -> AdminError {
        match self {
            InjectedFailure::Unavailable(message) => MutationError::Failed(message).into(),
            InjectedFailure::Rejected { message, fields } => {
                MutationError::Rejected { message, fields }.into()
            }
            InjectedFailure::Unauthorized => AdminError::Auth("Unauthenticated.".to_string()),
        }
    }
}

#[derive(Debug, Default)]
struct CallCounts {
    list: AtomicUsize,
    create: AtomicUsize,
    update: AtomicUsize,
    delete: AtomicUsize,
    toggle: AtomicUsize,
    upload: AtomicUsize,
}

struct Store<E> {
    records: Vec<E>,
    next_id: u64,
    failure: Option<InjectedFailure>,
}

pub struct InMemoryRemote<E: Entity> {
    store: Mutex<Store<E>>,
    latency: Mutex<Option<Duration>>,
    calls: CallCounts,
}

impl<E: Entity> Default for InMemoryRemote<E> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<E: Entity> InMemoryRemote<E> {
    /// Seed with records. New ids continue after the largest numeric id.
    pub fn new(records: Vec<E>) -> Self {
        let next_id = records
            .iter()
            .filter_map(|r| r.id().to_string().parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            store: Mutex::new(Store {
                records,
                next_id,
                failure: None,
            }),
            latency: Mutex::new(None),
            calls: CallCounts::default(),
        }
    }

    /// Delay every call, to let tests interleave operations.
    pub fn with_latency(self, latency: Duration) -> Self {
        *self.latency.lock() = Some(latency);
        self
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Make the next call fail with `failure`.
    pub fn fail_next(&self, failure: InjectedFailure) {
        self.store.lock().failure = Some(failure);
    }

    /// Server-side snapshot.
    pub fn records(&self) -> Vec<E> {
        self.store.lock().records.clone()
    }

    /// Replace the server-side collection, as another session would.
    pub fn replace_records(&self, records: Vec<E>) {
        self.store.lock().records = records;
    }

    pub fn list_calls(&self) -> usize {
        self.calls.list.load(Ordering::SeqCst)
    }

    /// Calls to create, update, delete, toggle and upload combined.
    pub fn mutation_calls(&self) -> usize {
        [
            &self.calls.create,
            &self.calls.update,
            &self.calls.delete,
            &self.calls.toggle,
            &self.calls.upload,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }

    async fn pause(&self) {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn take_failure(&self) -> Option<InjectedFailure> {
        self.store.lock().failure.take()
    }

    fn not_found(id: &E::Id) -> AdminError {
        AdminError::NotFound {
            entity: E::KIND.singular(),
            id: id.to_string(),
        }
    }

    fn insert_with_id(&self, mut object: Map<String, Value>) -> Result<E> {
        let mut store = self.store.lock();
        object.insert("id".to_string(), Value::from(store.next_id));
        let record: E = serde_json::from_value(Value::Object(object)).map_err(|e| {
            MutationError::Rejected {
                message: e.to_string(),
                fields: FieldErrors::new(),
            }
        })?;
        store.next_id += 1;
        store.records.push(record.clone());
        Ok(record)
    }
}

fn as_object(value: &Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        other => Err(MutationError::Rejected {
            message: format!("expected a JSON object, got {other}"),
            fields: FieldErrors::new(),
        }
        .into()),
    }
}

impl<E: Entity> RemoteCollaborator<E> for InMemoryRemote<E> {
    async fn list(&self) -> Result<Vec<E>> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(failure) = self.take_failure() {
            return Err(failure.into_fetch_error(E::KIND.label()));
        }
        Ok(self.records())
    }

    async fn create(&self, payload: &Value) -> Result<E> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(failure) = self.take_failure() {
            return Err(failure.into_mutation_error());
        }
        self.insert_with_id(as_object(payload)?)
    }

    async fn update(&self, id: &E::Id, patch: &Value) -> Result<E> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(failure) = self.take_failure() {
            return Err(failure.into_mutation_error());
        }

        let patch = as_object(patch)?;
        let mut store = self.store.lock();
        let slot = store
            .records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;

        let mut merged = match serde_json::to_value(&*slot)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            if key != "id" {
                merged.insert(key, value);
            }
        }
        let updated: E = serde_json::from_value(Value::Object(merged)).map_err(|e| {
            MutationError::Rejected {
                message: e.to_string(),
                fields: FieldErrors::new(),
            }
        })?;
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &E::Id) -> Result<()> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(failure) = self.take_failure() {
            return Err(failure.into_mutation_error());
        }
        let mut store = self.store.lock();
        let before = store.records.len();
        store.records.retain(|r| r.id() != id);
        if store.records.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    async fn toggle_status(&self, id: &E::Id) -> Result<E> {
        self.calls.toggle.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(failure) = self.take_failure() {
            return Err(failure.into_mutation_error());
        }
        let mut store = self.store.lock();
        let slot = store
            .records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        let toggled = slot.toggled().ok_or(AdminError::Unsupported {
            entity: E::KIND.label(),
            operation: "toggle",
        })?;
        *slot = toggled.clone();
        Ok(toggled)
    }
}

impl MediaRemote for InMemoryRemote<MediaPost> {
    async fn upload(&self, upload: MediaUpload) -> Result<Option<MediaPost>> {
        self.calls.upload.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(failure) = self.take_failure() {
            return Err(failure.into_mutation_error());
        }
        let mut object = Map::new();
        object.insert("name".to_string(), Value::from(upload.effective_title()));
        object.insert(
            "url".to_string(),
            Value::from(format!("memory://media/{}", upload.file_name)),
        );
        object.insert("type".to_string(), Value::from(mime_for_path(&upload.file_name)));
        object.insert("collection".to_string(), Value::from(upload.collection.to_string()));
        self.insert_with_id(object).map(Some)
    }
}
