//! The list controller: canonical collection plus search, facet, paging,
//! loading and in-flight state for one entity type.
//!
//! All methods take `&self`. State sits behind a mutex that is never held
//! across an `.await`, so a controller can be shared (e.g. in an `Arc`) and
//! driven by concurrent tasks. That is what makes the in-flight checks
//! meaningful: a second delete of the same row while the first is pending is
//! refused with [`AdminError::Busy`] rather than queued.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::entity::{Entity, MediaPost};
use crate::error::{AdminError, Result};
use crate::list::filter::filter_records;
use crate::list::paginate::{clamp_page, paginate, total_pages};
use crate::remote::{MediaRemote, MediaUpload, RemoteCollaborator};
use crate::table::{Row, build_rows};
use crate::toast::Toast;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// What to do with the collection after a successful mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Upsert or remove the affected record locally
    #[default]
    Merge,
    /// Reload the whole collection from the remote
    Refetch,
}

/// Identifies one `load`. Only the most recently issued ticket may apply
/// its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The result replaced the collection; holds the new record count
    Applied(usize),
    /// A newer load was issued meanwhile; the result was dropped
    Stale,
}

/// Snapshot of what a list page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListView<Id> {
    pub rows: Vec<Row<Id>>,
    pub current_page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub filtered_count: usize,
    pub total_count: usize,
    pub search_term: String,
    pub facet: String,
    pub loading: bool,
}

struct ListState<E: Entity> {
    records: Vec<E>,
    search_term: String,
    facet: E::Facet,
    current_page: usize,
    page_size: usize,
    loading: bool,
    generation: u64,
    // Bumped each time a load result replaces `records`.
    snapshot: u64,
    in_flight: HashSet<E::Id>,
    creating: bool,
    notice: Option<Toast>,
}

impl<E: Entity> ListState<E> {
    fn filtered_len(&self) -> usize {
        filter_records(&self.records, &self.search_term, &self.facet).len()
    }

    fn total_pages(&self) -> usize {
        total_pages(self.filtered_len(), self.page_size)
    }

    fn clamp(&mut self) {
        self.current_page = clamp_page(self.current_page, self.total_pages());
    }

    fn position(&self, id: &E::Id) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    fn upsert(&mut self, record: E) {
        match self.position(record.id()) {
            Some(index) => self.records[index] = record,
            None => self.records.push(record),
        }
    }

    fn remove(&mut self, id: &E::Id) -> Option<E> {
        self.position(id).map(|index| self.records.remove(index))
    }
}

/// Keep one record per id: the first occurrence's position with the last
/// occurrence's value.
fn dedupe_by_id<E: Entity>(records: Vec<E>) -> Vec<E> {
    let mut index: HashMap<E::Id, usize> = HashMap::with_capacity(records.len());
    let mut unique: Vec<E> = Vec::with_capacity(records.len());
    for record in records {
        match index.get(record.id()) {
            Some(&at) => unique[at] = record,
            None => {
                index.insert(record.id().clone(), unique.len());
                unique.push(record);
            }
        }
    }
    unique
}

/// Marks a record (or the create slot, when `id` is `None`) as in flight
/// until dropped.
struct InFlight<'a, E: Entity> {
    state: &'a Mutex<ListState<E>>,
    id: Option<E::Id>,
}

impl<E: Entity> Drop for InFlight<'_, E> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        match &self.id {
            Some(id) => {
                state.in_flight.remove(id);
            }
            None => state.creating = false,
        }
    }
}

pub struct ListController<E: Entity, R> {
    remote: Arc<R>,
    state: Mutex<ListState<E>>,
    policy: RefreshPolicy,
}

impl<E, R> ListController<E, R>
where
    E: Entity,
    R: RemoteCollaborator<E>,
{
    pub fn new(remote: Arc<R>) -> Self {
        Self {
            remote,
            state: Mutex::new(ListState {
                records: Vec::new(),
                search_term: String::new(),
                facet: E::Facet::default(),
                current_page: 1,
                page_size: DEFAULT_PAGE_SIZE,
                loading: false,
                generation: 0,
                snapshot: 0,
                in_flight: HashSet::new(),
                creating: false,
                notice: None,
            }),
            policy: RefreshPolicy::default(),
        }
    }

    pub fn with_page_size(self, page_size: usize) -> Self {
        self.set_page_size(page_size);
        self
    }

    pub fn with_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Fetch the collection and replace the local copy with it.
    ///
    /// On failure the previous collection is kept, the loading flag is
    /// cleared, an error notice is recorded and the error is returned.
    pub async fn load(&self) -> Result<LoadOutcome> {
        let ticket = self.begin_load();
        let result = self.remote.list().await;
        self.complete_load(ticket, result)
    }

    /// Start a load and get its ticket. Any earlier outstanding ticket
    /// becomes stale.
    pub fn begin_load(&self) -> LoadTicket {
        let mut state = self.state.lock();
        state.generation += 1;
        state.loading = true;
        debug!(collection = E::KIND.label(), generation = state.generation, "load started");
        LoadTicket(state.generation)
    }

    /// Apply the result of the load identified by `ticket`, unless a newer
    /// load has been started since.
    pub fn complete_load(&self, ticket: LoadTicket, result: Result<Vec<E>>) -> Result<LoadOutcome> {
        let mut state = self.state.lock();
        if ticket.0 != state.generation {
            debug!(
                collection = E::KIND.label(),
                ticket = ticket.0,
                current = state.generation,
                "discarding stale load result"
            );
            return Ok(LoadOutcome::Stale);
        }

        state.loading = false;
        match result {
            Ok(records) => {
                state.records = dedupe_by_id(records);
                state.snapshot += 1;
                state.clamp();
                debug!(collection = E::KIND.label(), count = state.records.len(), "load applied");
                Ok(LoadOutcome::Applied(state.records.len()))
            }
            Err(err) => {
                warn!(collection = E::KIND.label(), error = %err, "load failed");
                state.notice = Some(Toast::error(err.to_string()));
                Err(err)
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    // ========================================================================
    // Search, facet and paging
    // ========================================================================

    /// Set the search term and go back to page 1.
    pub fn set_search_term(&self, term: impl Into<String>) {
        let mut state = self.state.lock();
        state.search_term = term.into();
        state.current_page = 1;
    }

    pub fn search_term(&self) -> String {
        self.state.lock().search_term.clone()
    }

    /// Switch tab and go back to page 1.
    pub fn set_facet(&self, facet: E::Facet) {
        let mut state = self.state.lock();
        state.facet = facet;
        state.current_page = 1;
    }

    pub fn facet(&self) -> E::Facet {
        self.state.lock().facet.clone()
    }

    /// Go to page `page`, clamped into the valid range. Returns the page
    /// actually selected.
    pub fn set_page(&self, page: usize) -> usize {
        let mut state = self.state.lock();
        state.current_page = page;
        state.clamp();
        state.current_page
    }

    pub fn next_page(&self) -> usize {
        let page = self.current_page();
        self.set_page(page.saturating_add(1))
    }

    pub fn previous_page(&self) -> usize {
        let page = self.current_page();
        self.set_page(page.saturating_sub(1))
    }

    pub fn current_page(&self) -> usize {
        self.state.lock().current_page
    }

    pub fn total_pages(&self) -> usize {
        self.state.lock().total_pages()
    }

    /// Change the page size (minimum 1) and clamp the current page.
    pub fn set_page_size(&self, page_size: usize) {
        let mut state = self.state.lock();
        state.page_size = page_size.max(1);
        state.clamp();
    }

    pub fn page_size(&self) -> usize {
        self.state.lock().page_size
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Every record, in server order.
    pub fn records(&self) -> Vec<E> {
        self.state.lock().records.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    pub fn get(&self, id: &E::Id) -> Option<E> {
        let state = self.state.lock();
        state.records.iter().find(|r| r.id() == id).cloned()
    }

    /// Records passing the current search term and facet.
    pub fn filtered(&self) -> Vec<E> {
        let state = self.state.lock();
        filter_records(&state.records, &state.search_term, &state.facet)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Records on the current page.
    pub fn page_records(&self) -> Vec<E> {
        let state = self.state.lock();
        let filtered = filter_records(&state.records, &state.search_term, &state.facet);
        paginate(&filtered, state.page_size, state.current_page)
            .iter()
            .map(|r| (*r).clone())
            .collect()
    }

    pub fn view(&self) -> ListView<E::Id> {
        let state = self.state.lock();
        let filtered = filter_records(&state.records, &state.search_term, &state.facet);
        let page = paginate(&filtered, state.page_size, state.current_page);
        let rows = build_rows::<E, _>(page.iter().copied(), |id| state.in_flight.contains(id));

        ListView {
            rows,
            current_page: state.current_page,
            total_pages: total_pages(filtered.len(), state.page_size),
            page_size: state.page_size,
            filtered_count: filtered.len(),
            total_count: state.records.len(),
            search_term: state.search_term.clone(),
            facet: state.facet.to_string(),
            loading: state.loading,
        }
    }

    /// Whether a mutation on `id` is in flight.
    pub fn is_busy(&self, id: &E::Id) -> bool {
        self.state.lock().in_flight.contains(id)
    }

    pub fn is_creating(&self) -> bool {
        self.state.lock().creating
    }

    /// Most recent notice.
    pub fn notice(&self) -> Option<Toast> {
        self.state.lock().notice.clone()
    }

    pub fn take_notice(&self) -> Option<Toast> {
        self.state.lock().notice.take()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    fn require(&self, allowed: bool, operation: &'static str) -> Result<()> {
        if allowed {
            Ok(())
        } else {
            Err(AdminError::Unsupported {
                entity: E::KIND.label(),
                operation,
            })
        }
    }

    fn claim(&self, id: Option<&E::Id>) -> Result<InFlight<'_, E>> {
        let mut state = self.state.lock();
        match id {
            Some(id) => {
                if !state.in_flight.insert(id.clone()) {
                    return Err(AdminError::Busy(format!("{} {}", E::KIND.singular(), id)));
                }
            }
            None => {
                if state.creating {
                    return Err(AdminError::Busy(format!("new {}", E::KIND.singular())));
                }
                state.creating = true;
            }
        }
        Ok(InFlight {
            state: &self.state,
            id: id.cloned(),
        })
    }

    fn notify(&self, toast: Toast) {
        self.state.lock().notice = Some(toast);
    }

    fn fail<T>(&self, action: &str, err: AdminError) -> Result<T> {
        warn!(collection = E::KIND.label(), action, error = %err, "mutation failed");
        self.notify(Toast::error(format!(
            "Failed to {} {}: {}",
            action,
            E::KIND.singular(),
            err
        )));
        Err(err)
    }

    /// Bring the collection up to date after a successful mutation. A failed
    /// reload does not undo the mutation; it leaves a warning and returns
    /// false.
    async fn settle(&self, merge: impl FnOnce(&mut ListState<E>)) -> bool {
        match self.policy {
            RefreshPolicy::Merge => {
                let mut state = self.state.lock();
                merge(&mut state);
                state.clamp();
                true
            }
            RefreshPolicy::Refetch => {
                let reloaded = self.load().await;
                self.state.lock().clamp();
                match reloaded {
                    Ok(_) => true,
                    Err(err) => {
                        self.notify(Toast::warning(format!(
                            "Saved, but reloading {} failed: {}",
                            E::KIND.label(),
                            err
                        )));
                        false
                    }
                }
            }
        }
    }

    fn success_notice(&self, verb: &str) -> Toast {
        let mut noun = E::KIND.singular().to_string();
        if let Some(first) = noun.get_mut(..1) {
            first.make_ascii_uppercase();
        }
        Toast::success(format!("{noun} {verb}"))
    }

    /// Create a record from a request body.
    pub async fn create(&self, payload: &Value) -> Result<E> {
        self.require(E::CAPABILITIES.create, "create")?;
        let _guard = self.claim(None)?;

        match self.remote.create(payload).await {
            Ok(record) => {
                let merged = record.clone();
                if self.settle(move |state| state.upsert(merged)).await {
                    self.notify(self.success_notice("created"));
                }
                Ok(record)
            }
            Err(err) => self.fail("create", err),
        }
    }

    /// Update a record with a (partial) request body.
    pub async fn update(&self, id: &E::Id, patch: &Value) -> Result<E> {
        self.require(E::CAPABILITIES.update, "update")?;
        let _guard = self.claim(Some(id))?;

        match self.remote.update(id, patch).await {
            Ok(record) => {
                let merged = record.clone();
                if self.settle(move |state| state.upsert(merged)).await {
                    self.notify(self.success_notice("updated"));
                }
                Ok(record)
            }
            Err(err) => self.fail("update", err),
        }
    }

    /// Delete a record. The current page is clamped afterwards so removing
    /// the last row of the last page moves back a page.
    pub async fn remove(&self, id: &E::Id) -> Result<()> {
        self.require(E::CAPABILITIES.delete, "delete")?;
        let _guard = self.claim(Some(id))?;

        match self.remote.delete(id).await {
            Ok(()) => {
                let id = id.clone();
                let settled = self
                    .settle(move |state| {
                        state.remove(&id);
                    })
                    .await;
                if settled {
                    self.notify(self.success_notice("deleted"));
                }
                Ok(())
            }
            Err(err) => self.fail("delete", err),
        }
    }

    /// Flip the record's status flag.
    ///
    /// The flip is shown immediately and confirmed (replaced by the server's
    /// record) or rolled back when the remote call returns.
    pub async fn toggle_status(&self, id: &E::Id) -> Result<E> {
        self.require(E::CAPABILITIES.toggle, "toggle")?;
        let _guard = self.claim(Some(id))?;

        let (original, snapshot) = {
            let mut state = self.state.lock();
            let Some(index) = state.position(id) else {
                return Err(AdminError::NotFound {
                    entity: E::KIND.singular(),
                    id: id.to_string(),
                });
            };
            let original = state.records[index].clone();
            let optimistic = original.toggled().ok_or(AdminError::Unsupported {
                entity: E::KIND.label(),
                operation: "toggle",
            })?;
            state.records[index] = optimistic;
            (original, state.snapshot)
        };

        match self.remote.toggle_status(id).await {
            Ok(confirmed) => {
                {
                    let mut state = self.state.lock();
                    if let Some(index) = state.position(id) {
                        state.records[index] = confirmed.clone();
                    }
                    state.clamp();
                }
                self.notify(self.success_notice("status updated"));
                Ok(confirmed)
            }
            Err(err) => {
                {
                    let mut state = self.state.lock();
                    // A load that landed meanwhile already holds the server's view.
                    if state.snapshot == snapshot {
                        if let Some(index) = state.position(id) {
                            state.records[index] = original;
                        }
                    } else {
                        debug!(collection = E::KIND.label(), "newer snapshot loaded; skipping rollback");
                    }
                    state.clamp();
                }
                self.fail("toggle", err)
            }
        }
    }
}

impl<R> ListController<MediaPost, R>
where
    R: MediaRemote,
{
    /// Upload a file to the media library, then reload the collection so the
    /// server-derived fields show up.
    pub async fn upload(&self, upload: MediaUpload) -> Result<Option<MediaPost>> {
        self.require(MediaPost::CAPABILITIES.upload, "upload")?;
        let _guard = self.claim(None)?;

        match self.remote.upload(upload).await {
            Ok(record) => {
                if let Err(err) = self.load().await {
                    self.notify(Toast::warning(format!(
                        "Uploaded, but reloading media failed: {err}"
                    )));
                } else {
                    self.notify(Toast::success("Media uploaded"));
                }
                Ok(record)
            }
            Err(err) => self.fail("upload", err),
        }
    }
}
