use crate::engine::errors::{EngineError, NetworkError, ValidationError};
use crate::engine::grid::aggregation_grid::{
    AggregationGrid, GridEvent, GridInputs, GridSettings, PendingRequest,
};
use crate::engine::pipeline::propagation::fields_after;
use crate::engine::query::request::SortDescriptor;
use crate::engine::query::response::{AggregationBackend, AggregationPage};
use crate::engine::schema::metadata::{MetadataSource, load_source_fields};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::{self, JoinSet};
use tracing::{debug, warn};

type FetchOutcome = (u64, Result<AggregationPage, NetworkError>);

/// Drives an [`AggregationGrid`] against a backend.
///
/// At most one fetch is in flight: dispatching a request aborts the one it
/// supersedes. Dropping the session aborts whatever is still pending.
pub struct GridSession<B: AggregationBackend + ?Sized + 'static> {
    backend: Arc<B>,
    grid: AggregationGrid,
    tasks: JoinSet<FetchOutcome>,
    task_seqs: HashMap<task::Id, u64>,
}

impl<B: AggregationBackend + ?Sized + 'static> GridSession<B> {
    pub fn new(backend: Arc<B>, settings: GridSettings) -> Self {
        Self {
            backend,
            grid: AggregationGrid::new(settings),
            tasks: JoinSet::new(),
            task_seqs: HashMap::new(),
        }
    }

    pub fn grid(&self) -> &AggregationGrid {
        &self.grid
    }

    pub fn has_pending(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Resolves the grid columns from metadata. On failure the grid shows
    /// the error and the error is returned.
    pub async fn load_columns(&mut self, source: &dyn MetadataSource) -> Result<(), EngineError> {
        let Some(inputs) = self.grid.inputs().cloned() else {
            return Err(ValidationError::MissingValue("aggregation".to_string()).into());
        };
        let spec = &inputs.aggregation;
        match load_source_fields(source, &inputs.data_source_id, &spec.source_fields).await {
            Ok(fields) => {
                self.grid.set_columns(fields_after(&fields, &spec.pipeline));
                Ok(())
            }
            Err(e) => {
                e.log_error();
                self.grid.fail_metadata(&e);
                Err(e)
            }
        }
    }

    pub fn set_inputs(&mut self, inputs: GridInputs) -> Result<(), ValidationError> {
        let issued = self.grid.set_inputs(inputs);
        self.submit(issued.transpose())
    }

    pub fn set_dashboard_filter(&mut self, dashboard: Value) -> Result<(), ValidationError> {
        let issued = self.grid.set_dashboard_filter(dashboard);
        self.submit(issued.transpose())
    }

    pub fn load(&mut self) -> Result<(), ValidationError> {
        let issued = self.grid.load();
        self.submit(Some(issued))
    }

    pub fn sort(&mut self, sort: Vec<SortDescriptor>) -> Result<(), ValidationError> {
        let issued = self.grid.on_sort_change(sort);
        self.submit(Some(issued))
    }

    pub fn page(&mut self, skip: usize, take: usize) -> Result<(), ValidationError> {
        let issued = self.grid.on_page_change(skip, take);
        self.submit(Some(issued))
    }

    pub fn retry(&mut self) -> Result<(), ValidationError> {
        let issued = self.grid.retry();
        self.submit(Some(issued))
    }

    /// Dispatches an issued request. A rejected one cancels whatever is in
    /// flight, since the grid no longer wants its response.
    fn submit(
        &mut self,
        issued: Option<Result<PendingRequest, ValidationError>>,
    ) -> Result<(), ValidationError> {
        match issued {
            Some(Ok(pending)) => {
                self.dispatch(pending);
                Ok(())
            }
            Some(Err(e)) => {
                self.cancel_pending();
                Err(e)
            }
            None => Ok(()),
        }
    }

    fn dispatch(&mut self, pending: PendingRequest) {
        if !self.tasks.is_empty() {
            debug!(target: "aggview::grid", seq = pending.seq, "Aborting superseded fetch");
            self.cancel_pending();
        }
        let backend = Arc::clone(&self.backend);
        let PendingRequest {
            seq,
            request,
            debounce,
        } = pending;
        let handle = self.tasks.spawn(async move {
            if !debounce.is_zero() {
                tokio::time::sleep(debounce).await;
            }
            (seq, backend.fetch(&request).await)
        });
        self.task_seqs.insert(handle.id(), seq);
    }

    /// Waits for the next finished fetch and applies it. `None` once
    /// nothing is pending.
    pub async fn next_event(&mut self) -> Option<GridEvent> {
        loop {
            match self.tasks.join_next_with_id().await? {
                Ok((id, (seq, result))) => {
                    self.task_seqs.remove(&id);
                    return Some(self.grid.apply(seq, result));
                }
                Err(e) => {
                    let seq = self.task_seqs.remove(&e.id());
                    if e.is_cancelled() {
                        continue;
                    }
                    warn!(target: "aggview::grid", error = %e, seq = ?seq, "Fetch task failed");
                    if let Some(seq) = seq {
                        let failure = NetworkError::Transport(format!("Fetch task failed: {}", e));
                        return Some(self.grid.apply(seq, Err(failure)));
                    }
                }
            }
        }
    }

    /// Applies every pending fetch.
    pub async fn settle(&mut self) -> Vec<GridEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event().await {
            events.push(event);
        }
        events
    }

    /// Cancels any in-flight fetch.
    pub fn close(&mut self) {
        self.cancel_pending();
    }

    fn cancel_pending(&mut self) {
        self.tasks.abort_all();
        self.tasks.detach_all();
        self.task_seqs.clear();
    }
}
