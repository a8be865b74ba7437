use crate::engine::errors::{EngineError, NetworkError, ValidationError};
use crate::engine::grid::state::{GridState, GridStatus};
use crate::engine::pipeline::spec::AggregationSpec;
use crate::engine::query::request::{
    AggregationRequest, AggregationRequestBuilder, GridQuery, SortDescriptor,
};
use crate::engine::query::response::AggregationPage;
use crate::engine::schema::types::FieldSchema;
use crate::shared::config::GridConfig;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct GridSettings {
    pub page_size: usize,
    pub page_sizes: Vec<usize>,
    pub context_debounce: Duration,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            page_size: 10,
            page_sizes: vec![10, 20, 50],
            context_debounce: Duration::from_millis(500),
        }
    }
}

impl From<&GridConfig> for GridSettings {
    fn from(config: &GridConfig) -> Self {
        Self {
            page_size: config.page_size,
            page_sizes: config.page_sizes.clone(),
            context_debounce: Duration::from_millis(config.context_debounce_ms),
        }
    }
}

/// Inputs owned by the surrounding widget. Any change reloads from the first page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridInputs {
    pub data_source_id: String,
    pub aggregation: AggregationSpec,
    pub context_filters: Option<Value>,
    pub as_of: Option<String>,
}

/// A request the caller must execute, tagged with its sequence number.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub seq: u64,
    pub request: AggregationRequest,
    /// Wait this long before sending; a newer request supersedes this one.
    pub debounce: Duration,
}

/// Outcome of handing a response to the grid.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    Applied { seq: u64 },
    Discarded { seq: u64 },
    Failed { seq: u64, message: String },
}

/// Pagination/sort state machine of the aggregation grid.
///
/// Every operation that needs data returns a [`PendingRequest`]; only the
/// response carrying the latest sequence number is applied.
#[derive(Debug)]
pub struct AggregationGrid {
    settings: GridSettings,
    inputs: Option<GridInputs>,
    dashboard: Value,
    columns: Vec<FieldSchema>,
    state: GridState,
    seq: u64,
    last_request: Option<AggregationRequest>,
    /// Request whose fetch failed; the only one `retry` resends as is.
    failed_request: Option<AggregationRequest>,
    /// `(skip, page_size)` of the items currently shown.
    shown_window: (usize, usize),
}

impl AggregationGrid {
    pub fn new(settings: GridSettings) -> Self {
        let state = GridState::new(settings.page_size);
        Self {
            settings,
            inputs: None,
            dashboard: Value::Null,
            columns: Vec::new(),
            shown_window: (0, state.page_size),
            state,
            seq: 0,
            last_request: None,
            failed_request: None,
        }
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }

    pub fn inputs(&self) -> Option<&GridInputs> {
        self.inputs.as_ref()
    }

    /// Columns are the fields after the aggregation's last stage.
    pub fn columns(&self) -> &[FieldSchema] {
        &self.columns
    }

    pub fn set_columns(&mut self, columns: Vec<FieldSchema>) {
        self.columns = columns;
    }

    /// Sequence number of the request whose response will be applied.
    pub fn current_seq(&self) -> u64 {
        self.seq
    }

    /// Replaces the widget inputs. Unchanged inputs issue nothing.
    pub fn set_inputs(
        &mut self,
        inputs: GridInputs,
    ) -> Result<Option<PendingRequest>, ValidationError> {
        if self.inputs.as_ref() == Some(&inputs) {
            return Ok(None);
        }
        self.inputs = Some(inputs);
        self.state.skip = 0;
        self.load().map(Some)
    }

    /// New dashboard filter values; the reload waits for the debounce period.
    pub fn set_dashboard_filter(
        &mut self,
        dashboard: Value,
    ) -> Result<Option<PendingRequest>, ValidationError> {
        if self.dashboard == dashboard {
            return Ok(None);
        }
        self.dashboard = dashboard;
        if self.inputs.is_none() {
            return Ok(None);
        }
        self.state.skip = 0;
        let debounce = self.settings.context_debounce;
        self.issue(debounce).map(Some)
    }

    /// Requests the current window.
    pub fn load(&mut self) -> Result<PendingRequest, ValidationError> {
        self.issue(Duration::ZERO)
    }

    pub fn on_sort_change(
        &mut self,
        sort: Vec<SortDescriptor>,
    ) -> Result<PendingRequest, ValidationError> {
        self.state.sort = sort;
        self.state.skip = 0;
        self.load()
    }

    /// Fetches exactly the requested window; the shown page is replaced.
    pub fn on_page_change(
        &mut self,
        skip: usize,
        take: usize,
    ) -> Result<PendingRequest, ValidationError> {
        self.state.skip = skip;
        self.state.page_size = take;
        self.load()
    }

    /// Resends the request whose fetch failed under a fresh sequence number.
    /// Otherwise rebuilds from the current state.
    pub fn retry(&mut self) -> Result<PendingRequest, ValidationError> {
        match self.failed_request.take() {
            Some(request) => {
                self.state.skip = request.skip;
                self.state.page_size = request.first;
                Ok(self.track(request, Duration::ZERO))
            }
            None => self.load(),
        }
    }

    /// Hands a response back to the grid. Responses to superseded requests
    /// are dropped; a failed page keeps the previous items.
    pub fn apply(
        &mut self,
        seq: u64,
        result: Result<AggregationPage, NetworkError>,
    ) -> GridEvent {
        if seq != self.seq {
            debug!(
                target: "aggview::grid",
                seq,
                current = self.seq,
                "Discarding stale response"
            );
            return GridEvent::Discarded { seq };
        }

        match result {
            Ok(page) => {
                info!(
                    target: "aggview::grid",
                    seq,
                    items = page.items.len(),
                    total = page.total_count,
                    "Page loaded"
                );
                if let Some(request) = &self.last_request {
                    self.state.skip = request.skip;
                    self.state.page_size = request.first;
                }
                self.shown_window = (self.state.skip, self.state.page_size);
                self.state.items = page.items;
                self.state.total_count = page.total_count;
                self.state.status = GridStatus::Loaded;
                self.state.error = None;
                GridEvent::Applied { seq }
            }
            Err(e) => {
                warn!(target: "aggview::grid", seq, error = %e, "Page fetch failed");
                let message = e.banner();
                self.failed_request = self.last_request.clone();
                self.restore_window();
                self.state.status = GridStatus::Error;
                self.state.error = Some(message.clone());
                GridEvent::Failed { seq, message }
            }
        }
    }

    /// Marks the grid unusable after its metadata could not be loaded.
    pub fn fail_metadata(&mut self, error: &EngineError) {
        let message = match error {
            EngineError::Network(e) => e.banner(),
            other => other.to_string(),
        };
        self.columns.clear();
        self.state.status = GridStatus::Error;
        self.state.error = Some(message);
    }

    /// A rejected build still takes a sequence number so that responses to
    /// earlier requests are discarded.
    fn issue(&mut self, debounce: Duration) -> Result<PendingRequest, ValidationError> {
        let request = match self.build_request() {
            Ok(request) => request,
            Err(e) => {
                self.seq += 1;
                warn!(
                    target: "aggview::grid",
                    seq = self.seq,
                    error = %e,
                    "Request rejected before sending"
                );
                self.failed_request = None;
                self.restore_window();
                self.state.status = GridStatus::Error;
                self.state.error = Some(e.to_string());
                return Err(e);
            }
        };
        Ok(self.track(request, debounce))
    }

    fn restore_window(&mut self) {
        (self.state.skip, self.state.page_size) = self.shown_window;
    }

    fn track(&mut self, request: AggregationRequest, debounce: Duration) -> PendingRequest {
        self.seq += 1;
        self.failed_request = None;
        self.state.status = GridStatus::Loading;
        self.last_request = Some(request.clone());
        debug!(
            target: "aggview::grid",
            seq = self.seq,
            skip = request.skip,
            first = request.first,
            debounce_ms = debounce.as_millis() as u64,
            "Issuing request"
        );
        PendingRequest {
            seq: self.seq,
            request,
            debounce,
        }
    }

    fn build_request(&self) -> Result<AggregationRequest, ValidationError> {
        let inputs = self
            .inputs
            .as_ref()
            .ok_or_else(|| ValidationError::MissingValue("aggregation".to_string()))?;
        let query = GridQuery {
            data_source_id: inputs.data_source_id.clone(),
            aggregation_id: inputs.aggregation.id.clone().unwrap_or_default(),
            page_size: self.state.page_size,
            skip: self.state.skip,
            sort: self.state.sort.clone(),
            context_filters: inputs.context_filters.clone(),
            as_of: inputs.as_of.clone(),
        };
        AggregationRequestBuilder::new(&inputs.aggregation, &self.columns)
            .with_dashboard_values(self.dashboard.clone())
            .build(&query)
    }
}
