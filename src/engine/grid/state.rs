use crate::engine::query::request::SortDescriptor;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GridStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

/// What the grid currently shows. `items` always holds the last page that
/// loaded successfully.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridState {
    pub sort: Vec<SortDescriptor>,
    pub skip: usize,
    pub page_size: usize,
    pub items: Vec<Value>,
    pub total_count: usize,
    pub status: GridStatus,
    pub error: Option<String>,
}

impl GridState {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == GridStatus::Loading
    }
}
