pub mod aggregation_grid;
pub mod session;
pub mod state;

pub use aggregation_grid::{AggregationGrid, GridEvent, GridInputs, GridSettings, PendingRequest};
pub use session::GridSession;
pub use state::{GridState, GridStatus};
