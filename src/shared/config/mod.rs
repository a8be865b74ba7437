pub mod global;
pub mod model;

pub use global::CONFIG;
pub use model::{
    BackendConfig, GridConfig, LoggingConfig, SchemaConfig, Settings, load_settings,
    load_settings_from,
};
