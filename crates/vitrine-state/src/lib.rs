//! Session state for the model browser: the catalog of selectable models
//! and the state machine that owns the currently loaded scene.

pub mod catalog;
pub mod error;
pub mod settings;
pub mod state;

pub use catalog::{ModelCatalog, ModelEntry};
pub use error::{Error, Result};
pub use settings::ViewSettings;
pub use state::{LoadRequest, LoadTicket, ViewerState};
