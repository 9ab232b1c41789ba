pub mod controller;
pub mod error;
pub mod event;
pub mod machine;
pub mod model;

pub use controller::{AnalysisTicket, ScouterController, SettingsSnapshot};
pub use error::{StateError, StateResult};
pub use event::{AppEvent, StateTransition};
pub use machine::StateMachine;
pub use model::{AppState, ViewState};
