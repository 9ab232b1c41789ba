use thiserror::Error;

use super::event::AppEvent;
use super::model::AppState;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("{event:?} is not accepted while {from:?}")]
    InvalidStateTransition { from: AppState, event: AppEvent },
}
