//! Conditional routing for the bounded retry loops.
//!
//! Every router guards on `round < max_rounds`: reaching the bound always
//! exits the loop regardless of score or preflight verdict, so an exhausted
//! run completes best-effort instead of failing or hanging.

use super::topology::{RouterKind, StageId};
use crate::state::SongState;

/// Selects the next stage from the router's fixed candidate pair.
#[must_use]
pub fn route(kind: RouterKind, state: &SongState, stay: StageId, advance: StageId) -> StageId {
    match kind {
        RouterKind::Review => {
            if state.score < state.score_threshold && state.round < state.max_rounds {
                stay
            } else {
                advance
            }
        }
        RouterKind::Preflight => {
            if !state.preflight_passed && state.round < state.max_rounds {
                stay
            } else {
                advance
            }
        }
    }
}
