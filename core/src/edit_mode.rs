use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use storemap_proto::Location;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditModeState {
    pub enabled: bool,
    /// Where the next storefront will be created
    pub location: Option<Location>,
    pub dialog_open: bool,
    pub dialog_error: Option<String>,
}

/// Administrator edit mode and the creation dialog state that hangs off it
#[derive(Clone, Default)]
pub struct EditMode(Arc<RwLock<EditModeState>>);

impl EditMode {
    pub fn new() -> Self { Self::default() }

    fn read(&self) -> RwLockReadGuard<'_, EditModeState> { self.0.read().unwrap_or_else(PoisonError::into_inner) }

    fn write(&self) -> RwLockWriteGuard<'_, EditModeState> { self.0.write().unwrap_or_else(PoisonError::into_inner) }

    pub fn state(&self) -> EditModeState { self.read().clone() }

    pub fn is_enabled(&self) -> bool { self.read().enabled }

    pub fn location(&self) -> Option<Location> { self.read().location }

    /// Flip edit mode. Only a signed-in administrator may turn it on; anyone may turn it off.
    pub fn toggle(&self, signed_in: bool, is_admin: bool) -> bool {
        let mut state = self.write();
        if state.enabled {
            disable(&mut state);
        } else if signed_in && is_admin {
            state.enabled = true;
        } else {
            debug!("EditMode.toggle: refused, signed_in={signed_in} is_admin={is_admin}");
        }
        state.enabled
    }

    pub fn disable(&self) { disable(&mut self.write()) }

    /// Record a map click as the creation location. Ignored outside edit mode.
    pub fn choose_location(&self, location: Location) -> bool {
        let mut state = self.write();
        if !state.enabled {
            return false;
        }
        state.location = Some(location);
        true
    }

    pub fn clear_location(&self) { self.write().location = None }

    /// Open the creation dialog for the chosen location
    pub fn open_create_dialog(&self) -> bool {
        let mut state = self.write();
        if !state.enabled || state.location.is_none() {
            return false;
        }
        state.dialog_open = true;
        state.dialog_error = None;
        true
    }

    pub fn close_create_dialog(&self) {
        let mut state = self.write();
        state.dialog_open = false;
        state.dialog_error = None;
    }

    pub fn set_dialog_error(&self, message: impl Into<String>) { self.write().dialog_error = Some(message.into()) }
}

fn disable(state: &mut EditModeState) {
    state.enabled = false;
    state.location = None;
    state.dialog_open = false;
    state.dialog_error = None;
}
