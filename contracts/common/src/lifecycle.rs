//! Two-phase initialization
//!
//! Components are built uninitialized and configured by exactly one
//! `finalize` call. Any operation before that fails with `NotInitialized`;
//! a second `finalize` fails with `AlreadyInitialized`.

use serde::{Deserialize, Serialize};

use crate::errors::{HuckError, HuckResult};

/// Initialization state holding the finalized settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle<T> {
    /// Built but not configured
    Uninitialized,
    /// Configured and usable
    Ready(T),
}

impl<T> Default for Lifecycle<T> {
    fn default() -> Self {
        Lifecycle::Uninitialized
    }
}

impl<T> Lifecycle<T> {
    /// Install the settings; allowed once
    pub fn finalize(&mut self, settings: T) -> HuckResult<()> {
        if self.is_ready() {
            return Err(HuckError::AlreadyInitialized);
        }
        *self = Lifecycle::Ready(settings);
        Ok(())
    }

    /// True once finalized
    pub fn is_ready(&self) -> bool {
        matches!(self, Lifecycle::Ready(_))
    }

    /// Settings, or `NotInitialized`
    pub fn get(&self) -> HuckResult<&T> {
        match self {
            Lifecycle::Ready(settings) => Ok(settings),
            Lifecycle::Uninitialized => Err(HuckError::NotInitialized),
        }
    }

    /// Mutable settings, or `NotInitialized`
    pub fn get_mut(&mut self) -> HuckResult<&mut T> {
        match self {
            Lifecycle::Ready(settings) => Ok(settings),
            Lifecycle::Uninitialized => Err(HuckError::NotInitialized),
        }
    }
}
