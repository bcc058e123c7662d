//! Emergency Module
//!
//! Pause switch for operations that move funds into the protocol.
//! Withdrawals stay open while paused so users can always exit.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::context::CallContext;
use crate::errors::{HuckError, HuckResult};
use crate::events::HuckEvent;
use crate::types::AccountId;

/// Pause flag with provenance of the last pause
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseState {
    paused: bool,
    paused_at: u64,
    paused_by: Option<AccountId>,
}

impl PauseState {
    /// Running state
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the switch is engaged
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Who engaged the switch and when
    pub fn paused_by(&self) -> Option<(AccountId, u64)> {
        self.paused_by
            .filter(|_| self.paused)
            .map(|by| (by, self.paused_at))
    }

    /// Fail with `ProtocolPaused` while engaged
    pub fn ensure_not_paused(&self) -> HuckResult<()> {
        if self.paused {
            return Err(HuckError::ProtocolPaused);
        }
        Ok(())
    }

    /// Engage the switch. Role checks are the caller's responsibility.
    pub fn pause(&mut self, ctx: &mut CallContext) -> HuckResult<()> {
        self.ensure_not_paused()?;
        self.paused = true;
        self.paused_at = ctx.now();
        self.paused_by = Some(ctx.caller());
        info!(at = ctx.now(), "paused");
        ctx.emit(HuckEvent::Paused {
            by: ctx.caller(),
            timestamp: ctx.now(),
        });
        Ok(())
    }

    /// Release the switch
    pub fn unpause(&mut self, ctx: &mut CallContext) -> HuckResult<()> {
        if !self.paused {
            return Err(HuckError::NotPaused);
        }
        self.paused = false;
        info!(at = ctx.now(), "unpaused");
        ctx.emit(HuckEvent::Unpaused {
            by: ctx.caller(),
            timestamp: ctx.now(),
        });
        Ok(())
    }
}
