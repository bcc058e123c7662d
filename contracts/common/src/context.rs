//! Call Context
//!
//! Identity, time snapshot and event sink of one top-level call. Time is read
//! once when the context is created; every component touched by the call sees
//! the same `now`.

use crate::events::{EventLog, HuckEvent};
use crate::types::AccountId;

/// Execution context threaded through every state-changing operation
#[derive(Debug, Clone)]
pub struct CallContext {
    caller: AccountId,
    now: u64,
    events: EventLog,
}

impl CallContext {
    /// Start a call made by `caller` at time `now`
    pub fn new(caller: AccountId, now: u64) -> Self {
        Self {
            caller,
            now,
            events: EventLog::new(),
        }
    }

    /// Identity the current frame runs as
    pub fn caller(&self) -> AccountId {
        self.caller
    }

    /// Timestamp of the top-level call (seconds)
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Append a domain event
    pub fn emit(&mut self, event: HuckEvent) {
        self.events.emit(event);
    }

    /// Events emitted so far
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Finish the call and hand back its events
    pub fn into_events(self) -> EventLog {
        self.events
    }

    /// Run `f` as `account`, restoring the outer identity afterwards
    ///
    /// Components use this when they act on their own behalf, e.g. the vault
    /// staking into the registry from its custody account.
    pub fn as_caller<T>(&mut self, account: AccountId, f: impl FnOnce(&mut Self) -> T) -> T {
        let outer = std::mem::replace(&mut self.caller, account);
        let out = f(self);
        self.caller = outer;
        out
    }
}
