//! Huckleberry Common Library
//!
//! Shared types, constants, and accounting primitives for the Huckleberry
//! yield stack: the reward pool registry, the bond converter and the
//! auto-compounding vault all build on this crate.
//!
//! ## Modules
//!
//! - **Math**: checked 256-bit fixed-point helpers, time clamping, share conversion
//! - **Asset**: the ledger seam (`AssetLedger`) and a taxed in-memory ledger
//! - **Events**: append-only, hash-chained domain event log
//! - **Access Control**: admin/operator roles and permission checks
//! - **Lifecycle**: two-phase `finalize` initialization
//! - **Emergency**: pause switch
//! - **Context**: caller identity and time snapshot of one call

pub mod access_control;
pub mod asset;
pub mod constants;
pub mod context;
pub mod emergency;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod math;
pub mod types;

// Re-exports for convenience
pub use access_control::{check_permission, AccessControl, Role, RoleAssignment};
pub use asset::{AssetLedger, AssetMetadata, InMemoryLedger};
pub use context::CallContext;
pub use emergency::PauseState;
pub use errors::{ErrorCategory, HuckError, HuckResult};
pub use events::{EventLog, EventType, HuckEvent};
pub use lifecycle::Lifecycle;
pub use primitive_types::U256;
pub use types::*;
