//! Leave request engine: day counting, entitlement balances, validation and
//! the single-flight submission gate.

pub mod backend;
pub mod day_counter;
pub mod draft;
pub mod entitlement;
pub mod gate;
pub mod memory;
pub mod payload;
pub mod validator;

pub use backend::{BackendError, LeaveBackend, SubmissionReceipt};
pub use draft::{ActiveDropdown, DraftEdit, DraftRequest};
pub use entitlement::EntitlementResolver;
pub use gate::{GateError, SubmissionGate, SubmissionState};
pub use payload::NormalizedRequest;
pub use validator::{ComputedBalance, ValidationError};
