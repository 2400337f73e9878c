pub mod attendance;
pub mod leave_draft;
pub mod leave_request;
