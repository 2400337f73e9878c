pub mod attendance;
pub mod entitlement;
pub mod leave_category;
pub mod leave_request;
pub mod role;
