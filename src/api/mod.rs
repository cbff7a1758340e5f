pub mod admin;
pub mod ai;
pub mod attendance;
pub mod employee;
pub mod export;
pub mod leave_request;
pub mod users;
