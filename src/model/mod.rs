pub mod attendance;
pub mod audit_log;
pub mod gamification;
pub mod leave_request;
pub mod role;
pub mod salary_slip;
pub mod user;
