pub mod prelude;

pub mod agents;
pub mod api_tokens;
pub mod budget_requests;
pub mod user_audit_log;
pub mod users;
