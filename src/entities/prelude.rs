pub use super::agents::Entity as Agents;
pub use super::api_tokens::Entity as ApiTokens;
pub use super::budget_requests::Entity as BudgetRequests;
pub use super::user_audit_log::Entity as UserAuditLog;
pub use super::users::Entity as Users;
