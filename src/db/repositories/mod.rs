pub mod agent;
pub mod audit;
pub mod budget_request;
pub mod reassignment;
pub mod token;
pub mod user;
