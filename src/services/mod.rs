pub mod guards;

pub mod user_service;
pub use user_service::{
    CreateUserParams, DeleteOutcome, ListUsersFilter, Role, UserAdminError, UserAdminService,
    UserPage, UserSnapshot, UserStatus,
};

pub mod user_service_impl;
pub use user_service_impl::SeaOrmUserAdminService;

pub mod agent_service;
pub use agent_service::{AgentError, AgentService, AgentSnapshot, CreateAgentParams};

pub mod agent_service_impl;
pub use agent_service_impl::SeaOrmAgentService;
