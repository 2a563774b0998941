use serde::{Deserialize, Serialize};

use crate::entities::{api_tokens, budget_requests, user_audit_log};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Token metadata without the secret. The secret itself is returned once,
/// at issue time, via [`IssuedTokenDto`].
#[derive(Debug, Serialize)]
pub struct TokenDto {
    pub id: String,
    pub name: String,
    pub owner_user_id: Option<String>,
    pub owner_agent_id: Option<String>,
    pub created_at: i64,
    pub revoked_at: Option<i64>,
    pub revoked_by: Option<String>,
}

impl From<api_tokens::Model> for TokenDto {
    fn from(model: api_tokens::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            owner_user_id: model.owner_user_id,
            owner_agent_id: model.owner_agent_id,
            created_at: model.created_at,
            revoked_at: model.revoked_at,
            revoked_by: model.revoked_by,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IssuedTokenDto {
    pub id: String,
    pub name: String,
    /// The secret; shown only in this response
    pub token: String,
    pub owner_user_id: Option<String>,
    pub owner_agent_id: Option<String>,
    pub created_at: i64,
}

impl From<api_tokens::Model> for IssuedTokenDto {
    fn from(model: api_tokens::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            token: model.token,
            owner_user_id: model.owner_user_id,
            owner_agent_id: model.owner_agent_id,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BudgetRequestDto {
    pub id: String,
    pub requester_id: Option<String>,
    pub agent_id: String,
    pub amount: f64,
    pub justification: Option<String>,
    pub status: String,
    pub review_notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<budget_requests::Model> for BudgetRequestDto {
    fn from(model: budget_requests::Model) -> Self {
        Self {
            id: model.id,
            requester_id: model.requester_id,
            agent_id: model.agent_id,
            amount: model.amount,
            justification: model.justification,
            status: model.status,
            review_notes: model.review_notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuditEntryDto {
    pub id: i64,
    pub operation: String,
    pub target_user_id: String,
    pub performed_by: String,
    pub timestamp: i64,
    pub previous_state: Option<serde_json::Value>,
    pub new_state: Option<serde_json::Value>,
    pub reason: Option<String>,
}

impl From<user_audit_log::Model> for AuditEntryDto {
    fn from(model: user_audit_log::Model) -> Self {
        // State columns hold JSON text; surface them structured
        let parse = |raw: Option<String>| {
            raw.and_then(|s| serde_json::from_str::<serde_json::Value>(&s).ok())
        };

        Self {
            id: model.id,
            operation: model.operation,
            target_user_id: model.target_user_id,
            performed_by: model.performed_by,
            timestamp: model.timestamp,
            previous_state: parse(model.previous_state),
            new_state: parse(model.new_state),
            reason: model.reason,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAgentRequest {
    pub name: String,
    pub owner_id: String,
    pub project_id: Option<String>,
    #[serde(default)]
    pub budget: f64,
    #[serde(default)]
    pub providers: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct IssueTokenRequest {
    pub name: String,
    pub owner_user_id: Option<String>,
    pub owner_agent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitBudgetRequest {
    pub requester_id: String,
    pub agent_id: String,
    pub amount: f64,
    pub justification: Option<String>,
}
