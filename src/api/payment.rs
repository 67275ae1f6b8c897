use serde::Serialize;
use serde_json::Value;

use super::{segment, ApiClient};
use crate::errors::ApiError;
use crate::models::{HostPayment, Role, UpgradeRequest};
use crate::normalize::normalize_one;

/// Body of `POST /api/payment/upgrade`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateUpgradeRequest {
    target_role_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_url: Option<String>,
}

impl ApiClient {
    /// GET /api/payment/host/{hostId}
    pub async fn host_payment(&self, host_id: &str) -> Result<HostPayment, ApiError> {
        let raw: Value = self
            .get(&format!("/api/payment/host/{}", segment(host_id)), &[])
            .await?;
        Ok(normalize_one(&raw))
    }

    /// POST /api/payment/upgrade
    ///
    /// Opens a role-upgrade request for the signed-in user. The answer may
    /// carry a checkout URL; the payment itself happens outside this crate.
    pub async fn request_upgrade(&self, target: Role, return_url: Option<String>) -> Result<UpgradeRequest, ApiError> {
        let body = CreateUpgradeRequest {
            target_role_id: target.id(),
            return_url,
        };
        let raw: Value = self.post("/api/payment/upgrade", &body).await?;
        Ok(normalize_one(&raw))
    }

    /// GET /api/payment/upgrade/{requestId}
    pub async fn upgrade_status(&self, request_id: &str) -> Result<UpgradeRequest, ApiError> {
        let raw: Value = self
            .get(&format!("/api/payment/upgrade/{}", segment(request_id)), &[])
            .await?;
        Ok(normalize_one(&raw))
    }
}
