use serde_json::Value;

use super::ApiClient;
use crate::errors::ApiError;
use crate::models::UserProfile;
use crate::normalize::normalize_one;

impl ApiClient {
    /// GET /api/users/me: the signed-in user's profile, including the
    /// role and active flag the polls watch.
    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        let raw: Value = self.get("/api/users/me", &[]).await?;
        Ok(normalize_one(&raw))
    }
}
