//! HTTP client for the sitecost API.
//!
//! [`ApiClient`] wraps every `/api` route. Authenticated calls short-circuit
//! with [`ClientError::AuthRequired`] when no session token is held, before
//! any request is sent. Failed responses surface the server's `error`
//! message verbatim.

pub mod api;
mod session;
mod store;

use reqwest::{Client, Method};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use session::{
    AUTH_TOKEN_KEY, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, SessionManager, THEME_KEY, Theme,
    USER_KEY, default_session_path,
};
pub use store::EstimateStore;

use crate::chat::ChatReply;
use crate::error::ValidationError;
use crate::estimation::{
    BrickEstimate, ConstructionCost, DetailedBreakdown, PaintEstimate, RawMaterialEstimate, ReadyMixEstimate,
    SlabEstimate,
};
use crate::pricing::catalog::{ConsumptionRatio, LaborRate, MaterialPatch, MaterialPrice, NewLaborRate, NewMaterial};
use api::{
    AuthResponse, BrickRequest, ChangePasswordRequest, ChatRequest, ConcreteSlabRequest, ConsumptionRatiosResponse,
    ConstructionCostRequest, CreatedLaborResponse, CreatedMaterialResponse, DetailedRequest, ErrorResponse, Estimate,
    EstimateDraft, EstimateListResponse, EstimateResponse, HealthResponse, LaborRatesResponse, LoginRequest,
    MaterialResponse, MaterialsResponse, MessageResponse, PaintRequest, ProfileResponse, RawMaterialRequest,
    ReadyMixRequest, RegisterRequest, SavedEstimateResponse, UserProfile,
};

const GENERIC_ERROR: &str = "An error occurred";

/// Client-side errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Please log in first")]
    AuthRequired,

    #[error("{0}")]
    NotFound(String),

    /// Transport failure (`status` is `None`) or a non-2xx response.
    #[error("{message}")]
    Network { status: Option<u16>, message: String },

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("Session storage error: {0}")]
    Storage(String),
}

/// Client for the REST API.
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: SessionManager,
}

impl ApiClient {
    /// `base_url` includes the `/api` prefix, e.g. `http://localhost:5000/api`.
    pub fn new(base_url: impl Into<String>, session: SessionManager) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and decode the JSON reply.
    async fn request<B, R>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
        requires_auth: bool,
    ) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let token = if requires_auth {
            Some(self.session.token().ok_or(ClientError::AuthRequired)?)
        } else {
            None
        };

        let url = self.url(path);
        tracing::debug!("{} {}", method, url);

        let mut builder = self.http.request(method, &url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(token) = &token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::debug!("Request to {} failed: {}", url, e);
            ClientError::Network {
                status: None,
                message: format!("Could not reach the server: {}", e),
            }
        })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| GENERIC_ERROR.to_string());
            return Err(if status == reqwest::StatusCode::NOT_FOUND {
                ClientError::NotFound(message)
            } else {
                ClientError::Network {
                    status: Some(status.as_u16()),
                    message,
                }
            });
        }

        serde_json::from_str(&text).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    async fn get<R: DeserializeOwned>(&self, path: &str, requires_auth: bool) -> Result<R, ClientError> {
        self.request::<(), R>(Method::GET, path, &[], None, requires_auth).await
    }

    async fn post<B, R>(&self, path: &str, body: &B, requires_auth: bool) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.request(Method::POST, path, &[], Some(body), requires_auth)
            .await
    }

    // ==================== Auth ====================

    /// Create an account and start a session for it.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<UserProfile, ClientError> {
        let req = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: AuthResponse = self.post("auth/register", &req, false).await?;
        self.session.begin(&resp.access_token, &resp.user)?;
        Ok(resp.user)
    }

    /// `username` may be the account's email.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile, ClientError> {
        let req = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let resp: AuthResponse = self.post("auth/login", &req, false).await?;
        self.session.begin(&resp.access_token, &resp.user)?;
        Ok(resp.user)
    }

    /// Drop the local session. The server keeps no logout state.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.session.end()
    }

    pub async fn profile(&self) -> Result<UserProfile, ClientError> {
        let resp: ProfileResponse = self.get("auth/profile", true).await?;
        Ok(resp.user)
    }

    pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<String, ClientError> {
        let req = ChangePasswordRequest {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        let resp: MessageResponse = self.post("auth/change-password", &req, true).await?;
        Ok(resp.message)
    }

    // ==================== Pricing ====================

    pub async fn materials(&self, quality: Option<&str>) -> Result<Vec<MaterialPrice>, ClientError> {
        let query: Vec<(&str, &str)> = quality.map(|q| ("quality", q)).into_iter().collect();
        let resp: MaterialsResponse = self
            .request::<(), _>(Method::GET, "pricing/materials", &query, None, false)
            .await?;
        Ok(resp.materials)
    }

    pub async fn material(&self, id: i64) -> Result<MaterialPrice, ClientError> {
        let resp: MaterialResponse = self.get(&format!("pricing/materials/{}", id), false).await?;
        Ok(resp.material)
    }

    pub async fn add_material(&self, material: &NewMaterial) -> Result<i64, ClientError> {
        let resp: CreatedMaterialResponse = self.post("pricing/materials", material, true).await?;
        Ok(resp.material_id)
    }

    pub async fn update_material(&self, id: i64, patch: &MaterialPatch) -> Result<String, ClientError> {
        if patch.is_empty() {
            return Err(ValidationError::Missing { field: "material" }.into());
        }
        let resp: MessageResponse = self
            .request(
                Method::PUT,
                &format!("pricing/materials/{}", id),
                &[],
                Some(patch),
                true,
            )
            .await?;
        Ok(resp.message)
    }

    pub async fn labor_rates(&self) -> Result<Vec<LaborRate>, ClientError> {
        let resp: LaborRatesResponse = self.get("pricing/labor", false).await?;
        Ok(resp.labor_rates)
    }

    pub async fn add_labor_rate(&self, rate: &NewLaborRate) -> Result<i64, ClientError> {
        let resp: CreatedLaborResponse = self.post("pricing/labor", rate, true).await?;
        Ok(resp.labor_id)
    }

    pub async fn consumption_ratios(&self, category: Option<&str>) -> Result<Vec<ConsumptionRatio>, ClientError> {
        let query: Vec<(&str, &str)> = category.map(|c| ("category", c)).into_iter().collect();
        let resp: ConsumptionRatiosResponse = self
            .request::<(), _>(Method::GET, "pricing/consumption-ratios", &query, None, false)
            .await?;
        Ok(resp.consumption_ratios)
    }

    // ==================== Calculators ====================

    pub async fn construction_cost(&self, req: &ConstructionCostRequest) -> Result<ConstructionCost, ClientError> {
        self.post("calculators/construction-cost", req, false).await
    }

    pub async fn concrete_slab(&self, req: &ConcreteSlabRequest) -> Result<SlabEstimate, ClientError> {
        self.post("calculators/concrete-slab", req, false).await
    }

    pub async fn paint(&self, req: &PaintRequest) -> Result<PaintEstimate, ClientError> {
        self.post("calculators/paint", req, false).await
    }

    pub async fn bricks(&self, req: &BrickRequest) -> Result<BrickEstimate, ClientError> {
        self.post("calculators/bricks", req, false).await
    }

    pub async fn raw_materials(&self, req: &RawMaterialRequest) -> Result<RawMaterialEstimate, ClientError> {
        self.post("calculators/raw-materials", req, false).await
    }

    pub async fn ready_mix(&self, req: &ReadyMixRequest) -> Result<ReadyMixEstimate, ClientError> {
        self.post("calculators/ready-mix", req, false).await
    }

    pub async fn detailed(&self, req: &DetailedRequest) -> Result<DetailedBreakdown, ClientError> {
        self.post("calculators/detailed", req, false).await
    }

    pub async fn chat(&self, message: &str) -> Result<ChatReply, ClientError> {
        let req = ChatRequest {
            message: message.to_string(),
        };
        self.post("chat", &req, false).await
    }

    // ==================== Estimates ====================

    pub async fn save_estimate(&self, draft: &EstimateDraft) -> Result<Estimate, ClientError> {
        let resp: SavedEstimateResponse = self.post("estimates", draft, true).await?;
        Ok(resp.estimate)
    }

    pub async fn list_estimates(&self) -> Result<Vec<Estimate>, ClientError> {
        let resp: EstimateListResponse = self.get("estimates", true).await?;
        Ok(resp.estimates)
    }

    pub async fn get_estimate(&self, id: i64) -> Result<Estimate, ClientError> {
        let resp: EstimateResponse = self.get(&format!("estimates/{}", id), true).await?;
        Ok(resp.estimate)
    }

    pub async fn update_estimate(&self, id: i64, draft: &EstimateDraft) -> Result<Estimate, ClientError> {
        let resp: EstimateResponse = self
            .request(Method::PUT, &format!("estimates/{}", id), &[], Some(draft), true)
            .await?;
        Ok(resp.estimate)
    }

    pub async fn delete_estimate(&self, id: i64) -> Result<String, ClientError> {
        let resp: MessageResponse = self
            .request::<(), _>(Method::DELETE, &format!("estimates/{}", id), &[], None, true)
            .await?;
        Ok(resp.message)
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.get("health", false).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        // Nothing listens here; auth checks must fail before any connection.
        ApiClient::new("http://127.0.0.1:9/api/", SessionManager::in_memory())
    }

    #[test]
    fn test_url_joining() {
        let client = client();
        assert_eq!(client.base_url(), "http://127.0.0.1:9/api");
        assert_eq!(client.url("/estimates/4"), "http://127.0.0.1:9/api/estimates/4");
        assert_eq!(client.url("health"), "http://127.0.0.1:9/api/health");
    }

    #[tokio::test]
    async fn test_auth_required_without_session() {
        let client = client();
        assert!(matches!(client.list_estimates().await, Err(ClientError::AuthRequired)));
        assert!(matches!(client.get_estimate(1).await, Err(ClientError::AuthRequired)));
        assert!(matches!(client.delete_estimate(1).await, Err(ClientError::AuthRequired)));
        assert!(matches!(client.profile().await, Err(ClientError::AuthRequired)));
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let client = client();
        match client.health().await {
            Err(ClientError::Network { status: None, .. }) => {}
            other => panic!("expected a transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_material_patch_rejected_locally() {
        let client = client();
        assert!(matches!(
            client.update_material(1, &MaterialPatch::default()).await,
            Err(ClientError::Validation(_))
        ));
    }
}
