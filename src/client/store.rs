//! Client-side estimate store.
//!
//! Holds the single most recent unsaved estimate and forwards CRUD to the
//! API. Every remote operation needs a session; without one the call fails
//! with [`ClientError::AuthRequired`] and nothing is sent.

use super::api::{Estimate, EstimateDraft};
use super::{ApiClient, ClientError};
use crate::error::ValidationError;

#[derive(Debug)]
pub struct EstimateStore {
    client: ApiClient,
    last: Option<EstimateDraft>,
}

impl EstimateStore {
    pub fn new(client: ApiClient) -> Self {
        Self { client, last: None }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Remember a freshly computed estimate, replacing the previous one.
    pub fn remember(&mut self, draft: EstimateDraft) {
        self.last = Some(draft);
    }

    pub fn last(&self) -> Option<&EstimateDraft> {
        self.last.as_ref()
    }

    pub fn clear(&mut self) {
        self.last = None;
    }

    fn ensure_session(&self) -> Result<(), ClientError> {
        if self.client.is_authenticated() {
            Ok(())
        } else {
            Err(ClientError::AuthRequired)
        }
    }

    pub async fn save(&self, draft: &EstimateDraft) -> Result<Estimate, ClientError> {
        self.ensure_session()?;
        draft.validate()?;
        let estimate = self.client.save_estimate(draft).await?;
        tracing::info!(estimate_id = estimate.id, "Saved estimate {}", estimate.project_name);
        Ok(estimate)
    }

    /// Save the remembered estimate. It is kept until the save succeeds.
    pub async fn save_last(&mut self) -> Result<Estimate, ClientError> {
        self.ensure_session()?;
        let draft = self
            .last
            .as_ref()
            .ok_or(ValidationError::Missing { field: "estimate" })?;
        let estimate = self.save(draft).await?;
        self.last = None;
        Ok(estimate)
    }

    pub async fn list(&self) -> Result<Vec<Estimate>, ClientError> {
        self.ensure_session()?;
        self.client.list_estimates().await
    }

    pub async fn get(&self, id: i64) -> Result<Estimate, ClientError> {
        self.ensure_session()?;
        self.client.get_estimate(id).await
    }

    pub async fn update(&self, id: i64, draft: &EstimateDraft) -> Result<Estimate, ClientError> {
        self.ensure_session()?;
        draft.validate()?;
        self.client.update_estimate(id, draft).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        self.ensure_session()?;
        self.client.delete_estimate(id).await?;
        tracing::info!(estimate_id = id, "Deleted estimate");
        Ok(())
    }
}
