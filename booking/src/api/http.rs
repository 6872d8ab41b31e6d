//! `reqwest` implementation of [`TicketsApi`].

use super::{ApiFuture, TicketsApi};
use crate::error::ApiError;
use crate::messages::endpoints;
use crate::types::{ApiEnvelope, BookingRequest, BookingResult, TicketTier};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

/// HTTP client for the booking backend
#[derive(Clone, Debug)]
pub struct HttpTicketsApi {
    client: Client,
    base_url: String,
}

impl HttpTicketsApi {
    /// Create a client for the backend at `base_url` (no trailing slash needed)
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The backend base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        tracing::debug!(path, "GET");

        let response = self.client.get(self.url(path)).send().await.map_err(|e| {
            tracing::error!(path, error = %e, "API request error");
            ApiError::Transport(e.to_string())
        })?;

        Self::read_envelope(path, response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!(path, "POST");

        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(path, error = %e, "API request error");
                ApiError::Transport(e.to_string())
            })?;

        Self::read_envelope(path, response).await
    }

    /// Unwrap `{ success, data, error }`, turning error bodies into [`ApiError::Backend`]
    async fn read_envelope<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            // A non-JSON error body still counts as a backend error, just without payload
            let payload = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.error);

            tracing::error!(path, status = status.as_u16(), body = %body, "API response error");
            return Err(ApiError::Backend {
                http_status: status.as_u16(),
                payload,
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(path, error = %e, "Unexpected response body");
            ApiError::Decode(e.to_string())
        })?;

        match envelope {
            ApiEnvelope {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            ApiEnvelope { success: true, data: None, .. } => {
                Err(ApiError::Decode("missing `data` in successful response".to_string()))
            },
            ApiEnvelope { error, .. } => {
                tracing::error!(path, status = status.as_u16(), "API reported failure");
                Err(ApiError::Backend {
                    http_status: status.as_u16(),
                    payload: error,
                })
            },
        }
    }
}

impl TicketsApi for HttpTicketsApi {
    fn fetch_tickets(&self) -> ApiFuture<'_, Vec<TicketTier>> {
        Box::pin(async move {
            let tiers = self.get(endpoints::TICKETS).await.map_err(|e| {
                tracing::warn!(error = %e, "Failed to fetch tickets");
                e
            })?;
            Ok(tiers)
        })
    }

    fn book_tickets(&self, request: BookingRequest) -> ApiFuture<'_, BookingResult> {
        Box::pin(async move {
            self.post(endpoints::BOOK_TICKETS, &request).await.map_err(|e| {
                tracing::warn!(tier = %request.tier, error = %e, "Failed to book tickets");
                e
            })
        })
    }
}
