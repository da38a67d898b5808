//! Forms resource: CRUD, submissions and statistics.
//!
//! Responses arrive in the `{ success, data, message, errors }` envelope;
//! [`unwrap_envelope`] turns `success: false` into [`ApiError::Rejected`].

#[cfg(test)]
#[path = "forms_test.rs"]
mod forms_test;

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::HttpClient;
use crate::types::{Envelope, FieldError, Form, FormInput, FormStatistics, SubmissionPage};

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Render field errors as `"field: message, field: message"`.
#[must_use]
pub fn validation_message(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Unwrap an envelope, requiring `data` on success.
///
/// # Errors
///
/// Returns [`ApiError::Rejected`] for `success: false`, or
/// [`ApiError::Decode`] when a successful envelope carries no data.
pub fn unwrap_envelope<T>(envelope: Envelope<T>) -> Result<T, ApiError> {
    if !envelope.success {
        return Err(ApiError::Rejected { message: envelope.message, errors: envelope.errors });
    }
    envelope
        .data
        .ok_or_else(|| ApiError::Decode("envelope missing data".to_owned()))
}

fn form_path(id: &str) -> String {
    format!("/api/forms/{}", urlencoding::encode(id))
}

fn submissions_path(id: &str, page: u32, limit: u32) -> String {
    let page = page.max(1);
    let limit = limit.clamp(1, MAX_PAGE_LIMIT);
    format!("{}/submissions?page={page}&limit={limit}", form_path(id))
}

/// Typed wrapper over the `/api/forms` endpoints.
#[derive(Clone)]
pub struct FormsApi {
    http: HttpClient,
}

impl FormsApi {
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        unwrap_envelope(self.http.get::<Envelope<T>>(path).await?)
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the request or envelope.
    pub async fn list(&self) -> Result<Vec<Form>, ApiError> {
        self.get_data("/api/forms").await
    }

    /// # Errors
    ///
    /// Any [`ApiError`]; validation failures come back as
    /// [`ApiError::Rejected`] or [`ApiError::Status`] with field errors.
    pub async fn create(&self, input: &FormInput) -> Result<Form, ApiError> {
        let envelope = self.http.post::<_, Envelope<Form>>("/api/forms", input).await?;
        unwrap_envelope(envelope)
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the request or envelope.
    pub async fn get(&self, id: &str) -> Result<Form, ApiError> {
        self.get_data(&form_path(id)).await
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the request or envelope.
    pub async fn update(&self, id: &str, input: &FormInput) -> Result<Form, ApiError> {
        let envelope = self.http.put::<_, Envelope<Form>>(&form_path(id), input).await?;
        unwrap_envelope(envelope)
    }

    /// Delete a form. An empty 2xx body counts as success.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the request or a `success: false` envelope.
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let envelope = self.http.delete::<Option<Envelope<serde_json::Value>>>(&form_path(id)).await?;
        match envelope {
            Some(envelope) if !envelope.success => {
                Err(ApiError::Rejected { message: envelope.message, errors: envelope.errors })
            }
            _ => Ok(()),
        }
    }

    /// One page of submissions; `page` is 1-based, `limit` clamped to 1..=100.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the request or envelope.
    pub async fn submissions(&self, id: &str, page: u32, limit: u32) -> Result<SubmissionPage, ApiError> {
        self.get_data(&submissions_path(id, page, limit)).await
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the request or envelope.
    pub async fn statistics(&self, id: &str) -> Result<FormStatistics, ApiError> {
        self.get_data(&format!("{}/statistics", form_path(id))).await
    }
}
