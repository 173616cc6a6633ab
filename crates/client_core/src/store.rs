//! HTTP client for the bill store backend.

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, RequestBuilder, Response,
};
use serde_json::Value;
use shared::{
    domain::{BillRecord, UploadHandle},
    error::ApiError,
    protocol::StagedAttachmentResponse,
};
use tracing::{info, warn};
use url::Url;

use crate::{BillStore, FinalizeBill, StageAttachment, StoreError};

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

pub struct HttpBillStore {
    http: Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl HttpBillStore {
    pub fn new(api_url: &str) -> Result<Self, url::ParseError> {
        let mut base_url = Url::parse(api_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            bearer_token: None,
        })
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|token| !token.is_empty());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Each segment is percent-encoded as a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                StoreError::Transport(format!("bill store url {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self.authorized(request).send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let error = serde_json::from_str::<ApiError>(&body)
            .ok()
            .filter(|error| !error.message.trim().is_empty())
            .unwrap_or_else(|| ApiError::from_status(status));
        warn!(status, code = ?error.code, message = %error.message, "bill store rejected request");
        Err(StoreError::Rejected(error.message))
    }
}

#[async_trait]
impl BillStore for HttpBillStore {
    async fn list(&self) -> Result<Vec<BillRecord>, StoreError> {
        let url = self.endpoint(&["bills"])?;
        let entries: Vec<Value> = self.send(self.http.get(url)).await?.json().await?;

        let total = entries.len();
        let records: Vec<BillRecord> = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<BillRecord>(entry) {
                Ok(record) => Some(record),
                Err(error) => {
                    warn!(%error, "skipping bill store entry that is not a record");
                    None
                }
            })
            .collect();
        info!(total, decoded = records.len(), "fetched bills");
        Ok(records)
    }

    async fn stage_attachment(
        &self,
        request: StageAttachment,
    ) -> Result<UploadHandle, StoreError> {
        let url = self.endpoint(&["bills"])?;
        let StageAttachment { file, email } = request;
        let mime_type = file.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE);
        let part = Part::bytes(file.bytes)
            .file_name(file.name.clone())
            .mime_str(mime_type)
            .map_err(|e| StoreError::Transport(format!("invalid mime type {mime_type}: {e}")))?;
        let form = Form::new().part("file", part).text("email", email);

        let response: StagedAttachmentResponse = self
            .send(self.http.post(url).multipart(form))
            .await?
            .json()
            .await?;
        let handle = response.into_handle(&file.name);
        info!(key = %handle.key, file_name = %handle.file_name, "staged receipt");
        Ok(handle)
    }

    async fn finalize_record(&self, request: FinalizeBill) -> Result<BillRecord, StoreError> {
        let url = self.endpoint(&["bills", request.key.as_str()])?;
        let record: BillRecord = self
            .send(self.http.patch(url).json(&request.draft))
            .await?
            .json()
            .await?;
        info!(key = %request.key, id = ?record.id, "finalized bill");
        Ok(record)
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
