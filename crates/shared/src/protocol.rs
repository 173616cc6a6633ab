use serde::{Deserialize, Serialize};

use crate::domain::UploadHandle;

/// Response of the attachment staging call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedAttachmentResponse {
    pub file_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub key: String,
}

impl StagedAttachmentResponse {
    /// Older stores do not echo the file name back; the name of the uploaded
    /// file is used in that case.
    pub fn into_handle(self, uploaded_name: &str) -> UploadHandle {
        UploadHandle {
            file_url: self.file_url,
            file_name: self
                .file_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| uploaded_name.to_string()),
            key: self.key,
        }
    }
}
