use async_trait::async_trait;
use shared::domain::{BillDraft, BillRecord, UploadHandle};

pub mod bills;
pub mod error;
pub mod format;
pub mod new_bill;
pub mod session;
pub mod store;
pub mod views;

pub use bills::{BillListController, BillRow, BillsView};
pub use error::{StoreError, SubmissionError, ValidationError};
pub use new_bill::{BillSubmissionController, NewBillForm, Rejection, SubmissionState};
pub use session::{FileStorage, KeyValueStorage, SessionContext, SessionError};
pub use store::HttpBillStore;

/// Receipt file picked by the user, before any validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Payload of the attachment staging call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageAttachment {
    pub file: SelectedFile,
    pub email: String,
}

/// Payload of the record finalization call. `key` comes from the
/// [`UploadHandle`] returned by the staging call.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizeBill {
    pub key: String,
    pub draft: BillDraft,
}

/// Access to the remote bill collection.
///
/// `stage_attachment` uploads the receipt and yields a handle before the bill
/// exists; `finalize_record` completes the bill identified by that handle.
/// Callers must not finalize before staging succeeded.
#[async_trait]
pub trait BillStore: Send + Sync {
    async fn list(&self) -> Result<Vec<BillRecord>, StoreError>;
    async fn stage_attachment(&self, request: StageAttachment)
        -> Result<UploadHandle, StoreError>;
    async fn finalize_record(&self, request: FinalizeBill) -> Result<BillRecord, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Bills,
    NewBill,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/",
            Self::Bills => "#employee/bills",
            Self::NewBill => "#employee/bill/new",
        }
    }
}

/// Swaps the rendered view. Called by the controllers, never by the store.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofOverlay {
    pub file_url: String,
    pub file_name: Option<String>,
    pub image_width: u32,
}

/// Displays a receipt image over the current view.
pub trait ProofViewer: Send + Sync {
    fn show_proof(&self, proof: ProofOverlay);
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
