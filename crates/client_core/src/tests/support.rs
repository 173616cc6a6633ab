//! In-memory collaborators shared by the controller tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use shared::domain::{BillId, BillRecord, BillStatus, UploadHandle};
use tokio::sync::Notify;

use crate::{
    BillStore, FinalizeBill, Navigator, ProofOverlay, ProofViewer, Route, SessionContext,
    StageAttachment, StoreError,
};

pub(crate) const STAGED_FILE_URL: &str = "https://localhost:3456/images/test.jpg";
pub(crate) const STAGED_KEY: &str = "1234";
pub(crate) const FINALIZED_ID: &str = "47qAXb6fIm2zOKkLzMro";

#[derive(Default)]
pub(crate) struct MockBillStore {
    records: Vec<BillRecord>,
    list_error: Option<StoreError>,
    stage_error: Option<StoreError>,
    finalize_error: Mutex<Option<StoreError>>,
    finalize_gate: Option<Arc<Notify>>,
    pub list_calls: AtomicUsize,
    pub stage_calls: AtomicUsize,
    pub finalize_calls: AtomicUsize,
    pub staged: Mutex<Vec<StageAttachment>>,
    pub finalized: Mutex<Vec<FinalizeBill>>,
}

impl MockBillStore {
    pub fn with_records(records: Vec<BillRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn failing_list(message: &str) -> Self {
        Self {
            list_error: Some(StoreError::Rejected(message.to_string())),
            ..Self::default()
        }
    }

    pub fn failing_stage(message: &str) -> Self {
        Self {
            stage_error: Some(StoreError::Rejected(message.to_string())),
            ..Self::default()
        }
    }

    /// Fails the next finalize call only.
    pub fn failing_finalize_once(message: &str) -> Self {
        Self {
            finalize_error: Mutex::new(Some(StoreError::Rejected(message.to_string()))),
            ..Self::default()
        }
    }

    /// Finalize calls wait until the returned gate is notified.
    pub fn gated_finalize() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (
            Self {
                finalize_gate: Some(gate.clone()),
                ..Self::default()
            },
            gate,
        )
    }

    pub fn calls(&self) -> (usize, usize, usize) {
        (
            self.list_calls.load(Ordering::SeqCst),
            self.stage_calls.load(Ordering::SeqCst),
            self.finalize_calls.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl BillStore for MockBillStore {
    async fn list(&self) -> Result<Vec<BillRecord>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        match &self.list_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.records.clone()),
        }
    }

    async fn stage_attachment(
        &self,
        request: StageAttachment,
    ) -> Result<UploadHandle, StoreError> {
        self.stage_calls.fetch_add(1, Ordering::SeqCst);
        let file_name = request.file.name.clone();
        self.staged.lock().expect("staged").push(request);
        if let Some(err) = &self.stage_error {
            return Err(err.clone());
        }
        Ok(UploadHandle {
            file_url: STAGED_FILE_URL.to_string(),
            file_name,
            key: STAGED_KEY.to_string(),
        })
    }

    async fn finalize_record(&self, request: FinalizeBill) -> Result<BillRecord, StoreError> {
        self.finalize_calls.fetch_add(1, Ordering::SeqCst);
        self.finalized.lock().expect("finalized").push(request.clone());
        if let Some(gate) = &self.finalize_gate {
            gate.notified().await;
        }
        if let Some(err) = self.finalize_error.lock().expect("finalize error").take() {
            return Err(err);
        }
        Ok(request.draft.into_record(BillId(FINALIZED_ID.to_string())))
    }
}

#[derive(Default)]
pub(crate) struct RecordingNavigator {
    pub routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().expect("routes").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().expect("routes").push(route);
    }
}

#[derive(Default)]
pub(crate) struct RecordingProofViewer {
    pub shown: Mutex<Vec<ProofOverlay>>,
}

impl RecordingProofViewer {
    pub fn shown(&self) -> Vec<ProofOverlay> {
        self.shown.lock().expect("shown").clone()
    }
}

impl ProofViewer for RecordingProofViewer {
    fn show_proof(&self, proof: ProofOverlay) {
        self.shown.lock().expect("shown").push(proof);
    }
}

pub(crate) fn employee_session() -> Arc<SessionContext> {
    Arc::new(SessionContext::employee("a@a"))
}

pub(crate) fn bill(id: &str, date: &str, amount: Option<f64>, status: BillStatus) -> BillRecord {
    BillRecord {
        id: Some(BillId(id.to_string())),
        email: "a@a".to_string(),
        expense_type: "Transports".to_string(),
        name: format!("bill {id}"),
        amount,
        date: date.to_string(),
        vat: "20".to_string(),
        pct: Some(20.0),
        commentary: String::new(),
        status,
        file_url: Some(format!("https://test.storage.tld/{id}.jpg")),
        file_name: Some(format!("{id}.jpg")),
        comment_admin: None,
    }
}

/// The four bills the store returns for the `a@a` employee.
pub(crate) fn fixture_bills() -> Vec<BillRecord> {
    let mut hotel = bill("47qAXb6fIm2zOKkLzMro", "2004-04-04", Some(400.0), BillStatus::Pending);
    hotel.expense_type = "Hôtel et logement".to_string();
    hotel.name = "encore".to_string();
    hotel.commentary = "séminaire billed".to_string();
    hotel.vat = "80".to_string();
    hotel.file_name = Some("preview-facture-free-201801-pdf-1.jpg".to_string());

    let mut transport = bill("BeKy5Mo4jkmdfPGYpTxZ", "2001-01-01", Some(100.0), BillStatus::Refused);
    transport.name = "test1".to_string();
    transport.vat = String::new();
    transport.comment_admin = Some("en fait non".to_string());

    let mut online = bill("UIUZtnPQvnbFnB0ozvJh", "2003-03-03", Some(300.0), BillStatus::Accepted);
    online.expense_type = "Services en ligne".to_string();
    online.name = "test3".to_string();
    online.vat = "60".to_string();

    let mut restaurant = bill("qcCK3SzECmaZAGRrHjaC", "2002-02-02", Some(200.0), BillStatus::Refused);
    restaurant.expense_type = "Restaurants et bars".to_string();
    restaurant.name = "test2".to_string();
    restaurant.vat = "40".to_string();

    vec![hotel, transport, online, restaurant]
}
