use std::{cmp::Ordering, sync::Arc};

use shared::domain::{BillId, BillRecord, BillStatus};
use tracing::{error, info, warn};

use crate::{
    format::{format_amount, format_date, format_status, status_badge, BadgeTone, FormattedDate},
    BillStore, Navigator, ProofOverlay, ProofViewer, Route, SessionContext,
};

/// One rendered line of the bill list.
#[derive(Debug, Clone, PartialEq)]
pub struct BillRow {
    pub id: Option<BillId>,
    pub expense_type: String,
    pub name: String,
    pub date: FormattedDate,
    pub amount: String,
    pub status: BillStatus,
    pub status_label: String,
    pub badge: BadgeTone,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
}

impl BillRow {
    pub fn from_record(record: BillRecord) -> Self {
        let date = format_date(&record.date);
        if let FormattedDate::RawFallback { raw } = &date {
            warn!(id = ?record.id, date = %raw, "bill date is not parseable, showing raw value");
        }
        Self {
            id: record.id,
            expense_type: record.expense_type,
            name: record.name,
            date,
            amount: format_amount(record.amount),
            status_label: format_status(&record.status).to_string(),
            badge: status_badge(&record.status),
            status: record.status,
            file_url: record.file_url,
            file_name: record.file_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BillsView {
    Loaded(Vec<BillRow>),
    Error(String),
}

/// Formats every record and orders rows most recent first. Equal dates keep
/// their store order; rows with an unparseable date follow all dated rows.
pub fn build_rows(records: Vec<BillRecord>) -> Vec<BillRow> {
    let mut rows: Vec<BillRow> = records.into_iter().map(BillRow::from_record).collect();
    rows.sort_by(|a, b| match (a.date.date(), b.date.date()) {
        (Some(left), Some(right)) => right.cmp(&left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    rows
}

pub struct BillListController {
    store: Arc<dyn BillStore>,
    navigator: Arc<dyn Navigator>,
    proof_viewer: Arc<dyn ProofViewer>,
    session: Arc<SessionContext>,
    proof_modal_width: u32,
}

impl BillListController {
    pub fn new(
        store: Arc<dyn BillStore>,
        navigator: Arc<dyn Navigator>,
        proof_viewer: Arc<dyn ProofViewer>,
        session: Arc<SessionContext>,
    ) -> Self {
        Self {
            store,
            navigator,
            proof_viewer,
            session,
            proof_modal_width: 800,
        }
    }

    pub fn with_proof_modal_width(mut self, width: u32) -> Self {
        self.proof_modal_width = width;
        self
    }

    pub async fn fetch_and_render(&self) -> BillsView {
        match self.store.list().await {
            Ok(records) => {
                let rows = build_rows(records);
                info!(email = %self.session.email(), rows = rows.len(), "rendering bills");
                BillsView::Loaded(rows)
            }
            Err(err) => {
                error!(email = %self.session.email(), error = %err, "failed to fetch bills");
                BillsView::Error(err.to_string())
            }
        }
    }

    pub fn handle_click_new_bill(&self) {
        self.navigator.navigate(Route::NewBill);
    }

    pub fn handle_click_icon_eye(&self, row: &BillRow) {
        let Some(file_url) = row.file_url.clone() else {
            warn!(id = ?row.id, "bill has no receipt to show");
            return;
        };
        self.proof_viewer.show_proof(ProofOverlay {
            file_url,
            file_name: row.file_name.clone(),
            image_width: self.proof_modal_width / 2,
        });
    }
}

#[cfg(test)]
#[path = "tests/bills_tests.rs"]
mod tests;
