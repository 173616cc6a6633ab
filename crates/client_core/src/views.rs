//! Plain-text rendering of the bill pages.

use std::fmt::Write as _;

use crate::{
    bills::{BillRow, BillsView},
    new_bill::{Rejection, SubmissionState},
    ProofOverlay,
};

pub const BILLS_TITLE: &str = "Mes notes de frais";
pub const NEW_BILL_BUTTON: &str = "Nouvelle note de frais";
pub const NEW_BILL_TITLE: &str = "Envoyer une note de frais";
pub const PROOF_TITLE: &str = "Justificatif";

const COLUMNS: [&str; 5] = ["Type", "Nom", "Date", "Montant", "Statut"];

pub fn render_bills_page(view: &BillsView) -> String {
    match view {
        BillsView::Error(message) => format!("Erreur\n{message}\n"),
        BillsView::Loaded(rows) => render_bills_table(rows),
    }
}

fn render_bills_table(rows: &[BillRow]) -> String {
    let cells: Vec<[&str; 5]> = rows
        .iter()
        .map(|row| {
            [
                row.expense_type.as_str(),
                row.name.as_str(),
                row.date.display(),
                row.amount.as_str(),
                row.status_label.as_str(),
            ]
        })
        .collect();

    let mut widths = COLUMNS.map(|title| title.chars().count());
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "{BILLS_TITLE}    [{NEW_BILL_BUTTON}]");
    push_line(&mut out, &COLUMNS, &widths);
    for (line, row) in cells.iter().zip(rows) {
        push_line(&mut out, line, &widths);
        if let Some(url) = &row.file_url {
            let _ = writeln!(out, "    {PROOF_TITLE}: {url}");
        }
    }
    out
}

fn push_line(out: &mut String, cells: &[&str; 5], widths: &[usize; 5]) {
    let mut line = String::new();
    for (cell, width) in cells.iter().zip(widths) {
        let padding = width.saturating_sub(cell.chars().count());
        let _ = write!(line, "{cell}{}  ", " ".repeat(padding));
    }
    let _ = writeln!(out, "{}", line.trim_end());
}

pub fn render_new_bill_page(state: &SubmissionState, file_input: Option<&str>) -> String {
    let mut out = format!("{NEW_BILL_TITLE}\n");
    let _ = writeln!(out, "Justificatif: {}", file_input.unwrap_or(""));
    let status = match state {
        SubmissionState::Idle => None,
        SubmissionState::Validating { file_name } => Some(format!("Checking {file_name}...")),
        SubmissionState::Uploading { file_name } => Some(format!("Uploading {file_name}...")),
        SubmissionState::Staged(handle) => Some(format!("Receipt ready: {}", handle.file_name)),
        SubmissionState::Finalizing(_) => Some("Sending...".to_string()),
        SubmissionState::Done(_) => Some("Sent".to_string()),
        SubmissionState::Rejected(Rejection { error, .. }) => Some(format!("Erreur: {error}")),
    };
    if let Some(status) = status {
        let _ = writeln!(out, "{status}");
    }
    out
}

pub fn render_proof(proof: &ProofOverlay) -> String {
    format!(
        "{PROOF_TITLE} ({}px)\n{}\n",
        proof.image_width, proof.file_url
    )
}

#[cfg(test)]
#[path = "tests/views_tests.rs"]
mod tests;
