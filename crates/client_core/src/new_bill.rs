use std::sync::Arc;

use shared::domain::{BillDraft, BillRecord, BillStatus, UploadHandle};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::{
    format::{is_allowed_receipt, parse_bill_date},
    BillStore, FinalizeBill, Navigator, Route, SelectedFile, SessionContext, StageAttachment,
    SubmissionError, ValidationError,
};

const DEFAULT_PCT: i32 = 20;

/// Raw values of the new bill form, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBillForm {
    pub expense_type: String,
    pub name: String,
    pub amount: String,
    pub date: String,
    pub vat: String,
    pub pct: String,
    pub commentary: String,
}

impl NewBillForm {
    /// `pct` keeps the leading integer of the typed value (`"12.5"` gives 12,
    /// `"-5"` gives -5) and falls back to 20 when there is none or it is zero.
    pub fn to_draft(
        &self,
        handle: &UploadHandle,
        session: &SessionContext,
    ) -> Result<BillDraft, ValidationError> {
        let amount = self
            .amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|amount| amount.is_finite())
            .ok_or_else(|| ValidationError::InvalidAmount {
                raw: self.amount.clone(),
            })?;
        let date = self.date.trim();
        if parse_bill_date(date).is_none() {
            return Err(ValidationError::InvalidDate {
                raw: self.date.clone(),
            });
        }
        let pct = leading_integer(&self.pct)
            .filter(|pct| *pct != 0)
            .unwrap_or(DEFAULT_PCT);

        Ok(BillDraft {
            email: session.email().to_string(),
            expense_type: self.expense_type.clone(),
            name: self.name.clone(),
            amount,
            date: date.to_string(),
            vat: self.vat.clone(),
            pct,
            commentary: self.commentary.clone(),
            file_url: handle.file_url.clone(),
            file_name: handle.file_name.clone(),
            status: BillStatus::Pending,
        })
    }
}

fn leading_integer(raw: &str) -> Option<i32> {
    let raw = raw.trim_start();
    let sign_len = usize::from(raw.starts_with(&['-', '+'][..]));
    let digits = raw[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len() - sign_len);
    if digits == 0 {
        return None;
    }
    raw[..sign_len + digits].parse().ok()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub error: SubmissionError,
    /// Kept when finalizing failed so the same draft can be sent again.
    pub handle: Option<UploadHandle>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    Idle,
    Validating { file_name: String },
    Uploading { file_name: String },
    Staged(UploadHandle),
    Finalizing(UploadHandle),
    Done(BillRecord),
    Rejected(Rejection),
}

struct SubmissionInner {
    state: SubmissionState,
    file_input: Option<String>,
    form: Option<NewBillForm>,
}

/// Drives a single bill from receipt selection to the finalized record.
///
/// The receipt is staged as soon as it is selected; the bill itself is only
/// finalized on submit, using the key of the staged receipt. The state lock is
/// never held across a store call.
pub struct BillSubmissionController {
    store: Arc<dyn BillStore>,
    navigator: Arc<dyn Navigator>,
    session: Arc<SessionContext>,
    inner: Mutex<SubmissionInner>,
}

impl BillSubmissionController {
    pub fn new(
        store: Arc<dyn BillStore>,
        navigator: Arc<dyn Navigator>,
        session: Arc<SessionContext>,
    ) -> Self {
        Self {
            store,
            navigator,
            session,
            inner: Mutex::new(SubmissionInner {
                state: SubmissionState::Idle,
                file_input: None,
                form: None,
            }),
        }
    }

    pub async fn state(&self) -> SubmissionState {
        self.inner.lock().await.state.clone()
    }

    /// Name shown in the file input; cleared when the file was refused.
    pub async fn file_input(&self) -> Option<String> {
        self.inner.lock().await.file_input.clone()
    }

    /// Form values of the last submit that did not go through.
    pub async fn retained_form(&self) -> Option<NewBillForm> {
        self.inner.lock().await.form.clone()
    }

    pub async fn handle_change_file(
        &self,
        file: SelectedFile,
    ) -> Result<UploadHandle, SubmissionError> {
        let file_name = file.name.clone();
        {
            let mut inner = self.inner.lock().await;
            match inner.state {
                SubmissionState::Uploading { .. } => return Err(SubmissionError::UploadInFlight),
                SubmissionState::Finalizing(_) => return Err(SubmissionError::FinalizeInFlight),
                _ => {}
            }

            inner.file_input = Some(file_name.clone());
            inner.state = SubmissionState::Validating {
                file_name: file_name.clone(),
            };

            if !is_allowed_receipt(&file_name) {
                let err = SubmissionError::from(ValidationError::UnsupportedExtension {
                    file_name: file_name.clone(),
                });
                warn!(file_name = %file_name, "refused receipt format");
                inner.file_input = None;
                inner.state = SubmissionState::Rejected(Rejection {
                    error: err.clone(),
                    handle: None,
                });
                return Err(err);
            }

            inner.state = SubmissionState::Uploading {
                file_name: file_name.clone(),
            };
        }

        let result = self
            .store
            .stage_attachment(StageAttachment {
                file,
                email: self.session.email().to_string(),
            })
            .await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(handle) => {
                info!(key = %handle.key, file_name = %handle.file_name, "receipt staged");
                inner.state = SubmissionState::Staged(handle.clone());
                Ok(handle)
            }
            Err(err) => {
                error!(file_name = %file_name, error = %err, "receipt upload failed");
                let err = SubmissionError::from(err);
                inner.file_input = None;
                inner.state = SubmissionState::Rejected(Rejection {
                    error: err.clone(),
                    handle: None,
                });
                Err(err)
            }
        }
    }

    pub async fn handle_submit(&self, form: NewBillForm) -> Result<BillRecord, SubmissionError> {
        let (handle, draft) = {
            let mut inner = self.inner.lock().await;
            let handle = match &inner.state {
                SubmissionState::Staged(handle) => handle.clone(),
                SubmissionState::Rejected(Rejection {
                    handle: Some(handle),
                    ..
                }) => handle.clone(),
                SubmissionState::Finalizing(_) => {
                    warn!("submit ignored, bill is already being sent");
                    return Err(SubmissionError::FinalizeInFlight);
                }
                _ => {
                    warn!("submit ignored, no receipt staged");
                    return Err(ValidationError::NothingStaged.into());
                }
            };

            let draft = form.to_draft(&handle, &self.session);
            inner.form = Some(form);
            match draft {
                Ok(draft) => {
                    inner.state = SubmissionState::Finalizing(handle.clone());
                    (handle, draft)
                }
                Err(err) => {
                    warn!(error = %err, "bill form is invalid");
                    let err = SubmissionError::from(err);
                    inner.state = SubmissionState::Rejected(Rejection {
                        error: err.clone(),
                        handle: Some(handle),
                    });
                    return Err(err);
                }
            }
        };

        let result = self
            .store
            .finalize_record(FinalizeBill {
                key: handle.key.clone(),
                draft,
            })
            .await;

        let record = {
            let mut inner = self.inner.lock().await;
            match result {
                Ok(record) => {
                    inner.state = SubmissionState::Done(record.clone());
                    inner.form = None;
                    inner.file_input = None;
                    record
                }
                Err(err) => {
                    error!(key = %handle.key, error = %err, "failed to finalize bill");
                    let err = SubmissionError::from(err);
                    inner.state = SubmissionState::Rejected(Rejection {
                        error: err.clone(),
                        handle: Some(handle),
                    });
                    return Err(err);
                }
            }
        };

        info!(id = ?record.id, "bill sent");
        self.navigator.navigate(Route::Bills);
        Ok(record)
    }
}

#[cfg(test)]
#[path = "tests/new_bill_tests.rs"]
mod tests;
