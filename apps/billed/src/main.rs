mod config;
mod terminal;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    session::TOKEN_KEY,
    views::{render_bills_page, render_new_bill_page},
    BillListController, BillStore, BillSubmissionController, BillsView, FileStorage,
    HttpBillStore, KeyValueStorage, NewBillForm, Route, SelectedFile, SessionContext,
};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{load_settings, Settings},
    terminal::{TerminalNavigator, TerminalProofViewer},
};

#[derive(Parser, Debug)]
#[command(name = "billed", about = "Employee expense reports")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store the signed-in employee in local storage.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        token: Option<String>,
    },
    /// List the bills, most recent first.
    Bills,
    /// Show the receipt of one bill.
    Proof { id: String },
    /// Upload a receipt and send a new bill.
    NewBill {
        #[arg(long)]
        file: PathBuf,
        #[arg(long = "type")]
        expense_type: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        date: String,
        #[arg(long, default_value = "")]
        vat: String,
        #[arg(long, default_value = "")]
        pct: String,
        #[arg(long, default_value = "")]
        commentary: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let args = Args::parse();
    let settings = load_settings();
    let storage = FileStorage::new(&settings.storage_path);

    match args.command {
        Command::Login { email, token } => {
            SessionContext::employee(email.as_str())
                .store(&storage)
                .context("failed to save session")?;
            if let Some(token) = token {
                storage
                    .set_item(TOKEN_KEY, &token)
                    .context("failed to save token")?;
            }
            println!("Signed in as {email}");
        }
        Command::Bills => {
            let app = App::open(&settings, &storage)?;
            print!("{}", render_bills_page(&app.bills().fetch_and_render().await));
        }
        Command::Proof { id } => {
            let app = App::open(&settings, &storage)?;
            let bills = app.bills();
            let view = bills.fetch_and_render().await;
            let BillsView::Loaded(rows) = &view else {
                print!("{}", render_bills_page(&view));
                return Ok(());
            };
            let row = rows
                .iter()
                .find(|row| row.id.as_ref().is_some_and(|bill_id| bill_id.0 == id))
                .ok_or_else(|| anyhow!("no bill with id {id}"))?;
            bills.handle_click_icon_eye(row);
        }
        Command::NewBill {
            file,
            expense_type,
            name,
            amount,
            date,
            vat,
            pct,
            commentary,
        } => {
            let app = App::open(&settings, &storage)?;
            let selected = read_selected_file(&file).await?;
            let form = NewBillForm {
                expense_type,
                name,
                amount,
                date,
                vat,
                pct,
                commentary,
            };

            let submission = BillSubmissionController::new(
                app.store.clone(),
                app.navigator.clone(),
                app.session.clone(),
            );
            let outcome = match submission.handle_change_file(selected).await {
                Ok(_) => submission.handle_submit(form).await.map(|_| ()),
                Err(err) => Err(err),
            };
            let file_input = submission.file_input().await;
            print!(
                "{}",
                render_new_bill_page(&submission.state().await, file_input.as_deref())
            );
            outcome?;

            if app.navigator.current() == Some(Route::Bills) {
                print!("{}", render_bills_page(&app.bills().fetch_and_render().await));
            }
        }
    }

    Ok(())
}

struct App {
    store: Arc<dyn BillStore>,
    navigator: Arc<TerminalNavigator>,
    session: Arc<SessionContext>,
    proof_modal_width: u32,
}

impl App {
    fn open(settings: &Settings, storage: &FileStorage) -> Result<Self> {
        let session = SessionContext::from_storage(storage)
            .context("sign in first with `billed login --email <email>`")?;
        let token = storage.get_item(TOKEN_KEY).context("failed to read token")?;
        let store = HttpBillStore::new(&settings.api_url)
            .with_context(|| format!("invalid api_url {}", settings.api_url))?
            .with_bearer_token(token);
        tracing::info!(api = %store.base_url(), email = session.email(), "session opened");

        Ok(Self {
            store: Arc::new(store),
            navigator: Arc::new(TerminalNavigator::default()),
            session: Arc::new(session),
            proof_modal_width: settings.proof_modal_width,
        })
    }

    fn bills(&self) -> BillListController {
        BillListController::new(
            self.store.clone(),
            self.navigator.clone(),
            Arc::new(TerminalProofViewer),
            self.session.clone(),
        )
        .with_proof_modal_width(self.proof_modal_width)
    }
}

async fn read_selected_file(path: &Path) -> Result<SelectedFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} is not a file", path.display()))?;
    let mime_type = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some("image/jpeg".to_string()),
            "png" => Some("image/png".to_string()),
            _ => None,
        });

    Ok(SelectedFile {
        name,
        mime_type,
        bytes,
    })
}
