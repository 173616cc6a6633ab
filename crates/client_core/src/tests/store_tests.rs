use super::*;

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch},
    Json, Router,
};
use serde_json::json;
use shared::domain::{BillDraft, BillId, BillStatus};
use tokio::{net::TcpListener, sync::Mutex};

use crate::SelectedFile;

#[derive(Clone, Default)]
struct ServerState {
    uploads: Arc<Mutex<Vec<(String, String, usize)>>>,
    finalized: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    authorization: Arc<Mutex<Option<String>>>,
}

async fn handle_list(State(state): State<ServerState>, headers: HeaderMap) -> Json<Value> {
    *state.authorization.lock().await = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    Json(json!([
        {
            "id": "BeKy5Mo4jkmdfPGYpTxZ",
            "type": "Transports",
            "name": "test1",
            "amount": 100,
            "date": "2001-01-01",
            "status": "refused",
            "fileUrl": "https://test.storage.tld/1592770761.jpeg",
            "fileName": "1592770761.jpeg"
        },
        {
            "id": "corrupted",
            "amount": "abc",
            "date": "???",
            "status": "pending"
        },
        "not a record"
    ]))
}

async fn handle_stage(State(state): State<ServerState>, mut multipart: Multipart) -> Json<Value> {
    let mut file_name = String::new();
    let mut email = String::new();
    let mut size = 0;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                file_name = field.file_name().unwrap_or_default().to_string();
                size = field.bytes().await.map(|bytes| bytes.len()).unwrap_or_default();
            }
            "email" => email = field.text().await.unwrap_or_default(),
            _ => {}
        }
    }
    state.uploads.lock().await.push((file_name, email, size));
    Json(json!({ "fileUrl": "https://localhost:3456/images/test.jpg", "key": "1234" }))
}

async fn handle_finalize(
    State(state): State<ServerState>,
    Path(key): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.finalized.lock().await.push((key.clone(), body.clone()));
    let mut record = body;
    record["id"] = json!(format!("bill-{key}"));
    Json(record)
}

async fn spawn_store_server(router: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

async fn spawn_bill_server() -> (String, ServerState) {
    let state = ServerState::default();
    let router = Router::new()
        .route("/api/bills", get(handle_list).post(handle_stage))
        .route("/api/bills/:key", patch(handle_finalize))
        .with_state(state.clone());
    (spawn_store_server(router).await, state)
}

fn sample_draft() -> BillDraft {
    BillDraft {
        email: "a@a".into(),
        expense_type: "Transports".into(),
        name: "train".into(),
        amount: 100.0,
        date: "2023-01-01".into(),
        vat: "20".into(),
        pct: 20,
        commentary: String::new(),
        file_url: "https://localhost:3456/images/test.jpg".into(),
        file_name: "goodFile.jpg".into(),
        status: BillStatus::Pending,
    }
}

#[test]
fn base_url_gets_trailing_slash() {
    let store = HttpBillStore::new("http://localhost:5678/api").expect("url");
    assert_eq!(store.base_url().as_str(), "http://localhost:5678/api/");
    assert_eq!(
        store.endpoint(&["bills", "abc"]).expect("join").as_str(),
        "http://localhost:5678/api/bills/abc"
    );
}

#[test]
fn keys_stay_inside_their_path_segment() {
    let store = HttpBillStore::new("http://localhost:5678/api/").expect("url");

    for (key, expected) in [
        ("a/b", "http://localhost:5678/api/bills/a%2Fb"),
        ("../admin", "http://localhost:5678/api/bills/..%2Fadmin"),
        ("k?x=1", "http://localhost:5678/api/bills/k%3Fx=1"),
        ("k#frag", "http://localhost:5678/api/bills/k%23frag"),
    ] {
        let url = store.endpoint(&["bills", key]).expect("endpoint");
        assert_eq!(url.as_str(), expected, "key {key:?}");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }
}

#[tokio::test]
async fn list_decodes_records_and_skips_non_objects() {
    let (server_url, state) = spawn_bill_server().await;
    let store = HttpBillStore::new(&format!("{server_url}/api"))
        .expect("url")
        .with_bearer_token(Some("secret-token".into()));

    let records = store.list().await.expect("list");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, Some(BillId("BeKy5Mo4jkmdfPGYpTxZ".into())));
    assert_eq!(records[0].status, BillStatus::Refused);
    assert_eq!(records[1].amount, None);
    assert_eq!(records[1].date, "???");
    assert_eq!(
        state.authorization.lock().await.as_deref(),
        Some("Bearer secret-token")
    );
}

#[tokio::test]
async fn stage_attachment_posts_multipart_and_returns_handle() {
    let (server_url, state) = spawn_bill_server().await;
    let store = HttpBillStore::new(&format!("{server_url}/api")).expect("url");

    let handle = store
        .stage_attachment(StageAttachment {
            file: SelectedFile {
                name: "goodFile.jpg".into(),
                mime_type: Some("image/jpeg".into()),
                bytes: b"jpeg-bytes".to_vec(),
            },
            email: "a@a".into(),
        })
        .await
        .expect("stage");

    assert_eq!(handle.key, "1234");
    assert_eq!(handle.file_url, "https://localhost:3456/images/test.jpg");
    assert_eq!(handle.file_name, "goodFile.jpg");
    assert_eq!(
        state.uploads.lock().await.as_slice(),
        &[("goodFile.jpg".to_string(), "a@a".to_string(), 10)]
    );
}

#[tokio::test]
async fn finalize_patches_the_staged_key() {
    let (server_url, state) = spawn_bill_server().await;
    let store = HttpBillStore::new(&format!("{server_url}/api")).expect("url");

    let record = store
        .finalize_record(FinalizeBill {
            key: "1234".into(),
            draft: sample_draft(),
        })
        .await
        .expect("finalize");

    assert_eq!(record.id, Some(BillId("bill-1234".into())));
    assert_eq!(record.amount, Some(100.0));
    assert_eq!(record.status, BillStatus::Pending);

    let finalized = state.finalized.lock().await;
    assert_eq!(finalized.len(), 1);
    assert_eq!(finalized[0].0, "1234");
    assert_eq!(finalized[0].1["type"], json!("Transports"));
    assert_eq!(finalized[0].1["email"], json!("a@a"));
}

#[tokio::test]
async fn finalize_sends_unusual_keys_verbatim() {
    let (server_url, state) = spawn_bill_server().await;
    let store = HttpBillStore::new(&format!("{server_url}/api")).expect("url");
    let key = "drafts/42?x=1";

    let record = store
        .finalize_record(FinalizeBill {
            key: key.into(),
            draft: sample_draft(),
        })
        .await
        .expect("finalize");

    assert_eq!(record.id, Some(BillId(format!("bill-{key}"))));
    let finalized = state.finalized.lock().await;
    assert_eq!(finalized.len(), 1);
    assert_eq!(finalized[0].0, key);
}

#[tokio::test]
async fn error_status_without_body_surfaces_erreur_code() {
    let router = Router::new()
        .route("/bills", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/bills/:key",
            patch(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
    let server_url = spawn_store_server(router).await;
    let store = HttpBillStore::new(&server_url).expect("url");

    let err = store.list().await.expect_err("404");
    assert_eq!(err, StoreError::Rejected("Erreur 404".into()));
    assert_eq!(err.to_string(), "Erreur 404");

    let err = store
        .finalize_record(FinalizeBill {
            key: "1234".into(),
            draft: sample_draft(),
        })
        .await
        .expect_err("500");
    assert_eq!(err.to_string(), "Erreur 500");
}

#[tokio::test]
async fn error_body_message_is_passed_through() {
    let router = Router::new().route(
        "/bills",
        get(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "code": "unauthorized", "message": "jwt expired" })),
            )
        }),
    );
    let server_url = spawn_store_server(router).await;
    let store = HttpBillStore::new(&server_url).expect("url");

    let err = store.list().await.expect_err("401");
    assert_eq!(err, StoreError::Rejected("jwt expired".into()));
}

#[tokio::test]
async fn unreachable_store_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let store = HttpBillStore::new(&format!("http://{addr}")).expect("url");
    let err = store.list().await.expect_err("connection refused");
    assert!(matches!(err, StoreError::Transport(_)), "unexpected: {err:?}");
}
