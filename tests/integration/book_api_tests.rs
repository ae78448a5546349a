//! `/api/books` uploads, downloads and reading progress.

use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};

use super::test_helpers::{spawn_server, TestServer};

fn epub_bytes(tag: &str) -> Vec<u8> {
    let mut bytes = b"PK\x03\x04".to_vec();
    bytes.extend_from_slice(b"mimetypeapplication/epub+zip");
    bytes.extend_from_slice(tag.as_bytes());
    bytes
}

fn epub_form(file_name: &str, bytes: Vec<u8>) -> Form {
    Form::new().part("file", Part::bytes(bytes).file_name(file_name.to_owned()))
}

async fn upload(server: &TestServer, form: Form) -> reqwest::Response {
    server
        .client
        .post(server.url("/api/books"))
        .multipart(form)
        .send()
        .await
        .expect("POST books")
}

async fn error_message(resp: reqwest::Response) -> String {
    let body: Value = resp.json().await.expect("error json");
    body["error"].as_str().expect("error field").to_owned()
}

#[tokio::test]
async fn upload_list_get_and_download() {
    let server = spawn_server(Vec::new()).await;
    let bytes = epub_bytes("marianela");
    let form = epub_form("marianela.epub", bytes.clone())
        .text("title", "Marianela")
        .text("author", "Benito Pérez Galdós");

    let resp = upload(&server, form).await;
    assert_eq!(resp.status(), 201);
    let book: Value = resp.json().await.expect("json");
    assert_eq!(book["title"], "Marianela");
    assert_eq!(book["author"], "Benito Pérez Galdós");
    assert_eq!(book["file_name"], "marianela.epub");
    assert_eq!(book["file_size"], bytes.len());
    let id = book["id"].as_str().expect("id");

    let listed: Vec<Value> = server
        .client
        .get(server.url("/api/books"))
        .send()
        .await
        .expect("GET books")
        .json()
        .await
        .expect("json");
    assert_eq!(listed.len(), 1);

    let fetched: Value = server
        .client
        .get(server.url(&format!("/api/books/{id}")))
        .send()
        .await
        .expect("GET book")
        .json()
        .await
        .expect("json");
    assert_eq!(fetched["id"], id);

    let resp = server
        .client
        .get(server.url(&format!("/api/books/{id}/file")))
        .send()
        .await
        .expect("GET file");
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["content-type"].to_str().expect("header"),
        "application/epub+zip"
    );
    assert!(resp.headers()["content-disposition"]
        .to_str()
        .expect("header")
        .contains("marianela.epub"));
    assert_eq!(resp.bytes().await.expect("body").to_vec(), bytes);
}

#[tokio::test]
async fn title_defaults_to_file_stem() {
    let server = spawn_server(Vec::new()).await;
    let resp = upload(&server, epub_form("niebla.epub", epub_bytes("niebla"))).await;
    assert_eq!(resp.status(), 201);
    let book: Value = resp.json().await.expect("json");
    assert_eq!(book["title"], "niebla");
    assert!(book["author"].is_null());
}

#[tokio::test]
async fn duplicate_upload_returns_existing_book() {
    let server = spawn_server(Vec::new()).await;
    let first = upload(&server, epub_form("a.epub", epub_bytes("same"))).await;
    assert_eq!(first.status(), 201);
    let first: Value = first.json().await.expect("json");

    let second = upload(&server, epub_form("b.epub", epub_bytes("same"))).await;
    assert_eq!(second.status(), 200);
    let second: Value = second.json().await.expect("json");
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["file_name"], "a.epub");

    let files = std::fs::read_dir(server.upload_dir.path())
        .expect("read upload dir")
        .count();
    assert_eq!(files, 1);
}

#[tokio::test]
async fn rejects_invalid_uploads() {
    let server = spawn_server(Vec::new()).await;

    let resp = upload(&server, epub_form("notes.txt", epub_bytes("x"))).await;
    assert_eq!(resp.status(), 400);
    assert!(error_message(resp).await.contains(".epub"));

    let resp = upload(&server, epub_form("fake.epub", b"plain text".to_vec())).await;
    assert_eq!(resp.status(), 400);
    assert!(error_message(resp).await.contains("not a valid epub"));

    let resp = upload(&server, epub_form("empty.epub", Vec::new())).await;
    assert_eq!(resp.status(), 400);

    // max_upload_bytes = 4096 in the test config.
    let mut big = epub_bytes("big");
    big.resize(5000, b'x');
    let resp = upload(&server, epub_form("big.epub", big)).await;
    assert_eq!(resp.status(), 400);
    assert!(error_message(resp).await.contains("4096"));

    let resp = upload(&server, Form::new().text("title", "Sin archivo")).await;
    assert_eq!(resp.status(), 400);
    assert!(error_message(resp).await.contains("missing file field"));

    let resp = server
        .client
        .post(server.url("/api/books"))
        .json(&json!({"file": "marianela.epub"}))
        .send()
        .await
        .expect("POST books");
    assert_eq!(resp.status(), 400);

    assert_eq!(
        std::fs::read_dir(server.upload_dir.path())
            .expect("read upload dir")
            .count(),
        0
    );
}

#[tokio::test]
async fn reading_progress_round_trip() {
    let server = spawn_server(Vec::new()).await;
    let book: Value = upload(&server, epub_form("libro.epub", epub_bytes("p")))
        .await
        .json()
        .await
        .expect("json");
    let id = book["id"].as_str().expect("id");
    let progress_url = server.url(&format!("/api/books/{id}/progress"));

    let unread: Value = server
        .client
        .get(&progress_url)
        .send()
        .await
        .expect("GET progress")
        .json()
        .await
        .expect("json");
    assert_eq!(unread["percentage"], 0.0);
    assert!(unread["location"].is_null());

    let resp = server
        .client
        .put(&progress_url)
        .json(&json!({"location": "epubcfi(/6/4!/4/2)", "percentage": 42.5}))
        .send()
        .await
        .expect("PUT progress");
    assert_eq!(resp.status(), 200);

    let saved: Value = server
        .client
        .get(&progress_url)
        .send()
        .await
        .expect("GET progress")
        .json()
        .await
        .expect("json");
    assert_eq!(saved["percentage"], 42.5);
    assert_eq!(saved["location"], "epubcfi(/6/4!/4/2)");
    assert!(!saved["updated_at"].is_null());

    let resp = server
        .client
        .put(&progress_url)
        .json(&json!({"percentage": 100.5}))
        .send()
        .await
        .expect("PUT progress");
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn delete_removes_row_and_file() {
    let server = spawn_server(Vec::new()).await;
    let book: Value = upload(&server, epub_form("borrar.epub", epub_bytes("d")))
        .await
        .json()
        .await
        .expect("json");
    let id = book["id"].as_str().expect("id").to_owned();
    let stored = server.upload_dir.path().join(format!("{id}.epub"));
    assert!(stored.exists());

    let resp = server
        .client
        .delete(server.url(&format!("/api/books/{id}")))
        .send()
        .await
        .expect("DELETE book");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body, json!({"id": id, "deleted": true}));
    assert!(!stored.exists());

    for path in [
        format!("/api/books/{id}"),
        format!("/api/books/{id}/file"),
        format!("/api/books/{id}/progress"),
    ] {
        let resp = server
            .client
            .get(server.url(&path))
            .send()
            .await
            .expect("GET");
        assert_eq!(resp.status(), 404, "{path}");
    }
}
