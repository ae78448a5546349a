//! `/api/journal` end to end against a scripted model.

use serde_json::{json, Value};

use super::test_helpers::{spawn_server, Scripted, TestServer};

const CORRECTION: &str = r#"{
  "corrected_text": "Ayer fui al mercado.\nCompré manzanas.",
  "corrections": [
    {"original": "yo va", "corrected": "fui", "explanation": "Pretérito de ir", "category": "grammar"},
    {"original": "compre", "corrected": "Compré", "explanation": "Lleva tilde", "category": "acento"}
  ]
}"#;

async fn create_entry(server: &TestServer, title: &str, content: &str) -> Value {
    let resp = server
        .client
        .post(server.url("/api/journal"))
        .json(&json!({"title": title, "content": content}))
        .send()
        .await
        .expect("POST /api/journal");
    assert_eq!(resp.status(), 201);
    resp.json().await.expect("entry json")
}

#[tokio::test]
async fn create_list_get_and_delete() {
    let server = spawn_server(Vec::new()).await;
    let entry = create_entry(&server, "Lunes", "Hoy llueve.").await;
    let id = entry["id"].as_str().expect("id");
    assert_eq!(entry["status"], "draft");
    assert_eq!(entry["corrections"], json!([]));

    let listed: Vec<Value> = server
        .client
        .get(server.url("/api/journal"))
        .send()
        .await
        .expect("GET list")
        .json()
        .await
        .expect("json");
    assert_eq!(listed.len(), 1);

    let fetched: Value = server
        .client
        .get(server.url(&format!("/api/journal/{id}")))
        .send()
        .await
        .expect("GET entry")
        .json()
        .await
        .expect("json");
    assert_eq!(fetched["content"], "Hoy llueve.");

    let resp = server
        .client
        .delete(server.url(&format!("/api/journal/{id}")))
        .send()
        .await
        .expect("DELETE entry");
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.json::<Value>().await.expect("json"),
        json!({"id": id, "deleted": true})
    );

    let resp = server
        .client
        .delete(server.url(&format!("/api/journal/{id}")))
        .send()
        .await
        .expect("DELETE again");
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn validation_rejects_blank_and_overlong_input() {
    let server = spawn_server(Vec::new()).await;

    for body in [
        json!({"title": " ", "content": "Texto"}),
        json!({"title": "Título", "content": "  "}),
        // max_journal_chars = 200 in the test config.
        json!({"title": "Título", "content": "a".repeat(201)}),
        json!({"title": "Sin contenido"}),
    ] {
        let resp = server
            .client
            .post(server.url("/api/journal"))
            .json(&body)
            .send()
            .await
            .expect("POST /api/journal");
        assert_eq!(resp.status(), 400, "{body}");
    }
}

#[tokio::test]
async fn content_limit_counts_characters_not_bytes() {
    let server = spawn_server(Vec::new()).await;
    create_entry(&server, "Eñes", &"ñ".repeat(200)).await;
}

#[tokio::test]
async fn correction_stores_text_corrections_and_diff() {
    let server = spawn_server(vec![Scripted::Text(CORRECTION.into())]).await;
    let entry = create_entry(&server, "Mercado", "Ayer yo va al mercado.\nCompre manzanas.").await;
    let id = entry["id"].as_str().expect("id");

    let resp = server
        .client
        .post(server.url(&format!("/api/journal/{id}/corrections")))
        .send()
        .await
        .expect("POST corrections");
    assert_eq!(resp.status(), 200);
    let corrected: Value = resp.json().await.expect("json");

    assert_eq!(corrected["status"], "corrected");
    assert_eq!(
        corrected["corrected_content"],
        "Ayer fui al mercado.\nCompré manzanas."
    );
    assert_eq!(corrected["corrections"][0]["category"], "grammar");
    assert_eq!(corrected["corrections"][1]["category"], "accent");
    let diff = corrected["diff"].as_str().expect("diff");
    assert!(diff.contains("-Ayer yo va al mercado."), "{diff}");
    assert!(diff.contains("+Ayer fui al mercado."), "{diff}");

    let request = &server.llm.requests()[0];
    assert!(request.json);
    assert!(request.messages[0].content.contains("Ayer yo va al mercado."));
}

#[tokio::test]
async fn editing_content_resets_to_draft() {
    let server = spawn_server(vec![Scripted::Text(CORRECTION.into())]).await;
    let entry = create_entry(&server, "Mercado", "Ayer yo va al mercado.").await;
    let id = entry["id"].as_str().expect("id");

    server
        .client
        .post(server.url(&format!("/api/journal/{id}/corrections")))
        .send()
        .await
        .expect("POST corrections");

    // A title-only edit keeps the corrections.
    let renamed: Value = server
        .client
        .put(server.url(&format!("/api/journal/{id}")))
        .json(&json!({"title": "En el mercado"}))
        .send()
        .await
        .expect("PUT entry")
        .json()
        .await
        .expect("json");
    assert_eq!(renamed["title"], "En el mercado");
    assert_eq!(renamed["status"], "corrected");

    let edited: Value = server
        .client
        .put(server.url(&format!("/api/journal/{id}")))
        .json(&json!({"content": "Ayer fui al mercado."}))
        .send()
        .await
        .expect("PUT entry")
        .json()
        .await
        .expect("json");
    assert_eq!(edited["status"], "draft");
    assert_eq!(edited["corrections"], json!([]));
    assert!(edited["corrected_content"].is_null());
    assert!(edited["diff"].is_null());
}

#[tokio::test]
async fn unusable_model_output_is_500_and_entry_stays_draft() {
    let server = spawn_server(vec![Scripted::Text("No puedo corregir esto.".into())]).await;
    let entry = create_entry(&server, "x", "Texto").await;
    let id = entry["id"].as_str().expect("id");

    let resp = server
        .client
        .post(server.url(&format!("/api/journal/{id}/corrections")))
        .send()
        .await
        .expect("POST corrections");
    assert_eq!(resp.status(), 500);

    let fetched: Value = server
        .client
        .get(server.url(&format!("/api/journal/{id}")))
        .send()
        .await
        .expect("GET entry")
        .json()
        .await
        .expect("json");
    assert_eq!(fetched["status"], "draft");
}

#[tokio::test]
async fn correcting_unknown_entry_is_404() {
    let server = spawn_server(Vec::new()).await;
    let resp = server
        .client
        .post(server.url("/api/journal/missing/corrections"))
        .send()
        .await
        .expect("POST corrections");
    assert_eq!(resp.status(), 404);
    assert!(server.llm.requests().is_empty());
}
