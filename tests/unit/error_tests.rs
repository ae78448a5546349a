use axum::http::StatusCode;
use axum::response::IntoResponse;
use hablemos::AppError;

#[test]
fn display_prefixes_category() {
    assert_eq!(AppError::Config("bad".into()).to_string(), "config: bad");
    assert_eq!(AppError::Db("locked".into()).to_string(), "db: locked");
    assert_eq!(AppError::Llm("timeout".into()).to_string(), "llm: timeout");
    assert_eq!(
        AppError::Validation("empty".into()).to_string(),
        "validation: empty"
    );
    assert_eq!(
        AppError::NotFound("chat 1".into()).to_string(),
        "not found: chat 1"
    );
    assert_eq!(AppError::Io("disk".into()).to_string(), "io: disk");
}

#[test]
fn status_codes_follow_category() {
    assert_eq!(
        AppError::Validation(String::new()).status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        AppError::NotFound(String::new()).status_code(),
        StatusCode::NOT_FOUND
    );
    for err in [
        AppError::Config(String::new()),
        AppError::Db(String::new()),
        AppError::Llm(String::new()),
        AppError::Io(String::new()),
    ] {
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

#[tokio::test]
async fn response_body_carries_error_message() {
    let response = AppError::NotFound("journal entry x not found".into()).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(body["error"], "not found: journal entry x not found");
}

#[test]
fn io_error_converts_to_io_variant() {
    let err: AppError = std::io::Error::other("disk full").into();
    assert!(matches!(err, AppError::Io(ref msg) if msg.contains("disk full")));
}

#[test]
fn toml_error_converts_to_config_variant() {
    let err: AppError = toml::from_str::<toml::Value>("= nope")
        .expect_err("invalid toml")
        .into();
    assert!(err.to_string().starts_with("config:"));
}

#[test]
fn messages_have_no_trailing_period() {
    let err = AppError::Validation("content must not be empty".into());
    assert!(!err.to_string().ends_with('.'));
}
