//! Landing page and favicon.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;

use crate::http::error::AppError;
use crate::state::AppState;

/// Served when no `index.html` is deployed next to the relay.
pub const BUILTIN_INDEX: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Sera</title>
</head>
<body>
<h1>Sera</h1>
<p>The chat relay is running. POST <code>{"chat": "..."}</code> to <code>/chat</code>.</p>
</body>
</html>
"#;

/// GET / - Serve the configured landing page, or the built-in one.
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    match tokio::fs::read_to_string(state.index_path.as_path()).await {
        Ok(html) => Ok(Html(html)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Html(BUILTIN_INDEX.to_string())),
        Err(e) => Err(AppError::Internal(format!(
            "failed to read {}: {e}",
            state.index_path.display()
        ))),
    }
}

/// GET /favicon.ico - No icon.
pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}
