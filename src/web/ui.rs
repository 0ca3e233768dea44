use crate::web::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

const INDEX_HTML: &str = include_str!("../../templates/index.html");

/// 首页处理器；模型不可用时只显示静态错误页
pub async fn index_handler(State(state): State<AppState>) -> Response {
    match state.models.load_error() {
        None => Html(INDEX_HTML).into_response(),
        Some(message) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Html(unavailable_html(message)),
        )
            .into_response(),
    }
}

/// 模型加载失败时的页面
fn unavailable_html(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>RetailVision AI | Auto-Tagger</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #0e1117;
            color: #fafafa;
            display: flex;
            align-items: center;
            justify-content: center;
            min-height: 100vh;
            margin: 0;
        }}
        .error {{
            background: rgba(255, 75, 75, 0.12);
            border: 1px solid #ff4b4b;
            color: #ffbdbd;
            border-radius: 10px;
            padding: 24px 32px;
            max-width: 640px;
            font-size: 1.1em;
        }}
    </style>
</head>
<body>
    <div class="error">⚠️ {}</div>
</body>
</html>"#,
        escape_html(message)
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_page_escapes_message() {
        let html = unavailable_html("Model not found. Please ensure '<m>.onnx' is available.");
        assert!(html.contains("Model not found. Please ensure &#39;&lt;m&gt;.onnx&#39; is available."));
        assert!(!html.contains("<m>"));
        assert!(!html.contains("type=\"file\""));
    }

    #[test]
    fn index_page_restricts_upload_types() {
        assert!(INDEX_HTML.contains(r#"accept=".jpg,.jpeg,.png""#));
        assert!(INDEX_HTML.contains("/classify/upload"));
    }

    #[test]
    fn index_page_falls_back_to_status_text() {
        assert!(INDEX_HTML.contains("response.statusText"));
        assert!(!INDEX_HTML.contains("file.size >"));
    }
}
