/*
 * Responsibility
 * - gate の背後にある最小限のページ (home / login / dashboard / 404)
 * - 実際の UI は別サービスの想定。ここは配線確認用
 */
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse},
};

use super::extractors::AuthCtxExtractor;

pub async fn home() -> Html<String> {
    page("Home", "<p>Public page.</p>")
}

pub async fn login() -> Html<String> {
    page("Sign in", "<p>Sign in to continue.</p>")
}

pub async fn dashboard(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Html<String> {
    let body = format!("<p>Signed in as {}.</p>", escape_html(&ctx.user_id));
    page("Dashboard", &body)
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, page("Not found", "<p>Nothing here.</p>"))
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h1>{title}</h1>{body}</body></html>"
    ))
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#x27;x&#x27;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
        assert_eq!(escape_html("u1"), "u1");
    }
}
