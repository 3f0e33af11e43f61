use axum::{http::StatusCode, routing::post, Router};
use codedesk_chat::ChatConfig;
use codedesk_cli::{build_router, AppConfig};
use codedesk_workspace::ScanOptions;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

struct Harness {
    temp: TempDir,
    base: String,
    client: reqwest::Client,
}

impl Harness {
    fn root(&self) -> &Path {
        self.temp.path()
    }

    async fn get(&self, path: &str) -> (u16, String) {
        let response = self
            .client
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.text().await.unwrap())
    }

    async fn get_json(&self, path: &str) -> (u16, Value) {
        let (status, text) = self.get(path).await;
        (status, serde_json::from_str(&text).expect("json body"))
    }

    async fn post_json(&self, path: &str, body: &str) -> (u16, Value) {
        let response = self
            .client
            .post(format!("{}{path}", self.base))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        let text = response.text().await.unwrap();
        (status, serde_json::from_str(&text).expect("json body"))
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn start(chat: ChatConfig) -> Harness {
    let temp = tempdir().unwrap();
    let root = temp.path().join("ws");
    let pages = temp.path().join("pages");
    fs::create_dir_all(root.join("a")).unwrap();
    fs::write(root.join("a/x.txt"), b"hello").unwrap();
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::write(root.join(".git/config"), b"[core]").unwrap();
    fs::create_dir_all(root.join("B")).unwrap();
    fs::write(temp.path().join("secret.txt"), b"outside").unwrap();
    fs::create_dir_all(&pages).unwrap();
    fs::write(pages.join("index.html"), "<h1>chat</h1>").unwrap();

    let app = build_router(AppConfig {
        root,
        pages_dir: pages,
        scan: ScanOptions::default(),
        chat: ChatConfig {
            prompt_file: temp.path().join("prompt.txt"),
            ..chat
        },
    })
    .unwrap();
    let base = serve(app).await;

    Harness {
        base,
        client: reqwest::Client::new(),
        temp,
    }
}

async fn start_with_provider(status: StatusCode, reply: &'static str) -> Harness {
    let provider = Router::new().route(
        "/v1beta/models/:call",
        post(move || async move { (status, reply) }),
    );
    let provider_base = serve(provider).await;
    start(ChatConfig {
        api_base: format!("{provider_base}/v1beta"),
        api_key: Some("test-key".into()),
        timeout: Duration::from_secs(5),
        ..ChatConfig::default()
    })
    .await
}

#[tokio::test]
async fn files_route_returns_ordered_tree() {
    let h = start(ChatConfig::default()).await;

    let (status, body) = h.get_json("/api/local/files").await;
    assert_eq!(status, 200);
    assert_eq!(
        body["tree"],
        json!([
            {"name": "a", "type": "folder", "path": "a", "children": [
                {"name": "x.txt", "type": "file", "path": "a/x.txt"}
            ]},
            {"name": "B", "type": "folder", "path": "B", "children": []}
        ])
    );
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn files_route_reports_missing_root() {
    let h = start(ChatConfig::default()).await;
    fs::remove_dir_all(h.root().join("ws")).unwrap();

    let (status, body) = h.get_json("/api/local/files").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"tree": [], "error": "Directory not found"}));
}

#[tokio::test]
async fn read_route_embeds_failures_as_placeholders() {
    let h = start(ChatConfig::default()).await;

    let (status, body) = h.get_json("/api/local/read?filepath=a/x.txt").await;
    assert_eq!((status, body), (200, json!({"content": "hello"})));

    let (status, body) = h.get_json("/api/local/read?filepath=a/missing.txt").await;
    assert_eq!((status, body), (200, json!({"content": "// File not found"})));

    let (status, body) = h.get_json("/api/local/read?filepath=../secret.txt").await;
    assert_eq!((status, body), (403, json!({"content": "// Access Denied"})));

    let (status, body) = h.get_json("/api/local/read?filepath=a").await;
    assert_eq!(status, 200);
    assert!(body["content"].as_str().unwrap().starts_with("// Error: "));
}

#[tokio::test]
async fn read_route_without_filepath_keeps_content_shape() {
    let h = start(ChatConfig::default()).await;

    let (status, body) = h.get_json("/api/local/read").await;
    assert_eq!(status, 400);
    let content = body["content"].as_str().unwrap();
    assert!(content.starts_with("// Error: "), "{content}");
    assert!(content.contains("filepath"), "{content}");
}

#[tokio::test]
async fn save_then_read_round_trips() {
    let h = start(ChatConfig::default()).await;
    let content = "#include <cstdio>\nint main() { puts(\"xin chào\"); }\n";
    let request = json!({"filename": "a/bai1.cpp", "content": content}).to_string();

    let (status, body) = h.post_json("/api/local/save", &request).await;
    assert_eq!(
        (status, body),
        (200, json!({"status": "success", "message": "Saved a/bai1.cpp"}))
    );

    let (_, body) = h.get_json("/api/local/read?filepath=a/bai1.cpp").await;
    assert_eq!(body["content"], content);
}

#[tokio::test]
async fn save_refuses_escape_and_reports_errors() {
    let h = start(ChatConfig::default()).await;

    let escape = json!({"filename": "../secret.txt", "content": "pwned"}).to_string();
    let (status, body) = h.post_json("/api/local/save", &escape).await;
    assert_eq!(
        (status, body),
        (403, json!({"status": "error", "message": "Access Denied"}))
    );
    assert_eq!(
        fs::read_to_string(h.root().join("secret.txt")).unwrap(),
        "outside"
    );

    let no_parent = json!({"filename": "nope/file.txt", "content": "x"}).to_string();
    let (status, body) = h.post_json("/api/local/save", &no_parent).await;
    assert_eq!(status, 500);
    assert_eq!(body["status"], "error");

    let (status, body) = h.post_json("/api/local/save", "{not json").await;
    assert_eq!(status, 400);
    assert_eq!(body["status"], "error");
}

#[cfg(unix)]
#[tokio::test]
async fn save_keeps_mode_and_refuses_read_only_files() {
    use std::os::unix::fs::PermissionsExt;

    let h = start(ChatConfig::default()).await;
    let script = h.root().join("ws/a/run.sh");
    fs::write(&script, "echo v1\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    let locked = h.root().join("ws/a/locked.txt");
    fs::write(&locked, "v1").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o444)).unwrap();

    let request = json!({"filename": "a/run.sh", "content": "echo v2\n"}).to_string();
    let (status, _) = h.post_json("/api/local/save", &request).await;
    assert_eq!(status, 200);
    let mode = fs::metadata(&script).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o755);

    let request = json!({"filename": "a/locked.txt", "content": "v2"}).to_string();
    let (status, body) = h.post_json("/api/local/save", &request).await;
    assert_eq!(
        (status, body),
        (500, json!({"status": "error", "message": "Permission denied"}))
    );
    assert_eq!(fs::read_to_string(&locked).unwrap(), "v1");
}

#[tokio::test]
async fn chat_without_api_key_is_unavailable() {
    let h = start(ChatConfig::default()).await;

    let (status, body) = h.post_json("/api/chat", r#"{"message": "hi"}"#).await;
    assert_eq!(status, 503);
    assert!(body["error"].as_str().unwrap().contains("API key"));
}

#[tokio::test]
async fn chat_returns_provider_reply() {
    let h = start_with_provider(
        StatusCode::OK,
        r#"{"candidates":[{"content":{"parts":[{"text":"Use a vector."}]}}]}"#,
    )
    .await;

    let (status, body) = h
        .post_json(
            "/api/chat",
            r#"{"history": [{"role": "user", "parts": [{"text": "hi"}]}], "message": "help", "files": []}"#,
        )
        .await;
    assert_eq!((status, body), (200, json!({"result": "Use a vector."})));
}

#[tokio::test]
async fn chat_surfaces_provider_error_body() {
    let h = start_with_provider(
        StatusCode::TOO_MANY_REQUESTS,
        r#"{"error":{"message":"quota exhausted"}}"#,
    )
    .await;

    let (status, body) = h.post_json("/api/chat", r#"{"message": "hi"}"#).await;
    assert_eq!(status, 502);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("API Error: "), "{error}");
    assert!(error.contains("quota exhausted"), "{error}");
}

#[tokio::test]
async fn pages_and_health() {
    let h = start(ChatConfig::default()).await;

    let (status, body) = h.get("/").await;
    assert_eq!((status, body.as_str()), (200, "<h1>chat</h1>"));

    let (status, body) = h.get("/explorer").await;
    assert_eq!((status, body.as_str()), (404, "File explorer.html not found"));

    let (status, body) = h.get_json("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["root_exists"], true);
}
