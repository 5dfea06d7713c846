#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// What the fake server saw.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub target: String,
    pub authorization: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CannedResponse {
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: vec![],
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: vec![],
            body: r#"{"errors":[{"message":"nope"}]}"#.to_string(),
        }
    }
}

/// A one-request-per-connection HTTP server answering from a fixed route table.
pub struct FakeCanvas {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeCanvas {
    pub async fn start(routes: HashMap<String, CannedResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let base_url = format!("http://{}", listener.local_addr().expect("addr"));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                loop {
                    let n = socket.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let request = String::from_utf8_lossy(&buf).to_string();
                let mut lines = request.lines();
                let target = lines
                    .next()
                    .and_then(|l| l.split_whitespace().nth(1))
                    .unwrap_or_default()
                    .to_string();
                let authorization = lines
                    .filter_map(|l| l.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
                    .map(|(_, value)| value.trim().to_string());
                recorded.lock().unwrap().push(RecordedRequest {
                    target: target.clone(),
                    authorization,
                });

                let response = routes
                    .get(&target)
                    .cloned()
                    .unwrap_or_else(|| CannedResponse::status(404));
                let mut raw = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
                    response.status,
                    if response.status < 400 { "OK" } else { "Error" },
                    response.body.len()
                );
                for (name, value) in &response.headers {
                    raw.push_str(&format!("{name}: {value}\r\n"));
                }
                raw.push_str("\r\n");
                raw.push_str(&response.body);
                let _ = socket.write_all(raw.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self { base_url, requests }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// A Canvas style `Link` header whose last page is `last`.
pub fn link(course_id: u64, last: u32) -> String {
    format!(
        "<https://canvas.test/api/v1/courses/{course_id}/assignments?page=1&per_page=100>; rel=\"first\",<https://canvas.test/api/v1/courses/{course_id}/assignments?page={last}&per_page=100>; rel=\"last\""
    )
}

pub fn assignment_json(id: u64, course_id: u64, name: &str, updated_at: &str) -> String {
    format!(
        r#"{{"id":{id},"name":"{name}","description":"<p>Read chapter {id}.</p>","created_at":"2024-01-10T09:00:00Z","updated_at":"{updated_at}","due_at":"2024-02-01T23:59:00Z","course_id":{course_id},"html_url":"https://canvas.test/courses/{course_id}/assignments/{id}","has_submitted_submissions":false,"rubric":[{{"points":4,"description":"Complete","long_description":null}}]}}"#
    )
}
