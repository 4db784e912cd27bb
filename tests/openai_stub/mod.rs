use std::io::Read as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde_json::Value;

pub const API_KEY: &str = "test-key";

#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum ReplyBehavior {
    /// Valid content wrapped in a ```json fence.
    FencedContent,
    /// Prose with no JSON anywhere.
    Prose,
    /// JSON missing the `content` field.
    MissingContent,
    /// HTTP 401 with an OpenAI-style error body.
    Unauthorized,
    /// Valid content, but only after `STALL` has passed.
    Stall,
}

/// How long `ReplyBehavior::Stall` holds a request before replying.
#[allow(dead_code)]
pub const STALL: Duration = Duration::from_secs(3);

pub struct OpenAiStub {
    pub base_url: String,
    requests: Arc<AtomicUsize>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl OpenAiStub {
    pub fn spawn(behavior: ReplyBehavior) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start openai stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/v1");
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let path = request.url().to_string();
                if request.method() != &tiny_http::Method::Post || path != "/v1/chat/completions"
                {
                    let _ = request.respond(
                        tiny_http::Response::from_string("not found").with_status_code(404),
                    );
                    continue;
                }
                counter.fetch_add(1, Ordering::SeqCst);

                let authorized = request.headers().iter().any(|h| {
                    h.field.equiv("Authorization") && h.value.as_str() == format!("Bearer {API_KEY}")
                });

                let mut body = String::new();
                if request.as_reader().read_to_string(&mut body).is_err() {
                    let _ = request.respond(
                        tiny_http::Response::from_string("invalid request body")
                            .with_status_code(400),
                    );
                    continue;
                }

                let parsed: Value = match serde_json::from_str(&body) {
                    Ok(value) => value,
                    Err(_) => {
                        let _ = request.respond(
                            tiny_http::Response::from_string("invalid json").with_status_code(400),
                        );
                        continue;
                    }
                };

                if !authorized || matches!(behavior, ReplyBehavior::Unauthorized) {
                    let error = serde_json::json!({
                        "error": { "message": "Authentication Fails", "type": "authentication_error" }
                    });
                    let _ = request.respond(
                        tiny_http::Response::from_string(error.to_string()).with_status_code(401),
                    );
                    continue;
                }

                let system_ok = parsed.pointer("/messages/0/role").and_then(|v| v.as_str())
                    == Some("system")
                    && parsed.get("stream").and_then(|v| v.as_bool()) == Some(false);
                let Some(prompt) = parsed
                    .pointer("/messages/1/content")
                    .and_then(|v| v.as_str())
                    .filter(|_| system_ok)
                else {
                    let _ = request.respond(
                        tiny_http::Response::from_string("unexpected request shape")
                            .with_status_code(400),
                    );
                    continue;
                };

                let reply = match behavior {
                    ReplyBehavior::FencedContent => {
                        format!("Sure!\n```json\n{}\n```\n", content_for_prompt(prompt, true))
                    }
                    ReplyBehavior::MissingContent => content_for_prompt(prompt, false).to_string(),
                    ReplyBehavior::Prose => "I am unable to produce JSON today.".to_owned(),
                    ReplyBehavior::Stall => {
                        thread::sleep(STALL);
                        content_for_prompt(prompt, true).to_string()
                    }
                    ReplyBehavior::Unauthorized => unreachable!("handled above"),
                };

                let response_body = serde_json::json!({
                    "id": "chatcmpl-stub",
                    "object": "chat.completion",
                    "model": parsed.get("model").cloned().unwrap_or(Value::String("stub-model".to_owned())),
                    "choices": [
                        {
                            "index": 0,
                            "message": { "role": "assistant", "content": reply },
                            "finish_reason": "stop"
                        }
                    ]
                });

                let mut response = tiny_http::Response::from_string(response_body.to_string())
                    .with_status_code(200);
                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("build header");
                response = response.with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    #[allow(dead_code)]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Drop for OpenAiStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn line_value<'a>(prompt: &'a str, label: &str) -> &'a str {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix(label))
        .unwrap_or("")
        .trim()
}

/// Builds a content object echoing the prompt's point metadata.
fn content_for_prompt(prompt: &str, with_content: bool) -> Value {
    let name = line_value(prompt, "- 知识点名称：");
    let category = line_value(prompt, "- 所属分类：");
    let index: u32 = line_value(prompt, "- 序号：")
        .split('/')
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(0);

    let mut value = serde_json::json!({
        "grammar_point": name,
        "category": category,
        "index": index,
        "content": {
            "overview": {
                "function": format!("{name} overview."),
                "usage_scenarios": ["scenario one", "scenario two"]
            },
            "rules": {
                "description": "rules",
                "key_points": [{ "point": "rule one", "explanation": "because" }]
            },
            "examples": [
                { "sentence": "Alpha sentence.", "translation": "甲", "analysis": "first" },
                { "sentence": "Bravo sentence.", "translation": "乙", "analysis": "second" },
                { "sentence": "Charlie sentence.", "translation": "丙", "analysis": "third" }
            ],
            "exercises": {
                "multiple_choice": [
                    { "question": "Q1", "options": ["A. a", "B. b", "C. c", "D. d"], "answer": "A", "explanation": "e1" },
                    { "question": "Q2", "options": ["A. a", "B. b", "C. c", "D. d"], "answer": "C", "explanation": "e2" },
                    { "question": "Q3", "options": ["A. a", "B. b", "C. c", "D. d"], "answer": "D", "explanation": "e3" }
                ],
                "fill_blank": [
                    { "question": "F1", "answer": "is", "explanation": "f1" },
                    { "question": "F2", "answer": "was", "explanation": "f2" }
                ]
            },
            "summary": "summary",
            "related_points": ["see also"]
        }
    });
    if !with_content && let Some(object) = value.as_object_mut() {
        object.remove("content");
    }
    value
}
