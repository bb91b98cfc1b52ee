//! Scripted transport for unit tests.

use crate::api::{Method, Request, Response, Transport};
use crate::models::{Review, User};
use chrono::{TimeZone, Utc};
use failure::Error;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

struct Script {
    method: Method,
    path: String,
    query: Option<(String, String)>,
    replies: VecDeque<(u16, Value, Duration)>,
}

impl Script {
    fn matches(&self, request: &Request) -> bool {
        self.method == request.method
            && self.path == request.path
            && match &self.query {
                Some(pair) => request.query.contains(pair),
                None => true,
            }
    }
}

/// Answers requests from registered scripts and records every call.
///
/// Several replies on one route are served in order; the last one repeats.
/// Unscripted routes answer 404.
#[derive(Default)]
pub struct FakeTransport {
    scripts: Mutex<Vec<Script>>,
    calls: Mutex<Vec<Request>>,
}

impl FakeTransport {
    pub fn new() -> FakeTransport {
        FakeTransport::default()
    }

    pub fn on(&self, method: Method, path: &str, status: u16, body: Value) -> &FakeTransport {
        self.script(method, path, None, status, body, Duration::from_millis(0))
    }

    /// Like `on`, but only for requests carrying the query pair and
    /// answered after `delay`.
    pub fn on_query(&self, method: Method, path: &str, pair: (&str, &str), status: u16, body: Value, delay: Duration) -> &FakeTransport {
        let pair = (pair.0.to_string(), pair.1.to_string());
        self.script(method, path, Some(pair), status, body, delay)
    }

    fn script(&self, method: Method, path: &str, query: Option<(String, String)>, status: u16, body: Value, delay: Duration) -> &FakeTransport {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.iter_mut().find(|s| s.method == method && s.path == path && s.query == query) {
            Some(script) => script.replies.push_back((status, body, delay)),
            None => {
                let mut replies = VecDeque::new();
                replies.push_back((status, body, delay));
                scripts.push(Script { method, path: path.to_string(), query, replies });
            }
        }
        self
    }

    pub fn calls(&self) -> Vec<Request> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls().iter().filter(|r| r.method == method && r.path == path).count()
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: &Request) -> Result<Response, Error> {
        self.calls.lock().unwrap().push(request.clone());
        let reply = {
            let mut scripts = self.scripts.lock().unwrap();
            // query-specific scripts win over generic ones
            scripts.sort_by_key(|s| s.query.is_none());
            scripts.iter_mut().find(|s| s.matches(request)).map(|s| {
                if s.replies.len() > 1 {
                    s.replies.pop_front().unwrap()
                } else {
                    s.replies[0].clone()
                }
            })
        };
        let (status, body, delay) = reply.unwrap_or((404, json!({"detail": "Not Found"}), Duration::from_millis(0)));
        if delay > Duration::from_millis(0) {
            thread::sleep(delay);
        }
        Ok(Response { status, body: body.to_string() })
    }
}

pub fn sample_user(id: &str) -> User {
    User {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        username: format!("player_{}", id),
        bio: None,
        avatar_url: None,
        created_at: Utc.ymd(2025, 1, 15).and_hms(9, 30, 0),
    }
}

pub fn sample_review(id: &str) -> Review {
    Review {
        id: id.to_string(),
        title: "A quiet masterpiece".to_string(),
        content: "The combat loop never gets old.".to_string(),
        game_name: "Hollow Knight".to_string(),
        category: "Metroidvania".to_string(),
        tags: vec!["indie".to_string(), "hard".to_string()],
        rating: Some(9),
        cover_image: None,
        author_id: "u1".to_string(),
        author_username: "player_u1".to_string(),
        collaborators: vec![],
        likes_count: 4,
        comments_count: 1,
        created_at: Utc.ymd(2025, 2, 1).and_hms(18, 0, 0),
        updated_at: None,
    }
}

pub fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap()
}
