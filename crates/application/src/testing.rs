//! Scripted test doubles for the ports.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tolk_domain::{ApiRequest, ApiResponse, HttpMethod, Identity, Role};
use uuid::Uuid;

use crate::ports::{HttpClient, HttpClientError, Navigator};

pub const USER_ID: Uuid = Uuid::from_u128(0x0191_e3b4_6f7a_7c3e_9a52_1f0d_4c2b_8e11);

pub fn identity(role: Option<Role>) -> Identity {
    Identity {
        id: USER_ID,
        display_name: "Jana Novakova".to_string(),
        email: "jana@example.com".to_string(),
        role,
        languages: BTreeSet::from(["cs".to_string(), "de".to_string()]),
        created_at: Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap(),
    }
}

pub fn identity_reply(role: Option<Role>) -> Reply {
    Reply::Json(200, serde_json::to_value(identity(role)).unwrap())
}

#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16),
    Json(u16, serde_json::Value),
    Error(HttpClientError),
    Hang,
}

#[derive(Default)]
struct Route {
    replies: VecDeque<Reply>,
    gate: Option<Arc<Notify>>,
}

/// Answers requests from per-route reply queues. The last reply of a queue
/// repeats forever; unknown routes answer 404.
#[derive(Default)]
pub struct ScriptedClient {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<String>>,
}

fn key(method: HttpMethod, path: &str) -> String {
    format!("{method} {path}")
}

impl ScriptedClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: HttpMethod, path: &str, replies: impl IntoIterator<Item = Reply>) {
        let mut routes = self.routes.lock();
        let route = routes.entry(key(method, path)).or_default();
        route.replies.extend(replies);
    }

    /// Makes every request to the route wait for one `notify_one` permit.
    pub fn gate(&self, method: HttpMethod, path: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.routes
            .lock()
            .entry(key(method, path))
            .or_default()
            .gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self, method: HttpMethod, path: &str) -> usize {
        let wanted = key(method, path);
        self.calls.lock().iter().filter(|call| **call == wanted).count()
    }

    pub fn history(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Yields until the route has been called `count` times.
    pub async fn wait_for_calls(&self, method: HttpMethod, path: &str, count: usize) {
        while self.calls(method, path) < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, HttpClientError> {
        let route_key = key(request.method, &request.path);
        self.calls.lock().push(route_key.clone());

        let (reply, gate) = {
            let mut routes = self.routes.lock();
            match routes.get_mut(&route_key) {
                Some(route) => {
                    let reply = if route.replies.len() > 1 {
                        route.replies.pop_front()
                    } else {
                        route.replies.front().cloned()
                    };
                    (reply.unwrap_or(Reply::Status(404)), route.gate.clone())
                }
                None => (Reply::Status(404), None),
            }
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }

        match reply {
            Reply::Status(status) => Ok(ApiResponse::new(status, Vec::new())),
            Reply::Json(status, body) => Ok(ApiResponse::json(status, &body)),
            Reply::Error(error) => Err(error),
            Reply::Hang => std::future::pending().await,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to(&self, path: &str) {
        self.redirects.lock().push(path.to_string());
    }
}
