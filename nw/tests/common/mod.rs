//! Shared helpers for integration tests
//!
//! A one-request-per-connection HTTP server and in-memory implementations of
//! the crate's seams.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use notifywatch::api::{ApiError, NotificationApi};
use notifywatch::delivery::NotificationDisplay;
use notifywatch::domain::Notification;
use notifywatch::popup::{Rect, WindowHost};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// One request as seen by [`TestServer`]
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    pub body: String,
}

/// Canned reply; `None` from the responder means never answer
pub type Reply = Option<(u16, String)>;

pub struct TestServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn<F>(responder: F) -> Self
    where
        F: Fn(&Recorded) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let responder = Arc::new(responder);

        let recorded = Arc::clone(&requests);
        let task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let recorded = Arc::clone(&recorded);
                let responder = Arc::clone(&responder);
                tokio::spawn(async move {
                    serve_one(stream, recorded, responder).await;
                });
            }
        });

        Self { addr, requests, task }
    }

    pub fn domain(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_one<F>(mut stream: TcpStream, recorded: Arc<Mutex<Vec<Recorded>>>, responder: Arc<F>)
where
    F: Fn(&Recorded) -> Reply,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    let request = Recorded {
        method: request_line.next().unwrap_or_default().to_string(),
        target: request_line.next().unwrap_or_default().to_string(),
        body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
    };
    recorded.lock().unwrap().push(request.clone());

    match responder(&request) {
        Some((status, body)) => {
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                if status < 400 { "OK" } else { "Error" },
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
        None => {
            // Hold the connection open without answering
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// JSON envelope the backend wraps every response in
pub fn envelope(data: serde_json::Value) -> String {
    let count = data.as_array().map(|a| a.len()).unwrap_or(0);
    serde_json::json!({ "success": true, "data": data, "count": count, "message": "" }).to_string()
}

/// In-memory backend that drops acknowledged ids from later fetches
#[derive(Default)]
pub struct MemoryApi {
    pending: Mutex<Vec<Notification>>,
    acked: Mutex<Vec<String>>,
    fetches: Mutex<usize>,
}

impl MemoryApi {
    pub fn new(pending: Vec<Notification>) -> Self {
        Self {
            pending: Mutex::new(pending),
            ..Default::default()
        }
    }

    pub fn fetches(&self) -> usize {
        *self.fetches.lock().unwrap()
    }

    pub fn acked(&self) -> Vec<String> {
        self.acked.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationApi for MemoryApi {
    async fn fetch_pending(&self) -> Result<Vec<Notification>, ApiError> {
        *self.fetches.lock().unwrap() += 1;
        Ok(self.pending.lock().unwrap().clone())
    }

    async fn acknowledge(&self, id: &str) -> Result<(), ApiError> {
        self.acked.lock().unwrap().push(id.to_string());
        self.pending.lock().unwrap().retain(|n| n.id != id);
        Ok(())
    }

    async fn probe(&self) -> Result<Duration, ApiError> {
        Ok(Duration::ZERO)
    }
}

/// Display sink that records shown ids
#[derive(Default)]
pub struct RecordingDisplay {
    shown: Mutex<Vec<String>>,
}

impl RecordingDisplay {
    pub fn shown(&self) -> Vec<String> {
        self.shown.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDisplay for RecordingDisplay {
    async fn show(&self, notification: &Notification) -> eyre::Result<()> {
        self.shown.lock().unwrap().push(notification.id.clone());
        Ok(())
    }
}

/// Window host that remembers which slots are open
#[derive(Clone, Default)]
pub struct SharedHost {
    pub open: Arc<Mutex<Vec<(u64, String)>>>,
}

impl WindowHost for SharedHost {
    fn open(&mut self, slot: u64, notification: &Notification, _rect: Rect) -> eyre::Result<()> {
        self.open.lock().unwrap().push((slot, notification.id.clone()));
        Ok(())
    }

    fn place(&mut self, _slot: u64, _rect: Rect) {}

    fn close(&mut self, slot: u64) {
        self.open.lock().unwrap().retain(|(s, _)| *s != slot);
    }
}
