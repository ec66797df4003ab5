//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use traced_service::config::{DownstreamConfig, ServiceConfig};
use traced_service::http::HttpServer;
use traced_service::lifecycle::Shutdown;
use traced_service::trace::{InMemoryExporter, SpanRecorder};

/// A running service instance with its recorded spans observable.
pub struct TestService {
    pub addr: SocketAddr,
    pub exporter: InMemoryExporter,
    pub shutdown: Shutdown,
}

/// Start one service instance with an in-memory span exporter.
pub async fn start_service(config: ServiceConfig) -> TestService {
    let exporter = InMemoryExporter::new();
    let recorder = Arc::new(
        SpanRecorder::new(config.service.name.clone()).with_exporter(Box::new(exporter.clone())),
    );

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let server = HttpServer::new(config, recorder);
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    TestService {
        addr,
        exporter,
        shutdown,
    }
}

/// Build a config for one test instance, optionally wired to a downstream.
pub fn service_config(name: &str, bind: SocketAddr, downstream: Option<SocketAddr>) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.service.name = name.to_string();
    config.listener.bind_address = bind.to_string();
    config.timeouts.downstream_secs = 2;
    if let Some(downstream) = downstream {
        config.downstreams.push(DownstreamConfig {
            name: "service-2".to_string(),
            address: downstream.to_string(),
        });
        config.fanout.default_downstream = downstream.to_string();
    }
    config
}

/// Non-pooled client, so each test request opens a fresh connection.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

fn status_line(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}

/// Start a mock downstream that returns a fixed status and body.
#[allow(dead_code)]
pub async fn start_mock_backend(addr: SocketAddr, status: u16, response: &'static str) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let _ = read_request_head(&mut socket).await;
                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_line(status),
                            response.len(),
                            response
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Start a mock downstream that records each request head before answering
/// 200, so tests can assert on propagated headers.
#[allow(dead_code)]
pub async fn start_capturing_backend(
    addr: SocketAddr,
    response: &'static str,
) -> Arc<Mutex<Vec<String>>> {
    let listener = TcpListener::bind(addr).await.unwrap();
    let heads: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let captured = heads.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let captured = captured.clone();
                    tokio::spawn(async move {
                        if let Some(head) = read_request_head(&mut socket).await {
                            captured.lock().unwrap().push(head);
                        }
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.len(),
                            response
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    heads
}

/// Start a backend that accepts connections and never answers.
#[allow(dead_code)]
pub async fn start_hanging_backend(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    tokio::spawn(async move {
                        // Hold the socket open without responding.
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        drop(socket);
                    });
                }
                Err(_) => break,
            }
        }
    });
}

async fn read_request_head(socket: &mut tokio::net::TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|window| window == b"\r\n\r\n") {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    if buf.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&buf).into_owned())
    }
}
