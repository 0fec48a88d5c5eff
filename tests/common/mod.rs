// Path-routed HTTP responder for integration tests
#![allow(dead_code)]

use idswatch::config::{Config, DomainService};
use idswatch::models::Domain;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve fixed JSON bodies by request path; unknown paths get a 404.
pub async fn serve_routes(routes: Vec<(&str, &str)>) -> String {
    let routes: Arc<HashMap<String, String>> = Arc::new(
        routes
            .into_iter()
            .map(|(path, body)| (path.to_string(), body.to_string()))
            .collect(),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

                let (status, body) = match routes.get(&path) {
                    Some(body) => ("200 OK", body.clone()),
                    None => ("404 Not Found", r#"{"error": "not found"}"#.to_string()),
                };
                let reply = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(reply.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}

pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Defaults with every detection service at `base_url`, no live feeds and a short timeout
pub fn config_for(base_url: &str) -> Config {
    let mut config = Config::default();
    for (domain, service) in [
        (Domain::Iot, &mut config.services.iot),
        (Domain::Cyber, &mut config.services.cyber),
        (Domain::Traditional, &mut config.services.traditional),
    ] {
        *service = DomainService {
            base_url: base_url.to_string(),
            ws_url: None,
            ..DomainService::default_for(domain)
        };
    }
    config.polling.request_timeout_secs = 1;
    config.polling.live_interval_secs = 1;
    config
}
