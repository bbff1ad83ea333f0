//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{routing::get, Router};
use graceful_http::observability::DiagnosticLog;
use graceful_http::{HttpEngine, Server, ServerConfig, ServerError};
use rcgen::{generate_simple_self_signed, CertifiedKey};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio_rustls::rustls::{self, ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tokio_util::sync::CancellationToken;

/// Router with a single fixed response.
#[allow(dead_code)]
pub fn app() -> Router {
    Router::new().route("/", get(|| async { "hello" }))
}

/// Start a server on a spawned task and wait until it is listening.
#[allow(dead_code)]
pub async fn start(config: ServerConfig) -> (SocketAddr, CancellationToken, JoinHandle<Result<(), ServerError>>) {
    start_server(Server::new(config)).await
}

/// Like [`start`], for a server the test has already adjusted.
#[allow(dead_code)]
pub async fn start_server(
    server: Server<HttpEngine>,
) -> (SocketAddr, CancellationToken, JoinHandle<Result<(), ServerError>>) {
    let mut listening = server.engine().listening();
    let token = CancellationToken::new();
    let run = tokio::spawn(server.run(token.clone()));

    let addr = tokio::time::timeout(Duration::from_secs(2), listening.wait_for(Option::is_some))
        .await
        .expect("server should start listening")
        .map(|addr| *addr)
        .expect("engine dropped before listening")
        .expect("listening address");

    (addr, token, run)
}

/// Wait for a run task, failing the test if it hangs.
#[allow(dead_code)]
pub async fn finish(run: JoinHandle<Result<(), ServerError>>, limit: Duration) -> Result<(), ServerError> {
    tokio::time::timeout(limit, run)
        .await
        .expect("run should return")
        .expect("run task panicked")
}

/// A diagnostic sink that records every message.
#[allow(dead_code)]
pub fn collecting_sink() -> (Arc<dyn DiagnosticLog>, Arc<Mutex<Vec<String>>>) {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&messages);
    let sink: Arc<dyn DiagnosticLog> = Arc::new(move |message: &str| {
        captured.lock().unwrap().push(message.to_string());
    });
    (sink, messages)
}

/// Read until the peer closes the stream (or errors), giving up after two seconds.
#[allow(dead_code)]
pub async fn read_until_closed<S: AsyncRead + Unpin>(stream: &mut S) -> String {
    let mut received = Vec::new();
    let mut chunk = [0u8; 4096];
    let _ = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => received.extend_from_slice(&chunk[..n]),
            }
        }
    })
    .await;
    String::from_utf8_lossy(&received).into_owned()
}

/// Self-signed certificate for `localhost`.
#[allow(dead_code)]
pub struct TestCert {
    pub cert: CertificateDer<'static>,
    pub key: PrivateKeyDer<'static>,
}

#[allow(dead_code)]
impl TestCert {
    pub fn generate() -> Self {
        let CertifiedKey { cert, key_pair } =
            generate_simple_self_signed(vec!["localhost".to_string()]).expect("Failed to generate test certificate");

        Self {
            cert: cert.der().clone(),
            key: PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der())),
        }
    }

    /// Server-side rustls config offering `alpn` in order.
    pub fn server_config(&self, alpn: &[&[u8]]) -> rustls::ServerConfig {
        let mut config = rustls::ServerConfig::builder_with_provider(Arc::new(
            rustls::crypto::aws_lc_rs::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .expect("Failed to select protocol versions")
        .with_no_client_auth()
        .with_single_cert(vec![self.cert.clone()], self.key.clone_key())
        .expect("Failed to create server config");
        config.alpn_protocols = alpn.iter().map(|proto| proto.to_vec()).collect();
        config
    }

    /// Client connector trusting this certificate and offering `alpn`.
    pub fn connector(&self, alpn: &[&[u8]]) -> TlsConnector {
        let mut roots = RootCertStore::empty();
        roots.add(self.cert.clone()).expect("Failed to add cert");

        let mut config = ClientConfig::builder_with_provider(Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
            .with_safe_default_protocol_versions()
            .expect("Failed to select protocol versions")
            .with_root_certificates(roots)
            .with_no_client_auth();
        config.alpn_protocols = alpn.iter().map(|proto| proto.to_vec()).collect();

        TlsConnector::from(Arc::new(config))
    }
}
