//! TLS serving and ALPN protocol handoff.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use graceful_http::http::{protocol_handler, NegotiationTable};
use graceful_http::net::{ConnectionInfo, ConnectionState};
use graceful_http::ServerConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::server::TlsStream;

const ECHO: &[u8] = b"echo/1";
const HTTP11: &[u8] = b"http/1.1";

fn echo_table() -> NegotiationTable {
    let mut table = NegotiationTable::new();
    table.insert(
        "echo/1".to_string(),
        protocol_handler(|mut stream: TlsStream<TcpStream>, _: ConnectionInfo, _: Router| async move {
            let mut ping = [0u8; 4];
            if stream.read_exact(&mut ping).await.is_ok() {
                let _ = stream.write_all(&ping).await;
                let _ = stream.shutdown().await;
            }
        }),
    );
    table
}

#[tokio::test]
async fn negotiated_protocol_is_handed_to_its_handler() {
    let cert = common::TestCert::generate();
    let states = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&states);
    let config = ServerConfig::builder("127.0.0.1:0", common::app())
        .tls(RustlsConfig::from_config(Arc::new(cert.server_config(&[ECHO, HTTP11]))))
        .negotiation_table(echo_table())
        .conn_state(Arc::new(move |_: &ConnectionInfo, state: ConnectionState| {
            recorded.lock().unwrap().push(state);
        }))
        .build();
    let (addr, token, run) = common::start(config).await;

    let tcp = TcpStream::connect(addr).await.unwrap();
    let mut tls = cert
        .connector(&[ECHO])
        .connect(ServerName::try_from("localhost").unwrap(), tcp)
        .await
        .unwrap();
    assert_eq!(tls.get_ref().1.alpn_protocol(), Some(ECHO));

    tls.write_all(b"ping").await.unwrap();
    let mut pong = [0u8; 4];
    tokio::time::timeout(Duration::from_secs(2), tls.read_exact(&mut pong))
        .await
        .expect("handler should answer")
        .unwrap();
    assert_eq!(&pong, b"ping");

    token.cancel();
    assert!(common::finish(run, Duration::from_secs(3)).await.is_ok());
    assert_eq!(
        *states.lock().unwrap(),
        vec![ConnectionState::New, ConnectionState::Hijacked]
    );
}

#[tokio::test]
async fn unlisted_protocol_is_served_as_http() {
    let cert = common::TestCert::generate();
    let config = ServerConfig::builder("127.0.0.1:0", common::app())
        .tls(RustlsConfig::from_config(Arc::new(cert.server_config(&[ECHO, HTTP11]))))
        .negotiation_table(echo_table())
        .build();
    let (addr, token, run) = common::start(config).await;

    let tcp = TcpStream::connect(addr).await.unwrap();
    let mut tls = cert
        .connector(&[HTTP11])
        .connect(ServerName::try_from("localhost").unwrap(), tcp)
        .await
        .unwrap();
    tls.write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let response = common::read_until_closed(&mut tls).await;
    assert!(response.starts_with("HTTP/1.1 200"), "unexpected response: {response:?}");
    assert!(response.ends_with("hello"));

    token.cancel();
    assert!(common::finish(run, Duration::from_secs(3)).await.is_ok());
}

#[tokio::test]
async fn failed_handshake_is_reported() {
    let cert = common::TestCert::generate();
    let (sink, messages) = common::collecting_sink();
    let config = ServerConfig::builder("127.0.0.1:0", common::app())
        .tls(RustlsConfig::from_config(Arc::new(cert.server_config(&[HTTP11]))))
        .error_log(sink)
        .build();
    let (addr, token, run) = common::start(config).await;

    let mut plain = TcpStream::connect(addr).await.unwrap();
    plain
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    common::read_until_closed(&mut plain).await;

    token.cancel();
    assert!(common::finish(run, Duration::from_secs(3)).await.is_ok());
    let messages = messages.lock().unwrap();
    assert!(
        messages.iter().any(|m| m.starts_with("http: TLS handshake error")),
        "unexpected diagnostics: {messages:?}"
    );
}
