//! TLS configuration, acceptor and ALPN inspection.

use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpStream;
use tokio_rustls::server::TlsStream;
use tokio_rustls::TlsAcceptor;

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, std::io::Error> {
    if !cert_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Certificate file not found: {:?}", cert_path),
        ));
    }
    if !key_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Private key file not found: {:?}", key_path),
        ));
    }

    RustlsConfig::from_pem_file(cert_path, key_path).await
}

/// Build an acceptor from the current server config.
///
/// Called per connection so certificate reloads on `config` take effect.
pub fn acceptor(config: &RustlsConfig) -> TlsAcceptor {
    TlsAcceptor::from(config.get_inner())
}

/// The ALPN protocol agreed during the handshake, if any.
pub fn negotiated_protocol(stream: &TlsStream<TcpStream>) -> Option<String> {
    stream
        .get_ref()
        .1
        .alpn_protocol()
        .map(|proto| String::from_utf8_lossy(proto).into_owned())
}
