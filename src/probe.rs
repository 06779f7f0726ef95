//! Checks against the Lavalink service.
//!
//! Both probes answer with a plain `bool`: a closed port or a failing health
//! check is an expected outcome, not an error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use tokio::net::TcpStream;
use tracing::debug;
use tracing::instrument;
use url::Url;

use crate::error::LauncherError;
use crate::setup::Config;

/// Reachability checks for the dependent service.
#[async_trait]
pub trait ServiceProbe: Send + Sync {
    /// Is something accepting TCP connections on the service's port?
    async fn port_open(&self) -> bool;

    /// Does the service answer its version endpoint with a success status?
    async fn healthy(&self) -> bool;
}

/// Probes a Lavalink node over TCP and HTTP.
#[derive(Debug)]
pub struct LavalinkProbe {
    host: String,
    port: u16,
    connect_timeout: Duration,
    version_url: Url,
    password: String,
    /// Internally uses an Arc, one per run is enough.
    client: reqwest::Client,
}

impl LavalinkProbe {
    pub fn new(config: &Config) -> Result<Self, LauncherError> {
        let client = reqwest::Client::builder()
            .timeout(config.probe_timeout())
            .no_proxy()
            .build()?;

        Ok(Self {
            host: config.host().to_string(),
            port: config.port(),
            connect_timeout: config.connect_timeout(),
            version_url: config.version_url()?,
            password: config.password().to_string(),
            client,
        })
    }
}

#[async_trait]
impl ServiceProbe for LavalinkProbe {
    #[instrument(level = "debug", skip(self), fields(host = %self.host, port = self.port))]
    async fn port_open(&self) -> bool {
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                debug!("Port closed: {e}");
                false
            }
            Err(_) => {
                debug!("Port probe timed out.");
                false
            }
        }
    }

    #[instrument(level = "debug", skip(self), fields(url = %self.version_url))]
    async fn healthy(&self) -> bool {
        let request = self
            .client
            .get(self.version_url.clone())
            .header(AUTHORIZATION, &self.password);

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                debug!("Health check answered {status}");
                status.is_success()
            }
            Err(e) => {
                debug!("Health check failed: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod test {
    use tokio::io::AsyncReadExt;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    fn config_for(port: u16) -> Config {
        let content = format!(
            "[lavalink]\nhost = \"127.0.0.1\"\nport = {port}\nprobe_timeout_secs = 2\nconnect_timeout_ms = 500\n"
        );
        Config::parse(&content).unwrap()
    }

    /// Serves a single HTTP response with `status_line` and returns the request it saw.
    async fn serve_once(status_line: &'static str) -> (u16, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response =
                format!("{status_line}\r\nContent-Length: 5\r\nConnection: close\r\n\r\n4.0.8");
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (port, handle)
    }

    #[tokio::test]
    async fn healthy_on_200_and_sends_password() {
        let (port, server) = serve_once("HTTP/1.1 200 OK").await;
        let probe = LavalinkProbe::new(&config_for(port)).unwrap();

        assert!(probe.healthy().await);

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /version "), "{request}");
        assert!(request.contains("authorization: youshallnotpass"), "{request}");
    }

    #[tokio::test]
    async fn unhealthy_on_error_status() {
        let (port, server) = serve_once("HTTP/1.1 401 Unauthorized").await;
        let probe = LavalinkProbe::new(&config_for(port)).unwrap();

        assert!(!probe.healthy().await);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn open_port_is_detected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let probe = LavalinkProbe::new(&config_for(port)).unwrap();

        assert!(probe.port_open().await);
    }

    #[tokio::test]
    async fn closed_port_fails_both_probes() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let probe = LavalinkProbe::new(&config_for(port)).unwrap();

        assert!(!probe.port_open().await);
        assert!(!probe.healthy().await);
    }
}
