// Copyright (c) 2025 - Cowboy AI, Inc.
//! Connectivity Probes
//!
//! - [`TcpProbe`]: DNS lookup, then a plain TCP connect
//! - [`HttpProbe`]: single request, redirects not followed
//! - [`PingProbe`]: RESP `PING` over TCP
//!
//! Probes do not enforce their own deadline; the dispatcher wraps every
//! [`Probe::check`] future in `tokio::time::timeout` and drops it on expiry.

use async_trait::async_trait;
use reqwest::{Client, Method};
use std::error::Error as StdError;
use std::io;
use std::net::{IpAddr, SocketAddr};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{lookup_host, TcpStream};
use tracing::debug;

use super::result::ProbeError;
use super::strategy::CheckKind;

/// Uniform interface over check strategies
#[async_trait]
pub trait Probe: Send + Sync {
    fn kind(&self) -> CheckKind;

    /// Run the check once
    ///
    /// `Ok` may carry an informational note for a healthy target.
    async fn check(&self) -> Result<Option<String>, ProbeError>;
}

fn classify_io(err: &io::Error, endpoint: &str) -> ProbeError {
    match err.kind() {
        io::ErrorKind::ConnectionRefused => ProbeError::ConnectionRefused {
            endpoint: endpoint.to_string(),
        },
        io::ErrorKind::TimedOut => ProbeError::Timeout(endpoint.to_string()),
        _ => ProbeError::Network(err.to_string()),
    }
}

async fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>, ProbeError> {
    let addrs: Vec<SocketAddr> = lookup_host((host, port))
        .await
        .map_err(|e| ProbeError::Dns {
            host: host.to_string(),
            reason: e.to_string(),
        })?
        .collect();

    if addrs.is_empty() {
        return Err(ProbeError::Dns {
            host: host.to_string(),
            reason: "no addresses returned".to_string(),
        });
    }
    Ok(addrs)
}

async fn connect(host: &str, port: u16) -> Result<TcpStream, ProbeError> {
    let endpoint = format!("{}:{}", host, port);
    let addrs = resolve(host, port).await?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!(%addr, error = %e, "connect failed");
                last_err = Some(classify_io(&e, &endpoint));
            }
        }
    }

    Err(last_err.unwrap_or_else(|| ProbeError::Network(format!("cannot connect to {}", endpoint))))
}

/// TCP connect check
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

#[async_trait]
impl Probe for TcpProbe {
    fn kind(&self) -> CheckKind {
        CheckKind::Tcp
    }

    async fn check(&self) -> Result<Option<String>, ProbeError> {
        connect(&self.host, self.port).await.map(|_| None)
    }
}

/// Redis-compatible `PING`
#[derive(Debug, Clone)]
pub struct PingProbe {
    host: String,
    port: u16,
}

impl PingProbe {
    const PING: &'static [u8] = b"*1\r\n$4\r\nPING\r\n";

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Interpret the first reply bytes
    pub(crate) fn interpret(reply: &[u8]) -> Result<Option<String>, ProbeError> {
        if reply.starts_with(b"+PONG") {
            return Ok(None);
        }
        // The server answered; it only wants credentials
        if reply.starts_with(b"-NOAUTH") {
            return Ok(Some("auth required".to_string()));
        }
        if reply.is_empty() {
            return Err(ProbeError::UnexpectedResponse(
                "connection closed without reply".to_string(),
            ));
        }

        let line = String::from_utf8_lossy(reply);
        let line: String = line.lines().next().unwrap_or_default().chars().take(50).collect();
        Err(ProbeError::UnexpectedResponse(line))
    }
}

#[async_trait]
impl Probe for PingProbe {
    fn kind(&self) -> CheckKind {
        CheckKind::Ping
    }

    async fn check(&self) -> Result<Option<String>, ProbeError> {
        let mut stream = connect(&self.host, self.port).await?;
        stream
            .write_all(Self::PING)
            .await
            .map_err(|e| ProbeError::Network(e.to_string()))?;

        let mut buf = [0u8; 1024];
        let n = stream
            .read(&mut buf)
            .await
            .map_err(|e| ProbeError::Network(e.to_string()))?;

        Self::interpret(&buf[..n])
    }
}

/// Single HTTP(S) request; success is a status in the accepted set
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    method: Method,
    url: String,
    tls: bool,
    expected_status: Vec<u16>,
}

impl HttpProbe {
    /// `client` must not follow redirects; see [`http_client`]
    pub fn new(client: Client, method: Method, url: impl Into<String>, tls: bool) -> Self {
        Self {
            client,
            method,
            url: url.into(),
            tls,
            expected_status: Vec::new(),
        }
    }

    /// Accept exactly these codes instead of 200-399
    pub fn expect_status(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.expected_status = codes.into_iter().collect();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn accepts(&self, status: u16) -> bool {
        if self.expected_status.is_empty() {
            (200..400).contains(&status)
        } else {
            self.expected_status.contains(&status)
        }
    }

    /// Host name and port to look up before the request; `None` for IP literals
    fn lookup_target(&self) -> Option<(String, u16)> {
        let url = reqwest::Url::parse(&self.url).ok()?;
        let host = url.host_str()?.trim_start_matches('[').trim_end_matches(']');
        if host.parse::<IpAddr>().is_ok() {
            return None;
        }
        Some((host.to_string(), url.port_or_known_default()?))
    }

    /// Fallback classification of client errors; DNS failures are normally
    /// caught by the lookup in [`Probe::check`]
    fn classify(&self, err: reqwest::Error) -> ProbeError {
        if err.is_timeout() {
            return ProbeError::Timeout(self.url.clone());
        }

        let mut source = err.source();
        while let Some(cause) = source {
            if let Some(io_err) = cause.downcast_ref::<io::Error>() {
                return classify_io(io_err, &self.url);
            }
            if cause.to_string().contains("dns error") {
                return ProbeError::Dns {
                    host: err
                        .url()
                        .and_then(|u| u.host_str())
                        .unwrap_or_default()
                        .to_string(),
                    reason: cause.to_string(),
                };
            }
            source = cause.source();
        }

        ProbeError::Network(err.to_string())
    }
}

/// HTTP client shared by all HTTP probes of a checker
pub fn http_client() -> reqwest::Result<Client> {
    Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(concat!("infralink/", env!("CARGO_PKG_VERSION")))
        .build()
}

#[async_trait]
impl Probe for HttpProbe {
    fn kind(&self) -> CheckKind {
        if self.tls {
            CheckKind::Https
        } else {
            CheckKind::Http
        }
    }

    async fn check(&self) -> Result<Option<String>, ProbeError> {
        if let Some((host, port)) = self.lookup_target() {
            resolve(&host, port).await?;
        }

        let response = self
            .client
            .request(self.method.clone(), &self.url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        if self.accepts(status) {
            Ok(None)
        } else {
            Err(ProbeError::BadStatus(status))
        }
    }
}
