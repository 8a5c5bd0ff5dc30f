use crate::error::{DashboardError, Result};
use reqwest::blocking::Client;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Fixed request timeout for the source download.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Something that can hand back the raw CSV bytes.
pub trait Source {
    fn fetch(&self) -> Result<Vec<u8>>;

    /// Human-readable location, used in log lines and messages.
    fn location(&self) -> &str;
}

/// Downloads the dataset with a single blocking GET.
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("cpi_dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpSource {
            client,
            url: url.into(),
        })
    }
}

impl Source for HttpSource {
    fn fetch(&self) -> Result<Vec<u8>> {
        let started = Instant::now();
        let body = self
            .client
            .get(&self.url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.bytes())
            .map_err(|e| {
                warn!(url = %self.url, error = %e, "source download failed");
                DashboardError::Fetch(format!("GET {}: {}", self.url, e))
            })?;
        info!(
            url = %self.url,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "downloaded source CSV"
        );
        Ok(body.to_vec())
    }

    fn location(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve exactly one canned HTTP response and return the URL to hit.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let resp = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(resp.as_bytes()).unwrap();
        });
        format!("http://{}/cpi.csv", addr)
    }

    #[test]
    fn returns_body_on_success() {
        let url = serve_once("200 OK", "date,state,division,index\n");
        let source = HttpSource::new(url.clone()).unwrap();
        assert_eq!(source.location(), url);
        let body = source.fetch().unwrap();
        assert_eq!(body, b"date,state,division,index\n");
    }

    #[test]
    fn server_error_is_a_fetch_error() {
        let url = serve_once("500 Internal Server Error", "");
        let source = HttpSource::new(url).unwrap();
        let err = source.fetch().unwrap_err();
        assert!(matches!(err, DashboardError::Fetch(ref m) if m.contains("500")));
    }

    #[test]
    fn unreachable_host_is_a_fetch_error() {
        // bind then drop so the port is almost certainly closed
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let source = HttpSource::new(format!("http://127.0.0.1:{}/", port)).unwrap();
        assert!(matches!(source.fetch(), Err(DashboardError::Fetch(_))));
    }
}
