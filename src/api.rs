//! iptv-org directory API client

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::directory;
use crate::error::{Error, Result};
use crate::models::{ChannelMeta, LogoEntry, MergedChannel, StreamEntry};

pub const IPTV_API_BASE: &str = "https://iptv-org.github.io/api";

/// channels.json alone is several megabytes and grows
const MAX_DIRECTORY_BYTES: u64 = 128 * 1024 * 1024;
const MAX_LOGO_BYTES: u64 = 4 * 1024 * 1024;

#[derive(Clone)]
pub struct DirectoryClient {
    base: String,
    agent: ureq::Agent,
    user_agent: String,
}

impl DirectoryClient {
    pub fn new(base: &str, timeout_secs: u64) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(timeout_secs)))
            .timeout_connect(Some(Duration::from_secs(timeout_secs.min(15))))
            .build()
            .new_agent();

        Self {
            base: base.trim_end_matches('/').to_string(),
            agent,
            user_agent: format!("OwnTV/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    fn endpoint(&self, file: &str) -> String {
        format!("{}/{}", self.base, file)
    }

    fn get(&self, url: &str, accept: &str) -> Result<ureq::http::Response<ureq::Body>> {
        tracing::debug!("GET {}", url);

        let response = self
            .agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", accept)
            .call()?;

        if response.status() != 200 {
            return Err(Error::Status(response.status().as_u16()));
        }
        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let mut response = self.get(&self.endpoint(file), "application/json")?;

        // Stream straight into serde instead of buffering the whole body
        let reader = response.body_mut().with_config().limit(MAX_DIRECTORY_BYTES).reader();
        Ok(serde_json::from_reader(reader)?)
    }

    /// Raw bytes of an absolute URL, used for channel logos
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let mut response = self.get(url, "image/*")?;
        Ok(response.body_mut().with_config().limit(MAX_LOGO_BYTES).read_to_vec()?)
    }

    pub fn get_channels(&self) -> Result<Vec<ChannelMeta>> {
        self.get_json("channels.json")
    }

    pub fn get_streams(&self) -> Result<Vec<StreamEntry>> {
        self.get_json("streams.json")
    }

    pub fn get_logos(&self) -> Result<Vec<LogoEntry>> {
        self.get_json("logos.json")
    }

    /// Fetch the three collections concurrently and merge them.
    ///
    /// A failing endpoint counts as an empty collection; the others still load.
    pub fn fetch_merged(&self) -> Vec<MergedChannel> {
        let (channels, streams, logos) = std::thread::scope(|s| {
            let channels = s.spawn(|| soft("channels", self.get_channels()));
            let streams = s.spawn(|| soft("streams", self.get_streams()));
            let logos = s.spawn(|| soft("logos", self.get_logos()));
            (join_soft(channels), join_soft(streams), join_soft(logos))
        });

        tracing::info!(
            "Directory fetched: {} channels, {} streams, {} logos",
            channels.len(),
            streams.len(),
            logos.len()
        );
        directory::merge(&channels, &streams, &logos)
    }
}

fn soft<T>(what: &str, result: Result<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!("Error fetching {}: {}", what, e);
        Vec::new()
    })
}

fn join_soft<T>(handle: std::thread::ScopedJoinHandle<'_, Vec<T>>) -> Vec<T> {
    handle.join().unwrap_or_else(|_| {
        tracing::error!("Directory fetch thread panicked");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Serve `body` once as a 200 JSON response; returns the base URL
    fn serve_once(body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(body.as_bytes()).unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let client = DirectoryClient::new("https://example.com/api/", 5);
        assert_eq!(client.endpoint("streams.json"), "https://example.com/api/streams.json");
    }

    #[test]
    fn test_unreachable_directory_fails_soft() {
        // Port 9 (discard) on localhost is closed in test environments
        let client = DirectoryClient::new("http://127.0.0.1:9", 2);
        assert!(client.get_channels().is_err());
        assert!(client.fetch_merged().is_empty());
        assert!(client.get_bytes("http://127.0.0.1:9/logo.png").is_err());
    }

    #[test]
    fn test_large_directory_body_is_parsed() {
        // Bigger than ureq's 10 MB read_to_string default
        let count = 300_000;
        let entries: Vec<String> = (0..count)
            .map(|i| format!(r#"{{"id":"channel{:06}.tr","name":"Channel number {:06}","categories":["general"]}}"#, i, i))
            .collect();
        let body = format!("[{}]", entries.join(","));
        assert!(body.len() > 10 * 1024 * 1024);

        let client = DirectoryClient::new(&serve_once(body), 30);
        let channels = client.get_channels().unwrap();
        assert_eq!(channels.len(), count);
        assert_eq!(channels[count - 1].id.as_deref(), Some("channel299999.tr"));
    }
}
