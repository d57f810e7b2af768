//! Where the configuration document comes from.
//!
//! Every fetch goes back to the origin. Files are re-read from disk and HTTP
//! requests carry no-cache headers plus a cache-busting query parameter.

use std::io::Read;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::WatchConfig;
use crate::error::{Result, WatchError};

/// Largest configuration response accepted over HTTP.
const MAX_RESPONSE_BYTES: u64 = 1_048_576;

pub trait ConfigSource {
    /// Human-readable location for status and log lines.
    fn describe(&self) -> String;

    /// Fetch the raw document text.
    fn fetch(&self) -> Result<String>;
}

/// Fetch, parse and validate a configuration document.
pub fn load_config(source: &dyn ConfigSource) -> Result<WatchConfig> {
    let text = source.fetch()?;
    WatchConfig::from_json(&text)
}

/// Pick a source from a location string: `http://` URLs go over the network,
/// anything else is a file path.
pub fn source_for(location: &str) -> Result<Box<dyn ConfigSource>> {
    if location.starts_with("https://") {
        return Err(WatchError::ConfigLoad(
            "https is not supported; serve the config over http or use a file path".to_string(),
        ));
    }
    if location.starts_with("http://") {
        return Ok(Box::new(HttpSource::new(location)?));
    }
    Ok(Box::new(FileSource::new(location)))
}

/// Reads the document from disk on every fetch.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: std::path::PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .map_err(|e| WatchError::ConfigLoad(format!("{}: {}", self.path.display(), e)))
    }
}

/// Plain-HTTP fetch of a document such as `http://127.0.0.1:8000/config.json`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    host: String,
    port: u16,
    path: String,
}

impl HttpSource {
    pub fn new(url: &str) -> Result<Self> {
        let (host, port, path) = parse_url(url).map_err(WatchError::ConfigLoad)?;
        Ok(Self { host, port, path })
    }

    fn request_target(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let separator = if self.path.contains('?') { '&' } else { '?' };
        format!("{}{}cacheBust={}", self.path, separator, millis)
    }
}

impl ConfigSource for HttpSource {
    fn describe(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.path)
    }

    fn fetch(&self) -> Result<String> {
        http_get(&self.host, self.port, &self.request_target()).map_err(WatchError::ConfigLoad)
    }
}

/// Split `http://host[:port][/path]` into its parts. The port defaults to 80
/// and the path to `/`.
pub fn parse_url(url: &str) -> std::result::Result<(String, u16, String), String> {
    let rest = url
        .strip_prefix("http://")
        .ok_or_else(|| "url must start with http://".to_string())?;
    let (authority, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };
    let mut parts = authority.split(':');
    let host = parts.next().unwrap_or_default().trim().to_string();
    if host.is_empty() {
        return Err("empty hostname".to_string());
    }
    let port = parts
        .next()
        .unwrap_or("80")
        .trim()
        .parse::<u16>()
        .map_err(|_| "invalid port".to_string())?;
    Ok((host, port, path.to_string()))
}

/// Parse an HTTP status line like "HTTP/1.0 200 OK" and return the status code
/// for 2xx responses, or an error for non-2xx or malformed lines.
pub fn parse_http_status(status_line: &str) -> std::result::Result<u16, String> {
    let parts: Vec<&str> = status_line.splitn(3, ' ').collect();
    if parts.len() < 2 {
        return Err("invalid HTTP status line".to_string());
    }
    let code: u16 = parts[1]
        .parse()
        .map_err(|_| "invalid HTTP status code".to_string())?;
    if (200..300).contains(&code) {
        Ok(code)
    } else {
        let reason = parts.get(2).copied().unwrap_or("Unknown");
        Err(format!("HTTP {} {}", code, reason.trim()))
    }
}

/// Split a raw response into its body after checking the status line.
pub fn response_body(raw: &str) -> std::result::Result<&str, String> {
    let first_line = raw
        .lines()
        .next()
        .ok_or_else(|| "empty response".to_string())?;
    parse_http_status(first_line)?;
    let (_, body) = raw
        .split_once("\r\n\r\n")
        .ok_or_else(|| "invalid http response".to_string())?;
    Ok(body)
}

/// Send a GET and return the body.
///
/// HTTP/1.0 keeps the server from answering with a chunked body.
fn http_get(host: &str, port: u16, target: &str) -> std::result::Result<String, String> {
    use std::io::Write;
    use std::net::{TcpStream, ToSocketAddrs};
    use std::time::Duration;

    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|_| format!("failed to resolve {}", host))?
        .next()
        .ok_or_else(|| format!("failed to resolve {}", host))?;

    let mut stream = TcpStream::connect_timeout(&addr, Duration::from_secs(5))
        .map_err(|e| format!("connection to {}:{} failed: {}", host, port, e))?;
    stream
        .set_read_timeout(Some(Duration::from_secs(30)))
        .map_err(|_| "failed to set read timeout".to_string())?;
    stream
        .set_write_timeout(Some(Duration::from_secs(30)))
        .map_err(|_| "failed to set write timeout".to_string())?;

    let req = format!(
        "GET {} HTTP/1.0\r\nHost: {}\r\nAccept: application/json\r\nCache-Control: no-store\r\nPragma: no-cache\r\nConnection: close\r\n\r\n",
        target, host
    );
    stream
        .write_all(req.as_bytes())
        .map_err(|_| "write failed".to_string())?;

    let raw = read_response(stream)?;
    response_body(&raw).map(str::to_string)
}

/// Read a whole response, refusing anything past `MAX_RESPONSE_BYTES`.
fn read_response<R: std::io::Read>(reader: R) -> std::result::Result<String, String> {
    let mut raw = Vec::new();
    reader
        .take(MAX_RESPONSE_BYTES + 1)
        .read_to_end(&mut raw)
        .map_err(|_| "read failed".to_string())?;
    if raw.len() as u64 > MAX_RESPONSE_BYTES {
        return Err("response exceeds 1 MiB".to_string());
    }
    String::from_utf8(raw).map_err(|_| "response is not valid UTF-8".to_string())
}
