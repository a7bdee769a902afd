//! HTTP server publishing the output directory and a small JSON API.
//!
//! Routes:
//! - `GET /` and `GET /api/status`: server, scheduler and file status
//! - `GET /api/refresh`: start a refresh through the scheduler
//! - `GET /<file>`: a file from the output directory
//!
//! `OPTIONS` answers 204; every other method 405.

use std::fs::{self, File};
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use log::{error, info, warn};
use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, Server};

use crate::domain::{AppError, Settings};
use crate::ports::{RefreshControl, RefreshStatus};

const COMMON_HEADERS: &[(&str, &str)] = &[
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, OPTIONS"),
    ("Cache-Control", "no-cache, no-store, must-revalidate"),
];

/// An `.xml` file in the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

/// `.xml` files directly inside `dir`, sorted by name. Unreadable entries
/// are skipped.
pub fn list_xml_files(dir: &Path) -> Vec<XmlFile> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<XmlFile> = entries
        .filter_map(Result::ok)
        .filter(|entry| {
            entry.path().extension().is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        })
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            meta.is_file().then(|| XmlFile {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
                size: meta.len(),
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            })
        })
        .collect();
    files.sort_by(|a, b| a.name.cmp(&b.name));
    files
}

/// Outward-facing IPv4 address of this host, `localhost` when it cannot be
/// determined. No packets are sent.
pub fn local_ip() -> String {
    UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| "localhost".to_string())
}

struct Running {
    server: Arc<Server>,
    handle: JoinHandle<()>,
    addr: SocketAddr,
}

/// Background HTTP server over the configured output directory.
pub struct EpgServer {
    settings: Arc<Mutex<Settings>>,
    refresh: Option<Arc<dyn RefreshControl>>,
    running: Option<Running>,
}

impl EpgServer {
    pub fn new(settings: Arc<Mutex<Settings>>, refresh: Option<Arc<dyn RefreshControl>>) -> Self {
        Self { settings, refresh, running: None }
    }

    /// Bind `server_host:server_port` and serve on a background thread.
    ///
    /// Calling `start` on a running server returns the bound address.
    pub fn start(&mut self) -> Result<SocketAddr, AppError> {
        if let Some(running) = &self.running {
            info!("Server already running on {}", running.addr);
            return Ok(running.addr);
        }

        let (bind, output_dir) = {
            let settings = self.settings.lock().unwrap_or_else(|e| e.into_inner());
            let bind = format!("{}:{}", settings.server_host, settings.server_port);
            (bind, settings.output_dir.clone())
        };
        fs::create_dir_all(&output_dir)?;

        let server = Server::http(bind.as_str())
            .map_err(|e| AppError::ServerStart { addr: bind.clone(), details: e.to_string() })?;
        let addr = server.server_addr().to_ip().ok_or_else(|| AppError::ServerStart {
            addr: bind.clone(),
            details: "not bound to an IP address".to_string(),
        })?;

        let server = Arc::new(server);
        let handler =
            RequestHandler { settings: Arc::clone(&self.settings), refresh: self.refresh.clone() };
        let worker = Arc::clone(&server);
        let handle = thread::Builder::new()
            .name("epg-server".to_string())
            .spawn(move || {
                for request in worker.incoming_requests() {
                    handler.handle(request);
                }
            })?;

        info!("EPG server started on http://{}/", addr);
        self.running = Some(Running { server, handle, addr });
        Ok(addr)
    }

    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.server.unblock();
            if running.handle.join().is_err() {
                error!("EPG server thread panicked");
            }
            info!("EPG server stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|running| !running.handle.is_finished())
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.addr)
    }
}

impl Drop for EpgServer {
    fn drop(&mut self) {
        self.stop();
    }
}

enum Reply {
    Json(Vec<u8>),
    File(File, &'static str),
    Text(u16, &'static str),
    Empty(u16),
}

#[derive(Serialize)]
struct StatusReport {
    server: &'static str,
    time: String,
    config: ConfigSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    scheduler: Option<RefreshStatus>,
    files: Vec<FileEntry>,
}

#[derive(Serialize)]
struct ConfigSummary {
    lineup_ids: Vec<String>,
    espn_plus_enabled: bool,
    output_dir: String,
}

#[derive(Serialize)]
struct FileEntry {
    name: String,
    size: u64,
    modified: String,
}

#[derive(Serialize)]
struct RefreshReply {
    status: &'static str,
    message: &'static str,
}

struct RequestHandler {
    settings: Arc<Mutex<Settings>>,
    refresh: Option<Arc<dyn RefreshControl>>,
}

impl RequestHandler {
    fn handle(&self, request: Request) {
        let method = request.method().clone();
        let url = request.url().to_string();
        let remote = request.remote_addr().map_or_else(|| "-".to_string(), |a| a.to_string());

        let reply = match method {
            Method::Get => self.get(&url).unwrap_or_else(|e| {
                error!("[HTTP] Error handling {}: {}", url, e);
                Reply::Text(500, "Internal Server Error")
            }),
            Method::Options => Reply::Empty(204),
            _ => Reply::Text(405, "Method Not Allowed"),
        };

        match send(request, reply) {
            Ok(status) => info!("[HTTP] {} - \"{} {}\" {}", remote, method, url, status),
            Err(e) => warn!("[HTTP] {} - failed to send response: {}", remote, e),
        }
    }

    fn get(&self, url: &str) -> Result<Reply, AppError> {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        match path.trim_start_matches('/') {
            "" | "api/status" => Ok(Reply::Json(serde_json::to_vec_pretty(&self.status())?)),
            "api/refresh" => Ok(Reply::Json(serde_json::to_vec_pretty(&self.trigger_refresh())?)),
            file => self.file(file),
        }
    }

    fn status(&self) -> StatusReport {
        let (config, output_dir) = {
            let settings = self.settings.lock().unwrap_or_else(|e| e.into_inner());
            let config = ConfigSummary {
                lineup_ids: settings.lineup_ids.clone(),
                espn_plus_enabled: settings.espn_plus_enabled,
                output_dir: settings.output_dir.display().to_string(),
            };
            (config, settings.output_dir.clone())
        };

        let files = list_xml_files(&output_dir)
            .into_iter()
            .map(|file| FileEntry {
                name: file.name,
                size: file.size,
                modified: DateTime::<Local>::from(file.modified).to_rfc3339(),
            })
            .collect();

        StatusReport {
            server: "running",
            time: Local::now().to_rfc3339(),
            config,
            scheduler: self.refresh.as_ref().map(|r| r.status()),
            files,
        }
    }

    fn trigger_refresh(&self) -> RefreshReply {
        match &self.refresh {
            Some(refresh) => {
                refresh.refresh_now();
                RefreshReply { status: "refresh_started", message: "EPG refresh triggered" }
            }
            None => RefreshReply { status: "error", message: "Scheduler not available" },
        }
    }

    /// Resolve `path` inside the output directory. Anything that escapes
    /// it, or is not a regular file, is reported as missing.
    fn file(&self, path: &str) -> Result<Reply, AppError> {
        let not_found = Ok(Reply::Text(404, "File not found"));

        let Ok(decoded) = urlencoding::decode(path) else {
            return not_found;
        };
        let output_dir = self.settings.lock().unwrap_or_else(|e| e.into_inner()).output_dir.clone();
        let Ok(base) = output_dir.canonicalize() else {
            return not_found;
        };
        let Ok(resolved) = base.join(decoded.as_ref()).canonicalize() else {
            return not_found;
        };
        if !resolved.starts_with(&base) || !resolved.is_file() {
            return not_found;
        }

        let file = File::open(&resolved)?;
        Ok(Reply::File(file, content_type(&resolved)))
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("xml") => "text/xml",
        Some("json") => "application/json",
        Some("gz") => "application/gzip",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

fn header(name: &str, value: &str) -> Header {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).expect("static header")
}

fn with_common<R: io::Read>(mut response: Response<R>) -> Response<R> {
    for (name, value) in COMMON_HEADERS {
        response.add_header(header(name, value));
    }
    response
}

fn send(request: Request, reply: Reply) -> io::Result<u16> {
    match reply {
        Reply::Json(body) => {
            let response = Response::from_data(body)
                .with_header(header("Content-Type", "application/json"));
            request.respond(with_common(response))?;
            Ok(200)
        }
        Reply::File(file, mime) => {
            let response = Response::from_file(file).with_header(header("Content-Type", mime));
            request.respond(with_common(response))?;
            Ok(200)
        }
        Reply::Text(status, text) => {
            let response = Response::from_string(text)
                .with_status_code(status)
                .with_header(header("Content-Type", "text/plain; charset=utf-8"));
            request.respond(with_common(response))?;
            Ok(status)
        }
        Reply::Empty(status) => {
            request.respond(with_common(Response::empty(status)))?;
            Ok(status)
        }
    }
}
