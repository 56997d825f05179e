//! Headless Chromium driven over the Chrome DevTools Protocol.
//!
//! The browser is started with `--remote-debugging-port=0` and a throw-away
//! profile directory. It prints its WebSocket endpoint on stderr; a
//! `tungstenite` client then speaks the flattened-session protocol:
//!
//! ```text
//! → {"id":1,"method":"Target.createTarget","params":{...}}
//! ← {"id":1,"result":{"targetId":"..."}}
//! → {"id":2,"method":"Target.attachToTarget","params":{"flatten":true,...}}
//! → {"id":3,"sessionId":"...","method":"Page.navigate",...}
//! ← {"method":"Page.lifecycleEvent","sessionId":"...","params":{...}}
//! ```
//!
//! The process is owned by a guard that kills it and removes the profile
//! directory on drop, so every exit path releases it.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use serde_json::{Value, json};
use tempfile::TempDir;
use thiserror::Error;
use tungstenite::protocol::Message;
use tungstenite::{WebSocket, client};
use url::Url;

use super::{BrowserLauncher, BrowserSession};
use crate::core::is_shutdown;
use crate::debug;

/// Browser binaries searched on PATH, in order.
const BROWSER_CANDIDATES: [&str; 5] = [
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

/// Upper bound for the browser to print its endpoint.
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Upper bound for `Browser.close` to be acknowledged.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Socket read timeout; deadlines and Ctrl+C are checked this often.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const ENDPOINT_PREFIX: &str = "DevTools listening on ";

#[derive(Debug, Error)]
pub enum CdpError {
    #[error("no browser found (tried {0})")]
    BrowserNotFound(String),

    #[error("failed to launch {}: {source}", .path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("browser exited without reporting a DevTools endpoint")]
    NoEndpoint,

    #[error("invalid DevTools endpoint `{0}`")]
    Endpoint(String),

    #[error("DevTools connection failed: {0}")]
    Connect(String),

    #[error("DevTools connection error: {0}")]
    Socket(#[from] tungstenite::Error),

    #[error("DevTools connection closed by the browser")]
    Closed,

    #[error("malformed DevTools message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{method} failed: {message}")]
    Protocol { method: String, message: String },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("page script failed: {0}")]
    Script(String),

    #[error("interrupted")]
    Interrupted,
}

// ============================================================================
// Launcher
// ============================================================================

/// Starts a local Chromium-family browser.
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    browser: Option<PathBuf>,
}

impl ChromeLauncher {
    /// `browser` is an explicit binary (path or name on PATH); `None`
    /// searches the usual Chromium and Chrome names.
    pub fn new(browser: Option<PathBuf>) -> Self {
        Self { browser }
    }
}

impl BrowserLauncher for ChromeLauncher {
    type Session = ChromeSession;

    fn launch(&self) -> Result<ChromeSession, CdpError> {
        let path = find_browser(self.browser.as_deref())?;
        debug!("a11y"; "launching {}", path.display());

        let launch_err = |source| CdpError::Launch {
            path: path.clone(),
            source,
        };
        let profile = tempfile::Builder::new()
            .prefix("sitekit-browser-")
            .tempdir()
            .map_err(launch_err)?;

        let mut child = Command::new(&path)
            .args([
                "--headless=new",
                "--no-sandbox",
                "--disable-setuid-sandbox",
                "--disable-gpu",
                "--no-first-run",
                "--no-default-browser-check",
                "--remote-debugging-port=0",
            ])
            .arg(format!("--user-data-dir={}", profile.path().display()))
            .arg("about:blank")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(launch_err)?;

        let stderr = child.stderr.take();
        let process = BrowserProcess {
            child,
            _profile: profile,
        };
        let stderr = stderr.ok_or(CdpError::NoEndpoint)?;

        let endpoint = wait_for_endpoint(stderr, LAUNCH_TIMEOUT)?;
        debug!("a11y"; "DevTools endpoint {}", endpoint);
        let socket = connect(&endpoint)?;

        Ok(ChromeSession {
            socket,
            next_id: 1,
            session_id: None,
            events: VecDeque::new(),
            process,
        })
    }
}

fn find_browser(explicit: Option<&Path>) -> Result<PathBuf, CdpError> {
    if let Some(browser) = explicit {
        return which::which(browser)
            .map_err(|_| CdpError::BrowserNotFound(browser.display().to_string()));
    }
    BROWSER_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or_else(|| CdpError::BrowserNotFound(BROWSER_CANDIDATES.join(", ")))
}

/// Extract the WebSocket URL from a browser stderr line.
fn endpoint_from_line(line: &str) -> Option<&str> {
    line.trim()
        .strip_prefix(ENDPOINT_PREFIX)
        .map(str::trim)
        .filter(|url| url.starts_with("ws://"))
}

/// Read stderr on a helper thread until the endpoint line appears.
///
/// The thread keeps draining stderr afterwards so the browser never blocks
/// on a full pipe; it ends when the process exits.
fn wait_for_endpoint(stderr: ChildStderr, timeout: Duration) -> Result<String, CdpError> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut tx = Some(tx);
        for line in BufReader::new(stderr).lines().map_while(Result::ok) {
            if let Some(url) = endpoint_from_line(&line)
                && let Some(tx) = tx.take()
            {
                let _ = tx.send(url.to_owned());
            }
        }
    });

    match rx.recv_timeout(timeout) {
        Ok(url) => Ok(url),
        Err(mpsc::RecvTimeoutError::Timeout) => Err(CdpError::Timeout("the browser to start")),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(CdpError::NoEndpoint),
    }
}

fn connect(endpoint: &str) -> Result<WebSocket<TcpStream>, CdpError> {
    let url = Url::parse(endpoint).map_err(|_| CdpError::Endpoint(endpoint.to_owned()))?;
    let host = url
        .host_str()
        .ok_or_else(|| CdpError::Endpoint(endpoint.to_owned()))?;
    let port = url
        .port()
        .ok_or_else(|| CdpError::Endpoint(endpoint.to_owned()))?;

    let stream =
        TcpStream::connect((host, port)).map_err(|e| CdpError::Connect(e.to_string()))?;
    let (socket, _) = client(endpoint, stream).map_err(|e| CdpError::Connect(e.to_string()))?;
    // Handshake done in blocking mode; reads now return periodically.
    socket
        .get_ref()
        .set_read_timeout(Some(POLL_INTERVAL))
        .map_err(|e| CdpError::Connect(e.to_string()))?;
    Ok(socket)
}

/// Owns the browser process and its profile directory.
struct BrowserProcess {
    child: Child,
    _profile: TempDir,
}

impl BrowserProcess {
    fn terminate(&mut self) {
        if let Ok(Some(_)) = self.child.try_wait() {
            return;
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for BrowserProcess {
    fn drop(&mut self) {
        // Fields drop after this, so the profile is removed once the process is gone.
        self.terminate();
    }
}

// ============================================================================
// Session
// ============================================================================

/// One attached page in a running browser.
pub struct ChromeSession {
    socket: WebSocket<TcpStream>,
    next_id: u64,
    /// Flattened session of the page target, once attached.
    session_id: Option<String>,
    /// Events received while waiting for a command response.
    events: VecDeque<Value>,
    process: BrowserProcess,
}

impl ChromeSession {
    /// Send a command and wait for its response.
    fn call(&mut self, method: &str, params: Value, deadline: Instant) -> Result<Value, CdpError> {
        let id = self.next_id;
        self.next_id += 1;

        let mut message = json!({ "id": id, "method": method, "params": params });
        if let Some(session) = &self.session_id {
            message["sessionId"] = json!(session);
        }
        self.socket.send(Message::Text(message.to_string().into()))?;

        loop {
            let message = self.read_message(deadline, "a DevTools response")?;
            if message.get("id").and_then(Value::as_u64) != Some(id) {
                if message.get("method").is_some() {
                    self.events.push_back(message);
                }
                continue;
            }
            if let Some(error) = message.get("error") {
                return Err(CdpError::Protocol {
                    method: method.to_owned(),
                    message: error
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_owned(),
                });
            }
            return Ok(message.get("result").cloned().unwrap_or(Value::Null));
        }
    }

    /// Next event, buffered ones first.
    fn next_event(&mut self, deadline: Instant, waiting_for: &'static str) -> Result<Value, CdpError> {
        match self.events.pop_front() {
            Some(event) => Ok(event),
            None => self.read_message(deadline, waiting_for),
        }
    }

    fn read_message(&mut self, deadline: Instant, waiting_for: &'static str) -> Result<Value, CdpError> {
        loop {
            if is_shutdown() {
                return Err(CdpError::Interrupted);
            }
            if Instant::now() >= deadline {
                return Err(CdpError::Timeout(waiting_for));
            }
            match self.socket.read() {
                Ok(Message::Text(text)) => return Ok(serde_json::from_str(text.as_str())?),
                Ok(Message::Close(_)) => return Err(CdpError::Closed),
                Ok(_) => {}
                Err(tungstenite::Error::Io(ref e))
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Wait for a lifecycle event of the navigated frame.
    fn wait_for_lifecycle(
        &mut self,
        frame_id: &str,
        loader_id: Option<&str>,
        name: &str,
        deadline: Instant,
    ) -> Result<(), CdpError> {
        loop {
            let event = self.next_event(deadline, "the page to finish loading")?;
            if event.get("method").and_then(Value::as_str) != Some("Page.lifecycleEvent") {
                continue;
            }
            let params = &event["params"];
            let same_frame = params["frameId"] == frame_id;
            let same_load = loader_id.is_none_or(|id| params["loaderId"] == id);
            if same_frame && same_load && params["name"] == name {
                return Ok(());
            }
        }
    }
}

fn required_str(value: &Value, key: &str, method: &str) -> Result<String, CdpError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| CdpError::Protocol {
            method: method.to_owned(),
            message: format!("response has no `{key}`"),
        })
}

impl BrowserSession for ChromeSession {
    fn open(&mut self, url: &str, viewport: [u32; 2], timeout: Duration) -> Result<(), CdpError> {
        let deadline = Instant::now() + timeout;

        let target = self.call(
            "Target.createTarget",
            json!({ "url": "about:blank" }),
            deadline,
        )?;
        let target_id = required_str(&target, "targetId", "Target.createTarget")?;

        let attached = self.call(
            "Target.attachToTarget",
            json!({ "targetId": target_id, "flatten": true }),
            deadline,
        )?;
        self.session_id = Some(required_str(&attached, "sessionId", "Target.attachToTarget")?);

        let [width, height] = viewport;
        self.call(
            "Emulation.setDeviceMetricsOverride",
            json!({ "width": width, "height": height, "deviceScaleFactor": 1, "mobile": false }),
            deadline,
        )?;
        self.call("Page.enable", json!({}), deadline)?;
        self.call(
            "Page.setLifecycleEventsEnabled",
            json!({ "enabled": true }),
            deadline,
        )?;
        // Lifecycle events of about:blank are not of interest.
        self.events.clear();

        let nav = self.call("Page.navigate", json!({ "url": url }), deadline)?;
        if let Some(reason) = nav.get("errorText").and_then(Value::as_str) {
            return Err(CdpError::Navigation {
                url: url.to_owned(),
                reason: reason.to_owned(),
            });
        }
        let frame_id = required_str(&nav, "frameId", "Page.navigate")?;
        let loader_id = nav.get("loaderId").and_then(Value::as_str).map(str::to_owned);

        // At most two requests in flight for 500 ms.
        self.wait_for_lifecycle(&frame_id, loader_id.as_deref(), "networkAlmostIdle", deadline)
    }

    fn evaluate(&mut self, expression: &str, timeout: Duration) -> Result<Value, CdpError> {
        let deadline = Instant::now() + timeout;
        let result = self.call(
            "Runtime.evaluate",
            json!({
                "expression": expression,
                "awaitPromise": true,
                "returnByValue": true,
            }),
            deadline,
        )?;

        if let Some(details) = result.get("exceptionDetails") {
            let message = details
                .pointer("/exception/description")
                .or_else(|| details.get("text"))
                .and_then(Value::as_str)
                .unwrap_or("uncaught exception");
            return Err(CdpError::Script(message.to_owned()));
        }
        Ok(result.pointer("/result/value").cloned().unwrap_or(Value::Null))
    }

    fn close(&mut self) {
        self.session_id = None;
        let deadline = Instant::now() + CLOSE_TIMEOUT;
        if let Err(e) = self.call("Browser.close", json!({}), deadline) {
            debug!("a11y"; "Browser.close: {}", e);
        }
        self.process.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_line() {
        assert_eq!(
            endpoint_from_line(
                "DevTools listening on ws://127.0.0.1:41567/devtools/browser/2f1c-9a\n"
            ),
            Some("ws://127.0.0.1:41567/devtools/browser/2f1c-9a")
        );
        assert_eq!(endpoint_from_line("[0615/143045:ERROR:gpu_init.cc] oops"), None);
        assert_eq!(endpoint_from_line("DevTools listening on http://x"), None);
    }

    #[test]
    fn test_explicit_missing_browser() {
        let err = find_browser(Some(Path::new("/nonexistent/sitekit-browser"))).unwrap_err();
        assert!(matches!(err, CdpError::BrowserNotFound(_)));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        assert!(matches!(
            connect("ws://no-port/devtools"),
            Err(CdpError::Endpoint(_))
        ));
    }
}
