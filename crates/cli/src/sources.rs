//! Feed collaborators: obtain the raw payloads the engine reconciles.
//!
//! - Tabular feed: a listing file, or a sensor-listing command run with a
//!   bounded timeout. A failing or timed-out command yields no listing.
//! - Structured feed: thermal and power documents, each from a file or a
//!   blocking HTTP GET. A failed fetch omits that document.
//!
//! Both feeds are acquired concurrently and joined before reconciliation.
//! Unreadable configured *files* are errors; unreachable endpoints and failing
//! commands are data outcomes the engine reports on.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use reqwest::header::ACCEPT;
use sensorgrid_recon::config::{DocumentOrigin, ReconConfig, StructuredSources, TabularOrigin};
use sensorgrid_recon::model::ReconInput;
use serde_json::Value;

use crate::exit_codes::EXIT_RECON_INVALID_CONFIG;
use crate::CliError;

const USER_AGENT: &str = concat!("sgrid/", env!("CARGO_PKG_VERSION"));
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Load both feeds concurrently. Paths resolve relative to `base_dir`.
pub fn load_input(config: &ReconConfig, base_dir: &Path) -> Result<ReconInput, CliError> {
    thread::scope(|scope| {
        let tabular = scope.spawn(|| load_tabular(config, base_dir));
        let structured = scope.spawn(|| load_structured(&config.sources.structured, base_dir));

        let tabular_text = tabular
            .join()
            .map_err(|_| CliError::general("tabular feed loader panicked"))??;
        let (thermal, power) = structured
            .join()
            .map_err(|_| CliError::general("structured feed loader panicked"))??;

        Ok(ReconInput {
            tabular_text,
            thermal,
            power,
        })
    })
}

// ── Tabular feed ────────────────────────────────────────────────────

fn load_tabular(config: &ReconConfig, base_dir: &Path) -> Result<Option<String>, CliError> {
    let Some(source) = &config.sources.tabular else {
        tracing::warn!("no tabular source configured");
        return Ok(None);
    };
    let origin = source
        .origin()
        .map_err(|e| CliError::new(EXIT_RECON_INVALID_CONFIG, e.to_string()))?;

    match origin {
        TabularOrigin::File(file) => read_text(&base_dir.join(file)).map(Some),
        TabularOrigin::Command(argv) => Ok(run_listing_command(
            argv,
            base_dir,
            Duration::from_secs(source.timeout_secs),
        )),
    }
}

/// Run the listing command and capture stdout.
///
/// Returns `None` when the command cannot start, exits non-zero, or exceeds
/// `timeout` (the child is killed).
pub fn run_listing_command(argv: &[String], cwd: &Path, timeout: Duration) -> Option<String> {
    let (program, args) = argv.split_first()?;
    tracing::info!(command = %argv.join(" "), "running sensor listing command");

    let mut child = match Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            tracing::error!(program = %program, error = %e, "failed to start listing command");
            return None;
        }
    };

    // Drain pipes on their own threads so a chatty child cannot block on a full pipe.
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                tracing::error!(timeout_secs = timeout.as_secs(), "listing command timed out");
                return None;
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                tracing::error!(error = %e, "cannot wait for listing command");
                return None;
            }
        }
    };

    let stdout = stdout.join().unwrap_or_default();
    if !status.success() {
        let stderr = stderr.join().unwrap_or_default();
        tracing::error!(
            code = status.code().unwrap_or(-1),
            stderr = %stderr.trim(),
            "listing command failed"
        );
        return None;
    }
    Some(stdout)
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

// ── Structured feed ─────────────────────────────────────────────────

fn load_structured(
    sources: &StructuredSources,
    base_dir: &Path,
) -> Result<(Option<Value>, Option<Value>), CliError> {
    let mut client: Option<DocumentClient> = None;
    let mut docs = [None, None];

    for (slot, (name, source)) in [("thermal", &sources.thermal), ("power", &sources.power)]
        .into_iter()
        .enumerate()
    {
        let Some(source) = source else {
            tracing::debug!(document = name, "no source configured");
            continue;
        };
        let origin = source
            .origin(name)
            .map_err(|e| CliError::new(EXIT_RECON_INVALID_CONFIG, e.to_string()))?;

        docs[slot] = match origin {
            DocumentOrigin::File(file) => Some(read_json(&base_dir.join(file))?),
            DocumentOrigin::Url(url) => {
                if client.is_none() {
                    client = Some(DocumentClient::new(sources)?);
                }
                client.as_ref().and_then(|c| c.fetch(url))
            }
        };
    }

    let [thermal, power] = docs;
    Ok((thermal, power))
}

/// Blocking HTTP client for the management API documents.
pub struct DocumentClient {
    http: reqwest::blocking::Client,
    credentials: Option<(String, String)>,
}

impl DocumentClient {
    pub fn new(sources: &StructuredSources) -> Result<Self, CliError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(sources.timeout_secs))
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(sources.accept_invalid_certs)
            .build()
            .map_err(|e| CliError::runtime(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            credentials: resolve_credentials(sources)?,
        })
    }

    /// GET `url` as JSON. Any failure is logged and yields `None`.
    pub fn fetch(&self, url: &str) -> Option<Value> {
        let mut req = self.http.get(url).header(ACCEPT, "application/json");
        if let Some((user, password)) = &self.credentials {
            req = req.basic_auth(user, Some(password));
        }

        let resp = match req.send() {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(url, error = %e, "request failed");
                return None;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "unexpected status");
            return None;
        }

        match resp.json::<Value>() {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::error!(url, error = %e, "response is not JSON");
                None
            }
        }
    }
}

/// Credentials come from environment variables named in config, never inline.
fn resolve_credentials(sources: &StructuredSources) -> Result<Option<(String, String)>, CliError> {
    let (Some(user_var), Some(pass_var)) = (&sources.username_env, &sources.password_env) else {
        return Ok(None);
    };
    let read = |var: &str| {
        std::env::var(var).map_err(|_| {
            CliError::new(EXIT_RECON_INVALID_CONFIG, format!("environment variable {var} is not set"))
                .with_hint(format!("export {var}=... before running"))
        })
    };
    Ok(Some((read(user_var)?, read(pass_var)?)))
}

// ── Files ───────────────────────────────────────────────────────────

pub fn read_text(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| CliError::runtime(format!("cannot read {}: {e}", path.display())))
}

pub fn read_json(path: &Path) -> Result<Value, CliError> {
    let text = read_text(path)?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::runtime(format!("{}: invalid JSON: {e}", path.display())))
}
