use crate::prelude::*;
use auto_impl::auto_impl;
use std::io::Read;
use std::time::Duration;

/// What came back from one fetch. Non-2xx statuses are carried in here, not
/// turned into errors -- the index server cares about the difference between
/// a 404 and a 503, so the transport doesn't get to flatten them.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    /// The final URL after redirects; relative links on the page resolve
    /// against this, not against what we originally asked for.
    pub url: Url,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The HTTP seam. Everything network-shaped goes through this one method, so
/// tests swap in canned responses and nothing in this crate cares.
#[auto_impl(&, Box, Arc)]
pub trait Transport: Send + Sync {
    fn fetch(&self, url: &Url) -> Result<FetchResponse>;
}

/// Pip-style user agent, so index operators can tell what's hitting them.
fn user_agent() -> String {
    let installer = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");
    let data = serde_json::json!({
        "installer": {
            "name": &installer,
            "version": &version,
        },
        "cpu": std::env::consts::ARCH,
    });
    format!("{}/{} {}", installer, version, data)
}

// Retry plan lifted from pip (pip/_internal/network/session.py,
// urllib3/util/retry.py): retry 500/503/520/527 and transient transport
// errors, with capped exponential backoff.
const SLEEP_TIMES: &[u64] = &[250, 500, 1000, 2000, 4000]; // milliseconds
const RETRY_STATUS: &[u16] = &[500, 503, 520, 527];
use ureq::ErrorKind::*;
const RETRY_ERRORKIND: &[ureq::ErrorKind] =
    &[Dns, ConnectionFailed, TooManyRedirects, Io, ProxyConnect];

fn call_with_retry(req: ureq::Request) -> std::result::Result<ureq::Response, ureq::Error> {
    let mut sleeps = SLEEP_TIMES.iter();
    loop {
        let result = req.clone().call();
        match &result {
            Ok(_) => return result,
            Err(ureq::Error::Status(status, _)) => {
                if !RETRY_STATUS.contains(status) {
                    return result;
                }
            }
            Err(err @ ureq::Error::Transport(_)) => {
                if !RETRY_ERRORKIND.contains(&err.kind()) {
                    return result;
                }
            }
        }
        match sleeps.next() {
            Some(sleep_time) => std::thread::sleep(Duration::from_millis(*sleep_time)),
            None => return result,
        }
    }
}

/// The default [`Transport`], backed by a shared `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> UreqTransport {
        UreqTransport {
            agent: ureq::AgentBuilder::new()
                .user_agent(&user_agent())
                .timeout_read(Duration::from_secs(15))
                .timeout_write(Duration::from_secs(15))
                .build(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        UreqTransport::new()
    }
}

impl Transport for UreqTransport {
    fn fetch(&self, url: &Url) -> Result<FetchResponse> {
        let request = self.agent.request_url("GET", url);
        let response = match call_with_retry(request) {
            Ok(response) => response,
            // A status error still has a perfectly good response in it.
            Err(ureq::Error::Status(_, response)) => response,
            Err(err) => {
                return Err(err).with_context(|| format!("failed to fetch {}", url))
            }
        };
        let status = response.status();
        let final_url = Url::parse(response.get_url())
            .with_context(|| format!("transport returned unparseable url for {}", url))?;
        let content_type = response.header("Content-Type").map(String::from);
        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .with_context(|| format!("failed reading response body from {}", url))?;
        Ok(FetchResponse {
            status,
            url: final_url,
            content_type,
            body,
        })
    }
}
