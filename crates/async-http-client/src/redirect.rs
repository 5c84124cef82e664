//! Manual redirect following: `reqwest` is configured with
//! `redirect::Policy::none()` so every hop passes back through here, giving
//! us the visited-URL list and cycle detection §4.4 requires.

use async_http_value::{Method, RedirectError, RedirectErrorData};
use reqwest::StatusCode;
use url::Url;
use uuid::Uuid;

/// Status codes `reqwest` (and every mainstream client) treats as
/// redirects when a `Location` header is present.
fn is_redirect_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Tracks the hop chain for a single request so it can detect cycles and
/// exceeding `max_redirects`, and report the chain on either the final
/// response or a `RedirectError`.
pub struct RedirectState {
    visited: Vec<Url>,
    max_redirects: u32,
}

pub enum RedirectDecision {
    /// Not a redirect status, or no usable `Location` header: stop here.
    Stop,
    /// Follow this next URL.
    Follow(Url),
    /// Following would exceed `max_redirects` or revisit a URL already in
    /// the chain.
    Violation(RedirectError),
}

impl RedirectState {
    pub fn new(start_url: Url, max_redirects: u32) -> Self {
        Self {
            visited: vec![start_url],
            max_redirects,
        }
    }

    pub fn visited(&self) -> &[Url] {
        &self.visited
    }

    /// Inspects `status`/`location`; returns the next step. On `Follow`, the
    /// new URL has already been pushed onto the visited list.
    pub fn next(
        &mut self,
        status: StatusCode,
        location: Option<&str>,
        current_url: &Url,
        request_id: Uuid,
        method: Method,
    ) -> RedirectDecision {
        if !is_redirect_status(status) {
            return RedirectDecision::Stop;
        }
        let Some(location) = location else {
            return RedirectDecision::Stop;
        };
        let next_url = match current_url.join(location) {
            Ok(url) => url,
            Err(_) => return RedirectDecision::Stop,
        };

        if self.visited.iter().any(|visited| visited == &next_url) {
            return RedirectDecision::Violation(RedirectError::RecursiveRedirect(
                RedirectErrorData {
                    redirects: self.visited.clone(),
                    request_id,
                    url: next_url,
                    method,
                },
            ));
        }
        if self.visited.len() as u32 > self.max_redirects {
            return RedirectDecision::Violation(RedirectError::TooManyRedirects(
                RedirectErrorData {
                    redirects: self.visited.clone(),
                    request_id,
                    url: next_url,
                    method,
                },
            ));
        }

        self.visited.push(next_url.clone());
        RedirectDecision::Follow(next_url)
    }
}
