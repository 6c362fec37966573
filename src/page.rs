//! Access to the host page.
//!
//! The resolver never touches globals directly; it goes through a
//! [`PageContext`], which lets a browser-backed host, a saved HTML document or
//! a test fake stand in for the watch page.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tokio::sync::broadcast;

/// A same-origin broadcast message observed on the page
#[derive(Debug, Clone, PartialEq)]
pub struct PageMessage {
    pub marker: String,
    pub payload: Value,
}

/// Fragment executed in the page's own context: reads `global` and posts it
/// back tagged with `marker`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayFragment {
    pub marker: String,
    pub global: &'static str,
}

/// Handle to an injected fragment, used to remove it again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectedScript(pub u64);

pub trait PageContext {
    /// URL of the page the captions belong to
    fn url(&self) -> &str;

    /// The player-response global, when reachable without crossing contexts
    fn player_response(&self) -> Option<Value> {
        None
    }

    /// Subscribe to the page's broadcast messages; `None` when the host has
    /// no script context.
    fn messages(&self) -> Option<broadcast::Receiver<PageMessage>> {
        None
    }

    /// Insert `fragment` into the page for execution
    fn inject(&self, _fragment: &RelayFragment) -> Option<InjectedScript> {
        None
    }

    fn remove(&self, _script: InjectedScript) {}

    /// Raw text of every inline script element, in document order
    fn inline_scripts(&self) -> Vec<String>;
}

static SCRIPT_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").unwrap());
static SRC_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bsrc\s*=").unwrap());

/// A watch page known only by its HTML source
#[derive(Debug, Clone)]
pub struct HtmlPage {
    url: String,
    html: String,
}

impl HtmlPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

impl PageContext for HtmlPage {
    fn url(&self) -> &str {
        &self.url
    }

    fn inline_scripts(&self) -> Vec<String> {
        extract_inline_scripts(&self.html)
    }
}

/// Bodies of `<script>` elements that carry no `src` attribute
pub fn extract_inline_scripts(html: &str) -> Vec<String> {
    SCRIPT_ELEMENT
        .captures_iter(html)
        .filter(|caps| !SRC_ATTR.is_match(&caps[1]))
        .map(|caps| caps[2].to_string())
        .filter(|body| !body.trim().is_empty())
        .collect()
}
