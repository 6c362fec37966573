//! Fakes shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};
use tokio::sync::broadcast;

use crate::fetch::{Fetch, FetchResponse};
use crate::page::{InjectedScript, PageContext, PageMessage, RelayFragment};

pub const VIDEO_ID: &str = "dQw4w9WgXcQ";

pub fn watch_url() -> String {
    format!("https://www.youtube.com/watch?v={VIDEO_ID}")
}

/// Minimal player response carrying `tracks`
pub fn player_json(tracks: &[Value]) -> Value {
    json!({
        "videoDetails": {"videoId": VIDEO_ID, "title": "Test Video"},
        "captions": {
            "playerCaptionsTracklistRenderer": {"captionTracks": tracks}
        }
    })
}

/// Watch page HTML embedding `player` the way YouTube does
pub fn watch_html(player: &Value) -> String {
    format!(
        "<!DOCTYPE html><html><head><script src=\"/s/desktop/base.js\"></script>\
         <script nonce=\"n\">var ytcfg = {{\"INNERTUBE_API_KEY\": \"k\"}};</script></head>\
         <body><script nonce=\"n\">var ytInitialPlayerResponse = {player};var meta = document.createElement('meta');</script>\
         </body></html>"
    )
}

pub fn track_json(lang: &str, name: &str, base_url: &str) -> Value {
    json!({
        "languageCode": lang,
        "name": {"simpleText": name},
        "baseUrl": base_url,
        "kind": "",
        "isTranslatable": true
    })
}

enum Relay {
    Unsupported,
    Silent,
    Reply(Value),
}

pub struct FakePage {
    url: String,
    global: Option<Value>,
    relay: Relay,
    scripts: Vec<String>,
    bus: broadcast::Sender<PageMessage>,
    pub injected: AtomicUsize,
    pub removed: AtomicUsize,
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        let (bus, _) = broadcast::channel(16);
        Self {
            url: url.to_string(),
            global: None,
            relay: Relay::Unsupported,
            scripts: Vec::new(),
            bus,
            injected: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
        }
    }

    pub fn with_global(mut self, value: Value) -> Self {
        self.global = Some(value);
        self
    }

    pub fn with_relay(mut self, value: Value) -> Self {
        self.relay = Relay::Reply(value);
        self
    }

    pub fn with_silent_relay(mut self) -> Self {
        self.relay = Relay::Silent;
        self
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.scripts.push(script.into());
        self
    }
}

impl PageContext for FakePage {
    fn url(&self) -> &str {
        &self.url
    }

    fn player_response(&self) -> Option<Value> {
        self.global.clone()
    }

    fn messages(&self) -> Option<broadcast::Receiver<PageMessage>> {
        match self.relay {
            Relay::Unsupported => None,
            _ => Some(self.bus.subscribe()),
        }
    }

    fn inject(&self, fragment: &RelayFragment) -> Option<InjectedScript> {
        let id = self.injected.fetch_add(1, Ordering::SeqCst) as u64;
        if let Relay::Reply(payload) = &self.relay {
            let _ = self.bus.send(PageMessage {
                marker: "someone-else".to_string(),
                payload: json!({"unrelated": true}),
            });
            let _ = self.bus.send(PageMessage {
                marker: fragment.marker.clone(),
                payload: payload.clone(),
            });
        }
        Some(InjectedScript(id))
    }

    fn remove(&self, _script: InjectedScript) {
        self.removed.fetch_add(1, Ordering::SeqCst);
    }

    fn inline_scripts(&self) -> Vec<String> {
        self.scripts.clone()
    }
}

enum Route {
    Body(u16, String),
    Fail(String),
}

/// Canned HTTP responses keyed by exact URL; unknown URLs answer 404
pub struct FakeFetcher {
    routes: HashMap<String, Route>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.routes.insert(url.into(), Route::Body(status, body.into()));
        self
    }

    pub fn with_failure(mut self, url: impl Into<String>, message: &str) -> Self {
        self.routes.insert(url.into(), Route::Fail(message.to_string()));
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Fetch for FakeFetcher {
    async fn fetch(&self, url: &str) -> eyre::Result<FetchResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.routes.get(url) {
            Some(Route::Body(status, body)) => Ok(FetchResponse {
                status: *status,
                body: body.clone(),
            }),
            Some(Route::Fail(message)) => Err(eyre::eyre!("{message}")),
            None => Ok(FetchResponse {
                status: 404,
                body: String::new(),
            }),
        }
    }
}
