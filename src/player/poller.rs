use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::{Mutex, Notify};

/// A save callback: receives the decoded JSON value a jq filter produced
/// (`None` on fetch/decode failure or "show not-playing"), returns the
/// number of seconds before its source should be polled again (§4.4).
pub type SaveCallback = Arc<dyn Fn(Option<serde_json::Value>) -> u64 + Send + Sync>;

const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Clone)]
struct Subscription {
    url: String,
    jq_filter: String,
    save: SaveCallback,
}

struct PollerState {
    subscriptions: Vec<Subscription>,
    next_fetch: Instant,
    suspended: bool,
}

/// The now-playing metadata poller (C7b), grounded on the polling loop
/// described in §4.4. A single instance is shared by the stream player
/// across however many times it starts a new station.
pub struct Poller {
    state: Mutex<PollerState>,
    wake: Notify,
    http: reqwest::Client,
}

impl Poller {
    pub fn new() -> Arc<Self> {
        let poller = Arc::new(Self {
            state: Mutex::new(PollerState { subscriptions: Vec::new(), next_fetch: Instant::now(), suspended: true }),
            wake: Notify::new(),
            http: reqwest::Client::new(),
        });
        poller.clone().spawn_loop();
        poller
    }

    fn spawn_loop(self: Arc<Self>) {
        tokio::spawn(async move {
            loop {
                let sleep_until = {
                    let state = self.state.lock().await;
                    if state.suspended || state.subscriptions.is_empty() {
                        None
                    } else {
                        Some(state.next_fetch)
                    }
                };

                match sleep_until {
                    None => self.wake.notified().await,
                    Some(when) => {
                        let now = Instant::now();
                        if when > now {
                            tokio::select! {
                                _ = tokio::time::sleep(when - now) => {}
                                _ = self.wake.notified() => { continue; }
                            }
                        }
                        self.run_once().await;
                    }
                }
            }
        });
    }

    async fn run_once(&self) {
        let subscriptions = { self.state.lock().await.subscriptions.clone() };
        if subscriptions.is_empty() {
            return;
        }

        let mut bodies: HashMap<String, Option<String>> = HashMap::new();
        for sub in &subscriptions {
            if bodies.contains_key(&sub.url) {
                continue;
            }
            let body = match self.http.get(&sub.url).send().await {
                Ok(resp) => resp.text().await.ok(),
                Err(err) => {
                    log::warn!("now-playing fetch for {} failed: {err}", sub.url);
                    None
                }
            };
            bodies.insert(sub.url.clone(), body);
        }

        let mut min_delta = DEFAULT_INTERVAL;
        for sub in &subscriptions {
            let value = match bodies.get(&sub.url).and_then(|body| body.as_deref()) {
                Some(body) => apply_jq(&sub.jq_filter, body).await,
                None => None,
            };
            let delta_secs = (sub.save)(value);
            min_delta = min_delta.min(Duration::from_secs(delta_secs));
        }

        let mut state = self.state.lock().await;
        state.next_fetch = Instant::now() + min_delta;
    }

    /// Registers up to two subscriptions for a newly-playing stream and
    /// wakes the loop to fetch immediately (§4.3 `play`).
    pub async fn register(&self, subscriptions: Vec<(String, String, SaveCallback)>) {
        let mut state = self.state.lock().await;
        state.subscriptions = subscriptions.into_iter().map(|(url, jq_filter, save)| Subscription { url, jq_filter, save }).collect();
        state.suspended = false;
        state.next_fetch = Instant::now();
        drop(state);
        self.wake.notify_one();
    }

    /// "Show not-playing": invoke every save callback with `None` and sleep
    /// indefinitely (§4.4).
    pub async fn suspend(&self) {
        let mut state = self.state.lock().await;
        for sub in &state.subscriptions {
            (sub.save)(None);
        }
        state.subscriptions.clear();
        state.suspended = true;
    }
}

/// Runs `jq <filter>` with `body` on stdin, parsing stdout as JSON — the
/// "shelling out to a JSON filter" blocking point named in §5. Falls back to
/// a dotted-field/`[n]`-index walk of the raw body when the `jq` binary
/// isn't on `PATH`, so unit tests don't depend on it being installed.
async fn apply_jq(filter: &str, body: &str) -> Option<serde_json::Value> {
    let filter = if filter.trim().is_empty() { "." } else { filter.trim() };

    match Command::new("jq").arg(filter).stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::null()).spawn() {
        Ok(mut child) => {
            if let Some(mut stdin) = child.stdin.take() {
                if stdin.write_all(body.as_bytes()).await.is_err() {
                    return None;
                }
            }
            let output = child.wait_with_output().await.ok()?;
            if !output.status.success() {
                return None;
            }
            serde_json::from_slice(&output.stdout).ok()
        }
        Err(_) => {
            let value: serde_json::Value = serde_json::from_str(body).ok()?;
            walk_dotted_path(filter, &value)
        }
    }
}

/// Dotted-field/`[n]`-index walk used only when `jq` itself can't be spawned.
fn walk_dotted_path(filter: &str, value: &serde_json::Value) -> Option<serde_json::Value> {
    if filter == "." {
        return Some(value.clone());
    }

    let mut current = value.clone();
    for segment in filter.trim_start_matches('.').split('.') {
        if segment.is_empty() {
            continue;
        }
        let (field, index) = match segment.split_once('[') {
            Some((field, rest)) => {
                let index_str = rest.trim_end_matches(']');
                (field, index_str.parse::<usize>().ok())
            }
            None => (segment, None),
        };

        if !field.is_empty() {
            current = current.get(field)?.clone();
        }
        if let Some(index) = index {
            current = current.get(index)?.clone();
        }
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn fallback_walk_resolves_dotted_path() {
        let body = serde_json::json!({"data": {"now_playing": [{"title": "Song"}]}});
        let result = walk_dotted_path(".data.now_playing[0].title", &body);
        assert_eq!(result, Some(serde_json::json!("Song")));
    }

    #[test]
    fn fallback_walk_identity() {
        let body = serde_json::json!({"a": 1});
        assert_eq!(walk_dotted_path(".", &body), Some(body));
    }

    #[tokio::test]
    async fn suspend_invokes_every_save_with_none() {
        let poller = Poller::new();
        let calls = Arc::new(AtomicU64::new(0));
        let calls_clone = calls.clone();
        let save: SaveCallback = Arc::new(move |value| {
            assert!(value.is_none());
            calls_clone.fetch_add(1, Ordering::SeqCst);
            30
        });
        poller.register(vec![("http://example.invalid/np".to_string(), ".".to_string(), save)]).await;

        poller.suspend().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
