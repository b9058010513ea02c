use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex as StdMutex};

use super::poller::{Poller, SaveCallback};
use super::{PlaybackStatus, PlayerError};

/// Spawns and controls the child process that decodes a network stream
/// (§4.3's backing child process). A capability trait so tests don't shell
/// out to a real `ffplay`.
pub trait StreamDecoder: Send + Sync {
    fn play(&self, url: &str, volume: u8) -> Result<(), PlayerError>;
    fn terminate(&self) -> Result<(), PlayerError>;
}

/// Default `StreamDecoder`, grounded on `player/streamplayer.py`: spawns
/// `ffplay -nodisp -vn -sn -volume <v> -loglevel warning <url>`, optionally
/// routed through ALSA on a specific device.
#[derive(Debug)]
pub struct FfplayDecoder {
    child: StdMutex<Option<Child>>,
    audio_device: Option<String>,
}

impl FfplayDecoder {
    pub fn new(audio_device: Option<String>) -> Self {
        Self { child: StdMutex::new(None), audio_device }
    }
}

impl Default for FfplayDecoder {
    fn default() -> Self {
        Self::new(None)
    }
}

impl StreamDecoder for FfplayDecoder {
    fn play(&self, url: &str, volume: u8) -> Result<(), PlayerError> {
        self.terminate()?;

        let mut cmd = Command::new("ffplay");
        cmd.arg("-nodisp")
            .arg("-vn")
            .arg("-sn")
            .arg("-volume")
            .arg(volume.to_string())
            .arg("-loglevel")
            .arg("warning")
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        if let Some(device) = &self.audio_device {
            cmd.env("SDL_AUDIODRIVER", "alsa").env("AUDIODEV", device);
        }

        let child = cmd.spawn().map_err(|e| PlayerError::NotFound(format!("failed to spawn ffplay: {e}")))?;
        *self.child.lock().expect("ffplay child handle poisoned") = Some(child);
        Ok(())
    }

    fn terminate(&self) -> Result<(), PlayerError> {
        if let Some(mut child) = self.child.lock().expect("ffplay child handle poisoned").take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        Ok(())
    }
}

/// No-op `StreamDecoder` for tests.
#[derive(Debug, Default)]
pub struct NullStreamDecoder;

impl StreamDecoder for NullStreamDecoder {
    fn play(&self, _url: &str, _volume: u8) -> Result<(), PlayerError> {
        Ok(())
    }
    fn terminate(&self) -> Result<(), PlayerError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct NowPlayingMetadata {
    pub artist: Option<String>,
    pub track: Option<String>,
}

/// Network-stream player (C7), grounded on
/// `player/streamplayer.py:StreamPlayer`. Because streams can't truly pause,
/// `pause` just terminates the child and remembers enough to `resume`.
pub struct StreamPlayer {
    status: PlaybackStatus,
    volume: u8,
    name: Option<String>,
    url: Option<String>,
    station_artwork: Option<String>,
    // Written from inside the poller's save callbacks (§4.4), which run
    // with no `&mut self` access, so these two fields need interior
    // mutability independent of the `Mutex<StreamPlayer>` the coordinator
    // holds them behind.
    currently_playing_artwork: Arc<StdMutex<Option<String>>>,
    current_track_index: Option<i64>,
    number_of_tracks: Option<i64>,
    now_playing: Arc<StdMutex<NowPlayingMetadata>>,
    decoder: Arc<dyn StreamDecoder>,
    poller: Arc<Poller>,
    on_state_change: Arc<dyn Fn() + Send + Sync>,
}

impl StreamPlayer {
    pub fn new<C>(decoder: Arc<dyn StreamDecoder>, poller: Arc<Poller>, on_state_change: C) -> Self
    where
        C: Fn() + Send + Sync + 'static,
    {
        Self {
            status: PlaybackStatus::Stopped,
            volume: 100,
            name: None,
            url: None,
            station_artwork: None,
            currently_playing_artwork: Arc::new(StdMutex::new(None)),
            current_track_index: None,
            number_of_tracks: None,
            now_playing: Arc::new(StdMutex::new(NowPlayingMetadata::default())),
            decoder,
            poller,
            on_state_change: Arc::new(on_state_change),
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn currently_playing_artwork(&self) -> Option<String> {
        self.currently_playing_artwork.lock().expect("artwork lock poisoned").clone()
    }

    pub fn current_track_index(&self) -> Option<i64> {
        self.current_track_index
    }

    pub fn number_of_tracks(&self) -> Option<i64> {
        self.number_of_tracks
    }

    pub fn now_playing(&self) -> NowPlayingMetadata {
        self.now_playing.lock().expect("now-playing lock poisoned").clone()
    }

    /// Terminates any existing child, spawns the new one, and registers up
    /// to two poller subscriptions — now-playing info and artwork (§4.3/§4.4).
    #[allow(clippy::too_many_arguments)]
    pub async fn play(
        &mut self,
        name: String,
        url: String,
        station_artwork: Option<String>,
        index: i64,
        total: i64,
        now_playing_url: Option<String>,
        now_playing_jq: Option<String>,
        artwork_url: Option<String>,
        artwork_jq: Option<String>,
    ) -> Result<(), PlayerError> {
        self.decoder.play(&url, self.volume)?;

        self.status = PlaybackStatus::Playing;
        self.name = Some(name);
        self.url = Some(url);
        self.station_artwork = station_artwork.clone();
        *self.currently_playing_artwork.lock().expect("artwork lock poisoned") = station_artwork.clone();
        self.current_track_index = Some(index);
        self.number_of_tracks = Some(total);
        *self.now_playing.lock().expect("now-playing lock poisoned") = NowPlayingMetadata::default();

        let mut subscriptions: Vec<(String, String, SaveCallback)> = Vec::new();
        let on_state_change = self.on_state_change.clone();

        if let (Some(np_url), Some(np_jq)) = (now_playing_url, now_playing_jq) {
            let on_state_change = on_state_change.clone();
            let now_playing = self.now_playing.clone();
            let save: SaveCallback = Arc::new(move |value| {
                let metadata = value.and_then(|v| serde_json::from_value::<NowPlayingMetadata>(v).ok()).unwrap_or_default();
                let changed = {
                    let mut current = now_playing.lock().expect("now-playing lock poisoned");
                    if *current != metadata {
                        *current = metadata.clone();
                        true
                    } else {
                        false
                    }
                };
                if changed {
                    (on_state_change)();
                }
                if metadata.artist.is_some() && metadata.track.is_some() { 60 } else { 30 }
            });
            subscriptions.push((np_url, np_jq, save));
        }

        if let (Some(art_url), Some(art_jq)) = (artwork_url, artwork_jq) {
            let on_state_change = on_state_change.clone();
            let currently_playing_artwork = self.currently_playing_artwork.clone();
            let station_artwork = self.station_artwork.clone();
            let save: SaveCallback = Arc::new(move |value| {
                let fetched = value.and_then(|v| v.as_str().map(str::to_string));
                let present = fetched.is_some();
                let resolved = fetched.or_else(|| station_artwork.clone());
                let changed = {
                    let mut current = currently_playing_artwork.lock().expect("artwork lock poisoned");
                    if *current != resolved {
                        *current = resolved.clone();
                        true
                    } else {
                        false
                    }
                };
                if changed {
                    (on_state_change)();
                }
                if present { 60 } else { 30 }
            });
            subscriptions.push((art_url, art_jq, save));
        }

        if !subscriptions.is_empty() {
            self.poller.register(subscriptions).await;
        }

        (self.on_state_change)();
        Ok(())
    }

    pub async fn pause(&mut self) -> Result<(), PlayerError> {
        self.decoder.terminate()?;
        self.status = PlaybackStatus::Paused;
        *self.currently_playing_artwork.lock().expect("artwork lock poisoned") = self.station_artwork.clone();
        self.poller.suspend().await;
        (self.on_state_change)();
        Ok(())
    }

    pub async fn resume(&mut self) -> Result<(), PlayerError> {
        let Some(url) = self.url.clone() else {
            return Err(PlayerError::Conflict("no stream to resume".into()));
        };
        self.decoder.play(&url, self.volume)?;
        self.status = PlaybackStatus::Playing;
        (self.on_state_change)();
        Ok(())
    }

    pub async fn stop(&mut self) {
        let _ = self.decoder.terminate();
        self.status = PlaybackStatus::Stopped;
        self.name = None;
        self.url = None;
        self.station_artwork = None;
        *self.currently_playing_artwork.lock().expect("artwork lock poisoned") = None;
        self.current_track_index = None;
        self.number_of_tracks = None;
        *self.now_playing.lock().expect("now-playing lock poisoned") = NowPlayingMetadata::default();
        self.poller.suspend().await;
        (self.on_state_change)();
    }

    pub async fn set_volume(&mut self, volume: u8) -> Result<(), PlayerError> {
        self.volume = volume;
        if self.status == PlaybackStatus::Playing {
            if let Some(url) = self.url.clone() {
                self.decoder.play(&url, volume)?;
            }
        }
        (self.on_state_change)();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn play_then_stop_resets_metadata() {
        let decoder = Arc::new(NullStreamDecoder);
        let poller = Poller::new();
        let notifications = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let notify = notifications.clone();
        let mut player = StreamPlayer::new(decoder, poller, move || {
            notify.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        player
            .play("NTS".to_string(), "http://stream/nts".to_string(), Some("http://art/nts.png".to_string()), 0, 1, None, None, None, None)
            .await
            .unwrap();

        assert_eq!(player.status(), PlaybackStatus::Playing);
        assert_eq!(player.url(), Some("http://stream/nts"));

        player.stop().await;

        assert_eq!(player.status(), PlaybackStatus::Stopped);
        assert_eq!(player.url(), None);
    }
}
