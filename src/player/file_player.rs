use std::path::Path;
use std::sync::Arc;

use crate::domain::queue::QueuedItem;

use super::{PlaybackStatus, PlayerError};

/// Decodes and plays a local audio file (§4.2's `backingDecoder`). A
/// capability trait: actual audio decoding is out of scope here. `on_end`
/// must be invoked once playback of the current file finishes on its own —
/// the coordinator wires this to `FilePlayer::next`.
pub trait FileDecoder: Send + Sync {
    fn play(&self, path: &Path, volume: u8, on_end: Arc<dyn Fn() + Send + Sync>) -> Result<(), PlayerError>;
    fn pause(&self) -> Result<(), PlayerError>;
    fn resume(&self) -> Result<(), PlayerError>;
    fn stop(&self) -> Result<(), PlayerError>;
    fn set_volume(&self, volume: u8) -> Result<(), PlayerError>;
}

/// Picks a `FileDecoder` by file extension — `.mp3` gets one variant, every
/// other extension the other (§4.2 `_playSong`).
pub struct ExtensionDispatchDecoder {
    pub mp3: Arc<dyn FileDecoder>,
    pub other: Arc<dyn FileDecoder>,
}

impl ExtensionDispatchDecoder {
    fn decoder_for(&self, path: &Path) -> Arc<dyn FileDecoder> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("mp3") => self.mp3.clone(),
            _ => self.other.clone(),
        }
    }
}

/// No-op `FileDecoder`, used where no real backend is wired and in tests.
#[derive(Debug, Default)]
pub struct NullFileDecoder;

impl FileDecoder for NullFileDecoder {
    fn play(&self, _path: &Path, _volume: u8, _on_end: Arc<dyn Fn() + Send + Sync>) -> Result<(), PlayerError> {
        Ok(())
    }
    fn pause(&self) -> Result<(), PlayerError> {
        Ok(())
    }
    fn resume(&self) -> Result<(), PlayerError> {
        Ok(())
    }
    fn stop(&self) -> Result<(), PlayerError> {
        Ok(())
    }
    fn set_volume(&self, _volume: u8) -> Result<(), PlayerError> {
        Ok(())
    }
}

/// File-queue player (C6), grounded on `player/fileplayer.py:FilePlayer`.
pub struct FilePlayer {
    queue: Vec<QueuedItem>,
    current_index: Option<usize>,
    status: PlaybackStatus,
    volume: u8,
    tracklist_identifier: String,
    decoders: ExtensionDispatchDecoder,
    active_decoder: Option<Arc<dyn FileDecoder>>,
    on_end: Arc<dyn Fn() + Send + Sync>,
    on_state_change: Arc<dyn Fn() + Send + Sync>,
}

impl FilePlayer {
    pub fn new<F, C>(decoders: ExtensionDispatchDecoder, on_end: F, on_state_change: C) -> Self
    where
        F: Fn() + Send + Sync + 'static,
        C: Fn() + Send + Sync + 'static,
    {
        Self {
            queue: Vec::new(),
            current_index: None,
            status: PlaybackStatus::Stopped,
            volume: 100,
            tracklist_identifier: String::new(),
            decoders,
            active_decoder: None,
            on_end: Arc::new(on_end),
            on_state_change: Arc::new(on_state_change),
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn tracklist_identifier(&self) -> &str {
        &self.tracklist_identifier
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    fn current_item(&self) -> Option<&QueuedItem> {
        self.current_index.and_then(|i| self.queue.get(i))
    }

    /// `queue[currentIndex:]` when playing or paused, empty when stopped
    /// (§4.2).
    pub fn visible_queue(&self) -> &[QueuedItem] {
        if self.status == PlaybackStatus::Stopped {
            return &[];
        }
        match self.current_index {
            Some(i) => &self.queue[i.min(self.queue.len())..],
            None => &[],
        }
    }

    /// Replaces the queue; if `start_playing` and the new first item differs
    /// from whatever was previously current, starts it (§4.2 `setQueue`).
    pub fn set_queue(&mut self, tracks: Vec<QueuedItem>, identifier: String, start_playing: bool) {
        let previous_current = self.current_item().map(|item| item.track_id);
        self.queue = tracks;
        self.tracklist_identifier = identifier;

        if start_playing {
            let differs = match (previous_current, self.queue.first()) {
                (Some(prev_id), Some(first)) => prev_id != first.track_id,
                (None, Some(_)) => true,
                _ => false,
            };
            if differs {
                let _ = self.play_from_real_index(0, None);
                return;
            }
        }
        (self.on_state_change)();
    }

    /// Appends; if the queue was empty, starts playing immediately (§4.2
    /// `addToQueue`).
    pub fn add_to_queue(&mut self, item: QueuedItem) {
        let was_empty = self.queue.is_empty();
        self.queue.push(item);
        if was_empty {
            let _ = self.play_from_real_index(0, None);
        } else {
            (self.on_state_change)();
        }
    }

    /// `index` is relative to the visible queue. Only removes when the item
    /// at that absolute position still has `track_id` — a sanity guard
    /// against races with auto-advance (§4.2 `removeFromQueue`).
    pub fn remove_from_queue(&mut self, apparent_index: usize, track_id: i64) -> Result<(), PlayerError> {
        let base = self.current_index.unwrap_or(0);
        let absolute = base + apparent_index;
        let item = self.queue.get(absolute).ok_or_else(|| PlayerError::BadInput("queue index out of range".into()))?;
        if item.track_id != track_id {
            return Err(PlayerError::Conflict("track id at that queue position has changed".into()));
        }

        let was_current = self.current_index == Some(absolute);
        self.queue.remove(absolute);

        if was_current {
            self.play_from_real_index(absolute, None)
        } else {
            (self.on_state_change)();
            Ok(())
        }
    }

    pub fn play_from_apparent_index(&mut self, apparent_index: usize, track_id: Option<i64>) -> Result<(), PlayerError> {
        let base = self.current_index.unwrap_or(0);
        self.play_from_real_index(base + apparent_index, track_id)
    }

    /// If `track_id` is given and doesn't match `queue[i]`, allow a ±1
    /// search before failing — tolerates a one-track race with auto-advance.
    /// Then plays, skipping forward past missing files, stopping on
    /// exhaustion (§4.2 `playFromRealIndex`).
    pub fn play_from_real_index(&mut self, index: usize, track_id: Option<i64>) -> Result<(), PlayerError> {
        let mut index = index;

        if let Some(track_id) = track_id {
            if self.queue.get(index).map(|item| item.track_id) != Some(track_id) {
                let found = [index.checked_sub(1), index.checked_add(1)]
                    .into_iter()
                    .flatten()
                    .find(|&i| self.queue.get(i).map(|item| item.track_id) == Some(track_id));
                match found {
                    Some(i) => index = i,
                    None => return Err(PlayerError::Conflict("queued track id has moved".into())),
                }
            }
        }

        loop {
            let Some(item) = self.queue.get(index).cloned() else {
                self.stop();
                return Ok(());
            };
            if !item.filepath.is_file() {
                log::warn!("skipping missing queued file {}", item.filepath.display());
                index += 1;
                continue;
            }

            self.play_song(&item.filepath)?;
            self.current_index = Some(index);
            self.status = PlaybackStatus::Playing;
            (self.on_state_change)();
            return Ok(());
        }
    }

    fn play_song(&mut self, path: &Path) -> Result<(), PlayerError> {
        if let Some(active) = self.active_decoder.take() {
            active.stop()?;
        }
        let decoder = self.decoders.decoder_for(path);
        decoder.play(path, self.volume, self.on_end.clone())?;
        self.active_decoder = Some(decoder);
        Ok(())
    }

    /// Overrun stops and clears the queue (§4.2).
    pub fn next(&mut self) {
        match self.current_index {
            Some(i) if i + 1 < self.queue.len() => {
                let _ = self.play_from_real_index(i + 1, None);
            }
            _ => {
                self.stop();
                self.clear_queue();
            }
        }
    }

    pub fn prev(&mut self) {
        match self.current_index {
            Some(i) if i > 0 => {
                let _ = self.play_from_real_index(i - 1, None);
            }
            _ => {
                self.stop();
                self.clear_queue();
            }
        }
    }

    pub fn pause(&mut self) -> Result<(), PlayerError> {
        if let Some(decoder) = &self.active_decoder {
            decoder.pause()?;
        }
        self.status = PlaybackStatus::Paused;
        (self.on_state_change)();
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), PlayerError> {
        if let Some(decoder) = &self.active_decoder {
            decoder.resume()?;
        }
        self.status = PlaybackStatus::Playing;
        (self.on_state_change)();
        Ok(())
    }

    pub fn set_volume(&mut self, volume: u8) -> Result<(), PlayerError> {
        self.volume = volume;
        if let Some(decoder) = &self.active_decoder {
            decoder.set_volume(volume)?;
        }
        (self.on_state_change)();
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(decoder) = self.active_decoder.take() {
            let _ = decoder.stop();
        }
        self.status = PlaybackStatus::Stopped;
        (self.on_state_change)();
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.current_index = None;
        (self.on_state_change)();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn harness() -> (FilePlayer, Arc<AtomicUsize>) {
        let notifications = Arc::new(AtomicUsize::new(0));
        let notify = notifications.clone();
        let decoders = ExtensionDispatchDecoder { mp3: Arc::new(NullFileDecoder), other: Arc::new(NullFileDecoder) };
        let player = FilePlayer::new(decoders, || {}, move || {
            notify.fetch_add(1, Ordering::SeqCst);
        });
        (player, notifications)
    }

    fn existing_item(dir: &tempfile::TempDir, name: &str, track_id: i64) -> QueuedItem {
        let path = dir.path().join(name);
        std::fs::write(&path, b"fake").unwrap();
        QueuedItem { track_id, filepath: path }
    }

    #[test]
    fn set_queue_starts_playing_when_first_item_differs() {
        let (mut player, _notifications) = harness();
        let dir = tempfile::tempdir().unwrap();
        let item = existing_item(&dir, "a.mp3", 1);

        player.set_queue(vec![item], "/albums/1".to_string(), true);

        assert_eq!(player.status(), PlaybackStatus::Playing);
        assert_eq!(player.current_index(), Some(0));
    }

    #[test]
    fn add_to_queue_starts_immediately_when_empty() {
        let (mut player, _notifications) = harness();
        let dir = tempfile::tempdir().unwrap();
        let item = existing_item(&dir, "a.mp3", 1);

        player.add_to_queue(item);

        assert_eq!(player.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn remove_from_queue_rejects_stale_track_id() {
        let (mut player, _notifications) = harness();
        let dir = tempfile::tempdir().unwrap();
        let a = existing_item(&dir, "a.mp3", 1);
        let b = existing_item(&dir, "b.mp3", 2);
        player.set_queue(vec![a, b], "/albums/1".to_string(), true);

        let result = player.remove_from_queue(0, 999);
        assert!(matches!(result, Err(PlayerError::Conflict(_))));
    }

    #[test]
    fn play_from_real_index_skips_missing_files() {
        let (mut player, _notifications) = harness();
        let dir = tempfile::tempdir().unwrap();
        let missing = QueuedItem { track_id: 1, filepath: dir.path().join("gone.mp3") };
        let present = existing_item(&dir, "here.mp3", 2);
        player.set_queue(vec![missing, present], "/albums/1".to_string(), true);

        assert_eq!(player.current_index(), Some(1));
        assert_eq!(player.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn next_past_end_stops_and_clears() {
        let (mut player, _notifications) = harness();
        let dir = tempfile::tempdir().unwrap();
        let only = existing_item(&dir, "a.mp3", 1);
        player.set_queue(vec![only], "/albums/1".to_string(), true);

        player.next();

        assert_eq!(player.status(), PlaybackStatus::Stopped);
        assert!(player.visible_queue().is_empty());
        assert_eq!(player.current_index(), None);
    }
}
