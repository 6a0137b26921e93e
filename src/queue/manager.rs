//! Conversion queue state with change notification

use super::entry::{MediaInfo, QueueEntry};
use super::listeners::{Listeners, Subscription};
use super::status::FileStatus;
use super::summary::QueueSummary;
use crate::utils::error::{ForgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Single source of truth for the file queue.
///
/// Owns the ordered entries, the current selection and the registered
/// listeners. Every operation that changes observable state notifies all
/// listeners exactly once after the change is applied; operations that change
/// nothing (duplicate adds, out-of-range indices, clearing an empty queue)
/// are silent. `clear_completed` always moves the selection back to the
/// first entry, so it notifies even when no entry was removed if the
/// selection was elsewhere.
///
/// Invariants held after every call:
/// - paths are unique
/// - the selection is `Some` and in bounds iff the queue is non-empty
/// - every progress value lies in `[0.0, 1.0]`
#[derive(Debug, Default)]
pub struct QueueManager {
    entries: Vec<QueueEntry>,
    selected: Option<usize>,
    listeners: Listeners,
}

/// Owned copy of the queue for readers on other tasks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub entries: Vec<QueueEntry>,
    pub selected_index: Option<usize>,
}

impl QueueSnapshot {
    pub fn selected(&self) -> Option<&QueueEntry> {
        self.selected_index.and_then(|i| self.entries.get(i))
    }

    pub fn summary(&self) -> QueueSummary {
        QueueSummary::from_entries(&self.entries)
    }
}

impl QueueManager {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    // Listeners

    /// Register a callback fired after every state change.
    ///
    /// The listener stays registered until the returned handle is dropped.
    pub fn add_listener<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(&QueueManager) + Send + 'static,
    {
        let subscription = self.listeners.register(Box::new(listener));
        debug!("Registered queue listener {:?}", subscription.id());
        subscription
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&self) {
        self.listeners.dispatch(self);
    }

    // Queue operations

    /// Append an entry. Returns `false` without notifying if the path is
    /// already queued.
    pub fn add(&mut self, entry: QueueEntry) -> bool {
        if self.position(&entry.path).is_some() {
            debug!("Ignoring duplicate queue entry {:?}", entry.path);
            return false;
        }

        let mut entry = entry;
        entry.progress = clamp_progress(entry.progress);

        debug!("Queued {:?}", entry.path);
        self.entries.push(entry);
        if self.selected.is_none() {
            self.selected = Some(0);
        }
        self.notify();
        true
    }

    /// Remove the entry at `index`, returning it. Out-of-range indices are
    /// ignored.
    pub fn remove(&mut self, index: usize) -> Option<QueueEntry> {
        if index >= self.entries.len() {
            return None;
        }

        let removed = self.entries.remove(index);
        self.selected = match self.entries.len() {
            0 => None,
            len => Some(self.selected.unwrap_or(0).min(len - 1)),
        };

        debug!("Removed {:?} from queue", removed.path);
        self.notify();
        Some(removed)
    }

    /// Remove every entry. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        if self.entries.is_empty() {
            return 0;
        }

        let count = self.entries.len();
        self.entries.clear();
        self.selected = None;

        info!("Cleared {} entries from queue", count);
        self.notify();
        count
    }

    /// Remove every `Done` entry, keeping the order of the rest. The
    /// selection moves back to the first entry even if nothing was removed.
    /// Returns how many were removed.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.status != FileStatus::Done);
        let removed = before - self.entries.len();

        let selected = if self.entries.is_empty() { None } else { Some(0) };
        if removed == 0 && self.selected == selected {
            return 0;
        }
        self.selected = selected;

        info!("Cleared {} completed entries from queue", removed);
        self.notify();
        removed
    }

    // Selection

    /// Select the entry at `index`. Returns `false` if it is out of range or
    /// already selected.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.entries.len() || self.selected == Some(index) {
            return false;
        }

        self.selected = Some(index);
        self.notify();
        true
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&QueueEntry> {
        self.selected.and_then(|i| self.entries.get(i))
    }

    // Accessors

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&QueueEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry queued under `path`
    pub fn position(&self, path: &Path) -> Option<usize> {
        self.entries.iter().position(|entry| entry.path == path)
    }

    /// Like [`position`](Self::position) but reports a missing entry as an error
    pub fn index_of(&self, path: &Path) -> Result<usize> {
        self.position(path)
            .ok_or_else(|| ForgeError::EntryNotFound(path.to_path_buf()))
    }

    pub fn count(&self, status: FileStatus) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status == status)
            .count()
    }

    pub fn ready_count(&self) -> usize {
        self.count(FileStatus::Ready)
    }

    pub fn done_count(&self) -> usize {
        self.count(FileStatus::Done)
    }

    /// First entry currently being encoded
    pub fn current_encoding(&self) -> Option<(usize, &QueueEntry)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.status == FileStatus::Encoding)
    }

    pub fn summary(&self) -> QueueSummary {
        QueueSummary::from_entries(&self.entries)
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            entries: self.entries.clone(),
            selected_index: self.selected,
        }
    }

    // Lifecycle writes from the encode driver

    /// Move the entry at `index` to `status`, validating the transition.
    ///
    /// Setting the status an entry already has is a silent no-op.
    pub fn set_status(&mut self, index: usize, status: FileStatus) -> Result<()> {
        if self.transition(index, status)? {
            self.notify();
        }
        Ok(())
    }

    /// Record a processing failure for an entry that is encoding
    pub fn mark_failed(&mut self, index: usize, message: impl Into<String>) -> Result<()> {
        let mut changed = self.transition(index, FileStatus::Error)?;
        let message = message.into();
        let entry = &mut self.entries[index];
        if entry.error_message != message {
            entry.error_message = message;
            changed = true;
        }
        if changed {
            self.notify();
        }
        Ok(())
    }

    /// Apply a validated status change without notifying. Returns whether
    /// anything changed.
    fn transition(&mut self, index: usize, status: FileStatus) -> Result<bool> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(ForgeError::IndexOutOfRange { index, len })?;

        if entry.status == status {
            return Ok(false);
        }
        if !entry.status.can_transition_to(status) {
            return Err(ForgeError::InvalidTransition {
                from: entry.status,
                to: status,
            });
        }

        let from = entry.status;
        entry.status = status;
        match status {
            FileStatus::Ready | FileStatus::Encoding => {
                entry.progress = 0.0;
                entry.error_message.clear();
            }
            FileStatus::Done => entry.progress = 1.0,
            FileStatus::Error | FileStatus::Skipped => {}
        }

        info!("{:?}: {} -> {}", entry.path, from, status);
        Ok(true)
    }

    /// Report encode progress. Finite values are clamped to `[0.0, 1.0]`.
    pub fn set_progress(&mut self, index: usize, progress: f64) -> Result<()> {
        if !progress.is_finite() {
            return Err(ForgeError::InvalidProgress(progress));
        }

        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(ForgeError::IndexOutOfRange { index, len })?;

        if entry.status != FileStatus::Encoding {
            return Err(ForgeError::NotEncoding(entry.status));
        }

        let progress = clamp_progress(progress);
        if entry.progress == progress {
            return Ok(());
        }
        entry.progress = progress;
        self.notify();
        Ok(())
    }

    /// Stop an entry that has not finished. The entry stays in the queue as
    /// `Skipped` so observers can still see what was cancelled.
    pub fn cancel(&mut self, index: usize) -> Result<()> {
        self.set_status(index, FileStatus::Skipped)
    }

    /// Put a finished, failed or skipped entry back into `Ready`
    pub fn reset(&mut self, index: usize) -> Result<()> {
        self.set_status(index, FileStatus::Ready)
    }

    /// Store probe output for an entry
    pub fn set_media_info(&mut self, index: usize, info: Option<MediaInfo>) -> Result<()> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(ForgeError::IndexOutOfRange { index, len })?;

        if entry.media_info == info {
            return Ok(());
        }
        entry.media_info = info;
        self.notify();
        Ok(())
    }
}

fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn entry(path: &str) -> QueueEntry {
        let name = path.rsplit('/').next().unwrap_or(path);
        QueueEntry::new(path, name, "1.0 MB", "—")
    }

    fn counted(queue: &mut QueueManager) -> (Arc<AtomicUsize>, Subscription) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let sub = queue.add_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (hits, sub)
    }

    fn encoding_queue() -> QueueManager {
        let mut queue = QueueManager::new();
        queue.add(entry("/v/a.mkv"));
        queue.set_status(0, FileStatus::Encoding).unwrap();
        queue
    }

    #[test]
    fn test_first_add_selects_zero() {
        let mut queue = QueueManager::new();
        assert_eq!(queue.selected_index(), None);
        assert!(queue.add(entry("/v/a.mkv")));
        assert_eq!(queue.selected_index(), Some(0));
    }

    #[test]
    fn test_duplicate_add_is_silent() {
        let mut queue = QueueManager::new();
        queue.add(entry("/v/a.mkv"));
        let (hits, _sub) = counted(&mut queue);

        assert!(!queue.add(entry("/v/a.mkv")));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.selected_index(), Some(0));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_add_remove_select_scenario() {
        let mut queue = QueueManager::new();
        queue.add(entry("/v/a.mkv"));
        assert_eq!(queue.selected_index(), Some(0));

        queue.add(entry("/v/b.mkv"));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.selected_index(), Some(0));

        assert!(queue.select(1));
        assert_eq!(queue.selected().unwrap().name, "b.mkv");

        queue.remove(0);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.selected_index(), Some(0));
        assert_eq!(queue.selected().unwrap().name, "b.mkv");
    }

    #[test]
    fn test_remove_selected_last_clamps() {
        let mut queue = QueueManager::new();
        for p in ["/v/a.mkv", "/v/b.mkv", "/v/c.mkv"] {
            queue.add(entry(p));
        }
        queue.select(2);
        queue.remove(2);
        assert_eq!(queue.selected_index(), Some(1));

        queue.remove(0);
        queue.remove(0);
        assert!(queue.is_empty());
        assert_eq!(queue.selected_index(), None);
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut queue = QueueManager::new();
        queue.add(entry("/v/a.mkv"));
        let before = queue.snapshot();
        let (hits, _sub) = counted(&mut queue);

        assert!(queue.remove(1).is_none());
        assert!(queue.remove(usize::MAX).is_none());
        assert_eq!(queue.snapshot(), before);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_select_out_of_range_keeps_selection() {
        let mut queue = QueueManager::new();
        queue.add(entry("/v/a.mkv"));
        queue.add(entry("/v/b.mkv"));
        queue.select(1);

        assert!(!queue.select(2));
        assert_eq!(queue.selected_index(), Some(1));
    }

    #[test]
    fn test_select_current_index_is_silent() {
        let mut queue = QueueManager::new();
        queue.add(entry("/v/a.mkv"));
        let (hits, _sub) = counted(&mut queue);

        assert!(!queue.select(0));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clear_empty_queue_is_silent() {
        let mut queue = QueueManager::new();
        let (hits, _sub) = counted(&mut queue);
        assert_eq!(queue.clear(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        queue.add(entry("/v/a.mkv"));
        assert_eq!(queue.clear(), 1);
        assert_eq!(queue.selected_index(), None);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clear_completed_keeps_order() {
        let mut queue = QueueManager::new();
        for p in ["/v/a.mkv", "/v/b.mkv", "/v/c.mkv"] {
            queue.add(entry(p));
        }
        queue.select(2);
        queue.set_status(1, FileStatus::Encoding).unwrap();
        queue.set_status(1, FileStatus::Done).unwrap();

        assert_eq!(queue.clear_completed(), 1);
        let names: Vec<_> = queue.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.mkv", "c.mkv"]);
        assert_eq!(queue.selected_index(), Some(0));
    }

    #[test]
    fn test_clear_completed_all_done_unsets_selection() {
        let mut queue = encoding_queue();
        queue.set_status(0, FileStatus::Done).unwrap();
        assert_eq!(queue.clear_completed(), 1);
        assert_eq!(queue.selected_index(), None);
    }

    #[test]
    fn test_clear_completed_without_done_resets_selection() {
        let mut queue = QueueManager::new();
        for p in ["/v/a.mkv", "/v/b.mkv", "/v/c.mkv"] {
            queue.add(entry(p));
        }
        queue.select(2);
        let (hits, _sub) = counted(&mut queue);

        assert_eq!(queue.clear_completed(), 0);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.selected_index(), Some(0));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_completed_without_done_at_first_entry_is_silent() {
        let mut queue = QueueManager::new();
        queue.add(entry("/v/a.mkv"));
        queue.add(entry("/v/b.mkv"));
        let (hits, _sub) = counted(&mut queue);

        assert_eq!(queue.clear_completed(), 0);
        assert_eq!(queue.selected_index(), Some(0));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let mut empty = QueueManager::new();
        let (empty_hits, _empty_sub) = counted(&mut empty);
        assert_eq!(empty.clear_completed(), 0);
        assert_eq!(empty.selected_index(), None);
        assert_eq!(empty_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_counts() {
        let mut queue = QueueManager::new();
        for p in ["/v/a.mkv", "/v/b.mkv", "/v/c.mkv", "/v/d.mkv"] {
            queue.add(entry(p));
        }
        queue.set_status(0, FileStatus::Encoding).unwrap();
        queue.set_status(0, FileStatus::Done).unwrap();
        queue.set_status(1, FileStatus::Encoding).unwrap();
        queue.set_status(2, FileStatus::Skipped).unwrap();

        assert_eq!(queue.ready_count(), 1);
        assert_eq!(queue.done_count(), 1);
        assert_eq!(queue.count(FileStatus::Encoding), 1);
        assert!(queue.ready_count() + queue.done_count() <= queue.len());
    }

    #[test]
    fn test_listeners_fire_in_registration_order() {
        let mut queue = QueueManager::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Vec::new();
        for tag in ["list", "detail", "footer"] {
            let order = order.clone();
            subs.push(queue.add_listener(move |_| order.lock().unwrap().push(tag)));
        }

        queue.add(entry("/v/a.mkv"));
        assert_eq!(*order.lock().unwrap(), ["list", "detail", "footer"]);
    }

    #[test]
    fn test_listener_sees_applied_state() {
        let mut queue = QueueManager::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = queue.add_listener(move |q| {
            sink.lock().unwrap().push((q.len(), q.selected_index()));
        });

        queue.add(entry("/v/a.mkv"));
        queue.add(entry("/v/b.mkv"));
        queue.remove(0);
        assert_eq!(
            *seen.lock().unwrap(),
            [(1, Some(0)), (2, Some(0)), (1, Some(0))]
        );
    }

    #[test]
    fn test_dropping_subscription_unregisters() {
        let mut queue = QueueManager::new();
        let (hits, sub) = counted(&mut queue);
        queue.add(entry("/v/a.mkv"));
        assert_eq!(queue.listener_count(), 1);

        drop(sub);
        assert_eq!(queue.listener_count(), 0);
        queue.add(entry("/v/b.mkv"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_detached_subscription_stays_registered() {
        let mut queue = QueueManager::new();
        let (hits, sub) = counted(&mut queue);
        sub.detach();

        queue.add(entry("/v/a.mkv"));
        assert_eq!(queue.listener_count(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_during_dispatch_skips_later_listener() {
        let mut queue = QueueManager::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let victim_slot = slot.clone();
        let _first = queue.add_listener(move |_| {
            victim_slot.lock().unwrap().take();
        });
        let (hits, victim) = counted(&mut queue);
        *slot.lock().unwrap() = Some(victim);

        queue.add(entry("/v/a.mkv"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(queue.listener_count(), 1);
    }

    #[test]
    fn test_panicking_listener_keeps_registry_intact() {
        use std::panic::{catch_unwind, AssertUnwindSafe};
        use std::sync::atomic::AtomicBool;

        let mut queue = QueueManager::new();
        let armed = Arc::new(AtomicBool::new(true));
        let trigger = armed.clone();
        let _panicky = queue.add_listener(move |_| {
            if trigger.swap(false, Ordering::SeqCst) {
                panic!("listener failure");
            }
        });
        let (hits, _sub) = counted(&mut queue);

        let result = catch_unwind(AssertUnwindSafe(|| queue.add(entry("/v/a.mkv"))));
        assert!(result.is_err());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.listener_count(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        assert!(queue.add(entry("/v/b.mkv")));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(queue.listener_count(), 2);
    }

    #[test]
    fn test_set_status_validates_transitions() {
        let mut queue = QueueManager::new();
        queue.add(entry("/v/a.mkv"));

        let err = queue.set_status(0, FileStatus::Done).unwrap_err();
        assert!(matches!(
            err,
            ForgeError::InvalidTransition {
                from: FileStatus::Ready,
                to: FileStatus::Done
            }
        ));
        assert_eq!(queue.get(0).unwrap().status, FileStatus::Ready);

        assert!(matches!(
            queue.set_status(3, FileStatus::Encoding),
            Err(ForgeError::IndexOutOfRange { index: 3, len: 1 })
        ));
    }

    #[test]
    fn test_progress_only_while_encoding() {
        let mut queue = QueueManager::new();
        queue.add(entry("/v/a.mkv"));
        assert!(matches!(
            queue.set_progress(0, 0.5),
            Err(ForgeError::NotEncoding(FileStatus::Ready))
        ));

        queue.set_status(0, FileStatus::Encoding).unwrap();
        queue.set_progress(0, 0.25).unwrap();
        assert_eq!(queue.get(0).unwrap().progress, 0.25);
    }

    #[test]
    fn test_progress_is_clamped() {
        let mut queue = encoding_queue();
        queue.set_progress(0, 1.7).unwrap();
        assert_eq!(queue.get(0).unwrap().progress, 1.0);
        queue.set_progress(0, -3.0).unwrap();
        assert_eq!(queue.get(0).unwrap().progress, 0.0);
        assert!(matches!(
            queue.set_progress(0, f64::NAN),
            Err(ForgeError::InvalidProgress(_))
        ));
    }

    #[test]
    fn test_failure_and_retry() {
        let mut queue = encoding_queue();
        queue.set_progress(0, 0.4).unwrap();
        queue.mark_failed(0, "decoder exited with code 1").unwrap();

        let failed = queue.get(0).unwrap();
        assert_eq!(failed.status, FileStatus::Error);
        assert_eq!(failed.error_message, "decoder exited with code 1");

        queue.reset(0).unwrap();
        let reset = queue.get(0).unwrap();
        assert_eq!(reset.status, FileStatus::Ready);
        assert_eq!(reset.progress, 0.0);
        assert!(reset.error_message.is_empty());
    }

    #[test]
    fn test_mark_failed_notifies_once() {
        let mut queue = encoding_queue();
        let (hits, _sub) = counted(&mut queue);
        queue.mark_failed(0, "boom").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        queue.mark_failed(0, "boom").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_keeps_entry() {
        let mut queue = encoding_queue();
        queue.cancel(0).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get(0).unwrap().status, FileStatus::Skipped);
        assert!(queue.cancel(0).is_ok());
        queue.reset(0).unwrap();
        queue.set_status(0, FileStatus::Encoding).unwrap();
        queue.set_status(0, FileStatus::Done).unwrap();
        assert!(matches!(
            queue.cancel(0),
            Err(ForgeError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_done_sets_full_progress() {
        let mut queue = encoding_queue();
        queue.set_progress(0, 0.9).unwrap();
        queue.set_status(0, FileStatus::Done).unwrap();
        assert_eq!(queue.get(0).unwrap().progress, 1.0);
    }

    #[test]
    fn test_index_of_missing_path() {
        let queue = encoding_queue();
        assert_eq!(queue.index_of(Path::new("/v/a.mkv")).unwrap(), 0);
        assert!(matches!(
            queue.index_of(Path::new("/v/zzz.mkv")),
            Err(ForgeError::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_media_info_write_notifies_on_change() {
        let mut queue = QueueManager::new();
        queue.add(entry("/v/a.mkv"));
        let (hits, _sub) = counted(&mut queue);

        queue.set_media_info(0, Some(MediaInfo::default())).unwrap();
        queue.set_media_info(0, Some(MediaInfo::default())).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(queue.get(0).unwrap().media_info.is_some());
    }
}
