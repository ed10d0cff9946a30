//! Word completion index built off the editing thread.
//!
//! The worker receives document snapshots tagged with the store revision and
//! answers with a sorted word list for that revision. Requests that pile up
//! while a build is running are coalesced so only the newest snapshot is
//! indexed. The editing side must drop indexes whose revision no longer
//! matches the store.

use crate::constants::DEFAULT_COMPLETION_MIN_WORD_CHARS;
use crossbeam_channel::{Receiver, Sender};
use std::io;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

/// Snapshot sent to the worker.
#[derive(Clone, Debug)]
pub struct WordIndexRequest {
    pub revision: u64,
    pub text: String,
}

/// Sorted, de-duplicated words of one document revision.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WordIndex {
    pub revision: u64,
    words: Vec<String>,
}

impl WordIndex {
    /// Index the words of `text` with at least `min_chars` chars.
    pub fn build(revision: u64, text: &str, min_chars: usize) -> Self {
        let mut words: Vec<String> = text
            .unicode_words()
            .filter(|word| word.chars().count() >= min_chars)
            .map(str::to_string)
            .collect();
        words.sort_unstable();
        words.dedup();
        Self { revision, words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Up to `limit` words starting with `prefix`, excluding `prefix` itself.
    pub fn suggestions(&self, prefix: &str, limit: usize) -> Vec<&str> {
        if prefix.is_empty() {
            return Vec::new();
        }
        let first = self.words.partition_point(|word| word.as_str() < prefix);
        self.words[first..]
            .iter()
            .take_while(|word| word.starts_with(prefix))
            .filter(|word| word.as_str() != prefix)
            .take(limit)
            .map(String::as_str)
            .collect()
    }
}

/// Background thread building [`WordIndex`]es.
pub struct WordIndexWorker {
    tx: Sender<WordIndexRequest>,
    rx: Receiver<WordIndex>,
}

impl WordIndexWorker {
    /// Spawn the worker with the default minimum word length.
    ///
    /// # Errors
    /// Returns the OS error when the thread cannot be spawned.
    pub fn spawn() -> io::Result<Self> {
        Self::spawn_with_min_chars(DEFAULT_COMPLETION_MIN_WORD_CHARS)
    }

    pub fn spawn_with_min_chars(min_chars: usize) -> io::Result<Self> {
        let (tx, rx_cmd) = crossbeam_channel::unbounded::<WordIndexRequest>();
        let (tx_evt, rx_evt) = crossbeam_channel::unbounded();

        thread::Builder::new()
            .name("textport-word-index".to_string())
            .spawn(move || {
                for req in rx_cmd.iter() {
                    let mut latest = req;
                    // Skip snapshots superseded while the previous build ran.
                    while let Ok(next) = rx_cmd.try_recv() {
                        latest = next;
                    }
                    let started = Instant::now();
                    let index = WordIndex::build(latest.revision, &latest.text, min_chars);
                    debug!(
                        target: "textport::completion",
                        revision = latest.revision,
                        words = index.len(),
                        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
                        "built word index"
                    );
                    if tx_evt.send(index).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self { tx, rx: rx_evt })
    }

    /// Queue a snapshot; returns `false` when the worker has stopped.
    pub fn request(&self, revision: u64, text: String) -> bool {
        self.tx.send(WordIndexRequest { revision, text }).is_ok()
    }

    /// Newest finished index, if any, without blocking.
    pub fn try_latest(&self) -> Option<WordIndex> {
        self.rx.try_iter().last()
    }

    /// Wait up to `timeout` for the next finished index.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<WordIndex> {
        self.rx.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestions_match_prefix_in_order() {
        let index = WordIndex::build(3, "render renderer rendering rest render_pass re", 3);
        assert_eq!(index.revision, 3);
        assert_eq!(
            index.suggestions("rend", 10),
            vec!["render", "render_pass", "renderer", "rendering"]
        );
        assert_eq!(index.suggestions("render", 2), vec!["render_pass", "renderer"]);
        assert!(index.suggestions("", 5).is_empty());
        assert!(!index.words().iter().any(|word| word == "re"));
    }

    #[test]
    fn worker_answers_with_revision_tagged_index() {
        let worker = WordIndexWorker::spawn().expect("spawn worker");
        assert!(worker.request(7, "alpha beta alphabet".to_string()));
        let index = worker
            .recv_timeout(Duration::from_secs(5))
            .expect("index from worker");
        assert_eq!(index.revision, 7);
        assert_eq!(index.suggestions("alp", 5), vec!["alpha", "alphabet"]);
    }
}
