//! Presence registry: the set of people currently considered "in view".
//!
//! Each entry is keyed by the embedding captured at first sighting. Every
//! frame the registry is pruned by age and then updated with the frame's
//! observations, either refreshing a matching entry or inserting a new one.
//! The passenger count is simply the number of live entries.

use crate::types::{Embedding, MatchPolicy, Matcher};
use std::time::{Duration, Instant};

/// A presumed-unique individual seen recently.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    /// Embedding from the first sighting. Never re-derived on later matches.
    pub key: Embedding,
    pub first_seen: Instant,
    pub last_seen: Instant,
}

impl RegistryEntry {
    fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }
}

/// Outcome of feeding one frame's embeddings into the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameUpdate {
    pub expired: usize,
    pub matched: usize,
    pub inserted: usize,
}

/// In-memory registry of present faces.
pub struct PresenceRegistry {
    /// Insertion order is the scan order used by [`MatchPolicy::First`].
    entries: Vec<RegistryEntry>,
    policy: MatchPolicy,
    match_threshold: f32,
    expiry: Duration,
}

impl PresenceRegistry {
    pub fn new(policy: MatchPolicy, match_threshold: f32, expiry: Duration) -> Self {
        Self {
            entries: Vec::new(),
            policy,
            match_threshold,
            expiry,
        }
    }

    /// Number of people currently present.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Remove entries whose last match is more than `expiry` ago.
    ///
    /// Returns the number of entries removed.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let expiry = self.expiry;
        self.entries.retain(|e| e.age(now) <= expiry);
        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = self.entries.len(), "expired stale faces");
        }
        removed
    }

    /// Match each embedding against the registry, refreshing or inserting.
    ///
    /// An entry can be claimed by at most one embedding per call: two faces in
    /// the same frame are two people, so once an entry has been refreshed (or
    /// inserted) during this call, later embeddings only consider the
    /// remaining entries.
    pub fn observe(&mut self, embeddings: &[Embedding], now: Instant) -> FrameUpdate {
        let mut update = FrameUpdate::default();
        let mut claimed = vec![false; self.entries.len()];

        for embedding in embeddings {
            let open: Vec<usize> = (0..self.entries.len()).filter(|&i| !claimed[i]).collect();
            let candidates: Vec<&Embedding> = open.iter().map(|&i| &self.entries[i].key).collect();

            match self.policy.select(embedding, &candidates, self.match_threshold) {
                Some(m) => {
                    let idx = open[m.index];
                    self.entries[idx].last_seen = now;
                    claimed[idx] = true;
                    update.matched += 1;
                    tracing::trace!(entry = idx, distance = m.distance, "face matched");
                }
                None => {
                    self.entries.push(RegistryEntry {
                        key: embedding.clone(),
                        first_seen: now,
                        last_seen: now,
                    });
                    claimed.push(true);
                    update.inserted += 1;
                    tracing::debug!(present = self.entries.len(), "new face registered");
                }
            }
        }

        update
    }

    /// Per-frame step: expire stale entries, then match the frame's embeddings.
    pub fn update(&mut self, embeddings: &[Embedding], now: Instant) -> FrameUpdate {
        let expired = self.expire(now);
        let mut update = self.observe(embeddings, now);
        update.expired = expired;
        update
    }
}
