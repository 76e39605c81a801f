use super::decision::Decision;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry {
    decision: Decision,
    inserted_at: Instant,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    // Insertion order, oldest first; may hold keys already overwritten.
    order: VecDeque<(String, Instant)>,
}

impl Inner {
    // Order records for keys rewritten since are stale and remove nothing.
    fn remove_if_written(&mut self, key: &str, written: Instant) {
        if self
            .entries
            .get(key)
            .is_some_and(|entry| entry.inserted_at == written)
        {
            self.entries.remove(key);
        }
    }
}

/// Decisions keyed by payload hash; entries expire a fixed time after being
/// written and the oldest entry is evicted once `max_size` is reached.
pub struct DecisionCache {
    ttl: Duration,
    max_size: usize,
    inner: Mutex<Inner>,
}

impl DecisionCache {
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            ttl,
            max_size,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Decision> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&self, key: String, decision: Decision) {
        self.insert_at(key, decision, Instant::now());
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<Decision> {
        let mut inner = self.inner.lock().ok()?;
        let entry = inner.entries.get(key)?;
        if now.duration_since(entry.inserted_at) < self.ttl {
            return Some(entry.decision);
        }
        inner.entries.remove(key);
        None
    }

    fn insert_at(&self, key: String, decision: Decision, now: Instant) {
        if self.max_size == 0 {
            return;
        }
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };

        // `order` is oldest first, so expired entries sit at its front.
        while inner
            .order
            .front()
            .is_some_and(|(_, written)| now.duration_since(*written) >= self.ttl)
        {
            if let Some((oldest, written)) = inner.order.pop_front() {
                inner.remove_if_written(&oldest, written);
            }
        }

        while inner.entries.len() >= self.max_size && !inner.entries.contains_key(&key) {
            let Some((oldest, written)) = inner.order.pop_front() else {
                break;
            };
            inner.remove_if_written(&oldest, written);
        }

        inner.order.push_back((key.clone(), now));
        inner.entries.insert(
            key,
            Entry {
                decision,
                inserted_at: now,
            },
        );

        if inner.order.len() > self.max_size.saturating_mul(2) {
            let Inner { entries, order } = &mut *inner;
            order.retain(|(k, written)| {
                entries
                    .get(k)
                    .is_some_and(|entry| entry.inserted_at == *written)
            });
        }
    }
}
