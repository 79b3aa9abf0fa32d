// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Message cache (C2): announced payloads keyed by `msg_id`, indexed by
//! data-type, alongside the subscriber lists data-types fan out to.

use std::collections::HashMap;
use std::sync::Mutex;

use log::warn;
use rand::Rng;

/// A cached announcement. `valid` is tri-state: `None` until a subscriber
/// answers with a `VALIDATION`.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Vec<u8>,
    pub ttl: u8,
    pub valid: Option<bool>,
}

#[derive(Default)]
struct Inner {
    data_types: HashMap<u16, Vec<u16>>,
    messages: HashMap<u16, CacheEntry>,
    subscribers: HashMap<u16, Vec<String>>,
}

/// Shared store for C2. A single mutex guards all three maps; it is held
/// only across pointer-shuffling, never across socket I/O — callers that
/// need to fan a notification out to subscribers must take the snapshot
/// from [`MessageCache::subscribers`] and release the lock before writing
/// to any socket.
pub struct MessageCache {
    inner: Mutex<Inner>,
}

impl Default for MessageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageCache {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner::default()) }
    }

    /// Allocate a fresh `msg_id` (uniform random over the full 16-bit
    /// space, retried on collision — the source's `randint(0, 100)` is a
    /// latent bug this widens), insert the entry with `valid = None`, and
    /// append the id to `data_types[data_type]`. Atomic under the cache
    /// lock.
    pub fn add_data(&self, data_type: u16, payload: Vec<u8>, ttl: u8) -> u16 {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let mut rng = rand::thread_rng();
        let msg_id = loop {
            let candidate: u16 = rng.gen();
            if !inner.messages.contains_key(&candidate) {
                break candidate;
            }
        };
        inner.messages.insert(msg_id, CacheEntry { payload, ttl, valid: None });
        inner.data_types.entry(data_type).or_default().push(msg_id);
        msg_id
    }

    /// Append-if-absent.
    pub fn add_subscriber(&self, data_type: u16, sub_addr: String) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let subs = inner.subscribers.entry(data_type).or_default();
        if !subs.contains(&sub_addr) {
            subs.push(sub_addr);
        }
    }

    /// Sweep every data-type's subscriber list, removing `sub_addr`.
    /// Invoked on API-client teardown so the cache stays bounded.
    pub fn remove_subscriber(&self, sub_addr: &str) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        for subs in inner.subscribers.values_mut() {
            subs.retain(|s| s != sub_addr);
        }
    }

    /// Snapshot copy of the subscriber list for `data_type`, safe to
    /// iterate without holding the cache lock.
    pub fn get_subscribers(&self, data_type: u16) -> Vec<String> {
        let inner = self.inner.lock().expect("cache mutex poisoned");
        inner.subscribers.get(&data_type).cloned().unwrap_or_default()
    }

    /// Marks `msg_id` invalid. Absence is logged, not fatal — validations
    /// may arrive for ids this node never produced itself (e.g. racing a
    /// restart) and must not take the process down.
    pub fn make_invalid(&self, msg_id: u16) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        match inner.messages.get_mut(&msg_id) {
            Some(entry) => entry.valid = Some(false),
            None => warn!("validation for unknown msg_id {msg_id}"),
        }
    }

    /// Test/introspection helper: current entry for `msg_id`, if any.
    pub fn get(&self, msg_id: u16) -> Option<CacheEntry> {
        let inner = self.inner.lock().expect("cache mutex poisoned");
        inner.messages.get(&msg_id).cloned()
    }

    /// Test/introspection helper: ids recorded for `data_type`.
    pub fn message_ids(&self, data_type: u16) -> Vec<u16> {
        let inner = self.inner.lock().expect("cache mutex poisoned");
        inner.data_types.get(&data_type).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_data_registers_id_under_its_data_type() {
        let cache = MessageCache::new();
        let id = cache.add_data(1001, b"hi".to_vec(), 3);
        assert!(cache.message_ids(1001).contains(&id));
        let entry = cache.get(id).unwrap();
        assert_eq!(entry.ttl, 3);
        assert_eq!(entry.valid, None);
    }

    #[test]
    fn make_invalid_flips_the_flag() {
        let cache = MessageCache::new();
        let id = cache.add_data(1, vec![], 0);
        cache.make_invalid(id);
        assert_eq!(cache.get(id).unwrap().valid, Some(false));
    }

    #[test]
    fn make_invalid_on_unknown_id_is_a_no_op() {
        let cache = MessageCache::new();
        cache.make_invalid(42); // must not panic
    }

    #[test]
    fn subscriber_is_removed_from_every_data_type_on_disconnect() {
        let cache = MessageCache::new();
        cache.add_subscriber(1, "10.0.0.1:9000".to_string());
        cache.add_subscriber(2, "10.0.0.1:9000".to_string());
        cache.remove_subscriber("10.0.0.1:9000");
        assert!(cache.get_subscribers(1).is_empty());
        assert!(cache.get_subscribers(2).is_empty());
    }

    #[test]
    fn add_subscriber_is_append_if_absent() {
        let cache = MessageCache::new();
        cache.add_subscriber(1, "a".to_string());
        cache.add_subscriber(1, "a".to_string());
        assert_eq!(cache.get_subscribers(1), vec!["a".to_string()]);
    }
}
