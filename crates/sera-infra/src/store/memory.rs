//! In-process conversation store backed by `DashMap`.
//!
//! Every mutation goes through a DashMap entry guard, so the operations on a
//! single user are atomic with respect to each other. Two bounds keep the
//! map from growing for the life of the process: a per-user turn cap and an
//! idle TTL swept by a background task.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use sera_core::conversation::store::ConversationStore;
use sera_types::config::StoreConfig;
use sera_types::conversation::{ConversationHistory, Turn, UserId};

struct Entry {
    history: ConversationHistory,
    last_touched: Instant,
}

impl Entry {
    fn new(history: ConversationHistory) -> Self {
        Self {
            history,
            last_touched: Instant::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// InMemoryConversationStore
// ---------------------------------------------------------------------------

/// Thread-safe map from user to conversation history.
///
/// Cheap to clone; clones share the same map.
#[derive(Clone)]
pub struct InMemoryConversationStore {
    entries: Arc<DashMap<UserId, Entry>>,
    /// 0 means unbounded.
    max_turns: usize,
    /// `None` disables idle eviction.
    idle_ttl: Option<Duration>,
}

impl InMemoryConversationStore {
    pub fn new(max_turns: usize, idle_ttl: Option<Duration>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_turns,
            idle_ttl,
        }
    }

    /// No cap, no eviction.
    pub fn unbounded() -> Self {
        Self::new(0, None)
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        let idle_ttl = (config.idle_ttl_secs > 0).then(|| Duration::from_secs(config.idle_ttl_secs));
        Self::new(config.max_turns, idle_ttl)
    }

    fn apply_cap(&self, history: &mut ConversationHistory) {
        if self.max_turns > 0 {
            history.truncate_front(self.max_turns);
        }
    }

    /// Remove every entry idle for longer than the TTL. Returns how many went.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    /// [`evict_idle`](Self::evict_idle) against an explicit clock reading.
    pub fn evict_idle_at(&self, now: Instant) -> usize {
        let Some(ttl) = self.idle_ttl else {
            return 0;
        };
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.last_touched) <= ttl);
        before.saturating_sub(self.entries.len())
    }

    /// Run [`evict_idle`](Self::evict_idle) every `interval` until `cancel` fires.
    pub fn spawn_sweeper(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("conversation sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let evicted = store.evict_idle();
                        if evicted > 0 {
                            tracing::info!(evicted, remaining = store.entries.len(), "evicted idle conversations");
                        }
                    }
                }
            }
        })
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}

impl ConversationStore for InMemoryConversationStore {
    async fn get(&self, user: &UserId) -> ConversationHistory {
        match self.entries.get_mut(user) {
            Some(mut entry) => {
                entry.last_touched = Instant::now();
                entry.history.clone()
            }
            None => ConversationHistory::new(),
        }
    }

    async fn put(&self, user: &UserId, mut history: ConversationHistory) {
        self.apply_cap(&mut history);
        self.entries.insert(user.clone(), Entry::new(history));
    }

    async fn append_exchange(&self, user: &UserId, user_turn: Turn, model_turn: Turn) -> ConversationHistory {
        let mut entry = self
            .entries
            .entry(user.clone())
            .or_insert_with(|| Entry::new(ConversationHistory::new()));
        entry.history.push(user_turn);
        entry.history.push(model_turn);
        self.apply_cap(&mut entry.history);
        entry.last_touched = Instant::now();
        entry.history.clone()
    }

    async fn user_count(&self) -> usize {
        self.entries.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
