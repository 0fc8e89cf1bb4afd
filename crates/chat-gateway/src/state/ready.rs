//! READY handling and per-shard readiness
//!
//! After READY a shard collects the guilds that become available until no
//! new one arrives within `guild_ready_timeout`. It then waits for their
//! member chunks, emits `GuildAvailable` for each and `ShardReady` for
//! itself. `Ready` follows once every configured shard is ready.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chat_cache::ChunkWaiter;
use chat_core::{Guild, Snowflake};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{ConnectionState, Event};
use crate::events::payloads::ReadyPayload;

/// Guild whose availability notification is held until its shard is ready
#[derive(Debug)]
pub(super) struct PendingGuild {
    pub guild_id: Snowflake,
    pub chunk: Option<ChunkWaiter>,
}

#[derive(Debug)]
struct Collector {
    generation: u64,
    tx: mpsc::UnboundedSender<PendingGuild>,
}

#[derive(Debug, Default)]
pub(super) struct Readiness {
    /// Shards that received READY since the last full clear
    launched: HashSet<u32>,
    ready: HashSet<u32>,
    ready_emitted: bool,
    collectors: HashMap<u32, Collector>,
    generations: HashMap<u32, u64>,
    next_generation: u64,
}

impl Readiness {
    pub fn reset(&mut self) {
        self.launched.clear();
        self.ready.clear();
        self.ready_emitted = false;
        self.collectors.clear();
        self.generations.clear();
    }

    pub fn drop_shard(&mut self, shard_id: u32) {
        self.launched.remove(&shard_id);
        self.ready.remove(&shard_id);
        self.collectors.remove(&shard_id);
        self.generations.remove(&shard_id);
    }

    fn has_launched(&self) -> bool {
        !self.launched.is_empty()
    }

    /// Start collecting guilds for a shard, replacing any previous round
    fn begin(&mut self, shard_id: u32) -> (u64, mpsc::UnboundedReceiver<PendingGuild>) {
        self.next_generation += 1;
        let generation = self.next_generation;
        let (tx, rx) = mpsc::unbounded_channel();

        self.launched.insert(shard_id);
        self.ready.remove(&shard_id);
        self.collectors.insert(shard_id, Collector { generation, tx });
        self.generations.insert(shard_id, generation);
        (generation, rx)
    }

    /// Hand a guild to the shard's collector, or give it back when the
    /// shard is not collecting
    pub fn offer(&self, shard_id: u32, pending: PendingGuild) -> Result<(), PendingGuild> {
        match self.collectors.get(&shard_id) {
            Some(collector) => collector.tx.send(pending).map_err(|e| e.0),
            None => Err(pending),
        }
    }

    /// Stop collecting. False when a newer round replaced this one.
    fn close(&mut self, shard_id: u32, generation: u64) -> bool {
        match self.collectors.get(&shard_id) {
            Some(c) if c.generation == generation => {
                self.collectors.remove(&shard_id);
                true
            }
            _ => false,
        }
    }

    fn is_current(&self, shard_id: u32, generation: u64) -> bool {
        self.generations.get(&shard_id) == Some(&generation)
    }

    /// Mark a shard ready; true when this completes the set for the first time
    fn mark_ready(&mut self, shard_id: u32, shard_count: u32) -> bool {
        self.ready.insert(shard_id);
        if !self.ready_emitted && self.ready.len() >= shard_count as usize {
            self.ready_emitted = true;
            return true;
        }
        false
    }
}

impl ConnectionState {
    pub(super) fn handle_ready(self: &Arc<Self>, shard_id: u32, payload: ReadyPayload) {
        let shard_count = self.settings.shard_count;

        {
            let mut session = self.session.write();
            session.user = Some(payload.user.to_user());
            if let Some(application) = &payload.application {
                session.application_id = Some(application.id);
            }
            session
                .session_ids
                .insert(shard_id, payload.session_id.clone());
        }

        let full_clear = shard_count <= 1 || !self.readiness.lock().has_launched();
        if full_clear {
            self.readiness.lock().reset();
            self.cache.write().clear();
            self.chunks.cancel_all();
        } else {
            self.readiness.lock().drop_shard(shard_id);
            self.remove_shard_guilds(shard_id);
        }

        {
            let mut cache = self.cache.write();
            for channel in &payload.private_channels {
                cache.store_private_channel(channel.to_channel(None), channel.recipients());
            }
            for guild in &payload.guilds {
                cache.store_guild(Guild::unavailable_stub(guild.id), Vec::new());
            }
        }

        info!(
            shard_id,
            guilds = payload.guilds.len(),
            session_id = %payload.session_id,
            user = %payload.user.username,
            "Shard received READY"
        );

        let (generation, rx) = self.readiness.lock().begin(shard_id);
        let state = Arc::clone(self);
        tokio::spawn(async move {
            state.sequence_shard(shard_id, generation, rx).await;
        });
    }

    async fn sequence_shard(
        self: Arc<Self>,
        shard_id: u32,
        generation: u64,
        mut rx: mpsc::UnboundedReceiver<PendingGuild>,
    ) {
        let mut pending = Vec::new();
        loop {
            match tokio::time::timeout(self.settings.guild_ready_timeout, rx.recv()).await {
                Ok(Some(guild)) => pending.push(guild),
                Ok(None) | Err(_) => break,
            }
        }

        if !self.readiness.lock().close(shard_id, generation) {
            debug!(shard_id, "Readiness round superseded");
            return;
        }
        // Anything offered before the collector was closed is still queued
        while let Ok(guild) = rx.try_recv() {
            pending.push(guild);
        }
        drop(rx);

        debug!(shard_id, guilds = pending.len(), "Shard stopped waiting for guilds");

        for PendingGuild { guild_id, chunk } in pending {
            if let Some(waiter) = chunk {
                if let Err(e) = waiter.wait(self.settings.chunk_timeout).await {
                    warn!(
                        guild_id = %guild_id,
                        received = e.partial().len(),
                        "Guild members not fully chunked before ready"
                    );
                }
            }
            if !self.readiness.lock().is_current(shard_id, generation) {
                return;
            }
            if let Some(guild) = self.guild(guild_id) {
                self.emit(Event::GuildAvailable(guild));
            }
        }

        let all_ready = {
            let mut readiness = self.readiness.lock();
            if !readiness.is_current(shard_id, generation) {
                return;
            }
            readiness.mark_ready(shard_id, self.settings.shard_count)
        };

        info!(shard_id, "Shard ready");
        self.emit(Event::ShardReady(shard_id));
        if all_ready {
            info!("All shards ready");
            self.emit(Event::Ready);
        }
    }
}
