//! Message, reaction and typing handlers

use chat_core::Channel;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{ConnectionState, Event};
use crate::events::payloads::{
    MessageDeleteBulkPayload, MessageDeletePayload, MessagePayload, MessageUpdatePayload,
    ReactionClearEmojiPayload, ReactionClearPayload, ReactionEventPayload, TypingStartPayload,
};

impl ConnectionState {
    pub(super) fn handle_message_create(&self, payload: MessagePayload) {
        let message = payload.to_message();
        let author = payload.author.to_user();
        let (channel_id, message_id) = (message.channel_id, message.id);
        let from_me = self.is_me(author.id);

        {
            let mut cache = self.cache.write();
            if let Some(channel) = cache.private_channel_mut(channel_id) {
                channel.last_message_id = Some(message_id);
                cache.touch_private_channel(channel_id);
            } else if let Some(guild_id) = message.guild_id {
                if let Some(guild) = cache.guild_mut(guild_id) {
                    if guild.channel(channel_id).is_some() {
                        if let Some(channel) = guild.channels_mut().get_mut(&channel_id) {
                            channel.last_message_id = Some(message_id);
                        }
                    } else if guild.thread(channel_id).is_some() {
                        if let Some(thread) = guild.threads_mut().get_mut(&channel_id) {
                            thread.last_message_id = Some(message_id);
                            thread.message_count = thread.message_count.saturating_add(1);
                        }
                    }
                }
            } else if !from_me {
                // First message of a DM the session has not seen yet
                let mut channel = Channel::direct_message(channel_id, author.id);
                channel.last_message_id = Some(message_id);
                cache.store_private_channel(channel, vec![author.clone()]);
            }

            cache.store_message(message.clone(), author);
        }

        self.emit(Event::Message(message));
    }

    pub(super) fn handle_message_update(&self, payload: MessageUpdatePayload) {
        let edited = self.cache.write().message_mut(payload.id).map(|message| {
            let old = message.clone();
            payload.apply(message);
            (old, message.clone())
        });

        if let Some((old, new)) = edited {
            self.emit(Event::MessageEdit { old, new });
        }
        self.emit(Event::RawMessageEdit(payload));
    }

    pub(super) fn handle_message_delete(&self, payload: MessageDeletePayload) {
        let removed = self.cache.write().remove_message(payload.id);
        if let Some(message) = removed {
            self.emit(Event::MessageDelete(message));
        }
        self.emit(Event::RawMessageDelete(payload));
    }

    pub(super) fn handle_message_delete_bulk(&self, payload: MessageDeleteBulkPayload) {
        let removed: Vec<_> = {
            let mut cache = self.cache.write();
            payload
                .ids
                .iter()
                .filter_map(|id| cache.remove_message(*id))
                .collect()
        };
        debug!(
            channel_id = %payload.channel_id,
            requested = payload.ids.len(),
            cached = removed.len(),
            "Bulk message delete"
        );

        if !removed.is_empty() {
            self.emit(Event::BulkMessageDelete(removed));
        }
        self.emit(Event::RawBulkMessageDelete(payload));
    }

    // Reactions

    pub(super) fn handle_reaction_add(&self, payload: ReactionEventPayload) {
        let emoji = payload.emoji.to_partial();
        let me = self.is_me(payload.user_id);
        let reaction = self
            .cache
            .write()
            .message_mut(payload.message_id)
            .map(|message| message.add_reaction(emoji, me));

        if let Some(reaction) = reaction {
            self.emit(Event::ReactionAdd {
                channel_id: payload.channel_id,
                message_id: payload.message_id,
                user_id: payload.user_id,
                reaction,
            });
        }
        self.emit(Event::RawReactionAdd(payload));
    }

    pub(super) fn handle_reaction_remove(&self, payload: ReactionEventPayload) {
        let emoji = payload.emoji.to_partial();
        let me = self.is_me(payload.user_id);
        let reaction = self
            .cache
            .write()
            .message_mut(payload.message_id)
            .and_then(|message| message.remove_reaction(&emoji, me));

        if let Some(reaction) = reaction {
            self.emit(Event::ReactionRemove {
                channel_id: payload.channel_id,
                message_id: payload.message_id,
                user_id: payload.user_id,
                reaction,
            });
        }
        self.emit(Event::RawReactionRemove(payload));
    }

    pub(super) fn handle_reaction_clear(&self, payload: ReactionClearPayload) {
        let cleared = self
            .cache
            .write()
            .message_mut(payload.message_id)
            .map(|message| {
                let reactions = message.clear_reactions();
                (message.clone(), reactions)
            });

        if let Some((message, reactions)) = cleared {
            self.emit(Event::ReactionClear { message, reactions });
        }
        self.emit(Event::RawReactionClear(payload));
    }

    pub(super) fn handle_reaction_clear_emoji(&self, payload: ReactionClearEmojiPayload) {
        let emoji = payload.emoji.to_partial();
        let cleared = self
            .cache
            .write()
            .message_mut(payload.message_id)
            .and_then(|message| {
                let reaction = message.clear_emoji(&emoji)?;
                Some((message.clone(), reaction))
            });

        if let Some((message, reaction)) = cleared {
            self.emit(Event::ReactionClearEmoji { message, reaction });
        }
        self.emit(Event::RawReactionClearEmoji(payload));
    }

    pub(super) fn handle_typing(&self, payload: TypingStartPayload) {
        let known = {
            let cache = self.cache.read();
            cache.channel(payload.channel_id).is_some()
                || cache.guild_of_channel(payload.channel_id).is_some()
        };
        if !known {
            debug!(channel_id = %payload.channel_id, "Typing in unknown channel");
            return;
        }

        self.emit(Event::Typing {
            channel_id: payload.channel_id,
            guild_id: payload.guild_id,
            user_id: payload.user_id,
            at: DateTime::from_timestamp(payload.timestamp, 0).unwrap_or_else(Utc::now),
        });
    }
}
