//! Client-side sync state for a Parley chat session.
//!
//! `ChatSync` holds the local view a chat UI renders: the user list with
//! unseen badges, the set of online users, and the currently open
//! conversation. It owns no transport — the embedding client feeds it
//! REST responses and gateway events and reads the reconciled state back.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use parley_types::events::GatewayEvent;
use parley_types::models::{Message, User};

#[derive(Debug)]
pub struct ChatSync {
    self_id: Uuid,
    users: Vec<User>,
    unseen: HashMap<Uuid, u64>,
    online: HashSet<Uuid>,
    open: Option<Conversation>,
}

#[derive(Debug)]
struct Conversation {
    counterpart: Uuid,
    messages: Vec<Message>,
}

impl ChatSync {
    pub fn new(self_id: Uuid) -> Self {
        Self {
            self_id,
            users: Vec::new(),
            unseen: HashMap::new(),
            online: HashSet::new(),
            open: None,
        }
    }

    /// Install a sidebar listing response: the full user list and the
    /// server's sparse unseen map (which replaces local badge state).
    pub fn set_users(&mut self, users: Vec<User>, unseen: HashMap<Uuid, u64>) {
        self.users = users;
        self.unseen = unseen;
    }

    /// Install fetched history for a conversation. The fetch itself
    /// cleared server-side unseen state, so the local badge goes to zero.
    pub fn open_conversation(&mut self, counterpart: Uuid, history: Vec<Message>) {
        self.unseen.remove(&counterpart);
        self.open = Some(Conversation {
            counterpart,
            messages: history,
        });
    }

    pub fn close_conversation(&mut self) {
        self.open = None;
    }

    /// Append a message this client just sent (the `newMessage` from the
    /// send response), if the conversation is still open.
    pub fn record_sent(&mut self, message: Message) {
        if let Some(open) = &mut self.open {
            if open.counterpart == message.receiver_id {
                open.messages.push(message);
            }
        }
    }

    /// Reconcile one pushed gateway event into local state.
    pub fn apply_event(&mut self, event: GatewayEvent) {
        match event {
            // Presence snapshots replace the online set wholesale.
            GatewayEvent::OnlineUsers(ids) => {
                self.online = ids.into_iter().collect();
            }

            GatewayEvent::NewMessage(message) => {
                if message.receiver_id != self.self_id {
                    // Not addressed to us; a well-behaved server never
                    // pushes these.
                    return;
                }
                match &mut self.open {
                    Some(open) if open.counterpart == message.sender_id => {
                        open.messages.push(message);
                    }
                    _ => {
                        *self.unseen.entry(message.sender_id).or_insert(0) += 1;
                    }
                }
            }
        }
    }

    // -- Accessors --

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.online.contains(&user_id)
    }

    pub fn online_users(&self) -> &HashSet<Uuid> {
        &self.online
    }

    pub fn unseen_count(&self, user_id: Uuid) -> u64 {
        self.unseen.get(&user_id).copied().unwrap_or(0)
    }

    pub fn open_counterpart(&self) -> Option<Uuid> {
        self.open.as_ref().map(|c| c.counterpart)
    }

    pub fn messages(&self) -> &[Message] {
        self.open.as_ref().map(|c| c.messages.as_slice()).unwrap_or(&[])
    }
}
