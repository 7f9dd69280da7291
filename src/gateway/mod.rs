//! Chat gateway adapter.
//!
//! The bot only needs two capabilities from the chat platform: inbound
//! commands and outbound delivery of a report or a short text. Discord
//! provides both through [`discord::DiscordRest`] (outbound) and
//! [`socket::GatewaySession`] (inbound).

pub mod discord;
pub mod socket;

use crate::cycle::{Trigger, TriggerSender};
use crate::error::GatewayError;
use crate::models::Report;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, RwLock};
use tracing::debug;

pub use discord::DiscordRest;
pub use socket::{GatewaySession, GatewaySettings};

/// Where a message should go.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelRef {
    /// A channel id, e.g. the channel a command came from.
    Id(String),
    /// A channel name, resolved through the [`ChannelDirectory`].
    Name(String),
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelRef::Id(id) => write!(f, "channel {}", id),
            ChannelRef::Name(name) => write!(f, "#{}", name),
        }
    }
}

/// Outbound delivery.
pub trait Gateway {
    /// Post a rendered report.
    fn send_report(
        &self,
        channel: &ChannelRef,
        report: &Report,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Post a plain text message.
    fn send_text(
        &self,
        channel: &ChannelRef,
        text: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

/// Text channels the bot can see, by name.
#[derive(Debug, Clone, Default)]
pub struct ChannelDirectory {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl ChannelDirectory {
    pub fn insert(&self, name: &str, id: &str) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(name.to_string(), id.to_string());
        }
    }

    pub fn lookup(&self, name: &str) -> Option<String> {
        self.inner.read().ok().and_then(|map| map.get(name).cloned())
    }

    /// Resolve a channel reference to a channel id.
    pub fn resolve(&self, channel: &ChannelRef) -> Result<String, GatewayError> {
        match channel {
            ChannelRef::Id(id) => Ok(id.clone()),
            ChannelRef::Name(name) => self
                .lookup(name)
                .ok_or_else(|| GatewayError::UnknownChannel(name.clone())),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|map| map.len()).unwrap_or(0)
    }
}

/// A chat message seen by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub channel_id: String,
    pub author: String,
    pub author_is_bot: bool,
    pub content: String,
}

/// Commands the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run a cycle now and reply in the same channel.
    Update,
}

impl Command {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "update" => Some(Command::Update),
            _ => None,
        }
    }
}

/// Parse `<prefix><command> [args...]`. Command names are case-insensitive.
pub fn parse_command(prefix: &str, content: &str) -> Option<Command> {
    let rest = content.strip_prefix(prefix)?;
    let name = rest.split_whitespace().next()?.to_lowercase();
    Command::from_name(&name)
}

/// Turns chat messages into cycle triggers.
#[derive(Debug, Clone)]
pub struct CommandRouter {
    prefix: String,
    triggers: TriggerSender,
}

impl CommandRouter {
    pub fn new(prefix: impl Into<String>, triggers: TriggerSender) -> Self {
        Self {
            prefix: prefix.into(),
            triggers,
        }
    }

    /// Route one message. Returns the command if one was recognised.
    pub fn dispatch(&self, message: &IncomingMessage) -> Option<Command> {
        if message.author_is_bot {
            return None;
        }

        let command = parse_command(&self.prefix, &message.content)?;
        debug!("Command {:?} from {}", command, message.author);

        match command {
            Command::Update => {
                self.triggers.send(Trigger::command(
                    message.author.clone(),
                    ChannelRef::Id(message.channel_id.clone()),
                ));
            }
        }

        Some(command)
    }
}
