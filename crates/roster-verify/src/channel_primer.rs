//! Resets the verification channel to a single welcome message on connect.

use anyhow::{Context, Result};
use async_trait::async_trait;
use roster_core::{ChannelId, MessageId};
use tracing::{info, warn};

use crate::verification_form::VERIFY_BUTTON_ID;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Primary action button attached to the welcome message.
pub struct ButtonSpec {
    pub custom_id: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Public struct `WelcomeMessage` posted by the primer.
pub struct WelcomeMessage {
    pub content: &'static str,
    pub button: ButtonSpec,
}

pub const WELCOME_MESSAGE: WelcomeMessage = WelcomeMessage {
    content: "Welcome! Please accept the server rules, then press the button below.",
    button: ButtonSpec {
        custom_id: VERIFY_BUTTON_ID,
        label: "Verify your membership",
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// One page of channel history, newest first.
pub enum ChannelHistoryPage {
    /// Nothing (left) to enumerate.
    Empty,
    Messages(Vec<MessageId>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates results of deleting one channel message.
pub enum MessageDeletion {
    Deleted,
    /// The platform reported the message as unknown.
    AlreadyGone,
}

#[async_trait]
/// Trait contract for channel history and posting on the chat platform.
pub trait ChannelGateway: Send + Sync {
    /// Returns up to one page of message ids older than `before`.
    async fn message_page(
        &self,
        channel: ChannelId,
        before: Option<MessageId>,
    ) -> Result<ChannelHistoryPage>;

    async fn delete_message(&self, channel: ChannelId, message: MessageId)
        -> Result<MessageDeletion>;

    async fn post_welcome(&self, channel: ChannelId, welcome: &WelcomeMessage)
        -> Result<MessageId>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Public struct `PrimerSettings` used by the primer.
pub struct PrimerSettings {
    pub channel: ChannelId,
    pub resend_intro: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates primer results.
pub enum PrimerReport {
    Skipped,
    Primed {
        deleted: usize,
        already_gone: usize,
        /// Messages that could not be deleted and were left in place.
        failed: usize,
        welcome_message: MessageId,
    },
}

/// Clears the channel and posts the welcome message when `resend_intro` is set.
pub async fn prime_channel(
    gateway: &dyn ChannelGateway,
    settings: &PrimerSettings,
) -> Result<PrimerReport> {
    if !settings.resend_intro {
        info!(channel = %settings.channel, "resend intro disabled; leaving verification channel as is");
        return Ok(PrimerReport::Skipped);
    }

    info!(channel = %settings.channel, "resetting verification channel");
    let mut deleted = 0_usize;
    let mut already_gone = 0_usize;
    let mut failed = 0_usize;
    let mut before = None;
    loop {
        let page = gateway
            .message_page(settings.channel, before)
            .await
            .with_context(|| format!("failed to read history of channel {}", settings.channel))?;
        let ids = match page {
            ChannelHistoryPage::Messages(ids) if !ids.is_empty() => ids,
            _ => {
                info!(channel = %settings.channel, "verification channel history exhausted");
                break;
            }
        };
        for message in &ids {
            match gateway.delete_message(settings.channel, *message).await {
                Ok(MessageDeletion::Deleted) => deleted = deleted.saturating_add(1),
                Ok(MessageDeletion::AlreadyGone) => {
                    warn!(message = %message, "message already deleted");
                    already_gone = already_gone.saturating_add(1);
                }
                Err(error) => {
                    warn!(message = %message, error = %error, "failed to delete message; leaving it in place");
                    failed = failed.saturating_add(1);
                }
            }
        }
        before = ids.iter().min().copied();
    }

    let welcome_message = gateway
        .post_welcome(settings.channel, &WELCOME_MESSAGE)
        .await
        .with_context(|| format!("failed to post welcome message to {}", settings.channel))?;
    info!(
        channel = %settings.channel,
        deleted,
        already_gone,
        failed,
        welcome_message = %welcome_message,
        "verification channel primed"
    );
    Ok(PrimerReport::Primed {
        deleted,
        already_gone,
        failed,
        welcome_message,
    })
}
