//! Role and channel operations over serenity's HTTP client.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use roster_core::{AccountId, ChannelId, GuildId, MemberRoleGateway, MessageId, RoleId};
use roster_verify::{ChannelGateway, ChannelHistoryPage, MessageDeletion, WelcomeMessage};
use serenity::all::{
    ButtonStyle, ChannelId as DiscordChannelId, CreateActionRow, CreateButton, CreateMessage,
    GetMessages, GuildId as DiscordGuildId, Http, MessageId as DiscordMessageId,
    RoleId as DiscordRoleId, UserId as DiscordUserId,
};

const HISTORY_PAGE_SIZE: u8 = 100;
const ROLE_AUDIT_REASON: &str = "roster membership verification";

#[derive(Clone)]
/// Guild-scoped gateway backed by the session's HTTP client.
pub struct SerenityGuildGateway {
    http: Arc<Http>,
    guild: GuildId,
}

impl SerenityGuildGateway {
    pub fn new(http: Arc<Http>, guild: GuildId) -> Self {
        Self { http, guild }
    }
}

#[async_trait]
impl MemberRoleGateway for SerenityGuildGateway {
    async fn grant_role(&self, account: AccountId, role: RoleId) -> Result<()> {
        self.http
            .add_member_role(
                DiscordGuildId::new(self.guild.get()),
                DiscordUserId::new(account.get()),
                DiscordRoleId::new(role.get()),
                Some(ROLE_AUDIT_REASON),
            )
            .await
            .with_context(|| format!("discord add_member_role failed for role {role}"))
    }

    async fn revoke_role(&self, account: AccountId, role: RoleId) -> Result<()> {
        self.http
            .remove_member_role(
                DiscordGuildId::new(self.guild.get()),
                DiscordUserId::new(account.get()),
                DiscordRoleId::new(role.get()),
                Some(ROLE_AUDIT_REASON),
            )
            .await
            .with_context(|| format!("discord remove_member_role failed for role {role}"))
    }
}

#[async_trait]
impl ChannelGateway for SerenityGuildGateway {
    async fn message_page(
        &self,
        channel: ChannelId,
        before: Option<MessageId>,
    ) -> Result<ChannelHistoryPage> {
        let mut request = GetMessages::new().limit(HISTORY_PAGE_SIZE);
        if let Some(before) = before {
            request = request.before(DiscordMessageId::new(before.get()));
        }
        let messages = DiscordChannelId::new(channel.get())
            .messages(&self.http, request)
            .await
            .context("discord get channel messages failed")?;
        if messages.is_empty() {
            return Ok(ChannelHistoryPage::Empty);
        }
        Ok(ChannelHistoryPage::Messages(
            messages
                .iter()
                .map(|message| MessageId(message.id.get()))
                .collect(),
        ))
    }

    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<MessageDeletion> {
        match DiscordChannelId::new(channel.get())
            .delete_message(&self.http, DiscordMessageId::new(message.get()))
            .await
        {
            Ok(()) => Ok(MessageDeletion::Deleted),
            Err(error) if is_unknown_resource_status(http_status(&error)) => {
                Ok(MessageDeletion::AlreadyGone)
            }
            Err(error) => Err(error).context("discord delete message failed"),
        }
    }

    async fn post_welcome(
        &self,
        channel: ChannelId,
        welcome: &WelcomeMessage,
    ) -> Result<MessageId> {
        let button = CreateButton::new(welcome.button.custom_id)
            .label(welcome.button.label)
            .style(ButtonStyle::Primary);
        let message = CreateMessage::new()
            .content(welcome.content)
            .components(vec![CreateActionRow::Buttons(vec![button])]);
        let posted = DiscordChannelId::new(channel.get())
            .send_message(&self.http, message)
            .await
            .context("discord send welcome message failed")?;
        Ok(MessageId(posted.id.get()))
    }
}

fn http_status(error: &serenity::Error) -> Option<u16> {
    match error {
        serenity::Error::Http(http_error) => http_error.status_code().map(|status| status.as_u16()),
        _ => None,
    }
}

pub(crate) fn is_unknown_resource_status(status: Option<u16>) -> bool {
    status == Some(404)
}
