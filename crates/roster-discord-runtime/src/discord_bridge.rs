use std::sync::Arc;

use anyhow::{Context as _, Result};
use roster_core::{ChannelId, GuildId};
use roster_verify::{
    prime_channel, InteractionEvent, InteractionKind, InteractionRouter, PrimerSettings,
};
use serenity::all::{Client, Context, EventHandler, GatewayIntents, Interaction, Ready};
use tracing::{debug, error, info, warn};

use crate::serenity_gateway::SerenityGuildGateway;
use crate::serenity_interactions::{
    component_event, in_configured_guild, modal_event, InteractionTarget,
    SerenityInteractionResponder,
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `DiscordBridgeConfig` used across Roster components.
pub struct DiscordBridgeConfig {
    pub token: String,
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub resend_intro: bool,
}

impl DiscordBridgeConfig {
    pub fn primer_settings(&self) -> PrimerSettings {
        PrimerSettings {
            channel: self.channel_id,
            resend_intro: self.resend_intro,
        }
    }
}

/// Form submissions hit the store several times before replying, which can
/// outlast Discord's initial response window.
fn defers_before_dispatch(kind: &InteractionKind) -> bool {
    matches!(kind, InteractionKind::FormSubmit { .. })
}

struct RosterEventHandler {
    config: DiscordBridgeConfig,
    router: Arc<InteractionRouter>,
}

impl RosterEventHandler {
    async fn dispatch(
        &self,
        ctx: &Context,
        event: InteractionEvent,
        target: InteractionTarget<'_>,
    ) {
        let gateway = SerenityGuildGateway::new(ctx.http.clone(), self.config.guild_id);
        let responder = SerenityInteractionResponder::new(&ctx.http, target);
        if defers_before_dispatch(&event.kind) {
            if let Err(error) = responder.defer_ephemeral().await {
                let error = format!("{error:#}");
                warn!(custom_id = %event.custom_id, account = %event.account.id, error = %error, "failed to defer modal submission");
            }
        }
        match self.router.dispatch(&event, &gateway, &responder).await {
            Ok(report) => {
                debug!(custom_id = %event.custom_id, account = %event.account.id, report = ?report, "interaction handled");
            }
            Err(error) => {
                let error = format!("{error:#}");
                error!(custom_id = %event.custom_id, account = %event.account.id, error = %error, "interaction handling failed");
            }
        }
    }
}

#[serenity::async_trait]
impl EventHandler for RosterEventHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "discord session ready");
        let gateway = SerenityGuildGateway::new(ctx.http.clone(), self.config.guild_id);
        match prime_channel(&gateway, &self.config.primer_settings()).await {
            Ok(report) => info!(channel = %self.config.channel_id, report = ?report, "verification channel primer finished"),
            Err(error) => {
                let error = format!("{error:#}");
                error!(channel = %self.config.channel_id, error = %error, "verification channel primer failed");
            }
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match &interaction {
            Interaction::Component(component) => {
                if !in_configured_guild(component.guild_id.map(|id| id.get()), self.config.guild_id) {
                    warn!(custom_id = %component.data.custom_id, "ignoring component interaction outside configured guild");
                    return;
                }
                let Some(event) = component_event(component) else {
                    debug!(custom_id = %component.data.custom_id, "ignoring component interaction without member button data");
                    return;
                };
                self.dispatch(&ctx, event, InteractionTarget::Component(component))
                    .await;
            }
            Interaction::Modal(modal) => {
                if !in_configured_guild(modal.guild_id.map(|id| id.get()), self.config.guild_id) {
                    warn!(custom_id = %modal.data.custom_id, "ignoring modal submission outside configured guild");
                    return;
                }
                let Some(event) = modal_event(modal) else {
                    debug!(custom_id = %modal.data.custom_id, "ignoring modal submission without member data");
                    return;
                };
                self.dispatch(&ctx, event, InteractionTarget::Modal(modal))
                    .await;
            }
            _ => {}
        }
    }
}

/// Connects to the Discord gateway and serves interactions until the session
/// ends or ctrl-c is received.
pub async fn run_discord_bridge(
    config: DiscordBridgeConfig,
    router: Arc<InteractionRouter>,
) -> Result<()> {
    let token = config.token.trim().to_string();
    if token.is_empty() {
        anyhow::bail!("discord bot token cannot be empty");
    }
    let guild_id = config.guild_id;
    let handler = RosterEventHandler { config, router };
    let mut client = Client::builder(&token, GatewayIntents::GUILDS)
        .event_handler(handler)
        .await
        .context("failed to build discord client")?;
    let shard_manager = client.shard_manager.clone();

    info!(guild = %guild_id, "discord bridge starting");
    tokio::select! {
        result = client.start() => {
            result.context("discord gateway session ended with an error")
        }
        _ = tokio::signal::ctrl_c() => {
            info!("discord bridge shutdown requested");
            shard_manager.shutdown_all().await;
            Ok(())
        }
    }
}
