mod bootstrap_helpers;
mod cli_args;
mod startup_config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use roster_airtable::AirtableMembershipStore;
use roster_discord_runtime::run_discord_bridge;
use roster_verify::{InteractionRouter, VerificationResolver};
use tracing::info;

use crate::bootstrap_helpers::init_tracing;
use crate::cli_args::Cli;
use crate::startup_config::RosterConfig;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = RosterConfig::from_cli(&cli).context("invalid roster-bot configuration")?;
    run(config).await
}

async fn run(config: RosterConfig) -> Result<()> {
    let store = AirtableMembershipStore::new(&config.airtable)
        .context("failed to create airtable membership store")?;
    let resolver = VerificationResolver::new(Arc::new(store));
    let router = Arc::new(InteractionRouter::new(resolver, config.verification));

    info!(
        guild = %config.discord.guild_id,
        channel = %config.discord.channel_id,
        resend_intro = config.discord.resend_intro,
        "roster-bot starting"
    );
    run_discord_bridge(config.discord, router).await
}
