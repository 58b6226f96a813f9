use clap::{builder::BoolishValueParser, ArgAction, Parser};
use roster_core::{AccountId, ChannelId, GuildId, RoleId};

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "roster-bot",
    about = "Discord membership verification bot backed by an Airtable roster",
    version
)]
/// Public struct `Cli` used across Roster components.
pub(crate) struct Cli {
    #[arg(
        long = "airtable-token",
        env = "AIRTABLE_TOKEN",
        hide_env_values = true,
        help = "Airtable personal access token"
    )]
    pub(crate) airtable_token: String,

    #[arg(
        long = "airtable-base-id",
        env = "AIRTABLE_BASE_ID",
        help = "Airtable base holding the membership and link tables"
    )]
    pub(crate) airtable_base_id: String,

    #[arg(
        long = "airtable-members-table",
        env = "AIRTABLE_MEMBERS_TABLE",
        help = "Airtable table id (or name) of the membership roster"
    )]
    pub(crate) airtable_members_table: String,

    #[arg(
        long = "airtable-discord-table",
        env = "AIRTABLE_DISCORD_TABLE",
        help = "Airtable table id (or name) of the Discord link records"
    )]
    pub(crate) airtable_discord_table: String,

    #[arg(
        long = "airtable-api-base",
        env = "AIRTABLE_API_BASE",
        default_value = "https://api.airtable.com/v0",
        help = "Base URL for the Airtable REST API"
    )]
    pub(crate) airtable_api_base: String,

    #[arg(
        long = "airtable-request-timeout-ms",
        env = "AIRTABLE_REQUEST_TIMEOUT_MS",
        default_value_t = 10_000,
        value_parser = parse_positive_u64,
        help = "Per-request timeout for Airtable calls in milliseconds"
    )]
    pub(crate) airtable_request_timeout_ms: u64,

    #[arg(
        long = "discord-token",
        env = "DISCORD_TOKEN",
        hide_env_values = true,
        help = "Discord bot token"
    )]
    pub(crate) discord_token: String,

    #[arg(
        long = "discord-guild-id",
        env = "DISCORD_GUILD_ID",
        help = "Guild the bot serves; interactions from other guilds are ignored"
    )]
    pub(crate) discord_guild_id: GuildId,

    #[arg(
        long = "discord-channel-id",
        env = "DISCORD_CHANNEL_ID",
        help = "Verification channel that receives the welcome message"
    )]
    pub(crate) discord_channel_id: ChannelId,

    #[arg(
        long = "verified-role-id",
        env = "VERIFIED_ROLE_ID",
        help = "Role granted to every verified member"
    )]
    pub(crate) verified_role_id: RoleId,

    #[arg(
        long = "manager-role-id",
        env = "MANAGER_ROLE_ID",
        help = "Role granted to verified members who declare themselves managers"
    )]
    pub(crate) manager_role_id: RoleId,

    #[arg(
        long = "ic-role-id",
        env = "IC_ROLE_ID",
        help = "Role granted to verified individual contributors"
    )]
    pub(crate) ic_role_id: RoleId,

    #[arg(
        long = "admin-user-id",
        env = "ADMIN_USER_ID",
        help = "Account mentioned in verification failure replies"
    )]
    pub(crate) admin_user_id: AccountId,

    #[arg(
        long = "resend-intro",
        env = "RESEND_INTRO",
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
        help = "Clear the verification channel and post a fresh welcome message on connect"
    )]
    pub(crate) resend_intro: bool,
}
