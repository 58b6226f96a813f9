use roster_airtable::AirtableConfig;
use roster_core::RoleId;
use roster_discord_runtime::DiscordBridgeConfig;
use roster_verify::{VerificationRoles, VerificationSettings};
use thiserror::Error;

use crate::cli_args::Cli;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Enumerates semantic configuration failures clap cannot catch.
pub(crate) enum ConfigError {
    #[error("{name} cannot be empty")]
    Blank { name: &'static str },
    #[error("{first} and {second} must be different roles (both are {role})")]
    DuplicateRole {
        first: &'static str,
        second: &'static str,
        role: RoleId,
    },
    #[error("invalid airtable api base '{value}': expected an http:// or https:// URL")]
    InvalidApiBase { value: String },
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration assembled once at startup.
pub(crate) struct RosterConfig {
    pub(crate) airtable: AirtableConfig,
    pub(crate) discord: DiscordBridgeConfig,
    pub(crate) verification: VerificationSettings,
}

impl RosterConfig {
    pub(crate) fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let airtable_token = required_text("AIRTABLE_TOKEN", &cli.airtable_token)?;
        let base_id = required_text("AIRTABLE_BASE_ID", &cli.airtable_base_id)?;
        let members_table = required_text("AIRTABLE_MEMBERS_TABLE", &cli.airtable_members_table)?;
        let links_table = required_text("AIRTABLE_DISCORD_TABLE", &cli.airtable_discord_table)?;
        let discord_token = required_text("DISCORD_TOKEN", &cli.discord_token)?;
        let api_base = validate_api_base(&cli.airtable_api_base)?;

        let roles = VerificationRoles {
            verified: cli.verified_role_id,
            manager: cli.manager_role_id,
            individual_contributor: cli.ic_role_id,
        };
        ensure_distinct_roles(&roles)?;

        let mut airtable = AirtableConfig::new(airtable_token, base_id, members_table, links_table);
        airtable.api_base = api_base;
        airtable.request_timeout_ms = cli.airtable_request_timeout_ms;

        Ok(Self {
            airtable,
            discord: DiscordBridgeConfig {
                token: discord_token,
                guild_id: cli.discord_guild_id,
                channel_id: cli.discord_channel_id,
                resend_intro: cli.resend_intro,
            },
            verification: VerificationSettings {
                roles,
                admin_account: cli.admin_user_id,
            },
        })
    }
}

fn required_text(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Blank { name });
    }
    Ok(trimmed.to_string())
}

fn validate_api_base(value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"));
    match host {
        Some(rest) if !rest.is_empty() => Ok(trimmed.to_string()),
        _ => Err(ConfigError::InvalidApiBase {
            value: value.to_string(),
        }),
    }
}

fn ensure_distinct_roles(roles: &VerificationRoles) -> Result<(), ConfigError> {
    let named = [
        ("VERIFIED_ROLE_ID", roles.verified),
        ("MANAGER_ROLE_ID", roles.manager),
        ("IC_ROLE_ID", roles.individual_contributor),
    ];
    for (index, &(first, role)) in named.iter().enumerate() {
        if let Some(&(second, _)) = named[index + 1..]
            .iter()
            .find(|(_, other)| *other == role)
        {
            return Err(ConfigError::DuplicateRole {
                first,
                second,
                role,
            });
        }
    }
    Ok(())
}
