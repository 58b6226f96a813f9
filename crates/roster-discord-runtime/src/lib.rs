//! Discord gateway runtime for the roster verification bot.
//!
//! Connects to the Discord gateway through serenity, primes the verification
//! channel on `ready`, and feeds button and modal interactions into the
//! `roster_verify` dispatch table.

mod discord_bridge;
mod serenity_gateway;
mod serenity_interactions;

pub use discord_bridge::{run_discord_bridge, DiscordBridgeConfig};
pub use serenity_gateway::SerenityGuildGateway;
