//! Snowflake identifier newtypes for chat-platform entities.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Enumerates failures when parsing a snowflake identifier.
pub enum IdParseError {
    #[error("{kind} cannot be empty")]
    Empty { kind: &'static str },
    #[error("invalid {kind} '{value}': expected a positive integer")]
    NotNumeric { kind: &'static str, value: String },
    #[error("{kind} must be greater than 0")]
    Zero { kind: &'static str },
}

fn parse_snowflake(kind: &'static str, value: &str) -> Result<u64, IdParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IdParseError::Empty { kind });
    }
    let parsed = trimmed
        .parse::<u64>()
        .map_err(|_| IdParseError::NotNumeric {
            kind,
            value: trimmed.to_string(),
        })?;
    if parsed == 0 {
        return Err(IdParseError::Zero { kind });
    }
    Ok(parsed)
}

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                parse_snowflake($kind, value).map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

snowflake_id!(
    /// Stable platform-assigned account identifier.
    AccountId,
    "account id"
);
snowflake_id!(
    /// Guild (server) identifier.
    GuildId,
    "guild id"
);
snowflake_id!(
    /// Text channel identifier.
    ChannelId,
    "channel id"
);
snowflake_id!(
    /// Guild role identifier.
    RoleId,
    "role id"
);
snowflake_id!(
    /// Channel message identifier.
    MessageId,
    "message id"
);
