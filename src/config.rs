use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Default issuer of tokens produced by [crate::TokenIssuer].
pub const DEFAULT_ISSUER: &str = "TmaAuthentication";

/// Default audience of tokens produced by [crate::TokenIssuer].
pub const DEFAULT_AUDIENCE: &str = "TmaClient";

/// Default maximum age of init data: one day.
pub const DEFAULT_INIT_DATA_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Settings for validating init data and issuing tokens from it.
///
/// Durations are expressed in whole seconds when (de)serialized. Fields left out of a config file
/// take the [Default] values; `token_ttl` defaults to zero and must be set before issuing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Bot token the init data is signed with.
    #[serde(serialize_with = "serialize_secret", deserialize_with = "deserialize_secret")]
    pub bot_token: SecretString,

    /// Maximum age of init data. Zero disables the check.
    #[serde(with = "duration_secs")]
    pub init_data_max_age: Duration,

    /// Symmetric key issued tokens are signed with. Must differ from the bot token.
    #[serde(serialize_with = "serialize_secret", deserialize_with = "deserialize_secret")]
    pub secret_key: SecretString,

    /// Lifetime of issued tokens.
    #[serde(with = "duration_secs")]
    pub token_ttl: Duration,

    /// `iss` claim of issued tokens, checked on verification.
    pub issuer: String,

    /// `aud` claim of issued tokens, checked on verification.
    pub audience: String,
}

impl TokenConfig {
    /// Creates a config with the default freshness window, issuer and audience.
    pub fn new(bot_token: impl Into<String>, secret_key: impl Into<String>, token_ttl: Duration) -> Self {
        TokenConfig {
            bot_token: SecretString::new(bot_token.into()),
            secret_key: SecretString::new(secret_key.into()),
            token_ttl,
            ..Default::default()
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        TokenConfig {
            bot_token: SecretString::new(String::new()),
            init_data_max_age: DEFAULT_INIT_DATA_MAX_AGE,
            secret_key: SecretString::new(String::new()),
            token_ttl: Duration::ZERO,
            issuer: DEFAULT_ISSUER.to_owned(),
            audience: DEFAULT_AUDIENCE.to_owned(),
        }
    }
}

fn serialize_secret<S>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(secret.expose_secret())
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(SecretString::new(s))
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
