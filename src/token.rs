use chrono::Utc;
use jsonwebtoken as jwt;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::TokenConfig;
use crate::error::{AuthError, ConfigError};
use crate::model::{ChatType, InitData};
use crate::{parser, validator};

/// Claims about the Mini App user and launch context, projected from validated [InitData].
///
/// Fields holding their default value are left out of issued tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Telegram user id, as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// User's first name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// User's last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// User's username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// User's IETF language tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    /// User's profile photo URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// See [crate::User::is_premium].
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_premium: bool,
    /// See [crate::User::is_bot].
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_bot: bool,
    /// See [crate::User::allows_write_to_pm].
    #[serde(default, skip_serializing_if = "is_false")]
    pub allows_write_to_pm: bool,
    /// See [crate::User::added_to_attachment_menu].
    #[serde(default, skip_serializing_if = "is_false")]
    pub added_to_attachment_menu: bool,
    /// Unix timestamp of the init data the claims came from.
    #[serde(default)]
    pub auth_date: i64,
    /// Launch session id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
    /// Start parameter the Mini App was opened with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_param: Option<String>,
    /// Global chat identifier for direct-link launches.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub chat_instance: i64,
    /// Chat type for direct-link launches.
    #[serde(default, skip_serializing_if = "is_unknown")]
    pub chat_type: ChatType,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

fn is_unknown(value: &ChatType) -> bool {
    *value == ChatType::Unknown
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

impl Identity {
    /// Projects init data onto claims, dropping empty strings.
    pub fn from_init_data(init_data: &InitData) -> Self {
        let mut identity = Identity {
            auth_date: init_data.auth_date,
            query_id: non_empty(&init_data.query_id),
            start_param: non_empty(&init_data.start_param),
            chat_instance: init_data.chat_instance,
            chat_type: init_data.chat_type,
            ..Default::default()
        };

        if let Some(user) = &init_data.user {
            identity.sub = Some(user.id.to_string());
            identity.first_name = Some(user.first_name.clone()).filter(|v| !v.is_empty());
            identity.last_name = non_empty(&user.last_name);
            identity.username = non_empty(&user.username);
            identity.language_code = non_empty(&user.language_code);
            identity.photo_url = non_empty(&user.photo_url);
            identity.is_premium = user.is_premium;
            identity.is_bot = user.is_bot;
            identity.allows_write_to_pm = user.allows_write_to_pm;
            identity.added_to_attachment_menu = user.added_to_attachment_menu;
        }

        identity
    }

    /// The Telegram user id, if the claims describe a user.
    pub fn user_id(&self) -> Option<i64> {
        self.sub.as_deref()?.parse().ok()
    }
}

/// Full claim set of an issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User and launch claims.
    #[serde(flatten)]
    pub identity: Identity,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Issued at, unix seconds.
    pub iat: i64,
    /// Not before, unix seconds.
    pub nbf: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// Issues and verifies HS256 JWTs for users whose init data has been validated.
///
/// ```rust
/// use std::time::Duration;
/// use tma_auth::{AuthError, TokenConfig, TokenIssuer};
///
/// let issuer = TokenIssuer::new(TokenConfig::new("bot-token", "jwt-secret", Duration::from_secs(3600)));
///
/// match issuer.issue("query_id=abc&auth_date=1662771648&hash=0000") {
///     Ok(token) => println!("token: {}", token),
///     Err(AuthError::Unauthorized) => println!("init data is not authentic"),
///     Err(err) => println!("issuer error: {:?}", err),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    config: TokenConfig,
}

impl TokenIssuer {
    /// Creates an issuer. The config is checked when a token is issued, not here.
    pub fn new(config: TokenConfig) -> Self {
        TokenIssuer { config }
    }

    /// The settings this issuer was created with.
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Validates raw `init_data` against the configured bot token and freshness window, then issues
    /// a token for it.
    pub fn issue(&self, init_data: &str) -> Result<String, AuthError> {
        if self.config.bot_token.expose_secret().is_empty() {
            return Err(misconfigured(ConfigError::MissingBotToken));
        }
        self.check_signing_config()?;

        let bot_token = self.config.bot_token.expose_secret();
        if !validator::validate(init_data, bot_token, self.config.init_data_max_age) {
            return Err(AuthError::Unauthorized);
        }

        let parsed = parser::parse(init_data)?;
        self.issue_for(&parsed)
    }

    /// Issues a token for init data the caller has already validated.
    pub fn issue_for(&self, init_data: &InitData) -> Result<String, AuthError> {
        self.check_signing_config()?;

        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.config.token_ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = TokenClaims {
            identity: Identity::from_init_data(init_data),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now,
            nbf: now,
            exp: now.saturating_add(ttl),
        };

        let key = jwt::EncodingKey::from_secret(self.config.secret_key.expose_secret().as_bytes());
        let token = jwt::encode(&jwt::Header::new(jwt::Algorithm::HS256), &claims, &key)
            .map_err(AuthError::TokenEncoding)?;

        debug!(sub = ?claims.identity.sub, exp = claims.exp, "issued token");
        Ok(token)
    }

    /// Verifies a token issued by this issuer: HS256 signature, issuer, audience, `nbf` and `exp`
    /// with no leeway.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        if self.config.secret_key.expose_secret().is_empty() {
            return Err(misconfigured(ConfigError::MissingSecretKey));
        }

        let mut validation = jwt::Validation::new(jwt::Algorithm::HS256);
        validation
            .required_spec_claims
            .extend(["exp", "iss", "aud", "nbf"].into_iter().map(String::from));
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        let key = jwt::DecodingKey::from_secret(self.config.secret_key.expose_secret().as_bytes());
        let token = jwt::decode::<TokenClaims>(token, &key, &validation).map_err(|err| {
            debug!(error = %err, "token rejected");
            AuthError::TokenDecoding(err)
        })?;

        Ok(token.claims)
    }

    fn check_signing_config(&self) -> Result<(), AuthError> {
        if self.config.secret_key.expose_secret().is_empty() {
            return Err(misconfigured(ConfigError::MissingSecretKey));
        }
        if self.config.token_ttl.is_zero() {
            return Err(misconfigured(ConfigError::NonPositiveTtl));
        }
        Ok(())
    }
}

pub(crate) fn misconfigured(err: ConfigError) -> AuthError {
    warn!(error = %err, "token issuer is misconfigured");
    AuthError::Configuration(err)
}
