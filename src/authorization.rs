//! `Authorization` header handling, independent of any web framework.
//!
//! Two schemes are understood: `TAuth <init data>` carries raw Mini App init data, and
//! `Bearer <token>` carries a token previously issued by [TokenIssuer].

use secrecy::ExposeSecret;
use tracing::debug;

use crate::config::TokenConfig;
use crate::error::{AuthError, ConfigError};
use crate::token::{misconfigured, Identity, TokenIssuer};
use crate::{parser, validator};

/// Scheme name for raw init data.
pub const INIT_DATA_SCHEME: &str = "TAuth";

/// Scheme name for issued tokens.
pub const BEARER_SCHEME: &str = "Bearer";

/// Credentials extracted from an `Authorization` header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credentials<'a> {
    /// Raw init data from a `TAuth` header.
    InitData(&'a str),
    /// A token from a `Bearer` header.
    Bearer(&'a str),
}

impl<'a> Credentials<'a> {
    /// Splits a header value into scheme and credential. Scheme names are case-insensitive.
    ///
    /// Returns `Ok(None)` for other schemes, so another authenticator can handle them, and
    /// [AuthError::MalformedHeader] when a known scheme carries nothing.
    pub fn from_header(value: &'a str) -> Result<Option<Self>, AuthError> {
        let Some((scheme, credential)) = value.split_once(' ') else {
            return Ok(None);
        };

        let build = if scheme.eq_ignore_ascii_case(INIT_DATA_SCHEME) {
            Credentials::InitData
        } else if scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
            Credentials::Bearer
        } else {
            return Ok(None);
        };

        let credential = credential.trim();
        if credential.is_empty() {
            return Err(AuthError::MalformedHeader);
        }
        Ok(Some(build(credential)))
    }
}

/// Resolves `Authorization` headers to an [Identity].
#[derive(Debug, Clone)]
pub struct Authenticator {
    issuer: TokenIssuer,
}

impl Authenticator {
    /// Creates an authenticator that validates init data and tokens with `config`.
    pub fn new(config: TokenConfig) -> Self {
        Authenticator {
            issuer: TokenIssuer::new(config),
        }
    }

    /// The issuer used for verifying bearer tokens, also usable to issue them.
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Authenticates a header value. `Ok(None)` means the header uses a scheme this crate does
    /// not handle.
    pub fn authenticate(&self, header: &str) -> Result<Option<Identity>, AuthError> {
        match Credentials::from_header(header)? {
            None => Ok(None),
            Some(Credentials::InitData(init_data)) => self.authenticate_init_data(init_data).map(Some),
            Some(Credentials::Bearer(token)) => {
                self.issuer.verify(token).map(|claims| Some(claims.identity))
            }
        }
    }

    fn authenticate_init_data(&self, init_data: &str) -> Result<Identity, AuthError> {
        let config = self.issuer.config();
        let bot_token = config.bot_token.expose_secret();
        if bot_token.is_empty() {
            return Err(misconfigured(ConfigError::MissingBotToken));
        }

        if !validator::validate(init_data, bot_token, config.init_data_max_age) {
            debug!("init data authentication failed");
            return Err(AuthError::Unauthorized);
        }

        let parsed = parser::parse(init_data)?;
        Ok(Identity::from_init_data(&parsed))
    }
}
