//!
//! This crate validates [Telegram Mini App](https://core.telegram.org/bots/webapps) init data: the signed,
//! URL-encoded launch string the Telegram client hands to a Mini App. It can also sign init data (useful
//! for tests and tooling) and exchange validated init data for a short-lived HS256 JWT.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! tma-auth = "0.1"
//! ```
//!
//! ```rust
//! use std::time::Duration;
//!
//! // Your bot token from @BotFather
//! let bot_token = "5768337691:AAH5YkoiEuPk8-FZa32hStHTqXiLPtAEhx8";
//!
//! // Raw init data, as sent by the Mini App from `window.Telegram.WebApp.initData`
//! let init_data = "query_id=AAHdF6IQAAAAAN0XohDhrOrc&user=%7B%22id%22%3A279058397%2C%22first_name%22%3A%22Vladislav%22%2C%22last_name%22%3A%22Kibenko%22%2C%22username%22%3A%22vdkfrost%22%2C%22language_code%22%3A%22ru%22%2C%22is_premium%22%3Atrue%7D&auth_date=1662771648&hash=c501b71e775f74ce10e377dea85a7ea24ecd640b223ea86dfe453e0eaed2e2b2";
//!
//! // A zero max age skips the freshness check
//! if tma_auth::validate(init_data, bot_token, Duration::ZERO) {
//!     let parsed = tma_auth::parse(init_data)?;
//!     println!("Init data is valid. user_id=<{}>", parsed.user.map_or(0, |u| u.id));
//! }
//! # Ok::<(), tma_auth::AuthError>(())
//! ```
//!
#![warn(missing_docs)]

mod authorization;
mod config;
mod error;
mod model;
mod parser;
mod query;
mod signer;
mod token;
mod validator;

pub use authorization::{Authenticator, Credentials, BEARER_SCHEME, INIT_DATA_SCHEME};
pub use config::{TokenConfig, DEFAULT_AUDIENCE, DEFAULT_INIT_DATA_MAX_AGE, DEFAULT_ISSUER};
pub use error::{AuthError, ConfigError, FormatError, QueryError};
pub use model::{Chat, ChatType, InitData, User};
pub use parser::parse;
pub use signer::{sign, sign_payload, sign_query_string};
pub use token::{Identity, TokenClaims, TokenIssuer};
pub use validator::{validate, validate_at};
