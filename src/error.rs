use jsonwebtoken as jwt;
use thiserror::Error;

/// The error type for every fallible operation in this crate.
///
/// Validation itself never produces one of these: [crate::validate] collapses all failures to `false`.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The init data could not be turned into an [crate::InitData].
    #[error("init data has unexpected format: {0}")]
    MalformedPayload(#[from] FormatError),

    /// A query string could not be decoded into key/value pairs.
    #[error("failed to parse query string: {0}")]
    InvalidQueryString(#[from] QueryError),

    /// The token issuer is missing a setting it needs.
    #[error("token issuer is misconfigured: {0}")]
    Configuration(#[from] ConfigError),

    /// The init data did not pass validation.
    #[error("invalid init data")]
    Unauthorized,

    /// An `Authorization` header used a known scheme but carried no credential.
    #[error("authorization header has no credential")]
    MalformedHeader,

    /// Failed to sign the issued token.
    #[error("failed to encode token: {0}")]
    TokenEncoding(#[source] jwt::errors::Error),

    /// Failed to decode or verify an issued token. See associated `jwt::errors::Error` for details.
    #[error("failed to decode token: {0}")]
    TokenDecoding(#[source] jwt::errors::Error),
}

/// Structural problems found while parsing init data.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The input was empty or whitespace.
    #[error("init data is empty")]
    Empty,

    /// A character that never appears in init data, such as `;`.
    #[error("unexpected character {0:?}")]
    UnexpectedCharacter(char),

    /// A value did not percent-decode.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Not a single `key=value` segment.
    #[error("no key/value pairs found")]
    NoPairs,

    /// A field that must hold a JSON object did not decode as one.
    #[error("field `{field}` is not valid JSON: {source}")]
    Field {
        /// Name of the offending field.
        field: String,
        /// Why the value is not JSON.
        #[source]
        source: serde_json::Error,
    },

    /// The assembled record did not match the init data shape, e.g. a non-integer `auth_date`.
    #[error("init data does not match the expected shape: {0}")]
    Record(#[source] serde_json::Error),
}

/// Percent-decoding failure in a query string.
#[derive(Debug, Error)]
#[error("value of `{key}` is not valid UTF-8 after percent-decoding")]
pub struct QueryError {
    pub(crate) key: String,
}

/// Missing or invalid [crate::TokenConfig] settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `bot_token` is empty.
    #[error("bot token is not configured")]
    MissingBotToken,

    /// `secret_key` is empty.
    #[error("JWT secret key is not configured")]
    MissingSecretKey,

    /// `token_ttl` is zero.
    #[error("JWT token expiration must be configured and greater than zero")]
    NonPositiveTtl,
}
