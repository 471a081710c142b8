//! Init data signing.
//!
//! The signature is `HMAC_SHA256(key = HMAC_SHA256(key = "WebAppData", data = bot_token), data = data_check_string)`,
//! rendered as lowercase hex. See [Validating data received via the Mini App](https://core.telegram.org/bots/webapps#validating-data-received-via-the-mini-app).

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::AuthError;
use crate::query::{self, AuthDateSource};

type HmacSha256 = Hmac<Sha256>;

/// Domain-separation constant the bot token is hashed under.
const WEB_APP_DATA: &[u8] = b"WebAppData";

/// Prefix of a value that still holds a percent-encoded JSON object.
const ENCODED_OBJECT_PREFIX: &str = "%7B";

fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    // HMAC pads or hashes the key to the block size, so `new_from_slice` cannot fail.
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);

    let mut digest = [0u8; 32];
    digest.copy_from_slice(&mac.finalize().into_bytes());
    digest
}

/// Signs an already assembled data-check string with `bot_token`.
///
/// ```rust
/// let hash = tma_auth::sign_payload("auth_date=1662771648\nquery_id=AAHdF6IQAAAAAN0XohDhrOrc", "bot-token");
/// assert_eq!(hash.len(), 64);
/// ```
pub fn sign_payload(payload: &str, bot_token: &str) -> String {
    let secret_key = hmac_sha256(WEB_APP_DATA, bot_token.as_bytes());
    hex::encode(hmac_sha256(&secret_key, payload.as_bytes()))
}

/// Signs key/value pairs as if Telegram had issued them at `auth_date`.
///
/// Any `hash` or `auth_date` among `fields` is ignored; `auth_date` is regenerated from the
/// argument. Values that are still percent-encoded JSON objects (starting with exactly `%7B`) are
/// decoded first.
pub fn sign<I, K, V>(fields: I, bot_token: &str, auth_date: DateTime<Utc>) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let fields: Vec<(K, V)> = fields.into_iter().collect();
    let pairs = fields.iter().map(|(key, value)| {
        let value = value.as_ref();
        let value = if value.starts_with(ENCODED_OBJECT_PREFIX) {
            query::decode_component(value).map_or(Cow::Borrowed(value), Cow::Owned)
        } else {
            Cow::Borrowed(value)
        };
        (key.as_ref(), value)
    });

    let payload = query::data_check_string(pairs, AuthDateSource::Override(auth_date.timestamp()));
    sign_payload(&payload, bot_token)
}

/// Decodes `query_string` into key/value pairs and signs them like [sign].
pub fn sign_query_string(
    query_string: &str,
    bot_token: &str,
    auth_date: DateTime<Utc>,
) -> Result<String, AuthError> {
    let pairs = query::decode_pairs(query_string)?;
    Ok(sign(pairs, bot_token, auth_date))
}
