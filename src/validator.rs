use std::borrow::Cow;
use std::time::Duration;

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::parser;
use crate::query::{self, AuthDateSource};
use crate::signer;

/// Checks that `init_data` was signed with `bot_token` and, unless `max_age` is zero, that it is no
/// older than `max_age`.
///
/// Every failure, from unparsable input to a signature mismatch, yields `false`. The reason is only
/// reported through `tracing` at debug level.
///
/// ```rust
/// use std::time::Duration;
///
/// let init_data = "query_id=AAHdF6IQAAAAAN0XohDhrOrc&auth_date=1662771648&hash=0000";
/// assert!(!tma_auth::validate(init_data, "bot-token", Duration::ZERO));
/// ```
pub fn validate(init_data: &str, bot_token: &str, max_age: Duration) -> bool {
    validate_at(init_data, bot_token, max_age, Utc::now())
}

/// [validate] against an explicit current time.
///
/// Init data is still fresh when `auth_date + max_age` equals `now`.
pub fn validate_at(init_data: &str, bot_token: &str, max_age: Duration, now: DateTime<Utc>) -> bool {
    let parsed = match parser::parse(init_data) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(error = %err, "init data rejected: unparsable");
            return false;
        }
    };

    if parsed.hash.is_empty() {
        debug!("init data rejected: signature is missing");
        return false;
    }

    if !max_age.is_zero() && !is_fresh(parsed.auth_date, max_age, now) {
        debug!(auth_date = parsed.auth_date, "init data rejected: expired or invalid auth date");
        return false;
    }

    // Keyless or empty segments would be dropped from the data-check string, leaving them
    // outside the signature.
    if !query::has_only_pairs(init_data) {
        debug!("init data rejected: segment without key/value pair");
        return false;
    }

    // Re-decode the raw string so the signature binds to the values as presented, not as
    // reinterpreted by the parser.
    let pairs = match query::decode_pairs(init_data) {
        Ok(pairs) => pairs,
        Err(err) => {
            debug!(error = %err, "init data rejected: undecodable");
            return false;
        }
    };
    let payload = query::data_check_string(
        pairs.iter().map(|(k, v)| (k.as_str(), Cow::Borrowed(v.as_str()))),
        AuthDateSource::Payload,
    );
    let expected = signer::sign_payload(&payload, bot_token);

    if !bool::from(expected.as_bytes().ct_eq(parsed.hash.as_bytes())) {
        debug!("init data rejected: signature mismatch");
        return false;
    }

    true
}

fn is_fresh(auth_date: i64, max_age: Duration, now: DateTime<Utc>) -> bool {
    let Some(signed_at) = DateTime::from_timestamp(auth_date, 0) else {
        return false;
    };
    let Ok(max_age) = chrono::Duration::from_std(max_age) else {
        return false;
    };

    match signed_at.checked_add_signed(max_age) {
        Some(expires_at) => expires_at >= now,
        None => false,
    }
}
