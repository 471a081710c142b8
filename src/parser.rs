use serde_json::{Map, Value};

use crate::error::{AuthError, FormatError};
use crate::model::{FieldKind, InitData};
use crate::query;

/// Parses raw init data, exactly as found in `window.Telegram.WebApp.initData`, into [InitData].
///
/// Fields missing from the input keep their defaults. Only structural problems are errors: an
/// empty string, a `;` anywhere, undecodable or absent key/value pairs, or `user`/`receiver`/`chat`
/// values that are not JSON.
///
/// ```rust
/// let init_data = tma_auth::parse("query_id=AAHdF6IQAAAAAN0XohDhrOrc&auth_date=1662771648&hash=abc")?;
/// assert_eq!(init_data.auth_date, 1662771648);
/// assert_eq!(init_data.query_id.as_deref(), Some("AAHdF6IQAAAAAN0XohDhrOrc"));
/// # Ok::<(), tma_auth::AuthError>(())
/// ```
pub fn parse(raw: &str) -> Result<InitData, AuthError> {
    parse_record(raw).map_err(AuthError::MalformedPayload)
}

fn parse_record(raw: &str) -> Result<InitData, FormatError> {
    if raw.is_empty() {
        return Err(FormatError::Empty);
    }
    if raw.contains(';') {
        return Err(FormatError::UnexpectedCharacter(';'));
    }

    let pairs = query::decode_pairs(raw)?;
    if pairs.is_empty() {
        return Err(FormatError::NoPairs);
    }

    let mut record = Map::with_capacity(pairs.len());
    for (key, value) in pairs {
        let embedded = match FieldKind::of(&key) {
            FieldKind::Text => Value::String(value),
            FieldKind::Object => match serde_json::from_str(&value) {
                Ok(json) => json,
                Err(source) => return Err(FormatError::Field { field: key, source }),
            },
            FieldKind::Scalar => serde_json::from_str(&value).unwrap_or(Value::String(value)),
        };
        record.insert(key, embedded);
    }

    serde_json::from_value(Value::Object(record)).map_err(FormatError::Record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChatType;

    const INIT_DATA: &str = "query_id=AAHdF6IQAAAAAN0XohDhrOrc&user=%7B%22id%22%3A279058397%2C%22first_name%22%3A%22Vladislav%22%2C%22last_name%22%3A%22Kibenko%22%2C%22username%22%3A%22vdkfrost%22%2C%22language_code%22%3A%22ru%22%2C%22is_premium%22%3Atrue%7D&auth_date=1662771648&hash=c501b71e775f74ce10e377dea85a7ea24ecd640b223ea86dfe453e0eaed2e2b2";

    fn assert_malformed(res: Result<InitData, AuthError>) -> FormatError {
        match res {
            Err(AuthError::MalformedPayload(err)) => err,
            _ => panic!("malformed init data was not properly rejected: {:?}", res),
        }
    }

    #[test]
    fn parse_valid_init_data() {
        let data = parse(INIT_DATA).unwrap();

        assert_eq!(data.auth_date, 1662771648);
        assert_eq!(
            data.hash,
            "c501b71e775f74ce10e377dea85a7ea24ecd640b223ea86dfe453e0eaed2e2b2"
        );
        assert_eq!(data.query_id.as_deref(), Some("AAHdF6IQAAAAAN0XohDhrOrc"));

        let user = data.user.unwrap();
        assert_eq!(user.id, 279058397);
        assert_eq!(user.first_name, "Vladislav");
        assert_eq!(user.last_name.as_deref(), Some("Kibenko"));
        assert_eq!(user.username.as_deref(), Some("vdkfrost"));
        assert_eq!(user.language_code.as_deref(), Some("ru"));
        assert!(user.is_premium);
        assert!(!user.is_bot);
    }

    #[test]
    fn reject_semicolon() {
        let err = assert_malformed(parse("something wrong;"));
        assert!(matches!(err, FormatError::UnexpectedCharacter(';')));
    }

    #[test]
    fn reject_empty() {
        let err = assert_malformed(parse(""));
        assert!(matches!(err, FormatError::Empty));
    }

    #[test]
    fn reject_no_pairs() {
        let err = assert_malformed(parse("notaquery"));
        assert!(matches!(err, FormatError::NoPairs));
    }

    #[test]
    fn reject_invalid_utf8() {
        let err = assert_malformed(parse("auth_date=1&user=%C3%28"));
        assert!(matches!(err, FormatError::Query(_)));
    }

    #[test]
    fn reject_user_that_is_not_json() {
        let err = assert_malformed(parse("auth_date=1&user=%7Bnope"));
        match err {
            FormatError::Field { field, .. } => assert_eq!(field, "user"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn reject_non_integer_auth_date() {
        let err = assert_malformed(parse("hash=abc&auth_date=test"));
        assert!(matches!(err, FormatError::Record(_)));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let data = parse("hash=abc").unwrap();
        assert_eq!(data.auth_date, 0);
        assert_eq!(data.hash, "abc");
        assert_eq!(data.user, None);
        assert_eq!(data.chat_type, ChatType::Unknown);
    }

    #[test]
    fn start_param_stays_a_string() {
        let data = parse("start_param=12345&auth_date=1662771648").unwrap();
        assert_eq!(data.start_param.as_deref(), Some("12345"));

        let data = parse("start_param=%7B%22a%22%3A1%7D&auth_date=1662771648").unwrap();
        assert_eq!(data.start_param.as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn numeric_looking_hash_stays_a_string() {
        let data = parse("hash=1234&auth_date=1").unwrap();
        assert_eq!(data.hash, "1234");
    }

    #[test]
    fn unescaped_json_user() {
        let raw = r#"user={"id":123456789,"first_name":"John","last_name":"Doe","username":"johndoe","language_code":"en","is_premium":true}&auth_date=1662771648"#;
        let user = parse(raw).unwrap().user.unwrap();

        assert_eq!(user.id, 123456789);
        assert_eq!(user.first_name, "John");
        assert_eq!(user.last_name.as_deref(), Some("Doe"));
        assert_eq!(user.username.as_deref(), Some("johndoe"));
        assert_eq!(user.language_code.as_deref(), Some("en"));
        assert!(user.is_premium);
    }

    #[test]
    fn chat_and_direct_link_fields() {
        let raw = "auth_date=1662771648&chat_instance=-8717367447196386656&chat_type=Supergroup&can_send_after=30&chat=%7B%22id%22%3A-1001%2C%22type%22%3A%22channel%22%2C%22title%22%3A%22News%22%7D";
        let data = parse(raw).unwrap();

        assert_eq!(data.chat_instance, -8717367447196386656);
        assert_eq!(data.chat_type, ChatType::Supergroup);
        assert_eq!(data.can_send_after, 30);

        let chat = data.chat.unwrap();
        assert_eq!(chat.id, -1001);
        assert_eq!(chat.kind, ChatType::Channel);
        assert_eq!(chat.title, "News");
    }

    #[test]
    fn duplicate_keys_last_wins() {
        let data = parse("auth_date=1&auth_date=2&hash=x").unwrap();
        assert_eq!(data.auth_date, 2);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let data = parse("auth_date=1&hash=x&signature=abc&extra=%5B1%2C2%5D").unwrap();
        assert_eq!(data.auth_date, 1);
    }
}
