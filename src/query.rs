//! Query-string decoding and the canonical data-check string shared by signing and validation.

use std::borrow::Cow;

use crate::error::QueryError;

/// Key holding the signature of the init data.
pub(crate) const HASH_KEY: &str = "hash";

/// Key holding the unix timestamp the init data was signed at.
pub(crate) const AUTH_DATE_KEY: &str = "auth_date";

/// Decodes `raw` into ordered key/value pairs.
///
/// Segments without `=` carry no key and are skipped. When a key repeats, the last value wins and
/// keeps the position of the first occurrence.
pub(crate) fn decode_pairs(raw: &str) -> Result<Vec<(String, String)>, QueryError> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    for segment in raw.split('&') {
        let Some((key, value)) = segment.split_once('=') else {
            continue;
        };

        let decoded_key = decode_component(key).ok_or_else(|| QueryError { key: key.to_owned() })?;
        let decoded_value = decode_component(value).ok_or_else(|| QueryError {
            key: decoded_key.clone(),
        })?;

        match pairs.iter_mut().find(|(k, _)| *k == decoded_key) {
            Some(existing) => existing.1 = decoded_value,
            None => pairs.push((decoded_key, decoded_value)),
        }
    }

    Ok(pairs)
}

/// True when every `&`-separated segment of `raw` is a `key=value` pair. Empty segments and
/// segments without `=` fail.
pub(crate) fn has_only_pairs(raw: &str) -> bool {
    raw.split('&').all(|segment| segment.contains('='))
}

/// Form-decodes one component. `+` is a space; malformed escapes are kept as-is.
pub(crate) fn decode_component(component: &str) -> Option<String> {
    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(Cow::into_owned)
}

/// Where the `auth_date` pair of the data-check string comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthDateSource {
    /// Use the `auth_date` present among the pairs, verbatim.
    Payload,
    /// Drop any `auth_date` among the pairs and use this unix timestamp instead.
    Override(i64),
}

/// Builds the newline-joined, sorted `key=value` list that gets signed. The `hash` pair never
/// participates.
pub(crate) fn data_check_string<'a, I>(pairs: I, auth_date: AuthDateSource) -> String
where
    I: IntoIterator<Item = (&'a str, Cow<'a, str>)>,
{
    let mut lines: Vec<String> = pairs
        .into_iter()
        .filter(|(key, _)| match auth_date {
            AuthDateSource::Payload => *key != HASH_KEY,
            AuthDateSource::Override(_) => *key != HASH_KEY && *key != AUTH_DATE_KEY,
        })
        .map(|(key, value)| format!("{key}={value}"))
        .collect();

    if let AuthDateSource::Override(timestamp) = auth_date {
        lines.push(format!("{AUTH_DATE_KEY}={timestamp}"));
    }

    // Ordinal order of the whole line, not just the key.
    lines.sort_unstable();
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn borrowed(pairs: &[(String, String)]) -> impl Iterator<Item = (&str, Cow<'_, str>)> {
        pairs.iter().map(|(k, v)| (k.as_str(), Cow::Borrowed(v.as_str())))
    }

    #[test]
    fn decodes_percent_and_plus() {
        let pairs = decode_pairs("a=1&name=John+Doe&b=%7B%22x%22%3A1%7D&plus=%2B").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("a".to_owned(), "1".to_owned()),
                ("name".to_owned(), "John Doe".to_owned()),
                ("b".to_owned(), r#"{"x":1}"#.to_owned()),
                ("plus".to_owned(), "+".to_owned()),
            ]
        );
    }

    #[test]
    fn last_duplicate_wins_in_first_position() {
        let pairs = decode_pairs("a=1&b=2&a=3").unwrap();
        assert_eq!(
            pairs,
            vec![("a".to_owned(), "3".to_owned()), ("b".to_owned(), "2".to_owned())]
        );
    }

    #[test]
    fn skips_keyless_and_empty_segments() {
        let pairs = decode_pairs("notaquery&&k=").unwrap();
        assert_eq!(pairs, vec![("k".to_owned(), String::new())]);
        assert!(decode_pairs("notaquery").unwrap().is_empty());
    }

    #[test]
    fn detects_segments_without_pairs() {
        assert!(has_only_pairs("a=1&b=&=c"));
        assert!(!has_only_pairs("a=1&"));
        assert!(!has_only_pairs("a=1&&b=2"));
        assert!(!has_only_pairs("a=1&x"));
        assert!(!has_only_pairs(""));
    }

    #[test]
    fn keeps_malformed_escapes_literally() {
        let pairs = decode_pairs("k=100%zz").unwrap();
        assert_eq!(pairs[0].1, "100%zz");
    }

    #[test]
    fn rejects_invalid_utf8() {
        let err = decode_pairs("ok=1&bad=%FF%FE").unwrap_err();
        assert_eq!(err.key, "bad");
    }

    #[test]
    fn payload_source_keeps_auth_date_and_drops_hash() {
        let pairs = decode_pairs("user=u&hash=h&auth_date=5&a=b").unwrap();
        assert_eq!(
            data_check_string(borrowed(&pairs), AuthDateSource::Payload),
            "a=b\nauth_date=5\nuser=u"
        );
    }

    #[test]
    fn override_source_replaces_auth_date() {
        let pairs = decode_pairs("user=u&hash=h&auth_date=5").unwrap();
        assert_eq!(
            data_check_string(borrowed(&pairs), AuthDateSource::Override(42)),
            "auth_date=42\nuser=u"
        );
    }

    #[test]
    fn sorts_by_whole_line() {
        let pairs = vec![
            ("ab".to_owned(), "1".to_owned()),
            ("a".to_owned(), "z".to_owned()),
        ];
        // "a=z" < "ab=1" because '=' sorts before 'b'.
        assert_eq!(
            data_check_string(borrowed(&pairs), AuthDateSource::Payload),
            "a=z\nab=1"
        );
    }
}
