//! Typed projection of Mini App init data.
//!
//! Field names follow the [init data parameter list](https://docs.telegram-mini-apps.com/launch-parameters/init-data#parameters-list).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Parsed init data. Build one with [crate::parse].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InitData {
    /// Unix timestamp the init data was created at.
    pub auth_date: i64,

    /// Seconds after `auth_date` from which `answerWebAppQuery` may be called.
    pub can_send_after: i64,

    /// Chat the Mini App was launched from. Only for launches through the attachment menu.
    pub chat: Option<Chat>,

    /// Type of the chat the Mini App was opened from. Only for direct-link launches.
    pub chat_type: ChatType,

    /// Global identifier of the chat the Mini App was opened from. Only for direct-link launches.
    pub chat_instance: i64,

    /// Init data signature.
    pub hash: String,

    /// Unique session id, used with `answerWebAppQuery`.
    pub query_id: Option<String>,

    /// Chat partner of the current user in a private chat opened via the attachment menu.
    pub receiver: Option<User>,

    /// Value of the `startattach`/`startapp` link parameter.
    pub start_param: Option<String>,

    /// The current user.
    pub user: Option<User>,
}

impl InitData {
    /// `auth_date` as a point in time, or `None` if it is out of range.
    pub fn auth_date_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.auth_date, 0)
    }

    /// The moment `answerWebAppQuery` becomes available.
    pub fn can_send_after_time(&self) -> Option<DateTime<Utc>> {
        self.auth_date_time()?
            .checked_add_signed(Duration::try_seconds(self.can_send_after)?)
    }
}

/// A Telegram user or bot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct User {
    /// Telegram user id.
    pub id: i64,
    /// First name, or the bot's name.
    pub first_name: String,
    /// Last name.
    pub last_name: Option<String>,
    /// Username without the leading `@`.
    pub username: Option<String>,
    /// IETF language tag. Only present in the `user` field.
    pub language_code: Option<String>,
    /// URL of the profile photo, `.jpeg` or `.svg`.
    pub photo_url: Option<String>,
    /// Only present in the `receiver` field.
    pub is_bot: bool,
    /// Whether the user has Telegram Premium.
    pub is_premium: bool,
    /// Whether the user allowed the bot to message them.
    pub allows_write_to_pm: bool,
    /// Whether the user added the bot to the attachment menu.
    pub added_to_attachment_menu: bool,
}

/// The chat a Mini App was launched from via the attachment menu.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Chat {
    /// Chat id.
    pub id: i64,
    /// Serialized as `type`.
    #[serde(rename = "type")]
    pub kind: ChatType,
    /// Chat title.
    pub title: String,
    /// URL of the chat photo, `.jpeg` or `.svg`.
    pub photo_url: Option<String>,
    /// Only for supergroups and channels with a public username.
    pub username: Option<String>,
}

/// Kind of chat. Unrecognized values decode as [ChatType::Unknown].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    /// The user's private chat with the bot itself.
    Sender,
    /// A private chat with another user.
    Private,
    /// A basic group.
    Group,
    /// A supergroup.
    Supergroup,
    /// A channel.
    Channel,
    /// Absent or unrecognized.
    #[default]
    Unknown,
}

impl ChatType {
    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            ChatType::Sender => "sender",
            ChatType::Private => "private",
            ChatType::Group => "group",
            ChatType::Supergroup => "supergroup",
            ChatType::Channel => "channel",
            ChatType::Unknown => "unknown",
        }
    }
}

impl FromStr for ChatType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "sender" => ChatType::Sender,
            "private" => ChatType::Private,
            "group" => ChatType::Group,
            "supergroup" => ChatType::Supergroup,
            "channel" => ChatType::Channel,
            _ => ChatType::Unknown,
        })
    }
}

impl fmt::Display for ChatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChatType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(value.parse().unwrap_or_default())
    }
}

/// How the parser embeds a field's decoded value into the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    /// Always a string, even when the text happens to be valid JSON.
    Text,
    /// Must be a JSON document; anything else is a format error.
    Object,
    /// A JSON literal when it is one, a string otherwise.
    Scalar,
}

const FIELD_KINDS: &[(&str, FieldKind)] = &[
    ("auth_date", FieldKind::Scalar),
    ("can_send_after", FieldKind::Scalar),
    ("chat", FieldKind::Object),
    ("chat_instance", FieldKind::Scalar),
    ("chat_type", FieldKind::Text),
    ("hash", FieldKind::Text),
    ("query_id", FieldKind::Text),
    ("receiver", FieldKind::Object),
    ("signature", FieldKind::Text),
    ("start_param", FieldKind::Text),
    ("user", FieldKind::Object),
];

impl FieldKind {
    pub(crate) fn of(key: &str) -> FieldKind {
        FIELD_KINDS
            .iter()
            .find(|(name, _)| *name == key)
            .map_or(FieldKind::Scalar, |(_, kind)| *kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_type_is_case_insensitive() {
        let kind: ChatType = serde_json::from_str(r#""SuperGroup""#).unwrap();
        assert_eq!(kind, ChatType::Supergroup);
    }

    #[test]
    fn unknown_chat_type() {
        let kind: ChatType = serde_json::from_str(r#""forum""#).unwrap();
        assert_eq!(kind, ChatType::Unknown);
        assert_eq!(ChatType::default(), ChatType::Unknown);
    }

    #[test]
    fn chat_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ChatType::Private).unwrap(), r#""private""#);
        assert_eq!(ChatType::Channel.to_string(), "channel");
    }

    #[test]
    fn chat_decodes_type_field() {
        let chat: Chat =
            serde_json::from_str(r#"{"id":-100123,"type":"group","title":"Devs"}"#).unwrap();
        assert_eq!(chat.id, -100123);
        assert_eq!(chat.kind, ChatType::Group);
        assert_eq!(chat.title, "Devs");
        assert_eq!(chat.username, None);
    }

    #[test]
    fn field_kinds() {
        assert_eq!(FieldKind::of("start_param"), FieldKind::Text);
        assert_eq!(FieldKind::of("user"), FieldKind::Object);
        assert_eq!(FieldKind::of("auth_date"), FieldKind::Scalar);
        assert_eq!(FieldKind::of("something_new"), FieldKind::Scalar);
    }

    #[test]
    fn auth_date_helpers() {
        let data = InitData {
            auth_date: 1662771648,
            can_send_after: 60,
            ..Default::default()
        };
        assert_eq!(data.auth_date_time().unwrap().timestamp(), 1662771648);
        assert_eq!(data.can_send_after_time().unwrap().timestamp(), 1662771708);
    }
}
