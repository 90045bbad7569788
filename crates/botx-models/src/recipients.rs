//! Recipients of an outgoing message.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who should see an outgoing message.
///
/// The wire form is either the literal string `"all"` or an explicit list of
/// user HUIDs, so serde is implemented by hand: an untagged derive cannot
/// validate the literal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Recipients {
    /// Everyone in the conversation.
    #[default]
    All,
    /// An explicit set of users.
    Users(Vec<Uuid>),
}

impl From<Vec<Uuid>> for Recipients {
    fn from(users: Vec<Uuid>) -> Self {
        Self::Users(users)
    }
}

impl Serialize for Recipients {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("all"),
            Self::Users(users) => users.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Recipients {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Literal(String),
            Users(Vec<Uuid>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Literal(s) if s == "all" => Ok(Self::All),
            Repr::Literal(other) => Err(de::Error::invalid_value(
                de::Unexpected::Str(&other),
                &"the literal \"all\" or a list of user HUIDs",
            )),
            Repr::Users(users) => Ok(Self::Users(users)),
        }
    }
}

impl fmt::Display for Recipients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Users(users) => write!(f, "{} users", users.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn all_is_the_literal_string() {
        assert_eq!(serde_json::to_value(Recipients::All).unwrap(), json!("all"));
        let parsed: Recipients = serde_json::from_value(json!("all")).unwrap();
        assert_eq!(parsed, Recipients::All);
    }

    #[test]
    fn users_are_a_uuid_list() {
        let recipients = Recipients::Users(vec![Uuid::nil()]);
        assert_eq!(
            serde_json::to_value(&recipients).unwrap(),
            json!(["00000000-0000-0000-0000-000000000000"])
        );
        let parsed: Recipients =
            serde_json::from_value(json!(["00000000-0000-0000-0000-000000000000"])).unwrap();
        assert_eq!(parsed, recipients);
    }

    #[test]
    fn other_strings_are_rejected() {
        assert!(serde_json::from_value::<Recipients>(json!("everyone")).is_err());
    }
}
