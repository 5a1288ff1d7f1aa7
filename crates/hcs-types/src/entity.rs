use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A ledger entity address in `shard.realm.num` form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl EntityId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }

    /// Parse from `shard.realm.num`.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let mut parts = s.trim().split('.');
        let mut next = || -> Result<u64, TypeError> {
            parts
                .next()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| TypeError::InvalidEntityId(s.to_string()))?
                .parse::<u64>()
                .map_err(|_| TypeError::InvalidEntityId(s.to_string()))
        };
        let shard = next()?;
        let realm = next()?;
        let num = next()?;
        if parts.next().is_some() {
            return Err(TypeError::InvalidEntityId(s.to_string()));
        }
        Ok(Self { shard, realm, num })
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({self})")
    }
}

/// Network-assigned identifier of a topic.
///
/// Opaque to callers: it is handed out by the ledger when a topic is created
/// and is the external handle of a stored file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TopicId(EntityId);

impl TopicId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self(EntityId::new(shard, realm, num))
    }

    pub fn entity(&self) -> EntityId {
        self.0
    }
}

/// Identifier of a ledger account (payer, node, or auto-renew account).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(EntityId);

impl AccountId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self(EntityId::new(shard, realm, num))
    }

    pub fn entity(&self) -> EntityId {
        self.0
    }
}

macro_rules! entity_newtype_impls {
    ($name:ident) => {
        impl FromStr for $name {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                EntityId::parse(s).map(Self)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

entity_newtype_impls!(TopicId);
entity_newtype_impls!(AccountId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let id: TopicId = "0.0.4821".parse().unwrap();
        assert_eq!(id, TopicId::new(0, 0, 4821));
        assert_eq!(id.to_string(), "0.0.4821");
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in ["", "0.0", "0.0.1.2", "a.b.c", "0..1", "-1.0.1"] {
            assert!(bad.parse::<TopicId>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn parse_trims_whitespace() {
        let id: AccountId = " 0.0.2 ".parse().unwrap();
        assert_eq!(id, AccountId::new(0, 0, 2));
    }

    #[test]
    fn serde_uses_string_form() {
        let id = TopicId::new(1, 2, 3);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"1.2.3\"");
        let parsed: TopicId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn debug_names_the_kind() {
        assert_eq!(format!("{:?}", TopicId::new(0, 0, 7)), "TopicId(0.0.7)");
        assert_eq!(format!("{:?}", AccountId::new(0, 0, 7)), "AccountId(0.0.7)");
    }

    #[test]
    fn ordering_is_numeric() {
        let a = TopicId::new(0, 0, 9);
        let b = TopicId::new(0, 0, 10);
        assert!(a < b);
    }
}
