//! Stable identifiers for graph nodes and relationship edges.
//!
//! Ids are the first eight bytes of a SHA-256 digest over a canonical
//! string, so the same project or relationship gets the same id in every
//! process. Cached paths are sequences of these ids, which is what makes a
//! persisted path cache reusable across runs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

fn digest64(input: &str) -> u64 {
    let digest = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

macro_rules! hex_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Derive the id for a canonical key string.
            pub fn for_key(key: &str) -> Self {
                Self(digest64(key))
            }

            /// Wrap a raw id value.
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// The raw id value.
            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:016x}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                u64::from_str_radix(s, 16).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_id!(
    /// Identifies one project-version node.
    NodeId
);

hex_id!(
    /// Identifies one relationship edge.
    RelationshipId
);

hex_id!(
    /// Identifies a graph view, and with it one path-cache partition.
    ViewId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_deterministic() {
        assert_eq!(NodeId::for_key("g:a:1"), NodeId::for_key("g:a:1"));
        assert_ne!(NodeId::for_key("g:a:1"), NodeId::for_key("g:a:2"));
    }

    #[test]
    fn test_hex_round_trip() {
        let id = RelationshipId::for_key("anything");
        let text = id.to_string();
        assert_eq!(text.len(), 16);
        assert_eq!(text.parse::<RelationshipId>().unwrap(), id);

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{text}\""));
    }
}
