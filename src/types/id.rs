//! 32-byte ledger identifiers.
//!
//! Object ids and account addresses share one layout: 32 raw bytes on the wire, `0x`-prefixed
//! hex in JSON and YAML. Short forms such as `0x2` are left-padded with zeroes.

use alloy_primitives::{B256, hex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Error returned when parsing an id from a hex string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    /// The string is not valid hex.
    #[error("invalid hex id {0:?}")]
    InvalidHex(String),
    /// The decoded id is longer than 32 bytes.
    #[error("id {0:?} is longer than 32 bytes")]
    TooLong(String),
    /// The string is not a base58 encoded 32-byte digest.
    #[error("invalid object digest {0:?}")]
    InvalidDigest(String),
}

fn parse_padded(s: &str) -> Result<B256, IdParseError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let digits =
        if digits.len() % 2 == 1 { format!("0{digits}") } else { digits.to_string() };
    let bytes = hex::decode(&digits).map_err(|_| IdParseError::InvalidHex(s.to_string()))?;
    if bytes.len() > 32 {
        return Err(IdParseError::TooLong(s.to_string()));
    }
    Ok(B256::left_padding_from(&bytes))
}

macro_rules! ledger_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub B256);

        impl $name {
            /// The all-zero value.
            pub const ZERO: Self = Self(B256::ZERO);

            /// Creates a value whose last byte is `byte`. Mostly useful for fixtures.
            pub fn with_last_byte(byte: u8) -> Self {
                Self(B256::with_last_byte(byte))
            }

            /// Returns the raw bytes.
            pub const fn as_bytes(&self) -> &[u8; 32] {
                &self.0.0
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(B256::from(bytes))
            }
        }

        impl From<B256> for $name {
            fn from(value: B256) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_padded(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                if serializer.is_human_readable() {
                    serializer.collect_str(self)
                } else {
                    self.as_bytes().serialize(serializer)
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                if deserializer.is_human_readable() {
                    let s = String::deserialize(deserializer)?;
                    s.parse().map_err(serde::de::Error::custom)
                } else {
                    <[u8; 32]>::deserialize(deserializer).map(Self::from)
                }
            }
        }
    };
}

ledger_id!(
    /// Id of an object stored on the ledger (proposal, market, escrow, wrapper, package).
    ObjectId
);

ledger_id!(
    /// An account address.
    Address
);

/// Content digest of an object version. Base58 in JSON, length-prefixed bytes in BCS.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ObjectDigest(pub [u8; 32]);

impl fmt::Display for ObjectDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for ObjectDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectDigest({self})")
    }
}

impl FromStr for ObjectDigest {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes =
            bs58::decode(s).into_vec().map_err(|_| IdParseError::InvalidDigest(s.to_string()))?;
        <[u8; 32]>::try_from(bytes.as_slice())
            .map(Self)
            .map_err(|_| IdParseError::InvalidDigest(s.to_string()))
    }
}

impl Serialize for ObjectDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for ObjectDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            let bytes = Vec::<u8>::deserialize(deserializer)?;
            <[u8; 32]>::try_from(bytes.as_slice()).map(Self).map_err(|_| {
                serde::de::Error::invalid_length(bytes.len(), &"a 32-byte digest")
            })
        }
    }
}

/// A reference to a specific version of an owned object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// The object id.
    pub id: ObjectId,
    /// The object version.
    pub version: u64,
    /// The object digest.
    pub digest: ObjectDigest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_form() {
        let id: ObjectId = "0x2".parse().unwrap();
        assert_eq!(id, ObjectId::with_last_byte(2));

        let id: ObjectId = "abc".parse().unwrap();
        assert_eq!(id.as_bytes()[30..], [0x0a, 0xbc]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!("0xzz".parse::<ObjectId>(), Err(IdParseError::InvalidHex(_))));
        let long = format!("0x{}", "11".repeat(33));
        assert!(matches!(long.parse::<Address>(), Err(IdParseError::TooLong(_))));
    }

    #[test]
    fn bcs_is_raw_bytes() {
        let id = ObjectId::with_last_byte(7);
        let bytes = bcs::to_bytes(&id).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(bcs::from_bytes::<ObjectId>(&bytes).unwrap(), id);
    }

    #[test]
    fn json_is_hex_string() {
        let id = Address::with_last_byte(1);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"0x{}01\"", "00".repeat(31)));
        assert_eq!(serde_json::from_str::<Address>(&json).unwrap(), id);
    }

    #[test]
    fn digest_is_base58_in_json() {
        let digest = ObjectDigest([7; 32]);
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(serde_json::from_str::<ObjectDigest>(&json).unwrap(), digest);
        assert_eq!(bcs::to_bytes(&digest).unwrap().len(), 33);
        assert!(matches!("0OIl".parse::<ObjectDigest>(), Err(IdParseError::InvalidDigest(_))));
    }
}
