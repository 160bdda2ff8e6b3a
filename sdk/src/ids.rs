//! Entity identifiers.
//!
//! Every addressable thing on the ledger (accounts, topics, files,
//! schedules) is named by a `shard.realm.num` triple. The kinds share a
//! layout but are distinct types so a topic id can never be passed where an
//! account id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Parses `shard.realm.num` into its three components.
fn parse_triple(kind: &'static str, s: &str) -> Result<(u64, u64, u64), Error> {
    let parse_err = || Error::Parse {
        kind,
        input: s.to_string(),
    };

    let mut parts = s.split('.');
    let mut next = || -> Result<u64, Error> {
        parts
            .next()
            .ok_or_else(parse_err)?
            .parse::<u64>()
            .map_err(|_| parse_err())
    };
    let triple = (next()?, next()?, next()?);

    if parts.next().is_some() {
        return Err(parse_err());
    }
    Ok(triple)
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        pub struct $name {
            /// Shard number.
            pub shard: u64,
            /// Realm number.
            pub realm: u64,
            /// Entity number within the realm.
            pub num: u64,
        }

        impl $name {
            /// Creates an identifier from its three components.
            pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
                Self { shard, realm, num }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let (shard, realm, num) = parse_triple($kind, s)?;
                Ok(Self { shard, realm, num })
            }
        }

        impl From<u64> for $name {
            /// Shorthand for `0.0.num`.
            fn from(num: u64) -> Self {
                Self::new(0, 0, num)
            }
        }
    };
}

entity_id!(
    /// An account: payer of fees, target node, or transfer party.
    AccountId,
    "account id"
);

entity_id!(
    /// A consensus topic.
    TopicId,
    "topic id"
);

entity_id!(
    /// A file in the ledger's file service.
    FileId,
    "file id"
);

entity_id!(
    /// A scheduled transaction awaiting signatures.
    ScheduleId,
    "schedule id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_parses_and_displays() {
        let id: AccountId = "0.0.1001".parse().unwrap();
        assert_eq!(id, AccountId::new(0, 0, 1001));
        assert_eq!(id.to_string(), "0.0.1001");
    }

    #[test]
    fn shorthand_from_num() {
        assert_eq!(AccountId::from(3), AccountId::new(0, 0, 3));
        assert_eq!(TopicId::from(7).to_string(), "0.0.7");
    }

    #[test]
    fn rejects_malformed_triples() {
        for bad in ["", "0.0", "0.0.1.2", "a.b.c", "0..1", "0.0.-1"] {
            let err = bad.parse::<AccountId>().unwrap_err();
            assert!(err.is_malformed_input(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn parse_error_names_the_kind() {
        let err = "nope".parse::<TopicId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse topic id from \"nope\"");
    }

    #[test]
    fn ordering_is_by_shard_realm_num() {
        assert!(AccountId::new(0, 0, 3) < AccountId::new(0, 0, 4));
        assert!(AccountId::new(0, 1, 0) > AccountId::new(0, 0, 999));
    }
}
