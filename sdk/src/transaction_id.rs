//! Transaction identity: payer plus valid-start time.
//!
//! A [`TransactionId`] is what the network deduplicates on. It is created
//! once, when a transaction is associated with a payer, and never mutated
//! afterwards. Chunk siblings and regenerated identities are *new* values
//! derived from an existing one.
//!
//! Canonical string form: `payer@seconds.nanos[?scheduled][/nonce]`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Error;
use crate::ids::AccountId;
use crate::timestamp::Timestamp;

/// How far back a generated valid-start is placed, at minimum. Nodes reject
/// start times in their future, and clocks drift.
const VALID_START_BACKDATE: Duration = Duration::from_secs(8);

/// Random spread added on top of the backdate so identities generated in
/// the same instant by different processes do not collide.
const VALID_START_JITTER_NANOS: u64 = 5_000_000_000;

/// The identity of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    /// The account paying for the transaction.
    pub account_id: AccountId,
    /// Start of the validity window.
    pub valid_start: Timestamp,
    /// Whether this id refers to the scheduled (inner) transaction.
    pub scheduled: bool,
    /// Disambiguates child transactions sharing a parent's identity.
    pub nonce: Option<i32>,
}

impl TransactionId {
    /// Creates an identity with an explicit valid-start.
    pub fn with_valid_start(account_id: AccountId, valid_start: Timestamp) -> Self {
        Self {
            account_id,
            valid_start,
            scheduled: false,
            nonce: None,
        }
    }

    /// Generates a fresh identity for `account_id`, valid from slightly in
    /// the past.
    pub fn generate(account_id: AccountId) -> Self {
        let jitter = rand::thread_rng().gen_range(0..VALID_START_JITTER_NANOS);
        let valid_start = Timestamp::now()
            .minus(VALID_START_BACKDATE)
            .minus(Duration::from_nanos(jitter));
        Self::with_valid_start(account_id, valid_start)
    }

    /// Returns a copy with the valid-start advanced by `offset`.
    ///
    /// Used to derive chunk siblings from an initial identity.
    pub fn offset_by(self, offset: Duration) -> Self {
        Self {
            valid_start: self.valid_start.plus(offset),
            ..self
        }
    }

    /// Returns a copy flagged as referring to a scheduled transaction.
    pub fn as_scheduled(self) -> Self {
        Self {
            scheduled: true,
            ..self
        }
    }

    /// Returns a copy carrying `nonce`.
    pub fn with_nonce(self, nonce: i32) -> Self {
        Self {
            nonce: Some(nonce),
            ..self
        }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.account_id, self.valid_start)?;
        if self.scheduled {
            f.write_str("?scheduled")?;
        }
        if let Some(nonce) = self.nonce {
            write!(f, "/{}", nonce)?;
        }
        Ok(())
    }
}

impl FromStr for TransactionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = || Error::Parse {
            kind: "transaction id",
            input: s.to_string(),
        };

        let (account, rest) = s.split_once('@').ok_or_else(parse_err)?;
        let account_id: AccountId = account.parse().map_err(|_| parse_err())?;

        let (rest, nonce) = match rest.split_once('/') {
            Some((head, nonce)) => (head, Some(nonce.parse::<i32>().map_err(|_| parse_err())?)),
            None => (rest, None),
        };
        let (time, scheduled) = match rest.strip_suffix("?scheduled") {
            Some(time) => (time, true),
            None => (rest, false),
        };

        let (seconds, nanos) = time.split_once('.').ok_or_else(parse_err)?;
        let seconds = seconds.parse::<i64>().map_err(|_| parse_err())?;
        let nanos = nanos.parse::<u32>().map_err(|_| parse_err())?;
        if nanos >= 1_000_000_000 {
            return Err(parse_err());
        }

        Ok(Self {
            account_id,
            valid_start: Timestamp::new(seconds, nanos),
            scheduled,
            nonce,
        })
    }
}
