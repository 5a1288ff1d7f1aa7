use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entity::AccountId;
use crate::error::TypeError;
use crate::timestamp::ConsensusTimestamp;

/// Identifier of a submitted transaction: `payer@seconds.nanos`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId {
    pub payer: AccountId,
    pub valid_start: ConsensusTimestamp,
}

impl TransactionId {
    pub fn new(payer: AccountId, valid_start: ConsensusTimestamp) -> Self {
        Self { payer, valid_start }
    }

    /// A fresh id for `payer` starting now.
    pub fn generate(payer: AccountId) -> Self {
        Self::new(payer, ConsensusTimestamp::now())
    }
}

impl FromStr for TransactionId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (payer, start) = s
            .split_once('@')
            .ok_or_else(|| TypeError::InvalidTransactionId(s.to_string()))?;
        let payer = payer
            .parse()
            .map_err(|_| TypeError::InvalidTransactionId(s.to_string()))?;
        let valid_start = ConsensusTimestamp::parse(start)
            .map_err(|_| TypeError::InvalidTransactionId(s.to_string()))?;
        Ok(Self { payer, valid_start })
    }
}

impl TryFrom<String> for TransactionId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.payer, self.valid_start)
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({self})")
    }
}
