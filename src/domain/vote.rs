use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("vote value must be one of -1, 0 or 1, got {0}")]
pub struct InvalidVoteValue(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum VoteValue {
    Down,
    Neutral,
    Up,
}

impl VoteValue {
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Down => -1,
            Self::Neutral => 0,
            Self::Up => 1,
        }
    }

    pub fn from_db(value: i16) -> Option<Self> {
        Self::try_from(i64::from(value)).ok()
    }

    /// Accepts a JSON integer or an integer string. Floats, booleans and
    /// anything else are rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, InvalidVoteValue> {
        match value {
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(value) => Self::try_from(value),
                None => Err(InvalidVoteValue(number.to_string())),
            },
            serde_json::Value::String(text) => text.parse(),
            other => Err(InvalidVoteValue(other.to_string())),
        }
    }
}

impl TryFrom<i64> for VoteValue {
    type Error = InvalidVoteValue;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Down),
            0 => Ok(Self::Neutral),
            1 => Ok(Self::Up),
            other => Err(InvalidVoteValue(other.to_string())),
        }
    }
}

impl From<VoteValue> for i64 {
    fn from(value: VoteValue) -> Self {
        i64::from(value.as_i16())
    }
}

impl FromStr for VoteValue {
    type Err = InvalidVoteValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(|_| InvalidVoteValue(format!("{:?}", s)))?;
        Self::try_from(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub user_id: i64,
    pub post_id: i64,
    pub value: VoteValue,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Per-post vote aggregate. Never stored; derived from the votes table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub score: i64,
    pub upvotes: i64,
    pub downvotes: i64,
}

impl VoteTally {
    /// Votes that took a side. Neutral votes are not counted.
    pub fn total(&self) -> i64 {
        self.upvotes + self.downvotes
    }
}
