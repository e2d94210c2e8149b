//! Shared newtypes and utilities used across all domain modules.
//!
//! `Side` serializes exactly as the venue spells it (`"buy"`/`"sell"`), so it
//! appears directly in wire types.

pub mod fmt;
pub mod serde_util;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

// ─── FeedUrl ─────────────────────────────────────────────────────────────────

/// Newtype for a live feed URL (e.g. `"ws://host/api/v1/ws/orderbook"`).
///
/// One feed URL maps to at most one transport connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedUrl(String);

impl FeedUrl {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FeedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FeedUrl {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FeedUrl {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&FeedUrl> for FeedUrl {
    fn from(url: &FeedUrl) -> Self {
        url.clone()
    }
}

impl FromStr for FeedUrl {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FeedUrl(s.to_string()))
    }
}

impl Serialize for FeedUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FeedUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(FeedUrl(s))
    }
}

// ─── Side ────────────────────────────────────────────────────────────────────

/// Order side. Serialized as the venue's `"buy"` / `"sell"` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "Buy"),
            Side::Sell => write!(f, "Sell"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" | "bid" => Ok(Side::Buy),
            "sell" | "ask" => Ok(Side::Sell),
            other => Err(format!("unknown side: {other}")),
        }
    }
}
