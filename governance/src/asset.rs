//! Asset types that a coin transfer proposal can be denominated in

use serde::{Deserialize, Serialize};
use std::fmt;

/// Compile-time asset marker.
pub trait Asset {
    const TYPE_TAG: &'static str;
}

/// The chain's native coin
#[derive(Debug, Clone, Copy)]
pub struct NativeCoin;

impl Asset for NativeCoin {
    const TYPE_TAG: &'static str = "native";
}

/// Runtime asset tag, as stored on a coin transfer extension
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AssetType(String);

impl AssetType {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn of<A: Asset>() -> Self {
        Self(A::TYPE_TAG.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
