use super::money::Rate;
use crate::error::{MarketError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Pending,
    Approved,
    Rejected,
    Suspended,
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Suspended => "suspended",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum StoreAction {
    Approve,
    Reject,
    Suspend,
}

impl fmt::Display for StoreAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Suspend => "suspend",
        };
        f.write_str(s)
    }
}

impl StoreStatus {
    pub fn apply(self, action: StoreAction) -> Result<Self> {
        match (self, action) {
            (Self::Pending | Self::Suspended, StoreAction::Approve) => Ok(Self::Approved),
            (Self::Pending, StoreAction::Reject) => Ok(Self::Rejected),
            (Self::Approved, StoreAction::Suspend) => Ok(Self::Suspended),
            (from, action) => Err(MarketError::InvalidTransition {
                from: from.to_string(),
                action: action.to_string(),
            }),
        }
    }
}

/// A seller's storefront on the marketplace.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Store {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub status: StoreStatus,
    /// Falls back to the marketplace default when unset.
    pub commission_rate: Option<Rate>,
    pub moderation_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        owner_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let id = id.into();
        let name = name.into();
        if id.trim().is_empty() || name.trim().is_empty() {
            return Err(MarketError::Validation(
                "Store id and name are required".to_string(),
            ));
        }
        Ok(Self {
            id,
            name,
            owner_id: owner_id.into(),
            status: StoreStatus::Pending,
            commission_rate: None,
            moderation_note: None,
            created_at: now,
            updated_at: now,
        })
    }
}
