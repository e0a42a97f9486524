use crate::error::{MarketError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    Buyer,
    Seller,
    Admin,
}

/// A resolved caller, as supplied by the auth service.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Identity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: UserKind,
}

impl Identity {
    pub fn new(id: impl Into<String>, kind: UserKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.kind == UserKind::Admin
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(MarketError::Permission("Admin role required".to_string()))
        }
    }

    pub fn require_seller_or_admin(&self) -> Result<()> {
        match self.kind {
            UserKind::Seller | UserKind::Admin => Ok(()),
            UserKind::Buyer => Err(MarketError::Permission(
                "Seller or admin role required".to_string(),
            )),
        }
    }

    /// Admins may act on anything; everyone else only on what they own.
    pub fn require_owner(&self, owner_id: &str) -> Result<()> {
        if self.is_admin() || self.id == owner_id {
            Ok(())
        } else {
            Err(MarketError::Permission(
                "Only the owner may perform this action".to_string(),
            ))
        }
    }
}
