use super::money::Money;
use crate::error::{MarketError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || !(1970..=9999).contains(&year) {
            return Err(MarketError::Validation(format!(
                "Invalid period {:04}-{:02}",
                year, month
            )));
        }
        Ok(Self { year, month })
    }

    fn first_day(year: i32, month: u32) -> Result<DateTime<Utc>> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .ok_or_else(|| MarketError::Validation(format!("Invalid period {}-{}", year, month)))
    }

    /// Half-open UTC range `[start, end)` covered by this period.
    pub fn range(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let start = Self::first_day(self.year, self.month)?;
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        let end = Self::first_day(next_year, next_month)?;
        Ok((start, end))
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        match self.range() {
            Ok((start, end)) => at >= start && at < end,
            Err(_) => false,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || MarketError::Validation(format!("Period must be YYYY-MM, got '{}'", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for Period {
    type Error = MarketError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Admin action on a payout.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PayoutAction {
    /// pending -> processing
    Approve,
    /// processing -> completed
    Process,
    /// pending | processing -> failed
    Reject,
}

impl fmt::Display for PayoutAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Approve => "approve",
            Self::Process => "process",
            Self::Reject => "reject",
        };
        f.write_str(s)
    }
}

impl PayoutStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn apply(self, action: PayoutAction) -> Result<Self> {
        match (self, action) {
            (Self::Pending, PayoutAction::Approve) => Ok(Self::Processing),
            (Self::Processing, PayoutAction::Process) => Ok(Self::Completed),
            (Self::Pending | Self::Processing, PayoutAction::Reject) => Ok(Self::Failed),
            (from, action) => Err(MarketError::InvalidTransition {
                from: from.to_string(),
                action: action.to_string(),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CommissionPayout {
    pub id: Uuid,
    pub store_id: String,
    pub period: Period,
    pub amount: Money,
    pub transaction_count: usize,
    pub status: PayoutStatus,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl CommissionPayout {
    pub fn new(
        store_id: impl Into<String>,
        period: Period,
        amount: Money,
        transaction_count: usize,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            store_id: store_id.into(),
            period,
            amount,
            transaction_count,
            status: PayoutStatus::Pending,
            payment_reference: None,
            notes: None,
            created_at: now,
            updated_at: now,
            processed_at: None,
        }
    }

    /// Returns the payout as it looks after `action`; `self` is left untouched.
    pub fn transitioned(
        &self,
        action: PayoutAction,
        notes: Option<&str>,
        payment_reference: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let status = self.status.apply(action)?;
        let mut next = self.clone();
        next.status = status;
        next.updated_at = now;
        if let Some(notes) = notes {
            next.notes = Some(notes.to_string());
        }
        if let Some(reference) = payment_reference {
            next.payment_reference = Some(reference.to_string());
        }
        if status.is_terminal() {
            next.processed_at = Some(now);
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_period_parse_and_display() {
        let p: Period = "2024-01".parse().unwrap();
        assert_eq!(p.to_string(), "2024-01");
        assert!("2024-13".parse::<Period>().is_err());
        assert!("2024-1".parse::<Period>().is_err());
        assert!("january".parse::<Period>().is_err());
    }

    #[test]
    fn test_period_range_wraps_year() {
        let p: Period = "2023-12".parse().unwrap();
        let (start, end) = p.range().unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert!(p.contains(Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap()));
        assert!(!p.contains(end));
    }

    #[test]
    fn test_status_machine() {
        use PayoutAction::*;
        use PayoutStatus::*;
        assert_eq!(Pending.apply(Approve).unwrap(), Processing);
        assert_eq!(Processing.apply(Process).unwrap(), Completed);
        assert_eq!(Pending.apply(Reject).unwrap(), Failed);
        assert_eq!(Processing.apply(Reject).unwrap(), Failed);

        assert!(Pending.apply(Process).is_err());
        assert!(Processing.apply(Approve).is_err());
        assert!(Completed.apply(Reject).is_err());
        assert!(matches!(
            Failed.apply(Approve),
            Err(MarketError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_transitioned_records_notes_and_processed_at() {
        let now = Utc::now();
        let payout = CommissionPayout::new(
            "S1",
            "2024-01".parse().unwrap(),
            Money::new(dec!(37.5)),
            2,
            now,
        );
        let approved = payout
            .transitioned(PayoutAction::Approve, Some("ok"), None, now)
            .unwrap();
        assert_eq!(approved.status, PayoutStatus::Processing);
        assert_eq!(approved.notes.as_deref(), Some("ok"));
        assert!(approved.processed_at.is_none());
        assert_eq!(payout.status, PayoutStatus::Pending);

        let done = approved
            .transitioned(PayoutAction::Process, None, Some("WIRE-1"), now)
            .unwrap();
        assert_eq!(done.status, PayoutStatus::Completed);
        assert_eq!(done.notes.as_deref(), Some("ok"));
        assert_eq!(done.payment_reference.as_deref(), Some("WIRE-1"));
        assert_eq!(done.processed_at, Some(now));
    }

    #[test]
    fn test_period_serde_as_string() {
        let p: Period = serde_json::from_str("\"2024-02\"").unwrap();
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"2024-02\"");
    }
}
