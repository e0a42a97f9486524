use crate::domain::money::Money;
use crate::domain::payout::{CommissionPayout, PayoutStatus, Period};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct PayoutRow<'a> {
    store_id: &'a str,
    period: Period,
    transactions: usize,
    amount: Money,
    status: PayoutStatus,
}

/// Writes payouts as `store_id,period,transactions,amount,status`.
pub struct PayoutWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PayoutWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_payouts<'a, I>(&mut self, payouts: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a CommissionPayout>,
    {
        for payout in payouts {
            self.writer.serialize(PayoutRow {
                store_id: &payout.store_id,
                period: payout.period,
                transactions: payout.transaction_count,
                amount: payout.amount,
                status: payout.status,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_writes_header_and_rows() {
        let payout = CommissionPayout::new(
            "S1",
            "2024-01".parse().unwrap(),
            Money::new(dec!(37.50)),
            2,
            Utc::now(),
        );
        let mut out = Vec::new();
        PayoutWriter::new(&mut out).write_payouts([&payout]).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("store_id,period,transactions,amount,status"));
        assert_eq!(lines.next(), Some("S1,2024-01,2,37.50,pending"));
        assert_eq!(lines.next(), None);
    }
}
