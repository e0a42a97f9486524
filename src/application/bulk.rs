use crate::error::Result;
use serde::Serialize;

/// Outcome of one id inside a bulk operation.
#[derive(Debug, Serialize, PartialEq)]
pub struct BulkItem<S> {
    pub id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct BulkReport<S> {
    pub results: Vec<BulkItem<S>>,
    pub succeeded: usize,
    pub failed: usize,
}

impl<S> BulkReport<S> {
    /// Builds the report from per-id results, keeping the request order.
    pub fn collect<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (String, Result<S>)>,
    {
        let results: Vec<BulkItem<S>> = outcomes
            .into_iter()
            .map(|(id, outcome)| match outcome {
                Ok(status) => BulkItem {
                    id,
                    ok: true,
                    status: Some(status),
                    error: None,
                },
                Err(e) => BulkItem {
                    id,
                    ok: false,
                    status: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();
        let succeeded = results.iter().filter(|r| r.ok).count();
        let failed = results.len() - succeeded;
        Self {
            results,
            succeeded,
            failed,
        }
    }
}
