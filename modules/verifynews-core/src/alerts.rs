//! Trending misinformation alerts, raised from recently saved verifications.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use verifynews_common::{Veracity, VerificationRecord};

use crate::error::Result;
use crate::service::VerificationService;

/// Confidence at or above which a `false` verdict is a high-severity alert.
pub const HIGH_CONFIDENCE: u8 = 80;

/// Views at or above which an `uncertain` verdict is worth a medium alert.
pub const TRENDING_VIEWS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// `None` for records that need no alert (claims judged true).
    pub fn classify(record: &VerificationRecord) -> Option<Severity> {
        match record.veracity {
            Veracity::True => None,
            Veracity::False if record.confidence >= HIGH_CONFIDENCE => Some(Severity::High),
            Veracity::False => Some(Severity::Medium),
            Veracity::Uncertain if record.view_count >= TRENDING_VIEWS => Some(Severity::Medium),
            Veracity::Uncertain => Some(Severity::Low),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingAlert {
    pub record_id: String,
    pub slug: String,
    pub headline: String,
    pub veracity: Veracity,
    pub confidence: u8,
    pub severity: Severity,
    pub view_count: u64,
    pub raised_at: DateTime<Utc>,
}

/// Bounded, newest-first alert list.
///
/// Only records created at or after the newest one already ingested can raise
/// an alert, so a record never re-enters the feed after being evicted.
#[derive(Debug, Clone)]
pub struct TrendingFeed {
    alerts: VecDeque<TrendingAlert>,
    capacity: usize,
    watermark: Option<DateTime<Utc>>,
}

impl Default for TrendingFeed {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl TrendingFeed {
    pub const DEFAULT_CAPACITY: usize = 10;

    pub fn new(capacity: usize) -> Self {
        Self {
            alerts: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            watermark: None,
        }
    }

    pub fn alerts(&self) -> impl Iterator<Item = &TrendingAlert> {
        self.alerts.iter()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Raise alerts for `records` not seen before. Returns the new alerts, newest first.
    pub fn ingest(&mut self, records: &[VerificationRecord], now: DateTime<Utc>) -> Vec<TrendingAlert> {
        let mut ordered: Vec<&VerificationRecord> = records
            .iter()
            .filter(|r| self.watermark.map_or(true, |w| r.created_at >= w))
            .collect();
        ordered.sort_by_key(|r| r.created_at);

        let mut raised = Vec::new();
        for record in ordered {
            self.watermark = Some(self.watermark.map_or(record.created_at, |w| w.max(record.created_at)));

            if self.alerts.iter().any(|a| a.record_id == record.id) {
                continue;
            }
            let Some(severity) = Severity::classify(record) else {
                continue;
            };

            let alert = TrendingAlert {
                record_id: record.id.clone(),
                slug: record.slug.clone(),
                headline: record.headline().to_string(),
                veracity: record.veracity,
                confidence: record.confidence,
                severity,
                view_count: record.view_count,
                raised_at: now,
            };
            self.alerts.push_front(alert.clone());
            raised.push(alert);
        }

        while self.alerts.len() > self.capacity {
            self.alerts.pop_back();
        }

        raised.reverse();
        raised
    }

    /// Pull the `window` most recent records and ingest them.
    pub async fn refresh(&mut self, service: &VerificationService, window: u32) -> Result<Vec<TrendingAlert>> {
        let records = service.get_recent(window).await?;
        let raised = self.ingest(&records, Utc::now());
        if !raised.is_empty() {
            tracing::info!(raised = raised.len(), feed = self.alerts.len(), "New trending alerts");
        }
        Ok(raised)
    }
}
