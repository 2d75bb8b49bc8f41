use serde::Serialize;
use verifynews_common::{Veracity, VerificationRecord};

/// Aggregate counts shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: u64,
    pub true_count: u64,
    pub false_count: u64,
    pub uncertain_count: u64,
}

impl DashboardStats {
    pub fn from_records(records: &[VerificationRecord]) -> Self {
        records.iter().fold(Self::default(), |mut stats, record| {
            stats.total += 1;
            *stats.count_mut(record.veracity) += 1;
            stats
        })
    }

    pub fn count(&self, veracity: Veracity) -> u64 {
        match veracity {
            Veracity::True => self.true_count,
            Veracity::False => self.false_count,
            Veracity::Uncertain => self.uncertain_count,
        }
    }

    fn count_mut(&mut self, veracity: Veracity) -> &mut u64 {
        match veracity {
            Veracity::True => &mut self.true_count,
            Veracity::False => &mut self.false_count,
            Veracity::Uncertain => &mut self.uncertain_count,
        }
    }

    /// Percentage of all verifications with this judgement, 0 when empty.
    pub fn share(&self, veracity: Veracity) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(veracity) as f64 * 100.0 / self.total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(veracity: Veracity) -> VerificationRecord {
        VerificationRecord {
            id: "id".into(),
            query: "q".into(),
            content: String::new(),
            veracity,
            confidence: 50,
            explanation: String::new(),
            sources: vec![],
            user_id: None,
            article: None,
            slug: "q".into(),
            title: None,
            view_count: 0,
            upvotes: 0,
            downvotes: 0,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn counts_by_veracity() {
        let records = vec![
            record(Veracity::True),
            record(Veracity::False),
            record(Veracity::False),
            record(Veracity::Uncertain),
        ];
        let stats = DashboardStats::from_records(&records);
        assert_eq!(
            stats,
            DashboardStats {
                total: 4,
                true_count: 1,
                false_count: 2,
                uncertain_count: 1,
            }
        );
        assert_eq!(stats.share(Veracity::False), 50.0);
    }

    #[test]
    fn empty_share_is_zero() {
        assert_eq!(DashboardStats::default().share(Veracity::True), 0.0);
    }
}
