use serde::{Deserialize, Serialize};

/// Maximum number of results or ids a single list call accepts.
pub const MAX_BATCH: u32 = 50;

/// API call kinds, each billed a fixed number of quota units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaOperation {
    Search,
    Videos,
    Channels,
}

impl QuotaOperation {
    pub fn cost(self) -> u32 {
        match self {
            QuotaOperation::Search => 100,
            QuotaOperation::Videos => 1,
            QuotaOperation::Channels => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuotaOperation::Search => "search",
            QuotaOperation::Videos => "videos",
            QuotaOperation::Channels => "channels",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    pub requests: u32,
}

/// Rough cost of collecting `videos_per_query` results for one query.
pub fn estimated_query_cost(videos_per_query: u32) -> u32 {
    (videos_per_query / MAX_BATCH + 1) * QuotaOperation::Search.cost()
}

/// Running tally of quota units spent against a daily budget.
#[derive(Debug, Clone)]
pub struct QuotaManager {
    daily_limit: u32,
    used: u32,
    request_count: u32,
}

impl QuotaManager {
    pub fn new(daily_limit: u32) -> Self {
        Self {
            daily_limit,
            used: 0,
            request_count: 0,
        }
    }

    pub fn can_afford(&self, op: QuotaOperation) -> bool {
        self.used.saturating_add(op.cost()) <= self.daily_limit
    }

    pub fn record(&mut self, op: QuotaOperation) {
        self.used = self.used.saturating_add(op.cost());
        self.request_count += 1;
        tracing::debug!(
            "Quota used: {}/{} (request: {}, cost: {})",
            self.used,
            self.daily_limit,
            op.as_str(),
            op.cost()
        );
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    pub fn remaining(&self) -> u32 {
        self.daily_limit.saturating_sub(self.used)
    }

    pub fn reset(&mut self) {
        self.used = 0;
        self.request_count = 0;
        tracing::info!("Quota counter reset");
    }

    pub fn usage(&self) -> QuotaUsage {
        QuotaUsage {
            used: self.used,
            limit: self.daily_limit,
            remaining: self.remaining(),
            requests: self.request_count,
        }
    }
}
