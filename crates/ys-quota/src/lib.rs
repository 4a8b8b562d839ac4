pub mod manager;
pub mod reset;

pub use manager::{estimated_query_cost, QuotaManager, QuotaOperation, QuotaUsage};
pub use reset::{next_reset_after, QuotaResetInfo};
