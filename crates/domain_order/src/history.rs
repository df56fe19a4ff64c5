//! Order history and the buyer's order list filters

use chrono::{DateTime, Datelike, Months, Utc};
use core_kernel::{OrderHistoryId, Pagination, UserId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::OrderError;
use crate::order::Order;

/// One checkout, grouping the orders it created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHistory {
    pub id: OrderHistoryId,
    pub buyer_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl OrderHistory {
    pub fn new(buyer_id: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: OrderHistoryId::new_v7(),
            buyer_id,
            created_at,
        }
    }
}

/// Time window of the order list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimePeriodFilter {
    #[serde(rename = "3months")]
    LastThreeMonths,
    #[serde(rename = "6months")]
    LastSixMonths,
    #[serde(rename = "2024")]
    Year2024,
    #[serde(rename = "2025")]
    Year2025,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl TimePeriodFilter {
    pub fn includes(&self, date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let since = |months: u32| now.checked_sub_months(Months::new(months)).map_or(true, |start| date >= start);
        match self {
            TimePeriodFilter::LastThreeMonths => since(3),
            TimePeriodFilter::LastSixMonths => since(6),
            TimePeriodFilter::Year2024 => date.year() == 2024,
            TimePeriodFilter::Year2025 => date.year() == 2025,
            TimePeriodFilter::All => true,
        }
    }
}

impl FromStr for TimePeriodFilter {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "3months" => Ok(TimePeriodFilter::LastThreeMonths),
            "6months" => Ok(TimePeriodFilter::LastSixMonths),
            "2024" => Ok(TimePeriodFilter::Year2024),
            "2025" => Ok(TimePeriodFilter::Year2025),
            "all" | "" => Ok(TimePeriodFilter::All),
            other => Err(OrderError::UnknownPeriod(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderHistoryQuery {
    pub period: TimePeriodFilter,
    pub search: Option<String>,
    pub pagination: Pagination,
}

/// A page of orders plus the count before paging
#[derive(Debug, Clone, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total_count: usize,
}

/// Filters, sorts newest first and pages a buyer's orders
pub fn filter_orders(orders: Vec<Order>, query: &OrderHistoryQuery, now: DateTime<Utc>) -> OrderPage {
    let search = query.search.as_deref().unwrap_or("");
    let mut matching: Vec<Order> = orders
        .into_iter()
        .filter(|o| query.period.includes(o.order_date, now) && o.matches_name(search))
        .collect();
    matching.sort_by(|a, b| b.order_date.cmp(&a.order_date));
    let total_count = matching.len();
    OrderPage {
        orders: query.pagination.apply(matching),
        total_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_period_parsing() {
        assert_eq!("3months".parse::<TimePeriodFilter>().unwrap(), TimePeriodFilter::LastThreeMonths);
        assert_eq!("ALL".parse::<TimePeriodFilter>().unwrap(), TimePeriodFilter::All);
        assert!("lastweek".parse::<TimePeriodFilter>().is_err());
    }

    #[test]
    fn test_period_windows() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let april = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
        let january = Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap();
        let old = Utc.with_ymd_and_hms(2024, 11, 2, 0, 0, 0).unwrap();

        assert!(TimePeriodFilter::LastThreeMonths.includes(april, now));
        assert!(!TimePeriodFilter::LastThreeMonths.includes(january, now));
        assert!(TimePeriodFilter::LastSixMonths.includes(january, now));
        assert!(TimePeriodFilter::Year2024.includes(old, now));
        assert!(!TimePeriodFilter::Year2025.includes(old, now));
        assert!(TimePeriodFilter::All.includes(old, now));
    }
}
