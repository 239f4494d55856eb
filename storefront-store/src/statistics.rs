//! Order statistics
//!
//! Pure folds over the order collection. Only `completed` orders count as
//! revenue; a completed order is dated by `completedAt`, or `createdAt` for
//! records written before that field existed. Periods are UTC. Revenue is the
//! exact sum of the stored totals; only the average is rounded.

use crate::utils::{money, time};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use shared::models::Order;
use shared::order::OrderStatus;

/// Orders per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub new: usize,
    pub confirmed: usize,
    pub preparing: usize,
    pub delivering: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    fn bump(&mut self, status: OrderStatus) {
        let slot = match status {
            OrderStatus::New => &mut self.new,
            OrderStatus::Confirmed => &mut self.confirmed,
            OrderStatus::Preparing => &mut self.preparing,
            OrderStatus::Delivering => &mut self.delivering,
            OrderStatus::Completed => &mut self.completed,
            OrderStatus::Cancelled => &mut self.cancelled,
        };
        *slot += 1;
    }

    pub fn get(&self, status: OrderStatus) -> usize {
        match status {
            OrderStatus::New => self.new,
            OrderStatus::Confirmed => self.confirmed,
            OrderStatus::Preparing => self.preparing,
            OrderStatus::Delivering => self.delivering,
            OrderStatus::Completed => self.completed,
            OrderStatus::Cancelled => self.cancelled,
        }
    }
}

/// Completed orders and their revenue within one period
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats {
    pub orders: usize,
    pub revenue: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersStatistics {
    pub total_orders: usize,
    pub status_counts: StatusCounts,
    pub active_orders: usize,
    pub completed_orders: usize,
    pub cancelled_orders: usize,
    pub total_revenue: f64,
    pub average_order_value: f64,
    pub today: PeriodStats,
    pub this_week: PeriodStats,
    pub this_month: PeriodStats,
}

/// Revenue of one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub orders: usize,
    pub revenue: f64,
}

/// When a completed order earned its revenue
fn revenue_time(order: &Order) -> Option<DateTime<Utc>> {
    order
        .completed_at
        .as_deref()
        .and_then(shared::util::parse_iso)
        .or_else(|| shared::util::parse_iso(&order.created_at))
}

fn period(
    completed: &[(&Order, Option<DateTime<Utc>>)],
    range: (DateTime<Utc>, DateTime<Utc>),
) -> PeriodStats {
    let amounts: Vec<f64> = completed
        .iter()
        .filter(|(_, at)| at.is_some_and(|at| time::in_range(at, range)))
        .map(|(order, _)| order.total_amount)
        .collect();
    PeriodStats {
        orders: amounts.len(),
        revenue: money::sum(amounts),
    }
}

/// Fold the order collection into statistics as of `now`
pub fn compute(orders: &[Order], now: DateTime<Utc>) -> OrdersStatistics {
    let mut status_counts = StatusCounts::default();
    for order in orders {
        status_counts.bump(order.status);
    }

    let completed: Vec<(&Order, Option<DateTime<Utc>>)> = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Completed)
        .map(|o| (o, revenue_time(o)))
        .collect();

    let active_orders = OrderStatus::ACTIVE
        .iter()
        .map(|status| status_counts.get(*status))
        .sum();

    OrdersStatistics {
        total_orders: orders.len(),
        status_counts,
        active_orders,
        completed_orders: status_counts.completed,
        cancelled_orders: status_counts.cancelled,
        total_revenue: money::sum(completed.iter().map(|(o, _)| o.total_amount)),
        average_order_value: money::average(completed.iter().map(|(o, _)| o.total_amount)),
        today: period(&completed, time::day_range(now)),
        this_week: period(&completed, time::week_range(now)),
        this_month: period(&completed, time::month_range(now)),
    }
}

/// One bucket per day for the last `days` days, oldest first, today last
pub fn daily_revenue(orders: &[Order], days: u32, now: DateTime<Utc>) -> Vec<DailyRevenue> {
    let completed: Vec<(&Order, Option<DateTime<Utc>>)> = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Completed)
        .map(|o| (o, revenue_time(o)))
        .collect();

    let today = now.date_naive();
    (0..i64::from(days))
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            let start = time::day_start(date);
            let stats = period(&completed, (start, start + Duration::days(1)));
            DailyRevenue {
                date,
                orders: stats.orders,
                revenue: stats.revenue,
            }
        })
        .collect()
}
