//! Order Repository
//!
//! Orders are stored newest first. After creation only the status moves;
//! everything else on the record is frozen.

use super::{BaseRepository, ORDERS_KEY, RepoError, RepoResult, Snapshot, resolve_id};
use crate::audit_log;
use crate::statistics::{self, DailyRevenue, OrdersStatistics};
use chrono::{DateTime, Utc};
use shared::event::{OrderChange, StoreEvent};
use shared::models::{Order, OrderCreate};
use shared::order::OrderStatus;

const ENTITY: &str = "order";

#[derive(Debug, Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(base: BaseRepository) -> Self {
        Self { base }
    }

    fn snapshot(&self) -> RepoResult<Snapshot<Vec<Order>>> {
        self.base.load_or_seed(ORDERS_KEY, Vec::new)
    }

    /// All orders, newest first
    pub fn find_all(&self) -> RepoResult<Vec<Order>> {
        Ok(self.snapshot()?.data)
    }

    pub fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        Ok(self.find_all()?.into_iter().find(|o| o.id == id))
    }

    pub fn find_by_status(&self, status: OrderStatus) -> RepoResult<Vec<Order>> {
        self.filter(|o| o.status == status)
    }

    /// Orders still being worked on
    pub fn find_active(&self) -> RepoResult<Vec<Order>> {
        self.filter(|o| o.status.is_active())
    }

    /// Completed and cancelled orders
    pub fn find_history(&self) -> RepoResult<Vec<Order>> {
        self.filter(|o| o.status.is_terminal())
    }

    /// Orders created in `[from, to)`
    pub fn find_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> RepoResult<Vec<Order>> {
        self.filter(|o| {
            shared::util::parse_iso(&o.created_at).is_some_and(|at| at >= from && at < to)
        })
    }

    /// Orders placed from one phone number (compared trimmed)
    pub fn find_by_phone(&self, phone: &str) -> RepoResult<Vec<Order>> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Ok(Vec::new());
        }
        self.filter(|o| o.customer_phone.trim() == phone)
    }

    fn filter(&self, keep: impl Fn(&Order) -> bool) -> RepoResult<Vec<Order>> {
        Ok(self.find_all()?.into_iter().filter(|o| keep(o)).collect())
    }

    /// Record a new order
    ///
    /// Amounts are stored as given. An order created directly as
    /// `completed` gets its `completedAt` stamped.
    pub fn create(&self, data: OrderCreate) -> RepoResult<Order> {
        data.validate()?;

        let Snapshot {
            data: mut orders,
            revision,
        } = self.snapshot()?;

        let id = resolve_id(data.id, |id| orders.iter().any(|o| o.id == id))?;
        let status = data.status.unwrap_or_default();
        let now = shared::util::now_iso();

        let order = Order {
            id,
            customer_name: data.customer_name,
            customer_phone: data.customer_phone,
            customer_address: data.customer_address,
            items: data.items,
            subtotal: data.subtotal,
            delivery_fee: data.delivery_fee,
            total_amount: data.total_amount,
            status,
            notes: data.notes,
            created_at: now.clone(),
            updated_at: now.clone(),
            completed_at: (status == OrderStatus::Completed).then_some(now),
        };

        orders.insert(0, order.clone());
        self.base.save(ORDERS_KEY, &orders, revision)?;

        tracing::info!(
            order_id = %order.id,
            status = %order.status,
            total = order.total_amount,
            items = order.item_count(),
            "Order created"
        );
        self.base.emit(StoreEvent::OrderCreated(order.clone()));
        Ok(order)
    }

    /// Move an order to a new status
    ///
    /// Backward moves, repeats and anything out of `completed` or
    /// `cancelled` are refused with [`RepoError::InvalidTransition`].
    pub fn update_status(&self, id: &str, status: OrderStatus) -> RepoResult<Order> {
        let Snapshot {
            data: mut orders,
            revision,
        } = self.snapshot()?;

        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| RepoError::not_found(ENTITY, id))?;

        let from = order.status;
        from.check_transition(status).map_err(|e| {
            tracing::warn!(order_id = %id, error = %e, "Status change refused");
            RepoError::InvalidTransition {
                id: id.to_string(),
                from,
                to: status,
            }
        })?;

        let now = shared::util::now_iso();
        order.status = status;
        order.updated_at = now.clone();
        if status == OrderStatus::Completed {
            order.completed_at = Some(now);
        }
        let updated = order.clone();

        self.base.save(ORDERS_KEY, &orders, revision)?;

        audit_log!(
            self.base.kv().origin(),
            "update_status",
            format!("order:{id}"),
            format!("{from} -> {status}")
        );
        self.base.emit(StoreEvent::OrderUpdated(OrderChange::StatusChanged {
            order: updated.clone(),
            from,
        }));
        Ok(updated)
    }

    /// Administrative removal
    pub fn delete(&self, id: &str) -> RepoResult<()> {
        let Snapshot {
            data: mut orders,
            revision,
        } = self.snapshot()?;

        let before = orders.len();
        orders.retain(|o| o.id != id);
        if orders.len() == before {
            return Err(RepoError::not_found(ENTITY, id));
        }

        self.base.save(ORDERS_KEY, &orders, revision)?;

        audit_log!(self.base.kv().origin(), "delete", format!("order:{id}"));
        self.base.emit(StoreEvent::OrderUpdated(OrderChange::Deleted {
            id: id.to_string(),
        }));
        Ok(())
    }

    /// Statistics as of now
    pub fn statistics(&self) -> RepoResult<OrdersStatistics> {
        Ok(statistics::compute(&self.find_all()?, Utc::now()))
    }

    /// Revenue for each of the last `days` days, today last
    pub fn daily_revenue(&self, days: u32) -> RepoResult<Vec<DailyRevenue>> {
        Ok(statistics::daily_revenue(&self.find_all()?, days, Utc::now()))
    }
}
