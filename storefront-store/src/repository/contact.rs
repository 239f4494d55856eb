//! Contact Repository
//!
//! Contacts are a roll-up of the order collection keyed by phone number and
//! are rebuilt on every read.

use super::{BaseRepository, OrderRepository, RepoResult};
use crate::utils::money;
use shared::models::{Contact, Order};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ContactRepository {
    orders: OrderRepository,
}

impl ContactRepository {
    pub fn new(base: BaseRepository) -> Self {
        Self {
            orders: OrderRepository::new(base),
        }
    }

    /// Every customer, most recent order first
    pub fn find_all(&self) -> RepoResult<Vec<Contact>> {
        Ok(fold_contacts(&self.orders.find_all()?))
    }

    pub fn find_by_phone(&self, phone: &str) -> RepoResult<Option<Contact>> {
        let phone = phone.trim();
        Ok(fold_contacts(&self.orders.find_by_phone(phone)?)
            .into_iter()
            .find(|c| c.phone == phone))
    }
}

/// Group orders by trimmed phone number
///
/// Orders of every status count toward `totalOrders` and `totalAmount`.
pub fn fold_contacts(orders: &[Order]) -> Vec<Contact> {
    let mut groups: HashMap<&str, Vec<&Order>> = HashMap::new();
    for order in orders {
        let phone = order.customer_phone.trim();
        if phone.is_empty() {
            continue;
        }
        groups.entry(phone).or_default().push(order);
    }

    let mut contacts: Vec<Contact> = groups
        .into_iter()
        .filter_map(|(phone, mut group)| {
            // ISO-8601 UTC strings order chronologically
            group.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            let first = group.first()?;
            let last = group.last()?;
            Some(Contact {
                phone: phone.to_string(),
                name: last.customer_name.trim().to_string(),
                address: group
                    .iter()
                    .rev()
                    .find_map(|o| o.address())
                    .map(str::to_string),
                total_orders: group.len() as u32,
                total_amount: money::sum(group.iter().map(|o| o.total_amount)),
                first_order_date: first.created_at.clone(),
                last_order_date: last.created_at.clone(),
            })
        })
        .collect();

    contacts.sort_by(|a, b| {
        b.last_order_date
            .cmp(&a.last_order_date)
            .then_with(|| a.phone.cmp(&b.phone))
    });
    contacts
}
