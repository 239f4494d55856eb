use crate::bus::EventBus;
use crate::core::StoreConfig;
use crate::repository::{
    BaseRepository, CATEGORIES_KEY, CartSettingsRepository, CategoryRepository,
    ContactRepository, DISHES_KEY, DishRepository, ORDERS_KEY, OrderRepository,
    RESTAURANT_SETTINGS_KEY, RepoError, RepoResult, RestaurantSettingsRepository,
    cart_settings_key,
};
use crate::storage::{KvStore, StorageResult, SyncChannel};
use serde::Serialize;
use shared::models::{Order, OrderCreate};
use shared::order::OrderStatus;

/// 店面状态 - 一个标签页持有的全部句柄
///
/// 显式构造，没有全局单例。克隆是浅拷贝，共享同一个标签页身份；
/// 另开一个标签页用 [`StorefrontState::new_tab`]。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | kv | 本标签页的存储句柄 |
/// | bus | 本标签页的事件总线 |
/// | categories / dishes / orders / contacts | 菜单与订单仓库 |
/// | cart_settings / restaurant | 设置仓库 |
#[derive(Clone, Debug)]
pub struct StorefrontState {
    pub config: StoreConfig,
    pub kv: KvStore,
    pub bus: EventBus,
    pub categories: CategoryRepository,
    pub dishes: DishRepository,
    pub orders: OrderRepository,
    pub contacts: ContactRepository,
    pub cart_settings: CartSettingsRepository,
    pub restaurant: RestaurantSettingsRepository,
    base: BaseRepository,
}

/// Counts shown after start-up and by the `summary` command
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
    pub restaurant_id: String,
    pub restaurant_name: String,
    pub categories: usize,
    pub active_categories: usize,
    pub dishes: usize,
    pub available_dishes: usize,
    pub orders: usize,
    pub active_orders: usize,
    pub contacts: usize,
}

impl StorefrontState {
    /// 打开存储并构造第一个标签页
    ///
    /// 按配置选择内存后端或 `work_dir/db_file`，工作目录不存在时创建。
    pub fn open(config: &StoreConfig) -> StorageResult<Self> {
        let sync = SyncChannel::with_capacity(config.sync_channel_capacity);
        let kv = if config.in_memory {
            KvStore::open_in_memory(sync)?
        } else {
            std::fs::create_dir_all(&config.work_dir)?;
            let path = config.db_path();
            tracing::info!(path = %path.display(), "Opening store");
            KvStore::open(path, sync)?
        };
        Ok(Self::from_store(config.clone(), kv))
    }

    /// Wire repositories and a fresh event bus around an existing handle
    pub fn from_store(config: StoreConfig, kv: KvStore) -> Self {
        let bus = EventBus::with_capacity(config.event_channel_capacity);
        let base = BaseRepository::new(kv.clone(), bus.clone(), config.seed_defaults);

        Self {
            categories: CategoryRepository::new(base.clone()),
            dishes: DishRepository::new(base.clone()),
            orders: OrderRepository::new(base.clone()),
            contacts: ContactRepository::new(base.clone()),
            cart_settings: CartSettingsRepository::new(base.clone()),
            restaurant: RestaurantSettingsRepository::new(
                base.clone(),
                config.restaurant_id.clone(),
            ),
            base,
            config,
            kv,
            bus,
        }
    }

    /// Another tab on the same store: shared data and sync channel, own
    /// origin and own event bus
    pub fn new_tab(&self) -> Self {
        Self::from_store(self.config.clone(), self.kv.new_tab())
    }

    pub fn restaurant_id(&self) -> &str {
        &self.config.restaurant_id
    }

    fn collection_keys(&self) -> [String; 5] {
        [
            CATEGORIES_KEY.to_string(),
            DISHES_KEY.to_string(),
            ORDERS_KEY.to_string(),
            RESTAURANT_SETTINGS_KEY.to_string(),
            cart_settings_key(self.restaurant_id()),
        ]
    }

    /// 启动初始化
    ///
    /// 1. 旧格式 (无版本信封) 的集合改写为当前格式
    /// 2. 缺失的集合写入默认值
    ///
    /// 返回被改写的 key。
    pub fn initialize(&self) -> RepoResult<Vec<String>> {
        let mut upgraded = Vec::new();
        for key in self.collection_keys() {
            if self.base.upgrade(&key)? {
                upgraded.push(key);
            }
        }

        self.categories.find_all()?;
        self.dishes.find_all()?;
        self.orders.find_all()?;
        self.cart_settings.get(self.restaurant_id())?;
        self.restaurant.get()?;

        tracing::info!(
            restaurant_id = %self.restaurant_id(),
            upgraded = upgraded.len(),
            "Store initialized"
        );
        Ok(upgraded)
    }

    /// 下单
    ///
    /// 先按购物车设置检查 (`requirePhone`, `requireAddress`)；
    /// `autoConfirmOrders` 打开且调用方未指定状态时，订单直接为 `confirmed`。
    pub fn place_order(&self, restaurant_id: &str, mut data: OrderCreate) -> RepoResult<Order> {
        let settings = self.cart_settings.get(restaurant_id)?;

        if settings.settings.require_phone && data.customer_phone.trim().is_empty() {
            return Err(RepoError::validation("customerPhone", "phone is required"));
        }
        if settings.settings.require_address
            && data
                .customer_address
                .as_deref()
                .is_none_or(|a| a.trim().is_empty())
        {
            return Err(RepoError::validation(
                "customerAddress",
                "address is required",
            ));
        }
        if settings.settings.auto_confirm_orders && data.status.is_none() {
            data.status = Some(OrderStatus::Confirmed);
        }

        self.orders.create(data)
    }

    pub fn summary(&self) -> RepoResult<StoreSummary> {
        let orders = self.orders.find_all()?;
        Ok(StoreSummary {
            restaurant_id: self.restaurant_id().to_string(),
            restaurant_name: self.restaurant.get()?.name.primary,
            categories: self.categories.find_all()?.len(),
            active_categories: self.categories.find_active()?.len(),
            dishes: self.dishes.find_all()?.len(),
            available_dishes: self.dishes.find_available()?.len(),
            active_orders: orders.iter().filter(|o| o.status.is_active()).count(),
            orders: orders.len(),
            contacts: crate::repository::contact::fold_contacts(&orders).len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{CartSettingsUpdate, CheckoutOptionsUpdate, OrderItem};

    fn state() -> StorefrontState {
        StorefrontState::open(&StoreConfig::in_memory("r1", true)).unwrap()
    }

    fn order() -> OrderCreate {
        OrderCreate {
            customer_name: "Ann".to_string(),
            customer_phone: "+100".to_string(),
            items: vec![OrderItem {
                dish_id: "dish_lemonade".to_string(),
                dish_name: "Lemonade".to_string(),
                dish_name_secondary: "Лимонад".to_string(),
                unit_price: 3.0,
                quantity: 2,
                line_total: 6.0,
            }],
            subtotal: 6.0,
            total_amount: 6.0,
            ..Default::default()
        }
    }

    fn switches(state: &StorefrontState, options: CheckoutOptionsUpdate) {
        state
            .cart_settings
            .update(
                "r1",
                CartSettingsUpdate {
                    settings: Some(options),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    #[test]
    fn test_initialize_seeds_everything() {
        let state = state();
        assert!(state.initialize().unwrap().is_empty());
        for key in state.collection_keys() {
            assert!(state.kv.contains_key(&key).unwrap(), "{key}");
        }
        let summary = state.summary().unwrap();
        assert_eq!(summary.categories, 4);
        assert_eq!(summary.dishes, 5);
        assert_eq!(summary.orders, 0);
    }

    #[test]
    fn test_initialize_upgrades_legacy_orders() {
        let state = state();
        state.kv.write_raw(ORDERS_KEY, "[]", None).unwrap();
        assert_eq!(state.initialize().unwrap(), vec![ORDERS_KEY.to_string()]);
        assert!(state.initialize().unwrap().is_empty());
    }

    #[test]
    fn test_require_phone_follows_setting() {
        let state = state();
        let mut anonymous = order();
        anonymous.customer_phone = "  ".to_string();
        assert!(matches!(
            state.place_order("r1", anonymous.clone()),
            Err(RepoError::Validation { ref field, .. }) if field == "customerPhone"
        ));

        switches(
            &state,
            CheckoutOptionsUpdate {
                require_phone: Some(false),
                ..Default::default()
            },
        );
        let placed = state.place_order("r1", anonymous).unwrap();
        assert_eq!(state.orders.find_by_id(&placed.id).unwrap().unwrap(), placed);
        assert!(state.contacts.find_all().unwrap().is_empty());
        assert!(state.orders.find_by_phone(" ").unwrap().is_empty());
    }

    #[test]
    fn test_require_address() {
        let state = state();
        switches(
            &state,
            CheckoutOptionsUpdate {
                require_address: Some(true),
                ..Default::default()
            },
        );
        assert!(matches!(
            state.place_order("r1", order()),
            Err(RepoError::Validation { ref field, .. }) if field == "customerAddress"
        ));

        let mut with_address = order();
        with_address.customer_address = Some("Elm st 1".to_string());
        assert!(state.place_order("r1", with_address).is_ok());
    }

    #[test]
    fn test_auto_confirm() {
        let state = state();
        assert_eq!(state.place_order("r1", order()).unwrap().status, OrderStatus::New);

        switches(
            &state,
            CheckoutOptionsUpdate {
                auto_confirm_orders: Some(true),
                ..Default::default()
            },
        );
        assert_eq!(
            state.place_order("r1", order()).unwrap().status,
            OrderStatus::Confirmed
        );

        let mut explicit = order();
        explicit.status = Some(OrderStatus::New);
        assert_eq!(state.place_order("r1", explicit).unwrap().status, OrderStatus::New);
    }

    #[test]
    fn test_new_tab_has_its_own_origin_and_bus() {
        let a = state();
        let b = a.new_tab();
        assert_ne!(a.kv.origin(), b.kv.origin());
        a.categories.find_all().unwrap();
        assert_eq!(b.categories.find_all().unwrap().len(), 4);
    }
}
