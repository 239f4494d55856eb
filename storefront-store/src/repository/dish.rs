//! Dish Repository

use super::{
    BaseRepository, CategoryRepository, DISHES_KEY, RepoError, RepoResult, Snapshot, merge_patch,
    resolve_id,
};
use crate::audit_log;
use crate::seed;
use shared::event::StoreEvent;
use shared::models::{Dish, DishCreate, DishUpdate};
use std::collections::HashSet;

const ENTITY: &str = "dish";

#[derive(Debug, Clone)]
pub struct DishRepository {
    base: BaseRepository,
}

impl DishRepository {
    pub fn new(base: BaseRepository) -> Self {
        Self { base }
    }

    fn snapshot(&self) -> RepoResult<Snapshot<Vec<Dish>>> {
        let seed_defaults = self.base.seed_defaults();
        self.base.load_or_seed(DISHES_KEY, || {
            if seed_defaults {
                seed::dishes(&shared::util::now_iso())
            } else {
                Vec::new()
            }
        })
    }

    fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.base.clone())
    }

    /// Category reference must resolve
    fn require_category(&self, category_id: &str) -> RepoResult<()> {
        if self.categories().find_by_id(category_id)?.is_none() {
            return Err(RepoError::validation(
                "categoryId",
                format!("category '{category_id}' does not exist"),
            ));
        }
        Ok(())
    }

    /// All dishes in stored order
    pub fn find_all(&self) -> RepoResult<Vec<Dish>> {
        Ok(self.snapshot()?.data)
    }

    pub fn find_by_id(&self, id: &str) -> RepoResult<Option<Dish>> {
        Ok(self.find_all()?.into_iter().find(|d| d.id == id))
    }

    /// Dishes of one category ordered by sort_order
    pub fn find_by_category(&self, category_id: &str) -> RepoResult<Vec<Dish>> {
        let mut dishes: Vec<Dish> = self
            .find_all()?
            .into_iter()
            .filter(|d| d.category_id == category_id)
            .collect();
        dishes.sort_by_key(|d| d.sort_order);
        Ok(dishes)
    }

    /// What a customer can order right now
    ///
    /// Active and available dishes whose category is active, ordered by
    /// sort_order.
    pub fn find_available(&self) -> RepoResult<Vec<Dish>> {
        let active: HashSet<String> = self
            .categories()
            .find_active()?
            .into_iter()
            .map(|c| c.id)
            .collect();

        let mut dishes: Vec<Dish> = self
            .find_all()?
            .into_iter()
            .filter(|d| d.is_orderable() && active.contains(&d.category_id))
            .collect();
        dishes.sort_by_key(|d| d.sort_order);
        Ok(dishes)
    }

    pub fn find_popular(&self) -> RepoResult<Vec<Dish>> {
        let mut dishes: Vec<Dish> = self
            .find_all()?
            .into_iter()
            .filter(|d| d.is_popular && d.is_orderable())
            .collect();
        dishes.sort_by_key(|d| d.sort_order);
        Ok(dishes)
    }

    /// Case-insensitive substring search over both name locales
    ///
    /// A blank query matches nothing.
    pub fn search(&self, query: &str) -> RepoResult<Vec<Dish>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|d| d.name.matches(&needle))
            .collect())
    }

    /// Create a new dish
    pub fn create(&self, data: DishCreate) -> RepoResult<Dish> {
        let Snapshot {
            data: mut dishes,
            revision,
        } = self.snapshot()?;

        let id = resolve_id(data.id, |id| dishes.iter().any(|d| d.id == id))?;
        let sort_order = data.sort_order.unwrap_or_else(|| {
            dishes
                .iter()
                .filter(|d| d.category_id == data.category_id)
                .map(|d| d.sort_order)
                .max()
                .unwrap_or(0)
                + 1
        });
        let now = shared::util::now_iso();

        let dish = Dish {
            id,
            name: data.name,
            description: data.description,
            price: data.price,
            image: data.image.unwrap_or_default(),
            category_id: data.category_id,
            is_active: data.is_active.unwrap_or(true),
            is_available: data.is_available.unwrap_or(true),
            is_popular: data.is_popular.unwrap_or(false),
            preparation_time: data.preparation_time.unwrap_or(0),
            calories: data.calories,
            weight: data.weight,
            sort_order,
            created_at: now.clone(),
            updated_at: now,
        };
        dish.validate()?;
        self.require_category(&dish.category_id)?;

        dishes.push(dish.clone());
        self.base.save(DISHES_KEY, &dishes, revision)?;

        audit_log!(self.base.kv().origin(), "create", format!("dish:{}", dish.id));
        self.base.emit(StoreEvent::DishCreated(dish.clone()));
        Ok(dish)
    }

    /// Update a dish
    ///
    /// A changed category must exist.
    pub fn update(&self, id: &str, data: DishUpdate) -> RepoResult<Dish> {
        data.validate()?;
        let Snapshot {
            data: mut dishes,
            revision,
        } = self.snapshot()?;

        let slot = dishes
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| RepoError::not_found(ENTITY, id))?;

        let updated: Dish = merge_patch(&*slot, &data, &["id", "createdAt"])?;
        updated.validate()?;
        if updated.category_id != slot.category_id {
            self.require_category(&updated.category_id)?;
        }
        *slot = updated.clone();

        self.base.save(DISHES_KEY, &dishes, revision)?;

        audit_log!(self.base.kv().origin(), "update", format!("dish:{id}"));
        self.base.emit(StoreEvent::DishUpdated(updated.clone()));
        Ok(updated)
    }

    /// Toggle whether the kitchen can currently make a dish
    pub fn set_availability(&self, id: &str, available: bool) -> RepoResult<Dish> {
        self.update(
            id,
            DishUpdate {
                is_available: Some(available),
                ..Default::default()
            },
        )
    }

    /// Hard delete a dish
    pub fn delete(&self, id: &str) -> RepoResult<()> {
        let Snapshot {
            data: mut dishes,
            revision,
        } = self.snapshot()?;

        let before = dishes.len();
        dishes.retain(|d| d.id != id);
        if dishes.len() == before {
            return Err(RepoError::not_found(ENTITY, id));
        }

        self.base.save(DISHES_KEY, &dishes, revision)?;

        audit_log!(self.base.kv().origin(), "delete", format!("dish:{id}"));
        self.base.emit(StoreEvent::DishDeleted { id: id.to_string() });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{Channel, EventBus};
    use crate::storage::{KvStore, SyncChannel};
    use shared::event::EventType;
    use shared::models::{CategoryCreate, CategoryUpdate, LocalizedText};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn base(seed: bool) -> BaseRepository {
        let kv = KvStore::open_in_memory(SyncChannel::new()).unwrap();
        BaseRepository::new(kv, EventBus::new(), seed)
    }

    fn category(base: &BaseRepository, id: &str) {
        CategoryRepository::new(base.clone())
            .create(CategoryCreate {
                id: Some(id.to_string()),
                name: LocalizedText::new("Pizza", "Пицца"),
                ..Default::default()
            })
            .unwrap();
    }

    fn create(id: &str, category_id: &str) -> DishCreate {
        DishCreate {
            id: Some(id.to_string()),
            name: LocalizedText::new("Margherita", "Маргарита"),
            price: 9.5,
            category_id: category_id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_seeded_dishes_reference_seeded_categories() {
        let base = base(true);
        let repo = DishRepository::new(base.clone());
        let categories = CategoryRepository::new(base);
        for dish in repo.find_all().unwrap() {
            assert!(categories.find_by_id(&dish.category_id).unwrap().is_some());
        }
    }

    #[test]
    fn test_create_requires_existing_category() {
        let base = base(false);
        let repo = DishRepository::new(base);
        assert!(matches!(
            repo.create(create("d1", "ghost")),
            Err(RepoError::Validation { ref field, .. }) if field == "categoryId"
        ));
        assert!(repo.find_all().unwrap().is_empty());
    }

    #[test]
    fn test_create_emits_dish_created() {
        let base = base(false);
        category(&base, "c1");
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        base.bus()
            .add_event_listener(Channel::Event(EventType::DishCreated), move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let repo = DishRepository::new(base);
        let dish = repo.create(create("d1", "c1")).unwrap();
        assert_eq!(dish.sort_order, 1);
        assert!(dish.is_active && dish.is_available && !dish.is_popular);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sort_order_per_category() {
        let base = base(false);
        category(&base, "c1");
        category(&base, "c2");
        let repo = DishRepository::new(base);
        repo.create(create("d1", "c1")).unwrap();
        repo.create(create("d2", "c1")).unwrap();
        let other = repo.create(create("d3", "c2")).unwrap();
        assert_eq!(other.sort_order, 1);
        let ids: Vec<String> = repo
            .find_by_category("c1")
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["d1", "d2"]);
    }

    #[test]
    fn test_update_to_missing_category() {
        let base = base(false);
        category(&base, "c1");
        let repo = DishRepository::new(base);
        repo.create(create("d1", "c1")).unwrap();

        let patch = DishUpdate {
            category_id: Some("ghost".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            repo.update("d1", patch),
            Err(RepoError::Validation { ref field, .. }) if field == "categoryId"
        ));
        assert_eq!(repo.find_by_id("d1").unwrap().unwrap().category_id, "c1");
    }

    #[test]
    fn test_update_price_keeps_identity() {
        let base = base(false);
        category(&base, "c1");
        let repo = DishRepository::new(base);
        let created = repo.create(create("d1", "c1")).unwrap();

        let updated = repo
            .update(
                "d1",
                DishUpdate {
                    price: Some(12.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.price, 12.0);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.name, created.name);
    }

    #[test]
    fn test_non_finite_price_patch_rejected() {
        let base = base(false);
        category(&base, "c1");
        let repo = DishRepository::new(base);
        repo.create(create("d1", "c1")).unwrap();

        for price in [f64::NAN, f64::INFINITY] {
            let patch = DishUpdate {
                price: Some(price),
                ..Default::default()
            };
            assert!(matches!(
                repo.update("d1", patch),
                Err(RepoError::Validation { ref field, .. }) if field == "price"
            ));
        }
        assert_eq!(repo.find_by_id("d1").unwrap().unwrap().price, 9.5);
    }

    #[test]
    fn test_clear_optional_fields() {
        let base = base(false);
        category(&base, "c1");
        let repo = DishRepository::new(base);
        let mut data = create("d1", "c1");
        data.calories = Some(500);
        data.weight = Some(300);
        repo.create(data).unwrap();

        let updated = repo
            .update(
                "d1",
                DishUpdate {
                    calories: Some(None),
                    weight: Some(Some(320)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.calories, None);
        assert_eq!(updated.weight, Some(320));

        // Unset fields are left alone
        let updated = repo.update("d1", DishUpdate::default()).unwrap();
        assert_eq!(updated.weight, Some(320));
    }

    #[test]
    fn test_created_dish_reads_back_unchanged() {
        let base = base(false);
        category(&base, "c1");
        let repo = DishRepository::new(base);
        let mut data = create("d1", "c1");
        data.description = LocalizedText::new("Tomato, basil", "Томат, базилик");
        data.is_popular = Some(true);
        data.preparation_time = Some(12);
        data.calories = Some(700);

        let created = repo.create(data.clone()).unwrap();
        let stored = repo.find_by_id(&created.id).unwrap().unwrap();
        assert_eq!(stored, created);
        assert_eq!(stored.name, data.name);
        assert_eq!(stored.description, data.description);
        assert_eq!(stored.price, data.price);
        assert_eq!(stored.category_id, data.category_id);
        assert!(stored.is_popular);
        assert_eq!(stored.preparation_time, 12);
        assert_eq!(stored.calories, Some(700));
        assert_eq!(stored.weight, None);
    }

    #[test]
    fn test_negative_price_rejected() {
        let base = base(false);
        category(&base, "c1");
        let repo = DishRepository::new(base);
        let mut data = create("d1", "c1");
        data.price = -1.0;
        assert!(matches!(
            repo.create(data),
            Err(RepoError::Validation { ref field, .. }) if field == "price"
        ));
    }

    #[test]
    fn test_available_hides_inactive_category() {
        let base = base(false);
        category(&base, "c1");
        category(&base, "c2");
        let repo = DishRepository::new(base.clone());
        repo.create(create("d1", "c1")).unwrap();
        repo.create(create("d2", "c2")).unwrap();
        repo.set_availability("d1", false).unwrap();
        assert_eq!(repo.find_available().unwrap().len(), 1);

        CategoryRepository::new(base)
            .update(
                "c2",
                CategoryUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(repo.find_available().unwrap().is_empty());
    }

    #[test]
    fn test_search() {
        let base = base(true);
        let repo = DishRepository::new(base);
        let found = repo.search("MARG").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "dish_margherita");
        assert_eq!(repo.search("борщ").unwrap().len(), 1);
        assert!(repo.search("  ").unwrap().is_empty());
    }

    #[test]
    fn test_delete() {
        let base = base(false);
        category(&base, "c1");
        let repo = DishRepository::new(base);
        repo.create(create("d1", "c1")).unwrap();
        repo.delete("d1").unwrap();
        assert!(repo.find_by_id("d1").unwrap().is_none());
        assert!(matches!(
            repo.delete("d1"),
            Err(RepoError::NotFound { entity: "dish", .. })
        ));
    }
}
