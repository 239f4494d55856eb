//! Category Repository

use super::{
    BaseRepository, CATEGORIES_KEY, DishRepository, RepoError, RepoResult, Snapshot, merge_patch,
    resolve_id,
};
use crate::audit_log;
use crate::seed;
use shared::event::{CategoryChange, StoreEvent};
use shared::models::{Category, CategoryCreate, CategoryUpdate};

const ENTITY: &str = "category";

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    base: BaseRepository,
}

impl CategoryRepository {
    pub fn new(base: BaseRepository) -> Self {
        Self { base }
    }

    fn snapshot(&self) -> RepoResult<Snapshot<Vec<Category>>> {
        let seed_defaults = self.base.seed_defaults();
        self.base.load_or_seed(CATEGORIES_KEY, || {
            if seed_defaults {
                seed::categories(&shared::util::now_iso())
            } else {
                Vec::new()
            }
        })
    }

    /// All categories in stored order
    pub fn find_all(&self) -> RepoResult<Vec<Category>> {
        Ok(self.snapshot()?.data)
    }

    /// Active categories ordered by sort_order
    pub fn find_active(&self) -> RepoResult<Vec<Category>> {
        let mut categories: Vec<Category> = self
            .find_all()?
            .into_iter()
            .filter(|c| c.is_active)
            .collect();
        categories.sort_by_key(|c| c.sort_order);
        Ok(categories)
    }

    /// Find category by id
    pub fn find_by_id(&self, id: &str) -> RepoResult<Option<Category>> {
        Ok(self.find_all()?.into_iter().find(|c| c.id == id))
    }

    /// Create a new category
    pub fn create(&self, data: CategoryCreate) -> RepoResult<Category> {
        let Snapshot {
            data: mut categories,
            revision,
        } = self.snapshot()?;

        let id = resolve_id(data.id, |id| categories.iter().any(|c| c.id == id))?;
        let sort_order = data.sort_order.unwrap_or_else(|| {
            categories.iter().map(|c| c.sort_order).max().unwrap_or(0) + 1
        });
        let now = shared::util::now_iso();

        let category = Category {
            id,
            name: data.name,
            image: data.image.unwrap_or_default(),
            gradient: data.gradient.unwrap_or_default(),
            description: data.description,
            sort_order,
            is_active: data.is_active.unwrap_or(true),
            created_at: now.clone(),
            updated_at: now,
        };
        category.validate()?;

        categories.push(category.clone());
        self.base.save(CATEGORIES_KEY, &categories, revision)?;

        audit_log!(self.base.kv().origin(), "create", format!("category:{}", category.id));
        self.base
            .emit(StoreEvent::CategoryUpdated(CategoryChange::Created {
                category: category.clone(),
            }));
        Ok(category)
    }

    /// Update a category
    pub fn update(&self, id: &str, data: CategoryUpdate) -> RepoResult<Category> {
        let Snapshot {
            data: mut categories,
            revision,
        } = self.snapshot()?;

        let slot = categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| RepoError::not_found(ENTITY, id))?;

        let updated: Category = merge_patch(&*slot, &data, &["id", "createdAt"])?;
        updated.validate()?;
        *slot = updated.clone();

        self.base.save(CATEGORIES_KEY, &categories, revision)?;

        audit_log!(self.base.kv().origin(), "update", format!("category:{id}"));
        self.base
            .emit(StoreEvent::CategoryUpdated(CategoryChange::Updated {
                category: updated.clone(),
            }));
        Ok(updated)
    }

    /// Hard delete a category
    ///
    /// Fails while any dish still belongs to it; nothing cascades.
    pub fn delete(&self, id: &str) -> RepoResult<()> {
        let Snapshot {
            data: mut categories,
            revision,
        } = self.snapshot()?;

        if !categories.iter().any(|c| c.id == id) {
            return Err(RepoError::not_found(ENTITY, id));
        }

        let dependents = DishRepository::new(self.base.clone())
            .find_all()?
            .iter()
            .filter(|d| d.category_id == id)
            .count();
        if dependents > 0 {
            tracing::warn!(
                category_id = %id,
                dependents,
                "Refusing to delete category with dishes"
            );
            return Err(RepoError::ReferentialIntegrity {
                entity: ENTITY,
                id: id.to_string(),
                dependent_kind: "dishes",
                dependents,
            });
        }

        categories.retain(|c| c.id != id);
        self.base.save(CATEGORIES_KEY, &categories, revision)?;

        audit_log!(self.base.kv().origin(), "delete", format!("category:{id}"));
        self.base
            .emit(StoreEvent::CategoryUpdated(CategoryChange::Deleted {
                id: id.to_string(),
            }));
        Ok(())
    }

    /// Assign sort orders by position in `ids`
    ///
    /// Categories not listed keep their relative order after the listed ones.
    pub fn reorder(&self, ids: &[String]) -> RepoResult<Vec<Category>> {
        let Snapshot {
            data: mut categories,
            revision,
        } = self.snapshot()?;

        if let Some(missing) = ids.iter().find(|id| !categories.iter().any(|c| &c.id == *id)) {
            return Err(RepoError::not_found(ENTITY, missing.as_str()));
        }

        let now = shared::util::now_iso();
        let position = |id: &str| ids.iter().position(|x| x == id);

        let mut rest: Vec<&mut Category> = Vec::new();
        for category in categories.iter_mut() {
            match position(&category.id) {
                Some(index) => {
                    category.sort_order = index as i32 + 1;
                    category.updated_at = now.clone();
                }
                None => rest.push(category),
            }
        }
        rest.sort_by_key(|c| c.sort_order);
        for (offset, category) in rest.into_iter().enumerate() {
            category.sort_order = (ids.len() + offset) as i32 + 1;
            category.updated_at = now.clone();
        }

        self.base.save(CATEGORIES_KEY, &categories, revision)?;

        audit_log!(self.base.kv().origin(), "reorder", "categories", ids.join(","));
        self.base
            .emit(StoreEvent::CategoryUpdated(CategoryChange::Reordered {
                ids: ids.to_vec(),
            }));

        categories.sort_by_key(|c| c.sort_order);
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;
    use crate::storage::{KvStore, SyncChannel};
    use shared::models::LocalizedText;

    fn repo(seed: bool) -> CategoryRepository {
        let kv = KvStore::open_in_memory(SyncChannel::new()).unwrap();
        CategoryRepository::new(BaseRepository::new(kv, EventBus::new(), seed))
    }

    fn create(id: &str) -> CategoryCreate {
        CategoryCreate {
            id: Some(id.to_string()),
            name: LocalizedText::new("Pizza", "Пицца"),
            ..Default::default()
        }
    }

    #[test]
    fn test_seeded_on_first_read() {
        let repo = repo(true);
        assert!(!repo.find_all().unwrap().is_empty());
        assert!(repo.find_by_id("cat_pizza").unwrap().is_some());
    }

    #[test]
    fn test_empty_without_seed() {
        let repo = repo(false);
        assert!(repo.find_all().unwrap().is_empty());
        assert!(repo.find_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_create_defaults() {
        let repo = repo(false);
        let first = repo.create(create("c1")).unwrap();
        let second = repo.create(create("c2")).unwrap();
        assert_eq!(first.sort_order, 1);
        assert_eq!(second.sort_order, 2);
        assert!(second.is_active);
        assert_eq!(first.created_at, first.updated_at);
    }

    #[test]
    fn test_create_requires_both_names() {
        let repo = repo(false);
        let mut data = create("c1");
        data.name.secondary.clear();
        assert!(matches!(
            repo.create(data),
            Err(RepoError::Validation { ref field, .. }) if field == "name.secondary"
        ));
        assert!(repo.find_all().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let repo = repo(false);
        repo.create(create("c1")).unwrap();
        assert!(matches!(
            repo.create(create("c1")),
            Err(RepoError::AlreadyExists { ref id }) if id == "c1"
        ));
    }

    #[test]
    fn test_update_missing() {
        let repo = repo(false);
        assert!(matches!(
            repo.update("nope", CategoryUpdate::default()),
            Err(RepoError::NotFound { entity: "category", .. })
        ));
    }

    #[test]
    fn test_update_merges() {
        let repo = repo(false);
        repo.create(create("c1")).unwrap();
        let updated = repo
            .update(
                "c1",
                CategoryUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.id, "c1");
        assert!(!updated.is_active);
        assert_eq!(updated.name.primary, "Pizza");
        assert!(repo.find_active().unwrap().is_empty());
    }

    #[test]
    fn test_reorder() {
        let repo = repo(false);
        for id in ["a", "b", "c"] {
            repo.create(create(id)).unwrap();
        }
        let ordered = repo.reorder(&["c".to_string(), "a".to_string()]).unwrap();
        let ids: Vec<&str> = ordered.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(ordered[2].sort_order, 3);

        assert!(matches!(
            repo.reorder(&["zzz".to_string()]),
            Err(RepoError::NotFound { .. })
        ));
    }
}
