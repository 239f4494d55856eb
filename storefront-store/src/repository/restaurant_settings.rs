//! Restaurant Settings Repository

use super::{BaseRepository, RESTAURANT_SETTINGS_KEY, RepoResult, Snapshot, merge_patch};
use crate::audit_log;
use shared::event::StoreEvent;
use shared::models::{RestaurantSettings, RestaurantSettingsUpdate};

/// Singleton restaurant profile
#[derive(Debug, Clone)]
pub struct RestaurantSettingsRepository {
    base: BaseRepository,
    /// Used when the record has to be created
    restaurant_id: String,
}

impl RestaurantSettingsRepository {
    pub fn new(base: BaseRepository, restaurant_id: impl Into<String>) -> Self {
        Self {
            base,
            restaurant_id: restaurant_id.into(),
        }
    }

    fn snapshot(&self) -> RepoResult<Snapshot<RestaurantSettings>> {
        self.base.load_or_seed(RESTAURANT_SETTINGS_KEY, || {
            RestaurantSettings::default_for(&self.restaurant_id, &shared::util::now_iso())
        })
    }

    pub fn get(&self) -> RepoResult<RestaurantSettings> {
        Ok(self.snapshot()?.data)
    }

    /// Update the profile; name needs both locales and at least one phone must remain
    pub fn update(&self, data: RestaurantSettingsUpdate) -> RepoResult<RestaurantSettings> {
        let Snapshot {
            data: current,
            revision,
        } = self.snapshot()?;

        let updated: RestaurantSettings =
            merge_patch(&current, &data, &["restaurantId", "createdAt"])?;
        updated.validate()?;
        self.base.save(RESTAURANT_SETTINGS_KEY, &updated, revision)?;

        audit_log!(
            self.base.kv().origin(),
            "update",
            format!("restaurant:{}", updated.restaurant_id)
        );
        self.base.emit(StoreEvent::RestaurantUpdated(updated.clone()));
        Ok(updated)
    }
}
