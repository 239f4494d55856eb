//! Cart Settings Repository
//!
//! One record per restaurant under `cart_settings_<restaurantId>`. A
//! restaurant that was never configured reads as the default record.

use super::{
    BaseRepository, RepoError, RepoResult, Snapshot, cart_settings_key, merge_patch, resolve_id,
};
use crate::audit_log;
use shared::event::StoreEvent;
use shared::models::{
    CartSettings, CartSettingsUpdate, DeliveryZone, DeliveryZoneCreate, DeliveryZoneUpdate,
};

const ZONE: &str = "delivery_zone";

#[derive(Debug, Clone)]
pub struct CartSettingsRepository {
    base: BaseRepository,
}

impl CartSettingsRepository {
    pub fn new(base: BaseRepository) -> Self {
        Self { base }
    }

    fn snapshot(&self, restaurant_id: &str) -> RepoResult<Snapshot<CartSettings>> {
        if restaurant_id.trim().is_empty() {
            return Err(RepoError::validation("restaurantId", "is required"));
        }
        self.base.load_or_seed(&cart_settings_key(restaurant_id), || {
            CartSettings::default_for(restaurant_id, &shared::util::now_iso())
        })
    }

    fn save(&self, settings: &CartSettings, revision: u64) -> RepoResult<()> {
        settings.validate()?;
        self.base.save(&cart_settings_key(&settings.restaurant_id), settings, revision)?;
        self.base.emit(StoreEvent::CartSettingsUpdated(settings.clone()));
        Ok(())
    }

    pub fn get(&self, restaurant_id: &str) -> RepoResult<CartSettings> {
        Ok(self.snapshot(restaurant_id)?.data)
    }

    /// Update settings fields; zones are left alone
    pub fn update(
        &self,
        restaurant_id: &str,
        data: CartSettingsUpdate,
    ) -> RepoResult<CartSettings> {
        data.validate()?;
        let Snapshot {
            data: current,
            revision,
        } = self.snapshot(restaurant_id)?;

        let updated: CartSettings =
            merge_patch(&current, &data, &["restaurantId", "createdAt", "deliveryZones"])?;
        self.save(&updated, revision)?;

        audit_log!(
            self.base.kv().origin(),
            "update",
            format!("cart_settings:{restaurant_id}")
        );
        Ok(updated)
    }

    pub fn add_zone(
        &self,
        restaurant_id: &str,
        data: DeliveryZoneCreate,
    ) -> RepoResult<DeliveryZone> {
        let Snapshot {
            data: mut settings,
            revision,
        } = self.snapshot(restaurant_id)?;

        let id = resolve_id(data.id, |id| settings.zone(id).is_some())?;
        let now = shared::util::now_iso();
        let zone = DeliveryZone {
            id,
            name: data.name,
            price: data.price,
            is_active: data.is_active.unwrap_or(true),
            min_order_amount: data.min_order_amount,
            estimated_time: data.estimated_time,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        settings.delivery_zones.push(zone.clone());
        settings.updated_at = now;
        self.save(&settings, revision)?;

        audit_log!(
            self.base.kv().origin(),
            "create",
            format!("delivery_zone:{restaurant_id}/{}", zone.id)
        );
        Ok(zone)
    }

    pub fn update_zone(
        &self,
        restaurant_id: &str,
        zone_id: &str,
        data: DeliveryZoneUpdate,
    ) -> RepoResult<DeliveryZone> {
        data.validate()?;
        let Snapshot {
            data: mut settings,
            revision,
        } = self.snapshot(restaurant_id)?;

        let slot = settings
            .delivery_zones
            .iter_mut()
            .find(|z| z.id == zone_id)
            .ok_or_else(|| RepoError::not_found(ZONE, zone_id))?;
        let zone: DeliveryZone = merge_patch(&*slot, &data, &["id", "createdAt"])?;
        *slot = zone.clone();

        settings.updated_at = zone.updated_at.clone();
        self.save(&settings, revision)?;

        audit_log!(
            self.base.kv().origin(),
            "update",
            format!("delivery_zone:{restaurant_id}/{zone_id}")
        );
        Ok(zone)
    }

    pub fn remove_zone(&self, restaurant_id: &str, zone_id: &str) -> RepoResult<()> {
        let Snapshot {
            data: mut settings,
            revision,
        } = self.snapshot(restaurant_id)?;

        let before = settings.delivery_zones.len();
        settings.delivery_zones.retain(|z| z.id != zone_id);
        if settings.delivery_zones.len() == before {
            return Err(RepoError::not_found(ZONE, zone_id));
        }
        settings.updated_at = shared::util::now_iso();
        self.save(&settings, revision)?;

        audit_log!(
            self.base.kv().origin(),
            "delete",
            format!("delivery_zone:{restaurant_id}/{zone_id}")
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;
    use crate::storage::{KvStore, SyncChannel};
    use shared::models::{CheckoutOptionsUpdate, LocalizedText};

    fn repo() -> CartSettingsRepository {
        let kv = KvStore::open_in_memory(SyncChannel::new()).unwrap();
        CartSettingsRepository::new(BaseRepository::new(kv, EventBus::new(), false))
    }

    fn zone(id: &str) -> DeliveryZoneCreate {
        DeliveryZoneCreate {
            id: Some(id.to_string()),
            name: LocalizedText::new("Center", "Центр"),
            price: 3.0,
            min_order_amount: Some(15.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_record_even_without_seeding() {
        let repo = repo();
        let settings = repo.get("r1").unwrap();
        assert_eq!(settings.restaurant_id, "r1");
        assert!(settings.settings.require_phone);
        assert!(repo.base.kv().contains_key("cart_settings_r1").unwrap());
    }

    #[test]
    fn test_records_are_per_restaurant() {
        let repo = repo();
        repo.update(
            "r1",
            CartSettingsUpdate {
                min_order_amount: Some(20.0),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(repo.get("r1").unwrap().min_order_amount, 20.0);
        assert_eq!(repo.get("r2").unwrap().min_order_amount, 0.0);
    }

    #[test]
    fn test_update_merges_nested_switches() {
        let repo = repo();
        let updated = repo
            .update(
                "r1",
                CartSettingsUpdate {
                    free_delivery_amount: Some(Some(50.0)),
                    settings: Some(CheckoutOptionsUpdate {
                        auto_confirm_orders: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(updated.settings.auto_confirm_orders);
        assert!(updated.settings.require_phone);
        assert_eq!(updated.free_delivery_amount, Some(50.0));

        let cleared = repo
            .update(
                "r1",
                CartSettingsUpdate {
                    free_delivery_amount: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(cleared.free_delivery_amount, None);
    }

    #[test]
    fn test_update_rejects_bad_weekday() {
        let repo = repo();
        let result = repo.update(
            "r1",
            CartSettingsUpdate {
                working_days: Some(vec![1, 9]),
                ..Default::default()
            },
        );
        assert!(matches!(
            result,
            Err(RepoError::Validation { ref field, .. }) if field == "workingDays"
        ));
    }

    #[test]
    fn test_zone_lifecycle() {
        let repo = repo();
        repo.add_zone("r1", zone("z1")).unwrap();
        assert!(matches!(
            repo.add_zone("r1", zone("z1")),
            Err(RepoError::AlreadyExists { .. })
        ));

        let zone = repo
            .update_zone(
                "r1",
                "z1",
                DeliveryZoneUpdate {
                    min_order_amount: Some(None),
                    price: Some(4.5),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(zone.price, 4.5);
        assert_eq!(zone.min_order_amount, None);

        let settings = repo.get("r1").unwrap();
        assert_eq!(settings.delivery_fee("z1", 10.0), Ok(4.5));

        repo.remove_zone("r1", "z1").unwrap();
        assert!(matches!(
            repo.remove_zone("r1", "z1"),
            Err(RepoError::NotFound { entity: "delivery_zone", .. })
        ));
    }

    #[test]
    fn test_non_finite_amounts_rejected_before_merge() {
        let repo = repo();
        repo.add_zone("r1", zone("z1")).unwrap();

        let result = repo.update(
            "r1",
            CartSettingsUpdate {
                free_delivery_amount: Some(Some(f64::INFINITY)),
                ..Default::default()
            },
        );
        assert!(matches!(
            result,
            Err(RepoError::Validation { ref field, .. }) if field == "freeDeliveryAmount"
        ));

        let result = repo.update_zone(
            "r1",
            "z1",
            DeliveryZoneUpdate {
                price: Some(f64::NAN),
                ..Default::default()
            },
        );
        assert!(matches!(
            result,
            Err(RepoError::Validation { ref field, .. }) if field == "deliveryZone.price"
        ));
        assert_eq!(repo.get("r1").unwrap().zone("z1").unwrap().price, 3.0);
    }

    #[test]
    fn test_invalid_zone_not_stored() {
        let repo = repo();
        let mut data = zone("z1");
        data.price = -3.0;
        assert!(repo.add_zone("r1", data).is_err());
        assert!(repo.get("r1").unwrap().delivery_zones.is_empty());
    }
}
