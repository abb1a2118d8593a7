use anyhow::{Context, Result};

use crate::{
    model::Place,
    storage::{KeyValueStore, SAVED_LOCATIONS_KEY},
};

/// User's saved places, in the order they were added. No two share an id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedLocations {
    places: Vec<Place>,
}

impl SavedLocations {
    /// Read the list from `store`. Missing or unreadable data gives an empty list.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self> {
        let Some(raw) = store.get(SAVED_LOCATIONS_KEY)? else {
            return Ok(Self::default());
        };

        match serde_json::from_str::<Vec<Place>>(&raw) {
            Ok(places) => {
                let mut saved = Self::default();
                for place in places {
                    if !saved.contains(place.id()) {
                        saved.places.push(place);
                    }
                }
                Ok(saved)
            }
            Err(err) => {
                tracing::warn!("ignoring unreadable saved locations: {err}");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<()> {
        let json =
            serde_json::to_string(&self.places).context("Failed to serialize saved locations")?;
        store.set(SAVED_LOCATIONS_KEY, json)
    }

    /// Remove `place` if saved, otherwise append it. Returns whether it is saved now.
    pub fn toggle(&mut self, place: &Place) -> bool {
        if let Some(pos) = self.places.iter().position(|p| p.id() == place.id()) {
            self.places.remove(pos);
            false
        } else {
            self.places.push(place.clone());
            true
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.places.iter().any(|p| p.id() == id)
    }

    pub fn get(&self, index: usize) -> Option<&Place> {
        self.places.get(index)
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn london() -> Place {
        Place::new("London", "City of London, Greater London", "United Kingdom", 51.52, -0.11)
    }

    fn paris() -> Place {
        Place::new("Paris", "Ile-de-France", "France", 48.87, 2.33)
    }

    fn tokyo() -> Place {
        Place::new("Tokyo", "Tokyo", "Japan", 35.69, 139.69)
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut saved = SavedLocations::default();
        assert!(saved.toggle(&london()));
        assert!(saved.contains(london().id()));
        assert!(!saved.toggle(&london()));
        assert!(saved.is_empty());
    }

    #[test]
    fn double_toggle_restores_contents_and_order() {
        let mut saved = SavedLocations::default();
        saved.toggle(&london());
        saved.toggle(&paris());
        let before = saved.clone();

        saved.toggle(&tokyo());
        saved.toggle(&tokyo());
        assert_eq!(saved, before);

        // Removing from the middle keeps the others in place.
        saved.toggle(&tokyo());
        saved.toggle(&paris());
        let names: Vec<_> = saved.places().iter().map(Place::name).collect();
        assert_eq!(names, ["London", "Tokyo"]);
    }

    #[test]
    fn dedup_uses_the_coordinate_id() {
        let mut saved = SavedLocations::default();
        saved.toggle(&paris());
        let same_spot = Place::new("Paris 2e", "", "France", 48.87, 2.33);
        assert!(!saved.toggle(&same_spot));
        assert!(saved.is_empty());
    }

    #[test]
    fn save_and_load_through_store() {
        let mut store = MemoryStore::new();
        let mut saved = SavedLocations::default();
        saved.toggle(&paris());
        saved.toggle(&london());
        saved.save(&mut store).unwrap();

        let loaded = SavedLocations::load(&store).unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.get(1).map(Place::name), Some("London"));
    }

    #[test]
    fn load_drops_duplicate_ids() {
        let mut store = MemoryStore::new();
        let json = serde_json::to_string(&vec![paris(), london(), paris()]).unwrap();
        store.set(SAVED_LOCATIONS_KEY, json).unwrap();

        let loaded = SavedLocations::load(&store).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn load_ignores_garbage() {
        let mut store = MemoryStore::new();
        store.set(SAVED_LOCATIONS_KEY, "{oops".into()).unwrap();
        assert!(SavedLocations::load(&store).unwrap().is_empty());
    }
}
