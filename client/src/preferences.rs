use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use shared::types::{DisplayField, FieldVisibility};

use crate::storage::{KeyValueStore, VISIBLE_FIELDS_KEY};

/// Which voter fields the views show.
///
/// Writes land in memory and storage immediately. Pushing the map to the
/// server is a separate step ([`Client::save_preferences`]) whose failure
/// leaves local state alone.
///
/// [`Client::save_preferences`]: crate::Client::save_preferences
#[derive(Debug)]
pub struct DisplayPreferences {
    storage: Arc<dyn KeyValueStore>,
    fields: RwLock<FieldVisibility>,
}

impl DisplayPreferences {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let fields = match storage.get(VISIBLE_FIELDS_KEY) {
            None => FieldVisibility::default(),
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Persisted field visibility is unreadable, using defaults: {}", e);
                FieldVisibility::default()
            }),
        };

        Self {
            storage,
            fields: RwLock::new(fields),
        }
    }

    pub fn get(&self) -> FieldVisibility {
        self.fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_visible(&self, field: DisplayField) -> bool {
        self.fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(field)
    }

    pub fn set(&self, field: DisplayField, visible: bool) {
        let mut fields = self.fields.write().unwrap_or_else(PoisonError::into_inner);
        fields.set(field, visible);
        debug!("{} visible: {}", field, visible);
        self.persist(&fields);
    }

    pub fn set_all(&self, visibility: FieldVisibility) {
        let mut fields = self.fields.write().unwrap_or_else(PoisonError::into_inner);
        *fields = visibility;
        self.persist(&fields);
    }

    fn persist(&self, fields: &FieldVisibility) {
        let result = serde_json::to_string(fields)
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                self.storage
                    .set(VISIBLE_FIELDS_KEY, &raw)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            warn!("Failed to persist field visibility: {}", e);
        }
    }
}
