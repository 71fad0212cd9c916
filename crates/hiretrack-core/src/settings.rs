//! Application-wide settings, stored as a single record.

use crate::input::{clean, clean_opt};
use crate::storage::{Bytes, SINGLETONS, Store, decode, encode};
use crate::{HireError, Settings, SettingsUpdate};
use redb::ReadableTable;

const SETTINGS_KEY: &str = "settings";

/// Stored settings, or the defaults when none were ever saved.
pub(crate) fn load_settings(
    singletons: &impl ReadableTable<&'static str, Bytes>,
) -> Result<Settings, HireError> {
    match singletons.get(SETTINGS_KEY)? {
        Some(data) => decode(data.value()),
        None => Ok(Settings::default()),
    }
}

impl Store {
    pub fn settings(&self) -> Result<Settings, HireError> {
        self.read(|txn| load_settings(&txn.open_table(SINGLETONS)?))
    }

    pub fn update_settings(&self, update: SettingsUpdate) -> Result<Settings, HireError> {
        update.validate()?;

        let settings = self.write(|txn| {
            let mut singletons = txn.open_table(SINGLETONS)?;
            let mut settings = load_settings(&singletons)?;
            if let Some(name) = &update.company_name {
                settings.company_name = clean(name);
            }
            if let Some(minutes) = update.default_interview_minutes {
                settings.default_interview_minutes = minutes;
            }
            if let Some(location) = &update.default_location {
                settings.default_location = clean_opt(location.as_deref());
            }
            let bytes = encode(&settings)?;
            singletons.insert(SETTINGS_KEY, bytes.as_slice())?;
            Ok(settings)
        })?;

        tracing::info!(
            company = %settings.company_name,
            default_interview_minutes = settings.default_interview_minutes,
            "Settings updated"
        );
        Ok(settings)
    }
}
