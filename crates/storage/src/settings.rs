use counterparty_core::{MatchConfig, SettingsSource};
use std::collections::HashMap;

use crate::db::DbPool;

pub async fn load_settings(pool: &DbPool) -> Result<HashMap<String, String>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, String)>("SELECT key, value FROM settings")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().collect())
}

pub async fn save_setting(pool: &DbPool, key: &str, value: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// Builds the matching configuration from the settings table; keys that are
/// absent keep their defaults.
pub async fn load_match_config(pool: &DbPool) -> Result<MatchConfig, sqlx::Error> {
    let settings = load_settings(pool).await?;
    Ok(MatchConfig::from_settings(Some(&settings as &dyn SettingsSource)))
}
