//! JSON-document store for presentation preferences.

use crate::domain::preferences::find_broker;
use crate::domain::{BrokerAccount, ChartLayout, Favorites, InstrumentId, TimeMs, UserProfile};
use crate::error::PreferencesError;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tokio::sync::Mutex;
use tracing::{debug, info};

const PROFILE_KEY: &str = "profile";
const BROKER_KEY: &str = "broker";
const FAVORITES_KEY: &str = "favorites";
const LAYOUTS_KEY: &str = "chart_layouts";

/// Simulated broker latency range in milliseconds.
const PING_RANGE: std::ops::Range<u32> = 5..25;

/// Profile and broker together; both absent until onboarding completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    pub profile: Option<UserProfile>,
    pub broker: Option<BrokerAccount>,
}

impl AccountState {
    pub fn needs_setup(&self) -> bool {
        self.profile.is_none() || self.broker.is_none()
    }
}

pub struct PreferencesStore {
    pool: SqlitePool,
    // Serializes read-modify-write updates.
    write_lock: Mutex<()>,
}

impl PreferencesStore {
    pub fn new(pool: SqlitePool) -> Self {
        PreferencesStore {
            pool,
            write_lock: Mutex::new(()),
        }
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PreferencesError> {
        let row = sqlx::query("SELECT value FROM preferences WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let raw: String = row.get("value");
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }

    async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), PreferencesError> {
        self.put_all(&[(key, serde_json::to_string(value)?)]).await
    }

    /// Write several already-encoded documents in one transaction.
    async fn put_all(&self, entries: &[(&str, String)]) -> Result<(), PreferencesError> {
        let now = TimeMs::now().as_ms();
        let mut tx = self.pool.begin().await?;

        for (key, raw) in entries {
            sqlx::query(
                r#"
                INSERT INTO preferences (key, value, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(*key)
            .bind(raw.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!("Saved {} preference(s)", entries.len());
        Ok(())
    }

    pub async fn account(&self) -> Result<AccountState, PreferencesError> {
        Ok(AccountState {
            profile: self.get(PROFILE_KEY).await?,
            broker: self.get(BROKER_KEY).await?,
        })
    }

    /// Onboarding: create the trader profile and connect a catalog broker.
    pub async fn complete_setup(
        &self,
        name: &str,
        broker_id: &str,
    ) -> Result<AccountState, PreferencesError> {
        if name.trim().is_empty() {
            return Err(PreferencesError::EmptyName);
        }
        let listing = find_broker(broker_id)
            .ok_or_else(|| PreferencesError::UnknownBroker(broker_id.to_string()))?;

        let profile = UserProfile::novice(name, TimeMs::now());
        let broker = listing.connect(rand::thread_rng().gen_range(PING_RANGE));

        let entries = [
            (PROFILE_KEY, serde_json::to_string(&profile)?),
            (BROKER_KEY, serde_json::to_string(&broker)?),
        ];
        let _guard = self.write_lock.lock().await;
        self.put_all(&entries).await?;

        info!(
            "Account set up for {} via {} ({} ms)",
            profile.name, broker.name, broker.ping
        );
        Ok(AccountState {
            profile: Some(profile),
            broker: Some(broker),
        })
    }

    pub async fn favorites(&self) -> Result<Favorites, PreferencesError> {
        Ok(self.get(FAVORITES_KEY).await?.unwrap_or_default())
    }

    /// Flip membership of one instrument and persist. Returns the updated set.
    pub async fn toggle_favorite(&self, id: &InstrumentId) -> Result<Favorites, PreferencesError> {
        let _guard = self.write_lock.lock().await;
        let mut favorites = self.favorites().await?;
        favorites.toggle(id);
        self.put(FAVORITES_KEY, &favorites).await?;
        Ok(favorites)
    }

    pub async fn layouts(&self) -> Result<Vec<ChartLayout>, PreferencesError> {
        Ok(self.get(LAYOUTS_KEY).await?.unwrap_or_default())
    }

    /// Insert or replace a layout by id.
    pub async fn save_layout(&self, layout: ChartLayout) -> Result<Vec<ChartLayout>, PreferencesError> {
        let _guard = self.write_lock.lock().await;
        let mut layouts = self.layouts().await?;
        match layouts.iter_mut().find(|l| l.id == layout.id) {
            Some(existing) => *existing = layout,
            None => layouts.push(layout),
        }
        self.put(LAYOUTS_KEY, &layouts).await?;
        Ok(layouts)
    }

    /// Returns false when no layout had that id.
    pub async fn delete_layout(&self, id: &str) -> Result<bool, PreferencesError> {
        let _guard = self.write_lock.lock().await;
        let mut layouts = self.layouts().await?;
        let before = layouts.len();
        layouts.retain(|l| l.id != id);
        if layouts.len() == before {
            return Ok(false);
        }
        self.put(LAYOUTS_KEY, &layouts).await?;
        Ok(true)
    }
}
