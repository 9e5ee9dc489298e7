// Platform settings for the discount engine
//
// Settings rows live in the database and are read through a caller-owned
// TTL cache. The cache takes the current instant as a parameter instead of
// reading a global clock, and hands out owned copies rather than a shared
// mutable reference.

use sqlx::PgPool;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::discounts::eligibility::EmptyTargetPolicy;
use crate::discounts::weakness::DEFAULT_WEAK_COURSE_LIMIT;

/// Time-to-live for cached settings (60 seconds)
pub const SETTINGS_CACHE_TTL: Duration = Duration::from_secs(60);

/// Engine-level settings with database-backed overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformSettings {
    /// What a course/category-scoped discount with zero targets covers
    pub empty_target_policy: EmptyTargetPolicy,
    /// Result bound for the weak-course ranking
    pub weak_course_limit: usize,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            empty_target_policy: EmptyTargetPolicy::ApplyToAll,
            weak_course_limit: DEFAULT_WEAK_COURSE_LIMIT,
        }
    }
}

impl PlatformSettings {
    /// Load settings from the platform_settings table
    ///
    /// Unknown keys are ignored; missing or unparsable keys keep their
    /// defaults.
    pub async fn load(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM platform_settings")
                .fetch_all(pool)
                .await?;

        let mut settings = Self::default();
        for (key, value) in rows {
            match key.as_str() {
                "discounts.empty_target_policy" => match value.as_str() {
                    "apply_to_all" => settings.empty_target_policy = EmptyTargetPolicy::ApplyToAll,
                    "apply_to_none" => {
                        settings.empty_target_policy = EmptyTargetPolicy::ApplyToNone
                    }
                    other => {
                        tracing::warn!("Unknown empty_target_policy value: {}", other);
                    }
                },
                "discounts.weak_course_limit" => {
                    if let Ok(limit) = value.parse::<usize>() {
                        settings.weak_course_limit = limit;
                    } else {
                        tracing::warn!("Unparsable weak_course_limit value: {}", value);
                    }
                }
                _ => {}
            }
        }

        Ok(settings)
    }
}

/// A value cached with a time-to-live
///
/// The current instant is injected per call, so tests drive staleness
/// without sleeping.
pub struct TtlCache<T: Clone> {
    ttl: Duration,
    state: RwLock<Option<(T, Instant)>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(None),
        }
    }

    /// Return the cached value, refreshing through `load` when stale
    pub async fn get_or_refresh<F, Fut, E>(&self, now: Instant, load: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        {
            let state = self.state.read().await;
            if let Some((value, loaded_at)) = state.as_ref() {
                if now.duration_since(*loaded_at) <= self.ttl {
                    return Ok(value.clone());
                }
            }
        }

        let value = load().await?;
        let mut state = self.state.write().await;
        *state = Some((value.clone(), now));
        Ok(value)
    }

    /// Drop the cached value so the next read reloads
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        *state = None;
    }
}

/// Database-backed settings provider owned by the application state
pub struct SettingsProvider {
    pool: PgPool,
    cache: TtlCache<PlatformSettings>,
}

impl SettingsProvider {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            cache: TtlCache::new(SETTINGS_CACHE_TTL),
        }
    }

    /// Current settings, served from cache within the TTL
    pub async fn current(&self) -> Result<PlatformSettings, sqlx::Error> {
        self.cache
            .get_or_refresh(Instant::now(), || PlatformSettings::load(&self.pool))
            .await
    }

    pub async fn invalidate(&self) {
        self.cache.invalidate().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_first_read_loads() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        let loads = AtomicUsize::new(0);

        let value = cache
            .get_or_refresh(Instant::now(), || {
                loads.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, Infallible>(7) }
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fresh_value_is_served_from_cache() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        let loads = AtomicUsize::new(0);
        let start = Instant::now();

        for _ in 0..3 {
            cache
                .get_or_refresh(start, || {
                    loads.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, Infallible>(7) }
                })
                .await
                .unwrap();
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_value_is_reloaded() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        let start = Instant::now();

        cache
            .get_or_refresh(start, || async { Ok::<_, Infallible>(1) })
            .await
            .unwrap();

        // Past the TTL the loader runs again and the new value wins
        let later = start + Duration::from_secs(61);
        let value = cache
            .get_or_refresh(later, || async { Ok::<_, Infallible>(2) })
            .await
            .unwrap();

        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        let now = Instant::now();

        cache
            .get_or_refresh(now, || async { Ok::<_, Infallible>(1) })
            .await
            .unwrap();
        cache.invalidate().await;

        let value = cache
            .get_or_refresh(now, || async { Ok::<_, Infallible>(2) })
            .await
            .unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_load_error_leaves_cache_empty() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        let now = Instant::now();

        let result = cache
            .get_or_refresh(now, || async { Err::<u32, &str>("db down") })
            .await;
        assert!(result.is_err());

        // Next read still loads
        let value = cache
            .get_or_refresh(now, || async { Ok::<_, Infallible>(9) })
            .await
            .unwrap();
        assert_eq!(value, 9);
    }

    #[test]
    fn test_default_settings() {
        let settings = PlatformSettings::default();
        assert_eq!(settings.empty_target_policy, EmptyTargetPolicy::ApplyToAll);
        assert_eq!(settings.weak_course_limit, DEFAULT_WEAK_COURSE_LIMIT);
    }
}
