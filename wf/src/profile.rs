//! User profile and its shared store

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Where the user lives; drives default origins and event cities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            city: "Berkeley, CA, USA".to_string(),
            latitude: 37.8715,
            longitude: -122.2730,
            timezone: "America/Los_Angeles".to_string(),
        }
    }
}

/// Holds the current profile; requests take a snapshot
///
/// Single writer, many readers. Last write wins.
#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    inner: Arc<RwLock<UserProfile>>,
}

impl ProfileStore {
    pub fn new(profile: UserProfile) -> Self {
        debug!(city = %profile.city, "ProfileStore::new: called");
        Self {
            inner: Arc::new(RwLock::new(profile)),
        }
    }

    /// Snapshot of the current profile
    pub async fn get(&self) -> UserProfile {
        self.inner.read().await.clone()
    }

    /// Replace the profile, returning the stored value
    pub async fn set(&self, profile: UserProfile) -> UserProfile {
        info!(city = %profile.city, "ProfileStore::set: profile updated");
        let mut guard = self.inner.write().await;
        *guard = profile;
        guard.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = UserProfile::default();
        assert_eq!(profile.city, "Berkeley, CA, USA");
        assert_eq!(profile.timezone, "America/Los_Angeles");
    }

    #[test]
    fn test_partial_profile_yaml() {
        let profile: UserProfile = serde_yaml::from_str("city: Seattle, WA").unwrap();
        assert_eq!(profile.city, "Seattle, WA");
        assert!((profile.latitude - 37.8715).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_store_last_write_wins() {
        let store = ProfileStore::default();
        let snapshot = store.get().await;

        store
            .set(UserProfile {
                city: "Chicago, IL".to_string(),
                ..Default::default()
            })
            .await;
        let stored = store
            .set(UserProfile {
                city: "Boston, MA".to_string(),
                ..Default::default()
            })
            .await;

        assert_eq!(stored.city, "Boston, MA");
        assert_eq!(store.get().await.city, "Boston, MA");
        // snapshots are detached from later writes
        assert_eq!(snapshot.city, "Berkeley, CA, USA");
    }
}
