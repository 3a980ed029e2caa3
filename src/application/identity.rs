use crate::domain::ports::EntityStoreRef;
use crate::domain::profile::{Profile, ProfileId};
use crate::error::{LedgerError, Result};
use tracing::debug;

/// Maps a caller's profile credential to the profile it names.
pub struct IdentityResolver {
    store: EntityStoreRef,
}

impl IdentityResolver {
    pub fn new(store: EntityStoreRef) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, credential: &str) -> Result<Profile> {
        let id = credential
            .trim()
            .parse::<u32>()
            .map_err(|_| LedgerError::Unauthorized)?;
        let profile = self
            .store
            .profile(ProfileId(id))
            .await?
            .ok_or(LedgerError::Unauthorized)?;
        debug!(profile = %profile.id, role = ?profile.role, "caller resolved");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::EntityStore;
    use crate::domain::profile::ProfileRole;
    use crate::infrastructure::in_memory::InMemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_resolve_known_and_unknown_callers() {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_profile(Profile::new(1, "Harry", "Potter", ProfileRole::Client))
            .await
            .unwrap();
        let resolver = IdentityResolver::new(store);

        assert_eq!(resolver.resolve("1").await.unwrap().id, ProfileId(1));
        assert!(matches!(
            resolver.resolve("2").await,
            Err(LedgerError::Unauthorized)
        ));
        assert!(matches!(
            resolver.resolve("harry").await,
            Err(LedgerError::Unauthorized)
        ));
    }
}
