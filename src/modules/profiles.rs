// Browsing profiles: one persistent, one incognito, both alive for the whole run.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Persistent,
    Incognito,
}

impl ProfileKind {
    pub fn for_tab(incognito: bool) -> Self {
        if incognito {
            Self::Incognito
        } else {
            Self::Persistent
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowsingProfile {
    pub kind: ProfileKind,
    pub persistent_cookies: bool,
    pub disk_cache: bool,
    pub persistent_storage: bool,
}

impl BrowsingProfile {
    /// Engine defaults for cookies, cache and storage.
    pub fn persistent() -> Self {
        Self {
            kind: ProfileKind::Persistent,
            persistent_cookies: true,
            disk_cache: true,
            persistent_storage: true,
        }
    }

    /// No persistent cookies, no cache path, no storage path.
    pub fn incognito() -> Self {
        Self {
            kind: ProfileKind::Incognito,
            persistent_cookies: false,
            disk_cache: false,
            persistent_storage: false,
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        !self.persistent_cookies && !self.disk_cache && !self.persistent_storage
    }
}

/// Holds both profiles for the lifetime of the process.
///
/// The incognito profile is not rebuilt when the last incognito tab closes.
/// The registry only counts incognito sessions; in-memory engine state tied
/// to the ephemeral profile may survive from one session to the next until
/// the process exits.
#[derive(Debug)]
pub struct ProfileRegistry {
    persistent: BrowsingProfile,
    incognito: BrowsingProfile,
    incognito_sessions: u32,
    incognito_active: bool,
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self {
            persistent: BrowsingProfile::persistent(),
            incognito: BrowsingProfile::incognito(),
            incognito_sessions: 0,
            incognito_active: false,
        }
    }

    pub fn get(&self, kind: ProfileKind) -> &BrowsingProfile {
        match kind {
            ProfileKind::Persistent => &self.persistent,
            ProfileKind::Incognito => &self.incognito,
        }
    }

    pub fn begin_incognito_session(&mut self) {
        if !self.incognito_active {
            self.incognito_active = true;
            self.incognito_sessions += 1;
            log::info!("[Profiles] Incognito session {} started", self.incognito_sessions);
        }
    }

    pub fn end_incognito_session(&mut self) {
        if self.incognito_active {
            self.incognito_active = false;
            log::info!(
                "[Profiles] Incognito session {} ended; its webviews and their data stores are gone",
                self.incognito_sessions
            );
        }
    }

    pub fn incognito_active(&self) -> bool {
        self.incognito_active
    }

    /// Number of incognito sessions started so far in this run.
    pub fn incognito_sessions(&self) -> u32 {
        self.incognito_sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_configuration() {
        let registry = ProfileRegistry::new();
        assert!(!registry.get(ProfileKind::Persistent).is_ephemeral());
        assert!(registry.get(ProfileKind::Incognito).is_ephemeral());
        assert_eq!(registry.get(ProfileKind::Incognito).kind, ProfileKind::Incognito);
    }

    #[test]
    fn test_session_counting() {
        let mut registry = ProfileRegistry::new();
        registry.end_incognito_session();
        assert_eq!(registry.incognito_sessions(), 0);

        registry.begin_incognito_session();
        registry.begin_incognito_session();
        assert_eq!(registry.incognito_sessions(), 1);
        assert!(registry.incognito_active());

        registry.end_incognito_session();
        assert!(!registry.incognito_active());
        registry.begin_incognito_session();
        assert_eq!(registry.incognito_sessions(), 2);
    }

    #[test]
    fn test_incognito_profile_survives_sessions() {
        let mut registry = ProfileRegistry::new();
        registry.begin_incognito_session();
        registry.end_incognito_session();

        let profile = registry.get(ProfileKind::Incognito);
        assert!(profile.is_ephemeral());
        assert!(!profile.persistent_cookies);
        assert!(!profile.disk_cache);
        assert!(!profile.persistent_storage);
    }
}
