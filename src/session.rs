/// Anonymous shopping session
///
/// Carts are not tied to accounts. Each install gets one opaque session id,
/// created the first time it is needed and kept in the preference store
/// indefinitely. It is resolved once at startup and passed to the cart store.

use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StoreError;
use crate::ids::{now_millis, random_base36};
use crate::state::prefs::PreferenceStore;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// `session_<millis>_<9 random base36 chars>`
    pub fn generate() -> Self {
        SessionId(format!("session_{}_{}", now_millis(), random_base36(9)))
    }

    /// Wrap an existing id (tests, or ids coming back from storage)
    pub fn new(id: impl Into<String>) -> Self {
        SessionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the saved session, creating and saving one on first use
    pub fn load_or_create(prefs: &mut PreferenceStore) -> Result<Self, StoreError> {
        if let Some(existing) = prefs.get().session_id.as_deref().filter(|s| !s.is_empty()) {
            return Ok(SessionId::new(existing));
        }

        let session = SessionId::generate();
        prefs.update(|p| p.session_id = Some(session.0.clone()))?;
        info!("created cart session {}", session);
        Ok(session)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_format() {
        let id = SessionId::generate();
        let parts: Vec<&str> = id.as_str().split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "session");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
    }

    #[test]
    fn test_load_or_create_is_stable() {
        let mut prefs = PreferenceStore::in_memory();
        let first = SessionId::load_or_create(&mut prefs).unwrap();
        let second = SessionId::load_or_create(&mut prefs).unwrap();
        assert_eq!(first, second);
        assert_eq!(prefs.get().session_id.as_deref(), Some(first.as_str()));
    }

    #[test]
    fn test_existing_session_is_reused() {
        let mut prefs = PreferenceStore::in_memory();
        prefs.update(|p| p.session_id = Some("session_42_abcdefghi".into())).unwrap();
        let session = SessionId::load_or_create(&mut prefs).unwrap();
        assert_eq!(session.as_str(), "session_42_abcdefghi");
    }
}
