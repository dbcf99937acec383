use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::ClientResult;
use crate::storage::KvStore;

const SESSION_ID_KEY: &str = "session_id";
const CUSTOMER_ID_KEY: &str = "customer_id";
const AUTH_TOKEN_KEY: &str = "auth_token";
const AUTH_PROFILE_KEY: &str = "auth_profile";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    CustomerChanged(Option<i64>),
    CredentialSet,
    CredentialCleared,
}

/// Single owner of the durable session state every component reads.
///
/// The session id scopes the anonymous cart and is generated once, then never
/// touched again; logout clears the customer id and credential but leaves it
/// alone. Changes are published on a broadcast channel, the stand-in for the
/// cross-tab storage-change event.
#[derive(Debug)]
pub struct SessionService {
    store: KvStore,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionService {
    pub fn new(store: KvStore) -> Self {
        let (events, _) = broadcast::channel(16);
        Self { store, events }
    }

    /// Read the persisted session id, generating and persisting one on first use.
    pub fn session_id(&self) -> ClientResult<String> {
        if let Some(id) = self.store.get_string(SESSION_ID_KEY) {
            if !id.is_empty() {
                return Ok(id);
            }
        }
        let id = Uuid::new_v4().to_string();
        self.store.set(SESSION_ID_KEY, Value::String(id.clone()))?;
        tracing::debug!(session_id = %id, "generated new session id");
        Ok(id)
    }

    pub fn customer_id(&self) -> Option<i64> {
        self.store.get(CUSTOMER_ID_KEY).and_then(|v| v.as_i64())
    }

    pub fn set_customer_id(&self, customer_id: Option<i64>) -> ClientResult<()> {
        match customer_id {
            Some(id) => self.store.set(CUSTOMER_ID_KEY, Value::from(id))?,
            None => self.store.remove(CUSTOMER_ID_KEY)?,
        }
        let _ = self.events.send(SessionEvent::CustomerChanged(customer_id));
        Ok(())
    }

    pub fn credential(&self) -> Option<Credential> {
        let token = self.store.get_string(AUTH_TOKEN_KEY)?;
        let profile = self
            .store
            .get(AUTH_PROFILE_KEY)
            .and_then(|v| serde_json::from_value(v).ok());
        Some(Credential { token, profile })
    }

    pub fn set_credential(&self, credential: Credential) -> ClientResult<()> {
        self.store
            .set(AUTH_TOKEN_KEY, Value::String(credential.token))?;
        match &credential.profile {
            Some(profile) => {
                let value = serde_json::to_value(profile)
                    .map_err(|e| anyhow::anyhow!("serializing profile: {e}"))?;
                self.store.set(AUTH_PROFILE_KEY, value)?;
                self.set_customer_id(Some(profile.id))?;
            }
            None => {
                // A profileless credential must not keep the previous
                // customer's chat and order scope.
                self.store.remove(AUTH_PROFILE_KEY)?;
                self.set_customer_id(None)?;
            }
        }
        let _ = self.events.send(SessionEvent::CredentialSet);
        Ok(())
    }

    /// Evict the stored credential and profile; the cart session id survives.
    pub fn clear_credential(&self) -> ClientResult<()> {
        self.store.remove(AUTH_TOKEN_KEY)?;
        self.store.remove(AUTH_PROFILE_KEY)?;
        self.set_customer_id(None)?;
        let _ = self.events.send(SessionEvent::CredentialCleared);
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(dir: &tempfile::TempDir) -> SessionService {
        let store = KvStore::open(dir.path().join("state.json")).unwrap();
        SessionService::new(store)
    }

    #[test]
    fn session_id_is_generated_once_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let session = service(&dir);
        let first = session.session_id().unwrap();
        assert_eq!(session.session_id().unwrap(), first);

        // A fresh service over the same storage sees the same id.
        let reopened = service(&dir);
        assert_eq!(reopened.session_id().unwrap(), first);
    }

    #[test]
    fn logout_clears_customer_but_keeps_session_id() {
        let dir = tempfile::tempdir().unwrap();
        let session = service(&dir);
        let sid = session.session_id().unwrap();

        session
            .set_credential(Credential {
                token: "tok".into(),
                profile: Some(Profile {
                    id: 7,
                    name: "Ada".into(),
                    email: "ada@example.com".into(),
                }),
            })
            .unwrap();
        assert_eq!(session.customer_id(), Some(7));

        session.clear_credential().unwrap();
        assert_eq!(session.credential(), None);
        assert_eq!(session.customer_id(), None);
        assert_eq!(session.session_id().unwrap(), sid);
    }

    #[test]
    fn profileless_credential_clears_previous_customer_scope() {
        let dir = tempfile::tempdir().unwrap();
        let session = service(&dir);
        session
            .set_credential(Credential {
                token: "tok".into(),
                profile: Some(Profile {
                    id: 7,
                    name: "Ada".into(),
                    email: "ada@example.com".into(),
                }),
            })
            .unwrap();
        assert_eq!(session.customer_id(), Some(7));

        session
            .set_credential(Credential {
                token: "tok2".into(),
                profile: None,
            })
            .unwrap();
        assert_eq!(session.customer_id(), None);
        assert_eq!(session.credential().unwrap().profile, None);
    }

    #[tokio::test]
    async fn customer_change_is_published() {
        let dir = tempfile::tempdir().unwrap();
        let session = service(&dir);
        let mut events = session.subscribe();

        session.set_customer_id(Some(42)).unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::CustomerChanged(Some(42))
        );
    }
}
