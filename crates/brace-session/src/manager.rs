//! Session lifecycle: load or create on the way in, persist on the way out.

use std::sync::Arc;

use chrono::Utc;
use cookie::{Cookie, CookieJar};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::Result;
use crate::id;
use crate::record::SessionRecord;
use crate::session::Session;
use crate::storage::SessionStorage;

/// Loads, validates, creates and persists sessions against a storage backend.
#[derive(Clone)]
pub struct SessionManager {
    storage: Arc<dyn SessionStorage>,
    config: Arc<SessionConfig>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("storage", &self.storage.name())
            .field("config", &self.config)
            .finish()
    }
}

impl SessionManager {
    /// Create a manager over `storage`.
    pub fn new(storage: impl SessionStorage + 'static, config: SessionConfig) -> Self {
        Self::from_shared(Arc::new(storage), config)
    }

    /// Create a manager over an already shared storage.
    pub fn from_shared(storage: Arc<dyn SessionStorage>, config: SessionConfig) -> Self {
        Self {
            storage,
            config: Arc::new(config),
        }
    }

    /// The lifecycle configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The storage backend.
    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    /// Load the session named by the request cookie, or start a new one.
    ///
    /// `jar` is the request jar; a backend that drops an expired record may
    /// queue a cookie removal in it.
    pub async fn load(&self, jar: &mut CookieJar) -> Result<Session> {
        self.load_at(jar, Utc::now().timestamp()).await
    }

    /// [`load`](Self::load) with an explicit clock.
    pub async fn load_at(&self, jar: &mut CookieJar, now: i64) -> Result<Session> {
        let cookie_id = jar
            .get(&self.config.cookie_name)
            .map(|c| c.value().to_string())
            .filter(|v| id::is_well_formed(v));

        if let Some(session_id) = cookie_id {
            let key = id::storage_key(&session_id);
            match self.storage.load(key, jar).await? {
                Some(mut record) if record.is_valid_for(&session_id, now) => {
                    record.renew(now, self.config.ttl_secs());
                    debug!(storage = self.storage.name(), "Resumed session");
                    return Ok(Session::new(session_id, record));
                }
                Some(record) if record.is_expired(now) => {
                    debug!(storage = self.storage.name(), "Discarding expired session");
                    if let Err(e) = self.storage.destroy(key, jar).await {
                        warn!(storage = self.storage.name(), error = %e, "Failed to delete expired session");
                    }
                }
                // Live record for another identifier with the same prefix.
                // It stays untouched.
                Some(_) => {
                    warn!(storage = self.storage.name(), "Session cookie does not match stored record");
                }
                None => {
                    debug!(storage = self.storage.name(), "No stored data for session cookie");
                }
            }
        }

        let session_id = id::generate();
        let record = SessionRecord::fresh(
            &session_id,
            now,
            self.config.ttl_secs(),
            self.config.expires_secs(),
        );
        debug!(storage = self.storage.name(), "Started new session");
        Ok(Session::new(session_id, record))
    }

    /// Persist `session` if it changed or was destroyed, updating `jar` with
    /// the cookies the response must carry.
    ///
    /// Returns whether anything was written.
    pub async fn commit(&self, session: &Session, jar: &mut CookieJar) -> Result<bool> {
        let session_id = session.id();
        let key = id::storage_key(&session_id);

        if session.is_destroyed() {
            self.storage.destroy(key, jar).await?;
            jar.remove(
                Cookie::build(self.config.cookie_name.clone())
                    .path(self.config.cookie_path.clone())
                    .build(),
            );
            debug!(storage = self.storage.name(), "Destroyed session");
            return Ok(true);
        }

        if !session.has_changed() {
            return Ok(false);
        }

        self.storage.write(key, &session.record(), jar).await?;
        jar.add(self.session_cookie(session_id));
        session.mark_saved();

        debug!(storage = self.storage.name(), "Persisted session");
        Ok(true)
    }

    fn session_cookie(&self, session_id: String) -> Cookie<'static> {
        Cookie::build((self.config.cookie_name.clone(), session_id))
            .path(self.config.cookie_path.clone())
            .max_age(cookie::time::Duration::seconds(self.config.expires_secs()))
            .http_only(self.config.http_only)
            .secure(self.config.secure)
            .same_site(self.config.same_site)
            .build()
    }
}

/// A session that is only loaded when first asked for.
///
/// Requests whose handlers never touch the session never reach storage.
#[derive(Clone)]
pub struct SessionSlot {
    manager: SessionManager,
    jar: Arc<Mutex<CookieJar>>,
    cell: Arc<OnceCell<Session>>,
}

impl SessionSlot {
    /// Create a slot for a request carrying `jar`.
    pub fn new(manager: SessionManager, jar: CookieJar) -> Self {
        Self {
            manager,
            jar: Arc::new(Mutex::new(jar)),
            cell: Arc::new(OnceCell::new()),
        }
    }

    /// Load the session on first call; later calls return the same handle.
    pub async fn get(&self) -> Result<Session> {
        self.cell
            .get_or_try_init(|| async {
                let mut jar = self.jar.lock().await;
                self.manager.load(&mut jar).await
            })
            .await
            .cloned()
    }

    /// The session, if some handler loaded it.
    pub fn loaded(&self) -> Option<Session> {
        self.cell.get().cloned()
    }

    /// The request jar, including any changes loading made to it.
    pub async fn jar(&self) -> CookieJar {
        self.jar.lock().await.clone()
    }

    /// The manager behind this slot.
    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }
}
