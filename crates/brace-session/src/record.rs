//! Stored session record and its expiry bookkeeping.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use subtle::ConstantTimeEq;

use crate::id;

/// Key holding the hash of the session identifier.
pub const ID_HASH_KEY: &str = "sessionId";

/// Key holding the idle deadline (unix seconds).
pub const TTL_KEY: &str = "__ttl";

/// Key holding the absolute deadline (unix seconds).
pub const EXPIRES_KEY: &str = "__expires";

/// Keys the session lifecycle owns. Handlers can neither read nor write them.
pub const RESERVED_KEYS: [&str; 3] = [ID_HASH_KEY, TTL_KEY, EXPIRES_KEY];

/// Check whether a key belongs to session bookkeeping.
pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Everything persisted for one session: user data plus bookkeeping,
/// stored as a single flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionRecord(Map<String, Value>);

impl SessionRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the default record for a newly issued identifier.
    pub fn fresh(session_id: &str, now: i64, ttl_secs: i64, expires_secs: i64) -> Self {
        let mut map = Map::new();
        map.insert(ID_HASH_KEY.to_string(), Value::from(id::hash(session_id)));
        map.insert(TTL_KEY.to_string(), Value::from(now.saturating_add(ttl_secs)));
        map.insert(
            EXPIRES_KEY.to_string(),
            Value::from(now.saturating_add(expires_secs)),
        );
        Self(map)
    }

    /// Check whether this record belongs to `session_id` and is still live at `now`.
    pub fn is_valid_for(&self, session_id: &str, now: i64) -> bool {
        if self.0.is_empty() {
            return false;
        }

        if !self.belongs_to(session_id) {
            return false;
        }

        match self.expires_at() {
            Some(expires) if expires >= now => {}
            _ => return false,
        }

        matches!(self.ttl_at(), Some(ttl) if ttl >= now)
    }

    /// Whether the stored identifier hash matches `session_id`.
    ///
    /// Compared in constant time.
    pub fn belongs_to(&self, session_id: &str) -> bool {
        match self.0.get(ID_HASH_KEY).and_then(Value::as_str) {
            Some(hash) if !hash.trim().is_empty() => hash
                .as_bytes()
                .ct_eq(id::hash(session_id).as_bytes())
                .into(),
            _ => false,
        }
    }

    /// Push the idle deadline out to `now + ttl_secs`.
    pub fn renew(&mut self, now: i64, ttl_secs: i64) {
        self.0
            .insert(TTL_KEY.to_string(), Value::from(now.saturating_add(ttl_secs)));
    }

    /// Idle deadline, if present and numeric.
    pub fn ttl_at(&self) -> Option<i64> {
        self.0.get(TTL_KEY).and_then(Value::as_i64)
    }

    /// Absolute deadline, if present and numeric.
    pub fn expires_at(&self) -> Option<i64> {
        self.0.get(EXPIRES_KEY).and_then(Value::as_i64)
    }

    /// Whether either deadline has passed (or is missing) at `now`.
    ///
    /// Unlike [`is_valid_for`](Self::is_valid_for) this needs no identifier,
    /// so storage sweeps can use it.
    pub fn is_expired(&self, now: i64) -> bool {
        let live = |deadline: Option<i64>| matches!(deadline, Some(t) if t >= now);
        !(live(self.expires_at()) && live(self.ttl_at()))
    }

    /// Raw value lookup, bookkeeping included.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Raw insert, bookkeeping included.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Raw removal, bookkeeping included.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Total number of entries, bookkeeping included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record holds nothing at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// User entries only.
    pub fn user_entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter().filter(|(k, _)| !is_reserved(k))
    }

    /// User data as a JSON object.
    pub fn user_data(&self) -> Map<String, Value> {
        self.user_entries()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Drop every user entry, keeping bookkeeping.
    pub fn clear_user_data(&mut self) {
        self.0.retain(|k, _| is_reserved(k));
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for SessionRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<SessionRecord> for Map<String, Value> {
    fn from(record: SessionRecord) -> Self {
        record.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    fn session_id() -> String {
        "a".repeat(64)
    }

    #[test]
    fn test_fresh_record_is_valid() {
        let record = SessionRecord::fresh(&session_id(), NOW, 3600, 86_400);

        assert!(record.is_valid_for(&session_id(), NOW));
        assert_eq!(record.ttl_at(), Some(NOW + 3600));
        assert_eq!(record.expires_at(), Some(NOW + 86_400));
        assert_eq!(record.user_entries().count(), 0);
    }

    #[test]
    fn test_deadlines_saturate_instead_of_overflowing() {
        let record = SessionRecord::fresh(&session_id(), NOW, i64::MAX, i64::MAX);

        assert_eq!(record.ttl_at(), Some(i64::MAX));
        assert_eq!(record.expires_at(), Some(i64::MAX));
        assert!(record.is_valid_for(&session_id(), NOW));

        let mut record = record;
        record.renew(NOW, i64::MAX);
        assert_eq!(record.ttl_at(), Some(i64::MAX));
    }

    #[test]
    fn test_belongs_to_checks_hash() {
        let record = SessionRecord::fresh(&session_id(), NOW, 60, 60);

        assert!(record.belongs_to(&session_id()));
        assert!(!record.belongs_to(&"b".repeat(64)));
        assert!(!SessionRecord::new().belongs_to(&session_id()));
    }

    #[test]
    fn test_empty_record_is_invalid() {
        assert!(!SessionRecord::new().is_valid_for(&session_id(), NOW));
    }

    #[test]
    fn test_wrong_identifier_is_invalid() {
        let record = SessionRecord::fresh(&session_id(), NOW, 3600, 86_400);
        assert!(!record.is_valid_for(&"b".repeat(64), NOW));
    }

    #[test]
    fn test_blank_hash_is_invalid() {
        let mut record = SessionRecord::fresh(&session_id(), NOW, 3600, 86_400);
        record.insert(ID_HASH_KEY, json!("   "));
        assert!(!record.is_valid_for(&session_id(), NOW));

        record.remove(ID_HASH_KEY);
        assert!(!record.is_valid_for(&session_id(), NOW));
    }

    #[test]
    fn test_ttl_elapsed_is_invalid() {
        let record = SessionRecord::fresh(&session_id(), NOW, 60, 86_400);
        assert!(record.is_valid_for(&session_id(), NOW + 60));
        assert!(!record.is_valid_for(&session_id(), NOW + 61));
    }

    #[test]
    fn test_expires_elapsed_is_invalid_even_if_renewed() {
        let mut record = SessionRecord::fresh(&session_id(), NOW, 60, 100);
        record.renew(NOW + 90, 60);
        assert!(record.is_valid_for(&session_id(), NOW + 100));
        assert!(!record.is_valid_for(&session_id(), NOW + 101));
    }

    #[test]
    fn test_missing_deadlines_are_invalid() {
        let mut record = SessionRecord::fresh(&session_id(), NOW, 60, 100);
        record.remove(TTL_KEY);
        assert!(!record.is_valid_for(&session_id(), NOW));

        let mut record = SessionRecord::fresh(&session_id(), NOW, 60, 100);
        record.insert(EXPIRES_KEY, json!("tomorrow"));
        assert!(!record.is_valid_for(&session_id(), NOW));
    }

    #[test]
    fn test_is_expired() {
        let record = SessionRecord::fresh(&session_id(), NOW, 60, 100);
        assert!(!record.is_expired(NOW));
        assert!(record.is_expired(NOW + 61));
        assert!(SessionRecord::new().is_expired(NOW));
    }

    #[test]
    fn test_clear_user_data_keeps_bookkeeping() {
        let mut record = SessionRecord::fresh(&session_id(), NOW, 60, 100);
        record.insert("foo", json!("bar"));
        record.insert("baz", json!([1, 2, 3]));

        record.clear_user_data();

        assert_eq!(record.len(), 3);
        assert!(record.user_data().is_empty());
        assert!(record.is_valid_for(&session_id(), NOW));
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let mut record = SessionRecord::fresh(&session_id(), NOW, 60, 100);
        record.insert("foo", json!("bar"));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["foo"], json!("bar"));
        assert_eq!(value[TTL_KEY], json!(NOW + 60));

        let back: SessionRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
