use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::debug;

use crate::game::{GameCode, Session, SessionPatch};
use crate::store::{Listener, SessionStore, StoreError, Subscription};

type Document = Map<String, Value>;

/// In-process document store.
///
/// Sessions are kept as JSON objects and patches merge top-level fields, the
/// way a hosted document database applies partial updates. Listeners run
/// after the lock is released, so they may read or write the store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    documents: HashMap<GameCode, Document>,
    listeners: HashMap<GameCode, Vec<(u64, Listener)>>,
    next_listener: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.documents.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn stamp(document: &mut Document) {
    let version = document.get("version").and_then(Value::as_u64).unwrap_or(0) + 1;
    document.insert("version".into(), Value::from(version));
    document.insert(
        "last_updated".into(),
        Value::from(Utc::now().timestamp_millis()),
    );
}

fn to_document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

impl SessionStore for MemoryStore {
    fn create_session(&self, session: Session) -> Result<Session, StoreError> {
        let code = session.code.clone();
        let mut document = to_document(serde_json::to_value(&session)?);
        document.insert("version".into(), Value::from(0u64));
        stamp(&mut document);

        let mut inner = self.lock()?;
        if inner.documents.contains_key(&code) {
            return Err(StoreError::DuplicateCode(code));
        }
        let stored: Session = serde_json::from_value(Value::Object(document.clone()))?;
        inner.documents.insert(code.clone(), document);
        debug!(%code, "session created");
        Ok(stored)
    }

    fn get_session(&self, code: &GameCode) -> Result<Option<Session>, StoreError> {
        let inner = self.lock()?;
        inner
            .documents
            .get(code)
            .map(|document| serde_json::from_value(Value::Object(document.clone())))
            .transpose()
            .map_err(StoreError::from)
    }

    fn apply_patch(&self, code: &GameCode, patch: SessionPatch) -> Result<Session, StoreError> {
        let fields = patch.changed_fields();
        let update = to_document(serde_json::to_value(&patch)?);

        let (snapshot, listeners) = {
            let mut inner = self.lock()?;
            let document = inner
                .documents
                .get_mut(code)
                .ok_or_else(|| StoreError::NotFound(code.clone()))?;
            for (field, value) in update {
                document.insert(field, value);
            }
            stamp(document);
            let snapshot: Session = serde_json::from_value(Value::Object(document.clone()))?;
            let listeners: Vec<Listener> = inner
                .listeners
                .get(code)
                .map(|entries| entries.iter().map(|(_, l)| Arc::clone(l)).collect())
                .unwrap_or_default();
            (snapshot, listeners)
        };

        debug!(%code, version = snapshot.version, ?fields, "patch applied");
        for listener in &listeners {
            listener(&snapshot);
        }
        Ok(snapshot)
    }

    fn subscribe(&self, code: &GameCode, listener: Listener) -> Result<Subscription, StoreError> {
        let id = {
            let mut inner = self.lock()?;
            if !inner.documents.contains_key(code) {
                return Err(StoreError::NotFound(code.clone()));
            }
            let id = inner.next_listener;
            inner.next_listener += 1;
            inner
                .listeners
                .entry(code.clone())
                .or_default()
                .push((id, listener));
            id
        };

        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        let code = code.clone();
        Ok(Subscription::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if let Ok(mut inner) = inner.lock() {
                if let Some(entries) = inner.listeners.get_mut(&code) {
                    entries.retain(|(entry, _)| *entry != id);
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::game::GameConfig;

    fn session(code: &str) -> Session {
        let mut rng = StdRng::seed_from_u64(1);
        Session::create(code.parse().unwrap(), "h", "Host", GameConfig::default(), &mut rng)
    }

    #[test]
    fn create_and_read_back() {
        let store = MemoryStore::new();
        let created = store.create_session(session("AAAA")).unwrap();
        assert_eq!(created.version, 1);
        assert!(created.last_updated > 0);
        let read = store.get_session(&created.code).unwrap().unwrap();
        assert_eq!(read, created);
        assert!(store.get_session(&"ZZZZ".parse().unwrap()).unwrap().is_none());
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        let store = MemoryStore::new();
        store.create_session(session("AAAA")).unwrap();
        assert!(matches!(
            store.create_session(session("AAAA")),
            Err(StoreError::DuplicateCode(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn patches_merge_per_field_and_bump_the_version() {
        let store = MemoryStore::new();
        let base = store.create_session(session("BBBB")).unwrap();

        let mut first = base.clone();
        first.has_rolled = true;
        let mut second = base.clone();
        second.free_roads = 2;
        store
            .apply_patch(&base.code, SessionPatch::diff(&base, &first))
            .unwrap();
        let merged = store
            .apply_patch(&base.code, SessionPatch::diff(&base, &second))
            .unwrap();
        assert!(merged.has_rolled);
        assert_eq!(merged.free_roads, 2);
        assert_eq!(merged.version, 3);
    }

    #[test]
    fn patching_a_missing_session_fails() {
        let store = MemoryStore::new();
        let err = store
            .apply_patch(&"NOPE".parse().unwrap(), SessionPatch::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn subscribers_see_every_write_until_dropped() {
        let store = MemoryStore::new();
        let base = store.create_session(session("CCCC")).unwrap();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let subscription = store
            .subscribe(
                &base.code,
                Arc::new(move |_: &Session| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        let patch = SessionPatch {
            current_player: Some(0),
            ..SessionPatch::default()
        };
        store.apply_patch(&base.code, patch.clone()).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        drop(subscription);
        store.apply_patch(&base.code, patch).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listeners_may_read_the_store() {
        let store = MemoryStore::new();
        let base = store.create_session(session("DDDD")).unwrap();
        let reader = store.clone();
        let code = base.code.clone();
        let versions = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&versions);
        let _subscription = store
            .subscribe(
                &base.code,
                Arc::new(move |_: &Session| {
                    let current = reader.get_session(&code).unwrap().unwrap();
                    sink.lock().unwrap().push(current.version);
                }),
            )
            .unwrap();
        store
            .apply_patch(
                &base.code,
                SessionPatch {
                    has_rolled: Some(true),
                    ..SessionPatch::default()
                },
            )
            .unwrap();
        assert_eq!(*versions.lock().unwrap(), vec![2]);
    }
}
