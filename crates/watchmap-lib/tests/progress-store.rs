use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use watchmap::progress::*;
use watchmap_test_utils::temp_data_dir;

const KEY: &str = "watchProgress";

fn init() {
	let _ = env_logger::builder().is_test(true).try_init();
}

/// A backend whose contents can be inspected while the store owns it.
#[derive(Debug, Default, Clone)]
struct SharedBackend(Rc<RefCell<HashMap<String, String>>>);

impl KeyValueBackend for SharedBackend {
	fn get(&self, key: &str) -> watchmap::Result<Option<String>> {
		Ok(self.0.borrow().get(key).cloned())
	}

	fn set(&mut self, key: &str, value: &str) -> watchmap::Result<()> {
		self.0.borrow_mut().insert(key.to_string(), value.to_string());
		Ok(())
	}

	fn delete(&mut self, key: &str) -> watchmap::Result<()> {
		self.0.borrow_mut().remove(key);
		Ok(())
	}
}

/// Reads fine, refuses every write.
#[derive(Debug, Default)]
struct ReadOnlyBackend;

impl KeyValueBackend for ReadOnlyBackend {
	fn get(&self, _key: &str) -> watchmap::Result<Option<String>> {
		Ok(None)
	}

	fn set(&mut self, _key: &str, _value: &str) -> watchmap::Result<()> {
		Err(watchmap::Error::Storage("read only".into()))
	}

	fn delete(&mut self, _key: &str) -> watchmap::Result<()> {
		Err(watchmap::Error::Storage("read only".into()))
	}
}

fn backend_with(raw: &str) -> MemoryBackend {
	let mut backend = MemoryBackend::new();
	backend.set(KEY, raw).unwrap();
	backend
}

#[test]
fn missing_progress_starts_empty() {
	init();
	let store = ProgressStore::load(MemoryBackend::new(), KEY);
	assert!(store.state().is_empty());
	assert!(!store.is_watched("ironman1"));
}

#[test]
fn malformed_progress_starts_empty() {
	init();
	for raw in ["not json", "[true, false]", r#"{"ironman1": "yes"}"#, "42", ""] {
		let store = ProgressStore::load(backend_with(raw), KEY);
		assert!(store.state().is_empty(), "{:?} should be discarded", raw);
	}
}

#[test]
fn saved_progress_loads_back() {
	init();
	let mut store = ProgressStore::load(MemoryBackend::new(), KEY);
	store.set_watched("ironman1", true).unwrap();
	store.set_watched("hulk", false).unwrap();
	/* ids unknown to any catalog survive untouched */
	store.set_watched("retired-film", true).unwrap();

	let reloaded = ProgressStore::load(store.backend().clone(), KEY);
	assert_eq!(reloaded.state(), store.state());
	assert!(reloaded.is_watched("ironman1"));
	assert!(!reloaded.is_watched("hulk"));
	assert!(reloaded.is_watched("retired-film"));
}

#[test]
fn persisted_format_is_a_flat_object() {
	init();
	let mut store = ProgressStore::load(MemoryBackend::new(), KEY);
	store.set_many(["a", "b"], true).unwrap();
	let raw = store.backend().get(KEY).unwrap().unwrap();
	let parsed: HashMap<String, bool> = serde_json::from_str(&raw).unwrap();
	assert_eq!(parsed, HashMap::from([("a".to_string(), true), ("b".to_string(), true)]));
}

#[test]
fn toggle_flips_and_reports() {
	init();
	let mut store = ProgressStore::load(MemoryBackend::new(), KEY);
	assert!(store.toggle("thor1").unwrap());
	assert!(store.is_watched("thor1"));
	assert!(!store.toggle("thor1").unwrap());
	assert!(!store.is_watched("thor1"));
}

#[test]
fn clear_is_idempotent() {
	init();
	let mut store = ProgressStore::load(backend_with(r#"{"a": true}"#), KEY);
	assert!(store.is_watched("a"));

	store.clear().unwrap();
	assert!(store.state().is_empty());
	assert_eq!(store.backend().get(KEY).unwrap(), None);

	store.clear().unwrap();
	assert!(store.state().is_empty());
	assert_eq!(store.backend().get(KEY).unwrap(), None);
}

#[test]
fn batch_writes_once_and_notifies_once() {
	init();
	let mut store = ProgressStore::load(MemoryBackend::new(), KEY);
	let events = Rc::new(RefCell::new(vec![]));
	{
		let events = events.clone();
		store.subscribe(move |event, _| events.borrow_mut().push(event.clone()));
	}

	store.set_many(["a", "b", "c", "d", "e"], true).unwrap();
	assert_eq!(store.backend().write_count(), 1);
	assert_eq!(events.borrow().len(), 1);
	assert!(matches!(&events.borrow()[0], ProgressEvent::Batch { ids, watched: true } if ids.len() == 5));
	assert!(["a", "b", "c", "d", "e"].iter().all(|id| store.is_watched(id)));
}

#[test]
fn listeners_run_in_registration_order() {
	init();
	let mut store = ProgressStore::load(MemoryBackend::new(), KEY);
	let calls = Rc::new(RefCell::new(Vec::<&'static str>::new()));
	let first = {
		let calls = calls.clone();
		store.subscribe(move |_, _| calls.borrow_mut().push("first"))
	};
	{
		let calls = calls.clone();
		store.subscribe(move |_, _| calls.borrow_mut().push("second"));
	}
	assert_eq!(store.listener_count(), 2);

	store.toggle("a").unwrap();
	assert_eq!(*calls.borrow(), ["first", "second"]);

	assert!(store.unsubscribe(first));
	assert!(!store.unsubscribe(first));
	calls.borrow_mut().clear();
	store.clear().unwrap();
	assert_eq!(*calls.borrow(), ["second"]);
}

#[test]
fn listeners_see_persisted_state() {
	init();
	let backend = SharedBackend::default();
	let shared = backend.0.clone();
	let mut store = ProgressStore::load(backend, KEY);
	let checked = Rc::new(RefCell::new(0));
	{
		let checked = checked.clone();
		store.subscribe(move |event, state| {
			if let ProgressEvent::Changed { id, watched } = event {
				assert_eq!(state.is_watched(id), *watched);
				let raw = shared.borrow().get(KEY).cloned().unwrap_or_default();
				let persisted: WatchedState = serde_json::from_str(&raw).unwrap();
				assert_eq!(&persisted, state);
				*checked.borrow_mut() += 1;
			}
		});
	}

	store.toggle("ironman1").unwrap();
	store.toggle("ironman2").unwrap();
	store.toggle("ironman1").unwrap();
	assert_eq!(*checked.borrow(), 3);
}

#[test]
fn failed_write_still_updates_and_notifies() {
	init();
	let mut store = ProgressStore::load(ReadOnlyBackend, KEY);
	let notified = Rc::new(RefCell::new(false));
	{
		let notified = notified.clone();
		store.subscribe(move |_, _| *notified.borrow_mut() = true);
	}

	let res = store.set_watched("a", true);
	assert!(matches!(res, Err(watchmap::Error::Storage(_))));
	assert!(store.is_watched("a"));
	assert!(*notified.borrow());
}

#[test]
fn file_backend_survives_restart() {
	init();
	let dir = temp_data_dir().unwrap();

	let mut store = ProgressStore::load(FileBackend::new(dir.path()), KEY);
	store.set_many(["ironman1", "ironman2"], true).unwrap();
	assert!(dir.path().join("watchProgress.json").is_file());
	drop(store);

	let mut store = ProgressStore::load(FileBackend::new(dir.path()), KEY);
	assert!(store.is_watched("ironman1"));
	assert!(store.is_watched("ironman2"));

	store.clear().unwrap();
	assert!(!dir.path().join("watchProgress.json").exists());
	store.clear().unwrap();

	let store = ProgressStore::load(FileBackend::new(dir.path()), KEY);
	assert!(store.state().is_empty());
}

#[test]
fn file_backend_creates_missing_dir() {
	init();
	let dir = temp_data_dir().unwrap();
	let nested = dir.path().join("nested").join("data");
	let mut backend = FileBackend::new(&nested);
	assert_eq!(backend.get(KEY).unwrap(), None);
	backend.set(KEY, "{}").unwrap();
	assert_eq!(backend.get(KEY).unwrap().as_deref(), Some("{}"));
}

#[test]
fn file_backend_rejects_path_like_keys() {
	init();
	let dir = temp_data_dir().unwrap();
	let mut backend = FileBackend::new(dir.path());
	for key in ["", "../escape", "a/b", ".hidden"] {
		assert!(matches!(backend.set(key, "{}"), Err(watchmap::Error::Storage(_))), "{:?} should be rejected", key);
	}

	/* an unreadable key degrades to empty progress */
	let store = ProgressStore::load(FileBackend::new(dir.path()), "../escape");
	assert!(store.state().is_empty());
}

#[test]
fn failed_file_write_leaves_no_temp_file() {
	init();
	let dir = temp_data_dir().unwrap();
	/* a non-empty directory where the progress file belongs makes the rename fail */
	let blocker = dir.path().join("watchProgress.json");
	std::fs::create_dir(&blocker).unwrap();
	std::fs::write(blocker.join("keep"), "").unwrap();

	let mut backend = FileBackend::new(dir.path());
	assert!(matches!(backend.set(KEY, "{}"), Err(watchmap::Error::IO(_))));
	assert!(!dir.path().join("watchProgress.json.tmp").exists());
	assert!(blocker.join("keep").is_file());
}

#[test]
fn saved_progress_keeps_watch_order() {
	init();
	let backend = SharedBackend::default();
	let mut store = ProgressStore::load(backend.clone(), KEY);
	for id in ["thor1", "ironman1", "hulk"] {
		store.set_watched(id, true).unwrap();
	}
	/* setting an id again makes it the most recent */
	store.set_watched("thor1", true).unwrap();
	store.set_watched("hulk", false).unwrap();

	let saved = backend.0.borrow().get(KEY).cloned().unwrap();
	assert_eq!(saved, r#"{"ironman1":true,"thor1":true,"hulk":false}"#);

	let store = ProgressStore::load(backend, KEY);
	let recent: Vec<&str> = store.state().recently_watched().map(String::as_str).collect();
	assert_eq!(recent, ["thor1", "ironman1"]);
}
