use std::collections::BTreeSet;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

use crate::intent::{Collection, EmbeddedField, EmbeddedItem, Record, WriteIntent};
use crate::model::{Participant, Snapshot, Trip};

#[derive(Debug)]
pub struct DataStore {
    pub data_dir: PathBuf,
    pub events_path: PathBuf,
    pub trips_path: PathBuf,
    pub todos_path: PathBuf,
    pub wishlist_path: PathBuf,
}

impl DataStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let store = Self {
            events_path: data_dir.join("events.data"),
            trips_path: data_dir.join("trips.data"),
            todos_path: data_dir.join("todos.data"),
            wishlist_path: data_dir.join("wishlist.data"),
            data_dir,
        };
        for collection in Collection::ALL {
            let path = store.path(collection);
            if !path.exists() {
                fs::write(path, "")
                    .with_context(|| format!("failed to create {}", path.display()))?;
            }
        }

        info!(data_dir = %store.data_dir.display(), "opened datastore");
        Ok(store)
    }

    pub fn path(&self, collection: Collection) -> &Path {
        match collection {
            Collection::Events => &self.events_path,
            Collection::Trips => &self.trips_path,
            Collection::Todos => &self.todos_path,
            Collection::Wishlist => &self.wishlist_path,
        }
    }

    /// All four collections, with keys filled in on keyless embedded items.
    #[tracing::instrument(skip(self))]
    pub fn snapshot(&self) -> anyhow::Result<Snapshot> {
        let mut snapshot = Snapshot {
            events: load_jsonl(&self.events_path).context("failed to load events.data")?,
            trips: load_jsonl(&self.trips_path).context("failed to load trips.data")?,
            todos: load_jsonl(&self.todos_path).context("failed to load todos.data")?,
            wishlist: load_jsonl(&self.wishlist_path).context("failed to load wishlist.data")?,
        };
        for event in &mut snapshot.events {
            event.assign_missing_keys();
        }
        for trip in &mut snapshot.trips {
            trip.assign_missing_keys();
        }
        debug!(
            events = snapshot.events.len(),
            trips = snapshot.trips.len(),
            todos = snapshot.todos.len(),
            wishlist = snapshot.wishlist.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }

    #[tracing::instrument(skip(self, snapshot))]
    pub fn save(&self, snapshot: &Snapshot, collection: Collection) -> anyhow::Result<()> {
        let path = self.path(collection);
        let result = match collection {
            Collection::Events => save_jsonl_atomic(path, &snapshot.events),
            Collection::Trips => save_jsonl_atomic(path, &snapshot.trips),
            Collection::Todos => save_jsonl_atomic(path, &snapshot.todos),
            Collection::Wishlist => save_jsonl_atomic(path, &snapshot.wishlist),
        };
        result.with_context(|| format!("failed to save {collection}.data"))
    }

    /// Executes `intents` in order against `snapshot`, then saves every
    /// collection that changed. Returns the ids given to created records.
    ///
    /// Nothing is written when an intent fails.
    #[tracing::instrument(skip(self, snapshot, intents), fields(count = intents.len()))]
    pub fn apply(
        &self,
        snapshot: &mut Snapshot,
        intents: &[WriteIntent],
    ) -> anyhow::Result<Vec<String>> {
        let mut staged = snapshot.clone();
        let mut touched = BTreeSet::new();
        let mut created = Vec::new();

        for intent in intents {
            debug!(intent = %intent.describe(), "applying write intent");
            if let Some(id) = apply_one(&mut staged, intent)? {
                created.push(id);
            }
            touched.insert(intent.collection());
        }

        for collection in &touched {
            self.save(&staged, *collection)?;
        }
        *snapshot = staged;

        info!(
            intents = intents.len(),
            collections = touched.len(),
            created = created.len(),
            "applied write intents"
        );
        Ok(created)
    }
}

fn apply_one(snapshot: &mut Snapshot, intent: &WriteIntent) -> anyhow::Result<Option<String>> {
    match intent {
        WriteIntent::Create { record } => {
            let id = Uuid::new_v4().to_string();
            match record.clone() {
                Record::Events(mut event) => {
                    event.id = id.clone();
                    snapshot.events.push(event);
                }
                Record::Trips(mut trip) => {
                    trip.id = id.clone();
                    snapshot.trips.push(trip);
                }
                Record::Todos(mut todo) => {
                    todo.id = id.clone();
                    snapshot.todos.push(todo);
                }
                Record::Wishlist(mut item) => {
                    item.id = id.clone();
                    snapshot.wishlist.push(item);
                }
            }
            Ok(Some(id))
        }
        WriteIntent::Update {
            collection,
            id,
            fields,
        } => {
            match collection {
                Collection::Events => patch_by_id(&mut snapshot.events, id, fields, |e| &e.id),
                Collection::Trips => patch_by_id(&mut snapshot.trips, id, fields, |t| &t.id),
                Collection::Todos => patch_by_id(&mut snapshot.todos, id, fields, |t| &t.id),
                Collection::Wishlist => {
                    patch_by_id(&mut snapshot.wishlist, id, fields, |w| &w.id)
                }
            }
            .with_context(|| format!("failed to update {collection}/{id}"))?;
            Ok(None)
        }
        WriteIntent::Delete { collection, id } => {
            let removed = match collection {
                Collection::Events => remove_by_id(&mut snapshot.events, id, |e| &e.id),
                Collection::Trips => remove_by_id(&mut snapshot.trips, id, |t| &t.id),
                Collection::Todos => remove_by_id(&mut snapshot.todos, id, |t| &t.id),
                Collection::Wishlist => remove_by_id(&mut snapshot.wishlist, id, |w| &w.id),
            };
            if !removed {
                return Err(anyhow!("no {collection} record with id {id}"));
            }
            Ok(None)
        }
        WriteIntent::AddEmbedded {
            collection,
            id,
            item,
        } => {
            match (collection, item) {
                (Collection::Trips, EmbeddedItem::Todo(todo)) => {
                    trip_mut(snapshot, id)?.todos.push(todo.clone());
                }
                (_, EmbeddedItem::Participant(participant)) => {
                    participants_mut(snapshot, *collection, id)?.push(participant.clone());
                }
                (other, EmbeddedItem::Todo(_)) => {
                    return Err(anyhow!("{other} records have no embedded todos"));
                }
            }
            Ok(None)
        }
        WriteIntent::RemoveEmbedded {
            collection,
            id,
            field,
            key,
        } => {
            let removed = match field {
                EmbeddedField::Todos => {
                    if *collection != Collection::Trips {
                        return Err(anyhow!("{collection} records have no embedded todos"));
                    }
                    let trip = trip_mut(snapshot, id)?;
                    let before = trip.todos.len();
                    trip.todos.retain(|todo| todo.key != *key);
                    before != trip.todos.len()
                }
                EmbeddedField::Participants => {
                    let participants = participants_mut(snapshot, *collection, id)?;
                    let before = participants.len();
                    participants.retain(|p| p.key != *key);
                    before != participants.len()
                }
            };
            if !removed {
                return Err(anyhow!("no embedded item {key} on {collection}/{id}"));
            }
            Ok(None)
        }
    }
}

fn trip_mut<'a>(snapshot: &'a mut Snapshot, id: &str) -> anyhow::Result<&'a mut Trip> {
    snapshot
        .trips
        .iter_mut()
        .find(|trip| trip.id == id)
        .ok_or_else(|| anyhow!("no trips record with id {id}"))
}

fn participants_mut<'a>(
    snapshot: &'a mut Snapshot,
    collection: Collection,
    id: &str,
) -> anyhow::Result<&'a mut Vec<Participant>> {
    match collection {
        Collection::Events => snapshot
            .events
            .iter_mut()
            .find(|event| event.id == id)
            .map(|event| &mut event.participants)
            .ok_or_else(|| anyhow!("no events record with id {id}")),
        Collection::Trips => trip_mut(snapshot, id).map(|trip| &mut trip.participants),
        other => Err(anyhow!("{other} records have no participants")),
    }
}

fn remove_by_id<T>(records: &mut Vec<T>, id: &str, id_of: impl Fn(&T) -> &String) -> bool {
    let before = records.len();
    records.retain(|record| id_of(record) != id);
    before != records.len()
}

/// Merges `fields` over the record's JSON form and reads it back, so a
/// patch goes through the same field names and lenient parsing as a load.
fn patch_by_id<T>(
    records: &mut [T],
    id: &str,
    fields: &Map<String, Value>,
    id_of: impl Fn(&T) -> &String,
) -> anyhow::Result<()>
where
    T: Serialize + DeserializeOwned,
{
    let record = records
        .iter_mut()
        .find(|record| id_of(record) == id)
        .ok_or_else(|| anyhow!("record not found"))?;

    let mut value = serde_json::to_value(&*record)?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| anyhow!("record did not serialize to an object"))?;
    for (name, field) in fields {
        if name == "id" {
            return Err(anyhow!("the id field cannot be updated"));
        }
        object.insert(name.clone(), field.clone());
    }
    *record = serde_json::from_value(value)?;
    Ok(())
}

#[tracing::instrument(skip(path))]
fn load_jsonl<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record: T = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(record);
    }

    debug!(count = out.len(), "loaded records from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, records))]
fn save_jsonl_atomic<T: Serialize>(path: &Path, records: &[T]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = records.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for record in records {
        let serialized = serde_json::to_string(record)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datekey::parse_date_key;
    use crate::model::{GlobalTodo, WishlistItem};
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn open_creates_collection_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(dir.path()).expect("open");
        for collection in Collection::ALL {
            assert!(store.path(collection).exists());
        }
        assert_eq!(store.snapshot().expect("snapshot"), Snapshot::default());
    }

    #[test]
    fn malformed_line_names_file_and_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(dir.path()).expect("open");
        fs::write(&store.todos_path, "{\"id\":\"a\",\"text\":\"ok\"}\nnot json\n").expect("write");
        let err = store.snapshot().expect_err("bad line");
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn apply_creates_updates_and_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(dir.path()).expect("open");
        let mut snapshot = store.snapshot().expect("snapshot");

        let due = parse_date_key("2024-01-01").expect("key");
        let created = store
            .apply(
                &mut snapshot,
                &[WriteIntent::create(Record::Todos(GlobalTodo::new("a", due, Utc::now())))],
            )
            .expect("create");
        assert_eq!(created.len(), 1);
        let id = created[0].clone();

        store
            .apply(
                &mut snapshot,
                &[WriteIntent::update(Collection::Todos, &id, [("done", json!(true))])],
            )
            .expect("update");

        let reloaded = store.snapshot().expect("reload");
        assert_eq!(reloaded, snapshot);
        assert!(reloaded.todo(&id).expect("todo").done);
    }

    #[test]
    fn failed_batch_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(dir.path()).expect("open");
        let mut snapshot = store.snapshot().expect("snapshot");

        let result = store.apply(
            &mut snapshot,
            &[
                WriteIntent::create(Record::Wishlist(WishlistItem::new("camera", Utc::now()))),
                WriteIntent::delete(Collection::Wishlist, "missing"),
            ],
        );
        assert!(result.is_err());
        assert!(snapshot.wishlist.is_empty());
        assert!(store.snapshot().expect("reload").wishlist.is_empty());
    }

    #[test]
    fn keyless_items_keep_their_key_once_saved() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(dir.path()).expect("open");
        fs::write(
            &store.trips_path,
            "{\"id\":\"t\",\"name\":\"Kyoto\",\"participants\":[{\"name\":\"Mika\"},{\"name\":\"Mika\"}]}\n",
        )
        .expect("write");

        let mut snapshot = store.snapshot().expect("snapshot");
        let keys: Vec<Uuid> = snapshot.trips[0].participants.iter().map(|p| p.key).collect();
        assert_ne!(keys[0], keys[1]);

        store
            .apply(
                &mut snapshot,
                &[WriteIntent::RemoveEmbedded {
                    collection: Collection::Trips,
                    id: "t".into(),
                    field: EmbeddedField::Participants,
                    key: keys[0],
                }],
            )
            .expect("remove");

        let reloaded = store.snapshot().expect("reload");
        assert_eq!(reloaded.trips[0].participants.len(), 1);
        assert_eq!(reloaded.trips[0].participants[0].key, keys[1]);
    }
}
