//! User actions. Each validates its input against the current snapshot and
//! returns the write intents the store should execute; nothing here touches
//! the store.

use anyhow::{Context, anyhow, ensure};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tracing::{debug, info};
use uuid::Uuid;

use crate::datekey::{DateKey, Recurrence};
use crate::intent::{Collection, EmbeddedField, EmbeddedItem, Record, WriteIntent};
use crate::model::{Event, GlobalTodo, Participant, Snapshot, Trip, TripTodo, WishlistItem};
use crate::ordering::{Direction, move_wishlist_item};
use crate::recurrence::{next_global_todo, next_trip};

#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub name: String,
    pub start_date: Option<DateKey>,
    pub end_date: Option<DateKey>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub recurring: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewTrip {
    pub name: String,
    pub start_date: Option<DateKey>,
    pub end_date: Option<DateKey>,
    pub description: Option<String>,
    pub recurrence: Recurrence,
}

#[derive(Debug, Clone, Default)]
pub struct NewTodo {
    pub text: String,
    pub due_date: Option<DateKey>,
    pub assignee: Option<String>,
    pub recurrence: Recurrence,
}

#[derive(Debug, Clone, Default)]
pub struct NewTripTodo {
    pub text: String,
    pub assignee: String,
    pub due_date: Option<DateKey>,
}

/// Fields left `None` keep their current value.
#[derive(Debug, Clone, Default)]
pub struct TripTodoEdit {
    pub text: Option<String>,
    pub assignee: Option<String>,
    pub due_date: Option<DateKey>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_text(value: &str, what: &str) -> anyhow::Result<String> {
    let trimmed = value.trim();
    ensure!(!trimmed.is_empty(), "{what} is required");
    Ok(trimmed.to_string())
}

#[tracing::instrument(skip(input), fields(name = %input.name))]
pub fn create_event(input: NewEvent) -> anyhow::Result<Vec<WriteIntent>> {
    let name = required_text(&input.name, "event name")?;
    let start_date = input.start_date.context("event start date is required")?;
    let end_date = input.end_date.context("event end date is required")?;
    let start_time = non_empty(input.start_time).context("event start time is required")?;

    Ok(vec![WriteIntent::create(Record::Events(Event {
        id: String::new(),
        name,
        start_date: Some(start_date),
        end_date: Some(end_date),
        start_time: Some(start_time),
        end_time: non_empty(input.end_time),
        location: non_empty(input.location),
        description: non_empty(input.description),
        recurring: input.recurring,
        participants: Vec::new(),
    }))])
}

#[tracing::instrument(skip(input), fields(name = %input.name))]
pub fn create_trip(input: NewTrip) -> anyhow::Result<Vec<WriteIntent>> {
    let name = required_text(&input.name, "trip name")?;
    let start_date = input.start_date.context("trip start date is required")?;
    let end_date = input.end_date.context("trip end date is required")?;
    ensure!(
        start_date <= end_date,
        "trip ends before it starts ({start_date} > {end_date})"
    );

    Ok(vec![WriteIntent::create(Record::Trips(Trip {
        id: String::new(),
        name,
        start_date: Some(start_date),
        end_date: Some(end_date),
        description: non_empty(input.description),
        recurrence: input.recurrence,
        participants: Vec::new(),
        todos: Vec::new(),
    }))])
}

#[tracing::instrument(skip(input, now), fields(text = %input.text))]
pub fn create_todo(input: NewTodo, now: DateTime<Utc>) -> anyhow::Result<Vec<WriteIntent>> {
    let text = required_text(&input.text, "todo text")?;
    let due_date = input.due_date.context("todo due date is required")?;
    let mut todo = GlobalTodo::new(text, due_date, now);
    todo.assignee = non_empty(input.assignee);
    todo.recurrence = input.recurrence;
    Ok(vec![WriteIntent::create(Record::Todos(todo))])
}

pub fn create_wish(text: &str, now: DateTime<Utc>) -> anyhow::Result<Vec<WriteIntent>> {
    let text = required_text(text, "wishlist text")?;
    Ok(vec![WriteIntent::create(Record::Wishlist(WishlistItem::new(
        text, now,
    )))])
}

fn find_todo<'a>(snapshot: &'a Snapshot, id: &str) -> anyhow::Result<&'a GlobalTodo> {
    snapshot
        .todo(id)
        .ok_or_else(|| anyhow!("no todo with id {id}"))
}

fn find_trip<'a>(snapshot: &'a Snapshot, id: &str) -> anyhow::Result<&'a Trip> {
    snapshot
        .trip(id)
        .ok_or_else(|| anyhow!("no trip with id {id}"))
}

fn find_wish<'a>(snapshot: &'a Snapshot, id: &str) -> anyhow::Result<&'a WishlistItem> {
    snapshot
        .wish(id)
        .ok_or_else(|| anyhow!("no wishlist item with id {id}"))
}

/// Flips a global todo. Marking a recurring todo done also creates its next
/// occurrence; un-marking never does.
#[tracing::instrument(skip(snapshot, now))]
pub fn toggle_global_todo(
    snapshot: &Snapshot,
    id: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<WriteIntent>> {
    let todo = find_todo(snapshot, id)?;
    let done = !todo.done;
    let mut intents = vec![WriteIntent::update(
        Collection::Todos,
        &todo.id,
        [("done", json!(done))],
    )];

    if done && let Some(next) = next_global_todo(todo, now, now.timestamp_millis()) {
        info!(
            due = ?next.due_date,
            recurrence = next.recurrence.as_str(),
            "scheduling next occurrence"
        );
        intents.push(WriteIntent::create(Record::Todos(next)));
    }
    Ok(intents)
}

#[tracing::instrument(skip(snapshot))]
pub fn toggle_wish(snapshot: &Snapshot, id: &str) -> anyhow::Result<Vec<WriteIntent>> {
    let item = find_wish(snapshot, id)?;
    Ok(vec![WriteIntent::update(
        Collection::Wishlist,
        &item.id,
        [("done", json!(!item.done))],
    )])
}

#[tracing::instrument(skip(snapshot, now))]
pub fn move_wish(
    snapshot: &Snapshot,
    id: &str,
    direction: Direction,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<WriteIntent>> {
    find_wish(snapshot, id)?;
    Ok(move_wishlist_item(
        &snapshot.wishlist,
        id,
        direction,
        now.timestamp_millis(),
    ))
}

#[tracing::instrument(skip(snapshot))]
pub fn delete_record(
    snapshot: &Snapshot,
    collection: Collection,
    id: &str,
) -> anyhow::Result<Vec<WriteIntent>> {
    let exists = match collection {
        Collection::Events => snapshot.event(id).is_some(),
        Collection::Trips => snapshot.trip(id).is_some(),
        Collection::Todos => snapshot.todo(id).is_some(),
        Collection::Wishlist => snapshot.wish(id).is_some(),
    };
    ensure!(exists, "no {collection} record with id {id}");
    Ok(vec![WriteIntent::delete(collection, id)])
}

#[tracing::instrument(skip(snapshot))]
pub fn next_trip_occurrence(snapshot: &Snapshot, id: &str) -> anyhow::Result<Vec<WriteIntent>> {
    let trip = find_trip(snapshot, id)?;
    ensure!(
        !trip.recurrence.is_none(),
        "trip {} does not repeat",
        trip.name
    );
    let next = next_trip(trip).with_context(|| format!("trip {} has no start date", trip.name))?;
    info!(start = ?next.start_date, end = ?next.end_date, "scheduling next trip");
    Ok(vec![WriteIntent::create(Record::Trips(next))])
}

#[tracing::instrument(skip(snapshot, input), fields(text = %input.text))]
pub fn add_trip_todo(
    snapshot: &Snapshot,
    trip_id: &str,
    input: NewTripTodo,
) -> anyhow::Result<Vec<WriteIntent>> {
    let trip = find_trip(snapshot, trip_id)?;
    let text = required_text(&input.text, "trip todo text")?;
    ensure!(
        !trip.participants.is_empty(),
        "add at least one participant to {} before assigning todos",
        trip.name
    );
    let assignee = required_text(&input.assignee, "trip todo assignee")?;
    ensure!(
        trip.has_participant_named(&assignee),
        "{assignee} is not a participant of {}",
        trip.name
    );
    let due_date = input.due_date.context("trip todo due date is required")?;

    Ok(vec![WriteIntent::AddEmbedded {
        collection: Collection::Trips,
        id: trip.id.clone(),
        item: EmbeddedItem::Todo(TripTodo {
            key: Uuid::new_v4(),
            text,
            assignee,
            done: false,
            due_date: Some(due_date),
            order: None,
        }),
    }])
}

/// The replacement carries the same key so the item keeps its identity.
#[tracing::instrument(skip(snapshot))]
pub fn toggle_trip_todo(
    snapshot: &Snapshot,
    trip_id: &str,
    key: Uuid,
) -> anyhow::Result<Vec<WriteIntent>> {
    let trip = find_trip(snapshot, trip_id)?;
    let todo = trip
        .todo(key)
        .with_context(|| format!("no todo {key} on trip {}", trip.name))?;
    let toggled = TripTodo {
        done: !todo.done,
        ..todo.clone()
    };
    debug!(done = toggled.done, "toggling trip todo");

    Ok(vec![
        WriteIntent::RemoveEmbedded {
            collection: Collection::Trips,
            id: trip.id.clone(),
            field: EmbeddedField::Todos,
            key,
        },
        WriteIntent::AddEmbedded {
            collection: Collection::Trips,
            id: trip.id.clone(),
            item: EmbeddedItem::Todo(toggled),
        },
    ])
}

/// Rewrites a trip todo in place under its key. A new assignee must still
/// be one of the trip's participants.
#[tracing::instrument(skip(snapshot, edit))]
pub fn edit_trip_todo(
    snapshot: &Snapshot,
    trip_id: &str,
    key: Uuid,
    edit: TripTodoEdit,
) -> anyhow::Result<Vec<WriteIntent>> {
    let trip = find_trip(snapshot, trip_id)?;
    let todo = trip
        .todo(key)
        .with_context(|| format!("no todo {key} on trip {}", trip.name))?;
    ensure!(
        edit.text.is_some() || edit.assignee.is_some() || edit.due_date.is_some(),
        "nothing to change: pass a text, assignee or due date"
    );

    let mut edited = todo.clone();
    if let Some(text) = edit.text {
        edited.text = required_text(&text, "trip todo text")?;
    }
    if let Some(assignee) = edit.assignee {
        let assignee = required_text(&assignee, "trip todo assignee")?;
        ensure!(
            trip.has_participant_named(&assignee),
            "{assignee} is not a participant of {}",
            trip.name
        );
        edited.assignee = assignee;
    }
    if let Some(due_date) = edit.due_date {
        edited.due_date = Some(due_date);
    }
    debug!(text = %edited.text, assignee = %edited.assignee, "editing trip todo");

    Ok(vec![
        WriteIntent::RemoveEmbedded {
            collection: Collection::Trips,
            id: trip.id.clone(),
            field: EmbeddedField::Todos,
            key,
        },
        WriteIntent::AddEmbedded {
            collection: Collection::Trips,
            id: trip.id.clone(),
            item: EmbeddedItem::Todo(edited),
        },
    ])
}

#[tracing::instrument(skip(snapshot))]
pub fn remove_trip_todo(
    snapshot: &Snapshot,
    trip_id: &str,
    key: Uuid,
) -> anyhow::Result<Vec<WriteIntent>> {
    let trip = find_trip(snapshot, trip_id)?;
    trip.todo(key)
        .with_context(|| format!("no todo {key} on trip {}", trip.name))?;
    Ok(vec![WriteIntent::RemoveEmbedded {
        collection: Collection::Trips,
        id: trip.id.clone(),
        field: EmbeddedField::Todos,
        key,
    }])
}

fn participants_of<'a>(
    snapshot: &'a Snapshot,
    collection: Collection,
    id: &str,
) -> anyhow::Result<&'a [Participant]> {
    match collection {
        Collection::Events => snapshot
            .event(id)
            .map(|event| event.participants.as_slice())
            .ok_or_else(|| anyhow!("no event with id {id}")),
        Collection::Trips => find_trip(snapshot, id).map(|trip| trip.participants.as_slice()),
        other => Err(anyhow!("{other} records have no participants")),
    }
}

#[tracing::instrument(skip(snapshot))]
pub fn add_participant(
    snapshot: &Snapshot,
    collection: Collection,
    id: &str,
    name: &str,
    contact: Option<String>,
) -> anyhow::Result<Vec<WriteIntent>> {
    participants_of(snapshot, collection, id)?;
    let mut participant = Participant::new(required_text(name, "participant name")?);
    participant.contact = non_empty(contact);
    Ok(vec![WriteIntent::AddEmbedded {
        collection,
        id: id.to_string(),
        item: EmbeddedItem::Participant(participant),
    }])
}

#[tracing::instrument(skip(snapshot))]
pub fn remove_participant(
    snapshot: &Snapshot,
    collection: Collection,
    id: &str,
    key: Uuid,
) -> anyhow::Result<Vec<WriteIntent>> {
    let participant = match collection {
        Collection::Events => snapshot
            .event(id)
            .ok_or_else(|| anyhow!("no event with id {id}"))?
            .participant(key),
        Collection::Trips => find_trip(snapshot, id)?.participant(key),
        other => return Err(anyhow!("{other} records have no participants")),
    }
    .with_context(|| format!("no participant {key} on {collection}/{id}"))?;
    debug!(name = %participant.name, "removing participant");
    Ok(vec![WriteIntent::RemoveEmbedded {
        collection,
        id: id.to_string(),
        field: EmbeddedField::Participants,
        key,
    }])
}

/// Sets the description of an event or trip. Blank text clears it.
#[tracing::instrument(skip(snapshot, text))]
pub fn set_description(
    snapshot: &Snapshot,
    collection: Collection,
    id: &str,
    text: &str,
) -> anyhow::Result<Vec<WriteIntent>> {
    let exists = match collection {
        Collection::Events => snapshot.event(id).is_some(),
        Collection::Trips => snapshot.trip(id).is_some(),
        other => return Err(anyhow!("{other} records have no description")),
    };
    ensure!(exists, "no {collection} record with id {id}");
    let value = match text.trim() {
        "" => Value::Null,
        trimmed => json!(trimmed),
    };
    Ok(vec![WriteIntent::update(collection, id, [("description", value)])])
}

/// Resolves a full key or a unique prefix of one, as printed in listings.
pub fn resolve_key(keys: impl IntoIterator<Item = Uuid>, raw: &str) -> anyhow::Result<Uuid> {
    let needle = raw.trim().to_ascii_lowercase();
    ensure!(!needle.is_empty(), "key is required");
    let matches: Vec<Uuid> = keys
        .into_iter()
        .filter(|key| key.to_string().starts_with(&needle))
        .collect();
    match matches.as_slice() {
        [key] => Ok(*key),
        [] => Err(anyhow!("no item matches key {raw}")),
        _ => Err(anyhow!("key prefix {raw} is ambiguous ({} matches)", matches.len())),
    }
}

/// Resolves an exact record id, or else a unique prefix of one.
pub fn resolve_id<'a>(ids: impl IntoIterator<Item = &'a str>, raw: &str) -> anyhow::Result<String> {
    let needle = raw.trim();
    ensure!(!needle.is_empty(), "id is required");
    let ids: Vec<&str> = ids.into_iter().collect();
    if ids.contains(&needle) {
        return Ok(needle.to_string());
    }
    let matches: Vec<&str> = ids
        .into_iter()
        .filter(|id| id.starts_with(needle))
        .collect();
    match matches.as_slice() {
        [id] => Ok((*id).to_string()),
        [] => Err(anyhow!("no record matches id {raw}")),
        _ => Err(anyhow!("id prefix {raw} is ambiguous ({} matches)", matches.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datekey::parse_date_key;

    fn key(raw: &str) -> DateKey {
        parse_date_key(raw).expect("valid key")
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T09:00:00Z")
            .expect("timestamp")
            .with_timezone(&Utc)
    }

    fn trip_with(participants: &[&str]) -> Trip {
        Trip {
            id: "trip-1".into(),
            name: "Kyoto".into(),
            start_date: Some(key("2024-03-08")),
            end_date: Some(key("2024-03-12")),
            description: None,
            recurrence: Recurrence::None,
            participants: participants.iter().map(|name| Participant::new(*name)).collect(),
            todos: vec![],
        }
    }

    #[test]
    fn event_requires_start_time() {
        let err = create_event(NewEvent {
            name: "Picnic".into(),
            start_date: Some(key("2024-05-01")),
            end_date: Some(key("2024-05-01")),
            ..NewEvent::default()
        })
        .expect_err("missing time");
        assert!(err.to_string().contains("start time"));
    }

    #[test]
    fn trip_must_not_end_before_start() {
        let err = create_trip(NewTrip {
            name: "Backwards".into(),
            start_date: Some(key("2024-05-03")),
            end_date: Some(key("2024-05-01")),
            ..NewTrip::default()
        })
        .expect_err("inverted range");
        assert!(err.to_string().contains("ends before"));
    }

    #[test]
    fn blank_wish_is_rejected() {
        assert!(create_wish("   ", now()).is_err());
        assert_eq!(create_wish("a camera", now()).expect("wish").len(), 1);
    }

    #[test]
    fn marking_recurring_todo_done_creates_next() {
        let mut rent = GlobalTodo::new("pay rent", key("2024-01-01"), now());
        rent.id = "rent".into();
        rent.recurrence = Recurrence::Monthly;
        let snapshot = Snapshot {
            todos: vec![rent.clone()],
            ..Snapshot::default()
        };

        let intents = toggle_global_todo(&snapshot, "rent", now()).expect("toggle");
        assert_eq!(intents.len(), 2);
        assert_eq!(intents[0].describe(), "update todos/rent [done]");
        let WriteIntent::Create {
            record: Record::Todos(next),
        } = &intents[1]
        else {
            panic!("expected a created todo");
        };
        assert_eq!(next.due_date, Some(key("2024-02-01")));
        assert!(!next.done);

        rent.done = true;
        let done_snapshot = Snapshot {
            todos: vec![rent],
            ..Snapshot::default()
        };
        let undo = toggle_global_todo(&done_snapshot, "rent", now()).expect("toggle off");
        assert_eq!(undo.len(), 1);
    }

    #[test]
    fn trip_todo_assignee_must_be_participant() {
        let empty = Snapshot {
            trips: vec![trip_with(&[])],
            ..Snapshot::default()
        };
        let input = NewTripTodo {
            text: "Book ryokan".into(),
            assignee: "Mika".into(),
            due_date: Some(key("2024-03-01")),
        };
        let err = add_trip_todo(&empty, "trip-1", input.clone()).expect_err("no participants");
        assert!(err.to_string().contains("at least one participant"));

        let staffed = Snapshot {
            trips: vec![trip_with(&["Ken"])],
            ..Snapshot::default()
        };
        assert!(add_trip_todo(&staffed, "trip-1", input.clone()).is_err());

        let ok = Snapshot {
            trips: vec![trip_with(&["Ken", "Mika"])],
            ..Snapshot::default()
        };
        let intents = add_trip_todo(&ok, "trip-1", input).expect("added");
        assert!(matches!(
            &intents[0],
            WriteIntent::AddEmbedded { item: EmbeddedItem::Todo(todo), .. } if todo.assignee == "Mika"
        ));
    }

    #[test]
    fn toggling_trip_todo_keeps_its_key() {
        let mut trip = trip_with(&["Mika"]);
        let todo_key = Uuid::new_v4();
        trip.todos.push(TripTodo {
            key: todo_key,
            text: "pack".into(),
            assignee: "Mika".into(),
            done: false,
            due_date: Some(key("2024-03-07")),
            order: None,
        });
        let snapshot = Snapshot {
            trips: vec![trip],
            ..Snapshot::default()
        };

        let intents = toggle_trip_todo(&snapshot, "trip-1", todo_key).expect("toggle");
        assert!(matches!(intents[0], WriteIntent::RemoveEmbedded { key, .. } if key == todo_key));
        assert!(matches!(
            &intents[1],
            WriteIntent::AddEmbedded { item: EmbeddedItem::Todo(todo), .. }
                if todo.key == todo_key && todo.done
        ));
        assert!(toggle_trip_todo(&snapshot, "trip-1", Uuid::new_v4()).is_err());
    }

    #[test]
    fn editing_trip_todo_keeps_key_and_checks_assignee() {
        let mut trip = trip_with(&["Mika", "Ken"]);
        let todo_key = Uuid::new_v4();
        trip.todos.push(TripTodo {
            key: todo_key,
            text: "pack".into(),
            assignee: "Mika".into(),
            done: true,
            due_date: Some(key("2024-03-07")),
            order: Some(3),
        });
        let snapshot = Snapshot {
            trips: vec![trip],
            ..Snapshot::default()
        };

        let intents = edit_trip_todo(
            &snapshot,
            "trip-1",
            todo_key,
            TripTodoEdit {
                text: Some(" pack snacks ".into()),
                assignee: Some("Ken".into()),
                due_date: None,
            },
        )
        .expect("edit");
        assert!(matches!(intents[0], WriteIntent::RemoveEmbedded { key, .. } if key == todo_key));
        let WriteIntent::AddEmbedded {
            item: EmbeddedItem::Todo(edited),
            ..
        } = &intents[1]
        else {
            panic!("expected the edited todo");
        };
        assert_eq!(edited.key, todo_key);
        assert_eq!(edited.text, "pack snacks");
        assert_eq!(edited.assignee, "Ken");
        assert_eq!(edited.due_date, Some(key("2024-03-07")));
        assert!(edited.done);
        assert_eq!(edited.order, Some(3));

        let stranger = TripTodoEdit {
            assignee: Some("Aiko".into()),
            ..TripTodoEdit::default()
        };
        let err = edit_trip_todo(&snapshot, "trip-1", todo_key, stranger).expect_err("stranger");
        assert!(err.to_string().contains("not a participant"));
        assert!(edit_trip_todo(&snapshot, "trip-1", todo_key, TripTodoEdit::default()).is_err());
        let blank = TripTodoEdit {
            text: Some("  ".into()),
            ..TripTodoEdit::default()
        };
        assert!(edit_trip_todo(&snapshot, "trip-1", todo_key, blank).is_err());
    }

    #[test]
    fn descriptions_are_set_and_cleared() {
        let snapshot = Snapshot {
            trips: vec![trip_with(&[])],
            ..Snapshot::default()
        };
        let intents =
            set_description(&snapshot, Collection::Trips, "trip-1", " Onsen weekend ").expect("set");
        let WriteIntent::Update { fields, .. } = &intents[0] else {
            panic!("expected an update");
        };
        assert_eq!(fields["description"], json!("Onsen weekend"));

        let intents = set_description(&snapshot, Collection::Trips, "trip-1", "").expect("clear");
        let WriteIntent::Update { fields, .. } = &intents[0] else {
            panic!("expected an update");
        };
        assert!(fields["description"].is_null());

        assert!(set_description(&snapshot, Collection::Events, "trip-1", "x").is_err());
        assert!(set_description(&snapshot, Collection::Wishlist, "trip-1", "x").is_err());
    }

    #[test]
    fn removing_participant_needs_a_known_key() {
        let trip = trip_with(&["Mika"]);
        let mika = trip.participants[0].key;
        let snapshot = Snapshot {
            trips: vec![trip],
            ..Snapshot::default()
        };
        let intents = remove_participant(&snapshot, Collection::Trips, "trip-1", mika).expect("rm");
        assert!(matches!(intents[0], WriteIntent::RemoveEmbedded { key, .. } if key == mika));
        assert!(remove_participant(&snapshot, Collection::Trips, "trip-1", Uuid::new_v4()).is_err());
        assert!(remove_participant(&snapshot, Collection::Events, "trip-1", mika).is_err());
    }

    #[test]
    fn next_occurrence_needs_a_recurring_trip() {
        let mut trip = trip_with(&[]);
        let once = Snapshot {
            trips: vec![trip.clone()],
            ..Snapshot::default()
        };
        assert!(next_trip_occurrence(&once, "trip-1").is_err());

        trip.recurrence = Recurrence::Yearly;
        let yearly = Snapshot {
            trips: vec![trip],
            ..Snapshot::default()
        };
        assert_eq!(next_trip_occurrence(&yearly, "trip-1").expect("next").len(), 1);
    }

    #[test]
    fn unknown_ids_are_errors() {
        let snapshot = Snapshot::default();
        assert!(delete_record(&snapshot, Collection::Events, "nope").is_err());
        assert!(toggle_wish(&snapshot, "nope").is_err());
        assert!(add_participant(&snapshot, Collection::Todos, "x", "Ken", None).is_err());
    }

    #[test]
    fn resolves_key_prefixes() {
        let a = Uuid::parse_str("a1a1a1a1-0000-4000-8000-000000000000").expect("uuid");
        let b = Uuid::parse_str("a1b2b2b2-0000-4000-8000-000000000000").expect("uuid");
        assert_eq!(resolve_key([a, b], "a1a").expect("unique"), a);
        assert!(resolve_key([a, b], "a1").is_err());
        assert!(resolve_key([a, b], "ff").is_err());
    }

    #[test]
    fn exact_id_beats_longer_prefix_match() {
        assert_eq!(resolve_id(["ab", "abc"], "ab").expect("exact"), "ab");
        assert_eq!(resolve_id(["ab", "xyz"], "x").expect("prefix"), "xyz");
        assert!(resolve_id(["ab", "abc"], "a").is_err());
    }
}
