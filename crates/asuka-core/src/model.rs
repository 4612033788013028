use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datekey::{DateKey, Recurrence, lenient_date_serde, lenient_timestamp_serde};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    #[serde(default)]
    pub key: Uuid,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

impl Participant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            key: Uuid::new_v4(),
            name: name.into(),
            contact: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, with = "lenient_date_serde")]
    pub start_date: Option<DateKey>,

    #[serde(default, with = "lenient_date_serde")]
    pub end_date: Option<DateKey>,

    #[serde(default)]
    pub start_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub recurring: bool,

    #[serde(default)]
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TripTodo {
    #[serde(default)]
    pub key: Uuid,

    #[serde(default)]
    pub text: String,

    /// Person in charge; one of the trip's participants.
    #[serde(default, rename = "pic")]
    pub assignee: String,

    #[serde(default)]
    pub done: bool,

    #[serde(default, with = "lenient_date_serde")]
    pub due_date: Option<DateKey>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, with = "lenient_date_serde")]
    pub start_date: Option<DateKey>,

    #[serde(default, with = "lenient_date_serde")]
    pub end_date: Option<DateKey>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub recurrence: Recurrence,

    #[serde(default)]
    pub participants: Vec<Participant>,

    #[serde(default)]
    pub todos: Vec<TripTodo>,
}

impl Trip {
    /// Trips cover their whole date range; a trip with no start covers nothing.
    pub fn contains(&self, date: DateKey) -> bool {
        self.start_date
            .is_some_and(|start| crate::datekey::is_within_range(date, start, self.end_date))
    }

    pub fn todo(&self, key: Uuid) -> Option<&TripTodo> {
        self.todos.iter().find(|todo| todo.key == key)
    }

    pub fn participant(&self, key: Uuid) -> Option<&Participant> {
        self.participants.iter().find(|p| p.key == key)
    }

    pub fn has_participant_named(&self, name: &str) -> bool {
        self.participants
            .iter()
            .any(|p| p.name.trim().eq_ignore_ascii_case(name.trim()))
    }

    /// Done and total counts of the embedded todos.
    pub fn progress(&self) -> (usize, usize) {
        let done = self.todos.iter().filter(|todo| todo.done).count();
        (done, self.todos.len())
    }

    /// Gives keyless embedded items a key derived from the trip id and their
    /// position, so identical entries stay distinguishable and the key is the
    /// same on every load until the record is rewritten.
    pub fn assign_missing_keys(&mut self) {
        for (idx, todo) in self.todos.iter_mut().enumerate() {
            if todo.key.is_nil() {
                todo.key = derived_key(&self.id, "todo", idx);
            }
        }
        assign_participant_keys(&self.id, &mut self.participants);
    }
}

impl Event {
    pub fn assign_missing_keys(&mut self) {
        assign_participant_keys(&self.id, &mut self.participants);
    }

    pub fn participant(&self, key: Uuid) -> Option<&Participant> {
        self.participants.iter().find(|p| p.key == key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalTodo {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub text: String,

    #[serde(default, with = "lenient_date_serde")]
    pub due_date: Option<DateKey>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    #[serde(default)]
    pub done: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,

    #[serde(default)]
    pub recurrence: Recurrence,

    #[serde(default, with = "lenient_timestamp_serde")]
    pub created_at: Option<DateTime<Utc>>,
}

impl GlobalTodo {
    pub fn new(text: impl Into<String>, due_date: DateKey, now: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            text: text.into(),
            due_date: Some(due_date),
            assignee: None,
            done: false,
            order: None,
            recurrence: Recurrence::None,
            created_at: Some(now),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub done: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,

    #[serde(default, with = "lenient_timestamp_serde")]
    pub created_at: Option<DateTime<Utc>>,
}

impl WishlistItem {
    pub fn new(text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            text: text.into(),
            done: false,
            order: None,
            created_at: Some(now),
        }
    }
}

/// Full-replacement view of the four collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub events: Vec<Event>,
    pub trips: Vec<Trip>,
    pub todos: Vec<GlobalTodo>,
    pub wishlist: Vec<WishlistItem>,
}

impl Snapshot {
    pub fn event(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    pub fn trip(&self, id: &str) -> Option<&Trip> {
        self.trips.iter().find(|trip| trip.id == id)
    }

    pub fn todo(&self, id: &str) -> Option<&GlobalTodo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    pub fn wish(&self, id: &str) -> Option<&WishlistItem> {
        self.wishlist.iter().find(|item| item.id == id)
    }
}

fn assign_participant_keys(owner_id: &str, participants: &mut [Participant]) {
    for (idx, participant) in participants.iter_mut().enumerate() {
        if participant.key.is_nil() {
            participant.key = derived_key(owner_id, "participant", idx);
        }
    }
}

fn derived_key(owner_id: &str, kind: &str, idx: usize) -> Uuid {
    Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("{owner_id}/{kind}/{idx}").as_bytes(),
    )
}
