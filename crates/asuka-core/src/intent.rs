use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::model::{Event, GlobalTodo, Participant, Trip, TripTodo, WishlistItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Events,
    Trips,
    Todos,
    Wishlist,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Events,
        Collection::Trips,
        Collection::Todos,
        Collection::Wishlist,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Events => "events",
            Collection::Trips => "trips",
            Collection::Todos => "todos",
            Collection::Wishlist => "wishlist",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "event" | "events" => Ok(Collection::Events),
            "trip" | "trips" => Ok(Collection::Trips),
            "todo" | "todos" => Ok(Collection::Todos),
            "wish" | "wishes" | "wishlist" => Ok(Collection::Wishlist),
            other => Err(anyhow!(
                "unknown collection: {other} (expected events, trips, todos or wishlist)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "collection", content = "record", rename_all = "lowercase")]
pub enum Record {
    Events(Event),
    Trips(Trip),
    Todos(GlobalTodo),
    Wishlist(WishlistItem),
}

impl Record {
    pub fn collection(&self) -> Collection {
        match self {
            Record::Events(_) => Collection::Events,
            Record::Trips(_) => Collection::Trips,
            Record::Todos(_) => Collection::Todos,
            Record::Wishlist(_) => Collection::Wishlist,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddedField {
    Participants,
    Todos,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "item", rename_all = "lowercase")]
pub enum EmbeddedItem {
    Participant(Participant),
    Todo(TripTodo),
}

impl EmbeddedItem {
    pub fn field(&self) -> EmbeddedField {
        match self {
            EmbeddedItem::Participant(_) => EmbeddedField::Participants,
            EmbeddedItem::Todo(_) => EmbeddedField::Todos,
        }
    }

    pub fn key(&self) -> Uuid {
        match self {
            EmbeddedItem::Participant(p) => p.key,
            EmbeddedItem::Todo(t) => t.key,
        }
    }
}

/// A store operation decided by the engine and executed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WriteIntent {
    Create {
        record: Record,
    },
    Update {
        collection: Collection,
        id: String,
        fields: Map<String, Value>,
    },
    Delete {
        collection: Collection,
        id: String,
    },
    AddEmbedded {
        collection: Collection,
        id: String,
        item: EmbeddedItem,
    },
    /// Removal is by the item's key, never by value.
    RemoveEmbedded {
        collection: Collection,
        id: String,
        field: EmbeddedField,
        key: Uuid,
    },
}

impl WriteIntent {
    pub fn create(record: Record) -> Self {
        WriteIntent::Create { record }
    }

    pub fn update<'a, I>(collection: Collection, id: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        WriteIntent::Update {
            collection,
            id: id.to_string(),
            fields: fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }

    pub fn delete(collection: Collection, id: &str) -> Self {
        WriteIntent::Delete {
            collection,
            id: id.to_string(),
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            WriteIntent::Create { record } => record.collection(),
            WriteIntent::Update { collection, .. }
            | WriteIntent::Delete { collection, .. }
            | WriteIntent::AddEmbedded { collection, .. }
            | WriteIntent::RemoveEmbedded { collection, .. } => *collection,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            WriteIntent::Create { record } => format!("create {}", record.collection()),
            WriteIntent::Update {
                collection,
                id,
                fields,
            } => {
                let names: Vec<&str> = fields.keys().map(String::as_str).collect();
                format!("update {collection}/{id} [{}]", names.join(", "))
            }
            WriteIntent::Delete { collection, id } => format!("delete {collection}/{id}"),
            WriteIntent::AddEmbedded {
                collection,
                id,
                item,
            } => format!("add {:?} to {collection}/{id}", item.field()),
            WriteIntent::RemoveEmbedded {
                collection,
                id,
                field,
                key,
            } => format!("remove {field:?} {key} from {collection}/{id}"),
        }
    }
}
