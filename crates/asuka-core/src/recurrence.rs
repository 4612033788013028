use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::datekey::advance_by_recurrence;
use crate::model::{GlobalTodo, Participant, Trip};

/// The occurrence that follows a recurring todo once it is marked done.
///
/// `order_clock` becomes the explicit order of the new record. Returns `None`
/// for a non-recurring todo or one without a due date.
pub fn next_global_todo(
    todo: &GlobalTodo,
    now: DateTime<Utc>,
    order_clock: i64,
) -> Option<GlobalTodo> {
    if todo.recurrence.is_none() {
        return None;
    }
    let due = todo.due_date?;
    let next_due = advance_by_recurrence(due, todo.recurrence);
    debug!(
        text = %todo.text,
        from = %due,
        to = %next_due,
        recurrence = todo.recurrence.as_str(),
        "expanding recurring todo"
    );

    Some(GlobalTodo {
        id: String::new(),
        text: todo.text.clone(),
        due_date: Some(next_due),
        assignee: todo.assignee.clone(),
        done: false,
        order: Some(order_clock),
        recurrence: todo.recurrence,
        created_at: Some(now),
    })
}

/// The next occurrence of a recurring trip with both endpoints moved by one
/// interval. Participants carry over with fresh keys; todos do not.
pub fn next_trip(trip: &Trip) -> Option<Trip> {
    if trip.recurrence.is_none() {
        return None;
    }
    let start = trip.start_date?;
    let end = trip.end_date.unwrap_or(start);
    let next_start = advance_by_recurrence(start, trip.recurrence);
    let next_end = advance_by_recurrence(end, trip.recurrence);
    debug!(
        name = %trip.name,
        from = %start,
        to = %next_start,
        recurrence = trip.recurrence.as_str(),
        "expanding recurring trip"
    );

    Some(Trip {
        id: String::new(),
        name: trip.name.clone(),
        start_date: Some(next_start),
        end_date: Some(next_end),
        description: None,
        recurrence: trip.recurrence,
        participants: trip
            .participants
            .iter()
            .map(|p| Participant {
                key: Uuid::new_v4(),
                ..p.clone()
            })
            .collect(),
        todos: Vec::new(),
    })
}
