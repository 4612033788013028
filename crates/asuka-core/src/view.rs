use std::str::FromStr;

use anyhow::anyhow;
use chrono::Datelike;
use tracing::debug;
use uuid::Uuid;

use crate::datekey::{DateKey, Recurrence, YearMonth};
use crate::locale::Language;
use crate::model::{Event, GlobalTodo, Trip, WishlistItem};
use crate::mood::{daily_mood, season_emoji};
use crate::ordering::{Sortable, sort_todos, sorted_wishlist};

const UPCOMING_EVENTS: usize = 6;
const UPCOMING_TRIPS: usize = 6;
const UPCOMING_TODOS: usize = 10;
const UPCOMING_WISHES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl FromStr for WeekStart {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sunday" | "sun" | "0" => Ok(WeekStart::Sunday),
            "monday" | "mon" | "1" => Ok(WeekStart::Monday),
            other => Err(anyhow!("week start must be sunday or monday, got: {other}")),
        }
    }
}

impl WeekStart {
    /// Column of `date` in a week beginning on this day.
    pub fn column(self, date: DateKey) -> u32 {
        let weekday = date.date().weekday();
        match self {
            WeekStart::Sunday => weekday.num_days_from_sunday(),
            WeekStart::Monday => weekday.num_days_from_monday(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub events: bool,
    pub trips: bool,
    pub todos: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            events: true,
            trips: true,
            todos: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ViewInputs<'a> {
    pub events: &'a [Event],
    pub trips: &'a [Trip],
    pub todos: &'a [GlobalTodo],
    pub wishlist: &'a [WishlistItem],
    pub selected: DateKey,
    pub month: YearMonth,
    pub today: DateKey,
    pub week_start: WeekStart,
    pub visibility: Visibility,
    pub language: Language,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DayFlags {
    pub has_event: bool,
    pub has_trip: bool,
    pub has_pending_todo: bool,
    pub has_completed_todo: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Selected,
    Past,
    PendingTodo,
    CompletedTodo,
    Occupied,
    Default,
}

impl CellState {
    pub fn resolve(key: DateKey, selected: DateKey, today: DateKey, flags: DayFlags) -> Self {
        if key == selected {
            CellState::Selected
        } else if key < today {
            CellState::Past
        } else if flags.has_pending_todo {
            CellState::PendingTodo
        } else if flags.has_completed_todo {
            CellState::CompletedTodo
        } else if flags.has_event || flags.has_trip {
            CellState::Occupied
        } else {
            CellState::Default
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub day: u32,
    pub key: DateKey,
    pub flags: DayFlags,
    pub state: CellState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridCell {
    Blank,
    Day(DayCell),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoSource<'a> {
    Global {
        id: &'a str,
        recurrence: Recurrence,
    },
    Trip {
        trip_id: &'a str,
        trip_name: &'a str,
        key: Uuid,
    },
}

/// A global or trip-embedded todo in one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombinedTodo<'a> {
    pub source: TodoSource<'a>,
    pub text: &'a str,
    pub assignee: Option<&'a str>,
    pub due_date: Option<DateKey>,
    pub done: bool,
    pub order: Option<i64>,
}

impl<'a> CombinedTodo<'a> {
    pub fn from_global(todo: &'a GlobalTodo) -> Self {
        Self {
            source: TodoSource::Global {
                id: &todo.id,
                recurrence: todo.recurrence,
            },
            text: &todo.text,
            assignee: todo.assignee.as_deref(),
            due_date: todo.due_date,
            done: todo.done,
            order: todo.order,
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self.source, TodoSource::Global { .. })
    }
}

impl Sortable for CombinedTodo<'_> {
    fn is_done(&self) -> bool {
        self.done
    }

    fn explicit_order(&self) -> Option<i64> {
        self.order
    }

    fn due_date(&self) -> Option<DateKey> {
        self.due_date
    }
}

/// Global todos first, then every trip's todos in trip order. Unsorted.
pub fn combined_todos<'a>(todos: &'a [GlobalTodo], trips: &'a [Trip]) -> Vec<CombinedTodo<'a>> {
    let globals = todos.iter().map(CombinedTodo::from_global);
    let embedded = trips.iter().flat_map(|trip| {
        trip.todos.iter().map(move |todo| CombinedTodo {
            source: TodoSource::Trip {
                trip_id: &trip.id,
                trip_name: &trip.name,
                key: todo.key,
            },
            text: &todo.text,
            assignee: Some(todo.assignee.as_str()).filter(|name| !name.is_empty()),
            due_date: todo.due_date,
            done: todo.done,
            order: todo.order,
        })
    });
    globals.chain(embedded).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayDetails<'a> {
    pub date: DateKey,
    pub events: Vec<&'a Event>,
    pub trips: Vec<&'a Trip>,
    pub todos: Vec<CombinedTodo<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upcoming<'a> {
    pub events: Vec<&'a Event>,
    pub trips: Vec<&'a Trip>,
    pub todos: Vec<CombinedTodo<'a>>,
    pub wishlist: Vec<&'a WishlistItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel<'a> {
    pub month: YearMonth,
    pub grid: Vec<GridCell>,
    pub details: DayDetails<'a>,
    pub upcoming: Upcoming<'a>,
    pub today_all_done: bool,
    pub header: String,
}

pub fn day_flags(inputs: &ViewInputs<'_>, key: DateKey) -> DayFlags {
    let mut flags = DayFlags::default();
    if inputs.visibility.events {
        flags.has_event = inputs.events.iter().any(|e| e.start_date == Some(key));
    }
    if inputs.visibility.trips {
        flags.has_trip = inputs.trips.iter().any(|t| t.contains(key));
    }
    if inputs.visibility.todos {
        let due: Vec<bool> = inputs
            .todos
            .iter()
            .filter(|t| t.due_date == Some(key))
            .map(|t| t.done)
            .chain(
                inputs
                    .trips
                    .iter()
                    .flat_map(|trip| trip.todos.iter())
                    .filter(|t| t.due_date == Some(key))
                    .map(|t| t.done),
            )
            .collect();
        flags.has_pending_todo = due.iter().any(|done| !done);
        flags.has_completed_todo = due.iter().any(|done| *done);
    }
    flags
}

pub fn month_grid(inputs: &ViewInputs<'_>) -> Vec<GridCell> {
    let month = inputs.month;
    let leading = inputs.week_start.column(month.first_day()) as usize;
    let mut grid = vec![GridCell::Blank; leading];
    for day in 1..=month.days_in_month() {
        let Some(key) = month.day(day) else {
            continue;
        };
        let flags = day_flags(inputs, key);
        grid.push(GridCell::Day(DayCell {
            day,
            key,
            flags,
            state: CellState::resolve(key, inputs.selected, inputs.today, flags),
        }));
    }
    while grid.len() % 7 != 0 {
        grid.push(GridCell::Blank);
    }
    grid
}

pub fn day_details<'a>(inputs: &ViewInputs<'a>, date: DateKey) -> DayDetails<'a> {
    let events = inputs
        .events
        .iter()
        .filter(|e| e.start_date == Some(date))
        .collect();
    let trips = inputs.trips.iter().filter(|t| t.contains(date)).collect();
    let mut todos: Vec<CombinedTodo<'a>> = combined_todos(inputs.todos, inputs.trips)
        .into_iter()
        .filter(|t| t.due_date == Some(date))
        .collect();
    sort_todos(&mut todos);
    DayDetails {
        date,
        events,
        trips,
        todos,
    }
}

pub fn upcoming<'a>(inputs: &ViewInputs<'a>) -> Upcoming<'a> {
    let mut events: Vec<&Event> = inputs.events.iter().collect();
    events.sort_by_key(|e| e.start_date);
    events.truncate(UPCOMING_EVENTS);

    let mut trips: Vec<&Trip> = inputs.trips.iter().collect();
    trips.sort_by_key(|t| t.start_date);
    trips.truncate(UPCOMING_TRIPS);

    let mut todos = combined_todos(inputs.todos, inputs.trips);
    sort_todos(&mut todos);
    todos.truncate(UPCOMING_TODOS);

    let mut wishlist = sorted_wishlist(inputs.wishlist);
    wishlist.truncate(UPCOMING_WISHES);

    Upcoming {
        events,
        trips,
        todos,
        wishlist,
    }
}

/// True when something is due today and all of it is done.
pub fn today_all_done(todos: &[GlobalTodo], trips: &[Trip], today: DateKey) -> bool {
    let mut any = false;
    for done in todos
        .iter()
        .filter(|t| t.due_date == Some(today))
        .map(|t| t.done)
        .chain(
            trips
                .iter()
                .flat_map(|trip| trip.todos.iter())
                .filter(|t| t.due_date == Some(today))
                .map(|t| t.done),
        )
    {
        if !done {
            return false;
        }
        any = true;
    }
    any
}

pub fn header_line(today: DateKey, all_done: bool, language: Language) -> String {
    let strings = language.strings();
    let emoji = season_emoji(today.month() - 1);
    let text = if all_done {
        Some(strings.nothing_urgent)
    } else {
        daily_mood(today, strings.moods)
    };
    match text {
        Some(text) => format!("{emoji} {text}"),
        None => emoji.to_string(),
    }
}

#[tracing::instrument(skip(inputs), fields(month = %inputs.month, selected = %inputs.selected))]
pub fn derive<'a>(inputs: &ViewInputs<'a>) -> ViewModel<'a> {
    let grid = month_grid(inputs);
    let details = day_details(inputs, inputs.selected);
    let upcoming = upcoming(inputs);
    let all_done = today_all_done(inputs.todos, inputs.trips, inputs.today);
    debug!(
        cells = grid.len(),
        events = details.events.len(),
        trips = details.trips.len(),
        todos = details.todos.len(),
        all_done,
        "derived view model"
    );

    ViewModel {
        month: inputs.month,
        grid,
        details,
        upcoming,
        today_all_done: all_done,
        header: header_line(inputs.today, all_done, inputs.language),
    }
}
