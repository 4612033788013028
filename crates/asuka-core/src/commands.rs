use std::io::{self, Write};

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::actions::{
    self, NewEvent, NewTodo, NewTrip, NewTripTodo, TripTodoEdit, resolve_id, resolve_key,
};
use crate::cli::{
    AddCommand, Command, EventArgs, ParticipantCommand, TodoArgs, TripArgs, TripCommand,
    TripTodoCommand, WishCommand,
};
use crate::config::Config;
use crate::datastore::DataStore;
use crate::datekey::{DateKey, Recurrence, YearMonth, parse_date_expr, parse_month_expr, today};
use crate::intent::{Collection, WriteIntent};
use crate::model::{Participant, Snapshot};
use crate::ordering::Direction;
use crate::render::Renderer;
use crate::view::{ViewInputs, derive, header_line, today_all_done};

#[instrument(skip(store, cfg, renderer, command))]
pub fn dispatch(
    store: &mut DataStore,
    cfg: &Config,
    renderer: &Renderer,
    command: Option<Command>,
) -> anyhow::Result<()> {
    let command = match command {
        Some(command) => command,
        None => {
            let name = cfg
                .get("default.command")
                .unwrap_or_else(|| "upcoming".to_string());
            debug!(command = %name, "no explicit command, using default");
            Command::from_default_name(&name)?
        }
    };

    if command == Command::Version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let now = Utc::now();
    let ctx = Session {
        cfg,
        renderer,
        now,
        today: today(now),
    };
    let mut snapshot = store.snapshot()?;
    debug!(?command, today = %ctx.today, "dispatching command");

    match command {
        Command::Calendar { month, select } => {
            cmd_calendar(&ctx, &snapshot, month.as_deref(), select.as_deref())
        }
        Command::Day { date } => cmd_day(&ctx, &snapshot, date.as_deref()),
        Command::Upcoming => cmd_upcoming(&ctx, &snapshot),
        Command::Mood { date } => cmd_mood(&ctx, &snapshot, date.as_deref()),
        Command::Add(add) => cmd_add(&ctx, store, &mut snapshot, add),
        Command::Done { id } => cmd_done(&ctx, store, &mut snapshot, &id),
        Command::Wish(wish) => cmd_wish(&ctx, store, &mut snapshot, wish),
        Command::Trip(trip) => cmd_trip(&ctx, store, &mut snapshot, trip),
        Command::Participant(participant) => {
            cmd_participant(store, &mut snapshot, participant)
        }
        Command::Describe {
            collection,
            id,
            text,
        } => cmd_describe(store, &mut snapshot, &collection, &id, &text),
        Command::Rm { collection, id } => cmd_rm(store, &mut snapshot, &collection, &id),
        Command::Version => Ok(()),
    }
}

struct Session<'a> {
    cfg: &'a Config,
    renderer: &'a Renderer,
    now: DateTime<Utc>,
    today: DateKey,
}

impl Session<'_> {
    fn date(&self, raw: Option<&str>) -> anyhow::Result<DateKey> {
        match raw {
            Some(raw) => parse_date_expr(raw, self.today),
            None => Ok(self.today),
        }
    }

    fn optional_date(&self, raw: Option<&str>) -> anyhow::Result<Option<DateKey>> {
        raw.map(|raw| parse_date_expr(raw, self.today)).transpose()
    }

    fn view_inputs<'s>(
        &self,
        snapshot: &'s Snapshot,
        selected: DateKey,
        month: YearMonth,
    ) -> anyhow::Result<ViewInputs<'s>> {
        Ok(ViewInputs {
            events: &snapshot.events,
            trips: &snapshot.trips,
            todos: &snapshot.todos,
            wishlist: &snapshot.wishlist,
            selected,
            month,
            today: self.today,
            week_start: self.cfg.week_start()?,
            visibility: self.cfg.visibility(),
            language: self.cfg.language()?,
        })
    }
}

fn commit(
    store: &DataStore,
    snapshot: &mut Snapshot,
    intents: &[WriteIntent],
) -> anyhow::Result<Vec<String>> {
    if intents.is_empty() {
        info!("nothing to write");
        return Ok(Vec::new());
    }
    store.apply(snapshot, intents)
}

fn parse_recurrence(raw: Option<&str>) -> anyhow::Result<Recurrence> {
    raw.map(str::parse::<Recurrence>)
        .transpose()
        .map(Option::unwrap_or_default)
}

fn record_id(snapshot: &Snapshot, collection: Collection, raw: &str) -> anyhow::Result<String> {
    let ids: Vec<&str> = match collection {
        Collection::Events => snapshot.events.iter().map(|e| e.id.as_str()).collect(),
        Collection::Trips => snapshot.trips.iter().map(|t| t.id.as_str()).collect(),
        Collection::Todos => snapshot.todos.iter().map(|t| t.id.as_str()).collect(),
        Collection::Wishlist => snapshot.wishlist.iter().map(|w| w.id.as_str()).collect(),
    };
    resolve_id(ids, raw).with_context(|| format!("unknown {collection} id"))
}

#[instrument(skip(ctx, snapshot))]
fn cmd_calendar(
    ctx: &Session<'_>,
    snapshot: &Snapshot,
    month: Option<&str>,
    select: Option<&str>,
) -> anyhow::Result<()> {
    let selected = ctx.date(select)?;
    let month = match month {
        Some(raw) => parse_month_expr(raw)?,
        None => YearMonth::of(selected),
    };
    let inputs = ctx.view_inputs(snapshot, selected, month)?;
    let view = derive(&inputs);
    let mut out = io::stdout().lock();
    ctx.renderer.calendar(&mut out, &view, inputs.week_start)?;
    ctx.renderer.day(&mut out, &view.details)
}

#[instrument(skip(ctx, snapshot))]
fn cmd_day(ctx: &Session<'_>, snapshot: &Snapshot, date: Option<&str>) -> anyhow::Result<()> {
    let selected = ctx.date(date)?;
    let inputs = ctx.view_inputs(snapshot, selected, YearMonth::of(selected))?;
    let view = derive(&inputs);
    ctx.renderer.day(&mut io::stdout().lock(), &view.details)
}

#[instrument(skip(ctx, snapshot))]
fn cmd_upcoming(ctx: &Session<'_>, snapshot: &Snapshot) -> anyhow::Result<()> {
    let inputs = ctx.view_inputs(snapshot, ctx.today, YearMonth::of(ctx.today))?;
    let view = derive(&inputs);
    ctx.renderer
        .upcoming(&mut io::stdout().lock(), &view.header, &view.upcoming)
}

#[instrument(skip(ctx, snapshot))]
fn cmd_mood(ctx: &Session<'_>, snapshot: &Snapshot, date: Option<&str>) -> anyhow::Result<()> {
    let date = ctx.date(date)?;
    let all_done = today_all_done(&snapshot.todos, &snapshot.trips, date);
    let mut out = io::stdout().lock();
    writeln!(out, "{}", header_line(date, all_done, ctx.cfg.language()?))?;
    Ok(())
}

#[instrument(skip(ctx, store, snapshot, add))]
fn cmd_add(
    ctx: &Session<'_>,
    store: &DataStore,
    snapshot: &mut Snapshot,
    add: AddCommand,
) -> anyhow::Result<()> {
    let (collection, intents) = match add {
        AddCommand::Event(EventArgs {
            name,
            start,
            end,
            time,
            end_time,
            location,
            description,
            recurring,
        }) => {
            let start_date = ctx.optional_date(start.as_deref())?;
            let end_date = ctx.optional_date(end.as_deref())?.or(start_date);
            let intents = actions::create_event(NewEvent {
                name,
                start_date,
                end_date,
                start_time: time,
                end_time,
                location,
                description,
                recurring,
            })?;
            (Collection::Events, intents)
        }
        AddCommand::Trip(TripArgs {
            name,
            start,
            end,
            description,
            repeat,
        }) => {
            let intents = actions::create_trip(NewTrip {
                name,
                start_date: ctx.optional_date(start.as_deref())?,
                end_date: ctx.optional_date(end.as_deref())?,
                description,
                recurrence: parse_recurrence(repeat.as_deref())?,
            })?;
            (Collection::Trips, intents)
        }
        AddCommand::Todo(TodoArgs {
            text,
            due,
            assignee,
            repeat,
        }) => {
            let intents = actions::create_todo(
                NewTodo {
                    text,
                    due_date: ctx.optional_date(due.as_deref())?,
                    assignee,
                    recurrence: parse_recurrence(repeat.as_deref())?,
                },
                ctx.now,
            )?;
            (Collection::Todos, intents)
        }
        AddCommand::Wish { text } => (Collection::Wishlist, actions::create_wish(&text, ctx.now)?),
    };

    for id in commit(store, snapshot, &intents)? {
        println!("Created {collection} {id}.");
    }
    Ok(())
}

#[instrument(skip(ctx, store, snapshot))]
fn cmd_done(
    ctx: &Session<'_>,
    store: &DataStore,
    snapshot: &mut Snapshot,
    raw_id: &str,
) -> anyhow::Result<()> {
    let id = record_id(snapshot, Collection::Todos, raw_id)?;
    let intents = actions::toggle_global_todo(snapshot, &id, ctx.now)?;
    let created = commit(store, snapshot, &intents)?;

    if let Some(todo) = snapshot.todo(&id) {
        let state = if todo.done { "Completed" } else { "Reopened" };
        println!("{state} todo {id} '{}'.", todo.text);
    }
    for next_id in created {
        if let Some(next) = snapshot.todo(&next_id) {
            let due = next.due_date.map(|d| d.to_string()).unwrap_or_default();
            println!("Next occurrence {next_id} due {due}.");
        }
    }
    Ok(())
}

#[instrument(skip(ctx, store, snapshot, wish))]
fn cmd_wish(
    ctx: &Session<'_>,
    store: &DataStore,
    snapshot: &mut Snapshot,
    wish: WishCommand,
) -> anyhow::Result<()> {
    let (raw_id, verb) = match &wish {
        WishCommand::Done { id } => (id, "Toggled"),
        WishCommand::Up { id } => (id, "Moved up"),
        WishCommand::Down { id } => (id, "Moved down"),
        WishCommand::Rm { id } => (id, "Deleted"),
    };
    let id = record_id(snapshot, Collection::Wishlist, raw_id)?;
    let intents = match wish {
        WishCommand::Done { .. } => actions::toggle_wish(snapshot, &id)?,
        WishCommand::Up { .. } => actions::move_wish(snapshot, &id, Direction::Up, ctx.now)?,
        WishCommand::Down { .. } => actions::move_wish(snapshot, &id, Direction::Down, ctx.now)?,
        WishCommand::Rm { .. } => actions::delete_record(snapshot, Collection::Wishlist, &id)?,
    };
    if intents.is_empty() {
        println!("Wishlist item {id} is already at the edge.");
        return Ok(());
    }
    commit(store, snapshot, &intents)?;
    println!("{verb} wishlist item {id}.");
    Ok(())
}

#[instrument(skip(ctx, store, snapshot, trip))]
fn cmd_trip(
    ctx: &Session<'_>,
    store: &DataStore,
    snapshot: &mut Snapshot,
    trip: TripCommand,
) -> anyhow::Result<()> {
    match trip {
        TripCommand::Next { id } => {
            let id = record_id(snapshot, Collection::Trips, &id)?;
            let intents = actions::next_trip_occurrence(snapshot, &id)?;
            for next_id in commit(store, snapshot, &intents)? {
                if let Some(next) = snapshot.trip(&next_id) {
                    let start = next.start_date.map(|d| d.to_string()).unwrap_or_default();
                    println!("Created trip {next_id} starting {start}.");
                }
            }
            Ok(())
        }
        TripCommand::Progress { id } => {
            let id = record_id(snapshot, Collection::Trips, &id)?;
            let trip = snapshot
                .trip(&id)
                .with_context(|| format!("no trip with id {id}"))?;
            ctx.renderer.trip_progress(&mut io::stdout().lock(), trip)
        }
        TripCommand::Todo(todo) => cmd_trip_todo(ctx, store, snapshot, todo),
    }
}

fn cmd_trip_todo(
    ctx: &Session<'_>,
    store: &DataStore,
    snapshot: &mut Snapshot,
    todo: TripTodoCommand,
) -> anyhow::Result<()> {
    let (raw_trip, raw_key) = match &todo {
        TripTodoCommand::Add { trip, .. } => (trip, None),
        TripTodoCommand::Edit { trip, key, .. }
        | TripTodoCommand::Done { trip, key }
        | TripTodoCommand::Rm { trip, key } => (trip, Some(key)),
    };
    let trip_id = record_id(snapshot, Collection::Trips, raw_trip)?;
    let key = match raw_key {
        Some(raw) => {
            let trip = snapshot
                .trip(&trip_id)
                .with_context(|| format!("no trip with id {trip_id}"))?;
            Some(resolve_key(trip.todos.iter().map(|t| t.key), raw)?)
        }
        None => None,
    };

    let (intents, verb) = match (todo, key) {
        (
            TripTodoCommand::Add {
                text,
                assignee,
                due,
                ..
            },
            _,
        ) => {
            let input = NewTripTodo {
                text,
                assignee: assignee.unwrap_or_default(),
                due_date: ctx.optional_date(due.as_deref())?,
            };
            (actions::add_trip_todo(snapshot, &trip_id, input)?, "Added")
        }
        (
            TripTodoCommand::Edit {
                text,
                assignee,
                due,
                ..
            },
            Some(key),
        ) => {
            let edit = TripTodoEdit {
                text,
                assignee,
                due_date: ctx.optional_date(due.as_deref())?,
            };
            (actions::edit_trip_todo(snapshot, &trip_id, key, edit)?, "Edited")
        }
        (TripTodoCommand::Done { .. }, Some(key)) => {
            (actions::toggle_trip_todo(snapshot, &trip_id, key)?, "Toggled")
        }
        (TripTodoCommand::Rm { .. }, Some(key)) => {
            (actions::remove_trip_todo(snapshot, &trip_id, key)?, "Removed")
        }
        (_, None) => return Err(anyhow!("a todo key is required")),
    };
    commit(store, snapshot, &intents)?;
    if let Some(trip) = snapshot.trip(&trip_id) {
        let (done, total) = trip.progress();
        println!("{verb} todo on trip {trip_id} ({done}/{total} done).");
    }
    Ok(())
}

#[instrument(skip(store, snapshot, participant))]
fn cmd_participant(
    store: &DataStore,
    snapshot: &mut Snapshot,
    participant: ParticipantCommand,
) -> anyhow::Result<()> {
    match participant {
        ParticipantCommand::Add {
            collection,
            id,
            name,
            contact,
        } => {
            let collection: Collection = collection.parse()?;
            let id = record_id(snapshot, collection, &id)?;
            let intents = actions::add_participant(snapshot, collection, &id, &name, contact)?;
            commit(store, snapshot, &intents)?;
            println!("Added {} to {collection} {id}.", name.trim());
        }
        ParticipantCommand::Rm {
            collection,
            id,
            key,
        } => {
            let collection: Collection = collection.parse()?;
            let id = record_id(snapshot, collection, &id)?;
            let participants: &[Participant] = match collection {
                Collection::Events => snapshot.event(&id).map(|e| e.participants.as_slice()),
                Collection::Trips => snapshot.trip(&id).map(|t| t.participants.as_slice()),
                _ => None,
            }
            .unwrap_or_default();
            let key = resolve_key(participants.iter().map(|p| p.key), &key)?;
            let intents = actions::remove_participant(snapshot, collection, &id, key)?;
            commit(store, snapshot, &intents)?;
            println!("Removed participant {key} from {collection} {id}.");
        }
    }
    Ok(())
}

#[instrument(skip(store, snapshot, text))]
fn cmd_describe(
    store: &DataStore,
    snapshot: &mut Snapshot,
    collection: &str,
    raw_id: &str,
    text: &str,
) -> anyhow::Result<()> {
    let collection: Collection = collection.parse()?;
    let id = record_id(snapshot, collection, raw_id)?;
    let intents = actions::set_description(snapshot, collection, &id, text)?;
    commit(store, snapshot, &intents)?;
    if text.trim().is_empty() {
        println!("Cleared description of {collection} {id}.");
    } else {
        println!("Updated description of {collection} {id}.");
    }
    Ok(())
}

#[instrument(skip(store, snapshot))]
fn cmd_rm(
    store: &DataStore,
    snapshot: &mut Snapshot,
    collection: &str,
    raw_id: &str,
) -> anyhow::Result<()> {
    let collection: Collection = collection.parse()?;
    let id = record_id(snapshot, collection, raw_id)?;
    let intents = actions::delete_record(snapshot, collection, &id)?;
    commit(store, snapshot, &intents)?;
    println!("Deleted {collection} {id}.");
    Ok(())
}
