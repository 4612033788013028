use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::datekey::DateKey;
use crate::locale::{CountUnit, Strings};
use crate::model::{Event, Trip, WishlistItem};
use crate::ordering::sort_todos;
use crate::view::{
    CellState, CombinedTodo, DayCell, DayDetails, GridCell, TodoSource, Upcoming, ViewModel,
    WeekStart, combined_todos,
};

const SHORT_ID: usize = 8;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    strings: &'static Strings,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color,
            strings: cfg.language()?.strings(),
        })
    }

    pub fn strings(&self) -> &'static Strings {
        self.strings
    }

    #[tracing::instrument(skip(self, out, view))]
    pub fn calendar<W: Write>(
        &self,
        out: &mut W,
        view: &ViewModel<'_>,
        week_start: WeekStart,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", view.header)?;
        writeln!(
            out,
            "{}",
            self.strings.month_label(view.month.year, view.month.month)
        )?;

        let mut labels = self.strings.days_short;
        if week_start == WeekStart::Monday {
            labels.rotate_left(1);
        }
        let header: Vec<String> = labels.iter().map(|label| pad(label, 4)).collect();
        writeln!(out, "{}", header.concat().trim_end())?;

        for week in view.grid.chunks(7) {
            let row: Vec<String> = week
                .iter()
                .map(|cell| match cell {
                    GridCell::Blank => "    ".to_string(),
                    GridCell::Day(day) => self.day_cell(day),
                })
                .collect();
            writeln!(out, "{}", row.concat().trim_end())?;
        }
        writeln!(out, "* event  ~ trip  ! todo  ✓ done")?;
        Ok(())
    }

    fn day_cell(&self, cell: &DayCell) -> String {
        let marker = if cell.flags.has_pending_todo {
            '!'
        } else if cell.flags.has_completed_todo {
            '✓'
        } else if cell.flags.has_trip {
            '~'
        } else if cell.flags.has_event {
            '*'
        } else {
            ' '
        };
        let text = if cell.state == CellState::Selected {
            format!("[{:>2}]", cell.day)
        } else {
            format!(" {:>2}{marker}", cell.day)
        };
        match cell.state {
            CellState::Selected => self.paint(&text, "7"),
            CellState::Past => self.paint(&text, "2"),
            CellState::PendingTodo => self.paint(&text, "31"),
            CellState::CompletedTodo => self.paint(&text, "32"),
            CellState::Occupied => self.paint(&text, "36"),
            CellState::Default => text,
        }
    }

    #[tracing::instrument(skip(self, out, details))]
    pub fn day<W: Write>(&self, out: &mut W, details: &DayDetails<'_>) -> anyhow::Result<()> {
        writeln!(out, "{}", details.date)?;
        if details.events.is_empty() && details.trips.is_empty() && details.todos.is_empty() {
            writeln!(out, "{}", self.strings.no_planned)?;
            return Ok(());
        }
        self.section(
            out,
            self.strings.events,
            self.strings.no_events,
            details.events.is_empty(),
            |out| self.events_table(out, &details.events),
        )?;
        self.section(
            out,
            self.strings.trips,
            self.strings.no_trips,
            details.trips.is_empty(),
            |out| self.trips_table(out, &details.trips),
        )?;
        self.section(
            out,
            self.strings.todos,
            self.strings.no_deadlines,
            details.todos.is_empty(),
            |out| self.todos_table(out, &details.todos),
        )?;
        Ok(())
    }

    #[tracing::instrument(skip(self, out, upcoming, header))]
    pub fn upcoming<W: Write>(
        &self,
        out: &mut W,
        header: &str,
        upcoming: &Upcoming<'_>,
    ) -> anyhow::Result<()> {
        writeln!(out, "{header}")?;
        self.section(
            out,
            self.strings.events,
            self.strings.no_events,
            upcoming.events.is_empty(),
            |out| self.events_table(out, &upcoming.events),
        )?;
        self.section(
            out,
            self.strings.trips,
            self.strings.no_trips,
            upcoming.trips.is_empty(),
            |out| self.trips_table(out, &upcoming.trips),
        )?;
        self.section(
            out,
            self.strings.todos,
            self.strings.no_todos,
            upcoming.todos.is_empty(),
            |out| self.todos_table(out, &upcoming.todos),
        )?;
        self.section(
            out,
            self.strings.wishlist,
            self.strings.no_wishlist,
            upcoming.wishlist.is_empty(),
            |out| self.wishlist_table(out, &upcoming.wishlist),
        )?;
        Ok(())
    }

    #[tracing::instrument(skip(self, out, trip), fields(trip = %trip.id))]
    pub fn trip_progress<W: Write>(&self, out: &mut W, trip: &Trip) -> anyhow::Result<()> {
        let (done, total) = trip.progress();
        let percent = if total == 0 { 0 } else { done * 100 / total };
        writeln!(out, "{} ({})", trip.name, date_range(trip.start_date, trip.end_date))?;
        writeln!(out, "{}", self.strings.recurrence_summary(trip.recurrence))?;
        writeln!(
            out,
            "{}: {done}/{} ({percent}%)",
            self.strings.progress,
            self.strings.count_label(total, CountUnit::Total)
        )?;
        let names: Vec<&str> = trip.participants.iter().map(|p| p.name.as_str()).collect();
        writeln!(
            out,
            "{} ({})",
            names.join(", "),
            self.strings.count_label(names.len(), CountUnit::People)
        )?;

        let mut todos = combined_todos(&[], std::slice::from_ref(trip));
        sort_todos(&mut todos);
        if todos.is_empty() {
            writeln!(out, "{}", self.strings.no_todos)?;
            return Ok(());
        }
        self.todos_table(out, &todos)
    }

    fn section<W, F>(
        &self,
        out: &mut W,
        title: &str,
        empty: &str,
        is_empty: bool,
        body: F,
    ) -> anyhow::Result<()>
    where
        W: Write,
        F: FnOnce(&mut W) -> anyhow::Result<()>,
    {
        writeln!(out)?;
        writeln!(out, "{}", self.paint(title, "1"))?;
        if is_empty {
            writeln!(out, "{empty}")?;
            return Ok(());
        }
        body(out)
    }

    fn events_table<W: Write>(&self, out: &mut W, events: &[&Event]) -> anyhow::Result<()> {
        let headers = ["ID", "Date", "Time", "Name", "Location"];
        let rows = events
            .iter()
            .map(|event| {
                let time = match (&event.start_time, &event.end_time) {
                    (Some(start), Some(end)) => format!("{start}-{end}"),
                    (Some(start), None) => start.clone(),
                    _ => String::new(),
                };
                vec![
                    self.paint(short(&event.id), "33"),
                    date_range(event.start_date, event.end_date),
                    time,
                    event.name.clone(),
                    event.location.clone().unwrap_or_default(),
                ]
            })
            .collect();
        write_table(out, &headers, rows)
    }

    fn trips_table<W: Write>(&self, out: &mut W, trips: &[&Trip]) -> anyhow::Result<()> {
        let headers = ["ID", "Dates", "Name", self.strings.progress, self.strings.repeat];
        let rows = trips
            .iter()
            .map(|trip| {
                let (done, total) = trip.progress();
                vec![
                    self.paint(short(&trip.id), "33"),
                    date_range(trip.start_date, trip.end_date),
                    trip.name.clone(),
                    format!("{done}/{total}"),
                    self.strings.recurrence_label(trip.recurrence).to_string(),
                ]
            })
            .collect();
        write_table(out, &headers, rows)
    }

    fn todos_table<W: Write>(&self, out: &mut W, todos: &[CombinedTodo<'_>]) -> anyhow::Result<()> {
        let headers = ["ID", self.strings.due, "Text", self.strings.pic, "Source"];
        let rows = todos
            .iter()
            .map(|todo| {
                let (id, source) = match todo.source {
                    TodoSource::Global { id, .. } => {
                        (short(id).to_string(), self.strings.global.to_string())
                    }
                    TodoSource::Trip {
                        trip_id,
                        trip_name,
                        key,
                    } => {
                        let key = key.to_string();
                        (
                            short(&key).to_string(),
                            format!("{trip_name} ({})", short(trip_id)),
                        )
                    }
                };
                let text = if todo.done {
                    self.paint(&format!("✓ {}", todo.text), "2")
                } else {
                    todo.text.to_string()
                };
                vec![
                    self.paint(&id, "33"),
                    todo.due_date.map(|d| d.to_string()).unwrap_or_default(),
                    text,
                    todo.assignee.unwrap_or_default().to_string(),
                    source,
                ]
            })
            .collect();
        write_table(out, &headers, rows)
    }

    fn wishlist_table<W: Write>(&self, out: &mut W, items: &[&WishlistItem]) -> anyhow::Result<()> {
        let headers = ["ID", "Text"];
        let rows = items
            .iter()
            .map(|item| {
                let text = if item.done {
                    self.paint(&format!("✓ {}", item.text), "2")
                } else {
                    item.text.clone()
                };
                vec![self.paint(short(&item.id), "33"), text]
            })
            .collect();
        write_table(out, &headers, rows)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn short(id: &str) -> &str {
    id.char_indices()
        .nth(SHORT_ID)
        .map_or(id, |(idx, _)| &id[..idx])
}

fn date_range(start: Option<DateKey>, end: Option<DateKey>) -> String {
    match (start, end) {
        (Some(start), Some(end)) if start != end => format!("{start}..{end}"),
        (Some(start), _) => start.to_string(),
        (None, _) => "-".to_string(),
    }
}

fn pad(text: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(text);
    format!("{text}{}", " ".repeat(width.saturating_sub(visible)))
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: &[&str],
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(*header));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let header_cells: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| pad(header, *width))
        .collect();
    writeln!(writer, "{}", header_cells.join(" ").trim_end())?;

    let rules: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    writeln!(writer, "{}", rules.join(" "))?;

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
                format!("{cell}{}", " ".repeat(width.saturating_sub(visible_width)))
            })
            .collect();
        writeln!(writer, "{}", cells.join(" ").trim_end())?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_aligns_wide_characters() {
        let mut out = Vec::new();
        write_table(
            &mut out,
            &["ID", "Text"],
            vec![
                vec!["a".into(), "旅行".into()],
                vec!["bb".into(), "x".into()],
            ],
        )
        .expect("table");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ID Text");
        assert_eq!(lines[1], "-- ----");
        assert_eq!(lines[2], "a  旅行");
        assert_eq!(lines[3], "bb x");
    }

    #[test]
    fn strips_escape_sequences() {
        assert_eq!(strip_ansi("\x1b[31mred\x1b[0m"), "red");
    }

    #[test]
    fn short_ids_and_ranges() {
        assert_eq!(short("0123456789"), "01234567");
        assert_eq!(short("abc"), "abc");
        let start = DateKey::from_ymd(2024, 3, 8);
        let end = DateKey::from_ymd(2024, 3, 12);
        assert_eq!(date_range(start, end), "2024-03-08..2024-03-12");
        assert_eq!(date_range(start, start), "2024-03-08");
        assert_eq!(date_range(None, end), "-");
    }
}
