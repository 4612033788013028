use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Datelike,
  Days,
  Months,
  NaiveDate,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;
use serde::{
  Deserialize,
  Deserializer,
  Serialize,
  Serializer
};

const TIMEZONE_CONFIG_FILE: &str =
  "asuka-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "ASUKA_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "ASUKA_TIME_CONFIG";
const DEFAULT_PROJECT_TIMEZONE: &str =
  "UTC";

/// A calendar day in canonical
/// `YYYY-MM-DD` form.
///
/// Ordering is chronological, which is
/// also the lexicographic order of the
/// rendered key because the year is
/// kept within four digits.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
pub struct DateKey(NaiveDate);

impl DateKey {
  /// Clamps into the four-digit year
  /// range so the key stays fixed-width.
  #[must_use]
  pub fn from_date(
    date: NaiveDate
  ) -> Self {
    if date.year() < 0 {
      Self::min_value()
    } else if date.year() > 9999 {
      Self::max_value()
    } else {
      Self(date)
    }
  }

  /// `None` outside the four-digit
  /// year range.
  #[must_use]
  pub fn try_from_date(
    date: NaiveDate
  ) -> Option<Self> {
    (0..=9999)
      .contains(&date.year())
      .then_some(Self(date))
  }

  #[must_use]
  pub fn min_value() -> Self {
    Self(
      NaiveDate::from_ymd_opt(0, 1, 1)
        .unwrap_or(NaiveDate::MIN)
    )
  }

  #[must_use]
  pub fn max_value() -> Self {
    Self(
      NaiveDate::from_ymd_opt(
        9999, 12, 31
      )
      .unwrap_or(NaiveDate::MAX)
    )
  }

  pub fn from_ymd(
    year: i32,
    month: u32,
    day: u32
  ) -> Option<Self> {
    NaiveDate::from_ymd_opt(
      year, month, day
    )
    .map(Self::from_date)
  }

  #[must_use]
  pub fn date(self) -> NaiveDate {
    self.0
  }

  #[must_use]
  pub fn year(self) -> i32 {
    self.0.year()
  }

  #[must_use]
  pub fn month(self) -> u32 {
    self.0.month()
  }

  #[must_use]
  pub fn day(self) -> u32 {
    self.0.day()
  }

  /// Milliseconds since the Unix epoch
  /// at UTC midnight of this day.
  #[must_use]
  pub fn epoch_millis(self) -> i64 {
    self
      .0
      .and_hms_opt(0, 0, 0)
      .map(|ndt| {
        ndt.and_utc().timestamp_millis()
      })
      .unwrap_or_default()
  }

  #[must_use]
  pub fn add_days(
    self,
    days: u64
  ) -> Self {
    self
      .0
      .checked_add_days(Days::new(days))
      .map(Self::from_date)
      .unwrap_or_else(Self::max_value)
  }
}

impl From<NaiveDate> for DateKey {
  fn from(date: NaiveDate) -> Self {
    Self::from_date(date)
  }
}

impl fmt::Display for DateKey {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{:04}-{:02}-{:02}",
      self.0.year(),
      self.0.month(),
      self.0.day()
    )
  }
}

impl FromStr for DateKey {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    parse_date_key(s)
  }
}

impl Serialize for DateKey {
  fn serialize<S>(
    &self,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer
      .collect_str(self)
  }
}

impl<'de> Deserialize<'de> for DateKey {
  fn deserialize<D>(
    deserializer: D
  ) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    parse_date_key(&raw)
      .map_err(serde::de::Error::custom)
  }
}

#[must_use]
pub fn format_date_key(
  date: NaiveDate
) -> String {
  DateKey::from_date(date).to_string()
}

/// Accepts exactly `YYYY-MM-DD` naming a
/// real calendar day.
pub fn parse_date_key(
  raw: &str
) -> anyhow::Result<DateKey> {
  let bytes = raw.as_bytes();
  let shaped = bytes.len() == 10
    && bytes[4] == b'-'
    && bytes[7] == b'-'
    && bytes.iter().enumerate().all(
      |(idx, b)| {
        idx == 4
          || idx == 7
          || b.is_ascii_digit()
      }
    );
  if !shaped {
    return Err(anyhow!(
      "date key must be YYYY-MM-DD, \
       got: {raw}"
    ));
  }

  NaiveDate::parse_from_str(
    raw, "%Y-%m-%d"
  )
  .map(DateKey)
  .with_context(|| {
    format!(
      "not a calendar day: {raw}"
    )
  })
}

/// With no end, only the start day is in
/// range.
#[must_use]
pub fn is_within_range(
  date: DateKey,
  start: DateKey,
  end: Option<DateKey>
) -> bool {
  match end {
    | None => date == start,
    | Some(end) => {
      start <= date && date <= end
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
)]
pub enum Recurrence {
  #[default]
  None,
  Daily,
  Weekly,
  Monthly,
  Yearly
}

impl Recurrence {
  #[must_use]
  pub fn as_str(self) -> &'static str {
    match self {
      | Self::None => "none",
      | Self::Daily => "daily",
      | Self::Weekly => "weekly",
      | Self::Monthly => "monthly",
      | Self::Yearly => "yearly"
    }
  }

  #[must_use]
  pub fn is_none(self) -> bool {
    self == Self::None
  }
}

impl FromStr for Recurrence {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "" | "none" | "no" => {
        Ok(Self::None)
      }
      | "daily" => Ok(Self::Daily),
      | "weekly" => Ok(Self::Weekly),
      | "monthly" => Ok(Self::Monthly),
      | "yearly" => Ok(Self::Yearly),
      | other => {
        Err(anyhow!(
          "unknown recurrence: \
           {other} (expected \
           none/daily/weekly/monthly/\
           yearly)"
        ))
      }
    }
  }
}

impl Serialize for Recurrence {
  fn serialize<S>(
    &self,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer
      .serialize_str(self.as_str())
  }
}

/// Unknown or null recurrence values
/// read as `None`.
impl<'de> Deserialize<'de> for Recurrence {
  fn deserialize<D>(
    deserializer: D
  ) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw =
      Option::<String>::deserialize(
        deserializer
      )?;
    let Some(raw) = raw else {
      return Ok(Self::None);
    };
    Ok(raw.parse().unwrap_or_else(
      |err| {
        tracing::warn!(
          value = %raw,
          error = %err,
          "ignoring unknown recurrence"
        );
        Self::None
      }
    ))
  }
}

/// Monthly and yearly steps keep the day
/// of month; a day missing from the
/// target month rolls forward into the
/// next one (Jan 31 + 1 month = Mar 2 or
/// Mar 3).
#[must_use]
pub fn advance_by_recurrence(
  date: DateKey,
  kind: Recurrence
) -> DateKey {
  match kind {
    | Recurrence::None => date,
    | Recurrence::Daily => {
      date.add_days(1)
    }
    | Recurrence::Weekly => {
      date.add_days(7)
    }
    | Recurrence::Monthly => {
      add_months_rolling(date, 1)
    }
    | Recurrence::Yearly => {
      add_months_rolling(date, 12)
    }
  }
}

fn add_months_rolling(
  date: DateKey,
  months: u32
) -> DateKey {
  let naive = date.date();
  naive
    .with_day(1)
    .and_then(|first| {
      first.checked_add_months(
        Months::new(months)
      )
    })
    .and_then(|first| {
      first.checked_add_days(Days::new(
        u64::from(naive.day() - 1)
      ))
    })
    .map(DateKey::from_date)
    .unwrap_or_else(DateKey::max_value)
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
pub struct YearMonth {
  pub year:  i32,
  pub month: u32
}

impl YearMonth {
  pub fn new(
    year: i32,
    month: u32
  ) -> anyhow::Result<Self> {
    if !(1..=12).contains(&month) {
      return Err(anyhow!(
        "month must be 1-12, got: \
         {month}"
      ));
    }
    if !(0..=9999).contains(&year) {
      return Err(anyhow!(
        "year must have four digits, \
         got: {year}"
      ));
    }
    Ok(Self {
      year,
      month
    })
  }

  #[must_use]
  pub fn of(date: DateKey) -> Self {
    Self {
      year:  date.year(),
      month: date.month()
    }
  }

  #[must_use]
  pub fn first_day(self) -> DateKey {
    DateKey::from_ymd(
      self.year, self.month, 1
    )
    .unwrap_or_else(DateKey::min_value)
  }

  #[must_use]
  pub fn days_in_month(self) -> u32 {
    let first = self.first_day().date();
    first
      .checked_add_months(Months::new(1))
      .map(|next| {
        next
          .signed_duration_since(first)
          .num_days()
      })
      .and_then(|days| {
        u32::try_from(days).ok()
      })
      .unwrap_or(31)
  }

  #[must_use]
  pub fn day(
    self,
    day: u32
  ) -> Option<DateKey> {
    DateKey::from_ymd(
      self.year, self.month, day
    )
  }

  #[must_use]
  pub fn next(self) -> Self {
    if self.month == 12 {
      Self {
        year:  self.year + 1,
        month: 1
      }
    } else {
      Self {
        year:  self.year,
        month: self.month + 1
      }
    }
  }

  #[must_use]
  pub fn prev(self) -> Self {
    if self.month == 1 {
      Self {
        year:  self.year - 1,
        month: 12
      }
    } else {
      Self {
        year:  self.year,
        month: self.month - 1
      }
    }
  }
}

impl fmt::Display for YearMonth {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{:04}-{:02}",
      self.year, self.month
    )
  }
}

pub fn parse_month_expr(
  input: &str
) -> anyhow::Result<YearMonth> {
  let token = input.trim();
  let (year, month) = token
    .split_once('-')
    .ok_or_else(|| {
      anyhow!(
        "month must be YYYY-MM, got: \
         {input}"
      )
    })?;
  if year.len() != 4 || month.len() != 2
  {
    return Err(anyhow!(
      "month must be YYYY-MM, got: \
       {input}"
    ));
  }
  let year: i32 = year
    .parse()
    .context("invalid year")?;
  let month: u32 = month
    .parse()
    .context("invalid month")?;
  YearMonth::new(year, month)
}

pub fn project_timezone() -> &'static Tz
{
  static PROJECT_TZ: OnceLock<Tz> =
    OnceLock::new();
  PROJECT_TZ.get_or_init(
    resolve_project_timezone
  )
}

/// The calendar day of `now` in the
/// project timezone.
#[must_use]
pub fn today(
  now: DateTime<Utc>
) -> DateKey {
  DateKey::from_date(
    now
      .with_timezone(project_timezone())
      .date_naive()
  )
}

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

fn resolve_project_timezone() -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      parse_timezone(&raw, TIMEZONE_ENV_VAR)
  {
    return tz;
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return tz;
  }

  parse_timezone(
    DEFAULT_PROJECT_TIMEZONE,
    "DEFAULT_PROJECT_TIMEZONE"
  )
  .unwrap_or(chrono_tz::UTC)
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &PathBuf
) -> Option<Tz> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  let parsed = match toml::from_str::<
    TimezoneConfig
  >(&raw)
  {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed parsing timezone config file"
      );
      return None;
    }
  };

  let timezone =
    parsed.timezone.or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    });
  let Some(timezone) = timezone else {
    tracing::warn!(
      file = %path.display(),
      "timezone config had no timezone field"
    );
    return None;
  };

  parse_timezone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        source,
        timezone = %trimmed,
        "configured project timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

/// Parses a user-supplied day relative
/// to `today`.
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  today: DateKey
) -> anyhow::Result<DateKey> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" => return Ok(today),
    | "tomorrow" => {
      return within_key_range(
        today
          .date()
          .checked_add_days(Days::new(1)),
        input
      );
    }
    | "yesterday" => {
      return within_key_range(
        today
          .date()
          .checked_sub_days(Days::new(1)),
        input
      );
    }
    | _ => {}
  }

  if let Some(target) =
    parse_weekday_name(&lower)
  {
    return within_key_range(
      next_weekday_date(today, target),
      input
    );
  }

  let rel_re = Regex::new(
    r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dwmy])$"
  )
  .map_err(|e| {
    anyhow!(
      "internal regex compile \
       failure: {e}"
    )
  })?;

  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let negative = caps
      .name("sign")
      .is_some_and(|m| m.as_str() == "-");
    let num: u32 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context(
        "invalid relative number"
      )?;
    let unit = caps
      .name("unit")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative unit")
      })?;

    let date = today.date();
    let shifted = match (unit, negative)
    {
      | ("d", false) => date
        .checked_add_days(Days::new(
          u64::from(num)
        )),
      | ("d", true) => date
        .checked_sub_days(Days::new(
          u64::from(num)
        )),
      | ("w", false) => date
        .checked_add_days(Days::new(
          u64::from(num) * 7
        )),
      | ("w", true) => date
        .checked_sub_days(Days::new(
          u64::from(num) * 7
        )),
      | ("m", false) => date
        .checked_add_months(Months::new(
          num
        )),
      | ("m", true) => date
        .checked_sub_months(Months::new(
          num
        )),
      | ("y", false) => num
        .checked_mul(12)
        .and_then(|months| {
          date.checked_add_months(
            Months::new(months)
          )
        }),
      | ("y", true) => num
        .checked_mul(12)
        .and_then(|months| {
          date.checked_sub_months(
            Months::new(months)
          )
        }),
      | _ => {
        return Err(anyhow!(
          "unknown relative unit: \
           {unit}"
        ));
      }
    };

    return within_key_range(
      shifted, input
    );
  }

  parse_date_key(token).with_context(
    || {
      "supported formats: \
       today/tomorrow/yesterday, \
       weekday names (e.g. monday), \
       +Nd/-Nd, +Nw, +Nm, +Ny, \
       YYYY-MM-DD"
    }
  )
}

fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token.trim() {
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues" => {
      Some(Weekday::Tue)
    }
    | "wednesday" | "wed" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thur"
    | "thurs" => Some(Weekday::Thu),
    | "friday" | "fri" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

fn within_key_range(
  date: Option<NaiveDate>,
  input: &str
) -> anyhow::Result<DateKey> {
  date
    .and_then(DateKey::try_from_date)
    .ok_or_else(|| {
      anyhow!(
        "date out of range \
         (0000-01-01..9999-12-31): \
         {input}"
      )
    })
}

fn next_weekday_date(
  from: DateKey,
  target: Weekday
) -> Option<NaiveDate> {
  let from_idx = from
    .date()
    .weekday()
    .num_days_from_monday();
  let target_idx =
    target.num_days_from_monday();
  let mut delta =
    (7 + target_idx - from_idx) % 7;
  if delta == 0 {
    delta = 7;
  }
  from
    .date()
    .checked_add_days(Days::new(
      u64::from(delta)
    ))
}

/// Lenient serde adapters for date
/// fields read from the store: a missing,
/// empty or malformed value becomes
/// `None` instead of failing the record.
pub mod lenient_date_serde {
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  use super::{
    DateKey,
    parse_date_key
  };

  pub fn serialize<S>(
    key: &Option<DateKey>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match key {
      | Some(value) => {
        serializer.collect_str(value)
      }
      | None => {
        serializer.serialize_none()
      }
    }
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<Option<DateKey>, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw =
      Option::<String>::deserialize(
        deserializer
      )?;
    let Some(raw) = raw else {
      return Ok(None);
    };
    if raw.trim().is_empty() {
      return Ok(None);
    }
    match parse_date_key(raw.trim()) {
      | Ok(key) => Ok(Some(key)),
      | Err(err) => {
        tracing::warn!(
          value = %raw,
          error = %err,
          "treating malformed date as missing"
        );
        Ok(None)
      }
    }
  }
}

/// RFC 3339 creation timestamps, lenient
/// in the same way as
/// [`lenient_date_serde`].
pub mod lenient_timestamp_serde {
  use chrono::{
    DateTime,
    Utc
  };
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  pub fn serialize<S>(
    dt: &Option<DateTime<Utc>>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match dt {
      | Some(value) => {
        serializer.serialize_str(
          &value.to_rfc3339()
        )
      }
      | None => {
        serializer.serialize_none()
      }
    }
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<
    Option<DateTime<Utc>>,
    D::Error
  >
  where
    D: Deserializer<'de>
  {
    let raw =
      Option::<String>::deserialize(
        deserializer
      )?;
    let Some(raw) = raw else {
      return Ok(None);
    };
    match DateTime::parse_from_rfc3339(
      raw.trim()
    ) {
      | Ok(dt) => {
        Ok(Some(dt.with_timezone(&Utc)))
      }
      | Err(err) => {
        tracing::warn!(
          value = %raw,
          error = %err,
          "treating malformed timestamp as missing"
        );
        Ok(None)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(raw: &str) -> DateKey {
    parse_date_key(raw)
      .expect("valid key")
  }

  #[test]
  fn formats_zero_padded_keys() {
    let date =
      NaiveDate::from_ymd_opt(
        2024, 3, 7
      )
      .expect("valid date");
    assert_eq!(
      format_date_key(date),
      "2024-03-07"
    );
    assert_eq!(
      parse_date_key(&format_date_key(
        date
      ))
      .expect("round trip")
      .date(),
      date
    );
  }

  #[test]
  fn rejects_non_canonical_keys() {
    assert!(
      parse_date_key("2024-3-7")
        .is_err()
    );
    assert!(
      parse_date_key("2024-02-30")
        .is_err()
    );
    assert!(
      parse_date_key("20240307")
        .is_err()
    );
    assert!(
      parse_date_key(" 2024-03-07")
        .is_err()
    );
  }

  #[test]
  fn key_order_matches_string_order() {
    let mut keys = vec![
      key("2024-10-01"),
      key("2024-09-30"),
      key("0999-01-01"),
      key("2025-01-01"),
    ];
    let mut strings: Vec<String> = keys
      .iter()
      .map(ToString::to_string)
      .collect();
    keys.sort();
    strings.sort();
    let rendered: Vec<String> = keys
      .iter()
      .map(ToString::to_string)
      .collect();
    assert_eq!(rendered, strings);
  }

  #[test]
  fn range_without_end_is_single_day() {
    let start = key("2024-03-08");
    assert!(is_within_range(
      start, start, None
    ));
    assert!(!is_within_range(
      key("2024-03-09"),
      start,
      None
    ));
  }

  #[test]
  fn range_is_inclusive() {
    let start = key("2024-03-08");
    let end = Some(key("2024-03-12"));
    assert!(is_within_range(
      key("2024-03-08"),
      start,
      end
    ));
    assert!(is_within_range(
      key("2024-03-12"),
      start,
      end
    ));
    assert!(!is_within_range(
      key("2024-03-07"),
      start,
      end
    ));
    assert!(!is_within_range(
      key("2024-03-13"),
      start,
      end
    ));
  }

  #[test]
  fn daily_and_weekly_advance_by_exact_days()
  {
    let start = key("2024-02-25");
    let mut daily = start;
    let mut weekly = start;
    for _ in 0..10 {
      daily = advance_by_recurrence(
        daily,
        Recurrence::Daily
      );
      weekly = advance_by_recurrence(
        weekly,
        Recurrence::Weekly
      );
    }
    assert_eq!(daily, start.add_days(10));
    assert_eq!(
      weekly,
      start.add_days(70)
    );
  }

  #[test]
  fn monthly_rolls_over_short_months() {
    assert_eq!(
      advance_by_recurrence(
        key("2024-01-01"),
        Recurrence::Monthly
      ),
      key("2024-02-01")
    );
    assert_eq!(
      advance_by_recurrence(
        key("2024-01-31"),
        Recurrence::Monthly
      ),
      key("2024-03-02")
    );
    assert_eq!(
      advance_by_recurrence(
        key("2023-01-31"),
        Recurrence::Monthly
      ),
      key("2023-03-03")
    );
    assert_eq!(
      advance_by_recurrence(
        key("2024-12-15"),
        Recurrence::Monthly
      ),
      key("2025-01-15")
    );
  }

  #[test]
  fn yearly_from_leap_day_rolls_to_march()
  {
    assert_eq!(
      advance_by_recurrence(
        key("2024-02-29"),
        Recurrence::Yearly
      ),
      key("2025-03-01")
    );
    assert_eq!(
      advance_by_recurrence(
        key("2024-06-10"),
        Recurrence::None
      ),
      key("2024-06-10")
    );
  }

  #[test]
  fn parses_relative_expressions() {
    let today = key("2026-02-17");
    assert_eq!(
      parse_date_expr("tomorrow", today)
        .expect("tomorrow"),
      key("2026-02-18")
    );
    assert_eq!(
      parse_date_expr("+2w", today)
        .expect("+2w"),
      key("2026-03-03")
    );
    assert_eq!(
      parse_date_expr("-1d", today)
        .expect("-1d"),
      key("2026-02-16")
    );
    assert_eq!(
      parse_date_expr("2026-05-01", today)
        .expect("literal"),
      key("2026-05-01")
    );
    assert!(
      parse_date_expr("someday", today)
        .is_err()
    );
  }

  #[test]
  fn expressions_past_the_key_range_are_errors()
  {
    let last = key("9999-12-31");
    assert!(
      parse_date_expr("tomorrow", last)
        .is_err()
    );
    assert!(
      parse_date_expr("+1d", last)
        .is_err()
    );
    assert!(
      parse_date_expr("+1m", last)
        .is_err()
    );
    assert!(
      parse_date_expr("friday", last)
        .is_err()
    );
    assert_eq!(
      parse_date_expr("today", last)
        .expect("today"),
      last
    );

    let first = key("0000-01-01");
    assert!(
      parse_date_expr("yesterday", first)
        .is_err()
    );
    assert!(
      parse_date_expr("-1w", first)
        .is_err()
    );
    assert_eq!(
      last.add_days(1),
      DateKey::max_value()
    );
  }

  #[test]
  fn parses_weekday_name_as_next_occurrence()
  {
    // 2026-02-17 is a Tuesday.
    let today = key("2026-02-17");
    assert_eq!(
      parse_date_expr("wednesday", today)
        .expect("weekday"),
      key("2026-02-18")
    );
    assert_eq!(
      parse_date_expr("tue", today)
        .expect("weekday"),
      key("2026-02-24")
    );
  }

  #[test]
  fn year_month_navigation() {
    let month = parse_month_expr("2024-12")
      .expect("month");
    assert_eq!(month.next().to_string(), "2025-01");
    assert_eq!(month.prev().to_string(), "2024-11");
    assert_eq!(
      YearMonth::new(2024, 2)
        .expect("feb")
        .days_in_month(),
      29
    );
    assert!(parse_month_expr("2024-13").is_err());
  }

  #[test]
  fn unknown_recurrence_reads_as_none() {
    let parsed: Recurrence =
      serde_json::from_str("\"hourly\"")
        .expect("lenient");
    assert_eq!(parsed, Recurrence::None);
    let parsed: Recurrence =
      serde_json::from_str("\"monthly\"")
        .expect("monthly");
    assert_eq!(parsed, Recurrence::Monthly);
  }
}
