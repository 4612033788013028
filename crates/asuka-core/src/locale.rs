use std::str::FromStr;

use anyhow::anyhow;

use crate::datekey::Recurrence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Ja,
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "english" => Ok(Language::En),
            "ja" | "ja-jp" | "japanese" => Ok(Language::Ja),
            other => Err(anyhow!("unsupported language: {other} (expected en or ja)")),
        }
    }
}

impl Language {
    pub fn strings(self) -> &'static Strings {
        match self {
            Language::En => &EN,
            Language::Ja => &JA,
        }
    }
}

/// User-facing labels for one language.
#[derive(Debug)]
pub struct Strings {
    pub moods: &'static [&'static str],
    /// Sunday first.
    pub days_short: [&'static str; 7],
    pub months: [&'static str; 12],
    pub nothing_urgent: &'static str,
    pub global: &'static str,
    pub due: &'static str,
    pub pic: &'static str,
    pub progress: &'static str,
    pub completed: &'static str,
    pub repeat: &'static str,
    pub repeat_none: &'static str,
    pub daily: &'static str,
    pub weekly: &'static str,
    pub monthly: &'static str,
    pub yearly: &'static str,
    pub events: &'static str,
    pub trips: &'static str,
    pub todos: &'static str,
    pub wishlist: &'static str,
    pub no_events: &'static str,
    pub no_trips: &'static str,
    pub no_todos: &'static str,
    pub no_wishlist: &'static str,
    pub no_planned: &'static str,
    pub no_deadlines: &'static str,
    count_space: bool,
    people: &'static str,
    tasks: &'static str,
    items: &'static str,
    total: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountUnit {
    People,
    Tasks,
    Items,
    Total,
}

impl Strings {
    pub fn count_label(&self, n: usize, unit: CountUnit) -> String {
        let word = match unit {
            CountUnit::People => self.people,
            CountUnit::Tasks => self.tasks,
            CountUnit::Items => self.items,
            CountUnit::Total => self.total,
        };
        if self.count_space {
            format!("{n} {word}")
        } else {
            format!("{n}{word}")
        }
    }

    pub fn recurrence_label(&self, kind: Recurrence) -> &'static str {
        match kind {
            Recurrence::None => self.repeat_none,
            Recurrence::Daily => self.daily,
            Recurrence::Weekly => self.weekly,
            Recurrence::Monthly => self.monthly,
            Recurrence::Yearly => self.yearly,
        }
    }

    /// `Repeat: Monthly`, or the no-repeat label on its own.
    pub fn recurrence_summary(&self, kind: Recurrence) -> String {
        if kind.is_none() {
            self.repeat_none.to_string()
        } else {
            format!("{}: {}", self.repeat, self.recurrence_label(kind))
        }
    }

    pub fn month_label(&self, year: i32, month: u32) -> String {
        let name = month
            .checked_sub(1)
            .and_then(|idx| self.months.get(idx as usize))
            .copied()
            .unwrap_or("?");
        if self.count_space {
            format!("{name} {year}")
        } else {
            format!("{year}年{name}")
        }
    }
}

pub static EN: Strings = Strings {
    moods: &[
        "Small steps are enough 🌿",
        "Plan something gentle today ☁️",
        "A little progress is still progress ✨",
        "Treat yourself kindly today ☕",
        "One cute plan at a time 🫶",
        "Make space for fun too 🌈",
        "You’re doing great — quietly 🌙",
        "Today feels like a good day to plan 🌤️",
    ],
    days_short: ["S", "M", "T", "W", "T", "F", "S"],
    months: [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ],
    nothing_urgent: "Nothing urgent — enjoy! 💤",
    global: "Global",
    due: "Due",
    pic: "PIC",
    progress: "Progress",
    completed: "Completed",
    repeat: "Repeat",
    repeat_none: "No repeat",
    daily: "Daily",
    weekly: "Weekly",
    monthly: "Monthly",
    yearly: "Yearly",
    events: "Events",
    trips: "Trips",
    todos: "TODOs",
    wishlist: "Wishlist",
    no_events: "No events yet — add a little joy ✨",
    no_trips: "No trips yet — someday? 🧳",
    no_todos: "No deadlines — breathe 🌿",
    no_wishlist: "Nothing here yet — add a little dream 💭",
    no_planned: "Nothing planned here yet ✨",
    no_deadlines: "No deadlines — cozy day ☕",
    count_space: true,
    people: "people",
    tasks: "tasks",
    items: "items",
    total: "total",
};

pub static JA: Strings = Strings {
    moods: &[
        "小さな一歩で十分だよ 🌿",
        "今日はやさしい予定を ☁️",
        "少しの前進も素敵 ✨",
        "自分に優しくね ☕",
        "かわいい計画を少しずつ 🫶",
        "楽しい時間も忘れずに 🌈",
        "静かに頑張っててえらい 🌙",
        "今日は計画にぴったりの日 🌤️",
    ],
    days_short: ["日", "月", "火", "水", "木", "金", "土"],
    months: [
        "1月", "2月", "3月", "4月", "5月", "6月", "7月", "8月", "9月", "10月", "11月", "12月",
    ],
    nothing_urgent: "急ぎなし — のんびり 💤",
    global: "全体",
    due: "期限",
    pic: "担当",
    progress: "進捗",
    completed: "完了",
    repeat: "繰り返し",
    repeat_none: "繰り返しなし",
    daily: "毎日",
    weekly: "毎週",
    monthly: "毎月",
    yearly: "毎年",
    events: "イベント",
    trips: "旅行",
    todos: "TODO",
    wishlist: "ウィッシュリスト",
    no_events: "イベントはまだありません ✨",
    no_trips: "旅行はまだありません 🧳",
    no_todos: "期限なし — 深呼吸 🌿",
    no_wishlist: "まだありません — 夢を追加 💭",
    no_planned: "まだ予定なし ✨",
    no_deadlines: "期限なし — ほっと一息 ☕",
    count_space: false,
    people: "人",
    tasks: "件",
    items: "件",
    total: "件",
};
