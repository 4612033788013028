use crate::datekey::DateKey;

pub fn season_emoji(month_index0: u32) -> &'static str {
    match month_index0 {
        2..=4 => "🌸",
        5..=7 => "☀️",
        8..=10 => "🍁",
        _ => "❄️",
    }
}

/// Rolling `hash * 31 + unit` over the UTF-16 code units of the key, kept to
/// 32 bits.
pub fn mood_hash(date_key: &str) -> u32 {
    date_key
        .encode_utf16()
        .fold(0u32, |hash, unit| hash.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

pub fn daily_mood<'a>(date_key: DateKey, pool: &[&'a str]) -> Option<&'a str> {
    if pool.is_empty() {
        return None;
    }
    let idx = mood_hash(&date_key.to_string()) as usize % pool.len();
    pool.get(idx).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datekey::parse_date_key;

    #[test]
    fn seasons_wrap_december_into_winter() {
        assert_eq!(season_emoji(11), "❄️");
        assert_eq!(season_emoji(0), "❄️");
        assert_eq!(season_emoji(1), "❄️");
        assert_eq!(season_emoji(2), "🌸");
        assert_eq!(season_emoji(7), "☀️");
        assert_eq!(season_emoji(10), "🍁");
    }

    #[test]
    fn hash_matches_reference_values() {
        assert_eq!(mood_hash(""), 0);
        assert_eq!(mood_hash("a"), 97);
        assert_eq!(mood_hash("ab"), 97 * 31 + 98);
        // Long enough to wrap past u32::MAX.
        let manual = "2024-03-10"
            .bytes()
            .fold(0u64, |h, b| (h * 31 + u64::from(b)) % (1u64 << 32));
        assert_eq!(u64::from(mood_hash("2024-03-10")), manual);
    }

    #[test]
    fn mood_is_deterministic() {
        let pool = ["one", "two", "three", "four", "five"];
        let day = parse_date_key("2024-03-10").expect("key");
        let first = daily_mood(day, &pool);
        assert!(first.is_some());
        assert_eq!(first, daily_mood(day, &pool));
        assert_eq!(daily_mood(day, &[]), None);
    }
}
