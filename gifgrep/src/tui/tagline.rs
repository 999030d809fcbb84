// ABOUTME: Header taglines with date-based holiday overrides
// ABOUTME: GIFGREP_TAGLINE_INDEX pins a specific line for screenshots and tests

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use std::time::{Duration, Instant};

use crate::constants::env;

pub const DEFAULT_TAGLINE: &str = "Grep the GIF. Stick the landing.";

const REGULAR: &[&str] = &[
    DEFAULT_TAGLINE,
    "Zero context, maximum reaction.",
    "Search. Select. Send. Regret nothing.",
    "Your command line, now with subtext.",
    "The fastest way to say \u{201c}same\u{201d}.",
    "Terminal GIFs: because meetings have feelings.",
    "Pipes welcome. Vibes optional.",
    "When words fail, grep harder.",
    "Search like you mean it: bytes, vibes, boom.",
    "Animated reactions, zero tab clutter.",
    "Your terminal\u{2019}s GIF aisle. No checkout lines.",
    "Arrow keys in, serotonin out.",
    "Find the bit. Drop the mic. Paste the GIF.",
    "Less scrolling, more scene-stealing.",
];

struct Holiday {
    tagline: &'static str,
    applies: fn(NaiveDate) -> bool,
}

const HOLIDAYS: &[Holiday] = &[
    Holiday {
        tagline: "New year, new reactions. Same terminal.",
        applies: |d| d.month() == 1 && d.day() == 1,
    },
    Holiday {
        tagline: "Valentine's Day: be mine. Or at least be looped.",
        applies: |d| d.month() == 2 && d.day() == 14,
    },
    Holiday {
        tagline: "April Fools': trust no GIF. Especially this one.",
        applies: |d| d.month() == 4 && d.day() == 1,
    },
    Holiday {
        tagline: "May the GIF be with you.",
        applies: |d| d.month() == 5 && d.day() == 4,
    },
    Holiday {
        tagline: "Pride Month: full color, zero red in CI.",
        applies: |d| d.month() == 6,
    },
    Holiday {
        tagline: "July 4th: fireworks outside, not in your stack traces.",
        applies: |d| d.month() == 7 && d.day() == 4,
    },
    Holiday {
        tagline: "Halloween: ship treats, not trick exceptions.",
        applies: |d| d.month() == 10 && d.day() == 31,
    },
    Holiday {
        tagline: "Thanksgiving: grateful for green builds and better GIFs.",
        applies: is_thanksgiving,
    },
    Holiday {
        tagline: "Black Friday: no deals, just premium reactions.",
        applies: |d| d.pred_opt().is_some_and(is_thanksgiving),
    },
    Holiday {
        tagline: "Christmas: all is calm, all is animated.",
        applies: |d| d.month() == 12 && d.day() == 25,
    },
];

/// Fourth Thursday of November.
fn is_thanksgiving(date: NaiveDate) -> bool {
    date.month() == 11
        && NaiveDate::from_weekday_of_month_opt(date.year(), 11, Weekday::Thu, 4) == Some(date)
}

pub fn all_taglines() -> Vec<&'static str> {
    REGULAR
        .iter()
        .copied()
        .chain(HOLIDAYS.iter().map(|h| h.tagline))
        .collect()
}

pub fn active_holidays(date: NaiveDate) -> Vec<&'static str> {
    HOLIDAYS
        .iter()
        .filter(|h| (h.applies)(date))
        .map(|h| h.tagline)
        .collect()
}

/// Picks a tagline for `now`. `roll` in `[0, 1)` selects from the pool.
pub fn pick_tagline(
    now: DateTime<Utc>,
    getenv: impl Fn(&str) -> Option<String>,
    roll: f64,
) -> &'static str {
    if let Some(index) = getenv(env::TAGLINE_INDEX).and_then(|raw| raw.trim().parse::<usize>().ok()) {
        let all = all_taglines();
        return all[index % all.len()];
    }

    let specials = active_holidays(now.date_naive());
    let pool: &[&'static str] = if specials.is_empty() { REGULAR } else { &specials };
    let index = ((roll * pool.len() as f64) as usize).min(pool.len() - 1);
    pool[index]
}

/// Cheap per-run roll without pulling in a random number generator.
pub fn clock_roll(now: DateTime<Utc>) -> f64 {
    now.timestamp_subsec_nanos() as f64 / 1_000_000_000.0
}

/// Seconds-long header override, e.g. after saving a file.
#[derive(Debug, Default, Clone)]
pub struct HeaderFlash {
    message: Option<(String, Instant)>,
}

impl HeaderFlash {
    pub fn show(&mut self, message: &str, now: Instant, ttl: Duration) {
        let message = message.trim();
        if message.is_empty() {
            return;
        }
        self.message = Some((message.to_string(), now + ttl));
    }

    /// Active message, dropping it once expired.
    pub fn current(&mut self, now: Instant) -> Option<&str> {
        if self.message.as_ref().is_some_and(|(_, until)| now >= *until) {
            self.message = None;
        }
        self.message.as_ref().map(|(m, _)| m.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_index_override_wraps() {
        let all = all_taglines();
        let env = |_: &str| Some("1".to_string());
        assert_eq!(pick_tagline(at(2025, 3, 3), env, 0.0), all[1]);

        let wrapped = (all.len() + 2).to_string();
        let env = move |_: &str| Some(wrapped.clone());
        assert_eq!(pick_tagline(at(2025, 3, 3), env, 0.0), all[2]);
    }

    #[test]
    fn test_invalid_index_is_ignored() {
        let env = |_: &str| Some("-3".to_string());
        assert_eq!(pick_tagline(at(2025, 3, 3), env, 0.0), DEFAULT_TAGLINE);
    }

    #[test]
    fn test_holidays_take_precedence() {
        assert_eq!(
            pick_tagline(at(2025, 12, 25), no_env, 0.9),
            "Christmas: all is calm, all is animated."
        );
        assert_eq!(pick_tagline(at(2025, 5, 4), no_env, 0.5), "May the GIF be with you.");
        assert_eq!(
            pick_tagline(at(2025, 6, 17), no_env, 0.99),
            "Pride Month: full color, zero red in CI."
        );
    }

    #[test]
    fn test_thanksgiving_and_black_friday() {
        // 2025-11-27 is the fourth Thursday.
        assert_eq!(
            active_holidays(at(2025, 11, 27).date_naive()),
            vec!["Thanksgiving: grateful for green builds and better GIFs."]
        );
        assert_eq!(
            active_holidays(at(2025, 11, 28).date_naive()),
            vec!["Black Friday: no deals, just premium reactions."]
        );
        assert!(active_holidays(at(2025, 11, 20).date_naive()).is_empty());
    }

    #[test]
    fn test_roll_selects_from_regular_pool() {
        assert_eq!(pick_tagline(at(2025, 3, 3), no_env, 0.0), REGULAR[0]);
        assert_eq!(
            pick_tagline(at(2025, 3, 3), no_env, 0.999_999),
            REGULAR[REGULAR.len() - 1]
        );
    }

    #[test]
    fn test_header_flash_expires() {
        let mut flash = HeaderFlash::default();
        let now = Instant::now();
        flash.show("Saved cat.gif", now, Duration::from_secs(3));
        assert_eq!(flash.current(now), Some("Saved cat.gif"));
        assert_eq!(flash.current(now + Duration::from_secs(2)), Some("Saved cat.gif"));
        assert_eq!(flash.current(now + Duration::from_secs(3)), None);

        flash.show("   ", now, Duration::from_secs(3));
        assert_eq!(flash.current(now), None);
    }
}
