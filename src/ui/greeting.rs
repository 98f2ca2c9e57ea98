/// Time-of-day greeting with user-customizable phrases.

use serde::{Deserialize, Serialize};

use crate::state::settings::SettingsStore;

pub const GREETINGS_KEY: &str = "greetings";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPart {
    Morning,
    Afternoon,
    Evening,
}

/// Morning before 12, afternoon before 18, evening otherwise.
pub fn part_for_hour(hour: u32) -> DayPart {
    if hour < 12 {
        DayPart::Morning
    } else if hour < 18 {
        DayPart::Afternoon
    } else {
        DayPart::Evening
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greetings {
    pub morning: String,
    pub afternoon: String,
    pub evening: String,
}

impl Default for Greetings {
    fn default() -> Self {
        Self {
            morning: "Good morning".to_string(),
            afternoon: "Good afternoon".to_string(),
            evening: "Good evening".to_string(),
        }
    }
}

impl Greetings {
    pub fn load(settings: &SettingsStore) -> Self {
        settings.get(GREETINGS_KEY).unwrap_or_default()
    }

    pub fn save(&self, settings: &mut SettingsStore) {
        settings.set(GREETINGS_KEY, self);
    }

    pub fn phrase(&self, part: DayPart) -> &str {
        match part {
            DayPart::Morning => &self.morning,
            DayPart::Afternoon => &self.afternoon,
            DayPart::Evening => &self.evening,
        }
    }

    /// Edit one phrase; blank input restores the default.
    pub fn set(&mut self, part: DayPart, text: &str) {
        let text = text.trim();
        let defaults = Self::default();
        let value = if text.is_empty() {
            defaults.phrase(part).to_string()
        } else {
            text.to_string()
        };
        match part {
            DayPart::Morning => self.morning = value,
            DayPart::Afternoon => self.afternoon = value,
            DayPart::Evening => self.evening = value,
        }
    }

    /// The line shown in the header, with the time-of-day emoji.
    pub fn line_for_hour(&self, hour: u32) -> String {
        let part = part_for_hour(hour);
        let emoji = match part {
            DayPart::Morning => "🌅",
            DayPart::Afternoon => "☀️",
            DayPart::Evening => "🌙",
        };
        format!("{} {emoji}", self.phrase(part))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_boundaries() {
        assert_eq!(part_for_hour(0), DayPart::Morning);
        assert_eq!(part_for_hour(11), DayPart::Morning);
        assert_eq!(part_for_hour(12), DayPart::Afternoon);
        assert_eq!(part_for_hour(17), DayPart::Afternoon);
        assert_eq!(part_for_hour(18), DayPart::Evening);
        assert_eq!(part_for_hour(23), DayPart::Evening);
    }

    #[test]
    fn test_custom_phrase_and_blank_restores_default() {
        let mut greetings = Greetings::default();
        greetings.set(DayPart::Morning, "Howdy");
        assert!(greetings.line_for_hour(8).starts_with("Howdy"));

        greetings.set(DayPart::Morning, "   ");
        assert!(greetings.line_for_hour(8).starts_with("Good morning"));
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = SettingsStore::open_at(dir.path().join("settings.json"));
        let mut greetings = Greetings::default();
        greetings.set(DayPart::Evening, "Good night");
        greetings.save(&mut settings);
        assert_eq!(Greetings::load(&settings), greetings);
    }
}
