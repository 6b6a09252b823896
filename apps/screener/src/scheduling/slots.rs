use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

pub const INTERVIEW_DURATION_MINUTES: i64 = 60;

/// A one-hour interview slot. Interchangeable until assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InterviewSlot {
    pub start: NaiveDateTime,
}

impl InterviewSlot {
    pub fn new(start: NaiveDateTime) -> Self {
        Self { start }
    }

    pub fn end(&self) -> NaiveDateTime {
        self.start + Duration::minutes(INTERVIEW_DURATION_MINUTES)
    }
}

/// Hourly weekday slots starting tomorrow (local time).
pub fn generate_slots(
    window_days: u32,
    start_hour: u32,
    end_hour: u32,
    max_slots: usize,
) -> Vec<InterviewSlot> {
    generate_slots_from(
        Local::now().date_naive(),
        window_days,
        start_hour,
        end_hour,
        max_slots,
    )
}

/// Walks forward from the day after `today`, one day at a time, collecting
/// slots in `[start_hour, end_hour)` on weekdays until `max_slots` are
/// gathered or `window_days` days have been visited.
pub fn generate_slots_from(
    today: NaiveDate,
    window_days: u32,
    start_hour: u32,
    end_hour: u32,
    max_slots: usize,
) -> Vec<InterviewSlot> {
    let mut slots = Vec::new();
    if max_slots == 0 || start_hour >= end_hour {
        return slots;
    }

    for offset in 1..=i64::from(window_days) {
        let Some(day) = today.checked_add_signed(Duration::days(offset)) else {
            break;
        };
        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        for hour in start_hour..end_hour {
            let Some(start) = day.and_hms_opt(hour, 0, 0) else {
                continue;
            };
            slots.push(InterviewSlot::new(start));
            if slots.len() == max_slots {
                return slots;
            }
        }
    }

    slots
}
