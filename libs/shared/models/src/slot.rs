// libs/shared/models/src/slot.rs
//! Weekly 15-minute slot grid.
//!
//! A [`Slot`] is one 15-minute unit of the recurring week, identified by
//! `(day, hour, minute)` and restricted to `06:00 <= time < 24:00`. Slots
//! outside that window cannot be constructed. The string form
//! `"<day>-<H:MM>"` is only produced and consumed at the serde boundary.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AppError;

pub const SLOT_MINUTES: u16 = 15;
pub const DAYS_PER_WEEK: u8 = 7;
pub const DAY_START_HOUR: u8 = 6;
pub const DAY_START_MINUTE: u16 = DAY_START_HOUR as u16 * 60;
pub const DAY_END_MINUTE: u16 = 24 * 60;
pub const SLOTS_PER_DAY: usize = ((DAY_END_MINUTE - DAY_START_MINUTE) / SLOT_MINUTES) as usize;

/// Ordered set of slots. Iteration is chronological (day, then time).
pub type SlotSet = BTreeSet<Slot>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    day: u8,
    hour: u8,
    minute: u8,
}

impl Slot {
    /// Validates and builds a slot. Fails with [`AppError::InvalidSlot`]
    /// outside the weekly window.
    pub fn new(day: u8, hour: u8, minute: u8) -> Result<Self, AppError> {
        if day >= DAYS_PER_WEEK {
            return Err(AppError::InvalidSlot(format!(
                "day {} outside 0..{}",
                day,
                DAYS_PER_WEEK - 1
            )));
        }
        if !(DAY_START_HOUR..24).contains(&hour) {
            return Err(AppError::InvalidSlot(format!(
                "hour {} outside {}..23",
                hour, DAY_START_HOUR
            )));
        }
        if minute >= 60 || minute as u16 % SLOT_MINUTES != 0 {
            return Err(AppError::InvalidSlot(format!(
                "minute {} is not a multiple of {}",
                minute, SLOT_MINUTES
            )));
        }

        Ok(Self { day, hour, minute })
    }

    pub fn from_minute_of_day(day: u8, minute_of_day: u16) -> Result<Self, AppError> {
        if minute_of_day >= DAY_END_MINUTE {
            return Err(AppError::InvalidSlot(format!(
                "minute of day {} is at or past 24:00",
                minute_of_day
            )));
        }
        Self::new(day, (minute_of_day / 60) as u8, (minute_of_day % 60) as u8)
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn minute_of_day(&self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }

    /// The slot `steps` quarter-hours later on the same day, if it is still
    /// before midnight.
    pub fn offset(&self, steps: u16) -> Option<Slot> {
        let minute_of_day = self.minute_of_day() + steps * SLOT_MINUTES;
        if minute_of_day >= DAY_END_MINUTE {
            return None;
        }
        Some(Slot {
            day: self.day,
            hour: (minute_of_day / 60) as u8,
            minute: (minute_of_day % 60) as u8,
        })
    }

    pub fn next(&self) -> Option<Slot> {
        self.offset(1)
    }

    /// Time-of-day part of the wire key, e.g. `"9:15"`.
    pub fn time_label(&self) -> String {
        format!("{}:{:02}", self.hour, self.minute)
    }

    /// Every valid slot of the week in chronological order.
    pub fn week() -> impl Iterator<Item = Slot> {
        (0..DAYS_PER_WEEK).flat_map(|day| {
            (0..SLOTS_PER_DAY as u16).map(move |i| {
                let minute_of_day = DAY_START_MINUTE + i * SLOT_MINUTES;
                Slot {
                    day,
                    hour: (minute_of_day / 60) as u8,
                    minute: (minute_of_day % 60) as u8,
                }
            })
        })
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}:{:02}", self.day, self.hour, self.minute)
    }
}

impl FromStr for Slot {
    type Err = AppError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::InvalidSlot(format!("malformed slot key '{}'", key));

        let (day, time) = key.split_once('-').ok_or_else(invalid)?;
        let (hour, minute) = time.split_once(':').ok_or_else(invalid)?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }

        let day: u8 = day.parse().map_err(|_| invalid())?;
        let hour: u8 = hour.parse().map_err(|_| invalid())?;
        let minute: u8 = minute.parse().map_err(|_| invalid())?;

        Slot::new(day, hour, minute)
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(de::Error::custom)
    }
}

/// Width of a display cell on the coarser presentation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Increment {
    #[default]
    Fifteen,
    Thirty,
    Sixty,
}

impl Increment {
    pub fn minutes(self) -> u16 {
        match self {
            Increment::Fifteen => 15,
            Increment::Thirty => 30,
            Increment::Sixty => 60,
        }
    }

    /// Number of 15-minute slots in one display cell.
    pub fn sub_slot_count(self) -> usize {
        (self.minutes() / SLOT_MINUTES) as usize
    }
}

impl TryFrom<u32> for Increment {
    type Error = AppError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        match minutes {
            15 => Ok(Increment::Fifteen),
            30 => Ok(Increment::Thirty),
            60 => Ok(Increment::Sixty),
            other => Err(AppError::InvalidIncrement(other)),
        }
    }
}

impl From<Increment> for u32 {
    fn from(increment: Increment) -> Self {
        increment.minutes() as u32
    }
}

/// Result of an all-or-nothing toggle over a display cell's sub-slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Sub-slots that were missing and have been added.
    Added(Vec<Slot>),
    /// Every sub-slot was present and all have been released.
    Removed(Vec<Slot>),
}

pub fn canonicalize(day: u8, hour: u8, minute: u8) -> Result<Slot, AppError> {
    Slot::new(day, hour, minute)
}

/// The consecutive 15-minute slots making up the display cell that contains
/// `cell`. An off-grid `cell` is floored onto the grid first, so the result
/// always starts on an increment boundary and never reaches 24:00.
pub fn sub_slots_of_display_cell(cell: Slot, increment: Increment) -> Vec<Slot> {
    let cell = project_to_display(cell, increment);
    (0..increment.sub_slot_count() as u16)
        .filter_map(|step| cell.offset(step))
        .collect()
}

/// Floors the minute component onto the display grid.
pub fn project_to_display(slot: Slot, increment: Increment) -> Slot {
    let width = increment.minutes() as u8;
    Slot {
        minute: slot.minute / width * width,
        ..slot
    }
}

pub fn union(a: &SlotSet, b: &SlotSet) -> SlotSet {
    a.union(b).copied().collect()
}

pub fn difference(a: &SlotSet, b: &SlotSet) -> SlotSet {
    a.difference(b).copied().collect()
}

pub fn union_all<'a, I>(sets: I) -> SlotSet
where
    I: IntoIterator<Item = &'a SlotSet>,
{
    sets.into_iter().flatten().copied().collect()
}

pub fn slots_to_hours(count: usize) -> f64 {
    count as f64 / 4.0
}

/// Parses `"H:MM"` / `"HH:MM"` into minutes after midnight. `"24:00"` is
/// accepted as an exclusive end bound.
pub fn parse_time_of_day(time: &str) -> Result<u16, AppError> {
    let invalid = || AppError::InvalidSlot(format!("malformed time '{}'", time));
    let (hour, minute) = time.trim().split_once(':').ok_or_else(invalid)?;
    let hour: u16 = hour.parse().map_err(|_| invalid())?;
    let minute: u16 = minute.parse().map_err(|_| invalid())?;
    if minute >= 60 || hour * 60 + minute > DAY_END_MINUTE {
        return Err(invalid());
    }
    Ok(hour * 60 + minute)
}

/// Consecutive slots of `day` covering `[start, end)`.
pub fn day_block(day: u8, start: &str, end: &str) -> Result<Vec<Slot>, AppError> {
    let start = parse_time_of_day(start)?;
    let end = parse_time_of_day(end)?;

    (start..end)
        .step_by(SLOT_MINUTES as usize)
        .map(|minute_of_day| Slot::from_minute_of_day(day, minute_of_day))
        .collect()
}

/// Groups slots into maximal per-day runs where each slot starts exactly
/// 15 minutes after the previous one. Runs come out in chronological order.
pub fn contiguous_runs<I>(slots: I) -> Vec<Vec<Slot>>
where
    I: IntoIterator<Item = Slot>,
{
    let ordered: SlotSet = slots.into_iter().collect();
    let mut runs: Vec<Vec<Slot>> = Vec::new();

    for slot in ordered {
        match runs.last_mut() {
            Some(run) if run.last().and_then(Slot::next) == Some(slot) => run.push(slot),
            _ => runs.push(vec![slot]),
        }
    }

    runs
}

/// Toggles a display cell in a free-standing selection (no ownership rules):
/// releases every sub-slot when all are present, otherwise fills the gaps.
pub fn toggle_selection(selection: &mut SlotSet, cell: Slot, increment: Increment) -> ToggleOutcome {
    let sub_slots = sub_slots_of_display_cell(cell, increment);

    if sub_slots.iter().all(|slot| selection.contains(slot)) {
        for slot in &sub_slots {
            selection.remove(slot);
        }
        ToggleOutcome::Removed(sub_slots)
    } else {
        let added: Vec<Slot> = sub_slots
            .into_iter()
            .filter(|slot| selection.insert(*slot))
            .collect();
        ToggleOutcome::Added(added)
    }
}
