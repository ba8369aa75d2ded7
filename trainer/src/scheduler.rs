//! SM-2 style review scheduling. Every function takes `today` explicitly.

use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::{OpeningId, ReviewCard};

pub const DEFAULT_EASE: f64 = 2.5;
pub const MIN_EASE: f64 = 1.3;
pub const MAX_EASE: f64 = 3.0;
const MAX_INTERVAL_DAYS: u32 = 36_500;

/// How a review went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
    /// Recall quality 0..=5; below 3 counts as a fail.
    Graded(u8),
}

impl Outcome {
    pub fn is_pass(self) -> bool {
        match self {
            Self::Pass => true,
            Self::Fail => false,
            Self::Graded(q) => q >= 3,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail => write!(f, "fail"),
            Self::Graded(q) => write!(f, "{}", q),
        }
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pass" | "p" => Ok(Self::Pass),
            "fail" | "f" => Ok(Self::Fail),
            other => match other.parse::<u8>() {
                Ok(q) if q <= 5 => Ok(Self::Graded(q)),
                _ => Err(format!("expected pass, fail or a grade 0..5, got '{}'", s)),
            },
        }
    }
}

/// Whether a card had to be created.
#[derive(Debug, Clone, PartialEq)]
pub enum Seeded {
    Created(ReviewCard),
    Existing(ReviewCard),
}

impl Seeded {
    pub fn card(&self) -> &ReviewCard {
        match self {
            Self::Created(card) | Self::Existing(card) => card,
        }
    }

    pub fn into_card(self) -> ReviewCard {
        match self {
            Self::Created(card) | Self::Existing(card) => card,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// A fresh card, due immediately.
pub fn new_card(opening_id: OpeningId, today: NaiveDate) -> ReviewCard {
    ReviewCard {
        opening_id,
        ease_factor: DEFAULT_EASE,
        interval_days: 0,
        repetitions: 0,
        lapses: 0,
        due_date: today,
        last_reviewed: None,
    }
}

pub fn seed_or_load(opening_id: OpeningId, existing: Option<ReviewCard>, today: NaiveDate) -> Seeded {
    match existing {
        Some(card) => Seeded::Existing(card),
        None => Seeded::Created(new_card(opening_id, today)),
    }
}

pub fn is_due(card: &ReviewCard, today: NaiveDate) -> bool {
    card.due_date <= today
}

/// The card after reviewing it on `today` with `outcome`.
pub fn apply_outcome(card: &ReviewCard, outcome: Outcome, today: NaiveDate) -> ReviewCard {
    let mut next = card.clone();
    next.last_reviewed = Some(today);

    if !outcome.is_pass() {
        next.repetitions = 0;
        next.interval_days = 1;
        next.ease_factor = (card.ease_factor - 0.20).max(MIN_EASE);
        next.lapses = card.lapses.saturating_add(1);
        next.due_date = add_days(today, 1);
        return next;
    }

    let ease = match outcome {
        Outcome::Graded(q) => {
            let miss = f64::from(5 - q.min(5));
            card.ease_factor + 0.1 - miss * (0.08 + miss * 0.02)
        }
        _ => card.ease_factor + 0.10,
    };
    next.ease_factor = ease.clamp(MIN_EASE, MAX_EASE);
    next.repetitions = card.repetitions.saturating_add(1);

    let prev = card.interval_days;
    let grown = (f64::from(prev) * next.ease_factor).ceil() as u32;
    next.interval_days = grown.max(prev + 1).min(MAX_INTERVAL_DAYS);
    next.due_date = add_days(today, next.interval_days);
    next
}

fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

/// An opening's card together with the name used for ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueEntry {
    pub opening_id: OpeningId,
    pub name: String,
    pub card: ReviewCard,
}

fn by_due_then_name(a: &QueueEntry, b: &QueueEntry) -> std::cmp::Ordering {
    a.card
        .due_date
        .cmp(&b.card.due_date)
        .then_with(|| a.name.cmp(&b.name))
}

/// Due entries, earliest first.
pub fn due_entries(entries: &[QueueEntry], today: NaiveDate, limit: usize) -> Vec<QueueEntry> {
    let mut due: Vec<QueueEntry> = entries
        .iter()
        .filter(|e| is_due(&e.card, today))
        .cloned()
        .collect();
    due.sort_by(by_due_then_name);
    due.truncate(limit);
    due
}

/// Entries to quiz: the due ones, or when nothing is due the soonest
/// upcoming ones.
pub fn pick_for_quiz(entries: &[QueueEntry], today: NaiveDate, limit: usize) -> Vec<QueueEntry> {
    let due = due_entries(entries, today, limit);
    if !due.is_empty() {
        return due;
    }
    let mut upcoming = entries.to_vec();
    upcoming.sort_by(by_due_then_name);
    upcoming.truncate(limit);
    upcoming
}
