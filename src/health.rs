//! Organism health engine. Health is a fold over a deduplicated event log,
//! never a directly-set counter: re-deriving from the same batch snapshot on
//! the same calendar day is always a no-op.

use crate::clock::date_of_ts;
use crate::date::{add_days, compact_date, days_between};
use crate::error::CliError;
use crate::model::{
    Batch, BatchStatus, HealthDb, HealthEvent, HealthEventKind, INITIAL_HEALTH, MAX_HEALTH,
};

pub const BATCH_SUCCESS_DELTA: i32 = 5;
pub const BATCH_OVERDUE_DELTA: i32 = -5;
pub const DAILY_CARE_DELTA: i32 = 1;
pub const QUEST_COMPLETE_DELTA: i32 = 3;
pub const TIME_DECAY_PER_DAY: i32 = -2;

/// Overdue means this many days past the target before health suffers.
pub const OVERDUE_GRACE_DAYS: u32 = 2;

/// Net change worth surfacing as a user-facing notice.
pub const NOTABLE_CHANGE: i32 = 3;

fn success_event_id(batch_id: &str) -> String {
    format!("success:{}", batch_id)
}

fn overdue_event_id(batch_id: &str, today: &str) -> String {
    format!("overdue:{}:{}", batch_id, compact_date(today))
}

fn care_event_id(batch_id: &str, today: &str) -> String {
    format!("care:{}:{}", batch_id, compact_date(today))
}

fn decay_event_id(today: &str) -> String {
    format!("decay:{}", compact_date(today))
}

fn has_event(db: &HealthDb, id: &str) -> bool {
    db.health_events.iter().any(|e| e.id == id)
}

fn clamp_health(value: i32) -> i32 {
    value.clamp(0, MAX_HEALTH)
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SyncOutcome {
    pub delta: i32,
    pub current_health: i32,
    pub events: Vec<HealthEvent>,
}

impl SyncOutcome {
    pub fn is_notable(&self) -> bool {
        self.delta.abs() >= NOTABLE_CHANGE
    }
}

/// Derives health changes from the current batch snapshot. Event ids encode
/// (kind, batch, calendar day), so running this fifty times a day appends
/// nothing after the first run.
pub fn sync_from_batches(
    db: &mut HealthDb,
    batches: &[Batch],
    today: &str,
    now: &str,
) -> Result<SyncOutcome, CliError> {
    let mut events: Vec<HealthEvent> = Vec::new();

    for batch in batches {
        match batch.status {
            BatchStatus::Ready | BatchStatus::Bottled => {
                let id = success_event_id(&batch.id);
                if !has_event(db, &id) {
                    events.push(HealthEvent {
                        id,
                        kind: HealthEventKind::BatchSuccess,
                        value: BATCH_SUCCESS_DELTA,
                        ts: now.to_string(),
                        description: format!("Successfully completed {}", batch.name),
                    });
                }
            }
            BatchStatus::Brewing => {
                if batch.current_day > batch.target_days + OVERDUE_GRACE_DAYS {
                    let id = overdue_event_id(&batch.id, today);
                    if !has_event(db, &id) {
                        events.push(HealthEvent {
                            id,
                            kind: HealthEventKind::BatchOverdue,
                            value: BATCH_OVERDUE_DELTA,
                            ts: now.to_string(),
                            description: format!(
                                "{} is overdue by {} days",
                                batch.name,
                                batch.current_day - batch.target_days
                            ),
                        });
                    }
                }

                let id = care_event_id(&batch.id, today);
                if !has_event(db, &id) {
                    events.push(HealthEvent {
                        id,
                        kind: HealthEventKind::DailyCare,
                        value: DAILY_CARE_DELTA,
                        ts: now.to_string(),
                        description: format!("Daily care for {}", batch.name),
                    });
                }
            }
            _ => {}
        }
    }

    let elapsed = days_between(date_of_ts(&db.last_updated), today).unwrap_or(0);
    if elapsed >= 1 {
        let id = decay_event_id(today);
        if !has_event(db, &id) {
            events.push(HealthEvent {
                id,
                kind: HealthEventKind::TimeDecay,
                value: elapsed * TIME_DECAY_PER_DAY,
                ts: now.to_string(),
                description: "Health decay due to inactivity".to_string(),
            });
        }
    }

    let delta: i32 = events.iter().map(|e| e.value).sum();
    db.current_health = clamp_health(db.current_health + delta);
    db.health_events.extend(events.iter().cloned());
    db.last_updated = now.to_string();

    Ok(SyncOutcome {
        delta,
        current_health: db.current_health,
        events,
    })
}

/// Flat bonus for a completed quest. Not deduplicated here: quest completion
/// is already one-shot upstream.
pub fn apply_quest_bonus(db: &mut HealthDb, quest_id: &str, quest_title: &str, now: &str) -> i32 {
    let event = HealthEvent {
        id: format!("quest:{}", quest_id),
        kind: HealthEventKind::QuestComplete,
        value: QUEST_COMPLETE_DELTA,
        ts: now.to_string(),
        description: format!("Completed quest: {}", quest_title),
    };
    db.current_health = clamp_health(db.current_health + event.value);
    db.health_events.push(event);
    db.last_updated = now.to_string();
    QUEST_COMPLETE_DELTA
}

pub fn reset(db: &mut HealthDb, now: &str) {
    db.current_health = INITIAL_HEALTH;
    db.health_events.clear();
    db.last_updated = now.to_string();
}

pub fn status_label(health: i32) -> &'static str {
    if health >= 80 {
        "Thriving"
    } else if health >= 60 {
        "Healthy"
    } else if health >= 40 {
        "Needs Care"
    } else if health >= 20 {
        "Warning"
    } else {
        "Critical"
    }
}

pub fn mood_label(health: i32) -> &'static str {
    if health >= 80 {
        "happy"
    } else if health >= 60 {
        "neutral"
    } else if health >= 40 {
        "concerned"
    } else if health >= 20 {
        "worried"
    } else {
        "sick"
    }
}

/// Events from the last 7 calendar days (today inclusive).
pub fn recent_events<'a>(db: &'a HealthDb, today: &str) -> Vec<&'a HealthEvent> {
    let cutoff = match add_days(today, -6) {
        Ok(d) => d,
        Err(_) => return Vec::new(),
    };
    db.health_events
        .iter()
        .filter(|e| date_of_ts(&e.ts) >= cutoff.as_str())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
        }
    }
}

pub fn trend(db: &HealthDb, today: &str) -> Trend {
    let total: i32 = recent_events(db, today).iter().map(|e| e.value).sum();
    if total > 2 {
        Trend::Improving
    } else if total < -2 {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::default_health_db;

    const NOW: &str = "2026-01-31T12:00:00Z";
    const TODAY: &str = "2026-01-31";

    fn brewing(id: &str, current_day: u32, target_days: u32) -> Batch {
        Batch {
            id: id.to_string(),
            name: format!("Batch {}", id),
            tea_type: "Black Tea".to_string(),
            notes: None,
            start_date: TODAY.to_string(),
            target_days,
            current_day,
            status: BatchStatus::Brewing,
            previous_status: None,
            is_active: true,
            created_at: NOW.to_string(),
            updated_at: NOW.to_string(),
            f2_start_date: None,
            f2_target_days: None,
            f2_current_day: None,
            f2_flavorings: Vec::new(),
            tea_amount: None,
            tea_amount_unit: None,
            sugar_amount: None,
            sugar_amount_unit: None,
        }
    }

    fn ready(id: &str) -> Batch {
        let mut b = brewing(id, 7, 7);
        b.status = BatchStatus::Ready;
        b
    }

    #[test]
    fn repeated_sync_is_idempotent_within_a_day() {
        let mut db = default_health_db(NOW);
        let batches = vec![brewing("b0001", 3, 7), ready("b0002")];

        let first = sync_from_batches(&mut db, &batches, TODAY, NOW).unwrap();
        assert_eq!(first.delta, DAILY_CARE_DELTA + BATCH_SUCCESS_DELTA);
        assert_eq!(first.events.len(), 2);

        for _ in 0..50 {
            let again = sync_from_batches(&mut db, &batches, TODAY, NOW).unwrap();
            assert_eq!(again.delta, 0);
            assert!(again.events.is_empty());
        }
        assert_eq!(db.health_events.len(), 2);
    }

    #[test]
    fn overdue_fires_once_per_day_after_grace() {
        let mut db = default_health_db(NOW);
        // 3 days over target: beyond the 2-day grace window.
        let batches = vec![brewing("b0001", 10, 7)];

        let first = sync_from_batches(&mut db, &batches, TODAY, NOW).unwrap();
        let overdue: Vec<_> = first
            .events
            .iter()
            .filter(|e| e.kind == HealthEventKind::BatchOverdue)
            .collect();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].value, BATCH_OVERDUE_DELTA);

        for _ in 0..50 {
            let again = sync_from_batches(&mut db, &batches, TODAY, NOW).unwrap();
            assert!(again.events.is_empty());
        }

        // The next calendar day triggers a fresh overdue (and care) event.
        let next = sync_from_batches(&mut db, &batches, "2026-02-01", "2026-02-01T08:00:00Z")
            .unwrap();
        assert!(next
            .events
            .iter()
            .any(|e| e.kind == HealthEventKind::BatchOverdue));
    }

    #[test]
    fn grace_window_defers_overdue() {
        let mut db = default_health_db(NOW);
        // Exactly target+2: still inside grace, no overdue event.
        let batches = vec![brewing("b0001", 9, 7)];
        let out = sync_from_batches(&mut db, &batches, TODAY, NOW).unwrap();
        assert!(!out
            .events
            .iter()
            .any(|e| e.kind == HealthEventKind::BatchOverdue));
    }

    #[test]
    fn decay_applies_whole_elapsed_days_once() {
        let mut db = default_health_db("2026-01-28T09:00:00Z");
        let out = sync_from_batches(&mut db, &[], TODAY, NOW).unwrap();
        // 3 elapsed days at -2 each, in a single event.
        assert_eq!(out.events.len(), 1);
        assert_eq!(out.events[0].kind, HealthEventKind::TimeDecay);
        assert_eq!(out.events[0].value, -6);
        assert_eq!(db.current_health, INITIAL_HEALTH - 6);

        let again = sync_from_batches(&mut db, &[], TODAY, NOW).unwrap();
        assert!(again.events.is_empty());
    }

    #[test]
    fn health_stays_clamped_to_bounds() {
        let mut db = default_health_db(NOW);
        db.current_health = 2;
        let batches = vec![brewing("b0001", 20, 7)];
        sync_from_batches(&mut db, &batches, TODAY, NOW).unwrap();
        assert!(db.current_health >= 0);

        let mut db = default_health_db(NOW);
        db.current_health = 99;
        let batches = vec![ready("b0001"), ready("b0002")];
        sync_from_batches(&mut db, &batches, TODAY, NOW).unwrap();
        assert_eq!(db.current_health, MAX_HEALTH);
    }

    #[test]
    fn quest_bonus_is_not_deduplicated() {
        let mut db = default_health_db(NOW);
        db.current_health = 50;
        apply_quest_bonus(&mut db, "first-batch", "Brew Your First Batch", NOW);
        assert_eq!(db.current_health, 53);
        assert_eq!(db.health_events.len(), 1);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut db = default_health_db(NOW);
        db.current_health = 12;
        db.health_events.push(HealthEvent {
            id: "quest:x".to_string(),
            kind: HealthEventKind::QuestComplete,
            value: 3,
            ts: NOW.to_string(),
            description: "x".to_string(),
        });
        reset(&mut db, NOW);
        assert_eq!(db.current_health, INITIAL_HEALTH);
        assert!(db.health_events.is_empty());
    }

    #[test]
    fn status_bands() {
        assert_eq!(status_label(100), "Thriving");
        assert_eq!(status_label(80), "Thriving");
        assert_eq!(status_label(79), "Healthy");
        assert_eq!(status_label(40), "Needs Care");
        assert_eq!(status_label(20), "Warning");
        assert_eq!(status_label(19), "Critical");
        assert_eq!(mood_label(85), "happy");
        assert_eq!(mood_label(10), "sick");
    }

    #[test]
    fn trend_buckets_recent_events() {
        let mut db = default_health_db(NOW);
        assert_eq!(trend(&db, TODAY), Trend::Stable);

        db.health_events.push(HealthEvent {
            id: "success:b0001".to_string(),
            kind: HealthEventKind::BatchSuccess,
            value: 5,
            ts: NOW.to_string(),
            description: "x".to_string(),
        });
        assert_eq!(trend(&db, TODAY), Trend::Improving);

        // An old event falls outside the 7-day window.
        db.health_events[0].ts = "2026-01-20T12:00:00Z".to_string();
        assert_eq!(trend(&db, TODAY), Trend::Stable);

        db.health_events.push(HealthEvent {
            id: "overdue:b0002:20260131".to_string(),
            kind: HealthEventKind::BatchOverdue,
            value: -5,
            ts: NOW.to_string(),
            description: "x".to_string(),
        });
        assert_eq!(trend(&db, TODAY), Trend::Declining);
    }
}
