//! The dashboard: active batches with their day counters, pet health at a
//! glance, and suggestions for what needs attention today.

use crate::health::{mood_label, status_label};
use crate::model::{Batch, BatchStatus, HealthDb};

#[derive(Debug, Clone, serde::Serialize)]
pub struct Dashboard {
    pub date: String,
    pub batches: Vec<BatchRow>,
    pub health: HealthSection,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchRow {
    pub id: String,
    pub name: String,
    pub tea_type: String,
    pub status: BatchStatus,
    pub day: u32,
    pub target_days: u32,
    pub percent: u32,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthSection {
    pub current_health: i32,
    pub max_health: i32,
    pub status: String,
    pub mood: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Suggestion {
    pub batch_id: String,
    pub kind: SuggestionKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    ReadyToBottle,
    F2Ready,
    Overdue,
    StartsSoon,
}

fn percent_done(current_day: u32, target_days: u32) -> u32 {
    if target_days == 0 {
        return 0;
    }
    let p = (current_day as f64 / target_days as f64) * 100.0;
    (p.round() as u32).min(100)
}

fn row_for(batch: &Batch) -> BatchRow {
    // F2 batches display the second fermentation counter.
    let (day, target) = match batch.status {
        BatchStatus::F2Brewing | BatchStatus::F2Ready => (
            batch.f2_current_day.unwrap_or(0),
            batch.f2_target_days.unwrap_or(0),
        ),
        _ => (batch.current_day, batch.target_days),
    };
    BatchRow {
        id: batch.id.clone(),
        name: batch.name.clone(),
        tea_type: batch.tea_type.clone(),
        status: batch.status,
        day,
        target_days: target,
        percent: percent_done(day, target),
    }
}

fn suggestions_for(batch: &Batch) -> Option<Suggestion> {
    match batch.status {
        BatchStatus::Planned => Some(Suggestion {
            batch_id: batch.id.clone(),
            kind: SuggestionKind::StartsSoon,
            message: format!("{} is planned to start on {}", batch.name, batch.start_date),
        }),
        BatchStatus::Brewing => {
            if batch.current_day > batch.target_days + 2 {
                Some(Suggestion {
                    batch_id: batch.id.clone(),
                    kind: SuggestionKind::Overdue,
                    message: format!(
                        "{} is overdue: day {} of {}",
                        batch.name, batch.current_day, batch.target_days
                    ),
                })
            } else if batch.current_day >= batch.target_days {
                Some(Suggestion {
                    batch_id: batch.id.clone(),
                    kind: SuggestionKind::ReadyToBottle,
                    message: format!(
                        "{} has reached day {}: taste it and mark it ready",
                        batch.name, batch.current_day
                    ),
                })
            } else {
                None
            }
        }
        BatchStatus::F2Brewing => {
            let day = batch.f2_current_day.unwrap_or(0);
            let target = batch.f2_target_days.unwrap_or(0);
            if target > 0 && day >= target {
                Some(Suggestion {
                    batch_id: batch.id.clone(),
                    kind: SuggestionKind::F2Ready,
                    message: format!(
                        "{} finished second fermentation: check carbonation",
                        batch.name
                    ),
                })
            } else {
                None
            }
        }
        _ => None,
    }
}

pub fn build_dashboard(batches: &[Batch], health: &HealthDb, today: &str) -> Dashboard {
    let active: Vec<&Batch> = batches.iter().filter(|b| b.is_active).collect();

    let rows = active.iter().map(|b| row_for(b)).collect();
    let suggestions = active.iter().filter_map(|b| suggestions_for(b)).collect();

    Dashboard {
        date: today.to_string(),
        batches: rows,
        health: HealthSection {
            current_health: health.current_health,
            max_health: health.max_health,
            status: status_label(health.current_health).to_string(),
            mood: mood_label(health.current_health).to_string(),
        },
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::default_health_db;

    const NOW: &str = "2026-01-31T12:00:00Z";

    fn batch(id: &str, status: BatchStatus, day: u32, target: u32) -> Batch {
        Batch {
            id: id.to_string(),
            name: format!("Batch {}", id),
            tea_type: "Black Tea".to_string(),
            notes: None,
            start_date: "2026-01-20".to_string(),
            target_days: target,
            current_day: day,
            status,
            previous_status: None,
            is_active: status != BatchStatus::Archived,
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

    #[test]
    fn archived_batches_stay_off_the_dashboard() {
        let batches = vec![
            batch("b0001", BatchStatus::Brewing, 3, 7),
            batch("b0002", BatchStatus::Archived, 9, 7),
        ];
        let dash = build_dashboard(&batches, &default_health_db(NOW), "2026-01-31");
        assert_eq!(dash.batches.len(), 1);
        assert_eq!(dash.batches[0].id, "b0001");
    }

    #[test]
    fn brewing_at_target_suggests_bottling() {
        let batches = vec![batch("b0001", BatchStatus::Brewing, 7, 7)];
        let dash = build_dashboard(&batches, &default_health_db(NOW), "2026-01-31");
        assert_eq!(dash.suggestions.len(), 1);
        assert_eq!(dash.suggestions[0].kind, SuggestionKind::ReadyToBottle);
    }

    #[test]
    fn overdue_outranks_ready_to_bottle() {
        let batches = vec![batch("b0001", BatchStatus::Brewing, 10, 7)];
        let dash = build_dashboard(&batches, &default_health_db(NOW), "2026-01-31");
        assert_eq!(dash.suggestions[0].kind, SuggestionKind::Overdue);
    }

    #[test]
    fn f2_counters_drive_the_row() {
        let mut b = batch("b0001", BatchStatus::F2Brewing, 9, 7);
        b.f2_current_day = Some(3);
        b.f2_target_days = Some(3);
        let dash = build_dashboard(&[b], &default_health_db(NOW), "2026-01-31");
        assert_eq!(dash.batches[0].day, 3);
        assert_eq!(dash.batches[0].percent, 100);
        assert_eq!(dash.suggestions[0].kind, SuggestionKind::F2Ready);
    }

    #[test]
    fn percent_is_clamped() {
        let batches = vec![batch("b0001", BatchStatus::Brewing, 20, 7)];
        let dash = build_dashboard(&batches, &default_health_db(NOW), "2026-01-31");
        assert_eq!(dash.batches[0].percent, 100);
    }
}
