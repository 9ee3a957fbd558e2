//! Batch lifecycle engine: day-counter derivation, the status transition
//! graph, archive/restore, and aggregate stats.

use crate::date::{days_between, parse_date_string};
use crate::error::CliError;
use crate::model::{Batch, BatchDb, BatchStatus, Flavoring, FlavoringKind};

pub const MAX_TARGET_DAYS: u32 = 30;
pub const MAX_F2_TARGET_DAYS: u32 = 14;

pub fn validate_batch_name(name: &str) -> Result<String, CliError> {
    let n = name.trim().to_string();
    if n.is_empty() {
        return Err(CliError::usage("Batch name is required"));
    }
    Ok(n)
}

pub fn validate_target_days(days: u32) -> Result<(), CliError> {
    if days < 1 || days > MAX_TARGET_DAYS {
        return Err(CliError::usage(format!(
            "Invalid target days: {} (must be 1-{})",
            days, MAX_TARGET_DAYS
        )));
    }
    Ok(())
}

pub fn validate_f2_target_days(days: u32) -> Result<(), CliError> {
    if days < 1 || days > MAX_F2_TARGET_DAYS {
        return Err(CliError::usage(format!(
            "Invalid F2 target days: {} (must be 1-{})",
            days, MAX_F2_TARGET_DAYS
        )));
    }
    Ok(())
}

pub fn next_batch_id(db: &mut BatchDb) -> String {
    let n = db.meta.next_batch_number;
    let id = format!("b{:04}", n);
    db.meta.next_batch_number = n + 1;
    id
}

/// Day 1 on the start date, day 2 the next calendar day, 0 before the start.
/// Calendar-day difference, never elapsed-hours division: a batch started at
/// 23:00 still reads day 2 one minute after midnight.
pub fn current_day_for(start_date: &str, today: &str) -> Result<u32, CliError> {
    let days = days_between(start_date, today)?;
    Ok((days + 1).max(0) as u32)
}

pub fn find_batch_index(db: &BatchDb, id: &str) -> Result<usize, CliError> {
    db.batches
        .iter()
        .position(|b| b.id == id)
        .ok_or_else(|| CliError::not_found(format!("Batch not found: {}", id)))
}

pub struct NewBatch {
    pub name: String,
    pub tea_type: String,
    pub notes: Option<String>,
    pub target_days: u32,
    pub tea_amount: Option<String>,
    pub tea_amount_unit: Option<String>,
    pub sugar_amount: Option<String>,
    pub sugar_amount_unit: Option<String>,
}

fn build_batch(
    id: String,
    form: NewBatch,
    start_date: &str,
    status: BatchStatus,
    today: &str,
    now: &str,
) -> Result<Batch, CliError> {
    let name = validate_batch_name(&form.name)?;
    validate_target_days(form.target_days)?;
    parse_date_string(start_date, "start date")?;

    Ok(Batch {
        id,
        name,
        tea_type: form.tea_type,
        notes: form.notes,
        start_date: start_date.to_string(),
        target_days: form.target_days,
        current_day: current_day_for(start_date, today)?,
        status,
        previous_status: None,
        is_active: true,
        created_at: now.to_string(),
        updated_at: now.to_string(),
        f2_start_date: None,
        f2_target_days: None,
        f2_current_day: None,
        f2_flavorings: Vec::new(),
        tea_amount: form.tea_amount,
        tea_amount_unit: form.tea_amount_unit,
        sugar_amount: form.sugar_amount,
        sugar_amount_unit: form.sugar_amount_unit,
    })
}

/// Starts brewing immediately: day 1 today.
pub fn create_batch(
    db: &mut BatchDb,
    form: NewBatch,
    today: &str,
    now: &str,
) -> Result<Batch, CliError> {
    let id = next_batch_id(db);
    let batch = build_batch(id, form, today, BatchStatus::Brewing, today, now)?;
    db.batches.push(batch.clone());
    Ok(batch)
}

/// Schedules a batch for a future start date.
pub fn plan_batch(
    db: &mut BatchDb,
    form: NewBatch,
    start_date: &str,
    today: &str,
    now: &str,
) -> Result<Batch, CliError> {
    parse_date_string(start_date, "start date")?;
    if start_date <= today {
        return Err(CliError::usage(
            "Planned start date must be after today (use `batch add` to start now)",
        ));
    }
    let id = next_batch_id(db);
    let batch = build_batch(id, form, start_date, BatchStatus::Planned, today, now)?;
    db.batches.push(batch.clone());
    Ok(batch)
}

#[derive(Default)]
pub struct BatchUpdate {
    pub name: Option<String>,
    pub tea_type: Option<String>,
    pub notes: Option<String>,
    pub target_days: Option<u32>,
    pub tea_amount: Option<String>,
    pub tea_amount_unit: Option<String>,
    pub sugar_amount: Option<String>,
    pub sugar_amount_unit: Option<String>,
}

pub fn update_batch(
    db: &mut BatchDb,
    id: &str,
    updates: BatchUpdate,
    now: &str,
) -> Result<Batch, CliError> {
    let idx = find_batch_index(db, id)?;

    if let Some(ref name) = updates.name {
        validate_batch_name(name)?;
    }
    if let Some(days) = updates.target_days {
        validate_target_days(days)?;
    }

    let batch = &mut db.batches[idx];
    if let Some(name) = updates.name {
        batch.name = name.trim().to_string();
    }
    if let Some(tea_type) = updates.tea_type {
        batch.tea_type = tea_type;
    }
    if let Some(notes) = updates.notes {
        batch.notes = if notes.is_empty() { None } else { Some(notes) };
    }
    if let Some(days) = updates.target_days {
        batch.target_days = days;
    }
    if let Some(v) = updates.tea_amount {
        batch.tea_amount = Some(v);
    }
    if let Some(v) = updates.tea_amount_unit {
        batch.tea_amount_unit = Some(v);
    }
    if let Some(v) = updates.sugar_amount {
        batch.sugar_amount = Some(v);
    }
    if let Some(v) = updates.sugar_amount_unit {
        batch.sugar_amount_unit = Some(v);
    }
    batch.updated_at = now.to_string();

    Ok(batch.clone())
}

/// The monotone lifecycle graph. Archiving goes through `archive_batch` so
/// the previous status is retained.
fn transition_allowed(from: BatchStatus, to: BatchStatus) -> bool {
    use BatchStatus::*;
    matches!(
        (from, to),
        (Planned, Brewing)
            | (Brewing, Ready)
            | (Ready, F2Brewing)
            | (Ready, Bottled)
            | (F2Brewing, F2Ready)
            | (F2Ready, Bottled)
    )
}

pub fn set_status(
    db: &mut BatchDb,
    id: &str,
    new_status: BatchStatus,
    now: &str,
) -> Result<Batch, CliError> {
    let idx = find_batch_index(db, id)?;
    let current = db.batches[idx].status;

    if new_status == current {
        return Ok(db.batches[idx].clone());
    }
    if new_status == BatchStatus::Archived {
        return archive_batch(db, id, now);
    }
    if !transition_allowed(current, new_status) {
        return Err(CliError::invalid_transition(format!(
            "Invalid transition: {} -> {}",
            current.as_str(),
            new_status.as_str()
        )));
    }

    let batch = &mut db.batches[idx];
    batch.status = new_status;
    batch.updated_at = now.to_string();
    Ok(batch.clone())
}

/// Moves a ready batch into second fermentation: day 1 today.
pub fn start_f2(
    db: &mut BatchDb,
    id: &str,
    f2_target_days: u32,
    flavorings: Vec<Flavoring>,
    today: &str,
    now: &str,
) -> Result<Batch, CliError> {
    validate_f2_target_days(f2_target_days)?;
    let idx = find_batch_index(db, id)?;

    if db.batches[idx].status != BatchStatus::Ready {
        return Err(CliError::invalid_transition(format!(
            "Invalid transition: {} -> f2_brewing (batch must be ready)",
            db.batches[idx].status.as_str()
        )));
    }

    let batch = &mut db.batches[idx];
    batch.status = BatchStatus::F2Brewing;
    batch.f2_start_date = Some(today.to_string());
    batch.f2_target_days = Some(f2_target_days);
    batch.f2_current_day = Some(1);
    batch.f2_flavorings = flavorings;
    batch.updated_at = now.to_string();
    Ok(batch.clone())
}

pub fn archive_batch(db: &mut BatchDb, id: &str, now: &str) -> Result<Batch, CliError> {
    let idx = find_batch_index(db, id)?;
    let batch = &mut db.batches[idx];

    if batch.status == BatchStatus::Archived {
        return Ok(batch.clone());
    }

    batch.previous_status = Some(batch.status);
    batch.status = BatchStatus::Archived;
    batch.is_active = false;
    batch.updated_at = now.to_string();
    Ok(batch.clone())
}

/// Restores the status held immediately before archiving.
pub fn unarchive_batch(db: &mut BatchDb, id: &str, now: &str) -> Result<Batch, CliError> {
    let idx = find_batch_index(db, id)?;
    let batch = &mut db.batches[idx];

    if batch.status != BatchStatus::Archived {
        return Err(CliError::invalid_transition(format!(
            "Batch is not archived: {}",
            id
        )));
    }

    batch.status = batch.previous_status.take().unwrap_or(BatchStatus::Brewing);
    batch.is_active = true;
    batch.updated_at = now.to_string();
    Ok(batch.clone())
}

/// Permanent removal; there is no undo.
pub fn delete_batch(db: &mut BatchDb, id: &str) -> Result<Batch, CliError> {
    let idx = find_batch_index(db, id)?;
    Ok(db.batches.remove(idx))
}

/// Recomputes every cached day counter from the wall clock. Only batches
/// whose counter actually moved get an `updated_at` bump, so a same-day
/// refresh is a no-op write.
pub fn refresh_day_counters(db: &mut BatchDb, today: &str, now: &str) -> Result<u32, CliError> {
    let mut changed = 0u32;
    for batch in db.batches.iter_mut() {
        let mut touched = false;

        let day = current_day_for(&batch.start_date, today)?;
        if day != batch.current_day {
            batch.current_day = day;
            touched = true;
        }

        if let Some(ref f2_start) = batch.f2_start_date {
            let f2_day = current_day_for(f2_start, today)?;
            if batch.f2_current_day != Some(f2_day) {
                batch.f2_current_day = Some(f2_day);
                touched = true;
            }
        }

        if touched {
            batch.updated_at = now.to_string();
            changed += 1;
        }
    }
    Ok(changed)
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchStats {
    pub total_batches: u32,
    pub active_batches: u32,
    pub completed_batches: u32,
    pub average_brewing_days: f64,
    pub longest_running_batch: Option<Batch>,
}

pub fn build_stats(db: &BatchDb) -> BatchStats {
    let total = db.batches.len() as u32;
    let active = db
        .batches
        .iter()
        .filter(|b| b.is_active && b.status == BatchStatus::Brewing)
        .count() as u32;
    let completed = db
        .batches
        .iter()
        .filter(|b| matches!(b.status, BatchStatus::Ready | BatchStatus::Bottled))
        .count() as u32;

    let brewing: Vec<&Batch> = db
        .batches
        .iter()
        .filter(|b| b.status == BatchStatus::Brewing)
        .collect();
    let average = if brewing.is_empty() {
        0.0
    } else {
        let sum: u32 = brewing.iter().map(|b| b.current_day).sum();
        let avg = sum as f64 / brewing.len() as f64;
        (avg * 10.0).round() / 10.0
    };

    // First-seen wins ties, so the result is stable across runs.
    let mut longest: Option<&Batch> = None;
    for b in db.batches.iter() {
        if b.is_active && b.status == BatchStatus::Brewing {
            if longest.map_or(true, |l| b.current_day > l.current_day) {
                longest = Some(b);
            }
        }
    }

    BatchStats {
        total_batches: total,
        active_batches: active,
        completed_batches: completed,
        average_brewing_days: average,
        longest_running_batch: longest.cloned(),
    }
}

/// Parses a CLI flavoring spec of the form `name:kind:amount[:notes]`.
pub fn parse_flavoring_arg(spec: &str, index: usize) -> Result<Flavoring, CliError> {
    let parts: Vec<&str> = spec.splitn(4, ':').collect();
    if parts.len() < 3 {
        return Err(CliError::usage(format!(
            "Invalid flavoring: {} (expected name:kind:amount[:notes])",
            spec
        )));
    }

    let name = parts[0].trim();
    if name.is_empty() {
        return Err(CliError::usage("Flavoring name is required"));
    }

    let kind = FlavoringKind::parse(parts[1].trim()).ok_or_else(|| {
        CliError::usage(format!(
            "Invalid flavoring kind: {} (fruit, syrup, herb, spice, juice, other)",
            parts[1]
        ))
    })?;

    Ok(Flavoring {
        id: format!("f{:02}", index + 1),
        name: name.to_string(),
        kind,
        amount: parts[2].trim().to_string(),
        notes: parts.get(3).map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
    })
}
