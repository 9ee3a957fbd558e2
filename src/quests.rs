//! Quest progression and the avatar. Requirement progress is a pure function
//! of the batch snapshot plus avatar state; completion is the only mutation,
//! explicitly user-triggered and one-shot per quest.

use crate::clock::date_of_ts;
use crate::date::add_days;
use crate::error::CliError;
use crate::model::{
    Avatar, Batch, CosmeticRarity, CosmeticUnlock, EvolutionStage, Mood, Quest, QuestDb,
    QuestKind, RequirementKind, RewardKind,
};
use std::collections::BTreeSet;

/// XP needed to leave `level`: floor(100 * 1.2^(level-1)).
pub fn xp_to_next_level(level: u32) -> u32 {
    (100.0 * 1.2f64.powi(level as i32 - 1)).floor() as u32
}

pub fn evolution_stage_for(level: u32) -> EvolutionStage {
    if level <= 3 {
        EvolutionStage::Baby
    } else if level <= 10 {
        EvolutionStage::Growing
    } else if level <= 20 {
        EvolutionStage::Mature
    } else {
        EvolutionStage::Elder
    }
}

pub fn mood_for_streak(streak_days: u32) -> Mood {
    if streak_days >= 7 {
        Mood::Happy
    } else if streak_days >= 1 {
        Mood::Neutral
    } else {
        Mood::Sad
    }
}

fn season_of(date: &str) -> &'static str {
    match date.get(5..7) {
        Some("03") | Some("04") | Some("05") => "spring",
        Some("06") | Some("07") | Some("08") => "summer",
        Some("09") | Some("10") | Some("11") => "autumn",
        _ => "winter",
    }
}

fn distinct_flavor_count(batches: &[Batch]) -> u32 {
    let names: BTreeSet<&str> = batches
        .iter()
        .flat_map(|b| b.f2_flavorings.iter())
        .map(|f| f.name.as_str())
        .collect();
    names.len() as u32
}

fn distinct_tea_types(batches: &[Batch]) -> u32 {
    let types: BTreeSet<&str> = batches.iter().map(|b| b.tea_type.as_str()).collect();
    types.len() as u32
}

fn distinct_seasons(batches: &[Batch]) -> u32 {
    let seasons: BTreeSet<&str> = batches.iter().map(|b| season_of(&b.start_date)).collect();
    seasons.len() as u32
}

/// Closed dispatch for `custom` requirements. `perfect_carbonation` depends
/// on taste feedback that is not tracked, so it never advances.
fn custom_progress(key: &str, batches: &[Batch]) -> u32 {
    match key {
        "welcome" => 1,
        "three_tea_types" => distinct_tea_types(batches),
        "four_seasons" => distinct_seasons(batches),
        "perfect_carbonation" => 0,
        _ => 0,
    }
}

fn requirement_progress(kind: &RequirementKind, batches: &[Batch], avatar: &Avatar) -> u32 {
    match kind {
        RequirementKind::BatchCount => batches.len() as u32,
        RequirementKind::BatchStatus { status } => {
            batches.iter().filter(|b| b.status == *status).count() as u32
        }
        RequirementKind::FlavorCount => distinct_flavor_count(batches),
        RequirementKind::StreakDays => avatar.streak_days,
        RequirementKind::XpThreshold => avatar.xp,
        RequirementKind::Custom { key } => custom_progress(key, batches),
    }
}

/// Refreshes every quest's requirement progress and overall percentage from
/// the batch snapshot. Never touches completion flags.
pub fn recompute_progress(db: &mut QuestDb, batches: &[Batch]) {
    let avatar = db.avatar.clone();
    for quest in db.quests.iter_mut() {
        let mut clamped_sum = 0u32;
        let mut target_sum = 0u32;
        for req in quest.requirements.iter_mut() {
            let raw = requirement_progress(&req.kind, batches, &avatar);
            req.current_progress = raw.min(req.target_progress);
            clamped_sum += req.current_progress;
            target_sum += req.target_progress;
        }
        quest.progress = if target_sum == 0 {
            0
        } else {
            ((clamped_sum as f64 / target_sum as f64) * 100.0).round() as u32
        };
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CompletionOutcome {
    pub quest_id: String,
    pub quest_title: String,
    pub already_completed: bool,
    pub xp_awarded: u32,
    pub levels_gained: u32,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub evolution_stage: EvolutionStage,
    pub new_cosmetics: Vec<String>,
    pub unlocked_next: Option<String>,
}

/// One-shot completion: awards XP (the level-up loop can cross several
/// thresholds in one award), grants cosmetic unlocks, stamps `completed_at`,
/// and unlocks the next tutorial step. A second call is a reported no-op.
pub fn complete_quest(db: &mut QuestDb, id: &str, now: &str) -> Result<CompletionOutcome, CliError> {
    let idx = db
        .quests
        .iter()
        .position(|q| q.id == id)
        .ok_or_else(|| CliError::not_found(format!("Quest not found: {}", id)))?;

    if db.quests[idx].is_completed {
        let q = &db.quests[idx];
        return Ok(CompletionOutcome {
            quest_id: q.id.clone(),
            quest_title: q.title.clone(),
            already_completed: true,
            xp_awarded: 0,
            levels_gained: 0,
            level: db.avatar.level,
            xp: db.avatar.xp,
            xp_to_next_level: db.avatar.xp_to_next_level,
            evolution_stage: db.avatar.evolution_stage,
            new_cosmetics: Vec::new(),
            unlocked_next: None,
        });
    }

    if !db.quests[idx].is_unlocked {
        return Err(CliError::invalid_transition(format!(
            "Quest is locked: {}",
            id
        )));
    }

    let quest = db.quests[idx].clone();

    let levels_before = db.avatar.level;
    db.avatar.xp += quest.xp_reward;
    while db.avatar.xp >= db.avatar.xp_to_next_level {
        db.avatar.xp -= db.avatar.xp_to_next_level;
        db.avatar.level += 1;
        db.avatar.xp_to_next_level = xp_to_next_level(db.avatar.level);
    }
    db.avatar.evolution_stage = evolution_stage_for(db.avatar.level);
    db.avatar.last_interaction = now.to_string();

    let mut new_cosmetics = Vec::new();
    for reward in quest.rewards.iter() {
        if reward.kind != RewardKind::Cosmetic {
            continue;
        }
        if db.avatar.cosmetic_unlocks.iter().any(|c| c.id == reward.id) {
            continue;
        }
        db.avatar.cosmetic_unlocks.push(CosmeticUnlock {
            id: reward.id.clone(),
            name: reward.value.clone(),
            unlocked_at: now.to_string(),
            quest_id: quest.id.clone(),
            rarity: CosmeticRarity::Common,
        });
        new_cosmetics.push(reward.value.clone());
    }

    {
        let q = &mut db.quests[idx];
        q.is_completed = true;
        q.completed_at = Some(now.to_string());
        for reward in q.rewards.iter_mut() {
            reward.unlocked = true;
        }
    }

    // Advance the tutorial chain; silence at the end of it.
    let mut unlocked_next = None;
    if quest.kind == QuestKind::Tutorial {
        if let Some(order) = quest.order {
            if let Some(next) = db
                .quests
                .iter_mut()
                .find(|q| q.kind == QuestKind::Tutorial && q.order == Some(order + 1))
            {
                next.is_unlocked = true;
                unlocked_next = Some(next.id.clone());
            }
        }
    }

    Ok(CompletionOutcome {
        quest_id: quest.id,
        quest_title: quest.title,
        already_completed: false,
        xp_awarded: quest.xp_reward,
        levels_gained: db.avatar.level - levels_before,
        level: db.avatar.level,
        xp: db.avatar.xp,
        xp_to_next_level: db.avatar.xp_to_next_level,
        evolution_stage: db.avatar.evolution_stage,
        new_cosmetics,
        unlocked_next,
    })
}

/// Records a day of activity and moves the streak: consecutive days extend
/// it, a gap resets it to 1, a second touch on the same day does nothing.
pub fn record_activity(avatar: &mut Avatar, today: &str, now: &str) {
    let last_day = date_of_ts(&avatar.last_interaction).to_string();
    if last_day == today {
        // A fresh avatar carries its creation time in last_interaction, so
        // the first real interaction can land on the same day; it still
        // opens the streak.
        if avatar.streak_days == 0 {
            avatar.streak_days = 1;
            avatar.last_interaction = now.to_string();
        }
    } else {
        let yesterday = add_days(today, -1).unwrap_or_default();
        if last_day == yesterday && avatar.streak_days > 0 {
            avatar.streak_days += 1;
        } else {
            avatar.streak_days = 1;
        }
        avatar.last_interaction = now.to_string();
    }
    avatar.mood = mood_for_streak(avatar.streak_days);
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct QuestStats {
    pub total_quests: u32,
    pub completed_quests: u32,
    pub tutorial_progress: u32,
    pub challenges_completed: u32,
    pub total_xp_earned: u32,
    pub current_streak: u32,
    pub favorite_category: Option<String>,
}

pub fn build_quest_stats(db: &QuestDb) -> QuestStats {
    let total = db.quests.len() as u32;
    let completed = db.quests.iter().filter(|q| q.is_completed).count() as u32;

    let tutorials: Vec<&Quest> = db
        .quests
        .iter()
        .filter(|q| q.kind == QuestKind::Tutorial)
        .collect();
    let tutorial_done = tutorials.iter().filter(|q| q.is_completed).count();
    let tutorial_progress = if tutorials.is_empty() {
        0
    } else {
        ((tutorial_done as f64 / tutorials.len() as f64) * 100.0).round() as u32
    };

    let challenges_completed = db
        .quests
        .iter()
        .filter(|q| q.kind == QuestKind::Challenge && q.is_completed)
        .count() as u32;

    let total_xp: u32 = db
        .quests
        .iter()
        .filter(|q| q.is_completed)
        .map(|q| q.xp_reward)
        .sum();

    let mut by_category: Vec<(String, u32)> = Vec::new();
    for q in db.quests.iter().filter(|q| q.is_completed) {
        match by_category.iter_mut().find(|(c, _)| *c == q.category) {
            Some((_, n)) => *n += 1,
            None => by_category.push((q.category.clone(), 1)),
        }
    }
    by_category.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let favorite = by_category.first().map(|(c, _)| c.clone());

    QuestStats {
        total_quests: total,
        completed_quests: completed,
        tutorial_progress,
        challenges_completed,
        total_xp_earned: total_xp,
        current_streak: db.avatar.streak_days,
        favorite_category: favorite,
    }
}
