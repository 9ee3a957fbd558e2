//! Persisted state for the three engines plus settings. Each slice lives in
//! its own JSON document; all closed vocabularies are enums so a new kind is
//! a compile-checked change.

use serde::{Deserialize, Serialize};

pub const STATE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Batch slice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Planned,
    Brewing,
    Ready,
    F2Brewing,
    F2Ready,
    Bottled,
    Archived,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Planned => "planned",
            BatchStatus::Brewing => "brewing",
            BatchStatus::Ready => "ready",
            BatchStatus::F2Brewing => "f2_brewing",
            BatchStatus::F2Ready => "f2_ready",
            BatchStatus::Bottled => "bottled",
            BatchStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<BatchStatus> {
        match s {
            "planned" => Some(BatchStatus::Planned),
            "brewing" => Some(BatchStatus::Brewing),
            "ready" => Some(BatchStatus::Ready),
            "f2_brewing" => Some(BatchStatus::F2Brewing),
            "f2_ready" => Some(BatchStatus::F2Ready),
            "bottled" => Some(BatchStatus::Bottled),
            "archived" => Some(BatchStatus::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlavoringKind {
    Fruit,
    Syrup,
    Herb,
    Spice,
    Juice,
    Other,
}

impl FlavoringKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlavoringKind::Fruit => "fruit",
            FlavoringKind::Syrup => "syrup",
            FlavoringKind::Herb => "herb",
            FlavoringKind::Spice => "spice",
            FlavoringKind::Juice => "juice",
            FlavoringKind::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<FlavoringKind> {
        match s {
            "fruit" => Some(FlavoringKind::Fruit),
            "syrup" => Some(FlavoringKind::Syrup),
            "herb" => Some(FlavoringKind::Herb),
            "spice" => Some(FlavoringKind::Spice),
            "juice" => Some(FlavoringKind::Juice),
            "other" => Some(FlavoringKind::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flavoring {
    pub id: String,
    pub name: String,
    pub kind: FlavoringKind,
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: String,
    pub name: String,
    pub tea_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// First-fermentation start, as a calendar date.
    pub start_date: String,
    pub target_days: u32,
    /// Cached derivation; refreshed from `start_date` on load and at midnight.
    pub current_day: u32,
    pub status: BatchStatus,
    /// Status held immediately before archiving, for restore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<BatchStatus>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f2_start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f2_target_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f2_current_day: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub f2_flavorings: Vec<Flavoring>,
    // Descriptive only; no computation reads these.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tea_amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tea_amount_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar_amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar_amount_unit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDb {
    pub version: u32,
    pub meta: BatchMeta,
    pub batches: Vec<Batch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchMeta {
    pub next_batch_number: u32,
}

pub fn default_batch_db() -> BatchDb {
    BatchDb {
        version: STATE_VERSION,
        meta: BatchMeta {
            next_batch_number: 1,
        },
        batches: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Health slice
// ---------------------------------------------------------------------------

pub const INITIAL_HEALTH: i32 = 85;
pub const MAX_HEALTH: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthEventKind {
    BatchSuccess,
    BatchOverdue,
    DailyCare,
    QuestComplete,
    TimeDecay,
}

impl HealthEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthEventKind::BatchSuccess => "batch_success",
            HealthEventKind::BatchOverdue => "batch_overdue",
            HealthEventKind::DailyCare => "daily_care",
            HealthEventKind::QuestComplete => "quest_complete",
            HealthEventKind::TimeDecay => "time_decay",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthEvent {
    /// Deterministic dedup key, e.g. `care:b0001:20260131`.
    pub id: String,
    pub kind: HealthEventKind,
    pub value: i32,
    pub ts: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDb {
    pub version: u32,
    pub current_health: i32,
    pub max_health: i32,
    pub health_events: Vec<HealthEvent>,
    pub last_updated: String,
}

pub fn default_health_db(now: &str) -> HealthDb {
    HealthDb {
        version: STATE_VERSION,
        current_health: INITIAL_HEALTH,
        max_health: MAX_HEALTH,
        health_events: Vec::new(),
        last_updated: now.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Quest + avatar slice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestKind {
    Tutorial,
    Challenge,
}

impl QuestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestKind::Tutorial => "tutorial",
            QuestKind::Challenge => "challenge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RequirementKind {
    BatchCount,
    BatchStatus { status: BatchStatus },
    FlavorCount,
    StreakDays,
    XpThreshold,
    Custom { key: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestRequirement {
    pub id: String,
    #[serde(flatten)]
    pub kind: RequirementKind,
    pub description: String,
    pub current_progress: u32,
    pub target_progress: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Xp,
    Cosmetic,
    Title,
    Achievement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestReward {
    pub id: String,
    pub kind: RewardKind,
    pub value: String,
    pub description: String,
    pub unlocked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub kind: QuestKind,
    pub category: String,
    pub difficulty: Difficulty,
    pub xp_reward: u32,
    pub requirements: Vec<QuestRequirement>,
    pub rewards: Vec<QuestReward>,
    pub is_unlocked: bool,
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// Overall completion percentage, 0-100, recomputed from requirements.
    pub progress: u32,
    /// Tutorial chain position; challenges have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionStage {
    Baby,
    Growing,
    Mature,
    Elder,
}

impl EvolutionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvolutionStage::Baby => "baby",
            EvolutionStage::Growing => "growing",
            EvolutionStage::Mature => "mature",
            EvolutionStage::Elder => "elder",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Happy,
    Neutral,
    Sad,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Neutral => "neutral",
            Mood::Sad => "sad",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CosmeticRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl CosmeticRarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            CosmeticRarity::Common => "common",
            CosmeticRarity::Rare => "rare",
            CosmeticRarity::Epic => "epic",
            CosmeticRarity::Legendary => "legendary",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CosmeticUnlock {
    /// Keyed by the granting reward id; appended at most once.
    pub id: String,
    pub name: String,
    pub unlocked_at: String,
    pub quest_id: String,
    pub rarity: CosmeticRarity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Avatar {
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub evolution_stage: EvolutionStage,
    pub mood: Mood,
    pub streak_days: u32,
    pub last_interaction: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cosmetic_unlocks: Vec<CosmeticUnlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestDb {
    pub version: u32,
    pub quests: Vec<Quest>,
    pub avatar: Avatar,
}

// ---------------------------------------------------------------------------
// Settings slice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrewingSettings {
    pub default_target_days: u32,
    pub default_tea_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub batch_reminders: bool,
    pub health_alerts: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsDb {
    pub version: u32,
    pub brewing: BrewingSettings,
    pub notifications: NotificationSettings,
}

pub fn default_settings_db() -> SettingsDb {
    SettingsDb {
        version: STATE_VERSION,
        brewing: BrewingSettings {
            default_target_days: 7,
            default_tea_type: "Black Tea".to_string(),
        },
        notifications: NotificationSettings {
            batch_reminders: true,
            health_alerts: true,
        },
    }
}
