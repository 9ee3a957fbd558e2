//! The built-in quest set: a four-step tutorial chain plus open challenges.
//! Tutorial quests unlock one at a time; challenges are available from the
//! start.

use crate::model::{
    Avatar, BatchStatus, Difficulty, EvolutionStage, Mood, Quest, QuestDb, QuestKind,
    QuestRequirement, QuestReward, RequirementKind, RewardKind, STATE_VERSION,
};

fn requirement(
    id: &str,
    kind: RequirementKind,
    description: &str,
    target: u32,
) -> QuestRequirement {
    QuestRequirement {
        id: id.to_string(),
        kind,
        description: description.to_string(),
        current_progress: 0,
        target_progress: target,
    }
}

fn xp_reward(id: &str, amount: u32) -> QuestReward {
    QuestReward {
        id: id.to_string(),
        kind: RewardKind::Xp,
        value: amount.to_string(),
        description: format!("{} XP", amount),
        unlocked: false,
    }
}

fn cosmetic_reward(id: &str, value: &str, description: &str) -> QuestReward {
    QuestReward {
        id: id.to_string(),
        kind: RewardKind::Cosmetic,
        value: value.to_string(),
        description: description.to_string(),
        unlocked: false,
    }
}

fn title_reward(id: &str, value: &str) -> QuestReward {
    QuestReward {
        id: id.to_string(),
        kind: RewardKind::Title,
        value: value.to_string(),
        description: format!("Unlock the \"{}\" title", value),
        unlocked: false,
    }
}

#[allow(clippy::too_many_arguments)]
fn quest(
    id: &str,
    title: &str,
    description: &str,
    kind: QuestKind,
    category: &str,
    difficulty: Difficulty,
    xp: u32,
    order: Option<u32>,
    estimated_time: &str,
    tags: &[&str],
    requirements: Vec<QuestRequirement>,
    rewards: Vec<QuestReward>,
) -> Quest {
    Quest {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        kind,
        category: category.to_string(),
        difficulty,
        xp_reward: xp,
        requirements,
        rewards,
        // First tutorial step and every challenge start unlocked.
        is_unlocked: kind == QuestKind::Challenge || order == Some(1),
        is_completed: false,
        completed_at: None,
        progress: 0,
        order,
        estimated_time: Some(estimated_time.to_string()),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn default_quests() -> Vec<Quest> {
    vec![
        quest(
            "meet-scoby",
            "Meet Your SCOBY",
            "Welcome to your kombucha brewing journey! Your SCOBY is excited to meet you.",
            QuestKind::Tutorial,
            "brewing",
            Difficulty::Easy,
            50,
            Some(1),
            "2 minutes",
            &["tutorial", "introduction"],
            vec![requirement(
                "welcome",
                RequirementKind::Custom {
                    key: "welcome".to_string(),
                },
                "Complete the welcome tutorial",
                1,
            )],
            vec![xp_reward("welcome-xp", 50)],
        ),
        quest(
            "first-batch",
            "Brew Your First Batch",
            "Start your first kombucha batch and begin your brewing journey.",
            QuestKind::Tutorial,
            "brewing",
            Difficulty::Easy,
            100,
            Some(2),
            "10 minutes",
            &["tutorial", "brewing", "first-time"],
            vec![requirement(
                "create-batch",
                RequirementKind::BatchCount,
                "Create your first batch",
                1,
            )],
            vec![xp_reward("first-batch-xp", 100)],
        ),
        quest(
            "taste-test",
            "Taste Test",
            "Taste your first batch and learn about flavor profiles.",
            QuestKind::Tutorial,
            "brewing",
            Difficulty::Easy,
            75,
            Some(3),
            "5 minutes",
            &["tutorial", "tasting", "learning"],
            vec![requirement(
                "taste-batch",
                RequirementKind::BatchStatus {
                    status: BatchStatus::Ready,
                },
                "Complete your first batch",
                1,
            )],
            vec![xp_reward("taste-xp", 75)],
        ),
        quest(
            "f2-experiment",
            "F2 Experimentation",
            "Try your first second fermentation with flavorings.",
            QuestKind::Tutorial,
            "fermentation",
            Difficulty::Medium,
            125,
            Some(4),
            "15 minutes",
            &["tutorial", "fermentation", "flavoring"],
            vec![requirement(
                "f2-batch",
                RequirementKind::BatchStatus {
                    status: BatchStatus::F2Ready,
                },
                "Complete your first F2 batch",
                1,
            )],
            vec![xp_reward("f2-xp", 125)],
        ),
        quest(
            "flavor-alchemist",
            "Flavor Alchemist",
            "Experiment with 5 different flavor combinations in your F2 batches.",
            QuestKind::Challenge,
            "flavoring",
            Difficulty::Medium,
            200,
            None,
            "2-4 weeks",
            &["challenge", "flavoring", "experimentation"],
            vec![requirement(
                "five-flavors",
                RequirementKind::FlavorCount,
                "Try 5 different flavor combinations",
                5,
            )],
            vec![
                xp_reward("alchemist-xp", 200),
                title_reward("alchemist-title", "Flavor Alchemist"),
            ],
        ),
        quest(
            "fizz-master",
            "Fizz Master",
            "Achieve perfect carbonation in 3 consecutive batches.",
            QuestKind::Challenge,
            "fermentation",
            Difficulty::Hard,
            300,
            None,
            "3-6 weeks",
            &["challenge", "fermentation", "carbonation"],
            vec![requirement(
                "perfect-carbonation",
                RequirementKind::Custom {
                    key: "perfect_carbonation".to_string(),
                },
                "Achieve perfect carbonation 3 times in a row",
                3,
            )],
            vec![
                xp_reward("fizz-xp", 300),
                cosmetic_reward("fizz-cosmetic", "bubble_aura", "Unlock bubble aura effect"),
            ],
        ),
        quest(
            "brew-streak",
            "Brew Streak",
            "Maintain a brewing streak by tending your brews day after day.",
            QuestKind::Challenge,
            "brewing",
            Difficulty::Hard,
            500,
            None,
            "6 months",
            &["challenge", "consistency", "long-term"],
            vec![requirement(
                "long-streak",
                RequirementKind::StreakDays,
                "Stay active for 180 days",
                180,
            )],
            vec![
                xp_reward("streak-xp", 500),
                cosmetic_reward("streak-cosmetic", "golden_skin", "Unlock golden SCOBY skin"),
            ],
        ),
        quest(
            "tea-explorer",
            "Tea Explorer",
            "Try brewing with 3 different types of tea.",
            QuestKind::Challenge,
            "experimentation",
            Difficulty::Easy,
            150,
            None,
            "2-3 weeks",
            &["challenge", "experimentation", "tea"],
            vec![requirement(
                "three-teas",
                RequirementKind::Custom {
                    key: "three_tea_types".to_string(),
                },
                "Use 3 different tea types",
                3,
            )],
            vec![xp_reward("explorer-xp", 150)],
        ),
        quest(
            "health-monitor",
            "Health Monitor",
            "Keep your SCOBY healthy for 30 consecutive days.",
            QuestKind::Challenge,
            "health",
            Difficulty::Medium,
            250,
            None,
            "1 month",
            &["challenge", "health", "consistency"],
            vec![requirement(
                "healthy-streak",
                RequirementKind::StreakDays,
                "Maintain high health for 30 days",
                30,
            )],
            vec![
                xp_reward("health-xp", 250),
                cosmetic_reward("health-cosmetic", "glowing_aura", "Unlock glowing aura effect"),
            ],
        ),
        quest(
            "seasonal-brewer",
            "Seasonal Brewer",
            "Brew a batch for each season of the year.",
            QuestKind::Challenge,
            "seasonal",
            Difficulty::Hard,
            400,
            None,
            "1 year",
            &["challenge", "seasonal", "long-term"],
            vec![requirement(
                "four-seasons",
                RequirementKind::Custom {
                    key: "four_seasons".to_string(),
                },
                "Brew in all 4 seasons",
                4,
            )],
            vec![
                xp_reward("seasonal-xp", 400),
                cosmetic_reward(
                    "seasonal-cosmetic",
                    "seasonal_skins",
                    "Unlock seasonal SCOBY skins",
                ),
            ],
        ),
    ]
}

pub fn initial_avatar(now: &str) -> Avatar {
    Avatar {
        level: 1,
        xp: 0,
        xp_to_next_level: 100,
        evolution_stage: EvolutionStage::Baby,
        mood: Mood::Neutral,
        streak_days: 0,
        last_interaction: now.to_string(),
        cosmetic_unlocks: Vec::new(),
    }
}

pub fn default_quest_db(now: &str) -> QuestDb {
    QuestDb {
        version: STATE_VERSION,
        quests: default_quests(),
        avatar: initial_avatar(now),
    }
}
