use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{FailurePolicy, JitterRange, RetryPolicy};
use crate::collaborator::ActionName;

/// Every recurring or one-shot game action the scheduler knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    Adventure,
    HeroUpgrade,
    MissionCollect,
    DailyQuestCollect,
    AttackCheck,
    ResourceFieldUpgrade,
    TroopTraining,
    RaidSend,
    PageRefresh,
    GoldClubCheck,
    AttackMitigation,
}

impl TaskKind {
    pub const ALL: [TaskKind; 11] = [
        TaskKind::Adventure,
        TaskKind::HeroUpgrade,
        TaskKind::MissionCollect,
        TaskKind::DailyQuestCollect,
        TaskKind::AttackCheck,
        TaskKind::ResourceFieldUpgrade,
        TaskKind::TroopTraining,
        TaskKind::RaidSend,
        TaskKind::PageRefresh,
        TaskKind::GoldClubCheck,
        TaskKind::AttackMitigation,
    ];

    /// Suffix used in the rendered job id.
    pub fn slug(&self) -> &'static str {
        match self {
            TaskKind::Adventure => "adventures",
            TaskKind::HeroUpgrade => "hero_upgrade",
            TaskKind::MissionCollect => "collect_mission_resources",
            TaskKind::DailyQuestCollect => "collect_daily_rewards",
            TaskKind::AttackCheck => "attack_check",
            TaskKind::ResourceFieldUpgrade => "resource_fields",
            TaskKind::TroopTraining => "train_troops",
            TaskKind::RaidSend => "raids",
            TaskKind::PageRefresh => "refresh",
            TaskKind::GoldClubCheck => "gold_club_check",
            TaskKind::AttackMitigation => "spend_all",
        }
    }

    /// Collaborator operation a firing of this kind performs.
    pub fn action(&self) -> ActionName {
        match self {
            TaskKind::Adventure => ActionName::CheckAdventure,
            TaskKind::HeroUpgrade => ActionName::UpgradeHero,
            TaskKind::MissionCollect => ActionName::CollectMissionRewards,
            TaskKind::DailyQuestCollect => ActionName::CollectDailyRewards,
            TaskKind::AttackCheck => ActionName::CheckIncomingAttacks,
            TaskKind::ResourceFieldUpgrade => ActionName::UpgradeResourceField,
            TaskKind::TroopTraining => ActionName::TrainTroops,
            TaskKind::RaidSend => ActionName::SendRaids,
            TaskKind::PageRefresh => ActionName::RefreshPage,
            TaskKind::GoldClubCheck => ActionName::CheckGoldClub,
            TaskKind::AttackMitigation => ActionName::SpendResourcesOnTroops,
        }
    }

    /// Reschedule window, tuned to how fast the underlying game state refills.
    /// One-shot kinds have none.
    pub fn jitter_range(&self) -> Option<JitterRange> {
        let range = match self {
            TaskKind::Adventure => JitterRange::between(307.0, 902.0),
            TaskKind::HeroUpgrade => JitterRange::between(12_542.0, 24_333.0),
            TaskKind::MissionCollect => JitterRange::between(343.0, 907.0),
            TaskKind::DailyQuestCollect => JitterRange::between(24_112.0, 43_022.0),
            TaskKind::AttackCheck => JitterRange::between(678.0, 876.0),
            TaskKind::ResourceFieldUpgrade => JitterRange::between(343.0, 907.0),
            TaskKind::TroopTraining => JitterRange::between(1_720.0, 3_835.0),
            TaskKind::RaidSend => JitterRange::between(548.0, 878.0),
            TaskKind::PageRefresh => JitterRange::between(698.0, 722.0),
            TaskKind::GoldClubCheck => JitterRange::between(604.0, 932.0),
            TaskKind::AttackMitigation => return None,
        };
        Some(range)
    }

    /// Longer window used after the action reported it could not afford anything.
    pub fn starved_range(&self) -> Option<JitterRange> {
        match self {
            TaskKind::TroopTraining => Some(JitterRange::between(10_720.0, 13_835.0)),
            _ => None,
        }
    }

    /// Offset of the first firing after startup so one account's tasks
    /// do not all hit the site at once.
    pub fn initial_delay(&self) -> Duration {
        let secs = match self {
            TaskKind::Adventure => 7,
            TaskKind::HeroUpgrade => 14,
            TaskKind::MissionCollect => 21,
            TaskKind::DailyQuestCollect => 28,
            TaskKind::AttackCheck => 35,
            TaskKind::ResourceFieldUpgrade => 42,
            TaskKind::TroopTraining => 70,
            TaskKind::RaidSend => 90,
            TaskKind::PageRefresh => 600,
            TaskKind::GoldClubCheck => 60,
            TaskKind::AttackMitigation => 0,
        };
        Duration::from_secs(secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            // Refresh is itself the recovery path; mitigation has a deadline.
            TaskKind::PageRefresh => RetryPolicy::none(),
            TaskKind::AttackMitigation => RetryPolicy::new(3, Duration::from_secs(5)),
            _ => RetryPolicy::new(2, Duration::from_secs(10)),
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        match self {
            TaskKind::RaidSend => FailurePolicy::Pause,
            _ => FailurePolicy::Dormant,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}
