//! Points and rank tiers earned from logged activity.
use super::models::UserProfile;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankTier {
    pub name: &'static str,
    pub min_points: u32,
    pub icon: &'static str,
}

/// Tiers in ascending order of `min_points`.
pub const RANK_TIERS: [RankTier; 7] = [
    RankTier { name: "Rookie", min_points: 0, icon: "🌱" },
    RankTier { name: "Bronze", min_points: 50, icon: "🥉" },
    RankTier { name: "Silver", min_points: 150, icon: "🥈" },
    RankTier { name: "Gold", min_points: 400, icon: "🥇" },
    RankTier { name: "Platinum", min_points: 800, icon: "💎" },
    RankTier { name: "Diamond", min_points: 1500, icon: "👑" },
    RankTier { name: "Legend", min_points: 3000, icon: "🔥" },
];

/// 10 per workout, 1 per 5 active minutes, and 5 per streak day.
pub fn calculate_points(total_workouts: u32, total_minutes: u32, streak: u32) -> u32 {
    total_workouts * 10 + total_minutes / 5 + streak * 5
}

/// Highest tier reached with `points`.
pub fn rank(points: u32) -> RankTier {
    RANK_TIERS
        .iter()
        .rev()
        .find(|tier| points >= tier.min_points)
        .copied()
        .unwrap_or(RANK_TIERS[0])
}

/// The next tier to reach, or `None` at the top tier.
pub fn next_rank(points: u32) -> Option<RankTier> {
    RANK_TIERS.iter().find(|tier| points < tier.min_points).copied()
}

/// Percent of the way from the current tier to the next, rounded and
/// capped at 100.
pub fn progress_to_next_rank(points: u32) -> u32 {
    let current = rank(points);
    let Some(next) = next_rank(points) else {
        return 100;
    };
    let range = f64::from(next.min_points - current.min_points);
    let progress = f64::from(points - current.min_points);
    ((progress / range) * 100.0).round().min(100.0) as u32
}

impl UserProfile {
    pub fn points(&self) -> u32 {
        calculate_points(self.total_workouts, self.total_minutes, self.streak)
    }

    pub fn rank(&self) -> RankTier {
        rank(self.points())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_points() {
        assert_eq!(calculate_points(0, 0, 0), 0);
        // 40 + 24 + 20
        assert_eq!(calculate_points(4, 124, 4), 84);
    }

    #[test]
    fn test_rank_boundaries() {
        assert_eq!(rank(0).name, "Rookie");
        assert_eq!(rank(49).name, "Rookie");
        assert_eq!(rank(50).name, "Bronze");
        assert_eq!(rank(2999).name, "Diamond");
        assert_eq!(rank(3000).name, "Legend");
        assert_eq!(rank(u32::MAX).name, "Legend");
    }

    #[test]
    fn test_next_rank() {
        assert_eq!(next_rank(0).map(|t| t.name), Some("Bronze"));
        assert_eq!(next_rank(150).map(|t| t.name), Some("Gold"));
        assert_eq!(next_rank(3000), None);
    }

    #[test]
    fn test_progress_to_next_rank() {
        assert_eq!(progress_to_next_rank(0), 0);
        assert_eq!(progress_to_next_rank(25), 50);
        // 100 of the 250 between Silver and Gold
        assert_eq!(progress_to_next_rank(250), 40);
        assert_eq!(progress_to_next_rank(5000), 100);
    }

    #[test]
    fn test_profile_rank() {
        let profile = UserProfile {
            name: "Sam".to_string(),
            streak: 7,
            total_workouts: 12,
            total_minutes: 400,
        };
        // 120 + 80 + 35
        assert_eq!(profile.points(), 235);
        assert_eq!(profile.rank().name, "Silver");
    }
}
