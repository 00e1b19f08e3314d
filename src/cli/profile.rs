use crate::coach::UserProfile;
use crate::coach::ranking::{next_rank, progress_to_next_rank};

pub fn run(profile: &UserProfile) {
    let points = profile.points();
    let rank = profile.rank();

    println!("{} {} ({})", rank.icon, profile.name, rank.name);
    println!(
        "{} workouts, {} active minutes, {} day streak",
        profile.total_workouts, profile.total_minutes, profile.streak
    );
    match next_rank(points) {
        Some(next) => println!(
            "{} points, {}% of the way to {} {} ({} points)",
            points,
            progress_to_next_rank(points),
            next.icon,
            next.name,
            next.min_points
        ),
        None => println!("{} points, top rank reached", points),
    }
}
