use std::time::Duration;

/// Most XP a learner can earn for time spent on a unit.
pub const MAX_TIME_BONUS: u32 = 20;
const SECONDS_PER_BONUS_POINT: u64 = 10;

/// XP for finishing a unit: its points scaled by the evaluation score, plus a
/// point for every ten seconds the unit was open, up to [`MAX_TIME_BONUS`].
pub fn award(xp_points: u32, score: u8, time_open: Duration) -> u32 {
    let score = score.min(100) as u64;
    let scaled = (xp_points as u64 * score / 100) as u32;
    scaled + time_bonus(time_open)
}

pub fn time_bonus(time_open: Duration) -> u32 {
    let points = time_open.as_secs() / SECONDS_PER_BONUS_POINT;
    points.min(MAX_TIME_BONUS as u64) as u32
}
