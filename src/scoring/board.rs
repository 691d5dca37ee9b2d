//! Scoreboard arithmetic. A valid solve earns the module's rank-0 base points
//! plus the bonus configured for its solve position (1 = first solver). The
//! first three positions also count as gold, silver and bronze medals.

use std::collections::HashMap;

use uuid::Uuid;

use super::repo_types::{ModulePoint, ScoreboardEntry, Submission};

/// A user eligible to appear on the scoreboard.
#[derive(Debug, Clone)]
pub struct Competitor {
    pub user_id: Uuid,
    pub display_name: String,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    score: i64,
    gold: i64,
    silver: i64,
    bronze: i64,
}

/// Solve positions are taken over every valid submission, so a position
/// stays with its solver even if that solver is absent from `competitors`.
/// Equal scores share a rank and the following rank is skipped.
pub fn build_scoreboard(
    competitors: Vec<Competitor>,
    submissions: &[Submission],
    points: &[ModulePoint],
) -> Vec<ScoreboardEntry> {
    let table: HashMap<(Uuid, i32), i64> = points
        .iter()
        .map(|p| ((p.module_id, p.rank), i64::from(p.points)))
        .collect();
    let worth = |module_id: Uuid, rank: i32| table.get(&(module_id, rank)).copied().unwrap_or(0);

    let mut solves: Vec<&Submission> = submissions.iter().filter(|s| s.is_valid).collect();
    solves.sort_by(|a, b| (a.time, a.id).cmp(&(b.time, b.id)));

    let mut solvers: HashMap<Uuid, i32> = HashMap::new();
    let mut tallies: HashMap<Uuid, Tally> = HashMap::new();
    for solve in solves {
        let count = solvers.entry(solve.module_id).or_insert(0);
        *count += 1;
        let position = *count;

        let tally = tallies.entry(solve.user_id).or_default();
        tally.score += worth(solve.module_id, 0) + worth(solve.module_id, position);
        match position {
            1 => tally.gold += 1,
            2 => tally.silver += 1,
            3 => tally.bronze += 1,
            _ => {}
        }
    }

    let mut entries: Vec<ScoreboardEntry> = competitors
        .into_iter()
        .map(|c| {
            let tally = tallies.get(&c.user_id).copied().unwrap_or_default();
            ScoreboardEntry {
                rank: 0,
                user_id: c.user_id,
                display_name: c.display_name,
                score: tally.score,
                gold_medals: tally.gold,
                silver_medals: tally.silver,
                bronze_medals: tally.bronze,
            }
        })
        .collect();
    entries.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });

    let mut previous = None;
    let mut rank = 0;
    for (index, entry) in entries.iter_mut().enumerate() {
        if previous != Some(entry.score) {
            rank = index as i64 + 1;
            previous = Some(entry.score);
        }
        entry.rank = rank;
    }
    entries
}
