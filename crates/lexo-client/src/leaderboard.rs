//! Ranking projection for the multi-party variant.
//!
//! The client never decides eliminations. It projects the authoritative
//! scoreboard into ranked standings and applies the elimination ticks the
//! server broadcasts.
//!
//! Ranking rules:
//! - Active participants first, by descending score, ties sharing a rank
//!   (`1, 1, 3`)
//! - Eliminated participants after them, ranked the same way among themselves
//! - Viewers last and unranked, so late joiners never shift anyone's rank

use std::collections::BTreeSet;

use lexo_proto::{ParticipantId, ScoreEntry};

use crate::state::SessionState;

/// One row of the projected leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    /// Who.
    pub participant_id: ParticipantId,
    /// Roster name, when known.
    pub display_name: Option<String>,
    /// Authoritative score.
    pub score: u32,
    /// 1-based rank. `None` for viewers.
    pub rank: Option<u32>,
    /// Removed by an elimination tick.
    pub is_eliminated: bool,
    /// Watching, not playing.
    pub is_viewer: bool,
}

/// Project `state` into ranked standings.
pub fn project(state: &SessionState) -> Vec<Standing> {
    let viewers: BTreeSet<&ParticipantId> =
        state.roster.iter().filter(|p| p.is_viewer).map(|p| &p.id).collect();
    let is_eliminated = |entry: &ScoreEntry| {
        entry.is_eliminated || state.eliminated.contains(&entry.participant_id)
    };

    let (mut active, mut out): (Vec<&ScoreEntry>, Vec<&ScoreEntry>) = state
        .scoreboard
        .iter()
        .filter(|e| !viewers.contains(&e.participant_id))
        .partition(|e| !is_eliminated(*e));
    sort_by_score(&mut active);
    sort_by_score(&mut out);

    let standing = |entry: &ScoreEntry, rank: Option<u32>, is_eliminated: bool, is_viewer| {
        Standing {
            participant_id: entry.participant_id.clone(),
            display_name: state.display_name(&entry.participant_id).map(str::to_string),
            score: entry.score,
            rank,
            is_eliminated,
            is_viewer,
        }
    };

    let mut standings = Vec::with_capacity(state.scoreboard.len() + viewers.len());
    let mut offset = 0;
    for (group, eliminated) in [(active, false), (out, true)] {
        for (entry, rank) in group.iter().zip(competition_ranks(&group)) {
            standings.push(standing(*entry, Some(rank + offset), eliminated, false));
        }
        offset += group.len() as u32;
    }

    for viewer in state.roster.iter().filter(|p| p.is_viewer) {
        let score = state.score_of(&viewer.id).unwrap_or(0);
        let entry = ScoreEntry { participant_id: viewer.id.clone(), score, is_eliminated: false };
        standings.push(standing(&entry, None, false, true));
    }

    standings
}

/// The `count` lowest-ranked active participants, lowest first.
///
/// Used when an elimination tick carries a count instead of ids. Ties at the
/// cut are broken by participant id so that every client picks the same set.
pub fn lowest_ranked(state: &SessionState, count: usize) -> Vec<ParticipantId> {
    project(state)
        .into_iter()
        .filter(|s| s.rank.is_some() && !s.is_eliminated)
        .rev()
        .take(count)
        .map(|s| s.participant_id)
        .collect()
}

fn sort_by_score(entries: &mut [&ScoreEntry]) {
    entries.sort_by(|a, b| {
        b.score.cmp(&a.score).then_with(|| a.participant_id.cmp(&b.participant_id))
    });
}

/// Competition ranks for entries already sorted by descending score.
fn competition_ranks(sorted: &[&ScoreEntry]) -> Vec<u32> {
    let mut ranks = Vec::with_capacity(sorted.len());
    for (index, entry) in sorted.iter().enumerate() {
        let rank = match index.checked_sub(1).map(|prev| sorted[prev]) {
            Some(prev) if prev.score == entry.score => ranks[index - 1],
            _ => index as u32 + 1,
        };
        ranks.push(rank);
    }
    ranks
}

#[cfg(test)]
mod tests {
    use lexo_proto::ParticipantInfo;

    use super::*;

    fn entry(id: &str, score: u32) -> ScoreEntry {
        ScoreEntry { participant_id: ParticipantId::from(id), score, is_eliminated: false }
    }

    fn ranks(standings: &[Standing]) -> Vec<(&str, Option<u32>)> {
        standings.iter().map(|s| (s.participant_id.as_str(), s.rank)).collect()
    }

    #[test]
    fn ties_share_rank() {
        let state = SessionState {
            scoreboard: vec![entry("a", 5), entry("b", 9), entry("c", 5), entry("d", 1)],
            ..SessionState::default()
        };
        assert_eq!(
            ranks(&project(&state)),
            vec![("b", Some(1)), ("a", Some(2)), ("c", Some(2)), ("d", Some(4))]
        );
    }

    #[test]
    fn eliminated_rank_after_active() {
        let state = SessionState {
            scoreboard: vec![entry("a", 50), entry("b", 9), entry("c", 5)],
            eliminated: [ParticipantId::from("a")].into(),
            ..SessionState::default()
        };
        let standings = project(&state);
        assert_eq!(ranks(&standings), vec![("b", Some(1)), ("c", Some(2)), ("a", Some(3))]);
        assert!(standings[2].is_eliminated);
    }

    #[test]
    fn viewers_do_not_disturb_ranks() {
        let mut state = SessionState {
            scoreboard: vec![entry("a", 5), entry("b", 9)],
            ..SessionState::default()
        };
        let before: Vec<_> =
            ranks(&project(&state)).iter().map(|(id, r)| (id.to_string(), *r)).collect();

        state.roster.push(ParticipantInfo {
            id: ParticipantId::from("v"),
            name: "Viewer".into(),
            is_viewer: true,
        });
        let standings = project(&state);
        let after: Vec<_> =
            ranks(&standings).iter().take(2).map(|(id, r)| (id.to_string(), *r)).collect();
        assert_eq!(before, after);
        assert_eq!(standings[2].rank, None);
        assert!(standings[2].is_viewer);
    }

    #[test]
    fn lowest_ranked_picks_bottom() {
        let state = SessionState {
            scoreboard: vec![entry("a", 5), entry("b", 9), entry("c", 1), entry("d", 7)],
            ..SessionState::default()
        };
        assert_eq!(
            lowest_ranked(&state, 2),
            vec![ParticipantId::from("c"), ParticipantId::from("a")]
        );
    }

    #[test]
    fn lowest_ranked_skips_eliminated() {
        let state = SessionState {
            scoreboard: vec![entry("a", 5), entry("b", 9), entry("c", 1)],
            eliminated: [ParticipantId::from("c")].into(),
            ..SessionState::default()
        };
        assert_eq!(lowest_ranked(&state, 1), vec![ParticipantId::from("a")]);
    }
}
