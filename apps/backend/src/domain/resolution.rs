//! Vote tallying and winner selection.

use crate::domain::state::PlayerId;

/// Tally of a round's votes in first-seen candidate order.
pub type VoteTally = Vec<(PlayerId, u32)>;

/// Builds the tally preserving the order in which candidates first
/// received a vote. That order is load-bearing for tie-breaking.
pub fn tally_votes<I>(candidates_in_cast_order: I) -> VoteTally
where
    I: IntoIterator<Item = PlayerId>,
{
    let mut tally: VoteTally = Vec::new();
    for candidate in candidates_in_cast_order {
        match tally.iter_mut().find(|(id, _)| *id == candidate) {
            Some((_, count)) => *count += 1,
            None => tally.push((candidate, 1)),
        }
    }
    tally
}

/// Winner is the first candidate in the tally to hold the maximum count;
/// a later candidate merely equalling the maximum does not displace it.
pub fn pick_winner(tally: &VoteTally) -> Option<PlayerId> {
    let mut winner = None;
    let mut max_votes = 0;
    for (candidate, count) in tally {
        if *count > max_votes {
            max_votes = *count;
            winner = Some(*candidate);
        }
    }
    winner
}
