//! Heuristic match prediction over the static roster and recorded matches.

use std::cmp::Ordering;

use crate::dto::prediction::{
    FormFactor, HeadToHead, HeadToHeadFactor, HeadToHeadMatch, MatchPrediction, OpponentRankSplit,
    PlayerStats, PredictionFactors, RankingFactor, RatingFactor, StyleFactor, WinLoss,
};
use crate::error::{Result, StorageError};
use crate::models::{MatchRecord, PlayStyle, RosterPlayer};
use crate::services::roster;

const MIN_PROB: f64 = 0.05;
const MAX_PROB: f64 = 0.95;
/// A 50 point rating gap is worth the whole probability range
const RATING_SCALE: f64 = 50.0;
const H2H_WEIGHT: f64 = 0.2;
const RECENT_FORM_WINDOW: usize = 5;

/// Positive when `a`'s style has the edge over `b`'s. Antisymmetric:
/// `style_matchup(a, b) == -style_matchup(b, a)`.
pub fn style_matchup(a: PlayStyle, b: PlayStyle) -> f64 {
    use PlayStyle::*;

    let edge = |x: PlayStyle, y: PlayStyle| -> Option<f64> {
        match (x, y) {
            (Attacking, Defensive) => Some(0.2),
            (Attacking, FastAttack) => Some(0.0),
            (Attacking, Power) => Some(0.1),
            (AllRound, Attacking) => Some(0.1),
            (Defensive, FastAttack) => Some(0.1),
            (Defensive, AllRound) => Some(0.0),
            (Defensive, Power) => Some(0.2),
            (FastAttack, AllRound) => Some(0.1),
            (FastAttack, Power) => Some(0.15),
            (AllRound, Power) => Some(0.05),
            _ => None,
        }
    };

    if a == b {
        return 0.0;
    }

    edge(a, b)
        .or_else(|| edge(b, a).map(|v| -v))
        .unwrap_or(0.0)
}

/// Sets in the predicted result from player1's side
pub fn suggested_score(player1_win_prob: f64) -> String {
    let (favourite, flipped) = match player1_win_prob.partial_cmp(&0.5) {
        Some(Ordering::Greater) => (player1_win_prob, false),
        Some(Ordering::Less) => (1.0 - player1_win_prob, true),
        _ => return "4-3".to_string(),
    };

    let loser_sets = if favourite > 0.8 {
        0
    } else if favourite > 0.7 {
        1
    } else if favourite > 0.6 {
        2
    } else {
        3
    };

    if flipped {
        format!("{}-4", loser_sets)
    } else {
        format!("4-{}", loser_sets)
    }
}

pub fn player_stats(name: &str, matches: &[MatchRecord]) -> PlayerStats {
    let mut stats = PlayerStats {
        name: name.to_string(),
        total_matches: 0,
        wins: 0,
        losses: 0,
        win_rate: 0.0,
        avg_sets_won: 0.0,
        avg_sets_lost: 0.0,
        recent_form: Vec::new(),
        by_round: Default::default(),
        by_opponent_rank: OpponentRankSplit::default(),
    };

    let mut sets_won = 0u32;
    let mut sets_lost = 0u32;
    let mut dated_results = Vec::new();

    for record in matches.iter().filter(|m| m.involves(name)) {
        let won = record.won_by(name);

        stats.total_matches += 1;
        if won {
            stats.wins += 1;
        } else {
            stats.losses += 1;
        }

        if let Some((w, l)) = record.sets_for(name) {
            sets_won += w;
            sets_lost += l;
        }

        if !record.round.is_empty() {
            stats
                .by_round
                .entry(record.round.clone())
                .or_insert_with(WinLoss::default)
                .record(won);
        }

        if let Some(rank) = record.opponent_rank(name) {
            if rank <= 5 {
                stats.by_opponent_rank.vs_top5.record(won);
            }
            if rank <= 10 {
                stats.by_opponent_rank.vs_top10.record(won);
            }
            if rank <= 20 {
                stats.by_opponent_rank.vs_top20.record(won);
            }
        }

        dated_results.push((record.date, if won { "W" } else { "L" }));
    }

    if stats.total_matches > 0 {
        let total = stats.total_matches as f64;
        stats.win_rate = stats.wins as f64 / total;
        stats.avg_sets_won = sets_won as f64 / total;
        stats.avg_sets_lost = sets_lost as f64 / total;
    }

    // newest first, undated last
    dated_results.sort_by(|a, b| b.0.cmp(&a.0));
    stats.recent_form = dated_results
        .into_iter()
        .take(RECENT_FORM_WINDOW)
        .map(|(_, r)| r.to_string())
        .collect();

    stats
}

/// Meetings oriented to `player1`. `None` when they never met.
pub fn head_to_head(player1: &str, player2: &str, matches: &[MatchRecord]) -> Option<HeadToHead> {
    let meetings: Vec<&MatchRecord> = matches
        .iter()
        .filter(|m| m.involves(player1) && m.involves(player2))
        .collect();

    if meetings.is_empty() {
        return None;
    }

    let player1_wins = meetings.iter().filter(|m| m.won_by(player1)).count() as u32;

    Some(HeadToHead {
        player1: player1.to_string(),
        player2: player2.to_string(),
        player1_wins,
        player2_wins: meetings.len() as u32 - player1_wins,
        matches: meetings
            .iter()
            .map(|m| HeadToHeadMatch {
                date: m.date,
                tournament: m.tournament.clone(),
                score: m.score.clone(),
                winner: m.winner_name().to_string(),
            })
            .collect(),
    })
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn advantage<T: PartialOrd>(p1: &RosterPlayer, p2: &RosterPlayer, a: T, b: T) -> Option<String> {
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => Some(p1.name.clone()),
        Some(Ordering::Less) => Some(p2.name.clone()),
        _ => None,
    }
}

fn form_string(stats: &PlayerStats) -> String {
    if stats.recent_form.is_empty() {
        "N/A".to_string()
    } else {
        stats.recent_form.join(" ")
    }
}

/// `p1 = clamp(0.5 + rating_gap / 50 + h2h_adjustment, 0.05, 0.95)`, `p2 = 1 - p1`.
/// The head-to-head adjustment is `(p1_share - 0.5) * 0.2` when they have met.
pub fn predict(
    p1: &RosterPlayer,
    p2: &RosterPlayer,
    p1_stats: &PlayerStats,
    p2_stats: &PlayerStats,
    h2h: Option<&HeadToHead>,
) -> MatchPrediction {
    let rating_gap = p1.rating as f64 - p2.rating as f64;
    let h2h_adjustment = h2h
        .and_then(HeadToHead::player1_win_rate)
        .map(|rate| (rate - 0.5) * H2H_WEIGHT)
        .unwrap_or(0.0);

    let player1_win_prob = (0.5 + rating_gap / RATING_SCALE + h2h_adjustment).clamp(MIN_PROB, MAX_PROB);
    let player2_win_prob = 1.0 - player1_win_prob;

    let predicted_winner = advantage(p1, p2, player1_win_prob, player2_win_prob);
    let (h2h_p1, h2h_p2) = h2h.map(|h| (h.player1_wins, h.player2_wins)).unwrap_or((0, 0));

    let factors = PredictionFactors {
        ranking: RankingFactor {
            player1_rank: p1.rank,
            player2_rank: p2.rank,
            // lower rank is better
            advantage: advantage(p1, p2, p2.rank, p1.rank),
        },
        rating: RatingFactor {
            player1_rating: p1.rating,
            player2_rating: p2.rating,
            advantage: advantage(p1, p2, p1.rating, p2.rating),
        },
        head_to_head: HeadToHeadFactor {
            player1_wins: h2h_p1,
            player2_wins: h2h_p2,
            advantage: advantage(p1, p2, h2h_p1, h2h_p2),
        },
        recent_form: FormFactor {
            player1_form: form_string(p1_stats),
            player2_form: form_string(p2_stats),
            advantage: advantage(p1, p2, p1_stats.recent_win_rate(), p2_stats.recent_win_rate()),
        },
        style_matchup: StyleFactor {
            player1_style: p1.style,
            player2_style: p2.style,
            matchup_score: style_matchup(p1.style, p2.style),
        },
    };

    MatchPrediction {
        player1: p1.name.clone(),
        player2: p2.name.clone(),
        player1_win_prob: round3(player1_win_prob),
        player2_win_prob: round3(player2_win_prob),
        predicted_winner,
        confidence: round3(player1_win_prob.max(player2_win_prob)),
        factors,
        suggested_score: suggested_score(player1_win_prob),
    }
}

/// Everything known about a pairing, oriented to `player1`.
#[derive(Debug, Clone)]
pub struct Matchup {
    pub player1: RosterPlayer,
    pub player2: RosterPlayer,
    pub player1_stats: PlayerStats,
    pub player2_stats: PlayerStats,
    pub head_to_head: Option<HeadToHead>,
    pub prediction: MatchPrediction,
}

/// Resolves both names against the roster and runs the prediction.
pub fn matchup(player1: &str, player2: &str, matches: &[MatchRecord]) -> Result<Matchup> {
    let p1 = roster::find(player1)
        .ok_or_else(|| StorageError::InvalidInput(format!("Unknown player: {}", player1)))?;
    let p2 = roster::find(player2)
        .ok_or_else(|| StorageError::InvalidInput(format!("Unknown player: {}", player2)))?;

    if p1.name == p2.name {
        return Err(StorageError::InvalidInput(
            "A player cannot be matched against themselves".to_string(),
        ));
    }

    let player1_stats = player_stats(&p1.name, matches);
    let player2_stats = player_stats(&p2.name, matches);
    let head_to_head = head_to_head(&p1.name, &p2.name, matches);
    let prediction = predict(&p1, &p2, &player1_stats, &player2_stats, head_to_head.as_ref());

    Ok(Matchup {
        player1: p1,
        player2: p2,
        player1_stats,
        player2_stats,
        head_to_head,
        prediction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, MatchSide};
    use chrono::NaiveDate;

    fn record(id: &str, p1: &str, p2: &str, winner: MatchSide, score: &str, day: u32) -> MatchRecord {
        MatchRecord {
            match_id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, day),
            tournament: "WTT Star Contender".to_string(),
            round: "Final".to_string(),
            player1_name: p1.to_string(),
            player1_rank: Some(1),
            player2_name: p2.to_string(),
            player2_rank: Some(8),
            winner,
            score: score.to_string(),
            sets: vec![],
            gender: "men".to_string(),
        }
    }

    fn player(name: &str, rating: u32, style: PlayStyle) -> RosterPlayer {
        RosterPlayer {
            name: name.to_string(),
            country: "XXX".to_string(),
            rank: 1,
            rating,
            style,
            gender: Gender::Men,
        }
    }

    #[test]
    fn test_style_matchup_antisymmetric() {
        use PlayStyle::*;
        let styles = [Attacking, Defensive, FastAttack, AllRound, Power];
        for a in styles {
            for b in styles {
                assert_eq!(style_matchup(a, b), -style_matchup(b, a), "{a} vs {b}");
            }
        }
        assert_eq!(style_matchup(Defensive, Attacking), -0.2);
    }

    #[test]
    fn test_suggested_score_bands() {
        assert_eq!(suggested_score(0.85), "4-0");
        assert_eq!(suggested_score(0.75), "4-1");
        assert_eq!(suggested_score(0.65), "4-2");
        assert_eq!(suggested_score(0.55), "4-3");
        assert_eq!(suggested_score(0.15), "0-4");
        assert_eq!(suggested_score(0.45), "3-4");
        assert_eq!(suggested_score(0.5), "4-3");
    }

    #[test]
    fn test_identical_players_are_even() {
        let a = player("A", 90, PlayStyle::Attacking);
        let b = player("B", 90, PlayStyle::Attacking);
        let stats_a = player_stats("A", &[]);
        let stats_b = player_stats("B", &[]);

        let prediction = predict(&a, &b, &stats_a, &stats_b, None);
        assert_eq!(prediction.player1_win_prob, 0.5);
        assert_eq!(prediction.player2_win_prob, 0.5);
        assert!(prediction.predicted_winner.is_none());
        assert_eq!(prediction.player1_win_prob + prediction.player2_win_prob, 1.0);
    }

    #[test]
    fn test_swapping_players_inverts_prediction() {
        let matches = vec![
            record("1", "Wang Chuqin", "Lin Yun-Ju", MatchSide::Player1, "4-1", 3),
            record("2", "Lin Yun-Ju", "Wang Chuqin", MatchSide::Player1, "4-3", 5),
            record("3", "Wang Chuqin", "Lin Yun-Ju", MatchSide::Player1, "4-2", 7),
        ];
        let wang = roster::find("Wang Chuqin").unwrap();
        let lin = roster::find("Lin Yun-Ju").unwrap();
        let ws = player_stats(&wang.name, &matches);
        let ls = player_stats(&lin.name, &matches);

        let h2h = head_to_head(&wang.name, &lin.name, &matches).unwrap();
        let forward = predict(&wang, &lin, &ws, &ls, Some(&h2h));

        let h2h_rev = head_to_head(&lin.name, &wang.name, &matches).unwrap();
        let backward = predict(&lin, &wang, &ls, &ws, Some(&h2h_rev));

        assert!((forward.player1_win_prob - backward.player2_win_prob).abs() < 1e-9);
        assert!((forward.player2_win_prob - backward.player1_win_prob).abs() < 1e-9);
        assert_eq!(forward.predicted_winner, backward.predicted_winner);
        assert_eq!(forward.predicted_winner.as_deref(), Some("Wang Chuqin"));
        assert_eq!(forward.suggested_score, "4-2");
        assert_eq!(backward.suggested_score, "2-4");
        assert_eq!(
            forward.factors.style_matchup.matchup_score,
            -backward.factors.style_matchup.matchup_score
        );
    }

    #[test]
    fn test_probability_is_clamped() {
        let strong = player("Strong", 99, PlayStyle::Power);
        let weak = player("Weak", 10, PlayStyle::Power);
        let s = player_stats("Strong", &[]);
        let w = player_stats("Weak", &[]);

        let prediction = predict(&strong, &weak, &s, &w, None);
        assert_eq!(prediction.player1_win_prob, 0.95);
        assert_eq!(prediction.player2_win_prob, 0.05);
    }

    #[test]
    fn test_player_stats_aggregates() {
        let matches = vec![
            record("1", "Ma Long", "Felix Lebrun", MatchSide::Player1, "4-1", 1),
            record("2", "Felix Lebrun", "Ma Long", MatchSide::Player1, "4-3", 2),
            record("3", "Ma Long", "Truls Moregard", MatchSide::Player1, "4-0", 3),
        ];

        let stats = player_stats("Ma Long", &matches);
        assert_eq!(stats.total_matches, 3);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert!((stats.avg_sets_won - 11.0 / 3.0).abs() < 1e-9);
        assert!((stats.avg_sets_lost - 5.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.recent_form, vec!["W", "L", "W"]);
        assert_eq!(stats.by_round["Final"], WinLoss { wins: 2, losses: 1 });
        // Ma Long is player1 (rank 1) in two of them, so opponents are rank 8 there
        assert_eq!(stats.by_opponent_rank.vs_top10, WinLoss { wins: 2, losses: 1 });
        assert_eq!(stats.by_opponent_rank.vs_top5, WinLoss { wins: 0, losses: 1 });
    }

    #[test]
    fn test_matchup_rejects_unknown_and_self() {
        assert!(matches!(
            matchup("Nobody", "Ma Long", &[]),
            Err(StorageError::InvalidInput(_))
        ));
        assert!(matches!(
            matchup("ma long", "Ma Long", &[]),
            Err(StorageError::InvalidInput(_))
        ));

        let m = matchup("ma long", "Wang Chuqin", &[]).unwrap();
        assert_eq!(m.player1.name, "Ma Long");
        assert!(m.head_to_head.is_none());
        assert_eq!(m.prediction.factors.recent_form.player1_form, "N/A");
    }

    #[test]
    fn test_head_to_head_orientation() {
        let matches = vec![
            record("1", "A", "B", MatchSide::Player1, "4-1", 1),
            record("2", "B", "A", MatchSide::Player1, "4-2", 2),
            record("3", "B", "A", MatchSide::Player1, "4-0", 3),
        ];

        let ab = head_to_head("A", "B", &matches).unwrap();
        assert_eq!((ab.player1_wins, ab.player2_wins), (1, 2));
        let ba = head_to_head("B", "A", &matches).unwrap();
        assert_eq!((ba.player1_wins, ba.player2_wins), (2, 1));
        assert!(head_to_head("A", "C", &matches).is_none());
    }
}
