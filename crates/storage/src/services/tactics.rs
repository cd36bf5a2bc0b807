//! Pre-match tactical advice built on top of a [`Matchup`].

use crate::dto::prediction::{MatchTactics, PlayerStats, TacticSuggestion};
use crate::models::PlayStyle;
use crate::services::prediction::Matchup;

const MAX_LISTED: usize = 5;

struct StyleProfile {
    strengths: [&'static str; 3],
    weaknesses: [&'static str; 3],
    counter_tactics: [&'static str; 3],
}

fn style_profile(style: PlayStyle) -> StyleProfile {
    match style {
        PlayStyle::Attacking => StyleProfile {
            strengths: [
                "Powerful forehand loop",
                "Strong initiative on attack",
                "High point-winning ability",
            ],
            weaknesses: [
                "Defence is relatively weak",
                "Tends to rush and make errors",
                "Struggles against choppers",
            ],
            counter_tactics: [
                "Control placement to limit attacking chances",
                "Use short balls to control the tempo",
                "Draw unforced errors from them",
            ],
        },
        PlayStyle::Defensive => StyleProfile {
            strengths: ["Solid defence", "Patient", "Few unforced errors"],
            weaknesses: [
                "Limited ability to win points outright",
                "Slower rhythm",
                "Becomes passive against heavy attack",
            ],
            counter_tactics: [
                "Keep the attacking pressure on",
                "Vary placement and spin",
                "Do not get drawn into long pushing rallies",
            ],
        },
        PlayStyle::FastAttack => StyleProfile {
            strengths: [
                "Very fast strokes",
                "Strong close to the table",
                "Good at taking the first attack",
            ],
            weaknesses: [
                "Weaker from mid and long distance",
                "Limited spin variation",
                "Relatively little power",
            ],
            counter_tactics: [
                "Step back and open up the distance",
                "Increase spin variation",
                "Overpower them with strength",
            ],
        },
        PlayStyle::AllRound => StyleProfile {
            strengths: [
                "Complete technique",
                "Varied tactics",
                "Adapts quickly",
            ],
            weaknesses: [
                "No obvious killer shot",
                "Can lack a clear identity",
                "Indecisive under pressure",
            ],
            counter_tactics: [
                "Play to your own strengths",
                "Find their relative weak spot",
                "Keep your own rhythm",
            ],
        },
        PlayStyle::Power => StyleProfile {
            strengths: [
                "Great power and speed",
                "Damaging forehand",
                "Imposing presence",
            ],
            weaknesses: [
                "Lacks finesse",
                "Weak short game",
                "Tires quickly",
            ],
            counter_tactics: [
                "Use short balls and spin or no-spin variation",
                "Wear down their stamina",
                "Exploit their impatience",
            ],
        },
    }
}

/// (title, description)
const SERVE_TACTICS: [(&str, &str); 5] = [
    ("Short sidespin into third-ball attack", "Serve short sidespin to the forehand and prepare the third-ball attack"),
    ("Surprise fast long serve", "Suddenly serve long and fast to a wide forehand or backhand angle"),
    ("Backspin control", "Serve short backspin to control the tempo and wait for an opening"),
    ("Reverse spin deception", "Use reverse pendulum serves to force receive errors"),
    ("Fast long to the backhand", "Serve fast and long into the backhand to pin it down"),
];

const RECEIVE_TACTICS: [(&str, &str); 5] = [
    ("Short touch control", "Drop the return short so they cannot open up easily"),
    ("Long push then attack", "Push long into the backhand and get ready to attack"),
    ("Flick attack", "Flick directly for the point once the serve is read"),
    ("Deceptive sidespin push", "Use disguised sidespin pushes to break their rhythm"),
    ("Backhand banana flick", "Take the initiative with a backhand flick on the receive"),
];

const RALLY_TACTICS: [(&str, &str); 5] = [
    ("Continuous forehand attack", "Keep the pressure on with your forehand"),
    ("Backhand-led rallies", "Stay steady on the backhand and wait for the forehand chance"),
    ("Placement variation", "Move them around the table and drain their stamina"),
    ("Tempo changes", "Mix fast and slow balls to disrupt their rhythm"),
    ("Spin variation", "Mix heavy and light spin to induce errors"),
];

fn style_index(style: PlayStyle) -> usize {
    match style {
        PlayStyle::Attacking => 0,
        PlayStyle::Defensive => 1,
        PlayStyle::FastAttack => 2,
        PlayStyle::AllRound => 3,
        PlayStyle::Power => 4,
    }
}

fn percent(prob: f64) -> String {
    format!("{:.0}%", prob * 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryEdge {
    Favourable,
    Unfavourable,
}

fn history_edge(matchup: &Matchup) -> Option<HistoryEdge> {
    let rate = matchup.head_to_head.as_ref()?.player1_win_rate()?;
    if rate > 0.6 {
        Some(HistoryEdge::Favourable)
    } else if rate < 0.4 {
        Some(HistoryEdge::Unfavourable)
    } else {
        None
    }
}

fn overall_strategy(matchup: &Matchup) -> String {
    let win_prob = matchup.prediction.player1_win_prob;
    let odds = percent(win_prob);
    let favourable = history_edge(matchup) == Some(HistoryEdge::Favourable);

    if win_prob > 0.7 {
        format!(
            "You are the clear favourite ({} to win). Play your own game at your normal level. Do not underestimate the opponent and focus on every point.",
            odds
        )
    } else if win_prob > 0.55 {
        if favourable {
            format!(
                "You hold a slight edge ({} to win) and the head-to-head record is in your favour. Repeat the tactics that worked before and execute the plan step by step.",
                odds
            )
        } else {
            format!(
                "The two of you are close, with a slight edge to you ({} to win). Play to your technical strengths, cut out needless errors and sharpen up on the big points.",
                odds
            )
        }
    } else if win_prob > 0.45 {
        format!(
            "This is an evenly matched contest ({} to win). Whoever executes better and makes fewer errors will win. Stay calm and be ready for a tough fight.",
            odds
        )
    } else if win_prob > 0.3 {
        if favourable {
            format!(
                "The opponent is slightly stronger ({} to win), but you lead the head-to-head. Trust yourself and use the tactics that trouble them.",
                odds
            )
        } else {
            format!(
                "The opponent is stronger ({} to win). Play freely, go for your shots and use variation to break their rhythm. A win here is a bonus.",
                odds
            )
        }
    } else {
        format!(
            "You face a very strong opponent ({} to win). Treat it as a learning match, play boldly and fight for every point.",
            odds
        )
    }
}

fn key_points(opponent_style: PlayStyle) -> Vec<String> {
    let mut points: Vec<&str> = match opponent_style {
        PlayStyle::Attacking => vec![
            "Control serve placement to limit their attacking chances",
            "Use short balls and variation rather than trading drives",
        ],
        PlayStyle::Defensive => vec![
            "Keep your attacking rhythm and avoid being dragged into steady rallies",
            "Vary power and placement to create scoring chances",
        ],
        PlayStyle::FastAttack => vec![
            "Step back from the table and use spin and power",
            "Serve long more often to break their close-to-table game",
        ],
        PlayStyle::Power => vec![
            "Wear them down with short balls and fine touch",
            "Avoid head-on exchanges and move them with placement",
        ],
        PlayStyle::AllRound => vec!["Play to your strengths at your own rhythm"],
    };

    points.push("Make every serve and receive count");
    points.push("Stay calm on key points and trust your training");
    points.into_iter().map(String::from).collect()
}

fn suggestion(category: &str, (title, description): (&str, &str), priority: u8, based_on: String) -> TacticSuggestion {
    TacticSuggestion {
        category: category.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        priority,
        based_on,
    }
}

fn suggestions(matchup: &Matchup) -> Vec<TacticSuggestion> {
    let opponent_style = matchup.player2.style;
    let pick = style_index(opponent_style);
    let profile = style_profile(opponent_style);

    let mut out = vec![
        suggestion(
            "serve",
            SERVE_TACTICS[pick],
            5,
            format!("Targets how a {} player receives", opponent_style),
        ),
        suggestion(
            "receive",
            RECEIVE_TACTICS[pick],
            5,
            "Take the initiative and control the tempo".to_string(),
        ),
        suggestion(
            "rally",
            RALLY_TACTICS[pick],
            4,
            format!("Exploits the relative weaknesses of a {} player", opponent_style),
        ),
    ];

    for (i, tactic) in profile.counter_tactics.iter().take(2).enumerate() {
        let title = format!("Counter plan {}", i + 1);
        out.push(suggestion(
            "counter",
            (title.as_str(), *tactic),
            4,
            format!("Standard counter against a {} player", opponent_style),
        ));
    }

    let win_prob = matchup.prediction.player1_win_prob;
    let mental = if win_prob < 0.4 {
        (
            ("Play relaxed", "Against a stronger opponent, drop the pressure and focus on your own level"),
            "The opponent is the stronger side",
        )
    } else if win_prob > 0.6 {
        (
            ("Stay focused", "Do not underestimate them, take every point seriously and play steadily"),
            "You are the favourite in this match",
        )
    } else {
        (
            ("Believe in yourself", "The two sides are close, execution and focus will decide it"),
            "An evenly matched contest",
        )
    };
    out.push(suggestion("mental", mental.0, 4, mental.1.to_string()));

    out
}

fn opponent_weaknesses(style: PlayStyle, stats: &PlayerStats) -> Vec<String> {
    let mut weaknesses: Vec<String> = style_profile(style)
        .weaknesses
        .iter()
        .map(|w| w.to_string())
        .collect();

    if stats.by_opponent_rank.vs_top5.losses > 2 {
        weaknesses.push("Low win rate against top 5 players".to_string());
    }

    if let Some(finals) = stats.by_round.get("Final") {
        if finals.losses > finals.wins {
            weaknesses.push("Final experience may be a weak spot".to_string());
        }
    }

    weaknesses.truncate(MAX_LISTED);
    weaknesses
}

fn player_strengths(style: PlayStyle, stats: &PlayerStats) -> Vec<String> {
    let mut strengths: Vec<String> = style_profile(style)
        .strengths
        .iter()
        .map(|s| s.to_string())
        .collect();

    if stats.win_rate > 0.6 {
        strengths.push(format!("Excellent overall win rate ({})", percent(stats.win_rate)));
    }

    if stats.recent_form.iter().filter(|r| *r == "W").count() >= 4 {
        strengths.push("In hot form recently".to_string());
    }

    strengths.truncate(MAX_LISTED);
    strengths
}

fn risk_factors(matchup: &Matchup) -> Vec<String> {
    let mut risks = Vec::new();

    if history_edge(matchup) == Some(HistoryEdge::Unfavourable) {
        risks.push("Behind in the head-to-head, which may weigh on you mentally".to_string());
    }

    if matchup.player2.rank + 3 < matchup.player1.rank {
        risks.push("The opponent is ranked clearly higher".to_string());
    }

    match (matchup.player1.style, matchup.player2.style) {
        (PlayStyle::Defensive, PlayStyle::Attacking) => {
            risks.push("A defender can be pushed onto the back foot by an attacker".to_string())
        }
        (PlayStyle::Power, PlayStyle::FastAttack) => {
            risks.push("A power player may struggle to keep up with a fast attacker's pace".to_string())
        }
        _ => {}
    }

    risks
}

/// Advice for `matchup.player1` facing `matchup.player2`. Deterministic for a
/// given matchup.
pub fn generate_tactics(matchup: &Matchup) -> MatchTactics {
    MatchTactics {
        player: matchup.player1.name.clone(),
        opponent: matchup.player2.name.clone(),
        overall_strategy: overall_strategy(matchup),
        key_points: key_points(matchup.player2.style),
        suggestions: suggestions(matchup),
        opponent_weaknesses: opponent_weaknesses(matchup.player2.style, &matchup.player2_stats),
        player_strengths: player_strengths(matchup.player1.style, &matchup.player1_stats),
        risk_factors: risk_factors(matchup),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchRecord, MatchSide};
    use crate::services::prediction::matchup;
    use chrono::NaiveDate;

    fn final_loss(id: &str, winner: &str, loser: &str, day: u32) -> MatchRecord {
        MatchRecord {
            match_id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, day),
            tournament: "WTT Champions".to_string(),
            round: "Final".to_string(),
            player1_name: winner.to_string(),
            player1_rank: Some(2),
            player2_name: loser.to_string(),
            player2_rank: Some(9),
            winner: MatchSide::Player1,
            score: "4-1".to_string(),
            sets: vec![],
            gender: "men".to_string(),
        }
    }

    #[test]
    fn test_tactics_are_deterministic() {
        let m = matchup("Ma Long", "Lin Yun-Ju", &[]).unwrap();
        assert_eq!(generate_tactics(&m), generate_tactics(&m));
    }

    #[test]
    fn test_suggestion_layout() {
        let m = matchup("Wang Chuqin", "Lin Yun-Ju", &[]).unwrap();
        let tactics = generate_tactics(&m);

        let categories: Vec<&str> = tactics.suggestions.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(categories, vec!["serve", "receive", "rally", "counter", "counter", "mental"]);
        assert_eq!(tactics.suggestions[0].priority, 5);
        assert_eq!(tactics.suggestions[0].title, SERVE_TACTICS[2].0);
        // Lin Yun-Ju is a fast attacker
        assert_eq!(tactics.key_points.len(), 4);
        assert_eq!(tactics.suggestions[5].title, "Stay focused");
    }

    #[test]
    fn test_weaknesses_from_record() {
        let matches = vec![
            final_loss("1", "Wang Chuqin", "Truls Moregard", 1),
            final_loss("2", "Ma Long", "Truls Moregard", 2),
        ];
        let m = matchup("Hugo Calderano", "Truls Moregard", &matches).unwrap();
        let tactics = generate_tactics(&m);

        assert!(tactics
            .opponent_weaknesses
            .iter()
            .any(|w| w.starts_with("Final experience")));
        assert!(tactics.opponent_weaknesses.len() <= MAX_LISTED);
    }

    #[test]
    fn test_underdog_risks() {
        let m = matchup("Quadri Aruna", "Wang Chuqin", &[]).unwrap();
        let tactics = generate_tactics(&m);

        assert!(tactics.risk_factors.iter().any(|r| r.contains("ranked clearly higher")));
        assert!(tactics.overall_strategy.contains("to win"));
        assert_eq!(tactics.suggestions.last().unwrap().title, "Play relaxed");
    }
}
