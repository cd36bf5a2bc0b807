use serde_json::{Value, json};

/// Default name used for player one when the caller names nobody.
pub const DEFAULT_PLAYER1: &str = "Player A";
pub const DEFAULT_OPPONENT: &str = "Opponent";

/// Who to follow in a match video.
#[derive(Debug, Clone, Default)]
pub struct PlayerFocus {
    pub player1: Option<String>,
    pub player2: Option<String>,
    pub description1: Option<String>,
    pub description2: Option<String>,
}

impl PlayerFocus {
    pub fn player1_name(&self) -> &str {
        self.player1.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or(DEFAULT_PLAYER1)
    }

    pub fn player2_name(&self) -> &str {
        self.player2.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or(DEFAULT_OPPONENT)
    }
}

pub struct PromptBuilder;

impl PromptBuilder {
    /// Coaching prompt for a single lost point, fed with the pose measurements.
    pub fn failure_prompt(structured_data: &Value) -> String {
        format!(
            r#"You are a professional table tennis coach. Using the technical data below, explain why the player lost the point shown in the attached keyframes.

Technical data:
{}

Output ONLY valid JSON with this schema:
{}

Rules:
1. "category" is one of: stance, spin_reading, racket_angle, timing, balance, other
2. "severity" is one of: minor, moderate, severe
3. Give exactly three concrete improvement suggestions
4. Keep "failure_reason" under 50 words and "summary" to one sentence"#,
            serde_json::to_string_pretty(structured_data).unwrap_or_default(),
            serde_json::to_string_pretty(&Self::failure_schema()).unwrap_or_default()
        )
    }

    fn failure_schema() -> Value {
        json!({
            "failure_reason": "main reason the point was lost",
            "category": "racket_angle",
            "detailed_analysis": {
                "stance": "stance analysis",
                "racket_angle": "racket angle analysis",
                "body_balance": "body balance analysis",
                "timing": "timing analysis"
            },
            "improvement_suggestions": ["suggestion 1", "suggestion 2", "suggestion 3"],
            "summary": "one sentence summary",
            "severity": "moderate"
        })
    }

    /// Rally-by-rally review of a whole match video.
    pub fn match_prompt(focus: &PlayerFocus) -> String {
        let p1 = focus.player1_name();
        let p2 = focus.player2_name();

        let describe = |name: &str, desc: &Option<String>| match desc.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(d) => format!("**{}** ({})", name, d),
            None => format!("**{}**", name),
        };

        let mode = if focus.player2.is_some() {
            format!(
                "This video shows {} against {}. Analyse who wins every point.",
                describe(p1, &focus.description1),
                describe(p2, &focus.description2)
            )
        } else {
            format!(
                "Focus on {}. Analyse every point they win and lose.",
                describe(p1, &focus.description1)
            )
        };

        format!(
            r#"You are a professional table tennis coach and match analyst. Watch this match carefully and produce a detailed report.

{}

Scoring rules:
1. A winner is a shot the opponent cannot return.
2. An opponent error is a ball out, into the net or a service fault.
Decide by where the last ball lands, the umpire or the scoreboard.

Timing rules:
1. "start_seconds" is 2 to 3 seconds before the serve motion starts
2. "end_seconds" is 1 to 2 seconds after the ball is dead
3. end_seconds - start_seconds must be at least 5
Skip slow-motion replays, breaks and ball pickups.

Output ONLY valid JSON with this schema:
{}

Rate both players from 0 to 10 on serve, receive, attack, defense and tactics. The "winner" field must name {} or {} exactly."#,
            mode,
            serde_json::to_string_pretty(&Self::match_schema(p1, p2)).unwrap_or_default(),
            p1,
            p2
        )
    }

    fn match_schema(p1: &str, p2: &str) -> Value {
        let player = |name: &str| {
            json!({
                "name": name,
                "ratings": {"serve": 8.0, "receive": 7.0, "attack": 9.0, "defense": 6.5, "tactics": 8.0},
                "strengths": [{"title": "...", "description": "..."}],
                "weaknesses": [{"title": "...", "description": "..."}],
                "suggestions": [{"title": "...", "description": "..."}]
            })
        };

        json!({
            "match_overview": {
                "match_type": "singles or doubles",
                "player1_info": format!("how to recognise {}", p1),
                "player2_info": format!("how to recognise {}", p2),
                "score_summary": "3:1",
                "key_moments": "turning points"
            },
            "points": [{
                "id": 1,
                "start_seconds": 12.0,
                "end_seconds": 19.5,
                "timestamp_display": "0:12",
                "winner": p1,
                "win_reason": "forehand loop winner",
                "description": "what happened in the rally",
                "key_technique": "decisive technique",
                "tactic": "tactic used"
            }],
            "player1_analysis": player(p1),
            "player2_analysis": player(p2),
            "summary": {
                "overall_assessment": "overall tactical assessment",
                "tactical_analysis": "how the tactics played out",
                "mvp_performance": "best moments"
            }
        })
    }

    /// Scoring and losing rallies of one player, each graded on technique.
    pub fn player_prompt(player: &str, description: Option<&str>) -> String {
        let who = match description.map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) => format!("**{}** ({})", player, d),
            None => format!("**{}**", player),
        };

        format!(
            r#"You are a professional table tennis coach and stroke analyst. Watch this match and review the performance of {}.

Find every rally {} wins and every rally they lose. Grade each one on the quality of the stroke itself, not on the result:
- "good": fluent and technically sound, footwork in place, correct timing and shot choice. A lost point can still be good.
- "normal": basically correct with small flaws.
- "bad": clear technical errors, poor balance, a broken stroke or badly misjudged timing. A won point can still be bad.

Timing rules:
1. "start_seconds" is 2 to 3 seconds before the serve motion starts
2. "end_seconds" is 1 to 2 seconds after the ball is dead
3. Timestamps must be accurate, they are used to cut training clips

Output ONLY valid JSON with this schema:
{}

List at least three scoring and three losing rallies when the video has them."#,
            who,
            player,
            serde_json::to_string_pretty(&Self::player_schema(player)).unwrap_or_default()
        )
    }

    fn player_schema(player: &str) -> Value {
        let clip = |technique: &str, quality: &str| {
            json!({
                "clip_id": 1,
                "start_seconds": 12.0,
                "end_seconds": 19.5,
                "timestamp": "0:12",
                "technique": technique,
                "description": "what happened in the rally",
                "quality_label": quality,
                "quality_reason": "why the stroke earned this grade",
                "technical_score": 7,
                "footwork_analysis": "footwork",
                "stroke_analysis": "stroke mechanics",
                "training_suggestion": "drill based on this rally"
            })
        };

        json!({
            "player_name": player,
            "match_summary": {
                "total_points_won": 10,
                "total_points_lost": 8,
                "overall_performance": "overall assessment",
                "key_strengths": ["strength"],
                "key_weaknesses": ["weakness"]
            },
            "scoring_clips": [clip("forehand loop winner", "good")],
            "losing_clips": [clip("backhand push into the net", "bad")],
            "training_recommendations": [{
                "priority": 1,
                "area": "area to train",
                "description": "how to train it",
                "related_clips": [1]
            }]
        })
    }
}
