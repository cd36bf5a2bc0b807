//! Normalises a model's match review into the layout the clip importer and
//! the profile store read.

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::{Map, Value, json};
use storage::models::{MatchHistoryEntry, RATING_KEYS};

use super::prompts::{DEFAULT_PLAYER1, PlayerFocus};

fn field<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    value.get(key).filter(|v| !v.is_null())
}

fn text<'v>(value: &'v Value, key: &str) -> &'v str {
    value.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn array(value: &Value, key: &str) -> Vec<Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn copy_fields(point: &Value, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|k| field(point, k).map(|v| (k.to_string(), v.clone())))
        .collect()
}

/// Splits `points[]` into player one's wins and losses. A point is a win when
/// the winner names player one (or the default placeholder).
fn split_points(parsed: &Value, player1: &str) -> (Vec<Value>, Vec<Value>) {
    let mut wins = Vec::new();
    let mut losses = Vec::new();

    for point in parsed.get("points").and_then(Value::as_array).into_iter().flatten() {
        let winner = text(point, "winner");
        let mut base = copy_fields(
            point,
            &[
                "id",
                "start_seconds",
                "end_seconds",
                "timestamp_display",
                "description",
                "serve_time",
                "dead_ball_time",
                "winner",
            ],
        );

        let p1_won = (!player1.is_empty() && winner.contains(player1)) || winner.contains(DEFAULT_PLAYER1);
        let reason = field(point, "win_reason").cloned();
        let technique = field(point, "key_technique").cloned();

        if p1_won {
            base.insert("win_type".into(), reason.unwrap_or_else(|| json!("point won")));
            if let Some(t) = technique {
                base.insert("key_technique".into(), t);
            }
            if let Some(t) = field(point, "tactic") {
                base.insert("tactical_value".into(), t.clone());
            }
            wins.push(Value::Object(base));
        } else {
            base.insert("loss_type".into(), reason.unwrap_or_else(|| json!("point lost")));
            if let Some(t) = technique {
                base.insert("technical_issue".into(), t);
            }
            losses.push(Value::Object(base));
        }
    }

    (wins, losses)
}

/// Builds the stored analysis document from the model reply.
pub fn normalize(parsed: Value, focus: &PlayerFocus, video_url: &str) -> Value {
    let player1_analysis = field(&parsed, "player1_analysis").cloned().unwrap_or(Value::Null);
    let player2_analysis = field(&parsed, "player2_analysis").cloned().unwrap_or(Value::Null);

    let p1_name = match text(&player1_analysis, "name") {
        "" => focus.player1_name().to_string(),
        name => name.to_string(),
    };

    let (point_wins, point_losses) = if parsed.get("points").is_some() {
        split_points(&parsed, &p1_name)
    } else {
        (array(&parsed, "point_wins"), array(&parsed, "point_losses"))
    };

    let pick = |key: &str, nested: &str| {
        field(&parsed, key)
            .or_else(|| field(&player1_analysis, nested))
            .cloned()
            .unwrap_or_else(|| json!([]))
    };

    let match_overview = field(&parsed, "match_overview").cloned().unwrap_or_else(|| json!({}));
    let sections = json!({
        "match_overview": match_overview.clone(),
        "strengths": pick("strengths", "strengths"),
        "weaknesses": pick("weaknesses", "weaknesses"),
        "training_suggestions": pick("training_suggestions", "suggestions"),
        "summary": field(&parsed, "summary").cloned().unwrap_or_else(|| json!({})),
    });
    let points = array(&parsed, "points");

    json!({
        "video_url": video_url,
        "point_wins": point_wins,
        "point_losses": point_losses,
        "points": points,
        "player1_analysis": player1_analysis,
        "player2_analysis": player2_analysis,
        "match_overview": match_overview,
        "sections": sections,
        "structured_data": parsed,
    })
}

const QUALITY_LABELS: [&str; 3] = ["good", "normal", "bad"];

/// Reads the older `points_won` / `points_lost` rally fields into the
/// importer's names, then orders the rallies by start time.
fn performance_clips(parsed: &Value, key: &str, legacy: &str) -> Vec<Value> {
    let mut clips = match field(parsed, key) {
        Some(_) => array(parsed, key),
        None => array(parsed, legacy),
    };

    for clip in clips.iter_mut() {
        let Some(obj) = clip.as_object_mut() else { continue };
        for (name, old) in [
            ("start_seconds", "timestamp_seconds"),
            ("timestamp", "timestamp_display"),
            ("quality_label", "action_quality"),
            ("technique", "point_type"),
        ] {
            if !obj.contains_key(name) {
                if let Some(v) = obj.get(old).filter(|v| !v.is_null()).cloned() {
                    obj.insert(name.to_string(), v);
                }
            }
        }
    }

    let start = |clip: &Value| clip.get("start_seconds").and_then(Value::as_f64).unwrap_or(0.0);
    clips.sort_by(|a, b| start(a).total_cmp(&start(b)));
    clips
}

/// Counts per quality label. Anything unlabelled counts as normal.
fn quality_counts(clips: &[Value]) -> Map<String, Value> {
    let mut counts: BTreeMap<&str, usize> = QUALITY_LABELS.iter().map(|l| (*l, 0)).collect();
    for clip in clips {
        let label = text(clip, "quality_label").trim().to_lowercase();
        let label = QUALITY_LABELS.iter().find(|l| **l == label).copied().unwrap_or("normal");
        *counts.entry(label).or_default() += 1;
    }

    let mut map: Map<String, Value> = counts.into_iter().map(|(k, v)| (k.to_string(), json!(v))).collect();
    map.insert("total".into(), json!(clips.len()));
    map
}

/// Builds the stored document for a single-player review. The layout is the
/// one the player clip importer reads.
pub fn normalize_player(parsed: Value, player: &str, video_url: &str) -> Value {
    let scoring = performance_clips(&parsed, "scoring_clips", "points_won");
    let losing = performance_clips(&parsed, "losing_clips", "points_lost");

    let scoring_counts = quality_counts(&scoring);
    let losing_counts = quality_counts(&losing);
    let mut distribution = quality_counts(&[scoring.as_slice(), losing.as_slice()].concat());
    distribution.insert(
        "by_result".into(),
        json!({"scoring": scoring_counts, "losing": losing_counts}),
    );

    json!({
        "video_url": video_url,
        "player_name": player,
        "match_summary": field(&parsed, "match_summary").cloned().unwrap_or_else(|| json!({})),
        "scoring_clips": scoring,
        "losing_clips": losing,
        "training_recommendations": array(&parsed, "training_recommendations"),
        "quality_distribution": distribution,
        "structured_data": parsed,
    })
}

/// One player's side of a normalised analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerReport {
    pub name: String,
    pub opponent: String,
    pub ratings: BTreeMap<String, f64>,
    pub strengths: Vec<Value>,
    pub weaknesses: Vec<Value>,
    /// "win", "loss" or "unknown"
    pub result: String,
}

impl PlayerReport {
    pub fn history_entry(&self, match_id: &str, video_id: &str) -> MatchHistoryEntry {
        let now = Utc::now();
        MatchHistoryEntry {
            match_id: match_id.to_string(),
            video_id: video_id.to_string(),
            opponent: self.opponent.clone(),
            date: now.format("%Y-%m-%d").to_string(),
            result: self.result.clone(),
            ratings: self.ratings.clone(),
            strengths: self.strengths.clone(),
            weaknesses: self.weaknesses.clone(),
            created_at: now,
            updated_at: None,
        }
    }
}

fn ratings(analysis: &Value) -> BTreeMap<String, f64> {
    let Some(ratings) = analysis.get("ratings") else {
        return BTreeMap::new();
    };

    RATING_KEYS
        .iter()
        .filter_map(|key| {
            let value = ratings.get(*key)?;
            let number = value
                .as_f64()
                .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))?;
            Some((key.to_string(), number))
        })
        .collect()
}

fn result_for(wins: usize, losses: usize) -> (&'static str, &'static str) {
    match wins.cmp(&losses) {
        std::cmp::Ordering::Greater => ("win", "loss"),
        std::cmp::Ordering::Less => ("loss", "win"),
        std::cmp::Ordering::Equal => ("unknown", "unknown"),
    }
}

/// Reports for the named players. A side with no name produces no report.
pub fn player_reports(normalized: &Value, player1: Option<&str>, player2: Option<&str>) -> Vec<PlayerReport> {
    let wins = normalized.get("point_wins").and_then(Value::as_array).map_or(0, Vec::len);
    let losses = normalized.get("point_losses").and_then(Value::as_array).map_or(0, Vec::len);
    let (r1, r2) = result_for(wins, losses);

    let named = |name: Option<&str>| name.map(str::trim).filter(|n| !n.is_empty()).map(String::from);
    let p1 = named(player1);
    let p2 = named(player2);

    let side = |name: &Option<String>, opponent: &Option<String>, key: &str, result: &str| {
        let name = name.clone()?;
        let analysis = normalized.get(key).cloned().unwrap_or(Value::Null);
        Some(PlayerReport {
            name,
            opponent: opponent.clone().unwrap_or_default(),
            ratings: ratings(&analysis),
            strengths: array(&analysis, "strengths"),
            weaknesses: array(&analysis, "weaknesses"),
            result: result.to_string(),
        })
    };

    [
        side(&p1, &p2, "player1_analysis", r1),
        side(&p2, &p1, "player2_analysis", r2),
    ]
    .into_iter()
    .flatten()
    .collect()
}
