use ingest::VideoMetadata;
use ingest::extractors::{MatchAnalysis, PlayerAnalysis, PlayerFocus, match_report};
use ingest::sources::{wtt::models, youtube};
use storage::{
    Database,
    dto::{
        analysis::{AnalysisInfoResponse, AnalysisLimits, VideoInfo, YoutubeAnalyzeRequest},
        ranking::WorldPlayer,
    },
    models::{AnalysisRecord, PlayerProfile},
    repository::{
        analysis::{AnalysisRepository, NewAnalysis},
        profile::ProfileRepository,
    },
};

use crate::error::WebResult;
use crate::features::players::services::world_players;

pub fn focus_from(req: &YoutubeAnalyzeRequest) -> PlayerFocus {
    PlayerFocus {
        player1: req.player_focus.clone(),
        player2: req.player2_focus.clone(),
        description1: req.description1.clone(),
        description2: req.description2.clone(),
    }
}

pub const MAX_DURATION_MINUTES: u32 = 10;

pub fn video_info(video_id: &str, metadata: &VideoMetadata) -> VideoInfo {
    VideoInfo {
        video_id: video_id.to_string(),
        title: metadata.title.clone(),
        url: youtube::watch_url(video_id),
        duration: metadata.duration,
        thumbnail_url: metadata
            .thumbnail
            .clone()
            .unwrap_or_else(|| AnalysisRecord::thumbnail_for(video_id)),
        uploader: metadata.uploader.clone(),
    }
}

pub fn analysis_info(model_available: bool) -> AnalysisInfoResponse {
    AnalysisInfoResponse {
        success: true,
        enabled: model_available,
        description: "Reviews table tennis match videos from YouTube rally by rally".to_string(),
        supported_features: [
            "Download YouTube match videos",
            "Rally-by-rally match review",
            "Scoring and losing rallies of one player graded on technique",
            "Player strengths, weaknesses and ratings",
            "Training suggestions",
        ]
        .iter()
        .map(|f| f.to_string())
        .collect(),
        limitations: AnalysisLimits {
            max_duration_minutes: MAX_DURATION_MINUTES,
            supported_hosts: vec!["youtube.com".to_string(), "youtu.be".to_string()],
            requires_yt_dlp: true,
        },
    }
}

/// Persists the analysis, reusing an earlier record for the same video.
pub async fn store_analysis(db: &Database, analysis: &MatchAnalysis, info: &VideoInfo) -> WebResult<String> {
    let record_id = AnalysisRepository::new(db.pool())
        .save(NewAnalysis {
            video_id: &analysis.video_id,
            video_title: &info.title,
            video_url: &info.url,
            video_duration: info.duration,
            player_focus: analysis.player1.as_deref(),
            player2_focus: analysis.player2.as_deref(),
            analysis_result: &analysis.analysis,
        })
        .await?;

    Ok(record_id)
}

/// Persists a single-player review with the player as the record's focus.
pub async fn store_player_analysis(db: &Database, analysis: &PlayerAnalysis, info: &VideoInfo) -> WebResult<String> {
    let record_id = AnalysisRepository::new(db.pool())
        .save(NewAnalysis {
            video_id: &analysis.video_id,
            video_title: &info.title,
            video_url: &info.url,
            video_duration: info.duration,
            player_focus: Some(&analysis.player_name),
            player2_focus: None,
            analysis_result: &analysis.analysis,
        })
        .await?;

    Ok(record_id)
}

/// Adds this match to each named player's profile. Returns the number of
/// profiles written. Profiles not yet linked to an ITTF player are matched
/// against the cached world rankings.
pub async fn update_profiles(db: &Database, analysis: &MatchAnalysis, record_id: &str) -> WebResult<usize> {
    let repo = ProfileRepository::new(db.pool());
    let reports = match_report::player_reports(
        &analysis.analysis,
        analysis.player1.as_deref(),
        analysis.player2.as_deref(),
    );
    let mut ranked: Option<Vec<WorldPlayer>> = None;

    for report in &reports {
        let mut profile = match repo.find_by_name(&report.name).await? {
            Some(profile) => profile,
            None => PlayerProfile::new(&report.name),
        };

        if profile.ittf_id.is_none() {
            if ranked.is_none() {
                ranked = Some(world_players(db).await?);
            }
            let players = ranked.as_deref().unwrap_or_default();
            if let Some(player) = models::best_name_match(players, &report.name) {
                link_ranked_player(&mut profile, player);
            }
        }

        profile.add_alias(&report.name);
        profile.record_match(report.history_entry(record_id, &analysis.video_id));
        repo.save(&profile).await?;
        tracing::debug!("Updated profile {} ({} matches)", profile.display_name, profile.total_matches);
    }

    Ok(reports.len())
}

fn link_ranked_player(profile: &mut PlayerProfile, player: &WorldPlayer) {
    tracing::debug!("Linking profile {} to ITTF player {}", profile.player_id, player.ittf_id);

    profile.ittf_id = Some(player.ittf_id.clone());
    if !player.country.is_empty() {
        profile.country = Some(player.country.clone());
    }
    if !player.country_code.is_empty() {
        profile.country_code = Some(player.country_code.clone());
    }
    if player.photo_url.is_some() {
        profile.avatar_url = player.photo_url.clone();
    }
    profile.add_alias(&player.name);
}
