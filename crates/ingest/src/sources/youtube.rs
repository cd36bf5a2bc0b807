use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref VIDEO_ID: Regex =
        Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&\n?#]+)").unwrap();
    static ref TITLE_PATTERNS: [Regex; 3] = [
        Regex::new(r"^(.+?)\s+[Vv][Ss]\.?\s+(.+?)(?:\s*[|｜]|$)").unwrap(),
        Regex::new(r"^(.+?)\s+[Vv][Ss]\.?\s+(.+)").unwrap(),
        Regex::new(r"^(.+?)[對対]\s*(.+?)(?:\s*[|｜]|$)").unwrap(),
    ];
}

/// Video id from a `watch?v=`, `youtu.be/` or `embed/` URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|id| !id.is_empty())
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Splits titles like `"Fan Zhendong vs Truls Moregard | WTT Finals"` into the
/// two player names.
pub fn players_from_title(title: &str) -> Option<(String, String)> {
    let title = title.trim();

    TITLE_PATTERNS.iter().find_map(|re| {
        let caps = re.captures(title)?;
        let a = caps.get(1)?.as_str().trim();
        let b = caps.get(2)?.as_str().trim();
        (!a.is_empty() && !b.is_empty()).then(|| (a.to_string(), b.to_string()))
    })
}
