/// A newtype for player profile keys, so "Fan Zhendong", " fan zhendong "
/// and "FAN ZHENDONG" all resolve to the same profile.
///
/// Every lookup or write of a profile goes through this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerId(String);

impl PlayerId {
    /// Trims, lower-cases and replaces spaces with underscores.
    ///
    /// # Examples
    ///
    /// ```
    /// use storage::models::PlayerId;
    ///
    /// let a = PlayerId::from_name("Fan Zhendong");
    /// let b = PlayerId::from_name("  fan zhendong ");
    ///
    /// assert_eq!(a, b);
    /// assert_eq!(a.as_str(), "fan_zhendong");
    /// ```
    pub fn from_name(name: &str) -> Self {
        Self(name.trim().to_lowercase().replace(' ', "_"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How well a free-form name matches a listed player name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NameMatch {
    /// Every word of the query appears in the candidate
    Parts,
    /// One name contains the other
    Substring,
    Exact,
}

/// Compares case-insensitively. `None` when nothing matches.
pub fn match_name(query: &str, candidate: &str) -> Option<NameMatch> {
    let query = query.trim().to_lowercase();
    let candidate = candidate.trim().to_lowercase();

    if query.is_empty() || candidate.is_empty() {
        return None;
    }

    if query == candidate {
        return Some(NameMatch::Exact);
    }

    if candidate.contains(&query) || query.contains(&candidate) {
        return Some(NameMatch::Substring);
    }

    let mut parts = query.split_whitespace().peekable();
    if parts.peek().is_some() && parts.all(|part| candidate.contains(part)) {
        return Some(NameMatch::Parts);
    }

    None
}
