use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static NON_SLUG_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("Invalid slug regex"));

/// URL path segment under which a post is published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSlug(String);

impl PostSlug {
    /// Uses `requested` when it is non-blank, otherwise derives a slug from the title.
    pub fn from_request(requested: Option<String>, title: &str, now: DateTime<Utc>) -> Self {
        match requested.map(|s| s.trim().to_string()) {
            Some(slug) if !slug.is_empty() => Self(slug),
            _ => Self::from_title(title, now),
        }
    }

    /// Hangul titles do not transliterate, so they get a timestamp slug instead.
    pub fn from_title(title: &str, now: DateTime<Utc>) -> Self {
        let fallback = || Self(format!("post-{}", now.timestamp_millis()));

        if title.chars().any(is_hangul_syllable) {
            return fallback();
        }

        let lowered = title.to_lowercase();
        let slug = NON_SLUG_RUN.replace_all(&lowered, "-");
        let slug = slug.trim_matches('-');
        if slug.is_empty() {
            fallback()
        } else {
            Self(slug.to_string())
        }
    }
}

fn is_hangul_syllable(c: char) -> bool {
    ('가'..='힣').contains(&c)
}

impl AsRef<str> for PostSlug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
