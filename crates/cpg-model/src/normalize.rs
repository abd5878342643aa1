//! Raw post normalizer
//!
//! Scraped data lands in storage in several shapes:
//! - a list of post objects
//! - a list of profile objects carrying `latestPosts` / `posts`
//! - an object with a `posts` key
//!
//! [`normalize_posts`] folds all of them into [`NormalizedPosts`] so callers
//! never branch on JSON shape themselves.

use crate::account::ProfileSnapshot;
use crate::post::Post;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

const NESTED_POST_KEYS: [&str; 4] = ["posts", "latestPosts", "tweets", "data"];
const TEXT_KEYS: [&str; 5] = ["caption", "text", "full_text", "message", "tweet_text"];
const LIKE_KEYS: [&str; 6] = [
    "likes",
    "likesCount",
    "likeCount",
    "favorite_count",
    "favoriteCount",
    "reactions",
];
const COMMENT_KEYS: [&str; 5] = [
    "comments",
    "commentsCount",
    "replyCount",
    "reply_count",
    "comments_count",
];
const TIME_KEYS: [&str; 5] = ["timestamp", "createdAt", "created_at", "time", "date"];
const ID_KEYS: [&str; 5] = ["id", "post_id", "id_str", "shortCode", "postId"];

/// Result of normalizing one stored document
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedPosts {
    /// At least one usable post
    Found(Vec<Post>),
    /// Recognised shape, but no usable posts
    Empty,
    /// Unrecognised shape; raw document kept for diagnostics
    SchemaMismatch(Value),
}

impl NormalizedPosts {
    /// Posts, or an empty list for `Empty` / `SchemaMismatch`
    #[must_use]
    pub fn into_posts(self) -> Vec<Post> {
        match self {
            Self::Found(posts) => posts,
            Self::Empty | Self::SchemaMismatch(_) => Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Normalize a stored document into posts owned by `owner`
#[must_use]
pub fn normalize_posts(raw: &Value, owner: &str, is_competitor: bool) -> NormalizedPosts {
    let Some(candidates) = post_candidates(raw) else {
        return NormalizedPosts::SchemaMismatch(raw.clone());
    };

    let posts: Vec<Post> = candidates
        .into_iter()
        .filter_map(|v| parse_post(v, owner, is_competitor))
        .collect();

    if posts.is_empty() {
        NormalizedPosts::Empty
    } else {
        NormalizedPosts::Found(posts)
    }
}

/// Pull profile fields out of a scraped document, if present
#[must_use]
pub fn extract_profile(raw: &Value, username: &str) -> Option<ProfileSnapshot> {
    let candidate = match raw {
        Value::Array(items) => items.iter().find(|v| is_profile(v)),
        Value::Object(_) if is_profile(raw) => Some(raw),
        Value::Object(map) => map.get("profile").filter(|v| v.is_object()),
        _ => None,
    }?;

    Some(ProfileSnapshot {
        username: str_field(candidate, &["username", "screen_name"])
            .unwrap_or(username)
            .to_string(),
        full_name: str_field(candidate, &["fullName", "full_name", "name"])
            .unwrap_or_default()
            .to_string(),
        biography: str_field(candidate, &["biography", "bio", "description", "about"])
            .unwrap_or_default()
            .to_string(),
        is_business: candidate
            .get("isBusinessAccount")
            .or_else(|| candidate.get("is_business"))
            .and_then(Value::as_bool),
        category: str_field(candidate, &["businessCategoryName", "category"]).map(str::to_string),
    })
}

fn is_profile(v: &Value) -> bool {
    v.is_object()
        && ["biography", "bio", "fullName", "followersCount", "isBusinessAccount"]
            .iter()
            .any(|k| v.get(k).is_some())
}

fn nested_posts(v: &Value) -> Option<&Vec<Value>> {
    NESTED_POST_KEYS
        .iter()
        .find_map(|k| v.get(k).and_then(Value::as_array))
}

fn post_candidates(raw: &Value) -> Option<Vec<&Value>> {
    match raw {
        Value::Null => Some(Vec::new()),
        Value::Array(items) => {
            let mut out = Vec::new();
            for item in items {
                if let Some(nested) = nested_posts(item) {
                    out.extend(nested.iter());
                } else if item.is_object() {
                    out.push(item);
                }
            }
            Some(out)
        }
        Value::Object(_) => nested_posts(raw).map(|posts| posts.iter().collect()),
        _ => None,
    }
}

fn parse_post(v: &Value, owner: &str, is_competitor: bool) -> Option<Post> {
    let text = str_field(v, &TEXT_KEYS)?.trim();
    if text.is_empty() {
        return None;
    }

    let id = ID_KEYS
        .iter()
        .find_map(|k| match v.get(k) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| fallback_id(owner, text));

    let mut post = Post::new(id, owner, text)
        .with_likes(count_field(v, &LIKE_KEYS))
        .with_comments(count_field(v, &COMMENT_KEYS))
        .as_competitor(is_competitor);

    if let Some(tags) = v.get("hashtags").and_then(Value::as_array) {
        post = post.with_hashtags(tags.iter().filter_map(Value::as_str));
    }
    if let Some(ts) = TIME_KEYS.iter().find_map(|k| v.get(k).and_then(parse_time)) {
        post = post.with_timestamp(ts);
    }

    Some(post)
}

fn str_field<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| v.get(k).and_then(Value::as_str))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count_field(v: &Value, keys: &[&str]) -> u64 {
    keys.iter()
        .find_map(|k| match v.get(k)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().replace(',', "").parse().ok(),
            _ => None,
        })
        .unwrap_or(0)
}

fn parse_time(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .or_else(|_| DateTime::parse_from_str(s, "%a %b %d %H:%M:%S %z %Y"))
            .map(|dt| dt.with_timezone(&Utc))
            .ok(),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    }
}

fn fallback_id(owner: &str, text: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(owner.as_bytes());
    hasher.update(&[0]);
    hasher.update(text.as_bytes());
    hasher.finalize().to_hex()[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn instagram_profile_list_with_latest_posts() {
        let raw = json!([{
            "username": "fentybeauty",
            "biography": "Beauty for all",
            "isBusinessAccount": true,
            "latestPosts": [
                { "id": "p1", "caption": "Gloss Bomb is back #glossbomb", "likesCount": 100,
                  "commentsCount": 5, "timestamp": "2024-05-01T10:00:00.000Z", "hashtags": ["summer"] },
                { "id": "p2", "caption": "", "likesCount": 50 }
            ]
        }]);

        let NormalizedPosts::Found(posts) = normalize_posts(&raw, "fentybeauty", false) else {
            panic!("expected posts");
        };
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].engagement(), 105);
        assert!(posts[0].hashtags().contains("glossbomb"));
        assert!(posts[0].hashtags().contains("summer"));
        assert!(posts[0].timestamp().is_some());

        let profile = extract_profile(&raw, "fentybeauty").unwrap();
        assert_eq!(profile.biography, "Beauty for all");
        assert_eq!(profile.is_business, Some(true));
    }

    #[test]
    fn twitter_tweet_list() {
        let raw = json!([
            { "id_str": "17", "full_text": "Backprop still works", "favorite_count": 900,
              "reply_count": "1,200", "created_at": "Wed Oct 10 20:19:24 +0000 2018" }
        ]);
        let posts = normalize_posts(&raw, "geoffreyhinton", true).into_posts();
        assert_eq!(posts[0].id(), "17");
        assert_eq!(posts[0].engagement(), 2100);
        assert!(posts[0].is_competitor());
        assert!(posts[0].timestamp().is_some());
    }

    #[test]
    fn object_with_posts_key() {
        let raw = json!({ "posts": [{ "text": "hello there", "likes": 3, "timestamp": 1_700_000_000 }] });
        let posts = normalize_posts(&raw, "u", false).into_posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id().len(), 16);
    }

    #[test]
    fn empty_and_mismatch_are_distinct() {
        assert_eq!(normalize_posts(&json!([]), "u", false), NormalizedPosts::Empty);
        assert_eq!(normalize_posts(&json!({ "posts": [] }), "u", false), NormalizedPosts::Empty);
        assert!(matches!(
            normalize_posts(&json!({ "followers": 10 }), "u", false),
            NormalizedPosts::SchemaMismatch(_)
        ));
        assert!(matches!(
            normalize_posts(&json!("oops"), "u", false),
            NormalizedPosts::SchemaMismatch(_)
        ));
    }
}
