//! Hashtag checks

/// `#tag` form of a hashtag, whether or not it already carries the `#`
#[must_use]
pub fn as_hashtag(tag: &str) -> String {
    let tag = tag.trim();
    if tag.starts_with('#') {
        tag.to_string()
    } else {
        format!("#{tag}")
    }
}

/// Disallowed `#{username}{suffix}` hashtags, lower-concatenated and TitleCase
#[must_use]
pub fn hardcoded_patterns<S: AsRef<str>>(username: &str, suffixes: &[S]) -> Vec<String> {
    let lower = username.to_lowercase();
    let mut patterns = Vec::with_capacity(suffixes.len() * 2);
    for suffix in suffixes {
        let suffix = suffix.as_ref();
        patterns.push(format!("#{lower}{}", suffix.to_lowercase()));
        patterns.push(format!("#{username}{}", title_case(suffix)));
    }
    patterns
}

/// Exact case-insensitive match against any disallowed pattern
#[must_use]
pub fn is_hardcoded(tag: &str, patterns: &[String]) -> bool {
    let tag = as_hashtag(tag).to_lowercase();
    patterns.iter().any(|p| p.to_lowercase() == tag)
}

/// Some word of the hashtag starts with a domain-relevance keyword
///
/// Words begin at the start of the tag, after `_` or other separators, at a
/// lower-to-upper case change and at a digit/letter change. `#AIsafety` and
/// `#skincareglow` are contextual; `#fair` does not match `ai`.
#[must_use]
pub fn is_contextual<S: AsRef<str>>(tag: &str, keywords: &[S]) -> bool {
    let words = word_starts(tag);
    keywords.iter().any(|k| {
        let keyword = k.as_ref().to_lowercase();
        !keyword.is_empty() && words.iter().any(|w| w.starts_with(&keyword))
    })
}

/// Lowercased remainder of the tag body from each word boundary
fn word_starts(tag: &str) -> Vec<String> {
    let body = tag.trim().trim_start_matches('#');
    let mut starts = Vec::new();
    let mut prev: Option<char> = None;
    for (i, c) in body.char_indices() {
        let boundary = c.is_alphanumeric()
            && match prev {
                None => true,
                Some(p) => {
                    !p.is_alphanumeric()
                        || (p.is_lowercase() && c.is_uppercase())
                        || p.is_ascii_digit() != c.is_ascii_digit()
                }
            };
        if boundary {
            starts.push(body[i..].to_lowercase());
        }
        prev = Some(c);
    }
    starts
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn patterns_include_both_casings() {
        let p = hardcoded_patterns("FentyBeauty", &["love"]);
        assert_eq!(p, vec!["#fentybeautylove", "#FentyBeautyLove"]);
    }

    #[test]
    fn keywords_match_at_word_starts_only() {
        let keywords = ["ai", "care", "skin", "learning"];
        assert!(is_contextual("#AIsafety", &keywords));
        assert!(is_contextual("#skincareglow", &keywords));
        assert!(is_contextual("#DeepLearning", &keywords));
        assert!(is_contextual("#self_care", &keywords));
        assert!(is_contextual("#2024AI", &keywords));
        assert!(!is_contextual("#fair", &keywords));
        assert!(!is_contextual("#scare", &keywords));
        assert!(!is_contextual("#mountains", &keywords));
        assert!(!is_contextual("#", &keywords));
    }

    #[test]
    fn hash_prefix_is_optional() {
        let p = hardcoded_patterns("netflix", &["style"]);
        assert!(is_hardcoded("NetflixStyle", &p));
        assert!(is_hardcoded("#NETFLIXSTYLE", &p));
        assert!(!is_hardcoded("#netflixstyles", &p));
    }
}
