// Input validation for user-submitted content
// Every check returns a field-level Validation error and never touches the store

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, AppResult};
use crate::models::{CompanyReviewInput, DimensionRatings, EntityReviewInput, ReviewSubjectKind};

pub const POST_TITLE_MAX_CHARS: usize = 300;
pub const REVIEW_TITLE_MAX_CHARS: usize = 200;
pub const FORUM_TITLE_MAX_CHARS: usize = 200;

static TOPIC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9 _+#.-]{0,49}$").expect("topic pattern is a valid regex")
});

/// Trimmed text whose length in characters lies in `1..=max`
fn bounded_text(field: &str, value: &str, max: usize) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(field, format!("{} must not be empty", field)));
    }
    let length = trimmed.chars().count();
    if length > max {
        return Err(AppError::validation(
            field,
            format!("{} must be at most {} characters (got {})", field, max, length),
        ));
    }
    Ok(trimmed.to_string())
}

fn required_text(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(field, format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

pub fn comment_body(body: &str, max_chars: usize) -> AppResult<String> {
    bounded_text("body", body, max_chars)
}

pub fn post_title(title: &str) -> AppResult<String> {
    bounded_text("title", title, POST_TITLE_MAX_CHARS)
}

pub fn post_body(body: &str) -> AppResult<String> {
    required_text("body", body)
}

/// Blank links are dropped; anything else must be an http(s) URL
pub fn external_link(link: Option<&str>) -> AppResult<Option<String>> {
    match link.map(str::trim) {
        None | Some("") => Ok(None),
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
            Ok(Some(url.to_string()))
        }
        Some(_) => Err(AppError::validation(
            "external_link",
            "external_link must be an http or https URL",
        )),
    }
}

/// Normalize a single topic name, as used for topic follows
pub fn topic(raw: &str) -> AppResult<String> {
    let normalized = raw.trim().to_lowercase();
    if !TOPIC_PATTERN.is_match(&normalized) {
        return Err(AppError::validation(
            "topic",
            format!("Invalid topic: {:?}", raw),
        ));
    }
    Ok(normalized)
}

/// Trim, lowercase and deduplicate a post's topics, keeping first-seen order
pub fn topics(raw: &[String]) -> AppResult<Vec<String>> {
    topic_list("topics", raw)
}

/// Forum thread tags follow the topic rules
pub fn tags(raw: &[String]) -> AppResult<Vec<String>> {
    topic_list("tags", raw)
}

fn topic_list(field: &str, raw: &[String]) -> AppResult<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for entry in raw {
        if entry.trim().is_empty() {
            continue;
        }
        let normalized = topic(entry).map_err(|_| {
            AppError::validation(field, format!("Invalid {} entry: {:?}", field, entry))
        })?;
        if !out.contains(&normalized) {
            out.push(normalized);
        }
    }
    Ok(out)
}

pub fn forum_title(title: &str) -> AppResult<String> {
    bounded_text("title", title, FORUM_TITLE_MAX_CHARS)
}

pub fn forum_content(content: &str) -> AppResult<String> {
    required_text("content", content)
}

pub fn rating(field: &str, value: u8) -> AppResult<u8> {
    if (1..=5).contains(&value) {
        Ok(value)
    } else {
        Err(AppError::validation(
            field,
            format!("{} must be between 1 and 5 (got {})", field, value),
        ))
    }
}

/// Check ratings and text of a review, returning it with trimmed text
pub fn review(mut input: CompanyReviewInput) -> AppResult<CompanyReviewInput> {
    rating("overall_rating", input.overall_rating)?;
    for (name, value) in DimensionRatings::NAMES
        .iter()
        .zip(input.dimensions.as_array())
    {
        rating(name, value)?;
    }

    input.title = bounded_text("title", &input.title, REVIEW_TITLE_MAX_CHARS)?;
    input.pros = required_text("pros", &input.pros)?;
    input.cons = required_text("cons", &input.cons)?;
    input.advice_to_management = input
        .advice_to_management
        .map(|advice| advice.trim().to_string())
        .filter(|advice| !advice.is_empty());
    Ok(input)
}

/// Check a program, supervisor or service review against its subject's dimensions
pub fn entity_review(
    kind: ReviewSubjectKind,
    mut input: EntityReviewInput,
) -> AppResult<EntityReviewInput> {
    rating("overall_rating", input.overall_rating)?;

    let expected = kind.dimension_names();
    for name in expected {
        match input.dimension_ratings.get(*name) {
            Some(value) => {
                rating(name, *value)?;
            }
            None => {
                return Err(AppError::validation(
                    *name,
                    format!("{} rating is required for a {}", name, kind.as_str()),
                ))
            }
        }
    }
    if let Some(unknown) = input
        .dimension_ratings
        .keys()
        .find(|name| !expected.contains(&name.as_str()))
    {
        return Err(AppError::validation(
            "dimension_ratings",
            format!("Unknown rating {:?} for a {}", unknown, kind.as_str()),
        ));
    }

    input.content = required_text("content", &input.content)?;
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: AppError) -> String {
        match err {
            AppError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_comment_body_bounds() {
        assert_eq!(comment_body("  hello  ", 10).unwrap(), "hello");
        assert_eq!(field_of(comment_body("   ", 10).unwrap_err()), "body");
        assert!(comment_body(&"x".repeat(10), 10).is_ok());
        assert!(comment_body(&"x".repeat(11), 10).is_err());
        // Length is counted in characters, not bytes
        assert!(comment_body(&"ب".repeat(10), 10).is_ok());
    }

    #[test]
    fn test_post_title_limit() {
        assert!(post_title(&"t".repeat(300)).is_ok());
        assert_eq!(field_of(post_title(&"t".repeat(301)).unwrap_err()), "title");
    }

    #[test]
    fn test_topics_normalized() {
        let raw = vec![
            " Software ".to_string(),
            "career".to_string(),
            "SOFTWARE".to_string(),
            "".to_string(),
            "c++".to_string(),
        ];
        assert_eq!(topics(&raw).unwrap(), vec!["software", "career", "c++"]);
        assert_eq!(field_of(topics(&["<script>".to_string()]).unwrap_err()), "topics");
        assert_eq!(field_of(tags(&["<script>".to_string()]).unwrap_err()), "tags");
        assert_eq!(tags(&[" PEC ".to_string()]).unwrap(), vec!["pec"]);
    }

    #[test]
    fn test_forum_text() {
        assert!(forum_title(&"t".repeat(200)).is_ok());
        assert_eq!(field_of(forum_title(&"t".repeat(201)).unwrap_err()), "title");
        assert_eq!(field_of(forum_content("  ").unwrap_err()), "content");
    }

    fn supervisor_input(ratings: serde_json::Value) -> EntityReviewInput {
        serde_json::from_value(serde_json::json!({
            "overall_rating": 4,
            "dimension_ratings": ratings,
            "content": " Helpful advisor ",
            "would_recommend": true
        }))
        .unwrap()
    }

    #[test]
    fn test_entity_review_dimensions() {
        let ok = entity_review(
            ReviewSubjectKind::Supervisor,
            supervisor_input(serde_json::json!({
                "availability": 4, "guidance_quality": 5, "research_environment": 3
            })),
        )
        .unwrap();
        assert_eq!(ok.content, "Helpful advisor");

        let missing = entity_review(
            ReviewSubjectKind::Supervisor,
            supervisor_input(serde_json::json!({"availability": 4, "guidance_quality": 5})),
        );
        assert_eq!(field_of(missing.unwrap_err()), "research_environment");

        let out_of_range = entity_review(
            ReviewSubjectKind::Supervisor,
            supervisor_input(serde_json::json!({
                "availability": 0, "guidance_quality": 5, "research_environment": 3
            })),
        );
        assert_eq!(field_of(out_of_range.unwrap_err()), "availability");

        let unknown = entity_review(
            ReviewSubjectKind::Program,
            supervisor_input(serde_json::json!({"availability": 4})),
        );
        assert_eq!(field_of(unknown.unwrap_err()), "dimension_ratings");
    }

    #[test]
    fn test_single_topic() {
        assert_eq!(topic(" Civil ").unwrap(), "civil");
        assert!(topic("").is_err());
        assert!(topic(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_external_link() {
        assert_eq!(external_link(None).unwrap(), None);
        assert_eq!(external_link(Some("  ")).unwrap(), None);
        assert_eq!(
            external_link(Some("https://engg.pk")).unwrap().as_deref(),
            Some("https://engg.pk")
        );
        assert!(external_link(Some("ftp://x")).is_err());
    }

    #[test]
    fn test_review_rating_range() {
        let input: CompanyReviewInput = serde_json::from_value(serde_json::json!({
            "overall_rating": 4,
            "work_life_balance": 3,
            "culture_values": 6,
            "career_opportunities": 5,
            "compensation_benefits": 2,
            "senior_management": 4,
            "title": "Good",
            "pros": "Team",
            "cons": "Pay"
        }))
        .unwrap();
        assert_eq!(field_of(review(input).unwrap_err()), "culture_values");
    }

    #[test]
    fn test_review_text_trimmed() {
        let input: CompanyReviewInput = serde_json::from_value(serde_json::json!({
            "overall_rating": 5,
            "work_life_balance": 5,
            "culture_values": 5,
            "career_opportunities": 5,
            "compensation_benefits": 5,
            "senior_management": 5,
            "title": "  Great  ",
            "pros": " Everything ",
            "cons": " Nothing ",
            "advice_to_management": "   "
        }))
        .unwrap();
        let checked = review(input).unwrap();
        assert_eq!(checked.title, "Great");
        assert_eq!(checked.advice_to_management, None);
    }
}
