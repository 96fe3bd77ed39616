// Reviews and the aggregates derived from them: companies, plus programs,
// supervisors and professional services

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::{CompanyId, EntityReviewId, ReviewId, ReviewSubjectId, Timestamp, UserId};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub industry: String,
    pub verified: bool,
    pub overall_rating: f64,
    pub recommend_to_friend_percentage: i64,
    pub ceo_approval_percentage: i64,
    pub total_reviews_count: i64,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub industry: String,
    pub verified: bool,
}

/// The five 1-5 dimensions every company review rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionRatings {
    pub work_life_balance: u8,
    pub culture_values: u8,
    pub career_opportunities: u8,
    pub compensation_benefits: u8,
    pub senior_management: u8,
}

impl DimensionRatings {
    pub const NAMES: [&'static str; 5] = [
        "work_life_balance",
        "culture_values",
        "career_opportunities",
        "compensation_benefits",
        "senior_management",
    ];

    pub fn as_array(&self) -> [u8; 5] {
        [
            self.work_life_balance,
            self.culture_values,
            self.career_opportunities,
            self.compensation_benefits,
            self.senior_management,
        ]
    }

    pub fn from_array(values: [u8; 5]) -> Self {
        Self {
            work_life_balance: values[0],
            culture_values: values[1],
            career_opportunities: values[2],
            compensation_benefits: values[3],
            senior_management: values[4],
        }
    }
}

/// A review that carries a fixed set of rating dimensions
pub trait RatedReview {
    fn dimension_ratings(&self) -> Vec<u8>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyReview {
    pub id: ReviewId,
    pub company_id: CompanyId,
    pub author_id: UserId,
    pub overall_rating: u8,
    #[serde(flatten)]
    pub dimensions: DimensionRatings,
    pub title: String,
    pub pros: String,
    pub cons: String,
    pub advice_to_management: Option<String>,
    pub recommend_to_friend: bool,
    pub ceo_approval: Option<bool>,
    pub helpful_count: i64,
    pub created_at: Timestamp,
}

impl RatedReview for CompanyReview {
    fn dimension_ratings(&self) -> Vec<u8> {
        self.dimensions.as_array().to_vec()
    }
}

impl RatedReview for DimensionRatings {
    fn dimension_ratings(&self) -> Vec<u8> {
        self.as_array().to_vec()
    }
}

/// Review body as submitted by its author
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyReviewInput {
    pub overall_rating: u8,
    #[serde(flatten)]
    pub dimensions: DimensionRatings,
    pub title: String,
    pub pros: String,
    pub cons: String,
    #[serde(default)]
    pub advice_to_management: Option<String>,
    #[serde(default = "default_recommend")]
    pub recommend_to_friend: bool,
    #[serde(default)]
    pub ceo_approval: Option<bool>,
}

fn default_recommend() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct NewCompanyReview {
    pub company_id: CompanyId,
    pub author_id: UserId,
    pub review: CompanyReviewInput,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionAverages {
    pub work_life_balance: f64,
    pub culture_values: f64,
    pub career_opportunities: f64,
    pub compensation_benefits: f64,
    pub senior_management: f64,
}

/// Summary statistics computed from a company's reviews
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub review_count: i64,
    pub overall_rating: f64,
    pub dimension_averages: DimensionAverages,
    pub recommend_to_friend_percentage: i64,
    pub ceo_approval_percentage: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSubjectKind {
    /// University degree program
    Program,
    /// Research supervisor
    Supervisor,
    /// Professional engineering service
    Service,
}

impl ReviewSubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewSubjectKind::Program => "program",
            ReviewSubjectKind::Supervisor => "supervisor",
            ReviewSubjectKind::Service => "service",
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "program" => Ok(ReviewSubjectKind::Program),
            "supervisor" => Ok(ReviewSubjectKind::Supervisor),
            "service" => Ok(ReviewSubjectKind::Service),
            other => Err(AppError::validation(
                "kind",
                format!("Unknown review subject kind: {}", other),
            )),
        }
    }

    /// Rating dimensions a review of this kind must carry besides the overall rating
    pub fn dimension_names(&self) -> &'static [&'static str] {
        match self {
            ReviewSubjectKind::Supervisor => {
                &["availability", "guidance_quality", "research_environment"]
            }
            ReviewSubjectKind::Program | ReviewSubjectKind::Service => &[],
        }
    }
}

/// Something other than a company that users review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSubject {
    pub id: ReviewSubjectId,
    pub kind: ReviewSubjectKind,
    pub name: String,
    pub review_count: i64,
    pub average_rating: f64,
    pub recommend_percentage: i64,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReviewSubject {
    pub kind: ReviewSubjectKind,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityReview {
    pub id: EntityReviewId,
    pub subject_id: ReviewSubjectId,
    pub author_id: UserId,
    pub overall_rating: u8,
    pub dimension_ratings: BTreeMap<String, u8>,
    pub content: String,
    pub would_recommend: Option<bool>,
    pub helpful_count: i64,
    pub created_at: Timestamp,
}

/// Single-rating reviews average over their overall rating alone
impl RatedReview for EntityReview {
    fn dimension_ratings(&self) -> Vec<u8> {
        if self.dimension_ratings.is_empty() {
            vec![self.overall_rating]
        } else {
            self.dimension_ratings.values().copied().collect()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityReviewInput {
    pub overall_rating: u8,
    #[serde(default)]
    pub dimension_ratings: BTreeMap<String, u8>,
    pub content: String,
    #[serde(default)]
    pub would_recommend: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewEntityReview {
    pub subject_id: ReviewSubjectId,
    pub author_id: UserId,
    pub review: EntityReviewInput,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityAggregate {
    pub review_count: i64,
    pub average_rating: f64,
    /// Over reviews that answered the recommendation question
    pub recommend_percentage: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_array_order() {
        let dims = DimensionRatings::from_array([1, 2, 3, 4, 5]);
        assert_eq!(dims.work_life_balance, 1);
        assert_eq!(dims.senior_management, 5);
        assert_eq!(dims.as_array(), [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_subject_kind_dimensions() {
        assert_eq!(
            ReviewSubjectKind::Supervisor.dimension_names(),
            &["availability", "guidance_quality", "research_environment"]
        );
        assert!(ReviewSubjectKind::Program.dimension_names().is_empty());
        assert_eq!(
            ReviewSubjectKind::parse("service").unwrap(),
            ReviewSubjectKind::Service
        );
        assert!(ReviewSubjectKind::parse("restaurant").is_err());
    }

    #[test]
    fn test_single_rating_review_averages_overall() {
        let review = EntityReview {
            id: EntityReviewId::new(1),
            subject_id: ReviewSubjectId::new(1),
            author_id: UserId::new(1),
            overall_rating: 4,
            dimension_ratings: BTreeMap::new(),
            content: "Solid curriculum".to_string(),
            would_recommend: None,
            helpful_count: 0,
            created_at: Timestamp::new(0),
        };
        assert_eq!(review.dimension_ratings(), vec![4]);
    }

    #[test]
    fn test_review_input_defaults() {
        let input: CompanyReviewInput = serde_json::from_value(serde_json::json!({
            "overall_rating": 4,
            "work_life_balance": 3,
            "culture_values": 4,
            "career_opportunities": 5,
            "compensation_benefits": 2,
            "senior_management": 4,
            "title": "Solid place",
            "pros": "Good team",
            "cons": "Long commute"
        }))
        .unwrap();
        assert!(input.recommend_to_friend);
        assert_eq!(input.ceo_approval, None);
        assert_eq!(input.dimensions.as_array(), [3, 4, 5, 2, 4]);
    }
}
