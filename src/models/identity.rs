// Identity records: users, thought leaders and organizations

use serde::{Deserialize, Serialize};

use crate::core::{OrganizationId, ThoughtLeaderId, Timestamp, UserId};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Professional,
    Expert,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Professional => "professional",
            Role::Expert => "expert",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "student" => Ok(Role::Student),
            "professional" => Ok(Role::Professional),
            "expert" => Ok(Role::Expert),
            "admin" => Ok(Role::Admin),
            other => Err(AppError::validation("role", format!("Unknown role: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThoughtLeader {
    pub id: ThoughtLeaderId,
    pub user_id: UserId,
    pub title: String,
    pub organization: String,
    pub bio: String,
    pub expertise_areas: Vec<String>,
    pub verified: bool,
    pub follower_count: i64,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewThoughtLeader {
    pub title: String,
    pub organization: String,
    pub bio: String,
    pub expertise_areas: Vec<String>,
    pub verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationCategory {
    Association,
    Company,
    University,
    Government,
    Startup,
    Ngo,
}

impl OrganizationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationCategory::Association => "association",
            OrganizationCategory::Company => "company",
            OrganizationCategory::University => "university",
            OrganizationCategory::Government => "government",
            OrganizationCategory::Startup => "startup",
            OrganizationCategory::Ngo => "ngo",
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "association" => Ok(OrganizationCategory::Association),
            "company" => Ok(OrganizationCategory::Company),
            "university" => Ok(OrganizationCategory::University),
            "government" => Ok(OrganizationCategory::Government),
            "startup" => Ok(OrganizationCategory::Startup),
            "ngo" => Ok(OrganizationCategory::Ngo),
            other => Err(AppError::validation(
                "category",
                format!("Unknown organization category: {}", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub category: OrganizationCategory,
    pub description: String,
    pub verified: bool,
    pub follower_count: i64,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub category: OrganizationCategory,
    pub description: String,
    pub verified: bool,
}

/// Discovery list row for thought leaders
#[derive(Debug, Clone, Serialize)]
pub struct ThoughtLeaderListing {
    #[serde(flatten)]
    pub thought_leader: ThoughtLeader,
    pub display_name: String,
    pub is_subscribed: bool,
}

/// Discovery list row for organizations
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationListing {
    #[serde(flatten)]
    pub organization: Organization,
    pub is_subscribed: bool,
}
