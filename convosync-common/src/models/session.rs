// File: convosync-common/src/models/session.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The three mutually exclusive user categories the platform collects.
///
/// The upstream bot stores these in the `typeuser` variable using the
/// spellings `tenant`, `investor` and `owneroccupier`; we keep the canonical
/// snake_case spelling in the database.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
#[sqlx(rename_all = "snake_case")]
pub enum UserCategory {
    Tenant,
    Investor,
    OwnerOccupier,
}

impl UserCategory {
    /// The location scope this category implies.
    pub fn location_type(&self) -> LocationType {
        match self {
            UserCategory::Tenant => LocationType::Rental,
            UserCategory::Investor => LocationType::Investor,
            UserCategory::OwnerOccupier => LocationType::OwnerOccupier,
        }
    }

    /// Name of the platform variable that carries this category's location.
    pub fn location_variable(&self) -> &'static str {
        match self {
            UserCategory::Tenant => "rentallocation",
            UserCategory::Investor => "investorlocation",
            UserCategory::OwnerOccupier => "owneroccupierlocation",
        }
    }
}

impl fmt::Display for UserCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserCategory::Tenant => write!(f, "tenant"),
            UserCategory::Investor => write!(f, "investor"),
            UserCategory::OwnerOccupier => write!(f, "owner_occupier"),
        }
    }
}

impl FromStr for UserCategory {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tenant" => Ok(UserCategory::Tenant),
            "investor" => Ok(UserCategory::Investor),
            "owneroccupier" | "owner_occupier" => Ok(UserCategory::OwnerOccupier),
            _ => Err(format!("Unknown user category: {}", s)),
        }
    }
}

/// Which category a stored location value is scoped to.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
#[sqlx(rename_all = "snake_case")]
pub enum LocationType {
    Rental,
    Investor,
    OwnerOccupier,
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationType::Rental => write!(f, "rental"),
            LocationType::Investor => write!(f, "investor"),
            LocationType::OwnerOccupier => write!(f, "owner_occupier"),
        }
    }
}

impl FromStr for LocationType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rental" => Ok(LocationType::Rental),
            "investor" => Ok(LocationType::Investor),
            "owner_occupier" | "owneroccupier" => Ok(LocationType::OwnerOccupier),
            _ => Err(format!("Unknown location type: {}", s)),
        }
    }
}

/// The in-memory result of reconstructing one transcript: everything we
/// could recover about the session, before it is merged into storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user_category: Option<UserCategory>,
    pub location_type: Option<LocationType>,
    pub location_value: Option<String>,
    pub rating: Option<i32>,
    pub feedback: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// One reconstructed session row, correlated by the external session id.
#[derive(Clone, Debug, FromRow)]
pub struct Session {
    pub session_id: String,
    pub user_id: Option<String>,
    pub transcript_external_id: Option<String>,
    pub user_category: Option<UserCategory>,
    pub location_type: Option<LocationType>,
    pub location_value: Option<String>,
    pub rating: Option<i32>,
    pub feedback: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
