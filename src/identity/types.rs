//! Account, legacy member, and profile types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::levels::ProgramMarkers;
use crate::validation::ValidationErrors;

/// Current-system account.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Predecessor-system member, read-only.
#[derive(Debug, Clone)]
pub struct LegacyAccount {
    pub id: i64,
    pub name: String,
    pub gender: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub line_id: Option<String>,
    pub intake_year: Option<String>,
    /// Unsalted MD5 hex digest
    pub password_digest: String,
    pub markers: ProgramMarkers,
}

/// Where an email stands in the one-way legacy migration.
#[derive(Debug, Clone)]
pub enum MigrationState {
    /// Only the predecessor system knows this email.
    LegacyOnly(LegacyAccount),
    /// A current account exists; any legacy row is ignored from now on.
    Migrated(Account),
}

/// Member profile.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub name: String,
    pub personal_id: Option<String>,
    pub gender: Option<String>,
    pub whatsapp: Option<String>,
    pub tiktok: Option<String>,
    pub linkedin: Option<String>,
    pub line: Option<String>,
    pub instagram: Option<String>,
    pub province_id: Option<i64>,
    pub city_id: Option<i64>,
    pub university_id: Option<i64>,
    pub university_temp: Option<String>,
    pub major: Option<String>,
    pub intake_year: Option<String>,
    pub level: i32,
    pub badges: Vec<String>,
    pub picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// A fresh profile with only a name, at the base level.
    pub fn new(user_id: Uuid, name: String) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            name,
            personal_id: None,
            gender: None,
            whatsapp: None,
            tiktok: None,
            linkedin: None,
            line: None,
            instagram: None,
            province_id: None,
            city_id: None,
            university_id: None,
            university_temp: None,
            major: None,
            intake_year: None,
            level: 0,
            badges: Vec::new(),
            picture: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Profile materialized from a legacy member on first login.
    pub fn from_legacy(user_id: Uuid, legacy: &LegacyAccount) -> Self {
        Self {
            gender: legacy.gender.clone(),
            whatsapp: legacy.phone.clone(),
            line: legacy.line_id.clone(),
            intake_year: legacy.intake_year.clone(),
            level: legacy.markers.level().value(),
            badges: legacy.markers.badges(),
            ..Self::new(user_id, legacy.name.clone())
        }
    }

    /// Apply a user-submitted update. Level and badges are not reachable here.
    pub fn apply(&mut self, update: ProfileUpdate) {
        let ProfileUpdate {
            name,
            gender,
            whatsapp,
            line,
            instagram,
            province_id,
            city_id,
            university_id,
            intake_year,
            major,
            linkedin,
            personal_id,
            tiktok,
            university_temp,
        } = update;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(gender) = gender {
            self.gender = Some(gender.as_str().to_string());
        }
        if let Some(year) = intake_year {
            self.intake_year = Some(year.to_string());
        }
        merge(&mut self.whatsapp, whatsapp);
        merge(&mut self.line, line);
        merge(&mut self.instagram, instagram);
        merge(&mut self.province_id, province_id);
        merge(&mut self.city_id, city_id);
        merge(&mut self.university_id, university_id);
        merge(&mut self.major, major);
        merge(&mut self.linkedin, linkedin);
        merge(&mut self.personal_id, personal_id);
        merge(&mut self.tiktok, tiktok);
        merge(&mut self.university_temp, university_temp);
        self.updated_at = Utc::now();
    }
}

fn merge<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Gender accepted on profile updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

/// Partial profile update. Unknown fields (including `level`) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub whatsapp: Option<String>,
    pub line: Option<String>,
    pub instagram: Option<String>,
    pub province_id: Option<i64>,
    pub city_id: Option<i64>,
    pub university_id: Option<i64>,
    pub intake_year: Option<i64>,
    pub major: Option<String>,
    pub linkedin: Option<String>,
    pub personal_id: Option<String>,
    pub tiktok: Option<String>,
    pub university_temp: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            errors.require("name", name);
        }
        if let Some(year) = self.intake_year {
            if !(1900..=9999).contains(&year) {
                errors.push("intake_year", "range", "The intake_year field must be a valid year");
            }
        }
        errors.into_result()
    }
}

/// Profile joined with its account and reference names.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileDetails {
    #[serde(rename = "userData")]
    pub account: Account,
    pub profile: Profile,
    pub province: Option<String>,
    pub city: Option<String>,
    pub university: Option<String>,
}

/// Successful login or migration.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub user: Account,
    #[serde(rename = "data")]
    pub profile: Option<Profile>,
    pub token: String,
    /// True when this login materialized the account from a legacy member
    #[serde(skip)]
    pub migrated: bool,
}
