use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DISPLAY_NAME: &str = "Marcia";

/// The single stored profile row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub full_name: String,
    pub nickname: String,
    pub school: String,
    pub year: String,
    pub university: String,
    pub email: String,
    pub phone: String,
    pub bio: String,
    pub photo_path: String,
    pub updated_at: Option<NaiveDateTime>,
}

impl Profile {
    /// Nickname first, then full name, then the built-in default.
    pub fn display_name(&self) -> &str {
        let nickname = self.nickname.trim();
        if !nickname.is_empty() {
            return nickname;
        }
        let full_name = self.full_name.trim();
        if !full_name.is_empty() {
            return full_name;
        }
        DEFAULT_DISPLAY_NAME
    }

    pub fn to_input(&self) -> ProfileInput {
        ProfileInput {
            full_name: self.full_name.clone(),
            nickname: self.nickname.clone(),
            school: self.school.clone(),
            year: self.year.clone(),
            university: self.university.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            bio: self.bio.clone(),
            photo_path: self.photo_path.clone(),
        }
    }
}

/// Editable profile fields. Every update writes all of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    pub full_name: String,
    pub nickname: String,
    pub school: String,
    pub year: String,
    pub university: String,
    pub email: String,
    pub phone: String,
    pub bio: String,
    pub photo_path: String,
}

impl ProfileInput {
    pub fn trimmed(&self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            nickname: self.nickname.trim().to_string(),
            school: self.school.trim().to_string(),
            year: self.year.trim().to_string(),
            university: self.university.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            bio: self.bio.trim().to_string(),
            photo_path: self.photo_path.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_nickname() {
        let profile = Profile {
            full_name: "Marcia Chiwalo".into(),
            nickname: " Mars ".into(),
            ..Profile::default()
        };
        assert_eq!(profile.display_name(), "Mars");
    }

    #[test]
    fn display_name_falls_back() {
        let mut profile = Profile::default();
        assert_eq!(profile.display_name(), DEFAULT_DISPLAY_NAME);

        profile.full_name = "Marcia Chiwalo".into();
        assert_eq!(profile.display_name(), "Marcia Chiwalo");
    }
}
