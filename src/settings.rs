use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::error::ValidationError;

pub const MIN_DAILY_GOAL_MINUTES: u32 = 10;
pub const MAX_DAILY_GOAL_MINUTES: u32 = 1440;
pub const SESSION_TARGET_CHOICES: [u32; 7] = [15, 25, 30, 45, 60, 90, 120];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StudySettings {
    pub daily_goal_minutes: u32,
    pub exam_date: Option<NaiveDate>,
    pub session_target_minutes: u32,
    pub activities: Vec<String>,
}

impl Default for StudySettings {
    fn default() -> Self {
        Self {
            daily_goal_minutes: 60,
            exam_date: None,
            session_target_minutes: 25,
            activities: ["Study", "Ward", "Lecture", "Break", "Sleep"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl StudySettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_DAILY_GOAL_MINUTES..=MAX_DAILY_GOAL_MINUTES).contains(&self.daily_goal_minutes) {
            return Err(ValidationError::OutOfRange {
                field: "daily goal (minutes)",
                min: MIN_DAILY_GOAL_MINUTES,
                max: MAX_DAILY_GOAL_MINUTES,
                value: self.daily_goal_minutes,
            });
        }
        validate_session_target(self.session_target_minutes)?;
        if self.activities.iter().any(|a| a.trim().is_empty()) {
            return Err(ValidationError::EmptyActivity);
        }
        Ok(())
    }
}

pub fn validate_session_target(minutes: u32) -> Result<(), ValidationError> {
    if SESSION_TARGET_CHOICES.contains(&minutes) {
        return Ok(());
    }
    Err(ValidationError::UnknownTarget(minutes))
}

/// User settings persisted as pretty JSON next to the database.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<StudySettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str::<StudySettings>(&contents) {
                Ok(settings) if settings.validate().is_ok() => settings,
                Ok(_) | Err(_) => {
                    warn!(
                        "Ignoring unreadable or invalid settings at {}; using defaults",
                        path.display()
                    );
                    StudySettings::default()
                }
            }
        } else {
            StudySettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> StudySettings {
        self.read().clone()
    }

    /// Applies `change` to a copy, validates it and only then persists it.
    pub fn update<F>(&self, change: F) -> Result<StudySettings>
    where
        F: FnOnce(&mut StudySettings),
    {
        let mut guard = self.write();
        let mut next = guard.clone();
        change(&mut next);
        next.validate()?;
        self.persist(&next)?;
        *guard = next.clone();
        Ok(next)
    }

    fn persist(&self, data: &StudySettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, StudySettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StudySettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
