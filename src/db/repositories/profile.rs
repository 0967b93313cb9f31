use anyhow::Result;
use chrono::Local;
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{format_timestamp, parse_optional_timestamp},
    models::{Profile, ProfileInput},
};

fn row_to_profile(row: &Row) -> Result<Profile> {
    let updated_at: Option<String> = row.get("updated_at")?;

    Ok(Profile {
        full_name: row.get("full_name")?,
        nickname: row.get("nickname")?,
        school: row.get("school")?,
        year: row.get("year")?,
        university: row.get("university")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        bio: row.get("bio")?,
        photo_path: row.get("photo_path")?,
        updated_at: parse_optional_timestamp(updated_at, "updated_at")?,
    })
}

impl Database {
    /// The stored profile, or an empty one if the row is missing.
    pub async fn profile(&self) -> Result<Profile> {
        self.execute("load profile", |conn| {
            let profile = conn
                .query_row(
                    "SELECT full_name, nickname, school, year, university, email, phone, bio, photo_path, updated_at
                     FROM profile
                     WHERE id = 1",
                    [],
                    |row| Ok(row_to_profile(row)),
                )
                .optional()?
                .transpose()?;
            Ok(profile.unwrap_or_default())
        })
        .await
    }

    /// Overwrites every profile field and stamps `updated_at`.
    pub async fn update_profile(&self, input: &ProfileInput) -> Result<Profile> {
        let input = input.trimmed();
        self.execute("update profile", move |conn| {
            let updated_at = Local::now().naive_local();
            conn.execute(
                "INSERT INTO profile (id, full_name, nickname, school, year, university, email, phone, bio, photo_path, updated_at)
                 VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(id) DO UPDATE SET
                     full_name = excluded.full_name,
                     nickname = excluded.nickname,
                     school = excluded.school,
                     year = excluded.year,
                     university = excluded.university,
                     email = excluded.email,
                     phone = excluded.phone,
                     bio = excluded.bio,
                     photo_path = excluded.photo_path,
                     updated_at = excluded.updated_at",
                params![
                    input.full_name,
                    input.nickname,
                    input.school,
                    input.year,
                    input.university,
                    input.email,
                    input.phone,
                    input.bio,
                    input.photo_path,
                    format_timestamp(&updated_at),
                ],
            )?;

            let profile = conn.query_row(
                "SELECT full_name, nickname, school, year, university, email, phone, bio, photo_path, updated_at
                 FROM profile
                 WHERE id = 1",
                [],
                |row| Ok(row_to_profile(row)),
            )??;
            Ok(profile)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::DEFAULT_DISPLAY_NAME;
    use tempfile::tempdir;

    #[tokio::test]
    async fn fresh_profile_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let db = Database::new(dir.path().join("study.sqlite3"))?;

        let profile = db.profile().await?;
        assert_eq!(profile.full_name, "");
        assert_eq!(profile.updated_at, None);
        assert_eq!(profile.display_name(), DEFAULT_DISPLAY_NAME);
        Ok(())
    }

    #[tokio::test]
    async fn update_overwrites_fields_and_stamps_time() -> Result<()> {
        let dir = tempdir()?;
        let db = Database::new(dir.path().join("study.sqlite3"))?;

        let input = ProfileInput {
            full_name: " Marcia Chiwalo ".into(),
            school: "KUHES".into(),
            year: "Final Year".into(),
            ..ProfileInput::default()
        };
        let saved = db.update_profile(&input).await?;
        assert_eq!(saved.full_name, "Marcia Chiwalo");
        assert!(saved.updated_at.is_some());

        let mut next = saved.to_input();
        next.school = String::new();
        next.nickname = "Mars".into();
        db.update_profile(&next).await?;

        let loaded = db.profile().await?;
        assert_eq!(loaded.school, "");
        assert_eq!(loaded.year, "Final Year");
        assert_eq!(loaded.display_name(), "Mars");
        Ok(())
    }

    #[tokio::test]
    async fn missing_row_is_recreated_on_update() -> Result<()> {
        let dir = tempdir()?;
        let db = Database::new(dir.path().join("study.sqlite3"))?;
        db.execute("drop profile row", |conn| {
            conn.execute("DELETE FROM profile", [])?;
            Ok(())
        })
        .await?;

        assert_eq!(db.profile().await?, Profile::default());

        let input = ProfileInput {
            email: "name@email.com".into(),
            ..ProfileInput::default()
        };
        assert_eq!(db.update_profile(&input).await?.email, "name@email.com");
        Ok(())
    }
}
