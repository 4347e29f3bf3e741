/// Site-wide singletons: the home page video section, the video billboard
/// and the `site_settings` key-value table (logo, site name)
use log::info;
use rusqlite::{params, OptionalExtension, Row};

use super::data::{
    SiteBranding, VideoBillboard, VideoSection, DEFAULT_BILLBOARD_SUBTITLE,
    DEFAULT_BILLBOARD_TITLE, DEFAULT_SITE_NAME,
};
use super::library::{expect_changed, Library};
use crate::error::StoreError;
use crate::ids::now_seconds;

pub const LOGO_URL_KEY: &str = "logo_url";
pub const SITE_NAME_KEY: &str = "site_name";

const VIDEO_SECTION_COLUMNS: &str =
    "id, video_url, poster_url, title, subtitle, autoplay, loop_playback, muted, is_active";

const BILLBOARD_COLUMNS: &str =
    "id, video_url, poster_image_url, title, subtitle, button_text, button_link, is_active";

fn blank_to_none(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Library {
    // ========== Video section ==========

    /// The active video section, `Ok(None)` when none has been saved
    pub fn active_video_section(&self) -> Result<Option<VideoSection>, StoreError> {
        let sql = format!(
            "SELECT {} FROM video_sections WHERE is_active = 1 ORDER BY id LIMIT 1",
            VIDEO_SECTION_COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, [], video_section_from_row)
            .optional()?)
    }

    /// The active section, or the unsaved default the editor starts from
    pub fn video_section_or_default(&self) -> Result<VideoSection, StoreError> {
        Ok(self.active_video_section()?.unwrap_or_default())
    }

    /// Insert the section when it has no id yet, otherwise update it.
    /// A video URL is required. Returns the row id.
    pub fn save_video_section(&self, section: &VideoSection) -> Result<i64, StoreError> {
        if section.video_url.trim().is_empty() {
            return Err(StoreError::InvalidValue {
                field: "video_url",
                value: section.video_url.clone(),
            });
        }

        let id = match section.id {
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE video_sections SET video_url = ?1, poster_url = ?2, title = ?3,
                        subtitle = ?4, autoplay = ?5, loop_playback = ?6, muted = ?7,
                        updated_at = ?8
                     WHERE id = ?9",
                    params![
                        section.video_url.trim(),
                        section.poster_url,
                        section.title,
                        section.subtitle,
                        section.autoplay,
                        section.loop_playback,
                        section.muted,
                        now_seconds(),
                        id,
                    ],
                )?;
                expect_changed(changed, "video section", id)?;
                id
            }
            None => {
                self.conn.execute(
                    "INSERT INTO video_sections
                        (video_url, poster_url, title, subtitle, autoplay, loop_playback,
                         muted, is_active, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)",
                    params![
                        section.video_url.trim(),
                        section.poster_url,
                        section.title,
                        section.subtitle,
                        section.autoplay,
                        section.loop_playback,
                        section.muted,
                        now_seconds(),
                    ],
                )?;
                self.conn.last_insert_rowid()
            }
        };

        info!("video section {} saved", id);
        Ok(id)
    }

    // ========== Video billboard ==========

    pub fn video_billboard(&self) -> Result<Option<VideoBillboard>, StoreError> {
        let sql = format!("SELECT {} FROM video_billboard ORDER BY id LIMIT 1", BILLBOARD_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, [], billboard_from_row)
            .optional()?)
    }

    pub fn video_billboard_or_default(&self) -> Result<VideoBillboard, StoreError> {
        Ok(self.video_billboard()?.unwrap_or_default())
    }

    /// Save the billboard. Blank title and subtitle fall back to the
    /// defaults; other blank fields are stored as NULL.
    pub fn save_video_billboard(&self, billboard: &VideoBillboard) -> Result<i64, StoreError> {
        let title = blank_to_none(Some(billboard.title.as_str()))
            .unwrap_or_else(|| DEFAULT_BILLBOARD_TITLE.to_string());
        let subtitle = blank_to_none(Some(billboard.subtitle.as_str()))
            .unwrap_or_else(|| DEFAULT_BILLBOARD_SUBTITLE.to_string());
        let video_url = blank_to_none(billboard.video_url.as_deref());
        let poster = blank_to_none(billboard.poster_image_url.as_deref());
        let button_text = blank_to_none(billboard.button_text.as_deref());
        let button_link = blank_to_none(billboard.button_link.as_deref());

        match billboard.id {
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE video_billboard SET video_url = ?1, poster_image_url = ?2, title = ?3,
                        subtitle = ?4, button_text = ?5, button_link = ?6, is_active = ?7,
                        updated_at = ?8
                     WHERE id = ?9",
                    params![
                        video_url,
                        poster,
                        title,
                        subtitle,
                        button_text,
                        button_link,
                        billboard.is_active,
                        now_seconds(),
                        id,
                    ],
                )?;
                expect_changed(changed, "video billboard", id)?;
                Ok(id)
            }
            None => {
                self.conn.execute(
                    "INSERT INTO video_billboard
                        (video_url, poster_image_url, title, subtitle, button_text, button_link,
                         is_active, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        video_url,
                        poster,
                        title,
                        subtitle,
                        button_text,
                        button_link,
                        billboard.is_active,
                        now_seconds(),
                    ],
                )?;
                Ok(self.conn.last_insert_rowid())
            }
        }
    }

    // ========== Site settings ==========

    pub fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM site_settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO site_settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now_seconds()],
        )?;
        Ok(())
    }

    /// Logo and site name; a missing or blank name reads as the default
    pub fn site_branding(&self) -> Result<SiteBranding, StoreError> {
        let logo_url = self.get_setting(LOGO_URL_KEY)?.unwrap_or_default();
        let site_name = blank_to_none(self.get_setting(SITE_NAME_KEY)?.as_deref())
            .unwrap_or_else(|| DEFAULT_SITE_NAME.to_string());
        Ok(SiteBranding { logo_url, site_name })
    }

    pub fn save_site_branding(&self, branding: &SiteBranding) -> Result<(), StoreError> {
        self.set_setting(LOGO_URL_KEY, branding.logo_url.trim())?;
        self.set_setting(SITE_NAME_KEY, branding.site_name.trim())
    }
}

fn video_section_from_row(row: &Row<'_>) -> rusqlite::Result<VideoSection> {
    Ok(VideoSection {
        id: Some(row.get(0)?),
        video_url: row.get(1)?,
        poster_url: row.get(2)?,
        title: row.get(3)?,
        subtitle: row.get(4)?,
        autoplay: row.get(5)?,
        loop_playback: row.get(6)?,
        muted: row.get(7)?,
        is_active: row.get(8)?,
    })
}

fn billboard_from_row(row: &Row<'_>) -> rusqlite::Result<VideoBillboard> {
    Ok(VideoBillboard {
        id: Some(row.get(0)?),
        video_url: row.get(1)?,
        poster_image_url: row.get(2)?,
        title: row.get(3)?,
        subtitle: row.get(4)?,
        button_text: row.get(5)?,
        button_link: row.get(6)?,
        is_active: row.get(7)?,
    })
}
