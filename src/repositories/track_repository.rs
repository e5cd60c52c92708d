// src/repositories/track_repository.rs
//
// Track persistence. The scanner is the writer here; the query engine
// only reads tracks through their release.

use rusqlite::{params, OptionalExtension, Row};
use std::time::Duration;

use crate::db::{Transaction, WriteTransaction};
use crate::domain::{truncate_name, Artist, ArtistId, ReleaseId, Track, TrackId};
use crate::error::{AppError, AppResult};
use crate::repositories::SqliteArtistRepository;

/// Column list matching `row_to_track`
pub(crate) const TRACK_COLUMNS: &str =
    "t.id, t.release_id, t.name, t.duration_ms, t.disc_number, t.track_number";

pub trait TrackRepository: Send + Sync {
    fn create(
        &self,
        tx: &WriteTransaction<'_>,
        release_id: Option<ReleaseId>,
        name: &str,
        duration: Duration,
    ) -> AppResult<Track>;
    fn get_by_id(&self, tx: &dyn Transaction, id: TrackId) -> AppResult<Option<Track>>;
    fn set_numbers(
        &self,
        tx: &WriteTransaction<'_>,
        id: TrackId,
        disc_number: Option<u32>,
        track_number: Option<u32>,
    ) -> AppResult<()>;
    fn set_release(
        &self,
        tx: &WriteTransaction<'_>,
        id: TrackId,
        release_id: Option<ReleaseId>,
    ) -> AppResult<()>;
    fn add_artist(&self, tx: &WriteTransaction<'_>, id: TrackId, artist_id: ArtistId) -> AppResult<()>;
    fn get_artists(&self, tx: &dyn Transaction, id: TrackId) -> AppResult<Vec<Artist>>;
    fn remove(&self, tx: &WriteTransaction<'_>, id: TrackId) -> AppResult<()>;
}

pub struct SqliteTrackRepository;

impl SqliteTrackRepository {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn row_to_track(row: &Row) -> Result<Track, rusqlite::Error> {
        let duration_ms: i64 = row.get(3)?;

        Ok(Track {
            id: row.get(0)?,
            release_id: row.get(1)?,
            name: row.get(2)?,
            duration: duration_from_millis(duration_ms),
            disc_number: row.get(4)?,
            track_number: row.get(5)?,
        })
    }
}

pub(crate) fn duration_from_millis(ms: i64) -> Duration {
    Duration::from_millis(u64::try_from(ms).unwrap_or(0))
}

fn duration_to_millis(duration: Duration) -> AppResult<i64> {
    i64::try_from(duration.as_millis())
        .map_err(|_| AppError::invalid_argument(format!("track duration {:?} is too long", duration)))
}

impl Default for SqliteTrackRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackRepository for SqliteTrackRepository {
    fn create(
        &self,
        tx: &WriteTransaction<'_>,
        release_id: Option<ReleaseId>,
        name: &str,
        duration: Duration,
    ) -> AppResult<Track> {
        let duration_ms = duration_to_millis(duration)?;
        let name = truncate_name(name, tx.max_name_length());
        let conn = tx.connection();

        conn.execute(
            "INSERT INTO track (release_id, name, duration_ms) VALUES (?1, ?2, ?3)",
            params![release_id, name, duration_ms],
        )?;

        Ok(Track {
            id: TrackId(conn.last_insert_rowid()),
            release_id,
            name,
            duration,
            disc_number: None,
            track_number: None,
        })
    }

    fn get_by_id(&self, tx: &dyn Transaction, id: TrackId) -> AppResult<Option<Track>> {
        let track = tx
            .connection()
            .query_row(
                &format!("SELECT {} FROM track t WHERE t.id = ?1", TRACK_COLUMNS),
                params![id],
                Self::row_to_track,
            )
            .optional()?;

        Ok(track)
    }

    fn set_numbers(
        &self,
        tx: &WriteTransaction<'_>,
        id: TrackId,
        disc_number: Option<u32>,
        track_number: Option<u32>,
    ) -> AppResult<()> {
        let rows_affected = tx.connection().execute(
            "UPDATE track SET disc_number = ?1, track_number = ?2 WHERE id = ?3",
            params![disc_number, track_number, id],
        )?;

        if rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    fn set_release(
        &self,
        tx: &WriteTransaction<'_>,
        id: TrackId,
        release_id: Option<ReleaseId>,
    ) -> AppResult<()> {
        let rows_affected = tx.connection().execute(
            "UPDATE track SET release_id = ?1 WHERE id = ?2",
            params![release_id, id],
        )?;

        if rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    fn add_artist(&self, tx: &WriteTransaction<'_>, id: TrackId, artist_id: ArtistId) -> AppResult<()> {
        tx.connection().execute(
            "INSERT OR IGNORE INTO track_artist (track_id, artist_id) VALUES (?1, ?2)",
            params![id, artist_id],
        )?;

        Ok(())
    }

    fn get_artists(&self, tx: &dyn Transaction, id: TrackId) -> AppResult<Vec<Artist>> {
        let mut stmt = tx.connection().prepare(
            "SELECT a.id, a.name
             FROM artist a
             INNER JOIN track_artist ta ON ta.artist_id = a.id
             WHERE ta.track_id = ?1
             ORDER BY a.name, a.id",
        )?;

        let artists: Vec<Artist> = stmt
            .query_map(params![id], SqliteArtistRepository::row_to_artist)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(artists)
    }

    fn remove(&self, tx: &WriteTransaction<'_>, id: TrackId) -> AppResult<()> {
        let rows_affected = tx
            .connection()
            .execute("DELETE FROM track WHERE id = ?1", params![id])?;

        if rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
