// src/repositories/release_repository.rs
//
// Release queries
//
// Every operation runs inside a transaction the caller opened; the
// repository never takes a connection or a lock on its own. Writes
// take a WriteTransaction, so they cannot be issued from a read.

use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::db::{Transaction, WriteTransaction};
use crate::domain::{
    truncate_name, validate_total_disc, validate_year, Artist, ArtistId, Cluster, ClusterId,
    ClusterTypeId, Release, ReleaseId, Track, NONE_RELEASE_NAME,
};
use crate::error::{AppError, AppResult};
use crate::repositories::track_repository::{duration_from_millis, TRACK_COLUMNS};
use crate::repositories::{SqliteArtistRepository, SqliteClusterRepository, SqliteTrackRepository};

/// Column list matching `row_to_release`
const RELEASE_COLUMNS: &str = "r.id, r.name, r.year, r.original_year, r.total_disc";

/// Listing order. Without it pages would follow storage order and
/// shift between calls.
const RELEASE_ORDER: &str = "ORDER BY r.name, r.id";

pub trait ReleaseRepository: Send + Sync {
    fn get_by_id(&self, tx: &dyn Transaction, id: ReleaseId) -> AppResult<Option<Release>>;
    fn get_by_name(&self, tx: &dyn Transaction, name: &str) -> AppResult<Option<Release>>;
    fn get_none(&self, tx: &WriteTransaction<'_>) -> AppResult<Release>;
    fn create(&self, tx: &WriteTransaction<'_>, name: &str) -> AppResult<Release>;
    fn get_all(
        &self,
        tx: &dyn Transaction,
        artist_ids: &[ArtistId],
        offset: usize,
        size: usize,
    ) -> AppResult<Vec<Release>>;
    fn get_duration(&self, tx: &dyn Transaction, id: ReleaseId) -> AppResult<Duration>;
    fn get_all_orphans(&self, tx: &dyn Transaction) -> AppResult<Vec<Release>>;
    fn count(&self, tx: &dyn Transaction) -> AppResult<i64>;

    fn get_tracks(&self, tx: &dyn Transaction, id: ReleaseId) -> AppResult<Vec<Track>>;
    fn get_release_artists(&self, tx: &dyn Transaction, id: ReleaseId) -> AppResult<Vec<Artist>>;
    fn get_artists(&self, tx: &dyn Transaction, id: ReleaseId) -> AppResult<Vec<Artist>>;
    fn has_various_artists(&self, tx: &dyn Transaction, id: ReleaseId) -> AppResult<bool>;
    fn get_display_artists(&self, tx: &dyn Transaction, id: ReleaseId) -> AppResult<Vec<Artist>>;
    fn get_cluster_groups(
        &self,
        tx: &dyn Transaction,
        id: ReleaseId,
        cluster_type_ids: &[ClusterTypeId],
        size: usize,
    ) -> AppResult<Vec<Vec<Cluster>>>;

    fn set_years(
        &self,
        tx: &WriteTransaction<'_>,
        id: ReleaseId,
        year: Option<i32>,
        original_year: Option<i32>,
    ) -> AppResult<()>;
    fn set_total_disc(
        &self,
        tx: &WriteTransaction<'_>,
        id: ReleaseId,
        total_disc: Option<u32>,
    ) -> AppResult<()>;
    fn add_release_artist(
        &self,
        tx: &WriteTransaction<'_>,
        id: ReleaseId,
        artist_id: ArtistId,
    ) -> AppResult<()>;
    fn add_cluster(
        &self,
        tx: &WriteTransaction<'_>,
        id: ReleaseId,
        cluster_id: ClusterId,
    ) -> AppResult<()>;
    fn remove(&self, tx: &WriteTransaction<'_>, id: ReleaseId) -> AppResult<()>;
}

pub struct SqliteReleaseRepository;

impl SqliteReleaseRepository {
    pub fn new() -> Self {
        Self
    }

    fn row_to_release(row: &Row) -> Result<Release, rusqlite::Error> {
        Ok(Release {
            id: row.get(0)?,
            name: row.get(1)?,
            year: row.get(2)?,
            original_year: row.get(3)?,
            total_disc: row.get(4)?,
        })
    }

    fn query_releases(
        tx: &dyn Transaction,
        sql: &str,
        values: impl IntoIterator<Item = i64>,
    ) -> AppResult<Vec<Release>> {
        let mut stmt = tx.connection().prepare(sql)?;

        let releases: Vec<Release> = stmt
            .query_map(params_from_iter(values), Self::row_to_release)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(releases)
    }

    fn query_artists(tx: &dyn Transaction, sql: &str, id: ReleaseId) -> AppResult<Vec<Artist>> {
        let mut stmt = tx.connection().prepare(sql)?;

        let artists: Vec<Artist> = stmt
            .query_map(params![id], SqliteArtistRepository::row_to_artist)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(artists)
    }

    /// Exact-name lookup, lowest id first
    fn find_named(tx: &dyn Transaction, name: &str) -> AppResult<Option<Release>> {
        let release = tx
            .connection()
            .query_row(
                &format!(
                    "SELECT {} FROM release r WHERE r.name = ?1 ORDER BY r.id LIMIT 1",
                    RELEASE_COLUMNS
                ),
                params![name],
                Self::row_to_release,
            )
            .optional()?;

        Ok(release)
    }

    fn insert_named(tx: &WriteTransaction<'_>, name: String) -> AppResult<Release> {
        let conn = tx.connection();
        conn.execute("INSERT INTO release (name) VALUES (?1)", params![name])?;

        Ok(Release {
            id: ReleaseId(conn.last_insert_rowid()),
            name,
            year: None,
            original_year: None,
            total_disc: None,
        })
    }

    fn expect_updated(rows_affected: usize) -> AppResult<()> {
        if rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

impl Default for SqliteReleaseRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject page parameters the store cannot represent
fn check_page(offset: usize, size: usize) -> AppResult<(i64, i64)> {
    if size == 0 {
        return Err(AppError::invalid_argument("page size must be at least 1"));
    }
    let size = i64::try_from(size)
        .map_err(|_| AppError::invalid_argument(format!("page size {} is too large", size)))?;
    let offset = i64::try_from(offset)
        .map_err(|_| AppError::invalid_argument(format!("page offset {} is too large", offset)))?;
    Ok((offset, size))
}

impl ReleaseRepository for SqliteReleaseRepository {
    fn get_by_id(&self, tx: &dyn Transaction, id: ReleaseId) -> AppResult<Option<Release>> {
        let release = tx
            .connection()
            .query_row(
                &format!("SELECT {} FROM release r WHERE r.id = ?1", RELEASE_COLUMNS),
                params![id],
                Self::row_to_release,
            )
            .optional()?;

        Ok(release)
    }

    fn get_by_name(&self, tx: &dyn Transaction, name: &str) -> AppResult<Option<Release>> {
        let name = truncate_name(name, tx.max_name_length());
        Self::find_named(tx, &name)
    }

    /// The placeholder release, created on first use.
    /// The exclusive lock keeps two first callers from both creating it.
    /// Its name is reserved and never truncated.
    fn get_none(&self, tx: &WriteTransaction<'_>) -> AppResult<Release> {
        if let Some(release) = Self::find_named(tx, NONE_RELEASE_NAME)? {
            return Ok(release);
        }

        log::debug!("Creating placeholder release");
        Self::insert_named(tx, NONE_RELEASE_NAME.to_string())
    }

    fn create(&self, tx: &WriteTransaction<'_>, name: &str) -> AppResult<Release> {
        let name = truncate_name(name, tx.max_name_length());
        Self::insert_named(tx, name)
    }

    /// A window of releases, optionally restricted to those with at
    /// least one track by ANY of `artist_ids`. Each release appears once.
    fn get_all(
        &self,
        tx: &dyn Transaction,
        artist_ids: &[ArtistId],
        offset: usize,
        size: usize,
    ) -> AppResult<Vec<Release>> {
        let (offset, size) = check_page(offset, size)?;

        if artist_ids.is_empty() {
            let sql = format!(
                "SELECT {} FROM release r {} LIMIT ?1 OFFSET ?2",
                RELEASE_COLUMNS, RELEASE_ORDER
            );
            return Self::query_releases(tx, &sql, [size, offset]);
        }

        let ids: BTreeSet<i64> = artist_ids.iter().map(|id| id.value()).collect();
        let placeholders = vec!["?"; ids.len()].join(", ");

        let sql = format!(
            "SELECT {columns}
             FROM release r
             INNER JOIN track t ON t.release_id = r.id
             INNER JOIN track_artist ta ON ta.track_id = t.id
             INNER JOIN artist a ON a.id = ta.artist_id
             WHERE a.id IN ({placeholders})
             GROUP BY r.id
             {order}
             LIMIT ? OFFSET ?",
            columns = RELEASE_COLUMNS,
            placeholders = placeholders,
            order = RELEASE_ORDER,
        );

        Self::query_releases(tx, &sql, ids.into_iter().chain([size, offset]))
    }

    fn get_duration(&self, tx: &dyn Transaction, id: ReleaseId) -> AppResult<Duration> {
        let total_ms: i64 = tx.connection().query_row(
            "SELECT COALESCE(SUM(duration_ms), 0) FROM track WHERE release_id = ?1",
            params![id],
            |row| row.get(0),
        )?;

        Ok(duration_from_millis(total_ms))
    }

    /// Releases no track points at, via an anti-join
    fn get_all_orphans(&self, tx: &dyn Transaction) -> AppResult<Vec<Release>> {
        let sql = format!(
            "SELECT {}
             FROM release r
             LEFT OUTER JOIN track t ON t.release_id = r.id
             WHERE t.id IS NULL
             {}",
            RELEASE_COLUMNS, RELEASE_ORDER
        );

        Self::query_releases(tx, &sql, [])
    }

    fn count(&self, tx: &dyn Transaction) -> AppResult<i64> {
        let count = tx
            .connection()
            .query_row("SELECT COUNT(*) FROM release", [], |row| row.get(0))?;

        Ok(count)
    }

    fn get_tracks(&self, tx: &dyn Transaction, id: ReleaseId) -> AppResult<Vec<Track>> {
        let mut stmt = tx.connection().prepare(&format!(
            "SELECT {} FROM track t
             WHERE t.release_id = ?1
             ORDER BY t.disc_number, t.track_number, t.id",
            TRACK_COLUMNS
        ))?;

        let tracks: Vec<Track> = stmt
            .query_map(params![id], SqliteTrackRepository::row_to_track)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tracks)
    }

    fn get_release_artists(&self, tx: &dyn Transaction, id: ReleaseId) -> AppResult<Vec<Artist>> {
        Self::query_artists(
            tx,
            "SELECT a.id, a.name
             FROM artist a
             INNER JOIN release_artist ra ON ra.artist_id = a.id
             WHERE ra.release_id = ?1
             ORDER BY a.name, a.id",
            id,
        )
    }

    /// Distinct track-level artists
    fn get_artists(&self, tx: &dyn Transaction, id: ReleaseId) -> AppResult<Vec<Artist>> {
        Self::query_artists(
            tx,
            "SELECT DISTINCT a.id, a.name
             FROM artist a
             INNER JOIN track_artist ta ON ta.artist_id = a.id
             INNER JOIN track t ON t.id = ta.track_id
             WHERE t.release_id = ?1
             ORDER BY a.name, a.id",
            id,
        )
    }

    fn has_various_artists(&self, tx: &dyn Transaction, id: ReleaseId) -> AppResult<bool> {
        let artist_count: i64 = tx.connection().query_row(
            "SELECT COUNT(DISTINCT ta.artist_id)
             FROM track t
             INNER JOIN track_artist ta ON ta.track_id = t.id
             WHERE t.release_id = ?1",
            params![id],
            |row| row.get(0),
        )?;

        Ok(artist_count > 1)
    }

    /// Release artists when tagged, the track artists otherwise
    fn get_display_artists(&self, tx: &dyn Transaction, id: ReleaseId) -> AppResult<Vec<Artist>> {
        let release_artists = self.get_release_artists(tx, id)?;
        if !release_artists.is_empty() {
            return Ok(release_artists);
        }
        self.get_artists(tx, id)
    }

    /// One group per requested cluster type, in the order asked for,
    /// each holding at most `size` clusters. Empty groups are left out.
    fn get_cluster_groups(
        &self,
        tx: &dyn Transaction,
        id: ReleaseId,
        cluster_type_ids: &[ClusterTypeId],
        size: usize,
    ) -> AppResult<Vec<Vec<Cluster>>> {
        let (_, size) = check_page(0, size)?;

        let mut stmt = tx.connection().prepare(
            "SELECT c.id, c.cluster_type_id, c.name
             FROM cluster c
             INNER JOIN release_cluster rc ON rc.cluster_id = c.id
             WHERE rc.release_id = ?1 AND c.cluster_type_id = ?2
             ORDER BY c.name, c.id
             LIMIT ?3",
        )?;

        let mut groups = Vec::new();
        for cluster_type_id in cluster_type_ids {
            let clusters: Vec<Cluster> = stmt
                .query_map(
                    params![id, cluster_type_id, size],
                    SqliteClusterRepository::row_to_cluster,
                )?
                .collect::<Result<Vec<_>, _>>()?;

            if !clusters.is_empty() {
                groups.push(clusters);
            }
        }

        Ok(groups)
    }

    fn set_years(
        &self,
        tx: &WriteTransaction<'_>,
        id: ReleaseId,
        year: Option<i32>,
        original_year: Option<i32>,
    ) -> AppResult<()> {
        validate_year(year)?;
        validate_year(original_year)?;

        let rows_affected = tx.connection().execute(
            "UPDATE release SET year = ?1, original_year = ?2 WHERE id = ?3",
            params![year, original_year, id],
        )?;

        Self::expect_updated(rows_affected)
    }

    fn set_total_disc(
        &self,
        tx: &WriteTransaction<'_>,
        id: ReleaseId,
        total_disc: Option<u32>,
    ) -> AppResult<()> {
        validate_total_disc(total_disc)?;

        let rows_affected = tx.connection().execute(
            "UPDATE release SET total_disc = ?1 WHERE id = ?2",
            params![total_disc, id],
        )?;

        Self::expect_updated(rows_affected)
    }

    fn add_release_artist(
        &self,
        tx: &WriteTransaction<'_>,
        id: ReleaseId,
        artist_id: ArtistId,
    ) -> AppResult<()> {
        tx.connection().execute(
            "INSERT OR IGNORE INTO release_artist (release_id, artist_id) VALUES (?1, ?2)",
            params![id, artist_id],
        )?;

        Ok(())
    }

    fn add_cluster(
        &self,
        tx: &WriteTransaction<'_>,
        id: ReleaseId,
        cluster_id: ClusterId,
    ) -> AppResult<()> {
        tx.connection().execute(
            "INSERT OR IGNORE INTO release_cluster (release_id, cluster_id) VALUES (?1, ?2)",
            params![id, cluster_id],
        )?;

        Ok(())
    }

    /// Tracks that pointed at the release are detached, not deleted
    fn remove(&self, tx: &WriteTransaction<'_>, id: ReleaseId) -> AppResult<()> {
        let rows_affected = tx
            .connection()
            .execute("DELETE FROM release WHERE id = ?1", params![id])?;

        Self::expect_updated(rows_affected)
    }
}
