// src/repositories/artist_repository.rs
//
// Artist persistence

use rusqlite::{params, OptionalExtension, Row};

use crate::db::{Transaction, WriteTransaction};
use crate::domain::{truncate_name, Artist, ArtistId};
use crate::error::AppResult;

pub trait ArtistRepository: Send + Sync {
    fn create(&self, tx: &WriteTransaction<'_>, name: &str) -> AppResult<Artist>;
    fn get_by_id(&self, tx: &dyn Transaction, id: ArtistId) -> AppResult<Option<Artist>>;
    fn get_by_name(&self, tx: &dyn Transaction, name: &str) -> AppResult<Option<Artist>>;
}

pub struct SqliteArtistRepository;

impl SqliteArtistRepository {
    pub fn new() -> Self {
        Self
    }

    /// Map `id, name` columns to Artist
    pub(crate) fn row_to_artist(row: &Row) -> Result<Artist, rusqlite::Error> {
        Ok(Artist {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}

impl Default for SqliteArtistRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtistRepository for SqliteArtistRepository {
    fn create(&self, tx: &WriteTransaction<'_>, name: &str) -> AppResult<Artist> {
        let conn = tx.connection();
        let name = truncate_name(name, tx.max_name_length());

        conn.execute("INSERT INTO artist (name) VALUES (?1)", params![name])?;

        Ok(Artist {
            id: ArtistId(conn.last_insert_rowid()),
            name,
        })
    }

    fn get_by_id(&self, tx: &dyn Transaction, id: ArtistId) -> AppResult<Option<Artist>> {
        let artist = tx
            .connection()
            .query_row(
                "SELECT id, name FROM artist WHERE id = ?1",
                params![id],
                Self::row_to_artist,
            )
            .optional()?;

        Ok(artist)
    }

    fn get_by_name(&self, tx: &dyn Transaction, name: &str) -> AppResult<Option<Artist>> {
        let name = truncate_name(name, tx.max_name_length());

        let artist = tx
            .connection()
            .query_row(
                "SELECT id, name FROM artist WHERE name = ?1 ORDER BY id LIMIT 1",
                params![name],
                Self::row_to_artist,
            )
            .optional()?;

        Ok(artist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::test_utils::{open_test_database, open_test_database_with};

    #[test]
    fn test_create_and_lookup() {
        let t = open_test_database();
        let session = t.db.session();
        let repo = SqliteArtistRepository::new();

        let created = session.write(|tx| repo.create(tx, "Nina Simone")).unwrap();

        let (by_id, by_name) = session
            .read(|tx| {
                Ok((
                    repo.get_by_id(tx, created.id)?,
                    repo.get_by_name(tx, "Nina Simone")?,
                ))
            })
            .unwrap();
        assert_eq!(by_id, Some(created.clone()));
        assert_eq!(by_name, Some(created));
    }

    #[test]
    fn test_long_name_truncated_on_both_sides() {
        let t = open_test_database_with(|config| DatabaseConfig {
            max_name_length: 8,
            ..config
        });
        let session = t.db.session();
        let repo = SqliteArtistRepository::new();

        let created = session
            .write(|tx| repo.create(tx, "The Velvet Underground"))
            .unwrap();
        assert_eq!(created.name, "The Velv");

        let found = session
            .read(|tx| repo.get_by_name(tx, "The Velvet Underground & Nico"))
            .unwrap();
        assert_eq!(found.map(|a| a.id), Some(created.id));
    }

    #[test]
    fn test_miss_is_none() {
        let t = open_test_database();
        let session = t.db.session();
        let repo = SqliteArtistRepository::new();

        let found = session.read(|tx| repo.get_by_id(tx, ArtistId(404))).unwrap();
        assert!(found.is_none());
    }
}
