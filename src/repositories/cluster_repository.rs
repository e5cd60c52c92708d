// src/repositories/cluster_repository.rs
//
// Cluster and cluster type persistence

use rusqlite::{params, OptionalExtension, Row};

use crate::db::{Transaction, WriteTransaction};
use crate::domain::{truncate_name, Cluster, ClusterId, ClusterType, ClusterTypeId};
use crate::error::AppResult;

pub trait ClusterRepository: Send + Sync {
    fn create_type(&self, tx: &WriteTransaction<'_>, name: &str) -> AppResult<ClusterType>;
    fn get_type_by_name(&self, tx: &dyn Transaction, name: &str) -> AppResult<Option<ClusterType>>;
    fn list_types(&self, tx: &dyn Transaction) -> AppResult<Vec<ClusterType>>;
    fn create(
        &self,
        tx: &WriteTransaction<'_>,
        cluster_type_id: ClusterTypeId,
        name: &str,
    ) -> AppResult<Cluster>;
    fn get_by_id(&self, tx: &dyn Transaction, id: ClusterId) -> AppResult<Option<Cluster>>;
}

pub struct SqliteClusterRepository;

impl SqliteClusterRepository {
    pub fn new() -> Self {
        Self
    }

    /// Map `id, cluster_type_id, name` columns to Cluster
    pub(crate) fn row_to_cluster(row: &Row) -> Result<Cluster, rusqlite::Error> {
        Ok(Cluster {
            id: row.get(0)?,
            cluster_type_id: row.get(1)?,
            name: row.get(2)?,
        })
    }

    fn row_to_cluster_type(row: &Row) -> Result<ClusterType, rusqlite::Error> {
        Ok(ClusterType {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}

impl Default for SqliteClusterRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterRepository for SqliteClusterRepository {
    fn create_type(&self, tx: &WriteTransaction<'_>, name: &str) -> AppResult<ClusterType> {
        let conn = tx.connection();
        let name = truncate_name(name, tx.max_name_length());

        conn.execute("INSERT INTO cluster_type (name) VALUES (?1)", params![name])?;

        Ok(ClusterType {
            id: ClusterTypeId(conn.last_insert_rowid()),
            name,
        })
    }

    fn get_type_by_name(&self, tx: &dyn Transaction, name: &str) -> AppResult<Option<ClusterType>> {
        let name = truncate_name(name, tx.max_name_length());

        let cluster_type = tx
            .connection()
            .query_row(
                "SELECT id, name FROM cluster_type WHERE name = ?1",
                params![name],
                Self::row_to_cluster_type,
            )
            .optional()?;

        Ok(cluster_type)
    }

    fn list_types(&self, tx: &dyn Transaction) -> AppResult<Vec<ClusterType>> {
        let mut stmt = tx
            .connection()
            .prepare("SELECT id, name FROM cluster_type ORDER BY name")?;

        let types: Vec<ClusterType> = stmt
            .query_map([], Self::row_to_cluster_type)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(types)
    }

    fn create(
        &self,
        tx: &WriteTransaction<'_>,
        cluster_type_id: ClusterTypeId,
        name: &str,
    ) -> AppResult<Cluster> {
        let conn = tx.connection();
        let name = truncate_name(name, tx.max_name_length());

        conn.execute(
            "INSERT INTO cluster (cluster_type_id, name) VALUES (?1, ?2)",
            params![cluster_type_id, name],
        )?;

        Ok(Cluster {
            id: ClusterId(conn.last_insert_rowid()),
            cluster_type_id,
            name,
        })
    }

    fn get_by_id(&self, tx: &dyn Transaction, id: ClusterId) -> AppResult<Option<Cluster>> {
        let cluster = tx
            .connection()
            .query_row(
                "SELECT id, cluster_type_id, name FROM cluster WHERE id = ?1",
                params![id],
                Self::row_to_cluster,
            )
            .optional()?;

        Ok(cluster)
    }
}
