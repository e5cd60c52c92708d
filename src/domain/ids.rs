// src/domain/ids.rs
//
// Typed row identifiers
//
// Every catalog table uses an INTEGER PRIMARY KEY. Wrapping it keeps a
// TrackId from being passed where a ReleaseId is expected.

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn value(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                i64::column_result(value).map($name)
            }
        }
    };
}

id_type!(
    /// Identifier of a row in `release`
    ReleaseId
);
id_type!(
    /// Identifier of a row in `track`
    TrackId
);
id_type!(
    /// Identifier of a row in `artist`
    ArtistId
);
id_type!(
    /// Identifier of a row in `cluster`
    ClusterId
);
id_type!(
    /// Identifier of a row in `cluster_type`
    ClusterTypeId
);
id_type!(
    /// Identifier of a row in `user`
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_id_binds_and_reads_back() {
        let conn = Connection::open_in_memory().unwrap();
        let id: ReleaseId = conn
            .query_row("SELECT ?1", [ReleaseId(42)], |row| row.get(0))
            .unwrap();
        assert_eq!(id, ReleaseId(42));
        assert_eq!(id.to_string(), "42");
    }
}
