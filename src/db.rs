use rocket_db_pools::{sqlx, Database};

/// Pooled Postgres connection configured under `databases.digest_db`.
#[derive(Database)]
#[database("digest_db")]
pub struct DigestDb(sqlx::PgPool);
