use anyhow::{Result, anyhow};
use diesel::{
    PgConnection,
    r2d2::{ConnectionManager, Pool},
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

pub type PgPoolSquad = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub fn establish_connection(database_url: &str) -> Result<PgPoolSquad> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder().build(manager)?;
    Ok(pool)
}

/// Applies any embedded migration the database has not seen yet.
pub fn run_migrations(pool: &PgPoolSquad) -> Result<()> {
    let mut conn = pool.get()?;

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| anyhow!("failed to run database migrations: {err}"))?;

    for version in &applied {
        info!(%version, "postgres: migration applied");
    }

    Ok(())
}
