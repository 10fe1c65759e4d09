//! Pools for repository tests. Each pool holds a single connection inside a
//! test transaction, so everything a test writes is rolled back with the pool.

use std::sync::{Arc, Once};

use diesel::{
    Connection, PgConnection, RunQueryDsl, insert_into,
    prelude::*,
    r2d2::{ConnectionManager, CustomizeConnection, Pool},
};

use super::postgres_connection::{PgPoolSquad, establish_connection, run_migrations};
use super::schema::users;

static MIGRATE: Once = Once::new();

#[derive(Debug)]
struct TestTransaction;

impl CustomizeConnection<PgConnection, diesel::r2d2::Error> for TestTransaction {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), diesel::r2d2::Error> {
        conn.begin_test_transaction()
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// `None` when `DATABASE_URL` is not set; callers skip in that case.
pub(crate) fn test_pool() -> Option<Arc<PgPoolSquad>> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").ok()?;

    MIGRATE.call_once(|| {
        let pool = establish_connection(&database_url).unwrap();
        run_migrations(&pool).unwrap();
    });

    let pool = Pool::builder()
        .max_size(1)
        .connection_customizer(Box::new(TestTransaction))
        .build(ConnectionManager::<PgConnection>::new(database_url))
        .unwrap();
    Some(Arc::new(pool))
}

pub(crate) fn insert_user(pool: &PgPoolSquad, email: &str, status: &str) -> i32 {
    let mut conn = pool.get().unwrap();
    insert_into(users::table)
        .values((users::email.eq(email), users::status.eq(status)))
        .returning(users::id)
        .get_result::<i32>(&mut conn)
        .unwrap()
}
