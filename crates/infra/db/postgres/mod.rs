pub mod postgres_connection;
pub mod schema;

#[cfg(test)]
pub(crate) mod test_pool;
