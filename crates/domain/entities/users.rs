use diesel::prelude::*;

use crate::infra::db::postgres::schema::users;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = users)]
pub struct UserEntity {
    pub id: i32,
    pub email: String,
    pub status: String,
}
