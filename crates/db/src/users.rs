//! Lookups against the auth service's user table.

use sqlx::PgConnection;

/// Read-only access to `auth.users`.
pub struct UserRepo;

impl UserRepo {
    /// Identifier of the user with `username`, rendered as text.
    pub async fn find_id_by_username(
        conn: &mut PgConnection,
        username: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT id::text FROM auth.users WHERE username = $1 LIMIT 1")
            .bind(username)
            .fetch_optional(conn)
            .await
    }
}
