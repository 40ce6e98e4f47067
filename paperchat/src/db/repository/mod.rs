mod messages;
mod papers;
mod sessions;

pub use messages::MessageRepository;
pub use papers::PaperRepository;
pub use sessions::SessionRepository;

use chrono::{DateTime, SecondsFormat, Utc};

/// Fixed-width RFC 3339 so stored timestamps sort lexicographically.
pub(crate) fn to_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
pub(crate) async fn setup_test_db() -> libsql::Connection {
    let conn = libsql::Builder::new_local(":memory:")
        .build()
        .await
        .unwrap()
        .connect()
        .unwrap();
    crate::db::schema::init_schema(&conn).await.unwrap();
    conn
}
