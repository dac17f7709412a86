/// Remote job identifiers are opaque strings assigned by the video service.
pub type JobId = String;

/// The video service reports timestamps as Unix seconds.
pub type UnixSeconds = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Convert Unix seconds into a [`Timestamp`], or `None` when out of range.
pub fn timestamp_from_unix(secs: UnixSeconds) -> Option<Timestamp> {
    chrono::DateTime::from_timestamp(secs, 0)
}
