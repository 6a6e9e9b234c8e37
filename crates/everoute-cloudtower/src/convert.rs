//! Small conversions shared by the mappers

/// `"22, 80"` → `["22", "80"]`. Blank pieces are dropped.
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Current unix timestamp, used as the id of data source results
pub fn timestamp_id() -> String {
    chrono::Utc::now().timestamp().to_string()
}
