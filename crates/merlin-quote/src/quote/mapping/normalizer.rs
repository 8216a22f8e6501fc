/// Lookup key for raw field names and subtype values: questionnaire variants such as
/// `roomCount`, `room_count` and `Room Count` all collapse to `roomcount`.
pub fn normalize_key(value: &str) -> String {
    value
        .replace(['\u{feff}', '\u{200b}'], "")
        .chars()
        .filter(|ch| ch.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
