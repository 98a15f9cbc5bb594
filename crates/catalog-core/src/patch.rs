use serde::{Deserialize, Deserializer};

/// Deserializer for `Option<Option<T>>` PATCH fields.
///
/// Paired with `#[serde(default)]`: an absent key stays `None` (keep current),
/// an explicit `null` becomes `Some(None)` (clear), a value becomes `Some(Some(v))`.
///
/// # Errors
///
/// Propagates the inner type's deserialization error.
#[allow(clippy::option_option)]
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trims `value` and maps an empty result to `None`.
#[must_use]
pub fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}
