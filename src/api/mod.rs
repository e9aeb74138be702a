//! HTTP handlers. Each handler checks the caller's capabilities first, then
//! delegates to [`crate::db`] and the pure rules in [`crate::vacation`].

pub mod dashboard;
pub mod department;
pub mod employee;
pub mod user;
pub mod vacation;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Body of every error response, and of plain acknowledgements.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Employee deactivated")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// Normalized `(page, per_page, offset)`; pages are 1-based.
pub fn page_bounds(page: Option<u32>, per_page: Option<u32>) -> (u32, u32, u64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    let offset = u64::from(page - 1) * u64::from(per_page);
    (page, per_page, offset)
}

/// Tells an absent field (`None`) apart from an explicit `null` (`Some(None)`).
/// Use with `#[serde(default, deserialize_with = "...")]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds() {
        assert_eq!(page_bounds(None, None), (1, 20, 0));
        assert_eq!(page_bounds(Some(3), Some(10)), (3, 10, 20));
        assert_eq!(page_bounds(Some(0), Some(1000)), (1, 100, 0));
    }

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        head_id: Option<Option<u64>>,
    }

    #[test]
    fn test_double_option() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let cleared: Patch = serde_json::from_str(r#"{"head_id": null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"head_id": 4}"#).unwrap();
        assert_eq!(absent.head_id, None);
        assert_eq!(cleared.head_id, Some(None));
        assert_eq!(set.head_id, Some(Some(4)));
    }
}
