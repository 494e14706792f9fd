use serde::{Deserialize, Serialize};

/// Outer envelope of every successful response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub status: String,
    pub data: T,
    #[serde(default)]
    pub message: String,
}

/// Body of a non-200 response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ApiErrorBody {
    pub message: String,
    pub status: String,
}

/// Cursor-based paging block shared by list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paging {
    pub has_next_page: bool,
    pub total_rows_in_page: i64,
    /// Opaque cursor for the next page, empty on the last page.
    pub next_object: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_unwraps_data() {
        let resp: ApiResponse<Vec<u8>> =
            serde_json::from_value(json!({"status": "ok", "data": [1, 2]})).unwrap();
        assert_eq!(resp.status, "ok");
        assert_eq!(resp.data, vec![1, 2]);
        assert_eq!(resp.message, "");
    }

    #[test]
    fn paging_defaults() {
        let paging: Paging = serde_json::from_value(json!({"has_next_page": true})).unwrap();
        assert!(paging.has_next_page);
        assert_eq!(paging.next_object, "");
    }
}
