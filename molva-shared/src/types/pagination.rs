use serde::Deserialize;

/// Offset pagination over a fixed sort order. Not a stable cursor: rows
/// inserted while a client pages can shift or repeat entries across page
/// boundaries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageParams {
    /// Clamp to a usable window: limit in [1, 100], offset never negative.
    pub fn clamp(&self, default_limit: i64) -> (i64, i64) {
        let limit = self.limit.unwrap_or(default_limit).clamp(1, 100);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// Default page size for the message scrollback.
pub const MESSAGE_PAGE_LIMIT: i64 = 10;

/// Default page size for activity log reads.
pub const ACTIVITY_PAGE_LIMIT: i64 = 50;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let params = PageParams::default();
        assert_eq!(params.clamp(MESSAGE_PAGE_LIMIT), (10, 0));
        assert_eq!(params.clamp(ACTIVITY_PAGE_LIMIT), (50, 0));
    }

    #[test]
    fn limit_clamps_to_window() {
        let params = PageParams { limit: Some(0), offset: None };
        assert_eq!(params.clamp(10).0, 1);

        let params = PageParams { limit: Some(1000), offset: None };
        assert_eq!(params.clamp(10).0, 100);
    }

    #[test]
    fn negative_offset_clamps_to_zero() {
        let params = PageParams { limit: Some(10), offset: Some(-5) };
        assert_eq!(params.clamp(10), (10, 0));
    }

    #[test]
    fn in_range_values_pass_through() {
        let params = PageParams { limit: Some(25), offset: Some(50) };
        assert_eq!(params.clamp(10), (25, 50));
    }
}
