//! Cursor pagination shared by the record feed and the user listing.
//!
//! The protocol: fetch one row more than the requested page size. If the
//! extra row came back, its id becomes `next_cursor` and the next scan
//! resumes *at* that row (it is the first row of the next page). With no
//! extra row the page is the last one and `next_cursor` stays empty. As long
//! as no rows are inserted or removed between calls, every row shows up in
//! exactly one page.

use uuid::Uuid;

use crate::error::{AppError, Result};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Resolve a requested page size against the protocol bounds.
///
/// Out-of-range values are rejected rather than clamped.
pub fn resolve_limit(requested: Option<i64>, default: i64) -> Result<i64> {
    let limit = requested.unwrap_or(default);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }
    Ok(limit)
}

/// Split a `limit + 1`-row fetch into the page and the cursor for the next
/// call. `rows` must come from a scan that fetched at most `limit + 1` rows.
pub fn split_page<T>(mut rows: Vec<T>, limit: i64, id_of: impl Fn(&T) -> Uuid) -> (Vec<T>, Option<Uuid>) {
    let next_cursor = if rows.len() as i64 > limit {
        rows.pop().map(|row| id_of(&row))
    } else {
        None
    };
    (rows, next_cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_bounds() {
        assert_eq!(resolve_limit(None, DEFAULT_LIMIT).unwrap(), 20);
        assert_eq!(resolve_limit(Some(100), DEFAULT_LIMIT).unwrap(), 100);
        assert_eq!(resolve_limit(Some(1), DEFAULT_LIMIT).unwrap(), 1);
        assert!(resolve_limit(Some(0), DEFAULT_LIMIT).is_err());
        assert!(resolve_limit(Some(101), DEFAULT_LIMIT).is_err());
        assert!(resolve_limit(Some(-5), DEFAULT_LIMIT).is_err());
    }

    #[test]
    fn full_fetch_pops_the_extra_row_into_the_cursor() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let (page, next) = split_page(ids.clone(), 3, |id| *id);
        assert_eq!(page, ids[..3]);
        assert_eq!(next, Some(ids[3]));
    }

    #[test]
    fn short_fetch_means_last_page() {
        let ids: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();
        let (page, next) = split_page(ids.clone(), 3, |id| *id);
        assert_eq!(page, ids);
        assert_eq!(next, None);
    }
}
