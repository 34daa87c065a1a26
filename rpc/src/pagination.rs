//! Offset pagination for the confession feed.

use serde::Deserialize;

use pmp_confessions::ConfessionLedger;

/// Query string of `GET /confessions`. Numbers arrive as text and are
/// parsed leniently: anything unparsable falls back to the default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowseQuery {
    pub code: Option<String>,
    pub offset: Option<String>,
    pub limit: Option<String>,
}

impl BrowseQuery {
    pub fn code(&self) -> &str {
        self.code.as_deref().unwrap_or("")
    }

    /// Requested page size; `None` lets the ledger apply its default.
    /// The ledger clamps the upper bound.
    pub fn effective_limit(&self) -> Option<u64> {
        parse_int(self.limit.as_deref()).and_then(|n| u64::try_from(n).ok().filter(|&n| n > 0))
    }

    pub fn effective_offset(&self) -> u64 {
        parse_int(self.offset.as_deref())
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0)
    }
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim).and_then(|s| s.parse::<i64>().ok())
}

/// Offset of the following page, or `None` when this page was short.
pub fn next_offset(current: u64, returned: usize, requested: Option<u64>) -> Option<u64> {
    let page = ConfessionLedger::page_limit(requested);
    if (returned as u64) < page {
        None
    } else {
        Some(current + returned as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(offset: Option<&str>, limit: Option<&str>) -> BrowseQuery {
        BrowseQuery {
            code: None,
            offset: offset.map(String::from),
            limit: limit.map(String::from),
        }
    }

    #[test]
    fn defaults_when_absent_or_garbage() {
        let q = query(None, None);
        assert_eq!(q.effective_limit(), None);
        assert_eq!(q.effective_offset(), 0);
        assert_eq!(q.code(), "");

        let q = query(Some("ten"), Some("-3"));
        assert_eq!(q.effective_limit(), None);
        assert_eq!(q.effective_offset(), 0);

        let q = query(Some("-7"), Some("0"));
        assert_eq!(q.effective_offset(), 0);
        assert_eq!(q.effective_limit(), None);
    }

    #[test]
    fn explicit_values_pass_through() {
        let q = query(Some("40"), Some("20"));
        assert_eq!(q.effective_offset(), 40);
        assert_eq!(q.effective_limit(), Some(20));
    }

    #[test]
    fn next_offset_stops_at_short_page() {
        assert_eq!(next_offset(0, 20, Some(20)), Some(20));
        assert_eq!(next_offset(20, 5, Some(20)), None);
        assert_eq!(next_offset(0, 100, None), Some(100));
        assert_eq!(next_offset(0, 500, Some(2000)), Some(500));
    }
}
