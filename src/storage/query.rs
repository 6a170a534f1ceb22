//! Query parameters and the in-process filtering shared by all backends.

use chrono::{DateTime, Utc};

use crate::config::defaults;
use crate::types::{
    DrillingParameter, Operation, OperationStatus, Well, WellLog, WellStatus, WitsmlDataEntry,
};

/// `GET /wells` filters and pagination. `page` is 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct WellQuery {
    pub page: usize,
    pub limit: usize,
    pub status: Option<WellStatus>,
    /// Case-insensitive substring match on the field name.
    pub field: Option<String>,
}

impl Default for WellQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: defaults::WELL_PAGE_SIZE,
            status: None,
            field: None,
        }
    }
}

impl WellQuery {
    fn skip(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterQuery {
    /// Exact parameter name
    pub name: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for ParameterQuery {
    fn default() -> Self {
        Self {
            name: None,
            limit: defaults::PARAMETER_PAGE_SIZE,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogQuery {
    pub log_type: Option<String>,
    pub min_depth: Option<f64>,
    pub max_depth: Option<f64>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            log_type: None,
            min_depth: None,
            max_depth: None,
            limit: defaults::LOG_PAGE_SIZE,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationQuery {
    pub kind: Option<String>,
    pub status: Option<OperationStatus>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for OperationQuery {
    fn default() -> Self {
        Self {
            kind: None,
            status: None,
            limit: defaults::OPERATION_PAGE_SIZE,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WitsmlQuery {
    pub data_type: Option<String>,
    pub limit: usize,
}

impl Default for WitsmlQuery {
    fn default() -> Self {
        Self {
            data_type: None,
            limit: defaults::WITSML_PAGE_SIZE,
        }
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Sort rows newest first. `rows` must be in insertion order; rows with equal
/// timestamps keep the later insert first.
pub fn newest_first<T>(mut rows: Vec<T>, ts: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    rows.reverse();
    rows.sort_by_key(|row| std::cmp::Reverse(ts(row)));
    rows
}

/// Apply filters, order by `updated_at` descending and cut the requested
/// page. Returns the page and the filtered total.
pub fn select_wells(wells: Vec<Well>, query: &WellQuery) -> (Vec<Well>, usize) {
    let needle = query.field.as_ref().map(|f| f.to_lowercase());

    let mut matched: Vec<Well> = wells
        .into_iter()
        .filter(|w| query.status.map_or(true, |s| w.status == s))
        .filter(|w| match (&needle, &w.field) {
            (None, _) => true,
            (Some(n), Some(field)) => field.to_lowercase().contains(n.as_str()),
            (Some(_), None) => false,
        })
        .collect();

    matched.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });

    let total = matched.len();
    let page = matched
        .into_iter()
        .skip(query.skip())
        .take(query.limit)
        .collect();
    (page, total)
}

pub fn select_parameters(
    rows: Vec<DrillingParameter>,
    query: &ParameterQuery,
) -> Vec<DrillingParameter> {
    let rows = rows
        .into_iter()
        .filter(|p| query.name.as_ref().map_or(true, |n| &p.name == n))
        .collect();
    newest_first(rows, |p| p.timestamp)
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect()
}

/// Logs are ordered by depth ascending, then newest first.
pub fn select_logs(rows: Vec<WellLog>, query: &LogQuery) -> Vec<WellLog> {
    let rows: Vec<WellLog> = rows
        .into_iter()
        .filter(|l| query.log_type.as_ref().map_or(true, |t| &l.log_type == t))
        .filter(|l| query.min_depth.map_or(true, |min| l.depth >= min))
        .filter(|l| query.max_depth.map_or(true, |max| l.depth <= max))
        .collect();

    let mut rows = newest_first(rows, |l| l.timestamp);
    rows.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    rows.into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect()
}

pub fn select_operations(rows: Vec<Operation>, query: &OperationQuery) -> Vec<Operation> {
    let rows = rows
        .into_iter()
        .filter(|o| query.kind.as_ref().map_or(true, |k| &o.kind == k))
        .filter(|o| query.status.map_or(true, |s| o.status == s))
        .collect();
    newest_first(rows, |o| o.start_time)
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect()
}

pub fn select_witsml(rows: Vec<WitsmlDataEntry>, query: &WitsmlQuery) -> Vec<WitsmlDataEntry> {
    let rows = rows
        .into_iter()
        .filter(|w| query.data_type.as_ref().map_or(true, |t| &w.data_type == t))
        .collect();
    newest_first(rows, |w| w.timestamp)
        .into_iter()
        .take(query.limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewWell;
    use chrono::Duration;

    fn log(depth: f64, secs: i64) -> WellLog {
        WellLog {
            id: format!("{depth}-{secs}"),
            well_id: "w".to_string(),
            log_type: "gamma".to_string(),
            depth,
            value: 1.0,
            unit: "API".to_string(),
            timestamp: DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(secs),
        }
    }

    #[test]
    fn test_newest_first_breaks_ties_by_insert_order() {
        let ts = Utc::now();
        let rows = vec![(1, ts), (2, ts), (3, ts - Duration::seconds(1))];
        let sorted = newest_first(rows, |r| r.1);
        let ids: Vec<_> = sorted.iter().map(|r| r.0).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_logs_depth_window_and_order() {
        let rows = vec![log(120.0, 1), log(100.0, 1), log(100.0, 5), log(300.0, 2)];
        let q = LogQuery {
            min_depth: Some(100.0),
            max_depth: Some(200.0),
            ..LogQuery::default()
        };
        let selected = select_logs(rows, &q);
        let ids: Vec<_> = selected.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["100-5", "100-1", "120-1"]);
    }

    #[test]
    fn test_well_pagination() {
        let now = Utc::now();
        let wells: Vec<Well> = (0..25)
            .map(|i| {
                Well::from_new(
                    format!("w{i:02}"),
                    NewWell::new(format!("Well {i}"), "Field", 100.0),
                    now + Duration::seconds(i),
                )
            })
            .collect();

        let q = WellQuery {
            page: 3,
            limit: 10,
            ..WellQuery::default()
        };
        let (page, total) = select_wells(wells, &q);
        assert_eq!(total, 25);
        assert_eq!(page.len(), 5);
        // Oldest updates land on the last page.
        assert_eq!(page.last().unwrap().id, "w00");
    }
}
