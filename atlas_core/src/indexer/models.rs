use crate::content::models::{HistoryEntry, HistoryQuery, Pagination};

/// A single indexing request, produced while draining a history page and
/// consumed exactly once by a worker. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub entity_type: String,
    pub entity_id: String,
}

impl From<&HistoryEntry> for Job {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            entity_type: entry.entity_type.clone(),
            entity_id: entry.entity_id.clone(),
        }
    }
}

/// Per-epoch context threaded from the orchestrator through the pool into
/// each index, surfaced as structured log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    pub epoch: u64,
}

/// Walks the remote history log page by page.
///
/// Every epoch starts a fresh cursor at offset 0; the walk position is not
/// persisted across epochs or restarts.
#[derive(Debug, Default, Clone, Copy)]
pub struct HistoryCursor {
    offset: u64,
}

impl HistoryCursor {
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Query for the page at the current offset.
    pub fn query(&self) -> HistoryQuery {
        HistoryQuery {
            offset: (self.offset > 0).then_some(self.offset),
            ..Default::default()
        }
    }

    /// Advance past `page`. Returns whether another page should be fetched.
    pub fn advance(&mut self, page: &Pagination) -> bool {
        if !page.more_data {
            return false;
        }
        self.offset = page.offset + page.limit;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_advances_by_page_limit() {
        let mut cursor = HistoryCursor::default();
        assert_eq!(cursor.query().offset, None);

        assert!(cursor.advance(&Pagination {
            offset: 0,
            limit: 500,
            more_data: true,
        }));
        assert_eq!(cursor.offset(), 500);
        assert_eq!(cursor.query().offset, Some(500));

        assert!(!cursor.advance(&Pagination {
            offset: 500,
            limit: 500,
            more_data: false,
        }));
        assert_eq!(cursor.offset(), 500);
    }
}
