//! [`EventIter`] — a lazy, finite, restartable sequence over query results.
//!
//! Pages through [`EventStore::fetch`] one page at a time, so memory stays
//! bounded for arbitrarily large ranges. Dropping the iterator and creating
//! a new one restarts the scan from the beginning.

use std::collections::VecDeque;

use crate::errors::Result;
use crate::store::event_store::EventStore;
use crate::types::{ConnectionEvent, EventFilter, PageRequest};

/// Iterator over all events matching a filter.
///
/// Yields `Result` items: a storage failure mid-scan surfaces as an `Err`
/// element and ends the iteration.
pub struct EventIter<'a> {
    store: &'a EventStore,
    filter: EventFilter,
    page_size: i64,
    buffer: VecDeque<ConnectionEvent>,
    cursor: Option<String>,
    /// Set once the store reports no further page, or after an error.
    exhausted: bool,
    started: bool,
}

impl<'a> EventIter<'a> {
    pub(crate) fn new(store: &'a EventStore, filter: EventFilter, page_size: i64) -> Self {
        Self {
            store,
            filter,
            page_size,
            buffer: VecDeque::new(),
            cursor: None,
            exhausted: false,
            started: false,
        }
    }

    fn refill(&mut self) -> Result<()> {
        let page = self.store.fetch(
            &self.filter,
            &PageRequest {
                cursor: self.cursor.take(),
                limit: Some(self.page_size),
            },
        )?;
        self.buffer.extend(page.events);
        match page.next_cursor {
            Some(next) => self.cursor = Some(next),
            None => self.exhausted = true,
        }
        Ok(())
    }
}

impl Iterator for EventIter<'_> {
    type Item = Result<ConnectionEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() {
            if self.exhausted || (self.started && self.cursor.is_none()) {
                return None;
            }
            self.started = true;
            if let Err(err) = self.refill() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::connection::{self, ConnectionConfig};
    use crate::sqlite::migrations::run_migrations;
    use crate::store::event_store::PageLimits;
    use crate::types::NewEvent;

    fn setup(page_size: i64) -> EventStore {
        let pool = connection::new_in_memory(&ConnectionConfig::default()).unwrap();
        {
            let conn = pool.get().unwrap();
            run_migrations(&conn).unwrap();
        }
        EventStore::new(pool).with_limits(PageLimits {
            default_page_size: page_size,
            max_page_size: 1_000,
        })
    }

    fn submit_n(store: &EventStore, n: usize) {
        for i in 0..n {
            let _ = store
                .submit(&NewEvent {
                    event_time: Some(format!("2026-01-01T00:00:{:02}Z", i % 60).parse().unwrap()),
                    agent_name: "agent-1".to_string(),
                    status_ok: true,
                    object_data: None,
                })
                .unwrap();
        }
    }

    #[test]
    fn empty_store_yields_nothing() {
        let store = setup(4);
        assert_eq!(store.query_range(&EventFilter::default()).count(), 0);
    }

    #[test]
    fn yields_across_page_boundaries() {
        let store = setup(4);
        submit_n(&store, 10);
        let ids: Vec<i64> = store
            .query_range(&EventFilter::default())
            .map(|r| r.map(|e| e.id))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(ids.len(), 10);
        let mut deduped = ids.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), 10);
    }

    #[test]
    fn exact_page_multiple_terminates() {
        let store = setup(5);
        submit_n(&store, 10);
        assert_eq!(store.query_range(&EventFilter::default()).count(), 10);
    }

    #[test]
    fn iterator_is_finite_on_single_page() {
        let store = setup(100);
        submit_n(&store, 3);
        assert_eq!(store.query_range(&EventFilter::default()).count(), 3);
    }
}
