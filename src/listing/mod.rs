//! Incremental list loading.
//!
//! A [`PagedList`] owns everything one scrolling list needs: the page
//! cursor, the single-flight gate and the accumulated snapshot. Fetches are
//! started with [`PagedList::begin_first`] / [`PagedList::begin_more`], which
//! hand out a [`FetchTicket`], and finished with [`PagedList::complete`].
//! Tickets from a superseded scope or a discarded list are ignored, so a late
//! response can never revive state that has moved on.

pub mod accumulator;
pub mod cursor;
pub mod gate;
pub mod loader;
pub mod normalize;
pub mod trigger;

use serde_json::Value;
use thiserror::Error;

use crate::error::LabError;
use crate::types::Record;

pub use accumulator::ListSnapshot;
pub use cursor::{PageCursor, PageRequest};
pub use gate::{FetchGate, FetchKind, FetchStatus, FetchTicket};
pub use loader::ListLoader;
pub use trigger::{ContinuationSignal, ScrollMetrics, TriggerKind};

/// Recoverable failures of a page fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<LabError> for LoadError {
    fn from(err: LabError) -> Self {
        match err {
            LabError::Decode(_) => LoadError::MalformedResponse(err.to_string()),
            _ => LoadError::NetworkFailure(err.to_string()),
        }
    }
}

/// What became of a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// Records were applied to the list.
    Applied { kind: FetchKind, received: usize },
    /// The ticket belonged to a superseded scope or a discarded list.
    Discarded,
}

/// Read-only view handed to rendering code.
#[derive(Debug)]
pub struct ListState<'a, R> {
    pub snapshot: &'a ListSnapshot<R>,
    pub status: FetchStatus,
    /// Last consumed page.
    pub page: u32,
    /// Set while `status` is `Failed`: which fetch to retry.
    pub failed: Option<FetchKind>,
}

#[derive(Debug)]
pub struct PagedList<R> {
    cursor: PageCursor,
    gate: FetchGate,
    snapshot: ListSnapshot<R>,
    scope: Option<u64>,
    started: bool,
}

impl<R: Record> PagedList<R> {
    pub fn new(limit: u32) -> Self {
        Self {
            cursor: PageCursor::new(limit),
            gate: FetchGate::new(),
            snapshot: ListSnapshot::default(),
            scope: None,
            started: false,
        }
    }

    pub fn state(&self) -> ListState<'_, R> {
        ListState {
            snapshot: &self.snapshot,
            status: self.gate.status(),
            page: self.cursor.page(),
            failed: self.gate.failed_kind(),
        }
    }

    pub fn snapshot(&self) -> &ListSnapshot<R> {
        &self.snapshot
    }

    /// Start a replace load of page 1.
    pub fn begin_first(&mut self) -> Option<FetchTicket> {
        self.gate.admit_replace(PageRequest::first(self.cursor.limit()))
    }

    /// Start a continuation load. Silently refused while a fetch is in
    /// flight, once the list is exhausted, or before the first page landed.
    pub fn begin_more(&mut self) -> Option<FetchTicket> {
        if !self.started {
            return None;
        }
        self.gate
            .admit_continuation(self.cursor.next(), self.snapshot.has_more())
    }

    /// Apply the outcome of a fetch started by this list.
    ///
    /// Stale tickets are discarded without touching state. Failures leave
    /// the cursor and items as they were and re-arm the gate for a retry.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Value, LoadError>,
    ) -> Result<Settled, LoadError> {
        if !self.gate.is_current(&ticket) {
            tracing::debug!(
                generation = ticket.generation,
                page = ticket.request.page,
                "discarding stale page"
            );
            return Ok(Settled::Discarded);
        }

        let records = match result
            .and_then(|payload| normalize::normalize::<R>(payload).into_result())
        {
            Ok(records) => records,
            Err(err) => {
                self.gate.release(&ticket, false);
                tracing::warn!(page = ticket.request.page, error = %err, "page fetch failed");
                return Err(err);
            }
        };

        let received = records.len();
        let limit = ticket.request.limit;
        match ticket.kind {
            FetchKind::Replace => {
                self.snapshot.apply_replace(records, limit);
                self.cursor.reset();
                self.started = true;
            }
            FetchKind::Continuation => {
                self.snapshot.apply_append(records, limit);
                self.cursor.advance();
            }
        }
        self.gate.release(&ticket, true);

        tracing::debug!(
            page = ticket.request.page,
            received,
            total = self.snapshot.len(),
            has_more = self.snapshot.has_more(),
            "page applied"
        );
        Ok(Settled::Applied {
            kind: ticket.kind,
            received,
        })
    }

    /// Switch to a new scope key. Returns true if the list was reset.
    pub fn reset_scope(&mut self, scope: u64) -> bool {
        if self.scope == Some(scope) {
            return false;
        }
        self.clear();
        self.scope = Some(scope);
        true
    }

    /// Drop all state; anything still in flight becomes stale.
    pub fn discard(&mut self) {
        self.clear();
        self.scope = None;
    }

    fn clear(&mut self) {
        self.gate.invalidate();
        self.snapshot.clear();
        self.cursor.reset();
        self.started = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LabTest;
    use serde_json::json;

    fn page(start: u64, count: u64) -> Value {
        let items: Vec<Value> = (start..start + count)
            .map(|id| json!({"id": id, "name": format!("test {id}")}))
            .collect();
        json!({ "data": items })
    }

    fn ids(list: &PagedList<LabTest>) -> Vec<u64> {
        list.snapshot().items().iter().map(|t| t.id).collect()
    }

    #[test]
    fn first_page_then_short_page() {
        let mut list = PagedList::<LabTest>::new(10);

        let ticket = list.begin_first().unwrap();
        assert_eq!(ticket.request, PageRequest { page: 1, limit: 10 });
        assert_eq!(list.state().status, FetchStatus::InitialLoading);
        list.complete(ticket, Ok(page(1, 10))).unwrap();
        assert!(list.snapshot().has_more());
        assert_eq!(list.state().page, 1);

        let ticket = list.begin_more().unwrap();
        assert_eq!(ticket.request.page, 2);
        let settled = list.complete(ticket, Ok(page(11, 4))).unwrap();
        assert_eq!(
            settled,
            Settled::Applied {
                kind: FetchKind::Continuation,
                received: 4
            }
        );
        assert_eq!(list.snapshot().len(), 14);
        assert!(!list.snapshot().has_more());
        assert_eq!(list.state().page, 2);

        // Exhausted: nothing more to request
        assert!(list.begin_more().is_none());
        assert_eq!(list.state().status, FetchStatus::Idle);
    }

    #[test]
    fn continuations_advance_page_by_one_and_sum_items() {
        let mut list = PagedList::<LabTest>::new(5);
        let ticket = list.begin_first().unwrap();
        list.complete(ticket, Ok(page(0, 5))).unwrap();

        let mut expected_total = 5;
        for n in 0..4u32 {
            let before = list.state().page;
            let ticket = list.begin_more().unwrap();
            assert_eq!(ticket.request.page, before + 1);
            list.complete(ticket, Ok(page(100 + u64::from(n) * 5, 5))).unwrap();
            expected_total += 5;
            assert_eq!(list.state().page, before + 1);
            assert_eq!(list.snapshot().len(), expected_total);
        }
    }

    #[test]
    fn single_flight_for_continuations() {
        let mut list = PagedList::<LabTest>::new(10);
        let ticket = list.begin_first().unwrap();
        list.complete(ticket, Ok(page(1, 10))).unwrap();

        assert!(list.begin_more().is_some());
        assert!(list.begin_more().is_none());
        assert_eq!(list.state().status, FetchStatus::ContinuationLoading);
    }

    #[test]
    fn continuation_before_first_page_is_a_no_op() {
        let mut list = PagedList::<LabTest>::new(10);
        assert!(list.begin_more().is_none());
        assert_eq!(list.state().status, FetchStatus::Idle);
    }

    #[test]
    fn failed_first_page_leaves_state_untouched() {
        let mut list = PagedList::<LabTest>::new(10);
        let ticket = list.begin_first().unwrap();
        let err = list
            .complete(ticket, Err(LoadError::NetworkFailure("timeout".into())))
            .unwrap_err();
        assert!(matches!(err, LoadError::NetworkFailure(_)));
        assert!(list.snapshot().is_empty());
        assert!(list.snapshot().has_more());
        assert_eq!(list.state().page, 1);
        assert_eq!(list.state().status, FetchStatus::Failed);
        assert_eq!(list.state().failed, Some(FetchKind::Replace));

        // Retry with the same cursor gives the same result as a clean run
        let retry = list.begin_first().unwrap();
        assert_eq!(retry.request, ticket.request);
        list.complete(retry, Ok(page(1, 10))).unwrap();
        assert_eq!(ids(&list), (1..=10).collect::<Vec<_>>());
        assert_eq!(list.state().status, FetchStatus::Idle);
    }

    #[test]
    fn failed_continuation_retries_same_page() {
        let mut list = PagedList::<LabTest>::new(3);
        let ticket = list.begin_first().unwrap();
        list.complete(ticket, Ok(page(1, 3))).unwrap();

        let ticket = list.begin_more().unwrap();
        assert!(list.complete(ticket, Ok(json!({"oops": true}))).is_err());
        assert_eq!(list.snapshot().len(), 3);
        assert_eq!(list.state().page, 1);
        assert_eq!(list.state().failed, Some(FetchKind::Continuation));

        let retry = list.begin_more().unwrap();
        assert_eq!(retry.request.page, 2);
        list.complete(retry, Ok(page(4, 3))).unwrap();
        assert_eq!(ids(&list), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn replace_during_continuation_discards_late_result() {
        let mut list = PagedList::<LabTest>::new(2);
        let ticket = list.begin_first().unwrap();
        list.complete(ticket, Ok(page(1, 2))).unwrap();

        let late = list.begin_more().unwrap();
        let fresh = list.begin_first().unwrap();
        assert_eq!(fresh.request.page, 1);

        list.complete(fresh, Ok(page(50, 2))).unwrap();
        assert_eq!(list.complete(late, Ok(page(3, 2))).unwrap(), Settled::Discarded);
        assert_eq!(ids(&list), vec![50, 51]);
        assert_eq!(list.state().page, 1);
    }

    #[test]
    fn stale_failure_does_not_touch_status() {
        let mut list = PagedList::<LabTest>::new(2);
        let ticket = list.begin_first().unwrap();
        list.complete(ticket, Ok(page(1, 2))).unwrap();
        let late = list.begin_more().unwrap();
        let fresh = list.begin_first().unwrap();

        let settled = list
            .complete(late, Err(LoadError::NetworkFailure("reset".into())))
            .unwrap();
        assert_eq!(settled, Settled::Discarded);
        assert_eq!(list.state().status, FetchStatus::InitialLoading);
        list.complete(fresh, Ok(page(1, 1))).unwrap();
        assert!(!list.snapshot().has_more());
    }

    #[test]
    fn scope_change_resets_everything() {
        let mut list = PagedList::<LabTest>::new(2);
        assert!(list.reset_scope(7));
        let ticket = list.begin_first().unwrap();
        list.complete(ticket, Ok(page(1, 2))).unwrap();
        let in_flight = list.begin_more().unwrap();

        assert!(!list.reset_scope(7));
        assert!(list.reset_scope(8));
        assert!(list.snapshot().is_empty());
        assert!(list.snapshot().has_more());
        assert_eq!(list.state().status, FetchStatus::Idle);
        assert_eq!(list.complete(in_flight, Ok(page(3, 2))).unwrap(), Settled::Discarded);
        assert!(list.snapshot().is_empty());
    }

    #[test]
    fn undecodable_body_maps_to_malformed_response() {
        let err = LoadError::from(LabError::Decode("expected value".into()));
        assert!(matches!(err, LoadError::MalformedResponse(_)));
        let err = LoadError::from(LabError::Api("503".into()));
        assert!(matches!(err, LoadError::NetworkFailure(_)));
    }

    #[test]
    fn discard_blocks_in_flight_results() {
        let mut list = PagedList::<LabTest>::new(2);
        assert!(list.reset_scope(3));
        let ticket = list.begin_first().unwrap();
        list.discard();
        assert_eq!(list.complete(ticket, Ok(page(1, 2))).unwrap(), Settled::Discarded);
        assert!(list.snapshot().is_empty());
        // The scope key is forgotten too
        assert!(list.reset_scope(3));
    }

    #[test]
    fn invariants_hold_across_mixed_outcomes() {
        let mut list = PagedList::<LabTest>::new(2);
        let mut next_id = 0u64;
        let mut prev_len = 0;

        let t = list.begin_first().unwrap();
        list.complete(t, Err(LoadError::NetworkFailure("x".into()))).ok();
        let t = list.begin_first().unwrap();
        list.complete(t, Ok(page(next_id, 2))).unwrap();
        next_id += 2;

        for step in 0..12 {
            let before_page = list.state().page;
            let Some(t) = list.begin_more() else { break };
            if step % 3 == 1 {
                assert!(list.complete(t, Err(LoadError::NetworkFailure("x".into()))).is_err());
                assert_eq!(list.state().page, before_page);
            } else {
                list.complete(t, Ok(page(next_id, 2))).unwrap();
                next_id += 2;
                assert_eq!(list.state().page, before_page + 1);
            }
            assert!(list.snapshot().len() >= prev_len);
            prev_len = list.snapshot().len();
        }
        assert_eq!(ids(&list), (0..next_id).collect::<Vec<_>>());
    }
}
