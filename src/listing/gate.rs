use std::sync::atomic::{AtomicU64, Ordering};

use crate::listing::cursor::PageRequest;

static GENERATION: AtomicU64 = AtomicU64::new(1);

/// Allocate a generation no other list instance has seen.
fn next_generation() -> u64 {
    GENERATION.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    InitialLoading,
    ContinuationLoading,
    Failed,
}

impl FetchStatus {
    pub fn is_loading(self) -> bool {
        matches!(
            self,
            FetchStatus::InitialLoading | FetchStatus::ContinuationLoading
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Replace,
    Continuation,
}

/// Proof of admission carried by an in-flight fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub kind: FetchKind,
    pub request: PageRequest,
}

/// Single-flight guard for one list instance.
#[derive(Debug)]
pub struct FetchGate {
    status: FetchStatus,
    generation: u64,
    failed: Option<FetchKind>,
}

impl Default for FetchGate {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchGate {
    pub fn new() -> Self {
        Self {
            status: FetchStatus::Idle,
            generation: next_generation(),
            failed: None,
        }
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    /// Kind of the fetch that left the gate `Failed`, if it is.
    pub fn failed_kind(&self) -> Option<FetchKind> {
        self.failed.filter(|_| self.status == FetchStatus::Failed)
    }

    /// Admit a replace load. An outstanding continuation loses relevance;
    /// an outstanding replace of the same scope is joined instead of doubled.
    pub fn admit_replace(&mut self, request: PageRequest) -> Option<FetchTicket> {
        if self.status == FetchStatus::InitialLoading {
            tracing::trace!(generation = self.generation, "replace already in flight");
            return None;
        }
        self.generation = next_generation();
        self.status = FetchStatus::InitialLoading;
        Some(FetchTicket {
            generation: self.generation,
            kind: FetchKind::Replace,
            request,
        })
    }

    /// Admit a continuation only from a settled state with more data expected.
    pub fn admit_continuation(
        &mut self,
        request: PageRequest,
        has_more: bool,
    ) -> Option<FetchTicket> {
        let settled = matches!(self.status, FetchStatus::Idle | FetchStatus::Failed);
        if !settled || !has_more {
            tracing::trace!(
                status = ?self.status,
                has_more,
                "continuation rejected"
            );
            return None;
        }
        self.status = FetchStatus::ContinuationLoading;
        Some(FetchTicket {
            generation: self.generation,
            kind: FetchKind::Continuation,
            request,
        })
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation && self.status.is_loading()
    }

    /// Release the gate for a current ticket. Returns false for stale tickets.
    pub fn release(&mut self, ticket: &FetchTicket, ok: bool) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        if ok {
            self.status = FetchStatus::Idle;
            self.failed = None;
        } else {
            self.status = FetchStatus::Failed;
            self.failed = Some(ticket.kind);
        }
        true
    }

    /// Forget everything in flight; later results for older tickets are stale.
    pub fn invalidate(&mut self) {
        self.generation = next_generation();
        self.status = FetchStatus::Idle;
        self.failed = None;
    }
}
