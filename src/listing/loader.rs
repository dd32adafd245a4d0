use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::action::{Action, ListId};
use crate::listing::{
    ContinuationSignal, FetchKind, FetchTicket, ListState, LoadError, PagedList, ScrollMetrics,
    Settled, TriggerKind,
};
use crate::source::PageSource;
use crate::types::Record;

/// Drives one [`PagedList`] against a [`PageSource`].
///
/// Fetches run on tokio tasks and report back as [`Action::PageFetched`];
/// the app hands them to [`ListLoader::apply`] on its update loop, so all
/// state changes happen on one task.
pub struct ListLoader<R: Record> {
    id: ListId,
    list: PagedList<R>,
    source: Arc<dyn PageSource>,
    trigger_kind: Option<TriggerKind>,
    trigger: Option<Box<dyn ContinuationSignal>>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl<R: Record> ListLoader<R> {
    pub fn new(
        id: ListId,
        source: Arc<dyn PageSource>,
        limit: u32,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            id,
            list: PagedList::new(limit),
            source,
            trigger_kind: None,
            trigger: None,
            action_tx,
        }
    }

    pub fn state(&self) -> ListState<'_, R> {
        self.list.state()
    }

    pub fn items(&self) -> &[R] {
        self.list.snapshot().items()
    }

    /// Replace the list with a fresh page 1. Returns true if a fetch started.
    pub fn load_first(&mut self) -> bool {
        match self.list.begin_first() {
            Some(ticket) => {
                self.spawn_fetch(ticket);
                true
            }
            None => false,
        }
    }

    /// Fetch the next page if the gate allows it. Returns true if a fetch started.
    pub fn load_more(&mut self) -> bool {
        match self.list.begin_more() {
            Some(ticket) => {
                self.spawn_fetch(ticket);
                true
            }
            None => false,
        }
    }

    /// Re-issue a continuation that failed, for the same page.
    /// Returns false when the last failure (if any) was not a continuation.
    pub fn retry_continuation(&mut self) -> bool {
        if self.list.state().failed != Some(FetchKind::Continuation) {
            return false;
        }
        self.load_more()
    }

    pub fn attach_continuation_trigger(&mut self, kind: TriggerKind) {
        self.trigger_kind = Some(kind);
        self.trigger = Some(kind.build());
    }

    /// Feed the latest scroll geometry to the trigger; loads more if it fires.
    pub fn observe(&mut self, metrics: ScrollMetrics) -> bool {
        let fired = self
            .trigger
            .as_mut()
            .is_some_and(|trigger| trigger.observe(metrics));
        fired && self.load_more()
    }

    /// Point the list at a new scope key, reloading if it changed.
    pub fn set_scope(&mut self, scope: u64) -> bool {
        if !self.list.reset_scope(scope) {
            return false;
        }
        tracing::debug!(list = ?self.id, scope, "scope changed");
        self.trigger = self.trigger_kind.map(TriggerKind::build);
        self.load_first();
        true
    }

    /// Tear the list down; results still in flight will be ignored.
    pub fn discard(&mut self) {
        tracing::debug!(list = ?self.id, "discarding list");
        self.list.discard();
        if let Some(trigger) = self.trigger.as_mut() {
            trigger.disconnect();
        }
    }

    /// Apply a fetch result delivered through the action channel.
    pub fn apply(
        &mut self,
        ticket: FetchTicket,
        result: Result<Value, LoadError>,
    ) -> Result<Settled, LoadError> {
        let settled = match self.list.complete(ticket, result) {
            Ok(settled) => settled,
            Err(err) => {
                // The trigger spent its shot on this fetch
                self.rearm_trigger();
                return Err(err);
            }
        };
        if let Settled::Applied { kind, received } = settled {
            tracing::trace!(list = ?self.id, ?kind, received, "list changed");
            self.rearm_trigger();
        }
        Ok(settled)
    }

    fn rearm_trigger(&mut self) {
        let has_more = self.list.snapshot().has_more();
        if let Some(trigger) = self.trigger.as_mut() {
            trigger.list_changed(has_more);
        }
    }

    fn spawn_fetch(&self, ticket: FetchTicket) {
        tracing::debug!(
            list = ?self.id,
            source = self.source.name(),
            page = ticket.request.page,
            limit = ticket.request.limit,
            generation = ticket.generation,
            "fetching page"
        );
        let tx = self.action_tx.clone();
        let source = Arc::clone(&self.source);
        let list = self.id;
        tokio::spawn(async move {
            let result = source
                .fetch_page(ticket.request)
                .await
                .map_err(LoadError::from);
            tx.send(Action::PageFetched {
                list,
                ticket,
                result,
            })
            .ok();
        });
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::Semaphore;

    use super::*;
    use crate::listing::FetchStatus;
    use crate::source::testing::FakeSource;
    use crate::types::LabTest;

    fn loader(
        source: Arc<FakeSource>,
        limit: u32,
    ) -> (ListLoader<LabTest>, mpsc::UnboundedReceiver<Action>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ListLoader::new(ListId::Tests, source, limit, tx), rx)
    }

    async fn settle(
        loader: &mut ListLoader<LabTest>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> std::result::Result<Settled, LoadError> {
        match rx.recv().await {
            Some(Action::PageFetched {
                list,
                ticket,
                result,
            }) => {
                assert_eq!(list, ListId::Tests);
                loader.apply(ticket, result)
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[tokio::test]
    async fn loads_until_short_page() {
        let source = Arc::new(FakeSource::with_pages(10, &[10, 4]));
        let (mut loader, mut rx) = loader(Arc::clone(&source), 10);

        assert!(loader.load_first());
        settle(&mut loader, &mut rx).await.unwrap();
        assert_eq!(loader.items().len(), 10);
        assert!(loader.state().snapshot.has_more());

        assert!(loader.load_more());
        settle(&mut loader, &mut rx).await.unwrap();
        assert_eq!(loader.items().len(), 14);
        assert!(!loader.state().snapshot.has_more());
        assert_eq!(loader.state().page, 2);

        assert!(!loader.load_more());
        assert_eq!(source.reads(), 2);
    }

    #[tokio::test]
    async fn double_load_more_reads_once() {
        let release = Arc::new(Semaphore::new(0));
        let source = Arc::new(FakeSource::with_pages(5, &[5, 5, 5]).held(Arc::clone(&release)));
        let (mut loader, mut rx) = loader(Arc::clone(&source), 5);

        loader.load_first();
        release.add_permits(1);
        settle(&mut loader, &mut rx).await.unwrap();

        assert!(loader.load_more());
        assert!(!loader.load_more());
        assert_eq!(loader.state().status, FetchStatus::ContinuationLoading);

        release.add_permits(1);
        settle(&mut loader, &mut rx).await.unwrap();
        assert_eq!(source.reads(), 2);
        assert_eq!(loader.items().len(), 10);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn network_failure_then_retry() {
        let source = Arc::new(FakeSource::with_pages(10, &[10]));
        source.fail_once(1);
        let (mut loader, mut rx) = loader(Arc::clone(&source), 10);

        loader.load_first();
        let err = settle(&mut loader, &mut rx).await.unwrap_err();
        assert!(matches!(err, LoadError::NetworkFailure(_)));
        assert!(loader.items().is_empty());
        assert!(loader.state().snapshot.has_more());
        assert_eq!(loader.state().page, 1);
        assert_eq!(loader.state().status, FetchStatus::Failed);

        assert!(loader.load_first());
        settle(&mut loader, &mut rx).await.unwrap();
        assert_eq!(loader.items().len(), 10);
        assert_eq!(loader.state().status, FetchStatus::Idle);
    }

    #[tokio::test]
    async fn failed_continuation_rearms_trigger_and_retries_same_page() {
        let source = Arc::new(FakeSource::with_pages(10, &[10, 10]));
        source.fail_once(2);
        let (mut loader, mut rx) = loader(Arc::clone(&source), 10);
        loader.attach_continuation_trigger(TriggerKind::Viewport { margin: 1 });

        loader.load_first();
        settle(&mut loader, &mut rx).await.unwrap();
        assert!(!loader.retry_continuation());

        let bottom = ScrollMetrics {
            content_len: 10,
            offset: 5,
            viewport_len: 5,
        };
        assert!(loader.observe(bottom));
        let err = settle(&mut loader, &mut rx).await.unwrap_err();
        assert!(matches!(err, LoadError::NetworkFailure(_)));
        assert_eq!(loader.state().failed, Some(FetchKind::Continuation));

        // Still at the bottom: the next observation fires again
        assert!(loader.observe(bottom));
        assert_eq!(loader.state().status, FetchStatus::ContinuationLoading);
        settle(&mut loader, &mut rx).await.unwrap();
        assert_eq!(loader.items().len(), 20);
        assert_eq!(loader.state().page, 2);
        assert_eq!(source.reads(), 3);
    }

    #[tokio::test]
    async fn retry_continuation_only_follows_a_failed_continuation() {
        let source = Arc::new(FakeSource::with_pages(10, &[10, 10]));
        source.fail_once(1);
        source.fail_once(2);
        let (mut loader, mut rx) = loader(Arc::clone(&source), 10);

        loader.load_first();
        assert!(settle(&mut loader, &mut rx).await.is_err());
        assert_eq!(loader.state().failed, Some(FetchKind::Replace));
        assert!(!loader.retry_continuation());

        loader.load_first();
        settle(&mut loader, &mut rx).await.unwrap();
        loader.load_more();
        assert!(settle(&mut loader, &mut rx).await.is_err());

        assert!(loader.retry_continuation());
        let settled = settle(&mut loader, &mut rx).await.unwrap();
        assert_eq!(
            settled,
            Settled::Applied {
                kind: FetchKind::Continuation,
                received: 10
            }
        );
        assert_eq!(loader.items().len(), 20);
        assert_eq!(source.reads(), 4);
    }

    #[tokio::test]
    async fn discarded_list_ignores_late_result() {
        let release = Arc::new(Semaphore::new(0));
        let source = Arc::new(FakeSource::with_pages(5, &[5]).held(Arc::clone(&release)));
        let (mut loader, mut rx) = loader(Arc::clone(&source), 5);

        loader.load_first();
        loader.discard();
        release.add_permits(1);

        let settled = settle(&mut loader, &mut rx).await.unwrap();
        assert_eq!(settled, Settled::Discarded);
        assert!(loader.items().is_empty());
        assert_eq!(loader.state().status, FetchStatus::Idle);
    }

    #[tokio::test]
    async fn load_first_during_continuation_wins() {
        let release = Arc::new(Semaphore::new(0));
        let source = Arc::new(FakeSource::with_pages(3, &[3, 3]).held(Arc::clone(&release)));
        let (mut loader, mut rx) = loader(Arc::clone(&source), 3);

        loader.load_first();
        release.add_permits(1);
        settle(&mut loader, &mut rx).await.unwrap();

        assert!(loader.load_more());
        assert!(loader.load_first());
        release.add_permits(2);

        // Both fetches report back in some order; only the replace may land
        let a = settle(&mut loader, &mut rx).await.unwrap();
        let b = settle(&mut loader, &mut rx).await.unwrap();
        assert!(a == Settled::Discarded || b == Settled::Discarded);
        assert_eq!(loader.items().len(), 3);
        assert_eq!(loader.state().page, 1);
    }

    #[tokio::test]
    async fn viewport_trigger_loads_more_once_per_crossing() {
        let source = Arc::new(FakeSource::with_pages(10, &[10, 10, 2]));
        let (mut loader, mut rx) = loader(Arc::clone(&source), 10);
        loader.attach_continuation_trigger(TriggerKind::Viewport { margin: 1 });

        loader.load_first();
        settle(&mut loader, &mut rx).await.unwrap();

        let far = ScrollMetrics {
            content_len: 11,
            offset: 0,
            viewport_len: 5,
        };
        let near = ScrollMetrics {
            offset: 6,
            ..far
        };
        assert!(!loader.observe(far));
        assert!(loader.observe(near));
        assert!(!loader.observe(near));
        settle(&mut loader, &mut rx).await.unwrap();
        assert_eq!(loader.items().len(), 20);
        assert_eq!(source.reads(), 2);
    }

    #[tokio::test]
    async fn scope_change_reloads_and_rebuilds_trigger() {
        let source = Arc::new(FakeSource::with_pages(4, &[4, 1]));
        let (mut loader, mut rx) = loader(Arc::clone(&source), 4);
        loader.attach_continuation_trigger(TriggerKind::Scroll { threshold: 2 });

        assert!(loader.set_scope(1));
        settle(&mut loader, &mut rx).await.unwrap();
        assert!(!loader.set_scope(1));

        loader.discard();
        assert!(loader.items().is_empty());

        assert!(loader.set_scope(2));
        settle(&mut loader, &mut rx).await.unwrap();
        let bottom = ScrollMetrics {
            content_len: 4,
            offset: 0,
            viewport_len: 4,
        };
        assert!(loader.observe(bottom));
        settle(&mut loader, &mut rx).await.unwrap();
        assert_eq!(loader.items().len(), 5);
        assert_eq!(source.reads(), 3);
    }
}
