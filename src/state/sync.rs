//! Directory synchronizer.
//!
//! Owns the [`DirectoryStore`] and fans its changes out to UI observers.
//!
//! # Delivery rules
//!
//! - Nothing is delivered before the directory is loaded. Updates that arrive
//!   earlier are remembered per kind.
//! - The update that loads the directory delivers each remembered kind once.
//! - After that, every update delivers its kind to every live observer, even
//!   if nothing visibly changed.
//! - Observers are held weakly and behind a [`LivenessToken`]. A torn-down
//!   view is skipped and pruned, never called.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use super::directory::{
    DirectoryKind, DirectoryStore, DirectoryUpdate, PlayerRecord, TableRecord, UpdateSummary,
};

/// Receives directory change notifications. Must be cheap: delivery is
/// synchronous on the event path.
pub trait DirectoryObserver {
    fn on_players_changed(&self, directory: &DirectoryStore);

    fn on_tables_changed(&self, directory: &DirectoryStore);
}

/// Shared flag a view clears when it is torn down.
#[derive(Debug, Clone)]
pub struct LivenessToken(Rc<Cell<bool>>);

impl LivenessToken {
    fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn invalidate(&self) {
        self.0.set(false);
    }

    pub fn is_alive(&self) -> bool {
        self.0.get()
    }
}

struct ObserverEntry {
    key: String,
    observer: Weak<dyn DirectoryObserver>,
    token: LivenessToken,
}

impl ObserverEntry {
    fn upgrade(&self) -> Option<Rc<dyn DirectoryObserver>> {
        if !self.token.is_alive() {
            return None;
        }
        self.observer.upgrade()
    }
}

impl fmt::Debug for ObserverEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverEntry")
            .field("key", &self.key)
            .field("alive", &self.upgrade().is_some())
            .finish()
    }
}

/// Kinds updated before the directory loaded.
#[derive(Debug, Default, Clone, Copy)]
struct Pending {
    players: bool,
    tables: bool,
}

impl Pending {
    fn mark(&mut self, kind: DirectoryKind) {
        match kind {
            DirectoryKind::Players => self.players = true,
            DirectoryKind::Tables => self.tables = true,
        }
    }

    fn drain(&mut self) -> Vec<DirectoryKind> {
        let mut kinds = Vec::new();
        if std::mem::take(&mut self.players) {
            kinds.push(DirectoryKind::Players);
        }
        if std::mem::take(&mut self.tables) {
            kinds.push(DirectoryKind::Tables);
        }
        kinds
    }
}

/// Publish/subscribe broker over the directory.
#[derive(Debug, Default)]
pub struct DirectorySynchronizer {
    store: DirectoryStore,
    /// Registration order
    observers: Vec<ObserverEntry>,
    pending: Pending,
}

impl DirectorySynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directory(&self) -> &DirectoryStore {
        &self.store
    }

    pub fn is_loaded(&self) -> bool {
        self.store.is_loaded()
    }

    /// Register `observer` under `key`, replacing any earlier registration
    /// with that key. Does not deliver anything.
    ///
    /// The returned token is the view's teardown switch.
    pub fn subscribe<O>(&mut self, key: impl Into<String>, observer: &Rc<O>) -> LivenessToken
    where
        O: DirectoryObserver + 'static,
    {
        let key = key.into();
        let token = LivenessToken::new();
        let weak: Weak<O> = Rc::downgrade(observer);
        let weak: Weak<dyn DirectoryObserver> = weak;

        let entry = ObserverEntry {
            key: key.clone(),
            observer: weak,
            token: token.clone(),
        };

        match self.observers.iter_mut().find(|e| e.key == key) {
            Some(existing) => {
                debug!(key = %key, "replacing observer");
                existing.token.invalidate();
                *existing = entry;
            }
            None => {
                debug!(key = %key, "observer subscribed");
                self.observers.push(entry);
            }
        }

        token
    }

    /// Returns false if nothing was registered under `key`.
    pub fn unsubscribe(&mut self, key: &str) -> bool {
        let before = self.observers.len();
        self.observers.retain(|e| {
            if e.key == key {
                e.token.invalidate();
                false
            } else {
                true
            }
        });
        before != self.observers.len()
    }

    /// Registered observers whose view is still alive.
    pub fn observer_count(&self) -> usize {
        self.observers.iter().filter(|e| e.upgrade().is_some()).count()
    }

    pub fn apply_players(&mut self, update: DirectoryUpdate<PlayerRecord>) -> UpdateSummary {
        let summary = self.store.apply_players(update);
        self.on_snapshot_updated(DirectoryKind::Players);
        summary
    }

    pub fn apply_tables(&mut self, update: DirectoryUpdate<TableRecord>) -> UpdateSummary {
        let summary = self.store.apply_tables(update);
        self.on_snapshot_updated(DirectoryKind::Tables);
        summary
    }

    /// The store changed. Returns the number of deliveries made.
    pub fn on_snapshot_updated(&mut self, kind: DirectoryKind) -> usize {
        if !self.store.is_loaded() {
            debug!(kind = kind.as_str(), "directory not loaded, deferring notification");
            self.pending.mark(kind);
            return 0;
        }

        self.pending.mark(kind);
        self.pending
            .drain()
            .into_iter()
            .map(|k| self.notify(k))
            .sum()
    }

    /// A recreated view asks to be brought up to date. Returns false (and
    /// delivers nothing) while the directory is not loaded.
    pub fn refresh_if_loaded(&mut self, kind: DirectoryKind) -> bool {
        if !self.store.is_loaded() {
            return false;
        }
        self.notify(kind);
        true
    }

    fn notify(&mut self, kind: DirectoryKind) -> usize {
        self.observers.retain(|e| {
            let alive = e.upgrade().is_some();
            if !alive {
                debug!(key = %e.key, "dropping torn-down observer");
            }
            alive
        });

        let live: Vec<Rc<dyn DirectoryObserver>> =
            self.observers.iter().filter_map(|e| e.upgrade()).collect();

        for observer in &live {
            match kind {
                DirectoryKind::Players => observer.on_players_changed(&self.store),
                DirectoryKind::Tables => observer.on_tables_changed(&self.store),
            }
        }

        debug!(kind = kind.as_str(), delivered = live.len(), "directory notification");
        live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::board::Color;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    #[derive(Default)]
    struct CountingView {
        events: RefCell<Vec<(DirectoryKind, usize)>>,
    }

    impl CountingView {
        fn count(&self, kind: DirectoryKind) -> usize {
            self.events.borrow().iter().filter(|(k, _)| *k == kind).count()
        }
    }

    impl DirectoryObserver for CountingView {
        fn on_players_changed(&self, directory: &DirectoryStore) {
            self.events
                .borrow_mut()
                .push((DirectoryKind::Players, directory.player_count()));
        }

        fn on_tables_changed(&self, directory: &DirectoryStore) {
            self.events
                .borrow_mut()
                .push((DirectoryKind::Tables, directory.table_count()));
        }
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn tables(ids: &[&str]) -> Vec<TableRecord> {
        ids.iter().map(|id| TableRecord::new(*id)).collect()
    }

    #[test]
    fn test_nothing_before_load_then_exactly_one() {
        init_tracing();
        let mut sync = DirectorySynchronizer::new();
        let view = Rc::new(CountingView::default());
        let _token = sync.subscribe("tables", &view);

        // Registration alone delivers nothing
        assert!(view.events.borrow().is_empty());

        sync.apply_tables(DirectoryUpdate::partial(tables(&["1"])));
        assert_eq!(sync.on_snapshot_updated(DirectoryKind::Tables), 0);
        assert!(view.events.borrow().is_empty());

        sync.apply_tables(DirectoryUpdate::full(tables(&["1", "2"])));
        assert_eq!(view.count(DirectoryKind::Tables), 1);
        assert_eq!(view.count(DirectoryKind::Players), 0);
        assert_eq!(view.events.borrow()[0], (DirectoryKind::Tables, 2));
    }

    #[test]
    fn test_pending_kinds_coalesce_on_load() {
        let mut sync = DirectorySynchronizer::new();
        let view = Rc::new(CountingView::default());
        let _token = sync.subscribe("lobby", &view);

        sync.apply_players(DirectoryUpdate::full(vec![PlayerRecord::new("alice", 1500)]));
        sync.apply_players(DirectoryUpdate::partial(vec![PlayerRecord::new("bob", 1400)]));
        sync.apply_tables(DirectoryUpdate::partial(tables(&["1"])));
        assert!(view.events.borrow().is_empty());

        sync.apply_tables(DirectoryUpdate::full(tables(&["1"])));
        assert_eq!(view.count(DirectoryKind::Players), 1);
        assert_eq!(view.count(DirectoryKind::Tables), 1);
    }

    #[test]
    fn test_updates_after_load_notify_only_their_kind() {
        let mut sync = DirectorySynchronizer::new();
        sync.apply_tables(DirectoryUpdate::full(tables(&["1"])));

        let view = Rc::new(CountingView::default());
        let _token = sync.subscribe("lobby", &view);

        sync.apply_players(DirectoryUpdate::partial(vec![PlayerRecord::new("alice", 1500)]));
        assert_eq!(view.count(DirectoryKind::Players), 1);
        assert_eq!(view.count(DirectoryKind::Tables), 0);

        // No-op update still notifies
        assert_eq!(sync.on_snapshot_updated(DirectoryKind::Tables), 1);
        assert_eq!(view.count(DirectoryKind::Tables), 1);
    }

    #[test]
    fn test_invalidated_token_skips_delivery() {
        let mut sync = DirectorySynchronizer::new();
        sync.apply_tables(DirectoryUpdate::full(tables(&["1"])));

        let view = Rc::new(CountingView::default());
        let token = sync.subscribe("tables", &view);
        token.invalidate();

        assert_eq!(sync.on_snapshot_updated(DirectoryKind::Tables), 0);
        assert!(view.events.borrow().is_empty());
        assert_eq!(sync.observer_count(), 0);
    }

    #[test]
    fn test_dropped_view_is_skipped() {
        let mut sync = DirectorySynchronizer::new();
        sync.apply_tables(DirectoryUpdate::full(tables(&["1"])));

        let view = Rc::new(CountingView::default());
        let _token = sync.subscribe("tables", &view);
        drop(view);

        assert_eq!(sync.on_snapshot_updated(DirectoryKind::Tables), 0);
    }

    #[test]
    fn test_resubscribe_replaces_stale_entry() {
        init_tracing();
        let mut sync = DirectorySynchronizer::new();
        sync.apply_tables(DirectoryUpdate::full(tables(&["1"])));

        let old_view = Rc::new(CountingView::default());
        let old_token = sync.subscribe("tables", &old_view);

        let new_view = Rc::new(CountingView::default());
        let _new_token = sync.subscribe("tables", &new_view);

        assert!(!old_token.is_alive());
        assert_eq!(sync.observer_count(), 1);

        sync.on_snapshot_updated(DirectoryKind::Tables);
        assert!(old_view.events.borrow().is_empty());
        assert_eq!(new_view.count(DirectoryKind::Tables), 1);
    }

    #[derive(Default)]
    struct PlayersOnlyView {
        refreshes: Cell<usize>,
    }

    impl DirectoryObserver for PlayersOnlyView {
        fn on_players_changed(&self, _directory: &DirectoryStore) {
            self.refreshes.set(self.refreshes.get() + 1);
        }

        fn on_tables_changed(&self, _directory: &DirectoryStore) {}
    }

    #[test]
    fn test_distinct_observer_types_share_registry() {
        let mut sync = DirectorySynchronizer::new();
        sync.apply_tables(DirectoryUpdate::full(tables(&["1"])));

        let tables_view = Rc::new(CountingView::default());
        let players_view = Rc::new(PlayersOnlyView::default());
        let _t1 = sync.subscribe("tables", &tables_view);
        let _t2 = sync.subscribe("players", &players_view);
        assert_eq!(sync.observer_count(), 2);

        assert_eq!(sync.on_snapshot_updated(DirectoryKind::Players), 2);
        assert_eq!(players_view.refreshes.get(), 1);
        assert_eq!(tables_view.count(DirectoryKind::Players), 1);

        // Subscribing does not keep the view alive
        drop(players_view);
        assert_eq!(sync.observer_count(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let mut sync = DirectorySynchronizer::new();
        sync.apply_tables(DirectoryUpdate::full(tables(&["1"])));

        let view = Rc::new(CountingView::default());
        let token = sync.subscribe("tables", &view);

        assert!(sync.unsubscribe("tables"));
        assert!(!sync.unsubscribe("tables"));
        assert!(!token.is_alive());
        assert_eq!(sync.on_snapshot_updated(DirectoryKind::Tables), 0);
    }

    #[test]
    fn test_refresh_if_loaded() {
        let mut sync = DirectorySynchronizer::new();
        let view = Rc::new(CountingView::default());
        let _token = sync.subscribe("players", &view);

        assert!(!sync.refresh_if_loaded(DirectoryKind::Players));
        assert!(view.events.borrow().is_empty());

        sync.apply_tables(DirectoryUpdate::full(vec![
            TableRecord::new("1").with_seat(Color::Red, "ghost")
        ]));
        assert!(sync.refresh_if_loaded(DirectoryKind::Players));
        assert_eq!(view.count(DirectoryKind::Players), 1);
    }

    #[test]
    fn test_unknown_seat_does_not_fail_update() {
        let mut sync = DirectorySynchronizer::new();
        let summary = sync.apply_tables(DirectoryUpdate::full(vec![
            TableRecord::new("1").with_seat(Color::Black, "nobody")
        ]));
        assert_eq!(summary.created, 1);

        let json = sync.directory().to_json();
        assert_eq!(json["tables"][0]["black"], "nobody (?)");
    }
}
