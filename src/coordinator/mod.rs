//! The bound-list handle and drag-event coordination.
//!
//! A [`Nextlist`] owns every list bound on the page. Drag events from the sortable
//! toolkit are translated into remote edits here:
//!
//! - reorder inside one list: shielded remove, insert at the new index, one commit.
//! - move between lists: shielded remove from the source node, insert into the
//!   destination node, one commit per list.

use crate::config::{MonitorInterval, NextlistOptions, Settings};
use crate::error::{NextlistError, NextlistResult};
use crate::remote::{insert_node, NodeHandle, RemoteSession};
use crate::sortable::{SortEvent, SortableToolkit};
use crate::state::{ListEvent, ListState, Runtime, SessionFactory, SyncStatus};
use crate::surface::{DragTransfer, ListId, ListSurface, VisualItem};
use crate::sync::{commit, disable_monitor, spawn_enable_monitor, spawn_refresh};
use crate::task::Spawner;
use std::rc::Rc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct Nextlist {
    rt: Rc<Runtime>,
}

impl Nextlist {
    pub fn new(toolkit: Rc<dyn SortableToolkit>, spawner: Spawner) -> Self {
        Self {
            rt: Rc::new(Runtime::new(toolkit, spawner)),
        }
    }

    /// Binding for the browser: background work on the Leptos executor and sessions
    /// created through the `Nextweb` global when options carry none.
    pub fn browser(toolkit: Rc<dyn SortableToolkit>) -> Self {
        Self::new(toolkit, Spawner::browser()).with_session_factory(Rc::new(|| {
            match crate::remote::js::create_session() {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!("could not create a Nextweb session: {e}");
                    None
                }
            }
        }))
    }

    /// Source of sessions for lists initialized without one.
    pub fn with_session_factory(self, factory: SessionFactory) -> Self {
        *self.rt.session_factory.borrow_mut() = Some(factory);
        self
    }

    /// When off (the default), configuration errors are only logged at debug level.
    pub fn set_debug_mode(&self, on: bool) {
        self.rt.reporter.set_debug_mode(on);
    }

    pub fn debug_mode(&self) -> bool {
        self.rt.reporter.debug_mode()
    }

    pub fn subscribe(&self, listener: impl Fn(&ListId, &ListEvent) + 'static) {
        self.rt.subscribe(Rc::new(listener));
    }

    fn fail<T>(&self, err: NextlistError) -> NextlistResult<T> {
        Err(self.rt.reporter.report(err))
    }

    fn ensure_initialized(&self, list: &ListId) -> NextlistResult<()> {
        if self.rt.store.contains(list) {
            Ok(())
        } else {
            self.fail(NextlistError::NotInitialized)
        }
    }

    /// Binds `list` to the remote node named in `options` and loads its items.
    ///
    /// Nothing is stored unless every check passes. The first refresh runs in the
    /// background; with `autoStartMonitoring` the monitor starts once a refresh has
    /// bound the node, whichever refresh that turns out to be.
    pub fn initialize(
        &self,
        list: &ListId,
        surface: Rc<dyn ListSurface>,
        options: NextlistOptions,
    ) -> NextlistResult<()> {
        if self.rt.store.contains(list) {
            return self.fail(NextlistError::AlreadyInitialized);
        }

        let factory = self.rt.session_factory.borrow().clone();
        match (&options.remote_session, &factory) {
            (None, None) => return self.fail(NextlistError::SessionUnavailable),
            (Some(session), _) if !session.is_open() => {
                return self.fail(NextlistError::InvalidSession)
            }
            _ => {}
        }

        if !self.rt.toolkit.is_sortable(list) {
            return self.fail(NextlistError::ToolkitUnavailable);
        }
        let Some(address) = non_empty(options.remote_node_address.as_deref()) else {
            return self.fail(NextlistError::MissingAddress);
        };
        let Some(secret) = non_empty(options.remote_node_secret.as_deref()) else {
            return self.fail(NextlistError::MissingSecret);
        };

        let session = match (options.remote_session.clone(), factory) {
            (Some(session), _) => session,
            (None, Some(create)) => match create() {
                Some(session) => session,
                None => return self.fail(NextlistError::SessionUnavailable),
            },
            (None, None) => return self.fail(NextlistError::SessionUnavailable),
        };

        let settings = Settings::from_options(options, session, address, secret);
        info!(list = %list, address = %settings.node_address, "binding list");
        let mut state = ListState::new(settings, surface);
        state.monitor_wanted = state.settings.auto_start_monitoring;
        self.rt.store.set(list.clone(), state);

        spawn_refresh(&self.rt, list);
        Ok(())
    }

    /// Rebinds an initialized list to another remote node.
    ///
    /// A wanted monitor moves over to the new node once a refresh has bound it.
    pub fn load(&self, list: &ListId, address: &str, secret: &str) -> NextlistResult<()> {
        self.ensure_initialized(list)?;
        let Some(address) = non_empty(Some(address)) else {
            return self.fail(NextlistError::MissingAddress);
        };
        let Some(secret) = non_empty(Some(secret)) else {
            return self.fail(NextlistError::MissingSecret);
        };

        info!(list = %list, address = %address, "rebinding list");
        self.rt.store.with_mut(list, |s| {
            s.settings.node_address = address;
            s.settings.node_secret = secret;
        });

        spawn_refresh(&self.rt, list);
        Ok(())
    }

    /// Re-fetches the list's items without changing its binding.
    pub fn reload(&self, list: &ListId) -> NextlistResult<()> {
        self.ensure_initialized(list)?;
        spawn_refresh(&self.rt, list);
        Ok(())
    }

    pub fn get_session(&self, list: &ListId) -> NextlistResult<Rc<dyn RemoteSession>> {
        self.ensure_initialized(list)?;
        self.rt
            .store
            .with(list, |s| s.settings.session.clone())
            .ok_or(NextlistError::NotInitialized)
    }

    /// Starts (or restarts) change monitoring. `None` keeps the configured interval.
    ///
    /// A list that was never fetched is loaded first; the monitor starts when that
    /// refresh binds the node.
    pub fn start_monitor(
        &self,
        list: &ListId,
        interval: Option<MonitorInterval>,
    ) -> NextlistResult<()> {
        self.ensure_initialized(list)?;
        let loaded = self
            .rt
            .store
            .with_mut(list, |s| {
                s.monitor_wanted = true;
                if let Some(i) = interval {
                    s.settings.monitor_interval = i;
                }
                s.bound_node.is_some()
            })
            .unwrap_or(false);

        if loaded {
            spawn_enable_monitor(&self.rt, list, interval);
        } else {
            spawn_refresh(&self.rt, list);
        }
        Ok(())
    }

    pub fn stop_monitor(&self, list: &ListId) -> NextlistResult<()> {
        self.ensure_initialized(list)?;
        self.rt.store.with_mut(list, |s| s.monitor_wanted = false);
        if let Some(stop) = disable_monitor(&self.rt, list) {
            let list = list.clone();
            self.rt.spawner.spawn(async move {
                if let Err(e) = stop.await {
                    warn!(list = %list, "failed to stop monitor: {e}");
                }
            });
        }
        Ok(())
    }

    pub fn is_initialized(&self, list: &ListId) -> bool {
        self.rt.store.contains(list)
    }

    pub fn pending_changes(&self, list: &ListId) -> Option<usize> {
        self.rt.store.with(list, |s| s.pending_changes)
    }

    pub fn status(&self, list: &ListId) -> Option<SyncStatus> {
        self.rt.store.with(list, |s| s.status)
    }

    pub fn monitor_active(&self, list: &ListId) -> bool {
        self.rt
            .store
            .with(list, |s| s.monitor.is_some())
            .unwrap_or(false)
    }

    pub fn lists(&self) -> Vec<ListId> {
        self.rt.store.ids()
    }

    /// Feeds one toolkit event to the list it was fired on.
    ///
    /// Events for lists that were never initialized are ignored, like events on an
    /// element without handlers. Remote edits are issued before this returns; their
    /// commits complete in the background.
    pub fn handle(&self, event: SortEvent) -> NextlistResult<()> {
        if !self.rt.store.contains(event.list()) {
            debug!(event = ?event, "ignoring event for unbound list");
            return Ok(());
        }
        debug!(event = ?event, "sort event");

        match event {
            SortEvent::Start { list, item, index } => {
                item.set_transfer(DragTransfer {
                    original_list: list,
                    original_index: index,
                });
                Ok(())
            }
            SortEvent::Stop {
                list,
                item,
                parent,
                index,
            } => self.on_stop(&list, item, &parent, index),
            SortEvent::Remove { parent, .. } => {
                if self.rt.store.contains(&parent) {
                    Ok(())
                } else {
                    self.fail(NextlistError::DestinationNotInitialized)
                }
            }
            SortEvent::Receive { list, item, index } => self.on_receive(&list, item, index),
        }
    }

    fn bound(&self, list: &ListId) -> NextlistResult<(Rc<dyn RemoteSession>, NodeHandle)> {
        let Some((session, node)) = self
            .rt
            .store
            .with(list, |s| (s.settings.session.clone(), s.bound_node.clone()))
        else {
            return self.fail(NextlistError::NotInitialized);
        };
        match node {
            Some(node) => Ok((session, node)),
            None => self.fail(NextlistError::NotLoaded),
        }
    }

    /// Reorder inside `list`. Drops into another list are handled by `Receive`.
    fn on_stop(
        &self,
        list: &ListId,
        item: Rc<VisualItem>,
        parent: &ListId,
        index: usize,
    ) -> NextlistResult<()> {
        let Some(transfer) = item.take_transfer() else {
            return Ok(());
        };
        if transfer.original_list != *parent {
            return Ok(());
        }
        if transfer.original_index == index {
            debug!(list = %list, index, "item dropped where it started");
            return Ok(());
        }

        let (session, node) = self.bound(list)?;
        node.remove_shielded(&item.node());
        let new_node = insert_node(session.as_ref(), node.as_ref(), item.text(), index);
        let pending = commit(&self.rt, list)?;

        self.rt.spawner.spawn(async move {
            if pending.await.is_ok() {
                item.set_node(new_node);
            }
        });
        Ok(())
    }

    /// `list` is the destination; the source comes from the drag transfer.
    ///
    /// An item without a transfer was picked up from a list nobody bound.
    fn on_receive(&self, list: &ListId, item: Rc<VisualItem>, index: usize) -> NextlistResult<()> {
        let source = match item.take_transfer() {
            Some(t) if self.rt.store.contains(&t.original_list) => t.original_list,
            _ => return self.fail(NextlistError::SourceNotInitialized),
        };

        let (_, source_node) = self.bound(&source)?;
        let (session, dest_node) = self.bound(list)?;

        source_node.remove_shielded(&item.node());
        let new_node = insert_node(session.as_ref(), dest_node.as_ref(), item.text(), index);

        let source_pending = commit(&self.rt, &source)?;
        let dest_pending = commit(&self.rt, list)?;

        self.rt.spawner.spawn(async move {
            let _ = source_pending.await;
        });
        self.rt.spawner.spawn(async move {
            if dest_pending.await.is_ok() {
                item.set_node(new_node);
            }
        });
        Ok(())
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::{MemoryStore, RemoteCall};
    use crate::sortable::memory::MemorySortable;
    use crate::surface::memory::MemorySurface;
    use futures::executor::LocalPool;
    use std::cell::RefCell;

    struct Harness {
        pool: LocalPool,
        store: MemoryStore,
        toolkit: Rc<MemorySortable>,
        nextlist: Nextlist,
    }

    fn harness() -> Harness {
        let pool = LocalPool::new();
        let toolkit = Rc::new(MemorySortable::new());
        let nextlist = Nextlist::new(toolkit.clone(), Spawner::from(pool.spawner()));
        Harness {
            pool,
            store: MemoryStore::new(),
            toolkit,
            nextlist,
        }
    }

    impl Harness {
        fn bind(&mut self, id: &str, address: &str, values: &[&str]) -> (ListId, Rc<MemorySurface>) {
            self.store.create_node(address, "s", values);
            let list = ListId::new(id);
            self.toolkit.connect(&list);
            let surface = Rc::new(MemorySurface::new());
            let options = NextlistOptions::new(address, "s")
                .with_session(Rc::new(self.store.session()));
            self.nextlist
                .initialize(&list, surface.clone(), options)
                .unwrap();
            self.pool.run_until_stalled();
            (list, surface)
        }

        fn dispatch(&mut self, events: Vec<SortEvent>) -> Vec<NextlistResult<()>> {
            let results = events
                .into_iter()
                .map(|ev| self.nextlist.handle(ev))
                .collect();
            self.pool.run_until_stalled();
            results
        }
    }

    #[test]
    fn test_initialize_loads_and_starts_monitor() {
        let mut h = harness();
        let (list, surface) = h.bind("todo", "a", &["x", "y"]);

        assert_eq!(surface.texts(), vec!["x", "y"]);
        assert!(h.nextlist.is_initialized(&list));
        assert!(h.nextlist.monitor_active(&list));
        assert_eq!(h.store.active_monitors("a"), 1);
        assert_eq!(h.nextlist.pending_changes(&list), Some(0));
        assert_eq!(h.nextlist.status(&list), Some(SyncStatus::Idle));
        assert_eq!(h.nextlist.lists(), vec![list]);
    }

    #[test]
    fn test_initialize_without_auto_monitoring() {
        let mut h = harness();
        h.store.create_node("a", "s", &["x"]);
        let list = ListId::new("todo");
        h.toolkit.connect(&list);
        let mut options =
            NextlistOptions::new("a", "s").with_session(Rc::new(h.store.session()));
        options.auto_start_monitoring = false;

        h.nextlist
            .initialize(&list, Rc::new(MemorySurface::new()), options)
            .unwrap();
        h.pool.run_until_stalled();
        assert!(!h.nextlist.monitor_active(&list));
        assert_eq!(h.store.active_monitors("a"), 0);
    }

    #[test]
    fn test_auto_monitor_starts_when_first_refresh_is_superseded() {
        let mut h = harness();
        h.store.create_node("a", "s", &["x"]);
        let list = ListId::new("todo");
        h.toolkit.connect(&list);
        let surface = Rc::new(MemorySurface::new());

        let release = h.store.hold_next_lookup();
        h.nextlist
            .initialize(
                &list,
                surface.clone(),
                NextlistOptions::new("a", "s").with_session(Rc::new(h.store.session())),
            )
            .unwrap();
        h.pool.run_until_stalled();

        h.nextlist.reload(&list).unwrap();
        h.pool.run_until_stalled();
        release.send(()).unwrap();
        h.pool.run_until_stalled();

        assert_eq!(surface.texts(), vec!["x"]);
        assert!(h.nextlist.monitor_active(&list));
        assert_eq!(h.store.active_monitors("a"), 1);
    }

    #[test]
    fn test_initialize_validation_order() {
        let h = harness();
        let list = ListId::new("todo");
        let surface = || Rc::new(MemorySurface::new()) as Rc<dyn ListSurface>;

        // No session and no way to create one.
        let err = h
            .nextlist
            .initialize(&list, surface(), NextlistOptions::new("a", "s"));
        assert_eq!(err, Err(NextlistError::SessionUnavailable));

        let closed = h.store.session();
        closed.close();
        let err = h.nextlist.initialize(
            &list,
            surface(),
            NextlistOptions::new("a", "s").with_session(Rc::new(closed)),
        );
        assert_eq!(err, Err(NextlistError::InvalidSession));

        let session: Rc<dyn RemoteSession> = Rc::new(h.store.session());
        let err = h.nextlist.initialize(
            &list,
            surface(),
            NextlistOptions::new("a", "s").with_session(session.clone()),
        );
        assert_eq!(err, Err(NextlistError::ToolkitUnavailable));

        h.toolkit.connect(&list);
        let err = h.nextlist.initialize(
            &list,
            surface(),
            NextlistOptions::new("", "s").with_session(session.clone()),
        );
        assert_eq!(err, Err(NextlistError::MissingAddress));

        let mut no_secret = NextlistOptions::default().with_session(session);
        no_secret.remote_node_address = Some("a".to_string());
        let err = h.nextlist.initialize(&list, surface(), no_secret);
        assert_eq!(err, Err(NextlistError::MissingSecret));

        assert!(!h.nextlist.is_initialized(&list));
        assert!(h.store.calls().is_empty());
    }

    #[test]
    fn test_initialize_uses_session_factory() {
        let mut h = harness();
        h.store.create_node("a", "s", &["x"]);
        let store = h.store.clone();
        let created = Rc::new(RefCell::new(0));
        let c = created.clone();
        let nextlist = h.nextlist.clone().with_session_factory(Rc::new(move || {
            *c.borrow_mut() += 1;
            Some(Rc::new(store.session()) as Rc<dyn RemoteSession>)
        }));

        let list = ListId::new("todo");
        h.toolkit.connect(&list);
        let surface = Rc::new(MemorySurface::new());
        nextlist
            .initialize(&list, surface.clone(), NextlistOptions::new("a", "s"))
            .unwrap();
        h.pool.run_until_stalled();

        assert_eq!(*created.borrow(), 1);
        assert_eq!(surface.texts(), vec!["x"]);
        assert!(nextlist.get_session(&list).is_ok());
    }

    #[test]
    fn test_methods_require_initialization() {
        let h = harness();
        let list = ListId::new("nowhere");
        assert_eq!(h.nextlist.reload(&list), Err(NextlistError::NotInitialized));
        assert_eq!(
            h.nextlist.load(&list, "a", "s"),
            Err(NextlistError::NotInitialized)
        );
        assert_eq!(
            h.nextlist.start_monitor(&list, None),
            Err(NextlistError::NotInitialized)
        );
        assert_eq!(
            h.nextlist.stop_monitor(&list),
            Err(NextlistError::NotInitialized)
        );
        assert!(h.nextlist.get_session(&list).is_err());
        assert_eq!(h.nextlist.pending_changes(&list), None);
    }

    #[test]
    fn test_load_rebinds_and_moves_monitor() {
        let mut h = harness();
        let (list, surface) = h.bind("todo", "a", &["x"]);
        h.store.create_node("b", "s", &["p", "q"]);

        assert_eq!(h.nextlist.load(&list, "", "s"), Err(NextlistError::MissingAddress));
        assert_eq!(h.nextlist.load(&list, "b", ""), Err(NextlistError::MissingSecret));
        assert_eq!(surface.texts(), vec!["x"]);

        h.nextlist.load(&list, "b", "s").unwrap();
        h.pool.run_until_stalled();

        assert_eq!(surface.texts(), vec!["p", "q"]);
        assert_eq!(h.store.active_monitors("a"), 0);
        assert_eq!(h.store.active_monitors("b"), 1);

        // The monitor now follows the new node.
        h.store.external_insert("b", "r", 2);
        assert_eq!(h.store.tick(), 1);
        h.pool.run_until_stalled();
        assert_eq!(surface.texts(), vec!["p", "q", "r"]);
    }

    #[test]
    fn test_load_moves_monitor_when_its_refresh_is_superseded() {
        let mut h = harness();
        let (list, surface) = h.bind("todo", "a", &["x"]);
        h.store.create_node("b", "s", &["p"]);

        let release = h.store.hold_next_lookup();
        h.nextlist.load(&list, "b", "s").unwrap();
        h.pool.run_until_stalled();
        h.nextlist.reload(&list).unwrap();
        h.pool.run_until_stalled();
        release.send(()).unwrap();
        h.pool.run_until_stalled();

        assert_eq!(surface.texts(), vec!["p"]);
        assert_eq!(h.store.active_monitors("a"), 0);
        assert_eq!(h.store.active_monitors("b"), 1);

        h.store.external_insert("b", "q", 1);
        assert_eq!(h.store.tick(), 1);
        h.pool.run_until_stalled();
        assert_eq!(surface.texts(), vec!["p", "q"]);
    }

    #[test]
    fn test_start_monitor_before_first_load() {
        let mut h = harness();
        h.store.create_node("a", "s", &["x"]);
        let list = ListId::new("todo");
        h.toolkit.connect(&list);
        let mut options =
            NextlistOptions::new("a", "s").with_session(Rc::new(h.store.session()));
        options.auto_start_monitoring = false;

        let release = h.store.hold_next_lookup();
        h.nextlist
            .initialize(&list, Rc::new(MemorySurface::new()), options)
            .unwrap();
        h.pool.run_until_stalled();

        h.nextlist
            .start_monitor(&list, Some(MonitorInterval::Slow))
            .unwrap();
        h.pool.run_until_stalled();
        drop(release);
        h.pool.run_until_stalled();

        assert!(h.nextlist.monitor_active(&list));
        assert_eq!(h.store.monitor_interval("a"), Some(MonitorInterval::Slow));
    }

    #[test]
    fn test_load_without_monitor_does_not_start_one() {
        let mut h = harness();
        let (list, _) = h.bind("todo", "a", &["x"]);
        h.store.create_node("b", "s", &[]);
        h.nextlist.stop_monitor(&list).unwrap();
        h.pool.run_until_stalled();

        h.nextlist.load(&list, "b", "s").unwrap();
        h.pool.run_until_stalled();
        assert!(!h.nextlist.monitor_active(&list));
        assert_eq!(h.store.active_monitors("b"), 0);
    }

    #[test]
    fn test_start_and_stop_monitor() {
        let mut h = harness();
        let (list, _) = h.bind("todo", "a", &["x"]);

        h.nextlist
            .start_monitor(&list, Some(MonitorInterval::ExtraSlow))
            .unwrap();
        h.pool.run_until_stalled();
        assert_eq!(h.store.active_monitors("a"), 1);
        assert_eq!(h.store.monitor_interval("a"), Some(MonitorInterval::ExtraSlow));

        h.nextlist.stop_monitor(&list).unwrap();
        h.pool.run_until_stalled();
        assert!(!h.nextlist.monitor_active(&list));
        assert_eq!(h.store.active_monitors("a"), 0);

        // Stopping twice is harmless.
        h.nextlist.stop_monitor(&list).unwrap();
    }

    #[test]
    fn test_reorder_commits_and_reassociates_item() {
        let mut h = harness();
        let (list, surface) = h.bind("todo", "a", &["x", "y", "z"]);
        h.store.clear_calls();

        let events = h.toolkit.drag_within(&list, &surface, 0, 2);
        let moved = surface.get(2).unwrap();
        let old_node = moved.node();
        h.dispatch(events);

        assert_eq!(h.store.children("a"), vec!["y", "z", "x"]);
        assert!(!Rc::ptr_eq(&moved.node(), &old_node));
        assert_eq!(h.nextlist.pending_changes(&list), Some(0));
        assert_eq!(h.nextlist.status(&list), Some(SyncStatus::Saved));
        assert!(h.store.calls().contains(&RemoteCall::Remove {
            parent: h.store.node_id("a").unwrap(),
            value: "x".to_string(),
            shielded: true,
        }));
    }

    #[test]
    fn test_failed_reorder_keeps_old_node() {
        let mut h = harness();
        let (list, surface) = h.bind("todo", "a", &["x", "y"]);
        h.store.fail_next_commits(1);

        let events = h.toolkit.drag_within(&list, &surface, 1, 0);
        let moved = surface.get(0).unwrap();
        let old_node = moved.node();
        h.dispatch(events);

        assert!(Rc::ptr_eq(&moved.node(), &old_node));
        assert_eq!(h.nextlist.status(&list), Some(SyncStatus::Failed));
        assert_eq!(h.nextlist.pending_changes(&list), Some(0));
        assert_eq!(h.store.children("a"), vec!["x", "y"]);
        // The rejected order is rolled back on screen.
        assert_eq!(surface.texts(), vec!["x", "y"]);
    }

    #[test]
    fn test_drag_transfer_is_cleared_when_gesture_ends() {
        let mut h = harness();
        let (list, surface) = h.bind("todo", "a", &["x", "y"]);
        let events = h.toolkit.drag_within(&list, &surface, 0, 1);
        let moved = surface.get(1).unwrap();
        h.dispatch(events);
        assert!(moved.transfer().is_none());

        let (left, left_surface) = h.bind("left", "b", &["p"]);
        let (right, right_surface) = h.bind("right", "c", &[]);
        let events = h.toolkit.drag_between(
            (&left, left_surface.as_ref()),
            0,
            (&right, right_surface.as_ref()),
            0,
        );
        let moved = right_surface.get(0).unwrap();
        let results = h.dispatch(events);
        assert!(results.iter().all(|r| r.is_ok()));
        assert!(moved.transfer().is_none());
        assert_eq!(h.store.children("c"), vec!["p"]);
    }

    #[test]
    fn test_stop_without_start_is_ignored() {
        let mut h = harness();
        let (list, surface) = h.bind("todo", "a", &["x", "y"]);
        h.store.clear_calls();

        let item = surface.get(0).unwrap();
        let results = h.dispatch(vec![SortEvent::Stop {
            list: list.clone(),
            item,
            parent: list,
            index: 1,
        }]);
        assert!(results.iter().all(|r| r.is_ok()));
        assert!(h.store.calls().is_empty());
    }

    #[test]
    fn test_move_to_unbound_destination_is_reported() {
        let mut h = harness();
        h.nextlist.set_debug_mode(true);
        let (src, src_surface) = h.bind("left", "a", &["p"]);
        let dest = ListId::new("right");
        let dest_surface = MemorySurface::new();
        h.store.clear_calls();

        let events = h
            .toolkit
            .drag_between((&src, src_surface.as_ref()), 0, (&dest, &dest_surface), 0);
        let results = h.dispatch(events);

        assert!(results.contains(&Err(NextlistError::DestinationNotInitialized)));
        // The visual move is not rolled back and nothing reaches the store.
        assert_eq!(dest_surface.texts(), vec!["p"]);
        assert!(src_surface.is_empty());
        assert!(!h.store.calls().iter().any(RemoteCall::is_write));
    }

    #[test]
    fn test_move_from_unbound_source_is_reported() {
        let mut h = harness();
        let (dest, dest_surface) = h.bind("right", "b", &["q"]);
        let src = ListId::new("left");
        let src_surface = MemorySurface::new();
        let seed = h.nextlist.get_session(&dest).unwrap().seed();
        seed.set_value("p");
        crate::render::render_item(seed, &src_surface, &Default::default(), None);
        h.store.clear_calls();

        let events = h
            .toolkit
            .drag_between((&src, &src_surface), 0, (&dest, dest_surface.as_ref()), 1);
        let results = h.dispatch(events);

        assert!(results.contains(&Err(NextlistError::SourceNotInitialized)));
        assert_eq!(h.nextlist.pending_changes(&dest), Some(0));
        assert!(!h.store.calls().iter().any(RemoteCall::is_write));
    }

    #[test]
    fn test_events_on_unbound_lists_are_ignored() {
        let mut h = harness();
        let list = ListId::new("plain");
        let surface = MemorySurface::new();
        let session = h.store.session();
        let seed = session.seed();
        seed.set_value("x");
        crate::render::render_item(seed.clone(), &surface, &Default::default(), None);
        crate::render::render_item(seed, &surface, &Default::default(), None);

        let events = h.toolkit.drag_within(&list, &surface, 0, 1);
        let results = h.dispatch(events);
        assert!(results.iter().all(|r| r.is_ok()));
        assert!(h.store.calls().is_empty());
    }
}
