use crate::config::Settings;
use crate::error::{ErrorReporter, RemoteError};
use crate::remote::{NodeHandle, RemoteMonitor, RemoteSession};
use crate::sortable::SortableToolkit;
use crate::surface::{ListId, ListSurface};
use crate::task::Spawner;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Notifications a bound list emits about its outstanding commits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListEvent {
    /// Fired synchronously whenever a commit starts.
    ChangesPending,
    /// Every outstanding commit has completed.
    ChangesCommitted,
    SyncFailed(RemoteError),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncStatus {
    #[default]
    Idle,
    Pending,
    Saved,
    Failed,
}

impl From<&ListEvent> for SyncStatus {
    fn from(ev: &ListEvent) -> Self {
        match ev {
            ListEvent::ChangesPending => Self::Pending,
            ListEvent::ChangesCommitted => Self::Saved,
            ListEvent::SyncFailed(_) => Self::Failed,
        }
    }
}

pub type ListListener = Rc<dyn Fn(&ListId, &ListEvent)>;

pub type SessionFactory = Rc<dyn Fn() -> Option<Rc<dyn RemoteSession>>>;

/// Everything one bound list carries.
pub struct ListState {
    pub settings: Settings,
    pub surface: Rc<dyn ListSurface>,
    /// Node returned by the latest applied refresh. Never cache it across `load`.
    pub bound_node: Option<NodeHandle>,
    /// Address `bound_node` was fetched from.
    pub(crate) bound_address: Option<String>,
    pub pending_changes: usize,
    pub monitor: Option<Rc<dyn RemoteMonitor>>,
    pub status: SyncStatus,
    /// Set by auto-start and `start_monitor`, cleared by `stop_monitor`. Each applied
    /// refresh that binds a new address moves the monitor over while this holds.
    pub(crate) monitor_wanted: bool,
    /// Address the current (or starting) monitor watches.
    pub(crate) monitored_address: Option<String>,
    /// Bumped on every enable/disable; a monitor that finishes starting under an
    /// older generation is stopped right away.
    pub(crate) monitor_generation: u64,
    /// Bumped on every refresh; only the newest fetch may touch the surface.
    pub(crate) refresh_ticket: u64,
}

impl ListState {
    pub fn new(settings: Settings, surface: Rc<dyn ListSurface>) -> Self {
        Self {
            settings,
            surface,
            bound_node: None,
            bound_address: None,
            pending_changes: 0,
            monitor: None,
            status: SyncStatus::Idle,
            monitor_wanted: false,
            monitored_address: None,
            monitor_generation: 0,
            refresh_ticket: 0,
        }
    }
}

/// List state keyed by list identity.
#[derive(Default)]
pub struct ListStore {
    lists: RefCell<HashMap<ListId, ListState>>,
}

impl ListStore {
    pub fn contains(&self, list: &ListId) -> bool {
        self.lists.borrow().contains_key(list)
    }

    pub fn set(&self, list: ListId, state: ListState) {
        self.lists.borrow_mut().insert(list, state);
    }

    pub fn with<R>(&self, list: &ListId, f: impl FnOnce(&ListState) -> R) -> Option<R> {
        self.lists.borrow().get(list).map(f)
    }

    /// `f` must not call back into the store.
    pub fn with_mut<R>(&self, list: &ListId, f: impl FnOnce(&mut ListState) -> R) -> Option<R> {
        self.lists.borrow_mut().get_mut(list).map(f)
    }

    pub fn ids(&self) -> Vec<ListId> {
        let mut ids: Vec<ListId> = self.lists.borrow().keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Shared by the binding handle, background tasks and monitor listeners.
pub(crate) struct Runtime {
    pub store: ListStore,
    pub toolkit: Rc<dyn SortableToolkit>,
    pub spawner: Spawner,
    pub reporter: ErrorReporter,
    pub session_factory: RefCell<Option<SessionFactory>>,
    listeners: RefCell<Vec<ListListener>>,
}

impl Runtime {
    pub fn new(toolkit: Rc<dyn SortableToolkit>, spawner: Spawner) -> Self {
        Self {
            store: ListStore::default(),
            toolkit,
            spawner,
            reporter: ErrorReporter::default(),
            session_factory: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, listener: ListListener) {
        self.listeners.borrow_mut().push(listener);
    }

    pub fn emit(&self, list: &ListId, event: ListEvent) {
        self.store
            .with_mut(list, |s| s.status = SyncStatus::from(&event));

        // Listeners may call back into the binding.
        let listeners = self.listeners.borrow().clone();
        for l in listeners {
            l(list, &event);
        }
    }
}
