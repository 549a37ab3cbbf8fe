//! In-memory remote store.
//!
//! Sessions share one tree. Structural edits are queued per session and applied on
//! commit; monitors are polled explicitly with [`MemoryStore::tick`]. Every call is
//! recorded so callers can assert on the exact remote traffic a gesture produced.

use super::{MonitorListener, NodeHandle, RemoteFuture, RemoteMonitor, RemoteNode, RemoteSession};
use crate::config::MonitorInterval;
use crate::error::{RemoteError, RemoteErrorKind, RemoteResult};
use futures::channel::oneshot;
use futures::FutureExt;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

pub type NodeId = u64;
pub type SessionId = u64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteCall {
    Node { address: String },
    SelectAll { node: NodeId },
    Insert { parent: NodeId, value: String, position: usize },
    Remove { parent: NodeId, value: String, shielded: bool },
    Commit { session: SessionId },
    Monitor { node: NodeId },
    StopMonitor { node: NodeId },
}

impl RemoteCall {
    /// Calls that change (or persist changes to) the tree.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::Insert { .. } | Self::Remove { .. } | Self::Commit { .. }
        )
    }
}

#[derive(Debug, Default)]
struct NodeData {
    value: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

#[derive(Debug)]
enum Mutation {
    Insert {
        parent: NodeId,
        child: NodeId,
        position: usize,
    },
    Remove {
        parent: NodeId,
        child: NodeId,
        shielded: bool,
    },
}

struct MonitorEntry {
    id: u64,
    node: NodeId,
    session: SessionId,
    interval: MonitorInterval,
    listeners: Vec<MonitorListener>,
    active: bool,
    dirty: bool,
}

#[derive(Default)]
struct StoreInner {
    nodes: HashMap<NodeId, NodeData>,
    addresses: HashMap<String, (NodeId, String)>,
    monitors: Vec<MonitorEntry>,
    calls: Vec<RemoteCall>,
    next_id: u64,
    hold_commits: bool,
    held: VecDeque<oneshot::Sender<()>>,
    lookup_gates: VecDeque<oneshot::Receiver<()>>,
    failing_commits: usize,
    offline: bool,
}

impl StoreInner {
    fn alloc(&mut self, value: &str) -> NodeId {
        self.next_id += 1;
        let id = self.next_id;
        self.nodes.insert(
            id,
            NodeData {
                value: value.to_string(),
                ..Default::default()
            },
        );
        id
    }

    fn mark_dirty(&mut self, node: NodeId, skip_session: Option<SessionId>) {
        for m in self.monitors.iter_mut() {
            if m.active && m.node == node && Some(m.session) != skip_session {
                m.dirty = true;
            }
        }
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get(&child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|c| *c != child);
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = None;
        }
    }

    fn apply(&mut self, session: SessionId, batch: Vec<Mutation>) -> RemoteResult<()> {
        if self.offline {
            return Err(RemoteError::network("store is offline"));
        }
        if self.failing_commits > 0 {
            self.failing_commits -= 1;
            return Err(RemoteError::new(
                RemoteErrorKind::Rejected,
                "commit rejected by store",
            ));
        }
        self.apply_batch(session, batch);
        Ok(())
    }

    fn apply_batch(&mut self, session: SessionId, batch: Vec<Mutation>) {
        for m in batch {
            match m {
                Mutation::Insert {
                    parent,
                    child,
                    position,
                } => {
                    if !self.nodes.contains_key(&parent) || !self.nodes.contains_key(&child) {
                        continue;
                    }
                    self.detach(child);
                    if let Some(p) = self.nodes.get_mut(&parent) {
                        let at = position.min(p.children.len());
                        p.children.insert(at, child);
                    }
                    if let Some(c) = self.nodes.get_mut(&child) {
                        c.parent = Some(parent);
                    }
                    self.mark_dirty(parent, None);
                }
                Mutation::Remove {
                    parent,
                    child,
                    shielded,
                } => {
                    let attached = self
                        .nodes
                        .get(&child)
                        .is_some_and(|c| c.parent == Some(parent));
                    if !attached {
                        continue;
                    }
                    self.detach(child);
                    self.mark_dirty(parent, shielded.then_some(session));
                }
            }
        }
    }
}

/// Shared tree backing any number of [`MemorySession`]s.
#[derive(Clone, Default)]
pub struct MemoryStore(Rc<RefCell<StoreInner>>);

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an addressable node whose children carry `values`, in order.
    pub fn create_node(&self, address: &str, secret: &str, values: &[&str]) -> NodeId {
        let mut s = self.0.borrow_mut();
        let id = s.alloc("");
        for v in values {
            let child = s.alloc(v);
            if let Some(c) = s.nodes.get_mut(&child) {
                c.parent = Some(id);
            }
            if let Some(p) = s.nodes.get_mut(&id) {
                p.children.push(child);
            }
        }
        s.addresses
            .insert(address.to_string(), (id, secret.to_string()));
        id
    }

    pub fn session(&self) -> MemorySession {
        let mut s = self.0.borrow_mut();
        s.next_id += 1;
        MemorySession {
            inner: Rc::new(SessionInner {
                store: self.clone(),
                id: s.next_id,
                pending: RefCell::new(Vec::new()),
                open: Cell::new(true),
            }),
        }
    }

    /// Committed child values of the node at `address`.
    pub fn children(&self, address: &str) -> Vec<String> {
        let s = self.0.borrow();
        let Some((id, _)) = s.addresses.get(address) else {
            return vec![];
        };
        s.nodes
            .get(id)
            .map(|n| {
                n.children
                    .iter()
                    .filter_map(|c| s.nodes.get(c).map(|d| d.value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn node_id(&self, address: &str) -> Option<NodeId> {
        self.0.borrow().addresses.get(address).map(|(id, _)| *id)
    }

    /// Simulates another client committing a new child at `position`.
    pub fn external_insert(&self, address: &str, value: &str, position: usize) {
        let mut s = self.0.borrow_mut();
        let Some((parent, _)) = s.addresses.get(address).cloned() else {
            return;
        };
        let child = s.alloc(value);
        let batch = vec![Mutation::Insert {
            parent,
            child,
            position,
        }];
        s.apply_batch(0, batch);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.0.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.0.borrow_mut().calls.clear();
    }

    /// While held, commits wait until released with [`MemoryStore::release_commit`].
    pub fn hold_commits(&self, hold: bool) {
        self.0.borrow_mut().hold_commits = hold;
    }

    pub fn held_commits(&self) -> usize {
        self.0.borrow().held.len()
    }

    /// Lets the oldest held commit complete. Returns false when none was waiting.
    pub fn release_commit(&self) -> bool {
        let tx = self.0.borrow_mut().held.pop_front();
        match tx {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    pub fn release_all_commits(&self) {
        while self.release_commit() {}
    }

    /// The next node lookup, from any session, resolves only once the returned
    /// sender fires (or is dropped).
    pub fn hold_next_lookup(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.0.borrow_mut().lookup_gates.push_back(rx);
        tx
    }

    pub fn fail_next_commits(&self, n: usize) {
        self.0.borrow_mut().failing_commits = n;
    }

    pub fn set_offline(&self, offline: bool) {
        self.0.borrow_mut().offline = offline;
    }

    pub fn active_monitors(&self, address: &str) -> usize {
        let s = self.0.borrow();
        let Some((id, _)) = s.addresses.get(address) else {
            return 0;
        };
        s.monitors
            .iter()
            .filter(|m| m.active && m.node == *id)
            .count()
    }

    pub fn monitor_interval(&self, address: &str) -> Option<MonitorInterval> {
        let s = self.0.borrow();
        let (id, _) = s.addresses.get(address)?;
        s.monitors
            .iter()
            .rev()
            .find(|m| m.active && m.node == *id)
            .map(|m| m.interval)
    }

    /// One polling round: notifies every active monitor whose node changed since the
    /// previous tick. Returns how many monitors fired.
    pub fn tick(&self) -> usize {
        let fired: Vec<Vec<MonitorListener>> = {
            let mut s = self.0.borrow_mut();
            s.monitors
                .iter_mut()
                .filter(|m| m.active && m.dirty)
                .map(|m| {
                    m.dirty = false;
                    m.listeners.clone()
                })
                .collect()
        };

        for listeners in fired.iter() {
            for l in listeners {
                l();
            }
        }
        fired.len()
    }

    fn record(&self, call: RemoteCall) {
        self.0.borrow_mut().calls.push(call);
    }

    fn value_of(&self, id: NodeId) -> String {
        self.0
            .borrow()
            .nodes
            .get(&id)
            .map(|n| n.value.clone())
            .unwrap_or_default()
    }
}

struct SessionInner {
    store: MemoryStore,
    id: SessionId,
    pending: RefCell<Vec<Mutation>>,
    open: Cell<bool>,
}

#[derive(Clone)]
pub struct MemorySession {
    inner: Rc<SessionInner>,
}

impl MemorySession {
    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    pub fn close(&self) {
        self.inner.open.set(false);
    }

    pub fn queued_edits(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    fn handle(&self, id: NodeId) -> NodeHandle {
        Rc::new(MemoryNode {
            session: self.inner.clone(),
            id,
        })
    }
}

impl RemoteSession for MemorySession {
    fn node(&self, address: &str, secret: &str) -> RemoteFuture<NodeHandle> {
        let store = &self.inner.store;
        store.record(RemoteCall::Node {
            address: address.to_string(),
        });

        let (found, gate) = {
            let mut s = store.0.borrow_mut();
            let gate = s.lookup_gates.pop_front();
            let found = if s.offline {
                Err(RemoteError::network("store is offline"))
            } else {
                match s.addresses.get(address) {
                    Some((id, expected)) if expected == secret => Ok(*id),
                    Some(_) => Err(RemoteError::new(
                        RemoteErrorKind::Rejected,
                        format!("wrong secret for {address}"),
                    )),
                    None => Err(RemoteError::not_found(address)),
                }
            };
            (found, gate)
        };

        let result = found.map(|id| self.handle(id));
        async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            result
        }
        .boxed_local()
    }

    fn seed(&self) -> NodeHandle {
        let id = self.inner.store.0.borrow_mut().alloc("");
        self.handle(id)
    }

    fn commit(&self) -> RemoteFuture<()> {
        let store = self.inner.store.clone();
        let session = self.inner.id;
        store.record(RemoteCall::Commit { session });

        // Edits queued after this point belong to the next commit.
        let batch = self.inner.pending.take();

        let gate = {
            let mut s = store.0.borrow_mut();
            if s.hold_commits {
                let (tx, rx) = oneshot::channel();
                s.held.push_back(tx);
                Some(rx)
            } else {
                None
            }
        };

        async move {
            if let Some(rx) = gate {
                rx.await
                    .map_err(|_| RemoteError::network("commit was abandoned"))?;
            }
            store.0.borrow_mut().apply(session, batch)
        }
        .boxed_local()
    }

    fn is_open(&self) -> bool {
        self.inner.open.get()
    }
}

struct MemoryNode {
    session: Rc<SessionInner>,
    id: NodeId,
}

impl MemoryNode {
    fn store(&self) -> &MemoryStore {
        &self.session.store
    }

    fn queue(&self, m: Mutation) {
        self.session.pending.borrow_mut().push(m);
    }
}

/// Handles from another store (or another backend) have no id here.
fn node_id(handle: &NodeHandle) -> Option<NodeId> {
    handle.as_any().downcast_ref::<MemoryNode>().map(|n| n.id)
}

impl RemoteNode for MemoryNode {
    fn value(&self) -> String {
        self.store().value_of(self.id)
    }

    fn set_value(&self, value: &str) {
        if let Some(n) = self.store().0.borrow_mut().nodes.get_mut(&self.id) {
            n.value = value.to_string();
        }
    }

    fn select_all(&self) -> RemoteFuture<Vec<NodeHandle>> {
        let store = self.store();
        store.record(RemoteCall::SelectAll { node: self.id });

        let result = {
            let s = store.0.borrow();
            if s.offline {
                Err(RemoteError::network("store is offline"))
            } else {
                match s.nodes.get(&self.id) {
                    Some(n) => Ok(n.children.clone()),
                    None => Err(RemoteError::detached()),
                }
            }
        };

        let session = self.session.clone();
        let result = result.map(|ids| {
            ids.into_iter()
                .map(|id| {
                    Rc::new(MemoryNode {
                        session: session.clone(),
                        id,
                    }) as NodeHandle
                })
                .collect()
        });
        futures::future::ready(result).boxed_local()
    }

    fn insert(&self, child: &NodeHandle, position: usize) {
        self.store().record(RemoteCall::Insert {
            parent: self.id,
            value: child.value(),
            position,
        });
        if let Some(child) = node_id(child) {
            self.queue(Mutation::Insert {
                parent: self.id,
                child,
                position,
            });
        }
    }

    fn remove(&self, child: &NodeHandle) {
        self.store().record(RemoteCall::Remove {
            parent: self.id,
            value: child.value(),
            shielded: false,
        });
        if let Some(child) = node_id(child) {
            self.queue(Mutation::Remove {
                parent: self.id,
                child,
                shielded: false,
            });
        }
    }

    fn remove_shielded(&self, child: &NodeHandle) {
        self.store().record(RemoteCall::Remove {
            parent: self.id,
            value: child.value(),
            shielded: true,
        });
        if let Some(child) = node_id(child) {
            self.queue(Mutation::Remove {
                parent: self.id,
                child,
                shielded: true,
            });
        }
    }

    fn monitor(
        &self,
        interval: MonitorInterval,
        listener: MonitorListener,
    ) -> RemoteFuture<Rc<dyn RemoteMonitor>> {
        let store = self.store().clone();
        store.record(RemoteCall::Monitor { node: self.id });

        let id = {
            let mut s = store.0.borrow_mut();
            s.next_id += 1;
            let id = s.next_id;
            s.monitors.push(MonitorEntry {
                id,
                node: self.id,
                session: self.session.id,
                interval,
                listeners: vec![listener],
                active: true,
                dirty: false,
            });
            id
        };

        let monitor: Rc<dyn RemoteMonitor> = Rc::new(MemoryMonitor {
            store,
            id,
            node: self.id,
        });
        futures::future::ready(Ok(monitor)).boxed_local()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct MemoryMonitor {
    store: MemoryStore,
    id: u64,
    node: NodeId,
}

impl RemoteMonitor for MemoryMonitor {
    fn stop(&self) -> RemoteFuture<()> {
        self.store.record(RemoteCall::StopMonitor { node: self.node });
        let mut s = self.store.0.borrow_mut();
        if let Some(m) = s.monitors.iter_mut().find(|m| m.id == self.id) {
            m.active = false;
            m.listeners.clear();
        }
        futures::future::ready(Ok(())).boxed_local()
    }
}
