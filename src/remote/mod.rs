//! Remote data-node collaborator.
//!
//! The store is a tree of addressable nodes. Structural edits (`insert`, `remove`) are
//! queued on the session and only persisted by `RemoteSession::commit`.

pub mod js;
pub mod memory;

use crate::config::MonitorInterval;
use crate::error::RemoteResult;
use futures::future::LocalBoxFuture;
use std::any::Any;
use std::rc::Rc;

pub type RemoteFuture<T> = LocalBoxFuture<'static, RemoteResult<T>>;

pub type NodeHandle = Rc<dyn RemoteNode>;

pub type MonitorListener = Rc<dyn Fn()>;

pub trait RemoteSession {
    /// Resolves the node stored at `address`.
    fn node(&self, address: &str, secret: &str) -> RemoteFuture<NodeHandle>;

    /// A fresh node that is not attached anywhere yet.
    fn seed(&self) -> NodeHandle;

    /// Persists every edit queued on this session.
    fn commit(&self) -> RemoteFuture<()>;

    /// Closed sessions cannot be bound to a list.
    fn is_open(&self) -> bool {
        true
    }
}

pub trait RemoteNode {
    fn value(&self) -> String;
    fn set_value(&self, value: &str);

    /// Children in the order the store reports them.
    fn select_all(&self) -> RemoteFuture<Vec<NodeHandle>>;

    fn insert(&self, child: &NodeHandle, position: usize);
    fn remove(&self, child: &NodeHandle);

    /// Like `remove`, but this session's own monitors are not notified of it.
    fn remove_shielded(&self, child: &NodeHandle);

    /// Starts watching this node. `interval` and `listener` are in place before the
    /// monitor runs, so no change between start and resolution is missed.
    fn monitor(
        &self,
        interval: MonitorInterval,
        listener: MonitorListener,
    ) -> RemoteFuture<Rc<dyn RemoteMonitor>>;

    fn as_any(&self) -> &dyn Any;
}

pub trait RemoteMonitor {
    fn stop(&self) -> RemoteFuture<()>;
}

/// Creates a seed carrying `text` and queues it under `parent` at `position`.
///
/// Nothing is persisted until the session commits.
pub(crate) fn insert_node(
    session: &dyn RemoteSession,
    parent: &dyn RemoteNode,
    text: &str,
    position: usize,
) -> NodeHandle {
    let seed = session.seed();
    seed.set_value(text);
    parent.insert(&seed, position);
    seed
}
