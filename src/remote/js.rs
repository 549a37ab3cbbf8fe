//! Bindings to the page's `Nextweb` data-node library.
//!
//! Nextweb exposes pending values with a callback style `get(fn)`; each one is
//! adapted to a future through a oneshot channel.

use super::{MonitorListener, NodeHandle, RemoteFuture, RemoteMonitor, RemoteNode, RemoteSession};
use crate::config::MonitorInterval;
use crate::error::{RemoteError, RemoteResult};
use futures::channel::oneshot;
use futures::FutureExt;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = Nextweb, js_name = createSession, catch)]
    fn create_session_js() -> Result<JsSession, JsValue>;

    #[derive(Clone)]
    type JsSession;

    #[wasm_bindgen(method)]
    fn node(this: &JsSession, address: &str, secret: &str) -> JsPending;

    #[wasm_bindgen(method)]
    fn seed(this: &JsSession) -> JsNode;

    #[wasm_bindgen(method)]
    fn commit(this: &JsSession) -> JsPending;

    /// Any Nextweb value that resolves through `get(callback)`.
    type JsPending;

    #[wasm_bindgen(method)]
    fn get(this: &JsPending, callback: &JsValue);

    #[derive(Clone)]
    type JsNode;

    #[wasm_bindgen(method, js_name = getValue)]
    fn get_value(this: &JsNode) -> JsValue;

    #[wasm_bindgen(method, js_name = setValue)]
    fn set_value(this: &JsNode, value: &str);

    #[wasm_bindgen(method, js_name = selectAll)]
    fn select_all(this: &JsNode) -> JsPending;

    #[wasm_bindgen(method)]
    fn insert(this: &JsNode, child: &JsNode, position: u32);

    #[wasm_bindgen(method)]
    fn remove(this: &JsNode, child: &JsNode);

    #[wasm_bindgen(method)]
    fn shield(this: &JsNode) -> JsNode;

    #[wasm_bindgen(method)]
    fn monitor(this: &JsNode) -> JsMonitor;

    type JsNodeList;

    #[wasm_bindgen(method)]
    fn each(this: &JsNodeList, callback: &JsValue);

    type JsMonitor;

    #[wasm_bindgen(method, js_name = addListener)]
    fn add_listener(this: &JsMonitor, listener: &JsValue);

    #[wasm_bindgen(method, js_name = setInterval)]
    fn set_interval(this: &JsMonitor, interval: &str);

    #[wasm_bindgen(method, js_name = get)]
    fn get_monitor(this: &JsMonitor, callback: &JsValue);

    #[wasm_bindgen(method)]
    fn stop(this: &JsMonitor) -> JsPending;
}

/// True when the page loaded Nextweb and it can create sessions.
pub fn nextweb_available() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let Some(nextweb) = window.get("Nextweb") else {
        return false;
    };
    js_sys::Reflect::get(&nextweb, &"createSession".into())
        .map(|f| f.is_function())
        .unwrap_or(false)
}

pub fn create_session() -> RemoteResult<Rc<dyn RemoteSession>> {
    if !nextweb_available() {
        return Err(RemoteError::network("Nextweb object not found"));
    }
    let session = create_session_js()
        .map_err(|e| RemoteError::network(js_message(&e)))?;
    Ok(Rc::new(NextwebSession { session }))
}

fn js_message(v: &JsValue) -> String {
    v.dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| v.as_string())
        .unwrap_or_else(|| "unknown Nextweb error".to_string())
}

/// Awaits a callback-style `get`, mapping thrown `Error` values to remote errors.
async fn resolve(register: impl FnOnce(&JsValue)) -> RemoteResult<JsValue> {
    let (tx, rx) = oneshot::channel::<JsValue>();
    let cb = Closure::once_into_js(move |value: JsValue| {
        let _ = tx.send(value);
    });
    register(&cb);

    let value = rx
        .await
        .map_err(|_| RemoteError::network("Nextweb dropped the request"))?;
    if value.is_instance_of::<js_sys::Error>() {
        return Err(RemoteError::network(js_message(&value)));
    }
    Ok(value)
}

#[derive(Clone)]
struct NextwebSession {
    session: JsSession,
}

impl RemoteSession for NextwebSession {
    fn node(&self, address: &str, secret: &str) -> RemoteFuture<NodeHandle> {
        let pending = self.session.node(address, secret);
        async move {
            let value = resolve(|cb| pending.get(cb)).await?;
            Ok(Rc::new(NextwebNode {
                node: value.unchecked_into(),
            }) as NodeHandle)
        }
        .boxed_local()
    }

    fn seed(&self) -> NodeHandle {
        Rc::new(NextwebNode {
            node: self.session.seed(),
        })
    }

    fn commit(&self) -> RemoteFuture<()> {
        let pending = self.session.commit();
        async move {
            resolve(|cb| pending.get(cb)).await?;
            Ok(())
        }
        .boxed_local()
    }
}

struct NextwebNode {
    node: JsNode,
}

fn js_node(handle: &NodeHandle) -> Option<&JsNode> {
    handle
        .as_any()
        .downcast_ref::<NextwebNode>()
        .map(|n| &n.node)
}

impl RemoteNode for NextwebNode {
    fn value(&self) -> String {
        self.node.get_value().as_string().unwrap_or_default()
    }

    fn set_value(&self, value: &str) {
        self.node.set_value(value);
    }

    fn select_all(&self) -> RemoteFuture<Vec<NodeHandle>> {
        let pending = self.node.select_all();
        async move {
            let list: JsNodeList = resolve(|cb| pending.get(cb)).await?.unchecked_into();

            let items: Rc<RefCell<Vec<NodeHandle>>> = Rc::default();
            let sink = items.clone();
            let each = Closure::<dyn FnMut(JsValue)>::new(move |v: JsValue| {
                sink.borrow_mut().push(Rc::new(NextwebNode {
                    node: v.unchecked_into(),
                }));
            });
            list.each(each.as_ref());
            drop(each);

            Ok(items.take())
        }
        .boxed_local()
    }

    fn insert(&self, child: &NodeHandle, position: usize) {
        match js_node(child) {
            Some(c) => self.node.insert(c, position as u32),
            None => tracing::warn!("cannot insert a node from another store"),
        }
    }

    fn remove(&self, child: &NodeHandle) {
        if let Some(c) = js_node(child) {
            self.node.remove(c);
        }
    }

    fn remove_shielded(&self, child: &NodeHandle) {
        if let Some(c) = js_node(child) {
            self.node.shield().remove(c);
        }
    }

    fn monitor(
        &self,
        interval: MonitorInterval,
        listener: MonitorListener,
    ) -> RemoteFuture<Rc<dyn RemoteMonitor>> {
        let pending = self.node.monitor();
        let cb = Closure::<dyn Fn()>::new(move || listener());
        pending.add_listener(cb.as_ref());
        // Lives as long as the monitor on the JS side.
        cb.forget();
        pending.set_interval(&interval.to_string());

        async move {
            let value = resolve(|cb| pending.get_monitor(cb)).await?;
            Ok(Rc::new(NextwebMonitor {
                started: value.unchecked_into(),
            }) as Rc<dyn RemoteMonitor>)
        }
        .boxed_local()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct NextwebMonitor {
    started: JsMonitor,
}

impl RemoteMonitor for NextwebMonitor {
    fn stop(&self) -> RemoteFuture<()> {
        let pending = self.started.stop();
        async move {
            resolve(|cb| pending.get(cb)).await?;
            Ok(())
        }
        .boxed_local()
    }
}
