pub mod components;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod remote;
pub mod render;
pub mod sortable;
pub mod state;
pub mod surface;
mod sync;
pub mod task;

pub use crate::config::{ItemMarkup, MonitorInterval, NextlistOptions, Settings};
pub use crate::coordinator::Nextlist;
pub use crate::error::{NextlistError, NextlistResult, RemoteError, RemoteErrorKind};
pub use crate::sortable::{SortEvent, SortableToolkit};
pub use crate::state::{ListEvent, SyncStatus};
pub use crate::surface::{ListId, ListSurface, VisualItem};
pub use crate::sync::RefreshOutcome;
pub use crate::task::Spawner;

use crate::components::SyncedList;
use crate::sortable::html5::Html5Sortable;
use leptos::either::Either;
use leptos::prelude::*;
use std::rc::Rc;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

/// Standalone page: one list bound to the node configured in `window.ENV.NEXTLIST`.
#[component]
pub fn App() -> impl IntoView {
    let options = NextlistOptions::from_window();
    let sortable = Html5Sortable::new();
    let nextlist = Nextlist::browser(Rc::new(sortable.clone()));
    nextlist.set_debug_mode(cfg!(debug_assertions));

    let configured = options
        .remote_node_address
        .as_deref()
        .is_some_and(|a| !a.is_empty());

    // `<Show>` children must be `Send`; the list props are not.
    let body = if configured {
        Either::Left(view! {
            <SyncedList nextlist=nextlist sortable=sortable list_id="nextlist-main" options=options />
        })
    } else {
        Either::Right(view! {
            <p class="text-xs text-muted-foreground">
                "Set window.ENV.NEXTLIST.remoteNodeAddress and remoteNodeSecret to bind a list."
            </p>
        })
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto w-full max-w-[720px] px-4 py-8">
                <h1 class="mb-4 text-xl font-semibold">"Nextlist"</h1>
                {body}
            </div>
        </div>
    }
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen::JsValue;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_options_from_window_env() {
        let window = web_sys::window().expect("window");
        let env = js_sys::Object::new();
        let cfg = js_sys::JSON::parse(
            r#"{"remoteNodeAddress":"http://slicnet.com/lists/a","remoteNodeSecret":"s","monitorInterval":"NORMAL"}"#,
        )
        .expect("valid json");
        js_sys::Reflect::set(&env, &"NEXTLIST".into(), &cfg).expect("set NEXTLIST");
        js_sys::Reflect::set(&window, &"ENV".into(), &env).expect("set ENV");

        let o = NextlistOptions::from_window();
        assert_eq!(o.remote_node_address.as_deref(), Some("http://slicnet.com/lists/a"));
        assert_eq!(o.monitor_interval, MonitorInterval::Normal);

        js_sys::Reflect::set(&window, &"ENV".into(), &JsValue::UNDEFINED).expect("unset ENV");
        assert!(NextlistOptions::from_window().remote_node_address.is_none());
    }

    #[wasm_bindgen_test]
    fn test_nextweb_absent_without_script() {
        assert!(!crate::remote::js::nextweb_available());
    }
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(App);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_reexports() {
        let o = NextlistOptions::new("addr", "secret");
        assert_eq!(o.monitor_interval, MonitorInterval::Fast);
        assert_eq!(ListId::from("todo").as_str(), "todo");
        assert_eq!(SyncStatus::default(), SyncStatus::Idle);
        assert!(NextlistError::MissingAddress.is_configuration());
    }
}
