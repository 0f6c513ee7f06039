//! DOM event listeners as owned [`Subscription`]s.

use backdrop_core::Subscription;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Event, EventTarget};

/// Adds `handler` for `kind` events on `target`. Releasing the returned
/// subscription removes the listener and frees the closure.
pub fn listen(
    target: &EventTarget,
    kind: &'static str,
    handler: impl FnMut(Event) + 'static,
) -> Result<Subscription, JsValue> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    let target = target.clone();
    Ok(Subscription::new(move || {
        let _ = target.remove_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
        drop(closure);
    }))
}
