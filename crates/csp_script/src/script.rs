//! [`EntityScript`] — the per-entity JS context and its subscriptions.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use quick_js::{Context, JsValue};

use crate::error::ScriptError;

/// Subscriptions a script has registered from inside its own JS source via
/// `ThisEntity.subscribeToMessage` / `ThisEntity.subscribeToPropertyChange`.
///
/// Shared (via `Rc<RefCell<_>>`) with the native callbacks installed into
/// the JS context, since those callbacks are 'static closures that cannot
/// otherwise reach back into the owning [`EntityScript`].
#[derive(Debug, Default)]
struct Subscriptions {
    /// Event name → JS callback function name.
    messages: HashMap<String, String>,
    /// (component id, property key) → JS callback function name.
    properties: HashMap<(u16, u32), String>,
}

/// A single entity's JS execution context.
///
/// Created when a `ScriptData` component is added to the owning entity, torn
/// down when the entity is destroyed. Source changes reset the context:
/// modules are cleared, native bindings are rebound, and the new source is
/// evaluated exactly once.
pub struct EntityScript {
    entity_id: u64,
    source: String,
    context: Option<Context>,
    subscriptions: Rc<RefCell<Subscriptions>>,
    /// Set when the most recent evaluation (top-level source, or a
    /// dispatched message call) raised an exception. Cleared at the start
    /// of the next tick by the engine calling [`EntityScript::take_last_error`].
    pub last_error: Option<String>,
}

impl EntityScript {
    /// Create an empty script context for `entity_id`. No JS context exists
    /// until [`EntityScript::set_source`] is called.
    #[must_use]
    pub fn new(entity_id: u64) -> Self {
        Self {
            entity_id,
            source: String::new(),
            context: None,
            subscriptions: Rc::new(RefCell::new(Subscriptions::default())),
            last_error: None,
        }
    }

    #[must_use]
    pub fn entity_id(&self) -> u64 {
        self.entity_id
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Replace the script source, reset the context, rebind native
    /// bindings, and evaluate the new source exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError`] if the context cannot be created or the
    /// source raises an exception on evaluation.
    pub fn set_source(&mut self, source: impl Into<String>) -> Result<(), ScriptError> {
        self.source = source.into();
        self.rebind()
    }

    /// Record that this script wants `js_callback` invoked whenever `event`
    /// is dispatched. Called from the native `subscribeToMessage` binding.
    fn subscribe_to_message(subs: &Rc<RefCell<Subscriptions>>, event: String, js_callback: String) {
        subs.borrow_mut().messages.insert(event, js_callback);
    }

    /// Record that this script wants `js_callback` invoked whenever the
    /// given component property is committed by a patch application.
    fn subscribe_to_property(
        subs: &Rc<RefCell<Subscriptions>>,
        component_id: u16,
        key: u32,
        js_callback: String,
    ) {
        subs.borrow_mut()
            .properties
            .insert((component_id, key), js_callback);
    }

    /// Reset the JS context: clear subscriptions, install native bindings,
    /// evaluate `self.source` once.
    fn rebind(&mut self) -> Result<(), ScriptError> {
        self.subscriptions.borrow_mut().messages.clear();
        self.subscriptions.borrow_mut().properties.clear();

        let context = Context::new().map_err(|e| ScriptError::ContextCreation(e.to_string()))?;

        let subs_for_messages = Rc::clone(&self.subscriptions);
        context
            .add_callback("__subscribeToMessage", move |event: String, callback: String| {
                Self::subscribe_to_message(&subs_for_messages, event, callback);
                JsValue::Undefined
            })
            .map_err(|e| ScriptError::ContextCreation(e.to_string()))?;

        let subs_for_properties = Rc::clone(&self.subscriptions);
        context
            .add_callback(
                "__subscribeToPropertyChange",
                move |component_id: i32, key: i32, callback: String| {
                    Self::subscribe_to_property(
                        &subs_for_properties,
                        component_id as u16,
                        key as u32,
                        callback,
                    );
                    JsValue::Undefined
                },
            )
            .map_err(|e| ScriptError::ContextCreation(e.to_string()))?;

        let prelude = format!(
            "globalThis.ThisEntity = {{ \
                id: {}, \
                subscribeToMessage: __subscribeToMessage, \
                subscribeToPropertyChange: __subscribeToPropertyChange \
            }};",
            self.entity_id
        );
        context
            .eval(&prelude)
            .map_err(|e| ScriptError::ContextCreation(e.to_string()))?;

        if !self.source.is_empty() {
            context
                .eval(&self.source)
                .map_err(|e| ScriptError::Evaluation(e.to_string()))?;
        }

        self.context = Some(context);
        Ok(())
    }

    /// Dispatch `event` to whatever JS callback this script subscribed for
    /// it, passing `payload` JSON-encoded as the sole argument.
    ///
    /// A no-op (not an error) if the script never subscribed to `event`.
    /// Any exception is captured into `self.last_error` and also returned.
    pub fn dispatch_message<T: serde::Serialize>(
        &mut self,
        event: &str,
        payload: &T,
    ) -> Result<(), ScriptError> {
        let callback_name = self
            .subscriptions
            .borrow()
            .messages
            .get(event)
            .cloned();
        let Some(callback_name) = callback_name else {
            return Ok(());
        };
        let Some(context) = self.context.as_ref() else {
            return Ok(());
        };

        let payload_json = serde_json::to_string(payload)?;
        let expression = format!("{callback_name}({payload_json})");
        match context.eval(&expression) {
            Ok(_) => Ok(()),
            Err(e) => {
                let message = e.to_string();
                tracing::error!(entity_id = self.entity_id, event, error = %message, "script error");
                self.last_error = Some(message.clone());
                Err(ScriptError::Evaluation(message))
            }
        }
    }

    /// Notify any subscribed script callback that `(component_id, key)` was
    /// just committed to `payload`.
    pub fn notify_property_changed<T: serde::Serialize>(
        &mut self,
        component_id: u16,
        key: u32,
        payload: &T,
    ) -> Result<(), ScriptError> {
        let callback_name = self
            .subscriptions
            .borrow()
            .properties
            .get(&(component_id, key))
            .cloned();
        let Some(callback_name) = callback_name else {
            return Ok(());
        };
        let Some(context) = self.context.as_ref() else {
            return Ok(());
        };

        let payload_json = serde_json::to_string(payload)?;
        let expression = format!("{callback_name}({payload_json})");
        if let Err(e) = context.eval(&expression) {
            let message = e.to_string();
            tracing::error!(entity_id = self.entity_id, component_id, key, error = %message, "script error");
            self.last_error = Some(message.clone());
            return Err(ScriptError::Evaluation(message));
        }
        Ok(())
    }

    /// Evaluate `expression` directly in this context, bypassing the
    /// subscription table. Used by the leader client to run a script body
    /// delegated via a `RemoteRunScriptMessage` from a non-owning client.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Evaluation`] if `expression` raises.
    pub fn eval_raw(&mut self, expression: &str) -> Result<(), ScriptError> {
        let Some(context) = self.context.as_ref() else {
            return Ok(());
        };
        match context.eval(expression) {
            Ok(_) => Ok(()),
            Err(e) => {
                let message = e.to_string();
                tracing::error!(entity_id = self.entity_id, error = %message, "script error");
                self.last_error = Some(message.clone());
                Err(ScriptError::Evaluation(message))
            }
        }
    }

    /// Take and clear the last captured script error. The engine calls this
    /// once per tick so a stale error never lingers past the tick it
    /// occurred on.
    pub fn take_last_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    /// `true` if this script subscribed to `event`.
    #[must_use]
    pub fn is_subscribed_to(&self, event: &str) -> bool {
        self.subscriptions.borrow().messages.contains_key(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_script_has_no_subscriptions() {
        let script = EntityScript::new(1);
        assert!(!script.is_subscribed_to("entityTick"));
        assert_eq!(script.entity_id(), 1);
    }

    #[test]
    fn test_dispatch_without_subscription_is_noop() {
        let mut script = EntityScript::new(1);
        let result = script.dispatch_message("entityTick", &serde_json::json!({"dt": 16}));
        assert!(result.is_ok());
    }

    #[test]
    fn test_this_entity_subscribe_to_message_is_reachable() {
        let mut script = EntityScript::new(42);
        script
            .set_source(
                "function onTick(payload) { globalThis.lastTick = payload; } \
                 ThisEntity.subscribeToMessage('entityTick', 'onTick');",
            )
            .expect("script should evaluate without throwing");

        assert!(script.is_subscribed_to("entityTick"));

        script
            .dispatch_message("entityTick", &serde_json::json!({"dt": 16}))
            .expect("dispatch should invoke the subscribed callback");
    }

    #[test]
    fn test_this_entity_exposes_entity_id() {
        let mut script = EntityScript::new(7);
        script
            .set_source("globalThis.capturedId = ThisEntity.id;")
            .expect("script should evaluate without throwing");
    }
}
