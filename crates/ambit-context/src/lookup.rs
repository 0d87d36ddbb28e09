use ambit_common::BuiltinRequestContextValue;

use crate::slots::{AmbientSlots, SlotKey};

/// Current request context from the process-wide slots, if a host registered one
/// and a request is active.
pub fn get_builtin_request_context() -> Option<BuiltinRequestContextValue> {
    get_builtin_request_context_from(AmbientSlots::global())
}

/// Current request context from `slots`.
///
/// The first populated slot wins, even when its provider reports no active
/// request; the legacy slot is only a stand-in for a missing primary one.
pub fn get_builtin_request_context_from(
    slots: &AmbientSlots,
) -> Option<BuiltinRequestContextValue> {
    let (key, provider) = slots.resolve()?;
    if key == SlotKey::Legacy {
        tracing::debug!(slot=%key, "request context resolved from deprecated slot");
    }
    provider.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ambit_common::{BuiltinRequestContext, WaitUntil};

    fn fixed(value: Option<BuiltinRequestContextValue>) -> Arc<dyn BuiltinRequestContext> {
        Arc::new(move || value.clone())
    }

    fn value() -> BuiltinRequestContextValue {
        BuiltinRequestContextValue::with_wait_until(WaitUntil::new(|_work| {}))
    }

    #[test]
    fn test_absent_when_nothing_installed() {
        let slots = AmbientSlots::new();
        assert_eq!(get_builtin_request_context_from(&slots), None);
    }

    #[test]
    fn test_legacy_slot_used_alone() {
        let slots = AmbientSlots::new();
        let v = value();
        slots.install(SlotKey::Legacy, fixed(Some(v.clone())));
        assert_eq!(get_builtin_request_context_from(&slots), Some(v));
    }

    #[test]
    fn test_primary_overrides_legacy() {
        let slots = AmbientSlots::new();
        let primary = value();
        let legacy = value();
        slots.install(SlotKey::Legacy, fixed(Some(legacy.clone())));
        slots.install(SlotKey::Primary, fixed(Some(primary.clone())));

        let found = get_builtin_request_context_from(&slots);
        assert_eq!(found, Some(primary));
        assert_ne!(found, Some(legacy));
    }

    #[test]
    fn test_populated_primary_without_active_request_is_absent() {
        let slots = AmbientSlots::new();
        slots.install(SlotKey::Legacy, fixed(Some(value())));
        slots.install(SlotKey::Primary, fixed(None));
        assert_eq!(get_builtin_request_context_from(&slots), None);
    }

    #[test]
    fn test_legacy_ignored_when_fallback_disabled() {
        let slots = AmbientSlots::with_legacy_fallback(false);
        slots.install(SlotKey::Legacy, fixed(Some(value())));
        assert_eq!(get_builtin_request_context_from(&slots), None);
    }

    #[test]
    fn test_value_without_wait_until_is_returned_as_is() {
        let slots = AmbientSlots::new();
        slots.install(SlotKey::Primary, fixed(Some(BuiltinRequestContextValue::default())));
        let found = get_builtin_request_context_from(&slots);
        assert_eq!(found.map(|v| v.wait_until.is_none()), Some(true));
    }

    #[test]
    fn test_provider_may_touch_slots_during_get() {
        let slots = Arc::new(AmbientSlots::new());
        let inner = Arc::clone(&slots);
        let provider: Arc<dyn BuiltinRequestContext> = Arc::new(move || {
            let _ = inner.is_installed(SlotKey::Primary);
            Some(BuiltinRequestContextValue::default())
        });
        slots.install(SlotKey::Primary, provider);
        assert!(get_builtin_request_context_from(&slots).is_some());
    }
}
