use std::{collections::HashSet, sync::Arc};

use crate::input_api::RawInputEvent;

use super::keymap::{self, ModifierKey};

/// Distance units credited per wheel notch.
const SCROLL_UNITS_PER_NOTCH: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickSide {
    Left,
    Right,
    Other,
}

impl ClickSide {
    fn from_button(button: u8) -> Self {
        match button {
            1 => ClickSide::Left,
            2 => ClickSide::Right,
            _ => ClickSide::Other,
        }
    }
}

/// A semantic input event produced by the classifier. Raw keycodes and
/// payloads do not survive past this point.
#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    Keystroke { label: Arc<str> },
    Combo { label: Arc<str> },
    Click { side: ClickSide },
    PointerMove { x: i32, y: i32 },
    Scroll { distance: f64 },
}

/// Turns the raw event stream into semantic events, distinguishing
/// standalone key presses from modifier-driven combinations.
///
/// A held modifier emits nothing on press; it either participates in a
/// combo when a non-modifier key arrives, or counts as a single keystroke
/// when released unused. Key autorepeat is deliberately not suppressed:
/// every key-down is classified independently, mirroring raw hardware
/// event semantics.
#[derive(Default)]
pub struct EventClassifier {
    active_modifiers: HashSet<u16>,
    used_modifiers: HashSet<u16>,
}

impl EventClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&mut self, event: RawInputEvent) -> Option<InputAction> {
        match event {
            RawInputEvent::KeyDown { keycode } => self.classify_key_down(keycode),
            RawInputEvent::KeyUp { keycode } => self.classify_key_up(keycode),
            RawInputEvent::ButtonDown { button } => Some(InputAction::Click {
                side: ClickSide::from_button(button),
            }),
            RawInputEvent::MouseMove { x, y } => Some(InputAction::PointerMove { x, y }),
            RawInputEvent::Wheel { rotation } => Some(InputAction::Scroll {
                distance: rotation.unsigned_abs() as f64 * SCROLL_UNITS_PER_NOTCH,
            }),
        }
    }

    fn classify_key_down(&mut self, keycode: u16) -> Option<InputAction> {
        if keymap::modifier_of(keycode).is_some() {
            // Classification is deferred until the modifier is either
            // released alone or combined with a non-modifier key.
            self.active_modifiers.insert(keycode);
            return None;
        }

        if !self.active_modifiers.is_empty() {
            self.used_modifiers.extend(self.active_modifiers.iter().copied());
            return Some(InputAction::Combo {
                label: self.combo_label(keycode),
            });
        }

        Some(InputAction::Keystroke {
            label: keymap::key_name(keycode).into(),
        })
    }

    fn classify_key_up(&mut self, keycode: u16) -> Option<InputAction> {
        if keymap::modifier_of(keycode).is_none() {
            // Only key-down drives keystroke counting for non-modifiers.
            return None;
        }

        let tapped_alone = !self.used_modifiers.contains(&keycode);
        self.active_modifiers.remove(&keycode);
        self.used_modifiers.remove(&keycode);

        tapped_alone.then(|| InputAction::Keystroke {
            label: keymap::key_name(keycode).into(),
        })
    }

    fn combo_label(&self, keycode: u16) -> Arc<str> {
        let mut parts: Vec<&str> = Vec::new();
        for modifier in ModifierKey::LABEL_ORDER {
            let held = self
                .active_modifiers
                .iter()
                .any(|&active| keymap::modifier_of(active) == Some(modifier));
            if held {
                parts.push(modifier.name());
            }
        }

        let key = keymap::key_name(keycode);
        let mut label = parts.join(" + ");
        label.push_str(" + ");
        label.push_str(&key);
        label.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::classify::keymap::{
        VC_ALT_L, VC_CONTROL_L, VC_META_R, VC_SHIFT_L, VC_SHIFT_R,
    };

    const VC_A: u16 = 0x001E;
    const VC_C: u16 = 0x002E;

    fn down(keycode: u16) -> RawInputEvent {
        RawInputEvent::KeyDown { keycode }
    }

    fn up(keycode: u16) -> RawInputEvent {
        RawInputEvent::KeyUp { keycode }
    }

    fn keystroke(label: &str) -> Option<InputAction> {
        Some(InputAction::Keystroke {
            label: label.into(),
        })
    }

    fn combo(label: &str) -> Option<InputAction> {
        Some(InputAction::Combo {
            label: label.into(),
        })
    }

    #[test]
    fn plain_keys_emit_one_keystroke_per_down() {
        let mut classifier = EventClassifier::new();
        assert_eq!(classifier.classify(down(VC_A)), keystroke("A"));
        assert_eq!(classifier.classify(up(VC_A)), None);
        assert_eq!(classifier.classify(down(VC_A)), keystroke("A"));
    }

    #[test]
    fn modifier_and_key_form_a_combo_without_a_modifier_keystroke() {
        let mut classifier = EventClassifier::new();
        assert_eq!(classifier.classify(down(VC_CONTROL_L)), None);
        assert_eq!(classifier.classify(down(VC_C)), combo("Ctrl + C"));
        assert_eq!(classifier.classify(up(VC_C)), None);
        // Ctrl participated in a combo, releasing it emits nothing.
        assert_eq!(classifier.classify(up(VC_CONTROL_L)), None);
    }

    #[test]
    fn lone_modifier_tap_counts_on_release() {
        let mut classifier = EventClassifier::new();
        assert_eq!(classifier.classify(down(VC_SHIFT_L)), None);
        assert_eq!(classifier.classify(up(VC_SHIFT_L)), keystroke("Shift"));
    }

    #[test]
    fn combo_label_uses_fixed_modifier_order() {
        // Shift pressed before Ctrl still renders as "Ctrl + Shift + ...".
        let mut classifier = EventClassifier::new();
        classifier.classify(down(VC_SHIFT_L));
        classifier.classify(down(VC_CONTROL_L));
        assert_eq!(classifier.classify(down(VC_A)), combo("Ctrl + Shift + A"));
    }

    #[test]
    fn meta_sorts_first_in_combo_labels() {
        let mut classifier = EventClassifier::new();
        classifier.classify(down(VC_ALT_L));
        classifier.classify(down(VC_META_R));
        assert_eq!(classifier.classify(down(VC_C)), combo("Win + Alt + C"));
    }

    #[test]
    fn repeated_key_while_modifiers_held_emits_a_combo_each_time() {
        let mut classifier = EventClassifier::new();
        classifier.classify(down(VC_CONTROL_L));
        assert_eq!(classifier.classify(down(VC_C)), combo("Ctrl + C"));
        assert_eq!(classifier.classify(down(VC_C)), combo("Ctrl + C"));
    }

    #[test]
    fn both_shift_variants_count_independently() {
        let mut classifier = EventClassifier::new();
        classifier.classify(down(VC_SHIFT_L));
        classifier.classify(down(VC_SHIFT_R));
        assert_eq!(classifier.classify(down(VC_A)), combo("Shift + A"));
        assert_eq!(classifier.classify(up(VC_SHIFT_L)), None);
        assert_eq!(classifier.classify(up(VC_SHIFT_R)), None);
    }

    #[test]
    fn key_up_without_matching_key_down_is_tolerated() {
        // The process may start mid-keypress.
        let mut classifier = EventClassifier::new();
        assert_eq!(classifier.classify(up(VC_A)), None);
        assert_eq!(classifier.classify(up(VC_CONTROL_L)), keystroke("Ctrl"));
    }

    #[test]
    fn buttons_map_to_sides() {
        let mut classifier = EventClassifier::new();
        assert_eq!(
            classifier.classify(RawInputEvent::ButtonDown { button: 1 }),
            Some(InputAction::Click {
                side: ClickSide::Left
            })
        );
        assert_eq!(
            classifier.classify(RawInputEvent::ButtonDown { button: 2 }),
            Some(InputAction::Click {
                side: ClickSide::Right
            })
        );
        assert_eq!(
            classifier.classify(RawInputEvent::ButtonDown { button: 3 }),
            Some(InputAction::Click {
                side: ClickSide::Other
            })
        );
    }

    #[test]
    fn wheel_rotation_normalizes_to_absolute_distance() {
        let mut classifier = EventClassifier::new();
        assert_eq!(
            classifier.classify(RawInputEvent::Wheel { rotation: -2 }),
            Some(InputAction::Scroll { distance: 6.0 })
        );
    }
}
