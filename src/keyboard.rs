//! Keyboard stand-in for the pod's encoders and buttons.
//!
//! Terminals do not report key releases, so a button key is a tap (press
//! and release together). The two-button hold has its own key, which
//! only erases while auto-repeat keeps it coming for the hold time.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::controls::{ButtonId, ControlEvent};

/// Mix steps per key press.
const MIX_KEY_STEP: i32 = 5;

const PLAY_TAP: [ControlEvent; 2] = [
    ControlEvent::Button {
        id: ButtonId::Play,
        pressed: true,
    },
    ControlEvent::Button {
        id: ButtonId::Play,
        pressed: false,
    },
];

const RECORD_TAP: [ControlEvent; 2] = [
    ControlEvent::Button {
        id: ButtonId::Record,
        pressed: true,
    },
    ControlEvent::Button {
        id: ButtonId::Record,
        pressed: false,
    },
];

pub fn map_key(key: &KeyEvent) -> &'static [ControlEvent] {
    // Release events never count. Repeats only feed the reset hold.
    match key.kind {
        KeyEventKind::Press => {}
        KeyEventKind::Repeat if key.code == KeyCode::Char('x') => {}
        _ => return &[],
    }
    match key.code {
        KeyCode::Left | KeyCode::Up => &[ControlEvent::MenuTurn(-1)],
        KeyCode::Right | KeyCode::Down => &[ControlEvent::MenuTurn(1)],
        KeyCode::Enter => &[ControlEvent::MenuPress],
        KeyCode::Char('[') => &[ControlEvent::MixTurn(-MIX_KEY_STEP)],
        KeyCode::Char(']') => &[ControlEvent::MixTurn(MIX_KEY_STEP)],
        KeyCode::Char('p') => &PLAY_TAP,
        KeyCode::Char('r') => &RECORD_TAP,
        KeyCode::Char('x') => &[ControlEvent::ResetGesture],
        KeyCode::Char('q') | KeyCode::Esc => &[ControlEvent::Quit],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn arrows_drive_the_menu_encoder() {
        assert_eq!(
            map_key(&key(KeyCode::Up, KeyEventKind::Press)),
            [ControlEvent::MenuTurn(-1)]
        );
        assert_eq!(
            map_key(&key(KeyCode::Right, KeyEventKind::Press)),
            [ControlEvent::MenuTurn(1)]
        );
        assert_eq!(
            map_key(&key(KeyCode::Enter, KeyEventKind::Press)),
            [ControlEvent::MenuPress]
        );
    }

    #[test]
    fn button_keys_tap() {
        assert_eq!(map_key(&key(KeyCode::Char('r'), KeyEventKind::Press)), RECORD_TAP);
        assert_eq!(map_key(&key(KeyCode::Char('p'), KeyEventKind::Press)), PLAY_TAP);
    }

    #[test]
    fn releases_and_unknown_keys_are_ignored() {
        assert!(map_key(&key(KeyCode::Char('r'), KeyEventKind::Release)).is_empty());
        assert!(map_key(&key(KeyCode::Char('r'), KeyEventKind::Repeat)).is_empty());
        assert!(map_key(&key(KeyCode::Char('z'), KeyEventKind::Press)).is_empty());
    }

    #[test]
    fn reset_key_repeats_feed_the_hold() {
        let reset = [ControlEvent::ResetGesture];
        assert_eq!(map_key(&key(KeyCode::Char('x'), KeyEventKind::Press)), reset);
        assert_eq!(map_key(&key(KeyCode::Char('x'), KeyEventKind::Repeat)), reset);
        assert!(map_key(&key(KeyCode::Char('x'), KeyEventKind::Release)).is_empty());
    }

    #[test]
    fn one_reset_keystroke_keeps_the_loop() {
        use crate::controls::Controls;
        use crate::engine::{LoopEngine, Mode};
        use std::time::{Duration, Instant};

        let mut engine = LoopEngine::new(100);
        engine.toggle_record();
        for _ in 0..10 {
            engine.process(0.3);
        }
        engine.toggle_record();

        let t0 = Instant::now();
        let mut controls = Controls::new(Duration::from_millis(1000));
        for event in map_key(&key(KeyCode::Char('x'), KeyEventKind::Press)) {
            controls.apply(*event, t0);
        }
        let outcome = controls.update(&mut engine, t0);
        assert!(!outcome.erased);
        assert_eq!(engine.mode(), Mode::Looping);
        assert_eq!(engine.len(), 10);
    }
}
