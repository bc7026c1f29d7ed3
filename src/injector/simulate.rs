//! Portable backend using `rdev::simulate`
//!
//! rdev works with physical keys, not characters, so only ASCII letters,
//! digits and the punctuation of a US layout can be typed.

use std::thread;
use std::time::Duration;

use rdev::{simulate, EventType, Key};

use super::{InjectError, KeystrokeInjector, NamedKey};

/// Pause between simulated events; some X servers drop back-to-back events
const EVENT_DELAY: Duration = Duration::from_millis(2);

#[derive(Debug, Default)]
pub struct SimulateInjector;

impl SimulateInjector {
    pub fn new() -> Self {
        Self
    }
}

/// Physical key plus whether Shift must be held (US layout)
pub fn key_for_char(ch: char) -> Option<(Key, bool)> {
    let lower = ch.to_ascii_lowercase();
    let shifted = ch.is_ascii_uppercase();

    let key = match lower {
        'a' => Key::KeyA,
        'b' => Key::KeyB,
        'c' => Key::KeyC,
        'd' => Key::KeyD,
        'e' => Key::KeyE,
        'f' => Key::KeyF,
        'g' => Key::KeyG,
        'h' => Key::KeyH,
        'i' => Key::KeyI,
        'j' => Key::KeyJ,
        'k' => Key::KeyK,
        'l' => Key::KeyL,
        'm' => Key::KeyM,
        'n' => Key::KeyN,
        'o' => Key::KeyO,
        'p' => Key::KeyP,
        'q' => Key::KeyQ,
        'r' => Key::KeyR,
        's' => Key::KeyS,
        't' => Key::KeyT,
        'u' => Key::KeyU,
        'v' => Key::KeyV,
        'w' => Key::KeyW,
        'x' => Key::KeyX,
        'y' => Key::KeyY,
        'z' => Key::KeyZ,
        '0' => Key::Num0,
        '1' => Key::Num1,
        '2' => Key::Num2,
        '3' => Key::Num3,
        '4' => Key::Num4,
        '5' => Key::Num5,
        '6' => Key::Num6,
        '7' => Key::Num7,
        '8' => Key::Num8,
        '9' => Key::Num9,
        ' ' => Key::Space,
        ',' => Key::Comma,
        '.' => Key::Dot,
        '/' => Key::Slash,
        ';' => Key::SemiColon,
        '\'' => Key::Quote,
        '-' => Key::Minus,
        '=' => Key::Equal,
        '[' => Key::LeftBracket,
        ']' => Key::RightBracket,
        '\\' => Key::BackSlash,
        '`' => Key::BackQuote,
        _ => return None,
    };

    Some((key, shifted))
}

fn send(event: &EventType) -> Result<(), InjectError> {
    simulate(event).map_err(|_| InjectError::Os(format!("could not simulate {:?}", event)))?;
    thread::sleep(EVENT_DELAY);
    Ok(())
}

fn tap(key: Key, shift: bool) -> Result<(), InjectError> {
    if shift {
        send(&EventType::KeyPress(Key::ShiftLeft))?;
    }
    let result = send(&EventType::KeyPress(key)).and_then(|_| send(&EventType::KeyRelease(key)));
    if shift {
        send(&EventType::KeyRelease(Key::ShiftLeft))?;
    }
    result
}

impl KeystrokeInjector for SimulateInjector {
    fn name(&self) -> &str {
        "rdev"
    }

    fn press_char(&mut self, ch: char) -> Result<(), InjectError> {
        let (key, shift) = key_for_char(ch).ok_or(InjectError::Unsupported(ch))?;
        tap(key, shift)
    }

    fn press_key(&mut self, key: NamedKey) -> Result<(), InjectError> {
        let key = match key {
            NamedKey::Space => Key::Space,
            NamedKey::Enter => Key::Return,
            NamedKey::Tab => Key::Tab,
        };
        tap(key, false)
    }
}
