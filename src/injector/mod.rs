//! Keystroke injection backends
//!
//! The pipeline only talks to [`KeystrokeInjector`]; the OS-specific code
//! lives in the submodules so the rest of the crate builds and tests
//! without touching the real input stream.

use thiserror::Error;

pub mod console;
#[cfg(windows)]
pub mod sendinput;
#[cfg(not(windows))]
pub mod simulate;

pub use console::ConsoleInjector;

/// Non-character keys the injector can press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedKey {
    Space,
    Enter,
    Tab,
}

impl std::fmt::Display for NamedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NamedKey::Space => "Space",
            NamedKey::Enter => "Enter",
            NamedKey::Tab => "Tab",
        };
        f.write_str(name)
    }
}

/// Injection failures. Reported, never retried.
#[derive(Debug, Error)]
pub enum InjectError {
    /// The OS accepted only part of the key-down/key-up sequence
    #[error("sent {sent}/{expected} input events ({detail})")]
    Partial {
        sent: u32,
        expected: u32,
        detail: String,
    },

    /// The backend has no way to type this character
    #[error("character {0:?} cannot be injected on this platform")]
    Unsupported(char),

    #[error("keyboard simulation failed: {0}")]
    Os(String),
}

/// Press-and-release of a single key
pub trait KeystrokeInjector: Send {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Type one Unicode character
    fn press_char(&mut self, ch: char) -> Result<(), InjectError>;

    /// Press a named key
    fn press_key(&mut self, key: NamedKey) -> Result<(), InjectError>;
}

impl<T: KeystrokeInjector + ?Sized> KeystrokeInjector for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn press_char(&mut self, ch: char) -> Result<(), InjectError> {
        (**self).press_char(ch)
    }

    fn press_key(&mut self, key: NamedKey) -> Result<(), InjectError> {
        (**self).press_key(key)
    }
}

/// Injector that types into the real OS input stream
#[cfg(windows)]
pub fn platform() -> Box<dyn KeystrokeInjector> {
    Box::new(sendinput::SendInputInjector::new())
}

/// Injector that types into the real OS input stream
#[cfg(not(windows))]
pub fn platform() -> Box<dyn KeystrokeInjector> {
    Box::new(simulate::SimulateInjector::new())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Something the recording injector was asked to type
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Keystroke {
        Char(char),
        Key(NamedKey),
    }

    /// Injector that records keystrokes into a shared log
    #[derive(Clone, Default)]
    pub(crate) struct RecordingInjector {
        pub log: Arc<Mutex<Vec<Keystroke>>>,
        pub fail_chars: bool,
    }

    impl RecordingInjector {
        pub(crate) fn keystrokes(&self) -> Vec<Keystroke> {
            self.log.lock().unwrap().clone()
        }

        pub(crate) fn typed(&self) -> String {
            self.keystrokes()
                .into_iter()
                .map(|k| match k {
                    Keystroke::Char(c) => c,
                    Keystroke::Key(NamedKey::Space) => '_',
                    Keystroke::Key(_) => '?',
                })
                .collect()
        }
    }

    impl KeystrokeInjector for RecordingInjector {
        fn name(&self) -> &str {
            "recording"
        }

        fn press_char(&mut self, ch: char) -> Result<(), InjectError> {
            if self.fail_chars {
                return Err(InjectError::Partial {
                    sent: 1,
                    expected: 2,
                    detail: "test failure".to_string(),
                });
            }
            self.log.lock().unwrap().push(Keystroke::Char(ch));
            Ok(())
        }

        fn press_key(&mut self, key: NamedKey) -> Result<(), InjectError> {
            self.log.lock().unwrap().push(Keystroke::Key(key));
            Ok(())
        }
    }
}
