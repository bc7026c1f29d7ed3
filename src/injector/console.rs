//! Console injector - logs keystrokes instead of typing them
//!
//! Used by `--dry-run` to check a mapping without sending anything to the
//! focused window.

use tracing::{debug, info};

use super::{InjectError, KeystrokeInjector, NamedKey};

pub struct ConsoleInjector {
    name: String,
    /// Keystroke counter for debugging
    count: u64,
}

impl ConsoleInjector {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 0,
        }
    }

    fn emit(&mut self, what: &str) {
        self.count += 1;
        info!(
            "⌨️  [{}] {} would type {} [#{}]",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            self.name,
            what,
            self.count
        );
        debug!(injector = self.name, keystroke = what, count = self.count, "Dry-run keystroke");
    }
}

impl KeystrokeInjector for ConsoleInjector {
    fn name(&self) -> &str {
        &self.name
    }

    fn press_char(&mut self, ch: char) -> Result<(), InjectError> {
        self.emit(&format!("{:?}", ch));
        Ok(())
    }

    fn press_key(&mut self, key: NamedKey) -> Result<(), InjectError> {
        self.emit(&key.to_string());
        Ok(())
    }
}
