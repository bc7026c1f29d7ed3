//! Note-to-keystroke pipeline
//!
//! One [`Pipeline`] owns the whole session: active configuration, spelling
//! history, reload gate and injector. Events must be fed from a single
//! consumer; nothing in here is shared across threads.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, ConfigStore, ReloadGate, TapMode};
use crate::injector::{KeystrokeInjector, NamedKey};
use crate::input::NoteOnEvent;
use crate::spelling::{NoteNumber, Resolver, Spelled};

/// Key sent by the tap side-channel
pub const TAP_KEY: NamedKey = NamedKey::Space;

/// Session state driven by incoming Note On events
pub struct Pipeline<S, I> {
    config: Arc<AppConfig>,
    store: S,
    gate: ReloadGate,
    resolver: Resolver,
    injector: I,
    last_note: Option<NoteNumber>,
}

impl<S: ConfigStore, I: KeystrokeInjector> Pipeline<S, I> {
    pub fn new(config: AppConfig, store: S, gate: ReloadGate, injector: I) -> Self {
        Self {
            config: Arc::new(config),
            store,
            gate,
            resolver: Resolver::new(),
            injector,
            last_note: None,
        }
    }

    /// Currently active configuration
    pub fn config(&self) -> Arc<AppConfig> {
        Arc::clone(&self.config)
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Most recently fully processed note (diagnostics only)
    pub fn last_note(&self) -> Option<NoteNumber> {
        self.last_note
    }

    /// Handle one Note On, checking for a config change first
    pub fn on_note_on(&mut self, note: NoteNumber) {
        self.on_note_on_at(note, Instant::now());
    }

    /// Same as [`Pipeline::on_note_on`] with an explicit clock
    pub fn on_note_on_at(&mut self, note: NoteNumber, now: Instant) {
        if let Some(new_config) = self.gate.maybe_reload(&self.store, now) {
            self.replace_config(new_config);
        }

        // Hold this event's config even if a reload happens later
        let config = Arc::clone(&self.config);

        if config.tap_mode.taps() {
            match self.injector.press_key(TAP_KEY) {
                Ok(()) => info!("MIDI NoteOn → {}", TAP_KEY),
                Err(e) => warn!("Tap injection failed: {}", e),
            }

            if config.tap_mode == TapMode::Exclusive {
                return;
            }
        }

        let resolution = self.resolver.resolve(note, config.mode);

        if let Some(dropped) = resolution.discarded {
            warn!("MIDI {} discarded: spelling mode changed while it was pending", dropped);
        }

        if let Some(flushed) = resolution.flushed {
            self.emit(&config, flushed);
        }

        match resolution.current {
            Some(current) => {
                self.emit(&config, current);
                self.last_note = Some(note);
            }
            None => info!("MIDI {} pending", note),
        }
    }

    fn replace_config(&mut self, new_config: AppConfig) {
        if new_config.mode != self.config.mode {
            info!("Enharmonic Mode: {} → {}", self.config.mode, new_config.mode);
        }
        if new_config.tap_mode != self.config.tap_mode {
            info!("Tap Mode: {} → {}", self.config.tap_mode, new_config.tap_mode);
        }
        self.config = Arc::new(new_config);
    }

    fn emit(&mut self, config: &AppConfig, spelled: Spelled) {
        let Spelled { note, name } = spelled;

        let Some(ch) = config.mappings.lookup(name) else {
            info!("MIDI {} ({}) no mapping!", note, name);
            return;
        };

        match self.injector.press_char(ch) {
            Ok(()) => info!("MIDI {} ({}) -> '{}'", note, name, ch),
            Err(e) => warn!("MIDI {} ({}) -> '{}' failed: {}", note, name, ch, e),
        }
        debug!(note, name = %name, ch = %ch, injector = self.injector.name(), "Keystroke");
    }
}

/// Feed Note On events into the pipeline one at a time until the source
/// closes or `shutdown` completes. Returns the number of events handled.
pub async fn run<S: ConfigStore, I: KeystrokeInjector>(
    pipeline: &mut Pipeline<S, I>,
    events: &mut mpsc::Receiver<NoteOnEvent>,
    shutdown: impl Future<Output = ()>,
) -> usize {
    tokio::pin!(shutdown);
    let mut handled = 0;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    error!("MIDI input closed");
                    break;
                };
                debug!(
                    note = event.note,
                    velocity = event.velocity,
                    timestamp_us = event.timestamp_us,
                    "Note On"
                );
                pipeline.on_note_on(NoteNumber::from(event.note));
                handled += 1;
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }
    }

    handled
}
