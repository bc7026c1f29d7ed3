//! Enharmonic spelling of incoming notes
//!
//! Turns raw MIDI note numbers into note names. White keys always have a
//! single name; black keys are spelled sharp or flat depending on the
//! active [`SpellingPolicy`] and the history kept in [`Resolver`].

use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Raw MIDI note number. Signed so out-of-range input still normalizes.
pub type NoteNumber = i32;

/// (sharp, flat) spelling per pitch class. White keys spell the same both ways.
const SPELLINGS: [(&str, &str); 12] = [
    ("C", "C"),
    ("C#", "Db"),
    ("D", "D"),
    ("D#", "Eb"),
    ("E", "E"),
    ("F", "F"),
    ("F#", "Gb"),
    ("G", "G"),
    ("G#", "Ab"),
    ("A", "A"),
    ("A#", "Bb"),
    ("B", "B"),
];

/// Every name a note can resolve to (mapping table keys)
pub const ALL_NOTE_NAMES: [&str; 17] = [
    "C", "C#", "Db", "D", "D#", "Eb", "E", "F", "F#", "Gb", "G", "G#", "Ab", "A", "A#", "Bb", "B",
];

/// Position within the octave (0-11)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PitchClass(u8);

impl PitchClass {
    /// Reduce a note number to its pitch class, always in [0, 12)
    pub fn of(note: NoteNumber) -> Self {
        Self(note.rem_euclid(12) as u8)
    }

    pub fn is_black(self) -> bool {
        matches!(self.0, 1 | 3 | 6 | 8 | 10)
    }

    pub fn sharp(self) -> NoteName {
        NoteName(SPELLINGS[self.0 as usize].0)
    }

    pub fn flat(self) -> NoteName {
        NoteName(SPELLINGS[self.0 as usize].1)
    }

    /// Fixed name of a white key, `None` for black keys
    pub fn white_name(self) -> Option<NoteName> {
        (!self.is_black()).then(|| self.sharp())
    }
}

/// A resolved note name such as "C", "F#" or "Bb"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteName(&'static str);

impl NoteName {
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Check whether `name` is one of the 17 spellings a note can take
    pub fn is_known(name: &str) -> bool {
        ALL_NOTE_NAMES.contains(&name)
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// How black keys are spelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpellingPolicy {
    /// Look back: compare with the previous note
    #[default]
    Ante,
    /// Look ahead: wait for the next note before deciding
    Post,
    /// Alternate sharp and flat per pitch class
    Cycle,
}

impl SpellingPolicy {
    /// Parse a policy name case-insensitively, falling back to `Ante`
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "post" => Self::Post,
            "cycle" => Self::Cycle,
            _ => Self::Ante,
        }
    }
}

impl fmt::Display for SpellingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ante => "Ante",
            Self::Post => "Post",
            Self::Cycle => "Cycle",
        };
        f.write_str(name)
    }
}

/// A note number together with the name it was spelled as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spelled {
    pub note: NoteNumber,
    pub name: NoteName,
}

/// Outcome of feeding one note into the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resolution {
    /// Previously buffered note, resolved now that its successor is known
    pub flushed: Option<Spelled>,
    /// The incoming note, or `None` if it was buffered
    pub current: Option<Spelled>,
    /// Buffered note dropped because the policy changed under it
    pub discarded: Option<NoteNumber>,
}

/// History carried between notes
#[derive(Debug, Clone, Default)]
pub struct ResolverState {
    pub previous_note: Option<NoteNumber>,
    pub pending_black: Option<(NoteNumber, PitchClass)>,
    /// `true` means the next spelling for that pitch class is sharp
    pub cycle_toggle: HashMap<PitchClass, bool>,
}

/// Stateful spelling engine, one per session
#[derive(Debug, Default)]
pub struct Resolver {
    state: ResolverState,
    last_policy: Option<SpellingPolicy>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ResolverState {
        &self.state
    }

    /// Whether a `Post` note is waiting for its successor
    pub fn is_awaiting_next(&self) -> bool {
        self.state.pending_black.is_some()
    }

    /// Resolve one incoming note under `policy`
    pub fn resolve(&mut self, note: NoteNumber, policy: SpellingPolicy) -> Resolution {
        let mut resolution = Resolution::default();

        if self.last_policy != Some(policy) {
            // A deferred note must never be resolved under a different rule
            if let Some((pending, _)) = self.state.pending_black.take() {
                debug!(note = pending, %policy, "Dropping deferred note after policy change");
                resolution.discarded = Some(pending);
            }
            self.last_policy = Some(policy);
        }

        if let Some((pending, pc)) = self.state.pending_black.take() {
            resolution.flushed = Some(Spelled {
                note: pending,
                name: resolve_deferred(pending, pc, note),
            });
            self.state.previous_note = Some(pending);
        }

        let pc = PitchClass::of(note);
        let name = match pc.white_name() {
            Some(name) => name,
            None => match self.spell_black(note, pc, policy) {
                Some(name) => name,
                None => return resolution,
            },
        };

        self.state.previous_note = Some(note);
        resolution.current = Some(Spelled { note, name });
        resolution
    }

    fn spell_black(
        &mut self,
        note: NoteNumber,
        pc: PitchClass,
        policy: SpellingPolicy,
    ) -> Option<NoteName> {
        match policy {
            SpellingPolicy::Ante => match self.state.previous_note {
                // First note of the session: sharp
                None => Some(pc.sharp()),
                Some(prev) if prev > note => Some(pc.flat()),
                Some(_) => Some(pc.sharp()),
            },
            SpellingPolicy::Cycle => {
                let sharp_next = self.state.cycle_toggle.entry(pc).or_insert(true);
                let name = if *sharp_next { pc.sharp() } else { pc.flat() };
                *sharp_next = !*sharp_next;
                Some(name)
            }
            SpellingPolicy::Post => {
                self.state.pending_black = Some((note, pc));
                None
            }
        }
    }
}

/// Spell a buffered black note once the following note is known.
///
/// Ascending motion (pending lower than next) spells flat, anything else sharp.
pub fn resolve_deferred(pending: NoteNumber, pc: PitchClass, next: NoteNumber) -> NoteName {
    if pending < next {
        pc.flat()
    } else {
        pc.sharp()
    }
}
