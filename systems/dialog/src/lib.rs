#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Dialog playback system that pages scripts and reveals them with a typewriter.
//!
//! The machine is driven either by explicit [`DialogCommand`] values or by the
//! world's event stream (`Interaction` opens a script, `TimeAdvanced` clocks
//! the reveal). Every observable change is reported as an [`Event`] pushed
//! into a caller-owned buffer.

use std::{collections::VecDeque, num::NonZeroUsize, time::Duration};

use silverton_core::{DialogCommand, DialogId, DialogLookup, Event};
use tracing::debug;

/// Default time between two revealed characters.
pub const DEFAULT_CHARACTER_INTERVAL: Duration = Duration::from_millis(25);

/// Default number of script lines grouped onto one page.
pub const DEFAULT_LINES_PER_PAGE: usize = 2;

/// Policy used to split a script into display units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pagination {
    /// Splits entries on line breaks and groups the lines into fixed-size pages.
    LinesPerPage(NonZeroUsize),
    /// Presents every script entry as its own unit.
    PerEntry,
}

impl Default for Pagination {
    fn default() -> Self {
        match NonZeroUsize::new(DEFAULT_LINES_PER_PAGE) {
            Some(lines) => Self::LinesPerPage(lines),
            None => Self::PerEntry,
        }
    }
}

impl Pagination {
    /// Builds a policy from a raw line count where zero selects [`Pagination::PerEntry`].
    #[must_use]
    pub fn from_lines_per_page(lines: usize) -> Self {
        NonZeroUsize::new(lines).map_or(Self::PerEntry, Self::LinesPerPage)
    }
}

/// Tunables that shape dialog playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DialogSettings {
    /// Time between two revealed characters. Zero reveals whole units at once.
    pub character_interval: Duration,
    /// Policy used to split scripts into display units.
    pub pagination: Pagination,
    /// Starts every unit fully revealed, bypassing the typewriter.
    pub instant_reveal: bool,
}

impl Default for DialogSettings {
    fn default() -> Self {
        Self {
            character_interval: DEFAULT_CHARACTER_INTERVAL,
            pagination: Pagination::default(),
            instant_reveal: false,
        }
    }
}

/// Observable state of the playback machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogPhase {
    /// No dialog is shown.
    Idle,
    /// The current unit is still being revealed.
    Revealing,
    /// The current unit is fully revealed and waits for the player.
    PageComplete,
}

/// Splits script entries into display units according to `pagination`.
///
/// An empty script still yields a single empty unit so the box can open and
/// close through the regular advance path.
#[must_use]
pub fn paginate(entries: &[String], pagination: Pagination) -> Vec<String> {
    let units: Vec<String> = match pagination {
        Pagination::PerEntry => entries.to_vec(),
        Pagination::LinesPerPage(lines_per_page) => {
            let lines: Vec<&str> = entries.iter().flat_map(|entry| entry.split('\n')).collect();
            lines
                .chunks(lines_per_page.get())
                .map(|page| page.join("\n"))
                .collect()
        }
    };

    if units.is_empty() {
        vec![String::new()]
    } else {
        units
    }
}

/// Dialog playback state machine.
#[derive(Debug, Clone)]
pub struct Dialog {
    settings: DialogSettings,
    visible: bool,
    speaker: Option<String>,
    current: String,
    current_chars: usize,
    revealed_chars: usize,
    pending: VecDeque<String>,
    accumulator: Duration,
}

impl Default for Dialog {
    fn default() -> Self {
        Self::new(DialogSettings::default())
    }
}

impl Dialog {
    /// Creates an idle dialog machine with the provided settings.
    #[must_use]
    pub fn new(settings: DialogSettings) -> Self {
        Self {
            settings,
            visible: false,
            speaker: None,
            current: String::new(),
            current_chars: 0,
            revealed_chars: 0,
            pending: VecDeque::new(),
            accumulator: Duration::ZERO,
        }
    }

    /// Opens the script registered under `dialog_id`, replacing any visible dialog.
    pub fn show<S>(
        &mut self,
        dialog_id: &DialogId,
        speaker: Option<String>,
        store: &S,
        out: &mut Vec<Event>,
    ) where
        S: DialogLookup + ?Sized,
    {
        let Some(content) = store.lookup(dialog_id) else {
            debug!(dialog = %dialog_id, "dialog_missing");
            return;
        };

        let units = paginate(content.entries(), self.settings.pagination);
        debug!(dialog = %dialog_id, units = units.len(), "dialog_shown");

        self.pending = units.into();
        self.visible = true;
        self.speaker = speaker.clone();
        out.push(Event::DialogVisibilityChanged { visible: true });
        out.push(Event::DialogSpeakerChanged { speaker });
        self.start_next_unit(out);
    }

    /// Advances the typewriter by `dt`, revealing one character per elapsed interval.
    pub fn update(&mut self, dt: Duration, out: &mut Vec<Event>) {
        if self.phase() != DialogPhase::Revealing {
            return;
        }

        let interval = self.settings.character_interval;
        if interval.is_zero() {
            self.reveal_all(out);
            return;
        }

        self.accumulator += dt;
        while self.accumulator >= interval && self.revealed_chars < self.current_chars {
            self.accumulator -= interval;
            self.revealed_chars += 1;
            out.push(Event::DialogTextRevealed {
                text: self.revealed_text().to_owned(),
            });
        }

        if self.revealed_chars >= self.current_chars {
            self.accumulator = Duration::ZERO;
        }
    }

    /// Completes the current unit, or moves past it once it is fully shown.
    pub fn advance(&mut self, out: &mut Vec<Event>) {
        match self.phase() {
            DialogPhase::Idle => {}
            DialogPhase::Revealing => self.reveal_all(out),
            DialogPhase::PageComplete => {
                if self.pending.is_empty() {
                    self.reset();
                    debug!("dialog_finished");
                    out.push(Event::DialogVisibilityChanged { visible: false });
                    out.push(Event::DialogClosed);
                } else {
                    self.start_next_unit(out);
                }
            }
        }
    }

    /// Hides the dialog immediately without signalling natural completion.
    ///
    /// Closing an idle machine emits nothing, not even a repeated
    /// `DialogVisibilityChanged { visible: false }`.
    pub fn close(&mut self, out: &mut Vec<Event>) {
        if !self.visible {
            return;
        }

        self.reset();
        debug!("dialog_dismissed");
        out.push(Event::DialogVisibilityChanged { visible: false });
    }

    /// Executes an explicit dialog command.
    pub fn apply<S>(&mut self, command: DialogCommand, store: &S, out: &mut Vec<Event>)
    where
        S: DialogLookup + ?Sized,
    {
        match command {
            DialogCommand::Show { dialog_id, speaker } => {
                self.show(&dialog_id, speaker, store, out);
            }
            DialogCommand::Advance => self.advance(out),
            DialogCommand::Close => self.close(out),
        }
    }

    /// Consumes world events, opening scripts on interactions and clocking the reveal.
    pub fn handle<S>(&mut self, events: &[Event], store: &S, out: &mut Vec<Event>)
    where
        S: DialogLookup + ?Sized,
    {
        for event in events {
            match event {
                Event::Interaction { dialog_id, speaker } => {
                    self.show(dialog_id, speaker.clone(), store, out);
                }
                Event::TimeAdvanced { dt } => self.update(*dt, out),
                _ => {}
            }
        }
    }

    /// Reports whether the dialog box is shown.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Current playback phase.
    #[must_use]
    pub fn phase(&self) -> DialogPhase {
        if !self.visible {
            DialogPhase::Idle
        } else if self.revealed_chars < self.current_chars {
            DialogPhase::Revealing
        } else {
            DialogPhase::PageComplete
        }
    }

    /// Reports whether the current unit is fully revealed. Holds trivially while idle.
    #[must_use]
    pub fn is_current_page_complete(&self) -> bool {
        self.phase() != DialogPhase::Revealing
    }

    /// Speaker attached to the visible dialog.
    #[must_use]
    pub fn speaker(&self) -> Option<&str> {
        self.speaker.as_deref()
    }

    /// Revealed prefix of the current unit.
    #[must_use]
    pub fn revealed_text(&self) -> &str {
        let end = self
            .current
            .char_indices()
            .nth(self.revealed_chars)
            .map_or(self.current.len(), |(index, _)| index);
        &self.current[..end]
    }

    /// Full text of the current unit, if a dialog is visible.
    #[must_use]
    pub fn current_unit(&self) -> Option<&str> {
        self.visible.then_some(self.current.as_str())
    }

    /// Number of units queued after the current one.
    #[must_use]
    pub fn pending_units(&self) -> usize {
        self.pending.len()
    }

    fn start_next_unit(&mut self, out: &mut Vec<Event>) {
        let unit = self.pending.pop_front().unwrap_or_default();
        self.current_chars = unit.chars().count();
        self.current = unit;
        self.accumulator = Duration::ZERO;
        self.revealed_chars = if self.settings.instant_reveal {
            self.current_chars
        } else {
            0
        };
        out.push(Event::DialogTextRevealed {
            text: self.revealed_text().to_owned(),
        });
    }

    fn reveal_all(&mut self, out: &mut Vec<Event>) {
        self.revealed_chars = self.current_chars;
        self.accumulator = Duration::ZERO;
        out.push(Event::DialogTextRevealed {
            text: self.current.clone(),
        });
    }

    fn reset(&mut self) {
        self.visible = false;
        self.speaker = None;
        self.current.clear();
        self.current_chars = 0;
        self.revealed_chars = 0;
        self.pending.clear();
        self.accumulator = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| (*line).to_owned()).collect()
    }

    #[test]
    fn pagination_groups_lines_across_entries() {
        let units = paginate(
            &entries(&["one\ntwo", "three", "four\nfive"]),
            Pagination::from_lines_per_page(2),
        );

        assert_eq!(units, vec!["one\ntwo", "three\nfour", "five"]);
    }

    #[test]
    fn per_entry_pagination_keeps_entries_intact() {
        let units = paginate(&entries(&["a\nb", "c"]), Pagination::from_lines_per_page(0));

        assert_eq!(units, vec!["a\nb", "c"]);
    }

    #[test]
    fn empty_script_yields_single_empty_unit() {
        assert_eq!(paginate(&[], Pagination::default()), vec![String::new()]);
        assert_eq!(paginate(&[], Pagination::PerEntry), vec![String::new()]);
    }

    #[test]
    fn revealed_text_counts_characters_not_bytes() {
        let mut dialog = Dialog::default();
        dialog.visible = true;
        dialog.current = "héllo".to_owned();
        dialog.current_chars = 5;
        dialog.revealed_chars = 2;

        assert_eq!(dialog.revealed_text(), "hé");
    }

    #[test]
    fn idle_machine_reports_complete_page() {
        let dialog = Dialog::default();

        assert_eq!(dialog.phase(), DialogPhase::Idle);
        assert!(dialog.is_current_page_complete());
        assert_eq!(dialog.current_unit(), None);
    }
}
