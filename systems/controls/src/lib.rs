#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure controls system translating adapter input into world and dialog commands.

use silverton_core::{Command, DialogCommand, Direction, Event};

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlInput {
    /// Direction currently requested by the player, if any.
    pub direction: Option<Direction>,
    /// Indicates whether the interact/advance action was pressed on this frame.
    pub interact: bool,
    /// Indicates whether the cancel/back action was pressed on this frame.
    pub cancel: bool,
}

impl ControlInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(direction: Option<Direction>, interact: bool, cancel: bool) -> Self {
        Self {
            direction,
            interact,
            cancel,
        }
    }
}

/// Commands produced by the controls system for a single frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControlOutput {
    /// Commands destined for the world.
    pub world: Vec<Command>,
    /// Commands destined for the dialog machine.
    pub dialog: Vec<DialogCommand>,
    /// Set when the player asked to leave the experience.
    pub exit_requested: bool,
}

impl ControlOutput {
    /// Clears all batches so the buffer can be reused.
    pub fn clear(&mut self) {
        self.world.clear();
        self.dialog.clear();
        self.exit_requested = false;
    }
}

/// Controls system that routes input to movement or to the visible dialog.
#[derive(Debug, Clone, Default)]
pub struct Controls {
    modal: bool,
}

impl Controls {
    /// Creates a new controls system with no dialog visible.
    #[must_use]
    pub const fn new() -> Self {
        Self { modal: false }
    }

    /// Reports whether a dialog currently captures input.
    #[must_use]
    pub const fn is_modal(&self) -> bool {
        self.modal
    }

    /// Consumes events and the frame's input to emit commands.
    ///
    /// While a dialog is visible, interact advances it, cancel closes it and
    /// movement input is ignored.
    pub fn handle(&mut self, events: &[Event], input: ControlInput, out: &mut ControlOutput) {
        for event in events {
            if let Event::DialogVisibilityChanged { visible } = event {
                self.modal = *visible;
            }
        }

        if self.modal {
            if input.cancel {
                out.dialog.push(DialogCommand::Close);
            } else if input.interact {
                out.dialog.push(DialogCommand::Advance);
            }
            return;
        }

        if input.cancel {
            out.exit_requested = true;
            return;
        }

        if input.interact {
            out.world.push(Command::Interact);
        } else if let Some(direction) = input.direction {
            out.world.push(Command::StepPlayer { direction });
        }
    }
}
