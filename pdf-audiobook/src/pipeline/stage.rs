//! States of the conversion pipeline and their allowed transitions.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    Extracting,
    Normalizing,
    Segmenting,
    Synthesizing,
    Assembling,
    CleaningUp,
    Done,
    Failed,
}

impl Stage {
    /// Whether the run has ended.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }

    /// Whether `next` may follow `self`.
    ///
    /// The flow is linear; any non-terminal stage may fail. Synthesis may
    /// finish directly when nothing is merged, and assembly may finish
    /// without cleanup.
    pub fn can_advance_to(self, next: Stage) -> bool {
        use Stage::*;

        if next == Failed {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Init, Extracting)
                | (Extracting, Normalizing)
                | (Normalizing, Segmenting)
                | (Segmenting, Synthesizing)
                | (Synthesizing, Assembling)
                | (Synthesizing, Done)
                | (Assembling, CleaningUp)
                | (Assembling, Done)
                | (CleaningUp, Done)
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::Extracting => "extracting",
            Stage::Normalizing => "normalizing",
            Stage::Segmenting => "segmenting",
            Stage::Synthesizing => "synthesizing",
            Stage::Assembling => "assembling",
            Stage::CleaningUp => "cleaning up",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}
