use crossterm::style::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExampleState {
    Passed,
    Failed,
    /// Mocha leaves `state` unset on pending tests, so that is the default.
    #[default]
    #[serde(alias = "skipped")]
    Pending,
}

impl ExampleState {
    pub fn color(&self) -> Color {
        match self {
            ExampleState::Passed => Color::Green,
            ExampleState::Failed => Color::Red,
            ExampleState::Pending => Color::Yellow,
        }
    }

    /// Map a progress glyph back to its state. `E` (error) counts as a failure.
    pub fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '.' => Some(ExampleState::Passed),
            'F' | 'E' => Some(ExampleState::Failed),
            'P' => Some(ExampleState::Pending),
            _ => None,
        }
    }
}
