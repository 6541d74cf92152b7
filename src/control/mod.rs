// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Control system for keyboard input.
//!
//! Keys map to `ControlAction`s, which the session applies to the
//! playback state.

pub mod keyboard;

pub use keyboard::{format_shortcut, KeyBinding, KeyCategory, KeyboardController, Shortcut};

use crate::music::Instrument;

/// Action that can be triggered by controls
#[derive(Debug, Clone, PartialEq)]
pub enum ControlAction {
    // Transport
    /// Toggle play/pause
    TogglePlay,
    /// Start playback
    Play,
    /// Pause playback
    Pause,
    /// Stop and rewind
    Stop,
    /// Rewind, then keep playing if playing
    Restart,

    // Tempo
    /// Set tempo to specific value
    SetTempo(f64),
    /// Adjust tempo by delta
    AdjustTempo(f64),

    // Sound
    /// Set volume to specific value
    SetVolume(i32),
    /// Adjust volume by delta
    AdjustVolume(i32),
    /// Toggle metronome mute
    ToggleMute,
    /// Switch to the next configured metronome sound
    CycleSound,
    /// Switch to a named metronome sound
    SetSound(String),

    // Song
    /// Select a section to start from
    SelectSection(usize),

    // Visualizer
    /// Show the previous chord of the grid on the visualizer
    PreviousChord,
    /// Show the next chord of the grid on the visualizer
    NextChord,
    /// Switch between piano and guitar
    ToggleInstrument,
    /// Show a specific instrument
    SetInstrument(Instrument),

    // UI
    /// Toggle help display
    ToggleHelp,
    /// Quit application
    Quit,
}

impl ControlAction {
    /// Group the action is listed under in the help overlay
    pub fn category(&self) -> KeyCategory {
        use ControlAction::*;
        match self {
            TogglePlay | Play | Pause | Stop | Restart => KeyCategory::Transport,
            SetTempo(_) | AdjustTempo(_) => KeyCategory::Tempo,
            SetVolume(_) | AdjustVolume(_) | ToggleMute | CycleSound | SetSound(_) => {
                KeyCategory::Sound
            }
            SelectSection(_) => KeyCategory::Song,
            PreviousChord | NextChord | ToggleInstrument | SetInstrument(_) => {
                KeyCategory::Visualizer
            }
            ToggleHelp | Quit => KeyCategory::Ui,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_categories() {
        assert_eq!(ControlAction::Restart.category(), KeyCategory::Transport);
        assert_eq!(ControlAction::AdjustTempo(-5.0).category(), KeyCategory::Tempo);
        assert_eq!(ControlAction::SetSound("wood".into()).category(), KeyCategory::Sound);
        assert_eq!(ControlAction::SelectSection(2).category(), KeyCategory::Song);
        assert_eq!(ControlAction::NextChord.category(), KeyCategory::Visualizer);
        assert_eq!(ControlAction::Quit.category(), KeyCategory::Ui);
    }
}
