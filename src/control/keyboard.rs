// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Keyboard shortcut handling.
//!
//! The default map covers transport, tempo, the click sound, section
//! selection and the visualizer. Bindings are grouped by `KeyCategory`
//! for the help overlay.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crossterm::event::{KeyCode, KeyModifiers};

use super::ControlAction;

/// Sections reachable with the digit keys
const SECTION_KEYS: u32 = 9;

/// Help grouping, in display order. Each action belongs to exactly one,
/// see `ControlAction::category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyCategory {
    Transport,
    Tempo,
    Sound,
    Song,
    Visualizer,
    Ui,
}

impl KeyCategory {
    pub fn title(self) -> &'static str {
        match self {
            KeyCategory::Transport => "Transport",
            KeyCategory::Tempo => "Tempo",
            KeyCategory::Sound => "Sound",
            KeyCategory::Song => "Song",
            KeyCategory::Visualizer => "Visualizer",
            KeyCategory::Ui => "UI",
        }
    }
}

impl fmt::Display for KeyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A key plus the modifiers that must be held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shortcut {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl Shortcut {
    pub fn key(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    fn char(c: char) -> Self {
        Self::key(KeyCode::Char(c))
    }
}

/// A shortcut bound to an action
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub shortcut: Shortcut,
    pub action: ControlAction,
    /// Shown in the help overlay; bindings sharing one are listed together
    pub description: String,
    pub category: KeyCategory,
}

impl KeyBinding {
    /// Bind `action`, filed under the action's own category
    pub fn new(shortcut: Shortcut, action: ControlAction, description: impl Into<String>) -> Self {
        Self {
            category: action.category(),
            shortcut,
            action,
            description: description.into(),
        }
    }
}

/// Maps key events to control actions
pub struct KeyboardController {
    bindings: HashMap<Shortcut, KeyBinding>,
}

impl KeyboardController {
    /// A controller with no bindings
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// A controller with the default practice key map
    pub fn with_defaults() -> Self {
        use ControlAction::*;

        let mut controller = Self::new();
        // Transport
        controller.bind_all([
            (Shortcut::char(' '), TogglePlay, "Play/Pause"),
            (Shortcut::key(KeyCode::Esc), Stop, "Stop"),
            (Shortcut::char('s'), Stop, "Stop"),
            (Shortcut::char('r'), Restart, "Restart"),
        ]);
        // Tempo
        controller.bind_all([
            (Shortcut::key(KeyCode::Up), AdjustTempo(1.0), "Tempo +1 BPM"),
            (Shortcut::key(KeyCode::Down), AdjustTempo(-1.0), "Tempo -1 BPM"),
            (Shortcut::shift(KeyCode::Up), AdjustTempo(5.0), "Tempo +5 BPM"),
            (Shortcut::shift(KeyCode::Down), AdjustTempo(-5.0), "Tempo -5 BPM"),
        ]);
        // Sound
        controller.bind_all([
            (Shortcut::char('+'), AdjustVolume(5), "Volume +5"),
            (Shortcut::char('='), AdjustVolume(5), "Volume +5"),
            (Shortcut::char('-'), AdjustVolume(-5), "Volume -5"),
            (Shortcut::char('m'), ToggleMute, "Mute"),
            (Shortcut::char('k'), CycleSound, "Next Click Sound"),
        ]);
        // Sections
        controller.bind_all((1..=SECTION_KEYS).filter_map(|i| {
            let c = char::from_digit(i, 10)?;
            Some((
                Shortcut::char(c),
                SelectSection((i - 1) as usize),
                format!("Select Section {}", i),
            ))
        }));
        // Visualizer
        controller.bind_all([
            (Shortcut::key(KeyCode::Left), PreviousChord, "Previous Chord"),
            (Shortcut::key(KeyCode::Right), NextChord, "Next Chord"),
            (Shortcut::char('i'), ToggleInstrument, "Piano/Guitar"),
        ]);
        // UI
        controller.bind_all([
            (Shortcut::char('?'), ToggleHelp, "Toggle Help"),
            (Shortcut::char('h'), ToggleHelp, "Toggle Help"),
            (Shortcut::char('q'), Quit, "Quit"),
            (Shortcut::ctrl(KeyCode::Char('c')), Quit, "Quit"),
        ]);
        controller
    }

    fn bind_all<I, D>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (Shortcut, ControlAction, D)>,
        D: Into<String>,
    {
        for (shortcut, action, description) in entries {
            self.bind(KeyBinding::new(shortcut, action, description));
        }
    }

    /// Add a binding, replacing any binding on the same shortcut
    pub fn bind(&mut self, binding: KeyBinding) {
        self.bindings.insert(binding.shortcut, binding);
    }

    /// Action for a key event.
    ///
    /// Terminals report shifted symbols like `+` or `?` with the Shift
    /// modifier, so character keys fall back to an unmodified lookup.
    pub fn process_key(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<ControlAction> {
        let lookup = |modifiers| self.bindings.get(&Shortcut { code, modifiers });
        lookup(modifiers)
            .or_else(|| match code {
                KeyCode::Char(_) if modifiers == KeyModifiers::SHIFT => lookup(KeyModifiers::NONE),
                _ => None,
            })
            .map(|b| b.action.clone())
    }

    /// Bindings per category in display order, each sorted by description
    pub fn bindings_by_category(&self) -> BTreeMap<KeyCategory, Vec<&KeyBinding>> {
        let mut grouped: BTreeMap<KeyCategory, Vec<&KeyBinding>> = BTreeMap::new();
        for binding in self.bindings.values() {
            grouped.entry(binding.category).or_default().push(binding);
        }
        for bindings in grouped.values_mut() {
            bindings.sort_by(|a, b| {
                a.description
                    .cmp(&b.description)
                    .then_with(|| format_shortcut(&a.shortcut).cmp(&format_shortcut(&b.shortcut)))
            });
        }
        grouped
    }
}

impl Default for KeyboardController {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Human-readable shortcut ("Ctrl+C", "Shift+↑", "Space")
pub fn format_shortcut(shortcut: &Shortcut) -> String {
    let key = match shortcut.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_uppercase().to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        other => format!("{:?}", other),
    };

    [
        (KeyModifiers::CONTROL, "Ctrl"),
        (KeyModifiers::ALT, "Alt"),
        (KeyModifiers::SHIFT, "Shift"),
    ]
    .iter()
    .filter(|(m, _)| shortcut.modifiers.contains(*m))
    .map(|(_, name)| name.to_string())
    .chain(std::iter::once(key))
    .collect::<Vec<_>>()
    .join("+")
}
