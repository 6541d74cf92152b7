// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Terminal UI for JAMM.
//!
//! Provides a ratatui-based terminal interface with the song header,
//! transport, song structure, chord grid, beat indicator, upcoming chords
//! and the instrument visualizer.

mod chords;
mod instrument;
mod transport;

pub use chords::{ChordGridWidget, SectionsWidget, UpcomingWidget, UPCOMING_COUNT};
pub use instrument::{InstrumentWidget, PIANO_OCTAVES, PIANO_START_OCTAVE};
pub use transport::{BeatIndicator, TransportWidget, VolumeWidget};

use std::collections::BTreeMap;
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};

use crate::control::{format_shortcut, ControlAction, KeyboardController};
use crate::playback::{visualized_chord, PlaybackState};

/// How long a status message stays up
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// UI-only state
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Help text visible
    pub show_help: bool,
    /// Status message
    pub status_message: Option<String>,
    /// Status message timestamp
    pub status_time: Option<Instant>,
}

impl UiState {
    /// Set a status message that will be displayed temporarily
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_time = Some(Instant::now());
    }

    /// Clear expired status message
    pub fn clear_expired_status(&mut self) {
        if let Some(time) = self.status_time {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
                self.status_time = None;
            }
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }
}

/// Terminal UI application
pub struct App<B: Backend = CrosstermBackend<Stdout>> {
    terminal: Terminal<B>,
    /// Owns raw mode and the alternate screen
    raw: bool,
}

impl App {
    /// Take over the terminal
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self {
            terminal,
            raw: true,
        })
    }
}

impl<B: Backend> App<B> {
    /// Draw onto an arbitrary backend without touching the real terminal
    pub fn with_backend(backend: B) -> io::Result<Self> {
        Ok(Self {
            terminal: Terminal::new(backend)?,
            raw: false,
        })
    }

    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }

    /// Draw the UI
    pub fn draw(
        &mut self,
        state: &PlaybackState,
        ui: &UiState,
        keys: &KeyboardController,
    ) -> io::Result<()> {
        self.terminal.draw(|frame| render(frame, state, ui, keys))?;
        Ok(())
    }
}

impl<B: Backend> Drop for App<B> {
    fn drop(&mut self) {
        if !self.raw {
            return;
        }
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Lay out and render one frame
pub fn render(frame: &mut Frame, state: &PlaybackState, ui: &UiState, keys: &KeyboardController) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Song header
            Constraint::Length(3),  // Transport
            Constraint::Length(3),  // Song structure
            Constraint::Min(10),    // Chords and visualizer
            Constraint::Length(1),  // Status bar
        ])
        .split(area);

    render_header(frame, chunks[0], state);

    frame.render_widget(
        TransportWidget::new(state).block(Block::default().borders(Borders::ALL).title(" Transport ")),
        chunks[1],
    );

    let block = Block::default().borders(Borders::ALL).title(" Structure ");
    let inner = block.inner(chunks[2]);
    frame.render_widget(block, chunks[2]);
    frame.render_widget(SectionsWidget::new(state), inner);

    render_body(frame, chunks[3], state);
    render_status_bar(frame, chunks[4], ui);

    if ui.show_help {
        render_help_overlay(frame, area, keys);
    }
}

/// Render song title and metadata
fn render_header(frame: &mut Frame, area: Rect, state: &PlaybackState) {
    let block = Block::default().borders(Borders::ALL).title(" JAMM ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(song) = state.song() else {
        frame.render_widget(
            Paragraph::new("No song loaded").style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    };

    let dim = Style::default().fg(Color::DarkGray);
    let mut spans = vec![
        Span::styled(
            song.title.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
    ];
    if !song.artist.is_empty() {
        spans.push(Span::styled(format!(" - {}", song.artist), Style::default().fg(Color::Gray)));
    }
    spans.push(Span::styled("  Key ", dim));
    spans.push(Span::styled(song.original_key.clone(), Style::default().fg(Color::Cyan)));
    spans.push(Span::styled("  Time ", dim));
    spans.push(Span::styled(song.time_signature.clone(), Style::default().fg(Color::Cyan)));
    spans.push(Span::styled("  ", dim));
    spans.push(Span::styled(song.difficulty.to_string(), Style::default().fg(Color::Yellow)));
    if let Some(genre) = &song.genre {
        spans.push(Span::styled(format!("  {}", genre), dim));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

/// Render chord grid with beat indicator, upcoming chords and visualizer
fn render_body(frame: &mut Frame, area: Rect, state: &PlaybackState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let block = Block::default().borders(Borders::ALL).title(" Chords ");
    let inner = block.inner(columns[0]);
    frame.render_widget(block, columns[0]);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(1)])
        .split(inner);
    frame.render_widget(ChordGridWidget::new(state), left[0]);
    frame.render_widget(BeatIndicator::from_state(state), left[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(UPCOMING_COUNT as u16 + 2),
            Constraint::Min(4),
        ])
        .split(columns[1]);

    let block = Block::default().borders(Borders::ALL).title(" Up Next ");
    let inner = block.inner(right[0]);
    frame.render_widget(block, right[0]);
    frame.render_widget(UpcomingWidget::new(state), inner);

    let chord = visualized_chord(state);
    let title = match chord {
        Some(chord) => format!(" {} - {} ", state.instrument(), chord),
        None => format!(" {} ", state.instrument()),
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(right[1]);
    frame.render_widget(block, right[1]);
    frame.render_widget(InstrumentWidget::new(state.instrument(), chord), inner);
}

/// Render status bar
fn render_status_bar(frame: &mut Frame, area: Rect, ui: &UiState) {
    let text = if let Some(ref msg) = ui.status_message {
        Span::styled(msg.as_str(), Style::default().fg(Color::Yellow))
    } else {
        Span::styled(
            " Space: Play/Pause | Esc: Stop | ↑/↓: Tempo | 1-9: Section | i: Instrument | h: Help | q: Quit",
            Style::default().fg(Color::DarkGray),
        )
    };

    frame.render_widget(Paragraph::new(text), area);
}

/// Help entries per category: shortcuts sharing a description are
/// merged, and the section keys collapse into one line
fn help_entries(keys: &KeyboardController) -> Vec<(&'static str, Vec<(String, String)>)> {
    keys.bindings_by_category()
        .into_iter()
        .map(|(category, bindings)| {
            let mut merged: BTreeMap<String, Vec<String>> = BTreeMap::new();
            let mut sections = 0;
            for binding in bindings {
                if matches!(binding.action, ControlAction::SelectSection(_)) {
                    sections += 1;
                    continue;
                }
                merged
                    .entry(binding.description.clone())
                    .or_default()
                    .push(format_shortcut(&binding.shortcut));
            }
            let mut entries: Vec<(String, String)> = merged
                .into_iter()
                .map(|(description, mut shortcuts)| {
                    shortcuts.sort();
                    (shortcuts.join("/"), description)
                })
                .collect();
            if sections > 0 {
                entries.insert(0, (format!("1-{}", sections), "Select section".to_string()));
            }
            (category.title(), entries)
        })
        .collect()
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, area: Rect, keys: &KeyboardController) {
    let mut help_text = Vec::new();
    for (category, entries) in help_entries(keys) {
        if !help_text.is_empty() {
            help_text.push(Line::from(""));
        }
        help_text.push(Line::from(Span::styled(
            category,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (shortcut, description) in entries {
            help_text.push(Line::from(format!("  {:<14}{}", shortcut, description)));
        }
    }

    let width = 44.min(area.width.saturating_sub(4));
    let height = (help_text.len() as u16 + 2).min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let help_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, help_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);
    frame.render_widget(Paragraph::new(help_text), inner);
}
