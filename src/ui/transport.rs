// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Transport and beat display widgets.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};

use crate::playback::{current_chord, tempo_label, PlaybackMode, PlaybackState, MAX_VOLUME};

/// Transport widget for displaying play state, tempo and metronome sound
pub struct TransportWidget<'a> {
    state: &'a PlaybackState,
    block: Option<Block<'a>>,
}

impl<'a> TransportWidget<'a> {
    /// Create a new transport widget
    pub fn new(state: &'a PlaybackState) -> Self {
        Self { state, block: None }
    }

    /// Set the block wrapper
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for TransportWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(10), // Play state
                Constraint::Length(2),  // Spacer
                Constraint::Length(22), // Tempo
                Constraint::Length(2),  // Spacer
                Constraint::Length(20), // Volume
                Constraint::Length(2),  // Spacer
                Constraint::Min(0),     // Sound
            ])
            .split(area);

        let (indicator, style) = if self.state.is_playing() {
            ("▶ PLAY", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        } else if self.state.mode() == PlaybackMode::Auto {
            ("‖ PAUSE", Style::default().fg(Color::Yellow))
        } else {
            ("■ STOP", Style::default().fg(Color::Yellow))
        };
        Paragraph::new(indicator).style(style).render(chunks[0], buf);

        let tempo = self.state.tempo();
        Paragraph::new(Line::from(vec![
            Span::styled(
                format!("{:.0} BPM ", tempo),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            ),
            Span::styled(tempo_label(tempo), Style::default().fg(Color::DarkGray)),
        ]))
        .render(chunks[2], buf);

        VolumeWidget::new(self.state.volume(), self.state.is_muted()).render(chunks[4], buf);

        Paragraph::new(format!("♪ {}", self.state.metronome_sound()))
            .style(Style::default().fg(Color::Cyan))
            .render(chunks[6], buf);
    }
}

/// Volume meter with mute indicator
pub struct VolumeWidget {
    volume: u8,
    muted: bool,
}

impl VolumeWidget {
    pub fn new(volume: u8, muted: bool) -> Self {
        Self { volume, muted }
    }
}

impl Widget for VolumeWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.muted {
            Paragraph::new("MUTED")
                .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
                .render(area, buf);
            return;
        }

        let label = format!(" {:3}", self.volume);
        let meter_width = (area.width as usize).saturating_sub(label.len());
        let filled = (self.volume.min(MAX_VOLUME) as usize * meter_width) / MAX_VOLUME as usize;
        let meter = "█".repeat(filled) + &"░".repeat(meter_width - filled);
        Paragraph::new(Line::from(vec![
            Span::styled(meter, Style::default().fg(Color::Green)),
            Span::raw(label),
        ]))
        .render(area, buf);
    }
}

/// One dot per beat of the current chord, the sounding beat lit
pub struct BeatIndicator {
    beats: u32,
    current: Option<u32>,
}

impl BeatIndicator {
    pub fn new(beats: u32, current: Option<u32>) -> Self {
        Self { beats, current }
    }

    /// Indicator for the chord under the playhead; dark unless playing
    pub fn from_state(state: &PlaybackState) -> Self {
        let beats = current_chord(state).map(|c| c.beats).unwrap_or(0);
        let current = state.is_playing().then(|| state.position().beat);
        Self::new(beats, current)
    }

    fn symbols(&self) -> Vec<(bool, &'static str)> {
        (0..self.beats)
            .map(|i| {
                let lit = self.current == Some(i);
                (lit, if lit { "●" } else { "○" })
            })
            .collect()
    }
}

impl Widget for BeatIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let spans: Vec<Span> = self
            .symbols()
            .into_iter()
            .enumerate()
            .flat_map(|(i, (lit, symbol))| {
                let style = match (lit, i) {
                    (true, 0) => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    (true, _) => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    (false, _) => Style::default().fg(Color::DarkGray),
                };
                [Span::styled(symbol, style), Span::raw(" ")]
            })
            .collect();
        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::Song;

    fn loaded() -> PlaybackState {
        let song = Song::from_yaml(
            r#"
title: Dots
tempo_bpm: 100
chord_progression:
  sections:
    - name: A
      chords:
        - { chord: C, beats: 4 }
"#,
        )
        .unwrap();
        let mut state = PlaybackState::new();
        state.load_song(song);
        state
    }

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_beat_indicator_follows_position() {
        let mut state = loaded();
        let dark = BeatIndicator::from_state(&state);
        assert_eq!(dark.beats, 4);
        assert_eq!(dark.current, None);

        state.play();
        state.advance_beat().unwrap();
        let lit = BeatIndicator::from_state(&state);
        assert_eq!(
            lit.symbols().iter().map(|(_, s)| *s).collect::<String>(),
            "○●○○"
        );
    }

    #[test]
    fn test_volume_widget_render() {
        let area = Rect::new(0, 0, 14, 1);
        let mut buf = Buffer::empty(area);
        VolumeWidget::new(50, false).render(area, &mut buf);
        assert_eq!(row(&buf, 0), "█████░░░░░  50");

        let mut buf = Buffer::empty(area);
        VolumeWidget::new(50, true).render(area, &mut buf);
        assert!(row(&buf, 0).starts_with("MUTED"));
    }

    #[test]
    fn test_transport_render() {
        let mut state = loaded();
        state.play();
        let area = Rect::new(0, 0, 80, 1);
        let mut buf = Buffer::empty(area);
        TransportWidget::new(&state).render(area, &mut buf);
        let line = row(&buf, 0);
        assert!(line.contains("PLAY"));
        assert!(line.contains("100 BPM Moderate"));
        assert!(line.contains("metronome"));
    }
}
