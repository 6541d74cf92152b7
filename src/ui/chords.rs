// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song structure, chord grid and upcoming chord widgets.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::playback::{
    active_section_index, chord_grid, highlighted_chord_index, upcoming_chords, PlaybackState,
    GRID_SIZE,
};

/// Number of upcoming chords listed
pub const UPCOMING_COUNT: usize = 3;

/// Row of section names with the active one emphasized
pub struct SectionsWidget<'a> {
    state: &'a PlaybackState,
}

impl<'a> SectionsWidget<'a> {
    pub fn new(state: &'a PlaybackState) -> Self {
        Self { state }
    }

    fn spans(&self) -> Vec<Span<'a>> {
        let Some(song) = self.state.song() else {
            return vec![Span::styled("No song loaded", Style::default().fg(Color::DarkGray))];
        };
        let active = active_section_index(self.state);
        song.sections()
            .iter()
            .enumerate()
            .flat_map(|(i, section)| {
                let style = if Some(i) == active {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else if section.chords.is_empty() {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default().fg(Color::White)
                };
                [
                    Span::styled(format!(" {} {} ", i + 1, section.name), style),
                    Span::raw(" "),
                ]
            })
            .collect()
    }
}

impl Widget for SectionsWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(Line::from(self.spans())).render(area, buf);
    }
}

/// Two-by-two grid of the chords around the playhead
pub struct ChordGridWidget<'a> {
    chords: Vec<Option<&'a str>>,
    highlighted: Option<usize>,
}

impl<'a> ChordGridWidget<'a> {
    pub fn new(state: &'a PlaybackState) -> Self {
        Self {
            chords: chord_grid(state),
            highlighted: highlighted_chord_index(state),
        }
    }
}

impl Widget for ChordGridWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.chords.is_empty() {
            Paragraph::new("No chords")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .render(area, buf);
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        for slot in 0..GRID_SIZE {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(rows[slot / 2]);
            let cell = cols[slot % 2];

            let chord = self.chords.get(slot).copied().flatten();
            let lit = self.highlighted == Some(slot);
            let (border, text) = match (chord, lit) {
                (Some(_), true) => (
                    Style::default().fg(Color::Yellow),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                (Some(_), false) => (
                    Style::default().fg(Color::Gray),
                    Style::default().fg(Color::White),
                ),
                (None, _) => (
                    Style::default().fg(Color::DarkGray),
                    Style::default().fg(Color::DarkGray),
                ),
            };

            let block = Block::default().borders(Borders::ALL).border_style(border);
            let inner = block.inner(cell);
            block.render(cell, buf);

            // Vertically center the symbol
            let line_area = Rect {
                y: inner.y + inner.height.saturating_sub(1) / 2,
                height: inner.height.min(1),
                ..inner
            };
            Paragraph::new(chord.unwrap_or("·"))
                .style(text)
                .alignment(Alignment::Center)
                .render(line_area, buf);
        }
    }
}

/// The next few chords with their section names
pub struct UpcomingWidget<'a> {
    state: &'a PlaybackState,
}

impl<'a> UpcomingWidget<'a> {
    pub fn new(state: &'a PlaybackState) -> Self {
        Self { state }
    }
}

impl Widget for UpcomingWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let upcoming = upcoming_chords(self.state, UPCOMING_COUNT);
        let lines: Vec<Line> = if upcoming.is_empty() {
            vec![Line::from(Span::styled("-", Style::default().fg(Color::DarkGray)))]
        } else {
            upcoming
                .iter()
                .enumerate()
                .map(|(i, next)| {
                    Line::from(vec![
                        Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                        Span::styled(
                            format!("{:<8}", next.chord),
                            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(next.section_name, Style::default().fg(Color::Cyan)),
                    ])
                })
                .collect()
        };
        Paragraph::new(lines).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::Song;

    const YAML: &str = r#"
title: Grid
chord_progression:
  sections:
    - name: Verse
      chords:
        - { chord: C, beats: 1 }
        - { chord: Am, beats: 1 }
        - { chord: F, beats: 1 }
        - { chord: G, beats: 1 }
        - { chord: Em, beats: 1 }
    - name: Bridge
      chords: []
"#;

    fn state() -> PlaybackState {
        let mut state = PlaybackState::new();
        state.load_song(Song::from_yaml(YAML).unwrap());
        state
    }

    fn text(buf: &Buffer) -> String {
        let area = buf.area;
        (area.y..area.y + area.height)
            .map(|y| {
                (area.x..area.x + area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_sections_lists_names() {
        let state = state();
        let spans = SectionsWidget::new(&state).spans();
        let joined: String = spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(joined.contains("1 Verse"));
        assert!(joined.contains("2 Bridge"));
        assert_eq!(spans[0].style.bg, Some(Color::Cyan));
        assert_eq!(spans[2].style.fg, Some(Color::DarkGray));
    }

    #[test]
    fn test_sections_without_song() {
        let state = PlaybackState::new();
        let spans = SectionsWidget::new(&state).spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "No song loaded");
    }

    #[test]
    fn test_grid_pages_with_playhead() {
        let mut state = state();
        state.play();
        for _ in 0..4 {
            state.advance_beat().unwrap();
        }
        let grid = ChordGridWidget::new(&state);
        assert_eq!(grid.chords, vec![Some("Em"), None, None, None]);
        assert_eq!(grid.highlighted, Some(0));

        let area = Rect::new(0, 0, 20, 6);
        let mut buf = Buffer::empty(area);
        grid.render(area, &mut buf);
        let rendered = text(&buf);
        assert!(rendered.contains("Em"));
        assert!(rendered.contains('·'));
    }

    #[test]
    fn test_upcoming_render() {
        let state = state();
        let area = Rect::new(0, 0, 24, 3);
        let mut buf = Buffer::empty(area);
        UpcomingWidget::new(&state).render(area, &mut buf);
        let rendered = text(&buf);
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[0].starts_with("1. Am"));
        assert!(lines[0].contains("Verse"));
        assert!(lines[2].starts_with("3. G"));
    }
}
