// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Piano and guitar chord visualizers.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::music::instrument::{GUITAR_FRETS, GUITAR_STRINGS};
use crate::music::{guitar_fingering, piano_keys, FretPosition, Instrument, PianoKey};

/// First octave of the piano strip
pub const PIANO_START_OCTAVE: u8 = 4;

/// Octaves drawn on the piano strip
pub const PIANO_OCTAVES: u8 = 2;

/// String names from string 1 (high e) to string 6 (low E)
const STRING_NAMES: [&str; GUITAR_STRINGS as usize] = ["e", "B", "G", "D", "A", "E"];

/// Draws a chord on the selected instrument
pub struct InstrumentWidget<'a> {
    instrument: Instrument,
    chord: Option<&'a str>,
}

impl<'a> InstrumentWidget<'a> {
    pub fn new(instrument: Instrument, chord: Option<&'a str>) -> Self {
        Self { instrument, chord }
    }
}

impl Widget for InstrumentWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = match self.instrument {
            Instrument::Piano => {
                piano_lines(&piano_keys(self.chord, PIANO_START_OCTAVE, PIANO_OCTAVES))
            }
            Instrument::Guitar => match self.chord {
                Some(chord) => guitar_lines(&guitar_fingering(chord)),
                None => vec![Line::from(Span::styled(
                    "No chord",
                    Style::default().fg(Color::DarkGray),
                ))],
            },
        };
        Paragraph::new(lines).render(area, buf);
    }
}

/// Black keys on the top line, white keys below; chord tones lit
fn piano_lines(keys: &[PianoKey]) -> Vec<Line<'static>> {
    let mut black = Vec::with_capacity(keys.len());
    let mut white = Vec::with_capacity(keys.len());

    for key in keys {
        let name = format!("{:<2}", key.note.name());
        let (black_span, white_span) = if key.is_black {
            let style = if key.is_active {
                Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray).bg(Color::Black)
            };
            (Span::styled(name, style), Span::raw("  "))
        } else {
            let style = if key.is_active {
                Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Black).bg(Color::White)
            };
            (Span::raw("  "), Span::styled(name, style))
        };
        black.push(black_span);
        white.push(white_span);
    }

    vec![Line::from(black), Line::from(white)]
}

/// One line per string, high e first, frets 1 to `GUITAR_FRETS`
fn guitar_lines(fingering: &[FretPosition]) -> Vec<Line<'static>> {
    if fingering.is_empty() {
        return vec![Line::from(Span::styled(
            "No shape for this chord",
            Style::default().fg(Color::DarkGray),
        ))];
    }

    let dot = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let wire = Style::default().fg(Color::Gray);

    (1..=GUITAR_STRINGS)
        .map(|string| {
            let fretted = |fret: u8| fingering.iter().any(|p| p.string == string && p.fret == fret);
            let open = if fretted(0) { "o" } else { " " };

            let mut spans = vec![
                Span::styled(
                    format!("{} ", STRING_NAMES[(string - 1) as usize]),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(open, dot),
                Span::styled("|", wire),
            ];
            for fret in 1..=GUITAR_FRETS {
                if fretted(fret) {
                    spans.push(Span::styled("-", wire));
                    spans.push(Span::styled("●", dot));
                    spans.push(Span::styled("-|", wire));
                } else {
                    spans.push(Span::styled("---|", wire));
                }
            }
            Line::from(spans)
        })
        .collect()
}
