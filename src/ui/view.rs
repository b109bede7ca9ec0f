//! Turning a detector snapshot into styled lines, and drawing them.

use crossterm::cursor::MoveTo;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use std::io::{self, Write};

use super::locale::Locale;
use super::preview;
use crate::detector::{DetectorSnapshot, RunState};
use crate::model::{top_k, Prediction};

const BAR_WIDTH: usize = 20;

/// How a line is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Title,
    Plain,
    Dim,
    Error,
    Warning,
    Control,
    Disabled,
    Highlight,
    Preview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub tone: Tone,
}

impl Line {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

/// Display settings that do not change while the app runs.
#[derive(Debug, Clone, Copy)]
pub struct ViewOptions {
    pub locale: Locale,
    /// Cards scoring strictly above this are highlighted.
    pub highlight_threshold: f32,
    pub preview: bool,
    /// Show only the best K predictions. Display only; the detector always
    /// publishes the full set.
    pub max_predictions: Option<usize>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            highlight_threshold: 0.6,
            preview: true,
            max_predictions: None,
        }
    }
}

/// Lay out one screen for `snap` in a `cols` x `rows` terminal.
pub fn layout(snap: &DetectorSnapshot, options: &ViewOptions, cols: u16, rows: u16) -> Vec<Line> {
    let msg = options.locale.messages();

    let mut head = vec![
        Line::new(format!("😷 {}", msg.title), Tone::Title),
        Line::new(msg.subtitle, Tone::Dim),
        Line::new("", Tone::Plain),
    ];
    match (snap.state, snap.notice) {
        (RunState::Idle | RunState::Loading, _) => {
            head.push(Line::new(format!("⏳ {}", msg.loading), Tone::Plain));
        }
        (_, Some(notice)) => {
            head.push(Line::new(format!("❌ {}", msg.notice(notice)), Tone::Error));
        }
        (RunState::Running, None) => {}
        (_, None) => {
            if snap.loop_halted {
                head.push(Line::new(format!("⚠ {}", msg.loop_halted), Tone::Warning));
            }
            head.push(Line::new(format!("📹 {}", msg.placeholder), Tone::Plain));
        }
    }

    let mut tail = Vec::new();
    tail.push(control_line(snap, options.locale));
    if !snap.predictions.is_empty() {
        tail.push(Line::new("", Tone::Plain));
        tail.push(Line::new(format!("📊 {}", msg.results), Tone::Plain));
        let shown = match options.max_predictions {
            Some(k) => top_k(&snap.predictions, k),
            None => snap.predictions.clone(),
        };
        for prediction in &shown {
            tail.extend(prediction_card(prediction, options.highlight_threshold));
        }
    }
    tail.push(Line::new("", Tone::Plain));
    tail.push(Line::new(msg.hint, Tone::Dim));

    let mut lines = head;
    if options.preview && snap.state == RunState::Running {
        if let Some(frame) = &snap.preview {
            let budget = (rows as usize).saturating_sub(lines.len() + tail.len() + 1);
            let (pc, pr) = preview::grid_size(frame.width, frame.height, cols, budget as u16);
            if pc > 0 && pr > 0 {
                lines.extend(
                    preview::render(frame, pc, pr)
                        .into_iter()
                        .map(|l| Line::new(l, Tone::Preview)),
                );
                lines.push(Line::new("", Tone::Plain));
            }
        }
    }
    lines.extend(tail);
    lines
}

fn control_line(snap: &DetectorSnapshot, locale: Locale) -> Line {
    let msg = locale.messages();
    let label = if snap.state == RunState::Running {
        format!("[ ⏹ {} ]", msg.stop)
    } else {
        format!("[ ▶ {} ]", msg.start)
    };
    let tone = if snap.start_enabled() {
        Tone::Control
    } else {
        Tone::Disabled
    };
    Line::new(label, tone)
}

/// Icon, label and percentage, then a proportional bar.
fn prediction_card(prediction: &Prediction, threshold: f32) -> [Line; 2] {
    let icon = if prediction.shows_mask() { "😷" } else { "😐" };
    let tone = if prediction.probability > threshold {
        Tone::Highlight
    } else {
        Tone::Plain
    };
    let filled = (prediction.probability * BAR_WIDTH as f32).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    [
        Line::new(
            format!("{} {:<16} {:>6}", icon, prediction.label, prediction.percent()),
            tone,
        ),
        Line::new(
            format!("   {}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled)),
            tone,
        ),
    ]
}

/// Redraw the whole screen.
pub fn draw(out: &mut impl Write, lines: &[Line], cols: u16, rows: u16) -> io::Result<()> {
    out.queue(Clear(ClearType::All))?;
    for (y, line) in lines.iter().take(rows as usize).enumerate() {
        out.queue(MoveTo(0, y as u16))?;
        match line.tone {
            Tone::Title => {
                out.queue(SetAttribute(Attribute::Bold))?;
            }
            Tone::Dim | Tone::Disabled => {
                out.queue(SetForegroundColor(Color::DarkGrey))?;
            }
            Tone::Error => {
                out.queue(SetForegroundColor(Color::Red))?;
            }
            Tone::Warning => {
                out.queue(SetForegroundColor(Color::Yellow))?;
            }
            Tone::Control => {
                out.queue(SetForegroundColor(Color::Cyan))?;
            }
            Tone::Highlight => {
                out.queue(SetForegroundColor(Color::Green))?;
                out.queue(SetAttribute(Attribute::Bold))?;
            }
            Tone::Plain | Tone::Preview => {}
        }
        let text: String = line.text.chars().take(cols as usize).collect();
        out.queue(Print(text))?;
        out.queue(SetAttribute(Attribute::Reset))?;
        out.queue(ResetColor)?;
    }
    out.flush()
}
