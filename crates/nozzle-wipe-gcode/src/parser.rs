//! Line-oriented G-code parsing.
//!
//! Only the commands that affect head position or axis modes are decoded;
//! everything else is passed through as [`GcodeCommand::Other`].

use crate::error::{GcodeError, Result};

/// Axis values given on a command line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Axes {
    /// X word.
    pub x: Option<f64>,
    /// Y word.
    pub y: Option<f64>,
    /// Z word.
    pub z: Option<f64>,
    /// E word.
    pub e: Option<f64>,
}

impl Axes {
    /// No axis words were given.
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none() && self.e.is_none()
    }
}

/// A decoded G-code command.
#[derive(Debug, Clone, PartialEq)]
pub enum GcodeCommand {
    /// `G0`/`G1` linear move.
    Move {
        /// Target axis values.
        axes: Axes,
        /// `F` word (mm/min).
        feedrate: Option<f64>,
    },
    /// `G28` home; `axes` lists which axes were named (empty means all).
    Home {
        /// Named axes (values ignored).
        axes: Axes,
    },
    /// `G90` absolute positioning.
    AbsolutePositioning,
    /// `G91` relative positioning.
    RelativePositioning,
    /// `G92` set position.
    SetPosition(Axes),
    /// `M82` absolute extrusion.
    AbsoluteExtrusion,
    /// `M83` relative extrusion.
    RelativeExtrusion,
    /// Anything else, trimmed and without comments.
    Other(String),
}

/// Parse one line of G-code.
///
/// Returns `None` for blank and comment-only lines. `line` is only used
/// in error messages.
pub fn parse_line(line: usize, text: &str) -> Result<Option<GcodeCommand>> {
    let code = strip_comment(text);
    if code.is_empty() {
        return Ok(None);
    }

    let words = split_words(line, code)?;
    let mut iter = words.iter().skip_while(|(letter, _)| *letter == 'N');
    let Some(&(letter, ref number)) = iter.next() else {
        return Ok(None);
    };

    let command = match (letter, number.as_str()) {
        ('G', "0" | "00" | "1" | "01") => {
            let (axes, feedrate) = collect_axes(line, iter)?;
            GcodeCommand::Move { axes, feedrate }
        }
        ('G', "28") => GcodeCommand::Home {
            axes: collect_axes(line, iter)?.0,
        },
        ('G', "90") => GcodeCommand::AbsolutePositioning,
        ('G', "91") => GcodeCommand::RelativePositioning,
        ('G', "92") => GcodeCommand::SetPosition(collect_axes(line, iter)?.0),
        ('M', "82") => GcodeCommand::AbsoluteExtrusion,
        ('M', "83") => GcodeCommand::RelativeExtrusion,
        _ => GcodeCommand::Other(code.to_string()),
    };
    Ok(Some(command))
}

/// Drop `;` comments, `*` checksums and surrounding whitespace.
fn strip_comment(text: &str) -> &str {
    let text = text.split(';').next().unwrap_or("");
    let text = text.split('*').next().unwrap_or("");
    text.trim()
}

/// Split `G1X10 Y-2.5` style text into `(letter, value text)` pairs.
///
/// Values are kept as text so the command number can be matched exactly.
/// Words after an unknown command letter may be free text (`M117 Hello`),
/// so scanning stops at the first word that is not `letter + number`
/// once a command has been seen.
fn split_words(line: usize, code: &str) -> Result<Vec<(char, String)>> {
    let mut words = Vec::new();
    let mut chars = code.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if !c.is_ascii_alphabetic() {
            if words.is_empty() {
                return Err(GcodeError::InvalidWord {
                    line,
                    word: code.to_string(),
                });
            }
            break;
        }
        chars.next();
        let letter = c.to_ascii_uppercase();
        let mut number = String::new();
        while let Some(&d) = chars.peek() {
            if d.is_ascii_digit() || d == '.' || d == '-' || d == '+' {
                number.push(d);
                chars.next();
            } else {
                break;
            }
        }
        words.push((letter, number));
    }
    Ok(words)
}

fn collect_axes<'a>(
    line: usize,
    words: impl Iterator<Item = &'a (char, String)>,
) -> Result<(Axes, Option<f64>)> {
    let mut axes = Axes::default();
    let mut feedrate = None;
    for (letter, number) in words {
        let slot = match *letter {
            'X' => &mut axes.x,
            'Y' => &mut axes.y,
            'Z' => &mut axes.z,
            'E' => &mut axes.e,
            'F' => &mut feedrate,
            _ => continue,
        };
        // a bare axis letter (as in `G28 X`) carries no value
        if number.is_empty() {
            *slot = Some(0.0);
            continue;
        }
        let value: f64 = number.parse().map_err(|_| GcodeError::InvalidNumber {
            line,
            word: format!("{letter}{number}"),
        })?;
        *slot = Some(value);
    }
    Ok((axes, feedrate))
}
