use pdf_writer::{Content, Name, Str};

use crate::fonts::{FontEntry, to_winansi_bytes};

pub(super) struct TextLine {
    pub(super) text: String,
    pub(super) width: f32,
}

fn finish_line(words: &mut Vec<String>, width: f32) -> TextLine {
    TextLine {
        text: std::mem::take(words).join(" "),
        width,
    }
}

/// Break a word that is wider than a whole line into line-sized pieces.
fn split_long_word(word: &str, font: &FontEntry, font_size: f32, max_width: f32) -> Vec<(String, f32)> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_w = 0.0f32;
    for ch in word.chars() {
        let cw = font.word_width(ch.encode_utf8(&mut [0; 4]), font_size);
        if !current.is_empty() && current_w + cw > max_width {
            pieces.push((std::mem::take(&mut current), current_w));
            current_w = 0.0;
        }
        current.push(ch);
        current_w += cw;
    }
    if !current.is_empty() {
        pieces.push((current, current_w));
    }
    pieces
}

/// Wrap text into lines no wider than `max_width`. Explicit newlines start a new
/// line; blank lines inside the text are kept, leading and trailing ones are not.
pub(super) fn wrap_text(text: &str, font: &FontEntry, font_size: f32, max_width: f32) -> Vec<TextLine> {
    let space_w = font.space_width(font_size);
    let mut lines: Vec<TextLine> = Vec::new();

    for paragraph in text.trim().lines() {
        let mut words: Vec<String> = Vec::new();
        let mut current_x: f32 = 0.0;

        for word in paragraph.split_whitespace() {
            let ww = font.word_width(word, font_size);
            let pieces = if ww > max_width {
                split_long_word(word, font, font_size, max_width)
            } else {
                vec![(word.to_string(), ww)]
            };

            for (piece, pw) in pieces {
                let proposed_x = if words.is_empty() {
                    current_x
                } else {
                    current_x + space_w
                };
                if !words.is_empty() && proposed_x + pw > max_width {
                    lines.push(finish_line(&mut words, current_x));
                    current_x = 0.0;
                } else {
                    current_x = proposed_x;
                }
                words.push(piece);
                current_x += pw;
            }
        }

        lines.push(finish_line(&mut words, current_x));
    }

    if lines.is_empty() {
        lines.push(TextLine {
            text: String::new(),
            width: 0.0,
        });
    }
    lines
}

/// Truncate to `max_chars`, marking the cut with "...".
pub(super) fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

/// Show a single line of text with its baseline at `baseline_y` (PDF space).
pub(super) fn show_text(
    content: &mut Content,
    font: &FontEntry,
    font_size: f32,
    x: f32,
    baseline_y: f32,
    text: &str,
) {
    let bytes = to_winansi_bytes(text);
    if bytes.is_empty() {
        return;
    }
    content
        .begin_text()
        .set_font(Name(font.pdf_name.as_bytes()), font_size)
        .next_line(x, baseline_y)
        .show(Str(&bytes))
        .end_text();
}
