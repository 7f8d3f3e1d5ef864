//! Embedded 5x7 bitmap font for the text overlay.
//!
//! Text is turned into one quad per lit glyph pixel. Lowercase letters are
//! drawn with their uppercase glyph; characters without a glyph render as `?`.

const GLYPH_WIDTH: usize = 5;
const GLYPH_HEIGHT: usize = 7;
/// Horizontal advance in font pixels, including one column of spacing.
const GLYPH_ADVANCE: usize = GLYPH_WIDTH + 1;

type Glyph = [u8; GLYPH_HEIGHT];

#[rustfmt::skip]
const GLYPHS: &[(char, Glyph)] = &[
    (' ', [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000]),
    ('A', [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    ('B', [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110]),
    ('C', [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
    ('D', [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110]),
    ('E', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111]),
    ('F', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('G', [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111]),
    ('H', [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    ('I', [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('J', [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100]),
    ('K', [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001]),
    ('L', [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
    ('M', [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001]),
    ('N', [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001]),
    ('O', [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('P', [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('Q', [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101]),
    ('R', [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001]),
    ('S', [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
    ('T', [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
    ('U', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('V', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100]),
    ('W', [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010]),
    ('X', [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001]),
    ('Y', [0b10001, 0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100]),
    ('Z', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111]),
    ('0', [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
    ('1', [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('2', [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111]),
    ('3', [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110]),
    ('4', [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
    ('5', [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110]),
    ('6', [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
    ('7', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
    ('8', [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
    ('9', [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100]),
    ('.', [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100]),
    (',', [0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b00100, 0b01000]),
    ('!', [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100]),
    ('?', [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b00000, 0b00100]),
    ('-', [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000]),
    (':', [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000]),
];

/// Axis-aligned rectangle in window pixels, y pointing down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelQuad {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

fn glyph(ch: char) -> &'static Glyph {
    let ch = ch.to_ascii_uppercase();
    GLYPHS
        .iter()
        .find(|(known, _)| *known == ch)
        .or_else(|| GLYPHS.iter().find(|(known, _)| *known == '?'))
        .map(|(_, glyph)| glyph)
        .unwrap_or(&GLYPHS[0].1)
}

/// Lays out `text` with its top-left corner at (`x`, `y`); `size` is the
/// glyph height in pixels.
pub fn layout_text(text: &str, x: f32, y: f32, size: f32) -> Vec<PixelQuad> {
    let scale = size.max(0.0) / GLYPH_HEIGHT as f32;
    let mut quads = Vec::new();
    let mut pen_x = x;
    let mut pen_y = y;
    for ch in text.chars() {
        if ch == '\n' {
            pen_x = x;
            pen_y += size * 1.5;
            continue;
        }
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let left = pen_x + col as f32 * scale;
                let top = pen_y + row as f32 * scale;
                quads.push(PixelQuad {
                    min: [left, top],
                    max: [left + scale, top + scale],
                });
            }
        }
        pen_x += GLYPH_ADVANCE as f32 * scale;
    }
    quads
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_pixels(ch: char) -> usize {
        glyph(ch).iter().map(|row| row.count_ones() as usize).sum()
    }

    #[test]
    fn glyphs_fit_five_columns() {
        for (ch, rows) in GLYPHS {
            assert!(rows.iter().all(|row| *row < 32), "glyph {ch:?} is too wide");
        }
    }

    #[test]
    fn one_quad_per_lit_pixel() {
        let quads = layout_text("HI", 0.0, 0.0, 7.0);
        assert_eq!(quads.len(), lit_pixels('H') + lit_pixels('I'));
        assert!(layout_text("   ", 0.0, 0.0, 7.0).is_empty());
    }

    #[test]
    fn quads_scale_with_size_and_advance() {
        let quads = layout_text("-", 10.0, 20.0, 14.0);
        assert_eq!(quads.len(), 5);
        assert_eq!(quads[0].min, [10.0, 26.0]);
        assert_eq!(quads[0].max, [12.0, 28.0]);

        let second = layout_text(" -", 10.0, 20.0, 14.0);
        assert_eq!(second[0].min[0], 10.0 + 12.0);
    }

    #[test]
    fn lowercase_and_unknown_characters_fall_back() {
        assert_eq!(glyph('h'), glyph('H'));
        assert_eq!(glyph('~'), glyph('?'));
    }
}
