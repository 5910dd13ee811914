//! A 5x7 bitmap glyph set for the map title.
//!
//! Text is drawn as scaled pixel blocks so the figure looks the same on every
//! machine and rendering never depends on system fonts. Lower-case letters
//! are drawn as capitals; characters without a glyph leave a gap.

/// Rows in every glyph.
pub const GLYPH_HEIGHT: usize = 7;

/// Advance for a space or unknown character, in glyph pixels.
pub const SPACE_WIDTH: u32 = 3;

/// Gap between adjacent glyphs, in glyph pixels.
pub const LETTER_SPACING: u32 = 1;

/// One character's bitmap. Bit `width - 1` of each row is the leftmost pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    /// Width in glyph pixels.
    pub width: u8,
    /// Rows from top to bottom.
    pub rows: [u8; GLYPH_HEIGHT],
}

impl Glyph {
    const fn new(width: u8, rows: [u8; GLYPH_HEIGHT]) -> Self {
        Self { width, rows }
    }

    /// Check whether the pixel at `col`, `row` is set.
    #[must_use]
    pub fn is_set(&self, col: u8, row: usize) -> bool {
        col < self.width && self.rows[row] & (1 << (self.width - 1 - col)) != 0
    }
}

/// Look up the glyph for `ch`.
#[must_use]
pub fn glyph(ch: char) -> Option<Glyph> {
    let g = match ch.to_ascii_uppercase() {
        'A' => Glyph::new(5, [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
        'B' => Glyph::new(5, [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110]),
        'C' => Glyph::new(5, [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
        'D' => Glyph::new(5, [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100]),
        'E' => Glyph::new(5, [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111]),
        'F' => Glyph::new(5, [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000]),
        'G' => Glyph::new(5, [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111]),
        'H' => Glyph::new(5, [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
        'I' => Glyph::new(3, [0b111, 0b010, 0b010, 0b010, 0b010, 0b010, 0b111]),
        'J' => Glyph::new(5, [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100]),
        'K' => Glyph::new(5, [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001]),
        'L' => Glyph::new(5, [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
        'M' => Glyph::new(5, [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001]),
        'N' => Glyph::new(5, [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001]),
        'O' => Glyph::new(5, [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
        'P' => Glyph::new(5, [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000]),
        'Q' => Glyph::new(5, [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101]),
        'R' => Glyph::new(5, [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001]),
        'S' => Glyph::new(5, [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
        'T' => Glyph::new(5, [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
        'U' => Glyph::new(5, [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
        'V' => Glyph::new(5, [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100]),
        'W' => Glyph::new(5, [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010]),
        'X' => Glyph::new(5, [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001]),
        'Y' => Glyph::new(5, [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100]),
        'Z' => Glyph::new(5, [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111]),
        '0' => Glyph::new(5, [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
        '1' => Glyph::new(5, [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
        '2' => Glyph::new(5, [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111]),
        '3' => Glyph::new(5, [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110]),
        '4' => Glyph::new(5, [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
        '5' => Glyph::new(5, [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110]),
        '6' => Glyph::new(5, [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
        '7' => Glyph::new(5, [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
        '8' => Glyph::new(5, [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
        '9' => Glyph::new(5, [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100]),
        '-' => Glyph::new(5, [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000]),
        '.' => Glyph::new(2, [0b00, 0b00, 0b00, 0b00, 0b00, 0b11, 0b11]),
        ',' => Glyph::new(2, [0b00, 0b00, 0b00, 0b00, 0b01, 0b01, 0b10]),
        ':' => Glyph::new(2, [0b00, 0b11, 0b11, 0b00, 0b11, 0b11, 0b00]),
        '\'' => Glyph::new(1, [0b1, 0b1, 0b0, 0b0, 0b0, 0b0, 0b0]),
        '(' => Glyph::new(3, [0b001, 0b010, 0b100, 0b100, 0b100, 0b010, 0b001]),
        ')' => Glyph::new(3, [0b100, 0b010, 0b001, 0b001, 0b001, 0b010, 0b100]),
        '/' => Glyph::new(5, [0b00001, 0b00010, 0b00010, 0b00100, 0b01000, 0b01000, 0b10000]),
        _ => return None,
    };
    Some(g)
}

/// Width of `text` in glyph pixels, without trailing spacing.
#[must_use]
pub fn text_width(text: &str) -> u32 {
    let total: u32 = text
        .chars()
        .map(|ch| glyph(ch).map_or(SPACE_WIDTH, |g| u32::from(g.width) + LETTER_SPACING))
        .sum();
    total.saturating_sub(LETTER_SPACING)
}

/// Set pixels of `text` as `(x, y)` offsets in glyph pixels from the top-left
/// corner.
pub fn pixels(text: &str) -> impl Iterator<Item = (u32, u32)> + '_ {
    let mut cursor = 0u32;
    text.chars().flat_map(move |ch| {
        let origin = cursor;
        let g = glyph(ch);
        cursor += g.map_or(SPACE_WIDTH, |g| u32::from(g.width) + LETTER_SPACING);
        g.into_iter().flat_map(move |g| {
            (0..GLYPH_HEIGHT).flat_map(move |row| {
                (0..g.width)
                    .filter(move |&col| g.is_set(col, row))
                    .map(move |col| (origin + u32::from(col), row as u32))
            })
        })
    })
}
