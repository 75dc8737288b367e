use ratatui::style::Color;

/// Empty braille pattern (U+2800).
pub const BLANK: char = '\u{2800}';

/// Braille Unicode canvas with one colour per character cell.
/// Each cell covers a 2x4 dot grid; the last colour written to a cell wins,
/// so callers draw back-to-front.
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    bits: Vec<u8>,
    colors: Vec<Option<Color>>,
}

impl BrailleCanvas {
    /// Create a canvas of `width` x `height` characters
    /// (`width*2` x `height*4` dots).
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![0; width * height],
            colors: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Dot resolution of the canvas.
    pub fn pixel_size(&self) -> (usize, usize) {
        (self.width * 2, self.height * 4)
    }

    /// Wipe every dot and colour, keeping the allocation.
    pub fn clear(&mut self) {
        self.bits.fill(0);
        self.colors.fill(None);
    }

    /// Set one dot.
    /// Dot layout per character:
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        let cx = x / 2;
        let cy = y / 4;

        if cx >= self.width || cy >= self.height {
            return;
        }

        let bit = match (x % 2, y % 4) {
            (0, 0) => 0x01,
            (1, 0) => 0x08,
            (0, 1) => 0x02,
            (1, 1) => 0x10,
            (0, 2) => 0x04,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            (1, 3) => 0x80,
            _ => 0,
        };

        let idx = cy * self.width + cx;
        self.bits[idx] |= bit;
        self.colors[idx] = Some(color);
    }

    /// Set a dot from signed coordinates (off-canvas values are dropped)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32, color: Color) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    /// Glyph and colour of one character cell.
    pub fn cell(&self, col: usize, row: usize) -> (char, Option<Color>) {
        if col >= self.width || row >= self.height {
            return (BLANK, None);
        }
        let idx = row * self.width + col;
        let ch = char::from_u32(0x2800 + self.bits[idx] as u32).unwrap_or(' ');
        (ch, self.colors[idx])
    }

    /// Non-empty cells as `(col, row, glyph, colour)`.
    pub fn lit_cells(&self) -> impl Iterator<Item = (usize, usize, char, Color)> + '_ {
        self.bits.iter().enumerate().filter_map(move |(idx, &b)| {
            if b == 0 {
                return None;
            }
            let ch = char::from_u32(0x2800 + b as u32)?;
            let color = self.colors[idx].unwrap_or(Color::White);
            Some((idx % self.width, idx / self.width, ch, color))
        })
    }

    #[cfg(test)]
    pub fn to_string(&self) -> String {
        (0..self.height)
            .map(|row| (0..self.width).map(|col| self.cell(col, row).0).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
