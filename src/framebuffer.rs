use std::fmt;

use crate::constants::{DISPLAY_HEIGHT, DISPLAY_SIZE, DISPLAY_WIDTH};

/// # FrameBuffer
/// The display is 64x32 monochrome pixels, stored as one flat row-major run of
/// 2048 cells so that sprite drawing can address it by a single index.
///
/// Cell `x + y * 64` is the pixel in column `x` of row `y`.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    cells: [bool; DISPLAY_SIZE],
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            cells: [false; DISPLAY_SIZE],
        }
    }

    /// The pixel at column `x` of row `y`; anything off-screen is unset.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < DISPLAY_WIDTH && y < DISPLAY_HEIGHT && self.cells[x + y * DISPLAY_WIDTH]
    }

    /// Iterates the rows top to bottom, each exactly 64 cells wide.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.cells.chunks(DISPLAY_WIDTH)
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.cells
    }

    /// Number of lit pixels
    pub fn lit(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell).count()
    }

    pub fn is_clear(&self) -> bool {
        self.cells.iter().all(|&cell| !cell)
    }

    pub(crate) fn clear(&mut self) {
        self.cells = [false; DISPLAY_SIZE];
    }

    /// XORs a single sprite pixel into cell `index`.
    /// Returns true if a lit pixel was turned off.
    pub(crate) fn toggle(&mut self, index: usize) -> bool {
        let collided = self.cells[index];
        self.cells[index] = !collided;
        collided
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the frame as text, `#` for lit pixels and `.` for unlit ones.
impl fmt::Display for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|&c| if c { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameBuffer({} lit)\n{}", self.lit(), self)
    }
}

#[cfg(test)]
mod test_framebuffer {
    use super::*;

    #[test]
    fn test_new_frame_is_clear() {
        let frame = FrameBuffer::new();
        assert_eq!(frame.as_slice().len(), 2048);
        assert!(frame.is_clear());
    }

    #[test]
    fn test_toggle_reports_collision() {
        let mut frame = FrameBuffer::new();
        assert!(!frame.toggle(65));
        assert!(frame.pixel(1, 1));
        assert!(frame.toggle(65));
        assert!(!frame.pixel(1, 1));
    }

    #[test]
    fn test_rows_are_row_major() {
        let mut frame = FrameBuffer::new();
        frame.toggle(DISPLAY_WIDTH * 3 + 7);
        let rows: Vec<&[bool]> = frame.rows().collect();
        assert_eq!(rows.len(), DISPLAY_HEIGHT);
        assert!(rows[3][7]);
        assert_eq!(frame.lit(), 1);
    }

    #[test]
    fn test_pixel_off_screen_is_unset() {
        let frame = FrameBuffer::new();
        assert!(!frame.pixel(DISPLAY_WIDTH, 0));
        assert!(!frame.pixel(0, DISPLAY_HEIGHT));
    }

    #[test]
    fn test_display_renders_text() {
        let mut frame = FrameBuffer::new();
        frame.toggle(0);
        let text = frame.to_string();
        let first = text.lines().next().unwrap();
        assert_eq!(first.len(), DISPLAY_WIDTH);
        assert!(first.starts_with("#."));
        assert_eq!(text.lines().count(), DISPLAY_HEIGHT);
    }
}
