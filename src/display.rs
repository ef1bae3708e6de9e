use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// size of the framebuffer packed one bit per pixel
pub const DISPLAY_SIZE_BYTES: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT / 8;

/// The interpreter's own 64x32 monochrome framebuffer. Rendering it somewhere
/// a human can see is the job of a [`Display`].
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    cells: [[bool; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            cells: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        }
    }

    pub fn width(&self) -> usize {
        DISPLAY_WIDTH
    }

    pub fn height(&self) -> usize {
        DISPLAY_HEIGHT
    }

    pub fn clear(&mut self) {
        self.cells = [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
    }

    /// out-of-range coordinates read as unlit
    pub fn get(&self, x: usize, y: usize) -> bool {
        y < DISPLAY_HEIGHT && x < DISPLAY_WIDTH && self.cells[y][x]
    }

    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        if y < DISPLAY_HEIGHT && x < DISPLAY_WIDTH {
            self.cells[y][x] = on;
        }
    }

    pub fn lit_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&on| on).count()
    }

    /// XOR a sprite onto the screen, one byte per row with bit 7 leftmost.
    ///
    /// The origin wraps around the screen, but the sprite itself is clipped
    /// at the right and bottom edges rather than wrapping. Returns true if
    /// any lit pixel was switched off.
    pub fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let origin_x = x as usize % DISPLAY_WIDTH;
        let origin_y = y as usize % DISPLAY_HEIGHT;
        let mut collision = false;

        for (row, byte) in sprite.iter().enumerate() {
            let cy = (origin_y + row) % DISPLAY_HEIGHT;
            for col in 0..8 {
                let cx = origin_x + col;
                if cx >= DISPLAY_WIDTH {
                    break;
                }
                if byte & (0x80 >> col) != 0 {
                    let cell = &mut self.cells[cy][cx];
                    if *cell {
                        collision = true;
                    }
                    *cell = !*cell;
                }
            }
            if cy == DISPLAY_HEIGHT - 1 {
                break;
            }
        }
        collision
    }

    /// pack the screen one bit per pixel, row-major, leftmost pixel in the
    /// high bit; this is what a [`Display`] expects to draw
    pub fn to_bitplane(&self) -> [u8; DISPLAY_SIZE_BYTES] {
        let mut data = [0u8; DISPLAY_SIZE_BYTES];
        for (i, on) in self.cells.iter().flatten().enumerate() {
            if *on {
                data[i / 8] |= 0x80 >> (i % 8);
            }
        }
        data
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.iter() {
            let line: String = row.iter().map(|&on| if on { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Display is used by the host to draw the framebuffer on the screen. It should
/// abstract the implementation details, so a variety of kinds of screen would
/// work.
pub trait Display {
    /// draw data based on internal resolution of display
    fn draw(&mut self, data: &[u8]) -> Result<(), io::Error>;

    /// how big the display data should be
    fn get_display_size_bytes(&self) -> usize;
}

// store useful metadata about the terminal
struct Resolution(usize, usize, usize);

impl Resolution {
    fn pixel_count(&self) -> usize {
        self.0 * self.1
    }
    fn byte_count(&self) -> usize {
        self.0 * self.1 * self.2 / 8
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    fn bitplane_from_data<'a>(
        &self,
        data: &'a [u8],
        bitplane: u8,
    ) -> impl std::iter::Iterator<Item = (f64, f64)> + 'a {
        let mut count = self.pixel_count();
        let w = self.0;
        std::iter::from_fn(move || {
            while count > 0 {
                count -= 1;
                let bit = 1 & (data[count / 8] >> (7 - count % 8));
                if bit == bitplane {
                    return Some((
                        (count % w) as f64,        // x
                        -1.0 * (count / w) as f64, // y
                    ));
                }
            }
            None
        })
    }
}

/// monochrome display in a terminal, rendered using TUI and Crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
}

impl MonoTermDisplay {
    pub fn new(x: usize, y: usize) -> Result<MonoTermDisplay, io::Error> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(x, y, 1),
        })
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        // nothing sensible to do if the terminal has gone away
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, data: &[u8]) -> Result<(), io::Error> {
        // make sure we're given exactly the right amount of data to draw
        assert_eq!(
            data.len(),
            self.resolution.byte_count(),
            "MonoTermDisplay must have correct-sized data to draw"
        );
        // i don't know how to draw things that aren't mono
        assert_eq!(
            self.resolution.2, 1,
            "MonoTermDisplay can only render one bitplane"
        );

        // for now this assumes a 1:1 ratio between terminal, chip8 and the
        // internal TUI canvas
        let resolution = &self.resolution;
        self.terminal.draw(|f| {
            let size = Rect::new(0, 0, 2 + resolution.0 as u16, 2 + resolution.1 as u16);

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    // only the lit pixels need drawing; the block background is black
                    ctx.draw(&Points {
                        coords: &resolution.bitplane_from_data(data, 1).collect::<Vec<_>>(),
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }

    /// how big the display data should be
    fn get_display_size_bytes(&self) -> usize {
        self.resolution.byte_count()
    }
}

/// useful for running headless, and for testing the host loop; keeps the
/// last frame it was asked to draw
pub struct DummyDisplay {
    pub last_frame: Vec<u8>,
    pub frames_drawn: usize,
}

impl DummyDisplay {
    pub fn new() -> DummyDisplay {
        DummyDisplay {
            last_frame: vec![0; DISPLAY_SIZE_BYTES],
            frames_drawn: 0,
        }
    }
}

impl Default for DummyDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, data: &[u8]) -> Result<(), io::Error> {
        self.last_frame.clear();
        self.last_frame.extend_from_slice(data);
        self.frames_drawn += 1;
        Ok(())
    }
    fn get_display_size_bytes(&self) -> usize {
        DISPLAY_SIZE_BYTES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Resolution tests
    #[test]
    fn test_pixel_count() {
        let r = Resolution(64, 32, 1);
        assert_eq!(r.pixel_count(), 2048)
    }

    #[test]
    fn test_byte_count() {
        let r = Resolution(64, 32, 1);
        assert_eq!(r.byte_count(), DISPLAY_SIZE_BYTES)
    }

    #[test]
    fn test_x_bounds() {
        let r = Resolution(64, 32, 1);
        assert_eq!(r.x_bounds(), [0.0, 63.0]);
    }

    #[test]
    fn test_y_bounds() {
        let r = Resolution(64, 32, 1);
        assert_eq!(r.y_bounds(), [-31.0, 0.0]);
    }

    #[test]
    fn test_bitplane_iterator() {
        let r = Resolution(64, 32, 1);
        let mut data = [0u8; 256];
        data[0] = 0x80; // top-left
        data[255] = 0x01; // bottom-right
        let lit: Vec<_> = r.bitplane_from_data(&data, 1).collect();
        assert_eq!(lit, vec![(63.0, -31.0), (0.0, 0.0)]);
        assert_eq!(r.bitplane_from_data(&data, 0).count(), 2046);
    }

    // FrameBuffer tests
    #[test]
    fn test_new_is_blank() {
        let fb = FrameBuffer::new();
        assert_eq!(fb.lit_count(), 0);
        assert_eq!(fb.width() * fb.height(), 2048);
    }

    #[test]
    fn test_clear() {
        let mut fb = FrameBuffer::new();
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                fb.set(x, y, true);
            }
        }
        assert_eq!(fb.lit_count(), 2048);
        fb.clear();
        assert_eq!(fb.lit_count(), 0);
    }

    #[test]
    fn test_draw_then_erase() {
        let mut fb = FrameBuffer::new();
        assert!(!fb.draw_sprite(0, 0, &[0xff]));
        assert_eq!(fb.lit_count(), 8);
        assert!((0..8).all(|x| fb.get(x, 0)));
        assert!(fb.draw_sprite(0, 0, &[0xff]));
        assert_eq!(fb.lit_count(), 0);
    }

    #[test]
    fn test_partial_overlap_collides() {
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(0, 0, &[0xf0]);
        assert!(fb.draw_sprite(2, 0, &[0xf0]));
        // 0,1 from the first sprite; 4,5 from the second; 2,3 erased
        assert_eq!(fb.lit_count(), 4);
        assert!(fb.get(0, 0) && fb.get(1, 0) && fb.get(4, 0) && fb.get(5, 0));
        assert!(!fb.get(2, 0) && !fb.get(3, 0));
    }

    #[test]
    fn test_origin_wraps() {
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(64 + 3, 32 + 2, &[0x80]);
        assert!(fb.get(3, 2));
        assert_eq!(fb.lit_count(), 1);
    }

    #[test]
    fn test_clips_right_edge() {
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(60, 0, &[0xff]);
        assert_eq!(fb.lit_count(), 4);
        assert!((60..64).all(|x| fb.get(x, 0)));
        // nothing wrapped round to the left edge
        assert!((0..4).all(|x| !fb.get(x, 0)));
    }

    #[test]
    fn test_clips_bottom_edge() {
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(0, 30, &[0x80, 0x80, 0x80, 0x80]);
        assert!(fb.get(0, 30));
        assert!(fb.get(0, 31));
        assert!(!fb.get(0, 0));
        assert!(!fb.get(0, 1));
        assert_eq!(fb.lit_count(), 2);
    }

    #[test]
    fn test_empty_sprite() {
        let mut fb = FrameBuffer::new();
        assert!(!fb.draw_sprite(10, 10, &[]));
        assert_eq!(fb.lit_count(), 0);
    }

    #[test]
    fn test_to_bitplane() {
        let mut fb = FrameBuffer::new();
        fb.set(0, 0, true);
        fb.set(9, 0, true);
        fb.set(63, 31, true);
        let data = fb.to_bitplane();
        assert_eq!(data[0], 0x80);
        assert_eq!(data[1], 0x40);
        assert_eq!(data[255], 0x01);
        assert_eq!(data.iter().map(|b| b.count_ones()).sum::<u32>(), 3);
    }

    #[test]
    fn test_dummy_display_keeps_frame() -> Result<(), io::Error> {
        let mut d = DummyDisplay::new();
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(0, 0, &[0xff]);
        d.draw(&fb.to_bitplane())?;
        assert_eq!(d.frames_drawn, 1);
        assert_eq!(d.last_frame[0], 0xff);
        assert_eq!(d.get_display_size_bytes(), 256);
        Ok(())
    }
}
