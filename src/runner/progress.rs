use std::io::{self, Write};

use crossterm::style::Stylize;

use crate::models::ExampleState;

/// Writes the unseen tail of the page's glyph log to the output sink.
pub struct Progress<'a> {
    out: &'a mut (dyn Write + Send),
    color: bool,
    printed: usize,
}

impl<'a> Progress<'a> {
    pub fn new(out: &'a mut (dyn Write + Send), color: bool) -> Self {
        Self {
            out,
            color,
            printed: 0,
        }
    }

    /// Emit whatever part of `glyphs` has not been written yet, then flush.
    pub fn update(&mut self, glyphs: &str) -> io::Result<()> {
        let fresh = glyphs.get(self.printed..).unwrap_or("");
        if fresh.is_empty() {
            return Ok(());
        }
        self.out.write_all(self.paint(fresh).as_bytes())?;
        self.out.flush()?;
        self.printed = glyphs.len();
        Ok(())
    }

    fn paint(&self, glyphs: &str) -> String {
        if !self.color {
            return glyphs.to_string();
        }
        glyphs
            .chars()
            .map(|glyph| match ExampleState::from_glyph(glyph) {
                Some(state) => glyph.to_string().with(state.color()).to_string(),
                None => glyph.to_string(),
            })
            .collect()
    }
}
