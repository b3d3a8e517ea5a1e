/// Keeps the latest transcript content visible.
///
/// Subscribed to the conversation store: every mutation re-arms the follow
/// flag, and the draw pass feeds the current line totals into
/// [`sync`](Self::sync). Instead of jumping, [`tick`](Self::tick) eases the
/// offset toward the target a fraction at a time, the terminal stand-in for
/// the original page's smooth scroll. Paging up detaches from the bottom
/// until the user pages back down or a new message arrives.
pub struct ScrollController {
    offset: usize,
    target: usize,
    bottom: usize,
    follow: bool,
}

impl ScrollController {
    pub fn new() -> Self {
        Self {
            offset: 0,
            target: 0,
            bottom: 0,
            follow: true,
        }
    }

    /// Called by the store listener after any append or reset.
    pub fn on_mutation(&mut self) {
        self.follow = true;
    }

    /// Scroll back through history; stops following the latest content.
    pub fn scroll_up(&mut self, lines: usize) {
        self.follow = false;
        self.target = self.target.saturating_sub(lines);
    }

    /// Scroll toward the latest content; reattaches once the bottom is hit.
    pub fn scroll_down(&mut self, lines: usize) {
        self.target = (self.target + lines).min(self.bottom);
        if self.target == self.bottom {
            self.follow = true;
        }
    }

    /// Recompute the target from the rendered transcript size.
    pub fn sync(&mut self, total_lines: usize, viewport: usize) {
        self.bottom = total_lines.saturating_sub(viewport);
        if self.follow {
            self.target = self.bottom;
        }
        // A reset can shrink the transcript under the current offset.
        self.target = self.target.min(self.bottom);
        self.offset = self.offset.min(self.bottom);
    }

    /// Advance the animation one frame. Returns true while still moving.
    pub fn tick(&mut self) -> bool {
        if self.offset == self.target {
            return false;
        }
        if self.offset < self.target {
            let step = ((self.target - self.offset) / 3).max(1);
            self.offset += step;
        } else {
            let step = ((self.offset - self.target) / 3).max(1);
            self.offset -= step;
        }
        true
    }

    pub fn offset(&self) -> u16 {
        self.offset.min(u16::MAX as usize) as u16
    }
}

impl Default for ScrollController {
    fn default() -> Self {
        Self::new()
    }
}
