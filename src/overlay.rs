//! Visibility and content-freshness bookkeeping for a CRT overlay.
//!
//! The overlay engine asks this state machine what to do after each event
//! and carries out the returned [`OverlayAction`]. Content regeneration may
//! finish asynchronously, so every change bumps a revision; a regeneration
//! only counts if it finishes for the latest revision.

/// Payload painted into the overlay's offscreen raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayContent {
    Text(String),
    /// HTML fragment laid out through an SVG `foreignObject`.
    Html(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAction {
    Nothing,
    /// Repaint the content, upload it, then render.
    Regenerate,
    /// Draw the existing texture.
    Render,
}

/// Proof that a regeneration was started for a given content revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegenTicket(u64);

#[derive(Debug, Clone)]
pub struct OverlayState {
    visible: bool,
    content_dirty: bool,
    content: Option<OverlayContent>,
    revision: u64,
}

impl OverlayState {
    /// `content` may be `None` when the payload is still being fetched.
    pub fn new(content: Option<OverlayContent>) -> Self {
        Self {
            visible: false,
            content_dirty: true,
            content,
            revision: 0,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_dirty(&self) -> bool {
        self.content_dirty
    }

    pub fn content(&self) -> Option<&OverlayContent> {
        self.content.as_ref()
    }

    pub fn can_render(&self) -> bool {
        self.visible && !self.content_dirty
    }

    pub fn show(&mut self) -> OverlayAction {
        if self.visible {
            return OverlayAction::Nothing;
        }
        self.visible = true;
        if !self.content_dirty {
            OverlayAction::Render
        } else if self.content.is_some() {
            OverlayAction::Regenerate
        } else {
            OverlayAction::Nothing
        }
    }

    /// Returns `true` if the overlay was visible.
    pub fn hide(&mut self) -> bool {
        if !self.visible {
            return false;
        }
        self.visible = false;
        self.invalidate();
        true
    }

    pub fn set_content(&mut self, content: OverlayContent) -> OverlayAction {
        if self.content.as_ref() == Some(&content) {
            return OverlayAction::Nothing;
        }
        self.content = Some(content);
        self.invalidate();
        if self.visible {
            OverlayAction::Regenerate
        } else {
            OverlayAction::Nothing
        }
    }

    /// Marks the start of a regeneration for the current content.
    pub fn begin_regeneration(&self) -> RegenTicket {
        RegenTicket(self.revision)
    }

    /// Whether a regeneration started with `ticket` still matches the
    /// current content.
    pub fn is_current(&self, ticket: RegenTicket) -> bool {
        ticket.0 == self.revision
    }

    /// Records a finished texture upload. Stale tickets are ignored.
    pub fn texture_uploaded(&mut self, ticket: RegenTicket) -> OverlayAction {
        if !self.is_current(ticket) {
            return OverlayAction::Nothing;
        }
        self.content_dirty = false;
        if self.visible {
            OverlayAction::Render
        } else {
            OverlayAction::Nothing
        }
    }

    /// A resize never invalidates content; it only redraws what is ready.
    pub fn resized(&self) -> OverlayAction {
        if self.can_render() {
            OverlayAction::Render
        } else {
            OverlayAction::Nothing
        }
    }

    fn invalidate(&mut self) {
        self.content_dirty = true;
        self.revision += 1;
    }
}
