//! Local seat and board orientation.
//!
//! The coordinator owns the "black on top" flag and decides when the board
//! must flip; the view only ever receives [`BoardRenderer::set_orientation`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::board::{BoardRenderer, Color};

/// Default orientation: Black at the top, Red at the bottom.
pub const DEFAULT_BLACK_ON_TOP: bool = true;

/// Seat buttons above and below the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatPosition {
    Top,
    Bottom,
}

/// Orientation flag kept across a view recreation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedOrientation {
    pub black_on_top: bool,
}

/// Whether the board must flip so `color` renders at the bottom.
pub fn needs_reverse(color: Color, black_on_top: bool) -> bool {
    match color {
        Color::Red => !black_on_top,
        Color::Black => black_on_top,
    }
}

/// Tracks the local user's seat and the board orientation.
#[derive(Debug, Clone)]
pub struct SessionRoleCoordinator {
    black_on_top: bool,
    local_color: Option<Color>,
}

impl Default for SessionRoleCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_BLACK_ON_TOP)
    }
}

impl SessionRoleCoordinator {
    pub fn new(black_on_top: bool) -> Self {
        Self {
            black_on_top,
            local_color: None,
        }
    }

    pub fn is_black_on_top(&self) -> bool {
        self.black_on_top
    }

    /// Seat the local user holds, `None` when observing.
    pub fn local_color(&self) -> Option<Color> {
        self.local_color
    }

    /// Local user took a seat. Returns true if the board was reversed.
    pub fn on_local_player_joined<R>(&mut self, color: Color, view: &mut R) -> bool
    where
        R: BoardRenderer + ?Sized,
    {
        self.local_color = Some(color);
        let reverse = needs_reverse(color, self.black_on_top);
        debug!(
            color = color.as_str(),
            black_on_top = self.black_on_top,
            reverse,
            "local player joined"
        );
        if reverse {
            self.reverse(view);
        }
        reverse
    }

    /// Local user left their seat. Orientation stays as it is.
    pub fn on_local_player_left(&mut self) {
        self.local_color = None;
    }

    /// The "flip board" control.
    pub fn on_manual_reverse_request<R>(&mut self, view: &mut R)
    where
        R: BoardRenderer + ?Sized,
    {
        self.reverse(view);
    }

    /// Color of the seat shown at `position` under the current orientation.
    pub fn seat_color_at(&self, position: SeatPosition) -> Color {
        let top = if self.black_on_top {
            Color::Black
        } else {
            Color::Red
        };
        match position {
            SeatPosition::Top => top,
            SeatPosition::Bottom => top.opposite(),
        }
    }

    pub fn persisted(&self) -> PersistedOrientation {
        PersistedOrientation {
            black_on_top: self.black_on_top,
        }
    }

    /// Apply a persisted flag to a freshly built view.
    ///
    /// A new view always starts black-on-top, so only the view is flipped;
    /// the stored flag is taken verbatim and not toggled.
    pub fn restore<R>(&mut self, persisted: PersistedOrientation, view: &mut R)
    where
        R: BoardRenderer + ?Sized,
    {
        self.black_on_top = persisted.black_on_top;
        if !self.black_on_top {
            debug!("restoring reversed board view");
            view.set_orientation(self.black_on_top);
        }
    }

    fn reverse<R>(&mut self, view: &mut R)
    where
        R: BoardRenderer + ?Sized,
    {
        self.black_on_top = !self.black_on_top;
        view.set_orientation(self.black_on_top);
    }
}
