//! Free dragging of the editor toolbar.
//!
//! Mouse, touch and pen input all arrive as pointer events identified by a
//! [`PointerId`]; only the pointer that started a drag can move or end it.
//!
//! `static/editor.js` performs the same transitions in the browser:
//! `pointerdown` on the handle is [`ToolbarDrag::pointer_down`], document
//! `pointermove` is [`ToolbarDrag::pointer_move`], `pointerup` and
//! `pointercancel` release, and `pagehide` is [`ToolbarDrag::teardown`].
//! Document listeners are attached exactly while
//! [`ToolbarDrag::wants_global_listeners`] holds.

use std::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

impl PointerKind {
    /// Parse a DOM `pointerType` value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mouse" => Some(Self::Mouse),
            "touch" => Some(Self::Touch),
            "pen" => Some(Self::Pen),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerId {
    pub id: i64,
    pub kind: PointerKind,
}

impl PointerId {
    pub const fn new(id: i64, kind: PointerKind) -> Self {
        Self { id, kind }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        pointer: PointerId,
        grab_offset: Point,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ToolbarDrag {
    state: DragState,
    origin: Point,
}

impl ToolbarDrag {
    pub fn new(origin: Point) -> Self {
        Self {
            state: DragState::Idle,
            origin,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    /// Current toolbar position.
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Start a drag. Ignored while another pointer is dragging.
    pub fn pointer_down(&mut self, pointer: PointerId, at: Point, toolbar_origin: Point) -> bool {
        if !matches!(self.state, DragState::Idle) {
            return false;
        }
        self.origin = toolbar_origin;
        self.state = DragState::Dragging {
            pointer,
            grab_offset: at - toolbar_origin,
        };
        true
    }

    /// New toolbar origin for a move of the active pointer.
    pub fn pointer_move(&mut self, pointer: PointerId, at: Point) -> Option<Point> {
        match self.state {
            DragState::Dragging {
                pointer: active,
                grab_offset,
            } if active == pointer => {
                self.origin = at - grab_offset;
                Some(self.origin)
            }
            _ => None,
        }
    }

    pub fn pointer_up(&mut self, pointer: PointerId) -> bool {
        self.release(pointer)
    }

    pub fn pointer_cancel(&mut self, pointer: PointerId) -> bool {
        self.release(pointer)
    }

    /// Document-level move/up listeners are only needed mid-drag.
    pub fn wants_global_listeners(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn teardown(&mut self) {
        self.state = DragState::Idle;
    }

    fn release(&mut self, pointer: PointerId) -> bool {
        match self.state {
            DragState::Dragging { pointer: active, .. } if active == pointer => {
                self.state = DragState::Idle;
                true
            }
            _ => false,
        }
    }
}
