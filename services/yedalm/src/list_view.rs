//! Draggable list view
//!
//! Headless model of a vertical list whose rows can be picked up and dropped
//! elsewhere. A host renders `rows()` (or `preview()` while a gesture is in
//! progress) and forwards pointer events. Each row is split into distinct
//! hit-test regions: the drag surface, and on its right edge the edit and
//! delete controls. Pressing a control dispatches that action and never
//! starts a drag.
//!
//! Per row: `Idle -> Dragging -> (Reordered | Unchanged)`. A drop that
//! changes the order hands back the whole permuted list; order indices are
//! left to the reorder coordinator.

use crate::entity::Record;

/// Scale applied to the row being dragged (cosmetic)
pub const LIFT_SCALE: f64 = 1.02;

/// Geometry shared by all rows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowLayout {
    pub row_height: f64,
    pub width: f64,
    /// Width of the action-control strip at the right edge of every row
    pub controls_width: f64,
}

impl Default for RowLayout {
    fn default() -> Self {
        Self {
            row_height: 96.0,
            width: 640.0,
            controls_width: 56.0,
        }
    }
}

/// Hit-test region within a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    DragSurface,
    Edit,
    Delete,
}

/// What a pointer press resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerDown {
    DragStarted(i64),
    Edit(i64),
    Delete(i64),
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPhase {
    Idle,
    Dragging,
}

/// Result of releasing a dragged row
#[derive(Debug, Clone, PartialEq)]
pub enum DropResult<T> {
    /// The full list in its new order
    Reordered(Vec<T>),
    Unchanged,
}

#[derive(Debug, Clone, Copy)]
struct Gesture {
    from: usize,
    origin_y: f64,
    pointer_y: f64,
}

/// Draggable list of one kind of row
#[derive(Debug, Clone)]
pub struct DragList<T> {
    rows: Vec<T>,
    layout: RowLayout,
    gesture: Option<Gesture>,
}

impl<T: Record> DragList<T> {
    pub fn new(rows: Vec<T>, layout: RowLayout) -> Self {
        Self {
            rows,
            layout,
            gesture: None,
        }
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn layout(&self) -> RowLayout {
        self.layout
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    /// Swap in a fresh list from the host, abandoning any gesture
    pub fn replace_rows(&mut self, rows: Vec<T>) {
        self.gesture = None;
        self.rows = rows;
    }

    /// Map a point (relative to the top-left of the list) to a row and region
    pub fn hit_test(&self, x: f64, y: f64) -> Option<(usize, Region)> {
        let RowLayout {
            row_height,
            width,
            controls_width,
        } = self.layout;

        if x < 0.0 || x > width || y < 0.0 || row_height <= 0.0 {
            return None;
        }
        let index = (y / row_height).floor() as usize;
        if index >= self.rows.len() {
            return None;
        }

        let region = if x >= width - controls_width {
            let local_y = y - index as f64 * row_height;
            if local_y < row_height / 2.0 {
                Region::Edit
            } else {
                Region::Delete
            }
        } else {
            Region::DragSurface
        };
        Some((index, region))
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) -> PointerDown {
        if self.gesture.is_some() {
            return PointerDown::Ignored;
        }

        match self.hit_test(x, y) {
            None => PointerDown::Ignored,
            Some((index, Region::Edit)) => PointerDown::Edit(self.rows[index].id()),
            Some((index, Region::Delete)) => PointerDown::Delete(self.rows[index].id()),
            Some((index, Region::DragSurface)) => {
                self.gesture = Some(Gesture {
                    from: index,
                    origin_y: y,
                    pointer_y: y,
                });
                PointerDown::DragStarted(self.rows[index].id())
            }
        }
    }

    pub fn pointer_move(&mut self, y: f64) {
        if let Some(gesture) = self.gesture.as_mut() {
            gesture.pointer_y = y;
        }
    }

    /// Abandon the gesture; the order is left untouched
    pub fn cancel(&mut self) {
        self.gesture = None;
    }

    /// Commit the gesture
    pub fn pointer_up(&mut self) -> DropResult<T> {
        let Some(gesture) = self.gesture.take() else {
            return DropResult::Unchanged;
        };
        let target = self.target_slot(&gesture);
        if target == gesture.from {
            return DropResult::Unchanged;
        }

        let row = self.rows.remove(gesture.from);
        self.rows.insert(target, row);
        DropResult::Reordered(self.rows.clone())
    }

    /// Rows in the order they would land if released now
    pub fn preview(&self) -> Vec<&T> {
        self.preview_order()
            .into_iter()
            .map(|index| &self.rows[index])
            .collect()
    }

    pub fn row_phase(&self, id: i64) -> RowPhase {
        match self.gesture {
            Some(g) if self.rows[g.from].id() == id => RowPhase::Dragging,
            _ => RowPhase::Idle,
        }
    }

    pub fn lift_scale(&self, id: i64) -> f64 {
        match self.row_phase(id) {
            RowPhase::Dragging => LIFT_SCALE,
            RowPhase::Idle => 1.0,
        }
    }

    /// Vertical position at which the row is drawn.
    ///
    /// The dragged row follows the pointer; the other rows sit in their
    /// preview slots.
    pub fn row_offset(&self, id: i64) -> Option<f64> {
        let height = self.layout.row_height;
        if let Some(g) = self.gesture {
            if self.rows[g.from].id() == id {
                let max = (self.rows.len().saturating_sub(1)) as f64 * height;
                let y = g.from as f64 * height + (g.pointer_y - g.origin_y);
                return Some(y.clamp(0.0, max));
            }
        }
        self.preview_order()
            .iter()
            .position(|&index| self.rows[index].id() == id)
            .map(|slot| slot as f64 * height)
    }

    fn target_slot(&self, gesture: &Gesture) -> usize {
        if self.rows.is_empty() || self.layout.row_height <= 0.0 {
            return gesture.from;
        }
        let shift = ((gesture.pointer_y - gesture.origin_y) / self.layout.row_height).round();
        let last = (self.rows.len() - 1) as f64;
        (gesture.from as f64 + shift).clamp(0.0, last) as usize
    }

    fn preview_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        if let Some(g) = self.gesture {
            let target = self.target_slot(&g);
            let moved = order.remove(g.from);
            order.insert(target, moved);
        }
        order
    }
}
