//! BDD step definitions for draggable list feature

use cucumber::{given, then, when};

use yedalm::entity::Organization;
use yedalm::list_view::{DragList, DropResult, PointerDown, RowLayout, LIFT_SCALE};

use super::parse_ids;
use crate::world::YedalmWorld;

const SURFACE_X: f64 = 100.0;

fn organization(id: i64) -> Organization {
    Organization {
        id,
        name: format!("Organization {}", id),
        description: String::new(),
        members: vec![],
        order_index: id as i32,
        created_at: None,
        updated_at: None,
    }
}

fn view(world: &mut YedalmWorld) -> &mut DragList<Organization> {
    world.view.as_mut().expect("list not set")
}

/// Top edge of a 1-based row
fn row_top(layout: RowLayout, row: usize) -> f64 {
    (row - 1) as f64 * layout.row_height
}

fn controls_x(layout: RowLayout) -> f64 {
    layout.width - layout.controls_width / 2.0
}

#[given(expr = "a draggable list of organizations {string}")]
fn draggable_list(world: &mut YedalmWorld, list: String) {
    let rows = parse_ids(&list).into_iter().map(organization).collect();
    world.view = Some(DragList::new(rows, RowLayout::default()));
}

#[when(expr = "the pointer is pressed on the edit control of row {int}")]
fn press_edit(world: &mut YedalmWorld, row: usize) {
    let view = view(world);
    let layout = view.layout();
    let down = view.pointer_down(controls_x(layout), row_top(layout, row) + 10.0);
    world.pointer_down = Some(down);
}

#[when(expr = "the pointer is pressed on the delete control of row {int}")]
fn press_delete(world: &mut YedalmWorld, row: usize) {
    let view = view(world);
    let layout = view.layout();
    let down = view.pointer_down(
        controls_x(layout),
        row_top(layout, row) + layout.row_height - 10.0,
    );
    world.pointer_down = Some(down);
}

#[when(expr = "the pointer is pressed on row {int} and moved by {int} pixels")]
fn press_and_move(world: &mut YedalmWorld, row: usize, dy: i32) {
    let view = view(world);
    let layout = view.layout();
    let y = row_top(layout, row) + layout.row_height / 2.0;
    let down = view.pointer_down(SURFACE_X, y);
    view.pointer_move(y + dy as f64);
    world.pointer_down = Some(down);
}

#[when(expr = "row {int} is dragged by {int} pixels")]
fn drag_row(world: &mut YedalmWorld, row: usize, dy: i32) {
    press_and_move(world, row, dy);
    let drop = view(world).pointer_up();
    world.drop = Some(drop);
}

#[when("the pointer is released")]
fn release(world: &mut YedalmWorld) {
    let drop = view(world).pointer_up();
    world.drop = Some(drop);
}

#[when("the gesture is cancelled")]
fn cancel(world: &mut YedalmWorld) {
    view(world).cancel();
}

#[then(expr = "the press opens the editor for organization {int}")]
fn press_is_edit(world: &mut YedalmWorld, id: i64) {
    assert_eq!(world.pointer_down, Some(PointerDown::Edit(id)));
}

#[then(expr = "the press asks to delete organization {int}")]
fn press_is_delete(world: &mut YedalmWorld, id: i64) {
    assert_eq!(world.pointer_down, Some(PointerDown::Delete(id)));
}

#[then("no drag is in progress")]
fn no_drag(world: &mut YedalmWorld) {
    assert!(!view(world).is_dragging());
}

#[then(expr = "the preview order is {string}")]
fn preview_order(world: &mut YedalmWorld, list: String) {
    let preview: Vec<i64> = view(world).preview().iter().map(|o| o.id).collect();
    assert_eq!(preview, parse_ids(&list));
}

#[then(expr = "organization {int} is lifted")]
fn lifted(world: &mut YedalmWorld, id: i64) {
    assert_eq!(view(world).lift_scale(id), LIFT_SCALE);
}

#[then(expr = "organization {int} is not lifted")]
fn not_lifted(world: &mut YedalmWorld, id: i64) {
    assert_eq!(view(world).lift_scale(id), 1.0);
}

#[then("the drop leaves the order unchanged")]
fn drop_unchanged(world: &mut YedalmWorld) {
    assert_eq!(world.drop, Some(DropResult::Unchanged));
}

#[then(expr = "the dropped order is {string}")]
fn dropped_order(world: &mut YedalmWorld, list: String) {
    match world.drop.as_ref().expect("nothing dropped") {
        DropResult::Reordered(rows) => {
            let ids: Vec<i64> = rows.iter().map(|o| o.id).collect();
            assert_eq!(ids, parse_ids(&list));
        }
        DropResult::Unchanged => panic!("drop left the order unchanged"),
    }
}
