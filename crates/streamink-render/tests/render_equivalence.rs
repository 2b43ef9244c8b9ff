//! Incremental layer updates must produce the same pixels as a full repaint.

use kurbo::Rect;
use streamink_core::action::{Action, ActionKind, BrushSpec, PenPoint};
use streamink_core::config::PlayerConfig;
use streamink_core::document::BlankDocument;
use streamink_core::page::Page;
use streamink_core::player::StreamActionPlayer;
use streamink_core::processor::StreamExecutor;
use streamink_core::shapes::{Brush, Rgba};
use streamink_core::stream::{DocumentInfo, DocumentType};
use streamink_core::tools::ToolController;
use streamink_core::viewer::Viewer;
use streamink_render::{RenderController, RenderOptions, RenderStats};

const BLUE: Rgba = Rgba::new(20, 40, 200, 255);
const YELLOW: Rgba = Rgba::new(250, 220, 0, 110);

fn document() -> BlankDocument {
    BlankDocument::new(1, 4.0, 3.0).with_color([240, 240, 235, 255])
}

fn point(x: f32, y: f32) -> PenPoint {
    PenPoint::new(x, y, 1.0)
}

fn gesture(select: ActionKind, points: &[(f32, f32)]) -> Vec<Action> {
    let mut actions = vec![Action::new(select)];
    for (i, (x, y)) in points.iter().enumerate() {
        let p = point(*x, *y);
        actions.push(Action::new(match i {
            0 => ActionKind::ToolBegin(p),
            i if i + 1 == points.len() => ActionKind::ToolEnd(p),
            _ => ActionKind::ToolExecute(p),
        }));
    }
    actions
}

fn lecture() -> Vec<Action> {
    let pen = Brush::new(BLUE, 0.006);
    let marker = Brush::new(YELLOW, 0.03);
    let mut actions = Vec::new();
    actions.extend(gesture(
        ActionKind::Pen(BrushSpec::new(1, pen)),
        &[(0.1, 0.1), (0.2, 0.15), (0.3, 0.1), (0.4, 0.2)],
    ));
    actions.extend(gesture(
        ActionKind::Highlighter(BrushSpec::new(2, marker)),
        &[(0.05, 0.12), (0.25, 0.12), (0.45, 0.13)],
    ));
    actions.extend(gesture(
        ActionKind::Rectangle(BrushSpec::new(3, pen)),
        &[(0.5, 0.3), (0.6, 0.4), (0.8, 0.6)],
    ));
    actions.extend(gesture(
        ActionKind::Ellipse(BrushSpec::new(4, pen)),
        &[(0.1, 0.4), (0.3, 0.6)],
    ));
    actions.extend(gesture(
        ActionKind::Pointer(BrushSpec::new(5, pen)),
        &[(0.5, 0.5), (0.6, 0.5), (0.7, 0.5)],
    ));
    actions.extend(gesture(
        ActionKind::Arrow(BrushSpec::new(6, pen)),
        &[(0.2, 0.7), (0.6, 0.65)],
    ));
    actions.extend(gesture(ActionKind::Text(7), &[(0.6, 0.05), (0.6, 0.05)]));
    actions.push(Action::new(ActionKind::TextChange {
        handle: 7,
        text: "Lemma 2\nproof".to_string(),
    }));
    actions.push(Action::new(ActionKind::TextHighlight {
        handle: 8,
        color: YELLOW,
        rects: vec![Rect::new(0.6, 0.05, 0.8, 0.08)],
    }));
    // a settled shape is deleted and restored
    actions.push(Action::new(ActionKind::DeleteShape(4)));
    actions.push(Action::new(ActionKind::Undo));
    actions
}

fn render_incrementally(actions: &[Action], options: RenderOptions) -> (Vec<u8>, RenderStats) {
    let doc = document();
    let mut page = Page::with_aspect(0, 0.75);
    let mut tools = ToolController::new();
    let mut controller = RenderController::raster(160, 120, options).unwrap();
    controller.attach(&mut page, &doc).unwrap();
    for action in actions {
        tools.execute(action, &mut page).unwrap();
        controller.update(&mut page, &doc).unwrap();
    }
    (controller.frame().image().as_raw().clone(), controller.stats())
}

fn render_full(actions: &[Action], options: RenderOptions) -> Vec<u8> {
    let doc = document();
    let mut page = Page::with_aspect(0, 0.75);
    let mut tools = ToolController::new();
    for action in actions {
        tools.execute(action, &mut page).unwrap();
    }
    let mut controller = RenderController::raster(160, 120, options).unwrap();
    controller.attach(&mut page, &doc).unwrap();
    controller.frame().image().as_raw().clone()
}

#[test]
fn incremental_matches_full_repaint() {
    let actions = lecture();
    let (incremental, stats) = render_incrementally(&actions, RenderOptions::default());
    let full = render_full(&actions, RenderOptions::default());
    assert!(incremental == full, "incremental frame differs from full repaint");
    assert!(stats.bakes > 0);
    assert!(stats.volatile_redraws > stats.action_recomputes);
}

#[test]
fn incremental_matches_full_repaint_on_hidpi() {
    let actions = lecture();
    let options = RenderOptions::default().with_scale_factor(2.0);
    let (incremental, _) = render_incrementally(&actions, options);
    let full = render_full(&actions, options);
    assert_eq!(incremental.len(), 320 * 240 * 4);
    assert!(incremental == full, "incremental frame differs from full repaint");
}

#[test]
fn zoomed_page_matches_full_repaint() {
    let mut actions = lecture();
    actions.extend(gesture(
        ActionKind::Zoom(BrushSpec::new(90, Brush::default())),
        &[(0.1, 0.1), (0.3, 0.2), (0.5, 0.4)],
    ));
    actions.extend(gesture(
        ActionKind::Line(BrushSpec::new(9, Brush::new(BLUE, 0.004))),
        &[(0.15, 0.3), (0.45, 0.3)],
    ));
    let (incremental, _) = render_incrementally(&actions, RenderOptions::default());
    let full = render_full(&actions, RenderOptions::default());
    assert!(incremental == full, "incremental frame differs from full repaint");
}

#[test]
fn seek_produces_one_final_repaint() {
    let doc = document();
    let mut page = Page::with_aspect(0, 0.75);
    let mut tools = ToolController::new();
    let mut controller = RenderController::raster(160, 120, RenderOptions::default()).unwrap();
    controller.attach(&mut page, &doc).unwrap();

    let actions = lecture();
    controller.set_seek(true, &mut page, &doc).unwrap();
    for action in &actions {
        tools.execute(action, &mut page).unwrap();
        controller.update(&mut page, &doc).unwrap();
    }
    assert_eq!(controller.stats().volatile_redraws, 1);
    controller.set_seek(false, &mut page, &doc).unwrap();
    assert_eq!(controller.stats().full_repaints, 2);
    assert_eq!(controller.stats().volatile_redraws, 2);

    let full = render_full(&actions, RenderOptions::default());
    assert!(controller.frame().image().as_raw() == &full);
}

#[test]
fn viewer_page_renders_through_player() {
    let mut viewer = Viewer::new();
    let info = DocumentInfo::new(1, DocumentType::Whiteboard, "Board", "board");
    viewer
        .add_document(info, Box::new(BlankDocument::new(2, 4.0, 3.0)))
        .unwrap();
    let mut controller = RenderController::raster(160, 120, RenderOptions::default()).unwrap();
    {
        let (page, backend) = viewer.selected_page_with_backend().unwrap();
        controller.attach(page, backend).unwrap();
    }

    let mut player = StreamActionPlayer::new(viewer, PlayerConfig::default());
    player.start();
    for action in lecture() {
        player.enqueue(action);
    }
    player.on_animation_frame();

    let (page, backend) = player.executor_mut().selected_page_with_backend().unwrap();
    controller.update(page, backend).unwrap();
    let incremental = controller.frame().image().as_raw().clone();
    controller.repaint(page, backend).unwrap();
    assert!(controller.frame().image().as_raw() == &incremental);
    assert_eq!(controller.frame().pixel(1, 1), Some([255, 255, 255, 255]));
}
