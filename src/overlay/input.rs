use crate::overlay::gesture::GestureController;
use kurbo::Point;

/// Platform-neutral input as delivered by a window or browser layer.
/// Positions are in screen (client) coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    MouseDown { pos: Point },
    MouseMove { pos: Point },
    MouseUp,
    Wheel { delta_y: f64 },
    TouchStart { touches: Vec<Point> },
    TouchMove { touches: Vec<Point> },
    TouchEnd { touches: Vec<Point> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    Pan,
    Zoom,
}

/// Applies one event to the controller. Returns the change that needs a
/// redraw, if any.
pub fn dispatch(controller: &mut GestureController, event: &InputEvent) -> Option<InputCommand> {
    match event {
        InputEvent::MouseDown { pos } => {
            controller.pointer_down(controller.surface_point(*pos));
            None
        }
        InputEvent::MouseMove { pos } => controller
            .pointer_move(controller.surface_point(*pos))
            .then_some(InputCommand::Pan),
        InputEvent::MouseUp => {
            controller.pointer_up();
            None
        }
        InputEvent::Wheel { delta_y } => controller.wheel(*delta_y).then_some(InputCommand::Zoom),
        InputEvent::TouchStart { touches } => {
            if let Some(pos) = single_touch(touches) {
                controller.pointer_down(controller.surface_point(pos));
            }
            None
        }
        InputEvent::TouchMove { touches } => match touches.as_slice() {
            [] => None,
            [pos] => controller
                .pointer_move(controller.surface_point(*pos))
                .then_some(InputCommand::Pan),
            // Pinch distances stay in client coordinates; only their ratio is used.
            [first, second] => controller
                .pinch_move(*first, *second)
                .then_some(InputCommand::Zoom),
            _ => None,
        },
        InputEvent::TouchEnd { touches } => {
            if touches.len() <= 1 {
                controller.pointer_up();
            }
            None
        }
    }
}

fn single_touch(touches: &[Point]) -> Option<Point> {
    match touches {
        [pos] => Some(*pos),
        _ => None,
    }
}
