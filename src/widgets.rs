/// Draggable widgets: todos, layout state and drag handling.
///
/// Widget positions, the layout lock and per-widget visibility each persist
/// under their own settings key. Pointer input (mouse or touch) is normalized
/// at the boundary into one `PointerGesture` type; the drag logic itself is a
/// pure state machine over those gestures, so it tests without a window.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::state::settings::SettingsStore;

pub const TODOS_KEY: &str = "todos";
pub const POSITIONS_KEY: &str = "widgetPositions";
pub const LOCKED_KEY: &str = "widgetsLocked";
pub const VISIBILITY_KEY: &str = "widgetVisibility";

/// Widget ids, used as keys in the position and visibility maps.
pub const WIDGET_IDS: &[&str] = &["todo", "weather", "news"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub text: String,
    pub completed: bool,
}

pub fn load_todos(settings: &SettingsStore) -> Vec<Todo> {
    settings.get(TODOS_KEY).unwrap_or_default()
}

pub fn save_todos(settings: &mut SettingsStore, todos: &[Todo]) {
    settings.set(TODOS_KEY, &todos);
}

/// Append a todo. Blank text is rejected.
pub fn add_todo(todos: &mut Vec<Todo>, text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    todos.push(Todo {
        text: text.to_string(),
        completed: false,
    });
    true
}

pub fn toggle_todo(todos: &mut [Todo], index: usize) {
    if let Some(todo) = todos.get_mut(index) {
        todo.completed = !todo.completed;
    }
}

pub fn remove_todo(todos: &mut Vec<Todo>, index: usize) {
    if index < todos.len() {
        todos.remove(index);
    }
}

/// Persisted widget placement and visibility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetLayout {
    pub positions: BTreeMap<String, (f32, f32)>,
    pub locked: bool,
    pub visibility: BTreeMap<String, bool>,
}

impl WidgetLayout {
    pub fn load(settings: &SettingsStore) -> Self {
        Self {
            positions: settings.get(POSITIONS_KEY).unwrap_or_default(),
            locked: settings.get(LOCKED_KEY).unwrap_or(false),
            visibility: settings.get(VISIBILITY_KEY).unwrap_or_default(),
        }
    }

    pub fn save(&self, settings: &mut SettingsStore) {
        settings.set(POSITIONS_KEY, &self.positions);
        settings.set(LOCKED_KEY, &self.locked);
        settings.set(VISIBILITY_KEY, &self.visibility);
    }

    pub fn is_visible(&self, widget: &str) -> bool {
        self.visibility.get(widget).copied().unwrap_or(true)
    }

    pub fn set_visible(&mut self, widget: &str, visible: bool) {
        self.visibility.insert(widget.to_string(), visible);
    }

    pub fn position(&self, widget: &str) -> Option<(f32, f32)> {
        self.positions.get(widget).copied()
    }
}

/// One normalized pointer event, whatever the input device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerGesture {
    pub x: f32,
    pub y: f32,
    /// Pointer identity; a drag only follows the pointer that started it.
    pub id: u64,
}

/// Pure drag state machine.
///
/// Begin on a widget, feed it pointer moves, end to commit. Gestures from a
/// different pointer id are ignored mid-drag, and nothing starts while the
/// layout is locked.
#[derive(Debug, Default)]
pub struct DragController {
    active: Option<DragState>,
}

#[derive(Debug)]
struct DragState {
    widget: String,
    pointer_id: u64,
    /// Pointer offset from the widget origin at grab time, so the widget
    /// doesn't jump under the cursor.
    grab_dx: f32,
    grab_dy: f32,
}

impl DragController {
    /// Try to start dragging `widget`. Returns whether a drag began.
    pub fn begin(
        &mut self,
        widget: &str,
        gesture: PointerGesture,
        layout: &WidgetLayout,
    ) -> bool {
        if layout.locked || self.active.is_some() {
            return false;
        }
        let (ox, oy) = layout.position(widget).unwrap_or((gesture.x, gesture.y));
        self.active = Some(DragState {
            widget: widget.to_string(),
            pointer_id: gesture.id,
            grab_dx: gesture.x - ox,
            grab_dy: gesture.y - oy,
        });
        true
    }

    /// Advance the drag. Returns the widget's new position when the gesture
    /// belongs to the active drag.
    pub fn update(&self, gesture: PointerGesture) -> Option<(String, (f32, f32))> {
        let drag = self.active.as_ref()?;
        if gesture.id != drag.pointer_id {
            return None;
        }
        let pos = (gesture.x - drag.grab_dx, gesture.y - drag.grab_dy);
        Some((drag.widget.clone(), pos))
    }

    /// End the drag, committing the final position into the layout.
    /// Gestures from other pointers don't end it.
    pub fn end(
        &mut self,
        gesture: PointerGesture,
        layout: &mut WidgetLayout,
    ) -> Option<String> {
        match &self.active {
            Some(drag) if drag.pointer_id == gesture.id => {}
            _ => return None,
        }
        let (widget, pos) = self.update(gesture)?;
        layout.positions.insert(widget.clone(), pos);
        self.active = None;
        Some(widget)
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }
}
