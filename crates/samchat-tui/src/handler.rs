use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, WHEEL_SCROLL_ROWS};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        // The next draw re-measures the chat area
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work in any state
    match key.code {
        KeyCode::Char('c') if ctrl => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('e') if ctrl => {
            app.end_chat();
            return;
        }
        KeyCode::PageUp => {
            app.scroll_up(app.page_rows());
            return;
        }
        KeyCode::PageDown => {
            app.scroll_down(app.page_rows());
            return;
        }
        _ => {}
    }

    if app.is_closing() {
        return;
    }

    match key.code {
        KeyCode::Enter
            if key
                .modifiers
                .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            app.input.insert('\n');
        }
        KeyCode::Char('j') if ctrl => app.input.insert('\n'),
        KeyCode::Enter => app.submit_input(),
        KeyCode::Backspace => app.input.backspace(),
        KeyCode::Delete => app.input.delete(),
        KeyCode::Left => app.input.move_left(),
        KeyCode::Right => app.input.move_right(),
        KeyCode::Home => app.input.move_home(),
        KeyCode::End => app.input.move_end(),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::Char(c) if !ctrl => app.input.insert(c),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;
    let hit = |area: Option<Rect>| area.is_some_and(|r| point_in_rect(x, y, r));

    match mouse.kind {
        MouseEventKind::ScrollUp if hit(app.chat_area) => app.scroll_up(WHEEL_SCROLL_ROWS),
        MouseEventKind::ScrollDown if hit(app.chat_area) => app.scroll_down(WHEEL_SCROLL_ROWS),
        MouseEventKind::Down(MouseButton::Left) => {
            if hit(app.send_area) {
                app.submit_input();
            } else if hit(app.end_area) {
                app.end_chat();
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_in_rect_edges() {
        let rect = Rect::new(10, 5, 8, 3);
        assert!(point_in_rect(10, 5, rect));
        assert!(point_in_rect(17, 7, rect));
        assert!(!point_in_rect(18, 7, rect));
        assert!(!point_in_rect(17, 8, rect));
        assert!(!point_in_rect(9, 5, rect));
    }
}
