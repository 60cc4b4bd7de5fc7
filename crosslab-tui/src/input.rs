//! Keyboard input dispatch.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::App;

/// Small and large slider steps.
pub const STEP: i64 = 1;
pub const PAGE_STEP: i64 = 10;

pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),
        KeyCode::Tab | KeyCode::BackTab => app.toggle_focus(),
        KeyCode::Left | KeyCode::Char('h') => app.adjust(-STEP),
        KeyCode::Right | KeyCode::Char('l') => app.adjust(STEP),
        KeyCode::PageUp => app.adjust(PAGE_STEP),
        KeyCode::PageDown => app.adjust(-PAGE_STEP),
        KeyCode::Char('r') => app.reset(),
        KeyCode::Char('c') => app.toggle_view(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crosslab_core::data::SyntheticLoader;
    use crosslab_core::{pipeline, SignalRequest, WindowRole};

    use crate::app::ChartView;

    fn app() -> App {
        let request = SignalRequest::new(
            "DEMO",
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 6, 30).unwrap(),
            22,
            44,
        )
        .unwrap();
        let loaded = pipeline::load_series(&SyntheticLoader::new(), &request, 0);
        App::new(request, loaded)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn arrows_and_vim_keys_step_focused_slider() {
        let mut app = app();
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.window(WindowRole::Short), 24);
        press(&mut app, KeyCode::Char('h'));
        assert_eq!(app.window(WindowRole::Short), 23);
    }

    #[test]
    fn tab_switches_slider_and_pages_step_ten() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, WindowRole::Long);
        press(&mut app, KeyCode::PageUp);
        assert_eq!(app.window(WindowRole::Long), 54);
        press(&mut app, KeyCode::PageDown);
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.window(WindowRole::Long), 34);
        assert_eq!(app.window(WindowRole::Short), 22);
    }

    #[test]
    fn r_resets_and_q_quits() {
        let mut app = app();
        press(&mut app, KeyCode::PageUp);
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.window(WindowRole::Short), 22);

        press(&mut app, KeyCode::Esc);
        assert!(!app.running);
    }

    #[test]
    fn c_toggles_candles_and_ctrl_c_quits() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.view, ChartView::Candles);
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.view, ChartView::Lines);
        assert!(app.running);

        handle_key(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!app.running);
        assert_eq!(app.view, ChartView::Lines);
    }

    #[test]
    fn release_events_are_ignored() {
        let mut app = app();
        let mut key = KeyEvent::new(KeyCode::Right, KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        handle_key(&mut app, key);
        assert_eq!(app.window(WindowRole::Short), 22);
    }
}
