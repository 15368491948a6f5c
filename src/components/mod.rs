pub mod day_view;
pub mod event_form;
pub mod month_view;
pub mod status_bar;
pub mod week_view;

pub use day_view::DayView;
pub use event_form::EventForm;
pub use month_view::MonthView;
pub use status_bar::StatusBar;
pub use week_view::WeekView;

use ratatui::layout::Rect;

/// Centered popup of up to `max_w` x `max_h`, never smaller than
/// `min_w` x `min_h` unless `area` itself is.
pub fn popup_area(area: Rect, max_w: u16, max_h: u16, min_w: u16, min_h: u16) -> Rect {
    let w = area.width.min(max_w).max(min_w).min(area.width);
    let h = area.height.min(max_h).max(min_h).min(area.height);
    let x = area.x + (area.width - w) / 2;
    let y = area.y + (area.height - h) / 2;
    Rect::new(x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_is_centered() {
        let popup = popup_area(Rect::new(0, 0, 100, 40), 50, 14, 30, 10);
        assert_eq!(popup, Rect::new(25, 13, 50, 14));
    }

    #[test]
    fn popup_fits_tiny_terminal() {
        let area = Rect::new(0, 0, 20, 6);
        let popup = popup_area(area, 50, 14, 30, 10);
        assert_eq!(popup, area);
        assert_eq!(area.intersection(popup), popup);
    }
}
