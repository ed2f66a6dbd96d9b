use tui::layout::{Constraint, Layout, Rect, Size};
pub const TAB_BAR_HEIGHT: u16 = 3;
const LOG_PANEL_PERCENT: u16 = 30;

/// Pre-computed layout areas for the main draw loop.
pub struct LayoutAreas {
    pub tab_bar: [Rect; 2],
    pub main: Rect,
    pub logs: Option<Rect>,
}

impl LayoutAreas {
    pub fn new(size: Size) -> Self {
        let rect = Rect::new(0, 0, size.width, size.height);
        Self::from_rect(rect, false, false)
    }

    pub fn update(&mut self, area: Rect, full_screen: bool, show_logs: bool) {
        *self = Self::from_rect(area, full_screen, show_logs);
    }

    fn from_rect(area: Rect, full_screen: bool, show_logs: bool) -> Self {
        let (tab_bar, body) = if full_screen {
            ([Rect::ZERO, Rect::ZERO], area)
        } else {
            let [tab, body] = Layout::vertical([
                Constraint::Length(TAB_BAR_HEIGHT),
                Constraint::Fill(1),
            ])
            .areas(area);
            (Self::split_tab_bar(tab), body)
        };

        if !show_logs {
            return LayoutAreas {
                tab_bar,
                main: body,
                logs: None,
            };
        }
        let [main, logs] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Percentage(LOG_PANEL_PERCENT),
        ])
        .areas(body);
        LayoutAreas {
            tab_bar,
            main,
            logs: Some(logs),
        }
    }

    fn split_tab_bar(area: Rect) -> [Rect; 2] {
        Layout::horizontal([Constraint::Percentage(85), Constraint::Percentage(15)]).areas(area)
    }
}

/// Court, play text and progress on the left; score and notices on the right.
pub struct CourtAreas {
    pub scoreboard: Rect,
    pub court: Rect,
    pub play: Rect,
    pub progress: Rect,
    pub sidebar: Rect,
}

impl CourtAreas {
    pub fn new(area: Rect) -> Self {
        let [left, sidebar] = if area.width >= 100 {
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(34)]).areas(area)
        } else {
            [area, Rect::ZERO]
        };
        let [scoreboard, court, play, progress] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(left);
        CourtAreas {
            scoreboard,
            court,
            play,
            progress,
            sidebar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_screen_drops_tab_bar() {
        let mut layout = LayoutAreas::new(Size::new(120, 40));
        assert_eq!(layout.tab_bar[0].height, TAB_BAR_HEIGHT);
        layout.update(Rect::new(0, 0, 120, 40), true, false);
        assert_eq!(layout.tab_bar[0], Rect::ZERO);
        assert_eq!(layout.main.height, 40);
    }

    #[test]
    fn logs_take_the_bottom_of_the_body() {
        let mut layout = LayoutAreas::new(Size::new(100, 43));
        layout.update(Rect::new(0, 0, 100, 43), false, true);
        let logs = layout.logs.unwrap();
        assert_eq!(logs.y, layout.main.bottom());
        assert_eq!(logs.bottom(), 43);
    }

    #[test]
    fn narrow_court_has_no_sidebar() {
        let areas = CourtAreas::new(Rect::new(0, 0, 80, 30));
        assert_eq!(areas.sidebar, Rect::ZERO);
        assert_eq!(areas.court.height, 30 - 3 - 3 - 1);
    }
}
