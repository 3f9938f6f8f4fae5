// Terminal layout and widgets for the dashboard
use crate::application::dashboard_service::Dashboard;
use crate::domain::status::StatusStyle;
use crate::presentation::chart_canvas::ChartCanvas;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regions {
    pub header: Rect,
    pub readouts: Rect,
    pub chart: Rect,
    pub history: Rect,
}

pub struct TerminalView {
    canvas: ChartCanvas,
    history_rows: u16,
}

impl TerminalView {
    pub fn new(canvas: ChartCanvas, history_rows: usize) -> Self {
        Self {
            canvas,
            history_rows: history_rows.min(u16::MAX as usize - 2) as u16,
        }
    }

    pub fn layout(&self, area: Rect) -> Regions {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(self.history_rows + 2),
            ])
            .split(area);
        Regions {
            header: rows[0],
            readouts: rows[1],
            chart: rows[2],
            history: rows[3],
        }
    }

    /// Point the chart surface at the chart region for a terminal of `area`.
    pub fn sync_layout(&self, area: Rect) {
        let chart = self.layout(area).chart;
        self.canvas.resize(chart_block().inner(chart));
    }

    pub fn draw(&self, frame: &mut Frame, dashboard: &Dashboard<ChartCanvas>) {
        let regions = self.layout(frame.area());

        self.draw_header(frame, regions.header, dashboard);
        self.draw_readouts(frame, regions.readouts, dashboard);

        frame.render_widget(chart_block(), regions.chart);
        self.canvas.paint(frame.buffer_mut());

        let log = dashboard.history();
        let lines: Vec<Line> = if log.is_empty() {
            vec![Line::from(Span::styled(
                "Waiting for wind data",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            log.lines().map(|line| Line::from(line.to_string())).collect()
        };
        let history = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Recent updates {}/{} ", log.len(), log.capacity())),
        );
        frame.render_widget(history, regions.history);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect, dashboard: &Dashboard<ChartCanvas>) {
        let status = dashboard.status().view();
        let color = match status.style {
            StatusStyle::Connected => Color::Green,
            StatusStyle::Disconnected => Color::Red,
        };
        let lines = vec![
            Line::from(vec![
                Span::raw("Status: "),
                Span::styled(
                    status.label,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(Span::styled(
                dashboard.status().server_line(),
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let header = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Wind monitor "),
        );
        frame.render_widget(header, area);
    }

    fn draw_readouts(&self, frame: &mut Frame, area: Rect, dashboard: &Dashboard<ChartCanvas>) {
        let readouts = dashboard.readouts();
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let value_style = Style::default().add_modifier(Modifier::BOLD);
        let speed = Paragraph::new(Line::from(vec![
            Span::styled(readouts.speed_text.clone(), value_style),
            Span::raw(" km/h"),
        ]))
        .block(Block::default().borders(Borders::ALL).title(" Speed "));

        let direction = Paragraph::new(Line::from(vec![
            Span::styled(readouts.arrow().to_string(), Style::default().fg(Color::Cyan)),
            Span::raw(" "),
            Span::styled(format!("{}°", readouts.direction_text), value_style),
        ]))
        .block(Block::default().borders(Borders::ALL).title(" Direction "));

        frame.render_widget(speed, cells[0]);
        frame.render_widget(direction, cells[1]);
    }
}

fn chart_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(" Speed / direction ")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::application::feed_session::FeedEvent;
    use crate::domain::sample::{ReceivedSample, Sample};
    use chrono::{Local, TimeZone};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    pub(crate) fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer.cell((x, y)).map(|c| c.symbol()).unwrap_or(" "));
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_layout_reserves_history_rows() {
        let view = TerminalView::new(ChartCanvas::new(), 10);
        let regions = view.layout(Rect::new(0, 0, 100, 40));
        assert_eq!(regions.history.height, 12);
        assert_eq!(regions.header.height, 4);
        assert!(regions.chart.height >= 8);
    }

    #[test]
    fn test_draws_sample_into_every_region() {
        let canvas = ChartCanvas::new();
        let view = TerminalView::new(canvas.clone(), 10);
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        view.sync_layout(Rect::new(0, 0, 100, 40));

        let mut dashboard = Dashboard::new("10.79.12.142", 20, 10, canvas);
        dashboard.init_chart().unwrap();
        let at = Local.with_ymd_and_hms(2024, 6, 1, 18, 2, 9).unwrap();
        dashboard.apply(FeedEvent::Sample(ReceivedSample::new(Sample::new(12.3, 47.0), at)));

        terminal.draw(|f| view.draw(f, &dashboard)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("Status: Connected"));
        assert!(text.contains("Connected to server: 10.79.12.142"));
        assert!(text.contains("12.3 km/h"));
        assert!(text.contains("↗ 47°"));
        assert!(text.contains("18:02:09 - Speed: 12.3 km/h, Dir: 47°"));
        assert!(text.contains("Recent updates 1/10"));
        assert!(text.contains(" 360"));
    }

    #[test]
    fn test_axes_show_before_first_sample() {
        let canvas = ChartCanvas::new();
        let view = TerminalView::new(canvas.clone(), 10);
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        view.sync_layout(Rect::new(0, 0, 100, 40));

        let mut dashboard = Dashboard::new("wind.local", 20, 10, canvas);
        dashboard.init_chart().unwrap();

        terminal.draw(|f| view.draw(f, &dashboard)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains(" 360"));
    }

    #[test]
    fn test_initial_screen_shows_connecting() {
        let canvas = ChartCanvas::new();
        let view = TerminalView::new(canvas.clone(), 10);
        let mut terminal = Terminal::new(TestBackend::new(80, 36)).unwrap();
        let dashboard = Dashboard::new("wind.local", 20, 10, canvas);

        terminal.draw(|f| view.draw(f, &dashboard)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("Status: Connecting"));
        assert!(text.contains("Connecting to server: wind.local"));
        assert!(text.contains("-- km/h"));
        assert!(text.contains("Recent updates 0/10"));
        assert!(text.contains("Waiting for wind data"));
    }
}
