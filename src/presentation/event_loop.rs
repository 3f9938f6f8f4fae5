// Dashboard event loop - Consumes feed events and terminal input
use crate::application::chart_surface::UpdateOutcome;
use crate::application::dashboard_service::Dashboard;
use crate::application::feed_session::FeedEvent;
use crate::presentation::chart_canvas::ChartCanvas;
use crate::presentation::terminal_view::TerminalView;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::{Stream, StreamExt};
use ratatui::backend::Backend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

pub fn is_quit(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Runs until the user quits, the input stream ends, or the feed goes away.
/// Every feed event is applied and drawn before the next one is read.
pub async fn run_dashboard<B, I>(
    terminal: &mut Terminal<B>,
    view: &TerminalView,
    dashboard: &mut Dashboard<ChartCanvas>,
    feed: mpsc::Receiver<FeedEvent>,
    mut input: I,
) -> anyhow::Result<()>
where
    B: Backend,
    I: Stream<Item = std::io::Result<Event>> + Unpin,
{
    let mut feed = ReceiverStream::new(feed);

    loop {
        terminal.draw(|frame| view.draw(frame, dashboard))?;

        tokio::select! {
            event = feed.next() => match event {
                Some(event) => dashboard.apply(event),
                None => {
                    tracing::info!("Feed closed, leaving dashboard");
                    break;
                }
            },
            input = input.next() => match input {
                Some(Ok(Event::Key(key))) if is_quit(&key) => break,
                Some(Ok(Event::Resize(width, height))) => {
                    view.sync_layout(Rect::new(0, 0, width, height));
                    if dashboard.refresh_chart() == UpdateOutcome::Dropped {
                        tracing::warn!("Chart unavailable at {}x{}", width, height);
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => tracing::warn!("Terminal input error: {}", e),
                None => break,
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::{ReceivedSample, Sample};
    use crate::presentation::terminal_view::tests::screen_text;
    use chrono::Local;
    use ratatui::backend::TestBackend;

    fn setup(width: u16, height: u16) -> (Terminal<TestBackend>, TerminalView, Dashboard<ChartCanvas>) {
        let canvas = ChartCanvas::new();
        let view = TerminalView::new(canvas.clone(), 10);
        view.sync_layout(Rect::new(0, 0, width, height));
        let mut dashboard = Dashboard::new("10.79.12.142", 20, 10, canvas);
        dashboard.init_chart().unwrap();
        let terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        (terminal, view, dashboard)
    }

    fn sample_event(speed: f64, direction: f64) -> FeedEvent {
        FeedEvent::Sample(ReceivedSample::new(Sample::new(speed, direction), Local::now()))
    }

    #[test]
    fn test_is_quit() {
        assert!(is_quit(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit(&KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE)));
    }

    #[tokio::test]
    async fn test_applies_feed_until_closed() {
        let (mut terminal, view, mut dashboard) = setup(100, 40);
        let (tx, rx) = mpsc::channel(8);
        tx.send(FeedEvent::Connected).await.unwrap();
        tx.send(sample_event(12.3, 47.0)).await.unwrap();
        tx.send(sample_event(8.0, 270.0)).await.unwrap();
        drop(tx);

        run_dashboard(&mut terminal, &view, &mut dashboard, rx, futures::stream::pending())
            .await
            .unwrap();

        assert_eq!(dashboard.window().len(), 2);
        assert_eq!(dashboard.history().len(), 2);
        assert_eq!(dashboard.readouts().direction_text, "270");
        let text = screen_text(&terminal);
        assert!(text.contains("8.0 km/h"));
        assert!(text.contains("← 270°"));
    }

    #[tokio::test]
    async fn test_quit_key_stops_loop() {
        let (mut terminal, view, mut dashboard) = setup(80, 36);
        let (_tx, rx) = mpsc::channel::<FeedEvent>(8);
        let input = futures::stream::iter(vec![Ok(Event::Key(KeyEvent::new(
            KeyCode::Char('q'),
            KeyModifiers::NONE,
        )))]);

        run_dashboard(&mut terminal, &view, &mut dashboard, rx, input)
            .await
            .unwrap();
        assert!(dashboard.window().is_empty());
    }

    #[tokio::test]
    async fn test_resize_reinitializes_chart() {
        let (mut terminal, view, mut dashboard) = setup(80, 36);
        let (tx, rx) = mpsc::channel(8);
        tx.send(sample_event(5.0, 90.0)).await.unwrap();
        let input = futures::stream::iter(vec![
            Ok(Event::Resize(120, 50)),
            Ok(Event::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE))),
        ]);

        run_dashboard(&mut terminal, &view, &mut dashboard, rx, input)
            .await
            .unwrap();

        assert!(dashboard.chart().is_ready());
        assert_eq!(dashboard.chart().surface().area().width, 118);
    }
}
