// Dashboard service - Applies feed events to the status, window, chart and history views
use crate::application::chart_surface::{ChartSurface, ChartSurfaceAdapter, UpdateOutcome};
use crate::application::errors::RenderInitError;
use crate::application::feed_session::FeedEvent;
use crate::domain::chart::ChartSpec;
use crate::domain::dashboard::Readouts;
use crate::domain::history::HistoryLog;
use crate::domain::sample::ReceivedSample;
use crate::domain::status::StatusPresenter;
use crate::domain::window::{SlidingWindow, WindowEntry};

/// Owns every view of the feed. Each event is applied to completion before
/// the next one is read, so the views never disagree about the latest sample.
pub struct Dashboard<S: ChartSurface> {
    status: StatusPresenter,
    readouts: Readouts,
    window: SlidingWindow,
    chart: ChartSurfaceAdapter<S>,
    history: HistoryLog,
}

impl<S: ChartSurface> Dashboard<S> {
    pub fn new(server: &str, window_capacity: usize, history_capacity: usize, surface: S) -> Self {
        Self {
            status: StatusPresenter::new(server),
            readouts: Readouts::default(),
            window: SlidingWindow::new(window_capacity),
            chart: ChartSurfaceAdapter::new(surface, ChartSpec::wind()),
            history: HistoryLog::new(history_capacity),
        }
    }

    /// Acquire the chart surface and draw the current window, empty or not,
    /// so the axes show before the first sample.
    pub fn init_chart(&mut self) -> Result<(), RenderInitError> {
        self.chart.init()?;
        self.chart.update(&self.window);
        Ok(())
    }

    pub fn apply(&mut self, event: FeedEvent) {
        let view = match event {
            FeedEvent::Connected => self.status.set_status(true, None),
            FeedEvent::Disconnected { detail } => self.status.set_status(false, Some(&detail)),
            FeedEvent::Sample(received) => {
                self.on_sample(&received);
                return;
            }
        };
        tracing::debug!("Status {} [{}]", view.label, view.style.class());
    }

    /// Status first, then data, so a read between steps never shows
    /// "connected" next to stale readings.
    pub fn on_sample(&mut self, received: &ReceivedSample) -> UpdateOutcome {
        if !self.status.is_connected() {
            tracing::info!("Samples arriving, marking feed connected");
        }
        self.status.set_status(true, None);
        self.readouts = Readouts::from_sample(&received.sample);
        self.window.append(WindowEntry::from_received(received));
        let outcome = self.chart.update(&self.window);
        self.history.record(&received.sample, received.received_at);

        if let Some(latest) = self.window.latest() {
            tracing::debug!(
                "Applied sample at {} speed={} direction={} (window {}/{}, chart {:?})",
                latest.time_label,
                latest.speed,
                latest.direction,
                self.window.len(),
                self.window.capacity(),
                outcome
            );
        }
        outcome
    }

    /// Redraw without new data, e.g. after the surface was resized.
    pub fn refresh_chart(&mut self) -> UpdateOutcome {
        self.chart.update(&self.window)
    }

    pub fn status(&self) -> &StatusPresenter {
        &self.status
    }

    pub fn readouts(&self) -> &Readouts {
        &self.readouts
    }

    #[cfg(test)]
    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    #[cfg(test)]
    pub fn chart(&self) -> &ChartSurfaceAdapter<S> {
        &self.chart
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::chart_surface::tests::ScriptedSurface;
    use crate::application::errors::RenderUpdateError;
    use crate::domain::sample::Sample;
    use crate::domain::status::StatusStyle;
    use chrono::{Local, TimeZone};

    fn dashboard(window: usize) -> (Dashboard<ScriptedSurface>, ScriptedSurface) {
        let surface = ScriptedSurface::default();
        let mut dashboard = Dashboard::new("10.79.12.142", window, 10, surface.clone());
        dashboard.init_chart().unwrap();
        (dashboard, surface)
    }

    fn received(speed: f64, direction: f64) -> ReceivedSample {
        let at = Local.with_ymd_and_hms(2024, 6, 1, 9, 4, 7).unwrap();
        ReceivedSample::new(Sample::new(speed, direction), at)
    }

    #[test]
    fn test_sample_updates_every_view() {
        let (mut dashboard, surface) = dashboard(20);
        dashboard.apply(FeedEvent::Sample(received(12.3, 47.0)));

        assert_eq!(
            dashboard.window().latest(),
            Some(WindowEntry::new("09:04:07".to_string(), 12.3, 47.0))
        );
        assert_eq!(dashboard.window().len(), 1);
        assert_eq!(dashboard.readouts().speed_text, "12.3");
        assert_eq!(dashboard.readouts().direction_text, "47");
        assert_eq!(dashboard.readouts().rotation_deg, 47.0);
        assert_eq!(dashboard.status().view().label, "Connected");
        assert_eq!(
            dashboard.history().lines().next().map(|l| l.to_string()),
            Some("09:04:07 - Speed: 12.3 km/h, Dir: 47°".to_string())
        );
        assert_eq!(surface.log.borrow().last_drawn_len, Some(1));
    }

    #[test]
    fn test_window_and_history_capacities_are_independent() {
        let (mut dashboard, surface) = dashboard(3);
        for n in 0..12 {
            dashboard.apply(FeedEvent::Sample(received(n as f64, 0.0)));
        }

        assert_eq!(dashboard.window().len(), 3);
        assert_eq!(dashboard.history().len(), 10);
        let speeds: Vec<f64> = dashboard.window().speeds().iter().copied().collect();
        assert_eq!(speeds, vec![9.0, 10.0, 11.0]);
        // One draw from init, one per sample.
        assert_eq!(surface.log.borrow().draws, 13);
    }

    #[test]
    fn test_init_draws_empty_chart() {
        let (dashboard, surface) = dashboard(20);
        assert!(dashboard.chart().is_ready());
        assert_eq!(surface.log.borrow().draws, 1);
        assert_eq!(surface.log.borrow().last_drawn_len, Some(0));
    }

    #[test]
    fn test_transport_events_only_touch_status() {
        let (mut dashboard, surface) = dashboard(20);
        dashboard.apply(FeedEvent::Connected);
        assert_eq!(dashboard.status().view().style, StatusStyle::Connected);

        dashboard.apply(FeedEvent::Disconnected {
            detail: "connection closed: eof".to_string(),
        });
        let view = dashboard.status().view();
        assert_eq!(view.label, "Disconnected (connection closed: eof)");
        assert_eq!(view.style, StatusStyle::Disconnected);

        assert!(dashboard.window().is_empty());
        assert!(dashboard.history().is_empty());
        assert_eq!(surface.log.borrow().draws, 1);
    }

    #[test]
    fn test_chart_failure_does_not_block_history() {
        let (mut dashboard, surface) = dashboard(20);
        {
            let mut log = surface.log.borrow_mut();
            log.draw_script.push_back(Err(RenderUpdateError::ContextLost));
            log.draw_script.push_back(Err(RenderUpdateError::ContextLost));
        }

        let outcome = dashboard.on_sample(&received(5.0, 90.0));
        assert_eq!(outcome, UpdateOutcome::Dropped);
        assert_eq!(dashboard.window().len(), 1);
        assert_eq!(dashboard.history().len(), 1);

        assert_eq!(dashboard.refresh_chart(), UpdateOutcome::Drawn);
    }
}
