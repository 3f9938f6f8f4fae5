// Chart surface adapter - owns the chart renderer lifecycle
use crate::application::errors::{RenderInitError, RenderUpdateError};
use crate::domain::chart::ChartSpec;
use crate::domain::window::SlidingWindow;

/// A target that can hand out drawing contexts for the chart.
pub trait ChartSurface {
    type Context: DrawContext;

    fn acquire(&self) -> Result<Self::Context, RenderInitError>;
}

pub trait DrawContext {
    /// Redraw the whole chart from the current window contents.
    fn draw(&mut self, spec: &ChartSpec, window: &SlidingWindow) -> Result<(), RenderUpdateError>;

    fn release(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Drawn,
    /// The first draw failed and the retry after a reinit succeeded.
    Recovered,
    Dropped,
}

enum ChartState<C> {
    Uninitialized,
    Ready(C),
}

pub struct ChartSurfaceAdapter<S: ChartSurface> {
    surface: S,
    spec: ChartSpec,
    state: ChartState<S::Context>,
}

impl<S: ChartSurface> ChartSurfaceAdapter<S> {
    pub fn new(surface: S, spec: ChartSpec) -> Self {
        Self {
            surface,
            spec,
            state: ChartState::Uninitialized,
        }
    }

    #[cfg(test)]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, ChartState::Ready(_))
    }

    #[cfg(test)]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn init(&mut self) -> Result<(), RenderInitError> {
        self.destroy();
        let context = self.surface.acquire()?;
        self.state = ChartState::Ready(context);
        tracing::debug!("Chart initialized");
        Ok(())
    }

    /// Redraw, recovering at most once by destroy + reinit + retry.
    pub fn update(&mut self, window: &SlidingWindow) -> UpdateOutcome {
        let first = match self.draw(window) {
            Ok(()) => return UpdateOutcome::Drawn,
            Err(e) => e,
        };
        tracing::warn!("Chart update failed ({}), reinitializing", first);

        if let Err(e) = self.init() {
            tracing::error!("Chart reinit failed, dropping update: {}", e);
            return UpdateOutcome::Dropped;
        }

        match self.draw(window) {
            Ok(()) => UpdateOutcome::Recovered,
            Err(e) => {
                tracing::error!("Chart update failed after reinit, dropping update: {}", e);
                UpdateOutcome::Dropped
            }
        }
    }

    pub fn destroy(&mut self) {
        if let ChartState::Ready(mut context) =
            std::mem::replace(&mut self.state, ChartState::Uninitialized)
        {
            context.release();
            tracing::debug!("Chart destroyed");
        }
    }

    fn draw(&mut self, window: &SlidingWindow) -> Result<(), RenderUpdateError> {
        match &mut self.state {
            ChartState::Uninitialized => Err(RenderUpdateError::NotReady),
            ChartState::Ready(context) => context.draw(&self.spec, window),
        }
    }
}

impl<S: ChartSurface> Drop for ChartSurfaceAdapter<S> {
    fn drop(&mut self) {
        self.destroy();
    }
}
