// Presentation layer - Terminal UI
pub mod chart_canvas;
pub mod event_loop;
pub mod terminal_view;
