// UI module - egui front end

pub mod app;
pub mod piano_roll;
pub mod timeline;

pub use app::StudioApp;
pub use timeline::TimelineView;
