mod crossfade_view;
mod progress_bar;
mod status_bar;
mod step_text;

pub use crossfade_view::{CrossfadeViewWidget, ImageFitCache};
pub use progress_bar::ProgressBarWidget;
pub use status_bar::StatusBarWidget;
pub use step_text::StepTextWidget;
