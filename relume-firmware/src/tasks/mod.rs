//! Long-running embassy tasks

mod button;
mod render;
mod update;

pub use button::button_task;
pub use render::render_task;
pub use update::update_task;
