mod app;
mod dom;
mod history;
mod net;
mod palette;
mod render;
mod state;
mod util;

pub use app::run;
