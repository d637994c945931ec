pub mod app;
pub mod db;
pub mod pointer;
pub mod presets;
pub mod settings;
pub mod utils;

pub use app::run;
