//! keybed - a virtual piano for the terminal
//!
//! Run with: cargo run

mod app;
mod keymap;
mod ui;

use app::App;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    App::new().run()
}
