mod render;

pub use render::TerminalUi;
