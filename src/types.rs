use std::time::Duration;

pub const GLYPH_SET: [&str; 15] = [
    "A̵̦̦̓͌͗͛̕", "A", "₳", "░A░", "A҉", "Ⱥ", "A̷", "A̲", "A̳", "A̾", "A͎", "A͓̽", "𝔸", "ᴀ", "∀",
];

pub const MIN_GLYPHS: usize = 1;
pub const MAX_GLYPHS: usize = 20;
pub const EMIT_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Lines,
    Storm,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub seed: Option<u64>,
    pub mode: Mode,
}
