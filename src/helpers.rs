use crate::{
    error::GlitchError,
    types::{GLYPH_SET, MAX_GLYPHS, MIN_GLYPHS, Mode, Options},
};

use rand::{Rng, SeedableRng, rngs::StdRng};
use std::process;
use tracing_subscriber::EnvFilter;

pub fn print_usage_and_exit() -> ! {
    eprintln!(
        "Usage: glitch [-seed SEED] [-storm]

Options:
  -seed SEED   Seed the random source so the output is reproducible
  -storm       Paint wandering glitch streams across the whole terminal
By default, one line of glitch text is printed every 100ms until SIGINT or SIGTERM."
    );

    process::exit(1);
}

pub fn parse_args<I>(args: I) -> Result<Options, GlitchError>
where
    I: IntoIterator<Item = String>,
{
    let mut options = Options::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => print_usage_and_exit(),

            "-s" | "-seed" | "--seed" => {
                let value = args.next().ok_or(GlitchError::MissingValue(arg))?;
                let seed = value
                    .parse::<u64>()
                    .map_err(|source| GlitchError::InvalidSeed { value, source })?;

                options.seed = Some(seed);
            }

            "-storm" | "--storm" => {
                options.mode = Mode::Storm;
            }

            _ => return Err(GlitchError::UnknownArgument(arg)),
        }
    }

    Ok(options)
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Seeded when asked to, otherwise drawn from OS entropy.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

pub fn line_of_length<R: Rng>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| GLYPH_SET[rng.random_range(0..GLYPH_SET.len())])
        .collect()
}

pub fn random_line<R: Rng>(rng: &mut R) -> String {
    random_line_up_to(rng, MAX_GLYPHS)
}

pub fn random_line_up_to<R: Rng>(rng: &mut R, max: usize) -> String {
    let length = rng.random_range(MIN_GLYPHS..=max.max(MIN_GLYPHS));
    line_of_length(rng, length)
}

/// Splits a line back into glyphs, longest match first. `None` if some part
/// of the line is not a glyph.
#[cfg(test)]
pub fn split_glyphs(line: &str) -> Option<Vec<&'static str>> {
    let mut rest = line;
    let mut glyphs = Vec::new();

    while !rest.is_empty() {
        let glyph = GLYPH_SET
            .iter()
            .filter(|g| rest.starts_with(**g))
            .max_by_key(|g| g.len())?;

        glyphs.push(*glyph);
        rest = &rest[glyph.len()..];
    }

    Some(glyphs)
}
