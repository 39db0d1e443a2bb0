mod app;
mod error;
mod helpers;
mod storm;
mod types;

use crate::{
    app::{Printer, Worker},
    error::GlitchError,
    helpers::{init_tracing, make_rng, parse_args, print_usage_and_exit},
    types::{EMIT_INTERVAL, Mode},
};

use std::{
    env, io,
    sync::mpsc::{self, Receiver},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let options = match parse_args(env::args().skip(1)) {
        Ok(options) => options,
        Err(err) if err.is_usage() => {
            eprintln!("{}", err);

            print_usage_and_exit()
        }
        Err(err) => return Err(err.into()),
    };

    let signals = termination_requests()?;
    let rng = make_rng(options.seed);

    tracing::debug!(seed = ?options.seed, mode = ?options.mode, "starting");

    match options.mode {
        Mode::Lines => print_lines(rng, &signals)?,
        Mode::Storm => storm::run(rng, &signals)?,
    }

    Ok(())
}

/// SIGINT and SIGTERM both land on one single-slot channel; repeats are dropped.
fn termination_requests() -> Result<Receiver<()>, GlitchError> {
    let (tx, rx) = mpsc::sync_channel(1);

    ctrlc::set_handler(move || {
        let _ = tx.try_send(());
    })?;

    Ok(rx)
}

fn print_lines<R>(rng: R, signals: &Receiver<()>) -> Result<(), GlitchError>
where
    R: rand::Rng + Send + 'static,
{
    let printer = Worker::spawn("printer", move |stop| {
        Printer::new(rng, io::stdout().lock()).run(&stop);
    })?;

    // The handler owns the sender for the life of the process, so this only
    // returns on a signal.
    let _ = signals.recv();
    tracing::debug!("termination requested");

    if !printer.stop_within(EMIT_INTERVAL) {
        tracing::debug!("printer still blocked on stdout, exiting anyway");
    }

    Ok(())
}
