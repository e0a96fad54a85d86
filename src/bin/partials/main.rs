//! partials - live spectral peak tracker
//!
//! Run with: cargo run --bin partials
//! Pass `--synthetic` to skip the input device and track a generated signal.

mod analysis;
mod app;
mod source;
mod telemetry;
mod ui;

use app::Partials;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    telemetry::init();

    let mut partials = Partials::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--synthetic" | "-s" => partials = partials.synthetic(true),
            "--optimal" => partials = partials.optimal(true),
            other => {
                if let Some(voices) = other.strip_prefix("--voices=") {
                    let voices = voices.parse().map_err(|err| {
                        color_eyre::eyre::eyre!("invalid --voices value {voices:?}: {err}")
                    })?;
                    partials = partials.voices(voices);
                } else {
                    return Err(color_eyre::eyre::eyre!("unknown argument {other:?}"));
                }
            }
        }
    }

    partials.run()
}
