// demos/basic_usage.rs
//! Basic usage walkthrough: build a session store, condition a channel,
//! and inspect the provenance history

use physio_core::channel::{Channel, ChannelType};
use physio_core::processing::{
    interpolate_channels, preprocess, ChannelSelector, InterpolationMethod, PreprocessMethod,
};
use physio_core::registry::Registry;
use physio_core::store::{ChannelStore, WriteMode};
use std::f64::consts::PI;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("physio-core basic usage");
    println!("=======================");

    // The registry knows every recognized channel kind
    let registry = Registry::global();
    println!("Importable channel types: {:?}", registry.importable_types());

    // Build a small session: a skin conductance trace with a dropout, plus
    // experiment markers
    let rate = 100.0;
    let mut samples: Vec<f64> = (0..500)
        .map(|i| 2.0 + 0.5 * (2.0 * PI * 0.2 * i as f64 / rate).sin())
        .collect();
    for v in samples.iter_mut().skip(120).take(15) {
        *v = f64::NAN;
    }

    let mut store = ChannelStore::new();
    let scr_id = store.add(
        Channel::waveform(ChannelType::SkinConductance, samples, rate, "µS")?,
        Some("imported skin conductance"),
    );
    store.add(
        Channel::events(ChannelType::Marker, vec![0.5, 2.0, 3.5], None, "events")?,
        Some("imported markers"),
    );
    println!(
        "\nStore holds {} channels, {:.1} s of data",
        store.channel_count(),
        store.duration_s()
    );

    // Fill the dropout
    let batch = interpolate_channels(
        &mut store,
        &[ChannelSelector::Id(scr_id)],
        InterpolationMethod::Pchip,
        false,
        WriteMode::Replace,
    );
    println!(
        "Interpolation: {} succeeded, {} failed",
        batch.succeeded(),
        batch.failed()
    );

    // Smooth the filled trace into a new channel
    let report = preprocess(
        &mut store,
        &ChannelSelector::Id(scr_id),
        &PreprocessMethod::Median { window_len: 5 },
        WriteMode::Add,
    )?;
    println!(
        "Median-filtered copy written as channel {} at {} Hz",
        report.channel_id, report.sample_rate
    );

    println!("\nProvenance history:");
    for entry in store.history() {
        println!(
            "  [{}] {} {}: {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.action,
            entry.channel_tag,
            entry.message
        );
    }

    Ok(())
}
