//! Print archive header, data header and per-record information for a
//! NOAA 1b file.

use anyhow::Context;
use clap::Parser;
use noaa1b::io::file::{Noaa1bFile, RecordExtent};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "n1binfo", about = "Dump NOAA 1b file structure")]
struct Args {
    /// NOAA 1b file, optionally gzip-compressed
    file: PathBuf,

    /// Data is in little-endian byte order
    #[arg(long)]
    swap: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut file = Noaa1bFile::open(&args.file, args.swap)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;

    if let Some(archive) = file.archive_header() {
        println!("Archive header info:");
        println!("  Type = {}", archive.kind().name());
        println!("  Dataset name = {}", archive.dataset_name());
        match archive.sensor_word_size() {
            Some(size) => println!("  Sensor word size = {}", size),
            None => println!("  Sensor word size = unknown"),
        }
        println!("  Header size = {}", archive.header_size());
    }

    let header = file.data_header();
    println!("Data header info:");
    println!("  Spacecraft = {}", header.spacecraft());
    println!("  Instrument = {}", header.instrument());
    println!("  Start date = {}", header.start_date());
    println!("  End date = {}", header.end_date());
    println!("  Record count = {}", header.record_count());
    println!("  Header count = {}", header.header_count());
    println!("  Format version = {}", header.format_version());
    println!("  Record size = {}", header.record_size());
    println!("  Record attribute size = {}", header.attribute_size());
    println!("  Dataset name = {}", header.dataset_name());
    println!("  Creation site = {}", header.creation_site());
    println!("  Calibration constants [wavenumber, b, c]:");
    let descriptor = header.instrument().descriptor();
    for (channel, k) in header.calibration().chunks(3).enumerate() {
        let name = descriptor.channel_name(channel + 1)?;
        if k.iter().any(|v| v.is_nan()) {
            println!("    {} = none", name);
        } else {
            println!("    {} = [{}, {}, {}]", name, k[0], k[1], k[2]);
        }
    }

    let mut scratch = Vec::new();
    for index in 0..file.record_count() {
        let record = file
            .read_record(index, RecordExtent::Full, &mut scratch)
            .with_context(|| format!("Failed to read record {}", index))?;
        println!("Record {} info:", index);
        println!("  Scan line = {}", record.scan_line()?);
        println!("  Date = {}", record.date()?);
        println!("  Sensor data usable = {}", record.is_sensor_data_usable()?);
        println!("  Calibration usable = {}", record.is_calibration_usable()?);
        println!("  Navigation usable = {}", record.is_navigation_usable()?);
    }

    file.close()?;
    Ok(())
}
