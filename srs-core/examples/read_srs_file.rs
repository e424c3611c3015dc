//! Пример: чтение SRS-файла через SrsReader
//!
//! Демонстрирует:
//! - покадровое чтение и статистику потока
//! - декодирование файла целиком в спектрограмму
//! - объединение и выравнивание (на одном файле — тождественно)

use std::fs::File;

use srs_core::{combine, open_path, rectify, SrsReader};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let input_path = "srs-core/test_output.srs";

    // --- Покадровое чтение ---
    let mut reader = SrsReader::new(File::open(input_path)?);

    println!("First frames:");
    for (i, frame) in reader.by_ref().take(3).enumerate() {
        let frame = frame?;
        let h = &frame.header;
        println!(
            "  [{i}] {} site={} band1={}-{} MHz band2={}-{} MHz",
            h.timestamp()?,
            h.site_id,
            h.band1.start_mhz,
            h.band1.end_mhz,
            h.band2.start_mhz,
            h.band2.end_mhz
        );
    }

    for frame in reader.by_ref() {
        frame?;
    }

    let stats = reader.stats();
    println!("\n✓ Read complete");
    println!("  Frames ok       : {}", stats.frames_ok);
    println!("  Bytes processed : {}", stats.bytes_processed);
    println!("  Truncated tail  : {} bytes", stats.truncated_tail_bytes);

    // --- Спектрограмма целиком ---
    let srs = open_path(input_path)?;
    println!("\n{srs}");

    // --- Объединение и выравнивание ---
    let combined = combine(std::slice::from_ref(&srs))?;
    println!("  Grid rows    : {}", combined.spectrogram().len());
    println!("  Missing rows : {}", combined.missing_rows());

    let rectified = rectify(&combined)?;
    println!("  Adjustments  : {:?}", rectified.adjustments());

    Ok(())
}
