//! Пример: запись SRS-файла через SrsWriter
//!
//! Демонстрирует:
//! - заполнение заголовка кадра (станция, время, полосы)
//! - генерацию синтетического спектра с медленным дрейфом
//! - финализацию потока через finish()

use std::fs::File;

use srs_core::{BandHeader, Frame, FrameHeader, Site, SrsWriter, SRS_BAND_SIZE};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_path = "srs-core/test_output.srs";

    // --- SrsWriter ---
    let file = File::create(output_path)?;
    let mut writer = SrsWriter::new(file);

    // --- Один час наблюдений San Vito с шагом 3 с ---
    let num_frames = 1200u32;

    for idx in 0..num_frames {
        let secs = idx * 3;
        let header = FrameHeader {
            year: 24,
            month: 10,
            day: 1,
            hour: 12,
            minute: (secs / 60) as u8,
            second: (secs % 60) as u8,
            site_id: Site::SanVito.as_u8(),
            band1: BandHeader {
                start_mhz: 25,
                end_mhz: 75,
                reference: 10,
                attenuator: 0,
            },
            band2: BandHeader {
                start_mhz: 75,
                end_mhz: 180,
                reference: 10,
                attenuator: 10,
            },
        };

        // Фон плюс всплеск в середине часа
        let burst = if (500..560).contains(&idx) { 40 } else { 0 };
        let band1: Vec<u8> = (0..SRS_BAND_SIZE)
            .map(|k| (30 + (k / 40) as u32 + burst).min(255) as u8)
            .collect();
        let band2: Vec<u8> = (0..SRS_BAND_SIZE)
            .map(|k| (20 + (k / 80) as u32 + burst / 2).min(255) as u8)
            .collect();

        writer.write_frame(&Frame::new(header, band1, band2)?)?;
    }

    let total = writer.frames_written();
    writer.finish()?;

    println!("✓ Записано: {output_path}");
    println!("  Site   : {}", Site::SanVito);
    println!("  Frames : {total}");

    Ok(())
}
