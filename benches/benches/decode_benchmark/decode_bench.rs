use std::{hint::black_box, io::Cursor};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use srs_core::{
    combine, read_spectrogram, rectify, BandHeader, Frame, FrameHeader, Site, Spectrogram,
    SrsWriter, SRS_BAND_SIZE, SRS_FRAME_SIZE,
};

/// Поток станции: `frames` кадров с шагом 3 с начиная с `hour`:00:00.
fn site_stream(
    site: Site,
    hour: u8,
    frames: u32,
    level: u8,
) -> Vec<u8> {
    let mut writer = SrsWriter::new(Vec::with_capacity(frames as usize * SRS_FRAME_SIZE));

    for i in 0..frames {
        let secs = i * 3;
        let header = FrameHeader {
            year: 24,
            month: 10,
            day: 1,
            hour: hour + (secs / 3600) as u8,
            minute: ((secs / 60) % 60) as u8,
            second: (secs % 60) as u8,
            site_id: site.as_u8(),
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
                attenuator: 5,
            },
        };
        let band1: Vec<u8> = (0..SRS_BAND_SIZE)
            .map(|k| level.wrapping_add((k ^ i as usize) as u8 & 0x0f))
            .collect();
        let frame = Frame::new(header, band1, vec![level; SRS_BAND_SIZE]).unwrap();
        writer.write_frame(&frame).unwrap();
    }

    writer.finish().unwrap()
}

fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    // 1200 кадров = час при шаге 3 с
    for hours in [1u32, 4] {
        let raw = site_stream(Site::Learmonth, 0, hours * 1200, 40);
        group.throughput(Throughput::Bytes(raw.len() as u64));

        group.bench_with_input(BenchmarkId::new("read_spectrogram", hours), &raw, |b, raw| {
            b.iter(|| {
                let srs = read_spectrogram(Cursor::new(black_box(raw.as_slice()))).unwrap();
                black_box(srs.len());
            });
        });
    }

    group.finish();
}

fn benchmark_combine_rectify(c: &mut Criterion) {
    let mut group = c.benchmark_group("combine_rectify");

    let inputs: Vec<Spectrogram> = [
        (Site::SanVito, 0, 30),
        (Site::Learmonth, 2, 70),
        (Site::Holloman, 4, 45),
    ]
    .into_iter()
    .map(|(site, hour, level)| {
        read_spectrogram(Cursor::new(site_stream(site, hour, 2400, level))).unwrap()
    })
    .collect();

    group.bench_function("combine", |b| {
        b.iter(|| {
            let combined = combine(black_box(&inputs)).unwrap();
            black_box(combined.missing_rows());
        });
    });

    let combined = combine(&inputs).unwrap();
    group.bench_function("rectify", |b| {
        b.iter(|| {
            let rectified = rectify(black_box(&combined)).unwrap();
            black_box(rectified.adjustments().len());
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_decode, benchmark_combine_rectify);
criterion_main!(benches);
