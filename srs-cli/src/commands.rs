//! Подкоманды `srs`: сводка по файлам, объединение станций, словарь станций.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Args;
use log::{error, info};
use serde::Serialize;
use srs_core::{
    combine_with, decode_files, rectify, unix_to_datetime, CombineConfig, CombinedSpectrogram,
    Site, Spectrogram, COMBINE_HALF_WINDOW_SECS, COMBINE_STEP_SECS,
};

/// Параметры подкоманды `combine`.
#[derive(Args, Debug)]
pub struct CombineArgs {
    /// Файлы станций за одни сутки (.srs или .srs.gz)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Выровнять усиление станций после объединения
    #[arg(long)]
    pub rectify: bool,
    /// Вывести результат в JSON (пропуски — null)
    #[arg(long)]
    pub json: bool,
    /// Шаг выходной сетки, с
    #[arg(long, default_value_t = COMBINE_STEP_SECS)]
    pub step: f64,
    /// Полуширина окна сопоставления, с
    #[arg(long, default_value_t = COMBINE_HALF_WINDOW_SECS)]
    pub window: f64,
}

/// Краткая сводка по декодированному файлу.
#[derive(Debug, Serialize)]
struct FileSummary {
    path: String,
    site_id: u64,
    site: String,
    n_channels: usize,
    n_rows: usize,
    frequency_range_hz: Option<(f64, f64)>,
    start: Option<String>,
    end: Option<String>,
}

impl FileSummary {
    fn new(
        path: &Path,
        srs: &Spectrogram,
    ) -> Self {
        let time = |t: f64| unix_to_datetime(t).ok().map(|d| d.to_rfc3339());
        let (start, end) = match srs.time_range() {
            Some((t0, t1)) => (time(t0), time(t1)),
            None => (None, None),
        };

        Self {
            path: path.display().to_string(),
            site_id: srs.site_id(),
            site: srs.site_name().to_string(),
            n_channels: srs.n_channels(),
            n_rows: srs.len(),
            frequency_range_hz: srs.frequency_range(),
            start,
            end,
        }
    }
}

pub fn info<W: Write>(
    files: &[PathBuf],
    json: bool,
    out: &mut W,
) -> Result<()> {
    let mut summaries = Vec::with_capacity(files.len());
    let mut failed = 0usize;

    for (path, result) in files.iter().zip(decode_files(files)) {
        match result {
            Ok(srs) => {
                if !json {
                    writeln!(out, "{}: {srs}", path.display())?;
                }
                summaries.push(FileSummary::new(path, &srs));
            }
            Err(e) => {
                error!("{}: {e}", path.display());
                failed += 1;
            }
        }
    }

    if json {
        serde_json::to_writer_pretty(&mut *out, &summaries)?;
        writeln!(out)?;
    }

    if failed > 0 {
        bail!("{failed} of {} files failed to decode", files.len());
    }

    Ok(())
}

pub fn combine<W: Write>(
    args: &CombineArgs,
    out: &mut W,
) -> Result<()> {
    let cfg = CombineConfig {
        step_secs: args.step,
        half_window_secs: args.window,
        ..CombineConfig::default()
    };

    let inputs = decode_files(&args.files)
        .into_iter()
        .zip(&args.files)
        .map(|(result, path)| {
            result.with_context(|| format!("failed to decode {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    info!("Decoded {} files", inputs.len());

    let combined = combine_with(&inputs, &cfg).context("combine failed")?;

    if !args.rectify {
        if args.json {
            return write_json(out, &combined);
        }
        return write_combined(out, &combined);
    }

    let rectified = rectify(&combined).context("rectify failed")?;

    if args.json {
        return write_json(out, &rectified);
    }

    write_combined(out, rectified.combined())?;

    match rectified.reference() {
        Some(r) => writeln!(out, "reference: [{r}] {}", inputs[r].site_name())?,
        None => writeln!(out, "reference: none")?,
    }
    for (&site, offset) in rectified.adjustments() {
        writeln!(out, "  [{site}] {:<14} {offset:+.3}", inputs[site].site_name())?;
    }

    Ok(())
}

pub fn sites<W: Write>(out: &mut W) -> Result<()> {
    for site in Site::ALL {
        writeln!(out, "{:>2}  {site}", site.as_u8())?;
    }
    Ok(())
}

fn write_combined<W: Write>(
    out: &mut W,
    combined: &CombinedSpectrogram,
) -> Result<()> {
    writeln!(out, "{}", combined.spectrogram())?;
    writeln!(out, "missing rows: {}", combined.missing_rows())?;
    Ok(())
}

fn write_json<W: Write, T: Serialize>(
    out: &mut W,
    value: &T,
) -> Result<()> {
    serde_json::to_writer(&mut *out, value).context("failed to write JSON")?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use srs_core::{BandHeader, Frame, FrameHeader, SrsWriter, SRS_BAND_SIZE};
    use tempfile::{tempdir, TempDir};

    use super::*;

    /// Файл станции: `count` кадров с шагом 10 с, начиная с `hour`:00:00.
    fn write_site(
        dir: &TempDir,
        name: &str,
        site: Site,
        hour: u8,
        count: u32,
        level: u8,
    ) -> PathBuf {
        let path = dir.path().join(name);
        let mut writer = SrsWriter::new(std::fs::File::create(&path).unwrap());

        for i in 0..count {
            let secs = i * 10;
            let band = BandHeader {
                start_mhz: 25,
                end_mhz: 180,
                reference: 0,
                attenuator: 0,
            };
            let header = FrameHeader {
                year: 24,
                month: 10,
                day: 1,
                hour: hour + (secs / 3600) as u8,
                minute: ((secs / 60) % 60) as u8,
                second: (secs % 60) as u8,
                site_id: site.as_u8(),
                band1: band,
                band2: band,
            };
            let frame =
                Frame::new(header, vec![level; SRS_BAND_SIZE], vec![level; SRS_BAND_SIZE]).unwrap();
            writer.write_frame(&frame).unwrap();
        }

        writer.finish().unwrap();
        path
    }

    fn args(files: Vec<PathBuf>) -> CombineArgs {
        CombineArgs {
            files,
            rectify: false,
            json: false,
            step: COMBINE_STEP_SECS,
            window: COMBINE_HALF_WINDOW_SECS,
        }
    }

    #[test]
    fn test_sites() {
        let mut out = Vec::new();
        sites(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().count(), 5);
        assert!(text.contains(" 4  San Vito"));
    }

    #[test]
    fn test_info_reports_failures() {
        let dir = tempdir().unwrap();
        let good = write_site(&dir, "lm.srs", Site::Learmonth, 0, 6, 20);
        let missing = dir.path().join("missing.srs");

        let mut out = Vec::new();
        assert!(info(&[good.clone()], false, &mut out).is_ok());
        assert!(String::from_utf8(out).unwrap().contains("site=Learmonth"));

        let mut out = Vec::new();
        assert!(info(&[good, missing], true, &mut out).is_err());
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["n_rows"], 6);
        assert_eq!(json[0]["site_id"], 3);
    }

    #[test]
    fn test_combine_and_rectify() {
        let dir = tempdir().unwrap();
        let a = write_site(&dir, "sv.srs", Site::SanVito, 0, 360, 30);
        let b = write_site(&dir, "lm.srs", Site::Learmonth, 1, 360, 50);

        let mut cmd = args(vec![a, b]);
        let mut out = Vec::new();
        combine(&cmd, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("site=San Vito+Learmonth"));
        assert!(text.contains("missing rows: 0"));

        cmd.rectify = true;
        let mut out = Vec::new();
        combine(&cmd, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("reference: [1] Learmonth"));
        assert!(text.contains("+20.000"));

        cmd.json = true;
        let mut out = Vec::new();
        combine(&cmd, &mut out).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["reference"], 1);
        assert_eq!(json["adjustments"]["0"], 20.0);
        assert_eq!(json["combined"]["source_labels"][0], 0);
    }

    #[test]
    fn test_combine_invalid_step() {
        let dir = tempdir().unwrap();
        let a = write_site(&dir, "sv.srs", Site::SanVito, 0, 3, 30);

        let mut cmd = args(vec![a]);
        cmd.step = 0.0;
        assert!(combine(&cmd, &mut Vec::new()).is_err());
    }
}
