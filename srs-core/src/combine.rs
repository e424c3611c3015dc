//! Объединение спектрограмм нескольких станций за одни сутки.
//!
//! Полный интервал времени всех входов проходится с шагом 10 с. Для каждого
//! узла сетки `t0` берутся все отсчёты с `|t - t0| < 5` с и выбирается отсчёт
//! с наибольшим весом `1 - |t - t_mid| / 86400`, где `t_mid` — средняя
//! метка времени *своего* входа, а не общая середина. Узлы без отсчётов
//! заполняются NaN.

use std::cmp::Ordering;

use log::info;
use serde::Serialize;
use srs_types::{SrsError, SrsResult};

use crate::{config::CombineConfig, spectrogram::Spectrogram};

/// Метка источника строки: индекс входа или `None` для пропуска.
pub type SourceLabel = Option<usize>;

/// Спектрограмма, строки которой помечены входом-источником.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedSpectrogram {
    spectrogram: Spectrogram,
    source_labels: Vec<SourceLabel>,
}

/// Доступ к спектрограмме и (если есть) меткам источников.
///
/// Позволяет подавать на выравнивание как объединённые, так и обычные
/// спектрограммы; у последних меток нет.
pub trait SourceTagged {
    fn spectrogram(&self) -> &Spectrogram;

    fn source_labels(&self) -> Option<&[SourceLabel]>;
}

/// Отсчёт общего пула: вход, строка, время, вес.
#[derive(Debug, Clone, Copy)]
struct PooledSample {
    source: usize,
    row: usize,
    time: f64,
    weight: f64,
    /// Позиция в пуле (порядок входов, затем строк) для разрешения ничьих
    order: usize,
}

impl CombinedSpectrogram {
    /// Собирает объединённую спектрограмму из готовых частей.
    pub fn from_parts(
        spectrogram: Spectrogram,
        source_labels: Vec<SourceLabel>,
    ) -> SrsResult<Self> {
        if spectrogram.len() != source_labels.len() {
            return Err(SrsError::LengthMismatch {
                timestamps: spectrogram.len(),
                spectra: source_labels.len(),
            });
        }

        Ok(Self {
            spectrogram,
            source_labels,
        })
    }

    pub fn spectrogram(&self) -> &Spectrogram {
        &self.spectrogram
    }

    pub fn source_labels(&self) -> &[SourceLabel] {
        &self.source_labels
    }

    /// Количество строк-пропусков (NaN).
    pub fn missing_rows(&self) -> usize {
        self.source_labels.iter().filter(|l| l.is_none()).count()
    }

    pub fn into_spectrogram(self) -> Spectrogram {
        self.spectrogram
    }
}

impl SourceTagged for Spectrogram {
    fn spectrogram(&self) -> &Spectrogram {
        self
    }

    fn source_labels(&self) -> Option<&[SourceLabel]> {
        None
    }
}

impl SourceTagged for CombinedSpectrogram {
    fn spectrogram(&self) -> &Spectrogram {
        &self.spectrogram
    }

    fn source_labels(&self) -> Option<&[SourceLabel]> {
        Some(&self.source_labels)
    }
}

/// Объединяет спектрограммы с параметрами по умолчанию.
pub fn combine(spectrograms: &[Spectrogram]) -> SrsResult<CombinedSpectrogram> {
    combine_with(spectrograms, &CombineConfig::default())
}

/// Объединяет спектрограммы с общей осью частот в одну сетку.
///
/// Совместимость осей проверяется только по длине и крайним значениям.
pub fn combine_with(
    spectrograms: &[Spectrogram],
    cfg: &CombineConfig,
) -> SrsResult<CombinedSpectrogram> {
    cfg.validate()?;

    let first = spectrograms.first().ok_or(SrsError::EmptyInput)?;
    check_axes(first, spectrograms)?;

    let pool = build_pool(spectrograms, cfg);
    let n_channels = first.n_channels();

    let (site_id, site_name) = combined_identity(spectrograms);
    let mut combined =
        Spectrogram::from_site_id(site_id, site_name, first.frequency_axis().to_vec());
    let mut labels = Vec::new();

    if let (Some(t_min), Some(t_max)) = (
        pool.first().map(|s| s.time),
        pool.last().map(|s| s.time),
    ) {
        let steps = ((t_max - t_min) / cfg.step_secs).floor() as usize + 1;
        let nan_row = vec![f64::NAN; n_channels];

        combined.reserve(steps);
        labels.reserve(steps);

        for k in 0..steps {
            let t0 = t_min + k as f64 * cfg.step_secs;

            match select_best(&pool, t0, cfg.half_window_secs) {
                Some(best) => {
                    let row = spectrograms[best.source]
                        .row(best.row)
                        .unwrap_or(&nan_row[..]);
                    combined.append(t0, row)?;
                    labels.push(Some(best.source));
                }
                None => {
                    combined.append(t0, &nan_row)?;
                    labels.push(None);
                }
            }
        }
    }

    let result = CombinedSpectrogram::from_parts(combined, labels)?;

    info!(
        "Combined {} spectrograms ({}) into {} rows, {} gap rows",
        spectrograms.len(),
        result.spectrogram.site_name(),
        result.spectrogram.len(),
        result.missing_rows()
    );

    Ok(result)
}

fn check_axes(
    reference: &Spectrogram,
    spectrograms: &[Spectrogram],
) -> SrsResult<()> {
    let axis = reference.frequency_axis();

    for (i, srs) in spectrograms.iter().enumerate() {
        let other = srs.frequency_axis();

        if other.len() != axis.len() {
            return Err(SrsError::incompatible_axis(format!(
                "input {i} has {} channels, expected {}",
                other.len(),
                axis.len()
            )));
        }

        if other.first() != axis.first() {
            return Err(SrsError::incompatible_axis(format!(
                "input {i} frequency start mismatch"
            )));
        }

        if other.last() != axis.last() {
            return Err(SrsError::incompatible_axis(format!(
                "input {i} frequency stop mismatch"
            )));
        }
    }

    Ok(())
}

/// Все отсчёты всех входов, отсортированные по времени.
fn build_pool(
    spectrograms: &[Spectrogram],
    cfg: &CombineConfig,
) -> Vec<PooledSample> {
    let mut pool = Vec::with_capacity(spectrograms.iter().map(Spectrogram::len).sum());

    for (source, srs) in spectrograms.iter().enumerate() {
        let times = srs.time_axis();
        let Some(&t_mid) = times.get(times.len() / 2) else {
            continue;
        };

        for (row, &time) in times.iter().enumerate() {
            pool.push(PooledSample {
                source,
                row,
                time,
                weight: 1.0 - (time - t_mid).abs() / cfg.weight_scale_secs,
                order: pool.len(),
            });
        }
    }

    pool.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.order.cmp(&b.order)));
    pool
}

/// Отсчёт с наибольшим весом в окне `|t - t0| < half_window`.
///
/// При равных весах побеждает более ранний в порядке пула.
fn select_best(
    pool: &[PooledSample],
    t0: f64,
    half_window: f64,
) -> Option<PooledSample> {
    let lo = pool.partition_point(|s| s.time < t0 - half_window);
    let hi = pool.partition_point(|s| s.time <= t0 + half_window);

    pool[lo..hi]
        .iter()
        .filter(|s| (s.time - t0).abs() < half_window)
        .copied()
        .max_by(|a, b| {
            a.weight
                .partial_cmp(&b.weight)
                .unwrap_or(Ordering::Equal)
                .then(b.order.cmp(&a.order))
        })
}

/// Упакованный идентификатор `Σ id_i · 10^i` и имя `A+B+...`.
fn combined_identity(spectrograms: &[Spectrogram]) -> (u64, String) {
    let site_id = spectrograms
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, srs)| {
            let scale = 10u64.saturating_pow(i as u32);
            acc.saturating_add(srs.site_id().saturating_mul(scale))
        });

    let site_name = spectrograms
        .iter()
        .map(Spectrogram::site_name)
        .collect::<Vec<_>>()
        .join("+");

    (site_id, site_name)
}
