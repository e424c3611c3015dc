//! Выравнивание усиления между станциями объединённой спектрограммы.
//!
//! На стыке двух станций медианы опорной подполосы соседних строк должны
//! совпадать. Опорной выбирается станция сразу после первого стыка; остальные
//! станции сдвигаются по цепочке соседства, пока не будут выровнены все.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use serde::Serialize;
use srs_types::{SrsError, SrsResult};

use crate::{
    combine::{CombinedSpectrogram, SourceLabel, SourceTagged},
    config::RectifyConfig,
    spectrogram::Spectrogram,
};

/// Объединённая спектрограмма с применёнными поправками усиления.
#[derive(Debug, Clone, Serialize)]
pub struct RectifiedSpectrogram {
    combined: CombinedSpectrogram,
    /// Аддитивная поправка для каждой метки источника
    adjustments: BTreeMap<usize, f64>,
    /// Опорная станция (поправка 0.0)
    reference: Option<usize>,
}

impl RectifiedSpectrogram {
    pub fn spectrogram(&self) -> &Spectrogram {
        self.combined.spectrogram()
    }

    pub fn source_labels(&self) -> &[SourceLabel] {
        self.combined.source_labels()
    }

    pub fn adjustments(&self) -> &BTreeMap<usize, f64> {
        &self.adjustments
    }

    pub fn reference(&self) -> Option<usize> {
        self.reference
    }

    pub fn combined(&self) -> &CombinedSpectrogram {
        &self.combined
    }

    pub fn into_combined(self) -> CombinedSpectrogram {
        self.combined
    }
}

impl SourceTagged for RectifiedSpectrogram {
    fn spectrogram(&self) -> &Spectrogram {
        self.combined.spectrogram()
    }

    fn source_labels(&self) -> Option<&[SourceLabel]> {
        Some(self.combined.source_labels())
    }
}

/// Выравнивает усиление с параметрами по умолчанию.
pub fn rectify<S: SourceTagged + ?Sized>(input: &S) -> SrsResult<RectifiedSpectrogram> {
    rectify_with(input, &RectifyConfig::default())
}

/// Выравнивает усиление станций; вход не изменяется.
pub fn rectify_with<S: SourceTagged + ?Sized>(
    input: &S,
    cfg: &RectifyConfig,
) -> SrsResult<RectifiedSpectrogram> {
    let labels = input.source_labels().ok_or(SrsError::NotCombined)?;
    let mut spectrogram = input.spectrogram().clone();
    cfg.validate(spectrogram.n_channels())?;

    // Строки каждой станции в порядке времени
    let mut runs: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        if let Some(s) = label {
            runs.entry(*s).or_default().push(i);
        }
    }

    let mut adjustments = BTreeMap::new();
    let reference = reference_site(labels);

    if let Some(reference) = reference {
        adjustments.insert(reference, 0.0);

        let mut processed = BTreeSet::from([reference]);
        let max_passes = cfg.passes_per_site * runs.len();
        let mut passes = 0;

        while processed.len() < runs.len() {
            passes += 1;
            if passes > max_passes {
                return Err(SrsError::RectificationStalled {
                    passes,
                    processed: processed.len(),
                    sites: runs.len(),
                });
            }

            for (&site, rows) in &runs {
                if processed.contains(&site) {
                    continue;
                }

                let Some(offset) = neighbour_offset(&spectrogram, labels, rows, &processed, cfg)
                else {
                    continue;
                };

                for &i in rows {
                    spectrogram.row_mut(i).iter_mut().for_each(|v| *v += offset);
                }

                debug!("Site {site}: offset {offset:.3} (pass {passes})");
                processed.insert(site);
                adjustments.insert(site, offset);
            }
        }
    }

    let combined = CombinedSpectrogram::from_parts(spectrogram, labels.to_vec())?;

    info!(
        "Rectified {} sites, reference {:?}, adjustments {:?}",
        runs.len(),
        reference,
        adjustments
    );

    Ok(RectifiedSpectrogram {
        combined,
        adjustments,
        reference,
    })
}

/// Станция сразу после первой смены метки (пропуски не учитываются).
///
/// Если смен нет, опорной становится единственная станция.
fn reference_site(labels: &[SourceLabel]) -> Option<usize> {
    let mut finite = labels.iter().flatten().copied();
    let first = finite.next()?;
    let mut prev = first;

    for s in finite {
        if s != prev {
            return Some(s);
        }
        prev = s;
    }

    Some(first)
}

/// Поправка станции по уже выровненному соседу до или после её строк.
fn neighbour_offset(
    spectrogram: &Spectrogram,
    labels: &[SourceLabel],
    rows: &[usize],
    processed: &BTreeSet<usize>,
    cfg: &RectifyConfig,
) -> Option<f64> {
    let (&first, &last) = (rows.first()?, rows.last()?);
    let is_processed = |i: usize| labels[i].is_some_and(|s| processed.contains(&s));

    if first > 0 && is_processed(first - 1) {
        return Some(band_median(spectrogram, first - 1, cfg) - band_median(spectrogram, first, cfg));
    }

    if last + 1 < labels.len() && is_processed(last + 1) {
        return Some(band_median(spectrogram, last + 1, cfg) - band_median(spectrogram, last, cfg));
    }

    None
}

fn band_median(
    spectrogram: &Spectrogram,
    row: usize,
    cfg: &RectifyConfig,
) -> f64 {
    spectrogram
        .row(row)
        .map(|r| median(&r[cfg.band_start..cfg.band_end]))
        .unwrap_or(f64::NAN)
}

/// Медиана без учёта NaN; для чётного количества — среднее двух средних.
pub fn median(values: &[f64]) -> f64 {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| !x.is_nan()).collect();

    if v.is_empty() {
        return f64::NAN;
    }

    v.sort_by(f64::total_cmp);
    let mid = v.len() / 2;

    if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2.0
    } else {
        v[mid]
    }
}

#[cfg(test)]
mod tests {
    use srs_types::Site;

    use super::*;

    const N: usize = 802;

    fn axis() -> Vec<f64> {
        (0..N).map(|i| 25e6 + i as f64 * 1e5).collect()
    }

    /// Объединённая спектрограмма из явных меток и уровней строк.
    fn make_combined(rows: &[(SourceLabel, f64)]) -> CombinedSpectrogram {
        let mut s = Spectrogram::new(Site::SanVito, axis());
        let mut labels = Vec::new();

        for (i, &(label, level)) in rows.iter().enumerate() {
            let row = match label {
                Some(_) => vec![level; N],
                None => vec![f64::NAN; N],
            };
            s.append(i as f64 * 10.0, &row).unwrap();
            labels.push(label);
        }

        CombinedSpectrogram::from_parts(s, labels).unwrap()
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(&[f64::NAN, 5.0]), 5.0);
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn test_not_combined() {
        let s = Spectrogram::new(Site::SanVito, axis());
        assert!(matches!(rectify(&s), Err(SrsError::NotCombined)));
    }

    #[test]
    fn test_reference_site() {
        assert_eq!(reference_site(&[Some(0), Some(0), Some(1), Some(2)]), Some(1));
        assert_eq!(reference_site(&[Some(2), None, Some(2), None, Some(0)]), Some(0));
        assert_eq!(reference_site(&[None, Some(3), Some(3)]), Some(3));
        assert_eq!(reference_site(&[None, None]), None);
    }

    #[test]
    fn test_single_site_is_identity() {
        let c = make_combined(&[(Some(0), 5.0), (Some(0), 6.0), (None, 0.0), (Some(0), 7.0)]);
        let r = rectify(&c).unwrap();

        assert_eq!(r.reference(), Some(0));
        assert_eq!(r.adjustments().len(), 1);
        assert_eq!(r.adjustments()[&0], 0.0);

        for (a, b) in c.spectrogram().rows().zip(r.spectrogram().rows()) {
            for (x, y) in a.iter().zip(b) {
                assert!(x == y || (x.is_nan() && y.is_nan()));
            }
        }
    }

    #[test]
    fn test_two_sites_before_neighbour() {
        // 0 0 1 1: опорная — станция 1, станция 0 выравнивается по строке после
        let c = make_combined(&[(Some(0), 10.0), (Some(0), 10.0), (Some(1), 4.0), (Some(1), 4.0)]);
        let r = rectify(&c).unwrap();

        assert_eq!(r.reference(), Some(1));
        assert_eq!(r.adjustments()[&1], 0.0);
        assert_eq!(r.adjustments()[&0], -6.0);
        assert_eq!(r.spectrogram().row(0).unwrap()[0], 4.0);
        assert_eq!(r.spectrogram().row(3).unwrap()[0], 4.0);

        // Вход не изменён
        assert_eq!(c.spectrogram().row(0).unwrap()[0], 10.0);
    }

    #[test]
    fn test_chain_propagation() {
        // 0 1 2: опорная 1; 2 — по строке до, 0 — по строке после
        let c = make_combined(&[(Some(0), 1.0), (Some(1), 3.0), (Some(2), 8.0)]);
        let r = rectify(&c).unwrap();

        assert_eq!(r.adjustments()[&0], 2.0);
        assert_eq!(r.adjustments()[&1], 0.0);
        assert_eq!(r.adjustments()[&2], -5.0);
        assert!(r.spectrogram().rows().all(|row| row[0] == 3.0));
    }

    #[test]
    fn test_propagation_uses_adjusted_data() {
        // 0 1 2 3: опорная 1. За первый проход станция 2 выравнивается по 1,
        // затем станция 3 — уже по выровненной 2.
        let c = make_combined(&[
            (Some(0), 1.0),
            (Some(1), 2.0),
            (Some(2), 5.0),
            (Some(3), 9.0),
        ]);
        let r = rectify(&c).unwrap();

        assert_eq!(r.adjustments()[&2], -3.0);
        assert_eq!(r.adjustments()[&3], -7.0);
        assert!(r.spectrogram().rows().all(|row| row[0] == 2.0));
    }

    #[test]
    fn test_stalled_on_isolated_site() {
        // Станция 2 отделена пропусками от остальных
        let c = make_combined(&[
            (Some(0), 1.0),
            (Some(1), 2.0),
            (None, 0.0),
            (Some(2), 3.0),
        ]);

        match rectify(&c) {
            Err(SrsError::RectificationStalled {
                passes,
                processed,
                sites,
            }) => {
                assert_eq!(passes, 16);
                assert_eq!(processed, 2);
                assert_eq!(sites, 3);
            }
            other => panic!("expected RectificationStalled, got {other:?}"),
        }
    }

    #[test]
    fn test_split_site_uses_outer_edges_only() {
        // 0 1 0: станция 0 соседствует с опорной только внутренними краями
        // своих строк; учитываются лишь строка до первой и после последней.
        let c = make_combined(&[(Some(0), 1.0), (Some(1), 2.0), (Some(0), 1.0)]);

        match rectify(&c) {
            Err(SrsError::RectificationStalled {
                passes,
                processed,
                sites,
            }) => {
                assert_eq!(passes, 11);
                assert_eq!(processed, 1);
                assert_eq!(sites, 2);
            }
            other => panic!("expected RectificationStalled, got {other:?}"),
        }
    }

    #[test]
    fn test_no_finite_labels() {
        let c = make_combined(&[(None, 0.0), (None, 0.0)]);
        let r = rectify(&c).unwrap();

        assert!(r.adjustments().is_empty());
        assert_eq!(r.reference(), None);
    }

    #[test]
    fn test_rectify_rectified_is_noop() {
        let c = make_combined(&[(Some(0), 10.0), (Some(1), 4.0)]);
        let r1 = rectify(&c).unwrap();
        let r2 = rectify(&r1).unwrap();

        assert_eq!(r2.adjustments()[&0], 0.0);
        assert_eq!(r2.spectrogram().row(0).unwrap()[0], 4.0);
    }

    #[test]
    fn test_band_outside_axis() {
        let mut s = Spectrogram::new(Site::SanVito, vec![1.0, 2.0]);
        s.append(0.0, &[1.0, 1.0]).unwrap();
        let c = CombinedSpectrogram::from_parts(s, vec![Some(0)]).unwrap();

        assert!(matches!(rectify(&c), Err(SrsError::InvalidConfig(_))));
    }
}
