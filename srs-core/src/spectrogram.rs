use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::Serialize;
use srs_types::{Site, SrsError, SrsResult};

/// MJD эпохи Unix (1970-01-01T00:00Z).
pub const MJD_UNIX_EPOCH: f64 = 40_587.0;

/// Секунд в сутках.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Спектрограмма одной станции (или результат объединения нескольких).
///
/// Строки хранятся в одном плоском буфере с шагом `frequency_axis.len()`;
/// плотная матрица строится по запросу в [`Spectrogram::data`].
#[derive(Debug, Clone, Serialize)]
pub struct Spectrogram {
    site_id: u64,
    site_name: String,
    /// Ось частот, Гц
    frequency_axis: Vec<f64>,
    /// Метки времени строк, секунды Unix (UTC)
    time_axis: Vec<f64>,
    power: Vec<f64>,
}

impl Spectrogram {
    /// Создаёт пустую спектрограмму станции с заданной осью частот.
    pub fn new(
        site: Site,
        frequency_axis: Vec<f64>,
    ) -> Self {
        Self::from_site_id(site.as_u8() as u64, site.name().to_string(), frequency_axis)
    }

    /// Создаёт пустую спектрограмму по числовому идентификатору станции.
    pub fn with_site_id(
        site_id: u8,
        frequency_axis: Vec<f64>,
    ) -> SrsResult<Self> {
        Ok(Self::new(Site::from_u8(site_id)?, frequency_axis))
    }

    pub(crate) fn from_site_id(
        site_id: u64,
        site_name: String,
        frequency_axis: Vec<f64>,
    ) -> Self {
        Spectrogram {
            site_id,
            site_name,
            frequency_axis,
            time_axis: Vec::new(),
            power: Vec::new(),
        }
    }

    pub(crate) fn reserve(
        &mut self,
        rows: usize,
    ) {
        self.time_axis.reserve(rows);
        self.power.reserve(rows * self.n_channels());
    }

    /// Добавляет пару (метка времени, спектр).
    pub fn append(
        &mut self,
        timestamp: f64,
        spectrum: &[f64],
    ) -> SrsResult<()> {
        self.check_row(spectrum)?;

        self.time_axis.push(timestamp);
        self.power.extend_from_slice(spectrum);

        Ok(())
    }

    /// Добавляет набор строк. Все строки проверяются до изменения буфера.
    pub fn extend<T: AsRef<[f64]>>(
        &mut self,
        timestamps: &[f64],
        spectra: &[T],
    ) -> SrsResult<()> {
        if timestamps.len() != spectra.len() {
            return Err(SrsError::LengthMismatch {
                timestamps: timestamps.len(),
                spectra: spectra.len(),
            });
        }

        for spec in spectra {
            self.check_row(spec.as_ref())?;
        }

        self.reserve(spectra.len());
        self.time_axis.extend_from_slice(timestamps);
        for spec in spectra {
            self.power.extend_from_slice(spec.as_ref());
        }

        Ok(())
    }

    fn check_row(
        &self,
        spectrum: &[f64],
    ) -> SrsResult<()> {
        if spectrum.len() != self.n_channels() {
            return Err(SrsError::DimensionMismatch {
                expected: self.n_channels(),
                found: spectrum.len(),
            });
        }

        Ok(())
    }

    /// Числовой идентификатор станции (у объединённых — упакованный).
    pub fn site_id(&self) -> u64 {
        self.site_id
    }

    /// Человекочитаемое название станции.
    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    /// Станция из словаря RSTN, если идентификатор ему принадлежит.
    pub fn site(&self) -> Option<Site> {
        u8::try_from(self.site_id)
            .ok()
            .and_then(|id| Site::from_u8(id).ok())
    }

    pub fn frequency_axis(&self) -> &[f64] {
        &self.frequency_axis
    }

    pub fn time_axis(&self) -> &[f64] {
        &self.time_axis
    }

    /// Количество частотных каналов.
    pub fn n_channels(&self) -> usize {
        self.frequency_axis.len()
    }

    /// Количество строк (спектров).
    pub fn len(&self) -> usize {
        self.time_axis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_axis.is_empty()
    }

    /// Строка `i` или `None` за пределами.
    pub fn row(
        &self,
        i: usize,
    ) -> Option<&[f64]> {
        if i >= self.len() {
            return None;
        }
        let n = self.n_channels();
        Some(&self.power[i * n..(i + 1) * n])
    }

    pub(crate) fn row_mut(
        &mut self,
        i: usize,
    ) -> &mut [f64] {
        let n = self.n_channels();
        &mut self.power[i * n..(i + 1) * n]
    }

    /// Итератор по строкам в порядке времени.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        let n = self.n_channels();
        (0..self.len()).map(move |i| &self.power[i * n..(i + 1) * n])
    }

    /// Плотная матрица мощности (время × частота).
    pub fn data(&self) -> Array2<f64> {
        let n = self.n_channels();
        Array2::from_shape_fn((self.len(), n), |(i, j)| self.power[i * n + j])
    }

    /// Метки времени как календарные моменты UTC.
    pub fn datetime_range(&self) -> SrsResult<Vec<DateTime<Utc>>> {
        self.time_axis.iter().map(|&t| unix_to_datetime(t)).collect()
    }

    /// Метки времени как модифицированные юлианские даты (MJD, UTC).
    pub fn mjd_range(&self) -> Vec<f64> {
        self.time_axis.iter().map(|&t| unix_to_mjd(t)).collect()
    }

    /// Первая и последняя частота оси.
    pub fn frequency_range(&self) -> Option<(f64, f64)> {
        Some((*self.frequency_axis.first()?, *self.frequency_axis.last()?))
    }

    /// Первая и последняя метка времени.
    pub fn time_range(&self) -> Option<(f64, f64)> {
        Some((*self.time_axis.first()?, *self.time_axis.last()?))
    }
}

/// Секунды Unix → момент UTC (дробная часть сохраняется до наносекунд).
pub fn unix_to_datetime(t: f64) -> SrsResult<DateTime<Utc>> {
    let secs = t.floor();
    let nanos = (((t - secs) * 1e9).round() as u32).min(999_999_999);

    if !secs.is_finite() {
        return Err(SrsError::invalid_timestamp(format!("{t}")));
    }

    DateTime::from_timestamp(secs as i64, nanos)
        .ok_or_else(|| SrsError::invalid_timestamp(format!("{t}")))
}

/// Секунды Unix → MJD.
pub fn unix_to_mjd(t: f64) -> f64 {
    t / SECONDS_PER_DAY + MJD_UNIX_EPOCH
}

impl std::fmt::Display for Spectrogram {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "<Spectrogram site_id={}, site={}",
            self.site_id, self.site_name
        )?;
        if let Some((lo, hi)) = self.frequency_range() {
            write!(f, ", freq_range=[{:.3} MHz, {:.3} MHz]", lo / 1e6, hi / 1e6)?;
        }
        if let Some((t0, t1)) = self.time_range() {
            match (unix_to_datetime(t0), unix_to_datetime(t1)) {
                (Ok(a), Ok(b)) => write!(f, ", time_range=[{a}, {b}]")?,
                _ => write!(f, ", time_range=[{t0}, {t1}]")?,
            }
        }
        write!(f, ", nchan={}, ntime={}>", self.n_channels(), self.len())
    }
}
