use srs_types::{SrsError, SrsResult};

/// Шаг временной сетки объединения (с)
pub const COMBINE_STEP_SECS: f64 = 10.0;

/// Полуширина окна поиска вокруг узла сетки (с)
pub const COMBINE_HALF_WINDOW_SECS: f64 = 5.0;

/// Масштаб веса `1 - |t - t_mid| / scale` (сутки, с)
pub const COMBINE_WEIGHT_SCALE_SECS: f64 = 86_400.0;

/// Опорная подполоса выравнивания: каналы `[200, 401)`.
pub const RECTIFY_BAND_START: usize = 200;
pub const RECTIFY_BAND_END: usize = 401;

/// Допустимое число проходов на одну станцию
pub const RECTIFY_PASSES_PER_SITE: usize = 5;

/// Параметры объединения спектрограмм.
#[derive(Debug, Clone, PartialEq)]
pub struct CombineConfig {
    /// Шаг выходной сетки (с)
    pub step_secs: f64,
    /// Полуширина окна сопоставления (с), граница не включается
    pub half_window_secs: f64,
    /// Масштаб весовой функции (с)
    pub weight_scale_secs: f64,
}

/// Параметры выравнивания усиления.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RectifyConfig {
    /// Первый канал опорной подполосы
    pub band_start: usize,
    /// Канал после последнего канала подполосы
    pub band_end: usize,
    /// Бюджет проходов: `passes_per_site × число станций`
    pub passes_per_site: usize,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl CombineConfig {
    pub fn validate(&self) -> SrsResult<()> {
        if !(self.step_secs.is_finite() && self.step_secs > 0.0) {
            return Err(SrsError::invalid_config(format!(
                "step must be > 0, got {}",
                self.step_secs
            )));
        }

        if !(self.half_window_secs.is_finite() && self.half_window_secs > 0.0) {
            return Err(SrsError::invalid_config(format!(
                "half window must be > 0, got {}",
                self.half_window_secs
            )));
        }

        if !(self.weight_scale_secs.is_finite() && self.weight_scale_secs > 0.0) {
            return Err(SrsError::invalid_config(format!(
                "weight scale must be > 0, got {}",
                self.weight_scale_secs
            )));
        }

        Ok(())
    }
}

impl RectifyConfig {
    /// Проверяет подполосу относительно числа каналов спектрограммы.
    pub fn validate(
        &self,
        n_channels: usize,
    ) -> SrsResult<()> {
        if self.band_start >= self.band_end {
            return Err(SrsError::invalid_config(format!(
                "empty reference band {}..{}",
                self.band_start, self.band_end
            )));
        }

        if self.band_end > n_channels {
            return Err(SrsError::invalid_config(format!(
                "reference band {}..{} exceeds {} channels",
                self.band_start, self.band_end, n_channels
            )));
        }

        if self.passes_per_site == 0 {
            return Err(SrsError::invalid_config("passes per site must be > 0"));
        }

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для CombineConfig, RectifyConfig
////////////////////////////////////////////////////////////////////////////////

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            step_secs: COMBINE_STEP_SECS,
            half_window_secs: COMBINE_HALF_WINDOW_SECS,
            weight_scale_secs: COMBINE_WEIGHT_SCALE_SECS,
        }
    }
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self {
            band_start: RECTIFY_BAND_START,
            band_end: RECTIFY_BAND_END,
            passes_per_site: RECTIFY_PASSES_PER_SITE,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
