//! Библиотека декодирования и объединения данных RSTN SRS
//!
//! Декодирует архивные файлы спектрографов сети RSTN (Radio Solar Telescope
//! Network), объединяет записи нескольких станций за одни сутки в одну
//! спектрограмму с сеткой 10 с и выравнивает усиление станций.
//!
//! # Быстрый старт
//!
//! ```no_run
//! use srs_core::{combine, open_path, rectify};
//!
//! let sites = vec![
//!     open_path("LM241001.SRS.gz")?,
//!     open_path("sv241001.srs.gz")?,
//! ];
//! let combined = combine(&sites)?;
//! let rectified = rectify(&combined)?;
//! println!("{}", rectified.spectrogram());
//! println!("{:?}", rectified.adjustments());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod combine;
pub mod config;
pub mod format;
pub mod rectify;
pub mod serialization;
pub mod spectrogram;

pub use combine::*;
pub use config::*;
pub use format::*;
pub use rectify::*;
pub use serialization::*;
pub use spectrogram::*;

pub use srs_types::{Site, SrsError, SrsResult};

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        assert_eq!(SRS_FRAME_SIZE, 826);
        assert_eq!(SRS_CHANNELS, 802);
        assert_eq!(COMBINE_STEP_SECS, 10.0);
    }
}
