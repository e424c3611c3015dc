//! Формат кадра SRS (RSTN Solar Radio Spectrograph)
//!
//! Архивный файл станции — последовательность кадров фиксированного размера
//! 826 байт: 24-байтный заголовок и два блока по 401 беззнаковому байту
//! (полосы 1 и 2). Все многобайтовые числа хранятся в порядке big-endian.
//!
//! ```text
//! [0]      YEAR        u8   — год, две цифры
//! [1..6]   M D h m s   u8   — месяц, день, час, минута, секунда (UTC)
//! [6]      SITE        u8   — идентификатор станции
//! [7]      pad         u8
//! [8..10]  F1_START    u16  — начало полосы 1, МГц
//! [10..12] F1_END      u16  — конец полосы 1, МГц
//! [12..14] pad         u16
//! [14]     F1_REF      u8   — опорный уровень полосы 1
//! [15]     F1_ATTEN    u8   — аттенюатор полосы 1
//! [16..18] F2_START    u16
//! [18..20] F2_END      u16
//! [20..22] pad         u16
//! [22]     F2_REF      u8
//! [23]     F2_ATTEN    u8
//! [24..425]  BAND1     [u8; 401]
//! [425..826] BAND2     [u8; 401]
//! ```

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};
use chrono::{DateTime, TimeZone, Utc};
use srs_types::{Site, SrsError, SrsResult};

/// Размер заголовка кадра (24 байта)
pub const SRS_HEADER_SIZE: usize = 24;

/// Количество отсчётов в одной полосе
pub const SRS_BAND_SIZE: usize = 401;

/// Количество полос в кадре
pub const SRS_BAND_COUNT: usize = 2;

/// Количество частотных каналов спектра (802)
pub const SRS_CHANNELS: usize = SRS_BAND_SIZE * SRS_BAND_COUNT;

/// Полный размер кадра (826 байт)
pub const SRS_FRAME_SIZE: usize = SRS_HEADER_SIZE + SRS_CHANNELS;

/// Двузначный год больше этого значения относится к XX веку
pub const SRS_YEAR_PIVOT: u8 = 50;

/// Параметры одной полосы из заголовка кадра
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BandHeader {
    /// Начальная частота, МГц
    pub start_mhz: u16,
    /// Конечная частота, МГц
    pub end_mhz: u16,
    /// Опорный уровень
    pub reference: u8,
    /// Установка аттенюатора
    pub attenuator: u8,
}

/// Заголовок кадра SRS (фиксированный размер 24 байта)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Год, две цифры (см. [`dealias_year`])
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Идентификатор станции
    pub site_id: u8,
    /// Полоса 1
    pub band1: BandHeader,
    /// Полоса 2
    pub band2: BandHeader,
}

/// Один кадр: заголовок и сырые отсчёты обеих полос.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    /// Сырые отсчёты полосы 1 (401 байт)
    pub band1: Vec<u8>,
    /// Сырые отсчёты полосы 2 (401 байт)
    pub band2: Vec<u8>,
}

/// Раскрывает двузначный год: `> 50` → 19xx, иначе 20xx.
pub fn dealias_year(year: u8) -> i32 {
    if year > SRS_YEAR_PIVOT {
        1900 + year as i32
    } else {
        2000 + year as i32
    }
}

/// `n` равномерно распределённых точек на отрезке `[start, end]`.
///
/// Последняя точка равна `end` точно.
pub fn linspace(
    start: f64,
    end: f64,
    n: usize,
) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            out[n - 1] = end;
            out
        }
    }
}

impl BandHeader {
    /// Суммарная поправка полосы: опорный уровень + аттенюатор.
    pub fn offset(&self) -> f64 {
        self.reference as f64 + self.attenuator as f64
    }

    /// 401 частота полосы в Гц.
    pub fn frequencies_hz(&self) -> Vec<f64> {
        linspace(self.start_mhz as f64, self.end_mhz as f64, SRS_BAND_SIZE)
            .into_iter()
            .map(|f| f * 1e6)
            .collect()
    }

    /// Калибрует сырые отсчёты полосы.
    pub fn calibrate(
        &self,
        raw: &[u8],
    ) -> Vec<f64> {
        let offset = self.offset();
        raw.iter().map(|&v| v as f64 + offset).collect()
    }

    fn read_from(cur: &mut Cursor<&[u8]>) -> SrsResult<Self> {
        let start_mhz = cur.read_u16::<BigEndian>()?;
        let end_mhz = cur.read_u16::<BigEndian>()?;
        let _pad = cur.read_u16::<BigEndian>()?;
        let reference = cur.read_u8()?;
        let attenuator = cur.read_u8()?;

        Ok(BandHeader {
            start_mhz,
            end_mhz,
            reference,
            attenuator,
        })
    }

    fn write_to(
        &self,
        buf: &mut [u8],
    ) {
        buf[0..2].copy_from_slice(&self.start_mhz.to_be_bytes());
        buf[2..4].copy_from_slice(&self.end_mhz.to_be_bytes());
        // [4..6] — padding, нули
        buf[6] = self.reference;
        buf[7] = self.attenuator;
    }
}

impl FrameHeader {
    /// Десериализация заголовка из 24 байт
    pub fn deserialize(buf: &[u8; SRS_HEADER_SIZE]) -> SrsResult<Self> {
        let mut cur = Cursor::new(&buf[..]);

        let year = cur.read_u8()?;
        let month = cur.read_u8()?;
        let day = cur.read_u8()?;
        let hour = cur.read_u8()?;
        let minute = cur.read_u8()?;
        let second = cur.read_u8()?;
        let site_id = cur.read_u8()?;
        let _pad = cur.read_u8()?;

        let band1 = BandHeader::read_from(&mut cur)?;
        let band2 = BandHeader::read_from(&mut cur)?;

        Ok(FrameHeader {
            year,
            month,
            day,
            hour,
            minute,
            second,
            site_id,
            band1,
            band2,
        })
    }

    /// Сериализация заголовка в 24 байта
    pub fn serialize(&self) -> [u8; SRS_HEADER_SIZE] {
        let mut buf = [0u8; SRS_HEADER_SIZE];

        buf[0] = self.year;
        buf[1] = self.month;
        buf[2] = self.day;
        buf[3] = self.hour;
        buf[4] = self.minute;
        buf[5] = self.second;
        buf[6] = self.site_id;
        // [7] — padding

        self.band1.write_to(&mut buf[8..16]);
        self.band2.write_to(&mut buf[16..24]);

        buf
    }

    /// Полный (четырёхзначный) год кадра.
    pub fn full_year(&self) -> i32 {
        dealias_year(self.year)
    }

    /// Момент кадра в UTC с точностью до секунды.
    pub fn timestamp(&self) -> SrsResult<DateTime<Utc>> {
        Utc.with_ymd_and_hms(
            self.full_year(),
            self.month as u32,
            self.day as u32,
            self.hour as u32,
            self.minute as u32,
            self.second as u32,
        )
        .single()
        .ok_or_else(|| {
            SrsError::invalid_timestamp(format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                self.full_year(),
                self.month,
                self.day,
                self.hour,
                self.minute,
                self.second
            ))
        })
    }

    /// Станция кадра из словаря RSTN.
    pub fn site(&self) -> SrsResult<Site> {
        Site::from_u8(self.site_id)
    }

    /// Ось частот из 802 точек (Гц): полоса 1, затем полоса 2.
    pub fn frequency_axis(&self) -> Vec<f64> {
        let mut axis = self.band1.frequencies_hz();
        axis.extend(self.band2.frequencies_hz());
        axis
    }
}

impl Frame {
    /// Создаёт кадр, проверяя размер обеих полос.
    pub fn new(
        header: FrameHeader,
        band1: Vec<u8>,
        band2: Vec<u8>,
    ) -> SrsResult<Self> {
        for band in [&band1, &band2] {
            if band.len() != SRS_BAND_SIZE {
                return Err(SrsError::DimensionMismatch {
                    expected: SRS_BAND_SIZE,
                    found: band.len(),
                });
            }
        }

        Ok(Frame {
            header,
            band1,
            band2,
        })
    }

    /// Откалиброванный спектр кадра (802 значения).
    ///
    /// Чистая функция заголовка и сырых байт: каждая полоса смещается на свою
    /// поправку `reference + attenuator`.
    pub fn spectrum(&self) -> Vec<f64> {
        let mut spec = self.header.band1.calibrate(&self.band1);
        spec.extend(self.header.band2.calibrate(&self.band2));
        spec
    }

    /// Сериализует кадр в 826 байт.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(SRS_FRAME_SIZE);

        buf.extend_from_slice(&self.header.serialize());
        buf.extend_from_slice(&self.band1);
        buf.extend_from_slice(&self.band2);

        buf
    }
}
