use std::{
    fs::File,
    io::{self, BufReader, BufWriter, ErrorKind, Read, Write},
    path::Path,
};

use flate2::read::MultiGzDecoder;
use log::{debug, warn};
use srs_types::{SrsError, SrsResult};

use crate::{
    format::{Frame, FrameHeader, SRS_BAND_SIZE, SRS_FRAME_SIZE, SRS_HEADER_SIZE},
    spectrogram::Spectrogram,
};

/// Потоковый читатель кадров SRS.
///
/// Читает строго последовательно. Неполный кадр в конце потока (короткое
/// чтение заголовка или любой из полос) завершает чтение без ошибки.
pub struct SrsReader<R: Read> {
    reader: BufReader<R>,
    first_header: Option<FrameHeader>,
    stats: ReadStats,
    eof: bool,
}

/// Статистика, накопленная [`SrsReader`] в процессе чтения.
#[derive(Debug, Default, Clone)]
pub struct ReadStats {
    /// Полностью прочитанных кадров.
    pub frames_ok: u64,
    /// Всего прочитано байт (включая усечённый хвост).
    pub bytes_processed: u64,
    /// Байт в неполном кадре в конце потока.
    pub truncated_tail_bytes: u64,
}

/// Потоковый писатель кадров SRS.
pub struct SrsWriter<W: Write> {
    writer: BufWriter<W>,
    frames_written: u64,
}

impl<R: Read> SrsReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            first_header: None,
            stats: ReadStats::default(),
            eof: false,
        }
    }

    /// Возвращает следующий кадр или `None` на EOF / усечённом хвосте.
    pub fn next_frame(&mut self) -> Option<SrsResult<Frame>> {
        if self.eof {
            return None;
        }

        let mut hdr_buf = [0u8; SRS_HEADER_SIZE];
        let mut tail = 0usize;

        let n = match self.read_chunk(&mut hdr_buf) {
            Ok(n) => n,
            Err(e) => return Some(Err(e)),
        };
        tail += n;
        if n < SRS_HEADER_SIZE {
            self.finish(tail);
            return None;
        }

        let header = match FrameHeader::deserialize(&hdr_buf) {
            Ok(h) => h,
            Err(e) => {
                self.eof = true;
                return Some(Err(e));
            }
        };
        if self.first_header.is_none() {
            self.first_header = Some(header);
        }

        let mut bands = [vec![0u8; SRS_BAND_SIZE], vec![0u8; SRS_BAND_SIZE]];
        for band in bands.iter_mut() {
            let n = match self.read_chunk(band) {
                Ok(n) => n,
                Err(e) => return Some(Err(e)),
            };
            tail += n;
            if n < SRS_BAND_SIZE {
                self.finish(tail);
                return None;
            }
        }

        let [band1, band2] = bands;
        self.stats.frames_ok += 1;

        Some(Frame::new(header, band1, band2))
    }

    /// Читает до заполнения `buf` или до EOF. Возвращает число байт.
    fn read_chunk(
        &mut self,
        buf: &mut [u8],
    ) -> SrsResult<usize> {
        let mut filled = 0;

        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.eof = true;
                    return Err(SrsError::Io(e));
                }
            }
        }

        self.stats.bytes_processed += filled as u64;
        Ok(filled)
    }

    fn finish(
        &mut self,
        tail: usize,
    ) {
        self.eof = true;

        if tail > 0 {
            self.stats.truncated_tail_bytes = tail as u64;
            warn!(
                "Truncated frame at end of stream: {tail} of {SRS_FRAME_SIZE} bytes, keeping {} complete frames",
                self.stats.frames_ok
            );
        }
    }

    /// Заголовок первого кадра, если он был прочитан полностью.
    pub fn first_header(&self) -> Option<&FrameHeader> {
        self.first_header.as_ref()
    }

    /// Накопленная статистика чтения.
    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }
}

impl<R: Read> Iterator for SrsReader<R> {
    type Item = SrsResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame()
    }
}

impl<W: Write> SrsWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: BufWriter::new(inner),
            frames_written: 0,
        }
    }

    /// Записывает один кадр.
    pub fn write_frame(
        &mut self,
        frame: &Frame,
    ) -> SrsResult<()> {
        self.writer.write_all(&frame.serialize())?;
        self.frames_written += 1;

        Ok(())
    }

    /// Количество записанных кадров.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Сбрасывает буфер и возвращает внутренний поток.
    pub fn finish(self) -> SrsResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| SrsError::Io(e.into_error()))
    }
}

/// Декодирует поток кадров в спектрограмму одной станции.
///
/// Станция и ось частот берутся из первого кадра; последующие кадры их не
/// переопределяют. Поток без единого полного заголовка даёт
/// [`SrsError::EmptyStream`].
pub fn read_spectrogram<R: Read>(inner: R) -> SrsResult<Spectrogram> {
    let mut reader = SrsReader::new(inner);
    let mut spectrogram: Option<Spectrogram> = None;

    while let Some(result) = reader.next_frame() {
        let frame = result?;
        let timestamp = frame.header.timestamp()?;

        if spectrogram.is_none() {
            spectrogram = Some(Spectrogram::new(
                frame.header.site()?,
                frame.header.frequency_axis(),
            ));
        }

        if let Some(srs) = spectrogram.as_mut() {
            srs.append(timestamp.timestamp() as f64, &frame.spectrum())?;
        }
    }

    let srs = match spectrogram {
        Some(s) => s,
        // Заголовок прочитан, но полосы первого кадра усечены
        None => match reader.first_header() {
            Some(h) => Spectrogram::new(h.site()?, h.frequency_axis()),
            None => return Err(SrsError::EmptyStream),
        },
    };

    debug!(
        "Decoded {} frames ({} bytes) for {}",
        reader.stats().frames_ok,
        reader.stats().bytes_processed,
        srs.site_name()
    );

    Ok(srs)
}

/// Декодирует gzip-сжатый поток. Все члены gzip читаются подряд.
pub fn read_gzip<R: Read>(inner: R) -> SrsResult<Spectrogram> {
    read_spectrogram(MultiGzDecoder::new(inner))
}

/// Открывает файл и декодирует его. Имена на `.gz` распаковываются.
pub fn open_path<P: AsRef<Path>>(path: P) -> SrsResult<Spectrogram> {
    let path = path.as_ref();
    let file = File::open(path)?;

    if is_gzip_path(path) {
        read_gzip(file)
    } else {
        read_spectrogram(file)
    }
}

/// Декодирует независимые файлы параллельно, сохраняя порядок результатов.
///
/// Одновременно работает не больше потоков, чем
/// [`std::thread::available_parallelism`]; файлы обрабатываются пачками.
pub fn decode_files<P: AsRef<Path> + Sync>(paths: &[P]) -> Vec<SrsResult<Spectrogram>> {
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(DECODE_FALLBACK_THREADS);

    decode_files_batched(paths, workers)
}

/// Число потоков, если параллелизм платформы неизвестен
const DECODE_FALLBACK_THREADS: usize = 4;

fn decode_files_batched<P: AsRef<Path> + Sync>(
    paths: &[P],
    workers: usize,
) -> Vec<SrsResult<Spectrogram>> {
    let mut results = Vec::with_capacity(paths.len());

    for batch in paths.chunks(workers.max(1)) {
        std::thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|p| scope.spawn(move || open_path(p)))
                .collect();

            results.extend(handles.into_iter().map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err(SrsError::Io(io::Error::other("decode thread panicked"))))
            }));
        });
    }

    results
}

fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}
