use thiserror::Error;

/// Результат для операций SRS
pub type SrsResult<T> = std::result::Result<T, SrsError>;

/// Типы ошибок декодирования, объединения и выравнивания спектрограмм.
#[derive(Debug, Error)]
pub enum SrsError {
    /// Идентификатор станции вне словаря RSTN
    #[error("Unknown site id: {0}")]
    UnknownSite(u8),

    /// Длина спектра не совпадает с длиной оси частот
    #[error("Dimension mismatch: expected spectrum of length {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Количество меток времени и спектров различается
    #[error("Length mismatch: {timestamps} timestamps but {spectra} spectra")]
    LengthMismatch { timestamps: usize, spectra: usize },

    /// Оси частот объединяемых спектрограмм несовместимы
    #[error("Incompatible frequency axis: {0}")]
    IncompatibleAxis(String),

    /// На вход выравнивания подана спектрограмма без меток источников
    #[error("Spectrogram does not appear to be combined")]
    NotCombined,

    /// Граф соседства станций не позволил выровнять все станции
    #[error("Failed to adjust all sites after {passes} passes ({processed} of {sites} sites processed)")]
    RectificationStalled {
        passes: usize,
        processed: usize,
        sites: usize,
    },

    /// Нечего объединять
    #[error("Cannot combine an empty collection of spectrograms")]
    EmptyInput,

    /// Поток не содержит ни одного полного кадра
    #[error("Stream contains no complete frame")]
    EmptyStream,

    /// Поля даты/времени заголовка не образуют корректный момент времени
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Некорректные параметры алгоритма
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Ошибки ввода/вывода (автоконвертируются из std::io::Error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SrsError {
    /// Удобные конструкторы
    pub fn incompatible_axis<S: Into<String>>(s: S) -> Self {
        Self::IncompatibleAxis(s.into())
    }

    pub fn invalid_timestamp<S: Into<String>>(s: S) -> Self {
        Self::InvalidTimestamp(s.into())
    }

    pub fn invalid_config<S: Into<String>>(s: S) -> Self {
        Self::InvalidConfig(s.into())
    }
}
