use serde::Serialize;

use crate::{SrsError, SrsResult};

/// Станция сети RSTN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum Site {
    /// Palehua, Гавайи
    Palehua = 1,
    /// Holloman, Нью-Мексико
    Holloman = 2,
    /// Learmonth, Австралия
    Learmonth = 3,
    /// San Vito, Италия
    SanVito = 4,
    /// Sagamore Hill, Массачусетс
    SagamoreHill = 5,
}

impl Site {
    /// Все станции словаря в порядке идентификаторов.
    pub const ALL: [Site; 5] = [
        Site::Palehua,
        Site::Holloman,
        Site::Learmonth,
        Site::SanVito,
        Site::SagamoreHill,
    ];

    pub fn from_u8(v: u8) -> SrsResult<Self> {
        match v {
            1 => Ok(Site::Palehua),
            2 => Ok(Site::Holloman),
            3 => Ok(Site::Learmonth),
            4 => Ok(Site::SanVito),
            5 => Ok(Site::SagamoreHill),
            _ => Err(SrsError::UnknownSite(v)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Человекочитаемое название станции
    pub fn name(&self) -> &'static str {
        match self {
            Site::Palehua => "Palehua",
            Site::Holloman => "Holloman",
            Site::Learmonth => "Learmonth",
            Site::SanVito => "San Vito",
            Site::SagamoreHill => "Sagamore Hill",
        }
    }
}

impl std::fmt::Display for Site {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Site {
    type Error = SrsError;

    fn try_from(v: u8) -> SrsResult<Self> {
        Site::from_u8(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_vocabulary() {
        assert_eq!(Site::from_u8(4).unwrap(), Site::SanVito);
        assert_eq!(Site::from_u8(4).unwrap().name(), "San Vito");
        assert_eq!(Site::SagamoreHill.to_string(), "Sagamore Hill");

        for site in Site::ALL {
            assert_eq!(Site::from_u8(site.as_u8()).unwrap(), site);
        }
    }

    #[test]
    fn test_unknown_site() {
        assert!(matches!(Site::from_u8(0), Err(SrsError::UnknownSite(0))));
        assert!(matches!(Site::try_from(6), Err(SrsError::UnknownSite(6))));
    }
}
