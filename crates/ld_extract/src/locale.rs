//! Client locales and the bitmask the archive uses to tag localized payloads.

use std::fmt::{self, Display};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Bitmask of locales a content-key record applies to.
pub type LocaleFlags = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locale {
    EnUs,
    KoKr,
    FrFr,
    DeDe,
    ZhCn,
    EsEs,
    ZhTw,
    EnGb,
    EnCn,
    EnTw,
    EsMx,
    RuRu,
    PtBr,
    ItIt,
    PtPt,
}

impl Locale {
    pub const ALL: [Locale; 15] = [
        Locale::EnUs,
        Locale::KoKr,
        Locale::FrFr,
        Locale::DeDe,
        Locale::ZhCn,
        Locale::EsEs,
        Locale::ZhTw,
        Locale::EnGb,
        Locale::EnCn,
        Locale::EnTw,
        Locale::EsMx,
        Locale::RuRu,
        Locale::PtBr,
        Locale::ItIt,
        Locale::PtPt,
    ];

    /// The locale's bit in a record's [`LocaleFlags`].
    pub fn flag(self) -> LocaleFlags {
        match self {
            Locale::EnUs => 0x2,
            Locale::KoKr => 0x4,
            Locale::FrFr => 0x10,
            Locale::DeDe => 0x20,
            Locale::ZhCn => 0x40,
            Locale::EsEs => 0x80,
            Locale::ZhTw => 0x100,
            Locale::EnGb => 0x200,
            Locale::EnCn => 0x400,
            Locale::EnTw => 0x800,
            Locale::EsMx => 0x1000,
            Locale::RuRu => 0x2000,
            Locale::PtBr => 0x4000,
            Locale::ItIt => 0x8000,
            Locale::PtPt => 0x10000,
        }
    }

    /// Tag used for output directories and file suffixes, e.g. `enUS`.
    pub fn tag(self) -> &'static str {
        match self {
            Locale::EnUs => "enUS",
            Locale::KoKr => "koKR",
            Locale::FrFr => "frFR",
            Locale::DeDe => "deDE",
            Locale::ZhCn => "zhCN",
            Locale::EsEs => "esES",
            Locale::ZhTw => "zhTW",
            Locale::EnGb => "enGB",
            Locale::EnCn => "enCN",
            Locale::EnTw => "enTW",
            Locale::EsMx => "esMX",
            Locale::RuRu => "ruRU",
            Locale::PtBr => "ptBR",
            Locale::ItIt => "itIT",
            Locale::PtPt => "ptPT",
        }
    }

    pub fn is_set_in(self, flags: LocaleFlags) -> bool {
        flags & self.flag() != 0
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Locale::ALL
            .into_iter()
            .find(|locale| locale.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownLocale(s.to_string()))
    }
}

/// The two locales being compared. `a` is the reference, `b` the localized variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalePair {
    pub a: Locale,
    pub b: Locale,
}

impl LocalePair {
    pub fn new(a: Locale, b: Locale) -> Result<Self> {
        if a == b {
            return Err(Error::SameLocale(a.to_string()));
        }
        Ok(Self { a, b })
    }

    pub fn both(self) -> [Locale; 2] {
        [self.a, self.b]
    }
}

impl Default for LocalePair {
    fn default() -> Self {
        Self {
            a: Locale::EnUs,
            b: Locale::ZhCn,
        }
    }
}
