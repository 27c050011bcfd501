//! Two-locale string lookup.
//!
//! Tables are plain `(key, text)` data per locale. [`Catalog::load`] checks
//! every table against [`Key::ALL`] once at startup, so a lookup afterwards
//! can never come back empty.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "tr-TR")]
    TrTr,
    #[serde(rename = "en-US")]
    EnUs,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::TrTr, Locale::EnUs];

    pub fn code(self) -> &'static str {
        match self {
            Locale::TrTr => "tr-TR",
            Locale::EnUs => "en-US",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Locale {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Locale::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::Config(format!("unsupported locale '{s}' (expected tr-TR or en-US)")))
    }
}

macro_rules! keys {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Key {
            $($variant),+
        }

        impl Key {
            pub const ALL: &'static [Key] = &[$(Key::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $(Key::$variant => $name),+
                }
            }
        }
    };
}

keys! {
    Worldwide => "worldwide",
    TotalCase => "totalCase",
    Death => "death",
    Recovered => "recovered",
    ActiveSick => "activeSick",
    Active => "active",
    LastUpdate => "lastUpdate",
    Refreshed => "refreshed",
    Refreshing => "refreshing",
    Countries => "countries",
    EnterCountry => "enterCountry",
    NoResults => "noResults",
    Loading => "loading",
    PleaseWait => "pleaseWait",
    About => "about",
    AboutText => "aboutText",
    Close => "close",
    AllInfo => "allInfo",
    TotalCases => "totalCases",
    TodayCases => "todayCases",
    TodayDeaths => "todayDeaths",
    DeathRatio => "deathRatio",
    NumberOfCasesChart => "numberOfCasesChart",
    NumberOfDeathChart => "numberOfDeathChart",
    Home => "home",
    Search => "search",
}

impl std::str::FromStr for Key {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Key::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| AppError::Translation(format!("unknown key '{s}'")))
    }
}

const TR_TR: &[(&str, &str)] = &[
    ("worldwide", "Dünya Geneli"),
    ("totalCase", "Toplam Vaka"),
    ("death", "Ölüm"),
    ("recovered", "İyileşen"),
    ("activeSick", "Aktif Hasta"),
    ("active", "Aktif"),
    ("lastUpdate", "Son Güncelleme"),
    ("refreshed", "Veriler yenilendi"),
    ("refreshing", "Veriler yenileniyor"),
    ("countries", "Ülkeler"),
    ("enterCountry", "Ülke adı girin"),
    ("noResults", "Arama sonucu bulunamadı"),
    ("loading", "Güncelleniyor..."),
    ("pleaseWait", "Lütfen bekleyin..."),
    ("about", "Hakkında"),
    ("aboutText", "Dünya genelinde Covid-19 durumunu takip eden uygulama."),
    ("close", "Kapat"),
    ("allInfo", "Tüm Bilgiler"),
    ("totalCases", "Toplam Vaka"),
    ("todayCases", "Bugünkü Vaka"),
    ("todayDeaths", "Bugünkü Ölüm"),
    ("deathRatio", "Ölüm Oranı"),
    ("numberOfCasesChart", "Vaka Sayısı Grafiği"),
    ("numberOfDeathChart", "Ölüm Sayısı Grafiği"),
    ("home", "Ana Sayfa"),
    ("search", "Ara"),
];

const EN_US: &[(&str, &str)] = &[
    ("worldwide", "Worldwide"),
    ("totalCase", "Total Cases"),
    ("death", "Deaths"),
    ("recovered", "Recovered"),
    ("activeSick", "Active Sick"),
    ("active", "Active"),
    ("lastUpdate", "Last Update"),
    ("refreshed", "Data refreshed"),
    ("refreshing", "Refreshing data"),
    ("countries", "Countries"),
    ("enterCountry", "Enter a country name"),
    ("noResults", "No matching countries"),
    ("loading", "Updating..."),
    ("pleaseWait", "Please wait..."),
    ("about", "About"),
    ("aboutText", "Tracks the Covid-19 situation around the world."),
    ("close", "Close"),
    ("allInfo", "All Info"),
    ("totalCases", "Total Cases"),
    ("todayCases", "Today's Cases"),
    ("todayDeaths", "Today's Deaths"),
    ("deathRatio", "Death Rate"),
    ("numberOfCasesChart", "Number of Cases"),
    ("numberOfDeathChart", "Number of Deaths"),
    ("home", "Home"),
    ("search", "Search"),
];

fn raw_table(locale: Locale) -> &'static [(&'static str, &'static str)] {
    match locale {
        Locale::TrTr => TR_TR,
        Locale::EnUs => EN_US,
    }
}

/// Validated locale → key → text table.
#[derive(Debug, Clone)]
pub struct Catalog {
    tables: HashMap<Locale, HashMap<Key, &'static str>>,
}

impl Catalog {
    /// Build and validate the built-in tables for every supported locale.
    pub fn load() -> Result<Self> {
        let mut tables = HashMap::new();
        for locale in Locale::ALL {
            tables.insert(locale, validate_table(locale, raw_table(locale))?);
        }
        Ok(Self { tables })
    }

    /// Text for `key` in `locale`.
    pub fn translate(&self, key: Key, locale: Locale) -> &'static str {
        // load() guarantees every (locale, key) pair is present
        self.tables
            .get(&locale)
            .and_then(|t| t.get(&key))
            .copied()
            .unwrap_or_else(|| key.name())
    }

    /// Lookup by the key's string name, for callers outside the crate (API, config).
    pub fn translate_str(&self, key: &str, locale: Locale) -> Result<&'static str> {
        Ok(self.translate(key.parse()?, locale))
    }

    /// Full table for one locale, keyed by key name, in [`Key::ALL`] order.
    pub fn table(&self, locale: Locale) -> Vec<(&'static str, &'static str)> {
        Key::ALL
            .iter()
            .map(|&k| (k.name(), self.translate(k, locale)))
            .collect()
    }
}

/// Rejects tables that miss a key, carry an unknown key, repeat a key, or map
/// a key to an empty string.
fn validate_table(
    locale: Locale,
    raw: &[(&'static str, &'static str)],
) -> Result<HashMap<Key, &'static str>> {
    let mut table = HashMap::with_capacity(raw.len());
    for &(name, text) in raw {
        let key: Key = name
            .parse()
            .map_err(|_| AppError::Translation(format!("{locale}: unknown key '{name}'")))?;
        if text.trim().is_empty() {
            return Err(AppError::Translation(format!("{locale}: empty text for '{name}'")));
        }
        if table.insert(key, text).is_some() {
            return Err(AppError::Translation(format!("{locale}: duplicate key '{name}'")));
        }
    }

    let missing: Vec<&str> = Key::ALL
        .iter()
        .filter(|k| !table.contains_key(*k))
        .map(|k| k.name())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::Translation(format!(
            "{locale}: missing keys {}",
            missing.join(", ")
        )));
    }

    Ok(table)
}
