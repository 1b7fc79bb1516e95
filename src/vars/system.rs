//! `$system:*` facts: date, time, timezone and locale of the machine
//! processing the page.

use super::ConfigMap;
use crate::config::FactsSection;
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::LazyLock;

/// Locale used when neither the config nor the environment provides one.
const FALLBACK_LOCALE: &str = "en-US";

/// Timezone used when none can be detected.
const FALLBACK_TIMEZONE: Tz = Tz::UTC;

/// A BCP 47 language tag split into the subtags the facts expose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub language: String,
    pub script: Option<String>,
    /// Region subtag: ISO 3166 alpha-2 (`US`) or UN M.49 numeric (`419`)
    pub region: Option<String>,
    pub variant: Option<String>,
}

impl Locale {
    /// Parse a tag such as `en-US`, `zh-Hans-CN`, `de-DE-1996` or a POSIX
    /// locale such as `en_US.UTF-8`.
    pub fn parse(tag: &str) -> Option<Self> {
        static RE_BCP47: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(
                r"^(?P<lang>[A-Za-z]{2,8})(?:-(?P<script>[A-Za-z]{4}))?(?:-(?P<region>[A-Za-z]{2}|[0-9]{3}))?(?:-(?P<variant>[A-Za-z0-9]+(?:-[A-Za-z0-9]+)*))?$",
            )
            .unwrap()
        });

        // POSIX: strip `.codeset` and `@modifier`, `_` becomes `-`
        let tag = tag.split(['.', '@']).next().unwrap_or_default();
        let tag = tag.trim().replace('_', "-");
        let caps = RE_BCP47.captures(&tag)?;

        Some(Self {
            language: caps["lang"].to_ascii_lowercase(),
            script: caps.name("script").map(|m| titlecase(m.as_str())),
            region: caps.name("region").map(|m| m.as_str().to_ascii_uppercase()),
            variant: caps.name("variant").map(|m| m.as_str().to_owned()),
        })
    }

    /// Country code, when the region subtag is an alpha-2 code.
    pub fn country(&self) -> Option<&str> {
        self.region
            .as_deref()
            .filter(|r| r.bytes().all(|b| b.is_ascii_alphabetic()))
    }

    /// Canonical tag, e.g. `zh-Hans-CN`.
    pub fn tag(&self) -> String {
        [
            Some(self.language.as_str()),
            self.script.as_deref(),
            self.region.as_deref(),
            self.variant.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("-")
    }

    /// Time-of-day format matching the locale's clock convention.
    fn time_format(&self) -> &'static str {
        match (self.language.as_str(), self.country()) {
            ("en", Some("US" | "CA" | "AU" | "NZ" | "PH")) | ("en", None) => "%-I:%M:%S %p",
            _ => "%H:%M:%S",
        }
    }
}

fn titlecase(s: &str) -> String {
    let lower = s.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Timezone and locale of the processing environment.
#[derive(Debug, Clone)]
pub struct SystemInfo {
    /// Zone the clock is read in and reported as `$system:timezone`
    pub timezone: Tz,
    pub locale: Locale,
}

impl SystemInfo {
    /// Resolve from config overrides, falling back to the environment.
    pub fn detect(facts: &FactsSection) -> Self {
        let locale = facts
            .locale
            .as_deref()
            .and_then(Locale::parse)
            .or_else(|| sys_locale::get_locale().as_deref().and_then(Locale::parse))
            .or_else(|| Locale::parse(FALLBACK_LOCALE))
            .unwrap_or(Locale {
                language: "en".into(),
                script: None,
                region: Some("US".into()),
                variant: None,
            });

        let timezone = facts
            .timezone
            .as_deref()
            .and_then(|name| name.parse().ok())
            .or_else(detect_timezone)
            .unwrap_or(FALLBACK_TIMEZONE);

        Self { timezone, locale }
    }

    /// Current wall-clock time in [`SystemInfo::timezone`].
    pub fn now(&self) -> NaiveDateTime {
        self.local_time(Utc::now())
    }

    /// `instant` as wall-clock time in [`SystemInfo::timezone`].
    pub fn local_time(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.timezone).naive_local()
    }
}

/// Local timezone of the machine, if it has an IANA name.
fn detect_timezone() -> Option<Tz> {
    iana_time_zone::get_timezone().ok()?.parse().ok()
}

/// `$system:*` entries for one clock reading.
pub fn system_facts(now: NaiveDateTime, info: &SystemInfo) -> ConfigMap {
    let locale = &info.locale;
    let millis = (now.nanosecond() / 1_000_000).min(999);

    let mut facts = ConfigMap::new();
    facts.insert("$system:date", now.format("%Y-%m-%d").to_string());
    facts.insert(
        "$system:time",
        now.format(locale.time_format()).to_string(),
    );
    facts.insert("$system:timezone", info.timezone.name());
    facts.insert("$system:locale", locale.tag());
    facts.insert("$system:language", locale.language.as_str());
    if let Some(country) = locale.country() {
        facts.insert("$system:country", country);
    }
    if let Some(region) = &locale.region {
        facts.insert("$system:region", region.as_str());
    }
    if let Some(variant) = &locale.variant {
        facts.insert("$system:variant", variant.as_str());
    }
    facts.insert("$system:year", now.year().to_string());
    facts.insert("$system:month", now.month().to_string());
    facts.insert("$system:day", now.day().to_string());
    facts.insert("$system:hour", now.hour().to_string());
    facts.insert("$system:minute", now.minute().to_string());
    facts.insert("$system:second", now.second().to_string());
    facts.insert("$system:millisecond", millis.to_string());
    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn at(h: u32, m: u32, s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 7)
            .unwrap()
            .and_hms_milli_opt(h, m, s, ms)
            .unwrap()
    }

    fn info(tag: &str) -> SystemInfo {
        SystemInfo {
            timezone: chrono_tz::Europe::Berlin,
            locale: Locale::parse(tag).unwrap(),
        }
    }

    #[test]
    fn test_parse_simple_tag() {
        let locale = Locale::parse("en-US").unwrap();
        assert_eq!(locale.language, "en");
        assert_eq!(locale.region.as_deref(), Some("US"));
        assert_eq!(locale.country(), Some("US"));
        assert_eq!(locale.tag(), "en-US");
    }

    #[test]
    fn test_parse_posix_locale() {
        let locale = Locale::parse("de_DE.UTF-8").unwrap();
        assert_eq!(locale.tag(), "de-DE");

        let locale = Locale::parse("fr_FR@euro").unwrap();
        assert_eq!(locale.tag(), "fr-FR");
    }

    #[test]
    fn test_parse_script_region_variant() {
        let locale = Locale::parse("zh-hans-cn").unwrap();
        assert_eq!(locale.script.as_deref(), Some("Hans"));
        assert_eq!(locale.tag(), "zh-Hans-CN");

        let locale = Locale::parse("de-DE-1996").unwrap();
        assert_eq!(locale.variant.as_deref(), Some("1996"));
    }

    #[test]
    fn test_numeric_region_is_not_a_country() {
        let locale = Locale::parse("es-419").unwrap();
        assert_eq!(locale.region.as_deref(), Some("419"));
        assert_eq!(locale.country(), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Locale::parse("").is_none());
        assert!(Locale::parse("C").is_none());
        assert!(Locale::parse("en US").is_none());
    }

    #[test]
    fn test_detect_ignores_unknown_timezone() {
        let facts = FactsSection {
            timezone: Some("Mars/Olympus".into()),
            ..FactsSection::default()
        };
        let info = SystemInfo::detect(&facts);
        assert_ne!(info.timezone.name(), "Mars/Olympus");
    }

    #[test]
    fn test_detect_prefers_config() {
        let facts = FactsSection {
            timezone: Some("Asia/Tokyo".into()),
            locale: Some("ja-JP".into()),
            ..FactsSection::default()
        };
        let info = SystemInfo::detect(&facts);
        assert_eq!(info.timezone, chrono_tz::Asia::Tokyo);
        assert_eq!(info.locale.tag(), "ja-JP");
    }

    #[test]
    fn test_clock_follows_configured_timezone() {
        let facts = FactsSection {
            timezone: Some("Asia/Tokyo".into()),
            locale: Some("ja-JP".into()),
            ..FactsSection::default()
        };
        let info = SystemInfo::detect(&facts);
        let instant = Utc.with_ymd_and_hms(2026, 10, 16, 20, 30, 0).unwrap();

        let facts = system_facts(info.local_time(instant), &info);
        assert_eq!(facts.get("$system:timezone"), Some("Asia/Tokyo"));
        assert_eq!(facts.get("$system:date"), Some("2026-10-17"));
        assert_eq!(facts.get("$system:day"), Some("17"));
        assert_eq!(facts.get("$system:hour"), Some("5"));
        assert_eq!(facts.get("$system:time"), Some("05:30:00"));
    }

    #[test]
    fn test_system_facts_components() {
        let facts = system_facts(at(14, 5, 9, 42), &info("de-DE"));

        assert_eq!(facts.get("$system:date"), Some("2026-03-07"));
        assert_eq!(facts.get("$system:time"), Some("14:05:09"));
        assert_eq!(facts.get("$system:timezone"), Some("Europe/Berlin"));
        assert_eq!(facts.get("$system:locale"), Some("de-DE"));
        assert_eq!(facts.get("$system:language"), Some("de"));
        assert_eq!(facts.get("$system:country"), Some("DE"));
        assert_eq!(facts.get("$system:region"), Some("DE"));
        assert_eq!(facts.get("$system:year"), Some("2026"));
        assert_eq!(facts.get("$system:month"), Some("3"));
        assert_eq!(facts.get("$system:day"), Some("7"));
        assert_eq!(facts.get("$system:hour"), Some("14"));
        assert_eq!(facts.get("$system:minute"), Some("5"));
        assert_eq!(facts.get("$system:second"), Some("9"));
        assert_eq!(facts.get("$system:millisecond"), Some("42"));
    }

    #[test]
    fn test_us_time_uses_twelve_hour_clock() {
        let facts = system_facts(at(15, 4, 5, 0), &info("en-US"));
        assert_eq!(facts.get("$system:time"), Some("3:04:05 PM"));
    }

    #[test]
    fn test_missing_subtags_are_absent() {
        let facts = system_facts(at(0, 0, 0, 0), &info("fr"));
        assert_eq!(facts.get("$system:language"), Some("fr"));
        assert!(!facts.contains_key("$system:country"));
        assert!(!facts.contains_key("$system:region"));
        assert!(!facts.contains_key("$system:variant"));
    }
}
