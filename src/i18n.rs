use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, RwLock};

const DEFAULT_LOCALE: &str = "en";

const EN: &[(&str, &str)] = &[
    ("validation.required", "Required"),
    (
        "validation.invalid_type",
        "Expected {expected}, received {received}",
    ),
    (
        "validation.too_small.string",
        "String must contain at least {min} character(s)",
    ),
    (
        "validation.too_big.string",
        "String must contain at most {max} character(s)",
    ),
    (
        "validation.too_small.number",
        "Number must be greater than or equal to {min}",
    ),
    (
        "validation.too_big.number",
        "Number must be less than or equal to {max}",
    ),
    ("validation.not_integer", "Expected integer, received float"),
    (
        "validation.invalid_enum",
        "Invalid enum value. Expected {options}, received '{received}'",
    ),
    (
        "validation.invalid_literal",
        "Invalid option. Expected {options}, received '{received}'",
    ),
];

const ZH_CN: &[(&str, &str)] = &[
    ("validation.required", "必填"),
    ("validation.invalid_type", "应为 {expected}，实际为 {received}"),
    ("validation.too_small.string", "至少需要 {min} 个字符"),
    ("validation.too_big.string", "最多允许 {max} 个字符"),
    ("validation.too_small.number", "数值必须大于或等于 {min}"),
    ("validation.too_big.number", "数值必须小于或等于 {max}"),
    ("validation.not_integer", "应为整数，实际为小数"),
    (
        "validation.invalid_enum",
        "无效的选项，应为 {options}，实际为 '{received}'",
    ),
    (
        "validation.invalid_literal",
        "无效的选项，应为 {options}，实际为 '{received}'",
    ),
];

const LOCALES: &[(&str, &[(&str, &str)])] = &[("en", EN), ("zh-CN", ZH_CN)];

#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub enum Locale {
    #[default]
    System,
    Tag(String),
}

impl From<String> for Locale {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("system") {
            return Self::System;
        }
        Self::Tag(value.trim().to_string())
    }
}

impl From<&str> for Locale {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

/// Message catalog used by the built-in schema nodes for their default
/// validation messages.
#[derive(Clone)]
pub struct I18nManager {
    catalog: Arc<I18nCatalog>,
    locale: Arc<RwLock<Locale>>,
}

impl Default for I18nManager {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nManager {
    pub fn new() -> Self {
        Self {
            catalog: Arc::new(I18nCatalog::load()),
            locale: Arc::new(RwLock::new(Locale::System)),
        }
    }

    /// Process-wide manager consulted by schema nodes that were not given
    /// their own.
    pub fn global() -> &'static I18nManager {
        static GLOBAL: OnceLock<I18nManager> = OnceLock::new();
        GLOBAL.get_or_init(I18nManager::new)
    }

    pub fn locale(&self) -> Locale {
        match self.locale.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_locale(&self, locale: impl Into<Locale>) {
        let mut guard = match self.locale.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = locale.into();
    }

    pub fn default_locale(&self) -> &'static str {
        self.catalog.default_locale
    }

    pub fn resolved_locale(&self) -> &'static str {
        self.catalog
            .resolve_locale(self.requested_locale().as_deref())
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    pub fn t(&self, key: &str) -> String {
        self.lookup(key).unwrap_or(key).to_string()
    }

    pub fn t_with(&self, key: &str, params: &[(&str, &str)]) -> String {
        let raw = self.lookup(key).unwrap_or(key);
        if params.is_empty() {
            return raw.to_string();
        }
        format_template(raw, params)
    }

    fn requested_locale(&self) -> Option<String> {
        match self.locale() {
            Locale::System => system_locale(),
            Locale::Tag(tag) => Some(tag),
        }
    }

    fn lookup(&self, key: &str) -> Option<&'static str> {
        let resolved = self.resolved_locale();
        self.catalog
            .lookup(resolved, key)
            .or_else(|| self.catalog.lookup(self.catalog.default_locale, key))
    }
}

#[cfg(feature = "i18n")]
fn system_locale() -> Option<String> {
    sys_locale::get_locale()
}

#[cfg(not(feature = "i18n"))]
fn system_locale() -> Option<String> {
    None
}

struct I18nCatalog {
    default_locale: &'static str,
    locales: HashMap<&'static str, HashMap<&'static str, &'static str>>,
    normalized_locale_lookup: HashMap<String, &'static str>,
    language_lookup: HashMap<String, &'static str>,
}

impl I18nCatalog {
    fn load() -> Self {
        let mut locales = HashMap::new();
        let mut normalized_locale_lookup = HashMap::new();
        let mut language_lookup = HashMap::new();
        let mut ambiguous_languages = HashSet::new();

        for (locale, entries) in LOCALES.iter().copied() {
            let normalized = normalize_locale_tag(locale);
            normalized_locale_lookup.insert(normalized.clone(), locale);

            let language = normalized.split('-').next().unwrap_or_default().to_string();
            match language_lookup.get(&language) {
                Some(existing) if *existing != locale => {
                    ambiguous_languages.insert(language);
                }
                Some(_) => {}
                None => {
                    language_lookup.insert(language, locale);
                }
            }

            locales.insert(locale, entries.iter().copied().collect::<HashMap<_, _>>());
        }

        for language in ambiguous_languages {
            language_lookup.remove(&language);
        }

        Self {
            default_locale: DEFAULT_LOCALE,
            locales,
            normalized_locale_lookup,
            language_lookup,
        }
    }

    fn resolve_locale(&self, requested: Option<&str>) -> &'static str {
        let Some(requested) = requested else {
            return self.default_locale;
        };

        let normalized = normalize_locale_tag(requested);
        if let Some(locale) = self.normalized_locale_lookup.get(&normalized) {
            return locale;
        }

        let language = normalized.split('-').next().unwrap_or_default();
        if let Some(locale) = self.language_lookup.get(language) {
            return locale;
        }

        self.default_locale
    }

    fn lookup(&self, locale: &'static str, key: &str) -> Option<&'static str> {
        self.locales
            .get(locale)
            .and_then(|entries| entries.get(key).copied())
    }
}

fn normalize_locale_tag(tag: &str) -> String {
    let trimmed = tag.trim();
    let without_encoding = trimmed.split('.').next().unwrap_or(trimmed);
    let without_variant = without_encoding
        .split('@')
        .next()
        .unwrap_or(without_encoding);
    without_variant
        .replace('_', "-")
        .split('-')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

fn format_template(template: &str, params: &[(&str, &str)]) -> String {
    let values = params.iter().copied().collect::<HashMap<&str, &str>>();
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('}') else {
            output.push_str(&rest[open..]);
            return output;
        };
        let token = &after_open[..close];
        match values.get(token) {
            Some(value) => output.push_str(value),
            None => output.push_str(&rest[open..open + close + 2]),
        }
        rest = &after_open[close + 1..];
    }

    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::I18nManager;

    #[test]
    fn missing_translation_shows_key() {
        let i18n = I18nManager::new();
        i18n.set_locale("zh-CN");
        assert_eq!(i18n.t("validation.unknown"), "validation.unknown");
    }

    #[test]
    fn supports_locale_tag_normalization() {
        let i18n = I18nManager::new();
        i18n.set_locale("zh_CN.UTF-8");
        assert_eq!(i18n.resolved_locale(), "zh-CN");
        assert_eq!(i18n.t("validation.required"), "必填");
    }

    #[test]
    fn unknown_locale_falls_back_to_english() {
        let i18n = I18nManager::new();
        i18n.set_locale("fr-FR");
        assert_eq!(i18n.resolved_locale(), "en");
        assert_eq!(i18n.t("validation.required"), "Required");
    }

    #[test]
    fn supports_placeholder_interpolation() {
        let i18n = I18nManager::new();
        i18n.set_locale("en-US");
        assert_eq!(
            i18n.t_with("validation.too_small.string", &[("min", "3")]),
            "String must contain at least 3 character(s)"
        );
        assert_eq!(
            i18n.t_with("validation.invalid_type", &[("expected", "number")]),
            "Expected number, received {received}"
        );
    }
}
