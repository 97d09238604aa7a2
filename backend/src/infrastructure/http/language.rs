use crate::application::services::LanguageConfig;
use crate::domain::value_objects::LanguageCode;

/// Pick the request language from an `Accept-Language` header.
///
/// Entries are tried by descending quality. A regional tag such as `nl-BE`
/// also matches a configured `nl`. Without a usable entry the site's default
/// language is returned.
pub fn negotiate_language(accept_language: Option<&str>, languages: &LanguageConfig) -> LanguageCode {
    let default_language = languages.default_language();
    if !languages.multilingual {
        return default_language.clone();
    }
    let header = match accept_language {
        Some(header) if !header.trim().is_empty() => header,
        _ => return default_language.clone(),
    };

    let mut entries: Vec<(LanguageCode, f64)> = Vec::new();
    for part in header.split(',') {
        let mut segments = part.split(';');
        let tag = segments.next().unwrap_or("").trim();
        if tag.is_empty() || tag == "*" {
            continue;
        }

        let mut quality = 1.0_f64;
        for segment in segments {
            if let Some(value) = segment.trim().strip_prefix("q=") {
                if let Ok(value) = value.parse::<f64>() {
                    quality = value;
                }
            }
        }
        if quality <= 0.0 {
            continue;
        }
        if let Ok(code) = LanguageCode::new(tag) {
            entries.push((code, quality));
        }
    }

    // Stable sort keeps header order between equal weights
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    for (code, _) in &entries {
        if let Some(found) = configured(languages, code.as_str()) {
            return found;
        }
        if let Some(found) = configured(languages, code.primary()) {
            return found;
        }
    }

    default_language.clone()
}

fn configured(languages: &LanguageConfig, tag: &str) -> Option<LanguageCode> {
    if languages.languages.is_empty() {
        return (languages.default_language().as_str() == tag)
            .then(|| languages.default_language().clone());
    }
    languages
        .languages
        .iter()
        .map(|settings| &settings.code)
        .find(|code| code.as_str() == tag)
        .cloned()
}
