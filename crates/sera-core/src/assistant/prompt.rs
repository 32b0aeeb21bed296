//! System instruction builder.
//!
//! The instruction is the persona/style text followed by a "current time"
//! line. The timestamp is computed on every render in a fixed named
//! timezone and formatted with localized day and month names.

use chrono::{DateTime, Locale, Utc};
use chrono_tz::Tz;

use sera_types::config::PersonaConfig;

/// Day-name, date, month-name, year, and clock time.
const TIMESTAMP_FORMAT: &str = "%A, %d %B %Y, %H:%M:%S";

/// Errors building a [`SystemPrompt`] from configuration.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("invalid timezone '{name}': {reason}")]
    InvalidTimezone { name: String, reason: String },

    #[error("unknown locale '{0}'")]
    InvalidLocale(String),
}

/// Persona text used when none is configured.
pub fn default_persona(name: &str) -> String {
    format!(
        "**Keep answers VERY short, clear, and engaging.**\n\
         \n\
         Use Markdown where it helps.\n\
         \n\
         Your name is {name}. You are a friendly, professional AI assistant. \
         You answer visitors' questions and take messages for the site owner.\n\
         \n\
         **Answer style:**\n\
         *   **Professional and friendly:** polite and enthusiastic.\n\
         *   **Short and to the point:** three to four sentences at most.\n\
         *   **Engaging:** use **bold** for the key facts.\n\
         *   **Always smiling:** end every answer with an emoji (😊, 😄, 👍).\n\
         \n\
         If a question is outside your scope, say so politely."
    )
}

/// Renders the system instruction sent with every upstream request.
#[derive(Debug, Clone)]
pub struct SystemPrompt {
    persona: String,
    timezone: Tz,
    timezone_label: String,
    locale: Locale,
}

impl SystemPrompt {
    /// Build from persona settings. `persona` is the resolved persona text.
    pub fn new(persona: String, config: &PersonaConfig) -> Result<Self, PromptError> {
        let timezone = config
            .timezone
            .parse::<Tz>()
            .map_err(|e| PromptError::InvalidTimezone {
                name: config.timezone.clone(),
                reason: e.to_string(),
            })?;
        let locale = Locale::try_from(config.locale.as_str())
            .map_err(|_| PromptError::InvalidLocale(config.locale.clone()))?;

        Ok(Self {
            persona,
            timezone,
            timezone_label: config.timezone_label.clone(),
            locale,
        })
    }

    /// Human-readable local time for `now`, e.g. `Friday, 16 October 2026, 14:05:09 WIB`.
    pub fn format_timestamp(&self, now: DateTime<Utc>) -> String {
        let local = now.with_timezone(&self.timezone);
        let formatted = local.format_localized(TIMESTAMP_FORMAT, self.locale).to_string();
        if self.timezone_label.is_empty() {
            formatted
        } else {
            format!("{formatted} {}", self.timezone_label)
        }
    }

    /// The full instruction as of `now`.
    pub fn render_at(&self, now: DateTime<Utc>) -> String {
        format!(
            "{}\n\nCurrent time: {}.\n",
            self.persona.trim_end(),
            self.format_timestamp(now)
        )
    }

    /// The full instruction as of the current instant.
    pub fn render(&self) -> String {
        self.render_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 7, 5, 9).unwrap()
    }

    fn persona_config(locale: &str) -> PersonaConfig {
        PersonaConfig {
            locale: locale.to_string(),
            ..PersonaConfig::default()
        }
    }

    #[test]
    fn test_timestamp_in_named_zone() {
        let prompt = SystemPrompt::new("persona".to_string(), &persona_config("en_US")).unwrap();
        // 07:05 UTC is 14:05 in Jakarta (UTC+7)
        assert_eq!(
            prompt.format_timestamp(fixed_now()),
            "Friday, 16 October 2026, 14:05:09 WIB"
        );
    }

    #[test]
    fn test_timestamp_localized_names() {
        let prompt = SystemPrompt::new("persona".to_string(), &persona_config("id_ID")).unwrap();
        let stamp = prompt.format_timestamp(fixed_now());
        assert!(stamp.contains("Oktober"), "got {stamp}");
        assert!(stamp.ends_with("14:05:09 WIB"), "got {stamp}");
    }

    #[test]
    fn test_render_contains_persona_and_time() {
        let prompt =
            SystemPrompt::new(default_persona("Sera"), &persona_config("en_US")).unwrap();
        let text = prompt.render_at(fixed_now());
        assert!(text.contains("Your name is Sera"));
        assert!(text.contains("Current time: Friday, 16 October 2026, 14:05:09 WIB."));
    }

    #[test]
    fn test_render_is_computed_per_call() {
        let prompt = SystemPrompt::new("p".to_string(), &persona_config("en_US")).unwrap();
        let earlier = prompt.render_at(fixed_now());
        let later = prompt.render_at(fixed_now() + chrono::Duration::seconds(61));
        assert_ne!(earlier, later);
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        let config = PersonaConfig {
            timezone: "Mars/Olympus".to_string(),
            ..PersonaConfig::default()
        };
        let err = SystemPrompt::new("p".to_string(), &config).unwrap_err();
        assert!(matches!(err, PromptError::InvalidTimezone { .. }));
    }

    #[test]
    fn test_invalid_locale_rejected() {
        let err = SystemPrompt::new("p".to_string(), &persona_config("xx_NOPE")).unwrap_err();
        assert!(matches!(err, PromptError::InvalidLocale(_)));
    }

    #[test]
    fn test_empty_label_omitted() {
        let config = PersonaConfig {
            timezone: "UTC".to_string(),
            timezone_label: String::new(),
            locale: "en_US".to_string(),
            ..PersonaConfig::default()
        };
        let prompt = SystemPrompt::new("p".to_string(), &config).unwrap();
        assert_eq!(prompt.format_timestamp(fixed_now()), "Friday, 16 October 2026, 07:05:09");
    }
}
