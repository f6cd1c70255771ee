use anyhow::anyhow;
use chrono::{
  DateTime,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;

pub const TIMEZONE_ENV_VAR: &str =
  "FITDO_TIMEZONE";
pub const DEFAULT_TIMEZONE: &str =
  "UTC";

/// Picks the timezone that decides
/// where one day ends and the next
/// begins. `FITDO_TIMEZONE` beats the
/// config value, which beats UTC.
#[tracing::instrument]
pub fn resolve_timezone(
  configured: Option<&str>
) -> anyhow::Result<Tz> {
  let from_env =
    std::env::var(TIMEZONE_ENV_VAR)
      .ok();
  resolve_timezone_from(
    from_env.as_deref(),
    configured
  )
}

pub fn resolve_timezone_from(
  from_env: Option<&str>,
  configured: Option<&str>
) -> anyhow::Result<Tz> {
  let candidates = [
    (from_env, TIMEZONE_ENV_VAR),
    (configured, "config:timezone")
  ];

  for (raw, source) in candidates {
    let Some(raw) = raw else {
      continue;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      tracing::warn!(
        source,
        "timezone source was empty"
      );
      continue;
    }
    return parse_timezone(
      trimmed, source
    );
  }

  parse_timezone(
    DEFAULT_TIMEZONE,
    "default"
  )
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> anyhow::Result<Tz> {
  match raw.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        source,
        timezone = %raw,
        "resolved timezone"
      );
      Ok(tz)
    }
    | Err(err) => {
      Err(anyhow!(
        "invalid timezone '{raw}' \
         from {source}: {err}"
      ))
    }
  }
}

#[must_use]
pub fn today_in(
  tz: &Tz,
  now: DateTime<Utc>
) -> NaiveDate {
  now.with_timezone(tz).date_naive()
}

/// Header line shown above the list,
/// e.g. `Sunday, Oct 18`.
#[must_use]
pub fn format_header(
  date: NaiveDate
) -> String {
  date.format("%A, %b %-d").to_string()
}
