use serde::Serialize;

use crate::domain::{Instrument, date_for_day, days_in_year};
use crate::error::OzoneError;
use crate::registry::{self, DEFAULT_SERVER_URL};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateUrl {
    pub instrument: Instrument,
    pub year: i32,
    pub day_of_year: u32,
    pub url: String,
}

impl AsRef<str> for CandidateUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Clone)]
pub struct UrlBuilder {
    server_url: String,
}

impl Default for UrlBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

impl UrlBuilder {
    pub fn new(server_url: &str) -> Self {
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    /// Directory holding one instrument's files for one year.
    pub fn year_url(&self, instrument: Instrument, year: i32) -> String {
        format!(
            "{}{}{year}/",
            self.server_url,
            registry::lookup(instrument).base_path
        )
    }

    /// One URL per day from day 1 through `through_day`, in day order.
    pub fn build_daily_urls(
        &self,
        instrument: Instrument,
        year: i32,
        through_day: u32,
    ) -> Result<Vec<CandidateUrl>, OzoneError> {
        if through_day == 0 || through_day > days_in_year(year) {
            return Err(OzoneError::InvalidDayOfYear {
                year,
                day: through_day,
            });
        }

        let base = self.year_url(instrument, year);
        (1..=through_day)
            .map(|day_of_year| {
                let date = date_for_day(year, day_of_year).ok_or(OzoneError::InvalidDayOfYear {
                    year,
                    day: day_of_year,
                })?;
                Ok(CandidateUrl {
                    instrument,
                    year,
                    day_of_year,
                    url: format!("{base}{}", registry::daily_file_name(instrument, date)),
                })
            })
            .collect()
    }
}
