//! Outside intel: the weather outlook (Open-Meteo) and the news wire
//! (Hacker News). Neither needs an API key.

use std::time::Duration;

use anyhow::{Context, anyhow};
use serde::Deserialize;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;

pub const WEATHER_UNAVAILABLE: &str = "Data Unavailable";
pub const SIGNAL_LOST: &str = "SIGNAL LOST";
pub const ROTATE_EVERY: Duration = Duration::from_secs(5);
pub const REFRESH_EVERY: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_STORY_COUNT: usize = 10;

fn http_client(purpose: &str) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .build()
        .with_context(|| format!("failed building HTTP client for {purpose}"))
}

/// Rounds half up, the way the outlook display always has.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// WMO weather code to the outlook caption.
pub fn weather_text(code: u16) -> &'static str {
    match code {
        0 => "Clear Sky",
        1..=3 => "Cloudy",
        4..=67 => "Rainy",
        68..=77 => "Snow",
        95.. => "Storm",
        _ => "Overcast",
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// `weather.latitude` / `weather.longitude`; `None` unless both are set.
    pub fn from_config(cfg: &Config) -> anyhow::Result<Option<Self>> {
        let latitude = cfg.get_f64("weather.latitude")?;
        let longitude = cfg.get_f64("weather.longitude")?;
        Ok(latitude
            .zip(longitude)
            .map(|(latitude, longitude)| Self {
                latitude,
                longitude,
            }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherReport {
    pub temperature: i64,
    pub condition: u16,
    pub wind: i64,
}

impl WeatherReport {
    pub fn caption(&self) -> &'static str {
        weather_text(self.condition)
    }
}

#[derive(Debug, Deserialize)]
struct ForecastBody {
    current_weather: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
    weathercode: u16,
    windspeed: f64,
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    endpoint: String,
}

impl WeatherClient {
    pub fn new(endpoint: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client("weather")?,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let endpoint = cfg
            .get("weather.endpoint")
            .ok_or_else(|| anyhow!("weather.endpoint is not configured"))?;
        Self::new(&endpoint)
    }

    #[instrument(skip(self))]
    pub async fn current(&self, at: Coordinates) -> anyhow::Result<WeatherReport> {
        let url = format!(
            "{}?latitude={}&longitude={}&current_weather=true",
            self.endpoint, at.latitude, at.longitude
        );
        debug!(url = %url, "requesting forecast");

        let body: ForecastBody = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed requesting {url}"))?
            .error_for_status()?
            .json()
            .await
            .context("failed decoding forecast")?;

        let now = body.current_weather;
        Ok(WeatherReport {
            temperature: round_half_up(now.temperature),
            condition: now.weathercode,
            wind: round_half_up(now.windspeed),
        })
    }

    /// Like [`WeatherClient::current`] but collapses failures into the
    /// placeholder text.
    pub async fn outlook(&self, at: Coordinates) -> Result<WeatherReport, &'static str> {
        self.current(at).await.map_err(|err| {
            warn!(error = %format!("{err:#}"), "weather lookup failed");
            WEATHER_UNAVAILABLE
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Story {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    pub url: Option<String>,
    #[serde(default)]
    pub score: u64,
    #[serde(default)]
    pub by: String,
    #[serde(default)]
    pub time: i64,
}

#[derive(Debug, Clone)]
pub struct NewsClient {
    client: reqwest::Client,
    endpoint: String,
    count: usize,
}

impl NewsClient {
    pub fn new(endpoint: &str, count: usize) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client("news")?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            count,
        })
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let endpoint = cfg
            .get("news.endpoint")
            .ok_or_else(|| anyhow!("news.endpoint is not configured"))?;
        let count = cfg
            .get_u64("news.count")?
            .map(usize::try_from)
            .transpose()
            .context("news.count is out of range")?
            .unwrap_or(DEFAULT_STORY_COUNT);
        Self::new(&endpoint, count)
    }

    /// The first `count` top stories, in ranking order. Items the wire
    /// reports as null are skipped.
    #[instrument(skip(self), fields(count = self.count))]
    pub async fn top_stories(&self) -> anyhow::Result<Vec<Story>> {
        let url = format!("{}/topstories.json", self.endpoint);
        let ids: Vec<u64> = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed requesting {url}"))?
            .error_for_status()?
            .json()
            .await
            .context("failed decoding top story ids")?;

        let mut set = JoinSet::new();
        for (rank, id) in ids.into_iter().take(self.count).enumerate() {
            let client = self.client.clone();
            let url = format!("{}/item/{id}.json", self.endpoint);
            set.spawn(async move { (rank, fetch_item(&client, &url).await) });
        }

        let mut ranked = Vec::new();
        while let Some(joined) = set.join_next().await {
            let (rank, item) = joined.context("story fetch task failed")?;
            if let Some(story) = item? {
                ranked.push((rank, story));
            }
        }
        ranked.sort_by_key(|(rank, _)| *rank);

        info!(stories = ranked.len(), "news wire refreshed");
        Ok(ranked.into_iter().map(|(_, story)| story).collect())
    }
}

async fn fetch_item(client: &reqwest::Client, url: &str) -> anyhow::Result<Option<Story>> {
    client
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed requesting {url}"))?
        .error_for_status()?
        .json()
        .await
        .with_context(|| format!("failed decoding {url}"))
}

/// Rotating headline display for the news wire.
#[derive(Debug, Clone, Default)]
pub struct NewsTicker {
    stories: Vec<Story>,
    index: usize,
    lost: bool,
}

impl NewsTicker {
    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn is_lost(&self) -> bool {
        self.lost
    }

    /// Takes the outcome of a refresh. A failure raises the lost-signal flag
    /// and keeps the previous stories.
    pub fn refresh(&mut self, outcome: anyhow::Result<Vec<Story>>) {
        match outcome {
            Ok(stories) => {
                self.stories = stories;
                self.index = 0;
                self.lost = false;
            }
            Err(err) => {
                error!(error = %format!("{err:#}"), "comms jammed");
                self.lost = true;
            }
        }
    }

    pub fn current(&self) -> Option<&Story> {
        self.stories.get(self.index)
    }

    pub fn rotate(&mut self) -> Option<&Story> {
        if self.stories.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.stories.len();
        self.current()
    }

    pub fn headline(&self) -> &str {
        if self.lost {
            return SIGNAL_LOST;
        }
        self.current().map_or("", |story| story.title.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(id: u64, title: &str) -> Story {
        Story {
            id,
            title: title.to_string(),
            url: None,
            score: 0,
            by: String::new(),
            time: 0,
        }
    }

    #[test]
    fn wmo_codes_map_to_captions() {
        assert_eq!(weather_text(0), "Clear Sky");
        assert_eq!(weather_text(2), "Cloudy");
        assert_eq!(weather_text(61), "Rainy");
        assert_eq!(weather_text(75), "Snow");
        assert_eq!(weather_text(82), "Overcast");
        assert_eq!(weather_text(99), "Storm");
    }

    #[test]
    fn rounding_matches_display() {
        assert_eq!(round_half_up(12.5), 13);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(7.49), 7);
    }

    #[test]
    fn coordinates_need_both_halves() {
        let mut cfg = Config::default();
        cfg.set("weather.latitude", "40.7");
        assert_eq!(Coordinates::from_config(&cfg).expect("parse"), None);
        cfg.set("weather.longitude", "-74");
        assert_eq!(
            Coordinates::from_config(&cfg).expect("parse"),
            Some(Coordinates {
                latitude: 40.7,
                longitude: -74.0
            })
        );
    }

    #[test]
    fn ticker_rotates_and_signals_loss() {
        let mut ticker = NewsTicker::default();
        assert_eq!(ticker.rotate(), None);

        ticker.refresh(Ok(vec![story(1, "one"), story(2, "two")]));
        assert_eq!(ticker.headline(), "one");
        assert_eq!(ticker.rotate().map(|s| s.id), Some(2));
        assert_eq!(ticker.rotate().map(|s| s.id), Some(1));

        ticker.refresh(Err(anyhow!("timeout")));
        assert_eq!(ticker.headline(), SIGNAL_LOST);
        assert_eq!(ticker.stories().len(), 2);
    }
}
