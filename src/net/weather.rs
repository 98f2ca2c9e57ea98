/// Weather widget backend: Open-Meteo current conditions.
///
/// One GET per refresh, no API key. The numeric WMO condition code maps to a
/// short phrase through a fixed table; unknown codes render as "Unknown".

use serde::{Deserialize, Serialize};

use crate::state::settings::SettingsStore;

pub const WEATHER_LOCATION_KEY: &str = "weatherLocation";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherLocation {
    pub lat: f64,
    pub lon: f64,
}

impl WeatherLocation {
    /// Validate user-entered coordinates.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
            Some(Self { lat, lon })
        } else {
            None
        }
    }

    pub fn parse(lat: &str, lon: &str) -> Option<Self> {
        Self::new(lat.trim().parse().ok()?, lon.trim().parse().ok()?)
    }

    pub fn load(settings: &SettingsStore) -> Option<Self> {
        settings.get(WEATHER_LOCATION_KEY)
    }

    pub fn save(&self, settings: &mut SettingsStore) {
        settings.set(WEATHER_LOCATION_KEY, self);
    }
}

/// Current conditions as the widget shows them.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub temperature_c: f64,
    pub windspeed_kmh: f64,
    pub wind_direction_deg: f64,
    pub condition_code: u32,
}

impl WeatherReport {
    pub fn condition(&self) -> &'static str {
        condition_phrase(self.condition_code)
    }

    /// `21°C (70°F) • 12 km/h (7 mph) • 180° • Partly cloudy`
    pub fn display_line(&self) -> String {
        let temp_f = (self.temperature_c * 9.0 / 5.0 + 32.0).round();
        let mph = (self.windspeed_kmh * 0.621371).round();
        format!(
            "{}°C ({}°F) • {} km/h ({} mph) • {}° • {}",
            self.temperature_c.round(),
            temp_f,
            self.windspeed_kmh.round(),
            mph,
            self.wind_direction_deg.round(),
            self.condition()
        )
    }
}

/// WMO weather code to phrase.
pub fn condition_phrase(code: u32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Drizzle: Light",
        53 => "Drizzle: Moderate",
        55 => "Drizzle: Dense",
        56 => "Freezing Drizzle: Light",
        57 => "Freezing Drizzle: Dense",
        61 => "Rain: Slight",
        63 => "Rain: Moderate",
        65 => "Rain: Heavy",
        66 => "Freezing Rain: Light",
        67 => "Freezing Rain: Heavy",
        71 => "Snow fall: Slight",
        73 => "Snow fall: Moderate",
        75 => "Snow fall: Heavy",
        77 => "Snow grains",
        80 => "Rain showers: Slight",
        81 => "Rain showers: Moderate",
        82 => "Rain showers: Violent",
        85 => "Snow showers: Slight",
        86 => "Snow showers: Heavy",
        95 => "Thunderstorm: Slight or moderate",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    current_weather: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
    windspeed: f64,
    winddirection: f64,
    weathercode: u32,
}

/// Fetch current conditions. Failures come back as a displayable message;
/// the widget keeps its last report.
pub async fn fetch(location: WeatherLocation) -> Result<WeatherReport, String> {
    let url = format!(
        "https://api.open-meteo.com/v1/forecast?latitude={}&longitude={}&current_weather=true",
        location.lat, location.lon
    );

    let response = reqwest::get(&url)
        .await
        .map_err(|e| format!("weather request failed: {e}"))?;
    let body: ApiResponse = response
        .json()
        .await
        .map_err(|e| format!("weather response unreadable: {e}"))?;

    Ok(WeatherReport {
        temperature_c: body.current_weather.temperature,
        windspeed_kmh: body.current_weather.windspeed,
        wind_direction_deg: body.current_weather.winddirection,
        condition_code: body.current_weather.weathercode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_validation() {
        assert!(WeatherLocation::new(48.85, 2.35).is_some());
        assert!(WeatherLocation::new(91.0, 0.0).is_none());
        assert!(WeatherLocation::new(0.0, -181.0).is_none());
        assert!(WeatherLocation::parse(" 40.7 ", "-74.0").is_some());
        assert!(WeatherLocation::parse("forty", "0").is_none());
    }

    #[test]
    fn test_condition_phrases() {
        assert_eq!(condition_phrase(0), "Clear sky");
        assert_eq!(condition_phrase(2), "Partly cloudy");
        assert_eq!(condition_phrase(75), "Snow fall: Heavy");
        assert_eq!(condition_phrase(99), "Thunderstorm with heavy hail");
        assert_eq!(condition_phrase(42), "Unknown");
    }

    #[test]
    fn test_display_line_conversions() {
        let report = WeatherReport {
            temperature_c: 21.0,
            windspeed_kmh: 12.0,
            wind_direction_deg: 180.0,
            condition_code: 2,
        };
        assert_eq!(
            report.display_line(),
            "21°C (70°F) • 12 km/h (7 mph) • 180° • Partly cloudy"
        );
    }

    #[test]
    fn test_location_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = SettingsStore::open_at(dir.path().join("settings.json"));
        let loc = WeatherLocation::new(52.52, 13.4).unwrap();
        loc.save(&mut settings);
        assert_eq!(WeatherLocation::load(&settings), Some(loc));
    }

    #[test]
    fn test_api_response_parses() {
        let json = r#"{
            "latitude": 52.52, "longitude": 13.42,
            "current_weather": {
                "temperature": 16.3, "windspeed": 9.7,
                "winddirection": 244.0, "weathercode": 3,
                "is_day": 1, "time": "2024-05-01T12:00"
            }
        }"#;
        let parsed: ApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.current_weather.weathercode, 3);
        assert!((parsed.current_weather.temperature - 16.3).abs() < 1e-9);
    }
}
