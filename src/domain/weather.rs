/// Current conditions at a point, in metric units.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    /// Short group label such as `Rain` or `Clear`.
    pub main: String,
    pub description: String,
    pub temperature: f64,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
}
