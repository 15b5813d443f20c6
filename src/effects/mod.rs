//! One module per demo: its command line and its per-frame effect.

use crate::run::Settings;
use ft_common::{Geometry, check_layer};
use std::time::Duration;

pub mod black;
pub mod dots;
pub mod fractal;
pub mod life;
pub mod lines;
pub mod logo;
pub mod maze;
pub mod midi;
pub mod play;
pub mod plasma;
pub mod words;

pub fn parse_layer(value: &str) -> Result<i32, String> {
    let layer = value
        .parse()
        .map_err(|_| format!("invalid layer '{value}'"))?;
    check_layer(layer).map_err(|err| err.to_string())?;
    Ok(layer)
}

pub fn parse_timeout(value: &str) -> Result<f64, String> {
    match value.parse::<f64>() {
        Ok(secs) if secs >= 0.0 && secs.is_finite() => Ok(secs),
        _ => Err(format!("invalid timeout '{value}'")),
    }
}

pub fn parse_delay(value: &str) -> Result<u64, String> {
    match value.parse::<u64>() {
        Ok(ms) if ms >= 1 => Ok(ms),
        _ => Err(format!("invalid delay '{value}'")),
    }
}

/// Collects the options every demo shares. A layer embedded in the
/// geometry takes precedence over `-l`.
pub fn settings(
    host: Option<String>,
    geometry: Geometry,
    layer: i32,
    timeout: Option<f64>,
    delay_ms: u64,
) -> Result<Settings, String> {
    let layer = match geometry.layer {
        Some(layer) => {
            check_layer(layer).map_err(|err| err.to_string())?;
            layer
        }
        None => layer,
    };

    Ok(Settings {
        host,
        geometry,
        layer,
        timeout: timeout.map(Duration::from_secs_f64),
        delay: Duration::from_millis(delay_ms),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_range() {
        assert_eq!(parse_layer("0"), Ok(0));
        assert_eq!(parse_layer("15"), Ok(15));
        assert!(parse_layer("16").is_err());
        assert!(parse_layer("-1").is_err());
        assert!(parse_layer("top").is_err());
    }

    #[test]
    fn timeout_and_delay() {
        assert_eq!(parse_timeout("1.5"), Ok(1.5));
        assert!(parse_timeout("-1").is_err());
        assert!(parse_timeout("inf").is_err());
        assert_eq!(parse_delay("25"), Ok(25));
        assert!(parse_delay("0").is_err());
    }

    #[test]
    fn geometry_layer_overrides_flag() {
        let geometry: Geometry = "10x10+1+2+7".parse().unwrap();
        let settings = settings(None, geometry, 3, None, 10).unwrap();
        assert_eq!(settings.layer, 7);
        assert_eq!(settings.timeout, None);
        assert_eq!(settings.delay, Duration::from_millis(10));

        let geometry: Geometry = "10x10+1+2+99".parse().unwrap();
        assert!(super::settings(None, geometry, 3, None, 10).is_err());
    }
}
