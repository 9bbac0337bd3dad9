//! Route and route color types.

use std::fmt;

use super::RouteId;

/// Error returned when parsing an invalid route color.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid route color: {reason}")]
pub struct InvalidRouteColor {
    reason: &'static str,
}

/// An RGB color as published in `routes.txt` (`RRGGBB`, no leading `#`).
///
/// # Examples
///
/// ```
/// use transit_board::domain::RouteColor;
///
/// let green = RouteColor::parse("00933C").unwrap();
/// assert_eq!(green.rgb(), (0x00, 0x93, 0x3C));
/// assert_eq!(green.to_string(), "00933C");
///
/// // Lowercase hex digits are accepted
/// assert!(RouteColor::parse("ee352e").is_ok());
///
/// // Wrong length is rejected
/// assert!(RouteColor::parse("FFF").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteColor {
    r: u8,
    g: u8,
    b: u8,
}

impl RouteColor {
    /// Default route background color.
    pub const BLACK: RouteColor = RouteColor { r: 0, g: 0, b: 0 };

    /// Default route text color.
    pub const WHITE: RouteColor = RouteColor {
        r: 0xFF,
        g: 0xFF,
        b: 0xFF,
    };

    /// Parse a color from six hex digits.
    pub fn parse(s: &str) -> Result<Self, InvalidRouteColor> {
        if s.len() != 6 {
            return Err(InvalidRouteColor {
                reason: "must be exactly 6 hex digits",
            });
        }

        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidRouteColor {
                reason: "must contain only hex digits",
            });
        }

        let channel = |i: usize| {
            u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| InvalidRouteColor {
                reason: "must contain only hex digits",
            })
        };

        Ok(RouteColor {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Red, green and blue components.
    pub fn rgb(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

impl fmt::Debug for RouteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RouteColor({self})")
    }
}

impl fmt::Display for RouteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// A route from the static catalog. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub id: RouteId,
    /// Short display name, e.g. "6" or "SIR".
    pub short_name: String,
    /// Background color for the route bullet.
    pub color: RouteColor,
    /// Foreground color for the route bullet.
    pub text_color: RouteColor,
}

impl Route {
    /// Build a route, falling back to black on white for missing or
    /// unparseable colors.
    pub fn new(
        id: RouteId,
        short_name: impl Into<String>,
        color: Option<&str>,
        text_color: Option<&str>,
    ) -> Self {
        Self {
            id,
            short_name: short_name.into(),
            color: parse_or(color, RouteColor::BLACK),
            text_color: parse_or(text_color, RouteColor::WHITE),
        }
    }
}

fn parse_or(color: Option<&str>, fallback: RouteColor) -> RouteColor {
    color
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .and_then(|c| RouteColor::parse(c).ok())
        .unwrap_or(fallback)
}
