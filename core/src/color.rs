//! Mana colors and deck color identity.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
}

impl Color {
    /// All colors in `WUBRG` precedence order.
    pub const ALL: [Color; 5] = [
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
    ];

    /// Parses a single color code. Anything outside `WUBRG` (including the
    /// colorless `C`) yields `None`.
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'W' => Some(Color::White),
            'U' => Some(Color::Blue),
            'B' => Some(Color::Black),
            'R' => Some(Color::Red),
            'G' => Some(Color::Green),
            _ => None,
        }
    }

    pub const fn code(self) -> char {
        match self {
            Color::White => 'W',
            Color::Blue => 'U',
            Color::Black => 'B',
            Color::Red => 'R',
            Color::Green => 'G',
        }
    }
}

/// A set of colors represented as bitflags.
///
/// Displays as the color codes in `WUBRG` order, so the display string is the
/// color identity key of a decklist.
///
/// # Examples
///
/// ```
/// use deckstats_core::ColorSet;
///
/// let identity = ColorSet::from_codes("U").union(ColorSet::from_codes("UB"));
/// assert_eq!(identity.to_string(), "UB");
/// assert_eq!(ColorSet::from_codes("C").to_string(), "");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ColorSet(u8);

impl ColorSet {
    pub const COLORLESS: Self = Self(0);
    pub const WHITE: Self = Self(1 << 0);
    pub const BLUE: Self = Self(1 << 1);
    pub const BLACK: Self = Self(1 << 2);
    pub const RED: Self = Self(1 << 3);
    pub const GREEN: Self = Self(1 << 4);

    pub const fn new() -> Self {
        Self(0)
    }

    pub const fn from_color(color: Color) -> Self {
        match color {
            Color::White => Self::WHITE,
            Color::Blue => Self::BLUE,
            Color::Black => Self::BLACK,
            Color::Red => Self::RED,
            Color::Green => Self::GREEN,
        }
    }

    /// Collects the colors named in a metadata color string such as `"UB"`,
    /// `"C"` or `"unknown"`. Unrecognized characters are ignored.
    pub fn from_codes(codes: &str) -> Self {
        codes.chars().filter_map(Color::from_code).collect()
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, color: Color) -> bool {
        self.0 & Self::from_color(color).0 != 0
    }

    pub const fn union(self, other: ColorSet) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    pub const fn with(self, color: Color) -> Self {
        self.union(Self::from_color(color))
    }

    /// Iterates the contained colors in `WUBRG` order.
    pub fn iter(self) -> impl Iterator<Item = Color> {
        Color::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl From<Color> for ColorSet {
    fn from(color: Color) -> Self {
        Self::from_color(color)
    }
}

impl FromIterator<Color> for ColorSet {
    fn from_iter<T: IntoIterator<Item = Color>>(iter: T) -> Self {
        iter.into_iter()
            .fold(ColorSet::COLORLESS, |set, color| set.with(color))
    }
}

impl fmt::Display for ColorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for color in self.iter() {
            write!(f, "{}", color.code())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_set_empty() {
        let set = ColorSet::new();
        assert!(set.is_empty());
        assert_eq!(set.count(), 0);
        assert_eq!(set.to_string(), "");
    }

    #[test]
    fn test_identity_deduplicates_and_orders() {
        let set: ColorSet = ["U", "U", "B"]
            .iter()
            .map(|code| ColorSet::from_codes(code))
            .fold(ColorSet::COLORLESS, ColorSet::union);
        assert_eq!(set.to_string(), "UB");
        assert_eq!(set.count(), 2);
    }

    #[test]
    fn test_precedence_is_wubrg() {
        assert_eq!(ColorSet::from_codes("GRBUW").to_string(), "WUBRG");
        assert_eq!(ColorSet::from_codes("RW").to_string(), "WR");
    }

    #[test]
    fn test_colorless_and_unknown_are_stripped() {
        assert!(ColorSet::from_codes("C").is_empty());
        assert!(ColorSet::from_codes("unknown").is_empty());
        assert_eq!(ColorSet::from_codes("CR").to_string(), "R");
    }

    #[test]
    fn test_from_code_round_trip() {
        for color in Color::ALL {
            assert_eq!(Color::from_code(color.code()), Some(color));
        }
        assert_eq!(Color::from_code('C'), None);
    }
}
