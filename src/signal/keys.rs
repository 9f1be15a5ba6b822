//! Exit key identifiers

use std::fmt;
use std::str::FromStr;

use crate::TrackerError;

/// Key that ends a tracking session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKey {
    Escape,
    Space,
    Enter,
    Tab,
    /// F1 through F12
    Function(u8),
    /// ASCII letter (stored lowercase) or digit
    Char(char),
}

impl ExitKey {
    /// Windows virtual-key code
    pub fn virtual_key(&self) -> u16 {
        match self {
            ExitKey::Escape => 0x1B,
            ExitKey::Space => 0x20,
            ExitKey::Enter => 0x0D,
            ExitKey::Tab => 0x09,
            ExitKey::Function(n) => 0x70 + (*n as u16).saturating_sub(1),
            ExitKey::Char(c) => c.to_ascii_uppercase() as u16,
        }
    }
}

impl FromStr for ExitKey {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        match key.as_str() {
            "esc" | "escape" => return Ok(ExitKey::Escape),
            "space" => return Ok(ExitKey::Space),
            "enter" | "return" => return Ok(ExitKey::Enter),
            "tab" => return Ok(ExitKey::Tab),
            _ => {}
        }

        if let Some(n) = key.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
            if (1..=12).contains(&n) {
                return Ok(ExitKey::Function(n));
            }
        }

        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphanumeric() => Ok(ExitKey::Char(c)),
            _ => Err(TrackerError::UnknownKey(s.to_string())),
        }
    }
}

impl fmt::Display for ExitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitKey::Escape => write!(f, "esc"),
            ExitKey::Space => write!(f, "space"),
            ExitKey::Enter => write!(f, "enter"),
            ExitKey::Tab => write!(f, "tab"),
            ExitKey::Function(n) => write!(f, "f{}", n),
            ExitKey::Char(c) => write!(f, "{}", c),
        }
    }
}
