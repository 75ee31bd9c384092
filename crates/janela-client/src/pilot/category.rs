// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Category parsing and board presentation.
//!
//! Categories come from unvalidated upstream data, so [`Category`] is an open
//! set with an [`Category::Other`] arm and [`presentation_for`] is total.

use std::fmt;

/// Display category of a pilot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Acrobatic,
    Formation,
    Jet,
    /// Anything not recognised, kept verbatim (may be empty).
    Other(String),
}

impl Category {
    /// Parse a raw category, ignoring case and surrounding whitespace.
    ///
    /// Both the English and Portuguese spellings are recognised.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "acrobatic" | "acrobatico" | "acrobático" => Self::Acrobatic,
            "escala" | "formation" => Self::Formation,
            "jato" | "jet" => Self::Jet,
            _ => Self::Other(raw.to_string()),
        }
    }

    #[must_use]
    pub fn presentation(&self) -> Presentation {
        match self {
            Self::Acrobatic => Presentation::Acrobatic,
            Self::Formation => Presentation::Formation,
            Self::Jet => Presentation::Jet,
            Self::Other(_) => Presentation::Neutral,
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acrobatic => f.write_str("acrobatic"),
            Self::Formation => f.write_str("formation"),
            Self::Jet => f.write_str("jet"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// Visual style of a window card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Presentation {
    /// Red card.
    Acrobatic,
    /// Blue card.
    Formation,
    /// Green card.
    Jet,
    /// Gray card for unknown or missing categories.
    #[default]
    Neutral,
}

impl Presentation {
    /// Card background color as a hex string.
    #[must_use]
    pub fn background(self) -> &'static str {
        match self {
            Self::Acrobatic => "#dc2626",
            Self::Formation => "#2563eb",
            Self::Jet => "#16a34a",
            Self::Neutral => "#374151",
        }
    }

    /// Card border color as a hex string.
    #[must_use]
    pub fn border(self) -> &'static str {
        match self {
            Self::Acrobatic => "#f87171",
            Self::Formation => "#60a5fa",
            Self::Jet => "#4ade80",
            Self::Neutral => "#6b7280",
        }
    }

    /// ANSI SGR foreground code for terminal consumers.
    #[must_use]
    pub fn ansi_code(self) -> &'static str {
        match self {
            Self::Acrobatic => "\x1b[31m",
            Self::Formation => "\x1b[34m",
            Self::Jet => "\x1b[32m",
            Self::Neutral => "\x1b[37m",
        }
    }
}

/// Map a raw (possibly absent) category to its presentation. Never fails.
#[must_use]
pub fn presentation_for(category: Option<&str>) -> Presentation {
    category.map_or(Presentation::Neutral, |raw| Category::parse(raw).presentation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_categories_any_case() {
        assert_eq!(presentation_for(Some("acrobatico")), Presentation::Acrobatic);
        assert_eq!(presentation_for(Some("ACROBATIC")), Presentation::Acrobatic);
        assert_eq!(presentation_for(Some("Escala")), Presentation::Formation);
        assert_eq!(presentation_for(Some("formation")), Presentation::Formation);
        assert_eq!(presentation_for(Some("JaTo")), Presentation::Jet);
        assert_eq!(presentation_for(Some(" jet ")), Presentation::Jet);
    }

    #[test]
    fn test_unknown_categories_fall_back_to_neutral() {
        assert_eq!(presentation_for(None), Presentation::Neutral);
        assert_eq!(presentation_for(Some("")), Presentation::Neutral);
        assert_eq!(presentation_for(Some("helicopter")), Presentation::Neutral);
        assert_eq!(presentation_for(Some("jets")), Presentation::Neutral);
        assert_eq!(presentation_for(Some("\u{1F681}")), Presentation::Neutral);
    }

    #[test]
    fn test_other_keeps_raw_value() {
        assert_eq!(Category::parse("Glider"), Category::Other("Glider".to_string()));
        assert_eq!(Category::parse("Glider").to_string(), "Glider");
    }

    #[test]
    fn test_presentation_colors() {
        assert_eq!(Presentation::Acrobatic.background(), "#dc2626");
        assert_eq!(Presentation::Neutral.border(), "#6b7280");
        assert_eq!(Presentation::default(), Presentation::Neutral);
    }
}
