use serde::{Deserialize, Serialize};

/// Mana colors in Magic: The Gathering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ManaColor {
    #[serde(rename = "W")]
    White,
    #[serde(rename = "U")]
    Blue,
    #[serde(rename = "B")]
    Black,
    #[serde(rename = "R")]
    Red,
    #[serde(rename = "G")]
    Green,
    #[serde(rename = "C")]
    Colorless,
}

impl ManaColor {
    /// All six pool slots, in WUBRGC order
    pub const ALL: [ManaColor; 6] = [
        ManaColor::White,
        ManaColor::Blue,
        ManaColor::Black,
        ManaColor::Red,
        ManaColor::Green,
        ManaColor::Colorless,
    ];

    /// The five real colors (colorless excluded)
    pub const COLORED: [ManaColor; 5] = [
        ManaColor::White,
        ManaColor::Blue,
        ManaColor::Black,
        ManaColor::Red,
        ManaColor::Green,
    ];

    /// Convert to the single character representation
    pub fn to_char(&self) -> char {
        match self {
            ManaColor::White => 'W',
            ManaColor::Blue => 'U',
            ManaColor::Black => 'B',
            ManaColor::Red => 'R',
            ManaColor::Green => 'G',
            ManaColor::Colorless => 'C',
        }
    }

    /// Parse a mana symbol letter (case-insensitive)
    pub fn from_char(c: char) -> Option<ManaColor> {
        match c.to_ascii_uppercase() {
            'W' => Some(ManaColor::White),
            'U' => Some(ManaColor::Blue),
            'B' => Some(ManaColor::Black),
            'R' => Some(ManaColor::Red),
            'G' => Some(ManaColor::Green),
            'C' => Some(ManaColor::Colorless),
            _ => None,
        }
    }

    /// The basic land type that taps for this color
    pub fn basic_land_type(&self) -> Option<&'static str> {
        match self {
            ManaColor::White => Some("Plains"),
            ManaColor::Blue => Some("Island"),
            ManaColor::Black => Some("Swamp"),
            ManaColor::Red => Some("Mountain"),
            ManaColor::Green => Some("Forest"),
            ManaColor::Colorless => None,
        }
    }
}

/// Mana cost for a card or activated ability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaCost {
    #[serde(default)]
    pub white: u32,
    #[serde(default)]
    pub blue: u32,
    #[serde(default)]
    pub black: u32,
    #[serde(default)]
    pub red: u32,
    #[serde(default)]
    pub green: u32,
    #[serde(default)]
    pub colorless: u32,
    #[serde(default)]
    pub generic: u32,
}

impl ManaCost {
    /// Parse a cost string such as `{2}{B}{G}`.
    ///
    /// Numeric symbols add to the generic total, color letters add to their
    /// color. `{X}`, hybrid and Phyrexian symbols contribute nothing.
    pub fn parse(text: &str) -> ManaCost {
        let mut cost = ManaCost::default();
        for symbol in mana_symbols(text) {
            if let Ok(n) = symbol.parse::<u32>() {
                cost.generic += n;
                continue;
            }
            let mut chars = symbol.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                if let Some(color) = ManaColor::from_char(c) {
                    *cost.amount_mut(color) += 1;
                }
            }
        }
        cost
    }

    pub fn amount(&self, color: ManaColor) -> u32 {
        match color {
            ManaColor::White => self.white,
            ManaColor::Blue => self.blue,
            ManaColor::Black => self.black,
            ManaColor::Red => self.red,
            ManaColor::Green => self.green,
            ManaColor::Colorless => self.colorless,
        }
    }

    fn amount_mut(&mut self, color: ManaColor) -> &mut u32 {
        match color {
            ManaColor::White => &mut self.white,
            ManaColor::Blue => &mut self.blue,
            ManaColor::Black => &mut self.black,
            ManaColor::Red => &mut self.red,
            ManaColor::Green => &mut self.green,
            ManaColor::Colorless => &mut self.colorless,
        }
    }

    /// Colored (and explicit colorless) requirements, skipping zero entries
    pub fn specific_requirements(&self) -> Vec<(ManaColor, u32)> {
        ManaColor::ALL
            .iter()
            .map(|&c| (c, self.amount(c)))
            .filter(|(_, n)| *n > 0)
            .collect()
    }

    pub fn total_value(&self) -> u32 {
        self.white + self.blue + self.black + self.red + self.green + self.colorless + self.generic
    }

    pub fn is_free(&self) -> bool {
        self.total_value() == 0
    }
}

/// Contents of every `{...}` group in `text`, in order
pub fn mana_symbols(text: &str) -> Vec<&str> {
    let mut symbols = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                symbols.push(&after[..close]);
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    symbols
}

/// Card types in Magic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Creature,
    Instant,
    Sorcery,
    Enchantment,
    Artifact,
    Land,
    Planeswalker,
}

impl CardType {
    /// Whether a card of this type stays on the battlefield after resolving
    pub fn is_permanent(&self) -> bool {
        !matches!(self, CardType::Instant | CardType::Sorcery)
    }
}

/// Immutable card template, as returned by the card source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub name: String,
    #[serde(default)]
    pub mana_cost: String,
    #[serde(default)]
    pub cmc: u32,
    pub card_type: CardType,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub oracle_text: String,
    #[serde(default)]
    pub power: Option<i32>,
    #[serde(default)]
    pub toughness: Option<i32>,
    #[serde(default)]
    pub colors: Vec<ManaColor>,
    #[serde(default)]
    pub is_legendary: bool,
}

impl CardDefinition {
    pub fn cost(&self) -> ManaCost {
        ManaCost::parse(&self.mana_cost)
    }

    pub fn is_land(&self) -> bool {
        self.card_type == CardType::Land
    }

    pub fn is_creature(&self) -> bool {
        self.card_type == CardType::Creature
    }

    /// Case-insensitive word match against the subtype line
    pub fn has_subtype(&self, wanted: &str) -> bool {
        self.subtype.as_deref().is_some_and(|line| {
            line.split_whitespace()
                .any(|word| word.trim_end_matches('s').eq_ignore_ascii_case(wanted.trim_end_matches('s')))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generic_and_colored() {
        let cost = ManaCost::parse("{2}{B}{G}");
        assert_eq!(cost.generic, 2);
        assert_eq!(cost.black, 1);
        assert_eq!(cost.green, 1);
        assert_eq!(cost.total_value(), 4);
    }

    #[test]
    fn test_parse_ignores_x_and_hybrid() {
        let cost = ManaCost::parse("{X}{R}{W/U}");
        assert_eq!(cost.red, 1);
        assert_eq!(cost.total_value(), 1);
    }

    #[test]
    fn test_parse_empty_cost() {
        assert!(ManaCost::parse("").is_free());
    }

    #[test]
    fn test_specific_requirements_skip_zero() {
        let cost = ManaCost::parse("{1}{U}{U}");
        assert_eq!(cost.specific_requirements(), vec![(ManaColor::Blue, 2)]);
    }

    #[test]
    fn test_mana_symbols_extracts_groups() {
        assert_eq!(mana_symbols("{T}, Sacrifice: Add {C}{C}"), vec!["T", "C", "C"]);
    }

    #[test]
    fn test_has_subtype_matches_plural() {
        let def = CardDefinition {
            name: "Edgar Markov".to_string(),
            mana_cost: "{3}{R}{W}{B}".to_string(),
            cmc: 6,
            card_type: CardType::Creature,
            subtype: Some("Vampire Knight".to_string()),
            oracle_text: String::new(),
            power: Some(4),
            toughness: Some(4),
            colors: vec![ManaColor::Red, ManaColor::White, ManaColor::Black],
            is_legendary: true,
        };
        assert!(def.has_subtype("Vampires"));
        assert!(def.has_subtype("knight"));
        assert!(!def.has_subtype("Goblin"));
    }
}
