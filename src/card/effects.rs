//! Closed effect vocabulary and the ordered effect-clause matcher.
//!
//! `parse_effect` walks a fixed list of clause shapes top to bottom and returns
//! the first one that matches. New behavior is added by inserting a new shape
//! at the right position, never by loosening an existing one.

use crate::card::types::{mana_symbols, CardDefinition, CardType, ManaColor};
use serde::Serialize;

const BASIC_LAND_TYPES: [&str; 5] = ["Plains", "Island", "Swamp", "Mountain", "Forest"];

/// How many times an effect applies, resolved at execution time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Amount {
    Fixed(u32),
    /// Distinct colors among the mana spent to cast the spell
    Converge,
    GoblinsYouControl,
    LandsYouControl,
}

/// Mana produced by an add-mana effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ManaProduction {
    /// Every listed symbol is added (`Add {G}{G}`, `Add {C}{C}`)
    Fixed(Vec<ManaColor>),
    /// One symbol of the controller's choice (`Add {B}, {R}, or {G}`)
    OneOf(Vec<ManaColor>),
    /// `amount` mana of a single color of the controller's choice
    AnyColor { amount: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DamageTarget {
    AnyTarget,
    Player,
    Opponent,
    Creature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlayerTarget {
    You,
    Opponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CounterKind {
    PlusOne,
    MinusOne,
}

impl CounterKind {
    pub fn label(&self) -> &'static str {
        match self {
            CounterKind::PlusOne => "+1/+1",
            CounterKind::MinusOne => "-1/-1",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CounterTarget {
    ThisPermanent,
    TargetCreature,
    AllCreatures { yours_only: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReturnScope {
    TargetPermanent,
    AllAttacking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Goblin,
    Snake,
    Insect,
    Vampire,
    Drake,
    Elemental,
    Plant,
}

/// A token blueprint; power/toughness come from the clause when it names them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenSpec {
    pub kind: TokenKind,
    pub power: i32,
    pub toughness: i32,
}

impl TokenSpec {
    pub fn new(kind: TokenKind) -> Self {
        let (power, toughness) = match kind {
            TokenKind::Drake => (2, 2),
            TokenKind::Elemental => (5, 5),
            TokenKind::Plant => (0, 1),
            _ => (1, 1),
        };
        TokenSpec { kind, power, toughness }
    }

    /// The card definition backing a token of this kind
    pub fn definition(&self) -> CardDefinition {
        let (name, colors, text) = match self.kind {
            TokenKind::Goblin => ("Goblin", vec![ManaColor::Red], ""),
            TokenKind::Snake => ("Snake", vec![ManaColor::Green], "Deathtouch"),
            TokenKind::Insect => ("Insect", vec![ManaColor::Green], ""),
            TokenKind::Vampire => ("Vampire", vec![ManaColor::Black], ""),
            TokenKind::Drake => ("Drake", vec![ManaColor::Blue], "Flying"),
            TokenKind::Elemental => ("Elemental", vec![ManaColor::Red, ManaColor::Green], ""),
            TokenKind::Plant => ("Plant", vec![ManaColor::Green], ""),
        };
        CardDefinition {
            name: name.to_string(),
            mana_cost: String::new(),
            cmc: 0,
            card_type: CardType::Creature,
            subtype: Some(name.to_string()),
            oracle_text: text.to_string(),
            power: Some(self.power),
            toughness: Some(self.toughness),
            colors,
            is_legendary: false,
        }
    }
}

/// Library-search variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SearchSpec {
    /// One basic land onto the battlefield
    BasicLand { tapped: bool },
    /// Up to two basic lands: one onto the battlefield, the other into hand
    UpToTwoBasicLands { tapped: bool },
    /// Two lands, both onto the battlefield
    TwoLandsToBattlefield { tapped: bool },
    /// One basic land of the three named types; sacrifices the source first
    /// when the clause says so
    BasicOfTypes {
        land_types: Vec<String>,
        tapped: bool,
        sacrifice_source: bool,
    },
}

impl SearchSpec {
    pub fn tapped(&self) -> bool {
        match self {
            SearchSpec::BasicLand { tapped }
            | SearchSpec::UpToTwoBasicLands { tapped }
            | SearchSpec::TwoLandsToBattlefield { tapped }
            | SearchSpec::BasicOfTypes { tapped, .. } => *tapped,
        }
    }

    /// How many cards the search may find
    pub fn max_cards(&self) -> usize {
        match self {
            SearchSpec::UpToTwoBasicLands { .. } | SearchSpec::TwoLandsToBattlefield { .. } => 2,
            _ => 1,
        }
    }
}

/// One executable game effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Effect {
    AddMana(ManaProduction),
    Regenerate,
    UntapSelf,
    DrawCards { amount: Amount },
    GainLife { amount: Amount },
    LoseLife { amount: Amount, who: PlayerTarget },
    DealDamage { amount: Amount, target: DamageTarget },
    Destroy,
    CounterSpell { unless_pays: Option<u32> },
    ReturnToHand { scope: ReturnScope },
    Scry { amount: u32 },
    Proliferate,
    GivePoison { amount: u32 },
    PutCounter { kind: CounterKind, amount: u32, target: CounterTarget },
    CreateToken { token: TokenSpec, count: Amount },
    SearchLibrary(SearchSpec),
    Pump { power: i32, toughness: i32 },
}

/// Lowercased clause with a word view for amount extraction
pub(crate) struct Clause {
    pub lower: String,
    words: Vec<String>,
}

impl Clause {
    pub fn new(text: &str) -> Self {
        let lower = text.to_ascii_lowercase();
        let words = lower
            .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '-' | '/' | '{' | '}' | '\'')))
            .filter(|w| !w.is_empty())
            .map(|w| w.to_string())
            .collect();
        Clause { lower, words }
    }

    pub fn has(&self, needle: &str) -> bool {
        self.lower.contains(needle)
    }

    pub fn has_word(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    /// Count immediately following the first of `verbs` found
    pub fn amount_after(&self, verbs: &[&str]) -> Option<u32> {
        self.words
            .iter()
            .position(|w| verbs.contains(&w.as_str()))
            .and_then(|i| self.words.get(i + 1))
            .and_then(|w| parse_count(w))
    }

    /// Count immediately preceding the first occurrence of `noun`
    pub fn count_before(&self, noun: &str) -> Option<u32> {
        self.words
            .iter()
            .position(|w| w == noun || w.trim_end_matches('s') == noun)
            .filter(|&i| i > 0)
            .and_then(|i| parse_count(&self.words[i - 1]))
    }

    /// First `+N/+M` or `N/M` pair in the clause
    pub fn stat_pair(&self) -> Option<(i32, i32)> {
        self.words.iter().find_map(|w| {
            let (p, t) = w.split_once('/')?;
            if p.contains('{') || t.contains('{') {
                return None;
            }
            Some((p.trim_start_matches('+').parse().ok()?, t.trim_start_matches('+').parse().ok()?))
        })
    }
}

/// A literal integer, `a`/`an`, or a small number word
pub(crate) fn parse_count(word: &str) -> Option<u32> {
    let word = word.trim_matches(|c: char| c == '{' || c == '}');
    if let Ok(n) = word.parse::<u32>() {
        return Some(n);
    }
    let n = match word {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        _ => return None,
    };
    Some(n)
}

/// Parse one effect clause. Unrecognized text yields `None`.
pub fn parse_effect(text: &str) -> Option<Effect> {
    let clause = Clause::new(text);
    let shapes: [fn(&str, &Clause) -> Option<Effect>; 16] = [
        search_library,
        add_mana,
        regenerate,
        untap_self,
        draw_cards,
        gain_life,
        lose_life,
        deal_damage,
        destroy,
        counter_spell,
        return_to_hand,
        scry,
        proliferate,
        give_poison,
        put_counter,
        create_token,
    ];
    shapes
        .iter()
        .find_map(|shape| shape(text, &clause))
        .or_else(|| pump(text, &clause))
}

fn search_library(text: &str, c: &Clause) -> Option<Effect> {
    if !(c.has_word("search") && c.has("library")) {
        return None;
    }
    let tapped = c.has_word("tapped");

    // Sacrifice-then-search for one of three basic types: exactly three of
    // the five basic types are named and the other two are absent.
    let named: Vec<String> = BASIC_LAND_TYPES
        .iter()
        .filter(|t| text.contains(*t))
        .map(|t| t.to_string())
        .collect();
    if named.len() == 3 {
        return Some(Effect::SearchLibrary(SearchSpec::BasicOfTypes {
            land_types: named,
            tapped,
            sacrifice_source: c.has_word("sacrifice"),
        }));
    }

    if !c.has("land") {
        return None;
    }
    if c.has("up to two basic land") && c.has("hand") {
        return Some(Effect::SearchLibrary(SearchSpec::UpToTwoBasicLands { tapped }));
    }
    if c.has("two") && c.has("onto the battlefield") {
        return Some(Effect::SearchLibrary(SearchSpec::TwoLandsToBattlefield { tapped }));
    }
    if c.has("basic land") {
        return Some(Effect::SearchLibrary(SearchSpec::BasicLand { tapped }));
    }
    None
}

fn add_mana(text: &str, c: &Clause) -> Option<Effect> {
    if !c.has_word("add") {
        return None;
    }
    let start = c.lower.find("add")?;
    let tail = &text[start..];
    if c.has("mana of any") {
        let amount = c.amount_after(&["add"]).unwrap_or(1);
        return Some(Effect::AddMana(ManaProduction::AnyColor { amount }));
    }
    let colors: Vec<ManaColor> = mana_symbols(tail)
        .into_iter()
        .filter_map(|s| {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => ManaColor::from_char(ch),
                _ => None,
            }
        })
        .collect();
    if colors.is_empty() {
        return None;
    }
    if tail.to_lowercase().contains(" or ") {
        let mut options = colors;
        options.dedup();
        return Some(Effect::AddMana(ManaProduction::OneOf(options)));
    }
    Some(Effect::AddMana(ManaProduction::Fixed(colors)))
}

fn regenerate(_: &str, c: &Clause) -> Option<Effect> {
    c.has_word("regenerate").then_some(Effect::Regenerate)
}

fn untap_self(_: &str, c: &Clause) -> Option<Effect> {
    c.has_word("untap").then_some(Effect::UntapSelf)
}

fn draw_cards(_: &str, c: &Clause) -> Option<Effect> {
    if !(c.has_word("draw") || c.has_word("draws")) {
        return None;
    }
    let amount = c.amount_after(&["draw", "draws"]).unwrap_or(1);
    Some(Effect::DrawCards { amount: Amount::Fixed(amount) })
}

fn gain_life(_: &str, c: &Clause) -> Option<Effect> {
    if !(c.has_word("gain") || c.has_word("gains")) || !c.has_word("life") {
        return None;
    }
    let amount = c.amount_after(&["gain", "gains"]).unwrap_or(1);
    Some(Effect::GainLife { amount: Amount::Fixed(amount) })
}

fn lose_life(_: &str, c: &Clause) -> Option<Effect> {
    if !(c.has_word("lose") || c.has_word("loses")) || !c.has_word("life") {
        return None;
    }
    let amount = c.amount_after(&["lose", "loses"]).unwrap_or(1);
    let who = if c.has("opponent") || c.has("target player") {
        PlayerTarget::Opponent
    } else {
        PlayerTarget::You
    };
    Some(Effect::LoseLife { amount: Amount::Fixed(amount), who })
}

fn deal_damage(_: &str, c: &Clause) -> Option<Effect> {
    if !(c.has_word("deal") || c.has_word("deals")) || !c.has_word("damage") {
        return None;
    }
    let amount = c.amount_after(&["deal", "deals"]).unwrap_or(1);
    let target = if c.has("any target") {
        DamageTarget::AnyTarget
    } else if c.has("target player") || c.has("each player") {
        DamageTarget::Player
    } else if c.has("opponent") {
        DamageTarget::Opponent
    } else if c.has("creature") {
        DamageTarget::Creature
    } else {
        DamageTarget::AnyTarget
    };
    Some(Effect::DealDamage { amount: Amount::Fixed(amount), target })
}

fn destroy(_: &str, c: &Clause) -> Option<Effect> {
    c.has_word("destroy").then_some(Effect::Destroy)
}

fn counter_spell(_: &str, c: &Clause) -> Option<Effect> {
    if !c.has("counter target") || !c.has("spell") {
        return None;
    }
    let unless_pays = if c.has("unless") {
        c.amount_after(&["pays", "pay"])
    } else {
        None
    };
    Some(Effect::CounterSpell { unless_pays })
}

fn return_to_hand(_: &str, c: &Clause) -> Option<Effect> {
    if !c.has_word("return") || !c.has("hand") || c.has("graveyard") {
        return None;
    }
    let scope = if c.has("all attacking") {
        ReturnScope::AllAttacking
    } else {
        ReturnScope::TargetPermanent
    };
    Some(Effect::ReturnToHand { scope })
}

fn scry(_: &str, c: &Clause) -> Option<Effect> {
    if !c.has_word("scry") {
        return None;
    }
    let amount = c.amount_after(&["scry"]).unwrap_or(1);
    Some(Effect::Scry { amount })
}

fn proliferate(_: &str, c: &Clause) -> Option<Effect> {
    c.has_word("proliferate").then_some(Effect::Proliferate)
}

fn give_poison(_: &str, c: &Clause) -> Option<Effect> {
    if !c.has("poison counter") {
        return None;
    }
    let amount = c.count_before("poison").unwrap_or(1);
    Some(Effect::GivePoison { amount })
}

fn put_counter(_: &str, c: &Clause) -> Option<Effect> {
    if !c.has_word("put") || !c.has("counter") {
        return None;
    }
    let kind = if c.has("-1/-1") {
        CounterKind::MinusOne
    } else if c.has("+1/+1") {
        CounterKind::PlusOne
    } else {
        return None;
    };
    let amount = c.amount_after(&["put"]).unwrap_or(1);
    let target = if c.has("each creature") || c.has("each other creature") || (c.has_word("each") && c.has("creature you control")) {
        CounterTarget::AllCreatures { yours_only: c.has("you control") }
    } else if c.has("target creature") {
        CounterTarget::TargetCreature
    } else {
        CounterTarget::ThisPermanent
    };
    Some(Effect::PutCounter { kind, amount, target })
}

fn create_token(_: &str, c: &Clause) -> Option<Effect> {
    if !c.has_word("create") || !c.has("token") {
        return None;
    }
    let fixed = Amount::Fixed(c.amount_after(&["create"]).unwrap_or(1));
    let (kind, count) = if c.has("goblin") && c.has("number of goblins you control") {
        (TokenKind::Goblin, Amount::GoblinsYouControl)
    } else if c.has("snake") {
        (TokenKind::Snake, fixed)
    } else if c.has("goblin") {
        (TokenKind::Goblin, fixed)
    } else if c.has("insect") {
        (TokenKind::Insect, fixed)
    } else if c.has("vampire") {
        (TokenKind::Vampire, fixed)
    } else if c.has("drake") {
        (TokenKind::Drake, fixed)
    } else if c.has("elemental") {
        (TokenKind::Elemental, fixed)
    } else if c.has("plant") {
        let count = if c.has("for each land") { Amount::LandsYouControl } else { fixed };
        (TokenKind::Plant, count)
    } else {
        return None;
    };
    let mut token = TokenSpec::new(kind);
    if let Some((power, toughness)) = c.stat_pair() {
        token.power = power;
        token.toughness = toughness;
    }
    Some(Effect::CreateToken { token, count })
}

fn pump(_: &str, c: &Clause) -> Option<Effect> {
    if !c.has("until end of turn") || !(c.has_word("gets") || c.has_word("get")) {
        return None;
    }
    let (power, toughness) = c.stat_pair()?;
    Some(Effect::Pump { power, toughness })
}
