use crate::card::effects::{parse_effect, Amount, DamageTarget, Effect, PlayerTarget};
use crate::card::types::{mana_symbols, CardDefinition, CardType, ManaCost};
use serde::Serialize;
use std::ops::Range;

/// Evergreen keywords recognized on keyword lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Keyword {
    Flying,
    Trample,
    Deathtouch,
    Lifelink,
    Haste,
    Vigilance,
    FirstStrike,
    DoubleStrike,
    Reach,
    Menace,
    Infect,
    Wither,
    Shadow,
}

impl Keyword {
    pub const ALL: [Keyword; 13] = [
        Keyword::Flying,
        Keyword::Trample,
        Keyword::Deathtouch,
        Keyword::Lifelink,
        Keyword::Haste,
        Keyword::Vigilance,
        Keyword::FirstStrike,
        Keyword::DoubleStrike,
        Keyword::Reach,
        Keyword::Menace,
        Keyword::Infect,
        Keyword::Wither,
        Keyword::Shadow,
    ];

    pub fn text(&self) -> &'static str {
        match self {
            Keyword::Flying => "flying",
            Keyword::Trample => "trample",
            Keyword::Deathtouch => "deathtouch",
            Keyword::Lifelink => "lifelink",
            Keyword::Haste => "haste",
            Keyword::Vigilance => "vigilance",
            Keyword::FirstStrike => "first strike",
            Keyword::DoubleStrike => "double strike",
            Keyword::Reach => "reach",
            Keyword::Menace => "menace",
            Keyword::Infect => "infect",
            Keyword::Wither => "wither",
            Keyword::Shadow => "shadow",
        }
    }
}

/// What a sacrifice cost consumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SacrificeCost {
    /// The source permanent itself
    This,
    /// Another permanent matching the qualifier word ("goblin", "creature")
    Another(String),
}

/// Cost clause of an activated ability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AbilityCost {
    pub tap: bool,
    pub untap: bool,
    pub mana: Option<ManaCost>,
    pub sacrifice: Option<SacrificeCost>,
    /// "Put a -1/-1 counter on" the source
    pub minus_counter_on_self: bool,
    /// "Pay N life"
    pub life: u32,
}

/// Which spells a cast trigger watches
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SpellFilter {
    Any,
    InstantOrSorcery,
    Creature,
    /// Creature spells sharing this subtype
    Tribal(String),
}

impl SpellFilter {
    pub fn matches(&self, spell: &CardDefinition) -> bool {
        match self {
            SpellFilter::Any => true,
            SpellFilter::InstantOrSorcery => {
                matches!(spell.card_type, CardType::Instant | CardType::Sorcery)
            }
            SpellFilter::Creature => spell.is_creature(),
            SpellFilter::Tribal(subtype) => spell.has_subtype(subtype),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TriggerCondition {
    EntersBattlefield,
    Dies,
    /// The source or another creature dies; `yours_only` limits it to the
    /// controller's creatures
    DiesOtherCreature { yours_only: bool },
    DealsCombatDamageToPlayer,
    DealsDamage,
    Attacks,
    Landfall,
    CastSpell(SpellFilter),
    PutCounter,
    Upkeep,
    /// Recognized trigger shape with an unclassified condition
    Other,
}

/// One ability interpreted from rules text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ParsedAbility {
    Activated {
        cost: AbilityCost,
        effects: Vec<Effect>,
        raw_text: String,
    },
    Triggered {
        condition: TriggerCondition,
        effects: Vec<Effect>,
        raw_text: String,
    },
    Static {
        raw_text: String,
    },
    Keyword(Keyword),
    Spell {
        converge: bool,
        effects: Vec<Effect>,
        raw_text: String,
    },
}

impl ParsedAbility {
    pub fn effects(&self) -> &[Effect] {
        match self {
            ParsedAbility::Activated { effects, .. }
            | ParsedAbility::Triggered { effects, .. }
            | ParsedAbility::Spell { effects, .. } => effects,
            ParsedAbility::Static { .. } | ParsedAbility::Keyword(_) => &[],
        }
    }

    pub fn is_activated(&self) -> bool {
        matches!(self, ParsedAbility::Activated { .. })
    }
}

/// Interpret a card's rules text.
///
/// Pure function of the oracle text. Reminder text in parentheses is ignored.
/// Each period/newline-delimited segment produces any keywords it names,
/// then at most one activated, triggered or static ability. Multi-sentence
/// idioms are matched over the whole text first and replace the segments
/// they span.
pub fn parse_card_abilities(card: &CardDefinition) -> Vec<ParsedAbility> {
    let text = strip_reminder_text(&card.oracle_text);
    let combined = enters_sacrifice_search(&text);
    let mut abilities = Vec::new();
    let mut combined_emitted = false;

    for (range, segment) in split_segments(&text) {
        if let Some((span, ability)) = &combined {
            if range.start < span.end && span.start < range.end {
                if !combined_emitted {
                    abilities.push(ability.clone());
                    combined_emitted = true;
                }
                continue;
            }
        }
        abilities.extend(parse_segment(segment, &card.name));
    }
    abilities
}

/// Whole-text effect of an instant or sorcery; `None` for other card types
pub fn parse_spell_effect(card: &CardDefinition) -> Option<ParsedAbility> {
    if !matches!(card.card_type, CardType::Instant | CardType::Sorcery) {
        return None;
    }
    let text = strip_reminder_text(&card.oracle_text);
    let lower = text.to_ascii_lowercase();

    if lower.contains("converge") {
        let mut effects = Vec::new();
        if lower.contains("draw") {
            effects.push(Effect::DrawCards { amount: Amount::Converge });
        }
        if lower.contains("lose") && lower.contains("life") {
            effects.push(Effect::LoseLife { amount: Amount::Converge, who: PlayerTarget::You });
        }
        if lower.contains("gain") && lower.contains("life") {
            effects.push(Effect::GainLife { amount: Amount::Converge });
        }
        if lower.contains("damage") {
            effects.push(Effect::DealDamage { amount: Amount::Converge, target: DamageTarget::AnyTarget });
        }
        return Some(ParsedAbility::Spell { converge: true, effects, raw_text: text.trim().to_string() });
    }

    let effects: Vec<Effect> = spell_clauses(&text).into_iter().filter_map(parse_effect).collect();
    if effects.is_empty() {
        log::debug!("no recognized spell effect on {}: {}", card.name, text.trim());
    }
    Some(ParsedAbility::Spell { converge: false, effects, raw_text: text.trim().to_string() })
}

/// Sentences of a spell, with "... and you ..." split into two clauses
fn spell_clauses(text: &str) -> Vec<&str> {
    let mut clauses = Vec::new();
    for sentence in text.split(|c: char| c == '.' || c == '\n') {
        let mut rest = sentence;
        while let Some(i) = rest.find(" and you ") {
            clauses.push(&rest[..i]);
            rest = &rest[i + " and ".len()..];
        }
        clauses.push(rest);
    }
    clauses.into_iter().map(str::trim).filter(|c| !c.is_empty()).collect()
}

pub fn has_keyword(card: &CardDefinition, keyword: Keyword) -> bool {
    parse_card_abilities(card)
        .iter()
        .any(|a| *a == ParsedAbility::Keyword(keyword))
}

/// Activated abilities only, in text order; ability indexes count into this
pub fn activated_abilities(card: &CardDefinition) -> Vec<ParsedAbility> {
    parse_card_abilities(card)
        .into_iter()
        .filter(ParsedAbility::is_activated)
        .collect()
}

fn strip_reminder_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

fn split_segments(text: &str) -> Vec<(Range<usize>, &str)> {
    let mut segments = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == '.' || c == '\n' {
            push_segment(text, start..i, &mut segments);
            start = i + c.len_utf8();
        }
    }
    push_segment(text, start..text.len(), &mut segments);
    segments
}

fn push_segment<'a>(text: &'a str, range: Range<usize>, segments: &mut Vec<(Range<usize>, &'a str)>) {
    let segment = text[range.clone()].trim();
    if !segment.is_empty() {
        segments.push((range, segment));
    }
}

/// "When ~ enters, sacrifice it. When you do, search ..." spans two
/// sentences and becomes a single enters-the-battlefield ability.
fn enters_sacrifice_search(text: &str) -> Option<(Range<usize>, ParsedAbility)> {
    let lower = text.to_ascii_lowercase();
    let reflexive = lower.find("when you do, search")?;

    let before = lower[..reflexive].trim_end();
    let before = before.strip_suffix('.').unwrap_or(before);
    let start = before.rfind(|c: char| c == '.' || c == '\n').map(|i| i + 1).unwrap_or(0);
    let trigger_sentence = &lower[start..reflexive];
    if !trigger_sentence.contains("enters") {
        return None;
    }
    let sacrifice = start + trigger_sentence.find("sacrifice")?;

    let end = lower[reflexive..]
        .find(|c: char| c == '.' || c == '\n')
        .map(|i| reflexive + i)
        .unwrap_or(text.len());
    let effects: Vec<Effect> = parse_effect(&text[sacrifice..end]).into_iter().collect();

    let ability = ParsedAbility::Triggered {
        condition: TriggerCondition::EntersBattlefield,
        effects,
        raw_text: text[start..end].trim().to_string(),
    };
    Some((start..end, ability))
}

fn parse_segment(segment: &str, card_name: &str) -> Vec<ParsedAbility> {
    let lower = segment.to_ascii_lowercase();
    let mut abilities = scan_keywords(&lower);

    if let Some(ability) = parse_activated(segment, card_name) {
        abilities.push(ability);
    } else if let Some(ability) = parse_triggered(segment, &lower, card_name) {
        abilities.push(ability);
    } else if is_static(&lower) {
        abilities.push(ParsedAbility::Static { raw_text: segment.to_string() });
    } else if abilities.is_empty() {
        log::debug!("unrecognized rules text on {}: {}", card_name, segment);
    }
    abilities
}

/// Every keyword named in the segment, in table order. Text from the first
/// "create", "target" or " with " onward describes some other object and
/// is not scanned.
fn scan_keywords(lower: &str) -> Vec<ParsedAbility> {
    let end = ["create", "target", " with "]
        .iter()
        .filter_map(|marker| lower.find(marker))
        .min()
        .unwrap_or(lower.len());
    let own_text = &lower[..end];
    Keyword::ALL
        .iter()
        .filter(|k| own_text.contains(k.text()))
        .map(|&k| ParsedAbility::Keyword(k))
        .collect()
}

fn parse_activated(segment: &str, card_name: &str) -> Option<ParsedAbility> {
    let (cost_text, effect_text) = segment.split_once(':')?;
    let cost = parse_cost(cost_text);
    let effect = parse_effect(effect_text);
    if cost.is_none() && effect.is_none() {
        return None;
    }
    if effect.is_none() {
        log::debug!("inert activated ability on {}: {}", card_name, segment);
    }
    Some(ParsedAbility::Activated {
        cost: cost.unwrap_or_default(),
        effects: effect.into_iter().collect(),
        raw_text: segment.to_string(),
    })
}

fn parse_cost(cost_text: &str) -> Option<AbilityCost> {
    let mut cost = AbilityCost::default();
    let mut mana = String::new();
    for symbol in mana_symbols(cost_text) {
        match symbol {
            "T" => cost.tap = true,
            "Q" => cost.untap = true,
            other => {
                mana.push('{');
                mana.push_str(other);
                mana.push('}');
            }
        }
    }
    let mana = ManaCost::parse(&mana);
    if !mana.is_free() {
        cost.mana = Some(mana);
    }

    let lower = cost_text.to_ascii_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '-' | '/')))
        .filter(|w| !w.is_empty())
        .collect();

    if let Some(i) = words.iter().position(|w| *w == "sacrifice") {
        cost.sacrifice = Some(match words.get(i + 1) {
            Some(&("a" | "an" | "another")) => match words.get(i + 2) {
                Some(qualifier) => SacrificeCost::Another(qualifier.trim_end_matches('s').to_string()),
                None => SacrificeCost::This,
            },
            _ => SacrificeCost::This,
        });
    }
    if lower.contains("put a -1/-1 counter on") {
        cost.minus_counter_on_self = true;
    }
    if let Some(i) = words.iter().position(|w| *w == "pay") {
        if words.get(i + 2) == Some(&"life") {
            cost.life = words.get(i + 1).and_then(|n| n.parse().ok()).unwrap_or(0);
        }
    }

    (cost != AbilityCost::default()).then_some(cost)
}

const TRIGGER_OPENERS: [&str; 5] = ["when", "whenever", "at the", "landfall", "eminence"];

fn parse_triggered(segment: &str, lower: &str, card_name: &str) -> Option<ParsedAbility> {
    if !TRIGGER_OPENERS.iter().any(|o| lower.starts_with(o)) {
        return None;
    }
    let condition = classify_trigger(lower);
    let effect_text = trigger_effect_clause(segment, lower);
    let effects: Vec<Effect> = parse_effect(effect_text).into_iter().collect();
    if effects.is_empty() || condition == TriggerCondition::Other {
        log::debug!("partially recognized trigger on {}: {}", card_name, segment);
    }
    Some(ParsedAbility::Triggered { condition, effects, raw_text: segment.to_string() })
}

fn classify_trigger(lower: &str) -> TriggerCondition {
    if lower.starts_with("landfall") || lower.contains("a land enters") || lower.contains("land you control enters") {
        TriggerCondition::Landfall
    } else if lower.contains("whenever you put") && lower.contains("counter") {
        TriggerCondition::PutCounter
    } else if lower.contains("you cast") || lower.starts_with("eminence") {
        TriggerCondition::CastSpell(spell_filter(lower))
    } else if lower.contains("deals combat damage to a player") || lower.contains("deals combat damage to an opponent") {
        TriggerCondition::DealsCombatDamageToPlayer
    } else if lower.contains("deals damage") || lower.contains("deals combat damage") {
        TriggerCondition::DealsDamage
    } else if contains_word(lower, "dies") && lower.contains("another") {
        TriggerCondition::DiesOtherCreature { yours_only: lower.contains("you control") }
    } else if contains_word(lower, "dies") {
        TriggerCondition::Dies
    } else if lower.contains("enters the battlefield") || lower.contains(" enters,") || contains_word(lower, "enters") {
        TriggerCondition::EntersBattlefield
    } else if contains_word(lower, "attacks") {
        TriggerCondition::Attacks
    } else if lower.contains("upkeep") {
        TriggerCondition::Upkeep
    } else {
        TriggerCondition::Other
    }
}

fn spell_filter(lower: &str) -> SpellFilter {
    if lower.contains("instant or sorcery") {
        return SpellFilter::InstantOrSorcery;
    }
    if lower.contains("creature spell") {
        return SpellFilter::Creature;
    }
    let words: Vec<&str> = lower.split_whitespace().collect();
    words
        .iter()
        .position(|w| w.starts_with("spell"))
        .filter(|&i| i > 0)
        .map(|i| words[i - 1])
        .filter(|w| !matches!(*w, "a" | "an" | "another" | "cast"))
        .map(|w| SpellFilter::Tribal(w.to_string()))
        .unwrap_or(SpellFilter::Any)
}

/// Text after the comma that closes the trigger condition
fn trigger_effect_clause<'a>(segment: &'a str, lower: &str) -> &'a str {
    const CONDITION_VERBS: [&str; 8] = ["enters", "dies", "attacks", "deals", "cast", "upkeep", "put", "becomes"];
    let anchor = CONDITION_VERBS
        .iter()
        .filter_map(|v| lower.find(v))
        .min()
        .unwrap_or(0);
    match lower[anchor..].find(',') {
        Some(i) => &segment[anchor + i + 1..],
        None => "",
    }
}

fn is_static(lower: &str) -> bool {
    let grants = [" get +", " gets +", " get -", " have ", " has "];
    lower.starts_with("as long as")
        || ((lower.contains("you control") || lower.contains("creatures")) && grants.iter().any(|g| lower.contains(g)))
}

/// Substring match bounded by non-letters on both sides
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(i, _)| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + needle.len()..].chars().next();
        !before.is_some_and(|c| c.is_alphabetic()) && !after.is_some_and(|c| c.is_alphabetic())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::effects::{ManaProduction, SearchSpec, TokenKind, TokenSpec};
    use crate::card::types::ManaColor;

    fn card(name: &str, card_type: CardType, text: &str) -> CardDefinition {
        CardDefinition {
            name: name.to_string(),
            mana_cost: String::new(),
            cmc: 0,
            card_type,
            subtype: None,
            oracle_text: text.to_string(),
            power: if card_type == CardType::Creature { Some(1) } else { None },
            toughness: if card_type == CardType::Creature { Some(1) } else { None },
            colors: vec![],
            is_legendary: false,
        }
    }

    #[test]
    fn test_keyword_line_with_multiple_keywords() {
        let c = card("Blight Mamba", CardType::Creature, "Infect (This creature deals damage to creatures in the form of -1/-1 counters and to players in the form of poison counters.)\n{1}{G}: Regenerate Blight Mamba.");
        let abilities = parse_card_abilities(&c);
        assert_eq!(abilities[0], ParsedAbility::Keyword(Keyword::Infect));
        assert!(matches!(
            &abilities[1],
            ParsedAbility::Activated { cost, effects, .. }
                if cost.mana == Some(ManaCost::parse("{1}{G}")) && effects == &vec![Effect::Regenerate]
        ));
        assert_eq!(abilities.len(), 2);
    }

    #[test]
    fn test_first_strike_and_reach() {
        let c = card("Test", CardType::Creature, "First strike, reach");
        let abilities = parse_card_abilities(&c);
        assert_eq!(
            abilities,
            vec![ParsedAbility::Keyword(Keyword::FirstStrike), ParsedAbility::Keyword(Keyword::Reach)]
        );
    }

    #[test]
    fn test_token_keyword_does_not_grant_keyword() {
        let c = card(
            "Talrand, Sky Summoner",
            CardType::Creature,
            "Whenever you cast an instant or sorcery spell, create a 2/2 blue Drake creature token with flying.",
        );
        assert!(!has_keyword(&c, Keyword::Flying));
        let abilities = parse_card_abilities(&c);
        assert!(matches!(
            &abilities[0],
            ParsedAbility::Triggered { condition: TriggerCondition::CastSpell(SpellFilter::InstantOrSorcery), effects, .. }
                if matches!(effects[0], Effect::CreateToken { token: TokenSpec { kind: TokenKind::Drake, .. }, .. })
        ));
    }

    #[test]
    fn test_mana_ability_on_creature() {
        let c = card("Llanowar Elves", CardType::Creature, "{T}: Add {G}.");
        let abilities = parse_card_abilities(&c);
        assert_eq!(
            abilities,
            vec![ParsedAbility::Activated {
                cost: AbilityCost { tap: true, ..Default::default() },
                effects: vec![Effect::AddMana(ManaProduction::Fixed(vec![ManaColor::Green]))],
                raw_text: "{T}: Add {G}".to_string(),
            }]
        );
    }

    #[test]
    fn test_krenko_activated() {
        let c = card(
            "Krenko, Mob Boss",
            CardType::Creature,
            "{T}: Create X 1/1 red Goblin creature tokens, where X is the number of Goblins you control.",
        );
        let abilities = activated_abilities(&c);
        assert_eq!(abilities.len(), 1);
        assert_eq!(
            abilities[0].effects(),
            &[Effect::CreateToken { token: TokenSpec::new(TokenKind::Goblin), count: Amount::GoblinsYouControl }]
        );
    }

    #[test]
    fn test_sacrifice_cost_qualifier() {
        let c = card("Goblin Bombardment", CardType::Enchantment, "Sacrifice a creature: Goblin Bombardment deals 1 damage to any target.");
        match &parse_card_abilities(&c)[0] {
            ParsedAbility::Activated { cost, .. } => {
                assert_eq!(cost.sacrifice, Some(SacrificeCost::Another("creature".to_string())));
                assert!(!cost.tap);
            }
            other => panic!("expected activated, got {:?}", other),
        }
    }

    #[test]
    fn test_panorama_sacrifice_self_and_search() {
        let c = card(
            "Jund Panorama",
            CardType::Land,
            "{T}: Add {C}.\n{1}, {T}, Sacrifice Jund Panorama: Search your library for a basic Swamp, Mountain, or Forest card, put it onto the battlefield tapped, then shuffle.",
        );
        let abilities = activated_abilities(&c);
        assert_eq!(abilities.len(), 2);
        match &abilities[1] {
            ParsedAbility::Activated { cost, effects, .. } => {
                assert!(cost.tap);
                assert_eq!(cost.sacrifice, Some(SacrificeCost::This));
                assert_eq!(cost.mana.as_ref().map(|m| m.generic), Some(1));
                assert!(matches!(
                    &effects[0],
                    Effect::SearchLibrary(SearchSpec::BasicOfTypes { sacrifice_source: false, tapped: true, .. })
                ));
            }
            other => panic!("expected activated, got {:?}", other),
        }
    }

    #[test]
    fn test_minus_counter_and_life_costs() {
        let c = card("Test", CardType::Creature, "Pay 2 life, put a -1/-1 counter on Test: Draw a card.");
        match &parse_card_abilities(&c)[0] {
            ParsedAbility::Activated { cost, effects, .. } => {
                assert_eq!(cost.life, 2);
                assert!(cost.minus_counter_on_self);
                assert_eq!(effects, &vec![Effect::DrawCards { amount: Amount::Fixed(1) }]);
            }
            other => panic!("expected activated, got {:?}", other),
        }
    }

    #[test]
    fn test_inert_activated_ability_kept() {
        let c = card("Test", CardType::Artifact, "{2}, {T}: Exile target card from a graveyard.");
        let abilities = parse_card_abilities(&c);
        assert!(matches!(&abilities[0], ParsedAbility::Activated { effects, .. } if effects.is_empty()));
    }

    #[test]
    fn test_two_sentence_enters_search_is_one_ability() {
        let c = card(
            "Riveteers Overlook",
            CardType::Land,
            "When Riveteers Overlook enters the battlefield, sacrifice it. When you do, search your library for a basic Swamp, Mountain, or Forest card, put it onto the battlefield tapped, then shuffle and you gain 1 life.",
        );
        let abilities = parse_card_abilities(&c);
        assert_eq!(abilities.len(), 1);
        match &abilities[0] {
            ParsedAbility::Triggered { condition, effects, .. } => {
                assert_eq!(*condition, TriggerCondition::EntersBattlefield);
                assert_eq!(
                    effects,
                    &vec![Effect::SearchLibrary(SearchSpec::BasicOfTypes {
                        land_types: vec!["Swamp".to_string(), "Mountain".to_string(), "Forest".to_string()],
                        tapped: true,
                        sacrifice_source: true,
                    })]
                );
            }
            other => panic!("expected triggered, got {:?}", other),
        }
    }

    #[test]
    fn test_trigger_classification_order() {
        let cases = [
            ("Landfall — Whenever a land you control enters, create a 5/5 red and green Elemental creature token.", TriggerCondition::Landfall),
            ("Whenever you put one or more -1/-1 counters on a creature, you may pay {1}.", TriggerCondition::PutCounter),
            ("Whenever Goblin Lackey deals damage to a player, draw a card.", TriggerCondition::DealsDamage),
            ("Whenever Hapatra deals combat damage to a player, draw a card.", TriggerCondition::DealsCombatDamageToPlayer),
            ("Whenever Blood Artist or another creature dies, target player loses 1 life and you gain 1 life.", TriggerCondition::DiesOtherCreature { yours_only: false }),
            ("When Test dies, draw a card.", TriggerCondition::Dies),
            ("When Test enters, draw a card.", TriggerCondition::EntersBattlefield),
            ("Whenever Test attacks, draw a card.", TriggerCondition::Attacks),
            ("At the beginning of your upkeep, draw a card.", TriggerCondition::Upkeep),
            ("At the beginning of your end step, draw a card.", TriggerCondition::Other),
        ];
        for (text, expected) in cases {
            let c = card("Test", CardType::Creature, text);
            match &parse_card_abilities(&c)[0] {
                ParsedAbility::Triggered { condition, .. } => assert_eq!(condition, &expected, "{}", text),
                other => panic!("{} parsed as {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_eminence_tribal_filter() {
        let c = card(
            "Edgar Markov",
            CardType::Creature,
            "Eminence — Whenever you cast another Vampire spell, if Edgar Markov is in the command zone or on the battlefield, create a 1/1 black Vampire creature token.\nFirst strike, haste",
        );
        let abilities = parse_card_abilities(&c);
        assert!(matches!(
            &abilities[0],
            ParsedAbility::Triggered { condition: TriggerCondition::CastSpell(SpellFilter::Tribal(t)), effects, .. }
                if t == "vampire" && effects.len() == 1
        ));
        assert!(has_keyword(&c, Keyword::FirstStrike));
        assert!(has_keyword(&c, Keyword::Haste));
    }

    #[test]
    fn test_static_lord_text() {
        let c = card("Goblin King", CardType::Creature, "Other Goblin creatures you control get +1/+1 and have mountainwalk.");
        assert!(matches!(&parse_card_abilities(&c)[0], ParsedAbility::Static { .. }));
    }

    #[test]
    fn test_converge_spell() {
        let c = card(
            "Painful Truths",
            CardType::Sorcery,
            "Converge — You draw X cards and you lose X life, where X is the number of colors of mana spent to cast this spell.",
        );
        assert_eq!(
            parse_spell_effect(&c),
            Some(ParsedAbility::Spell {
                converge: true,
                effects: vec![
                    Effect::DrawCards { amount: Amount::Converge },
                    Effect::LoseLife { amount: Amount::Converge, who: PlayerTarget::You },
                ],
                raw_text: c.oracle_text.clone(),
            })
        );
    }

    #[test]
    fn test_spell_effect_only_for_spells() {
        let bolt = card("Lightning Bolt", CardType::Instant, "Lightning Bolt deals 3 damage to any target.");
        assert!(matches!(
            parse_spell_effect(&bolt),
            Some(ParsedAbility::Spell { converge: false, ref effects, .. })
                if effects == &vec![Effect::DealDamage { amount: Amount::Fixed(3), target: DamageTarget::AnyTarget }]
        ));
        let creature = card("Bear", CardType::Creature, "");
        assert_eq!(parse_spell_effect(&creature), None);
    }

    #[test]
    fn test_spell_keeps_every_clause() {
        let whisper = card("Night's Whisper", CardType::Sorcery, "You draw two cards and you lose 2 life.");
        assert!(matches!(
            parse_spell_effect(&whisper),
            Some(ParsedAbility::Spell { converge: false, ref effects, .. })
                if effects == &vec![
                    Effect::DrawCards { amount: Amount::Fixed(2) },
                    Effect::LoseLife { amount: Amount::Fixed(2), who: PlayerTarget::You },
                ]
        ));

        let opt = card("Opt", CardType::Instant, "Scry 1.\nDraw a card.");
        assert!(matches!(
            parse_spell_effect(&opt),
            Some(ParsedAbility::Spell { ref effects, .. })
                if effects == &vec![Effect::Scry { amount: 1 }, Effect::DrawCards { amount: Amount::Fixed(1) }]
        ));
    }

    #[test]
    fn test_token_keyword_stays_on_token() {
        let c = card("Hapatra", CardType::Creature, "Whenever you put one or more -1/-1 counters on a creature, you may pay {1}. If you do, create a 1/1 green Snake creature token with deathtouch.");
        assert!(!has_keyword(&c, Keyword::Deathtouch));
    }

    #[test]
    fn test_mixed_keyword_line_keeps_keywords() {
        let c = card("Test", CardType::Creature, "Flying, protection from red");
        assert_eq!(parse_card_abilities(&c), vec![ParsedAbility::Keyword(Keyword::Flying)]);

        let c = card("Test", CardType::Creature, "Trample, ward {2}\nVigilance and haste");
        assert!(has_keyword(&c, Keyword::Trample));
        assert!(has_keyword(&c, Keyword::Vigilance));
        assert!(has_keyword(&c, Keyword::Haste));
        assert!(!has_keyword(&c, Keyword::Flying));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let c = card("Hapatra", CardType::Creature, "Whenever Hapatra deals combat damage to a player, you may put a -1/-1 counter on target creature.\nWhenever you put one or more -1/-1 counters on a creature, you may pay {1}. If you do, create a 1/1 green Snake creature token with deathtouch.");
        assert_eq!(parse_card_abilities(&c), parse_card_abilities(&c));
    }

    #[test]
    fn test_garbage_text_never_panics() {
        let c = card("Test", CardType::Creature, ":::..\n(unclosed {T");
        let _ = parse_card_abilities(&c);
        let empty = card("Vanilla", CardType::Creature, "");
        assert!(parse_card_abilities(&empty).is_empty());
    }
}
