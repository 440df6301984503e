use crate::card::abilities::{activated_abilities, ParsedAbility};
use crate::card::effects::{Effect, ManaProduction};
use crate::card::types::{CardDefinition, ManaColor, ManaCost};
use crate::game::player::Player;
use crate::game::zones::{CardInstance, InstanceId};
use serde::Serialize;

/// Mana pool tracking each color and colorless mana
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ManaPool {
    pub white: u32,
    pub blue: u32,
    pub black: u32,
    pub red: u32,
    pub green: u32,
    pub colorless: u32,
}

impl ManaPool {
    pub fn new() -> Self {
        Self::default()
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

    /// Add mana of a specific color
    pub fn add(&mut self, color: ManaColor, amount: u32) {
        *self.amount_mut(color) += amount;
    }

    /// Remove mana if enough is present; never goes below zero
    pub fn spend(&mut self, color: ManaColor, amount: u32) -> bool {
        let slot = self.amount_mut(color);
        if *slot < amount {
            return false;
        }
        *slot -= amount;
        true
    }

    pub fn total(&self) -> u32 {
        ManaColor::ALL.iter().map(|&c| self.amount(c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Color holding the largest balance, WUBRGC order on ties
    pub fn richest(&self) -> Option<ManaColor> {
        let mut best: Option<(ManaColor, u32)> = None;
        for color in ManaColor::ALL {
            let amount = self.amount(color);
            if amount > 0 && best.map_or(true, |(_, b)| amount > b) {
                best = Some((color, amount));
            }
        }
        best.map(|(c, _)| c)
    }

    /// Distinct real colors present (the converge count)
    pub fn distinct_colors(&self) -> u32 {
        ManaColor::COLORED.iter().filter(|&&c| self.amount(c) > 0).count() as u32
    }

    /// Clear the mana pool
    pub fn clear(&mut self) {
        *self = ManaPool::default();
    }
}

/// What a land offers when tapped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LandMana {
    /// Every symbol is produced
    Fixed(Vec<ManaColor>),
    /// One symbol of the tapper's choice
    Choice(Vec<ManaColor>),
}

impl LandMana {
    pub fn can_produce(&self, color: ManaColor) -> bool {
        match self {
            LandMana::Fixed(colors) | LandMana::Choice(colors) => colors.contains(&color),
        }
    }

    /// Number of distinct colors on offer; lower is less flexible
    pub fn flexibility(&self) -> usize {
        match self {
            LandMana::Fixed(colors) | LandMana::Choice(colors) => {
                let mut distinct = colors.clone();
                distinct.sort();
                distinct.dedup();
                distinct.len()
            }
        }
    }

    /// Mana added when tapped for `wanted` (or for generic when `None`)
    fn produce(&self, wanted: Option<ManaColor>) -> Vec<ManaColor> {
        match self {
            LandMana::Fixed(colors) => colors.clone(),
            LandMana::Choice(colors) => {
                let pick = wanted
                    .filter(|w| colors.contains(w))
                    .or_else(|| colors.first().copied())
                    .unwrap_or(ManaColor::Colorless);
                vec![pick]
            }
        }
    }
}

/// Derive what a land taps for.
///
/// Prefers the card's own `{T}: Add ...` ability; falls back to basic land
/// names and color words in the card name; defaults to colorless.
pub fn land_mana(card: &CardDefinition) -> LandMana {
    for ability in activated_abilities(card) {
        if let ParsedAbility::Activated { cost, effects, .. } = &ability {
            if !cost.tap || cost.mana.is_some() || cost.sacrifice.is_some() {
                continue;
            }
            match effects.first() {
                Some(Effect::AddMana(ManaProduction::Fixed(colors))) => return LandMana::Fixed(colors.clone()),
                Some(Effect::AddMana(ManaProduction::OneOf(colors))) => return LandMana::Choice(colors.clone()),
                Some(Effect::AddMana(ManaProduction::AnyColor { .. })) => {
                    return LandMana::Choice(ManaColor::COLORED.to_vec())
                }
                _ => {}
            }
        }
    }

    let name = card.name.to_lowercase();
    let color_words = ["white", "blue", "black", "red", "green"];
    for (color, word) in ManaColor::COLORED.iter().zip(color_words) {
        let basic = color.basic_land_type().map(str::to_lowercase).unwrap_or_default();
        if name.contains(&basic) || name.contains(word) {
            return LandMana::Fixed(vec![*color]);
        }
    }
    LandMana::Fixed(vec![ManaColor::Colorless])
}

/// Result of committing a payment
#[derive(Debug, Clone)]
pub struct Payment {
    pub player: Player,
    /// Mana actually spent, by color
    pub spent: ManaPool,
}

struct PaymentPlan {
    taps: Vec<InstanceId>,
    pool_after: ManaPool,
    spent: ManaPool,
}

/// Plan a payment without touching the player.
///
/// Colored requirements go first, scarcest color first: the pool is used
/// before any land, and lands are committed least-flexible first. Generic
/// then spends the richest pool color, tapping any remaining land whenever the
/// pool runs dry.
fn plan_payment(player: &Player, cost: &ManaCost) -> Option<PaymentPlan> {
    let mut lands: Vec<(InstanceId, LandMana)> = player
        .zones
        .battlefield
        .iter()
        .filter(|c| c.is_land() && !c.tapped)
        .map(|c: &CardInstance| (c.id, land_mana(&c.definition)))
        .collect();
    let mut pool = player.mana_pool;
    let mut spent = ManaPool::new();
    let mut taps = Vec::new();

    let mut requirements = cost.specific_requirements();
    requirements.sort_by_key(|(color, _)| lands.iter().filter(|(_, m)| m.can_produce(*color)).count());

    for (color, need) in requirements {
        while pool.amount(color) < need {
            let index = lands
                .iter()
                .enumerate()
                .filter(|(_, (_, m))| m.can_produce(color))
                .min_by_key(|(_, (_, m))| m.flexibility())
                .map(|(i, _)| i)?;
            let (id, mana) = lands.remove(index);
            for produced in mana.produce(Some(color)) {
                pool.add(produced, 1);
            }
            taps.push(id);
        }
        pool.spend(color, need);
        spent.add(color, need);
    }

    let mut generic = cost.generic;
    while generic > 0 {
        if pool.is_empty() {
            let index = lands
                .iter()
                .enumerate()
                .min_by_key(|(_, (_, m))| m.flexibility())
                .map(|(i, _)| i)?;
            let (id, mana) = lands.remove(index);
            for produced in mana.produce(None) {
                pool.add(produced, 1);
            }
            taps.push(id);
        }
        let color = pool.richest()?;
        pool.spend(color, 1);
        spent.add(color, 1);
        generic -= 1;
    }

    Some(PaymentPlan { taps, pool_after: pool, spent })
}

/// Feasibility check against pool plus untapped lands. Taps nothing.
pub fn can_pay_cost(player: &Player, cost: &ManaCost) -> bool {
    plan_payment(player, cost).is_some()
}

/// Commit a payment, returning the updated player and the mana spent.
///
/// `None` when the cost cannot be met; callers validate with
/// [`can_pay_cost`] first.
pub fn pay_cost(player: &Player, cost: &ManaCost) -> Option<Payment> {
    let plan = plan_payment(player, cost)?;
    let mut player = player.clone();
    for id in &plan.taps {
        if let Some(land) = player.zones.battlefield.iter_mut().find(|c| c.id == *id) {
            land.tapped = true;
        }
    }
    player.mana_pool = plan.pool_after;
    Some(Payment { player, spent: plan.spent })
}

/// Distinct colors among the mana spent to cast a spell
pub fn converge_count(spent: &ManaPool) -> u32 {
    spent.distinct_colors()
}

/// Color a free choice resolves to: the color the hand asks for most,
/// WUBRG order on ties
pub fn preferred_color(player: &Player, options: &[ManaColor]) -> ManaColor {
    let demand = |color: ManaColor| -> u32 {
        player.zones.hand.iter().map(|c| c.definition.cost().amount(color)).sum()
    };
    let mut best: Option<(ManaColor, u32)> = None;
    for &color in options {
        let d = demand(color);
        if best.map_or(true, |(_, b)| d > b) {
            best = Some((color, d));
        }
    }
    best.map(|(c, _)| c).unwrap_or(ManaColor::Colorless)
}
