//! # Costing Module
//!
//! Ingredient costing and product pricing/margin math.
//!
//! ## The Real-Cost Insight
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  YIELD CHANGES WHAT A KILOGRAM COSTS                                    │
//! │                                                                         │
//! │  Bought 1 kg of potatoes for R$ 10. After peeling, 50% is usable.      │
//! │                                                                         │
//! │  The recipe that consumes "1 kg of peeled potato" really consumed      │
//! │  2 kg of purchased potato ──► its cost is R$ 20, not R$ 10.            │
//! │                                                                         │
//! │  price_per_base_unit = purchase_price / (base_qty × yield_factor)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Markup-Divisor Method
//! Fixed costs and taxes are expressed as fractions *of revenue*, so a
//! naive `cost × (1 + margin)` markup understates the price. The closed
//! form for "what price P makes cost/P equal the target expense ratios"
//! is:
//!
//! ```text
//! P = ingredient_cost / (1 - (fixed% + variable% + profit%))
//! ```
//!
//! Once the deductions approach 100% of revenue the divisor collapses and
//! no price works; the engine reports 0 as a "cannot price" sentinel.

use rust_decimal::Decimal;

use crate::money::Money;
use crate::types::{AppSettings, CalculatedProduct, CostBreakdown, FixedCost, Ingredient, Product};
use crate::units::Unit;
use crate::MIN_PRICING_DIVISOR;

// =============================================================================
// Ingredient Costing
// =============================================================================

/// Computes the monetary cost of consuming `quantity_used` of an
/// ingredient, accounting for purchase packaging and waste.
///
/// ## Algorithm
/// 1. Normalize the purchased package to base units (g/ml/un)
/// 2. Gross the package down by the yield factor: less usable material
///    means a proportionally higher effective unit price
/// 3. Normalize the consumed quantity and multiply
///
/// ## Sentinels (never panics, never negative)
/// - Cross-dimension units (bought in kg, used in un): cost 0
/// - Non-positive package quantity: cost 0
///
/// ## Example
/// ```rust
/// use brasa_core::costing::ingredient_cost;
/// use brasa_core::money::Money;
/// use brasa_core::types::Ingredient;
/// use brasa_core::units::Unit;
/// use rust_decimal::Decimal;
///
/// let mut beef = Ingredient::new(
///     "ing-1",
///     "Ground beef",
///     Unit::Kilogram,
///     Decimal::ONE,
///     Money::new(Decimal::from(40)),
/// );
/// beef.yield_percent = Some(Decimal::from(50));
///
/// // 1 kg net at 50% yield needs 2 kg purchased: R$ 80
/// let cost = ingredient_cost(&beef, Decimal::ONE, Unit::Kilogram);
/// assert_eq!(cost.amount(), Decimal::from(80));
/// ```
pub fn ingredient_cost(ingredient: &Ingredient, quantity_used: Decimal, unit_used: Unit) -> Money {
    // Dimensionally nonsensical pairing: defined as a zero contribution,
    // never a silent multiply-through.
    if !unit_used.is_compatible(ingredient.purchase_unit) {
        return Money::zero();
    }

    let base_purchase_qty = ingredient
        .purchase_unit
        .to_base(ingredient.purchase_quantity);
    if base_purchase_qty <= Decimal::ZERO {
        return Money::zero();
    }

    let price_per_base_unit =
        ingredient.purchase_price / (base_purchase_qty * ingredient.yield_factor());
    let base_used_qty = unit_used.to_base(quantity_used);

    price_per_base_unit * base_used_qty
}

/// Values the on-hand stock of an ingredient at its purchase price.
///
/// Stock is kept in purchase units, so this is simply
/// `stock × price / package` - the replacement value shown on the
/// inventory screen totals.
pub fn ingredient_stock_value(ingredient: &Ingredient) -> Money {
    if ingredient.purchase_quantity <= Decimal::ZERO {
        return Money::zero();
    }
    (ingredient.purchase_price / ingredient.purchase_quantity) * ingredient.current_stock
}

// =============================================================================
// Product Metrics
// =============================================================================

/// Derives the full cost breakdown, suggested price and realized margin
/// for a product.
///
/// ## Steps
/// 1. **Ingredient cost (CMV)**: sum [`ingredient_cost`] over every
///    recipe line whose ingredient still resolves; dangling references
///    contribute nothing (a deleted ingredient must not take the whole
///    catalog view down with it)
/// 2. **Overhead percentages**: fixed costs spread over the estimated
///    monthly billing (floored at 1 to avoid dividing by zero), the
///    tax/loss percentage, and the target margin, all as fractions of
///    revenue
/// 3. **Suggested price**: markup-divisor method; divisor at or below
///    [`MIN_PRICING_DIVISOR`] reports the 0 sentinel
/// 4. **Current-price reality**: how the price actually charged splits
///    into ingredient/fixed/variable cost and what net margin remains;
///    an unpriced product reports exactly -100%
pub fn product_metrics(
    product: &Product,
    ingredients: &[Ingredient],
    fixed_costs: &[FixedCost],
    settings: &AppSettings,
) -> CalculatedProduct {
    // 1. Ingredient cost (CMV)
    let cost_ingredients: Money = product
        .recipe
        .iter()
        .filter_map(|item| {
            ingredients
                .iter()
                .find(|ing| ing.id == item.ingredient_id)
                .map(|ing| ingredient_cost(ing, item.quantity_used, item.unit_used))
        })
        .sum();

    // 2. Overhead percentages, as fractions of revenue
    let total_fixed: Money = fixed_costs.iter().map(|cost| cost.amount).sum();
    let billing = settings
        .estimated_monthly_billing
        .amount()
        .max(Decimal::ONE);
    let fixed_cost_percent = total_fixed.amount() / billing;
    let variable_cost_percent = settings.tax_and_loss_percent / Decimal::ONE_HUNDRED;
    let target_profit_percent = settings.target_margin / Decimal::ONE_HUNDRED;

    // 3. Suggested price (markup-divisor method)
    let divisor =
        Decimal::ONE - (fixed_cost_percent + variable_cost_percent + target_profit_percent);
    let suggested_price = if divisor > MIN_PRICING_DIVISOR {
        cost_ingredients / divisor
    } else {
        Money::zero()
    };

    // 4. Current-price reality
    let current_price = product.current_price;
    let cost_variable = current_price * variable_cost_percent;
    let cost_fixed = current_price * fixed_cost_percent;
    let total_cost = cost_ingredients + cost_fixed + cost_variable;

    let current_margin = if current_price.is_positive() {
        let net_profit = current_price - total_cost;
        net_profit.amount() / current_price.amount() * Decimal::ONE_HUNDRED
    } else {
        // unpriced or free: total loss
        -Decimal::ONE_HUNDRED
    };

    CalculatedProduct {
        product: product.clone(),
        cost_ingredients,
        cost_fixed,
        cost_variable,
        total_cost,
        suggested_price,
        current_margin,
        is_profitable: current_margin >= settings.target_margin,
        breakdown: CostBreakdown {
            fixed_cost_percent: fixed_cost_percent * Decimal::ONE_HUNDRED,
            variable_cost_percent: variable_cost_percent * Decimal::ONE_HUNDRED,
            profit_percent: target_profit_percent * Decimal::ONE_HUNDRED,
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn assert_close(actual: Decimal, expected: Decimal) {
        assert!(
            (actual - expected).abs() < dec!(0.0001),
            "expected {expected}, got {actual}"
        );
    }

    fn ingredient(
        id: &str,
        unit: Unit,
        quantity: Decimal,
        price: Decimal,
        yield_percent: Option<Decimal>,
    ) -> Ingredient {
        let mut ing = Ingredient::new(id, id, unit, quantity, Money::new(price));
        ing.yield_percent = yield_percent;
        ing
    }

    fn settings() -> AppSettings {
        AppSettings {
            business_name: "Test Biz".to_string(),
            target_margin: dec!(20),
            tax_and_loss_percent: dec!(10),
            estimated_monthly_billing: Money::new(dec!(10000)),
        }
    }

    fn fixed_costs() -> Vec<FixedCost> {
        vec![FixedCost {
            id: "fc-1".to_string(),
            name: "Rent".to_string(),
            amount: Money::new(dec!(2000)),
        }]
    }

    fn product_with(recipe: Vec<crate::types::RecipeItem>, price: Decimal) -> Product {
        Product {
            id: "p-1".to_string(),
            name: "Burger".to_string(),
            category: "Food".to_string(),
            description: None,
            preparation_method: None,
            current_price: Money::new(price),
            recipe,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn line(ingredient_id: &str, quantity: Decimal, unit: Unit) -> crate::types::RecipeItem {
        crate::types::RecipeItem {
            ingredient_id: ingredient_id.to_string(),
            quantity_used: quantity,
            unit_used: unit,
        }
    }

    // -------------------------------------------------------------------------
    // ingredient_cost
    // -------------------------------------------------------------------------

    /// R$ 10 buys 1 kg at full yield; 500 g costs R$ 5.
    #[test]
    fn test_cost_simple_kg_to_g() {
        let ing = ingredient("flour", Unit::Kilogram, dec!(1), dec!(10), Some(dec!(100)));
        let cost = ingredient_cost(&ing, dec!(500), Unit::Gram);
        assert_eq!(cost.amount(), dec!(5));
    }

    /// At 50% yield the effective unit price doubles: 1 kg net costs R$ 20.
    #[test]
    fn test_cost_grosses_up_for_yield() {
        let ing = ingredient("potato", Unit::Kilogram, dec!(1), dec!(10), Some(dec!(50)));
        let cost = ingredient_cost(&ing, dec!(1), Unit::Kilogram);
        assert_eq!(cost.amount(), dec!(20));
    }

    /// With full yield the cost equals naive unit price × base quantity.
    #[test]
    fn test_full_yield_matches_naive_price() {
        let ing = ingredient("oil", Unit::Liter, dec!(5), dec!(45), None);
        // naive: 45 / 5000 ml = 0.009/ml; 300 ml = 2.7
        let cost = ingredient_cost(&ing, dec!(300), Unit::Milliliter);
        assert_eq!(cost.amount(), dec!(2.7));
    }

    /// Halving the yield exactly doubles the cost.
    #[test]
    fn test_halving_yield_doubles_cost() {
        let full = ingredient("bacon", Unit::Kilogram, dec!(1), dec!(45), Some(dec!(80)));
        let half = ingredient("bacon", Unit::Kilogram, dec!(1), dec!(45), Some(dec!(40)));

        let cost_full = ingredient_cost(&full, dec!(250), Unit::Gram);
        let cost_half = ingredient_cost(&half, dec!(250), Unit::Gram);
        assert_eq!(cost_half.amount(), cost_full.amount() * dec!(2));
    }

    /// Cost is linear in the quantity used.
    #[test]
    fn test_cost_is_linear_in_quantity() {
        let ing = ingredient("cheese", Unit::Kilogram, dec!(1), dec!(65), Some(dec!(97)));
        let one = ingredient_cost(&ing, dec!(120), Unit::Gram);
        let two = ingredient_cost(&ing, dec!(240), Unit::Gram);
        assert_close(two.amount(), one.amount() * dec!(2));
    }

    /// Countable ingredients cost per piece.
    #[test]
    fn test_cost_countable_units() {
        // 6 buns for R$ 15
        let ing = ingredient("bun", Unit::Each, dec!(6), dec!(15), None);
        let cost = ingredient_cost(&ing, dec!(1), Unit::Each);
        assert_eq!(cost.amount(), dec!(2.5));
    }

    /// Cross-dimension pairing is a defined zero, not a wrong number.
    #[test]
    fn test_cost_cross_dimension_is_zero() {
        let ing = ingredient("beef", Unit::Kilogram, dec!(1), dec!(38.90), None);
        assert_eq!(ingredient_cost(&ing, dec!(2), Unit::Each), Money::zero());
        assert_eq!(
            ingredient_cost(&ing, dec!(100), Unit::Milliliter),
            Money::zero()
        );
    }

    /// A zero-sized package cannot be divided into a unit price.
    #[test]
    fn test_cost_zero_package_is_zero() {
        let ing = ingredient("ghost", Unit::Kilogram, dec!(0), dec!(10), None);
        assert_eq!(ingredient_cost(&ing, dec!(500), Unit::Gram), Money::zero());
    }

    /// A malformed stored yield of 0 behaves as full yield, not a crash.
    #[test]
    fn test_cost_zero_yield_treated_as_full() {
        let ing = ingredient("legacy", Unit::Kilogram, dec!(1), dec!(10), Some(dec!(0)));
        let cost = ingredient_cost(&ing, dec!(500), Unit::Gram);
        assert_eq!(cost.amount(), dec!(5));
    }

    #[test]
    fn test_stock_value() {
        let mut ing = ingredient("fries", Unit::Kilogram, dec!(2.5), dec!(35), None);
        ing.current_stock = dec!(10);
        // 35 / 2.5 = 14 per kg; 10 kg on hand
        assert_eq!(ingredient_stock_value(&ing).amount(), dec!(140));

        ing.purchase_quantity = Decimal::ZERO;
        assert_eq!(ingredient_stock_value(&ing), Money::zero());
    }

    // -------------------------------------------------------------------------
    // product_metrics
    // -------------------------------------------------------------------------

    /// The reference scenario: fixed 20%, variable 10%, target 20%,
    /// R$ 10 of ingredients, charged at R$ 30.
    #[test]
    fn test_metrics_reference_scenario() {
        let ingredients = vec![ingredient(
            "meat",
            Unit::Kilogram,
            dec!(1),
            dec!(50),
            Some(dec!(100)),
        )];
        let product = product_with(vec![line("meat", dec!(200), Unit::Gram)], dec!(30));

        let calc = product_metrics(&product, &ingredients, &fixed_costs(), &settings());

        assert_eq!(calc.cost_ingredients.amount(), dec!(10));
        // suggested: 10 / (1 - 0.5) = 20
        assert_eq!(calc.suggested_price.amount(), dec!(20));
        // reality at R$ 30: fixed 6, variable 3, total 19
        assert_eq!(calc.cost_fixed.amount(), dec!(6));
        assert_eq!(calc.cost_variable.amount(), dec!(3));
        assert_eq!(calc.total_cost.amount(), dec!(19));
        assert_close(calc.current_margin, dec!(36.6667));
        assert!(calc.is_profitable);

        assert_eq!(calc.breakdown.fixed_cost_percent, dec!(20));
        assert_eq!(calc.breakdown.variable_cost_percent, dec!(10));
        assert_eq!(calc.breakdown.profit_percent, dec!(20));
    }

    /// An empty recipe costs nothing and suggests nothing.
    #[test]
    fn test_metrics_empty_recipe() {
        let product = product_with(vec![], dec!(30));
        let calc = product_metrics(&product, &[], &fixed_costs(), &settings());

        assert_eq!(calc.cost_ingredients, Money::zero());
        assert_eq!(calc.suggested_price, Money::zero());
    }

    /// A recipe line pointing at a deleted ingredient contributes nothing.
    #[test]
    fn test_metrics_skips_dangling_ingredients() {
        let ingredients = vec![ingredient(
            "meat",
            Unit::Kilogram,
            dec!(1),
            dec!(50),
            None,
        )];
        let product = product_with(
            vec![
                line("meat", dec!(200), Unit::Gram),
                line("deleted-ing", dec!(100), Unit::Gram),
            ],
            dec!(30),
        );

        let calc = product_metrics(&product, &ingredients, &[], &settings());
        assert_eq!(calc.cost_ingredients.amount(), dec!(10));
    }

    /// An unpriced product reports exactly -100%, never a division crash.
    #[test]
    fn test_metrics_unpriced_product_is_total_loss() {
        let product = product_with(vec![], dec!(0));
        let calc = product_metrics(&product, &[], &fixed_costs(), &settings());

        assert_eq!(calc.current_margin, dec!(-100));
        assert!(!calc.is_profitable);
        assert_eq!(calc.cost_fixed, Money::zero());
        assert_eq!(calc.cost_variable, Money::zero());
    }

    /// Deductions at or beyond ~99% of revenue make pricing infeasible.
    #[test]
    fn test_metrics_infeasible_pricing_sentinel() {
        let ingredients = vec![ingredient("meat", Unit::Kilogram, dec!(1), dec!(50), None)];
        let product = product_with(vec![line("meat", dec!(200), Unit::Gram)], dec!(30));

        let mut greedy = settings();
        greedy.target_margin = dec!(80);
        greedy.tax_and_loss_percent = dec!(30);
        // fixed 20% + variable 30% + profit 80% = 130% of revenue
        let calc = product_metrics(&product, &ingredients, &fixed_costs(), &greedy);
        assert_eq!(calc.suggested_price, Money::zero());
    }

    /// Billing of zero falls back to 1, not a division by zero.
    #[test]
    fn test_metrics_zero_billing_guard() {
        let mut s = settings();
        s.estimated_monthly_billing = Money::zero();
        let product = product_with(vec![], dec!(30));

        let calc = product_metrics(&product, &[], &fixed_costs(), &s);
        // 2000 / 1 = 200000% fixed share - absurd but finite, and the
        // divisor collapses to the sentinel
        assert_eq!(calc.suggested_price, Money::zero());
        assert_eq!(calc.breakdown.fixed_cost_percent, dec!(200000));
    }

    /// Charging exactly the suggested price realizes exactly the target
    /// margin (the whole point of the markup-divisor method).
    #[test]
    fn test_metrics_round_trip_suggested_price_hits_target() {
        let ingredients = vec![ingredient(
            "meat",
            Unit::Kilogram,
            dec!(1),
            dec!(47.30),
            Some(dec!(91)),
        )];
        let mut product = product_with(vec![line("meat", dec!(185), Unit::Gram)], dec!(0));

        let s = settings();
        let first = product_metrics(&product, &ingredients, &fixed_costs(), &s);
        assert!(first.suggested_price.is_positive());

        product.current_price = first.suggested_price;
        let second = product_metrics(&product, &ingredients, &fixed_costs(), &s);
        assert_close(second.current_margin, s.target_margin);
    }
}
