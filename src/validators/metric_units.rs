use super::{structural_precondition, ValidationInput};
use crate::model::{ValidationResult, Violation, ViolationKind};
use crate::tables::RuleTables;

/// Where a line lives in the draft, for messages and `field`
struct Location<'a> {
    field: &'static str,
    label: &'a str,
    number: usize,
}

fn fahrenheit_to_celsius(f: f64) -> i64 {
    // round to the nearest 5, the way oven dials are marked
    let c = (f - 32.0) * 5.0 / 9.0;
    ((c / 5.0).round() * 5.0) as i64
}

fn check_line(tables: &RuleTables, text: &str, at: &Location, out: &mut Vec<Violation>) {
    let mut claimed: Vec<(usize, usize)> = Vec::new();

    for unit in tables.imperial_units() {
        for m in unit.regex.find_iter(text) {
            // "8 fl oz" is already reported as fluid ounces
            if claimed.iter().any(|&(s, e)| m.start() < e && s < m.end()) {
                continue;
            }
            claimed.push((m.start(), m.end()));

            let found = m.as_str().trim();
            out.push(Violation::new(
                ViolationKind::NonMetricUnit,
                Some(at.field),
                format!("{} {} uses {} (\"{found}\")", at.label, at.number, unit.name),
                format!(
                    "Convert \"{found}\" in {} {} to metric ({}).",
                    at.label.to_lowercase(),
                    at.number,
                    unit.conversion
                ),
            ));
        }
    }

    for caps in tables.fahrenheit().captures_iter(text) {
        let found = caps.get(0).map_or("", |m| m.as_str()).trim();
        let fix = match caps[1].parse::<f64>() {
            Ok(f) => format!(
                "Replace \"{found}\" in {} {} with {}°C.",
                at.label.to_lowercase(),
                at.number,
                fahrenheit_to_celsius(f)
            ),
            Err(_) => format!(
                "Give the temperature in {} {} in °C.",
                at.label.to_lowercase(),
                at.number
            ),
        };
        out.push(Violation::new(
            ViolationKind::NonMetricUnit,
            Some(at.field),
            format!("{} {} uses Fahrenheit (\"{found}\")", at.label, at.number),
            fix,
        ));
    }
}

/// Ingredients and steps must use metric measures; teaspoons and tablespoons are fine
pub fn validate(input: &ValidationInput) -> ValidationResult {
    if let Some(failed) = structural_precondition(&input.draft) {
        return failed;
    }

    let mut violations = Vec::new();

    for (i, ingredient) in input.draft.ingredients.iter().enumerate() {
        let at = Location {
            field: "ingredients",
            label: "Ingredient",
            number: i + 1,
        };
        check_line(&input.tables, ingredient, &at, &mut violations);
    }

    for (i, step) in input.draft.instructions.iter().enumerate() {
        let at = Location {
            field: "instructions",
            label: "Step",
            number: i + 1,
        };
        check_line(&input.tables, step, &at, &mut violations);
    }

    ValidationResult::from_violations(violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::test_support::input;

    #[test]
    fn test_metric_recipe_passes() {
        let input = input(
            &["250 g flour", "200 ml milk", "1 tsp salt", "2 tbsp olive oil"],
            &["Bake at 180°C for 25 minutes in a 20 cm tin"],
            &[],
            &[],
        );
        let result = validate(&input);
        assert!(result.valid, "{:?}", result.violations);
    }

    #[test]
    fn test_imperial_ingredients_flagged() {
        let input = input(
            &["2 cups flour", "1 lb ground beef", "8 fl oz stock"],
            &["Mix"],
            &[],
            &[],
        );
        let result = validate(&input);
        assert_eq!(result.violations.len(), 3);
        assert!(result.violations[0].fix_instruction.contains("240 ml"));
        assert!(result.violations[2].message.contains("fluid ounce"));
        assert!(result
            .violations
            .iter()
            .all(|v| v.field.as_deref() == Some("ingredients")));
    }

    #[test]
    fn test_fahrenheit_gets_converted_suggestion() {
        let input = input(&["1 chicken"], &["Roast at 350°F for an hour"], &[], &[]);
        let result = validate(&input);
        assert_eq!(result.violations.len(), 1);
        assert!(result.violations[0].fix_instruction.contains("175°C"));
        assert!(result.violations[0].message.starts_with("Step 1"));
    }

    #[test]
    fn test_fahrenheit_conversion_rounding() {
        assert_eq!(fahrenheit_to_celsius(350.0), 175);
        assert_eq!(fahrenheit_to_celsius(400.0), 205);
        assert_eq!(fahrenheit_to_celsius(212.0), 100);
    }
}
