//! Fixed vocabularies and lookup tables shared by the rule validators.
//!
//! Built once with [`RuleTables::standard`] and handed to validators by
//! reference; nothing in here is mutated after construction.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::model::{AllergyKey, ApplianceKey};
use crate::normalize::contains_word;

/// "gluten-free pasta", "dairy free", "nut-free": group 1 is the qualifier,
/// the whole match includes the word it qualifies
static FREE_FROM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([a-z]+)[- ]free\b(?:\s+[a-z-]+)?").expect("Valid regex pattern")
});

/// A quantity in front of a unit: digits, fractions, or a number word
const QUANTITY: &str = r"(?:\d+(?:[.,/]\d+)?(?:\s*-\s*\d+(?:[.,/]\d+)?)?|[½¼¾⅓⅔⅛]|\b(?:a|an|half|one|two|three|four|five|six)\b)";

/// An imperial unit and how to express it in metric
#[derive(Debug, Clone)]
pub struct ImperialUnit {
    pub name: &'static str,
    pub regex: Regex,
    pub conversion: &'static str,
}

/// A diet named in free-text preferences and the ingredients it rules out
#[derive(Debug, Clone)]
pub struct DietRule {
    pub name: &'static str,
    pub triggers: Vec<&'static str>,
    pub forbidden: Vec<&'static str>,
    /// Qualifiers that make a forbidden ingredient fit this diet ("vegan bacon")
    pub exemptions: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct RuleTables {
    allergen_synonyms: HashMap<AllergyKey, Vec<&'static str>>,
    allergen_false_friends: HashMap<AllergyKey, Vec<&'static str>>,
    allergen_substitutes: HashMap<AllergyKey, Vec<&'static str>>,
    appliance_keywords: HashMap<ApplianceKey, Vec<&'static str>>,
    imperial_units: Vec<ImperialUnit>,
    fahrenheit: Regex,
    diets: Vec<DietRule>,
}

const MEAT: &[&str] = &[
    "chicken", "beef", "pork", "bacon", "ham", "lamb", "turkey", "sausage", "veal", "duck",
    "prosciutto", "salami", "pancetta", "chorizo", "mince", "steak", "lard",
];
const SEAFOOD: &[&str] = &[
    "fish", "salmon", "tuna", "cod", "anchovy", "anchovies", "sardine", "trout", "shrimp",
    "prawn", "crab", "lobster", "mussel", "clam", "oyster", "scallop", "fish sauce",
];
const DAIRY: &[&str] = &[
    "milk", "butter", "cheese", "cream", "yogurt", "yoghurt", "ghee", "whey", "parmesan",
    "mozzarella", "ricotta",
];
const PLANT_BASED: &[&str] = &["vegan", "plant-based", "plant based"];
const MEATLESS: &[&str] = &[
    "vegan", "vegetarian", "plant-based", "plant based", "meatless", "meat-free", "imitation",
];
const GLUTEN: &[&str] = &[
    "wheat", "flour", "bread", "pasta", "spaghetti", "noodle", "barley", "rye", "couscous",
    "semolina", "breadcrumb", "panko",
];

fn imperial(name: &'static str, unit_pattern: &str, conversion: &'static str) -> ImperialUnit {
    let pattern = format!(r"(?i){QUANTITY}\s*-?\s*(?:{unit_pattern})");
    ImperialUnit {
        name,
        regex: Regex::new(&pattern).expect("Valid regex pattern"),
        conversion,
    }
}

impl RuleTables {
    pub fn standard() -> Self {
        use AllergyKey::*;

        let allergen_synonyms = HashMap::from([
            (
                Nuts,
                vec![
                    "almond", "walnut", "cashew", "pecan", "pistachio", "hazelnut",
                    "macadamia", "peanut", "brazil nut", "pine nut",
                ],
            ),
            (Peanuts, vec!["peanut", "groundnut", "arachis"]),
            (
                TreeNuts,
                vec![
                    "almond", "walnut", "cashew", "pecan", "pistachio", "hazelnut", "macadamia",
                    "brazil nut", "pine nut", "praline", "marzipan",
                ],
            ),
            (
                Dairy,
                vec![
                    "milk", "butter", "cheese", "cream", "yogurt", "yoghurt", "ghee", "whey",
                    "casein", "parmesan", "mozzarella", "ricotta", "custard",
                ],
            ),
            (Eggs, vec!["egg", "mayonnaise", "meringue", "aioli"]),
            (
                Gluten,
                vec![
                    "wheat", "flour", "bread", "pasta", "spaghetti", "noodle", "barley", "rye",
                    "couscous", "semolina", "breadcrumb", "panko", "seitan",
                ],
            ),
            (Soy, vec!["soya", "tofu", "edamame", "tempeh", "miso"]),
            (
                Fish,
                vec![
                    "salmon", "tuna", "cod", "anchovy", "anchovies", "sardine", "trout",
                    "haddock", "mackerel", "tilapia", "fish sauce",
                ],
            ),
            (
                Shellfish,
                vec![
                    "shrimp", "prawn", "crab", "lobster", "mussel", "clam", "oyster", "scallop",
                    "crayfish",
                ],
            ),
            (Sesame, vec!["tahini"]),
        ]);

        // Phrases that contain an allergen term without containing the allergen
        let allergen_false_friends = HashMap::from([
            (Nuts, vec!["nutmeg", "nutritional yeast", "butternut", "coconut"]),
            (
                Dairy,
                vec![
                    "peanut butter", "almond butter", "cashew butter", "sunflower seed butter",
                    "cocoa butter", "apple butter", "coconut milk", "coconut cream",
                    "oat milk", "almond milk", "soy milk", "rice milk", "cream of tartar",
                    "non-dairy", "vegan butter", "vegan cheese",
                ],
            ),
            (Eggs, vec!["eggplant", "eggless", "flax egg", "chia egg"]),
            (
                Gluten,
                vec![
                    "rice flour", "corn flour", "cornflour", "almond flour", "coconut flour",
                    "chickpea flour", "buckwheat flour", "rice noodle", "rice pasta",
                ],
            ),
            (Shellfish, vec!["oyster mushroom"]),
        ]);

        let allergen_substitutes = HashMap::from([
            (Nuts, vec!["sunflower seeds", "pumpkin seeds", "toasted oats"]),
            (Peanuts, vec!["sunflower seed butter", "pumpkin seeds", "tahini"]),
            (TreeNuts, vec!["sunflower seeds", "pumpkin seeds", "toasted coconut"]),
            (
                Dairy,
                vec!["oat milk", "coconut cream", "olive oil", "vegan butter", "nutritional yeast"],
            ),
            (Eggs, vec!["flax egg", "chia egg", "applesauce", "aquafaba"]),
            (
                Gluten,
                vec!["rice flour", "gluten-free pasta", "corn tortillas", "buckwheat flour"],
            ),
            (Soy, vec!["coconut aminos", "chickpeas", "sunflower lecithin"]),
            (Fish, vec!["jackfruit", "firm tofu", "hearts of palm"]),
            (Shellfish, vec!["king oyster mushrooms", "hearts of palm", "firm tofu"]),
            (Sesame, vec!["sunflower seeds", "pumpkin seeds", "olive oil"]),
        ]);

        let appliance_keywords = HashMap::from([
            (ApplianceKey::Oven, vec!["oven", "bake", "baked", "baking", "broil", "broiler"]),
            (
                ApplianceKey::Stovetop,
                vec![
                    "stove", "stovetop", "stove top", "hob", "skillet", "saucepan", "frying pan",
                    "sauté pan", "saute pan", "wok", "burner",
                ],
            ),
            (
                ApplianceKey::Microwave,
                vec!["microwave", "microwaved", "microwaving"],
            ),
            (
                ApplianceKey::AirFryer,
                vec!["air fryer", "air-fryer", "air fry", "air-fry"],
            ),
            (
                ApplianceKey::SlowCooker,
                vec!["slow cooker", "crock pot", "crockpot", "crock-pot"],
            ),
            (
                ApplianceKey::PressureCooker,
                vec!["pressure cooker", "pressure cook", "instant pot", "instapot"],
            ),
            (ApplianceKey::Blender, vec!["blender", "blitz"]),
            (ApplianceKey::FoodProcessor, vec!["food processor"]),
            (ApplianceKey::Grill, vec!["grill", "barbecue", "bbq"]),
            (
                ApplianceKey::StandMixer,
                vec!["stand mixer", "electric mixer", "hand mixer", "mixer"],
            ),
        ]);

        // Order matters: "fl oz" must win over "oz"
        let imperial_units = vec![
            imperial("cup", r"cups?\b", "1 cup ≈ 240 ml"),
            imperial(
                "fluid ounce",
                r"fl\.?\s*oz\b|fluid\s+ounces?\b",
                "1 fl oz ≈ 30 ml",
            ),
            imperial("ounce", r"oz\b|ounces?\b", "1 oz ≈ 28 g"),
            imperial("pound", r"lbs?\b|pounds?\b", "1 lb ≈ 454 g"),
            imperial("pint", r"pints?\b", "1 pint ≈ 473 ml"),
            imperial("quart", r"quarts?\b|qts?\b", "1 quart ≈ 946 ml"),
            imperial("gallon", r"gallons?\b", "1 gallon ≈ 3.8 l"),
            imperial("inch", r"inch(?:es)?\b", "1 inch ≈ 2.5 cm"),
            imperial(
                "stick of butter",
                r"sticks?\s+(?:of\s+)?butter\b",
                "1 stick of butter ≈ 113 g",
            ),
        ];

        let fahrenheit = Regex::new(
            r"(?i)\b(\d{2,3})\s*(?:°|º|degrees?)?\s*(?:F\b|fahrenheit\b)",
        )
        .expect("Valid regex pattern");

        let meat_and_seafood: Vec<&'static str> = MEAT.iter().chain(SEAFOOD).copied().collect();
        let diets = vec![
            DietRule {
                name: "vegan",
                triggers: vec!["vegan", "plant-based", "plant based"],
                forbidden: meat_and_seafood
                    .iter()
                    .chain(DAIRY)
                    .chain(&["egg", "honey", "gelatin", "mayonnaise"])
                    .copied()
                    .collect(),
                exemptions: PLANT_BASED.to_vec(),
            },
            DietRule {
                name: "vegetarian",
                triggers: vec!["vegetarian", "veggie"],
                forbidden: meat_and_seafood.iter().chain(&["gelatin"]).copied().collect(),
                exemptions: MEATLESS.to_vec(),
            },
            DietRule {
                name: "pescatarian",
                triggers: vec!["pescatarian", "pescetarian"],
                forbidden: MEAT.to_vec(),
                exemptions: MEATLESS.to_vec(),
            },
            DietRule {
                name: "gluten-free",
                triggers: vec!["gluten-free", "gluten free", "coeliac", "celiac"],
                forbidden: GLUTEN.to_vec(),
                exemptions: vec!["gluten-free", "gluten free"],
            },
            DietRule {
                name: "dairy-free",
                triggers: vec!["dairy-free", "dairy free", "lactose"],
                forbidden: DAIRY.to_vec(),
                exemptions: PLANT_BASED
                    .iter()
                    .chain(&["dairy-free", "dairy free", "non-dairy", "lactose-free"])
                    .copied()
                    .collect(),
            },
            DietRule {
                name: "halal",
                triggers: vec!["halal"],
                forbidden: vec![
                    "pork", "bacon", "ham", "prosciutto", "pancetta", "lard", "wine", "beer",
                    "rum", "brandy", "gelatin",
                ],
                exemptions: PLANT_BASED
                    .iter()
                    .chain(&["halal", "non-alcoholic", "alcohol-free"])
                    .copied()
                    .collect(),
            },
            DietRule {
                name: "keto",
                triggers: vec!["keto", "low-carb", "low carb"],
                forbidden: vec!["sugar", "flour", "pasta", "rice", "bread", "potato"],
                exemptions: vec!["keto", "low-carb", "low carb", "sugar-free", "sugar free"],
            },
        ];

        RuleTables {
            allergen_synonyms,
            allergen_false_friends,
            allergen_substitutes,
            appliance_keywords,
            imperial_units,
            fahrenheit,
            diets,
        }
    }

    /// Every lowercase term that names `allergy`: its key, its label and its synonyms
    pub fn allergen_terms(&self, allergy: AllergyKey) -> Vec<&'static str> {
        let mut terms = vec![allergy.key()];
        if allergy.label() != allergy.key() {
            terms.push(allergy.label());
        }
        if let Some(synonyms) = self.allergen_synonyms.get(&allergy) {
            terms.extend(synonyms.iter().copied());
        }
        terms
    }

    /// Whether a "<qualifier>-free" phrase rules out `allergy`
    fn frees_from(&self, qualifier: &str, allergy: AllergyKey) -> bool {
        let aliases: &[&str] = match allergy {
            AllergyKey::Nuts | AllergyKey::TreeNuts => &["nut"],
            AllergyKey::Dairy => &["lactose"],
            _ => &[],
        };
        aliases.contains(&qualifier)
            || self.allergen_terms(allergy).into_iter().any(|term| {
                term == qualifier || term.strip_suffix('s') == Some(qualifier)
            })
    }

    /// The allergen term found in `text` (case-insensitive substring), if any.
    /// A free-from phrase is masked only when it names `allergy` ("gluten-free
    /// pasta" for gluten, not "sugar-free peanut butter" for peanuts); known
    /// false friends are masked too.
    pub fn match_allergen(&self, text: &str, allergy: AllergyKey) -> Option<&'static str> {
        let lowered = text.to_lowercase();
        let mut masked = FREE_FROM_REGEX
            .replace_all(&lowered, |caps: &regex::Captures| {
                if self.frees_from(&caps[1], allergy) {
                    " ".to_string()
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned();
        if let Some(friends) = self.allergen_false_friends.get(&allergy) {
            for friend in friends {
                masked = masked.replace(friend, " ");
            }
        }

        self.allergen_terms(allergy)
            .into_iter()
            .find(|term| masked.contains(term))
    }

    pub fn substitutes(&self, allergy: AllergyKey) -> &[&'static str] {
        self.allergen_substitutes
            .get(&allergy)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The first keyword of `appliance` mentioned in `text` as a whole word
    pub fn match_appliance(&self, text: &str, appliance: ApplianceKey) -> Option<&'static str> {
        self.appliance_keywords
            .get(&appliance)?
            .iter()
            .copied()
            .find(|keyword| contains_word(text, keyword))
    }

    pub fn imperial_units(&self) -> &[ImperialUnit] {
        &self.imperial_units
    }

    /// Fahrenheit temperature pattern; group 1 is the number
    pub fn fahrenheit(&self) -> &Regex {
        &self.fahrenheit
    }

    pub fn diets(&self) -> &[DietRule] {
        &self.diets
    }
}

impl Default for RuleTables {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_allergen_has_terms_and_substitutes() {
        let tables = RuleTables::standard();
        for allergy in AllergyKey::ALL {
            assert!(!tables.allergen_terms(allergy).is_empty());
            assert!(!tables.substitutes(allergy).is_empty(), "{allergy}");
        }
    }

    #[test]
    fn test_every_appliance_has_keywords() {
        let tables = RuleTables::standard();
        for appliance in ApplianceKey::ALL {
            assert!(tables.appliance_keywords.contains_key(&appliance), "{appliance}");
        }
    }

    #[test]
    fn test_match_allergen_uses_synonyms() {
        let tables = RuleTables::standard();
        assert_eq!(
            tables.match_allergen("200g Walnuts, chopped", AllergyKey::TreeNuts),
            Some("walnut")
        );
        assert_eq!(tables.match_allergen("2 eggs", AllergyKey::Eggs), Some("eggs"));
        assert_eq!(tables.match_allergen("1 tbsp olive oil", AllergyKey::Dairy), None);
    }

    #[test]
    fn test_match_allergen_masks_false_friends() {
        let tables = RuleTables::standard();
        assert_eq!(tables.match_allergen("1 eggplant", AllergyKey::Eggs), None);
        assert_eq!(
            tables.match_allergen("200g gluten-free pasta", AllergyKey::Gluten),
            None
        );
        assert_eq!(tables.match_allergen("400ml coconut milk", AllergyKey::Dairy), None);
        assert_eq!(
            tables.match_allergen("2 tbsp peanut butter", AllergyKey::Peanuts),
            Some("peanut")
        );
    }

    #[test]
    fn test_unrelated_free_from_qualifiers_mask_nothing() {
        let tables = RuleTables::standard();
        assert_eq!(
            tables.match_allergen("2 tbsp sugar-free peanut butter", AllergyKey::Peanuts),
            Some("peanut")
        );
        assert_eq!(
            tables.match_allergen("2 tbsp sugar-free peanut butter", AllergyKey::Dairy),
            None
        );
        assert_eq!(
            tables.match_allergen("200 ml fat-free milk", AllergyKey::Dairy),
            Some("milk")
        );
        assert_eq!(
            tables.match_allergen("1 nut-free walnut substitute", AllergyKey::TreeNuts),
            None
        );
        assert_eq!(
            tables.match_allergen("100 g dairy free cheese", AllergyKey::Dairy),
            None
        );
        assert_eq!(
            tables.match_allergen("100 g dairy-free wheat crackers", AllergyKey::Gluten),
            Some("wheat")
        );
    }

    #[test]
    fn test_imperial_unit_patterns() {
        let tables = RuleTables::standard();
        let cup = &tables.imperial_units()[0];
        assert!(cup.regex.is_match("2 cups flour"));
        assert!(cup.regex.is_match("½ cup sugar"));
        assert!(!cup.regex.is_match("cupcake liners"));

        let ounce = tables.imperial_units().iter().find(|u| u.name == "ounce").unwrap();
        assert!(ounce.regex.is_match("8 oz cream cheese"));
        assert!(!ounce.regex.is_match("200 g cream cheese"));
    }

    #[test]
    fn test_fahrenheit_pattern() {
        let tables = RuleTables::standard();
        let caps = tables.fahrenheit().captures("Bake at 350°F for 20 minutes").unwrap();
        assert_eq!(&caps[1], "350");
        assert!(tables.fahrenheit().is_match("preheat to 400 degrees F"));
        assert!(!tables.fahrenheit().is_match("Bake at 180°C"));
    }
}
