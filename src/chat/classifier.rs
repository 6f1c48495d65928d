//! Keyword intent classifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What kind of answer an utterance asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseCategory {
    Services,
    Costs,
    Materials,
    Timeline,
    Contact,
    Calculators,
    Quality,
    Greeting,
    Thanks,
    Help,
    Fallback,
}

impl ResponseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Services => "services",
            Self::Costs => "costs",
            Self::Materials => "materials",
            Self::Timeline => "timeline",
            Self::Contact => "contact",
            Self::Calculators => "calculators",
            Self::Quality => "quality",
            Self::Greeting => "greeting",
            Self::Thanks => "thanks",
            Self::Help => "help",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ResponseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keywords that select a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRule {
    pub category: ResponseCategory,
    /// Lowercase substrings; any one of them matches.
    pub keywords: Vec<String>,
}

impl IntentRule {
    pub fn new(category: ResponseCategory, keywords: &[&str]) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|kw| kw.to_lowercase()).collect(),
        }
    }

    fn matches(&self, lower: &str) -> bool {
        self.keywords.iter().any(|kw| lower.contains(kw.as_str()))
    }
}

/// Ordered rule list. The first matching rule wins.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl IntentClassifier {
    pub fn new(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn classify(&self, utterance: &str) -> ResponseCategory {
        let lower = utterance.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lower))
            .map(|rule| rule.category)
            .unwrap_or(ResponseCategory::Fallback)
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        use ResponseCategory::*;

        Self::new(vec![
            IntentRule::new(Services, &["service", "what do you"]),
            IntentRule::new(Costs, &["cost", "price", "rate"]),
            IntentRule::new(Materials, &["material", "cement", "steel"]),
            IntentRule::new(Timeline, &["time", "duration", "how long"]),
            IntentRule::new(Contact, &["contact", "phone", "email"]),
            IntentRule::new(Calculators, &["calculator", "calculate", "estimate"]),
            IntentRule::new(Quality, &["quality", "normal", "standard", "luxury"]),
            IntentRule::new(Greeting, &["hello", "hi", "hey"]),
            IntentRule::new(Thanks, &["thank", "thanks"]),
            IntentRule::new(Help, &["help"]),
        ])
    }
}

/// Classify with the default rule set.
pub fn classify(utterance: &str) -> ResponseCategory {
    IntentClassifier::default().classify(utterance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earlier_rule_wins() {
        assert_eq!(classify("hello, what is the cost?"), ResponseCategory::Costs);
        assert_eq!(classify("What services and prices?"), ResponseCategory::Services);
        assert_eq!(classify("cement price"), ResponseCategory::Costs);
    }

    #[test]
    fn test_each_category() {
        let cases = [
            ("What do you build?", ResponseCategory::Services),
            ("Steel for my roof", ResponseCategory::Materials),
            ("How long will it take?", ResponseCategory::Timeline),
            ("Give me your phone number", ResponseCategory::Contact),
            ("Open the calculator", ResponseCategory::Calculators),
            ("Luxury finishes?", ResponseCategory::Quality),
            ("HEY", ResponseCategory::Greeting),
            ("Thank you!", ResponseCategory::Thanks),
            ("help", ResponseCategory::Help),
        ];
        for (utterance, expected) in cases {
            assert_eq!(classify(utterance), expected, "utterance: {}", utterance);
        }
    }

    #[test]
    fn test_substring_matching_is_literal() {
        // "this" contains "hi"
        assert_eq!(classify("is this open"), ResponseCategory::Greeting);
    }

    #[test]
    fn test_fallback() {
        assert_eq!(classify("blorp"), ResponseCategory::Fallback);
        assert_eq!(classify(""), ResponseCategory::Fallback);
    }

    #[test]
    fn test_custom_rules() {
        let classifier = IntentClassifier::new(vec![IntentRule::new(
            ResponseCategory::Contact,
            &["WhatsApp"],
        )]);
        assert_eq!(classifier.classify("whatsapp?"), ResponseCategory::Contact);
        assert_eq!(classifier.classify("cost?"), ResponseCategory::Fallback);
    }
}
