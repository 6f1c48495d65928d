//! Fixed answers for each response category.

use serde::{Deserialize, Serialize};

use super::ResponseCategory;

const SERVICES: &[&str] = &[
    "We offer comprehensive construction services including:",
    "• Residential Construction",
    "• Commercial Projects",
    "• Architectural Design",
    "• Project Management",
    "• Cost Estimation",
    "• Interior Design",
];

const COSTS: &[&str] = &[
    "Our construction costs vary by quality:",
    "• Normal: ₹1,200/sq.ft",
    "• Standard: ₹1,500/sq.ft",
    "• High-End: ₹2,000/sq.ft",
    "• Luxury: ₹2,500/sq.ft",
    "",
    "Use our calculators for detailed estimates!",
];

const MATERIALS: &[&str] = &[
    "Current material prices (approximate):",
    "• Cement: ₹400/bag",
    "• Steel: ₹65/kg",
    "• Bricks: ₹8/piece",
    "• Sand: ₹50/ton",
    "• Aggregate: ₹60/ton",
    "",
    "Prices vary by location. Use our calculators for accurate estimates.",
];

const TIMELINE: &[&str] = &[
    "Typical construction timeline:",
    "• 1000 sq.ft: 6-8 months",
    "• 2000 sq.ft: 10-12 months",
    "• 3000+ sq.ft: 12-18 months",
    "",
    "Timeline depends on design complexity and weather conditions.",
];

const CALCULATORS: &[&str] = &[
    "We have 6 different calculators:",
    "1. Construction Cost Calculator - Get overall project cost",
    "2. Concrete for Slabs - Calculate concrete requirements",
    "3. Raw Material Calculator - Estimate all materials",
    "4. Paints Calculator - Calculate paint requirements",
    "5. Ready Mix Calculator - RMC volume calculation",
    "6. Detailed Cost Breakdown - Complete project analysis",
];

const QUALITY: &[&str] = &[
    "We offer 4 quality levels:",
    "",
    "Normal (₹1,200/sq.ft):",
    "Basic construction with standard materials",
    "",
    "Standard (₹1,500/sq.ft):",
    "Good quality with better finishes",
    "",
    "High-End (₹2,000/sq.ft):",
    "Premium materials and finishes",
    "",
    "Luxury (₹2,500/sq.ft):",
    "Top-tier materials and custom design",
];

const GREETING: &[&str] = &[
    "Hello! Welcome!",
    "",
    "I'm here to help you with:",
    "• Construction cost estimates",
    "• Material pricing",
    "• Project information",
    "• Using our calculators",
    "",
    "What would you like to know?",
];

const THANKS: &[&str] = &[
    "You're welcome!",
    "",
    "Feel free to ask if you have any other questions about construction or our services.",
    "",
    "You can also:",
    "• Use our calculators",
    "• Contact us directly",
    "• Create an account to save estimates",
];

const HELP: &[&str] = &[
    "I'm here to help with construction-related questions!",
    "",
    "You can ask me about:",
    "• Our services",
    "• Construction costs",
    "• Material prices",
    "• Project timeline",
    "• How to use calculators",
    "• Contact information",
];

const FALLBACK: &[&str] = &[
    "I'm not sure I understand that question. Let me help you!",
    "",
    "You can ask me about:",
    "• 'What are your services?'",
    "• 'How much does construction cost?'",
    "• 'What are material prices?'",
    "• 'How to calculate costs?'",
    "• 'How to contact you?'",
];

/// Suggested questions offered as one-tap replies.
pub const QUICK_REPLIES: &[&str] = &[
    "What are your services?",
    "How much does construction cost?",
    "What are material prices?",
    "How long does construction take?",
    "How to contact you?",
];

/// How the business can be reached. Shown for `contact` questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: String,
    pub email: String,
    pub website: Option<String>,
}

impl Default for ContactInfo {
    fn default() -> Self {
        Self {
            phone: "+91 00000 00000".to_string(),
            email: "contact@example.com".to_string(),
            website: None,
        }
    }
}

/// Canned replies, with contact details filled in.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    contact: ContactInfo,
}

impl KnowledgeBase {
    pub fn new(contact: ContactInfo) -> Self {
        Self { contact }
    }

    pub fn reply(&self, category: ResponseCategory) -> Vec<String> {
        let lines = match category {
            ResponseCategory::Services => SERVICES,
            ResponseCategory::Costs => COSTS,
            ResponseCategory::Materials => MATERIALS,
            ResponseCategory::Timeline => TIMELINE,
            ResponseCategory::Calculators => CALCULATORS,
            ResponseCategory::Quality => QUALITY,
            ResponseCategory::Greeting => GREETING,
            ResponseCategory::Thanks => THANKS,
            ResponseCategory::Help => HELP,
            ResponseCategory::Fallback => FALLBACK,
            ResponseCategory::Contact => return self.contact_lines(),
        };
        lines.iter().map(|line| line.to_string()).collect()
    }

    fn contact_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "Get in touch with us:".to_string(),
            format!("Phone/WhatsApp: {}", self.contact.phone),
            format!("Email: {}", self.contact.email),
        ];
        if let Some(website) = &self.contact.website {
            lines.push(format!("Website: {}", website));
        }
        lines
    }
}

/// Reply text for a category with default contact details.
pub fn reply(category: ResponseCategory) -> Vec<String> {
    KnowledgeBase::default().reply(category)
}
