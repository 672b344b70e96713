use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingTier {
    pub name: &'static str,
    pub monthly_price: f64,
    pub description: &'static str,
    pub features: &'static [&'static str],
    /// External checkout link; `None` for the free tier.
    pub checkout_url: Option<&'static str>,
}

pub const PREMIUM_CHECKOUT_URL: &str = "https://buy.stripe.com/test_3cI6oGbhJ5Zh2fHevmcs800";
pub const STUDENT_CHECKOUT_URL: &str = "https://buy.stripe.com/test_aEUeYx8mCeIa5QA4gh";

pub const TIERS: [PricingTier; 3] = [
    PricingTier {
        name: "Free",
        monthly_price: 0.0,
        description: "Perfect for beginners looking to get started with networking.",
        features: &[
            "5 Basic Lab Environments",
            "Community Forum Access",
            "Basic Study Materials",
            "Limited Lab Time (2 hours/day)",
        ],
        checkout_url: None,
    },
    PricingTier {
        name: "Premium",
        monthly_price: 29.0,
        description: "For serious networking students and professionals.",
        features: &[
            "All Free Plan Features",
            "30+ Advanced Lab Environments",
            "Instructor-Led Guidance",
            "Unlimited Lab Time",
            "Complete Study Materials",
            "Priority Support",
        ],
        checkout_url: Some(PREMIUM_CHECKOUT_URL),
    },
    PricingTier {
        name: "Student",
        monthly_price: 19.0,
        description: "Special discount for enrolled students. ID verification required.",
        features: &[
            "All Premium Plan Features",
            "Student-Only Study Groups",
            "Exam Preparation Materials",
            "Resume & Career Resources",
        ],
        checkout_url: Some(STUDENT_CHECKOUT_URL),
    },
];
