use crate::domain::payment::Outcome;

/// What the simulated payment network does with a payment source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The network answers immediately with this outcome.
    Decided(Outcome),
    /// The network never answers on its own.
    Unresponsive,
}

/// Suffix rules, checked in order. First match wins.
const RULES: [(&str, Classification); 4] = [
    ("1212", Classification::Decided(Outcome::InsufficientFunds)),
    ("2323", Classification::Decided(Outcome::DoNotHonor)),
    ("3434", Classification::Decided(Outcome::Declined)),
    ("4545", Classification::Unresponsive),
];

/// Classifies a payment source (card or bank account number) by its suffix.
pub fn classify(source: &str) -> Classification {
    RULES
        .iter()
        .find(|(suffix, _)| source.ends_with(suffix))
        .map(|(_, classification)| *classification)
        .unwrap_or(Classification::Decided(Outcome::Success))
}
