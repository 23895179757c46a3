//! Derived (calculated) answers.

use crate::core::catalog::Derivation;
use crate::core::types::{Answer, AnswerSet};

/// Compute a derived answer from the current answers.
///
/// Returns `None` when an input is missing, non-numeric or non-positive; the
/// caller then drops any stale derived value. Pure: identical inputs always
/// produce an identical answer.
pub fn compute(derivation: &Derivation, answers: &AnswerSet) -> Option<Answer> {
    match derivation {
        Derivation::Bmi { height, weight } => {
            let height_cm = answers.get(height)?.as_number()?;
            let weight_kg = answers.get(weight)?.as_number()?;
            bmi(height_cm, weight_kg).map(Answer::Text)
        }
    }
}

/// `weight / height_m^2`, rounded to one decimal place.
pub fn bmi(height_cm: f64, weight_kg: f64) -> Option<String> {
    if height_cm <= 0.0 || weight_kg <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some(format!("{:.1}", weight_kg / (height_m * height_m)))
}
