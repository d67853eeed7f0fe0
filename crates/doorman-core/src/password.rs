//! Password strength heuristic.
//!
//! Five independent checks, one point each. Only a full score is accepted
//! when creating a user or changing a password.

use crate::error::{ConsoleError, Result};

/// Minimum length for the length check.
pub const MIN_LENGTH: usize = 16;

/// Characters accepted by the symbol check.
pub const SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Score required to submit a password.
pub const REQUIRED_SCORE: u8 = 5;

/// Longest password the update-password endpoint accepts.
pub const MAX_UPDATE_LENGTH: usize = 36;

/// Shortest current password the update-password endpoint accepts.
pub const MIN_CURRENT_LENGTH: usize = 6;

/// Coarse strength bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    Weak,
    Medium,
    Strong,
}

impl Strength {
    /// Bucket for a score out of five.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        match score {
            0..=2 => Self::Weak,
            3..=4 => Self::Medium,
            _ => Self::Strong,
        }
    }

    /// Message shown next to the password field.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Weak => {
                "Weak - Password must include at least 16 characters, one uppercase letter, \
                 one lowercase letter, one digit, and one special character"
            }
            Self::Medium => "Medium - Add more complexity",
            Self::Strong => "Strong - Password meets security requirements",
        }
    }
}

/// Result of scoring a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub score: u8,
    pub strength: Strength,
}

impl Assessment {
    #[must_use]
    pub const fn is_acceptable(&self) -> bool {
        self.score >= REQUIRED_SCORE
    }
}

/// Score a password against the five checks.
#[must_use]
pub fn assess(password: &str) -> Assessment {
    let checks = [
        password.chars().count() >= MIN_LENGTH,
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| SYMBOLS.contains(c)),
    ];
    let score = u8::try_from(checks.iter().filter(|ok| **ok).count()).unwrap_or(u8::MAX);
    Assessment {
        score,
        strength: Strength::from_score(score),
    }
}

/// Reject a password that does not reach the required score.
///
/// # Errors
///
/// Returns [`ConsoleError::WeakPassword`] with the score and verdict.
pub fn require_strong(password: &str) -> Result<()> {
    let assessment = assess(password);
    if assessment.is_acceptable() {
        Ok(())
    } else {
        Err(ConsoleError::WeakPassword {
            score: assessment.score,
            verdict: assessment.strength.message().to_owned(),
        })
    }
}

/// Check a password change before it is sent: the current password must be
/// plausible, the new one strong and within the endpoint's length limit.
///
/// # Errors
///
/// Returns [`ConsoleError::Validation`] for a missing current password or an
/// over-long new one, [`ConsoleError::WeakPassword`] for a weak new one.
pub fn check_change(current: &str, new: &str) -> Result<()> {
    let current_len = current.chars().count();
    if current_len < MIN_CURRENT_LENGTH || current_len > MAX_UPDATE_LENGTH {
        return Err(ConsoleError::Validation(format!(
            "current password must be {MIN_CURRENT_LENGTH} to {MAX_UPDATE_LENGTH} characters"
        )));
    }
    require_strong(new)?;
    if new.chars().count() > MAX_UPDATE_LENGTH {
        return Err(ConsoleError::Validation(format!(
            "new password must be at most {MAX_UPDATE_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Reject a confirmation that differs from the new password.
///
/// # Errors
///
/// Returns [`ConsoleError::Validation`] when the two differ.
pub fn require_confirmed(new: &str, confirmation: &str) -> Result<()> {
    if new == confirmation {
        Ok(())
    } else {
        Err(ConsoleError::Validation("New passwords do not match".to_owned()))
    }
}
