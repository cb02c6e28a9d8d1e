use std::fmt::{Debug, Display, Formatter};

/// Ratio displayed as a percentage, `-` when undefined.
pub struct FormattedPercentage(pub Option<f64>);

impl Debug for FormattedPercentage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for FormattedPercentage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(ratio) => write!(f, "{:.1}%", ratio * 100.0),
            None => write!(f, "-"),
        }
    }
}
