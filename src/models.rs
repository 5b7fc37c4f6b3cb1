//! Static catalog backing the model browse view. The three cards are
//! hard-coded; there is no model registry behind them.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCard {
    pub name: &'static str,
    pub tagline: &'static str,
    pub badge: &'static str,
    pub accuracy: &'static str,
    pub processing_time: &'static str,
}

pub const CATALOG: &[ModelCard] = &[
    ModelCard {
        name: "UNI",
        tagline: "Universal Histopathology Model",
        badge: "New",
        accuracy: "95% Accuracy on TCGA dataset",
        processing_time: "~1 hours",
    },
    ModelCard {
        name: "CONCH",
        tagline: "Contextual Histopathology Analysis",
        badge: "Popular",
        accuracy: "98% Accuracy on PathAI dataset",
        processing_time: "~2 hours",
    },
    ModelCard {
        name: "VIRCHOW",
        tagline: "Advanced Tissue Classification",
        badge: "Stable",
        accuracy: "97% Accuracy on CAMELYON dataset",
        processing_time: "~1.5 hours",
    },
];

impl fmt::Display for ModelCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{}] - {}", self.name, self.badge, self.tagline)?;
        writeln!(f, "  {}", self.accuracy)?;
        write!(f, "  Processing time: {}", self.processing_time)
    }
}
