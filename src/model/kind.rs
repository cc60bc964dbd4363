//! # Node kinds.
//!
//! [`NodeKind`] is a closed set. Parsing never fails: anything unrecognized maps
//! to [`NodeKind::None`], so a tree produced by a newer store still expands into
//! tasks the runner can step past.

use std::fmt;
use std::str::FromStr;

/// Classification of a [`Node`](crate::Node).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeKind {
    /// Composite: contributes no task of its own, only its expanded children.
    Combo,
    /// Counts `duration` down to zero; zero duration runs until stopped.
    Timer,
    /// Same countdown mechanics as [`NodeKind::Timer`].
    Countdown,
    /// Counts external taps up to `target_count`.
    RepetitionCount,
    /// Resolves to one of `possible_kinds` when the tree is expanded.
    Dice,
    /// Placeholder; completes as soon as it starts.
    #[default]
    None,
}

impl NodeKind {
    /// Returns a short stable label (snake_case).
    pub fn as_label(&self) -> &'static str {
        match self {
            NodeKind::Combo => "combo",
            NodeKind::Timer => "timer",
            NodeKind::Countdown => "countdown",
            NodeKind::RepetitionCount => "repetitions",
            NodeKind::Dice => "dice",
            NodeKind::None => "none",
        }
    }

    /// True for every kind except [`NodeKind::Combo`].
    #[inline]
    pub fn is_leaf(&self) -> bool {
        !matches!(self, NodeKind::Combo)
    }

    /// True for kinds a dice may land on.
    #[inline]
    pub fn is_dice_face(&self) -> bool {
        matches!(
            self,
            NodeKind::Timer | NodeKind::Countdown | NodeKind::RepetitionCount
        )
    }
}

impl FromStr for NodeKind {
    type Err = std::convert::Infallible;

    /// Parses a kind name, case-insensitively. Unknown names yield [`NodeKind::None`].
    ///
    /// ```
    /// use combocube::NodeKind;
    ///
    /// assert_eq!("Timer".parse::<NodeKind>().unwrap(), NodeKind::Timer);
    /// assert_eq!("metronome".parse::<NodeKind>().unwrap(), NodeKind::None);
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "combo" => NodeKind::Combo,
            "timer" => NodeKind::Timer,
            "countdown" => NodeKind::Countdown,
            "repetitions" | "repetition_count" | "repetitioncount" => NodeKind::RepetitionCount,
            "dice" => NodeKind::Dice,
            _ => NodeKind::None,
        };
        Ok(kind)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kinds() {
        for kind in [
            NodeKind::Combo,
            NodeKind::Timer,
            NodeKind::Countdown,
            NodeKind::RepetitionCount,
            NodeKind::Dice,
            NodeKind::None,
        ] {
            assert_eq!(kind.as_label().parse::<NodeKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_kind_falls_back_to_none() {
        assert_eq!("".parse::<NodeKind>(), Ok(NodeKind::None));
        assert_eq!("unknown".parse::<NodeKind>(), Ok(NodeKind::None));
        assert_eq!(" REPETITIONS ".parse::<NodeKind>(), Ok(NodeKind::RepetitionCount));
    }

    #[test]
    fn test_dice_faces() {
        assert!(NodeKind::Timer.is_dice_face());
        assert!(!NodeKind::Combo.is_dice_face());
        assert!(!NodeKind::Dice.is_dice_face());
        assert!(!NodeKind::None.is_dice_face());
    }
}
