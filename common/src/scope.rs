//! # Scope Flags
//!
//! Every asset carries two independent authorizations: `active` (may be probed)
//! and `passive` (may be observed). Flags only ever move from `false` to `true`.

use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Scope {
    pub active: bool,
    pub passive: bool,
}

impl Scope {
    pub const NONE: Scope = Scope {
        active: false,
        passive: false,
    };

    pub const FULL: Scope = Scope {
        active: true,
        passive: true,
    };

    pub fn new(active: bool, passive: bool) -> Self {
        Self { active, passive }
    }

    /// Flag-wise OR of both pairs.
    pub fn merge(self, other: Scope) -> Scope {
        merge(self, other)
    }

    /// True when merging `other` into `self` would not change anything.
    pub fn covers(&self, other: &Scope) -> bool {
        self.merge(*other) == *self
    }

    pub fn is_none(&self) -> bool {
        !self.active && !self.passive
    }
}

/// Combines two flag pairs monotonically.
///
/// Commutative, associative and idempotent, so repeated or reordered merges
/// between related assets always settle on the same flags.
pub fn merge(a: Scope, b: Scope) -> Scope {
    Scope {
        active: a.active || b.active,
        passive: a.passive || b.passive,
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Active Scope: {}    Passive Scope: {}",
            self.active, self.passive
        )
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    fn all_pairs() -> Vec<Scope> {
        vec![
            Scope::new(false, false),
            Scope::new(true, false),
            Scope::new(false, true),
            Scope::new(true, true),
        ]
    }

    #[test]
    fn test_merge_keeps_active_flag() {
        let merged = merge(Scope::new(true, false), Scope::new(false, false));
        assert_eq!(merged, Scope::new(true, false));
    }

    #[test]
    fn test_merge_is_commutative() {
        for a in all_pairs() {
            for b in all_pairs() {
                assert_eq!(merge(a, b), merge(b, a), "{a:?} / {b:?}");
            }
        }
    }

    #[test]
    fn test_merge_is_associative() {
        for a in all_pairs() {
            for b in all_pairs() {
                for c in all_pairs() {
                    assert_eq!(merge(merge(a, b), c), merge(a, merge(b, c)));
                }
            }
        }
    }

    #[test]
    fn test_merge_is_idempotent() {
        for a in all_pairs() {
            assert_eq!(merge(a, a), a);
        }
    }

    #[test]
    fn test_covers() {
        assert!(Scope::FULL.covers(&Scope::new(true, false)));
        assert!(Scope::NONE.covers(&Scope::NONE));
        assert!(!Scope::new(true, false).covers(&Scope::new(false, true)));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Scope::new(true, false).to_string(),
            "Active Scope: true    Passive Scope: false"
        );
    }
}
