use serde::{Deserialize, Serialize};

/// What an element of a restriction relation refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RestrictionKind {
    Way,
    Node,
    Relation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RestrictionMember {
    pub id: i64,
    pub kind: RestrictionKind,
}

/// A turn restriction, flattened from the OSM relation into a
/// (category, from, to, via) record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Restriction {
    /// The raw `restriction` tag value: `no_left_turn`, `only_straight_on`, …
    pub category: String,
    pub from: RestrictionMember,
    pub to: RestrictionMember,
    pub via: RestrictionMember,
}

impl Restriction {
    /// `only_*` restrictions whitelist a single target; everything else
    /// (`no_*`) blacklists one.
    pub fn is_mandatory(&self) -> bool {
        self.category.starts_with("only_")
    }
}
