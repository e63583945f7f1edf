use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PedError;

/// Sex of a pedigree member.
///
/// Inferred codes are produced by the builder when the sex of a member can be deduced from a
/// mate. `Arbitrary` marks members whose sex may be chosen freely as long as the choice is
/// consistent with the marriage graph, while `Missing` is a true unknown that is never guessed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "enum_methods", derive(strum::EnumIter))]
pub enum SexCode {
    /// Male (direct from source data)
    Male,
    /// Male (inferred from source data)
    InferredMale,
    /// Female (direct from source data)
    Female,
    /// Female (inferred from source data)
    InferredFemale,
    /// Missing (source data has no info)
    #[default]
    Missing,
    /// May be assigned arbitrarily when sexes are inferred
    Arbitrary,
}

impl SexCode {
    /// Collapse the detailed code to `Male`, `Female` or `Missing`
    pub fn effective(self) -> SexCode {
        match self {
            Self::Male | Self::InferredMale => Self::Male,
            Self::Female | Self::InferredFemale => Self::Female,
            Self::Missing | Self::Arbitrary => Self::Missing,
        }
    }

    pub fn is_male(self) -> bool {
        matches!(self, Self::Male | Self::InferredMale)
    }

    pub fn is_female(self) -> bool {
        matches!(self, Self::Female | Self::InferredFemale)
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, Self::Missing | Self::Arbitrary)
    }

    pub fn is_inferred(self) -> bool {
        matches!(self, Self::InferredMale | Self::InferredFemale)
    }

    /// The inferred sex of a mate, `None` if this sex is unknown
    pub fn mate_sex(self) -> Option<SexCode> {
        match self.effective() {
            Self::Male => Some(Self::InferredFemale),
            Self::Female => Some(Self::InferredMale),
            _ => None,
        }
    }
}

impl FromStr for SexCode {
    type Err = PedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m" | "1" | "male" => Ok(Self::Male),
            "f" | "2" | "female" => Ok(Self::Female),
            "" | "0" | "." | "?" | "missing" => Ok(Self::Missing),
            "a" | "arb" | "arbitrary" => Ok(Self::Arbitrary),
            _ => Err(PedError::SexParseError(s.to_string())),
        }
    }
}

impl std::fmt::Display for SexCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Self::Male => write!(f, "male"),
            Self::InferredMale => write!(f, "male (inferred)"),
            Self::Female => write!(f, "female"),
            Self::InferredFemale => write!(f, "female (inferred)"),
            Self::Missing => write!(f, "missing"),
            Self::Arbitrary => write!(f, "arbitrary"),
        }
    }
}

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position in the owning pedigree's arena
            pub fn get(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Handle to a member of one pedigree
    MemberId
);
arena_id!(
    /// Handle to a nuclear family of one pedigree
    FamilyId
);
arena_id!(
    /// Handle to a subpedigree of one pedigree
    SubpedId
);

/// One entry of a member's mate chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Mate {
    pub mate: MemberId,
    pub family: FamilyId,
}

#[derive(Debug, Clone, Serialize)]
pub struct Member {
    pub(crate) name: String,
    pub(crate) sex: SexCode,
    pub(crate) origin: Option<FamilyId>,
    pub(crate) subped: Option<SubpedId>,
    pub(crate) index: Option<usize>,
    pub(crate) subindex: Option<usize>,
    pub(crate) mates: Vec<Mate>,
}

impl Member {
    pub(crate) fn new(name: &str, sex: SexCode) -> Self {
        Self {
            name: name.to_string(),
            sex,
            origin: None,
            subped: None,
            index: None,
            subindex: None,
            mates: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sex(&self) -> SexCode {
        self.sex
    }

    /// The family this member is an offspring of
    pub fn family(&self) -> Option<FamilyId> {
        self.origin
    }

    /// `None` while the member is unconnected
    pub fn subpedigree(&self) -> Option<SubpedId> {
        self.subped
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Index within the owning subpedigree
    pub fn subindex(&self) -> Option<usize> {
        self.subindex
    }

    pub fn mates(&self) -> &[Mate] {
        &self.mates
    }

    pub fn mate_count(&self) -> usize {
        self.mates.len()
    }

    pub fn is_connected(&self) -> bool {
        self.subped.is_some()
    }
}

/// A mating pair and their children
#[derive(Debug, Clone, Serialize)]
pub struct Family {
    pub(crate) parent1: MemberId,
    pub(crate) parent2: MemberId,
    pub(crate) offspring: Vec<MemberId>,
    pub(crate) subped: Option<SubpedId>,
    pub(crate) index: Option<usize>,
    pub(crate) subindex: Option<usize>,
    pub(crate) mother: Option<MemberId>,
    pub(crate) father: Option<MemberId>,
}

impl Family {
    pub(crate) fn new(parent1: MemberId, parent2: MemberId) -> Self {
        Self {
            parent1,
            parent2,
            offspring: vec![],
            subped: None,
            index: None,
            subindex: None,
            mother: None,
            father: None,
        }
    }

    pub fn parent1(&self) -> MemberId {
        self.parent1
    }

    pub fn parent2(&self) -> MemberId {
        self.parent2
    }

    pub fn parents(&self) -> [MemberId; 2] {
        [self.parent1, self.parent2]
    }

    pub fn offspring(&self) -> &[MemberId] {
        &self.offspring
    }

    pub fn offspring_count(&self) -> usize {
        self.offspring.len()
    }

    pub fn subpedigree(&self) -> Option<SubpedId> {
        self.subped
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn subindex(&self) -> Option<usize> {
        self.subindex
    }

    /// Set once both parents have opposite, known sexes
    pub fn mother(&self) -> Option<MemberId> {
        self.mother
    }

    pub fn father(&self) -> Option<MemberId> {
        self.father
    }

    pub fn is_parent(&self, member: MemberId) -> bool {
        self.parent1 == member || self.parent2 == member
    }
}

/// A connected component of the member/family graph
#[derive(Debug, Clone, Serialize)]
pub struct Subpedigree {
    pub(crate) name: String,
    pub(crate) members: Vec<MemberId>,
    pub(crate) families: Vec<FamilyId>,
    pub(crate) index: Option<usize>,
    pub(crate) merged_into: Option<SubpedId>,
}

impl Subpedigree {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            members: vec![],
            families: vec![],
            index: None,
            merged_into: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[MemberId] {
        &self.members
    }

    pub fn families(&self) -> &[FamilyId] {
        &self.families
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Merged subpedigrees stay in the arena as tombstones
    pub fn is_merged(&self) -> bool {
        self.merged_into.is_some()
    }
}
