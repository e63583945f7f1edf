use std::collections::HashMap;

use indexmap::IndexMap;

use crate::builder::{BuildStats, PedigreeBuilder};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::ledger::RelationshipLedger;
use crate::structs::{Family, FamilyId, Mate, Member, MemberId, SexCode, SubpedId, Subpedigree};

/// A named pedigree: its members, nuclear families and connected subpedigrees.
///
/// Members, families and subpedigrees live in arenas owned by the pedigree and refer to each
/// other through [`MemberId`], [`FamilyId`] and [`SubpedId`] handles. Relationships are added
/// as name based assertions and turned into structure by [`Pedigree::build`].
///
/// Handles are only meaningful for the pedigree that produced them. Passing a handle of another
/// pedigree, or an index past the counts, panics.
#[derive(Debug, Clone)]
pub struct Pedigree {
    name: String,
    pub(crate) members: Vec<Member>,
    pub(crate) families: Vec<Family>,
    pub(crate) subpeds: Vec<Subpedigree>,
    member_names: IndexMap<String, MemberId>,
    family_pairs: HashMap<(MemberId, MemberId), FamilyId>,
    pub(crate) member_index: Vec<MemberId>,
    pub(crate) family_index: Vec<FamilyId>,
    pub(crate) subped_index: Vec<SubpedId>,
    unconnecteds: Vec<MemberId>,
    subped_counter: usize,
    builder: PedigreeBuilder,
    frozen: bool,
    ready: bool,
}

impl Pedigree {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            members: vec![],
            families: vec![],
            subpeds: vec![],
            member_names: IndexMap::new(),
            family_pairs: HashMap::new(),
            member_index: vec![],
            family_index: vec![],
            subped_index: vec![],
            unconnecteds: vec![],
            subped_counter: 0,
            builder: PedigreeBuilder::default(),
            frozen: false,
            ready: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a member, or update the sex of an existing one.
    ///
    /// A known sex replaces an unknown one, but an explicit sex is never replaced by its inferred
    /// form. Switching an existing member between male and female records a `bad_gender` error.
    pub fn add_member(&mut self, name: &str, sex: SexCode) -> Option<MemberId> {
        if self.frozen {
            tracing::warn!("Pedigree {} is frozen, member {name} was not added", self.name);
            return None;
        }
        if name.is_empty() {
            tracing::warn!("Pedigree {} got a member without a name", self.name);
            return None;
        }

        let Some(&id) = self.member_names.get(name) else {
            self.ready = false;
            return Some(self.insert_member(name, sex));
        };

        let current = self.members[id.0].sex;
        let sex = match (current, sex) {
            (c, s) if c == s => return Some(id),
            (SexCode::Missing, SexCode::Arbitrary) => SexCode::Arbitrary,
            (_, s) if s.is_unknown() => return Some(id),
            (SexCode::Male, SexCode::InferredMale) | (SexCode::Female, SexCode::InferredFemale) => {
                return Some(id)
            }
            (_, s) => s,
        };

        if current.is_male() && sex.is_female() {
            self.builder
                .diagnostics
                .record(DiagnosticKind::BadGender, &[name, "male", "female"]);
        } else if current.is_female() && sex.is_male() {
            self.builder
                .diagnostics
                .record(DiagnosticKind::BadGender, &[name, "female", "male"]);
        }

        self.members[id.0].sex = sex;
        self.ready = false;
        Some(id)
    }

    /// Assert that `parent` is a parent of `child`
    pub fn add_lineage(&mut self, child: &str, parent: &str) -> bool {
        let added = self.is_open() && self.accept(|ledger| ledger.add_lineage(child, parent));
        if added {
            self.ensure_members(&[child, parent]);
        }
        added
    }

    /// Assert that `parent1` and `parent2` are the parents of `child`
    pub fn add_full_lineage(&mut self, child: &str, parent1: &str, parent2: &str) -> bool {
        let added = self.is_open()
            && self.accept(|ledger| ledger.add_full_lineage(child, parent1, parent2));
        if added {
            self.ensure_members(&[child, parent1, parent2]);
        }
        added
    }

    pub fn add_marriage(&mut self, mate1: &str, mate2: &str) -> bool {
        let added = self.is_open() && self.accept(|ledger| ledger.add_marriage(mate1, mate2));
        if added {
            self.ensure_members(&[mate1, mate2]);
        }
        added
    }

    pub fn add_sibship(&mut self, sib1: &str, sib2: &str) -> bool {
        let added = self.is_open() && self.accept(|ledger| ledger.add_sibship(sib1, sib2));
        if added {
            self.ensure_members(&[sib1, sib2]);
        }
        added
    }

    fn is_open(&self) -> bool {
        if self.frozen {
            tracing::warn!("Pedigree {} is frozen, relationship ignored", self.name);
        }
        !self.frozen
    }

    fn accept<F>(&mut self, add: F) -> bool
    where
        F: FnOnce(&mut RelationshipLedger) -> Result<(), Diagnostic>,
    {
        match add(&mut self.builder.ledger) {
            Ok(()) => {
                self.ready = false;
                true
            }
            Err(diagnostic) => {
                self.builder.diagnostics.push(diagnostic);
                false
            }
        }
    }

    fn ensure_members(&mut self, names: &[&str]) {
        for name in names {
            if !self.member_names.contains_key(*name) {
                self.insert_member(name, SexCode::Missing);
            }
        }
    }

    fn insert_member(&mut self, name: &str, sex: SexCode) -> MemberId {
        let id = MemberId(self.members.len());
        self.members.push(Member::new(name, sex));
        self.member_names.insert(name.to_string(), id);
        id
    }

    /// Resolve the buffered relationships into families and subpedigrees, assign indices and
    /// infer sexes. Does nothing if nothing was added since the previous build.
    pub fn build(&mut self) {
        if self.frozen || self.ready {
            return;
        }

        let mut builder = std::mem::take(&mut self.builder);
        builder.build_pedigree(self);
        self.builder = builder;

        self.ready = true;
    }

    /// True when every added relationship has been through a build
    pub fn is_built(&self) -> bool {
        self.ready
    }

    /// Build anything still pending and reject all further members and relationships
    pub fn freeze(&mut self) {
        self.build();
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Remove all members, families, subpedigrees and buffered relationships
    pub fn clear(&mut self) {
        *self = Self::new(&self.name);
    }

    /// Drop the buffered relationships and the diagnostics, keeping the built structure
    pub fn flush_build_info(&mut self) {
        self.builder.ledger.clear();
        self.builder.diagnostics.clear();
    }

    pub fn ledger(&self) -> &RelationshipLedger {
        &self.builder.ledger
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.builder.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.builder.diagnostics.error_count()
    }

    pub fn warning_count(&self) -> usize {
        self.builder.diagnostics.warning_count()
    }

    pub fn build_stats(&self) -> &BuildStats {
        self.builder.stats()
    }

    // Store internals used while building

    pub(crate) fn add_family(&mut self, parent1: MemberId, parent2: MemberId) -> FamilyId {
        assert_ne!(parent1, parent2, "a family needs two distinct parents");

        let id = FamilyId(self.families.len());
        self.families.push(Family::new(parent1, parent2));
        self.family_pairs.insert(pair_key(parent1, parent2), id);
        self.members[parent1.0].mates.push(Mate {
            mate: parent2,
            family: id,
        });
        self.members[parent2.0].mates.push(Mate {
            mate: parent1,
            family: id,
        });
        id
    }

    pub(crate) fn find_or_add_family(&mut self, parent1: MemberId, parent2: MemberId) -> FamilyId {
        match self.lookup_family(parent1, parent2) {
            Some(id) => id,
            None => self.add_family(parent1, parent2),
        }
    }

    /// Link `child` to a family. Fails if the child already belongs to another family or is
    /// one of the parents.
    pub(crate) fn attach_offspring(&mut self, family: FamilyId, child: MemberId) -> bool {
        if self.families[family.0].is_parent(child) {
            return false;
        }
        match self.members[child.0].origin {
            Some(origin) => origin == family,
            None => {
                self.members[child.0].origin = Some(family);
                self.families[family.0].offspring.push(child);
                true
            }
        }
    }

    /// Parents and offspring of a family
    pub(crate) fn family_members(&self, family: FamilyId) -> Vec<MemberId> {
        let fam = &self.families[family.0];
        fam.parents()
            .into_iter()
            .chain(fam.offspring.iter().copied())
            .collect()
    }

    pub(crate) fn add_subped(&mut self) -> SubpedId {
        self.subped_counter += 1;
        let id = SubpedId(self.subpeds.len());
        self.subpeds.push(Subpedigree::new(format!(
            "{}:{}",
            self.name, self.subped_counter
        )));
        id
    }

    pub(crate) fn mark_family(&mut self, family: FamilyId, subped: SubpedId) {
        self.families[family.0].subped = Some(subped);
        for member in self.family_members(family) {
            self.members[member.0].subped = Some(subped);
        }
    }

    /// Move everything in `from` to `into` and leave `from` as a tombstone
    pub(crate) fn merge_subpeds(&mut self, from: SubpedId, into: SubpedId) {
        for family in &mut self.families {
            if family.subped == Some(from) {
                family.subped = Some(into);
            }
        }
        for member in &mut self.members {
            if member.subped == Some(from) {
                member.subped = Some(into);
            }
        }

        let old = &mut self.subpeds[from.0];
        old.merged_into = Some(into);
        old.members.clear();
        old.families.clear();
    }

    /// Assign dense indices to everything not indexed yet and rebuild the subpedigree arrays.
    ///
    /// Members and families are never removed, so their indices never change. Subpedigrees keep
    /// their relative order, but later ones move down when an earlier one is merged away.
    pub(crate) fn build_indices(&mut self) {
        let mut live: Vec<SubpedId> = self
            .subped_index
            .iter()
            .copied()
            .filter(|sp| !self.subpeds[sp.0].is_merged())
            .collect();
        live.extend(
            self.subpeds
                .iter()
                .enumerate()
                .filter(|(_, sp)| sp.index.is_none() && !sp.is_merged())
                .map(|(i, _)| SubpedId(i)),
        );
        for subped in &mut self.subpeds {
            subped.index = None;
            subped.members.clear();
            subped.families.clear();
        }
        for (i, sp) in live.iter().enumerate() {
            self.subpeds[sp.0].index = Some(i);
        }
        self.subped_index = live;

        for i in self.family_index.len()..self.families.len() {
            self.families[i].index = Some(i);
            self.family_index.push(FamilyId(i));
        }

        for i in self.member_index.len()..self.members.len() {
            self.members[i].index = Some(i);
            self.member_index.push(MemberId(i));
        }

        for &id in &self.family_index {
            if let Some(sp) = self.families[id.0].subped {
                let subped = &mut self.subpeds[sp.0];
                self.families[id.0].subindex = Some(subped.families.len());
                subped.families.push(id);
            }
        }

        self.unconnecteds.clear();
        for &id in &self.member_index {
            match self.members[id.0].subped {
                Some(sp) => {
                    let subped = &mut self.subpeds[sp.0];
                    self.members[id.0].subindex = Some(subped.members.len());
                    subped.members.push(id);
                }
                None => {
                    self.members[id.0].subindex = Some(self.unconnecteds.len());
                    self.unconnecteds.push(id);
                }
            }
        }
    }

    // Counts and indexed access

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    /// Number of live subpedigrees. Merged subpedigrees are not counted.
    pub fn subpedigree_count(&self) -> usize {
        self.subpeds.iter().filter(|sp| !sp.is_merged()).count()
    }

    pub fn unconnected_count(&self) -> usize {
        self.unconnecteds.len()
    }

    pub fn member(&self, id: MemberId) -> &Member {
        &self.members[id.0]
    }

    pub fn family(&self, id: FamilyId) -> &Family {
        &self.families[id.0]
    }

    pub fn subpedigree(&self, id: SubpedId) -> &Subpedigree {
        &self.subpeds[id.0]
    }

    /// Member with the given index
    pub fn member_at(&self, index: usize) -> MemberId {
        self.member_index[index]
    }

    pub fn family_at(&self, index: usize) -> FamilyId {
        self.family_index[index]
    }

    pub fn subpedigree_at(&self, index: usize) -> SubpedId {
        self.subped_index[index]
    }

    pub fn lookup_member(&self, name: &str) -> Option<MemberId> {
        self.member_names.get(name).copied()
    }

    pub fn member_by_name(&self, name: &str) -> Option<&Member> {
        self.lookup_member(name).map(|id| self.member(id))
    }

    /// The family of an unordered parent pair
    pub fn lookup_family(&self, parent1: MemberId, parent2: MemberId) -> Option<FamilyId> {
        self.family_pairs.get(&pair_key(parent1, parent2)).copied()
    }

    pub fn lookup_family_by_names(&self, parent1: &str, parent2: &str) -> Option<FamilyId> {
        self.lookup_family(self.lookup_member(parent1)?, self.lookup_member(parent2)?)
    }

    /// Members in index order. Members added after the last build come last.
    pub fn members(&self) -> impl Iterator<Item = (MemberId, &Member)> {
        self.members
            .iter()
            .enumerate()
            .map(|(i, member)| (MemberId(i), member))
    }

    pub fn families(&self) -> impl Iterator<Item = (FamilyId, &Family)> {
        self.families
            .iter()
            .enumerate()
            .map(|(i, family)| (FamilyId(i), family))
    }

    /// Live subpedigrees in index order
    pub fn subpedigrees(&self) -> impl Iterator<Item = (SubpedId, &Subpedigree)> {
        self.subped_index
            .iter()
            .map(|&id| (id, &self.subpeds[id.0]))
    }

    /// Members that are not part of any family
    pub fn unconnecteds(&self) -> &[MemberId] {
        &self.unconnecteds
    }

    // Relationships

    pub fn mates(&self, id: MemberId) -> &[Mate] {
        &self.members[id.0].mates
    }

    pub fn parents(&self, id: MemberId) -> Option<[MemberId; 2]> {
        self.members[id.0]
            .origin
            .map(|family| self.families[family.0].parents())
    }

    pub fn mother(&self, id: MemberId) -> Option<MemberId> {
        self.members[id.0]
            .origin
            .and_then(|family| self.families[family.0].mother)
    }

    pub fn father(&self, id: MemberId) -> Option<MemberId> {
        self.members[id.0]
            .origin
            .and_then(|family| self.families[family.0].father)
    }

    pub fn offspring(&self, family: FamilyId) -> &[MemberId] {
        &self.families[family.0].offspring
    }

    /// Children of a parent pair, empty if the pair has no family
    pub fn offspring_of_pair(&self, parent1: MemberId, parent2: MemberId) -> &[MemberId] {
        match self.lookup_family(parent1, parent2) {
            Some(family) => self.offspring(family),
            None => &[],
        }
    }

    /// Children of a member with all of its mates
    pub fn progeny(&self, id: MemberId) -> impl Iterator<Item = MemberId> + '_ {
        self.members[id.0]
            .mates
            .iter()
            .flat_map(|mate| self.families[mate.family.0].offspring.iter().copied())
    }

    /// Full siblings of a member
    pub fn siblings(&self, id: MemberId) -> impl Iterator<Item = MemberId> + '_ {
        self.members[id.0]
            .origin
            .into_iter()
            .flat_map(|family| self.families[family.0].offspring.iter().copied())
            .filter(move |&sib| sib != id)
    }
}

fn pair_key(a: MemberId, b: MemberId) -> (MemberId, MemberId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}
