use indexmap::IndexMap;
use rayon::prelude::*;

use crate::error::PedError;
use crate::pedigree::Pedigree;
use crate::structs::MemberId;

/// Named pedigrees in insertion order
#[derive(Debug, Default, Clone)]
pub struct Multipedigree {
    pedigrees: IndexMap<String, Pedigree>,
}

impl Multipedigree {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pedigree with the given name, created if it does not exist
    pub fn add_pedigree(&mut self, name: &str) -> &mut Pedigree {
        self.pedigrees
            .entry(name.to_string())
            .or_insert_with(|| Pedigree::new(name))
    }

    pub fn pedigree(&self, name: &str) -> Option<&Pedigree> {
        self.pedigrees.get(name)
    }

    pub fn pedigree_mut(&mut self, name: &str) -> Option<&mut Pedigree> {
        self.pedigrees.get_mut(name)
    }

    pub fn try_pedigree(&self, name: &str) -> Result<&Pedigree, PedError> {
        self.pedigree(name)
            .ok_or_else(|| PedError::UnknownPedigreeError(name.to_string()))
    }

    pub fn pedigree_at(&self, index: usize) -> Option<&Pedigree> {
        self.pedigrees.get_index(index).map(|(_, ped)| ped)
    }

    pub fn pedigrees(&self) -> impl Iterator<Item = &Pedigree> {
        self.pedigrees.values()
    }

    pub fn pedigree_count(&self) -> usize {
        self.pedigrees.len()
    }

    pub fn member_count(&self) -> usize {
        self.pedigrees.values().map(Pedigree::member_count).sum()
    }

    /// Find a member by pedigree and member name
    pub fn lookup_member(&self, pedigree: &str, member: &str) -> Option<(&Pedigree, MemberId)> {
        let ped = self.pedigree(pedigree)?;
        ped.lookup_member(member).map(|id| (ped, id))
    }

    /// Build every pedigree. Pedigrees share nothing, so they are built in parallel.
    pub fn build(&mut self) {
        self.pedigrees
            .values_mut()
            .collect::<Vec<_>>()
            .into_par_iter()
            .for_each(Pedigree::build);

        tracing::debug!(
            "Built {} pedigrees with {} members",
            self.pedigree_count(),
            self.member_count()
        );
    }

    pub fn freeze(&mut self) {
        self.pedigrees.values_mut().for_each(Pedigree::freeze);
    }

    pub fn flush_build_info(&mut self) {
        self.pedigrees
            .values_mut()
            .for_each(Pedigree::flush_build_info);
    }

    pub fn clear(&mut self) {
        self.pedigrees.clear();
    }

    pub fn error_count(&self) -> usize {
        self.pedigrees.values().map(Pedigree::error_count).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.pedigrees.values().map(Pedigree::warning_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pedigrees_are_independent() {
        let mut mp = Multipedigree::new();
        mp.add_pedigree("F1").add_marriage("A", "B");
        mp.add_pedigree("F2").add_marriage("A", "B");
        mp.add_pedigree("F1").add_full_lineage("C", "A", "B");
        mp.build();

        assert_eq!(mp.pedigree_count(), 2);
        assert_eq!(mp.member_count(), 5);
        assert_eq!(mp.pedigree("F1").unwrap().family_count(), 1);
        assert_eq!(mp.pedigree_at(1).unwrap().name(), "F2");
        assert!(mp.lookup_member("F2", "C").is_none());
        assert!(mp.try_pedigree("F3").is_err());
        assert_eq!(crate::utils::max_multipedigree_sibship_size(&mp), 1);
    }
}
