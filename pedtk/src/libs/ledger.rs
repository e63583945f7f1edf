use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::diagnostics::{Diagnostic, DiagnosticKind};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UseStatus {
    #[default]
    Unused,
    /// Claimed by a sib-chain search that has not finished yet
    PossiblyUsed,
    Used,
}

/// A marriage or sibship assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamePair {
    pub name1: String,
    pub name2: String,
    pub state: UseStatus,
    #[serde(skip)]
    pub(crate) reported: bool,
}

impl NamePair {
    pub fn new(name1: &str, name2: &str) -> Self {
        Self {
            name1: name1.to_string(),
            name2: name2.to_string(),
            state: UseStatus::Unused,
            reported: false,
        }
    }

    /// The other name of the pair, if `name` is one of them
    pub fn other(&self, name: &str) -> Option<&str> {
        if self.name1 == name {
            Some(&self.name2)
        } else if self.name2 == name {
            Some(&self.name1)
        } else {
            None
        }
    }
}

/// The known parents of one child
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lineage {
    pub parent1: String,
    pub parent2: Option<String>,
    pub state: UseStatus,
    #[serde(skip)]
    pub(crate) reported: bool,
}

impl Lineage {
    pub fn single(parent: &str) -> Self {
        Self {
            parent1: parent.to_string(),
            parent2: None,
            state: UseStatus::Unused,
            reported: false,
        }
    }

    pub fn pair(parent1: &str, parent2: &str) -> Self {
        Self {
            parent2: Some(parent2.to_string()),
            ..Self::single(parent1)
        }
    }

    pub fn parents(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.parent1.as_str()).chain(self.parent2.as_deref())
    }

    pub fn is_complete(&self) -> bool {
        self.parent2.is_some()
    }
}

/// Relationship assertions waiting to be resolved into a pedigree.
///
/// Lineages are keyed by child, so repeated mentions of a child accumulate into a single
/// record. Marriages and sibships are kept in insertion order.
#[derive(Debug, Default, Clone)]
pub struct RelationshipLedger {
    pub(crate) lineages: BTreeMap<String, Lineage>,
    pub(crate) marriages: Vec<NamePair>,
    pub(crate) sibships: Vec<NamePair>,
}

impl RelationshipLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_lineage(&mut self, child: &str, parent: &str) -> Result<(), Diagnostic> {
        if child.is_empty() || parent.is_empty() || child == parent {
            return Err(Diagnostic::new(DiagnosticKind::BadLineage, &[child, parent]));
        }
        self.merge_lineage(child, Lineage::single(parent))
    }

    pub fn add_full_lineage(
        &mut self,
        child: &str,
        parent1: &str,
        parent2: &str,
    ) -> Result<(), Diagnostic> {
        let names = [child, parent1, parent2];
        if names.iter().any(|n| n.is_empty())
            || child == parent1
            || child == parent2
            || parent1 == parent2
        {
            return Err(Diagnostic::new(DiagnosticKind::BadLineage, &names));
        }
        self.merge_lineage(child, Lineage::pair(parent1, parent2))
    }

    pub fn add_marriage(&mut self, mate1: &str, mate2: &str) -> Result<(), Diagnostic> {
        if mate1.is_empty() || mate2.is_empty() || mate1 == mate2 {
            return Err(Diagnostic::new(DiagnosticKind::BadMarriage, &[mate1, mate2]));
        }
        self.marriages.push(NamePair::new(mate1, mate2));
        Ok(())
    }

    pub fn add_sibship(&mut self, sib1: &str, sib2: &str) -> Result<(), Diagnostic> {
        if sib1.is_empty() || sib2.is_empty() || sib1 == sib2 {
            return Err(Diagnostic::new(DiagnosticKind::BadSibship, &[sib1, sib2]));
        }
        self.sibships.push(NamePair::new(sib1, sib2));
        Ok(())
    }

    // Merge table, dst = existing record, src = new record:
    //
    //              src <p>                   src <p,q>
    // dst none     dst = src                 dst = src
    // dst <j>      j != p: dst = <j,p>       j == p or j == q: dst = src
    //              j == p: nothing           otherwise: conflict
    // dst <j,k>    p != j and p != k:        j != p or k != q: conflict
    //              conflict
    fn merge_lineage(&mut self, child: &str, src: Lineage) -> Result<(), Diagnostic> {
        let dst = match self.lineages.entry(child.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(src);
                return Ok(());
            }
            Entry::Occupied(entry) => entry.into_mut(),
        };

        let conflict = match (dst.parent2.clone(), src.parent2.clone()) {
            (None, None) => {
                if dst.parent1 != src.parent1 {
                    dst.parent2 = Some(src.parent1.clone());
                    dst.state = UseStatus::Unused;
                }
                false
            }
            (None, Some(q)) => {
                if dst.parent1 == src.parent1 || dst.parent1 == q {
                    dst.parent1 = src.parent1.clone();
                    dst.parent2 = Some(q);
                    dst.state = UseStatus::Unused;
                    false
                } else {
                    true
                }
            }
            (Some(k), None) => dst.parent1 != src.parent1 && k != src.parent1,
            (Some(k), Some(q)) => dst.parent1 != src.parent1 || k != q,
        };

        if conflict {
            let mut names = vec![child];
            names.extend(src.parents());
            return Err(Diagnostic::new(DiagnosticKind::BadLineage, &names));
        }
        Ok(())
    }

    pub fn lineage(&self, child: &str) -> Option<&Lineage> {
        self.lineages.get(child)
    }

    pub fn lineages(&self) -> impl Iterator<Item = (&String, &Lineage)> {
        self.lineages.iter()
    }

    pub fn marriages(&self) -> &[NamePair] {
        &self.marriages
    }

    pub fn sibships(&self) -> &[NamePair] {
        &self.sibships
    }

    pub fn is_empty(&self) -> bool {
        self.lineages.is_empty() && self.marriages.is_empty() && self.sibships.is_empty()
    }

    /// Assertions still waiting to be resolved
    pub fn unused_count(&self) -> usize {
        self.lineages
            .values()
            .filter(|l| l.state == UseStatus::Unused)
            .count()
            + self
                .marriages
                .iter()
                .chain(self.sibships.iter())
                .filter(|p| p.state == UseStatus::Unused)
                .count()
    }

    /// True when no sib-chain claim is left open
    pub fn is_settled(&self) -> bool {
        self.lineages
            .values()
            .all(|l| l.state != UseStatus::PossiblyUsed)
            && self
                .sibships
                .iter()
                .all(|s| s.state != UseStatus::PossiblyUsed)
    }

    /// Settle every open sib-chain claim to `state`
    pub(crate) fn resolve_claims(&mut self, state: UseStatus) {
        for sibship in &mut self.sibships {
            if sibship.state == UseStatus::PossiblyUsed {
                sibship.state = state;
            }
        }
        for lineage in self.lineages.values_mut() {
            if lineage.state == UseStatus::PossiblyUsed {
                lineage.state = state;
            }
        }
    }

    /// Collect a warning for every unused assertion that has not been reported yet
    pub(crate) fn take_unresolved(&mut self) -> Vec<Diagnostic> {
        let mut unresolved = vec![];

        for (child, lineage) in &mut self.lineages {
            if lineage.state == UseStatus::Unused && !lineage.reported {
                lineage.reported = true;
                let mut names = vec![child.as_str()];
                names.extend(lineage.parents());
                unresolved.push(Diagnostic::new(DiagnosticKind::UnresolvedLineage, &names));
            }
        }

        let pairs = [
            (&mut self.marriages, DiagnosticKind::UnresolvedMarriage),
            (&mut self.sibships, DiagnosticKind::UnresolvedSibship),
        ];
        for (list, kind) in pairs {
            for pair in list.iter_mut() {
                if pair.state == UseStatus::Unused && !pair.reported {
                    pair.reported = true;
                    unresolved.push(Diagnostic::new(
                        kind,
                        &[pair.name1.as_str(), pair.name2.as_str()],
                    ));
                }
            }
        }

        unresolved
    }

    /// Drop every assertion that has been consumed
    pub fn cleanup(&mut self) {
        self.lineages.retain(|_, l| l.state != UseStatus::Used);
        self.marriages.retain(|m| m.state != UseStatus::Used);
        self.sibships.retain(|s| s.state != UseStatus::Used);
    }

    pub fn clear(&mut self) {
        self.lineages.clear();
        self.marriages.clear();
        self.sibships.clear();
    }
}
