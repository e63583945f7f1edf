use std::collections::BTreeSet;

use serde::Serialize;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ledger::{Lineage, RelationshipLedger, UseStatus};
use crate::pedigree::Pedigree;
use crate::sexes;
use crate::structs::{FamilyId, MemberId, SubpedId};

/// Counters of the latest build
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub marriages_used: usize,
    pub lineages_used: usize,
    pub sibships_used: usize,
    /// Passes of the sibship fixpoint loop, never more than the number of buffered sibships
    pub sibship_passes: usize,
    pub subpedigrees_merged: usize,
    pub sexes_inferred: usize,
    pub sexes_assigned: usize,
}

/// Turns the buffered relationship assertions of a pedigree into families and subpedigrees.
///
/// The builder owns the ledger of assertions and the diagnostics of its pedigree. Each build
/// consumes what it can, reports what it cannot and leaves unresolved assertions buffered for
/// the next build.
#[derive(Debug, Default, Clone)]
pub struct PedigreeBuilder {
    pub(crate) ledger: RelationshipLedger,
    pub(crate) diagnostics: Diagnostics,
    stats: BuildStats,
}

impl PedigreeBuilder {
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub(crate) fn build_pedigree(&mut self, ped: &mut Pedigree) {
        tracing::debug!(
            "Building pedigree {} with {} buffered relationships",
            ped.name(),
            self.ledger.unused_count()
        );

        let mut stats = BuildStats {
            marriages_used: self.process_marriages(ped),
            lineages_used: self.process_lineages(ped),
            ..Default::default()
        };
        (stats.sibships_used, stats.sibship_passes) = self.process_sibships(ped);
        stats.lineages_used += self.settle_lineages(ped);
        stats.subpedigrees_merged = self.build_subpedigrees(ped);
        ped.build_indices();

        stats.sexes_inferred = sexes::infer_sexes(ped, &mut self.diagnostics);
        sexes::check_parental_sex_consistency(ped, &mut self.diagnostics);
        sexes::check_parental_missing_sexes(ped, &mut self.diagnostics);
        stats.sexes_assigned = sexes::assign_arbitrary_sexes(ped);
        sexes::test_marriage_loop_consistency(ped, &mut self.diagnostics);
        sexes::set_family_mother_father(ped);

        for unresolved in self.ledger.take_unresolved() {
            self.diagnostics.push(unresolved);
        }
        self.ledger.cleanup();

        tracing::debug!(
            "Pedigree {}: {} members, {} families, {} subpedigrees, {} unconnected",
            ped.name(),
            ped.member_count(),
            ped.family_count(),
            ped.subpedigree_count(),
            ped.unconnected_count()
        );
        self.stats = stats;
    }

    /// Create a family for every unused marriage
    fn process_marriages(&mut self, ped: &mut Pedigree) -> usize {
        let mut used = 0;
        for marriage in &mut self.ledger.marriages {
            if marriage.state != UseStatus::Unused {
                continue;
            }
            let (Some(mate1), Some(mate2)) = (
                ped.lookup_member(&marriage.name1),
                ped.lookup_member(&marriage.name2),
            ) else {
                continue;
            };

            ped.find_or_add_family(mate1, mate2);
            marriage.state = UseStatus::Used;
            used += 1;
        }
        used
    }

    /// Link children to families. A child with a single known parent gets the other parent from
    /// the lineages of its siblings, if they name exactly one more.
    fn process_lineages(&mut self, ped: &mut Pedigree) -> usize {
        let children: Vec<String> = self.ledger.lineages.keys().cloned().collect();
        let mut used = 0;

        for child in children {
            let Some(lineage) = self.ledger.lineages.get(&child) else {
                continue;
            };
            if lineage.state != UseStatus::Unused {
                continue;
            }
            let lineage = lineage.clone();

            let (Some(kid), Some(parent1)) =
                (ped.lookup_member(&child), ped.lookup_member(&lineage.parent1))
            else {
                continue;
            };

            let resolved = match (family_agrees(ped, kid, &lineage), &lineage.parent2) {
                (Some(true), _) => true,
                // A single parent outside the child's family
                (Some(false), None) => {
                    self.diagnostics
                        .record(DiagnosticKind::BadLineage, &lineage_names(&child, &lineage));
                    true
                }
                (_, Some(name)) => match ped.lookup_member(name) {
                    Some(parent2) => {
                        let family = ped.find_or_add_family(parent1, parent2);
                        self.attach(ped, family, kid);
                        true
                    }
                    None => false,
                },
                (None, None) => match self.build_sib_chain(ped, kid, parent1) {
                    Some((parent2, chain)) => {
                        let family = ped.find_or_add_family(parent1, parent2);
                        for sib in chain {
                            self.attach(ped, family, sib);
                        }
                        true
                    }
                    None => false,
                },
            };

            if resolved {
                if let Some(lineage) = self.ledger.lineages.get_mut(&child) {
                    lineage.state = UseStatus::Used;
                }
                used += 1;
            }
        }

        used
    }

    /// Collect the sibling chain of `kid` through unused sibships and look for a second parent
    /// in the siblings' lineages.
    ///
    /// Everything read is claimed while searching. On success the claims are consumed, otherwise
    /// they are released back to unused.
    fn build_sib_chain(
        &mut self,
        ped: &Pedigree,
        kid: MemberId,
        parent1: MemberId,
    ) -> Option<(MemberId, Vec<MemberId>)> {
        let mut chain = vec![];
        let mut stack = vec![kid];

        while let Some(sib) = stack.pop() {
            if chain.contains(&sib) {
                continue;
            }
            chain.push(sib);

            let name = ped.member(sib).name();
            for sibship in &mut self.ledger.sibships {
                if sibship.state != UseStatus::Unused {
                    continue;
                }
                if let Some(other) = sibship.other(name).and_then(|o| ped.lookup_member(o)) {
                    sibship.state = UseStatus::PossiblyUsed;
                    stack.push(other);
                }
            }
        }

        let mut parents = BTreeSet::new();
        parents.insert(ped.member(parent1).name().to_string());
        for &sib in chain.iter().skip(1) {
            if let Some(lineage) = self.ledger.lineages.get_mut(ped.member(sib).name()) {
                parents.extend(lineage.parents().map(String::from));
                if lineage.state == UseStatus::Unused {
                    lineage.state = UseStatus::PossiblyUsed;
                }
            }
        }

        let parent2 = match parents.len() {
            2 => parents
                .iter()
                .find(|name| *name != ped.member(parent1).name())
                .and_then(|name| ped.lookup_member(name)),
            _ => None,
        };

        match parent2 {
            Some(parent2) => {
                tracing::trace!(
                    "Sib chain of {} resolved to parents {} and {}",
                    ped.member(kid).name(),
                    ped.member(parent1).name(),
                    ped.member(parent2).name()
                );
                self.ledger.resolve_claims(UseStatus::Used);
                Some((parent2, chain))
            }
            None => {
                self.ledger.resolve_claims(UseStatus::Unused);
                None
            }
        }
    }

    /// Repeat sibship passes until one of them links nobody. Returns the number of consumed
    /// sibships and the number of passes.
    fn process_sibships(&mut self, ped: &mut Pedigree) -> (usize, usize) {
        let limit = self.ledger.sibships.len();
        let mut used = 0;
        let mut passes = 0;

        while passes < limit {
            passes += 1;
            let mut count = 0;

            for sibship in &mut self.ledger.sibships {
                if sibship.state != UseStatus::Unused {
                    continue;
                }
                let (Some(sib1), Some(sib2)) = (
                    ped.lookup_member(&sibship.name1),
                    ped.lookup_member(&sibship.name2),
                ) else {
                    continue;
                };

                let linked = match (ped.member(sib1).family(), ped.member(sib2).family()) {
                    (None, None) => continue,
                    (Some(family1), Some(family2)) => family1 == family2,
                    (Some(family), None) => ped.attach_offspring(family, sib2),
                    (None, Some(family)) => ped.attach_offspring(family, sib1),
                };

                if linked {
                    sibship.state = UseStatus::Used;
                    count += 1;
                } else if !sibship.reported {
                    sibship.reported = true;
                    self.diagnostics.record(
                        DiagnosticKind::BadSibship,
                        &[sibship.name1.as_str(), sibship.name2.as_str()],
                    );
                }
            }

            tracing::trace!("Sibship pass {passes} linked {count}");
            used += count;
            if count == 0 {
                break;
            }
        }

        (used, passes)
    }

    /// Consume the lineages whose child was linked to a family by a sibship. A family that does
    /// not hold the named parents is reported as a bad lineage.
    fn settle_lineages(&mut self, ped: &Pedigree) -> usize {
        let mut used = 0;
        for (child, lineage) in &mut self.ledger.lineages {
            if lineage.state != UseStatus::Unused {
                continue;
            }
            let Some(agrees) = ped
                .lookup_member(child)
                .and_then(|kid| family_agrees(ped, kid, lineage))
            else {
                continue;
            };

            if !agrees {
                self.diagnostics
                    .record(DiagnosticKind::BadLineage, &lineage_names(child, lineage));
            }
            lineage.state = UseStatus::Used;
            used += 1;
        }
        used
    }

    /// Give every new family a subpedigree, merging the subpedigrees it touches into the one
    /// with the smallest id. Returns the number of merges.
    fn build_subpedigrees(&mut self, ped: &mut Pedigree) -> usize {
        let mut merged = 0;

        for i in 0..ped.family_count() {
            let family = FamilyId(i);
            if ped.family(family).subpedigree().is_some() {
                continue;
            }

            let touched: BTreeSet<SubpedId> = ped
                .family_members(family)
                .into_iter()
                .filter_map(|member| ped.member(member).subpedigree())
                .collect();
            let mut touched = touched.into_iter();

            let subped = match touched.next() {
                Some(subped) => subped,
                None => ped.add_subped(),
            };
            ped.mark_family(family, subped);
            for other in touched {
                ped.merge_subpeds(other, subped);
                merged += 1;
            }
        }

        // Offspring attached to families that were placed in an earlier build
        for i in 0..ped.member_count() {
            let member = MemberId(i);
            let Some(subped) = ped
                .member(member)
                .family()
                .and_then(|family| ped.family(family).subpedigree())
            else {
                continue;
            };

            match ped.member(member).subpedigree() {
                Some(own) if own == subped => {}
                Some(own) => {
                    ped.merge_subpeds(own.max(subped), own.min(subped));
                    merged += 1;
                }
                None => ped.members[i].subped = Some(subped),
            }
        }

        if merged > 0 {
            tracing::debug!("Merged {merged} subpedigrees in {}", ped.name());
        }
        merged
    }

    fn attach(&mut self, ped: &mut Pedigree, family: FamilyId, kid: MemberId) {
        if !ped.attach_offspring(family, kid) {
            let [parent1, parent2] = ped.family(family).parents();
            self.diagnostics.record(
                DiagnosticKind::BadLineage,
                &[
                    ped.member(kid).name(),
                    ped.member(parent1).name(),
                    ped.member(parent2).name(),
                ],
            );
        }
    }
}

/// Whether the family `kid` is offspring of holds every parent named by `lineage`. None when
/// `kid` has no family yet.
fn family_agrees(ped: &Pedigree, kid: MemberId, lineage: &Lineage) -> Option<bool> {
    let family = ped.member(kid).family()?;
    Some(lineage.parents().all(|name| {
        ped.lookup_member(name)
            .is_some_and(|parent| ped.family(family).is_parent(parent))
    }))
}

fn lineage_names<'a>(child: &'a str, lineage: &'a Lineage) -> Vec<&'a str> {
    std::iter::once(child).chain(lineage.parents()).collect()
}
