//! Sex resolution for a built pedigree.
//!
//! The steps run in a fixed order after indexing: inference from mates, the two parental
//! checks, arbitrary assignment, the marriage loop test and finally the mother/father roles.
//! Traversals of the marriage graph use an explicit worklist and visit each member once.
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::pedigree::Pedigree;
use crate::structs::{MemberId, SexCode};

/// Fill in unknown sexes from mates with a known sex until nothing changes.
///
/// A `gender_inferred` warning is recorded for members whose sex was missing, members marked
/// arbitrary are sexed silently. Returns the number of inferred members.
pub fn infer_sexes(ped: &mut Pedigree, diagnostics: &mut Diagnostics) -> usize {
    let mut pending: Vec<(MemberId, MemberId)> = ped
        .family_index
        .iter()
        .map(|&id| ped.family(id).parents())
        .map(|[p1, p2]| (p1, p2))
        .filter(|&(p1, p2)| ped.member(p1).sex().is_unknown() || ped.member(p2).sex().is_unknown())
        .collect();

    let mut inferred = 0;
    let mut changed = true;
    while changed && !pending.is_empty() {
        changed = false;
        pending.retain(|&(p1, p2)| {
            let (sex1, sex2) = (ped.member(p1).sex(), ped.member(p2).sex());
            let (member, mate_sex) = match (sex1.mate_sex(), sex2.mate_sex()) {
                (None, None) => return true,
                (Some(_), Some(_)) => return false,
                (None, Some(sex)) => (p1, sex),
                (Some(sex), None) => (p2, sex),
            };

            if ped.member(member).sex() == SexCode::Missing {
                let sex = mate_sex.effective().to_string();
                diagnostics.record(
                    DiagnosticKind::GenderInferred,
                    &[ped.member(member).name(), sex.as_str()],
                );
            }
            ped.members[member.get()].sex = mate_sex;
            inferred += 1;
            changed = true;
            false
        });
    }

    if inferred > 0 {
        tracing::debug!("Inferred {inferred} sexes in {}", ped.name());
    }
    inferred
}

/// Record a `same_sex_marriage` error for every family with two male or two female parents
pub fn check_parental_sex_consistency(ped: &Pedigree, diagnostics: &mut Diagnostics) {
    for &id in &ped.family_index {
        let [p1, p2] = ped.family(id).parents();
        let (sex1, sex2) = (ped.member(p1).sex(), ped.member(p2).sex());
        let shared = match (sex1.effective(), sex2.effective()) {
            (SexCode::Male, SexCode::Male) => "male",
            (SexCode::Female, SexCode::Female) => "female",
            _ => continue,
        };
        diagnostics.record(
            DiagnosticKind::SameSexMarriage,
            &[ped.member(p1).name(), ped.member(p2).name(), shared],
        );
    }
}

/// Record a `no_sex_parents` error for every family where both parents have a missing sex
pub fn check_parental_missing_sexes(ped: &Pedigree, diagnostics: &mut Diagnostics) {
    for &id in &ped.family_index {
        let [p1, p2] = ped.family(id).parents();
        if ped.member(p1).sex() == SexCode::Missing && ped.member(p2).sex() == SexCode::Missing {
            diagnostics.record(
                DiagnosticKind::NoSexParents,
                &[ped.member(p1).name(), ped.member(p2).name()],
            );
        }
    }
}

/// Give every marriage chain of arbitrary members alternating sexes.
///
/// A chain that reaches a member with a missing sex, or cannot be two-coloured, leaves all of
/// its arbitrary members missing. Returns the number of members that received a sex.
pub fn assign_arbitrary_sexes(ped: &mut Pedigree) -> usize {
    let mut assigned = 0;

    for i in 0..ped.member_index.len() {
        let start = ped.member_index[i];
        if ped.member(start).sex() != SexCode::Arbitrary {
            continue;
        }

        let colouring = colour_marriage_chain(ped, start, Mode::Arbitrary);
        let success = colouring.is_consistent();
        for (member, sex) in colouring.assignments() {
            if ped.member(member).sex() != SexCode::Arbitrary {
                continue;
            }
            ped.members[member.get()].sex = match success {
                true => {
                    assigned += 1;
                    sex
                }
                false => SexCode::Missing,
            };
        }

        if !success {
            tracing::debug!(
                "Marriage chain of {} could not be sexed",
                ped.member(start).name()
            );
        }
    }

    assigned
}

/// Record a `bad_marriage_loop` error for every chain of unsexed members containing an odd
/// marriage cycle
pub fn test_marriage_loop_consistency(ped: &Pedigree, diagnostics: &mut Diagnostics) {
    let mut checked = vec![false; ped.member_count()];

    for &start in &ped.member_index {
        if checked[start.get()] || !ped.member(start).sex().is_unknown() {
            continue;
        }

        let colouring = colour_marriage_chain(ped, start, Mode::Loop);
        for (member, _) in colouring.assignments() {
            checked[member.get()] = true;
        }
        if let Some(member) = colouring.conflict {
            diagnostics.record(DiagnosticKind::BadMarriageLoop, &[ped.member(member).name()]);
        }
    }
}

/// Point the mother and father of each family at its parents when they have opposite known
/// sexes, clear them otherwise
pub fn set_family_mother_father(ped: &mut Pedigree) {
    for i in 0..ped.families.len() {
        let [p1, p2] = ped.families[i].parents();
        let roles = match (ped.member(p1).sex().effective(), ped.member(p2).sex().effective()) {
            (SexCode::Male, SexCode::Female) => Some((p1, p2)),
            (SexCode::Female, SexCode::Male) => Some((p2, p1)),
            _ => None,
        };
        let family = &mut ped.families[i];
        family.father = roles.map(|(father, _)| father);
        family.mother = roles.map(|(_, mother)| mother);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Stop at members with a missing sex and check members with a known one
    Arbitrary,
    /// Only look for odd cycles
    Loop,
}

/// Result of two-colouring one connected marriage chain
#[derive(Debug)]
pub(crate) struct Colouring {
    sexes: Vec<Option<SexCode>>,
    order: Vec<MemberId>,
    pub(crate) conflict: Option<MemberId>,
    pub(crate) blocked: Option<MemberId>,
    /// Worklist entries popped during the traversal
    pub(crate) steps: usize,
}

impl Colouring {
    pub(crate) fn is_consistent(&self) -> bool {
        self.conflict.is_none() && self.blocked.is_none()
    }

    /// Visited members with their colour, in visiting order
    pub(crate) fn assignments(&self) -> impl Iterator<Item = (MemberId, SexCode)> + '_ {
        self.order
            .iter()
            .filter_map(|&member| self.sexes[member.get()].map(|sex| (member, sex)))
    }
}

/// Walk the marriage chain of `start` colouring mates with opposite sexes.
///
/// Every member is expanded at most once and the mate the walk came from is not pushed back,
/// so the worklist sees each mate edge at most twice. The walk runs to completion even after a
/// conflict so that the whole chain is covered.
pub(crate) fn colour_marriage_chain(ped: &Pedigree, start: MemberId, mode: Mode) -> Colouring {
    let mut colouring = Colouring {
        sexes: vec![None; ped.member_count()],
        order: vec![],
        conflict: None,
        blocked: None,
        steps: 0,
    };
    let mut stack = vec![(start, None::<MemberId>, SexCode::InferredFemale)];

    while let Some((member, from, sex)) = stack.pop() {
        colouring.steps += 1;

        if let Some(seen) = colouring.sexes[member.get()] {
            if seen != sex && colouring.conflict.is_none() {
                colouring.conflict = Some(member);
            }
            continue;
        }

        let current = ped.member(member).sex();
        if mode == Mode::Arbitrary {
            if current == SexCode::Missing {
                colouring.blocked.get_or_insert(member);
                continue;
            }
            if !current.is_unknown() && current.effective() != sex.effective() {
                colouring.conflict.get_or_insert(member);
            }
        }

        colouring.sexes[member.get()] = Some(sex);
        colouring.order.push(member);

        let mate_sex = match sex.mate_sex() {
            Some(mate_sex) => mate_sex,
            None => continue,
        };
        for mate in ped.mates(member) {
            if Some(mate.mate) != from {
                stack.push((mate.mate, Some(member), mate_sex));
            }
        }
    }

    colouring
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sex_of(ped: &Pedigree, name: &str) -> SexCode {
        ped.member_by_name(name).unwrap().sex()
    }

    #[test]
    fn inference_propagates_along_chains() {
        let mut ped = Pedigree::new("P");
        ped.add_member("A", SexCode::Male);
        ped.add_marriage("B", "C");
        ped.add_marriage("A", "B");
        ped.add_marriage("C", "D");
        ped.build();

        assert_eq!(sex_of(&ped, "B"), SexCode::InferredFemale);
        assert_eq!(sex_of(&ped, "C"), SexCode::InferredMale);
        assert_eq!(sex_of(&ped, "D"), SexCode::InferredFemale);
        assert_eq!(ped.build_stats().sexes_inferred, 3);
        assert_eq!(ped.diagnostics().count(DiagnosticKind::GenderInferred), 3);
    }

    #[test]
    fn arbitrary_members_are_inferred_silently() {
        let mut ped = Pedigree::new("P");
        ped.add_member("A", SexCode::Female);
        ped.add_member("B", SexCode::Arbitrary);
        ped.add_marriage("A", "B");
        ped.build();

        assert_eq!(sex_of(&ped, "B"), SexCode::InferredMale);
        assert_eq!(ped.warning_count(), 0);
    }

    #[test]
    fn same_sex_marriage() {
        let mut ped = Pedigree::new("P");
        ped.add_member("A", SexCode::Male);
        ped.add_member("B", SexCode::InferredMale);
        ped.add_marriage("A", "B");
        ped.build();

        let errors: Vec<_> = ped.diagnostics().errors().cloned().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, DiagnosticKind::SameSexMarriage);
        assert_eq!(errors[0].names, vec!["A", "B", "male"]);

        let family = ped.family_at(0);
        assert_eq!(ped.family(family).father(), None);
        assert_eq!(ped.family(family).mother(), None);
    }

    #[test]
    fn arbitrary_chain_alternates() {
        let mut ped = Pedigree::new("P");
        for name in ["A", "B", "C"] {
            ped.add_member(name, SexCode::Arbitrary);
        }
        ped.add_marriage("A", "B");
        ped.add_marriage("B", "C");
        ped.build();

        assert_eq!(sex_of(&ped, "A"), SexCode::InferredFemale);
        assert_eq!(sex_of(&ped, "B"), SexCode::InferredMale);
        assert_eq!(sex_of(&ped, "C"), SexCode::InferredFemale);
        assert_eq!(ped.build_stats().sexes_assigned, 3);

        let family = ped.lookup_family_by_names("A", "B").unwrap();
        assert_eq!(ped.family(family).mother(), ped.lookup_member("A"));
        assert_eq!(ped.family(family).father(), ped.lookup_member("B"));
    }

    #[test]
    fn arbitrary_chain_blocked_by_missing() {
        let mut ped = Pedigree::new("P");
        ped.add_member("A", SexCode::Arbitrary);
        ped.add_member("B", SexCode::Arbitrary);
        ped.add_marriage("A", "B");
        ped.add_marriage("B", "C");
        ped.build();

        assert_eq!(sex_of(&ped, "A"), SexCode::Missing);
        assert_eq!(sex_of(&ped, "B"), SexCode::Missing);
        assert_eq!(sex_of(&ped, "C"), SexCode::Missing);
        assert_eq!(ped.build_stats().sexes_assigned, 0);
    }

    #[test]
    fn arbitrary_odd_loop_fails() {
        let mut ped = Pedigree::new("P");
        for name in ["A", "B", "C"] {
            ped.add_member(name, SexCode::Arbitrary);
        }
        ped.add_marriage("A", "B");
        ped.add_marriage("B", "C");
        ped.add_marriage("C", "A");
        ped.build();

        for name in ["A", "B", "C"] {
            assert_eq!(sex_of(&ped, name), SexCode::Missing);
        }
        // The now missing triangle is reported by the loop test
        assert_eq!(ped.diagnostics().count(DiagnosticKind::BadMarriageLoop), 1);
    }

    #[test]
    fn even_loop_is_consistent() {
        let mut ped = Pedigree::new("P");
        ped.add_marriage("A", "B");
        ped.add_marriage("B", "C");
        ped.add_marriage("C", "D");
        ped.add_marriage("D", "A");
        ped.build();

        assert_eq!(ped.diagnostics().count(DiagnosticKind::BadMarriageLoop), 0);
        assert_eq!(ped.diagnostics().count(DiagnosticKind::NoSexParents), 4);
    }

    #[test]
    fn traversal_visits_each_member_once() {
        let mut ped = Pedigree::new("P");
        let names = ["A", "B", "C", "D", "E", "F"];
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                ped.add_marriage(a, b);
            }
        }
        ped.build();

        let start = ped.member_at(0);
        let colouring = colour_marriage_chain(&ped, start, Mode::Loop);
        assert_eq!(colouring.assignments().count(), names.len());

        let edges: usize = ped.members().map(|(_, m)| m.mate_count()).sum();
        assert!(colouring.steps <= edges + 1);
        assert!(colouring.conflict.is_some());
    }
}
