mod common;

use std::collections::HashMap;

use pedtk::{DiagnosticKind, Pedigree, SexCode};

use crate::common::{id, sorted_names};

#[test]
fn lineage_and_marriage_make_one_family() {
    let mut ped = Pedigree::new("FAM");
    ped.add_member("A", SexCode::Missing);
    ped.add_member("B", SexCode::Missing);
    ped.add_full_lineage("C", "A", "B");
    ped.add_marriage("A", "B");
    ped.build();

    assert_eq!(ped.family_count(), 1);
    let family = ped.family_at(0);
    assert_eq!(sorted_names(&ped, &ped.family(family).parents()), vec!["A", "B"]);
    assert_eq!(sorted_names(&ped, ped.offspring(family)), vec!["C"]);

    assert_eq!(ped.subpedigree_count(), 1);
    let subped = ped.subpedigree(ped.subpedigree_at(0));
    assert_eq!(sorted_names(&ped, subped.members()), vec!["A", "B", "C"]);
    assert_eq!(subped.name(), "FAM:1");
}

#[test]
fn sib_chain_inference() {
    let mut ped = Pedigree::new("FAM");
    ped.add_lineage("C", "A");
    ped.add_sibship("C", "D");
    ped.add_lineage("D", "B");
    ped.build();

    assert_eq!(ped.family_count(), 1);
    let family = ped.family_at(0);
    assert_eq!(sorted_names(&ped, &ped.family(family).parents()), vec!["A", "B"]);
    assert_eq!(sorted_names(&ped, ped.offspring(family)), vec!["C", "D"]);
    assert!(ped.ledger().is_empty());

    let siblings: Vec<_> = ped.siblings(id(&ped, "C")).collect();
    assert_eq!(siblings, vec![id(&ped, "D")]);
}

#[test]
fn duplicate_marriages_make_one_family() {
    let mut ped = Pedigree::new("FAM");
    ped.add_marriage("A", "B");
    ped.add_marriage("A", "B");
    ped.build();

    assert_eq!(ped.family_count(), 1);
    assert_eq!(ped.member(id(&ped, "A")).mate_count(), 1);
}

#[test]
fn late_lineage_merges_subpedigrees() {
    let mut ped = Pedigree::new("FAM");
    ped.add_full_lineage("C", "A", "B");
    ped.add_full_lineage("F", "D", "E");
    ped.build();
    assert_eq!(ped.subpedigree_count(), 2);
    let first = ped.member(id(&ped, "A")).subpedigree();

    ped.add_full_lineage("G", "C", "D");
    ped.build();

    assert_eq!(ped.subpedigree_count(), 1);
    assert_eq!(ped.build_stats().subpedigrees_merged, 1);
    for name in ["A", "B", "C", "D", "E", "F", "G"] {
        assert_eq!(ped.member(id(&ped, name)).subpedigree(), first);
    }
    assert_eq!(ped.subpedigree(ped.subpedigree_at(0)).member_count(), 7);
}

#[test]
fn inferred_sex_is_warned() {
    let mut ped = Pedigree::new("FAM");
    ped.add_member("A", SexCode::Male);
    ped.add_marriage("A", "B");
    ped.build();

    let b = ped.member(id(&ped, "B"));
    assert_eq!(b.sex(), SexCode::InferredFemale);
    assert_eq!(b.sex().effective(), SexCode::Female);

    let warnings: Vec<_> = ped.diagnostics().warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, DiagnosticKind::GenderInferred);
    assert_eq!(warnings[0].names, vec!["B", "female"]);

    let family = ped.family_at(0);
    assert_eq!(ped.family(family).father(), Some(id(&ped, "A")));
    assert_eq!(ped.mother(id(&ped, "A")), None);
}

#[test]
fn lineage_merge_is_order_independent() {
    let build = |calls: &[(&str, Option<&str>)]| {
        let mut ped = Pedigree::new("FAM");
        for (parent1, parent2) in calls {
            match parent2 {
                Some(parent2) => ped.add_full_lineage("C", parent1, parent2),
                None => ped.add_lineage("C", parent1),
            };
        }
        ped.build();
        let c = id(&ped, "C");
        sorted_names(&ped, &ped.parents(c).unwrap())
    };

    let expected = vec!["A", "B"];
    assert_eq!(build(&[("A", None), ("B", None)]), expected);
    assert_eq!(build(&[("B", None), ("A", None)]), expected);
    assert_eq!(build(&[("A", Some("B"))]), expected);
}

#[test]
fn sibships_are_transitive() {
    let mut ped = Pedigree::new("FAM");
    ped.add_sibship("A", "B");
    ped.add_sibship("B", "C");
    ped.add_full_lineage("A", "P", "Q");
    ped.build();

    let family = ped.member(id(&ped, "A")).family();
    assert!(family.is_some());
    for name in ["B", "C"] {
        assert_eq!(ped.member(id(&ped, name)).family(), family);
    }
}

#[test]
fn subpedigrees_match_connectivity() {
    let mut ped = Pedigree::new("FAM");
    ped.add_full_lineage("C1", "A", "B");
    ped.add_full_lineage("C2", "D", "E");
    ped.add_marriage("X", "Y");
    ped.add_member("Z", SexCode::Female);
    ped.build();
    ped.add_marriage("C1", "F");
    ped.add_full_lineage("G", "F", "H");
    ped.add_sibship("C2", "I");
    ped.build();

    // Label members by connectivity through family parent/offspring edges
    let mut labels: HashMap<_, _> = ped.members().map(|(m, _)| (m, m)).collect();
    let mut changed = true;
    while changed {
        changed = false;
        for (family, _) in ped.families() {
            let mut ids = ped.family(family).parents().to_vec();
            ids.extend(ped.offspring(family));
            let min = ids.iter().map(|m| labels[m]).min().unwrap();
            for m in ids {
                if labels[&m] != min {
                    labels.insert(m, min);
                    changed = true;
                }
            }
        }
    }

    for (m1, member1) in ped.members() {
        for (m2, member2) in ped.members() {
            let connected = labels[&m1] == labels[&m2];
            if member1.subpedigree().is_none() || member2.subpedigree().is_none() {
                assert!(m1 == m2 || !connected);
                continue;
            }
            assert_eq!(member1.subpedigree() == member2.subpedigree(), connected);
        }
    }
    assert_eq!(ped.subpedigree_count(), 3);
    assert_eq!(sorted_names(&ped, ped.unconnecteds()), vec!["Z"]);
}

#[test]
fn indices_are_dense_and_stable() {
    let mut ped = Pedigree::new("FAM");
    ped.add_marriage("A", "B");
    ped.add_marriage("C", "D");
    ped.add_full_lineage("E", "A", "B");
    ped.build();
    ped.add_full_lineage("F", "C", "D");
    ped.add_full_lineage("G", "E", "F");
    ped.build();

    let members: Vec<_> = ped.members().map(|(_, m)| m.index().unwrap()).collect();
    assert_eq!(members, (0..ped.member_count()).collect::<Vec<_>>());
    let families: Vec<_> = ped.families().map(|(_, f)| f.index().unwrap()).collect();
    assert_eq!(families, (0..ped.family_count()).collect::<Vec<_>>());
    let subpeds: Vec<_> = ped.subpedigrees().map(|(_, s)| s.index().unwrap()).collect();
    assert_eq!(subpeds, (0..ped.subpedigree_count()).collect::<Vec<_>>());

    for i in 0..ped.member_count() {
        assert_eq!(ped.member(ped.member_at(i)).index(), Some(i));
    }

    let before: Vec<_> = ped.members().map(|(_, m)| (m.index(), m.subindex())).collect();
    let errors = ped.error_count();
    let warnings = ped.warning_count();
    assert!(ped.is_built());

    ped.build();
    let after: Vec<_> = ped.members().map(|(_, m)| (m.index(), m.subindex())).collect();
    assert_eq!(before, after);
    assert_eq!(errors, ped.error_count());
    assert_eq!(warnings, ped.warning_count());
}

#[test]
fn known_sexes_never_change() {
    let mut ped = Pedigree::new("FAM");
    ped.add_member("A", SexCode::Male);
    ped.add_member("D", SexCode::InferredFemale);
    ped.add_marriage("A", "B");
    ped.add_marriage("B", "C");
    ped.add_marriage("C", "A");
    ped.add_marriage("C", "D");
    ped.build();

    assert_eq!(ped.member(id(&ped, "A")).sex(), SexCode::Male);
    assert_eq!(ped.member(id(&ped, "D")).sex(), SexCode::InferredFemale);
    assert!(ped.member(id(&ped, "B")).sex().is_female());
    assert!(!ped.member(id(&ped, "C")).sex().is_unknown());
    assert!(ped.diagnostics().count(DiagnosticKind::SameSexMarriage) >= 1);
}

#[test]
fn odd_marriage_loop_is_reported() {
    let mut ped = Pedigree::new("FAM");
    ped.add_marriage("A", "B");
    ped.add_marriage("B", "C");
    ped.add_marriage("C", "A");
    ped.build();

    assert!(ped.diagnostics().count(DiagnosticKind::BadMarriageLoop) >= 1);
    for (_, family) in ped.families() {
        assert_eq!(family.mother(), None);
        assert_eq!(family.father(), None);
    }
}

#[test]
fn unresolved_assertions_stay_buffered() {
    let mut ped = Pedigree::new("FAM");
    ped.add_sibship("A", "B");
    ped.build();

    assert_eq!(ped.family_count(), 0);
    assert_eq!(ped.unconnected_count(), 2);
    assert_eq!(ped.diagnostics().count(DiagnosticKind::UnresolvedSibship), 1);

    ped.add_full_lineage("B", "P", "Q");
    ped.build();
    assert_eq!(ped.family(ped.family_at(0)).offspring_count(), 2);
    assert!(ped.ledger().is_empty());

    let names: Vec<_> = ped
        .subpedigree(ped.subpedigree_at(0))
        .members()
        .iter()
        .map(|&m| ped.member(m).name().to_string())
        .collect();
    insta::assert_yaml_snapshot!(names, @r###"
    ---
    - A
    - B
    - P
    - Q
    "###);
}

#[test]
fn flush_keeps_structure() {
    let mut ped = Pedigree::new("FAM");
    ped.add_marriage("A", "B");
    ped.add_sibship("C", "D");
    ped.build();
    assert!(ped.error_count() > 0);

    ped.flush_build_info();
    assert_eq!(ped.error_count(), 0);
    assert_eq!(ped.warning_count(), 0);
    assert!(ped.ledger().is_empty());
    assert_eq!(ped.family_count(), 1);

    ped.freeze();
    assert!(!ped.add_marriage("C", "D"));
    ped.clear();
    assert_eq!(ped.member_count(), 0);
    assert_eq!(ped.subpedigree_count(), 0);
}
