use std::collections::HashMap;

use itertools::Itertools;
use petgraph::algo::is_cyclic_undirected;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;

use crate::multipedigree::Multipedigree;
use crate::pedigree::Pedigree;
use crate::structs::{FamilyId, MemberId, SubpedId};

/// A member without parents in the pedigree
pub fn is_founder(ped: &Pedigree, member: MemberId) -> bool {
    ped.member(member).family().is_none()
}

/// Number of nuclear families a member belongs to, as a parent or as an offspring
pub fn nuclear_family_count(ped: &Pedigree, member: MemberId) -> usize {
    let m = ped.member(member);
    m.mate_count() + usize::from(m.family().is_some())
}

/// A member that links at least two nuclear families
pub fn is_connector(ped: &Pedigree, member: MemberId) -> bool {
    nuclear_family_count(ped, member) >= 2
}

/// Number of connectors among the parents and offspring of a family
pub fn connector_count(ped: &Pedigree, family: FamilyId) -> usize {
    ped.family_members(family)
        .into_iter()
        .filter(|&member| is_connector(ped, member))
        .count()
}

pub fn in_family(ped: &Pedigree, member: MemberId, family: FamilyId) -> bool {
    ped.member(member).family() == Some(family) || ped.family(family).is_parent(member)
}

/// A family hanging off the rest of its subpedigree by at most one connector
pub fn is_terminal_family(ped: &Pedigree, family: FamilyId) -> bool {
    connector_count(ped, family) <= 1
}

/// The subpedigree as a bipartite graph of members and families, with an edge from every
/// parent and offspring to its family
fn family_graph(ped: &Pedigree, subped: SubpedId) -> UnGraph<(), ()> {
    let sp = ped.subpedigree(subped);
    let mut graph = UnGraph::with_capacity(
        sp.member_count() + sp.family_count(),
        sp.member_count() + sp.family_count(),
    );

    let nodes: HashMap<MemberId, NodeIndex> = sp
        .members()
        .iter()
        .map(|&member| (member, graph.add_node(())))
        .collect();

    for &family in sp.families() {
        let node = graph.add_node(());
        for member in ped.family_members(family) {
            if let Some(&m) = nodes.get(&member) {
                graph.add_edge(m, node, ());
            }
        }
    }
    graph
}

/// True when the subpedigree has a marriage or consanguinity loop
pub fn has_loops(ped: &Pedigree, subped: SubpedId) -> bool {
    is_cyclic_undirected(&family_graph(ped, subped))
}

pub fn no_loops(ped: &Pedigree, subped: SubpedId) -> bool {
    !has_loops(ped, subped)
}

/// True when some member of the subpedigree has more than one mate
pub fn has_chains(ped: &Pedigree, subped: SubpedId) -> bool {
    ped.subpedigree(subped)
        .members()
        .iter()
        .any(|&member| ped.member(member).mate_count() > 1)
}

pub fn no_chains(ped: &Pedigree, subped: SubpedId) -> bool {
    !has_chains(ped, subped)
}

/// Number of members in the largest group of members joined by marriages
pub fn max_cluster_size(ped: &Pedigree, subped: SubpedId) -> usize {
    let members = ped.subpedigree(subped).members();
    let local: HashMap<MemberId, usize> =
        members.iter().enumerate().map(|(i, &m)| (m, i)).collect();

    let mut clusters = UnionFind::new(members.len());
    for &member in members {
        for mate in ped.mates(member) {
            if let (Some(&a), Some(&b)) = (local.get(&member), local.get(&mate.mate)) {
                clusters.union(a, b);
            }
        }
    }

    members
        .iter()
        .enumerate()
        .filter(|&(_, &member)| ped.member(member).mate_count() > 0)
        .map(|(i, _)| clusters.find(i))
        .counts()
        .into_values()
        .max()
        .unwrap_or(0)
}

/// Largest number of offspring in any family of the pedigree
pub fn max_sibship_size(ped: &Pedigree) -> usize {
    ped.families()
        .map(|(_, family)| family.offspring_count())
        .max()
        .unwrap_or(0)
}

/// Largest number of offspring in any family of any pedigree
pub fn max_multipedigree_sibship_size(mp: &Multipedigree) -> usize {
    mp.pedigrees().map(max_sibship_size).max().unwrap_or(0)
}
