use color_eyre::Result;
use serde::Serialize;

use crate::args::InputArgs;
use crate::io::{read_multipedigree, write_json};
use crate::multipedigree::Multipedigree;
use crate::pedigree::Pedigree;
use crate::utils;

#[derive(Debug, Serialize)]
pub struct SubpedigreeSummary {
    pub name: String,
    pub members: usize,
    pub families: usize,
    pub loops: bool,
    pub chains: bool,
    pub max_cluster_size: usize,
}

#[derive(Debug, Serialize)]
pub struct PedigreeSummary {
    pub pedigree: String,
    pub members: usize,
    pub families: usize,
    pub subpedigrees: usize,
    pub unconnected: usize,
    pub max_sibship_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unconnected_members: Option<Vec<String>>,
    pub subpedigree_summaries: Vec<SubpedigreeSummary>,
}

impl PedigreeSummary {
    pub fn new(ped: &Pedigree, list_unconnected: bool) -> Self {
        let subpedigree_summaries = ped
            .subpedigrees()
            .map(|(id, subped)| SubpedigreeSummary {
                name: subped.name().to_string(),
                members: subped.member_count(),
                families: subped.family_count(),
                loops: utils::has_loops(ped, id),
                chains: utils::has_chains(ped, id),
                max_cluster_size: utils::max_cluster_size(ped, id),
            })
            .collect();

        let unconnected_members = list_unconnected.then(|| {
            let mut names: Vec<String> = ped
                .unconnecteds()
                .iter()
                .map(|&id| ped.member(id).name().to_string())
                .collect();
            alphanumeric_sort::sort_str_slice(&mut names);
            names
        });

        Self {
            pedigree: ped.name().to_string(),
            members: ped.member_count(),
            families: ped.family_count(),
            subpedigrees: ped.subpedigree_count(),
            unconnected: ped.unconnected_count(),
            max_sibship_size: utils::max_sibship_size(ped),
            unconnected_members,
            subpedigree_summaries,
        }
    }
}

pub fn structure_report(mp: &Multipedigree, list_unconnected: bool) -> Vec<PedigreeSummary> {
    mp.pedigrees()
        .map(|ped| PedigreeSummary::new(ped, list_unconnected))
        .collect()
}

pub fn run(args: InputArgs, list_unconnected: bool) -> Result<()> {
    let mp = read_multipedigree(&args)?;
    write_json(args.output.clone(), &structure_report(&mp, list_unconnected))?;
    Ok(())
}
