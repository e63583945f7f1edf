// PEDTK - Pedigree construction toolkit
// Copyright (C) 2024  Osma S. Rautila
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//
//
//

//! PEDTK - Pedigree construction toolkit
//!
//! This library turns loosely specified relationship records into an indexed pedigree graph.
//! Individuals are referred to by free-text names, and the relationships between them arrive
//! as three kinds of assertions:
//!
//! * Lineages: a child and one or both of its parents
//! * Marriages: two mates
//! * Sibships: two siblings
//!
//! A build pass resolves the assertions into nuclear families, partitions the members into
//! connected subpedigrees, assigns dense indices, and infers missing sexes from the mating
//! structure. Problems in the data are never fatal; they are collected as diagnostics.
//!
//! # Getting started
//!
//! ```ignore
//! use pedtk::{Pedigree, SexCode};
//!
//! let mut ped = Pedigree::new("FAM1");
//! ped.add_member("A", SexCode::Male);
//! ped.add_full_lineage("C", "A", "B");
//! ped.build();
//!
//! assert_eq!(ped.family_count(), 1);
//! assert_eq!(ped.member_by_name("B").unwrap().sex(), SexCode::InferredFemale);
//! ```
//!
//! ## Running PEDTK
//!
//! The binary reads an assertion log (one builder call per row) and reports the result:
//! ```bash
//! pedtk check $file > ${outdir}/diagnostics.json
//!
//! pedtk summary $file > ${outdir}/structure.json
//! ```
//!

#[doc(hidden)]
pub mod args;

#[doc(hidden)]
pub mod io;

/// PEDTK structs
pub mod structs;

/// Buffered relationship assertions
pub mod ledger;

/// Errors and warnings recorded while building
pub mod diagnostics;

/// The member, family and subpedigree store
pub mod pedigree;

/// Graph construction from the relationship ledger
pub mod builder;

/// Sex inference and marriage graph consistency
pub mod sexes;

/// Structural queries over built pedigrees
pub mod utils;

/// Collections of named pedigrees
pub mod multipedigree;

#[doc(hidden)]
pub mod error;

#[cfg(feature = "clap")]
pub mod clap;
