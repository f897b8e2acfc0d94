//! Place resolution: syntactic memory expressions to region sets.
//!
//! Monotone in the points-to knowledge supplied through the dereference
//! callback: more knowledge only adds or keeps regions. A struct access
//! through an alias set {r1, r2} yields {Field(r1, f), Field(r2, f)}.

use super::super::domain::abstract_value::Targets;
use super::super::domain::region::RegionTable;
use crate::shared::models::{Expr, Place};

/// Resolves places within one frame.
///
/// Dereferences are delegated to the caller (the solver evaluates the
/// pointer expression against its current state), keeping this module
/// independent of the transfer functions.
pub struct PlaceResolver<'a> {
    pub table: &'a mut RegionTable,
    pub frame: &'a str,
}

impl<'a> PlaceResolver<'a> {
    pub fn new(table: &'a mut RegionTable, frame: &'a str) -> Self {
        Self { table, frame }
    }

    /// Regions the place may denote. `Targets::Top` means the write/read
    /// may touch any escaped region.
    pub fn resolve(
        &mut self,
        place: &Place,
        deref: &mut dyn FnMut(&mut RegionTable, &Expr) -> Targets,
    ) -> Targets {
        match place {
            Place::Var(name) => Targets::single(self.table.stack(self.frame, name.clone())),
            Place::Global(name) => Targets::single(self.table.global(name.clone())),
            Place::Deref(expr) => deref(self.table, expr),
            Place::Field {
                base,
                struct_name,
                field,
            } => {
                let base_targets = self.resolve(base, deref);
                match base_targets {
                    // A field of an unknown base is unknown memory
                    Targets::Top => Targets::Top,
                    Targets::Set(regions) => {
                        let fields = regions
                            .into_iter()
                            .map(|r| self.table.field(r, struct_name.clone(), field.clone()))
                            .collect::<Vec<_>>();
                        Targets::from_regions(fields)
                    }
                }
            }
        }
    }
}
