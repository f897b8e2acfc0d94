//! Symbolic memory regions
//!
//! Every syntactic memory expression resolves to a finite set of regions.
//! Regions are interned to dense ids in a `RegionTable` that lives for the
//! whole analysis run; two expressions may denote overlapping memory only
//! through the table's overlap query, never by accident of representation.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense region identifier
pub type RegionId = u32;

/// The shape of a region
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionKind {
    /// Program-wide global variable
    Global { name: String },
    /// Stack slot of one frame
    Stack { frame: String, var: String },
    /// Heap allocation site, or the unknown object behind an opaque
    /// accessor's return value
    HeapSite {
        site: String,
        type_name: Option<String>,
    },
    /// One field of a base region. `struct_name` is the type containing
    /// `field`, so nested accesses through different bases still compare
    /// equal by their innermost (struct, field) key.
    Field {
        base: RegionId,
        struct_name: String,
        field: String,
    },
}

/// Interning table for regions, plus escape/opacity facts.
///
/// Created lazily on first reference; read-mostly after creation and never
/// destroyed until the run ends.
#[derive(Debug, Default, Clone)]
pub struct RegionTable {
    regions: Vec<RegionKind>,
    index: FxHashMap<RegionKind, RegionId>,
    /// Regions whose address may be visible outside their frame
    escaped: FxHashSet<RegionId>,
    /// Heap sites produced by unknown-bodied accessors: may alias any
    /// previously escaped region of compatible type
    opaque: FxHashSet<RegionId>,
}

impl RegionTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, kind: RegionKind) -> RegionId {
        if let Some(&id) = self.index.get(&kind) {
            return id;
        }
        let id = self.regions.len() as RegionId;
        self.regions.push(kind.clone());
        self.index.insert(kind, id);
        id
    }

    pub fn global(&mut self, name: impl Into<String>) -> RegionId {
        let id = self.intern(RegionKind::Global { name: name.into() });
        // Globals are shared by definition
        self.escaped.insert(id);
        id
    }

    pub fn stack(&mut self, frame: impl Into<String>, var: impl Into<String>) -> RegionId {
        self.intern(RegionKind::Stack {
            frame: frame.into(),
            var: var.into(),
        })
    }

    pub fn heap_site(&mut self, site: impl Into<String>, type_name: Option<&str>) -> RegionId {
        let id = self.intern(RegionKind::HeapSite {
            site: site.into(),
            type_name: type_name.map(|s| s.to_string()),
        });
        self.escaped.insert(id);
        id
    }

    /// Heap site for an opaque accessor call: maximal aliasing uncertainty
    pub fn opaque_site(&mut self, site: impl Into<String>, type_name: Option<&str>) -> RegionId {
        let id = self.heap_site(site, type_name);
        self.opaque.insert(id);
        id
    }

    pub fn field(
        &mut self,
        base: RegionId,
        struct_name: impl Into<String>,
        field: impl Into<String>,
    ) -> RegionId {
        self.intern(RegionKind::Field {
            base,
            struct_name: struct_name.into(),
            field: field.into(),
        })
    }

    pub fn kind(&self, id: RegionId) -> &RegionKind {
        &self.regions[id as usize]
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Root of a field chain
    pub fn root(&self, id: RegionId) -> RegionId {
        match self.kind(id) {
            RegionKind::Field { base, .. } => self.root(*base),
            _ => id,
        }
    }

    pub fn mark_escaped(&mut self, id: RegionId) {
        self.escaped.insert(id);
    }

    /// A region escapes if it or any base in its chain escaped
    pub fn is_escaped(&self, id: RegionId) -> bool {
        if self.escaped.contains(&id) {
            return true;
        }
        match self.kind(id) {
            RegionKind::Field { base, .. } => self.is_escaped(*base),
            _ => false,
        }
    }

    pub fn is_opaque_rooted(&self, id: RegionId) -> bool {
        self.opaque.contains(&self.root(id))
    }

    /// A heap-rooted region is a summary: it may stand for several
    /// concrete cells, so strong updates are unsound on it.
    pub fn is_summary(&self, id: RegionId) -> bool {
        matches!(self.kind(self.root(id)), RegionKind::HeapSite { .. })
    }

    /// A region visible to more than one thread context
    pub fn is_shared(&self, id: RegionId) -> bool {
        match self.kind(self.root(id)) {
            RegionKind::Global { .. } | RegionKind::HeapSite { .. } => true,
            RegionKind::Stack { .. } => self.is_escaped(id),
            RegionKind::Field { .. } => unreachable!("root is never a field"),
        }
    }

    /// The innermost (struct, field) access key, for type-based overlap
    pub fn type_key(&self, id: RegionId) -> Option<(&str, &str)> {
        match self.kind(id) {
            RegionKind::Field {
                struct_name, field, ..
            } => Some((struct_name.as_str(), field.as_str())),
            _ => None,
        }
    }

    fn struct_type(&self, id: RegionId) -> Option<&str> {
        match self.kind(id) {
            RegionKind::HeapSite { type_name, .. } => type_name.as_deref(),
            RegionKind::Field { struct_name, .. } => Some(struct_name.as_str()),
            _ => None,
        }
    }

    /// Whether two regions may denote the same concrete cell.
    ///
    /// `direct_arithmetic` additionally enables the type-based rule:
    /// field accesses with the same (struct, field) key whose bases may
    /// alias through an opaque accessor overlap, which covers a field
    /// reached both directly and nested inside a containing struct.
    pub fn may_overlap(&self, a: RegionId, b: RegionId, direct_arithmetic: bool) -> bool {
        if a == b {
            return true;
        }
        match (self.kind(a), self.kind(b)) {
            (RegionKind::Field { .. }, RegionKind::Field { .. }) => {
                let ka = self.type_key(a);
                let kb = self.type_key(b);
                if ka != kb {
                    return false;
                }
                if !direct_arithmetic {
                    // Without the type-based rule only identical bases
                    // with identical keys overlap (handled by a == b)
                    let (RegionKind::Field { base: ba, .. }, RegionKind::Field { base: bb, .. }) =
                        (self.kind(a), self.kind(b))
                    else {
                        return false;
                    };
                    return self.may_overlap(*ba, *bb, false);
                }
                self.bases_may_alias(a, b)
            }
            (RegionKind::HeapSite { .. }, RegionKind::HeapSite { .. }) => {
                // Two opaque accessors of compatible type may return the
                // same object; distinct concrete allocations never do
                (self.opaque.contains(&a) || self.opaque.contains(&b))
                    && self.types_compatible(a, b)
            }
            _ => false,
        }
    }

    fn bases_may_alias(&self, a: RegionId, b: RegionId) -> bool {
        let ra = self.root(a);
        let rb = self.root(b);
        if ra == rb {
            return true;
        }
        // An opaque root may alias any escaped region of compatible type
        let opaque_side = |x: RegionId, y: RegionId| {
            self.opaque.contains(&x) && self.is_escaped(y)
        };
        opaque_side(ra, rb) || opaque_side(rb, ra)
    }

    fn types_compatible(&self, a: RegionId, b: RegionId) -> bool {
        match (self.struct_type(a), self.struct_type(b)) {
            (Some(x), Some(y)) => x == y,
            // Unknown type never excludes aliasing
            _ => true,
        }
    }

    /// Whether a value of region `a` may be the same pointer target as a
    /// value of region `b` (used for pointer equality verdicts).
    pub fn may_be_same_object(&self, a: RegionId, b: RegionId) -> bool {
        if a == b {
            return true;
        }
        let opaque_pair = |x: RegionId, y: RegionId| {
            self.is_opaque_rooted(x) && self.is_escaped(y) && self.types_compatible(x, y)
        };
        opaque_pair(a, b) || opaque_pair(b, a)
    }

    pub fn display(&self, id: RegionId) -> String {
        match self.kind(id) {
            RegionKind::Global { name } => name.clone(),
            RegionKind::Stack { frame, var } => format!("{}::{}", frame, var),
            RegionKind::HeapSite { site, type_name } => match type_name {
                Some(t) => format!("{}:{}", site, t),
                None => site.clone(),
            },
            RegionKind::Field { base, field, .. } => {
                format!("{}.{}", self.display(*base), field)
            }
        }
    }
}

impl fmt::Display for RegionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionTable({} regions)", self.regions.len())
    }
}
