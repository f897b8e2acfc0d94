//! Functions and whole programs handed over by the front end.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::expr::{Expr, Place};
use super::source::SourceLoc;
use super::stmt::{BasicBlock, BlockId, Statement};

/// Formal parameter with the points-to-relevant part of its type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    /// Whether the parameter is pointer-typed (drives modular havocking)
    pub is_pointer: bool,
    /// Struct type the pointer points at, when known
    pub points_to_struct: Option<String>,
}

impl Param {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_pointer: false,
            points_to_struct: None,
        }
    }

    pub fn pointer(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_pointer: true,
            points_to_struct: None,
        }
    }
}

/// A function as an ordered set of basic blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub blocks: Vec<BasicBlock>,
    pub entry: BlockId,
}

impl Function {
    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }
}

/// Global variable declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalDecl {
    pub name: String,
    /// Struct type name for aggregate globals, None for scalars
    pub struct_name: Option<String>,
    /// Initial value for scalar globals (C statics default to zero)
    pub init: Option<i64>,
}

impl GlobalDecl {
    pub fn scalar(name: impl Into<String>, init: i64) -> Self {
        Self {
            name: name.into(),
            struct_name: None,
            init: Some(init),
        }
    }

    pub fn aggregate(name: impl Into<String>, struct_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            struct_name: Some(struct_name.into()),
            init: None,
        }
    }

    pub fn pointer(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            struct_name: None,
            init: None,
        }
    }
}

/// Declared synchronization resource with an optional static ceiling.
/// A missing ceiling is computed as the max priority of all acquirers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDecl {
    pub name: String,
    pub ceiling: Option<u32>,
}

impl ResourceDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ceiling: None,
        }
    }

    pub fn with_ceiling(name: impl Into<String>, ceiling: u32) -> Self {
        Self {
            name: name.into(),
            ceiling: Some(ceiling),
        }
    }
}

/// A whole program: the unit the analyzer consumes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub functions: FxHashMap<String, Function>,
    pub globals: Vec<GlobalDecl>,
    pub resources: Vec<ResourceDecl>,
    /// Static priorities of Task/ISR entry functions (from the system
    /// description the front end read, e.g. an OIL file)
    pub priorities: FxHashMap<String, u32>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&mut self, f: Function) {
        self.functions.insert(f.name.clone(), f);
    }

    pub fn add_global(&mut self, g: GlobalDecl) {
        self.globals.push(g);
    }

    pub fn add_resource(&mut self, r: ResourceDecl) {
        self.resources.push(r);
    }

    pub fn set_priority(&mut self, function: impl Into<String>, priority: u32) {
        self.priorities.insert(function.into(), priority);
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn global(&self, name: &str) -> Option<&GlobalDecl> {
        self.globals.iter().find(|g| g.name == name)
    }
}

/// Builder producing one function block by block.
///
/// Exists for tests and for front ends lowering directly into the model;
/// block 0 is the entry unless overridden.
#[derive(Debug)]
pub struct FunctionBuilder {
    name: String,
    params: Vec<Param>,
    blocks: Vec<BasicBlock>,
    current: usize,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            blocks: vec![BasicBlock::new(0)],
            current: 0,
        }
    }

    pub fn param(mut self, p: Param) -> Self {
        self.params.push(p);
        self
    }

    /// Start (or switch to) the block with the given id
    pub fn block(mut self, id: BlockId) -> Self {
        if let Some(idx) = self.blocks.iter().position(|b| b.id == id) {
            self.current = idx;
        } else {
            self.blocks.push(BasicBlock::new(id));
            self.current = self.blocks.len() - 1;
        }
        self
    }

    pub fn stmt(mut self, s: Statement) -> Self {
        self.blocks[self.current].stmts.push(s);
        self
    }

    pub fn assign(self, place: Place, expr: Expr, loc: SourceLoc) -> Self {
        self.stmt(Statement::Assign { place, expr, loc })
    }

    pub fn branch(self, cond: Expr, then_block: BlockId, else_block: BlockId, loc: SourceLoc) -> Self {
        self.stmt(Statement::Branch {
            cond,
            then_block,
            else_block,
            loc,
        })
    }

    pub fn goto(self, target: BlockId) -> Self {
        self.stmt(Statement::Goto { target })
    }

    pub fn acquire(self, resource: impl Into<String>, loc: SourceLoc) -> Self {
        self.stmt(Statement::Acquire {
            resource: resource.into(),
            loc,
        })
    }

    pub fn release(self, resource: impl Into<String>, loc: SourceLoc) -> Self {
        self.stmt(Statement::Release {
            resource: resource.into(),
            loc,
        })
    }

    pub fn assert_(self, pred: Expr, loc: SourceLoc) -> Self {
        self.stmt(Statement::Assert { pred, loc })
    }

    pub fn ret(self, value: Option<Expr>, loc: SourceLoc) -> Self {
        self.stmt(Statement::Return { value, loc })
    }

    pub fn build(self) -> Function {
        Function {
            name: self.name,
            params: self.params,
            blocks: self.blocks,
            entry: 0,
        }
    }
}
