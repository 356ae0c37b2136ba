//! Program container
//!
//! A [`Program`] owns exactly one AST, the symbol table naming its
//! declarations, the result-section slots stages attach to it and the phase
//! it has reached. Once locked, the AST and symbol table are read-only.

pub mod condition;
pub mod slots;
pub mod stage;
pub mod symbols;
mod wire;

pub use condition::{ConditionTracker, Phase};
pub use slots::{ResultSection, SlotMap};
pub use stage::{Stage, StageContext};
pub use symbols::SymbolTable;
pub use wire::PROGRAM_MAGIC;

use crate::ast::Ast;
use cir_common::{fatal, IrError, IrResult};
use log::debug;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Program {
    name: String,
    ast: Option<Ast>,
    symbols: SymbolTable,
    #[serde(skip)]
    slots: SlotMap,
    condition: ConditionTracker,
    locked: bool,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ast: None,
            symbols: SymbolTable::new(),
            slots: SlotMap::new(),
            condition: ConditionTracker::new(),
            locked: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach the program's AST. A program is bound at most once.
    pub fn bind(&mut self, ast: Ast) {
        if self.ast.is_some() {
            fatal!("program '{}' is already bound to an ast", self.name);
        }
        debug!("binding {} node(s) to program '{}'", ast.len(), self.name);
        self.ast = Some(ast);
    }

    pub fn is_bound(&self) -> bool {
        self.ast.is_some()
    }

    pub fn ast(&self) -> Option<&Ast> {
        self.ast.as_ref()
    }

    /// Mutable access to the bound AST. Fails once the program is locked or
    /// while nothing is bound.
    pub fn ast_mut(&mut self) -> IrResult<&mut Ast> {
        self.check_unlocked("ast")?;
        match self.ast.as_mut() {
            Some(ast) => Ok(ast),
            None => Err(IrError::access_violation(format!(
                "program '{}' has no ast bound",
                self.name
            ))),
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> IrResult<&mut SymbolTable> {
        self.check_unlocked("symbol table")?;
        Ok(&mut self.symbols)
    }

    pub fn condition(&self) -> &ConditionTracker {
        &self.condition
    }

    pub fn condition_mut(&mut self) -> &mut ConditionTracker {
        &mut self.condition
    }

    /// Seal the AST and symbol table. There is no unlock.
    pub fn lock(&mut self) {
        if !self.locked {
            debug!("locking program '{}'", self.name);
        }
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    fn check_unlocked(&self, what: &str) -> IrResult<()> {
        if self.locked {
            return Err(IrError::access_violation(format!(
                "{what} of locked program '{}' cannot be modified",
                self.name
            )));
        }
        Ok(())
    }

    /// The result section for `S`, constructed with `init` on first use
    pub fn result_section_slot<S: ResultSection>(&mut self, init: impl FnOnce() -> S) -> &mut S {
        self.slots.get_or_insert(init)
    }

    pub fn result_section_slot_release<S: ResultSection>(&mut self) {
        if self.slots.release::<S>() {
            debug!("released result section {} of '{}'", S::KEY, self.name);
        }
    }

    pub fn has_result_section<S: ResultSection>(&self) -> bool {
        self.slots.contains::<S>()
    }

    pub fn result_section<S: ResultSection>(&self) -> Option<&S> {
        self.slots.get::<S>()
    }
}
