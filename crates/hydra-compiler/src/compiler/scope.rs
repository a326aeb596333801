//! Scope management for name resolution during lowering.
//!
//! Scopes live in an arena and point at their parent by [`ScopeId`].
//! Each scope records formal parameters, an optional rest parameter,
//! local declarations (forward or initialized) and the outer names it
//! captures, in first-use order.

use crate::error::{Error, Result};
use crate::ir::{BlockId, InstId};
use rustc_hash::FxHashMap;

/// Index of a scope in a [`ScopeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

/// Whether a scope is a function boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Function body or top-level script
    Function,
    /// Block, loop or per-iteration scope
    Block,
}

/// Where a resolved name lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Formal parameter at this position
    Parameter(u32),
    /// The rest parameter, stored in this slot
    RestArg(InstId),
    /// Initialized local slot
    Local(InstId),
    /// Captured outer binding at this index
    Capture(u32),
    /// Local slot whose declaration has not been lowered yet
    Forward(InstId),
}

/// A successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    /// Where the name lives
    pub binding: Binding,
    /// Whether the binding was declared `const`
    pub constant: bool,
}

/// An outer name captured by a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Captured name
    pub name: String,
    /// Capture index
    pub index: u32,
    /// Whether the outer binding is `const`
    pub constant: bool,
}

#[derive(Debug, Clone, Copy)]
struct Declaration {
    slot: InstId,
    forward: bool,
    constant: bool,
}

/// One lexical scope.
#[derive(Debug)]
pub struct Scope {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    params: FxHashMap<String, u32>,
    rest: Option<(String, InstId)>,
    locals: FxHashMap<String, Declaration>,
    captures: Vec<Capture>,
    capture_index: FxHashMap<String, u32>,
    break_target: Option<BlockId>,
    continue_target: Option<BlockId>,
}

impl Scope {
    fn new(parent: Option<ScopeId>, kind: ScopeKind) -> Self {
        Self {
            parent,
            kind,
            params: FxHashMap::default(),
            rest: None,
            locals: FxHashMap::default(),
            captures: Vec::new(),
            capture_index: FxHashMap::default(),
            break_target: None,
            continue_target: None,
        }
    }

    fn has_own(&self, name: &str) -> bool {
        self.params.contains_key(name)
            || self.rest.as_ref().is_some_and(|(rest, _)| rest == name)
            || self.locals.contains_key(name)
    }
}

/// Arena of every scope created while compiling one module.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(scope);
        id
    }

    /// Opens a function-boundary scope.
    pub fn push_function(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.push(Scope::new(parent, ScopeKind::Function))
    }

    /// Opens a block scope inside `parent`.
    pub fn push_block(&mut self, parent: ScopeId) -> ScopeId {
        self.push(Scope::new(Some(parent), ScopeKind::Block))
    }

    fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    /// The scope's kind.
    pub fn kind(&self, id: ScopeId) -> ScopeKind {
        self.get(id).kind
    }

    /// The enclosing scope.
    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.get(id).parent
    }

    /// Number of scopes from `id` up to the outermost one, inclusive.
    pub fn depth(&self, id: ScopeId) -> usize {
        let mut depth = 1;
        let mut current = id;
        while let Some(parent) = self.get(current).parent {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Registers formal parameters in declaration order.
    pub fn set_params<'a>(&mut self, id: ScopeId, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let scope = self.get_mut(id);
        for (index, name) in names.into_iter().enumerate() {
            if scope.params.insert(name.to_string(), index as u32).is_some() {
                return Err(Error::Redeclaration(name.to_string()));
            }
        }
        Ok(())
    }

    /// Registers the rest parameter and its slot.
    pub fn set_rest(&mut self, id: ScopeId, name: &str, slot: InstId) -> Result<()> {
        let scope = self.get_mut(id);
        if scope.has_own(name) {
            return Err(Error::Redeclaration(name.to_string()));
        }
        scope.rest = Some((name.to_string(), slot));
        Ok(())
    }

    /// Makes `break` inside this scope jump to `target`.
    pub fn set_break_target(&mut self, id: ScopeId, target: BlockId) {
        self.get_mut(id).break_target = Some(target);
    }

    /// Makes `continue` inside this scope jump to `target`.
    pub fn set_continue_target(&mut self, id: ScopeId, target: BlockId) {
        self.get_mut(id).continue_target = Some(target);
    }

    /// Resolves `name` starting at scope `id`.
    ///
    /// Precedence: parameters, the rest parameter, locals, recorded
    /// captures, then the parent chain. A name found in an ancestor is
    /// recorded as a new capture of this scope. Forward declarations in
    /// this scope only resolve when `tolerant` is set; ancestors are
    /// searched with `upper_tolerant`. `Ok(None)` means the name is not
    /// bound anywhere and refers to a global.
    pub fn lookup(
        &mut self,
        id: ScopeId,
        name: &str,
        tolerant: bool,
        upper_tolerant: bool,
    ) -> Result<Option<Resolved>> {
        let scope = self.get(id);
        if let Some(&index) = scope.params.get(name) {
            return Ok(Some(Resolved {
                binding: Binding::Parameter(index),
                constant: false,
            }));
        }
        if let Some((_, slot)) = scope.rest.as_ref().filter(|(rest, _)| rest == name) {
            return Ok(Some(Resolved {
                binding: Binding::RestArg(*slot),
                constant: false,
            }));
        }
        if let Some(decl) = scope.locals.get(name) {
            if decl.forward && !tolerant {
                return Err(Error::Undefined(name.to_string()));
            }
            let binding = if decl.forward {
                Binding::Forward(decl.slot)
            } else {
                Binding::Local(decl.slot)
            };
            return Ok(Some(Resolved {
                binding,
                constant: decl.constant,
            }));
        }
        if let Some(&index) = scope.capture_index.get(name) {
            let constant = scope.captures[index as usize].constant;
            return Ok(Some(Resolved {
                binding: Binding::Capture(index),
                constant,
            }));
        }
        let Some(parent) = scope.parent else {
            return Ok(None);
        };

        let Some(outer) = self.lookup(parent, name, upper_tolerant, true)? else {
            return Ok(None);
        };
        let scope = self.get_mut(id);
        let index = scope.captures.len() as u32;
        scope.captures.push(Capture {
            name: name.to_string(),
            index,
            constant: outer.constant,
        });
        scope.capture_index.insert(name.to_string(), index);
        Ok(Some(Resolved {
            binding: Binding::Capture(index),
            constant: outer.constant,
        }))
    }

    /// Registers `name` as declared later in this scope, backed by `slot`.
    pub fn forward_declare(&mut self, id: ScopeId, name: &str, slot: InstId, constant: bool) -> Result<()> {
        let scope = self.get_mut(id);
        if scope.has_own(name) {
            return Err(Error::Redeclaration(name.to_string()));
        }
        scope.locals.insert(
            name.to_string(),
            Declaration {
                slot,
                forward: true,
                constant,
            },
        );
        Ok(())
    }

    /// Returns true if `name` has a local declaration (forward or not) in
    /// this very scope.
    pub fn has_local(&self, id: ScopeId, name: &str) -> bool {
        self.get(id).locals.contains_key(name)
    }

    /// Declares `name`, promoting a forward declaration (optionally
    /// rebinding its slot) or creating a new binding. Returns the slot.
    pub fn declare(
        &mut self,
        id: ScopeId,
        name: &str,
        slot: Option<InstId>,
        constant: bool,
    ) -> Result<InstId> {
        let scope = self.get_mut(id);
        if scope.params.contains_key(name) || scope.rest.as_ref().is_some_and(|(r, _)| r == name) {
            return Err(Error::Redeclaration(name.to_string()));
        }
        match scope.locals.get_mut(name) {
            Some(decl) if decl.forward => {
                decl.forward = false;
                decl.constant = constant;
                if let Some(slot) = slot {
                    decl.slot = slot;
                }
                Ok(decl.slot)
            }
            Some(_) => Err(Error::Redeclaration(name.to_string())),
            None => {
                let slot = slot.ok_or_else(|| {
                    Error::internal(format!("declaration of '{name}' has no slot"))
                })?;
                scope.locals.insert(
                    name.to_string(),
                    Declaration {
                        slot,
                        forward: false,
                        constant,
                    },
                );
                Ok(slot)
            }
        }
    }

    /// Captures of this scope, ordered by index.
    pub fn capture_list(&self, id: ScopeId) -> &[Capture] {
        &self.get(id).captures
    }

    /// Number of local slots the scope's frame holds.
    pub fn variable_count(&self, id: ScopeId) -> u32 {
        self.get(id).locals.len() as u32
    }

    /// Nearest `break` target and the number of scopes to pop before
    /// jumping to it. Never crosses a function boundary.
    pub fn find_break(&self, id: ScopeId) -> Option<(BlockId, u32)> {
        self.find_target(id, |s| s.break_target)
    }

    /// Nearest `continue` target and the number of scopes to pop.
    pub fn find_continue(&self, id: ScopeId) -> Option<(BlockId, u32)> {
        self.find_target(id, |s| s.continue_target)
    }

    fn find_target(&self, id: ScopeId, target: impl Fn(&Scope) -> Option<BlockId>) -> Option<(BlockId, u32)> {
        let mut pops = 0;
        let mut current = id;
        loop {
            let scope = self.get(current);
            if let Some(block) = target(scope) {
                return Some((block, pops));
            }
            if scope.kind == ScopeKind::Function {
                return None;
            }
            pops += 1;
            current = scope.parent?;
        }
    }

    /// Number of block scopes between `id` and its function boundary.
    pub fn scopes_to_function(&self, id: ScopeId) -> u32 {
        let mut pops = 0;
        let mut current = id;
        while self.get(current).kind == ScopeKind::Block {
            pops += 1;
            match self.get(current).parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        pops
    }
}
