//! Symbol table and static resolution checks.
//!
//! Definitions load with a last-wins policy, after which the table is
//! immutable for the lifetime of an expansion. Before any expansion runs, a
//! static pass verifies that every reference resolves and that the reduced
//! reference graph is acyclic, so unbounded reference chains fail with a
//! diagnostic instead of a stack overflow.

use std::collections::{HashMap, HashSet};

use crate::grammar::ast::{Expr, Score};
use crate::grammar::error::CompileError;

/// Named definitions, last-wins.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    defs: HashMap<String, Expr>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a parsed score; later definitions shadow earlier ones.
    pub fn from_score(score: &Score) -> Self {
        let mut table = Self::new();
        for (name, expr) in &score.defs {
            table.define(name.clone(), expr.clone());
        }
        table
    }

    /// Bind `name`, overwriting any prior binding.
    pub fn define(&mut self, name: String, expr: Expr) {
        self.defs.insert(name, expr);
    }

    pub fn resolve(&self, name: &str) -> Option<&Expr> {
        self.defs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Static checks run once per compile, before expansion:
    /// every reference (in any authoritative definition) must be defined,
    /// the start symbol must exist, and the reduced reference graph must be
    /// acyclic.
    pub fn validate(&self, start: &str) -> Result<(), CompileError> {
        let mut names: Vec<&String> = self.defs.keys().collect();
        names.sort();

        for name in &names {
            let mut refs = Vec::new();
            collect_refs(&self.defs[*name], &mut refs);
            for reference in refs {
                if !self.defs.contains_key(reference) {
                    return Err(CompileError::undefined(reference, vec![(*name).clone()]));
                }
            }
        }

        if !self.defs.contains_key(start) {
            return Err(CompileError::undefined(start, Vec::new()));
        }

        self.check_cycles(&names)
    }

    /// Cycle detection on the reduced reference graph. Edges exist only
    /// through references in required, unbounded positions: `Repeat` bounds
    /// its body and contributes none; a `Choice` contributes only references
    /// required by every alternative. Divergence that survives this pass
    /// (a repeat re-entering its own definition) is caught at expansion time
    /// by the resource limits.
    fn check_cycles(&self, names: &[&String]) -> Result<(), CompileError> {
        let mut edges: HashMap<String, Vec<String>> = HashMap::new();
        for name in names {
            let mut targets = HashSet::new();
            required_refs(&self.defs[*name], &mut targets);
            let mut sorted: Vec<String> = targets.into_iter().collect();
            sorted.sort();
            edges.insert((*name).clone(), sorted);
        }

        // 0 = unvisited, 1 = on the current path, 2 = done
        let mut marks: HashMap<&str, u8> = HashMap::new();
        let mut stack: Vec<&str> = Vec::new();
        for name in names {
            if marks.get(name.as_str()).copied().unwrap_or(0) == 0 {
                if let Some(cycle) = visit(name, &edges, &mut marks, &mut stack) {
                    return Err(CompileError::cycle(&cycle));
                }
            }
        }
        Ok(())
    }
}

fn visit<'a>(
    node: &'a str,
    edges: &'a HashMap<String, Vec<String>>,
    marks: &mut HashMap<&'a str, u8>,
    stack: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    marks.insert(node, 1);
    stack.push(node);
    if let Some(targets) = edges.get(node) {
        for target in targets {
            match marks.get(target.as_str()).copied().unwrap_or(0) {
                0 => {
                    if let Some(cycle) = visit(target, edges, marks, stack) {
                        return Some(cycle);
                    }
                }
                1 => {
                    let first = stack
                        .iter()
                        .position(|n| *n == target.as_str())
                        .expect("grey node is on the path");
                    return Some(stack[first..].iter().map(|n| n.to_string()).collect());
                }
                _ => {}
            }
        }
    }
    stack.pop();
    marks.insert(node, 2);
    None
}

/// Every reference appearing anywhere in the expression.
fn collect_refs<'a>(expr: &'a Expr, out: &mut Vec<&'a String>) {
    match expr {
        Expr::Ref(name) => out.push(name),
        Expr::Seq(terms) | Expr::Choice(terms) => {
            for term in terms {
                collect_refs(term, out);
            }
        }
        Expr::Repeat { body, .. }
        | Expr::Scale { body, .. }
        | Expr::Transpose { body, .. } => collect_refs(body, out),
        Expr::Note { .. } | Expr::Rest { .. } | Expr::Chord(_) | Expr::Control(_) => {}
    }
}

/// References in required, unbounded positions (the reduced-graph edges).
fn required_refs(expr: &Expr, out: &mut HashSet<String>) {
    match expr {
        Expr::Ref(name) => {
            out.insert(name.clone());
        }
        Expr::Seq(terms) => {
            for term in terms {
                required_refs(term, out);
            }
        }
        Expr::Scale { body, .. } | Expr::Transpose { body, .. } => required_refs(body, out),
        // A finite repeat bounds recursion depth along this path.
        Expr::Repeat { .. } => {}
        Expr::Choice(alternatives) => {
            let mut iter = alternatives.iter();
            if let Some(first) = iter.next() {
                let mut acc = HashSet::new();
                required_refs(first, &mut acc);
                for alternative in iter {
                    let mut alt_refs = HashSet::new();
                    required_refs(alternative, &mut alt_refs);
                    acc.retain(|name| alt_refs.contains(name));
                }
                out.extend(acc);
            }
        }
        Expr::Note { .. } | Expr::Rest { .. } | Expr::Chord(_) | Expr::Control(_) => {}
    }
}
