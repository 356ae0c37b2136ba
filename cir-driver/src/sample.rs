//! A small hand-built program and a literal folding stage to run over it

use cir_common::{IrResult, SourceLocation};
use cir_ir::program::ResultSection;
use cir_ir::{
    make_int, ArithOp, Ast, BinaryOp, NodeIndex, NodeKind, Phase, Program, Specifier, Stage,
    StageContext, TypeFacade, Version,
};
use log::{debug, warn};
use std::collections::HashSet;

/// Builds
///
/// ```c
/// int main() {
///     int x = 4;
///     return x + 2 * 3;
/// }
/// ```
pub fn build_sample() -> IrResult<Program> {
    let int = || Some(TypeFacade::builtin(Specifier::Int));
    let mut ast = Ast::new();

    let unit = ast.add_node(NodeKind::TranslationUnit, SourceLocation::new(1, 1));
    let main = ast.add_node(NodeKind::FunctionDecl { name: "main".into() }, SourceLocation::new(1, 5));
    let body = ast.add_node(NodeKind::CompoundStmt, SourceLocation::new(1, 12));
    let decl = ast.add_node(NodeKind::DeclStmt, SourceLocation::new(2, 5));
    let var = ast.add_node(NodeKind::VarDecl { name: "x".into() }, SourceLocation::new(2, 9));
    let init = ast.add_node(NodeKind::Literal, SourceLocation::new(2, 13));
    let ret = ast.add_node(NodeKind::ReturnStmt, SourceLocation::new(3, 5));
    let add = ast.add_node(NodeKind::BinaryOperator(BinaryOp::Add), SourceLocation::new(3, 14));
    let x = ast.add_node(NodeKind::DeclRef { name: "x".into() }, SourceLocation::new(3, 12));
    let mul = ast.add_node(NodeKind::BinaryOperator(BinaryOp::Mul), SourceLocation::new(3, 18));
    let two = ast.add_node(NodeKind::Literal, SourceLocation::new(3, 16));
    let three = ast.add_node(NodeKind::Literal, SourceLocation::new(3, 20));

    for (parent, child) in [
        (unit, main),
        (main, body),
        (body, decl),
        (decl, var),
        (var, init),
        (body, ret),
        (ret, add),
        (add, x),
        (add, mul),
        (mul, two),
        (mul, three),
    ] {
        ast.append_child(parent, child);
    }
    for (node, value) in [(init, 4), (two, 2), (three, 3)] {
        ast.set_value(node, Some(make_int(value)));
    }
    for node in [main, var, init, add, x, mul, two, three] {
        ast.set_return_type(node, int());
    }
    ast.set_root(unit);

    let mut program = Program::new("sample.c");
    program.bind(ast);
    let symbols = program.symbols_mut()?;
    symbols.insert("main", main);
    symbols.insert("x", var);
    Ok(program)
}

/// Expressions a fold replaced, as `before => after`
#[derive(Debug, Default)]
pub struct FoldLog(pub Vec<String>);

impl ResultSection for FoldLog {
    const KEY: u32 = 0x464F;
}

/// Replaces arithmetic on two literals with the computed literal. The parent
/// is bumped first so the canonical view keeps the original expression.
pub struct FoldLiterals;

impl FoldLiterals {
    fn literal_operands(ast: &Ast, node: NodeIndex) -> Option<(ArithOp, [NodeIndex; 2])> {
        let NodeKind::BinaryOperator(op) = ast.node(node).kind() else {
            return None;
        };
        let arith = op.arith()?;
        match ast.children(node, Version::Live) {
            [lhs, rhs]
                if [lhs, rhs].iter().all(|&&child| {
                    matches!(ast.node(child).kind(), NodeKind::Literal) && ast.node(child).value().is_some()
                }) =>
            {
                Some((arith, [*lhs, *rhs]))
            }
            _ => None,
        }
    }

    fn next_candidate(ast: &Ast, skipped: &HashSet<NodeIndex>) -> Option<NodeIndex> {
        ast.nodes()
            .map(|(index, _)| index)
            .filter(|index| !skipped.contains(index) && ast.parent(*index).is_some())
            .find(|&index| Self::literal_operands(ast, index).is_some())
    }
}

impl Stage for FoldLiterals {
    fn name(&self) -> &str {
        "fold-literals"
    }

    fn required_phase(&self) -> Phase {
        Phase::Canonical
    }

    fn completed_phase(&self) -> Phase {
        Phase::Substitution
    }

    fn run(&mut self, program: &mut Program, context: &mut StageContext) -> IrResult<()> {
        let mut skipped = HashSet::new();
        let mut folded = Vec::new();
        let ast = program.ast_mut()?;

        while let Some(node) = Self::next_candidate(ast, &skipped) {
            let Some((op, [lhs, rhs])) = Self::literal_operands(ast, node) else {
                break;
            };
            let (Some(a), Some(b)) = (ast.node(lhs).value(), ast.node(rhs).value()) else {
                break;
            };
            let result = match a.binary(op, b) {
                Ok(result) => result,
                Err(err) => {
                    let location = ast.node(node).location();
                    warn!("not folding {}: {err}", ast.node(node).kind());
                    let diagnostic = err
                        .to_diagnostic(Some(location))
                        .with_note(format!("'{a} {op} {b}' is left in place"));
                    context.reporter_mut().push(diagnostic);
                    skipped.insert(node);
                    continue;
                }
            };
            let Some(parent) = ast.parent(node) else {
                break;
            };
            let position = ast
                .children(parent, Version::Live)
                .iter()
                .position(|&child| child == node)
                .unwrap_or_default();

            folded.push(format!("{a} {op} {b} => {result}"));
            debug!("folding {} at {}", ast.node(node).kind(), ast.node(node).location());

            let literal = ast.add_node(NodeKind::Literal, ast.node(node).location());
            ast.set_return_type(literal, Some(result.facade().clone()));
            ast.set_value(literal, Some(result));
            ast.bump(parent);
            ast.detach_child(parent, position)?;
            ast.emplace(parent, position, literal);
        }

        program.result_section_slot(FoldLog::default).0.extend(folded);
        Ok(())
    }
}
