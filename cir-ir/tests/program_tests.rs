//! Program lifecycle: source in, stages, envelope out

use cir_common::{ErrorReporter, IrResult, SourceLocation};
use cir_ir::boundary::read_source;
use cir_ir::program::ResultSection;
use cir_ir::{
    make_int, Ast, BinaryOp, ChunkedSource, NodeKind, Phase, Program, ProgramHandle, Stage,
    StageContext, Version,
};
use cir_wire::EncodeOptions;
use pretty_assertions::assert_eq;

/// Names of the functions a stage saw
#[derive(Debug, Default)]
struct FunctionNames(Vec<String>);

impl ResultSection for FunctionNames {
    const KEY: u32 = 0x10;
}

/// Records every function declaration in the symbol table
struct Declare;

impl Stage for Declare {
    fn name(&self) -> &str {
        "declare"
    }

    fn required_phase(&self) -> Phase {
        Phase::Canonical
    }

    fn completed_phase(&self) -> Phase {
        Phase::Validation
    }

    fn run(&mut self, program: &mut Program, _: &mut StageContext) -> IrResult<()> {
        let functions: Vec<_> = match program.ast() {
            Some(ast) => ast
                .nodes()
                .filter_map(|(index, node)| match node.kind() {
                    NodeKind::FunctionDecl { name } => Some((name.clone(), index)),
                    _ => None,
                })
                .collect(),
            None => Vec::new(),
        };
        for (name, index) in functions {
            program.symbols_mut()?.insert(name.clone(), index);
            program.result_section_slot(FunctionNames::default).0.push(name);
        }
        Ok(())
    }
}

/// Builds `int answer() { return 6 * 7; }` by hand
fn parse(text: &str) -> Ast {
    assert!(text.contains("answer"));
    let mut ast = Ast::new();
    let unit = ast.add_node(NodeKind::TranslationUnit, SourceLocation::new(1, 1));
    let func = ast.add_node(
        NodeKind::FunctionDecl { name: "answer".into() },
        SourceLocation::new(1, 5),
    );
    let body = ast.add_node(NodeKind::CompoundStmt, SourceLocation::new(1, 14));
    let ret = ast.add_node(NodeKind::ReturnStmt, SourceLocation::new(1, 16));
    let mul = ast.add_node(NodeKind::BinaryOperator(BinaryOp::Mul), SourceLocation::new(1, 25));
    let lhs = ast.add_node(NodeKind::Literal, SourceLocation::new(1, 23));
    let rhs = ast.add_node(NodeKind::Literal, SourceLocation::new(1, 27));
    ast.set_value(lhs, Some(make_int(6)));
    ast.set_value(rhs, Some(make_int(7)));
    ast.append_child(unit, func);
    ast.append_child(func, body);
    ast.append_child(body, ret);
    ast.append_child(ret, mul);
    ast.append_child(mul, lhs);
    ast.append_child(mul, rhs);
    ast.set_root(unit);
    ast
}

#[test]
fn test_source_to_locked_envelope() {
    let mut source = ChunkedSource::with_chunk_size("answer.c", "int answer() { return 6 * 7; }", 8);
    let mut reporter = ErrorReporter::new();
    let text = read_source(&mut source, &mut reporter).expect("valid UTF-8");

    let mut program = Program::new("answer.c");
    program.bind(parse(&text));

    let mut context = StageContext::new();
    program.run_stage(&mut Declare, &mut context).expect("phase satisfied");
    assert_eq!(program.condition().current(), Phase::Validation);
    assert!(program.has_result_section::<FunctionNames>());
    program.lock();

    let handle = ProgramHandle::new(&program, &EncodeOptions::default());
    let decoded = handle.open().expect("well-formed envelope");
    assert!(decoded.is_locked());
    assert_eq!(decoded.condition().current(), Phase::Validation);
    assert!(!decoded.has_result_section::<FunctionNames>());

    let answer = decoded.symbols().lookup("answer").expect("declared");
    let ast = decoded.ast().expect("bound");
    assert_eq!(ast.node(answer).kind(), &NodeKind::FunctionDecl { name: "answer".into() });
    assert_eq!(
        ast.print(answer, Version::Live),
        "FunctionDecl 'answer' <1:5>\n\
         \x20 CompoundStmt <1:14>\n\
         \x20   ReturnStmt <1:16>\n\
         \x20     BinaryOperator '*' <1:25>\n\
         \x20       Literal <1:23> = 6\n\
         \x20       Literal <1:27> = 7\n"
    );
}

#[test]
fn test_stage_rerun_after_lock_is_rejected() {
    let mut program = Program::new("answer.c");
    program.bind(parse("answer"));
    program.lock();
    let mut context = StageContext::new();
    let err = program.run_stage(&mut Declare, &mut context).unwrap_err();
    context.reporter_mut().report_error(&err, None);
    assert_eq!(context.reporter().error_count(), 1);
    assert_eq!(program.condition().current(), Phase::Canonical);
}
