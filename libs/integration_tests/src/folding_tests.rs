use crate::common::*;
use ast::*;
use pretty_assertions::assert_eq;

const OPERANDS: &[(i32, i32)] = &[
    (7, 3),
    (-5, 2),
    (i32::MAX, 1),
    (i32::MIN, -1),
    (-1, 2),
    (123_456, -789),
    (0x0f0f, 0x00ff),
    (3, 3),
];

/// Runs a program printing `combine(left, right)` computed from variables,
/// then from constants, and returns both outputs.
fn compute_and_fold(
    combine: impl Fn(Expression, Expression) -> Expression,
    left: i32,
    right: i32,
) -> anyhow::Result<(String, String)> {
    let program = void_main(vec![
        declare("a", SymbolType::INT),
        declare("b", SymbolType::INT),
        assign("a", num(left)),
        assign("b", num(right)),
        print_int(combine(var("a"), var("b"))),
        print_char(' '),
        print_int(combine(num(left), num(right))),
    ]);

    let output = run(&program)?.output;
    let (computed, folded) = output
        .split_once(' ')
        .ok_or_else(|| anyhow::anyhow!("unexpected output {output:?}"))?;

    Ok((computed.to_string(), folded.to_string()))
}

#[test]
fn test_binary_folding_matches_run_time() -> anyhow::Result<()> {
    for op in ["+", "-", "*", "/", "&", "|", "^"] {
        for &(left, right) in OPERANDS {
            let (computed, folded) = compute_and_fold(|a, b| bin(op, a, b), left, right)?;
            assert_eq!(computed, folded, "{left} {op} {right}");
        }
    }

    Ok(())
}

#[test]
fn test_unary_folding_matches_run_time() -> anyhow::Result<()> {
    for op in ["+", "-", "~"] {
        for value in [0, 1, -1, 42, i32::MIN, i32::MAX] {
            let (computed, folded) = compute_and_fold(|a, _| unary(op, a), value, 0)?;
            assert_eq!(computed, folded, "{op}{value}");
        }
    }

    Ok(())
}

#[test]
fn test_relational_folding_matches_run_time() -> anyhow::Result<()> {
    for op in ["==", "!=", "<", "<=", ">", ">="] {
        for &(left, right) in OPERANDS {
            let (computed, folded) = compute_and_fold(|a, b| rel(op, a, b), left, right)?;
            assert_eq!(computed, folded, "{left} {op} {right}");
        }
    }

    Ok(())
}

#[test]
fn test_division_is_unsigned() -> anyhow::Result<()> {
    let (computed, folded) = compute_and_fold(|a, b| bin("/", a, b), -8, 2)?;

    assert_eq!(folded, "2147483644");
    assert_eq!(computed, folded);

    Ok(())
}
